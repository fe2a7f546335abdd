use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use presentation::{build_slide_deck, classify, DeckHeader, ProgramTemplate};
use shared::{
    domain::{AwardData, WinnerId, WinnerRecord},
    protocol::UploadPhotoResponse,
};
use storage::{AwardFile, Storage};
use tracing::{info, warn};

mod import;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "./data/awards.json")]
    awards: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every winner in ceremony order with a per-award summary.
    List,
    /// Print the slide program built from the award data.
    Slides,
    /// Replace the award data with the winners from an award-list CSV, in row order.
    ImportCsv {
        file: PathBuf,
        /// Defaults to the current document's title.
        #[arg(long)]
        title: Option<String>,
        /// Defaults to the current document's subtitle.
        #[arg(long)]
        subtitle: Option<String>,
        #[arg(long)]
        date: Option<String>,
    },
    /// Check ids are 1..=N in order, optionally against a names file (one per line).
    VerifyOrder {
        #[arg(long)]
        expected: Option<PathBuf>,
    },
    /// Write a photo reference into the award data document.
    SetPhoto {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        url: String,
    },
    /// List photos stored for a winner, newest first.
    Photos {
        #[arg(long, default_value = "sqlite://./data/photos.db")]
        database_url: String,
        #[arg(long)]
        winner_id: i64,
    },
    /// Upload a photo file to a running server.
    Upload {
        #[arg(long, default_value = "http://127.0.0.1:3005")]
        server_url: String,
        #[arg(long)]
        winner_id: i64,
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();
    let cli = Cli::parse();
    let award_file = AwardFile::new(&cli.awards);

    match cli.command {
        Command::List => {
            let data = award_file.read().await?;
            for winner in &data.winners {
                let category = classify(&winner.award_type).label();
                let photo = if winner.photo().is_some() { "photo" } else { "" };
                println!(
                    "{:>3}  {:<8} {:<8} {:<24} {:<16} {}",
                    winner.id,
                    winner.award_type,
                    category,
                    winner.recipient_name,
                    winner.department,
                    photo
                );
            }
            println!();
            for (award_type, count) in award_type_counts(&data.winners) {
                println!("{award_type}: {count}");
            }
            println!("total: {}", data.winners.len());
        }
        Command::Slides => {
            let data = award_file.read().await?;
            let deck = build_slide_deck(
                &ProgramTemplate::ceremony_2025(),
                &DeckHeader::from(&data),
                &data.winners,
            );
            for (index, slide) in deck.iter().enumerate() {
                println!("{:>3}  {}", index + 1, serde_json::to_string(slide)?);
            }
            println!("total slides: {}", deck.total_slides());
        }
        Command::ImportCsv {
            file,
            title,
            subtitle,
            date,
        } => {
            let raw = tokio::fs::read(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let imported = import::read_award_csv(raw.as_slice())?;
            for note in &imported.skipped {
                warn!(%note, "skipped CSV row");
            }
            if imported.winners.is_empty() {
                bail!("no winners found in {}", file.display());
            }

            let current = award_file.read().await.ok();
            let header = |given: Option<String>, existing: Option<String>, name: &str| {
                given.or(existing).ok_or_else(|| {
                    anyhow!("--{name} is required when there is no existing award data")
                })
            };
            let data = AwardData {
                title: header(title, current.as_ref().map(|d| d.title.clone()), "title")?,
                subtitle: header(
                    subtitle,
                    current.as_ref().map(|d| d.subtitle.clone()),
                    "subtitle",
                )?,
                date: date.or_else(|| current.as_ref().and_then(|d| d.date.clone())),
                winners: imported.winners,
            };
            award_file.write(&data).await?;
            println!(
                "imported {} winners ({} rows skipped) into {}",
                data.winners.len(),
                imported.skipped.len(),
                award_file.path().display()
            );
        }
        Command::VerifyOrder { expected } => {
            let data = award_file.read().await?;
            let expected = match expected {
                Some(path) => {
                    let raw = tokio::fs::read_to_string(&path)
                        .await
                        .with_context(|| format!("failed to read {}", path.display()))?;
                    Some(
                        raw.lines()
                            .map(str::trim)
                            .filter(|line| !line.is_empty())
                            .map(str::to_string)
                            .collect::<Vec<_>>(),
                    )
                }
                None => None,
            };
            let problems = order_problems(&data.winners, expected.as_deref());
            if problems.is_empty() {
                println!("order ok: {} winners", data.winners.len());
            } else {
                for problem in &problems {
                    println!("{problem}");
                }
                bail!("{} ordering problem(s)", problems.len());
            }
        }
        Command::SetPhoto { id, url } => {
            let outcome = award_file.patch_photo(WinnerId(id), &url).await?;
            match outcome.replaced {
                Some(old) => println!("winner {id}: photo {old} -> {url}"),
                None => println!("winner {id}: photo set to {url}"),
            }
        }
        Command::Photos {
            database_url,
            winner_id,
        } => {
            let storage = Storage::new(&database_url).await?;
            let photos = storage.list_photos_for_winner(WinnerId(winner_id)).await?;
            if photos.is_empty() {
                println!("no photos stored for winner {winner_id}");
            }
            for photo in photos {
                println!(
                    "{}  {}  {} bytes  {}",
                    photo.object_name,
                    photo.content_type,
                    photo.size_bytes,
                    photo.created_at.to_rfc3339()
                );
            }
        }
        Command::Upload {
            server_url,
            winner_id,
            file,
        } => {
            let response = upload(&server_url, WinnerId(winner_id), &file).await?;
            println!(
                "uploaded {} ({} bytes) -> {}",
                response.file_name, response.size, response.url
            );
        }
    }

    Ok(())
}

async fn upload(server_url: &str, winner_id: WinnerId, file: &Path) -> Result<UploadPhotoResponse> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let file_name = file
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("photo")
        .to_string();
    let content_type = mime_guess::from_path(file)
        .first_raw()
        .unwrap_or("application/octet-stream");
    let part = reqwest::multipart::Part::bytes(bytes)
        .file_name(file_name)
        .mime_str(content_type)?;
    let form = reqwest::multipart::Form::new()
        .text("winnerId", winner_id.0.to_string())
        .part("file", part);

    let url = format!("{}/api/upload", server_url.trim_end_matches('/'));
    info!(%url, %winner_id, "uploading photo");
    let resp = reqwest::Client::new().post(&url).multipart(form).send().await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        bail!("upload failed with {status}: {body}");
    }
    Ok(resp.json().await?)
}

/// Award types in first-appearance order with their winner counts.
fn award_type_counts(winners: &[WinnerRecord]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for winner in winners {
        match counts.iter_mut().find(|(t, _)| *t == winner.award_type) {
            Some((_, count)) => *count += 1,
            None => counts.push((winner.award_type.clone(), 1)),
        }
    }
    counts
}

fn order_problems(winners: &[WinnerRecord], expected: Option<&[String]>) -> Vec<String> {
    let mut problems = Vec::new();
    for (position, winner) in winners.iter().enumerate() {
        let want = position as i64 + 1;
        if winner.id.0 != want {
            problems.push(format!(
                "position {want}: id {} ({}) out of sequence",
                winner.id, winner.recipient_name
            ));
        }
    }

    if let Some(expected) = expected {
        for position in 0..winners.len().max(expected.len()) {
            let want = expected.get(position).map(String::as_str);
            let got = winners.get(position).map(|w| w.recipient_name.as_str());
            if want != got {
                problems.push(format!(
                    "position {}: expected {}, found {}",
                    position + 1,
                    want.unwrap_or("(missing)"),
                    got.unwrap_or("(missing)")
                ));
            }
        }
    }
    problems
}
