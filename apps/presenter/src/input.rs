use presentation::Key;
use shared::domain::AwardCategory;

/// One line typed at the presenter prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Key(Key),
    Category(AwardCategory),
    Goto(usize),
    Quit,
    Unknown,
}

pub fn parse_line(line: &str) -> Input {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        // A bare Enter advances like Space.
        return Input::Key(Key::Space);
    }

    let lowered = trimmed.to_ascii_lowercase();
    match lowered.as_str() {
        "q" | "quit" | "exit" => return Input::Quit,
        ":service" => return Input::Category(AwardCategory::Service),
        ":rock" => return Input::Category(AwardCategory::Rock),
        ":excellence" => return Input::Category(AwardCategory::Excellence),
        _ => {}
    }

    if let Some(target) = lowered.strip_prefix("goto ") {
        // 1-based, as shown in the slide counter.
        return match target.trim().parse::<usize>() {
            Ok(n) if n > 0 => Input::Goto(n - 1),
            _ => Input::Unknown,
        };
    }

    trimmed.parse::<Key>().map_or(Input::Unknown, Input::Key)
}
