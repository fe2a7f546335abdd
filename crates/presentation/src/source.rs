use anyhow::Context;
use async_trait::async_trait;
use shared::domain::AwardData;
use storage::AwardFile;

use crate::store::AwardSource;

#[async_trait]
impl AwardSource for AwardFile {
    async fn load(&self) -> anyhow::Result<AwardData> {
        Ok(self.read().await?)
    }

    fn describe(&self) -> String {
        self.path().display().to_string()
    }
}

/// Fetches the award document from a running server's `/api/awards`.
#[derive(Clone)]
pub struct HttpAwardSource {
    http: reqwest::Client,
    server_url: String,
}

impl HttpAwardSource {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), server_url)
    }

    pub fn with_client(http: reqwest::Client, server_url: impl Into<String>) -> Self {
        Self {
            http,
            server_url: server_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn awards_url(&self) -> String {
        format!("{}/api/awards", self.server_url)
    }
}

#[async_trait]
impl AwardSource for HttpAwardSource {
    async fn load(&self) -> anyhow::Result<AwardData> {
        let url = self.awards_url();
        let data = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?
            .error_for_status()?
            .json::<AwardData>()
            .await
            .with_context(|| format!("invalid award data from {url}"))?;
        Ok(data)
    }

    fn describe(&self) -> String {
        self.awards_url()
    }
}

/// An award document already in memory.
#[derive(Debug, Clone)]
pub struct StaticAwardSource {
    data: AwardData,
}

impl StaticAwardSource {
    pub fn new(data: AwardData) -> Self {
        Self { data }
    }
}

#[async_trait]
impl AwardSource for StaticAwardSource {
    async fn load(&self) -> anyhow::Result<AwardData> {
        Ok(self.data.clone())
    }

    fn describe(&self) -> String {
        "in-memory award data".to_string()
    }
}
