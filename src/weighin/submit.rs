use std::io::Write;
use std::time::Duration;
use log::{debug, info};

use crate::config::types::BackendConfig;
use crate::error::SubmissionError;
use crate::weighin::record::WeighinRecord;

/// Saves a weigh-in record somewhere.
#[allow(async_fn_in_trait)]
pub trait WeighinMutation {
    async fn submit(&self, record: &WeighinRecord) -> Result<(), SubmissionError>;
}

/// Posts records as JSON to the configured backend.
pub struct HttpWeighinClient {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl HttpWeighinClient {
    pub fn new(url: &str, token: Option<String>, timeout: Duration) -> Result<Self, SubmissionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(HttpWeighinClient {
            client,
            url: url.to_string(),
            token,
        })
    }

    /// `None` when the config has no backend url.
    pub fn from_config(config: &BackendConfig) -> Result<Option<Self>, SubmissionError> {
        match config.url.as_deref() {
            Some(url) => Ok(Some(HttpWeighinClient::new(
                url,
                config.token.clone(),
                Duration::from_secs(config.timeout_secs),
            )?)),
            None => Ok(None),
        }
    }
}

// Backends report problems as {"message": "..."}; fall back to the raw body.
fn rejection_message(body: &str, status: reqwest::StatusCode) -> String {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("message").and_then(|message| message.as_str()).map(str::to_string));

    match message {
        Some(message) => message,
        None if !body.trim().is_empty() => body.trim().to_string(),
        None => format!("The server rejected the weigh-in ({})", status),
    }
}

impl WeighinMutation for HttpWeighinClient {
    async fn submit(&self, record: &WeighinRecord) -> Result<(), SubmissionError> {
        debug!("Posting weigh-in to {}", self.url);

        let mut request = self.client.post(&self.url).json(record);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            info!("Weigh-in saved ({})", status);
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(SubmissionError::Rejected {
            status: status.as_u16(),
            message: rejection_message(&body, status),
        })
    }
}

/// Writes the record as pretty JSON instead of sending it anywhere.
pub struct DryRunMutation<W: Write + Send> {
    out: std::sync::Mutex<W>,
}

impl<W: Write + Send> DryRunMutation<W> {
    pub fn new(out: W) -> Self {
        DryRunMutation { out: std::sync::Mutex::new(out) }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().expect("Failed to unlock DryRunMutation output")
    }
}

impl<W: Write + Send> WeighinMutation for DryRunMutation<W> {
    async fn submit(&self, record: &WeighinRecord) -> Result<(), SubmissionError> {
        let content = serde_json::to_string_pretty(record)?;
        let mut out = self.out.lock().expect("Failed to lock DryRunMutation output");
        writeln!(out, "{}", content)?;
        out.flush()?;
        Ok(())
    }
}

/// The mutation the command line uses: the configured backend, or stdout.
pub enum Backend {
    Http(HttpWeighinClient),
    DryRun(DryRunMutation<std::io::Stdout>),
}

impl Backend {
    pub fn from_config(config: &BackendConfig, dry_run: bool) -> Result<Backend, SubmissionError> {
        if !dry_run {
            match HttpWeighinClient::from_config(config)? {
                Some(client) => return Ok(Backend::Http(client)),
                None => info!("No backend url configured, printing the weigh-in instead"),
            }
        }

        Ok(Backend::DryRun(DryRunMutation::new(std::io::stdout())))
    }
}

impl WeighinMutation for Backend {
    async fn submit(&self, record: &WeighinRecord) -> Result<(), SubmissionError> {
        match self {
            Backend::Http(client) => client.submit(record).await,
            Backend::DryRun(dry_run) => dry_run.submit(record).await,
        }
    }
}
