//! One-time bootstrap of the task collection.
//!
//! The loader fetches a raw task list from a [`TaskSource`], runs it through
//! the sanitizer and hands the result to the store. Any fetch failure, a
//! malformed payload or a list with no usable records falls back to the
//! synthetic generator. Only when the fallback is disabled does the loader
//! end in a failed state.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::clock::{Clock, SystemClock};
use crate::config::LoaderConfig;
use crate::error::{Error, Result};
use crate::sanitize::normalize;
use crate::seed::generate_sales_tasks;
use crate::task::Task;

/// Where a raw task list comes from.
#[async_trait]
pub trait TaskSource: Send + Sync {
    /// Human-readable location, used in logs and messages.
    fn describe(&self) -> String;

    async fn fetch(&self) -> Result<Vec<Value>>;
}

/// A JSON array stored in a local file.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TaskSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<Vec<Value>> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let payload: Value = serde_json::from_str(&content)?;
        into_records(payload, &self.describe())
    }
}

/// A JSON array served over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("salesboard/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl TaskSource for HttpSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> Result<Vec<Value>> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::LoadFailed(format!(
                "{} returned {}",
                self.url, status
            )));
        }
        let payload: Value = response.json().await?;
        into_records(payload, &self.url)
    }
}

/// Pick a source for a location: http(s) URLs are fetched over the network,
/// anything else is read as a file path.
pub fn source_for(location: &str, timeout: Duration) -> Result<Box<dyn TaskSource>> {
    let location = location.trim();
    if location.starts_with("http://") || location.starts_with("https://") {
        Ok(Box::new(HttpSource::new(location, timeout)?))
    } else {
        Ok(Box::new(FileSource::new(location)))
    }
}

fn into_records(payload: Value, origin: &str) -> Result<Vec<Value>> {
    match payload {
        Value::Array(records) => Ok(records),
        other => Err(Error::LoadFailed(format!(
            "{origin}: expected a JSON array, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LoadOrigin {
    Source,
    Fallback,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoadStatus {
    Idle,
    Loading,
    Loaded { count: usize, origin: LoadOrigin },
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded { tasks: Vec<Task>, origin: LoadOrigin },
    /// A previous load already succeeded; nothing was fetched.
    AlreadyLoaded,
    /// The token fired before the fetch resolved; no state was applied.
    Cancelled,
}

pub struct Loader {
    status: LoadStatus,
    fallback_count: usize,
    seed: u64,
    clock: Arc<dyn Clock>,
}

impl Loader {
    pub fn new(config: &LoaderConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &LoaderConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            status: LoadStatus::Idle,
            fallback_count: config.fallback_count,
            seed: config.seed,
            clock,
        }
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            LoadStatus::Failed { message } => Some(message.as_str()),
            _ => None,
        }
    }

    /// Run the bootstrap once. After a successful load every further call
    /// returns [`LoadOutcome::AlreadyLoaded`]. A failed load may be retried.
    pub async fn load(
        &mut self,
        source: Option<&dyn TaskSource>,
        cancel: &CancellationToken,
    ) -> Result<LoadOutcome> {
        if matches!(self.status, LoadStatus::Loaded { .. }) {
            tracing::debug!("load skipped: already loaded");
            return Ok(LoadOutcome::AlreadyLoaded);
        }
        if cancel.is_cancelled() {
            return Ok(LoadOutcome::Cancelled);
        }

        self.status = LoadStatus::Loading;
        let fetched = match source {
            Some(source) => {
                tracing::info!(source = %source.describe(), "fetching tasks");
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        tracing::debug!(source = %source.describe(), "load cancelled");
                        self.status = LoadStatus::Idle;
                        return Ok(LoadOutcome::Cancelled);
                    }
                    result = source.fetch() => result,
                }
            }
            None => Err(Error::LoadFailed("no task source configured".to_string())),
        };

        let now = self.clock.now();
        let fetched = fetched.map(|records| normalize(&records, now));
        let (tasks, origin) = match fetched {
            Ok(tasks) if !tasks.is_empty() => (tasks, LoadOrigin::Source),
            Ok(_) => {
                tracing::warn!("task source had no usable records, using generated tasks");
                (self.fallback(now)?, LoadOrigin::Fallback)
            }
            Err(err) => {
                tracing::warn!(error = %err, "task fetch failed, using generated tasks");
                (self.fallback(now)?, LoadOrigin::Fallback)
            }
        };

        tracing::info!(count = tasks.len(), origin = ?origin, "tasks loaded");
        self.status = LoadStatus::Loaded {
            count: tasks.len(),
            origin,
        };
        Ok(LoadOutcome::Loaded { tasks, origin })
    }

    fn fallback(&mut self, now: chrono::DateTime<chrono::Utc>) -> Result<Vec<Task>> {
        if self.fallback_count == 0 {
            let message = "Failed to load tasks and synthetic fallback is disabled".to_string();
            self.status = LoadStatus::Failed {
                message: message.clone(),
            };
            return Err(Error::LoadFailed(message));
        }
        let raw = generate_sales_tasks(self.fallback_count, self.seed);
        Ok(normalize(&raw, now))
    }
}
