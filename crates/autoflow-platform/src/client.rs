use crate::error::PlatformError;
use crate::protocol::*;
use autoflow_core::Workflow;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

pub type Result<T> = std::result::Result<T, PlatformError>;

#[derive(Debug, Clone)]
pub struct PlatformConfig {
    pub base_url: String,
    pub email: Option<String>,
    pub password: Option<String>,
    /// Total login attempts before giving up.
    pub login_attempts: u32,
    /// Fixed pause between login attempts.
    pub retry_delay: Duration,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5678".to_string(),
            email: None,
            password: None,
            login_attempts: 3,
            retry_delay: Duration::from_secs(2),
        }
    }
}

/// Session-authenticated client for the workflow platform's REST API.
pub struct PlatformClient {
    config: PlatformConfig,
    http: reqwest::Client,
}

impl PlatformClient {
    pub fn new(config: PlatformConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|source| PlatformError::Unavailable {
                url: config.base_url.clone(),
                source,
            })?;
        Ok(Self { config, http })
    }

    pub fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    /// Editor URL of a stored workflow.
    pub fn workflow_url(&self, id: &str) -> String {
        format!("{}/workflow/{}", self.base_url(), id)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/rest/{}", self.base_url(), path)
    }

    /// Establish a session. Skipped when no credentials are configured.
    ///
    /// Each failed attempt is followed by the configured delay until the
    /// attempt budget is spent.
    pub async fn login(&self) -> Result<()> {
        let (Some(email), Some(password)) = (&self.config.email, &self.config.password) else {
            debug!("No platform credentials configured, skipping login");
            return Ok(());
        };

        let attempts = self.config.login_attempts.max(1);
        let body = LoginRequest { email, password };
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match self.send::<_, Value>(Method::POST, "login", Some(&body)).await {
                Ok(_) => {
                    info!("Logged in to {} as {}", self.base_url(), email);
                    return Ok(());
                }
                Err(e) => {
                    warn!("Login attempt {}/{} failed: {}", attempt, attempts, e);
                    last_error = e.to_string();
                }
            }
            if attempt < attempts {
                tokio::time::sleep(self.config.retry_delay).await;
            }
        }

        Err(PlatformError::LoginFailed {
            attempts,
            reason: last_error,
        })
    }

    /// Submit a new workflow.
    pub async fn create_workflow(&self, workflow: &Workflow) -> Result<WorkflowSummary> {
        info!(
            "Submitting workflow '{}' ({} nodes)",
            workflow.name,
            workflow.nodes.len()
        );
        let created: WorkflowSummary = self
            .send(Method::POST, "workflows", Some(workflow))
            .await?;
        info!("Created workflow {} ({})", created.id, created.name);
        Ok(created)
    }

    pub async fn get_workflow(&self, id: &str) -> Result<Value> {
        self.send::<(), _>(Method::GET, &format!("workflows/{}", id), None)
            .await
    }

    pub async fn update_workflow(&self, id: &str, workflow: &Workflow) -> Result<WorkflowSummary> {
        self.send(Method::PUT, &format!("workflows/{}", id), Some(workflow))
            .await
    }

    pub async fn list_workflows(&self) -> Result<Vec<WorkflowSummary>> {
        self.send::<(), _>(Method::GET, "workflows", None).await
    }

    /// Trigger a manual run of a stored workflow.
    pub async fn execute_workflow(&self, id: &str, workflow: &Workflow) -> Result<Value> {
        let body = RunRequest {
            workflow_data: workflow,
        };
        self.send(Method::POST, &format!("workflows/{}/run", id), Some(&body))
            .await
    }

    async fn send<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        debug!("Platform request: {} {}", method, url);

        let mut req_builder = self.http.request(method, &url);
        if let Some(body) = body {
            req_builder = req_builder.json(body);
        }

        let response = req_builder
            .send()
            .await
            .map_err(|source| PlatformError::Unavailable {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|source| PlatformError::Unavailable {
                url: url.clone(),
                source,
            })?;

        if !status.is_success() {
            return Err(PlatformError::Rejected {
                status: status.as_u16(),
                body: text,
            });
        }

        let value = if text.trim().is_empty() || status == StatusCode::NO_CONTENT {
            Value::Null
        } else {
            serde_json::from_str(&text)
                .map_err(|e| PlatformError::Decode(format!("{} returned invalid JSON: {}", url, e)))?
        };

        serde_json::from_value(unwrap_data(value))
            .map_err(|e| PlatformError::Decode(format!("{}: {}", url, e)))
    }
}
