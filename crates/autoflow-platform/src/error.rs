use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Platform unreachable at {url}: {source}")]
    Unavailable {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Login failed after {attempts} attempt(s): {reason}")]
    LoginFailed { attempts: u32, reason: String },
    #[error("Platform rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("Unexpected platform response: {0}")]
    Decode(String),
}

impl PlatformError {
    /// Whether the failure came from reaching the platform rather than from
    /// its answer.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::LoginFailed { .. })
    }
}
