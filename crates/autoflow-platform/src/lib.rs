mod client;
mod error;
mod protocol;

pub use client::{PlatformClient, PlatformConfig};
pub use error::PlatformError;
pub use protocol::{WorkflowSummary, unwrap_data};
