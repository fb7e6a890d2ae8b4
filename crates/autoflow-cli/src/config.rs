use autoflow_llm::{LlmConfig, ModerationConfig};
use autoflow_platform::PlatformConfig;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "autoflow",
    version,
    about = "Turn a plain-language request into an n8n workflow"
)]
pub struct Cli {
    /// Workflow platform base URL
    #[arg(long, env = "N8N_URL", default_value = "http://localhost:5678")]
    pub n8n_url: String,

    /// Platform login email
    #[arg(long, env = "N8N_EMAIL")]
    pub n8n_email: Option<String>,

    /// Platform login password
    #[arg(long, env = "N8N_PASSWORD", hide_env_values = true)]
    pub n8n_password: Option<String>,

    /// API key for text generation and moderation
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// OpenAI-compatible API base URL
    #[arg(long, env = "LLM_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub llm_base_url: String,

    #[arg(long, env = "LLM_MODEL", default_value = "gpt-4o-mini")]
    pub llm_model: String,

    /// Request to compile; prompts interactively when absent
    #[arg(long, env = "AUTOFLOW_PROMPT")]
    pub prompt: Option<String>,

    /// Where to write the Prometheus metrics snapshot
    #[arg(long, env = "AUTOFLOW_METRICS_FILE", default_value = "metrics.prom")]
    pub metrics_file: PathBuf,

    /// Skip the content-moderation call
    #[arg(long)]
    pub no_moderation: bool,

    /// Validate and print the workflow without submitting it
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    pub fn llm_config(&self) -> LlmConfig {
        LlmConfig {
            base_url: self.llm_base_url.clone(),
            api_key: self.api_key.clone(),
            model: self.llm_model.clone(),
            ..Default::default()
        }
    }

    pub fn moderation_config(&self) -> ModerationConfig {
        ModerationConfig {
            base_url: self.llm_base_url.clone(),
            api_key: self.api_key.clone(),
        }
    }

    pub fn platform_config(&self) -> PlatformConfig {
        PlatformConfig {
            base_url: self.n8n_url.clone(),
            email: self.n8n_email.clone(),
            password: self.n8n_password.clone(),
            ..Default::default()
        }
    }

    /// The prompt given on the command line, if it is not blank.
    pub fn literal_prompt(&self) -> Option<&str> {
        self.prompt.as_deref().filter(|p| !p.trim().is_empty())
    }
}
