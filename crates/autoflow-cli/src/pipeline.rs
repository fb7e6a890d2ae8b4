use crate::metrics::{Counter, Metrics, Stage};
use autoflow_core::{Catalog, InputRejected, SafetyGate, ValidationErrors, Workflow, normalize};
use autoflow_llm::{ChatBackend, ContentModeration, generate_plan};
use autoflow_platform::{PlatformClient, PlatformError, WorkflowSummary};
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Prompt rejected: {0}")]
    InputRejected(#[from] InputRejected),
    #[error("Generated workflow is invalid: {0}")]
    GraphInvalid(#[from] ValidationErrors),
    #[error("Upstream service unavailable: {0:#}")]
    UpstreamUnavailable(anyhow::Error),
    #[error("Platform rejected the workflow ({status}): {body}")]
    SubmissionRejected { status: u16, body: String },
}

impl From<PlatformError> for PipelineError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::Rejected { status, body } => Self::SubmissionRejected { status, body },
            other => Self::UpstreamUnavailable(other.into()),
        }
    }
}

/// Where the platform stored a submitted workflow.
#[derive(Debug, Clone)]
pub struct Submission {
    pub summary: WorkflowSummary,
    pub url: String,
}

#[derive(Debug)]
pub struct PipelineOutput {
    pub workflow: Workflow,
    pub fallback: bool,
    pub warnings: Vec<String>,
    /// `None` on a dry run.
    pub submission: Option<Submission>,
}

/// One prompt in, one workflow out: safety check, plan generation,
/// normalization, validation, submission.
pub struct Pipeline<'a, B: ChatBackend> {
    pub catalog: &'a Catalog,
    pub gate: &'a SafetyGate,
    pub backend: &'a B,
    pub moderation: Option<&'a dyn ContentModeration>,
    /// `None` stops after validation.
    pub platform: Option<&'a PlatformClient>,
}

impl<B: ChatBackend> Pipeline<'_, B> {
    pub async fn run(
        &self,
        prompt: &str,
        metrics: &mut Metrics,
    ) -> Result<PipelineOutput, PipelineError> {
        metrics.incr(Counter::Requests);
        let started = Instant::now();
        let result = self.run_stages(prompt, metrics).await;
        metrics.observe(Stage::Total, started.elapsed());

        match &result {
            Ok(output) => {
                if output.fallback {
                    metrics.incr(Counter::Fallbacks);
                }
                if output.submission.is_some() {
                    metrics.incr(Counter::Submitted);
                }
            }
            Err(PipelineError::InputRejected(_)) => metrics.incr(Counter::Rejected),
            Err(PipelineError::GraphInvalid(_)) => metrics.incr(Counter::Invalid),
            Err(_) => metrics.incr(Counter::Failed),
        }
        result
    }

    async fn run_stages(
        &self,
        prompt: &str,
        metrics: &mut Metrics,
    ) -> Result<PipelineOutput, PipelineError> {
        let started = Instant::now();
        self.gate.check_input(prompt)?;
        let verdict = match self.moderation {
            Some(moderation) => moderation.moderate(prompt).await,
            None => true,
        };
        metrics.observe(Stage::Safety, started.elapsed());
        if !verdict {
            return Err(InputRejected::Flagged.into());
        }

        let started = Instant::now();
        let raw = generate_plan(self.backend, prompt, self.catalog)
            .await
            .map_err(PipelineError::UpstreamUnavailable)?;
        metrics.observe(Stage::Generation, started.elapsed());

        let started = Instant::now();
        let normalized = normalize(&raw, self.catalog);
        metrics.observe(Stage::Normalize, started.elapsed());
        if normalized.fallback {
            warn!("Using fallback workflow for prompt");
        }

        let started = Instant::now();
        let checked = self.gate.check_plan(&normalized.workflow, self.catalog);
        metrics.observe(Stage::Validate, started.elapsed());
        checked?;

        let submission = match self.platform {
            Some(platform) => {
                let started = Instant::now();
                let submitted = submit(platform, &normalized.workflow).await;
                metrics.observe(Stage::Submit, started.elapsed());
                Some(submitted?)
            }
            None => {
                info!("Dry run, not submitting '{}'", normalized.workflow.name);
                None
            }
        };

        Ok(PipelineOutput {
            workflow: normalized.workflow,
            fallback: normalized.fallback,
            warnings: normalized.warnings,
            submission,
        })
    }
}

async fn submit(platform: &PlatformClient, workflow: &Workflow) -> Result<Submission, PipelineError> {
    platform.login().await?;
    let summary = platform.create_workflow(workflow).await?;
    let url = platform.workflow_url(&summary.id);
    Ok(Submission { summary, url })
}
