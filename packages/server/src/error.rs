use thiserror::Error;

/// Errors a pipeline stage can fail its job with.
///
/// The string renderings are stable identifiers: they end up verbatim in the
/// job's `error` field and in API responses, so external schedulers can match
/// on them.
#[derive(Debug, Error)]
pub enum StageError {
    /// A capability the stage needs was never configured. Blocks the job;
    /// nothing transient about it.
    #[error("{0}")]
    Config(&'static str),

    /// `generate-site` was pointed at an index past the end of the file.
    #[error("lead_not_found")]
    LeadNotFound,

    /// `send`/`daily-run` before any template or target exists.
    #[error("daily_target_not_set")]
    DailyTargetNotSet,

    #[error("template_not_found: {0}")]
    TemplateNotFound(String),

    #[error("cannot_delete_last_template")]
    CannotDeleteLastTemplate,

    /// A job type the dispatcher does not know.
    #[error("unknown_job_type:{0}")]
    UnknownJobType(String),

    /// Anything else: transport failures, local storage failures, bad data.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StageResult<T> = std::result::Result<T, StageError>;
