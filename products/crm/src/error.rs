use entity::AmountError;
use platform_api::ApiError;
use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("{0}")]
    Rejected(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),
    #[error("{0}")]
    Validation(String),
    #[error("card {0} is not on the board")]
    CardNotFound(String),
    #[error("cancelled by user")]
    Cancelled,
    #[error("pipeline board is no longer active")]
    Detached,
}

impl PipelineError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Text shown to the user when the action fails.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::Api(err) if err.is_not_found() => {
                "The record no longer exists on the server.".to_string()
            }
            PipelineError::Api(ApiError::Status { message, .. }) if !message.is_empty() => {
                message.clone()
            }
            PipelineError::Api(_) => "The CRM server could not be reached.".to_string(),
            PipelineError::InvalidAmount(_) => {
                "Please enter a valid amount for the Qualified stage.".to_string()
            }
            PipelineError::CardNotFound(_) => "Deal not found.".to_string(),
            PipelineError::Cancelled => "Action cancelled.".to_string(),
            other => other.to_string(),
        }
    }
}
