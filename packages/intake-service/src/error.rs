use crate::guardrails::BlockedReason;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Validation failed: {message}")]
	Validation { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Conflict: {message}")]
	Conflict { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Configuration error: {message}")]
	Configuration { message: String },
	#[error("Blocked: {reason}")]
	Blocked { reason: BlockedReason },
}
impl Error {
	/// Transient failures are worth a requeue; validation, configuration and
	/// guardrail outcomes are not.
	pub fn is_retryable(&self) -> bool {
		matches!(self, Self::Provider { .. } | Self::Storage { .. })
	}
}
impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}
impl From<intake_storage::Error> for Error {
	fn from(err: intake_storage::Error) -> Self {
		match err {
			intake_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			intake_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			intake_storage::Error::NotFound(message) => Self::NotFound { message },
			intake_storage::Error::Conflict(message) => Self::Conflict { message },
		}
	}
}
impl From<intake_providers::Error> for Error {
	fn from(err: intake_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
