use thiserror::Error;

/// Failure taxonomy shared by the remote client, the domain normalizer and
/// the tool layer. Messages are surfaced to callers as-is, so they carry the
/// upstream text verbatim where one exists.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum OdooError {
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("invalid domain: {0}")]
    InvalidDomain(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("remote call failed: {0}")]
    RemoteCall(String),
}

impl OdooError {
    /// Stable snake_case class name, used as a structured log field.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Authentication(_) => "authentication",
            Self::InvalidDomain(_) => "invalid_domain",
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation",
            Self::RemoteCall(_) => "remote_call",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}
