use thiserror::Error;

/// Errors returned by tracker queries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    /// A name query matched no member in the current snapshot
    #[error("No member matches \"{0}\"")]
    MemberNotFound(String),
}

pub type Result<T> = std::result::Result<T, TrackerError>;
