use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid sandbox root: {0}. root must be an absolute path")]
    RelativeRoot(String),
}
