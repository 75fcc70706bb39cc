use thiserror::Error;

#[derive(Debug, Error)]
pub enum TypesError {
    #[error("invalid venue code id: {0}")]
    InvalidId(String),
}
