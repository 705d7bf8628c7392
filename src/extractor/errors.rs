use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("parse error: {0}")]
    Parse(#[from] std::str::Utf8Error),
}
