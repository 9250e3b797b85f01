//! Extraction errors

use thiserror::Error;

/// Fatal extraction failure
///
/// Field- and node-level faults never surface here; they are absorbed into
/// the output. Only a missing document or a lost session aborts a run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractError {
    #[error("No document is open in the session")]
    NoOpenDocument,

    #[error("Connection to the CAD session lost: {0}")]
    Connection(String),
}

pub type ExtractResult<T> = Result<T, ExtractError>;
