//! Session store errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Unknown session: {0}")]
    UnknownSession(String),
}
