// ⚠️ Error taxonomy for the calculator core
// Every variant is recoverable: callers show it as a warning and keep going.

use crate::session::Bucket;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CalcError>;

#[derive(Debug, Error)]
pub enum CalcError {
    #[error("{reference_name} not found in ICE DB")]
    RecordNotFound { reference_name: String },

    #[error("{bucket} index {index} out of range (list has {len} items)")]
    IndexOutOfRange {
        bucket: Bucket,
        index: usize,
        len: usize,
    },

    #[error("Enter a calculation name before saving.")]
    EmptyName,

    #[error("calculation name {name:?} cannot be used as a file name")]
    InvalidName { name: String },

    #[error("{reference_name} has a quantity or carbon value that is not a finite number")]
    NonFiniteValue { reference_name: String },

    #[error("no saved calculation named {key:?}")]
    SessionNotFound { key: String },

    #[error("saved calculation {key:?} is corrupt: {source}")]
    CorruptSessionData {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CalcError {
    /// True for conditions the user caused (bad input or selection), false for
    /// environment failures such as an unreadable save folder.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, CalcError::Io(_))
    }
}
