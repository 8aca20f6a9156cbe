use thiserror::Error;

pub type Result<T> = std::result::Result<T, MessageError>;

/// Errors raised by URI parsing and stream seeking.
///
/// Every other operation in this crate is infallible: setters accept any
/// string and derivations always produce a complete new instance.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessageError {
    #[error("invalid uri {uri:?}: {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("unsupported whence {whence}")]
    UnsupportedSeek { whence: i32 },

    #[error("invalid offset {offset}, max allowed {max}")]
    InvalidOffset { offset: i64, max: usize },
}

impl MessageError {
    pub fn invalid_uri<S: ToString>(uri: &str, reason: S) -> Self {
        Self::InvalidUri {
            uri: uri.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_offset(offset: i64, max: usize) -> Self {
        Self::InvalidOffset { offset, max }
    }
}

impl From<MessageError> for std::io::Error {
    fn from(err: MessageError) -> Self {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, err)
    }
}
