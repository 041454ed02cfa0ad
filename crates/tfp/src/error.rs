//! Error types for the bridge client.

/// Errors that can occur while talking to the bridge daemon.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not connected")]
    NotConnected,

    #[error("Already connected")]
    AlreadyConnected,

    #[error("Connection closed while waiting for response")]
    ConnectionClosed,

    #[error("Did not receive response in time")]
    Timeout,

    #[error("Got invalid parameter for function")]
    InvalidParameter,

    #[error("Function is not supported")]
    FunctionNotSupported,

    #[error("Device reported unknown error code {0}")]
    UnknownErrorCode(u8),

    #[error("UID \"{0}\" is invalid")]
    InvalidUid(String),

    #[error("Malformed packet: {0}")]
    MalformedPacket(String),
}

impl Error {
    /// Map a response error code (header bits 6-7) to an error.
    ///
    /// Returns `None` for code 0, which means success.
    pub fn from_error_code(code: u8) -> Option<Self> {
        match code {
            0 => None,
            1 => Some(Error::InvalidParameter),
            2 => Some(Error::FunctionNotSupported),
            other => Some(Error::UnknownErrorCode(other)),
        }
    }
}

/// Result alias for bridge operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        assert!(Error::from_error_code(0).is_none());
        assert!(matches!(Error::from_error_code(1), Some(Error::InvalidParameter)));
        assert!(matches!(Error::from_error_code(2), Some(Error::FunctionNotSupported)));
        assert!(matches!(Error::from_error_code(3), Some(Error::UnknownErrorCode(3))));
    }
}
