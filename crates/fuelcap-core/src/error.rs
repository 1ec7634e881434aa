use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Memory range {address:#x}+{len} is not mapped or not readable")]
    UnmappedMemory { address: u64, len: usize },

    #[error("Failed to read memory at address {address:#x}: {message}")]
    MemoryReadFailed { address: u64, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is a "file not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }

    /// Check if this error only means the probed range was unreadable
    pub fn is_unmapped(&self) -> bool {
        matches!(self, Error::UnmappedMemory { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_not_found() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::Io(io_err);
        assert!(err.is_not_found());

        let other_io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err2 = Error::Io(other_io_err);
        assert!(!err2.is_not_found());
    }

    #[test]
    fn test_error_is_unmapped() {
        let err = Error::UnmappedMemory {
            address: 0x1000,
            len: 8,
        };
        assert!(err.is_unmapped());
        assert_eq!(
            err.to_string(),
            "Memory range 0x1000+8 is not mapped or not readable"
        );
        assert!(!Error::InvalidConfig("x".into()).is_unmapped());
    }

    #[test]
    fn test_toml_error_converts() {
        fn parse(text: &str) -> Result<toml::Value> {
            Ok(toml::from_str(text)?)
        }
        let err = parse("search_radius = ").unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }
}
