use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Access fault reading {size} bytes at {address:#x}")]
    AccessFault { address: u64, size: usize },

    #[error("Pattern not found in scanned memory")]
    NotFound,

    #[error("Candidate at {address:#x} rejected by validity check")]
    InvalidCandidate { address: u64 },

    #[error("Search pattern is empty")]
    EmptyPattern,

    #[error("Read of {size} bytes at {address:#x} exceeds its bounds")]
    BoundsOverflow { address: u64, size: usize },

    #[error("Failed to query memory region at {address:#x}")]
    RegionQuery { address: u64 },

    #[error("Failed to resolve module base address: {0}")]
    ModuleBase(String),

    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Offset not configured: {0}")]
    MissingOffset(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unsupported: {0}")]
    Unsupported(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error came from touching memory that could not be read
    pub fn is_access_fault(&self) -> bool {
        matches!(self, Error::AccessFault { .. })
    }

    /// Check if this error is a "file not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
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
    fn test_access_fault_display() {
        let err = Error::AccessFault {
            address: 0xDEAD0000,
            size: 16,
        };
        assert!(err.is_access_fault());
        assert_eq!(
            err.to_string(),
            "Access fault reading 16 bytes at 0xdead0000"
        );
    }
}
