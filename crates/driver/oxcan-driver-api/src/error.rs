//! Driver error types.

use core::fmt;

/// Errors that can occur while a driver talks to its host environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    /// The hardware device was not found or did not respond.
    DeviceNotFound,
    /// Driver initialization failed.
    InitFailed,
    /// The requested operation is not supported by this host.
    Unsupported,
    /// An I/O error occurred during a hardware operation.
    IoError,
    /// The driver is not in a valid state for this operation.
    InvalidState,
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceNotFound => f.write_str("device not found"),
            Self::InitFailed => f.write_str("driver initialization failed"),
            Self::Unsupported => f.write_str("operation not supported"),
            Self::IoError => f.write_str("I/O error"),
            Self::InvalidState => f.write_str("invalid driver state"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_all_variants() {
        assert_eq!(
            format!("{}", DriverError::DeviceNotFound),
            "device not found"
        );
        assert_eq!(
            format!("{}", DriverError::InitFailed),
            "driver initialization failed"
        );
        assert_eq!(
            format!("{}", DriverError::Unsupported),
            "operation not supported"
        );
        assert_eq!(format!("{}", DriverError::IoError), "I/O error");
        assert_eq!(
            format!("{}", DriverError::InvalidState),
            "invalid driver state"
        );
    }
}
