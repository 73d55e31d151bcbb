//! Probe failure taxonomy
//!
//! Every variant's display text is the message callers see in the result
//! envelope. Probes never panic on bad input or dead networks; they return
//! one of these and the executor folds it into `success: false`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    /// Malformed or out-of-range caller input. Terminal for the call.
    #[error("{0}")]
    InvalidInput(String),

    /// The target host did not resolve to an address.
    #[error("Could not resolve host: {0}")]
    Resolution(String),

    /// Connect, timeout, or protocol failure while probing.
    #[error("{0}")]
    Network(String),

    /// An external lookup collaborator failed or answered garbage.
    #[error("{0}")]
    Collaborator(String),

    /// The requested tool has no working implementation.
    #[error("{0}")]
    Unsupported(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_passes_message_through() {
        let err = ProbeError::InvalidInput("Invalid IP address".into());
        assert_eq!(err.to_string(), "Invalid IP address");

        let err = ProbeError::Collaborator("Vendor not found".into());
        assert_eq!(err.to_string(), "Vendor not found");
    }

    #[test]
    fn test_resolution_names_the_host() {
        let err = ProbeError::Resolution("nope.invalid".into());
        assert_eq!(err.to_string(), "Could not resolve host: nope.invalid");
    }
}
