use thiserror::Error;

use crate::sim::{AttractorId, ParticleId};

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to the driver.
///
/// The physics loop itself never fails: degenerate geometry is handled with
/// epsilons and tunables are clamped. Only construction and lookups error.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid construction parameter (non-positive radius or mass, etc).
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// No particle with this handle exists.
    #[error("unknown particle {0}")]
    UnknownParticle(ParticleId),

    /// No attractor with this handle exists.
    #[error("unknown attractor {0}")]
    UnknownAttractor(AttractorId),

    /// Malformed world parameter document.
    #[error("config: {0}")]
    Config(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_is_informative() {
        let e = Error::InvalidParam("radius must be finite and > 0".to_string());
        let msg = format!("{e}");
        assert!(msg.contains("invalid parameter"));
        assert!(msg.contains("radius"));
    }

    #[test]
    fn unknown_handle_names_the_id() {
        let e = Error::UnknownParticle(ParticleId(42));
        assert_eq!(e.to_string(), "unknown particle #42");
    }

    #[test]
    fn config_error_converts() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let e: Error = parse.unwrap_err().into();
        assert!(e.to_string().starts_with("config:"));
    }
}
