//! Error taxonomy for design extraction.

use thiserror::Error;

/// Errors surfaced by the extraction engine.
///
/// A settle timeout and a page without a logo are normal outcomes and have no
/// variant here.
#[derive(Debug, Error)]
pub enum DesignError {
    /// The URL was missing or could not be parsed.
    #[error("invalid url: {0}")]
    InvalidInput(String),

    /// The URL used a scheme other than http or https.
    #[error("unsupported protocol: {0}")]
    UnsupportedProtocol(String),

    /// Navigation, session or query failure inside the renderer.
    #[error("rendering failed: {0:#}")]
    Rendering(#[from] anyhow::Error),

    /// The document had no root content container to sample colors from.
    #[error("page has no content region to sample colors from")]
    NoDominantRegion,

    /// The renderer reported a computed color that could not be parsed.
    #[error("unparseable computed color: {0:?}")]
    UnparseableColor(String),
}

impl DesignError {
    /// Whether the error was caused by the caller's input rather than the page.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DesignError::InvalidInput(_) | DesignError::UnsupportedProtocol(_)
        )
    }
}

pub type Result<T, E = DesignError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors() {
        assert!(DesignError::InvalidInput("".into()).is_client_error());
        assert!(DesignError::UnsupportedProtocol("ftp".into()).is_client_error());
        assert!(!DesignError::NoDominantRegion.is_client_error());
        assert!(!DesignError::Rendering(anyhow::anyhow!("boom")).is_client_error());
    }

    #[test]
    fn test_rendering_error_keeps_context_chain() {
        let err: DesignError = anyhow::anyhow!("connection reset")
            .context("navigating to https://example.com/")
            .into();
        let msg = err.to_string();
        assert!(msg.contains("navigating to https://example.com/"));
        assert!(msg.contains("connection reset"));
    }
}
