//! Scrape error types

use thiserror::Error;

/// Errors raised while scraping an inventory
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// A mandatory parameter is missing or the config file is unreadable
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The backing API client could not be constructed
    #[error("{context}: {source:#}")]
    ServiceInit {
        context: String,
        source: anyhow::Error,
    },

    /// A region or cluster lookup failed in transport
    #[error("{context}: {source:#}")]
    Lookup {
        context: String,
        source: anyhow::Error,
    },

    #[error("no {0} with specified param")]
    NotFound(String),

    #[error("malformed node-group reference: {0}")]
    MalformedReference(String),

    /// The shared scope was cancelled before the task started
    #[error("canceled: {0}")]
    Cancelled(String),

    /// A paginated listing call failed mid-stream
    #[error("{context}: {source:#}")]
    PageFetch {
        context: String,
        source: anyhow::Error,
    },

    /// An enumeration task panicked or was aborted
    #[error("enumeration task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("{context}: {source}")]
    Context {
        context: String,
        source: Box<ScrapeError>,
    },
}

/// Discriminant of [`ScrapeError`] that sees through context wrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    ServiceInit,
    Lookup,
    NotFound,
    MalformedReference,
    Cancelled,
    PageFetch,
    Task,
}

impl ScrapeError {
    pub fn lookup(context: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Lookup {
            context: context.into(),
            source,
        }
    }

    pub fn page_fetch(context: impl Into<String>, source: anyhow::Error) -> Self {
        Self::PageFetch {
            context: context.into(),
            source,
        }
    }

    pub fn service_init(context: impl Into<String>, source: anyhow::Error) -> Self {
        Self::ServiceInit {
            context: context.into(),
            source,
        }
    }

    /// Wrap with a description of the failing operation, keeping the kind
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::ServiceInit { .. } => ErrorKind::ServiceInit,
            Self::Lookup { .. } => ErrorKind::Lookup,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::MalformedReference(_) => ErrorKind::MalformedReference,
            Self::Cancelled(_) => ErrorKind::Cancelled,
            Self::PageFetch { .. } => ErrorKind::PageFetch,
            Self::Task(_) => ErrorKind::Task,
            Self::Context { source, .. } => source.kind(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind() == ErrorKind::Cancelled
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_keeps_kind() {
        let err = ScrapeError::MalformedReference("bogus".to_string())
            .context("resolve cluster")
            .context("topology phase");

        assert_eq!(err.kind(), ErrorKind::MalformedReference);
        assert_eq!(
            err.to_string(),
            "topology phase: resolve cluster: malformed node-group reference: bogus"
        );
    }

    #[test]
    fn test_transport_chain_is_rendered() {
        let source = anyhow::anyhow!("API request failed: 500").context("Failed to list");
        let err = ScrapeError::page_fetch("unable to obtain compute instances", source);

        assert_eq!(err.kind(), ErrorKind::PageFetch);
        assert_eq!(
            err.to_string(),
            "unable to obtain compute instances: Failed to list: API request failed: 500"
        );
    }

    #[test]
    fn test_cancelled_detection() {
        assert!(ScrapeError::Cancelled("zone a".into()).is_cancelled());
        assert!(ScrapeError::Cancelled("zone a".into())
            .context("outer")
            .is_cancelled());
        assert!(!ScrapeError::NotFound("cluster".into()).is_cancelled());
    }
}
