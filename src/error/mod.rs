//! Error types for `sentry-event-exporter`.
//!
//! One structured variant per failure site so the top level can always say
//! which remote call failed, and for which issue where that applies. No
//! category is retried; everything here is fatal to the export.

use crate::client::ClientError;
use thiserror::Error;

/// Primary error type for export operations.
#[derive(Error, Debug)]
pub enum ExportError {
    /// A required configuration value is absent. Raised before any network
    /// activity.
    #[error("{0} is not specified")]
    MissingConfig(&'static str),

    /// The HTTP client could not be constructed.
    #[error("failed to create client: {source}")]
    ClientBuild {
        #[source]
        source: ClientError,
    },

    /// Organization lookup failed.
    #[error("failed to retrieve organization {organization}: {source}")]
    OrganizationLookup {
        organization: String,
        #[source]
        source: ClientError,
    },

    /// Project lookup failed.
    #[error("failed to retrieve project {project} in organization {organization}: {source}")]
    ProjectLookup {
        project: String,
        organization: String,
        #[source]
        source: ClientError,
    },

    /// An issues page fetch failed.
    #[error("failed to retrieve issues: {source}")]
    IssueFetch {
        #[source]
        source: ClientError,
    },

    /// An events page fetch failed for a specific issue.
    #[error("failed to retrieve events for issue {issue_id}: {source}")]
    EventFetch {
        issue_id: String,
        #[source]
        source: ClientError,
    },

    /// The output sink rejected a write.
    #[error("failed to render results: {0}")]
    Render(#[from] std::io::Error),

    /// Wrapped anyhow error for anything outside the taxonomy.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ExportError {
    /// Get the exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        1
    }
}

/// Result type using `ExportError`.
pub type Result<T> = std::result::Result<T, ExportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_display() {
        let err = ExportError::MissingConfig("authtoken");
        assert_eq!(err.to_string(), "authtoken is not specified");
    }

    #[test]
    fn test_lookup_display_names_the_lookup() {
        let err = ExportError::OrganizationLookup {
            organization: "acme".to_string(),
            source: ClientError::NotFound {
                url: "https://sentry.io/api/0/organizations/acme/".to_string(),
            },
        };
        let msg = err.to_string();
        assert!(msg.starts_with("failed to retrieve organization acme"));
        assert!(msg.contains("not found"));
    }

    #[test]
    fn test_event_fetch_names_the_issue() {
        let err = ExportError::EventFetch {
            issue_id: "42".to_string(),
            source: ClientError::NotFound {
                url: "https://sentry.io/api/0/issues/42/events/".to_string(),
            },
        };
        assert!(err.to_string().contains("events for issue 42"));
    }

    #[test]
    fn test_exit_code() {
        assert_eq!(ExportError::MissingConfig("project").exit_code(), 1);
    }
}
