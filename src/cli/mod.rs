//! CLI definitions and search-query assembly.

use crate::error::{ExportError, Result};
use crate::export::ExporterConfig;
use clap::Parser;
use once_cell::sync::Lazy;
use regex::Regex;

/// Stream Sentry issues (and optionally their events) to CSV
#[derive(Parser, Debug)]
#[command(name = "sentry-event-exporter", author, version, about, long_about = None)]
pub struct Cli {
    /// Sentry authentication token (get it at
    /// <https://sentry.io/settings/account/api/auth-tokens/>)
    #[arg(long, env = "SENTRY_AUTHTOKEN", hide_env_values = true)]
    pub authtoken: Option<String>,

    /// Sentry API endpoint
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Organization slug
    #[arg(long)]
    pub organization: Option<String>,

    /// Project slug
    #[arg(long)]
    pub project: Option<String>,

    /// Include events in the result
    #[arg(long)]
    pub events: bool,

    /// Restrict issues to a stats period (e.g. "24h", "14d")
    #[arg(long)]
    pub stats_period: Option<String>,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long)]
    pub quiet: bool,

    /// Search terms, joined into one query (a `tag:` prefix passes
    /// through unquoted)
    #[arg(value_name = "QUERY")]
    pub query: Vec<String>,
}

impl Cli {
    /// Validate the arguments into an immutable export configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the auth token, organization,
    /// or project is missing. No network activity happens here.
    pub fn into_config(self) -> Result<ExporterConfig> {
        let auth_token = self
            .authtoken
            .filter(|t| !t.is_empty())
            .ok_or(ExportError::MissingConfig("authtoken"))?;
        let organization = self
            .organization
            .filter(|o| !o.is_empty())
            .ok_or(ExportError::MissingConfig("organization"))?;
        let project = self
            .project
            .filter(|p| !p.is_empty())
            .ok_or(ExportError::MissingConfig("project"))?;
        Ok(ExporterConfig {
            auth_token,
            // An empty endpoint means "use the default".
            endpoint: self.endpoint.filter(|e| !e.is_empty()),
            organization,
            project,
            stats_period: self.stats_period,
            query: build_query(&self.query),
            include_events: self.events,
        })
    }
}

static TAG_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\w+:").expect("valid regex"));

/// Join free-form search terms into one query string.
///
/// Terms containing whitespace are wrapped in double quotes with internal
/// quotes backslash-escaped. A leading `word:` tag prefix stays outside
/// the quotes so the service still parses it as a tag filter.
#[must_use]
pub fn build_query(terms: &[String]) -> Option<String> {
    if terms.is_empty() {
        return None;
    }
    let mut out = String::with_capacity(terms.iter().map(|t| t.len() + 1).sum());
    for (i, term) in terms.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let mut rest = term.as_str();
        if let Some(tag) = TAG_PREFIX.find(rest) {
            out.push_str(tag.as_str());
            rest = &rest[tag.end()..];
        }
        if rest.contains([' ', '\t', '\n', '\r']) {
            out.push('"');
            out.push_str(&rest.replace('"', "\\\""));
            out.push('"');
        } else {
            out.push_str(rest);
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    fn minimal_cli() -> Cli {
        Cli {
            authtoken: Some("token".to_string()),
            endpoint: None,
            organization: Some("acme".to_string()),
            project: Some("web".to_string()),
            events: false,
            stats_period: None,
            verbose: 0,
            quiet: false,
            query: Vec::new(),
        }
    }

    #[test]
    fn test_build_query_empty() {
        assert_eq!(build_query(&[]), None);
    }

    #[test]
    fn test_build_query_plain_terms_joined_with_spaces() {
        assert_eq!(
            build_query(&terms(&["timeout", "database"])),
            Some("timeout database".to_string())
        );
    }

    #[test]
    fn test_build_query_quotes_whitespace() {
        assert_eq!(
            build_query(&terms(&["null pointer"])),
            Some("\"null pointer\"".to_string())
        );
    }

    #[test]
    fn test_build_query_escapes_embedded_quotes() {
        assert_eq!(
            build_query(&terms(&["say \"hi\" now"])),
            Some("\"say \\\"hi\\\" now\"".to_string())
        );
    }

    #[test]
    fn test_build_query_tag_prefix_stays_unquoted() {
        assert_eq!(
            build_query(&terms(&["is:unresolved", "server:web 1"])),
            Some("is:unresolved server:\"web 1\"".to_string())
        );
    }

    #[test]
    fn test_build_query_tag_only_term() {
        assert_eq!(
            build_query(&terms(&["release:1.4.2"])),
            Some("release:1.4.2".to_string())
        );
    }

    #[test]
    fn test_into_config_requires_authtoken() {
        let cli = Cli {
            authtoken: None,
            ..minimal_cli()
        };
        let err = cli.into_config().unwrap_err();
        assert_eq!(err.to_string(), "authtoken is not specified");
    }

    #[test]
    fn test_into_config_requires_organization() {
        let cli = Cli {
            organization: Some(String::new()),
            ..minimal_cli()
        };
        let err = cli.into_config().unwrap_err();
        assert_eq!(err.to_string(), "organization is not specified");
    }

    #[test]
    fn test_into_config_requires_project() {
        let cli = Cli {
            project: None,
            ..minimal_cli()
        };
        let err = cli.into_config().unwrap_err();
        assert_eq!(err.to_string(), "project is not specified");
    }

    #[test]
    fn test_into_config_normalizes_empty_endpoint() {
        let cli = Cli {
            endpoint: Some(String::new()),
            ..minimal_cli()
        };
        let config = cli.into_config().unwrap();
        assert_eq!(config.endpoint, None);
    }

    #[test]
    fn test_into_config_carries_query_and_flags() {
        let cli = Cli {
            events: true,
            stats_period: Some("24h".to_string()),
            query: terms(&["is:unresolved", "slow request"]),
            ..minimal_cli()
        };
        let config = cli.into_config().unwrap();
        assert!(config.include_events);
        assert_eq!(config.stats_period.as_deref(), Some("24h"));
        assert_eq!(
            config.query.as_deref(),
            Some("is:unresolved \"slow request\"")
        );
    }

    #[test]
    fn test_cli_parses_trailing_query_terms() {
        let cli = Cli::parse_from([
            "sentry-event-exporter",
            "--authtoken",
            "t",
            "--organization",
            "acme",
            "--project",
            "web",
            "--events",
            "is:unresolved",
            "timeout",
        ]);
        assert!(cli.events);
        assert_eq!(cli.query, terms(&["is:unresolved", "timeout"]));
    }
}
