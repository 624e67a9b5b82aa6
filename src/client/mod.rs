//! Sentry API client.
//!
//! The export pipeline only depends on the [`SentryApi`] trait; the
//! [`SentryClient`] here implements it over a blocking HTTP client.
//! Pagination follows the service's `Link` response header: the export
//! continues while the `rel="next"` link carries `results="true"`, using
//! the link's URL as an opaque continuation token.

use crate::model::{Event, Issue, Organization, Project};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, LINK};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// The default API endpoint when none is configured.
pub const DEFAULT_ENDPOINT: &str = "https://sentry.io/api/0/";

/// Errors raised by the API collaborator.
///
/// "Not found" stays distinct from transport failures; the exporter treats
/// both as fatal, but a future retry policy must be able to tell them
/// apart.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The configured endpoint is not a valid URL.
    #[error("invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),

    /// The auth token contains bytes that cannot go into a header.
    #[error("invalid authentication token")]
    InvalidToken,

    /// The underlying HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    /// The requested resource does not exist.
    #[error("not found: {url}")]
    NotFound { url: String },

    /// The service answered with an unexpected status.
    #[error("unexpected status {status} for {url}")]
    Status { status: StatusCode, url: String },

    /// The request could not be completed.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body did not match the expected shape.
    #[error("malformed response: {0}")]
    Decode(#[source] reqwest::Error),

    /// An issue arrived without an id, so its events cannot be listed.
    #[error("issue has no id")]
    MissingIssueId,
}

/// Opaque continuation token for a paged listing.
///
/// Wraps the ready-to-fetch URL of the next page. `None` in a [`Page`]
/// means the listing is exhausted.
#[derive(Debug, Clone)]
pub struct Cursor {
    url: Url,
}

impl Cursor {
    /// Wrap a ready-to-fetch next-page URL. Substitute [`SentryApi`]
    /// implementations use this to mint their own continuation tokens.
    #[must_use]
    pub fn from_url(url: Url) -> Self {
        Self { url }
    }

    #[must_use]
    pub fn as_url(&self) -> &Url {
        &self.url
    }
}

/// One page of results plus the cursor for the next one, if any.
pub type Page<T> = (Vec<T>, Option<Cursor>);

/// The listing operations the export pipeline consumes.
///
/// Any substitute implementation (tests use an in-memory one) must honor
/// the cursor contract: keep returning pages while the previous page's
/// cursor is `Some`.
pub trait SentryApi {
    /// Resolve an organization by slug.
    fn get_organization(&self, slug: &str) -> Result<Organization, ClientError>;

    /// Resolve a project by slug within an organization.
    fn get_project(&self, org: &Organization, slug: &str) -> Result<Project, ClientError>;

    /// List the first page of issues matching the configured filters.
    fn list_issues(
        &self,
        org: &Organization,
        project: &Project,
        stats_period: Option<&str>,
        query: Option<&str>,
    ) -> Result<Page<Issue>, ClientError>;

    /// Fetch the next page of issues.
    fn next_issues(&self, cursor: &Cursor) -> Result<Page<Issue>, ClientError>;

    /// List the first page of events for an issue.
    fn list_events(&self, issue: &Issue) -> Result<Page<Event>, ClientError>;

    /// Fetch the next page of events.
    fn next_events(&self, cursor: &Cursor) -> Result<Page<Event>, ClientError>;
}

impl<T: SentryApi + ?Sized> SentryApi for &T {
    fn get_organization(&self, slug: &str) -> Result<Organization, ClientError> {
        (**self).get_organization(slug)
    }

    fn get_project(&self, org: &Organization, slug: &str) -> Result<Project, ClientError> {
        (**self).get_project(org, slug)
    }

    fn list_issues(
        &self,
        org: &Organization,
        project: &Project,
        stats_period: Option<&str>,
        query: Option<&str>,
    ) -> Result<Page<Issue>, ClientError> {
        (**self).list_issues(org, project, stats_period, query)
    }

    fn next_issues(&self, cursor: &Cursor) -> Result<Page<Issue>, ClientError> {
        (**self).next_issues(cursor)
    }

    fn list_events(&self, issue: &Issue) -> Result<Page<Event>, ClientError> {
        (**self).list_events(issue)
    }

    fn next_events(&self, cursor: &Cursor) -> Result<Page<Event>, ClientError> {
        (**self).next_events(cursor)
    }
}

/// Blocking HTTP implementation of [`SentryApi`].
#[derive(Debug)]
pub struct SentryClient {
    http: Client,
    endpoint: Url,
}

impl SentryClient {
    /// Construct a client from a bearer token and optional endpoint.
    ///
    /// # Errors
    ///
    /// Fails if the endpoint is not a valid URL, the token cannot be sent
    /// as a header, or the HTTP client cannot be built.
    pub fn new(auth_token: &str, endpoint: Option<&str>) -> Result<Self, ClientError> {
        let mut endpoint = Url::parse(endpoint.unwrap_or(DEFAULT_ENDPOINT))?;
        // Url::join drops the last path segment unless the base ends in '/'.
        if !endpoint.path().ends_with('/') {
            endpoint.set_path(&format!("{}/", endpoint.path()));
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {auth_token}"))
            .map_err(|_| ClientError::InvalidToken)?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(ClientError::Build)?;
        Ok(Self { http, endpoint })
    }

    fn get_page<T: DeserializeOwned>(&self, url: Url) -> Result<(T, Option<Cursor>), ClientError> {
        debug!(url = %url, "GET");
        let response = self.http.get(url.clone()).send()?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(ClientError::Status {
                status,
                url: url.to_string(),
            });
        }
        let cursor = next_cursor(response.headers());
        let body = response.json().map_err(ClientError::Decode)?;
        Ok((body, cursor))
    }

    fn resource_url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.endpoint.join(path)?)
    }
}

impl SentryApi for SentryClient {
    fn get_organization(&self, slug: &str) -> Result<Organization, ClientError> {
        let url = self.resource_url(&format!("organizations/{slug}/"))?;
        let (org, _) = self.get_page(url)?;
        Ok(org)
    }

    fn get_project(&self, org: &Organization, slug: &str) -> Result<Project, ClientError> {
        let url = self.resource_url(&format!("projects/{}/{slug}/", org.slug))?;
        let (project, _) = self.get_page(url)?;
        Ok(project)
    }

    fn list_issues(
        &self,
        org: &Organization,
        project: &Project,
        stats_period: Option<&str>,
        query: Option<&str>,
    ) -> Result<Page<Issue>, ClientError> {
        let mut url =
            self.resource_url(&format!("projects/{}/{}/issues/", org.slug, project.slug))?;
        if stats_period.is_some() || query.is_some() {
            let mut pairs = url.query_pairs_mut();
            if let Some(period) = stats_period {
                pairs.append_pair("statsPeriod", period);
            }
            if let Some(query) = query {
                pairs.append_pair("query", query);
            }
        }
        self.get_page(url)
    }

    fn next_issues(&self, cursor: &Cursor) -> Result<Page<Issue>, ClientError> {
        self.get_page(cursor.url.clone())
    }

    fn list_events(&self, issue: &Issue) -> Result<Page<Event>, ClientError> {
        let id = issue.id.as_deref().ok_or(ClientError::MissingIssueId)?;
        let url = self.resource_url(&format!("issues/{id}/events/"))?;
        self.get_page(url)
    }

    fn next_events(&self, cursor: &Cursor) -> Result<Page<Event>, ClientError> {
        self.get_page(cursor.url.clone())
    }
}

/// Extract the next-page cursor from a `Link` response header.
///
/// The service marks the `rel="next"` link with `results="true"` while
/// more pages exist; anything else means the listing is done.
fn next_cursor(headers: &HeaderMap) -> Option<Cursor> {
    let link = headers.get(LINK)?.to_str().ok()?;
    for part in link.split(',') {
        let mut url = None;
        let mut rel = None;
        let mut results = None;
        for segment in part.split(';') {
            let segment = segment.trim();
            if segment.starts_with('<') && segment.ends_with('>') {
                url = Some(&segment[1..segment.len() - 1]);
            } else if let Some(value) = segment.strip_prefix("rel=") {
                rel = Some(value.trim_matches('"'));
            } else if let Some(value) = segment.strip_prefix("results=") {
                results = Some(value.trim_matches('"'));
            }
        }
        if rel == Some("next") && results == Some("true") {
            if let Some(url) = url.and_then(|u| Url::parse(u).ok()) {
                return Some(Cursor { url });
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link_headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(LINK, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_next_cursor_follows_next_with_results() {
        let headers = link_headers(
            "<https://sentry.io/api/0/projects/acme/web/issues/?cursor=100:0:1>; \
             rel=\"previous\"; results=\"false\"; cursor=\"100:0:1\", \
             <https://sentry.io/api/0/projects/acme/web/issues/?cursor=100:100:0>; \
             rel=\"next\"; results=\"true\"; cursor=\"100:100:0\"",
        );
        let cursor = next_cursor(&headers).expect("cursor");
        assert_eq!(
            cursor.as_url().as_str(),
            "https://sentry.io/api/0/projects/acme/web/issues/?cursor=100:100:0"
        );
    }

    #[test]
    fn test_next_cursor_stops_when_results_false() {
        let headers = link_headers(
            "<https://sentry.io/api/0/projects/acme/web/issues/?cursor=100:100:0>; \
             rel=\"next\"; results=\"false\"; cursor=\"100:100:0\"",
        );
        assert!(next_cursor(&headers).is_none());
    }

    #[test]
    fn test_next_cursor_ignores_previous_link_only() {
        let headers = link_headers(
            "<https://sentry.io/api/0/projects/acme/web/issues/?cursor=100:0:1>; \
             rel=\"previous\"; results=\"true\"; cursor=\"100:0:1\"",
        );
        assert!(next_cursor(&headers).is_none());
    }

    #[test]
    fn test_next_cursor_absent_header() {
        assert!(next_cursor(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_client_new_rejects_bad_endpoint() {
        let err = SentryClient::new("token", Some("::not a url::")).unwrap_err();
        assert!(matches!(err, ClientError::Endpoint(_)));
    }

    #[test]
    fn test_client_new_defaults_endpoint() {
        let client = SentryClient::new("token", None).unwrap();
        assert_eq!(client.endpoint.as_str(), DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_resource_url_joins_relative_paths() {
        let client = SentryClient::new("token", Some("https://sentry.example.com/api/0")).unwrap();
        let url = client.resource_url("organizations/acme/").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sentry.example.com/api/0/organizations/acme/"
        );
    }

    #[test]
    fn test_client_new_rejects_bad_token() {
        let err = SentryClient::new("tok\nen", None).unwrap_err();
        assert!(matches!(err, ClientError::InvalidToken));
    }
}
