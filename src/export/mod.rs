//! The export pipeline.
//!
//! Drives the complete export as a strictly sequential state machine:
//! header, organization and project resolution, the issues page loop
//! (with an inner events page loop per issue when expansion is on),
//! footer, finalize. At most one page of issues, plus one page of events
//! for the issue in hand, is ever held in memory; every page is rendered
//! and released before the next fetch. Rows come out exactly in service
//! order.
//!
//! Every retrieval error is fatal and wrapped with the failing call (and
//! the issue, where one applies). The renderer's `fini` runs on all
//! paths, including errors; rows already rendered before a late failure
//! stay in the output.

use crate::client::{SentryApi, SentryClient};
use crate::error::{ExportError, Result};
use crate::model::{Issue, build_records_for_issue};
use crate::render::Renderer;
use tracing::{debug, info};

/// Immutable input for one export run.
#[derive(Debug, Clone, Default)]
pub struct ExporterConfig {
    pub auth_token: String,
    /// API endpoint; `None` selects the well-known default.
    pub endpoint: Option<String>,
    pub organization: String,
    pub project: String,
    /// Optional time-window filter, e.g. `24h` or `14d`.
    pub stats_period: Option<String>,
    /// Optional search-query string for the issues listing.
    pub query: Option<String>,
    /// Expand each issue into one row per event.
    pub include_events: bool,
}

/// Streams issues (and optionally events) through a renderer.
pub struct Exporter<C, R> {
    config: ExporterConfig,
    client: C,
    renderer: R,
}

impl<R: Renderer> Exporter<SentryClient, R> {
    /// Build an exporter with a real HTTP client from the configuration.
    pub fn from_config(config: ExporterConfig, renderer: R) -> Result<Self> {
        let client = SentryClient::new(&config.auth_token, config.endpoint.as_deref())
            .map_err(|source| ExportError::ClientBuild { source })?;
        Ok(Self::new(config, client, renderer))
    }
}

impl<C: SentryApi, R: Renderer> Exporter<C, R> {
    /// Build an exporter around an arbitrary API implementation.
    pub fn new(config: ExporterConfig, client: C, renderer: R) -> Self {
        Self {
            config,
            client,
            renderer,
        }
    }

    /// Run the export to completion.
    ///
    /// Consumes the exporter; `fini` on the renderer runs whether or not
    /// the run succeeded.
    pub fn export(mut self) -> Result<()> {
        let result = self.run();
        self.renderer.fini();
        result
    }

    fn run(&mut self) -> Result<()> {
        self.renderer.render_header()?;

        let org = self
            .client
            .get_organization(&self.config.organization)
            .map_err(|source| ExportError::OrganizationLookup {
                organization: self.config.organization.clone(),
                source,
            })?;
        debug!(organization = %org.slug, "resolved organization");
        let project = self
            .client
            .get_project(&org, &self.config.project)
            .map_err(|source| ExportError::ProjectLookup {
                project: self.config.project.clone(),
                organization: self.config.organization.clone(),
                source,
            })?;
        debug!(project = %project.slug, "resolved project");

        let (mut issues, mut cursor) = self
            .client
            .list_issues(
                &org,
                &project,
                self.config.stats_period.as_deref(),
                self.config.query.as_deref(),
            )
            .map_err(|source| ExportError::IssueFetch { source })?;
        let mut pages = 1usize;
        let mut total = 0usize;
        loop {
            debug!(page = pages, issues = issues.len(), "rendering issues page");
            total += issues.len();
            self.render_issues(&issues)?;
            match cursor.take() {
                Some(c) => {
                    let page = self
                        .client
                        .next_issues(&c)
                        .map_err(|source| ExportError::IssueFetch { source })?;
                    issues = page.0;
                    cursor = page.1;
                    pages += 1;
                }
                None => break,
            }
        }
        info!(pages, issues = total, "export complete");

        self.renderer.render_footer()?;
        Ok(())
    }

    fn render_issues(&mut self, issues: &[Issue]) -> Result<()> {
        for issue in issues {
            if self.config.include_events {
                self.render_issue_with_events(issue)?;
            } else {
                let records = build_records_for_issue(issue, None);
                self.renderer.render_partial_results(&records)?;
            }
        }
        Ok(())
    }

    fn render_issue_with_events(&mut self, issue: &Issue) -> Result<()> {
        let wrap_err = |source| ExportError::EventFetch {
            issue_id: issue.id.clone().unwrap_or_default(),
            source,
        };

        let (events, mut cursor) = self.client.list_events(issue).map_err(wrap_err)?;
        // The "no events yet" placeholder row applies to the first page
        // only; an empty continuation page renders nothing.
        let records = build_records_for_issue(issue, Some(&events));
        self.renderer.render_partial_results(&records)?;
        while let Some(c) = cursor {
            let (events, next) = self.client.next_events(&c).map_err(wrap_err)?;
            if !events.is_empty() {
                let records = build_records_for_issue(issue, Some(&events));
                self.renderer.render_partial_results(&records)?;
            }
            cursor = next;
        }
        Ok(())
    }
}
