//! Core data types for `sentry-event-exporter`.
//!
//! This module defines the remote domain objects as the Sentry JSON API
//! serves them, plus the flat row this tool emits:
//! - `Organization`, `Project` - resolution handles
//! - `Issue` - a deduplicated grouping of occurrences
//! - `Event` - one concrete occurrence of an issue
//! - `ExportRecord` - the denormalized output row
//!
//! The remote API marks almost every field optional, so absence maps to an
//! empty string or zero here, never to an error. Required timestamps that
//! the service failed to send stay `None` and render as empty fields; a
//! malformed response must not abort an export that is already streaming.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// An organization handle, resolved by slug.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Organization {
    pub id: Option<String>,
    pub slug: String,
    pub name: String,
}

/// A project handle within an organization.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Project {
    pub id: Option<String>,
    pub slug: String,
    pub name: String,
}

/// The user (or team member) an issue is assigned to.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AssignedTo {
    pub username: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl AssignedTo {
    /// The name to show for this assignee. An assignee object without a
    /// username renders as `(unknown)`.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or("(unknown)")
    }
}

/// A release associated with an event.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Release {
    pub version: String,
}

/// A deduplicated grouping of one or more occurrences of the same problem.
///
/// Note `count` is a string on the wire, not a number.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Issue {
    pub id: Option<String>,
    pub assigned_to: Option<AssignedTo>,
    pub count: Option<String>,
    pub culprit: Option<String>,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
    pub level: Option<String>,
    pub logger: Option<String>,
    pub permalink: Option<String>,
    pub project: Option<Project>,
    pub share_id: Option<String>,
    pub short_id: Option<String>,
    pub status: Option<String>,
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub issue_type: Option<String>,
    pub user_count: Option<i64>,
    pub user_report_count: Option<i64>,
}

/// One concrete occurrence of an issue.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Event {
    #[serde(rename = "eventID")]
    pub event_id: String,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub message: Option<String>,
    pub release: Option<Release>,
    pub date_created: Option<DateTime<Utc>>,
    pub date_received: Option<DateTime<Utc>>,
    pub platform: Option<String>,
    #[serde(rename = "groupID")]
    pub group_id: Option<String>,
}

/// The flat output row: issue fields first, event fields after.
///
/// When a record stands for an issue without event expansion, the event
/// fields hold their defaults (empty strings, unset timestamps).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportRecord {
    pub issue_id: String,
    pub assigned_to: String,
    pub count: String,
    pub culprit: String,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
    pub level: String,
    pub logger: String,
    pub permalink: String,
    pub project: String,
    pub share_id: String,
    pub short_id: String,
    pub status: String,
    pub title: String,
    pub issue_type: String,
    pub user_count: i64,
    pub user_report_count: i64,
    pub event_id: String,
    pub event_type: String,
    pub release: String,
    pub message: String,
    pub event_created: Option<DateTime<Utc>>,
    pub event_received: Option<DateTime<Utc>>,
    pub platform: String,
    pub group_id: String,
}

impl ExportRecord {
    /// Build the base record carrying only the issue-level fields.
    #[must_use]
    pub fn from_issue(issue: &Issue) -> Self {
        Self {
            issue_id: issue.id.clone().unwrap_or_default(),
            assigned_to: issue
                .assigned_to
                .as_ref()
                .map(|u| u.display_name().to_string())
                .unwrap_or_default(),
            count: issue.count.clone().unwrap_or_default(),
            culprit: issue.culprit.clone().unwrap_or_default(),
            first_seen: issue.first_seen,
            last_seen: issue.last_seen,
            level: issue.level.clone().unwrap_or_default(),
            logger: issue.logger.clone().unwrap_or_default(),
            permalink: issue.permalink.clone().unwrap_or_default(),
            project: issue
                .project
                .as_ref()
                .map(|p| p.name.clone())
                .unwrap_or_default(),
            share_id: issue.share_id.clone().unwrap_or_default(),
            short_id: issue.short_id.clone().unwrap_or_default(),
            status: issue.status.clone().unwrap_or_default(),
            title: issue.title.clone().unwrap_or_default(),
            issue_type: issue.issue_type.clone().unwrap_or_default(),
            user_count: issue.user_count.unwrap_or(0),
            user_report_count: issue.user_report_count.unwrap_or(0),
            ..Self::default()
        }
    }

    /// Fill the event-level fields from one event.
    pub fn populate_with_event(&mut self, event: &Event) {
        self.event_id = event.event_id.clone();
        self.event_type = event.event_type.clone().unwrap_or_default();
        self.message = event.message.clone().unwrap_or_default();
        self.release = event
            .release
            .as_ref()
            .map(|r| r.version.clone())
            .unwrap_or_default();
        self.event_created = event.date_created;
        self.event_received = event.date_received;
        self.platform = event.platform.clone().unwrap_or_default();
        self.group_id = event.group_id.clone().unwrap_or_default();
    }
}

/// Build the ordered sequence of records for one issue.
///
/// With `events` absent (expansion disabled) or empty ("no events yet"),
/// this returns exactly one record with the event fields at their
/// defaults. With a non-empty event list it returns one record per event,
/// the issue fields cloned identically into each.
#[must_use]
pub fn build_records_for_issue(issue: &Issue, events: Option<&[Event]>) -> Vec<ExportRecord> {
    let base = ExportRecord::from_issue(issue);
    match events {
        None | Some([]) => vec![base],
        Some(events) => events
            .iter()
            .map(|event| {
                let mut record = base.clone();
                record.populate_with_event(event);
                record
            })
            .collect(),
    }
}
