//! Tabular rendering for `sentry-event-exporter`.
//!
//! A renderer turns a stream of [`ExportRecord`]s into bytes on an output
//! sink through four ordered lifecycle operations: header once, partial
//! results any number of times, footer once, then `fini` as the last step
//! on every path. Each partial-results call is independent and
//! append-only, so pages can be rendered as they arrive.
//!
//! The record schema is an explicit ordered field list rather than
//! anything derived from the struct at runtime, which makes the column
//! order a testable contract.

pub mod csv;

pub use csv::CsvRenderer;

use crate::model::ExportRecord;
use chrono::{DateTime, SecondsFormat, Utc};
use std::borrow::Cow;
use std::io;

/// Field names of the flat record schema, in output order.
pub const FIELD_NAMES: &[&str] = &[
    "IssueID",
    "AssignedTo",
    "Count",
    "Culprit",
    "FirstSeen",
    "LastSeen",
    "Level",
    "Logger",
    "Permalink",
    "Project",
    "ShareID",
    "ShortID",
    "Status",
    "Title",
    "IssueType",
    "UserCount",
    "UserReportCount",
    "EventID",
    "EventType",
    "Release",
    "Message",
    "EventCreated",
    "EventReceived",
    "Platform",
    "GroupID",
];

/// One cell value, tagged with the rule for turning it into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Str(&'a str),
    Timestamp(Option<DateTime<Utc>>),
    Int(i64),
    Unknown,
}

impl<'a> FieldValue<'a> {
    /// Stringify this value. Strings pass through verbatim, timestamps
    /// render as RFC 3339 (empty when never set), integers as base-10,
    /// and anything unrecognized as the literal `N/A` so the value layer
    /// cannot fail.
    #[must_use]
    pub fn render(self) -> Cow<'a, str> {
        match self {
            Self::Str(s) => Cow::Borrowed(s),
            Self::Timestamp(Some(t)) => {
                Cow::Owned(t.to_rfc3339_opts(SecondsFormat::Secs, true))
            }
            Self::Timestamp(None) => Cow::Borrowed(""),
            Self::Int(i) => Cow::Owned(i.to_string()),
            Self::Unknown => Cow::Borrowed("N/A"),
        }
    }
}

/// Look up a field of a record by schema name.
///
/// Unknown names yield [`FieldValue::Unknown`]; a schema mismatch shows up
/// as `N/A` cells instead of a failure.
#[must_use]
pub fn field_value<'a>(record: &'a ExportRecord, name: &str) -> FieldValue<'a> {
    match name {
        "IssueID" => FieldValue::Str(&record.issue_id),
        "AssignedTo" => FieldValue::Str(&record.assigned_to),
        "Count" => FieldValue::Str(&record.count),
        "Culprit" => FieldValue::Str(&record.culprit),
        "FirstSeen" => FieldValue::Timestamp(record.first_seen),
        "LastSeen" => FieldValue::Timestamp(record.last_seen),
        "Level" => FieldValue::Str(&record.level),
        "Logger" => FieldValue::Str(&record.logger),
        "Permalink" => FieldValue::Str(&record.permalink),
        "Project" => FieldValue::Str(&record.project),
        "ShareID" => FieldValue::Str(&record.share_id),
        "ShortID" => FieldValue::Str(&record.short_id),
        "Status" => FieldValue::Str(&record.status),
        "Title" => FieldValue::Str(&record.title),
        "IssueType" => FieldValue::Str(&record.issue_type),
        "UserCount" => FieldValue::Int(record.user_count),
        "UserReportCount" => FieldValue::Int(record.user_report_count),
        "EventID" => FieldValue::Str(&record.event_id),
        "EventType" => FieldValue::Str(&record.event_type),
        "Release" => FieldValue::Str(&record.release),
        "Message" => FieldValue::Str(&record.message),
        "EventCreated" => FieldValue::Timestamp(record.event_created),
        "EventReceived" => FieldValue::Timestamp(record.event_received),
        "Platform" => FieldValue::Str(&record.platform),
        "GroupID" => FieldValue::Str(&record.group_id),
        _ => FieldValue::Unknown,
    }
}

/// The delimiter/quote choices governing one export.
#[derive(Debug, Clone)]
pub struct RenderFormat {
    pub field_separator: String,
    pub record_separator: String,
    pub quote: char,
    /// Union of both separators and the quote character; any value
    /// containing one of these must be quoted.
    needs_quoting: String,
}

impl RenderFormat {
    /// Construct a format from its separators and quote character.
    #[must_use]
    pub fn new(field_separator: &str, record_separator: &str, quote: char) -> Self {
        let mut needs_quoting = String::new();
        needs_quoting.push_str(field_separator);
        needs_quoting.push_str(record_separator);
        needs_quoting.push(quote);
        Self {
            field_separator: field_separator.to_string(),
            record_separator: record_separator.to_string(),
            quote,
            needs_quoting,
        }
    }

    /// The "Excel CSV" variant: comma, CRLF, double quote.
    #[must_use]
    pub fn excel_csv() -> Self {
        Self::new(",", "\r\n", '"')
    }

    /// Quote a field value if it needs it.
    ///
    /// A value containing a separator or the quote character is wrapped in
    /// quote characters with every internal quote character doubled, in a
    /// single forward pass. Anything else passes through unchanged.
    #[must_use]
    pub fn quote_field<'a>(&self, value: &'a str) -> Cow<'a, str> {
        if !value.contains(|c| self.needs_quoting.contains(c)) {
            return Cow::Borrowed(value);
        }
        let mut out = String::with_capacity(value.len() + 2);
        out.push(self.quote);
        let mut rest = value;
        while let Some(i) = rest.find(self.quote) {
            out.push_str(&rest[..i]);
            out.push(self.quote);
            out.push(self.quote);
            rest = &rest[i + self.quote.len_utf8()..];
        }
        out.push_str(rest);
        out.push(self.quote);
        Cow::Owned(out)
    }
}

/// The renderer lifecycle contract consumed by the export pipeline.
///
/// Call order is fixed: `render_header` exactly once first,
/// `render_partial_results` zero or more times, `render_footer` exactly
/// once, `fini` exactly once as the very last step even when an earlier
/// step failed up the call chain.
pub trait Renderer {
    /// Write one record of field names in schema order.
    fn render_header(&mut self) -> io::Result<()>;

    /// Write zero or more records, append-only. Calls are independent;
    /// nothing is accumulated across them.
    fn render_partial_results(&mut self, records: &[ExportRecord]) -> io::Result<()>;

    /// Write any trailing content.
    fn render_footer(&mut self) -> io::Result<()>;

    /// Release renderer-held resources.
    fn fini(&mut self);
}
