//! Batch parsing of SMS export documents.
//!
//! The parser reads an XML export such as the one produced by Android "SMS
//! Backup & Restore":
//!
//! ```xml
//! <smses count="2">
//!   <sms address="M-Money" date="1715351458724" body="You have received 2000 RWF ..." />
//!   <sms address="M-Money" date="1715351506754" body="Your payment of 1,000 RWF ..." />
//! </smses>
//! ```
//!
//! A missing or structurally broken document is one terminal failure. Entries
//! without a body are skipped, and everything else always yields a record.

use std::path::Path;
use std::time::Instant;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, error, info, warn};

use crate::config::SourceConfig;
use crate::error::{MomoError, Result};
use crate::metrics::MetricsCollector;
use crate::models::{RawSmsEntry, TransactionRecord};
use crate::normalizer::RecordNormalizer;

/// Element and attribute names of one entry in the source document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryLayout {
    /// Name of the repeated entry element
    pub entry_element: String,
    /// Attribute holding the message text
    pub body_attribute: String,
    /// Attribute holding epoch milliseconds
    pub timestamp_attribute: String,
}

impl Default for EntryLayout {
    fn default() -> Self {
        Self {
            entry_element: "sms".to_string(),
            body_attribute: "body".to_string(),
            timestamp_attribute: "date".to_string(),
        }
    }
}

impl From<&SourceConfig> for EntryLayout {
    fn from(config: &SourceConfig) -> Self {
        Self {
            entry_element: config.entry_element.clone(),
            body_attribute: config.body_attribute.clone(),
            timestamp_attribute: config.timestamp_attribute.clone(),
        }
    }
}

/// Parses whole documents into ordered record batches
#[derive(Debug, Clone)]
pub struct BatchParser {
    normalizer: RecordNormalizer,
    layout: EntryLayout,
}

impl BatchParser {
    /// Parser with the default layout and currency
    pub fn new() -> Result<Self> {
        Ok(Self::with_layout(RecordNormalizer::new()?, EntryLayout::default()))
    }

    /// Parser with an explicit normalizer and layout
    #[must_use]
    pub const fn with_layout(normalizer: RecordNormalizer, layout: EntryLayout) -> Self {
        Self { normalizer, layout }
    }

    /// Parser configured from the `source` configuration section
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        let normalizer = RecordNormalizer::with_currency(&config.default_currency)?;
        Ok(Self::with_layout(normalizer, EntryLayout::from(config)))
    }

    /// Normalizer used for each entry
    #[must_use]
    pub const fn normalizer(&self) -> &RecordNormalizer {
        &self.normalizer
    }

    /// Parse the document at `path`, reporting document-level failures
    pub fn parse_file(&self, path: &Path) -> Result<Vec<TransactionRecord>> {
        if !path.exists() {
            return Err(MomoError::SourceNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            MomoError::MalformedSource(format!("{}: {e}", path.display()))
        })?;

        self.parse_str(&content).map_err(|e| match e {
            MomoError::MalformedSource(reason) => {
                MomoError::MalformedSource(format!("{}: {reason}", path.display()))
            },
            other => other,
        })
    }

    /// Parse an in-memory document
    pub fn parse_str(&self, xml: &str) -> Result<Vec<TransactionRecord>> {
        let start = Instant::now();
        let entries = self.read_entries(xml)?;
        let records = self.normalizer.normalize_all(&entries);

        MetricsCollector::default().record_batch_parsed(records.len(), start.elapsed());
        debug!(records = records.len(), "Batch normalized");
        Ok(records)
    }

    /// Parse the document at `path`, degrading any failure to an empty batch
    ///
    /// The failure is logged; callers that need to distinguish an empty
    /// document from a broken one should use [`BatchParser::parse_file`].
    #[must_use]
    pub fn load(&self, path: &Path) -> Vec<TransactionRecord> {
        match self.parse_file(path) {
            Ok(records) => {
                info!(path = %path.display(), records = records.len(), "Loaded transactions");
                records
            },
            Err(e @ MomoError::SourceNotFound(_)) => {
                warn!(error = %e, "Source document missing, continuing with no transactions");
                MetricsCollector::default().record_source_failure("not_found");
                Vec::new()
            },
            Err(e) => {
                error!(error = %e, "Source document unreadable, continuing with no transactions");
                MetricsCollector::default().record_source_failure("malformed");
                Vec::new()
            },
        }
    }

    /// Walk the document and collect every well-formed entry in order
    fn read_entries(&self, xml: &str) -> Result<Vec<RawSmsEntry>> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut entries = Vec::new();
        let mut depth = 0usize;
        let mut saw_root = false;
        let mut skipped = 0usize;

        loop {
            match reader.read_event() {
                Ok(Event::Start(element)) => {
                    depth += 1;
                    saw_root = true;
                    self.collect_entry(&element, &mut entries, &mut skipped);
                },
                Ok(Event::Empty(element)) => {
                    saw_root = true;
                    self.collect_entry(&element, &mut entries, &mut skipped);
                },
                Ok(Event::End(_)) => {
                    depth = depth.checked_sub(1).ok_or_else(|| {
                        MomoError::MalformedSource(format!(
                            "unexpected closing tag at byte {}",
                            reader.buffer_position()
                        ))
                    })?;
                },
                Ok(Event::Eof) => break,
                Ok(_) => {},
                Err(e) => {
                    return Err(MomoError::MalformedSource(format!(
                        "error at byte {}: {e}",
                        reader.buffer_position()
                    )));
                },
            }
        }

        if !saw_root {
            return Err(MomoError::MalformedSource("document has no root element".to_string()));
        }
        if depth > 0 {
            return Err(MomoError::MalformedSource(format!(
                "document ended with {depth} unclosed element(s)"
            )));
        }
        if skipped > 0 {
            debug!(skipped, "Skipped entries without a body");
        }

        Ok(entries)
    }

    fn collect_entry(&self, element: &BytesStart<'_>, entries: &mut Vec<RawSmsEntry>, skipped: &mut usize) {
        if element.local_name().as_ref() != self.layout.entry_element.as_bytes() {
            return;
        }
        match self.entry_from_element(element) {
            Some(entry) => entries.push(entry),
            None => *skipped += 1,
        }
    }

    fn entry_from_element(&self, element: &BytesStart<'_>) -> Option<RawSmsEntry> {
        let mut body = None;
        let mut timestamp_millis = None;

        for attribute in element.attributes() {
            // A broken attribute makes the entry unusable, not the document.
            let attribute = attribute.ok()?;
            let key = attribute.key.local_name();
            if key.as_ref() == self.layout.body_attribute.as_bytes() {
                body = Some(attribute.unescape_value().ok()?.into_owned());
            } else if key.as_ref() == self.layout.timestamp_attribute.as_bytes() {
                timestamp_millis = attribute.unescape_value().ok().map(|v| v.into_owned());
            }
        }

        Some(RawSmsEntry {
            body: body?,
            timestamp_millis,
        })
    }
}
