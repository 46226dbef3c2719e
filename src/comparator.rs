//! Linear scan vs. keyed lookup over a parsed batch.
//!
//! Diagnostic only: nothing on the serving path picks a strategy from these
//! timings.

use std::collections::HashMap;
use std::fmt;
use std::hint::black_box;
use std::time::{Duration, Instant};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::{TransactionKind, TransactionRecord, DEFAULT_CURRENCY};

/// Number of lookups issued when none is configured
pub const DEFAULT_LOOKUPS: usize = 1000;

/// Explanation printed with every report
pub const COMPLEXITY_NOTE: &str = "Map lookup is faster on average because a hash table answers in O(1) expected time,\n\
     while a linear scan is O(n) and slows down as the batch grows.";

/// Outcome of one comparison run
#[derive(Debug, Clone, PartialEq)]
pub struct LookupReport {
    /// Number of records searched
    pub record_count: usize,
    /// Number of lookups per strategy
    pub lookups: usize,
    /// Total time spent scanning
    pub linear: Duration,
    /// Total time spent in the map
    pub indexed: Duration,
    /// Lookups where the strategies disagreed
    pub mismatches: usize,
}

impl LookupReport {
    /// Fixed explanatory note
    #[must_use]
    pub const fn note(&self) -> &'static str {
        COMPLEXITY_NOTE
    }
}

impl fmt::Display for LookupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Linear search took: {:.3} ms for {} lookups",
            self.linear.as_secs_f64() * 1000.0,
            self.lookups
        )?;
        writeln!(
            f,
            "Map lookup took:    {:.3} ms for {} lookups",
            self.indexed.as_secs_f64() * 1000.0,
            self.lookups
        )?;
        write!(f, "{}", self.note())
    }
}

/// Both lookup strategies over one batch
#[derive(Debug)]
pub struct LookupComparator<'a> {
    records: &'a [TransactionRecord],
    index: HashMap<u64, &'a TransactionRecord>,
}

impl<'a> LookupComparator<'a> {
    /// Build the id index over `records`
    #[must_use]
    pub fn new(records: &'a [TransactionRecord]) -> Self {
        let index = records.iter().map(|record| (record.id, record)).collect();
        Self { records, index }
    }

    /// Number of indexed records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the batch is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Scan the batch front to back
    #[must_use]
    pub fn linear_find(&self, id: u64) -> Option<&'a TransactionRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    /// Look the id up in the map
    #[must_use]
    pub fn indexed_find(&self, id: u64) -> Option<&'a TransactionRecord> {
        self.index.get(&id).copied()
    }

    /// Draw `count` ids from the batch, with replacement
    pub fn sample_ids<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<u64> {
        let ids: Vec<u64> = self.records.iter().map(|record| record.id).collect();
        (0..count)
            .filter_map(|_| ids.choose(rng).copied())
            .collect()
    }

    /// Time both strategies over the same random id sequence
    pub fn run<R: Rng + ?Sized>(&self, lookups: usize, rng: &mut R) -> LookupReport {
        let targets = self.sample_ids(lookups, rng);

        let start = Instant::now();
        let linear: Vec<_> = targets
            .iter()
            .map(|id| black_box(self.linear_find(*id)))
            .collect();
        let linear_elapsed = start.elapsed();

        let start = Instant::now();
        let indexed: Vec<_> = targets
            .iter()
            .map(|id| black_box(self.indexed_find(*id)))
            .collect();
        let indexed_elapsed = start.elapsed();

        let mismatches = linear
            .iter()
            .zip(&indexed)
            .filter(|(a, b)| a.map(|r| r.id) != b.map(|r| r.id))
            .count();

        LookupReport {
            record_count: self.records.len(),
            lookups: targets.len(),
            linear: linear_elapsed,
            indexed: indexed_elapsed,
            mismatches,
        }
    }
}

/// Placeholder batch used when no parsed output is available
#[must_use]
pub fn synthetic_records(count: usize) -> Vec<TransactionRecord> {
    (1..=count as u64)
        .map(|id| TransactionRecord {
            id,
            kind: TransactionKind::Sent,
            amount: 100.0 + id as f64,
            currency: DEFAULT_CURRENCY.to_string(),
            counterparty_from: None,
            counterparty_to: Some("B".to_string()),
            timestamp: Some("2025-09-01 00:00:00".to_string()),
            external_reference_id: None,
            raw_text: String::new(),
        })
        .collect()
}
