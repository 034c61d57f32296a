//! One ETL cycle over the three Sportradar endpoint groups.
//!
//! Per group: fetch the document, flatten its collections into row
//! batches, upsert parent table before child table. A group's failure
//! is recorded in its outcome and never stops the remaining groups.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{error, info};

use crate::db::{tables, Store};
use crate::error::FetchError;
use crate::fetch::ApiClient;
use crate::normalize::{self, FlatRow};

struct GroupSpec {
    name: &'static str,
    path: &'static str,
    extract: fn(&Value) -> Vec<TableBatch>,
}

/// The endpoint groups in run order. Each owns its tables exclusively
/// for the duration of the cycle.
const GROUPS: &[GroupSpec] = &[
    GroupSpec {
        name: "competitions",
        path: "competitions.json",
        extract: extract_competition_batches,
    },
    GroupSpec {
        name: "complexes",
        path: "complexes.json",
        extract: extract_complex_batches,
    },
    GroupSpec {
        name: "doubles_rankings",
        path: "doubles_competitor_rankings.json",
        extract: extract_ranking_batches,
    },
];

struct TableBatch {
    table: &'static str,
    primary_key: &'static str,
    rows: Vec<FlatRow>,
}

#[derive(Debug)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub groups: Vec<GroupReport>,
}

#[derive(Debug)]
pub struct GroupReport {
    pub name: &'static str,
    pub outcome: GroupOutcome,
}

#[derive(Debug)]
pub enum GroupOutcome {
    /// The fetch succeeded; each table batch either committed or was
    /// rolled back.
    Completed { writes: Vec<TableWrite> },
    Failed { error: FetchError },
}

#[derive(Debug)]
pub struct TableWrite {
    pub table: &'static str,
    pub rows_written: u64,
    pub committed: bool,
}

impl CycleReport {
    /// Total rows committed across all groups.
    pub fn rows_written(&self) -> u64 {
        self.groups
            .iter()
            .filter_map(|group| match &group.outcome {
                GroupOutcome::Completed { writes } => {
                    Some(writes.iter().map(|w| w.rows_written).sum::<u64>())
                }
                GroupOutcome::Failed { .. } => None,
            })
            .sum()
    }

    pub fn failed_groups(&self) -> usize {
        self.groups.iter().filter(|g| !g.succeeded()).count()
    }
}

impl GroupReport {
    /// True when the fetch succeeded and every table batch committed.
    pub fn succeeded(&self) -> bool {
        match &self.outcome {
            GroupOutcome::Completed { writes } => writes.iter().all(|w| w.committed),
            GroupOutcome::Failed { .. } => false,
        }
    }
}

pub struct Pipeline {
    client: ApiClient,
    store: Store,
}

impl Pipeline {
    pub fn new(client: ApiClient, store: Store) -> Self {
        Self { client, store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Run the three endpoint groups in sequence. There is no
    /// cross-group transaction; each group's outcome stands alone.
    pub async fn run_cycle(&self) -> CycleReport {
        let started_at = Utc::now();
        let start = Instant::now();

        let mut groups = Vec::with_capacity(GROUPS.len());
        for spec in GROUPS {
            groups.push(self.run_group(spec).await);
        }

        CycleReport {
            started_at,
            duration_ms: start.elapsed().as_millis() as u64,
            groups,
        }
    }

    async fn run_group(&self, spec: &GroupSpec) -> GroupReport {
        info!(group = spec.name, "Processing endpoint group");

        let doc = match self.client.fetch(spec.path, &[]).await {
            Ok(doc) => doc,
            Err(error) => {
                error!(group = spec.name, error = %error, "Endpoint group failed");
                return GroupReport {
                    name: spec.name,
                    outcome: GroupOutcome::Failed { error },
                };
            }
        };

        let mut writes = Vec::new();
        for batch in (spec.extract)(&doc) {
            // a rolled-back batch is already logged by the store; the
            // group carries on to its remaining tables
            let write = match self
                .store
                .upsert(batch.table, &batch.rows, batch.primary_key)
                .await
            {
                Ok(rows_written) => TableWrite {
                    table: batch.table,
                    rows_written,
                    committed: true,
                },
                Err(_) => TableWrite {
                    table: batch.table,
                    rows_written: 0,
                    committed: false,
                },
            };
            writes.push(write);
        }

        GroupReport {
            name: spec.name,
            outcome: GroupOutcome::Completed { writes },
        }
    }
}

/// First listed key holding an array wins; a document with neither key
/// yields an empty collection.
fn collection<'a>(doc: &'a Value, keys: &[&str]) -> &'a [Value] {
    for key in keys {
        if let Some(items) = doc.get(*key).and_then(Value::as_array) {
            return items;
        }
    }
    &[]
}

fn extract_competition_batches(doc: &Value) -> Vec<TableBatch> {
    let mut category_rows = Vec::new();
    let mut competition_rows = Vec::new();

    for category in collection(doc, &["categories", "category"]) {
        category_rows.push(normalize::normalize_category(category));
        // some feeds nest a category's competitions under it
        for competition in collection(category, &["competitions"]) {
            competition_rows.push(normalize::normalize_competition(competition));
        }
    }
    for competition in collection(doc, &["competitions", "items"]) {
        competition_rows.push(normalize::normalize_competition(competition));
    }

    vec![
        TableBatch {
            table: tables::CATEGORIES,
            primary_key: "category_id",
            rows: category_rows,
        },
        TableBatch {
            table: tables::COMPETITIONS,
            primary_key: "competition_id",
            rows: competition_rows,
        },
    ]
}

fn extract_complex_batches(doc: &Value) -> Vec<TableBatch> {
    let mut complex_rows = Vec::new();
    let mut venue_rows = Vec::new();

    for complex in collection(doc, &["complexes", "items"]) {
        complex_rows.push(normalize::normalize_complex(complex));
        for venue in collection(complex, &["venues"]) {
            venue_rows.push(normalize::normalize_venue(venue));
        }
    }

    vec![
        TableBatch {
            table: tables::COMPLEXES,
            primary_key: "complex_id",
            rows: complex_rows,
        },
        TableBatch {
            table: tables::VENUES,
            primary_key: "venue_id",
            rows: venue_rows,
        },
    ]
}

fn extract_ranking_batches(doc: &Value) -> Vec<TableBatch> {
    let mut competitor_rows = Vec::new();
    let mut ranking_rows = Vec::new();

    for ranking in collection(doc, &["rankings", "items"]) {
        // an absent or empty competitor object produces no competitor row
        if let Some(competitor) = ranking.get("competitor") {
            if competitor.as_object().is_some_and(|o| !o.is_empty()) {
                competitor_rows.push(normalize::normalize_competitor(competitor));
            }
        }
        ranking_rows.push(normalize::normalize_ranking(ranking));
    }

    vec![
        TableBatch {
            table: tables::COMPETITORS,
            primary_key: "competitor_id",
            rows: competitor_rows,
        },
        TableBatch {
            table: tables::COMPETITOR_RANKINGS,
            primary_key: "rank_pos",
            rows: ranking_rows,
        },
    ]
}
