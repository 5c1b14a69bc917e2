//! Forward-only, best-effort schema upgrades.
//!
//! Steps run in order, each inside its own failure boundary: a step that
//! fails is logged and recorded, and the next step runs regardless. Nothing
//! tracks which steps already ran; re-running is safe because the only
//! expected failure of a step is that its change is already present.

use std::fmt;

use rusqlite::Connection;

use crate::error::StoreError;
use crate::provider::{TargetProvider, parse_target_ids};
use crate::store::{LocalStore, column_exists, quote_ident};

/// Per-conversation message tables are named `chat_logs_<conversationID>`.
pub const CHAT_LOGS_PREFIX: &str = "chat_logs_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepTarget {
    /// A table with a fixed name.
    Table(String),
    /// One table per id from the [`TargetProvider`], named `{table_prefix}{id}`.
    PerTarget { table_prefix: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaChange {
    AddColumn { column: String, definition: String },
}

impl SchemaChange {
    fn statement(&self, table: &str) -> String {
        match self {
            SchemaChange::AddColumn { column, definition } => format!(
                "ALTER TABLE {} ADD COLUMN {} {definition}",
                quote_ident(table),
                quote_ident(column)
            ),
        }
    }

    fn is_present(&self, conn: &Connection, table: &str) -> Result<bool, StoreError> {
        match self {
            SchemaChange::AddColumn { column, .. } => column_exists(conn, table, column),
        }
    }
}

impl fmt::Display for SchemaChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaChange::AddColumn { column, definition } => {
                write!(f, "add column {column} {definition}")
            }
        }
    }
}

/// One immutable structural change, tagged with the version that introduced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStep {
    pub version: String,
    pub target: StepTarget,
    pub change: SchemaChange,
}

impl MigrationStep {
    pub fn add_column(version: &str, table: &str, column: &str, definition: &str) -> Self {
        Self {
            version: version.to_string(),
            target: StepTarget::Table(table.to_string()),
            change: SchemaChange::AddColumn {
                column: column.to_string(),
                definition: definition.to_string(),
            },
        }
    }

    pub fn add_column_per_target(
        version: &str,
        table_prefix: &str,
        column: &str,
        definition: &str,
    ) -> Self {
        Self {
            version: version.to_string(),
            target: StepTarget::PerTarget {
                table_prefix: table_prefix.to_string(),
            },
            change: SchemaChange::AddColumn {
                column: column.to_string(),
                definition: definition.to_string(),
            },
        }
    }
}

/// The upgrades every shipped store version needs, oldest first.
pub fn builtin_steps() -> Vec<MigrationStep> {
    vec![
        MigrationStep::add_column("3.5.1", "local_friends", "is_pinned", "numeric"),
        MigrationStep::add_column("3.8.0", "local_groups", "display_is_read", "numeric"),
        MigrationStep::add_column("3.8.1", "local_app_sdk_version", "installed", "numeric"),
        MigrationStep::add_column_per_target("3.8.2", CHAT_LOGS_PREFIX, "local_ex", "text"),
        MigrationStep::add_column(
            "3.8.3-patch.8",
            "local_users",
            "add_friend_permission",
            "numeric",
        ),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Applied,
    /// The change was already present; this is the normal outcome on re-runs.
    AlreadyApplied,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub version: String,
    /// The table the change was attempted on. For a per-target step whose
    /// targets could not be resolved this is `{table_prefix}*`.
    pub table: String,
    pub outcome: StepOutcome,
}

/// What a migration run did, per step and target. Observability only:
/// failures here never need handling by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub records: Vec<StepRecord>,
}

impl MigrationReport {
    pub fn applied(&self) -> usize {
        self.count(|o| matches!(o, StepOutcome::Applied))
    }

    pub fn already_applied(&self) -> usize {
        self.count(|o| matches!(o, StepOutcome::AlreadyApplied))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, StepOutcome::Failed(_)))
    }

    pub fn outcome(&self, version: &str, table: &str) -> Option<&StepOutcome> {
        self.records
            .iter()
            .find(|r| r.version == version && r.table == table)
            .map(|r| &r.outcome)
    }

    fn count(&self, pred: impl Fn(&StepOutcome) -> bool) -> usize {
        self.records.iter().filter(|r| pred(&r.outcome)).count()
    }

    fn record(&mut self, version: &str, table: String, outcome: StepOutcome) {
        self.records.push(StepRecord {
            version: version.to_string(),
            table,
            outcome,
        });
    }
}

pub struct SchemaMigrator {
    steps: Vec<MigrationStep>,
}

impl SchemaMigrator {
    pub fn new(steps: Vec<MigrationStep>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[MigrationStep] {
        &self.steps
    }

    /// Apply every step in order. Never fails; see the returned report for
    /// per-step outcomes.
    pub async fn apply_all(
        &self,
        store: &LocalStore,
        provider: &dyn TargetProvider,
    ) -> MigrationReport {
        let mut report = MigrationReport::default();
        tracing::info!(steps = self.steps.len(), "Running schema migration");

        for step in &self.steps {
            let tables = match &step.target {
                StepTarget::Table(table) => vec![table.clone()],
                StepTarget::PerTarget { table_prefix } => {
                    match resolve_targets(provider).await {
                        Ok(ids) => ids
                            .into_iter()
                            .map(|id| format!("{table_prefix}{id}"))
                            .collect(),
                        Err(detail) => {
                            tracing::warn!(
                                version = %step.version,
                                detail = %detail,
                                "Could not resolve migration targets, skipping step"
                            );
                            report.record(
                                &step.version,
                                format!("{table_prefix}*"),
                                StepOutcome::Failed(detail),
                            );
                            Vec::new()
                        }
                    }
                }
            };

            for table in tables {
                let outcome = apply_change(store, &table, &step.change);
                match &outcome {
                    StepOutcome::Applied => tracing::debug!(
                        version = %step.version,
                        table = %table,
                        change = %step.change,
                        "Applied migration step"
                    ),
                    StepOutcome::AlreadyApplied => tracing::debug!(
                        version = %step.version,
                        table = %table,
                        "Migration step already applied"
                    ),
                    StepOutcome::Failed(detail) => tracing::warn!(
                        version = %step.version,
                        table = %table,
                        detail = %detail,
                        "Migration step failed, continuing"
                    ),
                }
                report.record(&step.version, table, outcome);
            }
        }

        tracing::info!(
            applied = report.applied(),
            already_applied = report.already_applied(),
            failed = report.failed(),
            "Schema migration finished"
        );
        report
    }
}

impl Default for SchemaMigrator {
    fn default() -> Self {
        Self::new(builtin_steps())
    }
}

/// Run the built-in steps against `store`.
pub async fn migrate(store: &LocalStore, provider: &dyn TargetProvider) -> MigrationReport {
    SchemaMigrator::default().apply_all(store, provider).await
}

async fn resolve_targets(provider: &dyn TargetProvider) -> Result<Vec<String>, String> {
    let raw = provider.target_ids().await.map_err(|e| e.to_string())?;
    parse_target_ids(&raw).ok_or_else(|| format!("target list is not a JSON array of strings: {raw}"))
}

fn apply_change(store: &LocalStore, table: &str, change: &SchemaChange) -> StepOutcome {
    let result = store.with_conn(|conn| {
        if change.is_present(conn, table)? {
            return Ok(false);
        }
        conn.execute_batch(&change.statement(table))?;
        Ok(true)
    });
    match result {
        Ok(true) => StepOutcome::Applied,
        Ok(false) => StepOutcome::AlreadyApplied,
        Err(e) if e.to_string().contains("duplicate column name") => StepOutcome::AlreadyApplied,
        Err(e) => StepOutcome::Failed(e.to_string()),
    }
}
