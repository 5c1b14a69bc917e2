//! Persisted local store of the native unit and the schema migrator that
//! upgrades it in place.

pub mod error;
pub mod migrate;
pub mod provider;
pub mod store;

pub use error::StoreError;
pub use migrate::{
    MigrationReport, MigrationStep, SchemaChange, SchemaMigrator, StepOutcome, StepRecord,
    StepTarget, builtin_steps, migrate,
};
pub use provider::{StaticTargets, StoreConversationIds, TargetProvider, parse_target_ids};
pub use store::{LocalStore, quote_ident};
