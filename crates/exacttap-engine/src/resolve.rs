//! Catalog to execution plan resolution.
//!
//! Walks the catalog in order and binds every selected entry to its stream
//! kind. Entries of a folded stream are handed to their carrier instead of
//! being run on their own.

use std::collections::BTreeSet;

use exacttap_types::catalog::{Catalog, CatalogEntry};

use crate::errors::SelectionError;
use crate::streams::{StreamAccessor, StreamKind};

/// Why a catalog entry produced no accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotSelected,
    Unrecognized,
}

/// Ordered accessors for a sync run.
#[derive(Debug, Clone, Default)]
pub struct ExecutionPlan {
    pub accessors: Vec<StreamAccessor>,
    /// Skipped entries, in catalog order.
    pub skipped: Vec<(String, SkipReason)>,
}

impl ExecutionPlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accessors.is_empty()
    }

    #[must_use]
    pub fn stream_names(&self) -> Vec<&str> {
        self.accessors
            .iter()
            .map(|a| a.catalog().stream.as_str())
            .collect()
    }
}

/// Resolve `catalog` into an execution plan.
///
/// # Errors
///
/// Returns [`SelectionError::MissingCarrier`] when a folded stream is
/// selected without its carrier, and [`SelectionError::DuplicateStream`]
/// when a stream is selected twice.
pub fn resolve(catalog: &Catalog) -> Result<ExecutionPlan, SelectionError> {
    let mut plan = ExecutionPlan::default();
    let mut seen = BTreeSet::new();
    let mut folded: Vec<(StreamKind, CatalogEntry)> = Vec::new();

    for entry in &catalog.streams {
        if !entry.is_selected() {
            tracing::info!(stream = entry.stream, "Stream is not marked selected, skipping");
            plan.skipped.push((entry.stream.clone(), SkipReason::NotSelected));
            continue;
        }

        if !seen.insert(entry.stream.as_str()) {
            return Err(SelectionError::DuplicateStream(entry.stream.clone()));
        }

        let Some(kind) = StreamKind::identify(entry) else {
            tracing::warn!(stream = entry.stream, "Unknown stream in catalog, skipping");
            plan.skipped.push((entry.stream.clone(), SkipReason::Unrecognized));
            continue;
        };

        if let Some(carrier) = kind.carrier() {
            tracing::debug!(
                stream = entry.stream,
                carrier = carrier.name(),
                "Stream is folded into its carrier"
            );
            folded.push((carrier, entry.clone()));
            continue;
        }

        plan.accessors.push(StreamAccessor::new(kind, entry.clone()));
    }

    for (carrier, entry) in folded {
        let Some(accessor) = plan.accessors.iter_mut().find(|a| a.kind() == carrier) else {
            return Err(SelectionError::MissingCarrier {
                stream: entry.stream,
                carrier: carrier.name(),
            });
        };
        accessor.fold(entry);
    }

    tracing::info!(
        streams = plan.accessors.len(),
        skipped = plan.skipped.len(),
        "Resolved execution plan"
    );
    Ok(plan)
}
