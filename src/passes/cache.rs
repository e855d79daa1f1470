//! Analysis result cache
//!
//! Keyed store of computed analysis results per function, exclusively owned
//! and mutated by the execution engine and the on-the-fly resolver. Passes
//! only ever borrow results read-only.
//!
//! Invalidation contract: after every transform pass runs against a
//! function, every entry for that function not covered by the transform's
//! preserved set is released. `get` never returns a released entry; a
//! caller observing a miss must recompute before use. At most one entry
//! exists per (analysis, function) pair.

use super::{AnalysisId, PassUsage};
use crate::ir::IrFunctionId;
use fxhash::FxHashMap;
use indexmap::IndexMap;
use log::trace;
use std::any::Any;

struct CacheEntry {
    result: Box<dyn Any>,
    /// Result of an on-the-fly request; swept when the requesting pass
    /// returns to the engine loop, regardless of preservation
    transient: bool,
}

/// Per-function keyed store of analysis results.
///
/// Entries for one function are kept in insertion order so that
/// invalidation sweeps and debug dumps are deterministic.
#[derive(Default)]
pub struct AnalysisCache {
    entries: FxHashMap<IrFunctionId, IndexMap<AnalysisId, CacheEntry>>,
}

impl std::fmt::Debug for AnalysisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisCache")
            .field("functions", &self.entries.len())
            .finish()
    }
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached result for `(analysis, unit)`, or `None` on a miss.
    /// Released entries are never returned.
    pub fn get(&self, analysis: AnalysisId, unit: IrFunctionId) -> Option<&dyn Any> {
        self.entries
            .get(&unit)?
            .get(&analysis)
            .map(|entry| entry.result.as_ref())
    }

    pub fn contains(&self, analysis: AnalysisId, unit: IrFunctionId) -> bool {
        self.entries
            .get(&unit)
            .is_some_and(|m| m.contains_key(&analysis))
    }

    /// Insert or overwrite the entry for `(analysis, unit)`
    pub(crate) fn put(
        &mut self,
        analysis: AnalysisId,
        unit: IrFunctionId,
        result: Box<dyn Any>,
        transient: bool,
    ) {
        trace!(
            "cache put: {} for {}{}",
            analysis,
            unit,
            if transient { " (transient)" } else { "" }
        );
        self.entries
            .entry(unit)
            .or_default()
            .insert(analysis, CacheEntry { result, transient });
    }

    /// Apply a transform's declared invalidation to `unit`. Entries not in
    /// the preserved set are released immediately.
    pub(crate) fn invalidate(&mut self, unit: IrFunctionId, usage: &PassUsage) {
        if usage.preserves_all {
            trace!("cache invalidate: {} preserved entirely", unit);
            return;
        }
        let Some(map) = self.entries.get_mut(&unit) else {
            return;
        };
        let before = map.len();
        map.retain(|id, _| usage.is_preserved(*id));
        let released = before - map.len();
        if released > 0 {
            trace!("cache invalidate: released {} entries for {}", released, unit);
        }
    }

    /// Release every transient entry for `unit`. Called by the engine after
    /// each scheduled pass returns; on-the-fly results never survive past
    /// the single call site that requested them.
    pub(crate) fn sweep_transient(&mut self, unit: IrFunctionId) {
        let Some(map) = self.entries.get_mut(&unit) else {
            return;
        };
        let before = map.len();
        map.retain(|_, entry| !entry.transient);
        let swept = before - map.len();
        if swept > 0 {
            trace!("cache sweep: released {} transient entries for {}", swept, unit);
        }
    }

    /// Release everything; engine teardown
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of live entries for `unit`
    pub fn entry_count(&self, unit: IrFunctionId) -> usize {
        self.entries.get(&unit).map_or(0, |m| m.len())
    }
}
