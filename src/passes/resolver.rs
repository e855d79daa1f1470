//! On-the-fly analysis resolution
//!
//! A running pass may need an analysis the frozen schedule never computed,
//! either because the producer was registered after scheduling or because
//! the need is conditional. Resolution recurses into the same machinery
//! that serves scheduled analyses: one reentrant routine, parameterized by
//! whether the computed result is durable (a scheduled slot) or transient
//! (an on-the-fly request). Transient results are swept by the engine as
//! soon as the requesting pass returns, because the schedule was not built
//! with knowledge of their lifetime needs.
//!
//! Requirement cycles surface naturally: a producer's arena slot is empty
//! while it runs, so a recursive attempt to take it again reports the
//! analysis as unavailable.

use super::cache::AnalysisCache;
use super::error::ExecutionError;
use super::{AnalysisId, FunctionPass, PassArena, PassId};
use crate::ir::{IrFunction, IrFunctionId};
use fxhash::FxHashMap;
use log::{debug, trace};
use std::any::Any;

/// Whether a computed result outlives the pass that asked for it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Durability {
    /// Scheduled slot; the entry stays valid until a transform invalidates it
    Durable,
    /// On-the-fly request; swept when the requesting pass returns
    Transient,
}

/// Handle given to a running pass: read-only access to cached analysis
/// results, and on-the-fly resolution for analyses outside the schedule.
/// Passes never mutate cache entries directly.
pub struct PassContext<'a> {
    unit: IrFunctionId,
    pass_name: &'a str,
    arena: &'a mut PassArena,
    registry: &'a FxHashMap<AnalysisId, PassId>,
    cache: &'a mut AnalysisCache,
}

impl<'a> PassContext<'a> {
    pub(crate) fn new(
        unit: IrFunctionId,
        pass_name: &'a str,
        arena: &'a mut PassArena,
        registry: &'a FxHashMap<AnalysisId, PassId>,
        cache: &'a mut AnalysisCache,
    ) -> Self {
        Self {
            unit,
            pass_name,
            arena,
            registry,
            cache,
        }
    }

    /// The cached result for `analysis`, or `None` on a miss. A cached
    /// result of the wrong type is a contract bug between producer and
    /// consumer.
    pub fn cached<T: 'static>(&self, analysis: AnalysisId) -> Option<&T> {
        self.cache.get(analysis, self.unit).map(|result| {
            result
                .downcast_ref::<T>()
                .unwrap_or_else(|| panic!("analysis '{}' cached with unexpected type", analysis))
        })
    }

    /// The result for `analysis`, computing it on the fly when the frozen
    /// schedule did not provide it. An on-the-fly computation (and any of
    /// its recursively computed requirements) is transient: it is released
    /// as soon as this pass returns control to the engine.
    pub fn require<T: 'static>(
        &mut self,
        analysis: AnalysisId,
        function: &IrFunction,
    ) -> Result<&T, ExecutionError> {
        ensure_analysis(
            analysis,
            None,
            Durability::Transient,
            function,
            self.arena,
            self.registry,
            self.cache,
            self.pass_name,
        )?;
        Ok(self
            .cached(analysis)
            .expect("analysis is cached after successful resolution"))
    }
}

/// Make `analysis` valid in the cache for `function`, computing it (and,
/// recursively, its unmet requirements) if needed.
///
/// `producer` pins a specific arena slot (the scheduled instance); when
/// `None` the registry decides. Recursively computed requirements are
/// always transient.
pub(crate) fn ensure_analysis(
    analysis: AnalysisId,
    producer: Option<PassId>,
    durability: Durability,
    function: &IrFunction,
    arena: &mut PassArena,
    registry: &FxHashMap<AnalysisId, PassId>,
    cache: &mut AnalysisCache,
    requested_by: &str,
) -> Result<(), ExecutionError> {
    if cache.contains(analysis, function.id) {
        trace!("cache hit: '{}' for {}", analysis, function.id);
        return Ok(());
    }

    let pass_id = match producer.or_else(|| registry.get(&analysis).copied()) {
        Some(id) => id,
        None => {
            return Err(ExecutionError::AnalysisUnavailable {
                analysis,
                requested_by: requested_by.to_owned(),
            })
        }
    };

    // An empty slot means the producer is already running further up this
    // call stack: a requirement cycle, reported as unavailable.
    let pass = match arena.take(pass_id) {
        Some(pass) => pass,
        None => {
            return Err(ExecutionError::AnalysisUnavailable {
                analysis,
                requested_by: requested_by.to_owned(),
            })
        }
    };

    let result = run_producer(&pass, analysis, durability, function, arena, registry, cache);
    arena.restore(pass_id, pass);
    let result = result?;
    cache.put(
        analysis,
        function.id,
        result,
        durability == Durability::Transient,
    );
    Ok(())
}

fn run_producer(
    pass: &FunctionPass,
    analysis: AnalysisId,
    durability: Durability,
    function: &IrFunction,
    arena: &mut PassArena,
    registry: &FxHashMap<AnalysisId, PassId>,
    cache: &mut AnalysisCache,
) -> Result<Box<dyn Any>, ExecutionError> {
    let FunctionPass::Analysis(producer) = pass else {
        unreachable!("analysis registry entries always point at analysis passes")
    };

    // the producer's own requirements resolve first, transiently
    let usage = producer.usage();
    for required in &usage.required {
        ensure_analysis(
            *required,
            None,
            Durability::Transient,
            function,
            arena,
            registry,
            cache,
            producer.id().0,
        )?;
    }

    debug!(
        "computing analysis '{}' for {}{}",
        analysis,
        function.id,
        if durability == Durability::Transient {
            " (on the fly)"
        } else {
            ""
        }
    );
    let mut cx = PassContext::new(function.id, producer.id().0, arena, registry, cache);
    producer.run(function, &mut cx)
}
