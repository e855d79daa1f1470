//! Pipeline construction and schedule partitioning
//!
//! The builder consumes passes in registration order and freezes them into
//! a schedule: an ordered sequence of passes partitioned into contiguous
//! nesting levels. Every pass's required analyses must be produced by an
//! earlier pass in the same or an enclosing level and still be valid at the
//! pass's position; anything else is a configuration error caught here, not
//! at run time.
//!
//! Level rule: passes append to the innermost open level. When a transform
//! actually invalidates at least one live analysis, the level is closed, so
//! analyses recomputed afterwards open a fresh level and their lifetimes
//! stay as short as possible. Ties resolve to the innermost level.

use super::engine::{FunctionPassManager, LevelManager};
use super::error::BuildError;
use super::{AnalysisId, AnalysisPass, FunctionPass, PassArena, PassId, TransformPass};
use fxhash::{FxHashMap, FxHashSet};
use log::debug;
use std::mem;

/// Accumulates passes and freezes them into a [`FunctionPassManager`].
///
/// `build` may be called at most once per builder; both `add` and `build`
/// fail with [`BuildError::AlreadyBuilt`] once the schedule is frozen.
#[derive(Default)]
pub struct PipelineBuilder {
    pending: Vec<FunctionPass>,
    built: bool,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pass to the pending registration queue. Ownership of the
    /// pass transfers to the builder.
    pub fn add(&mut self, pass: FunctionPass) -> Result<(), BuildError> {
        if self.built {
            return Err(BuildError::AlreadyBuilt);
        }
        self.pending.push(pass);
        Ok(())
    }

    pub fn add_analysis(&mut self, pass: impl AnalysisPass + 'static) -> Result<(), BuildError> {
        self.add(FunctionPass::analysis(pass))
    }

    pub fn add_transform(&mut self, pass: impl TransformPass + 'static) -> Result<(), BuildError> {
        self.add(FunctionPass::transform(pass))
    }

    /// Consume the queue and produce the frozen schedule.
    pub fn build(&mut self) -> Result<FunctionPassManager, BuildError> {
        if self.built {
            return Err(BuildError::AlreadyBuilt);
        }
        self.built = true;
        let pending = mem::take(&mut self.pending);

        let mut arena = PassArena::new();
        let mut registry: FxHashMap<AnalysisId, PassId> = FxHashMap::default();
        let mut levels: Vec<LevelManager> = Vec::new();
        // analyses produced so far and not invalidated by an intervening
        // non-preserving transform
        let mut live: FxHashSet<AnalysisId> = FxHashSet::default();
        let mut close_current = false;

        for pass in pending {
            let usage = pass.usage();
            for required in &usage.required {
                if !live.contains(required) {
                    return Err(BuildError::UnschedulableAnalysis {
                        analysis: *required,
                        pass: pass.name().to_owned(),
                    });
                }
            }

            if close_current || levels.is_empty() {
                levels.push(LevelManager::new());
                close_current = false;
            }

            let produced = pass.produces();
            let is_transform = pass.is_transform();
            let name = pass.name().to_owned();
            let id = arena.push(pass);
            if let Some(analysis) = produced {
                registry.insert(analysis, id);
                live.insert(analysis);
            }
            let level_index = levels.len() - 1;
            levels
                .last_mut()
                .expect("at least one level is open")
                .push(id, name.clone());
            debug!("scheduled '{}' as {} at level {}", name, id, level_index);

            if is_transform {
                let before = live.len();
                if !usage.preserves_all {
                    live.retain(|analysis| usage.preserved.contains(analysis));
                }
                if live.len() != before {
                    // an analysis lifetime ended here; recomputations start
                    // a fresh level
                    close_current = true;
                }
            }
        }

        debug!(
            "froze schedule: {} passes across {} levels",
            arena.len(),
            levels.len()
        );
        Ok(FunctionPassManager::from_parts(arena, levels, registry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::engine::ManagerState;
    use crate::passes::test_support::{analysis, transform, DOM, LIVENESS};
    use crate::passes::PassUsage;

    fn level_names(manager: &FunctionPassManager) -> Vec<Vec<String>> {
        (0..manager.num_contained_managers())
            .map(|n| manager.get_contained_manager(n).pass_names().to_vec())
            .collect()
    }

    #[test]
    fn test_empty_pipeline_builds() {
        let manager = PipelineBuilder::new().build().unwrap();
        assert_eq!(manager.num_contained_managers(), 0);
        assert_eq!(manager.state(), ManagerState::Built);
    }

    #[test]
    fn test_add_after_build_fails() {
        let mut builder = PipelineBuilder::new();
        builder.build().unwrap();
        let err = builder.add(analysis(DOM)).unwrap_err();
        assert_eq!(err, BuildError::AlreadyBuilt);
    }

    #[test]
    fn test_build_twice_fails() {
        let mut builder = PipelineBuilder::new();
        builder.build().unwrap();
        assert_eq!(builder.build().unwrap_err(), BuildError::AlreadyBuilt);
    }

    #[test]
    fn test_missing_producer_is_unschedulable() {
        let mut builder = PipelineBuilder::new();
        builder
            .add(transform(
                "needs-z",
                PassUsage::none().requires(AnalysisId("Z")),
            ))
            .unwrap();
        let err = builder.build().unwrap_err();
        assert_eq!(
            err,
            BuildError::UnschedulableAnalysis {
                analysis: AnalysisId("Z"),
                pass: "needs-z".to_owned(),
            }
        );
    }

    #[test]
    fn test_producer_after_consumer_is_unschedulable() {
        // registration order matters: the producer must come first
        let mut builder = PipelineBuilder::new();
        builder
            .add(transform("early", PassUsage::none().requires(DOM)))
            .unwrap();
        builder.add(analysis(DOM)).unwrap();
        assert!(matches!(
            builder.build(),
            Err(BuildError::UnschedulableAnalysis { .. })
        ));
    }

    #[test]
    fn test_preserving_transform_keeps_one_level() {
        let mut builder = PipelineBuilder::new();
        builder.add(analysis(DOM)).unwrap();
        builder
            .add(transform("simplify", PassUsage::none().preserves(DOM)))
            .unwrap();
        builder.add(analysis(DOM)).unwrap();
        let manager = builder.build().unwrap();
        assert_eq!(
            level_names(&manager),
            vec![vec!["dominators", "simplify", "dominators"]]
        );
    }

    #[test]
    fn test_invalidating_transform_splits_levels() {
        let mut builder = PipelineBuilder::new();
        builder.add(analysis(DOM)).unwrap();
        builder.add(transform("inline", PassUsage::none())).unwrap();
        builder.add(analysis(DOM)).unwrap();
        let manager = builder.build().unwrap();
        assert_eq!(
            level_names(&manager),
            vec![vec!["dominators", "inline"], vec!["dominators"]]
        );
    }

    #[test]
    fn test_preserves_all_transform_does_not_split() {
        let mut builder = PipelineBuilder::new();
        builder.add(analysis(DOM)).unwrap();
        builder
            .add(transform("annotate", PassUsage::none().preserves_all()))
            .unwrap();
        builder.add(analysis(DOM)).unwrap();
        let manager = builder.build().unwrap();
        assert_eq!(manager.num_contained_managers(), 1);
    }

    #[test]
    fn test_transform_with_nothing_live_does_not_split() {
        let mut builder = PipelineBuilder::new();
        builder.add(transform("a", PassUsage::none())).unwrap();
        builder.add(transform("b", PassUsage::none())).unwrap();
        let manager = builder.build().unwrap();
        assert_eq!(manager.num_contained_managers(), 1);
    }

    #[test]
    fn test_requirement_across_enclosing_level_is_satisfied() {
        // dominators survives the invalidating transform via its preserved
        // set, so the consumer in the next level sees it from an enclosing
        // level without recomputation
        let mut builder = PipelineBuilder::new();
        builder.add(analysis(DOM)).unwrap();
        builder.add(analysis(LIVENESS)).unwrap();
        builder
            .add(transform("fold", PassUsage::none().preserves(DOM)))
            .unwrap();
        builder
            .add(transform("licm", PassUsage::none().requires(DOM)))
            .unwrap();
        let manager = builder.build().unwrap();
        assert_eq!(
            level_names(&manager),
            vec![
                vec!["dominators", "liveness", "fold"],
                vec!["licm"],
            ]
        );
    }

    #[test]
    fn test_schedule_is_deterministic() {
        let build = || {
            let mut builder = PipelineBuilder::new();
            builder.add(analysis(DOM)).unwrap();
            builder.add(analysis(LIVENESS)).unwrap();
            builder
                .add(transform("fold", PassUsage::none().preserves(DOM)))
                .unwrap();
            builder.add(analysis(LIVENESS)).unwrap();
            builder.add(transform("dce", PassUsage::none())).unwrap();
            builder.build().unwrap()
        };
        assert_eq!(level_names(&build()), level_names(&build()));
    }

    #[test]
    fn test_required_and_preserved_together_is_legal() {
        let mut builder = PipelineBuilder::new();
        builder.add(analysis(DOM)).unwrap();
        builder
            .add(transform(
                "rotate",
                PassUsage::none().requires(DOM).preserves(DOM),
            ))
            .unwrap();
        builder
            .add(transform("licm", PassUsage::none().requires(DOM)))
            .unwrap();
        assert!(builder.build().is_ok());
    }
}
