//! Dominator analysis
//!
//! Computes immediate dominators with the iterative dataflow algorithm
//! over a reverse-postorder traversal. Unreachable blocks have no
//! dominator entry and report as unreachable.

use crate::ir::{IrBlockId, IrFunction};
use crate::passes::error::ExecutionError;
use crate::passes::{AnalysisId, AnalysisPass, PassContext};
use fxhash::{FxHashMap, FxHashSet};
use std::any::Any;

pub const DOMINATORS: AnalysisId = AnalysisId("dominators");

/// Immediate-dominator tree for one function
#[derive(Debug, Clone)]
pub struct Dominators {
    /// idom[b] = immediate dominator of b; the entry block maps to itself
    idom: FxHashMap<IrBlockId, IrBlockId>,

    /// Reverse postorder over reachable blocks, entry first
    order: Vec<IrBlockId>,
}

impl Dominators {
    pub fn compute(function: &IrFunction) -> Self {
        let entry = function.entry_block();

        // postorder DFS over the reachable subgraph
        let mut postorder = Vec::new();
        let mut visited = FxHashSet::default();
        visited.insert(entry);
        let mut stack = vec![(entry, 0usize)];
        while let Some((block, succ_index)) = stack.pop() {
            let succs = function.successors(block);
            if succ_index < succs.len() {
                stack.push((block, succ_index + 1));
                let next = succs[succ_index];
                if visited.insert(next) {
                    stack.push((next, 0));
                }
            } else {
                postorder.push(block);
            }
        }
        let order: Vec<IrBlockId> = postorder.into_iter().rev().collect();
        let index: FxHashMap<IrBlockId, usize> =
            order.iter().enumerate().map(|(i, b)| (*b, i)).collect();

        // predecessors within the reachable subgraph
        let mut preds: FxHashMap<IrBlockId, Vec<IrBlockId>> = FxHashMap::default();
        for &block in &order {
            for succ in function.successors(block) {
                if index.contains_key(&succ) {
                    preds.entry(succ).or_default().push(block);
                }
            }
        }

        fn intersect(
            a: IrBlockId,
            b: IrBlockId,
            idom: &FxHashMap<IrBlockId, IrBlockId>,
            index: &FxHashMap<IrBlockId, usize>,
        ) -> IrBlockId {
            let mut x = a;
            let mut y = b;
            while x != y {
                while index[&x] > index[&y] {
                    x = idom[&x];
                }
                while index[&y] > index[&x] {
                    y = idom[&y];
                }
            }
            x
        }

        let mut idom: FxHashMap<IrBlockId, IrBlockId> = FxHashMap::default();
        idom.insert(entry, entry);
        let mut changed = true;
        while changed {
            changed = false;
            for &block in order.iter().skip(1) {
                let mut new_idom: Option<IrBlockId> = None;
                if let Some(block_preds) = preds.get(&block) {
                    for &pred in block_preds {
                        if !idom.contains_key(&pred) {
                            continue;
                        }
                        new_idom = Some(match new_idom {
                            None => pred,
                            Some(current) => intersect(pred, current, &idom, &index),
                        });
                    }
                }
                if let Some(new_idom) = new_idom {
                    if idom.get(&block) != Some(&new_idom) {
                        idom.insert(block, new_idom);
                        changed = true;
                    }
                }
            }
        }

        Self { idom, order }
    }

    /// Immediate dominator of `block`; the entry block has none
    pub fn immediate_dominator(&self, block: IrBlockId) -> Option<IrBlockId> {
        self.idom.get(&block).copied().filter(|&parent| parent != block)
    }

    /// Whether `a` dominates `b` (reflexive)
    pub fn dominates(&self, a: IrBlockId, b: IrBlockId) -> bool {
        let mut current = b;
        loop {
            if current == a {
                return true;
            }
            match self.idom.get(&current) {
                Some(&parent) if parent != current => current = parent,
                _ => return false,
            }
        }
    }

    pub fn is_reachable(&self, block: IrBlockId) -> bool {
        self.idom.contains_key(&block)
    }

    /// Reverse postorder over reachable blocks
    pub fn reverse_postorder(&self) -> &[IrBlockId] {
        &self.order
    }
}

/// Produces [`Dominators`]
pub struct DominatorsAnalysis;

impl AnalysisPass for DominatorsAnalysis {
    fn id(&self) -> AnalysisId {
        DOMINATORS
    }

    fn run(
        &self,
        function: &IrFunction,
        _cx: &mut PassContext<'_>,
    ) -> Result<Box<dyn Any>, ExecutionError> {
        Ok(Box::new(Dominators::compute(function)))
    }
}
