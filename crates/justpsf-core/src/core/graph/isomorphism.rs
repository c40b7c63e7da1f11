//! Exact graph isomorphism between residues via VF2-style state-space search.
//!
//! Two residues match only if there is a bijection between their nodes that
//! preserves both adjacency and element labels. Node and edge counts must agree
//! exactly, so a residue never matches a proper subgraph of another.

use super::components::ResidueGraph;
use std::collections::VecDeque;

/// Finds a label-preserving isomorphism from `pattern` onto `target`.
///
/// Returns `mapping` such that pattern node `p` corresponds to target node
/// `mapping[p]` (both local indices), or `None` if the residues are not
/// isomorphic. When several isomorphisms exist, the first one found is returned.
pub fn find_isomorphism(pattern: &ResidueGraph, target: &ResidueGraph) -> Option<Vec<usize>> {
    if !invariants_match(pattern, target) {
        return None;
    }
    let mut state = Vf2State::new(pattern, target);
    if state.match_recursive(0) {
        state.core_pattern.into_iter().collect()
    } else {
        None
    }
}

pub fn is_isomorphic(a: &ResidueGraph, b: &ResidueGraph) -> bool {
    find_isomorphism(a, b).is_some()
}

fn invariants_match(a: &ResidueGraph, b: &ResidueGraph) -> bool {
    if a.node_count() != b.node_count() || a.edge_count() != b.edge_count() {
        return false;
    }

    let mut labels_a: Vec<&str> = a.labels().iter().map(String::as_str).collect();
    let mut labels_b: Vec<&str> = b.labels().iter().map(String::as_str).collect();
    labels_a.sort_unstable();
    labels_b.sort_unstable();
    if labels_a != labels_b {
        return false;
    }

    let mut degrees_a: Vec<usize> = (0..a.node_count()).map(|k| a.degree(k)).collect();
    let mut degrees_b: Vec<usize> = (0..b.node_count()).map(|k| b.degree(k)).collect();
    degrees_a.sort_unstable();
    degrees_b.sort_unstable();
    degrees_a == degrees_b
}

/// Breadth-first node order, so that every node after the first of its component
/// has an already-matched neighbor that restricts its candidates.
fn matching_order(graph: &ResidueGraph) -> Vec<usize> {
    let n = graph.node_count();
    let mut order = Vec::with_capacity(n);
    let mut seen = vec![false; n];
    let mut queue = VecDeque::new();
    for root in 0..n {
        if seen[root] {
            continue;
        }
        seen[root] = true;
        queue.push_back(root);
        while let Some(node) = queue.pop_front() {
            order.push(node);
            for &next in graph.neighbors(node) {
                if !seen[next] {
                    seen[next] = true;
                    queue.push_back(next);
                }
            }
        }
    }
    order
}

struct Vf2State<'a> {
    pattern: &'a ResidueGraph,
    target: &'a ResidueGraph,
    order: Vec<usize>,
    // core_pattern[p] = Some(t) means pattern node p is mapped to target node t
    core_pattern: Vec<Option<usize>>,
    // core_target[t] = Some(p) means target node t is mapped to pattern node p
    core_target: Vec<Option<usize>>,
}

impl<'a> Vf2State<'a> {
    fn new(pattern: &'a ResidueGraph, target: &'a ResidueGraph) -> Self {
        Self {
            pattern,
            target,
            order: matching_order(pattern),
            core_pattern: vec![None; pattern.node_count()],
            core_target: vec![None; target.node_count()],
        }
    }

    fn match_recursive(&mut self, depth: usize) -> bool {
        if depth == self.order.len() {
            return true;
        }

        let pattern_node = self.order[depth];
        for target_node in self.candidates(pattern_node) {
            if !self.is_feasible(pattern_node, target_node) {
                continue;
            }

            self.core_pattern[pattern_node] = Some(target_node);
            self.core_target[target_node] = Some(pattern_node);

            if self.match_recursive(depth + 1) {
                return true;
            }

            self.core_pattern[pattern_node] = None;
            self.core_target[target_node] = None;
        }
        false
    }

    fn candidates(&self, pattern_node: usize) -> Vec<usize> {
        let anchor = self
            .pattern
            .neighbors(pattern_node)
            .iter()
            .find_map(|&p| self.core_pattern[p]);

        match anchor {
            Some(t) => self
                .target
                .neighbors(t)
                .iter()
                .copied()
                .filter(|&c| self.core_target[c].is_none())
                .collect(),
            None => (0..self.target.node_count())
                .filter(|&c| self.core_target[c].is_none())
                .collect(),
        }
    }

    fn is_feasible(&self, pattern_node: usize, target_node: usize) -> bool {
        if self.pattern.label(pattern_node) != self.target.label(target_node) {
            return false;
        }
        if self.pattern.degree(pattern_node) != self.target.degree(target_node) {
            return false;
        }

        // every matched neighbor in the pattern must be a neighbor in the target
        let mut mapped_in_pattern = 0;
        for &p in self.pattern.neighbors(pattern_node) {
            if let Some(t) = self.core_pattern[p] {
                if !self.target.neighbors(target_node).contains(&t) {
                    return false;
                }
                mapped_in_pattern += 1;
            }
        }

        // and the target may not have extra edges into the matched region
        let mapped_in_target = self
            .target
            .neighbors(target_node)
            .iter()
            .filter(|&&t| self.core_target[t].is_some())
            .count();
        mapped_in_pattern == mapped_in_target
    }
}
