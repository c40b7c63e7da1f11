use super::molecular_graph::MolecularGraph;
use std::collections::VecDeque;
use tracing::{debug, instrument};

/// A connected component of a [`MolecularGraph`], re-indexed locally.
///
/// Local node `k` corresponds to global atom `nodes[k]`; `nodes` is sorted, so the
/// local order preserves the global one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResidueGraph {
    nodes: Vec<usize>,
    labels: Vec<String>,
    adjacency: Vec<Vec<usize>>,
    edge_count: usize,
}

impl ResidueGraph {
    /// Extracts the subgraph induced by `nodes` (any order, duplicates ignored).
    pub fn induced(graph: &MolecularGraph, nodes: &[usize]) -> Self {
        let mut nodes = nodes.to_vec();
        nodes.sort_unstable();
        nodes.dedup();

        let local = |global: usize| nodes.binary_search(&global).ok();

        let mut edge_count = 0;
        let adjacency: Vec<Vec<usize>> = nodes
            .iter()
            .map(|&global| {
                graph
                    .neighbors(global)
                    .iter()
                    .filter_map(|&n| local(n))
                    .collect()
            })
            .collect();
        for (k, neighbors) in adjacency.iter().enumerate() {
            edge_count += neighbors.iter().filter(|&&n| n > k).count();
        }

        let labels = nodes
            .iter()
            .map(|&g| graph.label(g).unwrap_or_default().to_string())
            .collect();

        Self {
            nodes,
            labels,
            adjacency,
            edge_count,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Global atom indices, ascending.
    pub fn nodes(&self) -> &[usize] {
        &self.nodes
    }

    pub fn global(&self, local: usize) -> usize {
        self.nodes[local]
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn label(&self, local: usize) -> &str {
        &self.labels[local]
    }

    pub fn adjacency(&self) -> &[Vec<usize>] {
        &self.adjacency
    }

    pub fn neighbors(&self, local: usize) -> &[usize] {
        &self.adjacency[local]
    }

    pub fn degree(&self, local: usize) -> usize {
        self.adjacency[local].len()
    }

    /// Local edges as `(low, high)` pairs, ordered by the low endpoint.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.adjacency.iter().enumerate().flat_map(|(k, neighbors)| {
            neighbors
                .iter()
                .filter(move |&&n| n > k)
                .map(move |&n| (k, n))
        })
    }
}

/// Splits the graph into its maximal connected node groups.
///
/// Roots are taken in ascending node order and each component is explored
/// breadth-first, so the output order is stable: component `k` is the one that
/// contains the smallest node not covered by components `0..k`. Node lists are
/// returned sorted.
#[instrument(skip_all, name = "connected_components")]
pub fn connected_components(graph: &MolecularGraph) -> Vec<Vec<usize>> {
    let n = graph.node_count();
    let mut seen = vec![false; n];
    let mut components = Vec::new();
    let mut queue = VecDeque::new();

    for root in 0..n {
        if seen[root] {
            continue;
        }
        seen[root] = true;
        queue.push_back(root);

        let mut component = Vec::new();
        while let Some(node) = queue.pop_front() {
            component.push(node);
            for &next in graph.neighbors(node) {
                if !seen[next] {
                    seen[next] = true;
                    queue.push_back(next);
                }
            }
        }
        component.sort_unstable();
        components.push(component);
    }

    debug!(count = components.len(), "Partitioned graph into components.");
    components
}

/// Connected components as standalone residue graphs, in discovery order.
pub fn residues(graph: &MolecularGraph) -> Vec<ResidueGraph> {
    connected_components(graph)
        .iter()
        .map(|nodes| ResidueGraph::induced(graph, nodes))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(labels: &[&str], edges: &[(usize, usize)]) -> MolecularGraph {
        let mut graph = MolecularGraph::with_nodes(labels.iter().map(|s| s.to_string()).collect());
        for &(a, b) in edges {
            graph.add_edge(a, b).unwrap();
        }
        graph
    }

    #[test]
    fn components_are_ordered_by_smallest_member() {
        // two waters interleaved: 0-2, 0-4 and 1-3, 1-5, plus a lone ion
        let g = graph(
            &["O", "O", "H", "H", "H", "H", "Na"],
            &[(0, 2), (0, 4), (1, 3), (1, 5)],
        );
        assert_eq!(
            connected_components(&g),
            vec![vec![0, 2, 4], vec![1, 3, 5], vec![6]]
        );
    }

    #[test]
    fn empty_graph_has_no_components() {
        let g = MolecularGraph::with_nodes(Vec::new());
        assert!(connected_components(&g).is_empty());
    }

    #[test]
    fn single_atoms_form_their_own_residue() {
        let g = graph(&["He", "He"], &[]);
        let residues = residues(&g);
        assert_eq!(residues.len(), 2);
        assert_eq!(residues[1].nodes(), &[1]);
        assert_eq!(residues[1].edge_count(), 0);
    }

    #[test]
    fn induced_subgraph_uses_local_indices() {
        let g = graph(&["C", "O", "H", "H", "H"], &[(1, 2), (1, 4), (0, 3)]);
        let residue = ResidueGraph::induced(&g, &[4, 1, 2]);
        assert_eq!(residue.nodes(), &[1, 2, 4]);
        assert_eq!(residue.labels(), &["O", "H", "H"]);
        assert_eq!(residue.neighbors(0), &[1, 2]);
        assert_eq!(residue.degree(2), 1);
        assert_eq!(residue.edge_count(), 2);
        assert_eq!(residue.edges().collect::<Vec<_>>(), vec![(0, 1), (0, 2)]);
        assert_eq!(residue.global(2), 4);
    }
}
