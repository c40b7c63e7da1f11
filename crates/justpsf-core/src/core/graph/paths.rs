use super::components::ResidueGraph;
use std::collections::VecDeque;

/// Enumerates every simple path of exactly `K` nodes in a connected graph.
///
/// Partial paths are grown breadth-first from each root in ascending order, one
/// unvisited neighbor at a time; a path never revisits a node. A path and its
/// reverse describe the same internal coordinate, so only the orientation whose
/// last node is not smaller than its first is kept.
///
/// Graphs with fewer than `K` nodes yield nothing.
pub fn find_paths<const K: usize>(adjacency: &[Vec<usize>]) -> Vec<[usize; K]> {
    let mut found = Vec::new();
    if K == 0 || adjacency.len() < K {
        return found;
    }

    let mut queue: VecDeque<Vec<usize>> = VecDeque::new();
    for root in 0..adjacency.len() {
        queue.push_back(vec![root]);

        while let Some(path) = queue.pop_front() {
            if path.len() == K {
                let last = path[K - 1];
                if last < root {
                    continue;
                }
                if let Ok(complete) = <[usize; K]>::try_from(path.as_slice()) {
                    found.push(complete);
                }
                continue;
            }

            let tip = path[path.len() - 1];
            for &next in &adjacency[tip] {
                // the partial path doubles as the visited set (K is tiny)
                if path.contains(&next) {
                    continue;
                }
                let mut extended = Vec::with_capacity(K);
                extended.extend_from_slice(&path);
                extended.push(next);
                queue.push_back(extended);
            }
        }
    }

    found
}

/// All bond angles of a residue, in local indices.
pub fn angles(residue: &ResidueGraph) -> Vec<[usize; 3]> {
    find_paths::<3>(residue.adjacency())
}

/// All proper dihedrals of a residue, in local indices.
pub fn dihedrals(residue: &ResidueGraph) -> Vec<[usize; 4]> {
    find_paths::<4>(residue.adjacency())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn adjacency(n: usize, edges: &[(usize, usize)]) -> Vec<Vec<usize>> {
        let mut adjacency = vec![Vec::new(); n];
        for &(a, b) in edges {
            adjacency[a].push(b);
            adjacency[b].push(a);
        }
        for neighbors in &mut adjacency {
            neighbors.sort_unstable();
        }
        adjacency
    }

    fn assert_no_mirrors<const K: usize>(paths: &[[usize; K]]) {
        let set: HashSet<[usize; K]> = paths.iter().copied().collect();
        assert_eq!(set.len(), paths.len(), "duplicate path in {paths:?}");
        for path in paths {
            let mut reversed = *path;
            reversed.reverse();
            if reversed != *path {
                assert!(!set.contains(&reversed), "both {path:?} and its mirror");
            }
        }
    }

    #[test]
    fn linear_chain_yields_two_angles_and_one_dihedral() {
        let chain = adjacency(4, &[(0, 1), (1, 2), (2, 3)]);
        assert_eq!(find_paths::<3>(&chain), vec![[0, 1, 2], [1, 2, 3]]);
        assert_eq!(find_paths::<4>(&chain), vec![[0, 1, 2, 3]]);
    }

    #[test]
    fn water_angle_is_reported_once() {
        let water = adjacency(3, &[(0, 1), (0, 2)]);
        assert_eq!(find_paths::<3>(&water), vec![[1, 0, 2]]);
        assert!(find_paths::<4>(&water).is_empty());
    }

    #[test]
    fn small_graphs_yield_nothing() {
        let diatomic = adjacency(2, &[(0, 1)]);
        assert!(find_paths::<3>(&diatomic).is_empty());
        assert!(find_paths::<0>(&diatomic).is_empty());
        let single = adjacency(1, &[]);
        assert!(find_paths::<2>(&single).is_empty());
    }

    #[test]
    fn three_ring_never_reports_the_closing_path() {
        let ring = adjacency(3, &[(0, 1), (1, 2), (0, 2)]);
        let angles = find_paths::<3>(&ring);
        assert_eq!(angles.len(), 3);
        assert_no_mirrors(&angles);
        for angle in &angles {
            let distinct: HashSet<_> = angle.iter().collect();
            assert_eq!(distinct.len(), 3);
        }
        // a 3-ring has no 4-node simple path
        assert!(find_paths::<4>(&ring).is_empty());
    }

    #[test]
    fn four_ring_dihedrals_do_not_revisit_nodes() {
        let ring = adjacency(4, &[(0, 1), (1, 2), (2, 3), (0, 3)]);
        let dihedrals = find_paths::<4>(&ring);
        // each of the 4 bonds is the central bond of exactly one dihedral
        assert_eq!(dihedrals.len(), 4);
        assert_no_mirrors(&dihedrals);
        for dihedral in &dihedrals {
            let distinct: HashSet<_> = dihedral.iter().collect();
            assert_eq!(distinct.len(), 4);
            assert!(dihedral[3] >= dihedral[0]);
        }
    }

    #[test]
    fn triangle_with_tail_keeps_paths_through_the_ring() {
        // 0-1-2 ring with 3 hanging off 2
        let graph = adjacency(4, &[(0, 1), (1, 2), (0, 2), (2, 3)]);
        let dihedrals = find_paths::<4>(&graph);
        assert_no_mirrors(&dihedrals);
        let set: HashSet<[usize; 4]> = dihedrals.into_iter().collect();
        let expected: HashSet<[usize; 4]> = [[0, 1, 2, 3], [1, 0, 2, 3]].into_iter().collect();
        assert_eq!(set, expected);
    }

    #[test]
    fn fluoroethylene_internal_coordinates() {
        // F0-C1=C2, C1-H3, C2-H4, C2-H5
        let graph = adjacency(6, &[(0, 1), (1, 2), (1, 3), (2, 4), (2, 5)]);
        let angles: HashSet<[usize; 3]> = find_paths::<3>(&graph).into_iter().collect();
        let expected: HashSet<[usize; 3]> = [
            [0, 1, 2],
            [0, 1, 3],
            [1, 2, 4],
            [1, 2, 5],
            [2, 1, 3],
            [4, 2, 5],
        ]
        .into_iter()
        .collect();
        assert_eq!(angles, expected);

        let dihedrals: HashSet<[usize; 4]> = find_paths::<4>(&graph).into_iter().collect();
        let expected: HashSet<[usize; 4]> = [[0, 1, 2, 4], [0, 1, 2, 5], [3, 1, 2, 4], [3, 1, 2, 5]]
            .into_iter()
            .collect();
        assert_eq!(dihedrals, expected);
    }
}
