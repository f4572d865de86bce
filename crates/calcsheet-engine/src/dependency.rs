use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use calcsheet_core::CellCoord;

/// A write was rejected because it would close a dependency cycle
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("circular dependency detected involving {cell}")]
pub struct CircularDependency {
    pub cell: CellCoord,
}

/// Bidirectional dependency graph between cell coordinates.
///
/// The two mappings are exact inverses of each other after every
/// mutation, and no cycle is ever allowed to persist (callers check
/// with [`would_create_cycle`](Self::would_create_cycle) before
/// committing edges). Ordered maps keep every traversal deterministic
/// for a fixed graph.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Maps a cell to the cells its formula reads
    /// e.g., if B1 = A1 * 2, then dependencies[B1] = {A1}
    dependencies: BTreeMap<CellCoord, BTreeSet<CellCoord>>,

    /// Maps a cell to the cells that depend on it (reverse lookup)
    /// e.g., if B1 = A1 * 2, then dependents[A1] contains B1
    dependents: BTreeMap<CellCoord, BTreeSet<CellCoord>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register that `cell` depends on `depends_on`; idempotent
    pub fn add_dependency(&mut self, cell: CellCoord, depends_on: CellCoord) {
        self.dependencies.entry(cell).or_default().insert(depends_on);
        self.dependents.entry(depends_on).or_default().insert(cell);
    }

    /// Remove all outgoing edges of `cell` from both mappings.
    ///
    /// Called before installing new edges whenever a cell's content
    /// changes, including when the new content has no formula.
    pub fn clear_dependencies(&mut self, cell: CellCoord) {
        if let Some(deps) = self.dependencies.remove(&cell) {
            for dep in deps {
                if let Some(dependents) = self.dependents.get_mut(&dep) {
                    dependents.remove(&cell);
                    if dependents.is_empty() {
                        self.dependents.remove(&dep);
                    }
                }
            }
        }
    }

    /// Would a write of `cell` depending on each of `targets` close a
    /// cycle? Evaluated against the current graph, before any of the
    /// prospective edges are added.
    pub fn would_create_cycle(&self, cell: CellCoord, targets: &BTreeSet<CellCoord>) -> bool {
        targets.iter().any(|&target| self.depends_on(target, cell))
    }

    /// Check if `cell` depends on `target`, directly or transitively
    /// (a cell trivially depends on itself)
    fn depends_on(&self, cell: CellCoord, target: CellCoord) -> bool {
        let mut visited = BTreeSet::new();
        let mut stack = vec![cell];

        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(deps) = self.dependencies.get(&current) {
                stack.extend(deps.iter().copied());
            }
        }

        false
    }

    /// All cells affected, directly or indirectly, by a change to `cell`
    pub fn all_dependents(&self, cell: CellCoord) -> BTreeSet<CellCoord> {
        let mut result = BTreeSet::new();
        let mut stack = vec![cell];

        while let Some(current) = stack.pop() {
            if let Some(dependents) = self.dependents.get(&current) {
                for &dependent in dependents {
                    if result.insert(dependent) {
                        stack.push(dependent);
                    }
                }
            }
        }

        result
    }

    /// Topologically order `cells` so every cell appears after all the
    /// cells it depends on (edges outside the given set are ignored).
    ///
    /// Three-color depth-first search; meeting an in-progress node
    /// means a cycle survived the pre-commit check and is reported as
    /// [`CircularDependency`].
    pub fn calculation_order(
        &self,
        cells: &BTreeSet<CellCoord>,
    ) -> Result<Vec<CellCoord>, CircularDependency> {
        let mut order = Vec::with_capacity(cells.len());
        let mut visited = BTreeSet::new();
        let mut in_progress = BTreeSet::new();

        // Explicit work stack; the second element marks a node whose
        // dependencies have already been expanded
        let mut stack: Vec<(CellCoord, bool)> = Vec::new();

        for &cell in cells {
            if visited.contains(&cell) {
                continue;
            }
            stack.push((cell, false));

            while let Some((current, expanded)) = stack.pop() {
                if expanded {
                    in_progress.remove(&current);
                    visited.insert(current);
                    order.push(current);
                    continue;
                }
                if visited.contains(&current) {
                    continue;
                }
                if !in_progress.insert(current) {
                    return Err(CircularDependency { cell: current });
                }

                stack.push((current, true));
                if let Some(deps) = self.dependencies.get(&current) {
                    // Reverse push so dependencies are visited in
                    // ascending coordinate order
                    for &dep in deps.iter().rev() {
                        if cells.contains(&dep) && !visited.contains(&dep) {
                            stack.push((dep, false));
                        }
                    }
                }
            }
        }

        Ok(order)
    }

    /// Direct dependencies of a cell (a copy; the graph itself is never
    /// handed out)
    pub fn dependencies_of(&self, cell: CellCoord) -> BTreeSet<CellCoord> {
        self.dependencies.get(&cell).cloned().unwrap_or_default()
    }

    /// Direct dependents of a cell
    pub fn dependents_of(&self, cell: CellCoord) -> BTreeSet<CellCoord> {
        self.dependents.get(&cell).cloned().unwrap_or_default()
    }

    /// Clear both mappings (whole-sheet reset)
    pub fn reset(&mut self) {
        self.dependencies.clear();
        self.dependents.clear();
    }

    #[cfg(test)]
    fn is_symmetric(&self) -> bool {
        let forward_ok = self.dependencies.iter().all(|(cell, deps)| {
            deps.iter().all(|dep| {
                self.dependents
                    .get(dep)
                    .is_some_and(|set| set.contains(cell))
            })
        });
        let reverse_ok = self.dependents.iter().all(|(cell, deps)| {
            deps.iter().all(|dep| {
                self.dependencies
                    .get(dep)
                    .is_some_and(|set| set.contains(cell))
            })
        });
        forward_ok && reverse_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(notation: &str) -> CellCoord {
        CellCoord::from_a1(notation).unwrap()
    }

    fn set(notations: &[&str]) -> BTreeSet<CellCoord> {
        notations.iter().map(|n| coord(n)).collect()
    }

    #[test]
    fn test_add_and_clear_keep_mappings_inverse() {
        let mut graph = DependencyGraph::new();

        graph.add_dependency(coord("C1"), coord("A1"));
        graph.add_dependency(coord("C1"), coord("B1"));
        graph.add_dependency(coord("B1"), coord("A1"));
        assert!(graph.is_symmetric());

        assert_eq!(graph.dependencies_of(coord("C1")), set(&["A1", "B1"]));
        assert_eq!(graph.dependents_of(coord("A1")), set(&["B1", "C1"]));

        graph.clear_dependencies(coord("C1"));
        assert!(graph.is_symmetric());
        assert!(graph.dependencies_of(coord("C1")).is_empty());
        assert_eq!(graph.dependents_of(coord("A1")), set(&["B1"]));
    }

    #[test]
    fn test_add_dependency_idempotent() {
        let mut graph = DependencyGraph::new();

        graph.add_dependency(coord("B1"), coord("A1"));
        graph.add_dependency(coord("B1"), coord("A1"));

        assert_eq!(graph.dependencies_of(coord("B1")).len(), 1);
        assert_eq!(graph.dependents_of(coord("A1")).len(), 1);
    }

    #[test]
    fn test_would_create_cycle() {
        let mut graph = DependencyGraph::new();

        // A1 = B1, B1 = C1
        graph.add_dependency(coord("A1"), coord("B1"));
        graph.add_dependency(coord("B1"), coord("C1"));

        // C1 = A1 would close the loop
        assert!(graph.would_create_cycle(coord("C1"), &set(&["A1"])));
        // C1 = D1 would not
        assert!(!graph.would_create_cycle(coord("C1"), &set(&["D1"])));
        // Only one bad target is enough
        assert!(graph.would_create_cycle(coord("C1"), &set(&["D1", "B1"])));
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let graph = DependencyGraph::new();
        assert!(graph.would_create_cycle(coord("A1"), &set(&["A1"])));
    }

    #[test]
    fn test_all_dependents_transitive() {
        let mut graph = DependencyGraph::new();

        // B1 = A1, C1 = B1, D1 = A1
        graph.add_dependency(coord("B1"), coord("A1"));
        graph.add_dependency(coord("C1"), coord("B1"));
        graph.add_dependency(coord("D1"), coord("A1"));

        assert_eq!(graph.all_dependents(coord("A1")), set(&["B1", "C1", "D1"]));
        assert_eq!(graph.all_dependents(coord("B1")), set(&["C1"]));
        assert!(graph.all_dependents(coord("C1")).is_empty());
    }

    #[test]
    fn test_calculation_order_topological() {
        let mut graph = DependencyGraph::new();

        // C1 = B1 + A1, B1 = A1
        graph.add_dependency(coord("B1"), coord("A1"));
        graph.add_dependency(coord("C1"), coord("B1"));
        graph.add_dependency(coord("C1"), coord("A1"));

        let order = graph
            .calculation_order(&set(&["A1", "B1", "C1"]))
            .unwrap();

        let pos = |n: &str| order.iter().position(|&c| c == coord(n)).unwrap();
        assert_eq!(order.len(), 3);
        assert!(pos("A1") < pos("B1"));
        assert!(pos("B1") < pos("C1"));
    }

    #[test]
    fn test_calculation_order_diamond() {
        let mut graph = DependencyGraph::new();

        // B1 = A1, C1 = A1, D1 = B1 + C1
        graph.add_dependency(coord("B1"), coord("A1"));
        graph.add_dependency(coord("C1"), coord("A1"));
        graph.add_dependency(coord("D1"), coord("B1"));
        graph.add_dependency(coord("D1"), coord("C1"));

        let order = graph
            .calculation_order(&set(&["A1", "B1", "C1", "D1"]))
            .unwrap();

        let pos = |n: &str| order.iter().position(|&c| c == coord(n)).unwrap();
        assert_eq!(order.len(), 4);
        assert!(pos("A1") < pos("B1"));
        assert!(pos("A1") < pos("C1"));
        assert!(pos("B1") < pos("D1"));
        assert!(pos("C1") < pos("D1"));
    }

    #[test]
    fn test_calculation_order_deterministic() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency(coord("B2"), coord("A1"));
        graph.add_dependency(coord("B1"), coord("A1"));

        let cells = set(&["A1", "B1", "B2"]);
        let first = graph.calculation_order(&cells).unwrap();
        let second = graph.calculation_order(&cells).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_calculation_order_ignores_edges_outside_set() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency(coord("B1"), coord("A1"));

        // A1 is outside the requested set and must not appear
        let order = graph.calculation_order(&set(&["B1"])).unwrap();
        assert_eq!(order, vec![coord("B1")]);
    }

    #[test]
    fn test_calculation_order_detects_persisted_cycle() {
        let mut graph = DependencyGraph::new();

        // Force a cycle past the public API, as the defensive check
        // would see it
        graph.add_dependency(coord("A1"), coord("B1"));
        graph.add_dependency(coord("B1"), coord("A1"));

        let result = graph.calculation_order(&set(&["A1", "B1"]));
        assert!(result.is_err());
    }

    #[test]
    fn test_reset() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency(coord("B1"), coord("A1"));

        graph.reset();

        assert!(graph.dependencies_of(coord("B1")).is_empty());
        assert!(graph.dependents_of(coord("A1")).is_empty());
    }

    #[test]
    fn test_deep_chain_uses_no_native_recursion() {
        // 10k-cell chain would overflow the stack with naive recursion
        let mut graph = DependencyGraph::new();
        let mut cells = BTreeSet::new();
        for row in 1..10_000u32 {
            graph.add_dependency(CellCoord::new(row + 1, 1), CellCoord::new(row, 1));
            cells.insert(CellCoord::new(row, 1));
        }
        cells.insert(CellCoord::new(10_000, 1));

        let order = graph.calculation_order(&cells).unwrap();
        assert_eq!(order.len(), 10_000);
        assert_eq!(order[0], CellCoord::new(1, 1));
        assert_eq!(order[9_999], CellCoord::new(10_000, 1));

        assert_eq!(graph.all_dependents(CellCoord::new(1, 1)).len(), 9_999);
        assert!(graph.would_create_cycle(
            CellCoord::new(1, 1),
            &BTreeSet::from([CellCoord::new(10_000, 1)]),
        ));
    }
}
