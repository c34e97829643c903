//! # Dependency Graph
//!
//! A directed graph over service names. An edge `A -> B` means "A depends on B": B must be
//! started before A and stopped after it.
//!
//! ## Ordering
//!
//! [`DependencyGraph::plan`] runs a depth-first search from every node that nothing depends
//! on, in node insertion order, visiting each node's dependencies in edge insertion order and
//! emitting a node once all of its dependencies have been emitted. The result is deterministic
//! for a given sequence of insertions.
//!
//! ## Cycles
//!
//! Before ordering, a DFS from every node looks for a back edge. The first one found is
//! reported as the exact path walked, closing on the repeated node:
//!
//! ```rust
//! use runsv::lifecycle::DependencyGraph;
//!
//! let mut graph = DependencyGraph::new();
//! graph.add_dependency("a", "b");
//! graph.add_dependency("b", "c");
//! graph.add_dependency("c", "a");
//!
//! let err = graph.plan().unwrap_err();
//! assert_eq!(err.to_string(), "Dependency Cycle Found: a -> b -> c -> a");
//! ```

use crate::framework::error::CycleError;
use indexmap::IndexMap;

#[derive(Debug, Clone, Default)]
struct Edges {
    /// Indices of the nodes this node depends on, in insertion order.
    dependencies: Vec<usize>,
    /// Number of nodes depending on this one.
    dependants: usize,
}

/// Directed dependency graph keyed by service name.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: IndexMap<String, Edges>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. Adding an existing node is a no-op.
    pub fn add_node(&mut self, name: &str) -> usize {
        if let Some(index) = self.nodes.get_index_of(name) {
            return index;
        }
        self.nodes.insert_full(name.to_string(), Edges::default()).0
    }

    /// Record that `from` depends on `to`, adding either node if missing.
    ///
    /// Duplicate edges are ignored. A self edge is kept and reported as a cycle.
    pub fn add_dependency(&mut self, from: &str, to: &str) {
        let from = self.add_node(from);
        let to = self.add_node(to);
        let already_linked = self
            .edges(from)
            .is_some_and(|edges| edges.dependencies.contains(&to));
        if already_linked {
            return;
        }
        if let Some((_, edges)) = self.nodes.get_index_mut(from) {
            edges.dependencies.push(to);
        }
        if let Some((_, edges)) = self.nodes.get_index_mut(to) {
            edges.dependants += 1;
        }
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Node names in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The nodes `name` depends on directly, in the order the edges were added.
    ///
    /// Unknown names have no dependencies.
    pub fn direct_dependencies_of(&self, name: &str) -> Vec<String> {
        self.nodes
            .get(name)
            .map(|edges| {
                edges
                    .dependencies
                    .iter()
                    .filter_map(|&index| self.name_of(index))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Total order in which every node follows all of its dependencies.
    pub fn plan(&self) -> Result<Vec<String>, CycleError> {
        let count = self.nodes.len();

        let mut visited = vec![false; count];
        let mut discarded = Vec::with_capacity(count);
        for start in 0..count {
            self.visit(start, &mut visited, &mut discarded)?;
        }

        let mut visited = vec![false; count];
        let mut order = Vec::with_capacity(count);
        let roots = self
            .nodes
            .values()
            .enumerate()
            .filter(|(_, edges)| edges.dependants == 0)
            .map(|(index, _)| index);
        for root in roots {
            self.visit(root, &mut visited, &mut order)?;
        }

        Ok(order
            .into_iter()
            .filter_map(|index| self.name_of(index))
            .collect())
    }

    /// [`plan`](Self::plan) reversed: dependants before their dependencies.
    pub fn reverse_plan(&self) -> Result<Vec<String>, CycleError> {
        let mut plan = self.plan()?;
        plan.reverse();
        Ok(plan)
    }

    /// Iterative DFS from `start`, appending finished nodes to `order`.
    fn visit(
        &self,
        start: usize,
        visited: &mut [bool],
        order: &mut Vec<usize>,
    ) -> Result<(), CycleError> {
        if visited[start] {
            return Ok(());
        }

        let mut on_path = vec![false; self.nodes.len()];
        let mut path: Vec<usize> = Vec::new();
        // (node, dependencies already pushed)
        let mut stack: Vec<(usize, bool)> = vec![(start, false)];

        while let Some(&(node, expanded)) = stack.last() {
            if expanded {
                stack.pop();
                path.pop();
                on_path[node] = false;
                visited[node] = true;
                order.push(node);
                continue;
            }

            if visited[node] {
                stack.pop();
                continue;
            }
            if on_path[node] {
                path.push(node);
                return Err(CycleError::new(
                    path.into_iter()
                        .filter_map(|index| self.name_of(index))
                        .collect(),
                ));
            }

            on_path[node] = true;
            path.push(node);
            if let Some(top) = stack.last_mut() {
                top.1 = true;
            }
            if let Some(edges) = self.edges(node) {
                // Reversed so the first declared dependency is explored first.
                for &dependency in edges.dependencies.iter().rev() {
                    stack.push((dependency, false));
                }
            }
        }

        Ok(())
    }

    fn edges(&self, index: usize) -> Option<&Edges> {
        self.nodes.get_index(index).map(|(_, edges)| edges)
    }

    fn name_of(&self, index: usize) -> Option<String> {
        self.nodes.get_index(index).map(|(name, _)| name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(plan: &[String], name: &str) -> usize {
        plan.iter().position(|n| n == name).unwrap()
    }

    #[test]
    fn empty_graph_has_empty_plan() {
        assert!(DependencyGraph::new().plan().unwrap().is_empty());
    }

    #[test]
    fn dependencies_come_first() {
        let mut graph = DependencyGraph::new();
        graph.add_node("a");
        graph.add_node("b");
        graph.add_dependency("b", "a");

        assert_eq!(graph.plan().unwrap(), vec!["a", "b"]);
        assert_eq!(graph.reverse_plan().unwrap(), vec!["b", "a"]);
    }

    #[test]
    fn independent_nodes_keep_insertion_order() {
        let mut graph = DependencyGraph::new();
        for name in ["x", "y", "z"] {
            graph.add_node(name);
        }
        assert_eq!(graph.plan().unwrap(), vec!["x", "y", "z"]);
    }

    #[test]
    fn diamond_is_ordered_and_deterministic() {
        let mut graph = DependencyGraph::new();
        for name in ["db", "cache", "search", "api"] {
            graph.add_node(name);
        }
        graph.add_dependency("cache", "db");
        graph.add_dependency("search", "db");
        graph.add_dependency("api", "cache");
        graph.add_dependency("api", "search");

        let plan = graph.plan().unwrap();
        assert_eq!(plan, vec!["db", "cache", "search", "api"]);
        assert_eq!(plan, graph.plan().unwrap());
    }

    #[test]
    fn every_edge_is_respected() {
        let mut graph = DependencyGraph::new();
        let edges = [
            ("e", "d"),
            ("d", "b"),
            ("c", "a"),
            ("e", "c"),
            ("b", "a"),
            ("f", "a"),
        ];
        for (from, to) in edges {
            graph.add_dependency(from, to);
        }

        let plan = graph.plan().unwrap();
        assert_eq!(plan.len(), graph.len());
        for (from, to) in edges {
            assert!(position(&plan, to) < position(&plan, from), "{to} before {from}");
        }
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("a", "a");
        assert_eq!(
            graph.plan().unwrap_err().to_string(),
            "Dependency Cycle Found: a -> a"
        );
    }

    #[test]
    fn cycle_path_starts_where_the_walk_started() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("x", "a");
        graph.add_dependency("a", "b");
        graph.add_dependency("b", "a");

        let err = graph.reverse_plan().unwrap_err();
        assert_eq!(err.path, vec!["x", "a", "b", "a"]);
    }

    #[test]
    fn direct_dependencies_only() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("api", "cache");
        graph.add_dependency("cache", "db");
        graph.add_dependency("api", "search");
        graph.add_dependency("api", "cache");

        assert_eq!(graph.direct_dependencies_of("api"), vec!["cache", "search"]);
        assert_eq!(graph.direct_dependencies_of("db"), Vec::<String>::new());
        assert!(graph.direct_dependencies_of("missing").is_empty());
        assert_eq!(
            graph.nodes().collect::<Vec<_>>(),
            vec!["api", "cache", "db", "search"]
        );
    }
}
