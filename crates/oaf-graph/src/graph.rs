use std::collections::{BTreeMap, BTreeSet, VecDeque};

use oaf_core::errors::{ErrorInfo, OafError};
use oaf_core::provenance::SchemaVersion;

/// Directed acyclic dependency graph over calibration nodes.
///
/// An edge `a -> b` means `a` depends on `b`: checking `a` requires `b` to be
/// in spec, and a diagnosis wave rooted at `a` descends into `b`. Following
/// the Optimus convention, `b` is called a *successor* (dependency) of `a`
/// and `a` a *predecessor* (dependent) of `b`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibrationGraph {
    schema: SchemaVersion,
    order: Vec<String>,
    successors: BTreeMap<String, Vec<String>>,
    predecessors: BTreeMap<String, Vec<String>>,
}

impl CalibrationGraph {
    /// Creates an empty graph with the current schema version.
    pub fn new() -> Self {
        Self {
            schema: SchemaVersion::new(1, 0, 0),
            order: Vec::new(),
            successors: BTreeMap::new(),
            predecessors: BTreeMap::new(),
        }
    }

    /// Returns the schema version the graph serializes with.
    pub fn schema(&self) -> SchemaVersion {
        self.schema
    }

    /// Adds a named node. Names must be unique.
    pub fn add_node(&mut self, name: impl Into<String>) -> Result<(), OafError> {
        let name = name.into();
        if self.successors.contains_key(&name) {
            return Err(OafError::Graph(
                ErrorInfo::new("duplicate-node", "node already present")
                    .with_context("node", name),
            ));
        }
        self.order.push(name.clone());
        self.successors.insert(name.clone(), Vec::new());
        self.predecessors.insert(name, Vec::new());
        Ok(())
    }

    /// Adds a dependency edge `from -> to`. Rejects unknown endpoints,
    /// duplicate edges, self loops, and edges that would create a cycle.
    pub fn add_edge(&mut self, from: &str, to: &str) -> Result<(), OafError> {
        for endpoint in [from, to] {
            if !self.successors.contains_key(endpoint) {
                return Err(OafError::Graph(
                    ErrorInfo::new("unknown-node", "edge endpoint is not a node")
                        .with_context("node", endpoint),
                ));
            }
        }
        if from == to {
            return Err(OafError::Graph(
                ErrorInfo::new("self-loop", "node cannot depend on itself")
                    .with_context("node", from),
            ));
        }
        if self.successors[from].iter().any(|n| n == to) {
            return Err(OafError::Graph(
                ErrorInfo::new("duplicate-edge", "edge already present")
                    .with_context("from", from)
                    .with_context("to", to),
            ));
        }
        // The new edge closes a cycle exactly when `from` is reachable from
        // `to` along existing dependency edges.
        if self.is_reachable(to, from) {
            return Err(OafError::Graph(
                ErrorInfo::new("would-create-cycle", "edge would create a dependency cycle")
                    .with_context("from", from)
                    .with_context("to", to),
            ));
        }
        self.successors.get_mut(from).unwrap().push(to.to_string());
        self.predecessors.get_mut(to).unwrap().push(from.to_string());
        Ok(())
    }

    /// Returns true when the graph contains the named node.
    pub fn contains(&self, name: &str) -> bool {
        self.successors.contains_key(name)
    }

    /// Number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true when the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Node names in insertion order.
    pub fn nodes(&self) -> &[String] {
        &self.order
    }

    /// Direct dependencies of a node, in edge insertion order.
    pub fn successors(&self, name: &str) -> Result<&[String], OafError> {
        self.successors
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| Self::unknown(name))
    }

    /// Direct dependents of a node.
    pub fn predecessors(&self, name: &str) -> Result<&[String], OafError> {
        self.predecessors
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| Self::unknown(name))
    }

    /// All transitive dependencies of a node in deepest-first DFS postorder,
    /// deduplicated. This is the submission order used by trigger waves: a
    /// dependency always precedes every node that depends on it.
    pub fn transitive_dependencies(&self, name: &str) -> Result<Vec<String>, OafError> {
        if !self.contains(name) {
            return Err(Self::unknown(name));
        }
        let mut ordered = Vec::new();
        let mut seen = BTreeSet::new();
        self.postorder(name, &mut ordered, &mut seen);
        Ok(ordered)
    }

    fn postorder(&self, name: &str, ordered: &mut Vec<String>, seen: &mut BTreeSet<String>) {
        for successor in &self.successors[name] {
            if seen.insert(successor.clone()) {
                self.postorder(successor, ordered, seen);
                ordered.push(successor.clone());
            }
        }
    }

    /// BFS hop counts from `name` to every node reachable along dependency
    /// edges, including `name` itself at distance zero.
    pub fn shortest_path_lengths(&self, name: &str) -> Result<BTreeMap<String, usize>, OafError> {
        if !self.contains(name) {
            return Err(Self::unknown(name));
        }
        let mut lengths = BTreeMap::new();
        let mut queue = VecDeque::new();
        lengths.insert(name.to_string(), 0usize);
        queue.push_back(name.to_string());
        while let Some(current) = queue.pop_front() {
            let depth = lengths[&current];
            for successor in &self.successors[&current] {
                if !lengths.contains_key(successor) {
                    lengths.insert(successor.clone(), depth + 1);
                    queue.push_back(successor.clone());
                }
            }
        }
        Ok(lengths)
    }

    fn is_reachable(&self, from: &str, target: &str) -> bool {
        let mut stack = vec![from.to_string()];
        let mut seen = BTreeSet::new();
        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if seen.insert(current.clone()) {
                for successor in &self.successors[&current] {
                    stack.push(successor.clone());
                }
            }
        }
        false
    }

    fn unknown(name: &str) -> OafError {
        OafError::Graph(
            ErrorInfo::new("unknown-node", "node is not part of the graph")
                .with_context("node", name),
        )
    }
}

impl Default for CalibrationGraph {
    fn default() -> Self {
        Self::new()
    }
}
