//! Target graph data structures and algorithms
//!
//! Provides target registration, dependency closure, cycle detection, and
//! topological ordering that honors `before` / `after` hints.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::error::BuildError;

/// A named unit of build work
#[derive(Debug, Clone)]
pub struct Target<A> {
    /// Target name as shown to users
    pub name: String,

    /// One-line description for `--list`
    pub description: Option<String>,

    /// Targets that must run (and succeed) before this one
    pub depends_on: Vec<String>,

    /// Targets this one must precede when both are planned
    pub before: Vec<String>,

    /// Targets this one must follow when both are planned
    pub after: Vec<String>,

    /// What to do when the target runs
    pub action: A,
}

impl<A> Target<A> {
    /// Create a target with no relations
    pub fn new(name: impl Into<String>, action: A) -> Self {
        Self {
            name: name.into(),
            description: None,
            depends_on: Vec::new(),
            before: Vec::new(),
            after: Vec::new(),
            action,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn depends_on(mut self, names: &[&str]) -> Self {
        self.depends_on.extend(names.iter().map(|n| n.to_string()));
        self
    }

    pub fn before(mut self, names: &[&str]) -> Self {
        self.before.extend(names.iter().map(|n| n.to_string()));
        self
    }

    pub fn after(mut self, names: &[&str]) -> Self {
        self.after.extend(names.iter().map(|n| n.to_string()));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    InProgress,
    Done,
}

/// Registry of targets keyed by case-insensitive name
#[derive(Debug, Clone)]
pub struct TargetGraph<A> {
    /// Targets in registration order
    targets: Vec<Target<A>>,

    /// Lowercased name -> position in `targets`
    index: HashMap<String, usize>,
}

impl<A> Default for TargetGraph<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> TargetGraph<A> {
    /// Create a new empty target graph
    pub fn new() -> Self {
        Self {
            targets: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a target
    ///
    /// Relations may name targets that are registered later; they are checked
    /// when the graph is resolved.
    pub fn add(&mut self, target: Target<A>) -> Result<(), BuildError> {
        let key = target.name.to_lowercase();
        if self.index.contains_key(&key) {
            return Err(BuildError::DuplicateTarget { name: target.name });
        }
        self.index.insert(key, self.targets.len());
        self.targets.push(target);
        Ok(())
    }

    /// Get a target by name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&Target<A>> {
        self.index.get(&name.to_lowercase()).map(|&i| &self.targets[i])
    }

    /// All targets in registration order
    pub fn targets(&self) -> &[Target<A>] {
        &self.targets
    }

    /// Names of all targets in registration order
    pub fn names(&self) -> Vec<String> {
        self.targets.iter().map(|t| t.name.clone()).collect()
    }

    fn lookup(&self, name: &str, referenced_by: Option<&str>) -> Result<usize, BuildError> {
        self.index
            .get(&name.to_lowercase())
            .copied()
            .ok_or_else(|| BuildError::UnknownTarget {
                name: name.to_string(),
                referenced_by: referenced_by.map(str::to_string),
                available: self.names(),
            })
    }

    /// Resolve the execution plan for a requested target
    ///
    /// The plan contains the requested target and its transitive dependencies,
    /// each exactly once. Every dependency precedes its dependent and every
    /// `before` / `after` hint between two planned targets is honored. Ties are
    /// broken by depth-first declaration order.
    pub fn resolve(&self, requested: &str) -> Result<Vec<&Target<A>>, BuildError> {
        let root = self.lookup(requested, None)?;

        let mut state = vec![Visit::New; self.targets.len()];
        let mut path = Vec::new();
        let mut closure = Vec::new();
        self.visit(root, &mut state, &mut path, &mut closure)?;

        let ordered = self.order(&closure)?;
        Ok(ordered.into_iter().map(|i| &self.targets[i]).collect())
    }

    /// Check every relation in the graph, whether or not it is planned
    pub fn validate(&self) -> Result<(), BuildError> {
        let all: Vec<usize> = (0..self.targets.len()).collect();
        self.order(&all).map(|_| ())
    }

    /// Depth-first dependency closure, emitting targets in post-order
    fn visit(
        &self,
        idx: usize,
        state: &mut [Visit],
        path: &mut Vec<usize>,
        closure: &mut Vec<usize>,
    ) -> Result<(), BuildError> {
        match state[idx] {
            Visit::Done => return Ok(()),
            Visit::InProgress => {
                let start = path.iter().position(|&p| p == idx).unwrap_or(0);
                let mut targets: Vec<String> = path[start..]
                    .iter()
                    .map(|&i| self.targets[i].name.clone())
                    .collect();
                targets.push(self.targets[idx].name.clone());
                return Err(BuildError::DependencyCycle { targets });
            }
            Visit::New => {}
        }

        state[idx] = Visit::InProgress;
        path.push(idx);

        let target = &self.targets[idx];
        for dep in &target.depends_on {
            let dep_idx = self.lookup(dep, Some(&target.name))?;
            self.visit(dep_idx, state, path, closure)?;
        }

        path.pop();
        state[idx] = Visit::Done;
        closure.push(idx);
        Ok(())
    }

    /// Topologically order `selected`, preferring the order it is given in
    fn order(&self, selected: &[usize]) -> Result<Vec<usize>, BuildError> {
        let rank: HashMap<usize, usize> = selected
            .iter()
            .enumerate()
            .map(|(rank, &idx)| (idx, rank))
            .collect();

        // Edges in rank space: successors[a] contains b when a must run first
        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); selected.len()];
        let mut add_edge = |from: usize, to: usize| {
            if !successors[from].contains(&to) {
                successors[from].push(to);
            }
        };

        for (r, &idx) in selected.iter().enumerate() {
            let target = &self.targets[idx];
            for dep in &target.depends_on {
                let dep_idx = self.lookup(dep, Some(&target.name))?;
                if let Some(&dep_rank) = rank.get(&dep_idx) {
                    add_edge(dep_rank, r);
                }
            }
            for later in &target.before {
                let later_idx = self.lookup(later, Some(&target.name))?;
                if let Some(&later_rank) = rank.get(&later_idx) {
                    add_edge(r, later_rank);
                }
            }
            for earlier in &target.after {
                let earlier_idx = self.lookup(earlier, Some(&target.name))?;
                if let Some(&earlier_rank) = rank.get(&earlier_idx) {
                    add_edge(earlier_rank, r);
                }
            }
        }

        let mut in_degree = vec![0usize; selected.len()];
        for succ in &successors {
            for &to in succ {
                in_degree[to] += 1;
            }
        }

        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == 0)
            .map(|(r, _)| Reverse(r))
            .collect();

        let mut ordered = Vec::with_capacity(selected.len());
        while let Some(Reverse(r)) = ready.pop() {
            ordered.push(selected[r]);
            for &to in &successors[r] {
                in_degree[to] -= 1;
                if in_degree[to] == 0 {
                    ready.push(Reverse(to));
                }
            }
        }

        if ordered.len() < selected.len() {
            let remaining: Vec<usize> = (0..selected.len()).filter(|&r| in_degree[r] > 0).collect();
            let cycle = find_cycle(&remaining, &successors);
            return Err(BuildError::DependencyCycle {
                targets: cycle
                    .into_iter()
                    .map(|r| self.targets[selected[r]].name.clone())
                    .collect(),
            });
        }

        Ok(ordered)
    }
}

/// Find one cycle among `nodes`, returned as a closed path (first == last)
fn find_cycle(nodes: &[usize], successors: &[Vec<usize>]) -> Vec<usize> {
    fn dfs(
        node: usize,
        successors: &[Vec<usize>],
        state: &mut HashMap<usize, Visit>,
        path: &mut Vec<usize>,
    ) -> Option<Vec<usize>> {
        state.insert(node, Visit::InProgress);
        path.push(node);

        for &next in &successors[node] {
            match state.get(&next).copied().unwrap_or(Visit::New) {
                Visit::New => {
                    if let Some(cycle) = dfs(next, successors, state, path) {
                        return Some(cycle);
                    }
                }
                Visit::InProgress => {
                    let start = path.iter().position(|&p| p == next).unwrap_or(0);
                    let mut cycle = path[start..].to_vec();
                    cycle.push(next);
                    return Some(cycle);
                }
                Visit::Done => {}
            }
        }

        path.pop();
        state.insert(node, Visit::Done);
        None
    }

    let mut state = HashMap::new();
    for &node in nodes {
        if !state.contains_key(&node) {
            let mut path = Vec::new();
            if let Some(cycle) = dfs(node, successors, &mut state, &mut path) {
                return cycle;
            }
        }
    }

    // Every leftover node has a predecessor in the leftover set, so a cycle
    // always exists; report the set if the walk somehow missed it
    nodes.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names<A>(plan: &[&Target<A>]) -> Vec<String> {
        plan.iter().map(|t| t.name.clone()).collect()
    }

    fn script_graph() -> TargetGraph<()> {
        let mut graph = TargetGraph::new();
        graph.add(Target::new("Clean", ()).before(&["Restore"])).unwrap();
        graph.add(Target::new("Restore", ()).before(&["Compile"])).unwrap();
        graph.add(Target::new("Compile", ()).depends_on(&["Restore"])).unwrap();
        graph
            .add(Target::new("Publish", ()).depends_on(&["Clean", "Restore", "UpdateVersion", "Compile"]))
            .unwrap();
        graph.add(Target::new("PrepareGitTag", ()).depends_on(&["UpdateVersion"])).unwrap();
        graph.add(Target::new("UpdateVersion", ()).before(&["Compile"])).unwrap();
        graph
    }

    #[test]
    fn test_dependency_before_dependent() {
        let graph = script_graph();
        let plan = graph.resolve("Compile").unwrap();
        assert_eq!(names(&plan), vec!["Restore", "Compile"]);
    }

    #[test]
    fn test_soft_constraints_do_not_pull_targets_in() {
        let graph = script_graph();
        let plan = graph.resolve("Restore").unwrap();
        assert_eq!(names(&plan), vec!["Restore"]);
    }

    #[test]
    fn test_full_publish_order() {
        let graph = script_graph();
        let plan = graph.resolve("Publish").unwrap();
        assert_eq!(
            names(&plan),
            vec!["Clean", "Restore", "UpdateVersion", "Compile", "Publish"]
        );
    }

    #[test]
    fn test_each_target_once() {
        let mut graph = TargetGraph::new();
        graph.add(Target::new("a", ()).depends_on(&["b", "c"])).unwrap();
        graph.add(Target::new("b", ()).depends_on(&["d"])).unwrap();
        graph.add(Target::new("c", ()).depends_on(&["d"])).unwrap();
        graph.add(Target::new("d", ())).unwrap();

        let plan = graph.resolve("a").unwrap();
        assert_eq!(names(&plan), vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn test_after_hint_reorders() {
        let mut graph = TargetGraph::new();
        graph.add(Target::new("all", ()).depends_on(&["x", "y"])).unwrap();
        graph.add(Target::new("x", ()).after(&["y"])).unwrap();
        graph.add(Target::new("y", ())).unwrap();

        let plan = graph.resolve("all").unwrap();
        assert_eq!(names(&plan), vec!["y", "x", "all"]);
    }

    #[test]
    fn test_dependency_cycle_names_targets() {
        let mut graph = TargetGraph::new();
        graph.add(Target::new("A", ()).depends_on(&["B"])).unwrap();
        graph.add(Target::new("B", ()).depends_on(&["A"])).unwrap();

        match graph.resolve("A") {
            Err(BuildError::DependencyCycle { targets }) => {
                assert!(targets.contains(&"A".to_string()));
                assert!(targets.contains(&"B".to_string()));
            }
            other => panic!("expected cycle, got {:?}", other.map(|p| names(&p))),
        }
    }

    #[test]
    fn test_ordering_cycle_detected() {
        let mut graph = TargetGraph::new();
        graph.add(Target::new("all", ()).depends_on(&["a", "b"])).unwrap();
        graph.add(Target::new("a", ()).before(&["b"])).unwrap();
        graph.add(Target::new("b", ()).before(&["a"])).unwrap();

        match graph.resolve("all") {
            Err(BuildError::DependencyCycle { targets }) => {
                assert!(targets.contains(&"a".to_string()));
                assert!(targets.contains(&"b".to_string()));
                assert!(!targets.contains(&"all".to_string()));
            }
            other => panic!("expected cycle, got {:?}", other.map(|p| names(&p))),
        }
    }

    #[test]
    fn test_validate_checks_unplanned_relations() {
        let mut graph = TargetGraph::new();
        graph.add(Target::new("a", ())).unwrap();
        graph.add(Target::new("b", ()).before(&["c"])).unwrap();
        graph.add(Target::new("c", ()).before(&["b"])).unwrap();

        assert_eq!(names(&graph.resolve("a").unwrap()), vec!["a"]);
        assert!(matches!(graph.validate(), Err(BuildError::DependencyCycle { .. })));
        assert!(script_graph().validate().is_ok());
    }

    #[test]
    fn test_unknown_target() {
        let graph = script_graph();
        match graph.resolve("Deploy") {
            Err(BuildError::UnknownTarget { name, referenced_by, available }) => {
                assert_eq!(name, "Deploy");
                assert!(referenced_by.is_none());
                assert_eq!(available.len(), 6);
            }
            other => panic!("expected unknown target, got {:?}", other.map(|p| names(&p))),
        }
    }

    #[test]
    fn test_unknown_dependency_names_referrer() {
        let mut graph = TargetGraph::new();
        graph.add(Target::new("Pack", ()).depends_on(&["Compile"])).unwrap();

        match graph.resolve("Pack") {
            Err(BuildError::UnknownTarget { name, referenced_by, .. }) => {
                assert_eq!(name, "Compile");
                assert_eq!(referenced_by.as_deref(), Some("Pack"));
            }
            other => panic!("expected unknown target, got {:?}", other.map(|p| names(&p))),
        }
    }

    #[test]
    fn test_duplicate_target_rejected() {
        let mut graph = TargetGraph::new();
        graph.add(Target::new("Compile", ())).unwrap();
        assert!(matches!(
            graph.add(Target::new("compile", ())),
            Err(BuildError::DuplicateTarget { .. })
        ));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let graph = script_graph();
        let plan = graph.resolve("compile").unwrap();
        assert_eq!(names(&plan), vec!["Restore", "Compile"]);
        assert_eq!(graph.get("PUBLISH").map(|t| t.name.as_str()), Some("Publish"));
    }
}
