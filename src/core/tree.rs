//! Task tree with success and failure branches.
//!
//! `TaskTree` stores tasks in a petgraph `StableDiGraph`. Every edge is
//! labelled with the branch it belongs to. Each task has at most one parent
//! and at most one successor per branch, so the tree stays acyclic and a
//! subtree can be dropped as a unit.

use crate::core::task::Task;
use crate::error::{Error, Result};
use petgraph::algo::has_path_connecting;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::{Dfs, EdgeRef};
use petgraph::Direction;

/// Index of a task inside its `TaskTree`.
pub type TaskIndex = NodeIndex;

/// Which result of the parent task leads along an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Branch {
    Success,
    Failure,
}

/// Tree of tasks owned by a job.
#[derive(Debug, Clone, Default)]
pub struct TaskTree {
    graph: StableDiGraph<Task, Branch>,
    root: Option<TaskIndex>,
}

impl TaskTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tree holding only `root`.
    pub fn with_root(root: Task) -> Self {
        let mut tree = Self::new();
        tree.add_task(root);
        tree
    }

    /// Add an unattached task. The first task added becomes the root.
    pub fn add_task(&mut self, task: Task) -> TaskIndex {
        let index = self.graph.add_node(task);
        if self.root.is_none() {
            self.root = Some(index);
        }
        index
    }

    pub fn root(&self) -> Option<TaskIndex> {
        self.root
    }

    pub fn task(&self, index: TaskIndex) -> Option<&Task> {
        self.graph.node_weight(index)
    }

    pub fn task_mut(&mut self, index: TaskIndex) -> Option<&mut Task> {
        self.graph.node_weight_mut(index)
    }

    /// Number of tasks, attached or not.
    pub fn task_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Successor of `index` along `branch`.
    pub fn next(&self, index: TaskIndex, branch: Branch) -> Option<TaskIndex> {
        self.graph
            .edges_directed(index, Direction::Outgoing)
            .find(|edge| *edge.weight() == branch)
            .map(|edge| edge.target())
    }

    pub fn parent(&self, index: TaskIndex) -> Option<TaskIndex> {
        self.graph
            .neighbors_directed(index, Direction::Incoming)
            .next()
    }

    /// Run `next` after `index` when `index` succeeds.
    ///
    /// # Errors
    /// See [`TaskTree::set_next_unconditional`].
    pub fn set_next_on_success(&mut self, index: TaskIndex, next: TaskIndex) -> Result<()> {
        self.attach(index, next, &[Branch::Success])
    }

    /// Run `next` after `index` when `index` fails.
    ///
    /// # Errors
    /// See [`TaskTree::set_next_unconditional`].
    pub fn set_next_on_failure(&mut self, index: TaskIndex, next: TaskIndex) -> Result<()> {
        self.attach(index, next, &[Branch::Failure])
    }

    /// Run `next` after `index` whatever its result.
    ///
    /// A successor previously attached on an affected branch is dropped
    /// together with its subtree.
    ///
    /// # Errors
    /// - `NullPointer` if either index is not in the tree
    /// - `InvalidParameter` if `next` is `index`, is the root, already has
    ///   another parent, or would close a cycle
    pub fn set_next_unconditional(&mut self, index: TaskIndex, next: TaskIndex) -> Result<()> {
        self.attach(index, next, &[Branch::Success, Branch::Failure])
    }

    fn attach(&mut self, index: TaskIndex, next: TaskIndex, branches: &[Branch]) -> Result<()> {
        if !self.graph.contains_node(index) || !self.graph.contains_node(next) {
            return Err(Error::NullPointer);
        }
        if index == next || Some(next) == self.root {
            return Err(Error::InvalidParameter);
        }
        if let Some(parent) = self.parent(next) {
            if parent != index {
                return Err(Error::InvalidParameter);
            }
        }
        if has_path_connecting(&self.graph, next, index, None) {
            return Err(Error::InvalidParameter);
        }

        for &branch in branches {
            if let Some(old) = self.next(index, branch) {
                if old == next {
                    continue;
                }
                self.detach(index, branch);
                if self.parent(old).is_none() {
                    self.remove_subtree(old);
                }
            }
            self.graph.add_edge(index, next, branch);
        }
        Ok(())
    }

    fn detach(&mut self, index: TaskIndex, branch: Branch) {
        let edge = self
            .graph
            .edges_directed(index, Direction::Outgoing)
            .find(|edge| *edge.weight() == branch)
            .map(|edge| edge.id());
        if let Some(edge) = edge {
            self.graph.remove_edge(edge);
        }
    }

    /// Remove `index` and every task reachable from it.
    ///
    /// Returns the number of tasks removed.
    pub fn remove_subtree(&mut self, index: TaskIndex) -> usize {
        if !self.graph.contains_node(index) {
            return 0;
        }
        let mut doomed = Vec::new();
        let mut dfs = Dfs::new(&self.graph, index);
        while let Some(node) = dfs.next(&self.graph) {
            doomed.push(node);
        }
        for node in &doomed {
            self.graph.remove_node(*node);
        }
        if self.root.is_some_and(|root| !self.graph.contains_node(root)) {
            self.root = None;
        }
        doomed.len()
    }

    /// Tasks reachable from the root in depth-first order.
    pub fn iter(&self) -> impl Iterator<Item = (TaskIndex, &Task)> + '_ {
        let mut order = Vec::new();
        if let Some(root) = self.root {
            let mut dfs = Dfs::new(&self.graph, root);
            while let Some(node) = dfs.next(&self.graph) {
                order.push(node);
            }
        }
        order
            .into_iter()
            .filter_map(move |index| self.graph.node_weight(index).map(|task| (index, task)))
    }
}
