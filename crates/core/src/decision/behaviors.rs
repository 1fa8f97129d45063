//! Behavior registry and the switching protocol.
//!
//! Behaviors are stored in an arena and addressed by [`BehaviorId`]. A leaf is a
//! boxed [`Behavior`]; a composite holds the id of its current child plus a
//! [`Decide`] function ranking candidate children. All protocol operations are
//! methods on [`Behaviors`] taking ids, so composites can reach their children
//! without shared ownership.
//!
//! Switching: `switch_from(candidate, active)` on a leaf candidate returns the
//! candidate iff `active` is finished, and notifies `active` through
//! `on_leaving`. A composite candidate succeeds when one of its preferred
//! children is already executing below `active`, or when a preferred child can
//! itself switch from `active`; in both cases that child becomes its current child.

use std::collections::HashMap;

use super::behavior::{Behavior, BehaviorId, Decide, MoveControl, NONE, NoneBehavior};

#[derive(Debug, thiserror::Error)]
pub enum BehaviorError {
    #[error("behavior {0:?} registered twice")]
    DuplicateName(String),
}

enum Node<M> {
    Leaf(Box<dyn Behavior<M>>),
    Composite(Composite<M>),
}

struct Composite<M> {
    name: String,
    current: BehaviorId,
    // Taken out while the decider runs, so it can borrow the registry mutably.
    decider: Option<Box<dyn Decide<M>>>,
}

const NONE_ID: BehaviorId = BehaviorId(0);

/// Static name → behavior registry, built once through [`BehaviorsBuilder`].
pub struct Behaviors<M> {
    nodes: Vec<Node<M>>,
    ids: HashMap<String, BehaviorId>,
}

impl<M> Behaviors<M> {
    pub fn builder() -> BehaviorsBuilder<M> {
        BehaviorsBuilder::new()
    }

    /// The inert behavior.
    pub fn none(&self) -> BehaviorId {
        NONE_ID
    }

    pub fn id(&self, name: &str) -> Option<BehaviorId> {
        self.ids.get(name).copied()
    }

    pub fn name(&self, id: BehaviorId) -> &str {
        match &self.nodes[id.0] {
            Node::Leaf(b) => b.name(),
            Node::Composite(c) => &c.name,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = BehaviorId> + '_ {
        (0..self.nodes.len()).map(BehaviorId)
    }

    pub fn is_composite(&self, id: BehaviorId) -> bool {
        matches!(self.nodes[id.0], Node::Composite(_))
    }

    /// Current child of a composite; `None` for leaves.
    pub fn current_child(&self, id: BehaviorId) -> Option<BehaviorId> {
        match &self.nodes[id.0] {
            Node::Composite(c) => Some(c.current),
            Node::Leaf(_) => None,
        }
    }

    /// Mutable access to a leaf behavior.
    pub fn leaf_mut(&mut self, id: BehaviorId) -> Option<&mut (dyn Behavior<M> + 'static)> {
        match &mut self.nodes[id.0] {
            Node::Leaf(b) => Some(b.as_mut()),
            Node::Composite(_) => None,
        }
    }

    pub fn as_move(&mut self, id: BehaviorId) -> Option<&mut dyn MoveControl> {
        self.leaf_mut(id).and_then(|b| b.as_move())
    }

    /// A composite is finished when its current child is.
    pub fn is_finished(&self, id: BehaviorId) -> bool {
        let leaf = self.chain(id).last().copied().unwrap_or(NONE_ID);
        match &self.nodes[leaf.0] {
            Node::Leaf(b) => b.is_finished(),
            // only reachable through a cycle of composites
            Node::Composite(_) => true,
        }
    }

    /// Reset a behavior. Composites fall back to the inert child.
    pub fn init(&mut self, id: BehaviorId) {
        match &mut self.nodes[id.0] {
            Node::Leaf(b) => b.init(),
            Node::Composite(c) => c.current = NONE_ID,
        }
    }

    /// Hard stop. Composites abort their current child first, then reset.
    pub fn abort(&mut self, id: BehaviorId) {
        self.abort_within(id, &mut Vec::new());
    }

    fn abort_within(&mut self, id: BehaviorId, visited: &mut Vec<BehaviorId>) {
        visited.push(id);
        match &mut self.nodes[id.0] {
            Node::Leaf(b) => b.abort(),
            Node::Composite(c) => {
                let current = c.current;
                if !visited.contains(&current) {
                    self.abort_within(current, visited);
                }
                self.init(id);
            }
        }
    }

    /// Notify `id` that `next` replaces it: `id` and its active path down to
    /// `next` are reset. Nothing happens when `next` is `id` itself.
    pub fn on_leaving(&mut self, id: BehaviorId, next: BehaviorId) {
        let left: Vec<BehaviorId> = self.chain(id).into_iter().take_while(|b| *b != next).collect();
        for b in left.into_iter().rev() {
            self.init(b);
        }
    }

    /// Negotiate a takeover of `active` by `candidate`. Returns the behavior that
    /// is in charge afterwards: `candidate` on success, `active` otherwise.
    pub fn switch_from(&mut self, candidate: BehaviorId, active: BehaviorId, model: &M) -> BehaviorId {
        self.switch_within(candidate, active, model, &mut Vec::new())
    }

    /// `path` holds the composites currently deciding above `candidate`.
    fn switch_within(
        &mut self,
        candidate: BehaviorId,
        active: BehaviorId,
        model: &M,
        path: &mut Vec<BehaviorId>,
    ) -> BehaviorId {
        if !self.is_composite(candidate) {
            if self.is_finished(active) {
                self.on_leaving(active, candidate);
                return candidate;
            }
            return active;
        }

        path.push(candidate);
        let mut next = active;
        for desired in self.decide(candidate, model, path) {
            if self.is_in_execution(desired, active) {
                if active != desired {
                    self.on_leaving(active, desired);
                }
                self.set_current(candidate, desired);
                next = candidate;
                break;
            }
            if self.switch_within(desired, active, model, path) == desired {
                self.set_current(candidate, desired);
                next = candidate;
                break;
            }
        }
        path.pop();
        next
    }

    /// Perform one step of `id`.
    ///
    /// A composite re-ranks its children unless told to stop, keeps its current
    /// child when that is preferred, otherwise adopts the first candidate that can
    /// take over. If no candidate can, the current child is asked to stop.
    /// Composites never descend into one of their own ancestors.
    pub fn perform(&mut self, id: BehaviorId, model: &mut M, stop: bool) {
        self.perform_within(id, model, stop, &mut Vec::new());
    }

    fn perform_within(&mut self, id: BehaviorId, model: &mut M, stop: bool, path: &mut Vec<BehaviorId>) {
        if let Node::Leaf(b) = &mut self.nodes[id.0] {
            b.perform(model, stop);
            return;
        }

        path.push(id);
        let mut stop = stop;
        if !stop {
            for desired in self.decide(id, model, path) {
                let current = self.current_of(id);
                if desired == current {
                    stop = false;
                    break;
                }
                let next = self.switch_within(desired, current, model, path);
                if next != current {
                    self.set_current(id, next);
                    stop = false;
                    break;
                }
                stop = true;
            }
        }

        let current = self.current_of(id);
        if path.contains(&current) {
            tracing::warn!(
                behavior = %self.name(id),
                child = %self.name(current),
                "active child is an ancestor, step skipped"
            );
        } else {
            self.perform_within(current, model, stop, path);
        }
        path.pop();
    }

    /// Whether `testee` is `reference` or on its active path.
    pub fn is_in_execution(&self, testee: BehaviorId, reference: BehaviorId) -> bool {
        self.chain(reference).contains(&testee)
    }

    /// Active path from `reference` down to the running leaf.
    pub fn chain(&self, reference: BehaviorId) -> Vec<BehaviorId> {
        let mut chain = vec![reference];
        let mut current = reference;
        while let Some(child) = self.current_child(current) {
            if chain.contains(&child) {
                break;
            }
            chain.push(child);
            current = child;
        }
        chain
    }

    pub fn chain_names(&self, reference: BehaviorId) -> Vec<String> {
        self.chain(reference)
            .into_iter()
            .map(|id| self.name(id).to_owned())
            .collect()
    }

    fn current_of(&self, id: BehaviorId) -> BehaviorId {
        self.current_child(id).unwrap_or(NONE_ID)
    }

    fn set_current(&mut self, id: BehaviorId, child: BehaviorId) {
        if let Node::Composite(c) = &mut self.nodes[id.0] {
            c.current = child;
        }
    }

    /// Ranked candidates of a composite. Candidates on `path` (the composite
    /// itself and the composites above it) are dropped, and an empty ranking
    /// means the inert behavior.
    fn decide(&mut self, id: BehaviorId, model: &M, path: &[BehaviorId]) -> Vec<BehaviorId> {
        let decider = match &mut self.nodes[id.0] {
            Node::Composite(c) => c.decider.take(),
            Node::Leaf(_) => None,
        };

        let mut desired = match decider {
            Some(mut decider) => {
                let desired = decider.decide(model, self);
                if let Node::Composite(c) = &mut self.nodes[id.0] {
                    c.decider = Some(decider);
                }
                desired
            }
            None => Vec::new(),
        };

        desired.retain(|b| b.0 < self.nodes.len());
        let ranked = desired.len();
        desired.retain(|b| *b != id && !path.contains(b));
        if desired.len() < ranked {
            tracing::warn!(behavior = %self.name(id), "composite ranked itself or an ancestor, candidate ignored");
        }
        if desired.is_empty() {
            desired.push(NONE_ID);
        }
        desired
    }
}

// ── Builder ─────────────────────────────────────────────────────

/// Registers behaviors once at startup. The inert behavior is always first.
pub struct BehaviorsBuilder<M> {
    behaviors: Behaviors<M>,
}

impl<M> BehaviorsBuilder<M> {
    pub fn new() -> Self {
        let mut ids = HashMap::new();
        ids.insert(NONE.to_owned(), NONE_ID);
        Self {
            behaviors: Behaviors {
                nodes: vec![Node::Leaf(Box::new(NoneBehavior::new()))],
                ids,
            },
        }
    }

    pub fn none(&self) -> BehaviorId {
        NONE_ID
    }

    pub fn id(&self, name: &str) -> Option<BehaviorId> {
        self.behaviors.id(name)
    }

    /// Register a leaf behavior under its own name.
    pub fn leaf(&mut self, behavior: impl Behavior<M> + 'static) -> Result<BehaviorId, BehaviorError> {
        let name = behavior.name().to_owned();
        self.insert(name, Node::Leaf(Box::new(behavior)))
    }

    /// Register a composite behavior ranking its children with `decider`.
    pub fn composite(
        &mut self,
        name: impl Into<String>,
        decider: impl Decide<M> + 'static,
    ) -> Result<BehaviorId, BehaviorError> {
        let name = name.into();
        let node = Node::Composite(Composite {
            name: name.clone(),
            current: NONE_ID,
            decider: Some(Box::new(decider)),
        });
        self.insert(name, node)
    }

    fn insert(&mut self, name: String, node: Node<M>) -> Result<BehaviorId, BehaviorError> {
        if self.behaviors.ids.contains_key(&name) {
            return Err(BehaviorError::DuplicateName(name));
        }
        let id = BehaviorId(self.behaviors.nodes.len());
        self.behaviors.nodes.push(node);
        self.behaviors.ids.insert(name, id);
        Ok(id)
    }

    pub fn build(self) -> Behaviors<M> {
        self.behaviors
    }
}

impl<M> Default for BehaviorsBuilder<M> {
    fn default() -> Self {
        Self::new()
    }
}
