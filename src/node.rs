//! Aggregation nodes and the arena that owns them.
//!
//! Nodes are addressed by [`NodeId`]. A node's `children` map owns the ids of
//! its children; the `parent` id is a plain back-reference. Collapsing a
//! subtree releases its slots to a free list, so the arena never holds more
//! than the live node count plus the slots waiting for reuse.

use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;

use crate::fold::{add_metric, Metrics};
use crate::sample::KeySample;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) name: String,
    pub(crate) kind: Arc<str>,
    /// Keys counted at this node, including everything folded in by merges.
    pub(crate) num: u64,
    /// `None` once the node has been collapsed; never repopulated.
    pub(crate) children: Option<HashMap<String, NodeId>>,
    pub(crate) keys: KeySample,
    pub(crate) data: Metrics,
    pub(crate) parent: Option<NodeId>,
}

impl Node {
    pub(crate) fn new(name: &str, kind: Arc<str>, parent: Option<NodeId>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            num: 0,
            children: Some(HashMap::new()),
            keys: KeySample::new(),
            data: Metrics::new(),
            parent,
        }
    }

    #[inline]
    pub(crate) fn child_count(&self) -> usize {
        self.children.as_ref().map_or(0, HashMap::len)
    }

    /// Fold a detached node's counters, sample and metrics into this one.
    pub(crate) fn absorb<R: Rng + ?Sized>(&mut self, other: Node, keys_len: usize, rng: &mut R) {
        self.num += other.num;
        self.keys.absorb(other.keys, keys_len, rng);
        for (name, value) in other.data {
            add_metric(&mut self.data, &name, value);
        }
    }
}

// =============================================================================
// Arena
// =============================================================================

#[derive(Debug, Clone, Default)]
pub(crate) struct NodeArena {
    slots: Vec<Option<Node>>,
    free: Vec<NodeId>,
    live: usize,
}

impl NodeArena {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn live(&self) -> usize {
        self.live
    }

    pub(crate) fn alloc(&mut self, node: Node) -> NodeId {
        self.live += 1;
        if let Some(id) = self.free.pop() {
            debug_assert!(self.slots[id.index()].is_none());
            self.slots[id.index()] = Some(node);
            return id;
        }
        let id = NodeId(
            u32::try_from(self.slots.len()).expect("node arena exceeds u32::MAX slots"),
        );
        self.slots.push(Some(node));
        id
    }

    /// Take a node out of the arena and recycle its slot.
    pub(crate) fn release(&mut self, id: NodeId) -> Node {
        let node = self.slots[id.index()]
            .take()
            .expect("released node must be live");
        self.free.push(id);
        self.live -= 1;
        node
    }

    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> &Node {
        self.slots[id.index()]
            .as_ref()
            .expect("node id must refer to a live node")
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut Node {
        self.slots[id.index()]
            .as_mut()
            .expect("node id must refer to a live node")
    }
}

// =============================================================================
// Read-only view
// =============================================================================

/// Borrowed view of one node of a [`KeyTree`](crate::KeyTree).
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    arena: &'a NodeArena,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    #[inline]
    pub(crate) fn new(arena: &'a NodeArena, id: NodeId) -> Self {
        Self { arena, id }
    }

    #[inline]
    fn node(&self) -> &'a Node {
        self.arena.get(self.id)
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Segment name (for a root: the first segment, without the kind).
    pub fn name(&self) -> &'a str {
        &self.node().name
    }

    pub fn kind(&self) -> &'a str {
        &self.node().kind
    }

    pub fn num(&self) -> u64 {
        self.node().num
    }

    pub fn keys(&self) -> &'a [String] {
        self.node().keys.as_slice()
    }

    pub fn data(&self) -> &'a Metrics {
        &self.node().data
    }

    /// True once a merge has discarded this node's children.
    pub fn is_collapsed(&self) -> bool {
        self.node().children.is_none()
    }

    /// True when the node has no children, collapsed or not.
    pub fn is_leaf(&self) -> bool {
        self.node().child_count() == 0
    }

    pub fn child_count(&self) -> usize {
        self.node().child_count()
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.node().parent.map(|id| NodeRef::new(self.arena, id))
    }

    pub fn child(&self, name: &str) -> Option<NodeRef<'a>> {
        let arena = self.arena;
        self.node()
            .children
            .as_ref()?
            .get(name)
            .map(|&id| NodeRef::new(arena, id))
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let arena = self.arena;
        self.node()
            .children
            .iter()
            .flat_map(|c| c.values())
            .map(move |&id| NodeRef::new(arena, id))
    }
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRef")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .field("num", &self.num())
            .field("children", &self.child_count())
            .field("collapsed", &self.is_collapsed())
            .finish()
    }
}
