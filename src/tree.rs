//! The aggregation tree.

use std::collections::HashMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::config::TreeConfig;
use crate::error::Result;
use crate::fold::{Fold, Metrics};
use crate::node::{Node, NodeArena, NodeId, NodeRef};
use crate::report::Leaves;
use crate::segment::Segmenter;

/// Bounded-memory hierarchy of scanned keys.
///
/// Keys are grouped per `kind` and first segment into a forest of roots,
/// then by their remaining (reordered) segments. When a node reaches
/// `merge_len` direct children its whole subtree is folded into it and it
/// becomes a leaf for good; later keys that would have descended below it
/// stop there instead.
///
/// The random source `R` only decides which sample slot a new key replaces.
pub struct KeyTree<R = StdRng> {
    config: TreeConfig,
    segmenter: Segmenter,
    /// `"{kind}:{first segment}"` to root node.
    roots: HashMap<String, NodeId>,
    arena: NodeArena,
    fold: Option<Box<dyn Fold>>,
    rng: R,
    count: u64,
    merges: u64,
}

impl KeyTree<StdRng> {
    /// Build a tree whose sampler is seeded from OS entropy.
    pub fn new(config: TreeConfig) -> Result<Self> {
        Self::with_rng(config, StdRng::from_entropy())
    }
}

impl<R: Rng> KeyTree<R> {
    pub fn with_rng(config: TreeConfig, rng: R) -> Result<Self> {
        config.validate()?;
        debug!(
            separator = %config.separator,
            keys_len = config.keys_len,
            merge_len = config.merge_len,
            "key tree configured"
        );
        Ok(Self {
            segmenter: Segmenter::new(config.separator.clone()),
            config,
            roots: HashMap::new(),
            arena: NodeArena::new(),
            fold: None,
            rng,
            count: 0,
            merges: 0,
        })
    }

    /// Set the callback that accumulates per-key metrics into node totals.
    pub fn with_fold(mut self, fold: impl Fold + 'static) -> Self {
        self.fold = Some(Box::new(fold));
        self
    }

    #[inline]
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Number of keys inserted.
    #[inline]
    pub fn len(&self) -> u64 {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Live nodes across the whole forest.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.arena.live()
    }

    /// Subtree collapses performed so far.
    #[inline]
    pub fn merge_count(&self) -> u64 {
        self.merges
    }

    /// Record one scanned key.
    ///
    /// `metrics` is handed to the fold callback (if any) unless it is empty.
    pub fn insert(&mut self, key: &str, kind: &str, metrics: Option<&Metrics>) {
        let segments = self.segmenter.split(key);
        let Some((first, rest)) = segments.split_first() else {
            unreachable!("str::split yields at least one segment");
        };

        let mut current = self.root_or_insert(kind, first);
        for name in rest {
            let existing = match &self.arena.get(current).children {
                Some(children) => children.get(*name).copied(),
                None => break,
            };
            let child = match existing {
                Some(id) => id,
                None => self.add_child(current, name),
            };
            current = child;

            if let Some(parent) = self.arena.get(current).parent {
                if self.arena.get(parent).child_count() >= self.config.merge_len {
                    self.merge(parent);
                    current = parent;
                }
            }
        }

        let node = self.arena.get_mut(current);
        node.num += 1;
        node.keys.add(key, self.config.keys_len, &mut self.rng);
        if let (Some(fold), Some(metrics)) = (self.fold.as_mut(), metrics) {
            if !metrics.is_empty() {
                fold.fold(&mut node.data, metrics);
            }
        }
        self.count += 1;
    }

    fn root_or_insert(&mut self, kind: &str, first: &str) -> NodeId {
        let bucket = format!("{kind}:{first}");
        if let Some(&id) = self.roots.get(&bucket) {
            return id;
        }
        trace!(bucket = %bucket, "new root");
        let id = self.arena.alloc(Node::new(first, Arc::from(kind), None));
        self.roots.insert(bucket, id);
        id
    }

    fn add_child(&mut self, parent: NodeId, name: &str) -> NodeId {
        let kind = Arc::clone(&self.arena.get(parent).kind);
        let id = self.arena.alloc(Node::new(name, kind, Some(parent)));
        if let Some(children) = self.arena.get_mut(parent).children.as_mut() {
            children.insert(name.to_string(), id);
        }
        id
    }

    /// Collapse the subtree below `target` into `target`.
    ///
    /// Descendants are visited in reverse pre-order, so every node has
    /// absorbed its own children before it is folded into its parent.
    fn merge(&mut self, target: NodeId) {
        let mut order: Vec<NodeId> = Vec::new();
        let mut stack: Vec<NodeId> = vec![target];
        while let Some(id) = stack.pop() {
            if id != target {
                order.push(id);
            }
            if let Some(children) = &self.arena.get(id).children {
                stack.extend(children.values().copied());
            }
        }

        let keys_len = self.config.keys_len;
        for &id in order.iter().rev() {
            let node = self.arena.release(id);
            let Some(parent) = node.parent else {
                continue;
            };
            self.arena.get_mut(parent).absorb(node, keys_len, &mut self.rng);
        }

        let node = self.arena.get_mut(target);
        node.children = None;
        self.merges += 1;
        debug!(
            name = %node.name,
            kind = %node.kind,
            num = node.num,
            released = order.len(),
            "collapsed subtree"
        );
    }

    /// Forest roots, keyed by `"{kind}:{first segment}"`.
    pub fn roots(&self) -> impl Iterator<Item = (&str, NodeRef<'_>)> + '_ {
        self.roots
            .iter()
            .map(move |(bucket, &id)| (bucket.as_str(), NodeRef::new(&self.arena, id)))
    }

    pub fn root(&self, kind: &str, first_segment: &str) -> Option<NodeRef<'_>> {
        self.roots
            .get(&format!("{kind}:{first_segment}"))
            .map(|&id| NodeRef::new(&self.arena, id))
    }

    /// Depth-first walk over every terminal node of the forest.
    pub fn leaves(&self) -> Leaves<'_> {
        Leaves::new(
            &self.arena,
            self.roots.values().copied(),
            self.segmenter.separator(),
        )
    }
}

impl<R> std::fmt::Debug for KeyTree<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyTree")
            .field("config", &self.config)
            .field("roots", &self.roots.len())
            .field("nodes", &self.arena.live())
            .field("count", &self.count)
            .field("merges", &self.merges)
            .field("fold", &self.fold.is_some())
            .finish()
    }
}
