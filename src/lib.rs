//! # keyspace-profile
//!
//! A bounded-memory hierarchical profile of a key-value keyspace.
//!
//! Every scanned key is split on a separator, its numeric segments are moved
//! to the tail, and the result is routed down a tree rooted at
//! `(kind, first segment)`. Each node counts the keys that end at it, keeps a
//! small random sample of them and folds per-key metrics into running totals.
//! When a node gains `merge_len` children, its subtree is collapsed into it,
//! so memory stays bounded no matter how many distinct ids the keyspace holds.
//!
//! ## Example
//!
//! ```rust
//! use keyspace_profile::{KeyTree, Metrics, TreeConfig, TtlFold};
//!
//! let mut tree = KeyTree::new(TreeConfig::new(":", 10, 20))?.with_fold(TtlFold);
//!
//! let ttl: Metrics = [("ttl".to_string(), 60)].into_iter().collect();
//! tree.insert("user:1001:profile", "hash", Some(&ttl));
//! tree.insert("user:1002:profile", "hash", Some(&ttl));
//!
//! let total: u64 = tree.leaves().map(|leaf| leaf.num).sum();
//! assert_eq!(total, 2);
//! # Ok::<(), keyspace_profile::Error>(())
//! ```

mod config;
mod error;
mod fold;
mod node;
mod report;
mod sample;
mod segment;
mod tree;

pub use config::TreeConfig;
pub use error::{Error, Result};
pub use fold::{
    add_metric, metric, Fold, IdleFold, Metrics, TtlFold, METRIC_IDLE, METRIC_IDLE_NUM,
    METRIC_IDLE_TIME, METRIC_TTL,
};
pub use node::{NodeId, NodeRef};
pub use report::{
    average, percent, IdleRow, ItemStats, Leaf, Leaves, SizeRow, KIND_HASH, KIND_LIST, KIND_SET,
    KIND_STRING, KIND_ZSET,
};
pub use sample::KeySample;
pub use segment::{is_numeric, Segmenter, Segments};
pub use tree::KeyTree;


#[cfg(test)]
mod proptests;
