//! Post-ingestion walk and report row derivation.
//!
//! Writing the report (and probing the store for value sizes) happens outside
//! this crate. What lives here is the walk that reconstructs each terminal
//! node's full name, and the arithmetic that turns a node's folded totals into
//! report columns.

use serde::Serialize;

use crate::fold::{metric, Metrics, METRIC_IDLE_NUM, METRIC_IDLE_TIME, METRIC_TTL};
use crate::node::{NodeArena, NodeId};

pub const KIND_STRING: &str = "string";
pub const KIND_LIST: &str = "list";
pub const KIND_SET: &str = "set";
pub const KIND_ZSET: &str = "zset";
pub const KIND_HASH: &str = "hash";

// =============================================================================
// Leaf walk
// =============================================================================

/// One terminal aggregate of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf<'a> {
    /// Root segment and every descendant segment, joined by the separator.
    pub name: String,
    pub kind: &'a str,
    pub num: u64,
    pub data: &'a Metrics,
    pub keys: &'a [String],
}

impl<'a> Leaf<'a> {
    /// Representative key: the first sampled one.
    pub fn sample(&self) -> Option<&'a str> {
        self.keys.first().map(String::as_str)
    }

    pub fn metric(&self, name: &str) -> i64 {
        metric(self.data, name)
    }
}

/// Depth-first iterator over terminal nodes, returned by
/// [`KeyTree::leaves`](crate::KeyTree::leaves).
///
/// A node is terminal when it has no children, or when keys ended exactly at
/// it (`num > 0`) even though longer keys continued below. The second case
/// covers a root hit by both `user` and `user:1`; skipping it would lose
/// those keys from the report. Sibling order is unspecified.
pub struct Leaves<'a> {
    arena: &'a NodeArena,
    separator: &'a str,
    stack: Vec<(NodeId, String)>,
}

impl<'a> Leaves<'a> {
    pub(crate) fn new(
        arena: &'a NodeArena,
        roots: impl Iterator<Item = NodeId>,
        separator: &'a str,
    ) -> Self {
        let stack = roots
            .map(|id| (id, arena.get(id).name.clone()))
            .collect();
        Self {
            arena,
            separator,
            stack,
        }
    }
}

impl<'a> Iterator for Leaves<'a> {
    type Item = Leaf<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let arena = self.arena;
        while let Some((id, name)) = self.stack.pop() {
            let node = arena.get(id);
            let mut has_children = false;
            if let Some(children) = &node.children {
                for (child_name, &child) in children {
                    has_children = true;
                    self.stack
                        .push((child, format!("{name}{}{child_name}", self.separator)));
                }
            }

            if !has_children || node.num > 0 {
                return Some(Leaf {
                    name,
                    kind: &node.kind,
                    num: node.num,
                    data: &node.data,
                    keys: node.keys.as_slice(),
                });
            }
        }
        None
    }
}

// =============================================================================
// Report rows
// =============================================================================

/// `part * 100 / total`, rounded to two decimals.
pub fn percent(part: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 * 100.0 / total as f64 * 100.0).round() / 100.0
}

/// Integer mean; zero for an empty list.
pub fn average(values: &[i64]) -> i64 {
    if values.is_empty() {
        return 0;
    }
    values.iter().sum::<i64>() / values.len() as i64
}

fn per_key(total: i64, num: u64) -> i64 {
    match i64::try_from(num) {
        Ok(n) if n > 0 => total / n,
        _ => 0,
    }
}

/// Idle-time report columns for one leaf. Built with
/// [`IdleFold`](crate::IdleFold) totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdleRow {
    pub prefix: String,
    pub kind: String,
    pub num: u64,
    pub idle_num: i64,
    /// Mean idle seconds over the idle keys only.
    pub avg_idle: i64,
    pub idle_percent: f64,
    pub avg_ttl: i64,
    pub sample: String,
}

impl IdleRow {
    pub const HEADER: [&'static str; 8] = [
        "prefix",
        "type",
        "num",
        "idle num",
        "avg idle",
        "idle percent",
        "avg ttl",
        "sample",
    ];

    pub fn from_leaf(leaf: &Leaf<'_>) -> Self {
        let idle_num = leaf.metric(METRIC_IDLE_NUM);
        let avg_idle = if idle_num > 0 {
            leaf.metric(METRIC_IDLE_TIME) / idle_num
        } else {
            0
        };
        let idle_percent = match i64::try_from(leaf.num) {
            Ok(num) => percent(idle_num, num),
            Err(_) => 0.0,
        };
        Self {
            prefix: leaf.name.clone(),
            kind: leaf.kind.to_string(),
            num: leaf.num,
            idle_num,
            avg_idle,
            idle_percent,
            avg_ttl: per_key(leaf.metric(METRIC_TTL), leaf.num),
            sample: leaf.sample().unwrap_or_default().to_string(),
        }
    }

    /// Only groups holding at least one idle key make it into the report.
    pub fn is_reportable(&self) -> bool {
        self.idle_num > 0
    }
}

/// Average element count and element size of a group, measured by the
/// caller on the leaf's sampled keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ItemStats {
    pub avg_item_num: i64,
    pub avg_item_size: i64,
}

impl ItemStats {
    /// From per-key element counts and per-element sizes. Keys that could not
    /// be probed, or were empty, are simply left out of the lists.
    pub fn from_samples(item_nums: &[i64], item_sizes: &[i64]) -> Self {
        Self {
            avg_item_num: average(item_nums),
            avg_item_size: average(item_sizes),
        }
    }

    /// A string value is one item whose size is the value length.
    pub fn string(value_lens: &[i64]) -> Self {
        Self {
            avg_item_num: 1,
            avg_item_size: average(value_lens),
        }
    }
}

/// Size report columns for one leaf. Built with
/// [`TtlFold`](crate::TtlFold) totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizeRow {
    pub prefix: String,
    pub kind: String,
    pub num: u64,
    pub avg_item_num: i64,
    pub avg_item_size: i64,
    pub total_item_num: i64,
    pub total_item_size: i64,
    pub avg_ttl: i64,
    pub sample: String,
}

impl SizeRow {
    pub const HEADER: [&'static str; 9] = [
        "prefix",
        "type",
        "num",
        "avg item num",
        "avg item size",
        "total item num",
        "total item size",
        "avg ttl",
        "sample",
    ];

    pub fn from_leaf(leaf: &Leaf<'_>, stats: ItemStats) -> Self {
        let num = i64::try_from(leaf.num).unwrap_or(i64::MAX);
        let total_item_num = num.saturating_mul(stats.avg_item_num);
        Self {
            prefix: leaf.name.clone(),
            kind: leaf.kind.to_string(),
            num: leaf.num,
            avg_item_num: stats.avg_item_num,
            avg_item_size: stats.avg_item_size,
            total_item_num,
            total_item_size: total_item_num.saturating_mul(stats.avg_item_size),
            avg_ttl: per_key(leaf.metric(METRIC_TTL), leaf.num),
            sample: leaf.sample().unwrap_or_default().to_string(),
        }
    }
}
