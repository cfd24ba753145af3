//! Tree configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const DEFAULT_SEPARATOR: &str = ":";
const DEFAULT_KEYS_LEN: usize = 10;
const DEFAULT_MERGE_LEN: usize = 20;
/// Size reports probe every sampled key, so they keep a larger sample.
const SIZE_REPORT_KEYS_LEN: usize = 100;

/// Fixed parameters of one scan pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Separator used to split keys into segments.
    pub separator: String,
    /// Sampled keys kept per node.
    pub keys_len: usize,
    /// Number of direct children at which a node collapses into a leaf.
    pub merge_len: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_string(),
            keys_len: DEFAULT_KEYS_LEN,
            merge_len: DEFAULT_MERGE_LEN,
        }
    }
}

impl TreeConfig {
    pub fn new(separator: impl Into<String>, keys_len: usize, merge_len: usize) -> Self {
        Self {
            separator: separator.into(),
            keys_len,
            merge_len,
        }
    }

    /// Defaults used when the sampled keys feed size estimation.
    pub fn for_size_report() -> Self {
        Self {
            keys_len: SIZE_REPORT_KEYS_LEN,
            ..Self::default()
        }
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn with_keys_len(mut self, keys_len: usize) -> Self {
        self.keys_len = keys_len;
        self
    }

    pub fn with_merge_len(mut self, merge_len: usize) -> Self {
        self.merge_len = merge_len;
        self
    }

    /// Rejects configurations the tree cannot honor.
    ///
    /// Zero limits are refused rather than clamped: a zero sample size or
    /// merge threshold is always a caller bug.
    pub fn validate(&self) -> Result<()> {
        if self.separator.is_empty() {
            return Err(Error::EmptySeparator);
        }
        if self.keys_len == 0 {
            return Err(Error::ZeroKeysLen);
        }
        if self.merge_len == 0 {
            return Err(Error::ZeroMergeLen);
        }
        Ok(())
    }
}
