//! Construction errors.
//!
//! Ingestion itself never fails: once a [`KeyTree`](crate::KeyTree) exists,
//! every insert applies to exactly one terminal node. The only errors are
//! configuration mistakes, rejected before the tree is built.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("key separator must not be empty")]
    EmptySeparator,
    #[error("sample size (keys_len) must be greater than zero")]
    ZeroKeysLen,
    #[error("merge threshold (merge_len) must be greater than zero")]
    ZeroMergeLen,
}

pub type Result<T> = std::result::Result<T, Error>;
