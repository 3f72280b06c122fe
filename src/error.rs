//! Error types for the graph core.

use thiserror::Error;

use crate::graph::NodeId;

/// Result type alias for graph operations.
pub type Result<T> = std::result::Result<T, CpgError>;

/// Top-level error type.
///
/// The lowering itself never fails: every translation unit produces a graph
/// and abnormal input is reported through the logger. This enum only covers
/// API misuse and internal value-parse failures that the frontend catches
/// and downgrades.
#[derive(Debug, Error)]
pub enum CpgError {
    /// A node id that does not belong to this graph.
    #[error("Unknown node id {0:?}")]
    UnknownNode(NodeId),

    /// An integer literal spelling wider than the widest supported value.
    #[error("Integer literal '{literal}' does not fit in 128 bits")]
    IntegerOverflow { literal: String },

    /// An integer literal spelling that is not valid in its detected radix.
    #[error("Invalid digits in integer literal '{literal}' (radix {radix})")]
    InvalidDigits { literal: String, radix: u32 },
}
