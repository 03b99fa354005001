use std::collections::TryReserveError;

use crate::Node;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("node id {0} does not exist in the graph")]
    NodeNotFound(u64),

    #[error("{0} is not a node of this graph")]
    InvalidNode(Node),

    #[error("the frontier is empty")]
    FrontierEmpty,

    #[error("{0} was never reached from the source")]
    Unreachable(Node),

    #[error("corrupt graph file: {0}")]
    GraphFileCorrupt(String),

    #[error("failed to allocate {what}")]
    AllocationFailure {
        what: &'static str,
        #[source]
        source: TryReserveError,
    },

    #[error("node id {0} appears more than once")]
    DuplicateNodeId(u64),

    #[error("{field} of node {id} is {value}, which does not fit in 16 bits")]
    FieldOverflow {
        id: u64,
        field: &'static str,
        value: usize,
    },

    #[error("map line {line}: {reason}")]
    MapSyntax { line: usize, reason: String },

    #[error("search was cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub(crate) fn corrupt(msg: impl Into<String>) -> Error {
    Error::GraphFileCorrupt(msg.into())
}
