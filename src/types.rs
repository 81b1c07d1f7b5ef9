/// Shared types used across the codebase

use serde::{Deserialize, Serialize};

/// Resource operations tracked by the cache layer.
/// Used for loading/error flags and for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    List,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }

    pub fn is_write(&self) -> bool {
        !matches!(self, Operation::List)
    }
}
