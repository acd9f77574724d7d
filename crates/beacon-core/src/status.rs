use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeStatus {
    Starting,
    Active,
    Backup,
    /// Assigned by the registry sweep, never by the node itself.
    Failing,
    Inactive,
}

impl NodeStatus {
    /// Whether a node in `self` may move to `next`.
    ///
    /// Reporting the same status again is always allowed (that is a heartbeat).
    /// `Failing -> Active | Backup` is the revival path for a node whose
    /// heartbeat resumes before it is reaped. `Inactive` is terminal.
    pub fn can_transition_to(self, next: NodeStatus) -> bool {
        use NodeStatus::*;

        if self == next {
            return true;
        }
        match self {
            Starting => true,
            Active => matches!(next, Backup | Failing | Inactive),
            Backup => matches!(next, Active | Inactive),
            Failing => matches!(next, Active | Backup | Inactive),
            Inactive => false,
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeStatus::Starting => "STARTING",
            NodeStatus::Active => "ACTIVE",
            NodeStatus::Backup => "BACKUP",
            NodeStatus::Failing => "FAILING",
            NodeStatus::Inactive => "INACTIVE",
        };
        f.write_str(s)
    }
}
