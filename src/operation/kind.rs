//! Kinds of asynchronous operations.

use std::fmt;

/// The request types that can be issued asynchronously.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Add,
    Delete,
    Modify,
    ModifyDn,
    Compare,
    Search,
}

impl OperationKind {
    pub const ALL: [OperationKind; 6] = [
        OperationKind::Add,
        OperationKind::Delete,
        OperationKind::Modify,
        OperationKind::ModifyDn,
        OperationKind::Compare,
        OperationKind::Search,
    ];

    /// Whether the operation streams entries and references before its final
    /// result.
    pub fn is_streaming(self) -> bool {
        matches!(self, OperationKind::Search)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Add => "add",
            OperationKind::Delete => "delete",
            OperationKind::Modify => "modify",
            OperationKind::ModifyDn => "modify_dn",
            OperationKind::Compare => "compare",
            OperationKind::Search => "search",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
