use serde::{Deserialize, Serialize};

/// A shared tag. Created on demand, never deleted; names are unique and
/// matched exactly as written (no case folding).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: i64,
    pub name: String,
}
