use serde::{Deserialize, Serialize};

/// A comment on an issue. Immutable once written: there is no update or
/// delete operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub issue_id: i64,
    pub author_id: i64,
    pub body: String,
    pub created_at_us: i64,
}
