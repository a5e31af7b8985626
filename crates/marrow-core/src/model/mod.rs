//! Entity types persisted in the store.

pub mod comment;
pub mod issue;
pub mod label;
pub mod user;

pub use comment::Comment;
pub use issue::{Issue, IssuePatch, NewIssue, ParseEnumError, Status};
pub use label::Label;
pub use user::User;
