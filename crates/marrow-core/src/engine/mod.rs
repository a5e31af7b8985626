//! Engine operations.
//!
//! Every mutation takes `&mut Connection`, opens one immediate
//! transaction, does its reads inside it, and either commits or rolls
//! back before returning. Rollback on the error paths is RAII: dropping
//! an uncommitted [`rusqlite::Transaction`] undoes it, `?` included.

pub mod batch;
pub mod create;
pub mod labels;
pub mod metrics;
pub mod update;
