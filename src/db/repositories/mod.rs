//! Database repositories
//!
//! `table` serves every content table generically; `session` and `rpc` hold
//! the few hand-written queries.

pub mod rpc;
pub mod session;
pub mod table;

pub use rpc::{RpcRepository, SqlxRpcRepository, ADMIN_ROLE};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use table::{
    decode_record, ListQuery, Row, SqlValue, SqlxTableRepository, StoreError, TableRepository,
};
