//! File-backed storage adapters.
//!
//! - [`FileStateStore`]: one JSON state document per session
//! - [`JsonlVoteLog`]: per-step vote collection
//! - [`FileLock`]: advisory lock shared by both

mod file_lock;
mod file_state_store;
mod jsonl_vote_log;

pub use file_lock::FileLock;
pub use file_state_store::FileStateStore;
pub use jsonl_vote_log::JsonlVoteLog;
