//! T90 agent: host runtime around the vehicle decoder.
//!
//! Re-exports all modules so external crates (e.g. `t90-e2e-tests`) can
//! drive the same source → dispatch → store pipeline the binary runs.

pub mod candump;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod isotp;
pub mod source;
pub mod store;
