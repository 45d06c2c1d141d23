// Library root: re-exports all modules so integration tests and the binary
// share one API.

pub mod app;
pub mod config;
pub mod snapshot;
pub mod stats_client;
pub mod submissions;
