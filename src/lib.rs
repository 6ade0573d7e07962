// Library target shared by the binary, the integration tests and the
// criterion benchmarks.

pub mod config;
pub mod engine;
pub mod session;
pub mod store;
