//! Side-effecting adapters: stdin, git, the context file, logs and config.

pub mod audit;
pub mod config;
pub mod context_store;
pub mod env;
pub mod git;
pub mod process;
pub mod request;
