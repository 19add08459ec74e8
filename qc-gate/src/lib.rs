//! Branch-protection and quality-cycle gate for AI agent tool calls.
//!
//! Each hook invocation is a single short-lived process that evaluates one
//! request and exits. The crate keeps a strict split:
//!
//! - **[`core`]**: Pure, deterministic logic (rule tables, branch policy,
//!   session classification, the decision engine). No I/O.
//! - **[`io`]**: Side-effecting adapters (stdin decoding, git subprocesses, the
//!   context file, audit and config files), kept behind the traits `core` uses.
//!
//! Orchestration modules ([`enforce`], [`session_start`]) wire the two
//! together for the CLI entry points.

pub mod core;
pub mod enforce;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod session_start;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
