//! Command execution engine for the `hulud` shell: built-ins, redirection,
//! a single pipe and foreground/background process handling, driven by a
//! whitespace-split argument vector.

pub mod argv;
pub mod builtin;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod jobs;
pub mod pipeline;
pub mod redirect;
pub mod spawn;

pub use config::Config;
pub use dispatch::{Outcome, Shell};
pub use error::{ExecError, Result};
