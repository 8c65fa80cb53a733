//! Command-line surface of `jumprun`.
//!
//! - `args`: the [`Cli`] parser, with the remote flags flattened in
//! - `registry`: the explicit name-to-task [`CommandRegistry`]
//! - `output`: text and JSON rendering of a dispatch report
//! - `logging`: verbosity-based subscriber setup

mod args;
mod logging;
mod output;
mod registry;

pub use args::Cli;
pub use logging::{create_env_filter, init_logging};
pub use output::{OutputFormat, render, write_output};
pub use registry::{CommandEntry, CommandRegistry, TaskFactory};

/// Exit code for failures that prevent a batch from running at all.
pub const EXIT_FATAL: u8 = 99;
