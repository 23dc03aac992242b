//! Code Executor Adapters

mod process_runner;

pub use process_runner::{ProcessCodeRunner, ProcessRunnerConfig};
