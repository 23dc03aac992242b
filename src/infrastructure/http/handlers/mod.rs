//! HTTP Handlers

mod execute;
mod health;
mod preview;

pub use execute::*;
pub use health::*;
pub use preview::*;
