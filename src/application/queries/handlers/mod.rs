//! Query Handlers 实现

mod preview_handlers;

pub use preview_handlers::*;
