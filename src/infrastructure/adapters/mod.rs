//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod executor;
pub mod storage;

pub use executor::*;
pub use storage::*;
