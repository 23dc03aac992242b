//! Worker Layer - Background Task Processing
//!
//! 实现 ExpirySweeper，定期清理过期预览会话

mod expiry_sweeper;

pub use expiry_sweeper::{ExpirySweeper, ExpirySweeperConfig};
