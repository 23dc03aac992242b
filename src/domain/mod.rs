//! Domain Layer - 领域层
//!
//! 包含一个限界上下文:
//! - Preview Context: 预览会话与存储路径规则
//!
//! 以及与上下文无关的纯函数：HTML 改写、内容类型判定

pub mod preview;

mod content_type;
mod html_rewriter;

pub use content_type::{content_type_for, extension_of, html_content_type, is_html_path};
pub use html_rewriter::{base_tag, expire_beacon_script, inject_preview_markup, BEACON_MARKER};
