//! HTTP Layer - 预览会话与代码执行 API

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod pages;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ApiError, PreviewPageError};
pub use routes::create_routes;
pub use server::{HttpServer, ServerConfig};
pub use state::AppState;
