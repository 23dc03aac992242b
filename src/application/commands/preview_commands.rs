//! Preview Commands - 预览会话相关命令

/// 创建预览命令
#[derive(Debug, Clone)]
pub struct CreatePreviewCommand {
    /// 调用方提供的存储目录（可带或不带 bucket 前缀）
    pub s3_path: String,
    /// 显式指定的入口文件，缺省时自动探测
    pub file_name: Option<String>,
}

/// 创建预览响应
#[derive(Debug, Clone)]
pub struct CreatePreviewResponse {
    pub session_id: String,
    pub preview_url: String,
    /// 入口文件完整 key
    pub storage_path: String,
    pub expires_in: u64,
}

/// 过期预览命令（浏览器 beacon 触发）
#[derive(Debug, Clone)]
pub struct ExpirePreviewCommand {
    pub session_id: String,
}

/// 过期预览响应
#[derive(Debug, Clone)]
pub struct ExpirePreviewResponse {
    pub session_id: String,
    /// 本次调用是否确实删除了会话
    pub expired: bool,
}
