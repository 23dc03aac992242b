//! Preview Queries - 预览内容查询

/// 读取会话内文件
#[derive(Debug, Clone)]
pub struct ServePreviewFileQuery {
    pub session_id: String,
    /// 会话目录下的相对路径；为空时返回入口文件
    pub sub_path: Option<String>,
}

/// 读取结果
#[derive(Debug, Clone)]
pub struct ServePreviewFileResponse {
    pub body: Vec<u8>,
    pub content_type: String,
    /// 是否对 HTML 做了 base/beacon 注入
    pub rewritten: bool,
    pub resolved_path: String,
}
