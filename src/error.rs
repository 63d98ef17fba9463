//! 应用程序错误类型
//!
//! 恢复策略分三档：
//! - 请求参数类错误（`InvalidInput` / `CaseTypeNotFound`）直接拒绝，不重试
//! - 验证码单次尝试内的失败（图片未加载、OCR 为空、被驳回）由解析循环就地重试，
//!   不会出现在这里；循环只在尝试次数耗尽时上报 `ChallengeUnsolved`
//! - 其余错误对当前请求是致命的，冒泡到 HTTP 边界转为结构化错误响应

use thiserror::Error;

/// 应用程序结果类型
pub type Result<T> = std::result::Result<T, ScrapeError>;

#[derive(Debug, Error)]
pub enum ScrapeError {
    /// 请求字段缺失或格式不对
    #[error("请求参数无效: {0}")]
    InvalidInput(String),

    /// 案件类型在下拉列表中找不到（部分匹配也没有）
    #[error("案件类型 '{0}' 不在下拉列表中")]
    CaseTypeNotFound(String),

    /// 验证码自动识别次数耗尽，且配置不允许等待人工干预
    #[error("验证码识别失败，已尝试 {attempts} 次")]
    ChallengeUnsolved { attempts: usize },

    /// 等待的元素在时限内始终没有出现
    #[error("等待 {what} 超时 ({seconds} 秒)")]
    SessionTimeout { what: String, seconds: u64 },

    /// 结果页面里找不到任何可解析的容器
    #[error("结果页面缺少可解析的内容")]
    MalformedDocument,

    /// 页面上找不到预期的交互元素
    #[error("页面缺少元素: {0}")]
    ElementMissing(String),

    /// 浏览器启动/配置失败
    #[error("启动浏览器失败: {0}")]
    BrowserLaunch(String),

    /// CDP 协议层错误（导航、执行脚本、截图等）
    #[error("浏览器错误: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    /// OCR 子进程错误
    #[error("识别服务错误: {0}")]
    Recognition(String),

    /// 验证码图片解码失败
    #[error("图片解码失败: {0}")]
    Image(#[from] image::ImageError),

    /// PDF 序列化失败
    #[error("PDF 生成失败: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON 解析失败: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScrapeError {
    /// 是否属于调用方可修正的请求错误（HTTP 边界映射为 400）
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ScrapeError::InvalidInput(_) | ScrapeError::CaseTypeNotFound(_)
        )
    }
}
