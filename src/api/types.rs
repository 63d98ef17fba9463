//! HTTP 请求载荷

use serde::Deserialize;

/// POST /scrape-case 请求体
///
/// 字段缺失时反序列化为空串，由上下文校验统一拒绝（400），
/// 避免把反序列化错误泄漏成 422
#[derive(Debug, Clone, Deserialize)]
pub struct CaseRequest {
    #[serde(default)]
    pub case_type: String,
    #[serde(default)]
    pub case_number: String,
    #[serde(default)]
    pub year: String,
}
