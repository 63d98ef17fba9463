//! HTTP 边界
//!
//! 对外只有一个查询端点和一个健康检查；核心流程的所有终态错误
//! 在这里转成结构化错误响应，进程不会因单个请求崩溃。

pub mod server;
pub mod types;

pub use server::App;
pub use types::CaseRequest;
