//! # eCourts Case Report
//!
//! 自动查询 eCourts 高等法院案件状态并生成 PDF 报告的 HTTP 服务
//!
//! ## 架构设计
//!
//! 本系统采用严格的分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `JsExecutor` - 唯一的 page owner，提供 eval() 与元素截图能力
//! - `wait` - 有界轮询原语（就绪 / 超时显式区分）
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单宗案件
//! - `CourtSession` - 表单驱动 / 快照采集 / 结果抓取能力
//! - `ChallengeResolver` - 验证码解析循环（有界重试）
//! - `TesseractRecognizer` - OCR 能力
//! - `outcome` - 提交结果判定（纯函数）
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一宗案件"的完整处理流程
//! - `CaseCtx` - 上下文封装（类型 + 案号 + 年份）
//! - `CaseFlow` - 流程编排（表单 → 验证码 → 抽取 → 报告）
//!
//! ### ④ 边界层（API）
//! - `api/` - HTTP 端点、并发配额、错误到状态码的映射
//!
//! 纯数据变换（`extraction`、`report`）不依赖任何资源，单独成模块。

pub mod api;
pub mod browser;
pub mod config;
pub mod error;
pub mod extraction;
pub mod infrastructure;
pub mod models;
pub mod report;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use api::App;
pub use config::Config;
pub use error::{Result, ScrapeError};
pub use extraction::extract_case_record;
pub use infrastructure::JsExecutor;
pub use models::{CaseRecord, CaseTable, DocumentSnapshot};
pub use report::{layout_report, write_pdf, ReportDocument};
pub use services::{ChallengeResolver, ResolutionResult};
pub use workflow::{CaseCtx, CaseFlow};
