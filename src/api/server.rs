//! HTTP 服务 - 编排层
//!
//! 持有配置与并发配额，把请求分发给 `CaseFlow`。
//! 每个请求独占一个浏览器实例，用 Semaphore 限制同时在跑的数量。

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::api::types::CaseRequest;
use crate::config::Config;
use crate::error::ScrapeError;
use crate::workflow::{CaseCtx, CaseFlow};

/// 应用主结构
pub struct App {
    config: Config,
    state: Arc<AppState>,
}

struct AppState {
    config: Config,
    /// 浏览器实例配额
    permits: Semaphore,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> anyhow::Result<Self> {
        log_startup(&config);

        let state = Arc::new(AppState {
            config: config.clone(),
            permits: Semaphore::new(config.max_concurrent_cases),
        });

        Ok(Self { config, state })
    }

    /// 启动 HTTP 服务并一直运行
    pub async fn run(&self) -> anyhow::Result<()> {
        let router = Router::new()
            .route("/health", get(health))
            .route("/scrape-case", post(scrape_case))
            .with_state(self.state.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.server_port));
        info!("🌐 HTTP 服务监听: http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).await?;
        Ok(())
    }
}

async fn health() -> &'static str {
    "OK"
}

/// 查询端点：校验 → 限流 → 跑完整流程 → 返回 PDF 附件
async fn scrape_case(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CaseRequest>,
) -> Result<Response, ApiError> {
    let ctx = CaseCtx::new(request.case_type, request.case_number, request.year);
    // 碰浏览器之前先拒绝坏请求
    ctx.validate().map_err(ApiError)?;

    let _permit = state
        .permits
        .acquire()
        .await
        .map_err(|_| ApiError(ScrapeError::BrowserLaunch("并发配额已关闭".to_string())))?;

    info!("📥 收到案件查询: {}", ctx);
    let flow = CaseFlow::new(&state.config);
    let bytes = flow.run(&ctx).await.map_err(ApiError)?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", ctx.report_filename()),
        ),
    ];
    Ok((headers, bytes).into_response())
}

/// 把领域错误映射为结构化 HTTP 响应
///
/// 请求类错误 400，其余一律 500；诊断消息放在 JSON 里
struct ApiError(ScrapeError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            error!("请求处理失败: {}", self.0);
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let body = Json(json!({
            "error": self.0.to_string(),
            "status": status.as_u16(),
        }));
        (status, body).into_response()
    }
}

// ========== 日志辅助函数 ==========

fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - eCourts 案件报告服务");
    info!("📊 最大并发案件数: {}", config.max_concurrent_cases);
    info!("🔤 OCR 命令: {}", config.tesseract_cmd);
    info!("{}", "=".repeat(60));
}
