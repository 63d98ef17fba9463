//! 案件处理流程 - 流程层
//!
//! 定义"一宗案件查询"的完整流程：
//! 启动浏览器 → 驱动表单 → 解析验证码 → 等待结果 → 抽取 → 排版 → PDF。
//! 浏览器是唯一的稀缺资源，由本层独占持有，并保证在所有退出路径上关闭。

use tracing::{error, info, warn};

use crate::browser;
use crate::config::Config;
use crate::error::{Result, ScrapeError};
use crate::extraction;
use crate::infrastructure::JsExecutor;
use crate::report;
use crate::services::{ChallengeResolver, CourtSession, ResolutionResult, TesseractRecognizer};
use crate::workflow::case_ctx::CaseCtx;

/// 案件处理流程
pub struct CaseFlow {
    config: Config,
}

impl CaseFlow {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// 处理一宗案件查询，成功时返回报告 PDF 字节
    pub async fn run(&self, ctx: &CaseCtx) -> Result<Vec<u8>> {
        ctx.validate()?;
        info!("[案件 {}] 🚀 开始处理", ctx);

        let (mut browser, page) = browser::launch_headless_browser(&self.config).await?;
        let executor = JsExecutor::new(page);

        let result = self.run_in_browser(&executor, ctx).await;

        // 成功或失败都释放浏览器
        if let Err(e) = browser.close().await {
            warn!("[案件 {}] 关闭浏览器失败: {}", ctx, e);
        }

        match &result {
            Ok(bytes) => info!("[案件 {}] ✅ 处理完成，报告 {} 字节", ctx, bytes.len()),
            Err(e) => error!("[案件 {}] ❌ 处理失败: {}", ctx, e),
        }
        result
    }

    async fn run_in_browser(&self, executor: &JsExecutor, ctx: &CaseCtx) -> Result<Vec<u8>> {
        let session = CourtSession::new(executor, &self.config);
        session
            .prepare(&ctx.case_type, &ctx.case_number, &ctx.year)
            .await?;

        let resolver = ChallengeResolver::new(&self.config);
        let recognizer = TesseractRecognizer::new(&self.config);

        // 自动通过用短窗口等结果；降级人工时把长窗口的所有权交给这里
        let result_window = match resolver.resolve(&session, &recognizer).await? {
            ResolutionResult::Solved => self.config.result_window(),
            ResolutionResult::RequiresManualIntervention => {
                if !self.config.manual_fallback {
                    return Err(ScrapeError::ChallengeUnsolved {
                        attempts: self.config.max_attempts,
                    });
                }
                warn!(
                    "[案件 {}] ⚠️ 请人工在浏览器中完成验证码（最多等待 {} 秒）",
                    ctx, self.config.manual_window_secs
                );
                self.config.manual_window()
            }
        };

        session.await_results(result_window).await?;

        info!("[案件 {}] 结果已出现，尝试展开完整详情...", ctx);
        if let Err(e) = session.reveal_details().await {
            warn!("[案件 {}] 展开详情失败（按当前页面继续）: {}", ctx, e);
        }

        let html = session.result_html().await?;
        info!("[案件 {}] 📄 开始抽取（HTML {} 字符）", ctx, html.len());
        let record = extraction::extract_case_record(&html);

        info!("[案件 {}] 🧾 生成报告...", ctx);
        let report = report::layout_report(&record);
        let bytes = report::write_pdf(&report)?;
        info!("[案件 {}] 报告共 {} 页", ctx, report.page_count());

        Ok(bytes)
    }
}
