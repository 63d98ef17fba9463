//! 法院查询会话 - 业务能力层
//!
//! 封装对查询表单页的全部 DOM 交互：填表、验证码操作、状态快照、结果抓取。
//! 除验证码截图走 CDP 截图接口外，所有读写都通过 JsExecutor 的 JS 求值完成。
//!
//! 验证码解析循环只依赖其中一小部分能力，抽成 `ChallengeSession` trait，
//! 便于用桩实现做单元测试。

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Result, ScrapeError};
use crate::infrastructure::{poll_until, JsExecutor, PollOutcome};
use crate::models::DocumentSnapshot;
use crate::services::outcome::SUCCESS_SELECTORS;
use crate::utils::truncate_text;

/// 解析循环所需的会话能力
#[allow(async_fn_in_trait)]
pub trait ChallengeSession {
    /// 刷新验证码图片（尽力而为）
    async fn refresh_challenge(&self) -> Result<()>;
    /// 验证码图片是否已完整加载
    async fn challenge_ready(&self) -> Result<bool>;
    /// 截取验证码图片，返回 PNG 字节
    async fn capture_challenge(&self) -> Result<Vec<u8>>;
    /// 填入答案并触发表单提交
    async fn submit_answer(&self, answer: &str) -> Result<()>;
    /// 采集页面状态快照（顺带读取并清空弹窗钩子）
    async fn snapshot(&self) -> Result<DocumentSnapshot>;
}

/// eCourts 查询会话
pub struct CourtSession<'a> {
    executor: &'a JsExecutor,
    form_timeout: Duration,
    poll_interval: Duration,
    verbose_logging: bool,
}

impl<'a> CourtSession<'a> {
    pub fn new(executor: &'a JsExecutor, config: &Config) -> Self {
        Self {
            executor,
            form_timeout: config.form_timeout(),
            poll_interval: config.poll_interval(),
            verbose_logging: config.verbose_logging,
        }
    }

    /// 驱动查询表单：选案件类型、填案号和年份、安装弹窗钩子
    ///
    /// 案件类型按选项文本做部分匹配；匹配不到返回 `CaseTypeNotFound`
    pub async fn prepare(&self, case_type: &str, case_number: &str, year: &str) -> Result<()> {
        info!("📋 等待查询表单就绪...");
        self.wait_for_selector("select#case_type, select[name='case_type']")
            .await?;

        // 下拉选项由页面 AJAX 异步填充，先等它有内容
        let populated = poll_until(Duration::from_secs(5), self.poll_interval, || async move {
            let count: u64 = self
                .executor
                .eval_as(
                    r#"(() => {
                        const select = document.querySelector("select#case_type, select[name='case_type']");
                        return select ? select.options.length : 0;
                    })()"#,
                )
                .await?;
            Ok((count > 1).then_some(()))
        })
        .await?;
        if populated.is_timed_out() {
            warn!("案件类型选项迟迟未填充，直接尝试匹配");
        }

        info!("📋 选择案件类型...");
        self.select_case_type(case_type).await?;

        // 选完类型后部分字段由 AJAX 启用，同样轮询等待
        self.wait_for_selector("input#search_case_no, input[name='search_case_no']")
            .await?;

        info!("📋 填写案号与年份...");
        self.fill_field("input#search_case_no, input[name='search_case_no']", case_number)
            .await?;
        self.fill_field("input#rgyear, input[name='rgyear']", year)
            .await?;

        self.install_alert_hook().await?;
        Ok(())
    }

    /// 等待验证通过后的结果容器出现
    ///
    /// `window` 由调用方给定：自动通过时用短时限，等人工干预时用长时限
    pub async fn await_results(&self, window: Duration) -> Result<()> {
        info!("⏳ 等待查询结果出现（最多 {} 秒）...", window.as_secs());
        let outcome = poll_until(window, Duration::from_secs(1), || async move {
            Ok(self.results_visible().await.unwrap_or(false).then_some(()))
        })
        .await?;

        match outcome {
            PollOutcome::Ready(()) => Ok(()),
            PollOutcome::TimedOut => Err(ScrapeError::SessionTimeout {
                what: "查询结果容器".to_string(),
                seconds: window.as_secs(),
            }),
        }
    }

    /// 点击第一个可见的 "View" 链接展开完整详情（尽力而为）
    pub async fn reveal_details(&self) -> Result<bool> {
        sleep(Duration::from_secs(1)).await; // 等结果列表稳定

        let clicked: bool = self
            .executor
            .eval_as(
                r#"(() => {
                    const links = Array.from(document.querySelectorAll("a"))
                        .filter(a => a.textContent.includes("View") && a.offsetParent !== null);
                    if (links.length === 0) { return false; }
                    links[0].click();
                    return true;
                })()"#,
            )
            .await?;

        if !clicked {
            debug!("没有可点击的 View 链接，详情可能已经展开");
            return Ok(false);
        }

        // 详情由 AJAX 加载
        let loaded = poll_until(self.form_timeout, self.poll_interval, || async move {
            let visible: bool = self
                .executor
                .eval_as(
                    r##"(() => {
                        const el = document.querySelector("#caseHistory, #history_case_no, .case_details_table");
                        return !!(el && el.offsetParent !== null);
                    })()"##,
                )
                .await?;
            Ok(visible.then_some(()))
        })
        .await?;
        if loaded.is_timed_out() {
            warn!("详情容器未在时限内出现，按现有页面内容继续");
        }
        Ok(true)
    }

    /// 抓取结果区域的原始 HTML
    ///
    /// 优先取 AJAX 加载的完整详情容器，退化到结果列表容器
    pub async fn result_html(&self) -> Result<String> {
        let html: Option<String> = self
            .executor
            .eval_as(
                r##"(() => {
                    const primary = document.querySelector("#secondpage, #caseHistory, #history_case_no");
                    if (primary) { return primary.outerHTML; }
                    const fallback = document.querySelector("#showList, #show_filing_details");
                    if (fallback) { return fallback.outerHTML; }
                    return null;
                })()"##,
            )
            .await?;

        let html = html.ok_or(ScrapeError::MalformedDocument)?;
        if self.verbose_logging {
            debug!("结果 HTML 预览: {}", truncate_text(&html, 400));
        }
        Ok(html)
    }

    // ========== 内部辅助 ==========

    /// 等待选择器命中的元素出现且可见
    async fn wait_for_selector(&self, selector: &str) -> Result<()> {
        let js = format!(
            r#"(() => {{
                const el = document.querySelector({});
                return !!(el && el.offsetParent !== null);
            }})()"#,
            serde_json::to_string(selector)?
        );

        let js = &js;
        let outcome = poll_until(self.form_timeout, self.poll_interval, || async move {
            let visible: bool = self.executor.eval_as(js.clone()).await?;
            Ok(visible.then_some(()))
        })
        .await?;

        match outcome {
            PollOutcome::Ready(()) => Ok(()),
            PollOutcome::TimedOut => Err(ScrapeError::SessionTimeout {
                what: format!("元素 {}", selector),
                seconds: self.form_timeout.as_secs(),
            }),
        }
    }

    /// 在下拉列表中选中第一个文本包含 `case_type` 的选项
    async fn select_case_type(&self, case_type: &str) -> Result<()> {
        let js = format!(
            r#"(() => {{
                const select = document.querySelector("select#case_type, select[name='case_type']");
                if (!select) {{ return false; }}
                for (const option of select.options) {{
                    if (option.text.includes({})) {{
                        select.value = option.value;
                        select.dispatchEvent(new Event('change', {{ bubbles: true }}));
                        return true;
                    }}
                }}
                return false;
            }})()"#,
            serde_json::to_string(case_type)?
        );

        let found: bool = self.executor.eval_as(js).await?;
        if !found {
            return Err(ScrapeError::CaseTypeNotFound(case_type.to_string()));
        }
        Ok(())
    }

    /// 清空并填入文本框，触发 input/change 事件
    async fn fill_field(&self, selector: &str, value: &str) -> Result<()> {
        let js = format!(
            r#"(() => {{
                const input = document.querySelector({});
                if (!input) {{ return false; }}
                input.value = {};
                input.dispatchEvent(new Event('input', {{ bubbles: true }}));
                input.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()"#,
            serde_json::to_string(selector)?,
            serde_json::to_string(value)?
        );

        let filled: bool = self.executor.eval_as(js).await?;
        if !filled {
            return Err(ScrapeError::ElementMissing(selector.to_string()));
        }
        Ok(())
    }

    /// 用钩子替换 window.alert：弹窗文本存入全局变量，页面不再被阻塞
    ///
    /// 快照采集时读取并清空该变量，等价于"确认并关闭"弹窗
    async fn install_alert_hook(&self) -> Result<()> {
        self.executor
            .eval(
                r#"(() => {
                    window.__alertText = null;
                    window.alert = (msg) => { window.__alertText = String(msg); };
                    return true;
                })()"#,
            )
            .await?;
        Ok(())
    }

    async fn results_visible(&self) -> Result<bool> {
        let js = format!(
            r#"(() => {{
                return Array.from(document.querySelectorAll({}))
                    .some(el => el.offsetParent !== null);
            }})()"#,
            serde_json::to_string(SUCCESS_SELECTORS)?
        );
        self.executor.eval_as(js).await
    }
}

impl ChallengeSession for CourtSession<'_> {
    async fn refresh_challenge(&self) -> Result<()> {
        let clicked: bool = self
            .executor
            .eval_as(
                r#"(() => {
                    const btn = document.querySelector(
                        "img[alt='Refresh'], a[title='Refresh'], img[src*='refresh'], img[onclick*='captcha'], a[onclick*='captcha']");
                    if (!btn) { return false; }
                    btn.click();
                    return true;
                })()"#,
            )
            .await?;

        if clicked {
            // 等新图片替换旧图片
            sleep(Duration::from_secs(2)).await;
        } else {
            debug!("未找到验证码刷新按钮");
        }
        Ok(())
    }

    async fn challenge_ready(&self) -> Result<bool> {
        self.executor
            .eval_as(
                r#"(() => {
                    const img = document.querySelector("img#captcha_image");
                    return !!(img && img.complete && img.naturalWidth > 0);
                })()"#,
            )
            .await
    }

    async fn capture_challenge(&self) -> Result<Vec<u8>> {
        self.executor.capture_element("img#captcha_image").await
    }

    async fn submit_answer(&self, answer: &str) -> Result<()> {
        let js = format!(
            r#"(() => {{
                const input = document.querySelector("input#captcha, input[name='captcha']");
                if (!input) {{ return false; }}
                input.value = {};
                input.dispatchEvent(new Event('input', {{ bubbles: true }}));
                const btn = document.querySelector(
                    "input[type='submit'], input[value='Go'], button[type='submit']");
                if (!btn) {{ return false; }}
                btn.click();
                return true;
            }})()"#,
            serde_json::to_string(answer)?
        );

        let submitted: bool = self.executor.eval_as(js).await?;
        if !submitted {
            return Err(ScrapeError::ElementMissing("验证码输入框或提交按钮".to_string()));
        }
        Ok(())
    }

    async fn snapshot(&self) -> Result<DocumentSnapshot> {
        let js = format!(
            r#"(() => {{
                const alertText = window.__alertText || null;
                window.__alertText = null;
                const bodyText = document.body ? document.body.innerText : "";
                const resultVisible = Array.from(document.querySelectorAll({}))
                    .some(el => el.offsetParent !== null);
                return {{ alertText, bodyText, resultVisible }};
            }})()"#,
            serde_json::to_string(SUCCESS_SELECTORS)?
        );
        self.executor.eval_as(js).await
    }
}
