//! 验证码解析循环 - 业务能力层
//!
//! 整个系统里唯一允许阻塞等待的地方，所有等待都有上界：
//! - 图片加载等待（短时限，超时跳过本次、不消耗 OCR 调用）
//! - 单次提交后的验证窗口（默认 15 秒，轮询判定）
//! - 总尝试次数（默认 5 次）
//!
//! 尝试严格串行。单次尝试内的任何失败（图片加载不出、OCR 为空、提交被驳回、
//! 验证窗口超时）都只消耗本次尝试；循环只对外暴露最终结果。
//! 注意：验证窗口超时与显式驳回同等对待，都会触发重试。

use chrono::{DateTime, Local};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::infrastructure::{poll_until, PollOutcome};
use crate::services::court_session::ChallengeSession;
use crate::services::outcome::{classify, Outcome};
use crate::services::recognizer::ChallengeRecognizer;

/// 解析循环的最终结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionResult {
    /// 某次尝试的提交被接受
    Solved,
    /// 尝试次数耗尽，需要人工完成验证码
    RequiresManualIntervention,
}

/// 单次尝试的判定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Rejected,
    /// 验证窗口超时，或本次尝试根本没走到提交
    Timeout,
}

/// 一次完整的"捕获 → 识别 → 提交 → 判定"循环记录
///
/// 只在循环内部存活，循环退出时汇总进日志后丢弃
#[derive(Debug, Clone)]
pub struct ChallengeAttempt {
    pub index: usize,
    /// 清洗后的识别文本（可能为空）
    pub answer: String,
    /// 提交时刻；没走到提交的尝试为 None
    pub submitted_at: Option<DateTime<Local>>,
    pub outcome: AttemptOutcome,
}

/// 验证码解析循环
pub struct ChallengeResolver {
    max_attempts: usize,
    validation_window: Duration,
    poll_interval: Duration,
    image_load_timeout: Duration,
}

impl ChallengeResolver {
    pub fn new(config: &Config) -> Self {
        Self {
            max_attempts: config.max_attempts,
            validation_window: config.validation_window(),
            poll_interval: config.poll_interval(),
            image_load_timeout: config.image_load_timeout(),
        }
    }

    /// 自定义全部边界（测试用短时限）
    pub fn with_bounds(
        max_attempts: usize,
        validation_window: Duration,
        poll_interval: Duration,
        image_load_timeout: Duration,
    ) -> Self {
        Self {
            max_attempts,
            validation_window,
            poll_interval,
            image_load_timeout,
        }
    }

    /// 运行解析循环
    pub async fn resolve<S, R>(&self, session: &S, recognizer: &R) -> Result<ResolutionResult>
    where
        S: ChallengeSession,
        R: ChallengeRecognizer,
    {
        info!("🤖 开始自动识别验证码（最多 {} 次）...", self.max_attempts);
        let mut attempts: Vec<ChallengeAttempt> = Vec::new();

        for index in 0..self.max_attempts {
            let mut attempt = ChallengeAttempt {
                index,
                answer: String::new(),
                submitted_at: None,
                outcome: AttemptOutcome::Timeout,
            };

            if index > 0 {
                info!("🔁 重试验证码 ({}/{})...", index + 1, self.max_attempts);
                // 刷新失败不致命，旧图片也可能识别出来
                if let Err(e) = session.refresh_challenge().await {
                    warn!("刷新验证码失败（继续尝试）: {}", e);
                }
            }

            let loaded = poll_until(self.image_load_timeout, self.poll_interval, || async move {
                Ok(session.challenge_ready().await.unwrap_or(false).then_some(()))
            })
            .await?;
            if loaded.is_timed_out() {
                warn!("验证码图片未加载完成，跳过本次尝试");
                attempts.push(attempt);
                continue;
            }

            let image = match session.capture_challenge().await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("截取验证码失败: {}", e);
                    attempts.push(attempt);
                    continue;
                }
            };

            let raw = match recognizer.recognize(&image).await {
                Ok(text) => text,
                Err(e) => {
                    warn!("OCR 识别失败: {}", e);
                    attempts.push(attempt);
                    continue;
                }
            };

            // 验证码只含字母数字，其余都是 OCR 噪声
            let answer: String = raw.chars().filter(char::is_ascii_alphanumeric).collect();
            if answer.is_empty() {
                warn!("OCR 结果为空，跳过本次尝试");
                attempts.push(attempt);
                continue;
            }
            info!("🔍 OCR 识别结果: {}", answer);
            attempt.answer = answer.clone();

            if let Err(e) = session.submit_answer(&answer).await {
                warn!("提交验证码失败: {}", e);
                attempts.push(attempt);
                continue;
            }
            attempt.submitted_at = Some(Local::now());

            let outcome = self.await_verdict(session).await?;
            attempt.outcome = outcome;
            attempts.push(attempt);

            match outcome {
                AttemptOutcome::Success => {
                    info!("✅ 验证码通过 (第 {}/{} 次尝试)", index + 1, self.max_attempts);
                    log_attempts(&attempts);
                    return Ok(ResolutionResult::Solved);
                }
                AttemptOutcome::Rejected => {
                    info!("验证码被驳回，准备重试");
                }
                AttemptOutcome::Timeout => {
                    info!("验证窗口超时，按驳回处理");
                }
            }
        }

        warn!("⚠️ 自动识别耗尽 {} 次尝试，需要人工干预", self.max_attempts);
        log_attempts(&attempts);
        Ok(ResolutionResult::RequiresManualIntervention)
    }

    /// 提交后在验证窗口内轮询判定
    ///
    /// 每次轮询都采集新快照，不缓存；快照采集失败视为"暂时无法判定"继续轮询
    async fn await_verdict<S: ChallengeSession>(&self, session: &S) -> Result<AttemptOutcome> {
        let verdict = poll_until(self.validation_window, self.poll_interval, || async move {
            let snapshot = match session.snapshot().await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    debug!("采集快照失败，继续轮询: {}", e);
                    return Ok(None);
                }
            };
            if let Some(text) = &snapshot.alert_text {
                debug!("页面弹窗: {}", text);
            }
            Ok(match classify(&snapshot) {
                Outcome::Success => Some(AttemptOutcome::Success),
                Outcome::Rejected => Some(AttemptOutcome::Rejected),
                Outcome::Pending => None,
            })
        })
        .await?;

        Ok(match verdict {
            PollOutcome::Ready(outcome) => outcome,
            PollOutcome::TimedOut => AttemptOutcome::Timeout,
        })
    }
}

fn log_attempts(attempts: &[ChallengeAttempt]) {
    for attempt in attempts {
        debug!(
            "尝试 {}: 答案 {:?}, 提交时间 {:?}, 结果 {:?}",
            attempt.index + 1,
            attempt.answer,
            attempt.submitted_at.map(|t| t.format("%H:%M:%S").to_string()),
            attempt.outcome
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScrapeError;
    use crate::models::DocumentSnapshot;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn fast_resolver(max_attempts: usize) -> ChallengeResolver {
        ChallengeResolver::with_bounds(
            max_attempts,
            Duration::from_millis(20),
            Duration::from_millis(1),
            Duration::from_millis(20),
        )
    }

    /// 固定返回同一段文本的识别桩
    struct StubRecognizer {
        text: &'static str,
        calls: AtomicUsize,
    }

    impl StubRecognizer {
        fn new(text: &'static str) -> Self {
            Self {
                text,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl ChallengeRecognizer for StubRecognizer {
        async fn recognize(&self, _image: &[u8]) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.text.to_string())
        }
    }

    /// 页面状态固定的会话桩
    struct StubSession {
        body_text: &'static str,
        result_visible: bool,
        image_ready: bool,
        submits: AtomicUsize,
        refreshes: AtomicUsize,
        last_answer: Mutex<String>,
    }

    impl StubSession {
        fn new(body_text: &'static str, result_visible: bool) -> Self {
            Self {
                body_text,
                result_visible,
                image_ready: true,
                submits: AtomicUsize::new(0),
                refreshes: AtomicUsize::new(0),
                last_answer: Mutex::new(String::new()),
            }
        }
    }

    impl ChallengeSession for StubSession {
        async fn refresh_challenge(&self) -> Result<()> {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn challenge_ready(&self) -> Result<bool> {
            Ok(self.image_ready)
        }

        async fn capture_challenge(&self) -> Result<Vec<u8>> {
            Ok(vec![0u8; 16])
        }

        async fn submit_answer(&self, answer: &str) -> Result<()> {
            self.submits.fetch_add(1, Ordering::SeqCst);
            *self.last_answer.lock().expect("锁未被毒化") = answer.to_string();
            Ok(())
        }

        async fn snapshot(&self) -> Result<DocumentSnapshot> {
            Ok(DocumentSnapshot {
                alert_text: None,
                body_text: self.body_text.to_string(),
                result_visible: self.result_visible,
            })
        }
    }

    #[tokio::test]
    async fn test_empty_recognition_consumes_all_attempts() {
        let session = StubSession::new("form page", false);
        let recognizer = StubRecognizer::new("");
        let resolver = fast_resolver(5);

        let result = resolver
            .resolve(&session, &recognizer)
            .await
            .expect("解析循环本身不应出错");

        assert_eq!(result, ResolutionResult::RequiresManualIntervention);
        // 恰好消耗 5 次识别调用，一次都没提交
        assert_eq!(recognizer.calls.load(Ordering::SeqCst), 5);
        assert_eq!(session.submits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rejected_submissions_retry_until_exhausted() {
        let session = StubSession::new("Invalid Captcha, please retry", false);
        let recognizer = StubRecognizer::new("AB12");
        let resolver = fast_resolver(3);

        let result = resolver
            .resolve(&session, &recognizer)
            .await
            .expect("解析循环本身不应出错");

        assert_eq!(result, ResolutionResult::RequiresManualIntervention);
        assert_eq!(session.submits.load(Ordering::SeqCst), 3);
        // 第一次之外的每次尝试前都刷新过验证码
        assert_eq!(session.refreshes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_accepted_submission_solves_on_first_attempt() {
        let session = StubSession::new("Case History", true);
        let recognizer = StubRecognizer::new("XY9Z8");
        let resolver = fast_resolver(5);

        let result = resolver
            .resolve(&session, &recognizer)
            .await
            .expect("解析循环本身不应出错");

        assert_eq!(result, ResolutionResult::Solved);
        assert_eq!(session.submits.load(Ordering::SeqCst), 1);
        assert_eq!(session.refreshes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_answer_is_stripped_to_alphanumerics() {
        let session = StubSession::new("Record Not Found", false);
        let recognizer = StubRecognizer::new(" A B-1\n2! ");
        let resolver = fast_resolver(2);

        let result = resolver
            .resolve(&session, &recognizer)
            .await
            .expect("解析循环本身不应出错");

        assert_eq!(result, ResolutionResult::Solved);
        assert_eq!(*session.last_answer.lock().expect("锁未被毒化"), "AB12");
    }

    #[tokio::test]
    async fn test_unready_image_skips_without_recognition() {
        let mut session = StubSession::new("form page", false);
        session.image_ready = false;
        let recognizer = StubRecognizer::new("AB12");
        let resolver = fast_resolver(2);

        let result = resolver
            .resolve(&session, &recognizer)
            .await
            .expect("解析循环本身不应出错");

        assert_eq!(result, ResolutionResult::RequiresManualIntervention);
        assert_eq!(recognizer.calls.load(Ordering::SeqCst), 0);
    }

    /// 识别桩返回错误时按"本次尝试失败"处理，不中断循环
    struct FailingRecognizer;

    impl ChallengeRecognizer for FailingRecognizer {
        async fn recognize(&self, _image: &[u8]) -> Result<String> {
            Err(ScrapeError::Recognition("tesseract not found".to_string()))
        }
    }

    #[tokio::test]
    async fn test_recognizer_errors_are_recoverable() {
        let session = StubSession::new("form page", false);
        let resolver = fast_resolver(2);

        let result = resolver
            .resolve(&session, &FailingRecognizer)
            .await
            .expect("识别错误不应中断循环");

        assert_eq!(result, ResolutionResult::RequiresManualIntervention);
        assert_eq!(session.submits.load(Ordering::SeqCst), 0);
    }
}
