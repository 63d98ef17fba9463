//! 有界轮询原语 - 基础设施层
//!
//! 把"还没出现"与"确定不存在"区分开：探测函数返回 `Ok(None)` 表示还没出现、
//! 继续轮询；返回 `Ok(Some(..))` 表示就绪；返回 `Err` 表示确定性失败，立即上抛。
//! 时限到达后返回 `TimedOut`，由调用方决定这算不算错误。

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};

use crate::error::Result;

/// 轮询结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome<T> {
    /// 在时限内就绪
    Ready(T),
    /// 时限耗尽仍未就绪
    TimedOut,
}

impl<T> PollOutcome<T> {
    pub fn is_timed_out(&self) -> bool {
        matches!(self, PollOutcome::TimedOut)
    }
}

/// 以固定间隔轮询探测函数，直到就绪或超时
///
/// 首次探测不等待；超时检查发生在每次探测之后，因此时限为 0 也会探测一次。
pub async fn poll_until<T, F, Fut>(
    timeout: Duration,
    interval: Duration,
    mut probe: F,
) -> Result<PollOutcome<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(value) = probe().await? {
            return Ok(PollOutcome::Ready(value));
        }
        if Instant::now() >= deadline {
            return Ok(PollOutcome::TimedOut);
        }
        sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScrapeError;

    #[tokio::test]
    async fn test_poll_until_ready() {
        let mut calls = 0;
        let outcome = poll_until(Duration::from_secs(1), Duration::from_millis(1), || {
            calls += 1;
            let current = calls;
            async move { Ok((current >= 3).then_some(current)) }
        })
        .await
        .expect("探测函数不返回错误");

        assert_eq!(outcome, PollOutcome::Ready(3));
    }

    #[tokio::test]
    async fn test_poll_until_times_out() {
        let outcome: PollOutcome<()> =
            poll_until(Duration::from_millis(5), Duration::from_millis(1), || async {
                Ok(None)
            })
            .await
            .expect("探测函数不返回错误");

        assert!(outcome.is_timed_out());
    }

    #[tokio::test]
    async fn test_poll_until_propagates_errors() {
        let result: Result<PollOutcome<()>> =
            poll_until(Duration::from_millis(5), Duration::from_millis(1), || async {
                Err(ScrapeError::MalformedDocument)
            })
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_zero_timeout_probes_once() {
        let outcome = poll_until(Duration::ZERO, Duration::from_millis(1), || async {
            Ok(Some(42))
        })
        .await
        .expect("探测函数不返回错误");

        assert_eq!(outcome, PollOutcome::Ready(42));
    }
}
