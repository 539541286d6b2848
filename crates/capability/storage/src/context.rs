//! 调用上下文：取消与截止时间
//!
//! 每个存储/缓存操作都显式接收 `OpContext`，慢后端不会无限期拖住请求。
//! 取消或超时后操作立即返回 `Cancelled` 类错误；被丢弃的 future 不会继续执行。

use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// 操作被中止的原因。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    Cancelled,
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Cancelled => f.write_str("cancelled"),
            CancelReason::DeadlineExceeded => f.write_str("deadline exceeded"),
        }
    }
}

/// 调用方下发的取消令牌与可选截止时间。
#[derive(Debug, Clone, Default)]
pub struct OpContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl OpContext {
    /// 无截止时间、未取消的上下文。
    pub fn new() -> Self {
        Self::default()
    }

    /// 从现在起 `timeout` 后到期。
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().timeout(timeout)
    }

    /// 收紧截止时间；已有更早的截止时间时保持不变。
    /// 超出时钟范围的 `timeout` 视为不设截止时间。
    pub fn timeout(mut self, timeout: Duration) -> Self {
        let Some(candidate) = Instant::now().checked_add(timeout) else {
            return self;
        };
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < candidate => existing,
            _ => candidate,
        });
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// 当前是否已不应再发起 I/O。
    pub fn check(&self) -> Result<(), CancelReason> {
        if self.cancel.is_cancelled() {
            return Err(CancelReason::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(CancelReason::DeadlineExceeded);
            }
        }
        Ok(())
    }

    /// 在取消/截止时间约束下执行 `fut`。
    ///
    /// 先到者胜：取消或到期时丢弃 `fut` 并返回 `on_cancel(reason)`。
    pub async fn run<F, T, E>(&self, fut: F, on_cancel: impl FnOnce(CancelReason) -> E) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
    {
        if let Err(reason) = self.check() {
            return Err(on_cancel(reason));
        }
        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };
        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(CancelReason::Cancelled),
            _ = deadline => Err(CancelReason::DeadlineExceeded),
            result = fut => Ok(result),
        };
        match outcome {
            Ok(result) => result,
            Err(reason) => Err(on_cancel(reason)),
        }
    }
}
