//! 查询时间窗口

use crate::error::ValidationError;
use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// 闭区间 `[start, end]`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// 以 `end` 为终点、向前 `span` 的窗口。
    pub fn trailing(end: DateTime<Utc>, span: Duration) -> Self {
        Self {
            start: end - span,
            end,
        }
    }

    /// 补齐调用方未指定的边界：缺省终点为 `now`，缺省起点为终点前 `span`。
    pub fn resolve(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        span: Duration,
    ) -> Result<Self, ValidationError> {
        let end = end.unwrap_or(now);
        let start = start.unwrap_or(end - span);
        Self::new(start, end)
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts <= self.end
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn resolve_defaults_to_trailing_span() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        let window = TimeWindow::resolve(None, None, now, Duration::hours(1)).expect("window");
        assert_eq!(window.end, now);
        assert_eq!(window.start, now - Duration::hours(1));
    }

    #[test]
    fn resolve_keeps_explicit_bounds() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        let end = now - Duration::hours(5);
        let window =
            TimeWindow::resolve(None, Some(end), now, Duration::hours(1)).expect("window");
        assert_eq!(window.start, end - Duration::hours(1));
        assert!(window.contains(end));
        assert!(!window.contains(now));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        let err = TimeWindow::new(now, now - Duration::seconds(1)).expect_err("inverted");
        assert!(matches!(err, ValidationError::InvalidWindow { .. }));
    }
}
