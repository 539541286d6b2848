//! 输入校验错误
//!
//! 在任何 I/O 之前拒绝非法输入，对外映射为客户端错误。

use crate::entity::EntityScope;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("entity key required")]
    EmptyEntityKey,
    #[error("entity key part contains reserved separator: {0}")]
    InvalidKeyPart(String),
    #[error("entity scope {scope} expects {expected} parts, got {actual}")]
    ArityMismatch {
        scope: EntityScope,
        expected: usize,
        actual: usize,
    },
    #[error("unknown entity scope: {0}")]
    UnknownScope(String),
    #[error("value must be finite")]
    NonFiniteValue,
    #[error("window start {start} is after end {end}")]
    InvalidWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}
