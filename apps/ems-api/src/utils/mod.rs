//! Handler 公共辅助：统一响应构造与输入解析。

pub mod response;
pub mod validation;

pub use validation::*;
