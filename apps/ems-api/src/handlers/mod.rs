//! Handlers 模块

pub mod assets;
pub mod auth;
pub mod health;
pub mod metrics;
pub mod telemetry;

pub use assets::*;
pub use auth::*;
pub use health::*;
pub use metrics::*;
pub use telemetry::*;
