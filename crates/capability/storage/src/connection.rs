//! 数据库连接管理
//!
//! 连接池在启动时创建一次并在所有请求间共享，停机时通过 `PgPool::close` 释放。

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// 默认最大连接数。
pub const DEFAULT_MAX_CONNECTIONS: u32 = 8;

/// 建立 Postgres 连接池
///
/// # 参数
/// - `database_url`：Postgres 连接字符串
/// - `max_connections`：连接池上限（0 视为默认值）
pub async fn connect_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let max_connections = if max_connections == 0 {
        DEFAULT_MAX_CONNECTIONS
    } else {
        max_connections
    };
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}
