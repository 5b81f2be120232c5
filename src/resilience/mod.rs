//! 容错机制模块
//!
//! 提供重试、Provider 熔断、超时/取消控制与按用户限流

mod failover;
mod rate_limit;
mod retry;
mod timeout;

pub use failover::UnavailableSet;
pub use rate_limit::{RateLimitConfig, RateLimiter, CLEANUP_INTERVAL};
pub use retry::{Retrier, RetryConfig, RetryError};
pub use timeout::{TimeoutConfig, TimeoutController, TimeoutError};
pub use tokio_util::sync::CancellationToken;
