//! 监控模块
//!
//! 提供 Provider 级别的成功率与延迟统计，供选择器评分使用

mod performance;

pub use performance::{PerformanceRecord, PerformanceTracker, COLD_START_SUCCESS_RATE};
