//! # Dispatcher
//!
//! 输出分发模块。
//!
//! 负责：
//! - 将重采样序列与特征表写为 CSV
//! - 暂存到临时文件，commit 时原子重命名
//! - 部分提交失败时回滚已发布文件
//! - dry-run 时仅记录日志

pub mod dispatcher;
pub mod metrics;
pub mod sinks;

pub use contracts::DataSink;
pub use dispatcher::{create_sink, SinkKind};
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{CsvFileSink, LogSink};
