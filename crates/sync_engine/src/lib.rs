//! # Sync Engine
//!
//! 视频帧时间轴同步引擎。
//!
//! 负责：
//! - 按帧时间戳在各设备重采样序列中取值 (最近邻 / 线性)
//! - 越界帧按边界策略处理 (钳位 / 外推)
//! - 按特征布局拼接，输出每帧一行的 `FeatureTable`
//!
//! ## 使用示例
//!
//! ```ignore
//! use sync_engine::{SyncEngine, SyncEngineConfig};
//!
//! let layout = FeatureLayout::new(&blueprint.devices, blueprint.general.channel_order);
//! let engine = SyncEngine::new(layout, SyncEngineConfig::from(&blueprint.general));
//!
//! let table = engine.synchronize(&session_id, &series, &frames)?;
//! assert_eq!(table.rows.len(), frames.len());
//! ```

mod engine;
mod lookup;

// Re-exports
pub use engine::{SyncEngine, SyncEngineConfig, SyncError};
pub use lookup::{nearest_index, sample_linear, sample_nearest};

// Re-export contracts types
pub use contracts::{FeatureTable, FrameTimestamp, ResampledSeries, SyncedFeatureRow};
