//! 批处理指标收集模块
//!
//! 每个会话阶段结束时记录 `metrics` 指标，并在内存中聚合批处理摘要。

use std::collections::BTreeMap;

use contracts::ContractError;
use metrics::{counter, histogram};

/// 记录原始日志读取行数
pub fn record_raw_readings(device_id: &str, count: usize) {
    counter!(
        "egosync_raw_readings_total",
        "device_id" => device_id.to_string()
    )
    .increment(count as u64);
}

/// 记录重采样输出行数
pub fn record_rows_resampled(device_id: &str, rows: usize) {
    counter!(
        "egosync_rows_resampled_total",
        "device_id" => device_id.to_string()
    )
    .increment(rows as u64);
}

/// 记录阶段耗时
pub fn record_stage_duration_ms(stage: &str, millis: f64) {
    histogram!("egosync_stage_duration_ms", "stage" => stage.to_string()).record(millis);
}

/// 记录会话结果
///
/// 失败时按错误类别计数 (`parse` / `missing_sensor_stream` / ...)。
pub fn record_session_outcome(stage: &str, error: Option<&ContractError>) {
    let status = if error.is_some() { "failure" } else { "success" };
    counter!(
        "egosync_sessions_total",
        "stage" => stage.to_string(),
        "status" => status
    )
    .increment(1);

    if let Some(err) = error {
        counter!(
            "egosync_session_failures_total",
            "stage" => stage.to_string(),
            "kind" => err.kind()
        )
        .increment(1);
    }
}

/// 批处理指标聚合器
///
/// 在内存中聚合指标，批处理结束时输出摘要。
#[derive(Debug, Clone, Default)]
pub struct BatchMetricsAggregator {
    /// 成功会话数
    pub sessions_ok: u64,

    /// 失败会话数
    pub sessions_failed: u64,

    /// 重采样输出总行数
    pub rows_resampled: u64,

    /// 同步输出总帧数
    pub frames_synced: u64,

    /// 写出文件数
    pub files_written: u64,

    /// 各阶段耗时 (毫秒)
    pub stage_durations: BTreeMap<String, RunningStats>,

    /// 各错误类别计数
    pub failure_kinds: BTreeMap<String, u64>,
}

impl BatchMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次阶段耗时
    pub fn observe_stage(&mut self, stage: &str, millis: f64) {
        self.stage_durations
            .entry(stage.to_string())
            .or_default()
            .push(millis);
    }

    /// 记录一个成功会话
    pub fn session_succeeded(&mut self, rows_resampled: usize, frames_synced: usize, files: usize) {
        self.sessions_ok += 1;
        self.rows_resampled += rows_resampled as u64;
        self.frames_synced += frames_synced as u64;
        self.files_written += files as u64;
    }

    /// 记录一个失败会话
    pub fn session_failed(&mut self, error: &ContractError) {
        self.sessions_failed += 1;
        *self
            .failure_kinds
            .entry(error.kind().to_string())
            .or_insert(0) += 1;
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            sessions_ok: self.sessions_ok,
            sessions_failed: self.sessions_failed,
            rows_resampled: self.rows_resampled,
            frames_synced: self.frames_synced,
            files_written: self.files_written,
            stage_durations_ms: self
                .stage_durations
                .iter()
                .map(|(stage, stats)| (stage.clone(), StatsSummary::from(stats)))
                .collect(),
            failure_kinds: self.failure_kinds.clone(),
        }
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub sessions_ok: u64,
    pub sessions_failed: u64,
    pub rows_resampled: u64,
    pub frames_synced: u64,
    pub files_written: u64,
    pub stage_durations_ms: BTreeMap<String, StatsSummary>,
    pub failure_kinds: BTreeMap<String, u64>,
}

impl MetricsSummary {
    /// 失败率 (%)
    pub fn failure_rate(&self) -> f64 {
        let total = self.sessions_ok + self.sessions_failed;
        if total == 0 {
            0.0
        } else {
            self.sessions_failed as f64 / total as f64 * 100.0
        }
    }
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Batch Summary ===")?;
        writeln!(
            f,
            "Sessions: {} ok, {} failed ({:.2}%)",
            self.sessions_ok,
            self.sessions_failed,
            self.failure_rate()
        )?;
        writeln!(f, "Rows resampled: {}", self.rows_resampled)?;
        writeln!(f, "Frames synchronized: {}", self.frames_synced)?;
        writeln!(f, "Files written: {}", self.files_written)?;

        for (stage, stats) in &self.stage_durations_ms {
            writeln!(f, "{stage} (ms): {stats}")?;
        }

        if !self.failure_kinds.is_empty() {
            writeln!(f, "Failures by kind:")?;
            for (kind, count) in &self.failure_kinds {
                writeln!(f, "  {kind}: {count}")?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            return write!(f, "N/A");
        }
        write!(
            f,
            "min={:.1}, max={:.1}, mean={:.1}, std={:.1} (n={})",
            self.min, self.max, self.mean, self.std_dev, self.count
        )
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        if self.count == 1 {
            (self.min, self.max, self.mean, self.m2) = (value, value, value, 0.0);
            return;
        }
        self.min = self.min.min(value);
        self.max = self.max.max(value);

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        match self.count {
            0 | 1 => 0.0,
            n => self.m2 / (n - 1) as f64,
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
