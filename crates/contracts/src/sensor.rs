//! SensorReading - Ingestion 输出
//!
//! 原始传感器采样及其时间戳格式。

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// 单个原始采样
///
/// 一个设备在一个时刻的全部通道值。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// 传感器时钟时间戳 (seconds, f64)
    pub timestamp: f64,

    /// 通道值，顺序与设备配置的 `channels` 一致
    pub values: Vec<f64>,
}

impl SensorReading {
    pub fn new(timestamp: f64, values: Vec<f64>) -> Self {
        Self { timestamp, values }
    }
}

/// 时间戳文本格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampFormat {
    /// 浮点秒
    #[default]
    Seconds,
    /// CMU-MMAC `HH_MM_SS_fffffff` (100ns 计数, 截断到微秒)
    CmuMmac,
}

impl TimestampFormat {
    /// 解析单个时间戳字段为秒
    pub fn parse(self, text: &str) -> Result<f64, String> {
        let seconds = match self {
            Self::Seconds => text
                .parse::<f64>()
                .map_err(|_| format!("invalid timestamp '{text}'"))?,
            Self::CmuMmac => parse_cmu_mmac(text)?,
        };
        if !seconds.is_finite() {
            return Err(format!("non-finite timestamp '{text}'"));
        }
        Ok(seconds)
    }

    /// 解析网格锚点 (视频起始时间)
    ///
    /// 先按本格式解析，再依次尝试 `YYYY-MM-DD HH:MM:SS.ffffff`
    /// 和 `HH:MM:SS.ffffff` (取当日秒数)。
    pub fn parse_anchor(self, text: &str) -> Result<f64, String> {
        let text = text.trim();
        if let Ok(seconds) = self.parse(text) {
            return Ok(seconds);
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f") {
            return Ok(seconds_since_midnight(dt.time()));
        }
        if let Ok(t) = NaiveTime::parse_from_str(text, "%H:%M:%S%.f") {
            return Ok(seconds_since_midnight(t));
        }
        Err(format!("unrecognized anchor timestamp '{text}'"))
    }
}

fn parse_cmu_mmac(text: &str) -> Result<f64, String> {
    let fields: Vec<&str> = text.split('_').collect();
    if fields.len() != 4 {
        return Err(format!(
            "expected HH_MM_SS_fffffff timestamp, got '{text}'"
        ));
    }
    let mut parts = [0u32; 4];
    for (slot, field) in parts.iter_mut().zip(&fields) {
        *slot = field
            .parse::<u32>()
            .map_err(|_| format!("invalid timestamp field '{field}' in '{text}'"))?;
    }
    let [hour, minute, second, ticks] = parts;
    // 原始精度为 7 位小数 (100ns)，保留到微秒
    let time = NaiveTime::from_hms_micro_opt(hour, minute, second, ticks / 10)
        .ok_or_else(|| format!("timestamp out of range '{text}'"))?;
    Ok(seconds_since_midnight(time))
}

fn seconds_since_midnight(time: NaiveTime) -> f64 {
    time.num_seconds_from_midnight() as f64 + time.nanosecond() as f64 / 1e9
}
