//! Mock 传感器日志
//!
//! 生成带抖动的非等间隔原始日志，用于无真实数据环境的测试。

use std::fmt::Write as _;
use std::path::Path;

use contracts::SensorReading;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Mock 日志配置
#[derive(Debug, Clone)]
pub struct MockSensorConfig {
    /// 通道数
    pub channels: usize,

    /// 名义采样率 (Hz)
    pub frequency_hz: f64,

    /// 时长 (秒)
    pub duration_s: f64,

    /// 起始时间戳 (秒)
    pub start_s: f64,

    /// 抖动幅度，占采样周期的比例 (< 0.5 保证时间戳有序)
    pub jitter: f64,

    /// 随机种子
    pub seed: u64,
}

impl Default for MockSensorConfig {
    fn default() -> Self {
        Self {
            channels: 3,
            frequency_hz: 148.0,
            duration_s: 10.0,
            start_s: 0.0,
            jitter: 0.4,
            seed: 7,
        }
    }
}

/// Mock 传感器源
pub struct MockSensorSource {
    config: MockSensorConfig,
}

impl MockSensorSource {
    pub fn new(config: MockSensorConfig) -> Self {
        Self { config }
    }

    /// 3 轴加速度计
    pub fn accelerometer(frequency_hz: f64, duration_s: f64) -> Self {
        Self::new(MockSensorConfig {
            channels: 3,
            frequency_hz,
            duration_s,
            ..Default::default()
        })
    }

    pub fn config(&self) -> &MockSensorConfig {
        &self.config
    }

    /// 生成采样
    ///
    /// 第一个采样恰好位于 `start_s`，其余在名义时刻附近抖动。
    /// 通道值为不同相位的正弦波。
    pub fn generate(&self) -> Vec<SensorReading> {
        let cfg = &self.config;
        let mut rng = StdRng::seed_from_u64(cfg.seed);
        let period = 1.0 / cfg.frequency_hz;
        let count = (cfg.duration_s * cfg.frequency_hz).round() as usize;

        (0..count)
            .map(|i| {
                let nominal = cfg.start_s + i as f64 * period;
                let timestamp = if i == 0 || cfg.jitter == 0.0 {
                    nominal
                } else {
                    nominal + rng.random_range(-cfg.jitter..cfg.jitter) * period
                };
                let offset = timestamp - cfg.start_s;
                let values = (0..cfg.channels)
                    .map(|c| {
                        let phase = c as f64 * std::f64::consts::FRAC_PI_3;
                        (2.0 * std::f64::consts::PI * 0.5 * offset + phase).sin() * (c + 1) as f64
                    })
                    .collect();
                SensorReading::new(timestamp, values)
            })
            .collect()
    }

    /// 以原始日志格式渲染 (空白分隔，6 位小数)
    pub fn render(&self, header: Option<&str>) -> String {
        let mut out = String::new();
        if let Some(header) = header {
            out.push_str(header);
            out.push('\n');
        }
        for reading in self.generate() {
            let _ = write!(out, "{:.6}", reading.timestamp);
            for value in &reading.values {
                let _ = write!(out, " {value:.6}");
            }
            out.push('\n');
        }
        out
    }

    /// 写入原始日志文件
    pub fn write_to(&self, path: &Path, header: Option<&str>) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.render(header))
    }
}
