//! 重采样序列读取
//!
//! CSV：表头 `timestamp,<channel...>`，时间戳显式写出且等间隔。

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use contracts::{ContractError, DeviceConfig, ResampledSeries, SessionId};
use tracing::debug;

/// 等间隔校验容差 (秒)
const SPACING_TOLERANCE_S: f64 = 1e-6;

/// 读取一个重采样序列文件
///
/// # Errors
/// - 文件不存在 → `MissingSensorStream`
/// - 表头与设备通道不符 / 非等间隔 / 非数值 → `Parse`
/// - 无数据行 → `EmptyInput`
pub fn read_resampled_series(
    path: &Path,
    session: &SessionId,
    device: &DeviceConfig,
    rate_hz: f64,
) -> Result<ResampledSeries, ContractError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ContractError::missing_stream(session, &device.id, path));
        }
        Err(e) => return Err(ContractError::io(path, e)),
    };
    parse_resampled_series(file, path, session, device, rate_hz)
}

/// 从任意 reader 解析重采样序列
pub fn parse_resampled_series<R: Read>(
    reader: R,
    source: &Path,
    session: &SessionId,
    device: &DeviceConfig,
    rate_hz: f64,
) -> Result<ResampledSeries, ContractError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| csv_error(source, e))?
        .clone();
    let header_ok = headers.len() == device.channels.len() + 1
        && &headers[0] == "timestamp"
        && headers
            .iter()
            .skip(1)
            .zip(&device.channels)
            .all(|(h, c)| h == c.as_str());
    if !header_ok {
        return Err(ContractError::parse(
            source,
            1,
            format!(
                "header does not match device '{}': expected timestamp,{}",
                device.id,
                device.channels.join(",")
            ),
        ));
    }

    let mut start = None;
    let mut samples = Vec::new();
    for record in csv_reader.records() {
        let record = record.map_err(|e| csv_error(source, e))?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or_default();

        let mut values = Vec::with_capacity(device.channels.len());
        for (column, field) in record.iter().enumerate() {
            let value = field.parse::<f64>().ok().filter(|v| v.is_finite()).ok_or_else(|| {
                ContractError::parse(
                    source,
                    line,
                    format!("non-numeric value '{field}' in column {}", column + 1),
                )
            })?;
            values.push(value);
        }
        let timestamp = values.remove(0);

        let t0 = *start.get_or_insert(timestamp);
        let expected = t0 + samples.len() as f64 / rate_hz;
        if (timestamp - expected).abs() > SPACING_TOLERANCE_S {
            return Err(ContractError::parse(
                source,
                line,
                format!(
                    "timestamp {timestamp} breaks uniform {rate_hz} Hz spacing (expected {expected})"
                ),
            ));
        }
        samples.push(values);
    }

    let Some(start) = start else {
        return Err(ContractError::empty_input(device.id.to_string(), source));
    };

    debug!(
        session = %session,
        device = %device.id,
        samples = samples.len(),
        "resampled series loaded"
    );

    Ok(ResampledSeries {
        session_id: session.clone(),
        device_id: device.id.clone(),
        start,
        rate_hz,
        channels: device.channels.clone(),
        samples,
    })
}

fn csv_error(source: &Path, err: csv::Error) -> ContractError {
    let line = err
        .position()
        .map(|p| p.line() as usize)
        .unwrap_or_default();
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(e) => ContractError::io(source, e),
        _ => ContractError::parse(source, line, message),
    }
}
