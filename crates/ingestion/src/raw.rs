//! 原始传感器日志读取
//!
//! 两种布局：
//! - 按位置：时间戳 + 设备通道值，空白分隔
//! - 按列名：最后一行表头给出列名，按 `timestamp_column` / `source_columns` 取列
//!   (CMU-MMAC 3DMGX1 日志：`Count\tSysTime\t...`)

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use contracts::{ContractError, DeviceConfig, SensorReading, TimestampFormat};
use tracing::debug;

use crate::lines::{parse_value, scan_lines, LineKind};

/// 读取一个原始日志文件
///
/// # Errors
/// - 文件不可读 → `Io`
/// - 列数不符 / 缺少列 / 非数值字段 → `Parse` (含行号)
/// - 无数据行 → `EmptyInput`
pub fn read_raw_log(
    path: &Path,
    device: &DeviceConfig,
    format: TimestampFormat,
) -> Result<Vec<SensorReading>, ContractError> {
    let file = File::open(path).map_err(|e| ContractError::io(path, e))?;
    parse_raw_log(BufReader::new(file), path, device, format)
}

/// 从任意 reader 解析原始日志，`source` 仅用于错误信息
pub fn parse_raw_log<R: BufRead>(
    reader: R,
    source: &Path,
    device: &DeviceConfig,
    format: TimestampFormat,
) -> Result<Vec<SensorReading>, ContractError> {
    let named = device.named_columns();
    let mut columns = None;
    let mut readings = Vec::new();

    scan_lines(reader, source, device.header_lines, |line, kind, fields| {
        match (kind, named) {
            (LineKind::Header, Some((timestamp, channels))) => {
                columns = Some(ColumnIndex::resolve(source, line, fields, timestamp, channels)?);
            }
            (LineKind::Header, None) => {}
            (LineKind::Data, None) => {
                readings.push(read_positional(source, line, fields, device, format)?);
            }
            (LineKind::Data, Some(_)) => {
                let index = columns.as_ref().ok_or_else(|| {
                    ContractError::parse(source, line, "no column name row before data")
                })?;
                readings.push(index.read(source, line, fields, format)?);
            }
        }
        Ok(())
    })?;

    if readings.is_empty() {
        return Err(ContractError::empty_input(device.id.to_string(), source));
    }

    debug!(
        device = %device.id,
        path = %source.display(),
        rows = readings.len(),
        "raw log parsed"
    );
    Ok(readings)
}

/// 时间戳在第一列，其后恰好是设备的全部通道
fn read_positional(
    source: &Path,
    line: usize,
    fields: &[&str],
    device: &DeviceConfig,
    format: TimestampFormat,
) -> Result<SensorReading, ContractError> {
    let expected = device.channels.len() + 1;
    if fields.len() != expected {
        return Err(ContractError::parse(
            source,
            line,
            format!(
                "expected {} columns (timestamp + {} channels), found {}",
                expected,
                device.channels.len(),
                fields.len()
            ),
        ));
    }
    let timestamp = format
        .parse(fields[0])
        .map_err(|msg| ContractError::parse(source, line, msg))?;
    let values = fields[1..]
        .iter()
        .enumerate()
        .map(|(i, field)| parse_value(source, line, i + 2, field))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(SensorReading::new(timestamp, values))
}

/// 由列名行解析出的列位置 (0-based)
#[derive(Debug)]
struct ColumnIndex {
    timestamp: usize,
    channels: Vec<usize>,
}

impl ColumnIndex {
    fn resolve(
        source: &Path,
        line: usize,
        header: &[&str],
        timestamp: &str,
        channels: &[String],
    ) -> Result<Self, ContractError> {
        let find = |name: &str| {
            header.iter().position(|h| *h == name).ok_or_else(|| {
                ContractError::parse(source, line, format!("column '{name}' not in header"))
            })
        };
        Ok(Self {
            timestamp: find(timestamp)?,
            channels: channels
                .iter()
                .map(|name| find(name.as_str()))
                .collect::<Result<_, _>>()?,
        })
    }

    /// 只解析被选中的列，其余列不检查
    fn read(
        &self,
        source: &Path,
        line: usize,
        fields: &[&str],
        format: TimestampFormat,
    ) -> Result<SensorReading, ContractError> {
        let field = |column: usize| {
            fields.get(column).copied().ok_or_else(|| {
                ContractError::parse(
                    source,
                    line,
                    format!("row has {} columns, column {} missing", fields.len(), column + 1),
                )
            })
        };
        let timestamp = format
            .parse(field(self.timestamp)?)
            .map_err(|msg| ContractError::parse(source, line, msg))?;
        let values = self
            .channels
            .iter()
            .map(|&column| field(column).and_then(|f| parse_value(source, line, column + 1, f)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SensorReading::new(timestamp, values))
    }
}
