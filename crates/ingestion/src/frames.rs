//! 视频帧时间戳读取
//!
//! 每行：`frame_index timestamp`，空白或逗号分隔。

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use contracts::{ContractError, FrameTimestamp, TimestampFormat};
use tracing::debug;

use crate::lines::scan_data_lines;

/// 读取一个帧时间戳文件
///
/// 时间戳必须严格递增。
pub fn read_frame_timestamps(
    path: &Path,
    header_lines: usize,
    format: TimestampFormat,
) -> Result<Vec<FrameTimestamp>, ContractError> {
    let file = File::open(path).map_err(|e| ContractError::io(path, e))?;
    parse_frame_timestamps(BufReader::new(file), path, header_lines, format)
}

/// 从任意 reader 解析帧时间戳
pub fn parse_frame_timestamps<R: BufRead>(
    reader: R,
    source: &Path,
    header_lines: usize,
    format: TimestampFormat,
) -> Result<Vec<FrameTimestamp>, ContractError> {
    let mut frames: Vec<FrameTimestamp> = Vec::new();

    scan_data_lines(reader, source, header_lines, |line, fields| {
        if fields.len() != 2 {
            return Err(ContractError::parse(
                source,
                line,
                format!("expected 2 columns (frame_index, timestamp), found {}", fields.len()),
            ));
        }
        let frame_index = fields[0].parse::<u64>().map_err(|_| {
            ContractError::parse(source, line, format!("invalid frame index '{}'", fields[0]))
        })?;
        let timestamp = format
            .parse(fields[1])
            .map_err(|msg| ContractError::parse(source, line, msg))?;

        if let Some(prev) = frames.last() {
            if timestamp <= prev.timestamp {
                return Err(ContractError::parse(
                    source,
                    line,
                    format!(
                        "frame timestamps must increase: {} follows {}",
                        timestamp, prev.timestamp
                    ),
                ));
            }
        }
        frames.push(FrameTimestamp {
            frame_index,
            timestamp,
        });
        Ok(())
    })?;

    if frames.is_empty() {
        return Err(ContractError::empty_input("video frames", source));
    }

    debug!(path = %source.display(), frames = frames.len(), "frame timestamps parsed");
    Ok(frames)
}
