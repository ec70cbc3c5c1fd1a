//! 行扫描
//!
//! 逐行读取纯文本输入，跳过表头、空行和 `#` 注释，
//! 其余每一行都是数据行，必须被调用方完整解析。

use std::io::BufRead;
use std::path::Path;

use contracts::ContractError;

/// 按空白或逗号切分字段
pub(crate) fn split_fields(line: &str) -> Vec<&str> {
    line.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|field| !field.is_empty())
        .collect()
}

/// 行类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineKind {
    /// 最后一行表头 (列名行)
    Header,
    Data,
}

/// 扫描数据行
///
/// 对每个数据行调用 `on_row(行号, 字段)`，行号从 1 开始、包含表头。
/// 返回数据行数量。
pub(crate) fn scan_data_lines<R, F>(
    reader: R,
    source: &Path,
    header_lines: usize,
    mut on_row: F,
) -> Result<usize, ContractError>
where
    R: BufRead,
    F: FnMut(usize, &[&str]) -> Result<(), ContractError>,
{
    scan_lines(reader, source, header_lines, |number, kind, fields| match kind {
        LineKind::Header => Ok(()),
        LineKind::Data => on_row(number, fields),
    })
}

/// 同 `scan_data_lines`，另外把第 `header_lines` 行作为 [`LineKind::Header`] 交给回调
pub(crate) fn scan_lines<R, F>(
    reader: R,
    source: &Path,
    header_lines: usize,
    mut on_line: F,
) -> Result<usize, ContractError>
where
    R: BufRead,
    F: FnMut(usize, LineKind, &[&str]) -> Result<(), ContractError>,
{
    let mut rows = 0;
    for (idx, line) in reader.lines().enumerate() {
        let number = idx + 1;
        let line = line.map_err(|e| ContractError::io(source, e))?;
        if number < header_lines {
            continue;
        }
        if number == header_lines {
            on_line(number, LineKind::Header, &split_fields(line.trim()))?;
            continue;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let fields = split_fields(trimmed);
        on_line(number, LineKind::Data, &fields)?;
        rows += 1;
    }
    Ok(rows)
}

/// 解析单个数值字段，拒绝非数字与非有限值
pub(crate) fn parse_value(
    source: &Path,
    line: usize,
    column: usize,
    field: &str,
) -> Result<f64, ContractError> {
    match field.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        Ok(_) => Err(ContractError::parse(
            source,
            line,
            format!("non-finite value '{field}' in column {column}"),
        )),
        Err(_) => Err(ContractError::parse(
            source,
            line,
            format!("non-numeric value '{field}' in column {column}"),
        )),
    }
}
