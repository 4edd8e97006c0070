use bigdecimal::{BigDecimal, Zero};
use csv::{ReaderBuilder, StringRecord, Trim};
use indexmap::IndexMap;
use serde::Serialize;
use std::str::FromStr;

use crate::error::AppError;
use crate::models::MAX_SKU_LEN;

/// CSV 解析结果: SKU -> 单位成本 (保持文件顺序, 同一 SKU 以最后一行为准)
#[derive(Debug, Default)]
pub struct CogsImport {
    pub entries: IndexMap<String, BigDecimal>,
    pub skipped: usize,
}

/// CSV 导入响应体
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CogsImportReport {
    pub success: bool,
    pub message: String,
    pub imported: usize,
    pub skipped: usize,
}

impl CogsImport {
    pub fn report(&self) -> CogsImportReport {
        CogsImportReport {
            success: true,
            message: format!(
                "Imported COGS for {} SKUs, skipped {} rows",
                self.entries.len(),
                self.skipped
            ),
            imported: self.entries.len(),
            skipped: self.skipped,
        }
    }
}

/// 按列名查找 (忽略大小写及 UTF-8 BOM)
fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}').trim().eq_ignore_ascii_case(name))
}

/// 解析 COGS 上传文件, 需要 `SKU` 与 `COGS` 两列
///
/// 缺 SKU、SKU 超长、缺 COGS、COGS 非数字或为负的行跳过并计数
pub fn parse_cogs_csv(data: &[u8]) -> Result<CogsImport, AppError> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(data);

    let headers = reader
        .headers()
        .map_err(|e| AppError::InvalidCsv(format!("unreadable header row: {}", e)))?
        .clone();

    let (Some(sku_col), Some(cogs_col)) = (column_index(&headers, "sku"), column_index(&headers, "cogs")) else {
        return Err(AppError::InvalidCsv(
            "header row must contain SKU and COGS columns".to_string(),
        ));
    };

    let mut import = CogsImport::default();
    for (line, record) in reader.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("COGS CSV 第 {} 行无法解析: {}", line + 2, e);
                import.skipped += 1;
                continue;
            }
        };

        let sku = record.get(sku_col).unwrap_or_default();
        let cost = record
            .get(cogs_col)
            .filter(|c| !c.is_empty())
            .and_then(|c| BigDecimal::from_str(c.trim_start_matches('$')).ok())
            .filter(|c| *c >= BigDecimal::zero());

        let bad_sku = sku.is_empty() || sku.chars().count() > MAX_SKU_LEN;
        match (bad_sku, cost) {
            (false, Some(cost)) => {
                import.entries.insert(sku.to_string(), cost);
            }
            _ => import.skipped += 1,
        }
    }

    tracing::info!(
        "COGS CSV 解析完成: {} 个 SKU, 跳过 {} 行",
        import.entries.len(),
        import.skipped
    );
    Ok(import)
}
