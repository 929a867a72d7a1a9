// ==========================================
// 会众管理系统 - 文件解析器实现
// ==========================================
// 阶段 0: 文件读取与解析
// 支持: CSV (.csv) / 电子表格 (.xlsx/.xls/.xlsm/.xlsb/.ods) / JSON (.json)
// 输出: 惰性行流；CSV 逐条读取，电子表格与 JSON 由解析库整体载入后逐行转换
// ==========================================

use crate::domain::ImportRow;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::member_importer_trait::{FileParser, RowStream};
use calamine::{open_workbook_auto, Data, Range, Reader};
use csv::{ByteRecord, ReaderBuilder};
use serde_json::Value;
use std::fs::File;
use std::path::Path;

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xls", "xlsm", "xlsb", "ods"];

/// 检查文件存在
fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// 表头清洗: TRIM + 去掉 UTF-8 BOM
fn clean_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_string()
}

/// 按表头组装行；超出表头的多余单元格被丢弃
fn zip_with_headers<I>(headers: &[String], values: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = String>,
{
    headers
        .iter()
        .zip(values)
        .filter(|(header, _)| !header.is_empty())
        .map(|(header, value)| (header.clone(), value.trim().to_string()))
        .collect()
}

// ==========================================
// CSV Parser 实现
// ==========================================
// 按字节读取记录，单元格逐个按 UTF-8 解码
// 解码失败只影响所在行（行级 Encoding 错误），不中止整次导入
pub struct CsvParser;

impl CsvParser {
    fn decode_record(headers: &[String], record: &ByteRecord, row_number: usize) -> ImportRow {
        let mut undecodable: Option<String> = None;
        let mut values = Vec::with_capacity(record.len());

        for (col, bytes) in record.iter().enumerate() {
            match std::str::from_utf8(bytes) {
                Ok(text) => values.push(text.to_string()),
                Err(_) => {
                    // 只记录表头内的命名列；多余单元格本就会被丢弃
                    if undecodable.is_none() {
                        undecodable = headers.get(col).filter(|h| !h.is_empty()).cloned();
                    }
                    values.push(String::from_utf8_lossy(bytes).into_owned());
                }
            }
        }

        let row = ImportRow::new(row_number, zip_with_headers(headers, values));
        match undecodable {
            Some(column) => row.with_decode_error(column),
            None => row,
        }
    }
}

impl FileParser for CsvParser {
    fn open_rows(&self, file_path: &Path) -> ImportResult<RowStream> {
        ensure_exists(file_path)?;

        if let Some(ext) = lowercase_extension(file_path) {
            if ext != "csv" {
                return Err(ImportError::UnsupportedFormat(ext));
            }
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let headers: Vec<String> = reader
            .byte_headers()?
            .iter()
            .map(|h| clean_header(&String::from_utf8_lossy(h)))
            .collect();

        let rows = reader
            .into_byte_records()
            .enumerate()
            .filter_map(move |(idx, result)| {
                let record = match result {
                    Ok(record) => record,
                    Err(e) => return Some(Err(ImportError::from(e))),
                };

                // 行号取记录在原文件中的起始行（csv 会跳过纯空行）
                let row_number = record
                    .position()
                    .map(|p| p.line() as usize)
                    .unwrap_or(idx + 2);
                let row = Self::decode_record(&headers, &record, row_number);

                // 跳过完全空白的行
                (!row.is_blank()).then_some(Ok(row))
            });

        Ok(Box::new(rows))
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl ExcelParser {
    /// 单元格 → 字符串；日期单元格输出电子表格序列号，交给清洗阶段换算
    fn cell_to_string(cell: &Data) -> String {
        match cell {
            Data::Empty => String::new(),
            Data::String(s) => s.clone(),
            Data::Float(f) => f.to_string(),
            Data::Int(i) => i.to_string(),
            Data::DateTime(dt) => dt.as_f64().to_string(),
            Data::DateTimeIso(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// 工作表行迭代器
///
/// range 只覆盖有数据的区域，首行未必是工作表第 1 行；
/// 行号按 range 起始行换算回工作表行号
struct SheetRows {
    range: Range<Data>,
    headers: Vec<String>,
    next: usize,      // range 内相对行号
    first_row: usize, // range 首行在工作表中的行号（1 起）
}

impl SheetRows {
    fn new(range: Range<Data>) -> Self {
        let headers = range
            .rows()
            .next()
            .map(|header_row| {
                header_row
                    .iter()
                    .map(|cell| clean_header(&ExcelParser::cell_to_string(cell)))
                    .collect()
            })
            .unwrap_or_default();
        let first_row = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);

        Self {
            range,
            headers,
            next: 1, // 跳过表头
            first_row,
        }
    }
}

impl Iterator for SheetRows {
    type Item = ImportResult<ImportRow>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < self.range.height() {
            let idx = self.next;
            self.next += 1;

            let values = (0..self.range.width()).map(|col| {
                self.range
                    .get((idx, col))
                    .map(ExcelParser::cell_to_string)
                    .unwrap_or_default()
            });
            let row = ImportRow::new(
                self.first_row + idx,
                zip_with_headers(&self.headers, values),
            );

            if !row.is_blank() {
                return Some(Ok(row));
            }
        }
        None
    }
}

impl FileParser for ExcelParser {
    fn open_rows(&self, file_path: &Path) -> ImportResult<RowStream> {
        ensure_exists(file_path)?;

        let ext = lowercase_extension(file_path).unwrap_or_default();
        if !SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;

        // 读取第一个 sheet
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("工作簿无工作表".to_string()))?;
        let range = workbook.worksheet_range(&sheet_name)?;

        Ok(Box::new(SheetRows::new(range)))
    }
}

// ==========================================
// JSON Parser 实现
// ==========================================
// 格式: 顶层为对象数组，每个对象一行
pub struct JsonParser;

impl JsonParser {
    fn value_to_string(value: &Value) -> String {
        match value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl FileParser for JsonParser {
    fn open_rows(&self, file_path: &Path) -> ImportResult<RowStream> {
        ensure_exists(file_path)?;

        if let Some(ext) = lowercase_extension(file_path) {
            if ext != "json" {
                return Err(ImportError::UnsupportedFormat(ext));
            }
        }

        let content = std::fs::read_to_string(file_path)?;
        if content.trim().is_empty() {
            return Ok(Box::new(std::iter::empty::<ImportResult<ImportRow>>()));
        }
        let records: Vec<serde_json::Map<String, Value>> = serde_json::from_str(&content)?;

        let rows = records
            .into_iter()
            .enumerate()
            .map(|(idx, object)| {
                let fields = object
                    .iter()
                    .map(|(key, value)| {
                        (clean_header(key), Self::value_to_string(value).trim().to_string())
                    })
                    .collect();
                ImportRow::from_data_index(idx, fields)
            })
            .filter(|row| !row.is_blank())
            .map(Ok::<_, ImportError>);

        Ok(Box::new(rows))
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl FileParser for UniversalFileParser {
    fn open_rows(&self, file_path: &Path) -> ImportResult<RowStream> {
        let ext = lowercase_extension(file_path).unwrap_or_default();

        match ext.as_str() {
            "csv" => CsvParser.open_rows(file_path),
            "json" => JsonParser.open_rows(file_path),
            e if SPREADSHEET_EXTENSIONS.contains(&e) => ExcelParser.open_rows(file_path),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}
