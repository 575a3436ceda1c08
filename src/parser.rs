use csv::{ReaderBuilder, StringRecord, Trim};

use crate::columns::{resolve_columns, ColumnMap};
use crate::error::Result;
use crate::models::SaleRecord;
use crate::normalize::{parse_quantity, parse_value};
use crate::period::{resolve_period, Period};

/// Result of parsing one file. `period` is `None` only for files with no
/// non-blank lines.
#[derive(Debug, Clone, Default)]
pub struct ParsedFile {
    pub records: Vec<SaleRecord>,
    pub period: Option<Period>,
    pub skipped_rows: usize,
}

/// Sales exports come out of legacy Windows tools as ISO-8859-1.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn sniff_delimiter(header_line: &str) -> u8 {
    if header_line.contains(';') {
        b';'
    } else {
        b','
    }
}

fn line_reader(delimiter: u8) -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .delimiter(delimiter);
    builder
}

/// Each line goes through its own reader so a stray quote cannot swallow the
/// rows after it.
fn split_line(builder: &ReaderBuilder, line: &str) -> Option<StringRecord> {
    builder.from_reader(line.as_bytes()).records().next()?.ok()
}

struct FileLayout<'a> {
    period: Period,
    columns: ColumnMap,
    builder: ReaderBuilder,
    rows: Vec<&'a str>,
}

fn read_layout<'a>(content: &'a str, filename: &str) -> Result<Option<FileLayout<'a>>> {
    let mut lines = content.lines().filter(|l| !l.trim().is_empty());
    let Some(header_line) = lines.next() else {
        return Ok(None);
    };
    let period = resolve_period(filename);
    let builder = line_reader(sniff_delimiter(header_line));
    let header = split_line(&builder, header_line).unwrap_or_default();
    let headers: Vec<&str> = header.iter().collect();
    let columns = resolve_columns(&headers)?;
    Ok(Some(FileLayout {
        period,
        columns,
        builder,
        rows: lines.collect(),
    }))
}

/// Cheap pre-check used before an import is confirmed: resolves the period
/// and validates the header without reading any data row.
pub fn prescan(content: &str, filename: &str) -> Result<Option<Period>> {
    Ok(read_layout(content, filename)?.map(|layout| layout.period))
}

fn parse_row(record: &StringRecord, columns: &ColumnMap, period: Period) -> Option<SaleRecord> {
    if record.len() <= columns.quantity {
        return None;
    }
    let field = |idx: Option<usize>| {
        idx.and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };
    let code = field(columns.code).or_else(|| field(columns.name))?;
    if code.eq_ignore_ascii_case("nan") {
        return None;
    }
    let name = field(columns.name).unwrap_or(code);

    let quantity = parse_quantity(&record[columns.quantity]);
    if quantity <= 0 {
        return None;
    }
    let value = field(columns.value).map(parse_value).unwrap_or(0.0).max(0.0);

    Some(SaleRecord {
        product_code: code.to_string(),
        product_name: name.to_string(),
        quantity,
        value,
        period,
    })
}

pub fn parse(content: &str, filename: &str) -> Result<ParsedFile> {
    let Some(layout) = read_layout(content, filename)? else {
        return Ok(ParsedFile::default());
    };

    let mut parsed = ParsedFile {
        records: Vec::with_capacity(layout.rows.len()),
        period: Some(layout.period),
        skipped_rows: 0,
    };
    for line in &layout.rows {
        let row = split_line(&layout.builder, line)
            .and_then(|record| parse_row(&record, &layout.columns, layout.period));
        match row {
            Some(record) => parsed.records.push(record),
            None => parsed.skipped_rows += 1,
        }
    }

    tracing::debug!(
        filename,
        period = %layout.period,
        records = parsed.records.len(),
        skipped = parsed.skipped_rows,
        "parsed sales file"
    );
    Ok(parsed)
}
