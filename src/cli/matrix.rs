use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::{open_store, resolve_client};
use crate::error::Result;
use crate::fmt::thousands;
use crate::matrix::{build_matrix, SalesMatrix, Trend};
use crate::store::{RecordStore, SaleFilter, SqliteStore};

pub(crate) fn load_matrix(store: &SqliteStore, client_id: i64, year: i32) -> Result<SalesMatrix> {
    let sales = store.query_sales(&SaleFilter::for_year(client_id, year))?;
    Ok(build_matrix(sales.iter().map(|s| &s.record)))
}

fn trend_cell(value: i64, trend: Trend) -> Cell {
    let text = thousands(value);
    let styled = match trend {
        Trend::Increased => text.green().to_string(),
        Trend::Decreased => text.yellow().to_string(),
        Trend::DroppedToZero => text.red().bold().to_string(),
        Trend::Unchanged => text,
    };
    Cell::new(styled).set_alignment(CellAlignment::Right)
}

fn render(matrix: &SalesMatrix) -> Table {
    let mut table = Table::new();
    let mut header = vec!["Code".to_string(), "Product".to_string()];
    header.extend(matrix.periods.iter().map(|p| p.to_string()));
    header.push("Total".to_string());
    table.set_header(header);

    for row in &matrix.rows {
        let mut cells = vec![Cell::new(&row.product_code), Cell::new(&row.product_name)];
        for (period, value) in matrix.periods.iter().zip(&row.quantities) {
            cells.push(trend_cell(*value, matrix.cell_trend(row, *period)));
        }
        cells.push(Cell::new(thousands(row.total())).set_alignment(CellAlignment::Right));
        table.add_row(cells);
    }

    let mut totals = vec![Cell::new(""), Cell::new("TOTAL".bold())];
    let mut grand = 0;
    for (_, total) in matrix.period_totals() {
        grand = total.saturating_add(grand);
        totals.push(Cell::new(thousands(total)).set_alignment(CellAlignment::Right));
    }
    totals.push(Cell::new(thousands(grand)).set_alignment(CellAlignment::Right));
    table.add_row(totals);
    table
}

pub(crate) fn write_csv(matrix: &SalesMatrix, path: &str) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().delimiter(b';').from_path(path)?;
    let mut header = vec!["code".to_string(), "product".to_string()];
    header.extend(matrix.periods.iter().map(|p| p.to_string()));
    header.push("total".to_string());
    writer.write_record(&header)?;
    for row in &matrix.rows {
        let mut record = vec![row.product_code.clone(), row.product_name.clone()];
        record.extend(row.quantities.iter().map(|q| q.to_string()));
        record.push(row.total().to_string());
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn run(
    client: Option<String>,
    year: i32,
    filter: Option<&str>,
    favorites: bool,
    csv_out: Option<&str>,
) -> Result<()> {
    let store = open_store()?;
    let client = resolve_client(&store, client)?;
    let mut matrix = load_matrix(&store, client.id, year)?;

    if favorites {
        matrix = matrix.favorites(&store.favorites(client.id)?);
    }
    if let Some(text) = filter {
        matrix = matrix.filter(text);
    }

    if let Some(path) = csv_out {
        write_csv(&matrix, path)?;
        println!("Wrote {} products to {path}", matrix.rows.len());
        return Ok(());
    }

    if matrix.is_empty() {
        println!("No sales for {} in {year}.", client.name);
        return Ok(());
    }
    println!("{} {year}\n{}", client.name, render(&matrix));
    Ok(())
}
