use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::matrix::load_matrix;
use crate::cli::{open_store, resolve_client};
use crate::error::Result;
use crate::fmt::thousands;
use crate::matrix::{Mover, ProductMatrixRow, SalesMatrix};
use crate::period::Period;

fn ranking(title: &str, matrix: &SalesMatrix, rows: &[&ProductMatrixRow], period: Period) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Code", "Product", "Qty"]);
    for row in rows {
        table.add_row(vec![
            Cell::new(&row.product_code),
            Cell::new(&row.product_name),
            Cell::new(thousands(matrix.quantity(row, period))),
        ]);
    }
    format!("{title}\n{table}")
}

fn movers(title: &str, movers: &[Mover<'_>]) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Code", "Product", "Change"]);
    for m in movers {
        let delta = if m.delta > 0 {
            format!("+{}", thousands(m.delta)).green().to_string()
        } else {
            thousands(m.delta).red().to_string()
        };
        table.add_row(vec![
            Cell::new(&m.row.product_code),
            Cell::new(&m.row.product_name),
            Cell::new(delta),
        ]);
    }
    format!("{title}\n{table}")
}

pub fn run(client: Option<String>, year: i32, period: &str, limit: usize) -> Result<()> {
    let period: Period = period.parse()?;
    let store = open_store()?;
    let client = resolve_client(&store, client)?;
    let matrix = load_matrix(&store, client.id, year)?;

    let summary = matrix.period_summary(period);
    println!("{} {year}, {period}", client.name.bold());
    println!("Total quantity:   {}", thousands(summary.total));
    println!("Products sold:    {}", summary.products_sold);
    println!("Average/product:  {}", thousands(summary.average));
    if summary.products_sold == 0 {
        return Ok(());
    }

    println!();
    println!("{}", ranking("Top sellers", &matrix, &matrix.top_n(period, limit), period));
    println!("{}", ranking("Bottom sellers", &matrix, &matrix.bottom_n(period, limit), period));

    let risers = matrix.risers(period, limit);
    let fallers = matrix.fallers(period, limit);
    if !risers.is_empty() {
        println!("{}", movers("Biggest increases", &risers));
    }
    if !fallers.is_empty() {
        println!("{}", movers("Biggest drops", &fallers));
    }
    Ok(())
}
