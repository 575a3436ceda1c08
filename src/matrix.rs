use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::models::SaleRecord;
use crate::period::Period;

#[derive(Debug, Clone, PartialEq)]
pub struct ProductMatrixRow {
    pub product_code: String,
    pub product_name: String,
    /// One cell per entry of `SalesMatrix::periods`, missing periods are 0.
    pub quantities: Vec<i64>,
}

impl ProductMatrixRow {
    pub fn total(&self) -> i64 {
        self.quantities.iter().fold(0, |acc, q| acc.saturating_add(*q))
    }
}

/// Product x period pivot of summed quantities. Rebuilt from stored records
/// every time it is needed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesMatrix {
    pub periods: Vec<Period>,
    pub rows: Vec<ProductMatrixRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Increased,
    Decreased,
    DroppedToZero,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mover<'a> {
    pub row: &'a ProductMatrixRow,
    pub delta: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PeriodSummary {
    pub total: i64,
    pub products_sold: usize,
    pub average: i64,
}

fn by_name(a: &ProductMatrixRow, b: &ProductMatrixRow) -> Ordering {
    a.product_name
        .to_lowercase()
        .cmp(&b.product_name.to_lowercase())
        .then_with(|| a.product_code.cmp(&b.product_code))
}

pub fn build_matrix<'a>(records: impl IntoIterator<Item = &'a SaleRecord>) -> SalesMatrix {
    let mut periods: BTreeSet<Period> = BTreeSet::new();
    let mut names: BTreeMap<&str, &str> = BTreeMap::new();
    let mut cells: BTreeMap<&str, BTreeMap<Period, i64>> = BTreeMap::new();

    for record in records {
        let code = record.product_code.as_str();
        periods.insert(record.period);
        let cell = cells.entry(code).or_default().entry(record.period).or_default();
        *cell = cell.saturating_add(record.quantity);
        let name = names.entry(code).or_insert(record.product_name.as_str());
        if *name == code {
            *name = record.product_name.as_str();
        }
    }

    let periods: Vec<Period> = periods.into_iter().collect();
    let mut rows: Vec<ProductMatrixRow> = cells
        .into_iter()
        .map(|(code, by_period)| ProductMatrixRow {
            product_code: code.to_string(),
            product_name: names.get(code).copied().unwrap_or(code).to_string(),
            quantities: periods
                .iter()
                .map(|p| by_period.get(p).copied().unwrap_or(0))
                .collect(),
        })
        .collect();
    rows.sort_by(by_name);
    SalesMatrix { periods, rows }
}

impl SalesMatrix {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn period_index(&self, period: Period) -> Option<usize> {
        self.periods.binary_search(&period).ok()
    }

    pub fn quantity(&self, row: &ProductMatrixRow, period: Period) -> i64 {
        self.period_index(period)
            .and_then(|i| row.quantities.get(i).copied())
            .unwrap_or(0)
    }

    fn previous_index(&self, period: Period) -> Option<(usize, usize)> {
        let idx = self.period_index(period)?;
        idx.checked_sub(1).map(|prev| (idx, prev))
    }

    fn sold_in(&self, period: Period) -> Vec<(&ProductMatrixRow, i64)> {
        let Some(idx) = self.period_index(period) else {
            return Vec::new();
        };
        self.rows
            .iter()
            .map(|row| (row, row.quantities[idx]))
            .filter(|(_, q)| *q > 0)
            .collect()
    }

    pub fn top_n(&self, period: Period, n: usize) -> Vec<&ProductMatrixRow> {
        let mut sold = self.sold_in(period);
        sold.sort_by(|(ra, qa), (rb, qb)| qb.cmp(qa).then_with(|| by_name(ra, rb)));
        sold.into_iter().take(n).map(|(row, _)| row).collect()
    }

    pub fn bottom_n(&self, period: Period, n: usize) -> Vec<&ProductMatrixRow> {
        let mut sold = self.sold_in(period);
        sold.sort_by(|(ra, qa), (rb, qb)| qa.cmp(qb).then_with(|| by_name(ra, rb)));
        sold.into_iter().take(n).map(|(row, _)| row).collect()
    }

    fn movers(&self, period: Period) -> Vec<Mover<'_>> {
        let Some((idx, prev)) = self.previous_index(period) else {
            return Vec::new();
        };
        self.rows
            .iter()
            .map(|row| Mover {
                row,
                delta: row.quantities[idx].saturating_sub(row.quantities[prev]),
            })
            .collect()
    }

    /// Largest increases against the previous period. Empty for the first period.
    pub fn risers(&self, period: Period, n: usize) -> Vec<Mover<'_>> {
        let mut movers: Vec<Mover<'_>> =
            self.movers(period).into_iter().filter(|m| m.delta > 0).collect();
        movers.sort_by(|a, b| b.delta.cmp(&a.delta).then_with(|| by_name(a.row, b.row)));
        movers.truncate(n);
        movers
    }

    pub fn fallers(&self, period: Period, n: usize) -> Vec<Mover<'_>> {
        let mut movers: Vec<Mover<'_>> =
            self.movers(period).into_iter().filter(|m| m.delta < 0).collect();
        movers.sort_by(|a, b| a.delta.cmp(&b.delta).then_with(|| by_name(a.row, b.row)));
        movers.truncate(n);
        movers
    }

    pub fn cell_trend(&self, row: &ProductMatrixRow, period: Period) -> Trend {
        let Some((idx, prev)) = self.previous_index(period) else {
            return Trend::Unchanged;
        };
        let (value, before) = (row.quantities[idx], row.quantities[prev]);
        if value > before {
            Trend::Increased
        } else if value > 0 && value < before {
            Trend::Decreased
        } else if value == 0 && before > 0 {
            Trend::DroppedToZero
        } else {
            Trend::Unchanged
        }
    }

    pub fn period_summary(&self, period: Period) -> PeriodSummary {
        let sold = self.sold_in(period);
        let total = sold.iter().fold(0i64, |acc, (_, q)| acc.saturating_add(*q));
        let products_sold = sold.len();
        let average = if products_sold == 0 {
            0
        } else {
            (total as f64 / products_sold as f64).round() as i64
        };
        PeriodSummary {
            total,
            products_sold,
            average,
        }
    }

    pub fn period_totals(&self) -> Vec<(Period, i64)> {
        self.periods
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let total = self
                    .rows
                    .iter()
                    .fold(0i64, |acc, r| acc.saturating_add(r.quantities[i]));
                (*p, total)
            })
            .collect()
    }

    fn retain(&self, keep: impl Fn(&ProductMatrixRow) -> bool) -> SalesMatrix {
        SalesMatrix {
            periods: self.periods.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// Rows whose name or code contains `text`, ignoring case.
    pub fn filter(&self, text: &str) -> SalesMatrix {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return self.clone();
        }
        self.retain(|r| {
            r.product_name.to_lowercase().contains(&needle)
                || r.product_code.to_lowercase().contains(&needle)
        })
    }

    pub fn favorites<S: AsRef<str>>(&self, codes: &[S]) -> SalesMatrix {
        self.retain(|r| codes.iter().any(|c| c.as_ref() == r.product_code))
    }
}
