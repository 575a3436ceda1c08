use crate::error::{Result, SalesError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Code,
    Name,
    Quantity,
    Value,
}

/// Header keywords in priority order. Matching is case-insensitive substring
/// containment against each header cell.
pub const KEYWORDS: &[(&str, Field)] = &[
    // Code
    ("código", Field::Code),
    ("codigo", Field::Code),
    ("cod", Field::Code),
    ("code", Field::Code),
    ("referência", Field::Code),
    ("referencia", Field::Code),
    ("reference", Field::Code),
    ("ref", Field::Code),
    ("item", Field::Code),
    ("produto", Field::Code),
    ("product", Field::Code),
    // Name
    ("descrição", Field::Name),
    ("descricao", Field::Name),
    ("descri", Field::Name),
    ("description", Field::Name),
    ("desc", Field::Name),
    ("nome", Field::Name),
    ("name", Field::Name),
    // Quantity
    ("qtd", Field::Quantity),
    ("qty", Field::Quantity),
    ("quant", Field::Quantity),
    ("quantidade", Field::Quantity),
    ("quantity", Field::Quantity),
    // Value
    ("total venda", Field::Value),
    ("total sale", Field::Value),
    ("valor total", Field::Value),
    ("total value", Field::Value),
    ("total", Field::Value),
    ("valor", Field::Value),
    ("value", Field::Value),
    ("vl", Field::Value),
];

/// Column positions of one file. A resolved map always has a quantity column
/// and at least one of code/name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub code: Option<usize>,
    pub name: Option<usize>,
    pub quantity: usize,
    pub value: Option<usize>,
}

/// Index of the header cell for `field`. Keywords are tried in priority order
/// and each keyword scans the whole row before the next one is tried.
/// `headers` must already be lowercased.
pub fn find_column(headers: &[String], field: Field) -> Option<usize> {
    KEYWORDS
        .iter()
        .filter(|(_, f)| *f == field)
        .find_map(|(keyword, _)| headers.iter().position(|h| h.contains(keyword)))
}

pub fn resolve_columns<S: AsRef<str>>(headers: &[S]) -> Result<ColumnMap> {
    let lowered: Vec<String> = headers
        .iter()
        .map(|h| h.as_ref().trim().to_lowercase())
        .collect();

    let code = find_column(&lowered, Field::Code);
    let name = find_column(&lowered, Field::Name);
    let quantity = find_column(&lowered, Field::Quantity);
    let value = find_column(&lowered, Field::Value);

    match quantity {
        Some(quantity) if code.is_some() || name.is_some() => Ok(ColumnMap {
            code,
            name,
            quantity,
            value,
        }),
        _ => Err(SalesError::UnparseableHeader(
            headers
                .iter()
                .map(|h| h.as_ref().trim())
                .collect::<Vec<_>>()
                .join(" | "),
        )),
    }
}
