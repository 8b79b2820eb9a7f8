//! Statement text

use fsbackfill_core::TableSpec;

/// Quote an identifier, doubling any embedded quote
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `INSERT ... ON CONFLICT (<conflict>) DO NOTHING` with one `$n`
/// placeholder per column
pub fn upsert_statement(table: &TableSpec) -> String {
    let columns = table
        .columns
        .iter()
        .map(|c| quote_ident(&c.name))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=table.columns.len())
        .map(|i| format!("${i}"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT ({}) DO NOTHING",
        quote_ident(&table.name),
        columns,
        placeholders,
        quote_ident(&table.conflict_column)
    )
}
