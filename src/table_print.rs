use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use crossterm::style::Stylize;

use sdms_cli::data::columns::ColumnSpec;
use sdms_cli::data::record::Record;

/// Print a record collection to stdout, for `--print` runs without the
/// full dashboard.
pub fn print_records(records: &[&Record], columns: &[ColumnSpec]) {
    if records.is_empty() {
        println!("{}", "No records found.".yellow());
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(
        columns
            .iter()
            .map(|col| Cell::new(&col.label).add_attribute(Attribute::Bold)),
    );

    for record in records {
        table.add_row(columns.iter().map(|col| {
            let value = record.get(&col.key);
            if value.is_null() {
                "-".to_string()
            } else {
                value.to_string()
            }
        }));
    }

    println!("{table}");
    println!("\n{}", format!("{} rows", records.len()).green());
}
