use std::path::Path;

use comfy_table::{Cell, Table};

use crate::consolidator::consolidate;
use crate::error::Result;
use crate::importer::read_table;
use crate::settings::load_settings;

pub fn run(file: &Path, category_column: Option<&str>) -> Result<()> {
    let settings = load_settings();
    let column = category_column.unwrap_or(&settings.category_column);
    let input = read_table(file)?;
    let consolidation = consolidate(&input, column)?;

    println!("Principal categories: {}", consolidation.principals().join(", "));
    if consolidation.is_empty() {
        println!("Nothing to consolidate.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Category", "Merged into"]);
    for (category, target) in consolidation.mappings() {
        table.add_row(vec![Cell::new(category), Cell::new(target)]);
    }
    println!("{table}");
    Ok(())
}
