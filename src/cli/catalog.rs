use std::path::Path;

use comfy_table::{Cell, Table};

use crate::catalog::load_catalog;
use crate::error::Result;
use crate::settings::load_settings;

pub fn run(file: &Path) -> Result<()> {
    let settings = load_settings();
    let catalog = load_catalog(file, &settings.generic_marker);

    if catalog.is_empty() {
        println!("No categories found in {}.", file.display());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Reference entry", "Resolves to"]);
    for (key, target) in catalog.mappings() {
        table.add_row(vec![Cell::new(key), Cell::new(target)]);
    }
    println!("Category map ({} entries)\n{table}", catalog.mappings().len());

    println!();
    println!(
        "Extracted categories ({}):",
        catalog.extracted_categories().len()
    );
    for category in catalog.extracted_categories() {
        println!("  {category}");
    }
    Ok(())
}
