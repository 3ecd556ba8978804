use std::path::PathBuf;

use comfy_table::{Cell, CellAlignment, Table};

use crate::error::Result;
use crate::fmt::truncate;
use crate::rules::load_rules;
use crate::settings::load_settings;

pub fn list(rules_file: Option<PathBuf>) -> Result<()> {
    let path = rules_file.or_else(|| load_settings().rules_path());
    let rules = load_rules(path.as_deref())?;
    if rules.is_empty() {
        match &path {
            Some(p) => println!("No rules defined in {}.", p.display()),
            None => println!("No rules defined."),
        }
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Category", "Keywords", "Examples"]);
    for rule in rules.rules() {
        table.add_row(vec![
            Cell::new(&rule.category),
            Cell::new(rule.keywords.len()).set_alignment(CellAlignment::Right),
            Cell::new(truncate(&rule.keywords.join(", "), 60)),
        ]);
    }
    match &path {
        Some(p) => println!("Rules from {}\n{table}", p.display()),
        None => println!("Built-in rules\n{table}"),
    }
    Ok(())
}
