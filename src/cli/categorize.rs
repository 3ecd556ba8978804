use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::categorizer::{
    categorize, CategorizeStats, CONFIDENCE_COLUMN, CORRECTED_COLUMN, METHOD_COLUMN,
};
use crate::cli::CategorizeArgs;
use crate::consolidator::consolidate;
use crate::error::Result;
use crate::exporter::{default_output_path, write_table};
use crate::fmt::percent;
use crate::importer::read_table;
use crate::rules::load_rules;
use crate::settings::load_settings;

pub fn run(args: CategorizeArgs) -> Result<()> {
    let settings = load_settings();
    let mut options = settings.categorize_options();
    if let Some(column) = args.description_column {
        options.description_column = column;
    }
    if let Some(column) = args.category_column {
        options.category_column = column;
    }
    if let Some(threshold) = args.confidence_threshold {
        options.confidence_threshold = threshold;
    }
    if args.reference_file.is_some() {
        options.reference_file = args.reference_file;
    }

    let rules_path = args.rules_file.or_else(|| settings.rules_path());
    let rules = load_rules(rules_path.as_deref())?;

    let input = read_table(&args.file)?;
    tracing::info!(path = %args.file.display(), rows = input.len(), "read input");
    if input.is_empty() {
        tracing::warn!(path = %args.file.display(), "input has no data rows");
    }

    let outcome = categorize(&input, &options, &rules)?;
    let mut output = outcome.table;

    if args.consolidate {
        let consolidation = consolidate(&output, CORRECTED_COLUMN)?;
        let changed = consolidation.apply_to_column(&mut output, CORRECTED_COLUMN)?;
        println!(
            "{} categories merged into principal ones ({changed} rows changed)",
            consolidation.len()
        );
    }
    if args.strip_diagnostics {
        output.drop_column(METHOD_COLUMN);
        output.drop_column(CONFIDENCE_COLUMN);
    }

    let output_path = args
        .output_file
        .unwrap_or_else(|| default_output_path(&args.file));
    write_table(&output, &output_path)?;

    print_stats(&outcome.stats, input.len());
    println!(
        "{} {} rows to {}",
        "Wrote".green().bold(),
        output.len(),
        output_path.display()
    );
    Ok(())
}

fn print_stats(stats: &CategorizeStats, rows: usize) {
    println!("{rows} rows, {} needed a category", stats.total_unresolved);
    if stats.total_unresolved == 0 && stats.catalog_mapped() == 0 {
        return;
    }

    let total = stats.total_unresolved;
    let mut table = Table::new();
    table.set_header(vec!["Method", "Rows", "Share"]);
    let lines = [
        ("Rules", stats.rules),
        ("Similarity", stats.similarity),
        ("Aggressive rules", stats.aggressive_rules),
        ("Most common", stats.most_common),
        ("Reference default", stats.reference_default),
        ("Default category", stats.no_match),
    ];
    for (label, count) in lines.iter().filter(|(_, count)| *count > 0) {
        table.add_row(vec![
            Cell::new(label),
            Cell::new(count).set_alignment(CellAlignment::Right),
            Cell::new(percent(*count, total)).set_alignment(CellAlignment::Right),
        ]);
    }
    if stats.catalog_mapped() > 0 {
        table.add_row(vec![
            Cell::new("Reference map"),
            Cell::new(stats.catalog_mapped()).set_alignment(CellAlignment::Right),
            Cell::new("-").set_alignment(CellAlignment::Right),
        ]);
    }
    println!("{table}");

    if stats.resolved_by_fallback() > 0 {
        println!(
            "{}",
            format!(
                "{} rows fell back to a default category",
                stats.resolved_by_fallback()
            )
            .yellow()
        );
    }
    if stats.scrubbed > 0 {
        println!("{} leftover catch-all values replaced", stats.scrubbed);
    }
}
