pub mod catalog;
pub mod categorize;
pub mod config;
pub mod consolidate;
pub mod rules;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "prodcat",
    version,
    about = "Fill in missing and catch-all product categories in sales exports."
)]
pub struct Cli {
    /// Log progress to stderr (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Correct the category column of a CSV or spreadsheet file.
    Categorize(CategorizeArgs),
    /// Show how a reference category file is interpreted.
    Catalog {
        /// Reference file (.csv, .xlsx, .xls, .ods, .md or .txt)
        file: PathBuf,
    },
    /// Show how low-frequency categories would be merged into frequent ones.
    Consolidate {
        /// CSV or spreadsheet file
        file: PathBuf,
        /// Column holding the categories (default: from settings)
        #[arg(long = "category-column")]
        category_column: Option<String>,
    },
    /// List the active keyword rules.
    Rules {
        /// JSON rules file (default: from settings, else built-in rules)
        #[arg(long = "rules-file")]
        rules_file: Option<PathBuf>,
    },
    /// Show the effective settings.
    Config {
        /// Write the default settings file if none exists
        #[arg(long)]
        init: bool,
    },
}

#[derive(Args)]
pub struct CategorizeArgs {
    /// CSV or spreadsheet file to categorize
    pub file: PathBuf,
    /// Column with the product description (default: from settings)
    #[arg(long = "description-column")]
    pub description_column: Option<String>,
    /// Column with the product category (default: from settings)
    #[arg(long = "category-column")]
    pub category_column: Option<String>,
    /// Minimum similarity confidence, between 0 and 1
    #[arg(long = "confidence-threshold", value_parser = parse_threshold)]
    pub confidence_threshold: Option<f64>,
    /// Reference category file
    #[arg(long = "reference-file")]
    pub reference_file: Option<PathBuf>,
    /// Output path (default: <input>_categorized.<ext>)
    #[arg(long = "output-file")]
    pub output_file: Option<PathBuf>,
    /// JSON rules file replacing the built-in rules
    #[arg(long = "rules-file")]
    pub rules_file: Option<PathBuf>,
    /// Merge rare corrected categories into frequent ones
    #[arg(long)]
    pub consolidate: bool,
    /// Leave out the method and confidence columns
    #[arg(long = "strip-diagnostics")]
    pub strip_diagnostics: bool,
}

fn parse_threshold(value: &str) -> std::result::Result<f64, String> {
    let threshold: f64 = value.parse().map_err(|_| format!("'{value}' is not a number"))?;
    if (0.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(format!("{threshold} is outside 0..=1"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_threshold() {
        assert_eq!(parse_threshold("0.4"), Ok(0.4));
        assert_eq!(parse_threshold("1"), Ok(1.0));
        assert!(parse_threshold("1.5").is_err());
        assert!(parse_threshold("high").is_err());
    }

    #[test]
    fn test_cli_parses_categorize_flags() {
        let cli = Cli::try_parse_from([
            "prodcat",
            "-v",
            "categorize",
            "sales.csv",
            "--category-column",
            "Categoria",
            "--confidence-threshold",
            "0.6",
            "--consolidate",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Categorize(args) => {
                assert_eq!(args.file, PathBuf::from("sales.csv"));
                assert_eq!(args.category_column.as_deref(), Some("Categoria"));
                assert_eq!(args.confidence_threshold, Some(0.6));
                assert!(args.consolidate);
                assert!(!args.strip_diagnostics);
            }
            _ => panic!("expected categorize"),
        }
    }
}
