use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SALES: &str = "Order,Product description,Product category
1,Batom matte vermelho,Makeup
2,Shampoo anticaspa,Hair
3,Red lipstick matte,Other
4,,
";

fn prodcat(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("prodcat").unwrap();
    cmd.env("HOME", home.path()).env_remove("RUST_LOG");
    cmd
}

fn column(path: &Path, name: &str) -> Vec<String> {
    let mut rdr = csv::Reader::from_path(path).unwrap();
    let idx = rdr.headers().unwrap().iter().position(|h| h == name).unwrap();
    rdr.records()
        .map(|r| r.unwrap().get(idx).unwrap().to_string())
        .collect()
}

fn headers(path: &Path) -> Vec<String> {
    let mut rdr = csv::Reader::from_path(path).unwrap();
    rdr.headers().unwrap().iter().map(String::from).collect()
}

#[test]
fn categorize_writes_default_output_path() {
    let home = TempDir::new().unwrap();
    let input = home.path().join("sales.csv");
    std::fs::write(&input, SALES).unwrap();

    prodcat(&home)
        .arg("categorize")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 needed a category"))
        .stdout(predicate::str::contains("Wrote"));

    let output = home.path().join("sales_categorized.csv");
    assert_eq!(
        column(&output, "category_corrected"),
        vec!["Makeup", "Hair", "Makeup", "Makeup"]
    );
    assert_eq!(
        column(&output, "classification_method"),
        vec!["", "", "rules", "most-common"]
    );
    assert_eq!(
        column(&output, "Product category"),
        vec!["Makeup", "Hair", "Other", ""]
    );
}

#[test]
fn categorize_honors_output_and_reference_flags() {
    let home = TempDir::new().unwrap();
    let input = home.path().join("sales.csv");
    let reference = home.path().join("categories.md");
    let output = home.path().join("out").join("fixed.csv");
    std::fs::write(&input, "Product description,Product category\nxyz,Other\n").unwrap();
    std::fs::write(&reference, "Other > Lipstick > Makeup\nMakeup > Blush > Other\n").unwrap();

    prodcat(&home)
        .arg("categorize")
        .arg(&input)
        .arg("--reference-file")
        .arg(&reference)
        .arg("--output-file")
        .arg(&output)
        .arg("--strip-diagnostics")
        .assert()
        .success();

    assert_eq!(column(&output, "category_corrected"), vec!["Lipstick"]);
    assert_eq!(
        headers(&output),
        vec!["Product description", "Product category", "category_corrected"]
    );
}

#[test]
fn categorize_with_consolidation() {
    let home = TempDir::new().unwrap();
    let input = home.path().join("sales.csv");
    let rules = home.path().join("rules.json");
    let output = home.path().join("out.csv");
    std::fs::write(
        &input,
        "Product description,Product category
a,Makeup
b,Makeup
c,Makeup
gloss labial rosa,Other
",
    )
    .unwrap();
    std::fs::write(&rules, r#"[{"category": "Gloss Labial", "keywords": ["gloss"]}]"#).unwrap();

    prodcat(&home)
        .arg("categorize")
        .arg(&input)
        .arg("--rules-file")
        .arg(&rules)
        .arg("--output-file")
        .arg(&output)
        .arg("--consolidate")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 categories merged"));

    assert_eq!(
        column(&output, "category_corrected"),
        vec!["Makeup", "Makeup", "Makeup", "Makeup"]
    );
    assert_eq!(column(&output, "classification_method")[3], "rules");
}

#[test]
fn categorize_reads_columns_from_settings() {
    let home = TempDir::new().unwrap();
    let config = home.path().join(".config").join("prodcat");
    std::fs::create_dir_all(&config).unwrap();
    std::fs::write(
        config.join("settings.json"),
        r#"{"description_column": "Descricao", "category_column": "Categoria", "generic_marker": "Outros"}"#,
    )
    .unwrap();
    let input = home.path().join("vendas.csv");
    std::fs::write(&input, "Descricao,Categoria\nEsmalte vermelho,Outros\n").unwrap();

    prodcat(&home).arg("categorize").arg(&input).assert().success();

    let output = home.path().join("vendas_categorized.csv");
    assert_eq!(column(&output, "category_corrected"), vec!["Nails"]);
}

#[test]
fn missing_column_fails() {
    let home = TempDir::new().unwrap();
    let input = home.path().join("sales.csv");
    std::fs::write(&input, "Name,Category\nx,y\n").unwrap();

    prodcat(&home)
        .arg("categorize")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Error: Column 'Product description' not found",
        ));
    assert!(!home.path().join("sales_categorized.csv").exists());
}

#[test]
fn unsupported_input_fails() {
    let home = TempDir::new().unwrap();
    let input = home.path().join("sales.json");
    std::fs::write(&input, "[]").unwrap();

    prodcat(&home)
        .arg("categorize")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported file format"));
}

#[test]
fn invalid_threshold_is_rejected() {
    let home = TempDir::new().unwrap();
    prodcat(&home)
        .args(["categorize", "sales.csv", "--confidence-threshold", "2"])
        .assert()
        .failure();
}

#[test]
fn catalog_prints_map() {
    let home = TempDir::new().unwrap();
    let reference = home.path().join("categories.txt");
    std::fs::write(&reference, "Other > Lipstick > Makeup\nHair Other\n").unwrap();

    prodcat(&home)
        .arg("catalog")
        .arg(&reference)
        .assert()
        .success()
        .stdout(predicate::str::contains("other > lipstick > makeup"))
        .stdout(predicate::str::contains("Extracted categories (2)"))
        .stdout(predicate::str::contains("Hair"));
}

#[test]
fn consolidate_prints_mapping() {
    let home = TempDir::new().unwrap();
    let input = home.path().join("sales.csv");
    std::fs::write(
        &input,
        "Product description,Product category
a,Makeup
b,Makeup
c,Makeup
d,Shampoo Kids
",
    )
    .unwrap();

    prodcat(&home)
        .arg("consolidate")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Principal categories: Makeup"))
        .stdout(predicate::str::contains("Shampoo Kids"));
}

#[test]
fn rules_lists_built_in_set() {
    let home = TempDir::new().unwrap();
    prodcat(&home)
        .arg("rules")
        .assert()
        .success()
        .stdout(predicate::str::contains("Built-in rules"))
        .stdout(predicate::str::contains("Personal Care"));
}

#[test]
fn rules_rejects_malformed_file() {
    let home = TempDir::new().unwrap();
    let rules = home.path().join("rules.json");
    std::fs::write(&rules, "{").unwrap();
    prodcat(&home)
        .arg("rules")
        .arg("--rules-file")
        .arg(&rules)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Rules error"));
}

#[test]
fn config_init_writes_defaults() {
    let home = TempDir::new().unwrap();
    prodcat(&home)
        .args(["config", "--init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote default settings"))
        .stdout(predicate::str::contains("Product description"));
    assert!(home
        .path()
        .join(".config")
        .join("prodcat")
        .join("settings.json")
        .exists());

    prodcat(&home)
        .args(["config", "--init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn config_survives_corrupt_settings_file() {
    let home = TempDir::new().unwrap();
    let config = home.path().join(".config").join("prodcat");
    std::fs::create_dir_all(&config).unwrap();
    std::fs::write(config.join("settings.json"), "{\"category_column\": ").unwrap();

    prodcat(&home)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("Product category"))
        .stderr(predicate::str::contains("ignoring unreadable settings file"));
}

#[test]
fn rules_reports_empty_file() {
    let home = TempDir::new().unwrap();
    let rules = home.path().join("rules.json");
    std::fs::write(&rules, "[]").unwrap();
    prodcat(&home)
        .arg("rules")
        .arg("--rules-file")
        .arg(&rules)
        .assert()
        .success()
        .stdout(predicate::str::contains("No rules defined"));
}

#[test]
fn categorize_skips_rules_naming_the_marker() {
    let home = TempDir::new().unwrap();
    let input = home.path().join("sales.csv");
    let rules = home.path().join("rules.json");
    let output = home.path().join("out.csv");
    std::fs::write(&input, "Product description,Product category\nmisc item,Other\nblank item,\n").unwrap();
    std::fs::write(
        &rules,
        r#"[{"category": "Other", "keywords": ["misc"]}, {"category": " ", "keywords": ["blank"]}]"#,
    )
    .unwrap();

    prodcat(&home)
        .arg("categorize")
        .arg(&input)
        .arg("--rules-file")
        .arg(&rules)
        .arg("--output-file")
        .arg(&output)
        .assert()
        .success();

    assert_eq!(column(&output, "category_corrected"), vec!["Makeup", "Makeup"]);
    assert_eq!(
        column(&output, "classification_method"),
        vec!["no-match", "most-common"]
    );
}

#[test]
fn categorize_keeps_cells_beyond_the_header() {
    let home = TempDir::new().unwrap();
    let input = home.path().join("sales.csv");
    std::fs::write(
        &input,
        "Product description,Product category\nBatom matte,Makeup,gift wrap\nShampoo,Hair\n",
    )
    .unwrap();

    prodcat(&home).arg("categorize").arg(&input).assert().success();

    let output = home.path().join("sales_categorized.csv");
    assert_eq!(&headers(&output)[..3], ["Product description", "Product category", ""]);
    assert_eq!(column(&output, ""), vec!["gift wrap", ""]);
    assert_eq!(column(&output, "category_corrected"), vec!["Makeup", "Hair"]);
}
