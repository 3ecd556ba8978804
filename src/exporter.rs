use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::importer::{file_extension, is_spreadsheet};
use crate::models::Table;

/// `<stem>_categorized.<ext>` next to the input. Spreadsheets always come
/// back as `.xlsx` since that is the only workbook format written.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    let ext = if is_spreadsheet(input) { "xlsx".to_string() } else { file_extension(input) };
    let name = if ext.is_empty() {
        format!("{stem}_categorized")
    } else {
        format!("{stem}_categorized.{ext}")
    };
    input.with_file_name(name)
}

/// Write CSV when the path ends in `.csv`, otherwise an xlsx workbook.
pub fn write_table(table: &Table, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    if file_extension(path) == "csv" {
        write_csv(table, path)
    } else {
        write_xlsx(table, path)
    }
}

fn write_csv(table: &Table, path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(&table.headers)?;
    for row in &table.rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(feature = "xlsx")]
fn write_xlsx(table: &Table, path: &Path) -> Result<()> {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, header) in table.headers.iter().enumerate() {
        sheet.write_string(0, col as u16, header.as_str())?;
    }
    for (r, row) in table.rows.iter().enumerate() {
        let r = (r + 1) as u32;
        for (col, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            // Text cells only: "007" and "3.10" must read back unchanged.
            sheet.write_string(r, col as u16, value.as_str())?;
        }
    }
    workbook.save(path)?;
    Ok(())
}

#[cfg(not(feature = "xlsx"))]
fn write_xlsx(_table: &Table, path: &Path) -> Result<()> {
    Err(crate::error::ProdcatError::UnsupportedFormat(format!(
        "{} (built without spreadsheet support)",
        path.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("/data/sales.csv")),
            PathBuf::from("/data/sales_categorized.csv")
        );
        assert_eq!(
            default_output_path(Path::new("/data/sales.xls")),
            PathBuf::from("/data/sales_categorized.xlsx")
        );
        assert_eq!(
            default_output_path(Path::new("report")),
            PathBuf::from("report_categorized")
        );
    }

    #[test]
    fn test_write_csv_quotes_commas() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("sales.csv");
        let table = Table::new(
            vec!["desc".into(), "cat".into()],
            vec![vec!["Batom, matte".into(), "Makeup".into()]],
        );
        write_table(&table, &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "desc,cat\n\"Batom, matte\",Makeup\n");
    }

    #[test]
    fn test_csv_roundtrip_keeps_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.csv");
        let table = Table::new(
            vec!["a".into(), "b".into()],
            vec![vec!["x\"y".into(), String::new()]],
        );
        write_table(&table, &path).unwrap();
        let read = crate::importer::read_table(&path).unwrap();
        assert_eq!(read, table);
    }

    #[cfg(feature = "xlsx")]
    #[test]
    fn test_xlsx_keeps_number_like_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.xlsx");
        let table = Table::new(
            vec!["code".into(), "year".into()],
            vec![vec!["007".into(), "2024".into()], vec!["3.10".into(), "x".into()]],
        );
        write_table(&table, &path).unwrap();
        let read = crate::importer::read_table(&path).unwrap();
        assert_eq!(read, table);
    }
}
