use std::path::Path;

use crate::error::{ProdcatError, Result};
use crate::models::Table;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Lowercased extension without the dot, or an empty string.
pub fn file_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

pub fn is_spreadsheet(path: &Path) -> bool {
    matches!(file_extension(path).as_str(), "xlsx" | "xls" | "xlsm" | "ods")
}

#[cfg(feature = "xlsx")]
fn cell_to_string(cell: &calamine::Data) -> String {
    use calamine::Data;
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Full tables
// ---------------------------------------------------------------------------

/// Read a sales table: CSV by extension, or the first sheet of a workbook.
pub fn read_table(path: &Path) -> Result<Table> {
    match file_extension(path).as_str() {
        "csv" => read_csv_table(path),
        _ if is_spreadsheet(path) => read_spreadsheet_table(path),
        other => Err(ProdcatError::UnsupportedFormat(format!(".{other}"))),
    }
}

fn read_csv_table(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));
    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(String::from).collect());
    }
    Ok(Table::new(headers, rows))
}

#[cfg(feature = "xlsx")]
fn read_spreadsheet_table(path: &Path) -> Result<Table> {
    use calamine::Reader;

    let mut workbook = calamine::open_workbook_auto(path)
        .map_err(|e| ProdcatError::Spreadsheet(format!("Failed to open {}: {e}", path.display())))?;
    let Some(sheet) = workbook.sheet_names().first().cloned() else {
        return Ok(Table::new(Vec::new(), Vec::new()));
    };
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| ProdcatError::Spreadsheet(format!("Failed to read sheet '{sheet}': {e}")))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|r| r.iter().map(cell_to_string).collect())
        .unwrap_or_default();
    let rows = rows.map(|r| r.iter().map(cell_to_string).collect()).collect();
    Ok(Table::new(headers, rows))
}

#[cfg(not(feature = "xlsx"))]
fn read_spreadsheet_table(path: &Path) -> Result<Table> {
    Err(ProdcatError::UnsupportedFormat(format!(
        ".{} (built without spreadsheet support)",
        file_extension(path)
    )))
}

// ---------------------------------------------------------------------------
// Single-column lists (reference catalogs)
// ---------------------------------------------------------------------------

/// Non-empty text cells of the first column, skipping the header row.
pub fn read_first_column(path: &Path) -> Result<Vec<String>> {
    if is_spreadsheet(path) {
        return read_spreadsheet_first_column(path);
    }
    let file = std::fs::File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));
    let mut values = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if let Some(cell) = record.get(0) {
            if !cell.trim().is_empty() {
                values.push(cell.to_string());
            }
        }
    }
    Ok(values)
}

#[cfg(feature = "xlsx")]
fn read_spreadsheet_first_column(path: &Path) -> Result<Vec<String>> {
    use calamine::{Data, Reader};

    let mut workbook = calamine::open_workbook_auto(path)
        .map_err(|e| ProdcatError::Spreadsheet(format!("Failed to open {}: {e}", path.display())))?;
    let Some(sheet) = workbook.sheet_names().first().cloned() else {
        return Ok(Vec::new());
    };
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| ProdcatError::Spreadsheet(format!("Failed to read sheet '{sheet}': {e}")))?;
    // Only text cells name categories; numbers and blanks are skipped.
    Ok(range
        .rows()
        .skip(1)
        .filter_map(|row| match row.first() {
            Some(Data::String(s)) if !s.trim().is_empty() => Some(s.clone()),
            _ => None,
        })
        .collect())
}

#[cfg(not(feature = "xlsx"))]
fn read_spreadsheet_first_column(path: &Path) -> Result<Vec<String>> {
    read_spreadsheet_table(path).map(|_| Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension(Path::new("sales.CSV")), "csv");
        assert_eq!(file_extension(Path::new("book.xlsx")), "xlsx");
        assert_eq!(file_extension(Path::new("noext")), "");
        assert!(is_spreadsheet(Path::new("a.XLS")));
        assert!(!is_spreadsheet(Path::new("a.csv")));
    }

    #[test]
    fn test_read_csv_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.csv");
        let content = "\u{feff}Order,Product description,Product category
1,\"Batom matte, vermelho\",Other
2,Shampoo
";
        std::fs::write(&path, content).unwrap();
        let table = read_table(&path).unwrap();
        assert_eq!(table.headers, vec!["Order", "Product description", "Product category"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0][1], "Batom matte, vermelho");
        // short rows are padded
        assert_eq!(table.rows[1][2], "");
    }

    #[test]
    fn test_read_table_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.json");
        std::fs::write(&path, "{}").unwrap();
        assert!(matches!(read_table(&path), Err(ProdcatError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_read_first_column_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cats.csv");
        std::fs::write(&path, "name\nMakeup > Other\n \nHair\n").unwrap();
        assert_eq!(read_first_column(&path).unwrap(), vec!["Makeup > Other", "Hair"]);
    }

    #[cfg(feature = "xlsx")]
    #[test]
    fn test_spreadsheet_roundtrip_through_exporter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.xlsx");
        let table = Table::new(
            vec!["Product description".into(), "Qty".into()],
            vec![vec!["Gloss labial".into(), "3".into()], vec![String::new(), "1".into()]],
        );
        crate::exporter::write_table(&table, &path).unwrap();
        let read = read_table(&path).unwrap();
        assert_eq!(read.headers, table.headers);
        assert_eq!(read.rows[0], vec!["Gloss labial".to_string(), "3".to_string()]);
        assert_eq!(read.rows[1][0], "");

        let first = read_first_column(&path).unwrap();
        assert_eq!(first, vec!["Gloss labial"]);
    }
}
