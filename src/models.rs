use crate::error::{ProdcatError, Result};

/// In-memory sales table: ordered headers plus rows of string cells.
///
/// On construction the table is made rectangular: short rows are padded,
/// and a row longer than the headers widens them with blank names, so no
/// cell is lost and column lookups never go out of bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(mut headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(Vec::len).fold(headers.len(), usize::max);
        headers.resize(width, String::new());
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| ProdcatError::MissingColumn(name.to_string()))
    }

    pub fn column(&self, name: &str) -> Result<Vec<&str>> {
        let idx = self.require_column(name)?;
        Ok(self.rows.iter().map(|r| r[idx].as_str()).collect())
    }

    /// Replace the named column, or append it when absent.
    pub fn set_column(&mut self, name: &str, values: Vec<String>) {
        let idx = match self.column_index(name) {
            Some(idx) => idx,
            None => {
                self.headers.push(name.to_string());
                for row in &mut self.rows {
                    row.push(String::new());
                }
                self.headers.len() - 1
            }
        };
        for (row, value) in self.rows.iter_mut().zip(values) {
            row[idx] = value;
        }
    }

    pub fn drop_column(&mut self, name: &str) {
        if let Some(idx) = self.column_index(name) {
            self.headers.remove(idx);
            for row in &mut self.rows {
                row.remove(idx);
            }
        }
    }
}

/// The two fields of a sales line the categorizer reads.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    pub description: &'a str,
    pub category: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassificationMethod {
    DirectMap,
    FuzzyMap,
    Rules,
    Similarity,
    AggressiveRules,
    MostCommon,
    ReferenceDefault,
    NoMatch,
}

impl ClassificationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DirectMap => "direct-map",
            Self::FuzzyMap => "fuzzy-map",
            Self::Rules => "rules",
            Self::Similarity => "similarity",
            Self::AggressiveRules => "aggressive-rules",
            Self::MostCommon => "most-common",
            Self::ReferenceDefault => "reference-default",
            Self::NoMatch => "no-match",
        }
    }
}

/// Derived per-row outcome. `method` is `None` for rows whose category was
/// already usable and passed through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub category: String,
    pub method: Option<ClassificationMethod>,
    pub confidence: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(
            vec!["desc".into(), "cat".into()],
            vec![vec!["a".into(), "x".into()], vec!["b".into()]],
        )
    }

    #[test]
    fn test_rows_padded_to_header_width() {
        let t = sample();
        assert_eq!(t.rows[1], vec!["b".to_string(), String::new()]);
    }

    #[test]
    fn test_long_rows_keep_extra_cells() {
        let mut t = Table::new(
            vec!["desc".into(), "cat".into()],
            vec![
                vec!["a".into(), "x".into(), "note".into()],
                vec!["b".into()],
            ],
        );
        assert_eq!(t.headers, vec!["desc".to_string(), "cat".to_string(), String::new()]);
        assert_eq!(t.rows[0][2], "note");
        assert_eq!(t.rows[1], vec!["b".to_string(), String::new(), String::new()]);

        t.set_column("fixed", vec!["1".into(), "2".into()]);
        assert_eq!(t.column_index("fixed"), Some(3));
        assert_eq!(t.rows[0], vec!["a", "x", "note", "1"]);
    }

    #[test]
    fn test_missing_column_is_named() {
        let t = sample();
        match t.column("price") {
            Err(ProdcatError::MissingColumn(name)) => assert_eq!(name, "price"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_set_column_appends_then_replaces() {
        let mut t = sample();
        t.set_column("fixed", vec!["1".into(), "2".into()]);
        assert_eq!(t.headers.len(), 3);
        t.set_column("fixed", vec!["3".into(), "4".into()]);
        assert_eq!(t.headers.len(), 3);
        assert_eq!(t.column("fixed").unwrap(), vec!["3", "4"]);
    }

    #[test]
    fn test_drop_column() {
        let mut t = sample();
        t.drop_column("desc");
        assert_eq!(t.headers, vec!["cat".to_string()]);
        assert_eq!(t.rows[0], vec!["x".to_string()]);
        t.drop_column("missing");
        assert_eq!(t.headers.len(), 1);
    }

    #[test]
    fn test_method_wire_names() {
        assert_eq!(ClassificationMethod::AggressiveRules.as_str(), "aggressive-rules");
        assert_eq!(ClassificationMethod::NoMatch.as_str(), "no-match");
    }
}
