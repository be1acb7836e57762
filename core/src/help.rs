//! Table layout for help output.
//!
//! [`Command::generate_help`](crate::Command::generate_help) builds rows of
//! cells; a [`TableFormat`] turns them into text lines. [`PaddedTable`] is
//! the default layout.

/// Renders rows of cells into lines of text.
pub trait TableFormat {
    fn render(&self, rows: &[Vec<String>]) -> Vec<String>;
}

/// Left-aligned columns, each as wide as its widest cell plus `padding`.
///
/// # Examples
///
/// ```
/// use cmdtree_core::{PaddedTable, TableFormat};
///
/// let rows = vec![
///     vec!["  --help".to_string(), "Show help".to_string()],
///     vec!["  --verbose".to_string(), "Verbose".to_string()],
/// ];
/// let lines = PaddedTable::default().render(&rows);
/// assert_eq!(lines[0], "  --help      Show help   ");
/// assert_eq!(lines[1], "  --verbose   Verbose     ");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaddedTable {
    pub padding: usize,
}

impl Default for PaddedTable {
    fn default() -> Self {
        Self { padding: 3 }
    }
}

impl TableFormat for PaddedTable {
    fn render(&self, rows: &[Vec<String>]) -> Vec<String> {
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        let widths: Vec<usize> = (0..columns)
            .map(|col| {
                rows.iter()
                    .filter_map(|row| row.get(col))
                    .map(|cell| cell.chars().count())
                    .max()
                    .unwrap_or(0)
                    + self.padding
            })
            .collect();

        rows.iter()
            .map(|row| {
                row.iter()
                    .zip(&widths)
                    .map(|(cell, &width)| format!("{cell:<width$}"))
                    .collect()
            })
            .collect()
    }
}
