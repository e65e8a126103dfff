// Reference table import (CSV/TSV, xlsx, xls, xlsb, ods)
//
// The first row is the header. Every later row becomes a ReferenceRecord
// whose `fields` map carries all cells by header name.

use std::borrow::Cow;
use std::collections::HashSet;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use titlematch_resolver::config::extension_of;
use titlematch_resolver::ReferenceRecord;

use crate::error::IoError;

/// A loaded reference table.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTable {
    /// Header names, made unique and non-empty.
    pub headers: Vec<String>,
    /// Data rows; `rows[i].index == i`.
    pub rows: Vec<ReferenceRecord>,
    /// Position of the title column in `headers`.
    pub title_column: usize,
}

impl ReferenceTable {
    pub fn titles(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.title.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell value by row and header, "" when absent.
    pub fn cell(&self, row: usize, header: &str) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.fields.get(header))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Load a reference table, picking the reader from the file extension.
///
/// `sheet` selects a worksheet by name in spreadsheet files (first sheet when
/// `None`) and is ignored for delimited text.
pub fn load_references(
    path: &Path,
    sheet: Option<&str>,
    title_column: &str,
) -> Result<ReferenceTable, IoError> {
    let ext = extension_of(&path.to_string_lossy());
    let grid = match ext.as_str() {
        "csv" | "txt" => {
            let content = read_file_as_utf8(path)?;
            let delimiter = sniff_delimiter(&content);
            read_delimited(path, &content, delimiter)?
        }
        "tsv" => read_delimited(path, &read_file_as_utf8(path)?, b'\t')?,
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook(path, sheet)?,
        _ => return Err(IoError::UnsupportedFormat(ext)),
    };

    let table = build_table(path, grid, title_column)?;
    log::info!(
        "loaded {} reference rows from {} (title column '{}')",
        table.len(),
        path.display(),
        table.headers[table.title_column]
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// Delimited text
// ---------------------------------------------------------------------------

/// Decode a text table: UTF-8 when valid, Windows-1252 otherwise (the usual
/// encoding of spreadsheet exports on Windows). A byte-order mark is dropped.
pub fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let bytes = std::fs::read(path).map_err(|e| IoError::read(path, e))?;
    let text = match std::str::from_utf8(&bytes) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => {
            log::debug!("{} is not UTF-8, decoding as Windows-1252", path.display());
            encoding_rs::WINDOWS_1252.decode(&bytes).0
        }
    };
    Ok(text.strip_prefix('\u{feff}').unwrap_or(&*text).to_string())
}

/// Delimiter whose header width is repeated by the most of the first ten
/// lines, weighted by that width. A header that does not split is no
/// evidence; comma is the fallback.
fn sniff_delimiter(content: &str) -> u8 {
    let sample: Vec<&str> = content.lines().take(10).collect();
    let mut best = (0usize, b',');
    for delim in [b'\t', b';', b',', b'|'] {
        let mut widths = sample.iter().map(|line| field_count(line, delim));
        let Some(header) = widths.next().filter(|&w| w > 1) else {
            continue;
        };
        let weight = (1 + widths.filter(|&w| w == header).count()) * header;
        if weight > best.0 {
            best = (weight, delim);
        }
    }
    best.1
}

fn field_count(line: &str, delimiter: u8) -> usize {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(Result::ok)
        .map_or(1, |record| record.len())
}

fn read_delimited(path: &Path, content: &str, delimiter: u8) -> Result<Vec<Vec<String>>, IoError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| IoError::read(path, e))?;
        grid.push(record.iter().map(str::to_string).collect());
    }
    Ok(grid)
}

// ---------------------------------------------------------------------------
// Spreadsheets
// ---------------------------------------------------------------------------

fn read_workbook(path: &Path, sheet: Option<&str>) -> Result<Vec<Vec<String>>, IoError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| IoError::read(path, e))?;
    let names = workbook.sheet_names().to_vec();

    let name = match sheet {
        Some(wanted) => names
            .iter()
            .find(|n| n.as_str() == wanted)
            .or_else(|| names.iter().find(|n| n.eq_ignore_ascii_case(wanted)))
            .cloned()
            .ok_or_else(|| {
                IoError::Sheet(format!(
                    "no sheet named '{wanted}' in {} (available: {})",
                    path.display(),
                    names.join(", ")
                ))
            })?,
        None => names
            .first()
            .cloned()
            .ok_or_else(|| IoError::Sheet(format!("{} has no sheets", path.display())))?,
    };

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| IoError::Sheet(format!("failed to read sheet '{name}': {e}")))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Grid -> table
// ---------------------------------------------------------------------------

fn build_table(
    path: &Path,
    mut grid: Vec<Vec<String>>,
    title_column: &str,
) -> Result<ReferenceTable, IoError> {
    if grid.is_empty() {
        return Err(IoError::Read {
            path: path.display().to_string(),
            message: "table is empty (no header row)".into(),
        });
    }
    let body = grid.split_off(1);
    let mut header_row = grid.pop().unwrap_or_default();

    let width = body.iter().map(Vec::len).fold(header_row.len(), usize::max);
    header_row.resize(width, String::new());
    let headers = unique_headers(header_row);

    let title_idx = find_column(&headers, title_column).ok_or_else(|| IoError::MissingColumn {
        path: path.display().to_string(),
        column: title_column.to_string(),
    })?;

    let mut rows = Vec::with_capacity(body.len());
    for (line, cells) in body.into_iter().enumerate() {
        if cells.iter().all(|c| c.trim().is_empty()) {
            log::warn!("{}: skipping blank row {}", path.display(), line + 2);
            continue;
        }
        let title = cells.get(title_idx).map(|t| t.trim()).unwrap_or("");
        let mut record = ReferenceRecord::new(rows.len(), title);
        for (i, header) in headers.iter().enumerate() {
            let value = cells.get(i).cloned().unwrap_or_default();
            record.fields.insert(header.clone(), value);
        }
        rows.push(record);
    }

    Ok(ReferenceTable {
        headers,
        rows,
        title_column: title_idx,
    })
}

/// Trim header names, name blank ones `column_N` (1-based) and suffix
/// repeats with `_2`, `_3`, ...
fn unique_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.into_iter()
        .enumerate()
        .map(|(i, h)| {
            let base = match h.trim() {
                "" => format!("column_{}", i + 1),
                t => t.to_string(),
            };
            let mut name = base.clone();
            let mut n = 2;
            while !seen.insert(name.clone()) {
                name = format!("{base}_{n}");
                n += 1;
            }
            name
        })
        .collect()
}

/// Exact match first, then case-insensitive.
pub(crate) fn find_column(headers: &[String], name: &str) -> Option<usize> {
    let name = name.trim();
    headers
        .iter()
        .position(|h| h == name)
        .or_else(|| headers.iter().position(|h| h.eq_ignore_ascii_case(name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::File::create(&path).unwrap().write_all(bytes).unwrap();
        path
    }

    #[test]
    fn sniff_comma_semicolon_tab() {
        assert_eq!(sniff_delimiter("a,b,c\n1,2,3\n"), b',');
        assert_eq!(sniff_delimiter("a;b;c\n1;2;3\n"), b';');
        assert_eq!(sniff_delimiter("a\tb\n1\t2\n"), b'\t');
        assert_eq!(sniff_delimiter("title\nonly one column\n"), b',');
        assert_eq!(sniff_delimiter(""), b',');
    }

    #[test]
    fn sniff_ignores_commas_inside_quotes() {
        let content = "title;year\n\"Money, Credit\";2001\n\"Risk, Return\";2003\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn csv_loads_with_title_column() {
        let dir = tempdir().unwrap();
        let path = write(
            dir.path(),
            "refs.csv",
            b"Title,Year\nRevealing Choice Bracketing,2023\nA Theory of Reference Points,2019\n",
        );
        let table = load_references(&path, None, "title").unwrap();
        assert_eq!(table.headers, vec!["Title", "Year"]);
        assert_eq!(table.title_column, 0);
        assert_eq!(
            table.titles(),
            vec!["Revealing Choice Bracketing", "A Theory of Reference Points"]
        );
        assert_eq!(table.rows[1].index, 1);
        assert_eq!(table.cell(1, "Year"), "2019");
    }

    #[test]
    fn tsv_and_windows_1252() {
        let dir = tempdir().unwrap();
        // 0xE9 is 'é' in Windows-1252 and invalid UTF-8 on its own.
        let path = write(dir.path(), "refs.tsv", b"title\tjournal\nCaf\xe9 Pricing\tECMA\n");
        let table = load_references(&path, None, "title").unwrap();
        assert_eq!(table.titles(), vec!["Café Pricing"]);
    }

    #[test]
    fn bom_is_stripped() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "refs.csv", "\u{feff}title,year\nX,1\n".as_bytes());
        let table = load_references(&path, None, "title").unwrap();
        assert_eq!(table.headers[0], "title");
    }

    #[test]
    fn missing_title_column() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "refs.csv", b"name,year\nX,1\n");
        let err = load_references(&path, None, "title").unwrap_err();
        assert!(matches!(err, IoError::MissingColumn { ref column, .. } if column == "title"));
    }

    #[test]
    fn blank_rows_skipped_empty_titles_kept() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "refs.csv", b"title,year\nA,1\n,\n,2\nB,3\n");
        let table = load_references(&path, None, "title").unwrap();
        assert_eq!(table.titles(), vec!["A", "", "B"]);
        assert!(table.rows.iter().enumerate().all(|(i, r)| r.index == i));
    }

    #[test]
    fn headers_made_unique() {
        let h = unique_headers(vec!["title".into(), "".into(), "title".into(), " x ".into()]);
        assert_eq!(h, vec!["title", "column_2", "title_2", "x"]);
    }

    #[test]
    fn ragged_rows_widen_headers() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "refs.csv", b"title\nA,extra\n");
        let table = load_references(&path, None, "title").unwrap();
        assert_eq!(table.headers, vec!["title", "column_2"]);
        assert_eq!(table.cell(0, "column_2"), "extra");
    }

    #[test]
    fn unsupported_extension() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "refs.json", b"[]");
        assert_eq!(
            load_references(&path, None, "title").unwrap_err(),
            IoError::UnsupportedFormat("json".into())
        );
    }

    #[test]
    fn empty_file_is_read_error() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "refs.csv", b"");
        assert!(matches!(
            load_references(&path, None, "title"),
            Err(IoError::Read { .. })
        ));
    }

    #[test]
    fn xlsx_sheet_selection() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("refs.xlsx");
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let first = workbook.add_worksheet().set_name("Other").unwrap();
        first.write_string(0, 0, "nothing").unwrap();
        let sheet = workbook.add_worksheet().set_name("ECMA").unwrap();
        sheet.write_string(0, 0, "Title").unwrap();
        sheet.write_string(0, 1, "Year").unwrap();
        sheet.write_string(1, 0, "Revealing Choice Bracketing").unwrap();
        sheet.write_number(1, 1, 2023.0).unwrap();
        workbook.save(&path).unwrap();

        let table = load_references(&path, Some("ecma"), "title").unwrap();
        assert_eq!(table.titles(), vec!["Revealing Choice Bracketing"]);
        assert_eq!(table.cell(0, "Year"), "2023");

        let err = load_references(&path, Some("QJE"), "title").unwrap_err();
        assert!(matches!(err, IoError::Sheet(ref m) if m.contains("ECMA")), "{err}");

        let err = load_references(&path, None, "title").unwrap_err();
        assert!(matches!(err, IoError::MissingColumn { .. }));
    }
}
