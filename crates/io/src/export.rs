// Match outputs: flagged reference table (csv/xlsx), unmatched list, report
//
// The flagged table is the reference table as loaded, plus a 0/1 flag
// column and optionally the best accepted score per row.

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook};
use serde::Serialize;
use titlematch_resolver::config::extension_of;
use titlematch_resolver::MatchResult;

use crate::error::IoError;
use crate::files::CandidateFile;
use crate::table::{find_column, ReferenceTable};

/// One line of the per-candidate report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub candidate: String,
    pub matched_title: Option<String>,
    /// 0-based data row of the matched reference.
    pub reference_row: Option<usize>,
    pub score: u8,
    pub matched: bool,
}

impl ReportRow {
    pub fn new(candidate: &CandidateFile, result: &MatchResult, table: &ReferenceTable) -> Self {
        let reference = result.reference.filter(|_| result.matched);
        Self {
            candidate: candidate.file_name.clone(),
            matched_title: reference
                .and_then(|i| table.rows.get(i))
                .map(|r| r.title.clone()),
            reference_row: reference,
            score: result.score,
            matched: result.matched,
        }
    }
}

/// Best accepted score per reference row; `None` for rows nothing matched.
pub fn reference_scores(references: usize, results: &[MatchResult]) -> Vec<Option<u8>> {
    let mut best: Vec<Option<u8>> = vec![None; references];
    for result in results.iter().filter(|r| r.matched) {
        if let Some(slot) = result.reference.and_then(|i| best.get_mut(i)) {
            *slot = Some(slot.map_or(result.score, |s| s.max(result.score)));
        }
    }
    best
}

/// Cell written into the flagged table.
enum Cell<'a> {
    Text(&'a str),
    Number(f64),
    Blank,
}

/// Write `table` with `flag_column` set to 1 for every row some candidate
/// matched and 0 otherwise. A column already named `flag_column` (or
/// `score_column`) is overwritten in place; otherwise it is appended.
pub fn write_flagged_table(
    path: &Path,
    table: &ReferenceTable,
    results: &[MatchResult],
    flag_column: &str,
    score_column: Option<&str>,
) -> Result<(), IoError> {
    let scores = reference_scores(table.len(), results);

    let mut headers = table.headers.clone();
    let flag_idx = column_slot(&mut headers, flag_column);
    let score_idx = score_column.map(|name| column_slot(&mut headers, name));

    let rows: Vec<Vec<Cell>> = table
        .rows
        .iter()
        .zip(&scores)
        .map(|(record, score)| {
            headers
                .iter()
                .enumerate()
                .map(|(col, header)| {
                    if col == flag_idx {
                        Cell::Number(if score.is_some() { 1.0 } else { 0.0 })
                    } else if Some(col) == score_idx {
                        score.map_or(Cell::Blank, |s| Cell::Number(f64::from(s)))
                    } else {
                        record
                            .fields
                            .get(header)
                            .map_or(Cell::Blank, |v| Cell::Text(v.as_str()))
                    }
                })
                .collect()
        })
        .collect();

    match extension_of(&path.to_string_lossy()).as_str() {
        "csv" => write_table_csv(path, &headers, &rows)?,
        "xlsx" => write_table_xlsx(path, &headers, &rows)?,
        other => return Err(IoError::UnsupportedFormat(other.to_string())),
    }

    let flagged = scores.iter().filter(|s| s.is_some()).count();
    log::info!(
        "wrote {} ({} of {} rows flagged in '{}')",
        path.display(),
        flagged,
        table.len(),
        flag_column
    );
    Ok(())
}

/// Index of `name` in `headers`, appending it when absent.
fn column_slot(headers: &mut Vec<String>, name: &str) -> usize {
    match find_column(headers, name) {
        Some(i) => i,
        None => {
            headers.push(name.trim().to_string());
            headers.len() - 1
        }
    }
}

fn write_table_csv(path: &Path, headers: &[String], rows: &[Vec<Cell>]) -> Result<(), IoError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| IoError::write(path, e))?;
    writer
        .write_record(headers)
        .map_err(|e| IoError::write(path, e))?;
    for row in rows {
        let fields: Vec<String> = row
            .iter()
            .map(|cell| match cell {
                Cell::Text(s) => (*s).to_string(),
                Cell::Number(n) => n.to_string(),
                Cell::Blank => String::new(),
            })
            .collect();
        writer
            .write_record(&fields)
            .map_err(|e| IoError::write(path, e))?;
    }
    writer.flush().map_err(|e| IoError::write(path, e))
}

fn write_table_xlsx(path: &Path, headers: &[String], rows: &[Vec<Cell>]) -> Result<(), IoError> {
    let mut workbook = XlsxWorkbook::new();
    let worksheet = workbook.add_worksheet();
    let bold = Format::new().set_bold();

    for (col, header) in headers.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, header, &bold)
            .map_err(|e| IoError::write(path, e))?;
    }
    for (r, row) in rows.iter().enumerate() {
        let r = (r + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Text(s) if !s.is_empty() => {
                    worksheet
                        .write_string(r, col, *s)
                        .map_err(|e| IoError::write(path, e))?;
                }
                Cell::Number(n) => {
                    worksheet
                        .write_number(r, col, *n)
                        .map_err(|e| IoError::write(path, e))?;
                }
                _ => {}
            }
        }
    }

    workbook.save(path).map_err(|e| IoError::write(path, e))
}

/// One-column CSV (`file`) listing candidate files.
pub fn write_unmatched<'a>(
    path: &Path,
    files: impl IntoIterator<Item = &'a CandidateFile>,
) -> Result<(), IoError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| IoError::write(path, e))?;
    writer
        .write_record(["file"])
        .map_err(|e| IoError::write(path, e))?;
    let mut count = 0usize;
    for file in files {
        writer
            .write_record([file.file_name.as_str()])
            .map_err(|e| IoError::write(path, e))?;
        count += 1;
    }
    writer.flush().map_err(|e| IoError::write(path, e))?;
    log::info!("wrote {} ({count} unmatched files)", path.display());
    Ok(())
}

/// Per-candidate report CSV.
pub fn write_report(path: &Path, rows: &[ReportRow]) -> Result<(), IoError> {
    write_csv_rows(path, rows)
}

/// Serialize `rows` as CSV with a header taken from the field names.
pub fn write_csv_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), IoError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| IoError::write(path, e))?;
    for row in rows {
        writer.serialize(row).map_err(|e| IoError::write(path, e))?;
    }
    writer.flush().map_err(|e| IoError::write(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::load_references;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn sample_table(dir: &Path) -> ReferenceTable {
        let path = dir.join("refs.csv");
        std::fs::write(
            &path,
            "title,year,downloaded\nAlpha,2001,\nBeta,2002,\nGamma,2003,\n",
        )
        .unwrap();
        load_references(&path, None, "title").unwrap()
    }

    fn candidate(name: &str) -> CandidateFile {
        CandidateFile::from_path(PathBuf::from(name)).unwrap()
    }

    #[test]
    fn scores_keep_best_match_per_reference() {
        let results = [
            MatchResult::accepted(2, 91),
            MatchResult::rejected(40),
            MatchResult::accepted(2, 97),
            MatchResult::accepted(0, 100),
        ];
        assert_eq!(reference_scores(3, &results), vec![Some(100), None, Some(97)]);
    }

    #[test]
    fn flagged_csv_overwrites_existing_column() {
        let dir = tempdir().unwrap();
        let table = sample_table(dir.path());
        let out = dir.path().join("out.csv");
        let results = [MatchResult::accepted(1, 95), MatchResult::rejected(12)];

        write_flagged_table(&out, &table, &results, "downloaded", Some("score")).unwrap();

        let text = std::fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "title,year,downloaded,score");
        assert_eq!(lines[1], "Alpha,2001,0,");
        assert_eq!(lines[2], "Beta,2002,1,95");
        assert_eq!(lines[3], "Gamma,2003,0,");
    }

    #[test]
    fn flagged_xlsx_reads_back() {
        let dir = tempdir().unwrap();
        let table = sample_table(dir.path());
        let out = dir.path().join("out.xlsx");
        let results = [MatchResult::accepted(0, 100)];

        write_flagged_table(&out, &table, &results, "supplementary_package", None).unwrap();

        let back = load_references(&out, None, "title").unwrap();
        assert_eq!(back.titles(), vec!["Alpha", "Beta", "Gamma"]);
        assert_eq!(back.cell(0, "supplementary_package"), "1");
        assert_eq!(back.cell(2, "supplementary_package"), "0");
        assert_eq!(back.cell(1, "year"), "2002");
    }

    #[test]
    fn flagged_rejects_other_formats() {
        let dir = tempdir().unwrap();
        let table = sample_table(dir.path());
        let err = write_flagged_table(&dir.path().join("out.json"), &table, &[], "f", None)
            .unwrap_err();
        assert_eq!(err, IoError::UnsupportedFormat("json".into()));
    }

    #[test]
    fn unmatched_list() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("unmatched.csv");
        let files = [candidate("a/one.pdf"), candidate("b/two.pdf")];
        write_unmatched(&out, &files).unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "file\none.pdf\ntwo.pdf\n");
    }

    #[test]
    fn report_rows() {
        let dir = tempdir().unwrap();
        let table = sample_table(dir.path());
        let rows = vec![
            ReportRow::new(&candidate("ECMA_Beta.pdf"), &MatchResult::accepted(1, 100), &table),
            ReportRow::new(&candidate("misc.pdf"), &MatchResult::rejected(30), &table),
        ];
        assert_eq!(rows[0].matched_title.as_deref(), Some("Beta"));
        assert_eq!(rows[1].reference_row, None);

        let out = dir.path().join("report.csv");
        write_report(&out, &rows).unwrap();
        let text = std::fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "candidate,matched_title,reference_row,score,matched");
        assert_eq!(lines[1], "ECMA_Beta.pdf,Beta,1,100,true");
        assert_eq!(lines[2], "misc.pdf,,,30,false");
    }
}
