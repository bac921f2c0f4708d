//! SAS Transport (XPT V5) sink.
//!
//! A result table becomes a single-member transport file. Column types
//! are inferred from the cells: a column whose present values are all
//! numbers (or booleans) is numeric, anything else is character with the
//! width of its longest value. Variable names are cut down to the V5
//! limit of eight uppercase characters and the full header is kept as the
//! variable label.

mod header;
mod ibm;

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use chrono::{Local, NaiveDateTime};
use fuzzmatch_model::{CellValue, ResultTable};

use crate::error::{Result, SinkError};

use header::{
    HeaderInfo, RECORD_LEN, build_dscrptr_header, build_library_header, build_member_data,
    build_member_header, build_member_second, build_namestr, build_namestr_header,
    build_obs_header, build_real_header, build_second_header,
};
pub use ibm::{MISSING, ieee_to_ibm};

/// Maximum character variable length in V5 files.
pub const MAX_CHAR_LENGTH: u16 = 200;

/// Dataset name used when the destination stem yields nothing usable.
pub const DEFAULT_DATASET_NAME: &str = "MATCHES";

const NUMERIC_LENGTH: u16 = 8;
const NAME_LEN: usize = 8;
const DATASET_LABEL: &str = "Fuzzy match results";
const SAS_VERSION: &str = "9.4";

/// Storage type of a transport variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Char,
}

/// A transport variable derived from a result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XptColumn {
    /// Sanitized V5 name.
    pub name: String,
    /// Original header.
    pub label: String,
    pub kind: ColumnKind,
    /// Bytes per observation.
    pub length: u16,
}

/// Options stamped into the file headers.
#[derive(Debug, Clone)]
pub struct XptOptions {
    pub dataset_name: String,
    pub created: NaiveDateTime,
}

impl XptOptions {
    /// Dataset name from the destination's file stem, created now.
    pub fn for_path(path: &Path) -> Self {
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default();
        let name = sanitize_name(stem);
        Self {
            dataset_name: if name.is_empty() {
                DEFAULT_DATASET_NAME.to_string()
            } else {
                name
            },
            created: Local::now().naive_local(),
        }
    }

    fn header_info(&self) -> HeaderInfo {
        HeaderInfo {
            sas_version: SAS_VERSION.to_string(),
            os_name: std::env::consts::OS.to_ascii_uppercase(),
            dataset_name: self.dataset_name.clone(),
            dataset_label: DATASET_LABEL.to_string(),
            created: format_datetime(self.created),
        }
    }
}

/// Write `table` as a transport file at `path`.
pub fn write_xpt(table: &ResultTable, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| SinkError::io(path, e))?;
    XptWriter::new(file, XptOptions::for_path(path))
        .write_table(table)
        .map_err(|e| SinkError::io(path, e))
}

/// Transport file writer.
pub struct XptWriter<W: Write> {
    writer: BufWriter<W>,
    options: XptOptions,
}

impl<W: Write> XptWriter<W> {
    pub fn new(writer: W, options: XptOptions) -> Self {
        Self {
            writer: BufWriter::new(writer),
            options,
        }
    }

    /// Write the headers, variable descriptors, and observations.
    pub fn write_table(mut self, table: &ResultTable) -> io::Result<()> {
        let columns = describe_columns(table);
        let info = self.options.header_info();

        self.writer.write_all(&build_library_header())?;
        self.writer.write_all(&build_real_header(&info))?;
        self.writer.write_all(&build_second_header(&info))?;

        self.writer.write_all(&build_member_header())?;
        self.writer.write_all(&build_dscrptr_header())?;
        self.writer.write_all(&build_member_data(&info))?;
        self.writer.write_all(&build_member_second(&info))?;

        self.writer.write_all(&build_namestr_header(columns.len()))?;
        self.write_namestr_records(&columns)?;

        self.writer.write_all(&build_obs_header())?;
        self.write_observations(table, &columns)?;

        self.writer.flush()
    }

    fn write_namestr_records(&mut self, columns: &[XptColumn]) -> io::Result<()> {
        let mut records = RecordWriter::new(&mut self.writer);
        let mut position = 0u32;
        for (index, column) in columns.iter().enumerate() {
            records.write_bytes(&build_namestr(column, (index + 1) as u16, position))?;
            position = position.saturating_add(u32::from(column.length));
        }
        records.finish()
    }

    fn write_observations(
        &mut self,
        table: &ResultTable,
        columns: &[XptColumn],
    ) -> io::Result<()> {
        let obs_len: usize = columns.iter().map(|c| usize::from(c.length)).sum();
        let mut records = RecordWriter::new(&mut self.writer);
        let mut obs = Vec::with_capacity(obs_len);

        for row in table.rows() {
            obs.clear();
            for (cell, column) in row.cells.iter().zip(columns) {
                match column.kind {
                    ColumnKind::Numeric => obs.extend_from_slice(&encode_numeric(cell)),
                    ColumnKind::Char => obs.extend(encode_char(cell, column.length)),
                }
            }
            records.write_bytes(&obs)?;
        }
        records.finish()
    }
}

/// Derive one transport variable per result column.
pub fn describe_columns(table: &ResultTable) -> Vec<XptColumn> {
    let mut taken = BTreeSet::new();
    table
        .columns()
        .iter()
        .enumerate()
        .map(|(index, header)| {
            let numeric = table.column_values(index).all(|cell| {
                matches!(
                    cell,
                    CellValue::Number(_) | CellValue::Bool(_) | CellValue::Missing
                )
            });
            let (kind, length) = if numeric {
                (ColumnKind::Numeric, NUMERIC_LENGTH)
            } else {
                let widest = table
                    .column_values(index)
                    .filter_map(CellValue::as_text)
                    .map(|text| text.chars().count())
                    .max()
                    .unwrap_or(1);
                let length = u16::try_from(widest).unwrap_or(MAX_CHAR_LENGTH);
                (ColumnKind::Char, length.clamp(1, MAX_CHAR_LENGTH))
            };
            XptColumn {
                name: unique_name(header, index, &mut taken),
                label: header.clone(),
                kind,
                length,
            }
        })
        .collect()
}

/// Uppercase, replace anything outside `[A-Z0-9_]`, keep eight characters.
/// Names may not start with a digit.
fn sanitize_name(raw: &str) -> String {
    let mut name: String = raw
        .trim()
        .chars()
        .map(|ch| {
            let ch = ch.to_ascii_uppercase();
            if ch.is_ascii_alphanumeric() || ch == '_' { ch } else { '_' }
        })
        .collect();
    if name.starts_with(|ch: char| ch.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name.truncate(NAME_LEN);
    name
}

fn unique_name(header: &str, index: usize, taken: &mut BTreeSet<String>) -> String {
    let mut name = sanitize_name(header);
    if name.is_empty() {
        name = format!("VAR{}", index + 1);
    }
    if !taken.contains(&name) {
        taken.insert(name.clone());
        return name;
    }

    let stem: String = name.chars().take(NAME_LEN - 2).collect();
    let mut counter = 2usize;
    loop {
        let candidate = if counter < 100 {
            format!("{stem}{counter:02}")
        } else {
            format!("V{counter:07}")
        };
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}

fn encode_numeric(cell: &CellValue) -> [u8; 8] {
    match cell {
        CellValue::Number(value) => ieee_to_ibm(*value),
        CellValue::Bool(flag) => ieee_to_ibm(if *flag { 1.0 } else { 0.0 }),
        CellValue::Text(_) | CellValue::Missing => MISSING,
    }
}

/// Space-padded to `length` bytes; non-ASCII becomes `?`.
fn encode_char(cell: &CellValue, length: u16) -> Vec<u8> {
    let len = usize::from(length);
    let mut out: Vec<u8> = cell
        .as_text()
        .unwrap_or_default()
        .chars()
        .take(len)
        .map(|ch| if ch.is_ascii() { ch as u8 } else { b'?' })
        .collect();
    out.resize(len, b' ');
    out
}

/// `ddMMMyy:hh:mm:ss`, uppercase.
fn format_datetime(value: NaiveDateTime) -> String {
    value.format("%d%b%y:%H:%M:%S").to_string().to_uppercase()
}

/// Packs byte runs into 80-byte records, space-padding the last one.
struct RecordWriter<'a, W: Write> {
    writer: &'a mut W,
    record: [u8; RECORD_LEN],
    pos: usize,
}

impl<'a, W: Write> RecordWriter<'a, W> {
    fn new(writer: &'a mut W) -> Self {
        Self {
            writer,
            record: [b' '; RECORD_LEN],
            pos: 0,
        }
    }

    fn write_bytes(&mut self, mut bytes: &[u8]) -> io::Result<()> {
        while !bytes.is_empty() {
            let take = (RECORD_LEN - self.pos).min(bytes.len());
            self.record[self.pos..self.pos + take].copy_from_slice(&bytes[..take]);
            self.pos += take;
            bytes = &bytes[take..];

            if self.pos == RECORD_LEN {
                self.writer.write_all(&self.record)?;
                self.record = [b' '; RECORD_LEN];
                self.pos = 0;
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        if self.pos > 0 {
            self.record[self.pos..].fill(b' ');
            self.writer.write_all(&self.record)?;
            self.pos = 0;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use fuzzmatch_model::{ResultRow, Score};

    use super::*;

    fn table() -> ResultTable {
        let mut table = ResultTable::new(vec![
            "people_id".to_string(),
            "people_name".to_string(),
            "match_score".to_string(),
            "valid_match".to_string(),
        ]);
        table.push_row(ResultRow {
            group: 1,
            score: Score::new(72.7),
            cells: vec![
                CellValue::text("1"),
                CellValue::text("Alice"),
                CellValue::Number(72.7),
                CellValue::Bool(false),
            ],
        });
        table.push_row(ResultRow {
            group: 2,
            score: Score::NOT_APPLICABLE,
            cells: vec![
                CellValue::text("22"),
                CellValue::Missing,
                CellValue::Missing,
                CellValue::Bool(false),
            ],
        });
        table
    }

    #[test]
    fn infers_types_and_lengths() {
        let columns = describe_columns(&table());
        let kinds: Vec<_> = columns.iter().map(|c| (c.kind, c.length)).collect();
        assert_eq!(
            kinds,
            [
                (ColumnKind::Char, 2),
                (ColumnKind::Char, 5),
                (ColumnKind::Numeric, 8),
                (ColumnKind::Numeric, 8),
            ]
        );
        assert_eq!(columns[0].name, "PEOPLE_I");
        assert_eq!(columns[2].label, "match_score");
    }

    #[test]
    fn names_are_sanitized_and_unique() {
        assert_eq!(sanitize_name("match score"), "MATCH_SC");
        assert_eq!(sanitize_name("1st"), "_1ST");
        assert_eq!(sanitize_name("naïve"), "NA_VE");

        let mut taken = BTreeSet::new();
        assert_eq!(unique_name("people_id", 0, &mut taken), "PEOPLE_I");
        assert_eq!(unique_name("people_index", 1, &mut taken), "PEOPLE02");
        assert_eq!(unique_name("---", 2, &mut taken), "___");
        assert_eq!(unique_name("", 3, &mut taken), "VAR4");
    }

    #[test]
    fn char_cells_are_padded_and_ascii() {
        assert_eq!(encode_char(&CellValue::text("Zoë"), 5), b"Zo?  ");
        assert_eq!(encode_char(&CellValue::text("truncated"), 4), b"trun");
        assert_eq!(encode_char(&CellValue::Missing, 3), b"   ");
    }

    #[test]
    fn missing_numbers_use_dot() {
        assert_eq!(encode_numeric(&CellValue::Missing), MISSING);
        assert_eq!(encode_numeric(&CellValue::Bool(true))[0], 0x41);
    }

    #[test]
    fn datetime_is_uppercase() {
        let created = NaiveDate::from_ymd_opt(2026, 10, 16)
            .and_then(|d| d.and_hms_opt(9, 5, 0))
            .expect("valid datetime");
        assert_eq!(format_datetime(created), "16OCT26:09:05:00");
    }

    #[test]
    fn dataset_name_from_path() {
        assert_eq!(
            XptOptions::for_path(Path::new("out/matches-2026.xpt")).dataset_name,
            "MATCHES_"
        );
        assert_eq!(XptOptions::for_path(Path::new(".xpt")).dataset_name, "_XPT");
    }

    #[test]
    fn record_writer_pads_final_record() {
        let mut output = Vec::new();
        {
            let mut records = RecordWriter::new(&mut output);
            records.write_bytes(&[b'A'; 50]).expect("write");
            records.write_bytes(&[b'B'; 50]).expect("write");
            records.finish().expect("finish");
        }
        assert_eq!(output.len(), 160);
        assert_eq!(&output[50..80], &[b'B'; 30]);
        assert_eq!(&output[100..], &[b' '; 60]);
    }

    #[test]
    fn whole_file_is_record_aligned() {
        let options = XptOptions {
            dataset_name: DEFAULT_DATASET_NAME.to_string(),
            created: NaiveDate::from_ymd_opt(2026, 1, 2)
                .and_then(|d| d.and_hms_opt(3, 4, 5))
                .expect("valid datetime"),
        };
        let mut bytes = Vec::new();
        XptWriter::new(&mut bytes, options)
            .write_table(&table())
            .expect("write xpt");

        assert_eq!(bytes.len() % RECORD_LEN, 0);
        // 8 header records, 4 namestrs in 7 records, OBS header, 2 obs of 23 bytes in 1 record.
        assert_eq!(bytes.len(), (8 + 7 + 1 + 1) * RECORD_LEN);
        assert_eq!(&bytes[7 * RECORD_LEN + 54..7 * RECORD_LEN + 58], b"0004");
    }
}
