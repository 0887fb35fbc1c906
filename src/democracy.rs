// 🗳️ Democracy Index
//
// Tab-delimited country-year table with at least the columns
// ctryname, year, democ, liberty, poptotal. Rows whose democ or liberty
// score is a "not applicable" sentinel are dropped at load time, so no
// sentinel ever reaches a join.

use crate::error::{Result, StudyError};
use crate::parser::{SourceKind, SourceParser};
use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// poptotal is recorded in thousands
pub const POPULATION_SCALE: u64 = 1000;

const REQUIRED_COLUMNS: [&str; 5] = ["ctryname", "year", "democ", "liberty", "poptotal"];

// ============================================================================
// SENTINELS
// ============================================================================

/// Reserved score codes meaning "not applicable". Blank always counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentinelSet {
    values: Vec<String>,
}

impl SentinelSet {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SentinelSet {
            values: values.into_iter().map(|v| v.into().trim().to_string()).collect(),
        }
    }

    pub fn is_sentinel(&self, raw: &str) -> bool {
        let raw = raw.trim();
        raw.is_empty() || self.values.iter().any(|v| v == raw)
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }
}

impl Default for SentinelSet {
    fn default() -> Self {
        SentinelSet::new(["-99", "-88", "-77", "-66", "-55"])
    }
}

// ============================================================================
// RECORDS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemocracyRecord {
    pub ctryname: String,
    pub year: i64,
    pub democ: i64,
    pub liberty: i64,
    /// Population in thousands as recorded; `None` when blank or unreadable
    pub poptotal: Option<u64>,
}

impl DemocracyRecord {
    /// Population with the dropped trailing zeros restored
    pub fn population(&self) -> Option<u64> {
        self.poptotal.and_then(|p| p.checked_mul(POPULATION_SCALE))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadStats {
    pub rows_read: usize,
    pub sentinel_rows: usize,
    pub rows_kept: usize,
}

// ============================================================================
// INDEX
// ============================================================================

/// Valid index rows, keyed by country then year
///
/// Duplicate (country, year) rows are kept in `records`; lookups return
/// the first one in file order.
#[derive(Debug, Clone, Default)]
pub struct DemocracyIndex {
    records: Vec<DemocracyRecord>,
    by_country: HashMap<String, HashMap<i64, usize>>,
}

impl DemocracyIndex {
    pub fn from_records(records: Vec<DemocracyRecord>) -> Self {
        let mut by_country: HashMap<String, HashMap<i64, usize>> = HashMap::new();

        for (idx, record) in records.iter().enumerate() {
            by_country
                .entry(record.ctryname.clone())
                .or_default()
                .entry(record.year)
                .or_insert(idx);
        }

        DemocracyIndex { records, by_country }
    }

    pub fn records(&self) -> &[DemocracyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains_country(&self, ctryname: &str) -> bool {
        self.by_country.contains_key(ctryname)
    }

    /// First record for (country, year)
    pub fn lookup(&self, ctryname: &str, year: i64) -> Option<&DemocracyRecord> {
        self.by_country
            .get(ctryname)
            .and_then(|years| years.get(&year))
            .map(|&idx| &self.records[idx])
    }

    /// All records of one country, in file order
    pub fn country_records<'a>(&'a self, ctryname: &'a str) -> impl Iterator<Item = &'a DemocracyRecord> + 'a {
        self.records.iter().filter(move |r| r.ctryname == ctryname)
    }
}

// ============================================================================
// PARSER
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct DemocracyParser {
    sentinels: SentinelSet,
}

struct ColumnMap {
    ctryname: usize,
    year: usize,
    democ: usize,
    liberty: usize,
    poptotal: usize,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord, file: &str) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| StudyError::format(file, 1, format!("missing column '{}'", name)))
        };

        Ok(ColumnMap {
            ctryname: find(REQUIRED_COLUMNS[0])?,
            year: find(REQUIRED_COLUMNS[1])?,
            democ: find(REQUIRED_COLUMNS[2])?,
            liberty: find(REQUIRED_COLUMNS[3])?,
            poptotal: find(REQUIRED_COLUMNS[4])?,
        })
    }
}

fn field<'r>(record: &'r StringRecord, idx: usize, name: &str, file: &str, line: usize) -> Result<&'r str> {
    record
        .get(idx)
        .ok_or_else(|| StudyError::format(file, line, format!("row has no '{}' field", name)))
}

fn parse_score(raw: &str, name: &str, file: &str, line: usize) -> Result<i64> {
    raw.trim().parse::<i64>().map_err(|_| {
        StudyError::format(file, line, format!("{} score is not an integer: {:?}", name, raw))
    })
}

impl DemocracyParser {
    pub fn new(sentinels: SentinelSet) -> Self {
        DemocracyParser { sentinels }
    }

    pub fn sentinels(&self) -> &SentinelSet {
        &self.sentinels
    }
}

impl SourceParser for DemocracyParser {
    type Output = (DemocracyIndex, LoadStats);

    fn parse_str(&self, content: &str, file: &str) -> Result<(DemocracyIndex, LoadStats)> {
        let mut reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .from_reader(content.as_bytes());

        let columns = ColumnMap::from_headers(reader.headers()?, file)?;

        let mut stats = LoadStats::default();
        let mut records = Vec::new();

        for result in reader.records() {
            let row = result?;
            let line = row.position().map_or(0, |p| p.line() as usize);
            stats.rows_read += 1;

            let democ_raw = field(&row, columns.democ, "democ", file, line)?;
            let liberty_raw = field(&row, columns.liberty, "liberty", file, line)?;

            if self.sentinels.is_sentinel(democ_raw) || self.sentinels.is_sentinel(liberty_raw) {
                stats.sentinel_rows += 1;
                continue;
            }

            let year_raw = field(&row, columns.year, "year", file, line)?;
            let year = year_raw.trim().parse::<i64>().map_err(|_| {
                StudyError::format(file, line, format!("year is not an integer: {:?}", year_raw))
            })?;

            let poptotal = field(&row, columns.poptotal, "poptotal", file, line)
                .ok()
                .and_then(|raw| raw.trim().parse::<u64>().ok());

            records.push(DemocracyRecord {
                ctryname: field(&row, columns.ctryname, "ctryname", file, line)?
                    .trim()
                    .to_uppercase(),
                year,
                democ: parse_score(democ_raw, "democ", file, line)?,
                liberty: parse_score(liberty_raw, "liberty", file, line)?,
                poptotal,
            });
        }

        stats.rows_kept = records.len();
        tracing::info!(
            file,
            rows = stats.rows_read,
            sentinel = stats.sentinel_rows,
            kept = stats.rows_kept,
            "loaded democracy index"
        );

        Ok((DemocracyIndex::from_records(records), stats))
    }

    fn kind(&self) -> SourceKind {
        SourceKind::DemocracyIndex
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "ctryname\tyear\tdemoc\tliberty\tpoptotal";

    fn table(rows: &[&str]) -> String {
        let mut out = HEADER.to_string();
        for row in rows {
            out.push('\n');
            out.push_str(row);
        }
        out
    }

    fn load(rows: &[&str]) -> (DemocracyIndex, LoadStats) {
        DemocracyParser::default()
            .parse_str(&table(rows), "democ.tsv")
            .unwrap()
    }

    #[test]
    fn test_fiji_row() {
        let (index, stats) = load(&["Fiji\t1987\t-3\t2\t700"]);

        assert_eq!(stats.rows_kept, 1);
        let fiji = index.lookup("FIJI", 1987).unwrap();
        assert_eq!(fiji.democ, -3);
        assert_eq!(fiji.liberty, 2);
        assert_eq!(fiji.poptotal, Some(700));
        assert_eq!(fiji.population(), Some(700_000));
    }

    #[test]
    fn test_sentinel_rows_excluded() {
        let (index, stats) = load(&[
            "FIJI\t1986\t-99\t2\t690",
            "FIJI\t1987\t-3\t2\t700",
            "FIJI\t1988\t-3\t-88\t705",
            "FIJI\t1989\t \t2\t710",
            "FIJI\t1990\t-55\t\t715",
        ]);

        assert_eq!(stats.rows_read, 5);
        assert_eq!(stats.sentinel_rows, 4);
        assert_eq!(index.len(), 1);
        assert!(index.lookup("FIJI", 1986).is_none());
        assert!(index.records().iter().all(|r| r.democ != -99 && r.liberty != -88));
    }

    #[test]
    fn test_custom_sentinels() {
        let parser = DemocracyParser::new(SentinelSet::new(["-66"]));
        let content = table(&["PERU\t1950\t-99\t3\t8000", "PERU\t1951\t-66\t3\t8100"]);

        // -99 is only a sentinel in the default set, so it parses as a score here
        let (index, stats) = parser.parse_str(&content, "democ.tsv").unwrap();
        assert_eq!(stats.sentinel_rows, 1);
        assert_eq!(index.lookup("PERU", 1950).unwrap().democ, -99);
    }

    #[test]
    fn test_duplicate_country_year_takes_first() {
        let (index, _) = load(&["CHILE\t1973\t-7\t1\t10000", "CHILE\t1973\t5\t6\t10001"]);

        assert_eq!(index.len(), 2);
        assert_eq!(index.lookup("CHILE", 1973).unwrap().democ, -7);
    }

    #[test]
    fn test_missing_population_is_none() {
        let (index, _) = load(&["NEPAL\t1990\t1\t4\t", "NEPAL\t1991\t1\t4\tn/a"]);
        assert_eq!(index.lookup("NEPAL", 1990).unwrap().population(), None);
        assert_eq!(index.lookup("NEPAL", 1991).unwrap().population(), None);
    }

    #[test]
    fn test_columns_found_by_name() {
        let content = "year\tpoptotal\tliberty\tctryname\tdemoc\textra\n1987\t700\t2\tFiji\t-3\tx";
        let (index, _) = DemocracyParser::default()
            .parse_str(content, "democ.tsv")
            .unwrap();
        assert_eq!(index.lookup("FIJI", 1987).unwrap().democ, -3);
    }

    #[test]
    fn test_missing_column_is_format_error() {
        let content = "ctryname\tyear\tdemoc\tpoptotal\nFIJI\t1987\t-3\t700";
        let err = DemocracyParser::default()
            .parse_str(content, "democ.tsv")
            .unwrap_err();
        assert!(err.is_format());
        assert!(err.to_string().contains("liberty"));
    }

    #[test]
    fn test_non_integer_score_is_format_error() {
        let content = table(&["FIJI\t1987\tthree\t2\t700"]);
        let err = DemocracyParser::default()
            .parse_str(&content, "democ.tsv")
            .unwrap_err();
        assert!(err.is_format());
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_contains_country_and_country_records() {
        let (index, _) = load(&[
            "Fiji\t1987\t-3\t2\t700",
            "PERU\t1950\t2\t3\t8000",
            "Fiji\t1988\t-2\t3\t705",
        ]);
        assert!(index.contains_country("FIJI"));
        assert!(!index.contains_country("Fiji"));
        assert_eq!(index.country_records("FIJI").count(), 2);

        assert_eq!(index.lookup("FIJI", 1988).unwrap().democ, -2);
        assert!(index.lookup("FIJI", 1950).is_none());
        assert!(index.lookup("PERU", 1987).is_none());
        assert!(index.lookup("CHILE", 1950).is_none());
    }
}
