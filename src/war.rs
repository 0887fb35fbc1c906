// ⚔️ War Register Parser
//
// Every war occupies two consecutive non-blank lines of the register:
//   even line: identifiers + up to three phase intervals (20 fields)
//   odd line:  outcome / demographic profile (16 fields + filler)
//
// Lines are paired by position, never by content.

use crate::error::{Result, StudyError};
use crate::parser::{SourceKind, SourceParser};
use serde::{Deserialize, Serialize};

// ============================================================================
// SCHEMAS
// ============================================================================

/// Named columns of the even (dates) line
pub const EVEN_COLUMNS: [&str; 20] = [
    "war number",
    "country code",
    "year of war start",
    "month of war start",
    "day of war start",
    "year of war end",
    "month of war end",
    "day of war end",
    "year of second war start",
    "month of second war start",
    "day of second war start",
    "year of second war end",
    "month of second war end",
    "day of second war end",
    "year of third war start",
    "month of third war start",
    "day of third war start",
    "year of third war end",
    "month of third war end",
    "day of third war end",
];

/// Named columns of the odd (profile) line, filler excluded
pub const ODD_COLUMNS: [&str; 16] = [
    "outside intervention",
    "fought in member of central sub-system",
    "fought in major power",
    "outcome of war",
    "western hemisphere",
    "europe",
    "africa",
    "middle east",
    "asia",
    "oceania",
    "fatalities",
    "duration",
    "population before war",
    "military",
    "system membership",
    "intervened by",
];

/// Trailing filler columns allowed after the 16 profile fields
pub const ODD_FILLER_MAX: usize = 4;

// ============================================================================
// RECORD TYPES
// ============================================================================

/// One (start, end) date sub-record of a war
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PhaseInterval {
    pub start_year: i64,
    pub start_month: i64,
    pub start_day: i64,
    pub end_year: i64,
    pub end_month: i64,
    pub end_day: i64,
}

impl PhaseInterval {
    fn from_values(v: &[i64]) -> Self {
        PhaseInterval {
            start_year: v[0],
            start_month: v[1],
            start_day: v[2],
            end_year: v[3],
            end_month: v[4],
            end_day: v[5],
        }
    }

    /// All six fields zero: the phase was never recorded
    pub fn is_empty(&self) -> bool {
        *self == PhaseInterval::default()
    }

    fn recorded(self) -> Option<Self> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

/// Regional involvement flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegionFlags {
    pub western_hemisphere: i64,
    pub europe: i64,
    pub africa: i64,
    pub middle_east: i64,
    pub asia: i64,
    pub oceania: i64,
}

/// Even line: identifiers and dates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRow {
    pub war_number: i64,
    pub country_code: i64,
    pub phases: [PhaseInterval; 3],
}

impl DateRow {
    fn from_values(v: &[i64]) -> Self {
        DateRow {
            war_number: v[0],
            country_code: v[1],
            phases: [
                PhaseInterval::from_values(&v[2..8]),
                PhaseInterval::from_values(&v[8..14]),
                PhaseInterval::from_values(&v[14..20]),
            ],
        }
    }
}

/// Odd line: outcome and demographic profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WarProfile {
    pub outside_intervention: i64,
    pub central_subsystem: i64,
    pub major_power: i64,
    pub outcome: i64,
    pub regions: RegionFlags,
    pub fatalities: i64,
    pub duration: i64,
    pub population_before: i64,
    pub military: i64,
    pub system_membership: i64,
    pub intervened_by: i64,
}

impl WarProfile {
    fn from_values(v: &[i64]) -> Self {
        WarProfile {
            outside_intervention: v[0],
            central_subsystem: v[1],
            major_power: v[2],
            outcome: v[3],
            regions: RegionFlags {
                western_hemisphere: v[4],
                europe: v[5],
                africa: v[6],
                middle_east: v[7],
                asia: v[8],
                oceania: v[9],
            },
            fatalities: v[10],
            duration: v[11],
            population_before: v[12],
            military: v[13],
            system_membership: v[14],
            intervened_by: v[15],
        }
    }
}

/// WarRecord - one war, merged from its date row and profile row
///
/// Years are stored as recorded (mod 1000). The first phase is always
/// present; later phases are `None` when every field is zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarRecord {
    pub war_number: i64,
    pub country_code: i64,
    pub first_phase: PhaseInterval,
    pub second_phase: Option<PhaseInterval>,
    pub third_phase: Option<PhaseInterval>,
    pub profile: WarProfile,
}

impl WarRecord {
    /// Merge a paired date row and profile row
    pub fn from_rows(dates: DateRow, profile: WarProfile) -> Self {
        let [first, second, third] = dates.phases;
        WarRecord {
            war_number: dates.war_number,
            country_code: dates.country_code,
            first_phase: first,
            second_phase: second.recorded(),
            third_phase: third.recorded(),
            profile,
        }
    }

    pub fn fatalities(&self) -> i64 {
        self.profile.fatalities
    }
}

// ============================================================================
// LINE PAIRING
// ============================================================================

/// A physical line with its 1-based line number
#[derive(Debug, Clone, Copy)]
pub struct SourceLine<'a> {
    pub number: usize,
    pub text: &'a str,
}

/// The two lines describing one war
#[derive(Debug, Clone, Copy)]
pub struct LinePair<'a> {
    pub dates: SourceLine<'a>,
    pub profile: SourceLine<'a>,
}

/// Non-blank register lines, validated to form whole pairs
#[derive(Debug)]
pub struct LinePairs<'a> {
    lines: Vec<SourceLine<'a>>,
}

impl<'a> LinePairs<'a> {
    /// Collect non-blank lines and check the count is positive and even
    pub fn new(content: &'a str, file: &str) -> Result<Self> {
        let lines: Vec<SourceLine<'a>> = content
            .lines()
            .enumerate()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(idx, text)| SourceLine {
                number: idx + 1,
                text,
            })
            .collect();

        if lines.is_empty() {
            return Err(StudyError::format(file, 0, "war register contains no lines"));
        }

        if lines.len() % 2 != 0 {
            let last = lines[lines.len() - 1].number;
            return Err(StudyError::format(
                file,
                last,
                format!(
                    "war register has {} non-blank lines; every war needs a dates line and a profile line",
                    lines.len()
                ),
            ));
        }

        Ok(LinePairs { lines })
    }

    /// Number of wars (pairs)
    pub fn len(&self) -> usize {
        self.lines.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Pair i is (line 2i, line 2i+1) of the non-blank lines
    pub fn iter(&self) -> impl Iterator<Item = LinePair<'a>> + '_ {
        (0..self.len()).map(move |i| LinePair {
            dates: self.lines[2 * i],
            profile: self.lines[2 * i + 1],
        })
    }
}

// ============================================================================
// FIELD PARSING
// ============================================================================

/// Parse an integer token; "7000.0" is accepted as 7000
fn parse_int(token: &str, column: &str, file: &str, line: usize) -> Result<i64> {
    if let Ok(value) = token.parse::<i64>() {
        return Ok(value);
    }

    // `as` would saturate, so out-of-range floats are rejected explicitly
    match token.parse::<f64>() {
        Ok(value)
            if value.fract() == 0.0 && value >= i64::MIN as f64 && value < i64::MAX as f64 =>
        {
            Ok(value as i64)
        }
        _ => Err(StudyError::format(
            file,
            line,
            format!("column '{}' is not an integer: {:?}", column, token),
        )),
    }
}

fn parse_values(tokens: &[&str], schema: &[&str], file: &str, line: usize) -> Result<Vec<i64>> {
    schema
        .iter()
        .zip(tokens)
        .map(|(column, token)| parse_int(token, column, file, line))
        .collect()
}

fn parse_date_row(line: SourceLine<'_>, file: &str) -> Result<DateRow> {
    let tokens: Vec<&str> = line.text.split_whitespace().collect();

    if tokens.len() != EVEN_COLUMNS.len() {
        return Err(StudyError::format(
            file,
            line.number,
            format!(
                "dates line has {} fields, expected {}",
                tokens.len(),
                EVEN_COLUMNS.len()
            ),
        ));
    }

    let values = parse_values(&tokens, &EVEN_COLUMNS, file, line.number)?;
    Ok(DateRow::from_values(&values))
}

fn parse_profile_row(line: SourceLine<'_>, file: &str) -> Result<WarProfile> {
    let tokens: Vec<&str> = line.text.split_whitespace().collect();
    let min = ODD_COLUMNS.len();
    let max = ODD_COLUMNS.len() + ODD_FILLER_MAX;

    if tokens.len() < min || tokens.len() > max {
        return Err(StudyError::format(
            file,
            line.number,
            format!(
                "profile line has {} fields, expected {} to {}",
                tokens.len(),
                min,
                max
            ),
        ));
    }

    // Filler columns past the schema are dropped unparsed
    let values = parse_values(&tokens[..min], &ODD_COLUMNS, file, line.number)?;
    Ok(WarProfile::from_values(&values))
}

// ============================================================================
// PARSER
// ============================================================================

/// Parses the whitespace-delimited civil war register
#[derive(Debug, Default, Clone, Copy)]
pub struct WarRecordParser;

impl WarRecordParser {
    pub fn new() -> Self {
        WarRecordParser
    }

    /// Merge each validated line pair into one WarRecord
    pub fn pair_records(&self, pairs: &LinePairs<'_>, file: &str) -> Result<Vec<WarRecord>> {
        pairs
            .iter()
            .map(|pair| {
                let dates = parse_date_row(pair.dates, file)?;
                let profile = parse_profile_row(pair.profile, file)?;
                Ok(WarRecord::from_rows(dates, profile))
            })
            .collect()
    }
}

impl SourceParser for WarRecordParser {
    type Output = Vec<WarRecord>;

    fn parse_str(&self, content: &str, file: &str) -> Result<Vec<WarRecord>> {
        let pairs = LinePairs::new(content, file)?;
        let records = self.pair_records(&pairs, file)?;
        tracing::info!(file, wars = records.len(), "parsed war register");
        Ok(records)
    }

    fn kind(&self) -> SourceKind {
        SourceKind::WarRegister
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SPAIN_DATES: &str = "601 230 821 1 1 823 12 31 0 0 0 0 0 0 0 0 0 0 0 0";
    const SPAIN_PROFILE: &str = "1 1 0 1 0 1 0 0 0 0 7000 36 11500 120 1 220";
    const RESUMED_DATES: &str = "602 2 861 4 12 861 12 31 862 3 1 865 4 9 0 0 0 0 0 0";
    const RESUMED_PROFILE: &str = "0 1 1 1 1 0 0 0 0 0 650000 48 31000 900 1 0 0 0 0 0";

    fn register() -> String {
        format!(
            "{}\n{}\n{}\n{}\n",
            SPAIN_DATES, SPAIN_PROFILE, RESUMED_DATES, RESUMED_PROFILE
        )
    }

    #[test]
    fn test_parse_two_wars() {
        let wars = WarRecordParser::new().parse_str(&register(), "wars.txt").unwrap();

        assert_eq!(wars.len(), 2);
        assert_eq!(wars[0].war_number, 601);
        assert_eq!(wars[0].country_code, 230);
        assert_eq!(wars[0].first_phase.start_year, 821);
        assert_eq!(wars[0].first_phase.end_year, 823);
        assert_eq!(wars[0].fatalities(), 7000);
        assert_eq!(wars[0].profile.population_before, 11500);
        assert_eq!(wars[0].profile.regions.europe, 1);
        assert_eq!(wars[0].second_phase, None);
    }

    #[test]
    fn test_second_phase_recorded() {
        let wars = WarRecordParser::new().parse_str(&register(), "wars.txt").unwrap();
        let second = wars[1].second_phase.expect("second phase present");

        assert_eq!(second.start_year, 862);
        assert_eq!(second.end_year, 865);
        assert_eq!(wars[1].third_phase, None);
    }

    #[test]
    fn test_filler_columns_discarded() {
        let wars = WarRecordParser::new().parse_str(&register(), "wars.txt").unwrap();
        assert_eq!(wars[1].fatalities(), 650000);
        assert_eq!(wars[1].profile.intervened_by, 0);
    }

    #[test]
    fn test_record_count_is_half_the_lines() {
        let content = register().repeat(3);
        let pairs = LinePairs::new(&content, "wars.txt").unwrap();
        assert_eq!(pairs.len(), 6);

        let wars = WarRecordParser::new().parse_str(&content, "wars.txt").unwrap();
        assert_eq!(wars.len(), content.lines().count() / 2);
    }

    #[test]
    fn test_parse_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("09905-0002-Data.txt");
        std::fs::write(&path, register()).unwrap();

        let wars = WarRecordParser::new().parse(&path).unwrap();
        assert_eq!(wars.len(), 2);
        assert_eq!(WarRecordParser::new().kind(), SourceKind::WarRegister);
    }

    #[test]
    fn test_blank_lines_ignored() {
        let content = format!("\n{}\n\n{}\n   \n", SPAIN_DATES, SPAIN_PROFILE);
        let wars = WarRecordParser::new().parse_str(&content, "wars.txt").unwrap();
        assert_eq!(wars.len(), 1);
    }

    #[test]
    fn test_odd_line_count_is_format_error() {
        let content = format!("{}\n{}\n{}\n", SPAIN_DATES, SPAIN_PROFILE, RESUMED_DATES);
        let err = WarRecordParser::new().parse_str(&content, "wars.txt").unwrap_err();

        assert!(err.is_format());
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_empty_file_is_format_error() {
        let err = WarRecordParser::new().parse_str("\n\n", "wars.txt").unwrap_err();
        assert!(err.is_format());
    }

    #[test]
    fn test_short_dates_line_is_format_error() {
        let content = format!("601 230 821\n{}\n", SPAIN_PROFILE);
        let err = WarRecordParser::new().parse_str(&content, "wars.txt").unwrap_err();

        assert!(err.is_format());
        assert!(err.to_string().contains("dates line has 3 fields"));
    }

    #[test]
    fn test_overlong_profile_line_is_format_error() {
        let content = format!("{}\n{} 0 0 0 0 0\n", SPAIN_DATES, SPAIN_PROFILE);
        let err = WarRecordParser::new().parse_str(&content, "wars.txt").unwrap_err();
        assert!(err.to_string().contains("profile line has 21 fields"));
    }

    #[test]
    fn test_float_token_with_zero_fraction_accepted() {
        let profile = SPAIN_PROFILE.replace("7000", "7000.0");
        let content = format!("{}\n{}\n", SPAIN_DATES, profile);
        let wars = WarRecordParser::new().parse_str(&content, "wars.txt").unwrap();
        assert_eq!(wars[0].fatalities(), 7000);
    }

    #[test]
    fn test_out_of_range_token_is_format_error() {
        let dates = SPAIN_DATES.replacen("821", "1e300", 1);
        let content = format!("{}\n{}\n", dates, SPAIN_PROFILE);
        let err = WarRecordParser::new().parse_str(&content, "wars.txt").unwrap_err();
        assert!(err.to_string().contains("year of war start"));

        let profile = SPAIN_PROFILE.replace("7000", "99999999999999999999999");
        let content = format!("{}\n{}\n", SPAIN_DATES, profile);
        let err = WarRecordParser::new().parse_str(&content, "wars.txt").unwrap_err();
        assert!(err.is_format());
        assert!(err.to_string().contains("fatalities"));
    }

    #[test]
    fn test_non_numeric_token_is_format_error() {
        let profile = SPAIN_PROFILE.replace("7000", "many");
        let content = format!("{}\n{}\n", SPAIN_DATES, profile);
        let err = WarRecordParser::new().parse_str(&content, "wars.txt").unwrap_err();

        assert!(err.is_format());
        assert!(err.to_string().contains("fatalities"));
    }
}
