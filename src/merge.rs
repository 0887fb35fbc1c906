// 🔗 War ↔ Codebook Merge
//
// Inner join on war number. Years in the register are stored mod 1000
// (821 = 1821), so the primary start/end years get the offset back.
// A recorded second-phase end year replaces the primary end year:
// the war resumed after an apparent conclusion.
//
// Known limitation: when the second phase has no end year, the third
// phase is never consulted.

use crate::codebook::CodebookEntry;
use crate::war::{WarProfile, WarRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Offset restoring the century the register drops
pub const YEAR_OFFSET: i64 = 1000;

/// A war with its country name and effective start/end years
///
/// Second and third phase dates are gone; `end_year` already reflects a
/// resumed war. Month/day fields are those of the first phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodedWar {
    pub war_number: i64,
    pub country_code: i64,
    pub country: String,
    pub start_year: i64,
    pub start_month: i64,
    pub start_day: i64,
    pub end_year: i64,
    pub end_month: i64,
    pub end_day: i64,
    pub profile: WarProfile,
}

impl CodedWar {
    pub fn fatalities(&self) -> i64 {
        self.profile.fatalities
    }
}

/// Counts for the silent, lossy join
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeStats {
    pub wars_in: usize,
    pub codebook_entries: usize,
    pub unmatched_wars: usize,
    pub resumed_wars: usize,
    pub ignored_third_phases: usize,
    /// Wars whose restored years do not fit an i64
    pub year_overflows: usize,
    pub coded_out: usize,
}

/// Year transformation for one war: (start, effective end)
///
/// `None` when adding the offset overflows.
pub fn effective_years(war: &WarRecord) -> Option<(i64, i64)> {
    let start = war.first_phase.start_year.checked_add(YEAR_OFFSET)?;
    let end = match war.second_phase {
        Some(second) if second.end_year != 0 => second.end_year,
        _ => war.first_phase.end_year,
    };
    Some((start, end.checked_add(YEAR_OFFSET)?))
}

fn code_war(war: &WarRecord, country: &str, (start_year, end_year): (i64, i64)) -> CodedWar {
    CodedWar {
        war_number: war.war_number,
        country_code: war.country_code,
        country: country.to_string(),
        start_year,
        start_month: war.first_phase.start_month,
        start_day: war.first_phase.start_day,
        end_year,
        end_month: war.first_phase.end_month,
        end_day: war.first_phase.end_day,
        profile: war.profile,
    }
}

/// Join wars to codebook names, in war-register order
///
/// Every codebook row matching a war number yields one output row.
pub fn merge_codebook(wars: &[WarRecord], codebook: &[CodebookEntry]) -> (Vec<CodedWar>, MergeStats) {
    let mut names: HashMap<i64, Vec<&str>> = HashMap::new();
    for entry in codebook {
        names
            .entry(entry.war_number)
            .or_default()
            .push(entry.country.as_str());
    }

    let mut stats = MergeStats {
        wars_in: wars.len(),
        codebook_entries: codebook.len(),
        ..MergeStats::default()
    };
    let mut coded = Vec::new();

    for war in wars {
        let Some(countries) = names.get(&war.war_number) else {
            tracing::debug!(war_number = war.war_number, "no codebook entry, dropping war");
            stats.unmatched_wars += 1;
            continue;
        };

        let second_end = war.second_phase.map_or(0, |p| p.end_year);
        if second_end != 0 {
            stats.resumed_wars += 1;
        } else if war.third_phase.is_some() {
            tracing::debug!(
                war_number = war.war_number,
                "third phase recorded without a second-phase end year; ignored"
            );
            stats.ignored_third_phases += 1;
        }

        let Some(years) = effective_years(war) else {
            tracing::warn!(war_number = war.war_number, "year out of range after century offset, dropping war");
            stats.year_overflows += 1;
            continue;
        };

        coded.extend(countries.iter().map(|country| code_war(war, country, years)));
    }

    stats.coded_out = coded.len();
    tracing::info!(
        wars = stats.wars_in,
        coded = stats.coded_out,
        unmatched = stats.unmatched_wars,
        "merged wars with codebook"
    );

    (coded, stats)
}
