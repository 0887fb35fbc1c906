// 📈 Democracy Join Engine
//
// For each reconciled war, look up the index row in the war's start year
// ("before") and in end year + lag ("after"). Wars missing either row are
// dropped: that is absent historical data, not an error.

use crate::democracy::{DemocracyIndex, DemocracyRecord};
use crate::reconciliation::ReconciledWar;
use serde::{Deserialize, Serialize};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Which index column a join scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreKind {
    Democracy,
    Liberty,
}

impl ScoreKind {
    pub const ALL: [ScoreKind; 2] = [ScoreKind::Democracy, ScoreKind::Liberty];

    /// Column name in the index file
    pub fn column(&self) -> &'static str {
        match self {
            ScoreKind::Democracy => "democ",
            ScoreKind::Liberty => "liberty",
        }
    }

    pub fn score(&self, record: &DemocracyRecord) -> i64 {
        match self {
            ScoreKind::Democracy => record.democ,
            ScoreKind::Liberty => record.liberty,
        }
    }
}

/// One join scenario: restoration lag plus scored column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinConfig {
    pub lag: i64,
    pub score: ScoreKind,
}

impl JoinConfig {
    pub fn new(lag: i64, score: ScoreKind) -> Self {
        JoinConfig { lag, score }
    }

    /// Scenario name, e.g. "democ20" or "liberty5"
    pub fn name(&self) -> String {
        format!("{}{}", self.score.column(), self.lag)
    }
}

// ============================================================================
// OUTPUT
// ============================================================================

/// Before/after scores for one (war, country) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinedOutcome {
    pub ctryname: String,
    pub war_number: i64,
    pub start_year: i64,
    pub score_before: i64,
    pub fatalities: i64,
    /// Restored population in the start year
    pub population: Option<u64>,
    pub ratio: f64,
    pub after_year: i64,
    pub score_after: i64,
    pub delta: i64,
}

/// Why a war produced no outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupMiss {
    Country,
    StartYear,
    AfterYear,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinStats {
    pub wars_in: usize,
    pub country_missing: usize,
    pub start_year_missing: usize,
    pub after_year_missing: usize,
    pub joined: usize,
}

impl JoinStats {
    fn record_miss(&mut self, miss: LookupMiss) {
        match miss {
            LookupMiss::Country => self.country_missing += 1,
            LookupMiss::StartYear => self.start_year_missing += 1,
            LookupMiss::AfterYear => self.after_year_missing += 1,
        }
    }
}

/// Joined rows of one scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioTable {
    pub name: String,
    pub config: JoinConfig,
    pub stats: JoinStats,
    pub rows: Vec<JoinedOutcome>,
}

/// fatalities / population, 0 when population is missing or zero
pub fn fatality_ratio(fatalities: i64, population: Option<u64>) -> f64 {
    match population {
        Some(pop) if pop > 0 => fatalities as f64 / pop as f64,
        _ => 0.0,
    }
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct DemocracyJoinEngine<'a> {
    index: &'a DemocracyIndex,
}

impl<'a> DemocracyJoinEngine<'a> {
    pub fn new(index: &'a DemocracyIndex) -> Self {
        DemocracyJoinEngine { index }
    }

    /// Join a single war, or say which lookup missed
    pub fn join_war(
        &self,
        war: &ReconciledWar,
        config: JoinConfig,
    ) -> std::result::Result<JoinedOutcome, LookupMiss> {
        if !self.index.contains_country(&war.ctryname) {
            return Err(LookupMiss::Country);
        }

        let before = self
            .index
            .lookup(&war.ctryname, war.start_year)
            .ok_or(LookupMiss::StartYear)?;

        // a year past i64 cannot be in the index either
        let after_year = war
            .end_year
            .checked_add(config.lag)
            .ok_or(LookupMiss::AfterYear)?;
        let after = self
            .index
            .lookup(&war.ctryname, after_year)
            .ok_or(LookupMiss::AfterYear)?;

        let score_before = config.score.score(before);
        let score_after = config.score.score(after);
        let population = before.population();

        Ok(JoinedOutcome {
            ctryname: war.ctryname.clone(),
            war_number: war.war_number,
            start_year: war.start_year,
            score_before,
            fatalities: war.fatalities(),
            population,
            ratio: fatality_ratio(war.fatalities(), population),
            after_year,
            score_after,
            delta: score_after - score_before,
        })
    }

    /// Join every war, keeping input order
    pub fn join(&self, wars: &[ReconciledWar], config: JoinConfig) -> (Vec<JoinedOutcome>, JoinStats) {
        let mut stats = JoinStats {
            wars_in: wars.len(),
            ..JoinStats::default()
        };
        let mut rows = Vec::new();

        for war in wars {
            match self.join_war(war, config) {
                Ok(outcome) => rows.push(outcome),
                Err(miss) => {
                    tracing::debug!(
                        war_number = war.war_number,
                        ctryname = %war.ctryname,
                        ?miss,
                        "no index match, dropping war"
                    );
                    stats.record_miss(miss);
                }
            }
        }

        stats.joined = rows.len();
        (rows, stats)
    }

    /// Run one named scenario
    pub fn scenario(&self, wars: &[ReconciledWar], config: JoinConfig) -> ScenarioTable {
        let (rows, stats) = self.join(wars, config);
        let name = config.name();

        tracing::info!(
            scenario = %name,
            joined = stats.joined,
            dropped = stats.wars_in - stats.joined,
            "joined scenario"
        );

        ScenarioTable {
            name,
            config,
            stats,
            rows,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::war::WarProfile;

    fn record(ctry: &str, year: i64, democ: i64, liberty: i64, poptotal: Option<u64>) -> DemocracyRecord {
        DemocracyRecord {
            ctryname: ctry.to_string(),
            year,
            democ,
            liberty,
            poptotal,
        }
    }

    fn war(ctry: &str, start: i64, end: i64, fatalities: i64) -> ReconciledWar {
        ReconciledWar {
            war_number: 900,
            country_code: 950,
            ctryname: ctry.to_string(),
            recorded_country: ctry.to_string(),
            start_year: start,
            start_month: 5,
            start_day: 14,
            end_year: end,
            end_month: 10,
            end_day: 1,
            profile: WarProfile {
                fatalities,
                ..WarProfile::default()
            },
        }
    }

    fn fiji_index() -> DemocracyIndex {
        DemocracyIndex::from_records(vec![
            record("FIJI", 1987, -3, 2, Some(700)),
            record("FIJI", 1992, 5, 4, Some(750)),
            record("FIJI", 1997, 6, 5, Some(780)),
            record("FIJI", 2007, 6, 3, Some(830)),
        ])
    }

    #[test]
    fn test_fiji_example() {
        let index = fiji_index();
        let engine = DemocracyJoinEngine::new(&index);

        let outcome = engine
            .join_war(&war("FIJI", 1987, 1987, 1000), JoinConfig::new(5, ScoreKind::Democracy))
            .unwrap();

        assert_eq!(outcome.score_before, -3);
        assert_eq!(outcome.population, Some(700_000));
        assert!((outcome.ratio - 1000.0 / 700_000.0).abs() < 1e-12);
        assert_eq!(outcome.after_year, 1992);
        assert_eq!(outcome.score_after, 5);
        assert_eq!(outcome.delta, 8);
    }

    #[test]
    fn test_liberty_scores_other_column() {
        let index = fiji_index();
        let engine = DemocracyJoinEngine::new(&index);

        let outcome = engine
            .join_war(&war("FIJI", 1987, 1987, 1000), JoinConfig::new(10, ScoreKind::Liberty))
            .unwrap();

        assert_eq!(outcome.score_before, 2);
        assert_eq!(outcome.score_after, 5);
        assert_eq!(outcome.delta, 3);
    }

    #[test]
    fn test_lag_scenarios_independent() {
        let index = DemocracyIndex::from_records(vec![
            record("PERU", 1980, 7, 5, Some(17000)),
            record("PERU", 1995, 1, 2, Some(24000)),
            record("PERU", 2000, 1, 3, Some(25900)),
            record("PERU", 2010, 9, 6, Some(29300)),
        ]);
        let engine = DemocracyJoinEngine::new(&index);
        let wars = vec![war("PERU", 1980, 1990, 69000)];

        let (lag5, _) = engine.join(&wars, JoinConfig::new(5, ScoreKind::Democracy));
        let (lag10, _) = engine.join(&wars, JoinConfig::new(10, ScoreKind::Democracy));
        let (lag20, _) = engine.join(&wars, JoinConfig::new(20, ScoreKind::Democracy));

        assert_eq!(lag5[0].after_year, 1995);
        assert_eq!(lag10[0].after_year, 2000);
        assert_eq!(lag20[0].after_year, 2010);
        assert_eq!(lag10[0].delta, -6);
    }

    #[test]
    fn test_misses_dropped_and_counted() {
        let index = fiji_index();
        let engine = DemocracyJoinEngine::new(&index);
        let wars = vec![
            war("SARDINIA", 1849, 1849, 100),
            war("FIJI", 1986, 1987, 10),
            war("FIJI", 1987, 2010, 10),
            war("FIJI", 1987, 1987, 1000),
        ];

        let (rows, stats) = engine.join(&wars, JoinConfig::new(5, ScoreKind::Democracy));

        assert_eq!(rows.len(), 1);
        assert_eq!(stats.country_missing, 1);
        assert_eq!(stats.start_year_missing, 1);
        assert_eq!(stats.after_year_missing, 1);
        assert_eq!(stats.joined, 1);
    }

    #[test]
    fn test_after_year_overflow_is_a_miss() {
        let index = DemocracyIndex::from_records(vec![record("FIJI", i64::MAX - 2, 1, 1, None)]);
        let engine = DemocracyJoinEngine::new(&index);
        let w = war("FIJI", i64::MAX - 2, i64::MAX - 2, 10);

        let miss = engine
            .join_war(&w, JoinConfig::new(5, ScoreKind::Democracy))
            .unwrap_err();
        assert_eq!(miss, LookupMiss::AfterYear);

        let (rows, stats) = engine.join(&[w], JoinConfig::new(5, ScoreKind::Democracy));
        assert!(rows.is_empty());
        assert_eq!(stats.after_year_missing, 1);
    }

    #[test]
    fn test_zero_or_missing_population_gives_zero_ratio() {
        assert_eq!(fatality_ratio(500, None), 0.0);
        assert_eq!(fatality_ratio(500, Some(0)), 0.0);

        let index = DemocracyIndex::from_records(vec![
            record("HAITI", 1991, -7, 1, None),
            record("HAITI", 2001, 2, 4, None),
        ]);
        let engine = DemocracyJoinEngine::new(&index);
        let outcome = engine
            .join_war(&war("HAITI", 1991, 1991, 3000), JoinConfig::new(10, ScoreKind::Democracy))
            .unwrap();
        assert_eq!(outcome.ratio, 0.0);
        assert_eq!(outcome.population, None);
    }

    #[test]
    fn test_join_is_idempotent() {
        let index = fiji_index();
        let engine = DemocracyJoinEngine::new(&index);
        let wars = vec![war("FIJI", 1987, 1987, 1000), war("FIJI", 1987, 1992, 50)];
        let config = JoinConfig::new(5, ScoreKind::Democracy);

        let (first, first_stats) = engine.join(&wars, config);
        let (second, second_stats) = engine.join(&wars, config);

        assert_eq!(first, second);
        assert_eq!(first_stats, second_stats);
    }

    #[test]
    fn test_scenario_names() {
        assert_eq!(JoinConfig::new(20, ScoreKind::Democracy).name(), "democ20");
        assert_eq!(JoinConfig::new(5, ScoreKind::Liberty).name(), "liberty5");

        let index = fiji_index();
        let table = DemocracyJoinEngine::new(&index)
            .scenario(&[war("FIJI", 1987, 1987, 1000)], JoinConfig::new(10, ScoreKind::Liberty));
        assert_eq!(table.name, "liberty10");
        assert_eq!(table.rows.len(), 1);
    }
}
