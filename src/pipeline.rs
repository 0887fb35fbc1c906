// 🔄 Study Pipeline
//
// raw text → war table → coded wars → reconciled wars → scenario tables
//
// Each stage fully materializes its table before the next one starts.
// Nothing is shared between stages except the tables themselves.

use crate::analysis::{
    fatalities_per_country, linear_fit, score_comparisons, CountryFatalities, LinearFit,
    ScoreComparison,
};
use crate::codebook::CodebookParser;
use crate::config::StudyConfig;
use crate::democracy::{DemocracyIndex, DemocracyParser, LoadStats};
use crate::error::Result;
use crate::join::{DemocracyJoinEngine, JoinConfig, ScenarioTable};
use crate::merge::{merge_codebook, MergeStats};
use crate::parser::{SourceFile, SourceKind, SourceParser};
use crate::reconciliation::{CountryReconciler, ReconcileStats, ReconciledWar};
use crate::war::WarRecordParser;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// REPORT
// ============================================================================

/// Where an input came from, for reproducibility
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputProvenance {
    pub kind: SourceKind,
    pub path: PathBuf,
    pub sha256: String,
}

impl From<&SourceFile> for InputProvenance {
    fn from(source: &SourceFile) -> Self {
        InputProvenance {
            kind: source.kind,
            path: source.path.clone(),
            sha256: source.sha256.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageCounts {
    pub wars_parsed: usize,
    pub codebook_entries: usize,
    pub merge: MergeStats,
    pub reconcile: ReconcileStats,
    pub index: LoadStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioFit {
    pub name: String,
    pub fit: Option<LinearFit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyReport {
    pub generated_at: DateTime<Utc>,
    pub inputs: Vec<InputProvenance>,
    pub counts: StageCounts,
    pub wars: Vec<ReconciledWar>,
    pub fatalities: Vec<CountryFatalities>,
    pub score_comparisons: Vec<ScoreComparison>,
    pub scenarios: Vec<ScenarioTable>,
    pub fits: Vec<ScenarioFit>,
}

impl StudyReport {
    pub fn scenario(&self, name: &str) -> Option<&ScenarioTable> {
        self.scenarios.iter().find(|s| s.name == name)
    }

    pub fn summary(&self) -> String {
        format!(
            "{} wars parsed, {} coded, {} reconciled, {} index rows, {} scenarios",
            self.counts.wars_parsed,
            self.counts.merge.coded_out,
            self.counts.reconcile.records_out,
            self.counts.index.rows_kept,
            self.scenarios.len()
        )
    }
}

// ============================================================================
// STAGE FUNCTIONS
// ============================================================================

/// Every configured scenario over the same reconciled table
pub fn run_scenarios(
    index: &DemocracyIndex,
    wars: &[ReconciledWar],
    scenarios: &[JoinConfig],
) -> Vec<ScenarioTable> {
    let engine = DemocracyJoinEngine::new(index);
    scenarios
        .iter()
        .map(|&config| engine.scenario(wars, config))
        .collect()
}

// ============================================================================
// PIPELINE
// ============================================================================

pub struct Pipeline {
    config: StudyConfig,
}

impl Pipeline {
    pub fn new(config: StudyConfig) -> Result<Self> {
        config.validate()?;
        Ok(Pipeline { config })
    }

    pub fn config(&self) -> &StudyConfig {
        &self.config
    }

    /// Read the three configured inputs and run the study
    pub fn run(&self) -> Result<StudyReport> {
        let inputs = &self.config.inputs;
        let wars = SourceFile::load(&inputs.war_register, SourceKind::WarRegister)?;
        let codebook = SourceFile::load(&inputs.codebook, SourceKind::Codebook)?;
        let democracy = SourceFile::load(&inputs.democracy_index, SourceKind::DemocracyIndex)?;

        self.run_sources(&wars, &codebook, &democracy)
    }

    /// Run the study over already-read inputs
    pub fn run_sources(
        &self,
        wars: &SourceFile,
        codebook: &SourceFile,
        democracy: &SourceFile,
    ) -> Result<StudyReport> {
        let records = WarRecordParser::new().parse_str(&wars.text, &wars.label())?;
        let entries = CodebookParser::new(self.config.codebook_window)
            .parse_str(&codebook.text, &codebook.label())?;
        let (index, index_stats) = DemocracyParser::new(self.config.sentinel_set())
            .parse_str(&democracy.text, &democracy.label())?;

        let (coded, merge_stats) = merge_codebook(&records, &entries);
        let (reconciled, reconcile_stats) = CountryReconciler::standard().reconcile(&coded);

        let scenarios = run_scenarios(&index, &reconciled, &self.config.scenarios());
        let fits = scenarios
            .iter()
            .map(|s| ScenarioFit {
                name: s.name.clone(),
                fit: linear_fit(&s.rows),
            })
            .collect();

        let fatalities = fatalities_per_country(&reconciled);
        let comparisons = score_comparisons(&index, &fatalities);

        Ok(StudyReport {
            generated_at: Utc::now(),
            inputs: vec![wars.into(), codebook.into(), democracy.into()],
            counts: StageCounts {
                wars_parsed: records.len(),
                codebook_entries: entries.len(),
                merge: merge_stats,
                reconcile: reconcile_stats,
                index: index_stats,
            },
            wars: reconciled,
            fatalities,
            score_comparisons: comparisons,
            scenarios,
            fits,
        })
    }
}
