// Conflict/Democracy Study - Core Library
// Reconciles the civil war register, its codebook and the democracy index,
// then joins them into before/after score tables.

pub mod error;
pub mod parser;
pub mod war;
pub mod codebook;
pub mod merge;
pub mod reconciliation;
pub mod democracy;
pub mod join;
pub mod analysis;
pub mod config;
pub mod pipeline;
pub mod export;

// Re-export commonly used types
pub use error::{Result, StudyError};
pub use parser::{
    SourceParser, SourceKind, SourceFile,
    detect_source, file_label,
};
pub use war::{
    WarRecordParser, WarRecord, WarProfile, PhaseInterval, RegionFlags,
    LinePairs, LinePair, SourceLine,
};
pub use codebook::{CodebookParser, CodebookEntry, CodebookWindow};
pub use merge::{merge_codebook, effective_years, CodedWar, MergeStats, YEAR_OFFSET};
pub use reconciliation::{
    CountryReconciler, CountryRule, ReconciledWar, ReconcileStats, standard_rules,
};
pub use democracy::{
    DemocracyParser, DemocracyIndex, DemocracyRecord, SentinelSet, LoadStats,
    POPULATION_SCALE,
};
pub use join::{
    DemocracyJoinEngine, JoinConfig, JoinedOutcome, JoinStats, LookupMiss,
    ScenarioTable, ScoreKind, fatality_ratio,
};
pub use analysis::{
    CountryFatalities, ScoreComparison, LinearFit,
    fatalities_per_country, score_comparison, score_comparisons, linear_fit,
    pooled_t_statistic, two_sided_p_value,
};
pub use config::{StudyConfig, InputPaths};
pub use pipeline::{Pipeline, StudyReport, StageCounts, InputProvenance, ScenarioFit, run_scenarios};
pub use export::{ExportFormat, export_report, write_csv, write_json};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
