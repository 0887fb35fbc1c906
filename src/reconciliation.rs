// 🌍 Country Name Reconciliation - Rules as Data
//
// Closed table mapping codebook country names onto the vocabulary of the
// democracy index: typo fixes, renames, and one split of a dissolved
// union into its successor states.
//
// Each rule is tested against the name as recorded in the codebook.
// A renamed record is never re-tested against later rules.

use crate::merge::CodedWar;
use crate::war::WarProfile;
use serde::{Deserialize, Serialize};

// ============================================================================
// RULE DEFINITION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CountryRule {
    /// 1:1 replacement
    Rename { from: String, to: String },

    /// One record becomes one copy per successor
    Split { from: String, successors: Vec<String> },
}

impl CountryRule {
    pub fn rename(from: &str, to: &str) -> Self {
        CountryRule::Rename {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn split(from: &str, successors: &[&str]) -> Self {
        CountryRule::Split {
            from: from.to_string(),
            successors: successors.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Recorded name this rule applies to
    pub fn source(&self) -> &str {
        match self {
            CountryRule::Rename { from, .. } => from,
            CountryRule::Split { from, .. } => from,
        }
    }

    /// Names the rule produces, before upper-casing
    pub fn targets(&self) -> Vec<&str> {
        match self {
            CountryRule::Rename { to, .. } => vec![to.as_str()],
            CountryRule::Split { successors, .. } => {
                successors.iter().map(|s| s.as_str()).collect()
            }
        }
    }
}

/// The hand-maintained correction table, in application order
pub fn standard_rules() -> Vec<CountryRule> {
    vec![
        // Dissolved dual monarchy
        CountryRule::split("AUSTRIA-HUNGARY", &["AUSTRIA", "HUNGARY"]),
        // Transcription typos and historical names
        CountryRule::rename("BRUNDI", "BURUNDI"),
        CountryRule::rename("FINNISH", "FINLAND"),
        CountryRule::rename("RUMANIA", "ROMANIA"),
        CountryRule::rename("TURKEY/OTTOMAN EMPIRE", "TURKEY"),
        CountryRule::rename("UGANDAN", "UGANDA"),
        CountryRule::rename("RUSSIA/SOVIET UNION", "Russian Federation"),
        CountryRule::rename("KAMPUCHEA", "CAMBODIA"),
        // Democracy index vocabulary
        CountryRule::rename("BOSNIA", "Bosnia and Herzegov"),
        CountryRule::rename("BURMA", "Myanmar"),
        CountryRule::rename("IRAN", "Iran, Islamic Rep"),
        CountryRule::rename("LAOS", "Lao Pdr"),
        CountryRule::rename("RUSSIA", "Russian Federation"),
        CountryRule::rename("SOUTH YEMEN", "Yemen Pdr"),
        CountryRule::rename("UNITED STATES OF AMERICA", "United States"),
        CountryRule::rename("TAKJIKISTAN", "Tajikistan"),
        CountryRule::rename("VIETNAM, REPUBLIC OF", "Vietnam, North"),
        CountryRule::rename("YEMEN ARAB REPUBLIC", "Yemen, Rep."),
    ]
}

// ============================================================================
// RECONCILED RECORD
// ============================================================================

/// A coded war carrying the canonical join key `ctryname`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciledWar {
    pub war_number: i64,
    pub country_code: i64,
    pub ctryname: String,
    /// Name as recorded in the codebook
    pub recorded_country: String,
    pub start_year: i64,
    pub start_month: i64,
    pub start_day: i64,
    pub end_year: i64,
    pub end_month: i64,
    pub end_day: i64,
    pub profile: WarProfile,
}

impl ReconciledWar {
    fn from_coded(war: &CodedWar, ctryname: String) -> Self {
        ReconciledWar {
            war_number: war.war_number,
            country_code: war.country_code,
            ctryname,
            recorded_country: war.country.clone(),
            start_year: war.start_year,
            start_month: war.start_month,
            start_day: war.start_day,
            end_year: war.end_year,
            end_month: war.end_month,
            end_day: war.end_day,
            profile: war.profile,
        }
    }

    pub fn fatalities(&self) -> i64 {
        self.profile.fatalities
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileStats {
    pub records_in: usize,
    pub renamed: usize,
    pub split: usize,
    pub records_out: usize,
}

// ============================================================================
// RECONCILER
// ============================================================================

pub struct CountryReconciler {
    rules: Vec<CountryRule>,
}

impl CountryReconciler {
    /// Reconciler over the standard correction table
    pub fn standard() -> Self {
        CountryReconciler::from_rules(standard_rules())
    }

    /// Rules keep their given order; the first match wins
    pub fn from_rules(rules: Vec<CountryRule>) -> Self {
        CountryReconciler { rules }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// First rule whose source equals the recorded name
    pub fn rule_for(&self, recorded: &str) -> Option<&CountryRule> {
        self.rules.iter().find(|rule| rule.source() == recorded)
    }

    /// Canonical names for a recorded name: one, or one per successor
    pub fn resolve(&self, recorded: &str) -> Vec<String> {
        match self.rule_for(recorded) {
            Some(rule) => rule.targets().into_iter().map(canonical).collect(),
            None => vec![canonical(recorded)],
        }
    }

    /// Replacement records for one war (1 or N)
    pub fn reconcile_war(&self, war: &CodedWar) -> Vec<ReconciledWar> {
        self.resolve(&war.country)
            .into_iter()
            .map(|name| ReconciledWar::from_coded(war, name))
            .collect()
    }

    /// Build the reconciled table from a read-only pass over the input
    pub fn reconcile(&self, wars: &[CodedWar]) -> (Vec<ReconciledWar>, ReconcileStats) {
        let mut stats = ReconcileStats {
            records_in: wars.len(),
            ..ReconcileStats::default()
        };

        for war in wars {
            match self.rule_for(&war.country) {
                Some(CountryRule::Rename { .. }) => stats.renamed += 1,
                Some(CountryRule::Split { .. }) => stats.split += 1,
                None => {}
            }
        }

        let reconciled: Vec<ReconciledWar> =
            wars.iter().flat_map(|war| self.reconcile_war(war)).collect();
        stats.records_out = reconciled.len();

        tracing::info!(
            records_in = stats.records_in,
            renamed = stats.renamed,
            split = stats.split,
            records_out = stats.records_out,
            "reconciled country names"
        );

        (reconciled, stats)
    }
}

impl Default for CountryReconciler {
    fn default() -> Self {
        Self::standard()
    }
}

/// Join keys are compared upper-cased
fn canonical(name: &str) -> String {
    name.to_uppercase()
}

// ============================================================================
// TESTS
// ============================================================================
