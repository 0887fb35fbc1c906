// 🏗️ Parser Framework
// One parser per input file of the study: war register, codebook, democracy index

use crate::error::{Result, StudyError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// CORE TYPES
// ============================================================================

/// SourceKind - which of the three study inputs a file is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    WarRegister,
    Codebook,
    DemocracyIndex,
}

impl SourceKind {
    /// Human-readable name for display
    pub fn name(&self) -> &str {
        match self {
            SourceKind::WarRegister => "Civil war register",
            SourceKind::Codebook => "Civil war codebook",
            SourceKind::DemocracyIndex => "Democracy index",
        }
    }

    /// Short code for logs and file names
    pub fn code(&self) -> &str {
        match self {
            SourceKind::WarRegister => "wars",
            SourceKind::Codebook => "codebook",
            SourceKind::DemocracyIndex => "democ",
        }
    }
}

/// A fully read input file plus its provenance
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub kind: SourceKind,
    pub path: PathBuf,
    pub sha256: String,
    pub text: String,
}

impl SourceFile {
    /// Read a file once, fingerprint it and keep its text.
    ///
    /// Legacy government files are not guaranteed UTF-8, so invalid bytes
    /// are replaced rather than rejected.
    pub fn load(path: &Path, kind: SourceKind) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| StudyError::io(path, e))?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let sha256 = format!("{:x}", hasher.finalize());

        Ok(SourceFile {
            kind,
            path: path.to_path_buf(),
            sha256,
            text: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }

    /// File name used in error messages
    pub fn label(&self) -> String {
        file_label(&self.path)
    }
}

/// File name of a path, falling back to the full display form
pub fn file_label(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// PARSER TRAIT
// ============================================================================

/// SourceParser - turns one input file into its first-stage table
pub trait SourceParser {
    type Output;

    /// Parse already-read text. `file` is only used for error messages.
    fn parse_str(&self, content: &str, file: &str) -> Result<Self::Output>;

    /// Which input this parser handles
    fn kind(&self) -> SourceKind;

    /// Read and parse a file
    fn parse(&self, path: &Path) -> Result<Self::Output> {
        let source = SourceFile::load(path, self.kind())?;
        self.parse_str(&source.text, &source.label())
    }
}

// ============================================================================
// DETECTION
// ============================================================================

/// Guess the input kind from a file name
///
/// # Examples:
/// ```
/// use conflict_democracy::{detect_source, SourceKind};
/// use std::path::Path;
///
/// assert_eq!(detect_source(Path::new("09905-Codebook.txt")).unwrap(), SourceKind::Codebook);
/// assert_eq!(detect_source(Path::new("09905-0002-Data.txt")).unwrap(), SourceKind::WarRegister);
/// assert_eq!(detect_source(Path::new("20440-0001-Data.tsv")).unwrap(), SourceKind::DemocracyIndex);
/// ```
pub fn detect_source(path: &Path) -> Result<SourceKind> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_lowercase();

    if filename.contains("codebook") {
        return Ok(SourceKind::Codebook);
    }

    if filename.ends_with(".tsv") {
        return Ok(SourceKind::DemocracyIndex);
    }

    if filename.contains("-data") && (filename.ends_with(".txt") || filename.ends_with(".dat")) {
        return Ok(SourceKind::WarRegister);
    }

    Err(StudyError::Config(format!(
        "Could not detect source kind from filename: {}",
        filename
    )))
}

// ============================================================================
// TESTS
// ============================================================================
