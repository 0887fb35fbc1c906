// 📖 Codebook Parser
//
// The codebook is a free-text document. Only a fixed block of lines
// describes the wars, one per line:
//
//   <c><war#><3+ spaces><COUNTRY NAME>[ optional [NOTE]] (<dates...>
//
// Anything in the window that lacks the three-space run or the opening
// parenthesis is commentary and is skipped.

use crate::error::{Result, StudyError};
use crate::parser::{SourceKind, SourceParser};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Trailing bracketed annotation, e.g. " [FORMER NAME]"
static ANNOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" ?\[[^)]+\]").expect("annotation pattern is valid"));

/// Start of the country-name field
const NAME_START: &str = "   ";

/// End of the country-name field
const NAME_END: char = '(';

// ============================================================================
// TYPES
// ============================================================================

/// Block of codebook lines holding the war descriptions (1-based, inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodebookWindow {
    pub first_line: usize,
    pub last_line: usize,
}

impl CodebookWindow {
    pub fn new(first_line: usize, last_line: usize) -> Self {
        CodebookWindow {
            first_line,
            last_line,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.first_line == 0 || self.last_line < self.first_line {
            return Err(StudyError::Config(format!(
                "invalid codebook window {}..={}",
                self.first_line, self.last_line
            )));
        }
        Ok(())
    }
}

impl Default for CodebookWindow {
    fn default() -> Self {
        CodebookWindow::new(1317, 1467)
    }
}

/// One war-number → country-name row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodebookEntry {
    pub war_number: i64,
    pub country: String,
}

// ============================================================================
// PARSER
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct CodebookParser {
    window: CodebookWindow,
}

impl CodebookParser {
    pub fn new(window: CodebookWindow) -> Self {
        CodebookParser { window }
    }

    pub fn window(&self) -> CodebookWindow {
        self.window
    }

    /// Parse one window line. `Ok(None)` means "not a war line".
    pub fn parse_line(&self, text: &str, number: usize, file: &str) -> Result<Option<CodebookEntry>> {
        let (Some(start), Some(end)) = (text.find(NAME_START), text.find(NAME_END)) else {
            return Ok(None);
        };

        // "(" ahead of the three-space run: not a war description line
        if end <= start {
            return Ok(None);
        }

        let raw_number = text.get(1..4).ok_or_else(|| {
            StudyError::format(file, number, "line too short for a war number")
        })?;

        let war_number = raw_number.trim().parse::<i64>().map_err(|_| {
            StudyError::format(
                file,
                number,
                format!("war number is not an integer: {:?}", raw_number),
            )
        })?;

        let name = text[start..end].trim();
        let country = ANNOTATION.replace_all(name, "").trim().to_string();

        Ok(Some(CodebookEntry {
            war_number,
            country,
        }))
    }
}

impl SourceParser for CodebookParser {
    type Output = Vec<CodebookEntry>;

    fn parse_str(&self, content: &str, file: &str) -> Result<Vec<CodebookEntry>> {
        self.window.validate()?;

        let lines: Vec<&str> = content.lines().collect();
        if lines.len() < self.window.last_line {
            tracing::warn!(
                file,
                lines = lines.len(),
                window_end = self.window.last_line,
                "codebook ends before the end of the war window"
            );
        }

        let mut entries = Vec::new();
        let mut skipped = 0usize;

        for (idx, text) in lines
            .iter()
            .enumerate()
            .skip(self.window.first_line - 1)
            .take(self.window.last_line - self.window.first_line + 1)
        {
            match self.parse_line(text, idx + 1, file)? {
                Some(entry) => entries.push(entry),
                None => skipped += 1,
            }
        }

        tracing::info!(file, entries = entries.len(), skipped, "parsed codebook window");
        Ok(entries)
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Codebook
    }
}

// ============================================================================
// TESTS
// ============================================================================
