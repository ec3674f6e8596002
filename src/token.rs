//! Token filename encodings
//!
//! Two compound identifiers travel through the pipeline:
//!
//! - extracted tokens: `{base}_{variableN}-{rowN}_{word1}-{word2}_{code}`
//! - selected tokens:  `{speaker}_{variableN}-{rowN}-{variantN}_{word}_{variant}`
//!
//! The coding-tier label's first character decides which of the two words a
//! token realizes and which variant it belongs to.

use crate::error::{NormkitError, Result};
use std::fmt;

/// Coding labels that mark a token for selection.
pub const TARGET_CODES: [&str; 4] = ["1", "3", "1a", "3a"];

/// Variant category derived from the coding label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Mainstream realization of the target word (code prefix `1`).
    Mainstream,
    /// Non-mainstream realization of the target word (code prefix `3`).
    NonMainstream,
    /// Competitor word (code prefix `2`).
    Competitor,
}

impl Variant {
    pub fn letter(&self) -> &'static str {
        match self {
            Variant::Mainstream => "M",
            Variant::NonMainstream => "N",
            Variant::Competitor => "O",
        }
    }

    /// Numeric variant code used inside `item_code`.
    pub fn number(&self) -> u32 {
        match self {
            Variant::Mainstream => 1,
            Variant::Competitor => 2,
            Variant::NonMainstream => 3,
        }
    }

    pub fn from_letter(s: &str) -> Result<Self> {
        match s {
            "M" => Ok(Variant::Mainstream),
            "N" => Ok(Variant::NonMainstream),
            "O" => Ok(Variant::Competitor),
            other => Err(NormkitError::token(format!(
                "Unknown variant letter: {other}"
            ))),
        }
    }

    fn from_code(code: &str) -> Result<Self> {
        match code.chars().next() {
            Some('1') => Ok(Variant::Mainstream),
            Some('2') => Ok(Variant::Competitor),
            Some('3') => Ok(Variant::NonMainstream),
            _ => Err(NormkitError::token(format!("Unknown coding label: {code}"))),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.letter())
    }
}

/// Recording session identity parsed from a directory or file stem such as
/// `S1`, `S1-2`, or `S1-supp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub speaker: String,
    pub label: SessionLabel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionLabel {
    /// Numbered recording session; a bare stem is session 1.
    Numbered(u32),
    /// Supplementary recording session.
    Supp,
}

impl Session {
    pub fn parse(stem: &str) -> Self {
        match stem.split_once('-') {
            Some((spk, "supp")) => Session {
                speaker: spk.to_string(),
                label: SessionLabel::Supp,
            },
            Some((spk, n)) => Session {
                speaker: spk.to_string(),
                label: SessionLabel::Numbered(n.parse().unwrap_or(1)),
            },
            None => Session {
                speaker: stem.to_string(),
                label: SessionLabel::Numbered(1),
            },
        }
    }

    pub fn is_supp(&self) -> bool {
        self.label == SessionLabel::Supp
    }
}

/// An extracted token, named `{base}_{variableN}-{rowN}_{word1}-{word2}_{code}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedToken {
    /// Recording stem (`S1`, `S1-2`, `S1-supp`).
    pub base: String,
    pub variable_n: u32,
    pub row_n: u32,
    pub word1: String,
    pub word2: String,
    /// Raw coding-tier label (`1`, `2`, `3`, `1a`, `3a`, ...).
    pub code: String,
}

impl RecordedToken {
    /// Parse an extracted-token file stem.
    pub fn parse(stem: &str) -> Result<Self> {
        let parts: Vec<&str> = stem.split('_').collect();
        if parts.len() != 4 {
            return Err(NormkitError::token(format!(
                "Expected 4 underscore-separated fields in '{stem}', found {}",
                parts.len()
            )));
        }

        let (variable_n, row_n) = parse_pair(parts[1], stem)?;
        let (word1, word2) = parts[2].split_once('-').ok_or_else(|| {
            NormkitError::token(format!("Missing word pair separator in '{stem}'"))
        })?;

        Ok(RecordedToken {
            base: parts[0].to_string(),
            variable_n,
            row_n,
            word1: word1.to_string(),
            word2: word2.to_string(),
            code: parts[3].to_string(),
        })
    }

    pub fn stem(&self) -> String {
        format!(
            "{}_{}-{}_{}-{}_{}",
            self.base, self.variable_n, self.row_n, self.word1, self.word2, self.code
        )
    }

    /// Whether the coding label marks this token for selection.
    pub fn is_target(&self) -> bool {
        TARGET_CODES.contains(&self.code.as_str())
    }

    pub fn session(&self) -> Session {
        Session::parse(&self.base)
    }

    /// Resolve the coding label into the selected-token identity: which word
    /// the token realizes and which variant it belongs to.
    pub fn to_selected(&self) -> Result<SelectedToken> {
        let variant = Variant::from_code(&self.code)?;
        let word = match variant {
            Variant::Competitor => self.word2.clone(),
            _ => self.word1.clone(),
        };

        Ok(SelectedToken {
            speaker: self.session().speaker,
            variable_n: self.variable_n,
            row_n: self.row_n,
            variant,
            word,
        })
    }
}

/// A selected token, named `{speaker}_{variableN}-{rowN}-{variantN}_{word}_{variant}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedToken {
    pub speaker: String,
    pub variable_n: u32,
    pub row_n: u32,
    pub variant: Variant,
    pub word: String,
}

impl SelectedToken {
    /// Parse a selected-token file stem.
    pub fn parse(stem: &str) -> Result<Self> {
        let parts: Vec<&str> = stem.split('_').collect();
        if parts.len() != 4 {
            return Err(NormkitError::token(format!(
                "Expected 4 underscore-separated fields in '{stem}', found {}",
                parts.len()
            )));
        }

        let codes: Vec<&str> = parts[1].split('-').collect();
        if codes.len() != 3 {
            return Err(NormkitError::token(format!(
                "Expected item code 'variableN-rowN-variantN' in '{stem}'"
            )));
        }
        let variable_n = parse_num(codes[0], stem)?;
        let row_n = parse_num(codes[1], stem)?;
        let variant_n: u32 = parse_num(codes[2], stem)?;

        let variant = Variant::from_letter(parts[3])?;
        if variant.number() != variant_n {
            return Err(NormkitError::token(format!(
                "Variant letter '{}' does not match variantN {} in '{stem}'",
                parts[3], variant_n
            )));
        }

        Ok(SelectedToken {
            speaker: parts[0].to_string(),
            variable_n,
            row_n,
            variant,
            word: parts[2].to_string(),
        })
    }

    /// The `{variableN}-{rowN}-{variantN}` item code shared by all speakers.
    pub fn item_code(&self) -> String {
        format!("{}-{}-{}", self.variable_n, self.row_n, self.variant.number())
    }

    pub fn stem(&self) -> String {
        format!(
            "{}_{}_{}_{}",
            self.speaker,
            self.item_code(),
            self.word,
            self.variant.letter()
        )
    }

    /// Sort key for concatenation order.
    pub fn ordering(&self) -> (u32, u32, u32) {
        (self.variable_n, self.row_n, self.variant.number())
    }
}

fn parse_pair(field: &str, stem: &str) -> Result<(u32, u32)> {
    let (a, b) = field.split_once('-').ok_or_else(|| {
        NormkitError::token(format!("Missing variable-row separator in '{stem}'"))
    })?;
    Ok((parse_num(a, stem)?, parse_num(b, stem)?))
}

fn parse_num(field: &str, stem: &str) -> Result<u32> {
    field
        .parse()
        .map_err(|_| NormkitError::token(format!("Non-numeric field '{field}' in '{stem}'")))
}
