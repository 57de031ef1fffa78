use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Alphabet buckets used when browsing members by last name.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LetterRange {
    #[serde(rename = "A-C")]
    AToC,
    #[serde(rename = "D-F")]
    DToF,
    #[serde(rename = "G-I")]
    GToI,
    #[serde(rename = "J-L")]
    JToL,
    #[serde(rename = "M-O")]
    MToO,
    #[serde(rename = "P-R")]
    PToR,
    #[serde(rename = "S-U")]
    SToU,
    #[serde(rename = "V-Z")]
    VToZ,
}

impl LetterRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            LetterRange::AToC => "A-C",
            LetterRange::DToF => "D-F",
            LetterRange::GToI => "G-I",
            LetterRange::JToL => "J-L",
            LetterRange::MToO => "M-O",
            LetterRange::PToR => "P-R",
            LetterRange::SToU => "S-U",
            LetterRange::VToZ => "V-Z",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "A-C" => Some(LetterRange::AToC),
            "D-F" => Some(LetterRange::DToF),
            "G-I" => Some(LetterRange::GToI),
            "J-L" => Some(LetterRange::JToL),
            "M-O" => Some(LetterRange::MToO),
            "P-R" => Some(LetterRange::PToR),
            "S-U" => Some(LetterRange::SToU),
            "V-Z" => Some(LetterRange::VToZ),
            _ => None,
        }
    }

    pub fn letters(&self) -> &'static [char] {
        match self {
            LetterRange::AToC => &['A', 'B', 'C'],
            LetterRange::DToF => &['D', 'E', 'F'],
            LetterRange::GToI => &['G', 'H', 'I'],
            LetterRange::JToL => &['J', 'K', 'L'],
            LetterRange::MToO => &['M', 'N', 'O'],
            LetterRange::PToR => &['P', 'Q', 'R'],
            LetterRange::SToU => &['S', 'T', 'U'],
            LetterRange::VToZ => &['V', 'W', 'X', 'Y', 'Z'],
        }
    }

    pub fn contains(&self, last_name: &str) -> bool {
        last_name
            .trim()
            .chars()
            .next()
            .map(|first| self.letters().contains(&first.to_ascii_uppercase()))
            .unwrap_or(false)
    }
}

impl Display for LetterRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
