use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ErrorInfo;

/// Scores at or above this value carry the high-risk marker.
pub const HIGH_RISK_THRESHOLD: u8 = 70;

/// Language code shared by the string tables and the `lang` request field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    En,
    Hi,
}

impl Lang {
    pub const ALL: [Lang; 2] = [Lang::En, Lang::Hi];

    pub fn code(self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::Hi => "hi",
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Lang {
    type Err = ErrorInfo;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_lowercase();
        Lang::ALL
            .into_iter()
            .find(|lang| lang.code() == code)
            .ok_or_else(|| {
                ErrorInfo::validation(format!(
                    "unsupported language `{}` (expected one of: en, hi)",
                    s.trim()
                ))
            })
    }
}

/// How much detail the risk engine should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnLevel {
    Detailed,
    Simple,
}

/// Body of a single risk-check call. Built fresh for every submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckRequest {
    pub text: String,
    pub lang: Lang,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_level: Option<ReturnLevel>,
}

impl CheckRequest {
    pub fn new(text: impl Into<String>, lang: Lang) -> Self {
        Self {
            text: text.into(),
            lang,
            return_level: None,
        }
    }

    pub fn with_return_level(mut self, level: ReturnLevel) -> Self {
        self.return_level = Some(level);
        self
    }
}

/// Numeric risk in `0..=100` plus optional engine rationales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskScore {
    #[serde(deserialize_with = "deserialize_score")]
    pub score: u8,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rationales: Vec<String>,
}

impl RiskScore {
    pub fn new(score: u8) -> Self {
        Self {
            score: score.min(100),
            rationales: Vec::new(),
        }
    }

    pub fn is_high(&self) -> bool {
        self.score >= HIGH_RISK_THRESHOLD
    }
}

// The engine rounds to one decimal, so accept floats and settle on the nearest integer.
fn deserialize_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if !raw.is_finite() {
        return Err(serde::de::Error::custom("risk score must be a finite number"));
    }
    Ok(raw.round().clamp(0.0, 100.0) as u8)
}

/// Position a cited source takes toward the submitted claim.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stance {
    Supports,
    Refutes,
    Neutral,
    #[default]
    Unknown,
}

impl Stance {
    pub fn from_wire(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "supports" | "support" => Stance::Supports,
            "refutes" | "refute" => Stance::Refutes,
            "neutral" => Stance::Neutral,
            _ => Stance::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stance::Supports => "supports",
            Stance::Refutes => "refutes",
            Stance::Neutral => "neutral",
            Stance::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Stance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Stance {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Stance::from_wire).unwrap_or_default())
    }
}

/// A cited source. Received order is display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    pub source: String,
    #[serde(default)]
    pub stance: Stance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl EvidenceItem {
    /// Title when present and non-blank, otherwise the source name.
    pub fn display_label(&self) -> &str {
        self.title
            .as_deref()
            .filter(|title| !title.trim().is_empty())
            .unwrap_or(&self.source)
    }
}

/// Scored, explained engine output for one input text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk: RiskScore,
    pub explanation_md: String,
    #[serde(default)]
    pub lesson_md: Option<String>,
    #[serde(default)]
    pub evidence: Vec<EvidenceItem>,
}

impl RiskAssessment {
    /// Lesson markdown, treating a blank lesson as absent.
    pub fn lesson(&self) -> Option<&str> {
        self.lesson_md
            .as_deref()
            .filter(|lesson| !lesson.trim().is_empty())
    }
}
