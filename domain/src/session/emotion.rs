//! Emotion analysis snapshots.
//!
//! The server re-analyses a session as the conversation grows; each
//! analysis is a snapshot stamped with its creation time. The client keeps
//! only the newest one and merges by strictly greater timestamp, so
//! out-of-order poll responses can never roll the display backwards.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Escalation level attached to an emotion snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    None,
    Mild,
    Moderate,
    Severe,
}

impl RiskLevel {
    /// Map a server-side numeric level. Anything above the known range
    /// clamps to `Severe`.
    pub fn from_index(index: u8) -> Self {
        match index {
            0 => RiskLevel::None,
            1 => RiskLevel::Mild,
            2 => RiskLevel::Moderate,
            _ => RiskLevel::Severe,
        }
    }

    pub fn index(&self) -> u8 {
        match self {
            RiskLevel::None => 0,
            RiskLevel::Mild => 1,
            RiskLevel::Moderate => 2,
            RiskLevel::Severe => 3,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskLevel::None => "none",
            RiskLevel::Mild => "mild",
            RiskLevel::Moderate => "moderate",
            RiskLevel::Severe => "severe",
        };
        write!(f, "{label}")
    }
}

/// One emotion analysis result (Value Object).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionSnapshot {
    pub primary_emotion: String,
    /// Intensity in `0.0..=100.0`.
    pub score: f32,
    pub risk_level: RiskLevel,
    pub keywords: Vec<String>,
    pub suggestion: String,
    /// Milliseconds since the Unix epoch at analysis time.
    pub timestamp: i64,
}

impl EmotionSnapshot {
    /// The placeholder shown before any analysis arrives. Its zero
    /// timestamp loses to every real snapshot.
    pub fn neutral() -> Self {
        Self {
            primary_emotion: "neutral".to_string(),
            score: 50.0,
            risk_level: RiskLevel::None,
            keywords: Vec::new(),
            suggestion: String::new(),
            timestamp: 0,
        }
    }

    /// Whether this snapshot should replace `other`. Equal timestamps do
    /// not supersede, which makes merging idempotent.
    pub fn supersedes(&self, other: &EmotionSnapshot) -> bool {
        self.timestamp > other.timestamp
    }
}
