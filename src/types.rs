use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A character trait the user can practice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Virtue {
    #[serde(rename = "Responsabilidad")]
    Responsibility,
    #[serde(rename = "Honestidad")]
    Honesty,
    #[serde(rename = "Generosidad")]
    Generosity,
    #[serde(rename = "Perseverancia")]
    Perseverance,
    #[serde(rename = "Respeto")]
    Respect,
    #[serde(rename = "Gratitud")]
    Gratitude,
    #[serde(rename = "Paciencia")]
    Patience,
    #[serde(rename = "Humildad")]
    Humility,
}

impl Virtue {
    pub const ALL: [Virtue; 8] = [
        Virtue::Responsibility,
        Virtue::Honesty,
        Virtue::Generosity,
        Virtue::Perseverance,
        Virtue::Respect,
        Virtue::Gratitude,
        Virtue::Patience,
        Virtue::Humility,
    ];

    /// Name shown to the user and sent to the model
    pub fn display_name(&self) -> &'static str {
        match self {
            Virtue::Responsibility => "Responsabilidad",
            Virtue::Honesty => "Honestidad",
            Virtue::Generosity => "Generosidad",
            Virtue::Perseverance => "Perseverancia",
            Virtue::Respect => "Respeto",
            Virtue::Gratitude => "Gratitud",
            Virtue::Patience => "Paciencia",
            Virtue::Humility => "Humildad",
        }
    }

    fn english_name(&self) -> &'static str {
        match self {
            Virtue::Responsibility => "responsibility",
            Virtue::Honesty => "honesty",
            Virtue::Generosity => "generosity",
            Virtue::Perseverance => "perseverance",
            Virtue::Respect => "respect",
            Virtue::Gratitude => "gratitude",
            Virtue::Patience => "patience",
            Virtue::Humility => "humility",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Virtue::Responsibility => "Cumplir con tus deberes y asumir consecuencias.",
            Virtue::Honesty => "Decir la verdad y ser auténtico.",
            Virtue::Generosity => "Dar a los demás sin esperar nada a cambio.",
            Virtue::Perseverance => "Continuar esforzándote a pesar de las dificultades.",
            Virtue::Respect => "Tratar a los demás con dignidad y consideración.",
            Virtue::Gratitude => "Apreciar lo que tienes y dar las gracias.",
            Virtue::Patience => "Mantener la calma ante la espera o frustración.",
            Virtue::Humility => "Reconocer tus límites y valorar a otros.",
        }
    }
}

impl fmt::Display for Virtue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Virtue {
    type Err = String;

    /// Accepts the English variant name or the Spanish display name, any case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Virtue::ALL
            .iter()
            .find(|v| v.english_name() == needle || v.display_name().to_lowercase() == needle)
            .copied()
            .ok_or_else(|| format!("Unknown virtue: {} (see `virtus virtues`)", s.trim()))
    }
}

/// Structured feedback for a single reflection.
///
/// Loading is lenient: older journals may carry extra keys or a fractional
/// score, which is rounded into 1-10.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub encouragement: String,
    pub practical_tip: String,
    /// Reflection depth, 1-10
    #[serde(deserialize_with = "lenient_score")]
    pub score: u8,
}

fn lenient_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if !raw.is_finite() {
        return Err(serde::de::Error::custom("score is not a finite number"));
    }
    Ok(raw.round().clamp(1.0, 10.0) as u8)
}

/// A journal entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    #[serde(rename = "date")]
    pub timestamp: DateTime<Utc>,
    pub virtue: Virtue,
    pub reflection: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,
}

/// Statistics derived from the journal history
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateStats {
    /// Count per virtue, in order of first occurrence
    pub per_virtue_count: Vec<(Virtue, usize)>,
    pub top_virtue: Option<Virtue>,
    pub total_count: usize,
    /// Equals `total_count` whenever the journal is non-empty
    pub streak: usize,
    /// Consecutive calendar days with at least one entry
    pub calendar_streak: usize,
}

impl AggregateStats {
    /// Top virtue name, or "N/A" when there is no history
    pub fn top_virtue_label(&self) -> &'static str {
        self.top_virtue.map(|v| v.display_name()).unwrap_or("N/A")
    }
}
