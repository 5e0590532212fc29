// ── Call classification ──
//
// Pure mapping from an emergency type and a severity score to the
// responding department, its icon, and the color tier of the card.

use serde::{Deserialize, Serialize};
use strum::Display;

/// Lower bound (inclusive) of the critical tier.
pub const CRITICAL_THRESHOLD: u8 = 80;

/// Lower bound (inclusive) of the warning tier.
pub const WARNING_THRESHOLD: u8 = 50;

/// Responding department.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
)]
pub enum Department {
    Fire,
    Health,
    Rescue,
    Police,
    General,
}

impl Department {
    pub fn icon(self) -> IconTag {
        match self {
            Self::Fire => IconTag::Fire,
            Self::Health => IconTag::Medical,
            Self::Rescue => IconTag::Rescue,
            Self::Police => IconTag::Police,
            Self::General => IconTag::Generic,
        }
    }
}

/// Icon identifier. The presentation layer picks the glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[strum(serialize_all = "lowercase")]
pub enum IconTag {
    Fire,
    Medical,
    Rescue,
    Police,
    Generic,
}

/// Urgency color derived from the 0-100 score.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[strum(serialize_all = "lowercase")]
pub enum ColorTier {
    /// Green.
    Normal,
    /// Orange.
    Warning,
    /// Red.
    Critical,
}

impl ColorTier {
    pub fn from_score(score: u8) -> Self {
        if score >= CRITICAL_THRESHOLD {
            Self::Critical
        } else if score >= WARNING_THRESHOLD {
            Self::Warning
        } else {
            Self::Normal
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub department: Department,
    pub icon: IconTag,
    pub tier: ColorTier,
}

/// Keyword table, checked top to bottom. First hit wins.
const RULES: &[(&[&str], Department)] = &[
    (&["fire"], Department::Fire),
    (&["medical", "cardiac", "injury"], Department::Health),
    (&["rescue", "animal"], Department::Rescue),
    (&["police", "theft", "crime"], Department::Police),
];

/// Department for an emergency type. Case-insensitive substring match.
pub fn department_for(emergency_type: &str) -> Department {
    let needle = emergency_type.to_lowercase();
    RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| needle.contains(k)))
        .map_or(Department::General, |(_, dept)| *dept)
}

pub fn classify(emergency_type: &str, severity_score: u8) -> Classification {
    let department = department_for(emergency_type);
    Classification {
        department,
        icon: department.icon(),
        tier: ColorTier::from_score(severity_score),
    }
}
