//! Standard 12-lead ECG channel identifiers

use serde::{Deserialize, Serialize};

use crate::error::{EcgError, EcgResult};

/// One of the twelve standard surface ECG leads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Lead {
    I,
    II,
    III,
    AVR,
    AVL,
    AVF,
    V1,
    V2,
    V3,
    V4,
    V5,
    V6,
}

impl Lead {
    /// All twelve leads in conventional display order
    pub const STANDARD_12: [Lead; 12] = [
        Lead::I,
        Lead::II,
        Lead::III,
        Lead::AVR,
        Lead::AVL,
        Lead::AVF,
        Lead::V1,
        Lead::V2,
        Lead::V3,
        Lead::V4,
        Lead::V5,
        Lead::V6,
    ];

    /// Clinical lead name
    pub fn as_str(&self) -> &'static str {
        match self {
            Lead::I => "I",
            Lead::II => "II",
            Lead::III => "III",
            Lead::AVR => "aVR",
            Lead::AVL => "aVL",
            Lead::AVF => "aVF",
            Lead::V1 => "V1",
            Lead::V2 => "V2",
            Lead::V3 => "V3",
            Lead::V4 => "V4",
            Lead::V5 => "V5",
            Lead::V6 => "V6",
        }
    }

    /// Parse a clinical lead name (case-sensitive for the augmented leads,
    /// "aVR" etc., matching printed ECG convention; limb and precordial
    /// names accept any case)
    pub fn parse(name: &str) -> EcgResult<Lead> {
        let lead = match name {
            "I" | "i" => Lead::I,
            "II" | "ii" => Lead::II,
            "III" | "iii" => Lead::III,
            "aVR" | "AVR" | "avr" => Lead::AVR,
            "aVL" | "AVL" | "avl" => Lead::AVL,
            "aVF" | "AVF" | "avf" => Lead::AVF,
            "V1" | "v1" => Lead::V1,
            "V2" | "v2" => Lead::V2,
            "V3" | "v3" => Lead::V3,
            "V4" | "v4" => Lead::V4,
            "V5" | "v5" => Lead::V5,
            "V6" | "v6" => Lead::V6,
            _ => {
                return Err(EcgError::InvalidSignalConfig {
                    reason: format!("unrecognized lead name '{}'", name),
                })
            }
        };
        Ok(lead)
    }

    /// True for the six limb leads (frontal plane)
    pub fn is_limb(&self) -> bool {
        matches!(
            self,
            Lead::I | Lead::II | Lead::III | Lead::AVR | Lead::AVL | Lead::AVF
        )
    }

    /// True for the six precordial leads (horizontal plane)
    pub fn is_precordial(&self) -> bool {
        !self.is_limb()
    }
}

impl std::fmt::Display for Lead {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Lead {
    type Err = EcgError;

    fn from_str(s: &str) -> EcgResult<Self> {
        Lead::parse(s)
    }
}
