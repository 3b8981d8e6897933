//! Rhythm taxonomy and per-rhythm configuration records
//!
//! A `RhythmConfig` is created once at catalog-load time and read-only
//! thereafter; the simulation layers never mutate it.

use serde::{Deserialize, Serialize};

use crate::error::{EcgError, EcgResult};

/// Named cardiac rhythm identifiers (closed set)
///
/// String forms match the original clinical snake_case identifiers so that
/// catalogs serialized elsewhere stay interoperable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rhythm {
    // Sinus rhythms
    NormalSinus,
    SinusBradycardia,
    SinusTachycardia,
    SinusArrhythmia,
    SinusPause,

    // AV conduction blocks
    AvBlockFirstDegree,
    AvBlockWenckebach,
    AvBlockMobitzII,
    AvBlockComplete,

    // Supraventricular tachyarrhythmias
    AtrialFibrillation,
    AtrialFlutter,
    Avnrt,
    WolffParkinsonWhite,
    MultifocalAtrialTachycardia,

    // Junctional rhythms
    JunctionalEscape,
    JunctionalTachycardia,

    // Ventricular ectopy and tachyarrhythmias
    Pvc,
    PvcBigeminy,
    PvcTrigeminy,
    PvcCouplet,
    VentricularTachycardiaMono,
    VentricularTachycardiaPoly,
    TorsadesDePointes,
    VentricularFibrillationCoarse,
    VentricularFibrillationFine,
    VentricularEscape,
    Idioventricular,
    Asystole,

    // Special phenomena
    BrugadaPattern,
}

impl Rhythm {
    /// All rhythms in the taxonomy
    pub const ALL: [Rhythm; 29] = [
        Rhythm::NormalSinus,
        Rhythm::SinusBradycardia,
        Rhythm::SinusTachycardia,
        Rhythm::SinusArrhythmia,
        Rhythm::SinusPause,
        Rhythm::AvBlockFirstDegree,
        Rhythm::AvBlockWenckebach,
        Rhythm::AvBlockMobitzII,
        Rhythm::AvBlockComplete,
        Rhythm::AtrialFibrillation,
        Rhythm::AtrialFlutter,
        Rhythm::Avnrt,
        Rhythm::WolffParkinsonWhite,
        Rhythm::MultifocalAtrialTachycardia,
        Rhythm::JunctionalEscape,
        Rhythm::JunctionalTachycardia,
        Rhythm::Pvc,
        Rhythm::PvcBigeminy,
        Rhythm::PvcTrigeminy,
        Rhythm::PvcCouplet,
        Rhythm::VentricularTachycardiaMono,
        Rhythm::VentricularTachycardiaPoly,
        Rhythm::TorsadesDePointes,
        Rhythm::VentricularFibrillationCoarse,
        Rhythm::VentricularFibrillationFine,
        Rhythm::VentricularEscape,
        Rhythm::Idioventricular,
        Rhythm::Asystole,
        Rhythm::BrugadaPattern,
    ];

    /// Stable snake_case identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Rhythm::NormalSinus => "normal_sinus_rhythm",
            Rhythm::SinusBradycardia => "sinus_bradycardia",
            Rhythm::SinusTachycardia => "sinus_tachycardia",
            Rhythm::SinusArrhythmia => "sinus_arrhythmia",
            Rhythm::SinusPause => "sinus_pause",
            Rhythm::AvBlockFirstDegree => "av_block_first_degree",
            Rhythm::AvBlockWenckebach => "av_block_2_wenckebach",
            Rhythm::AvBlockMobitzII => "av_block_2_mobitz",
            Rhythm::AvBlockComplete => "av_block_complete",
            Rhythm::AtrialFibrillation => "atrial_fibrillation",
            Rhythm::AtrialFlutter => "atrial_flutter",
            Rhythm::Avnrt => "avnrt",
            Rhythm::WolffParkinsonWhite => "wpw_syndrome",
            Rhythm::MultifocalAtrialTachycardia => "multifocal_atrial_tachy",
            Rhythm::JunctionalEscape => "junctional_escape_rhythm",
            Rhythm::JunctionalTachycardia => "junctional_tachycardia",
            Rhythm::Pvc => "premature_ventricular_contraction",
            Rhythm::PvcBigeminy => "pvc_bigeminy",
            Rhythm::PvcTrigeminy => "pvc_trigeminy",
            Rhythm::PvcCouplet => "pvc_couplet",
            Rhythm::VentricularTachycardiaMono => "ventricular_tachycardia_monomorphic",
            Rhythm::VentricularTachycardiaPoly => "ventricular_tachycardia_polymorphic",
            Rhythm::TorsadesDePointes => "torsades_de_pointes",
            Rhythm::VentricularFibrillationCoarse => "ventricular_fibrillation_coarse",
            Rhythm::VentricularFibrillationFine => "ventricular_fibrillation_fine",
            Rhythm::VentricularEscape => "ventricular_escape_rhythm",
            Rhythm::Idioventricular => "idioventricular_rhythm",
            Rhythm::Asystole => "asystole",
            Rhythm::BrugadaPattern => "brugada_pattern",
        }
    }

    /// Parse a snake_case rhythm identifier
    pub fn parse(name: &str) -> EcgResult<Rhythm> {
        Rhythm::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == name)
            .ok_or_else(|| EcgError::InvalidSignalConfig {
                reason: format!("unrecognized rhythm identifier '{}'", name),
            })
    }

    /// True if the rhythm originates below the AV junction
    pub fn is_ventricular(&self) -> bool {
        matches!(
            self,
            Rhythm::Pvc
                | Rhythm::PvcBigeminy
                | Rhythm::PvcTrigeminy
                | Rhythm::PvcCouplet
                | Rhythm::VentricularTachycardiaMono
                | Rhythm::VentricularTachycardiaPoly
                | Rhythm::TorsadesDePointes
                | Rhythm::VentricularFibrillationCoarse
                | Rhythm::VentricularFibrillationFine
                | Rhythm::VentricularEscape
                | Rhythm::Idioventricular
                | Rhythm::Asystole
        )
    }
}

impl std::fmt::Display for Rhythm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Rhythm {
    type Err = EcgError;

    fn from_str(s: &str) -> EcgResult<Self> {
        Rhythm::parse(s)
    }
}

/// Inter-beat timing variability class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegularityClass {
    /// Sinus-like: small HRV-scaled jitter
    Regular,
    /// Independent wide jitter per beat
    Irregular,
    /// Deterministic repeating beat-index template
    Patterned,
    /// Irregularly irregular (fibrillation-grade jitter)
    Chaotic,
}

/// Closed set of conduction/ectopy patterns. Each variant has an explicit
/// interval template in the scheduler; unhandled patterns cannot exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConductionPattern {
    /// No beat-index pattern
    None,
    /// Every second beat is an early ectopic
    Bigeminy,
    /// Every third beat is an early ectopic
    Trigeminy,
    /// Pairs of ectopics after each sinus beat
    Couplet,
    /// Progressive conduction delay, then a dropped beat
    Wenckebach,
    /// Fixed conduction with an abrupt dropped beat
    MobitzII,
    /// Intermittent long pause in an otherwise regular train
    SinusPause,
}

/// Continuous baseline texture substituting for (or underlying) discrete beats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaselineTexture {
    /// Isoelectric baseline
    Flat,
    /// Low-amplitude fibrillatory noise (no discrete P waves)
    Fibrillatory,
    /// Sawtooth flutter waves
    Flutter,
    /// Coarse chaotic oscillation replacing the whole beat train
    Chaotic,
    /// Fine (low-amplitude) chaotic oscillation
    ChaoticFine,
    /// Quasi-periodic twisting oscillation
    Torsades,
}

impl BaselineTexture {
    /// Textures that replace discrete beat placement entirely
    pub fn replaces_beats(&self) -> bool {
        matches!(
            self,
            BaselineTexture::Chaotic | BaselineTexture::ChaoticFine | BaselineTexture::Torsades
        )
    }
}

/// Morphology tag for a single wave fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaveShape {
    /// Symmetric gaussian bump (P and T waves)
    Gaussian,
    /// Linear rise and fall
    Triangle,
    /// Half-sine arch
    Sine,
    /// Slow ramp with an abrupt return (flutter-wave style)
    Sawtooth,
    /// Narrow Q-R-S triphasic complex
    Qrs,
    /// Widened, higher-amplitude ventricular complex
    WideQrs,
    /// Slurred delta upstroke fused into the R wave (pre-excitation)
    Delta,
    /// Coved ST elevation with inverted terminal deflection
    Brugada,
}

/// Shape descriptor for one wave component
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveParams {
    /// Peak amplitude in millivolts
    pub amplitude_mv: f64,
    /// Duration in milliseconds
    pub duration_ms: f64,
    /// Morphology tag
    pub shape: WaveShape,
    /// +1.0 upright, -1.0 inverted
    pub polarity: f64,
    /// Asymmetry factor in [-1, 1]; shifts the peak off-center
    pub skew: f64,
}

impl WaveParams {
    pub fn new(amplitude_mv: f64, duration_ms: f64, shape: WaveShape) -> Self {
        Self { amplitude_mv, duration_ms, shape, polarity: 1.0, skew: 0.0 }
    }

    pub fn inverted(mut self) -> Self {
        self.polarity = -1.0;
        self
    }

    pub fn with_skew(mut self, skew: f64) -> Self {
        self.skew = skew;
        self
    }
}

/// Complete read-only configuration for one rhythm
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RhythmConfig {
    /// Rhythm this configuration describes
    pub rhythm: Rhythm,
    /// Human-readable name
    pub name: &'static str,
    /// Ventricular rate range (min, max) in bpm
    pub rate_range: (f64, f64),
    /// Inter-beat timing class
    pub regularity: RegularityClass,
    /// Beat-index pattern template
    pub pattern: ConductionPattern,
    /// Baseline texture
    pub baseline: BaselineTexture,
    /// PR interval in ms; None when atria and ventricles are dissociated
    /// or P waves are absent
    pub pr_interval_ms: Option<f64>,
    /// QT interval in ms (QRS onset to T end)
    pub qt_interval_ms: Option<f64>,
    /// P wave descriptor; None when absent
    pub p_wave: Option<WaveParams>,
    /// QRS complex descriptor
    pub qrs: WaveParams,
    /// T wave descriptor; None when absent or buried
    pub t_wave: Option<WaveParams>,
    /// Fractional RR jitter used by the irregular/chaotic regimes
    pub rr_variability: f64,
}

impl RhythmConfig {
    /// Validate invariants a catalog entry must satisfy
    pub fn validate(&self) -> EcgResult<()> {
        let (lo, hi) = self.rate_range;
        if lo < 0.0 || hi < lo {
            return Err(EcgError::InvalidSignalConfig {
                reason: format!("rate range ({}, {}) is not ordered and non-negative", lo, hi),
            });
        }
        if !(0.0..=1.0).contains(&self.rr_variability) {
            return Err(EcgError::InvalidSignalConfig {
                reason: format!("rr_variability {} outside [0, 1]", self.rr_variability),
            });
        }
        Ok(())
    }

    /// Degenerate-rate branch: no beats can be scheduled at all
    pub fn is_flatline(&self) -> bool {
        self.rate_range.1 <= 0.0
    }

    /// True when the QRS descriptor is a widened ventricular complex
    pub fn has_wide_qrs(&self) -> bool {
        self.qrs.shape == WaveShape::WideQrs || self.qrs.duration_ms >= 120.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rhythm_identifier_roundtrip() {
        for rhythm in Rhythm::ALL {
            assert_eq!(Rhythm::parse(rhythm.as_str()).unwrap(), rhythm);
        }
    }

    #[test]
    fn test_parse_rejects_unknown_identifier() {
        assert!(Rhythm::parse("bundle_branch_reentry").is_err());
    }

    #[test]
    fn test_identifiers_unique() {
        let mut names: Vec<&str> = Rhythm::ALL.iter().map(|r| r.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Rhythm::ALL.len());
    }

    #[test]
    fn test_texture_beat_replacement() {
        assert!(BaselineTexture::Chaotic.replaces_beats());
        assert!(BaselineTexture::Torsades.replaces_beats());
        assert!(!BaselineTexture::Fibrillatory.replaces_beats());
        assert!(!BaselineTexture::Flutter.replaces_beats());
    }

    #[test]
    fn test_config_validation_rejects_bad_ranges() {
        let mut config = RhythmConfig {
            rhythm: Rhythm::NormalSinus,
            name: "test",
            rate_range: (100.0, 60.0),
            regularity: RegularityClass::Regular,
            pattern: ConductionPattern::None,
            baseline: BaselineTexture::Flat,
            pr_interval_ms: Some(160.0),
            qt_interval_ms: Some(400.0),
            p_wave: Some(WaveParams::new(0.15, 80.0, WaveShape::Gaussian)),
            qrs: WaveParams::new(1.0, 80.0, WaveShape::Qrs),
            t_wave: Some(WaveParams::new(0.3, 160.0, WaveShape::Gaussian)),
            rr_variability: 0.05,
        };
        assert!(config.validate().is_err());

        config.rate_range = (60.0, 100.0);
        assert!(config.validate().is_ok());

        config.rr_variability = 1.5;
        assert!(config.validate().is_err());
    }
}
