//! Read-only rhythm catalog
//!
//! The catalog is an explicit object handed to the simulator at construction
//! time. Tests can inject synthetic catalogs; the built-in one carries the
//! clinical parameter set for the whole taxonomy.

use std::collections::HashMap;

use crate::rhythm::{
    BaselineTexture, ConductionPattern, RegularityClass, Rhythm, RhythmConfig, WaveParams,
    WaveShape,
};

/// Injected, read-only mapping from rhythm to configuration
#[derive(Debug, Clone)]
pub struct RhythmCatalog {
    configs: HashMap<Rhythm, RhythmConfig>,
}

impl RhythmCatalog {
    /// Empty catalog (useful for tests exercising the fallback path)
    pub fn empty() -> Self {
        Self { configs: HashMap::new() }
    }

    /// Catalog built from an explicit entry list
    pub fn from_entries(entries: impl IntoIterator<Item = RhythmConfig>) -> Self {
        let configs = entries.into_iter().map(|c| (c.rhythm, c)).collect();
        Self { configs }
    }

    /// Lookup; `None` signals "not found" to the caller
    pub fn get(&self, rhythm: Rhythm) -> Option<&RhythmConfig> {
        self.configs.get(&rhythm)
    }

    pub fn contains(&self, rhythm: Rhythm) -> bool {
        self.configs.contains_key(&rhythm)
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    /// Rhythms present in this catalog
    pub fn rhythms(&self) -> impl Iterator<Item = Rhythm> + '_ {
        self.configs.keys().copied()
    }

    /// The default normal-sinus configuration, also used as the loud
    /// fallback when a rhythm has no catalog entry
    pub fn default_sinus() -> RhythmConfig {
        RhythmConfig {
            rhythm: Rhythm::NormalSinus,
            name: "Normal Sinus Rhythm",
            rate_range: (60.0, 100.0),
            regularity: RegularityClass::Regular,
            pattern: ConductionPattern::None,
            baseline: BaselineTexture::Flat,
            pr_interval_ms: Some(160.0),
            qt_interval_ms: Some(400.0),
            p_wave: Some(WaveParams::new(0.15, 80.0, WaveShape::Gaussian)),
            qrs: WaveParams::new(1.0, 80.0, WaveShape::Qrs),
            t_wave: Some(WaveParams::new(0.3, 160.0, WaveShape::Gaussian)),
            rr_variability: 0.05,
        }
    }

    /// Full built-in catalog covering the whole `Rhythm` taxonomy
    pub fn builtin() -> Self {
        let wide_qrs = WaveParams::new(1.8, 140.0, WaveShape::WideQrs);
        let tachy_t = WaveParams::new(0.25, 140.0, WaveShape::Gaussian);
        let discordant_t = WaveParams::new(0.5, 140.0, WaveShape::Gaussian).inverted();

        let base = Self::default_sinus();
        let entry = |rhythm: Rhythm, name: &'static str, f: &dyn Fn(&mut RhythmConfig)| {
            let mut config = RhythmConfig { rhythm, name, ..base.clone() };
            f(&mut config);
            config
        };

        Self::from_entries([
            entry(Rhythm::NormalSinus, "Normal Sinus Rhythm", &|_| {}),
            entry(Rhythm::SinusBradycardia, "Sinus Bradycardia", &|c| {
                c.rate_range = (35.0, 59.0);
                c.qt_interval_ms = Some(440.0);
            }),
            entry(Rhythm::SinusTachycardia, "Sinus Tachycardia", &|c| {
                c.rate_range = (100.0, 180.0);
                c.pr_interval_ms = Some(140.0);
                c.qt_interval_ms = Some(320.0);
                c.p_wave = Some(WaveParams::new(0.18, 70.0, WaveShape::Gaussian));
                c.t_wave = Some(tachy_t);
            }),
            entry(Rhythm::SinusArrhythmia, "Sinus Arrhythmia", &|c| {
                c.regularity = RegularityClass::Irregular;
                c.rr_variability = 0.15;
            }),
            entry(Rhythm::SinusPause, "Sinus Pause", &|c| {
                c.rate_range = (50.0, 80.0);
                c.regularity = RegularityClass::Patterned;
                c.pattern = ConductionPattern::SinusPause;
            }),
            entry(Rhythm::AvBlockFirstDegree, "First Degree AV Block", &|c| {
                c.rate_range = (50.0, 90.0);
                c.pr_interval_ms = Some(280.0); // prolonged beyond 200 ms
            }),
            entry(Rhythm::AvBlockWenckebach, "Second Degree AV Block Type I (Wenckebach)", &|c| {
                c.rate_range = (40.0, 80.0);
                c.regularity = RegularityClass::Patterned;
                c.pattern = ConductionPattern::Wenckebach;
                c.pr_interval_ms = Some(200.0);
            }),
            entry(Rhythm::AvBlockMobitzII, "Second Degree AV Block Type II (Mobitz II)", &|c| {
                c.rate_range = (30.0, 70.0);
                c.regularity = RegularityClass::Patterned;
                c.pattern = ConductionPattern::MobitzII;
                c.pr_interval_ms = Some(180.0);
                c.qrs = WaveParams::new(1.0, 120.0, WaveShape::WideQrs);
            }),
            entry(Rhythm::AvBlockComplete, "Complete (Third Degree) AV Block", &|c| {
                c.rate_range = (30.0, 45.0);
                c.pr_interval_ms = None; // dissociated
                c.qrs = WaveParams::new(1.2, 120.0, WaveShape::WideQrs);
                c.t_wave = Some(WaveParams::new(0.35, 160.0, WaveShape::Gaussian));
            }),
            entry(Rhythm::AtrialFibrillation, "Atrial Fibrillation", &|c| {
                c.rate_range = (60.0, 160.0);
                c.regularity = RegularityClass::Chaotic;
                c.baseline = BaselineTexture::Fibrillatory;
                c.pr_interval_ms = None;
                c.p_wave = None; // key feature: no discrete P
                c.rr_variability = 0.30;
            }),
            entry(Rhythm::AtrialFlutter, "Atrial Flutter", &|c| {
                c.rate_range = (130.0, 150.0); // ventricular rate at 2:1 block
                c.baseline = BaselineTexture::Flutter;
                c.pr_interval_ms = None;
                c.p_wave = None;
                c.t_wave = Some(tachy_t);
            }),
            entry(Rhythm::Avnrt, "AV Nodal Reentrant Tachycardia", &|c| {
                c.rate_range = (140.0, 220.0);
                c.pr_interval_ms = Some(80.0);
                c.p_wave = None; // buried in the QRS
                c.t_wave = Some(tachy_t);
            }),
            entry(Rhythm::WolffParkinsonWhite, "Wolff-Parkinson-White Syndrome", &|c| {
                c.rate_range = (100.0, 250.0);
                c.pr_interval_ms = Some(100.0); // short PR
                c.p_wave = Some(WaveParams::new(0.15, 70.0, WaveShape::Gaussian));
                c.qrs = WaveParams::new(1.2, 130.0, WaveShape::Delta);
                c.t_wave = Some(WaveParams::new(0.3, 140.0, WaveShape::Gaussian));
            }),
            entry(Rhythm::MultifocalAtrialTachycardia, "Multifocal Atrial Tachycardia", &|c| {
                c.rate_range = (100.0, 180.0);
                c.regularity = RegularityClass::Irregular;
                c.rr_variability = 0.20;
            }),
            entry(Rhythm::JunctionalEscape, "Junctional Escape Rhythm", &|c| {
                c.rate_range = (40.0, 60.0);
                c.pr_interval_ms = None;
                c.p_wave = None;
            }),
            entry(Rhythm::JunctionalTachycardia, "Junctional Tachycardia", &|c| {
                c.rate_range = (70.0, 130.0);
                c.pr_interval_ms = None;
                c.p_wave = None;
            }),
            entry(Rhythm::Pvc, "Premature Ventricular Contraction", &|c| {
                c.regularity = RegularityClass::Irregular;
                c.rr_variability = 0.15;
                c.pr_interval_ms = None;
                c.p_wave = None;
                c.qrs = wide_qrs;
                c.t_wave = Some(discordant_t);
            }),
            entry(Rhythm::PvcBigeminy, "PVC Bigeminy", &|c| {
                c.regularity = RegularityClass::Patterned;
                c.pattern = ConductionPattern::Bigeminy;
            }),
            entry(Rhythm::PvcTrigeminy, "PVC Trigeminy", &|c| {
                c.regularity = RegularityClass::Patterned;
                c.pattern = ConductionPattern::Trigeminy;
            }),
            entry(Rhythm::PvcCouplet, "PVC Couplet", &|c| {
                c.regularity = RegularityClass::Patterned;
                c.pattern = ConductionPattern::Couplet;
            }),
            entry(Rhythm::VentricularTachycardiaMono, "Monomorphic Ventricular Tachycardia", &|c| {
                c.rate_range = (140.0, 220.0);
                c.pr_interval_ms = None;
                c.p_wave = None;
                c.qrs = WaveParams::new(1.5, 140.0, WaveShape::WideQrs);
                c.t_wave = Some(WaveParams::new(0.4, 120.0, WaveShape::Gaussian).inverted());
            }),
            entry(Rhythm::VentricularTachycardiaPoly, "Polymorphic Ventricular Tachycardia", &|c| {
                c.rate_range = (100.0, 250.0);
                c.regularity = RegularityClass::Irregular;
                c.rr_variability = 0.20;
                c.pr_interval_ms = None;
                c.p_wave = None;
                c.qrs = WaveParams::new(1.5, 140.0, WaveShape::WideQrs);
                c.t_wave = None;
            }),
            entry(Rhythm::TorsadesDePointes, "Torsades de Pointes", &|c| {
                c.rate_range = (200.0, 300.0);
                c.regularity = RegularityClass::Chaotic;
                c.baseline = BaselineTexture::Torsades;
                c.pr_interval_ms = None;
                c.p_wave = None;
                c.qrs = WaveParams::new(1.2, 150.0, WaveShape::WideQrs);
                c.t_wave = None;
                c.rr_variability = 0.25;
            }),
            entry(Rhythm::VentricularFibrillationCoarse, "Ventricular Fibrillation (Coarse)", &|c| {
                c.rate_range = (300.0, 500.0);
                c.regularity = RegularityClass::Chaotic;
                c.baseline = BaselineTexture::Chaotic;
                c.pr_interval_ms = None;
                c.p_wave = None;
                c.qrs = WaveParams::new(0.8, 200.0, WaveShape::WideQrs);
                c.t_wave = None;
                c.rr_variability = 0.40;
            }),
            entry(Rhythm::VentricularFibrillationFine, "Ventricular Fibrillation (Fine)", &|c| {
                c.rate_range = (300.0, 500.0);
                c.regularity = RegularityClass::Chaotic;
                c.baseline = BaselineTexture::ChaoticFine;
                c.pr_interval_ms = None;
                c.p_wave = None;
                c.qrs = WaveParams::new(0.3, 200.0, WaveShape::WideQrs);
                c.t_wave = None;
                c.rr_variability = 0.40;
            }),
            entry(Rhythm::VentricularEscape, "Ventricular Escape Rhythm", &|c| {
                c.rate_range = (20.0, 40.0);
                c.pr_interval_ms = None;
                c.p_wave = None;
                c.qrs = WaveParams::new(1.5, 160.0, WaveShape::WideQrs);
                c.t_wave = Some(WaveParams::new(0.5, 160.0, WaveShape::Gaussian).inverted());
            }),
            entry(Rhythm::Idioventricular, "Idioventricular Rhythm", &|c| {
                c.rate_range = (20.0, 40.0);
                c.pr_interval_ms = None;
                c.p_wave = None;
                c.qrs = WaveParams::new(1.5, 160.0, WaveShape::WideQrs);
                c.t_wave = Some(WaveParams::new(0.5, 160.0, WaveShape::Gaussian).inverted());
            }),
            entry(Rhythm::Asystole, "Asystole", &|c| {
                c.rate_range = (0.0, 0.0); // flatline
                c.pr_interval_ms = None;
                c.p_wave = None;
                c.qrs = WaveParams::new(0.0, 0.0, WaveShape::Gaussian);
                c.t_wave = None;
                c.rr_variability = 0.0;
            }),
            entry(Rhythm::BrugadaPattern, "Brugada Pattern", &|c| {
                c.qrs = WaveParams::new(1.0, 100.0, WaveShape::Brugada);
                c.t_wave = Some(WaveParams::new(0.2, 160.0, WaveShape::Gaussian).inverted());
            }),
        ])
    }
}

impl Default for RhythmCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_full_taxonomy() {
        let catalog = RhythmCatalog::builtin();
        for rhythm in Rhythm::ALL {
            assert!(catalog.contains(rhythm), "missing catalog entry for {}", rhythm);
        }
        assert_eq!(catalog.len(), Rhythm::ALL.len());
    }

    #[test]
    fn test_builtin_entries_validate() {
        let catalog = RhythmCatalog::builtin();
        for rhythm in catalog.rhythms() {
            catalog.get(rhythm).unwrap().validate().unwrap();
        }
    }

    #[test]
    fn test_key_clinical_features() {
        let catalog = RhythmCatalog::builtin();

        let afib = catalog.get(Rhythm::AtrialFibrillation).unwrap();
        assert!(afib.p_wave.is_none());
        assert_eq!(afib.regularity, RegularityClass::Chaotic);
        assert_eq!(afib.baseline, BaselineTexture::Fibrillatory);

        let first_degree = catalog.get(Rhythm::AvBlockFirstDegree).unwrap();
        assert!(first_degree.pr_interval_ms.unwrap() > 200.0);

        let vt = catalog.get(Rhythm::VentricularTachycardiaMono).unwrap();
        assert!(vt.has_wide_qrs());

        let asystole = catalog.get(Rhythm::Asystole).unwrap();
        assert!(asystole.is_flatline());
    }

    #[test]
    fn test_empty_catalog_reports_not_found() {
        let catalog = RhythmCatalog::empty();
        assert!(catalog.get(Rhythm::NormalSinus).is_none());
        assert!(catalog.is_empty());
    }
}
