//! Beat scheduling: converts a rhythm's rate and regularity class into
//! discrete beat onsets within a sample window
//!
//! All three simulation layers share this scheduler so that switching
//! layers changes morphology, never timing statistics.

use ecg_core::{ConductionPattern, RegularityClass, RhythmConfig};
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Shortest allowed inter-beat interval in samples. Keeps degenerate
/// rate/jitter combinations from collapsing beats onto each other.
pub const MIN_CYCLE_SAMPLES: usize = 100;

/// Morphology class of a scheduled beat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeatClass {
    /// Conducted beat using the rhythm's normal morphology
    Normal,
    /// Ventricular ectopic: wide QRS, discordant T, no P wave
    Ectopic,
}

/// One scheduled beat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeatEvent {
    /// Onset sample index (QRS onset reference point)
    pub offset: usize,
    /// Morphology class
    pub class: BeatClass,
}

/// Continuation point for resuming a beat train in the next chunk
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleCarry {
    /// Samples into the next window until the first beat
    pub next_beat_in: usize,
    /// Rate the previous window was generated at, in bpm
    pub rate_bpm: f64,
}

/// Beat onsets for one generation window
#[derive(Debug, Clone)]
pub struct BeatSchedule {
    /// Beats in ascending onset order
    pub events: Vec<BeatEvent>,
    /// Nominal cycle length in samples at the sampled rate
    pub base_cycle: usize,
    /// Ventricular rate that was sampled from the rhythm's range, in bpm
    pub rate_bpm: f64,
    /// Samples past the window end until the next beat would land; lets
    /// chunked generation continue the train without a phase jump
    pub next_beat_in: usize,
}

impl BeatSchedule {
    /// Schedule beats for `num_samples` samples of the given rhythm.
    ///
    /// `hrv` in [0, 1] scales the jitter of the `Regular` regime only;
    /// the irregular regimes carry their variability in the config.
    pub fn generate(
        config: &RhythmConfig,
        sampling_rate: u32,
        num_samples: usize,
        hrv: f64,
        rng: &mut StdRng,
    ) -> Self {
        Self::generate_from(config, sampling_rate, num_samples, hrv, rng, None)
    }

    /// Like [`BeatSchedule::generate`] but resuming from a carry point,
    /// used to continue a train across chunk boundaries
    pub fn generate_from(
        config: &RhythmConfig,
        sampling_rate: u32,
        num_samples: usize,
        hrv: f64,
        rng: &mut StdRng,
        carry: Option<ScheduleCarry>,
    ) -> Self {
        if config.is_flatline() {
            return Self { events: Vec::new(), base_cycle: 0, rate_bpm: 0.0, next_beat_in: 0 };
        }

        let rate_bpm = match carry {
            Some(c) if c.rate_bpm > 0.0 => c.rate_bpm,
            _ => sample_rate_bpm(config, rng),
        };
        let base_cycle = cycle_samples(rate_bpm, sampling_rate);
        let start = carry.map(|c| c.next_beat_in).unwrap_or(base_cycle / 2);

        let (events, end_cursor) = match config.regularity {
            RegularityClass::Regular => Self::regular_train(
                base_cycle,
                config.rr_variability * hrv,
                num_samples,
                start,
                rng,
            ),
            RegularityClass::Irregular => {
                Self::jittered_train(base_cycle, config.rr_variability, num_samples, start, rng)
            }
            RegularityClass::Chaotic => {
                Self::chaotic_train(config, sampling_rate, num_samples, start, rng)
            }
            RegularityClass::Patterned => {
                Self::patterned_train(config.pattern, base_cycle, num_samples, start)
            }
        };

        Self { events, base_cycle, rate_bpm, next_beat_in: end_cursor - num_samples }
    }

    /// Sinus-like train: gaussian jitter around a fixed cycle length.
    /// With `jitter_frac` of zero the spacing is exactly `base_cycle`.
    fn regular_train(
        base_cycle: usize,
        jitter_frac: f64,
        num_samples: usize,
        start: usize,
        rng: &mut StdRng,
    ) -> (Vec<BeatEvent>, usize) {
        let sigma = base_cycle as f64 * jitter_frac.max(0.0);
        let jitter = Normal::new(0.0, sigma.max(0.0)).unwrap();

        let mut events = Vec::new();
        let mut cursor = start;
        while cursor < num_samples {
            events.push(BeatEvent { offset: cursor, class: BeatClass::Normal });
            let mut interval = base_cycle as f64;
            if sigma > 0.0 {
                interval += jitter.sample(rng);
            }
            cursor += clamp_interval(interval);
        }
        (events, cursor.max(num_samples))
    }

    /// Independent uniform jitter per interval
    fn jittered_train(
        base_cycle: usize,
        jitter_frac: f64,
        num_samples: usize,
        start: usize,
        rng: &mut StdRng,
    ) -> (Vec<BeatEvent>, usize) {
        let mut events = Vec::new();
        let mut cursor = start;
        while cursor < num_samples {
            events.push(BeatEvent { offset: cursor, class: BeatClass::Normal });
            let factor = if jitter_frac > 0.0 {
                1.0 + rng.gen_range(-jitter_frac..jitter_frac)
            } else {
                1.0
            };
            cursor += clamp_interval(base_cycle as f64 * factor);
        }
        (events, cursor.max(num_samples))
    }

    /// Irregularly irregular: the rate itself is resampled from the full
    /// range on every beat, on top of per-interval uniform jitter
    fn chaotic_train(
        config: &RhythmConfig,
        sampling_rate: u32,
        num_samples: usize,
        start: usize,
        rng: &mut StdRng,
    ) -> (Vec<BeatEvent>, usize) {
        let jitter_frac = config.rr_variability;
        let mut events = Vec::new();
        let mut cursor = start;
        while cursor < num_samples {
            events.push(BeatEvent { offset: cursor, class: BeatClass::Normal });
            let cycle = cycle_samples(sample_rate_bpm(config, rng), sampling_rate) as f64;
            let factor = if jitter_frac > 0.0 {
                1.0 + rng.gen_range(-jitter_frac..jitter_frac)
            } else {
                1.0
            };
            cursor += clamp_interval(cycle * factor);
        }
        (events, cursor.max(num_samples))
    }

    /// Deterministic repeating template indexed by beat position.
    /// Each template entry is (interval-before-this-beat factor, class).
    fn patterned_train(
        pattern: ConductionPattern,
        base_cycle: usize,
        num_samples: usize,
        start: usize,
    ) -> (Vec<BeatEvent>, usize) {
        let template: &[(f64, BeatClass)] = match pattern {
            // Compensatory pause after each early ectopic keeps the
            // two-beat cycle summing to 2.0 base cycles
            ConductionPattern::Bigeminy => {
                &[(1.4, BeatClass::Normal), (0.6, BeatClass::Ectopic)]
            }
            ConductionPattern::Trigeminy => &[
                (1.4, BeatClass::Normal),
                (1.0, BeatClass::Normal),
                (0.6, BeatClass::Ectopic),
            ],
            ConductionPattern::Couplet => &[
                (1.8, BeatClass::Normal),
                (1.0, BeatClass::Normal),
                (0.6, BeatClass::Ectopic),
                (0.6, BeatClass::Ectopic),
            ],
            // RR shortens progressively, then the dropped beat leaves a
            // pause shorter than two of the longest cycles
            ConductionPattern::Wenckebach => &[
                (1.6, BeatClass::Normal),
                (1.0, BeatClass::Normal),
                (0.95, BeatClass::Normal),
                (0.9, BeatClass::Normal),
            ],
            // Abrupt non-conducted beat with no PR prolongation
            ConductionPattern::MobitzII => &[
                (2.0, BeatClass::Normal),
                (1.0, BeatClass::Normal),
                (1.0, BeatClass::Normal),
            ],
            ConductionPattern::SinusPause => &[
                (2.5, BeatClass::Normal),
                (1.0, BeatClass::Normal),
                (1.0, BeatClass::Normal),
                (1.0, BeatClass::Normal),
                (1.0, BeatClass::Normal),
            ],
            ConductionPattern::None => &[(1.0, BeatClass::Normal)],
        };

        let mut events = Vec::new();
        let mut cursor = start;
        let mut index = 0usize;
        while cursor < num_samples {
            let (_, class) = template[index % template.len()];
            events.push(BeatEvent { offset: cursor, class });
            index += 1;
            let (next_factor, _) = template[index % template.len()];
            cursor += clamp_interval(base_cycle as f64 * next_factor);
        }
        (events, cursor.max(num_samples))
    }
}

/// Uniform draw from the rhythm's rate range
fn sample_rate_bpm(config: &RhythmConfig, rng: &mut StdRng) -> f64 {
    let (lo, hi) = config.rate_range;
    if hi > lo {
        rng.gen_range(lo..hi)
    } else {
        lo
    }
}

/// Samples per cardiac cycle at the given rate
fn cycle_samples(rate_bpm: f64, sampling_rate: u32) -> usize {
    let samples = (60.0 / rate_bpm) * sampling_rate as f64;
    (samples as usize).max(MIN_CYCLE_SAMPLES)
}

fn clamp_interval(interval: f64) -> usize {
    (interval as usize).max(MIN_CYCLE_SAMPLES)
}
