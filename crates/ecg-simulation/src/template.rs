//! Wave fragment rendering and beat composition
//!
//! The lookup layer renders beats directly from these fragments; the
//! chaotic baseline textures here also serve the parametric layer, which
//! shares beat placement but synthesizes its own morphology.

use ecg_core::{BaselineTexture, Lead, RhythmConfig, WaveParams, WaveShape};
use rand::rngs::StdRng;
use rand::Rng;

use crate::schedule::{BeatClass, BeatSchedule};

/// Relative projection of a dominantly-positive lead II beat onto each
/// surface lead. Sign flips model the frontal axis and the right-sided
/// precordial leads.
pub fn lead_scale(lead: Lead) -> f64 {
    match lead {
        Lead::I => 0.6,
        Lead::II => 1.0,
        Lead::III => 0.5,
        Lead::AVR => -0.9,
        Lead::AVL => 0.35,
        Lead::AVF => 0.75,
        Lead::V1 => -0.4,
        Lead::V2 => -0.2,
        Lead::V3 => 0.3,
        Lead::V4 => 0.8,
        Lead::V5 => 0.9,
        Lead::V6 => 0.7,
    }
}

/// Render one wave fragment at the given sampling rate
pub fn render_wave(params: &WaveParams, sampling_rate: u32) -> Vec<f64> {
    let n = ((params.duration_ms / 1000.0) * sampling_rate as f64).round() as usize;
    if n == 0 || params.amplitude_mv == 0.0 {
        return vec![0.0; n];
    }

    let amp = params.amplitude_mv * params.polarity;
    // skew in [-1, 1] shifts the peak off-center by up to a quarter width
    let center = 0.5 + 0.25 * params.skew.clamp(-1.0, 1.0);

    (0..n)
        .map(|i| {
            let x = i as f64 / (n - 1).max(1) as f64; // 0..1 across the fragment
            amp * shape_value(params.shape, x, center)
        })
        .collect()
}

/// Normalized shape function, peak value 1.0 at `x = center`
fn shape_value(shape: WaveShape, x: f64, center: f64) -> f64 {
    match shape {
        WaveShape::Gaussian => {
            let sigma = 0.18;
            (-((x - center).powi(2)) / (2.0 * sigma * sigma)).exp()
        }
        WaveShape::Triangle => {
            if x <= center {
                x / center.max(f64::EPSILON)
            } else {
                (1.0 - x) / (1.0 - center).max(f64::EPSILON)
            }
        }
        WaveShape::Sine => (std::f64::consts::PI * x).sin(),
        // slow rise, abrupt return
        WaveShape::Sawtooth => {
            if x < 0.9 {
                x / 0.9
            } else {
                (1.0 - x) / 0.1
            }
        }
        // Q-R-S: small negative deflection, dominant R, sharp S undershoot
        WaveShape::Qrs => {
            gaussian(x, 0.25, 0.06, -0.15)
                + gaussian(x, 0.5, 0.08, 1.0)
                + gaussian(x, 0.75, 0.06, -0.25)
        }
        // Slurred, broad ventricular complex with a deep terminal S
        WaveShape::WideQrs => gaussian(x, 0.45, 0.16, 1.0) + gaussian(x, 0.85, 0.12, -0.45),
        // Pre-excitation: slow delta upstroke fused into the R wave
        WaveShape::Delta => {
            let delta = if x < 0.4 { x / 0.4 * 0.35 } else { 0.0 };
            delta + gaussian(x, 0.55, 0.09, 1.0) + gaussian(x, 0.8, 0.06, -0.2)
        }
        // rSr' with coved, downsloping ST elevation
        WaveShape::Brugada => {
            gaussian(x, 0.2, 0.05, 0.6)
                + gaussian(x, 0.45, 0.06, 1.0)
                + if x > 0.5 { 0.45 * (1.0 - (x - 0.5) / 0.5) } else { 0.0 }
        }
    }
}

fn gaussian(x: f64, center: f64, sigma: f64, height: f64) -> f64 {
    height * (-((x - center).powi(2)) / (2.0 * sigma * sigma)).exp()
}

/// Add `fragment` into `buffer` starting at `offset`, clipping at the
/// window edges. `offset` may be negative for fragments straddling the
/// window start.
pub fn add_fragment(buffer: &mut [f64], offset: i64, fragment: &[f64], scale: f64) {
    for (i, v) in fragment.iter().enumerate() {
        let idx = offset + i as i64;
        if idx >= 0 && (idx as usize) < buffer.len() {
            buffer[idx as usize] += v * scale;
        }
    }
}

/// Compose one full beat (P, QRS, T per the config) into the buffer.
/// `onset` is the QRS onset sample. Ectopic beats get a wide QRS with a
/// discordant T and suppress the P wave.
pub fn add_beat(
    buffer: &mut [f64],
    onset: usize,
    class: BeatClass,
    config: &RhythmConfig,
    sampling_rate: u32,
    scale: f64,
) {
    let ms_to_samples = |ms: f64| (ms / 1000.0) * sampling_rate as f64;

    let (qrs, t_wave, p_wave) = match class {
        BeatClass::Normal => (config.qrs, config.t_wave, config.p_wave),
        BeatClass::Ectopic => (
            WaveParams::new(1.8, 140.0, WaveShape::WideQrs),
            Some(WaveParams::new(0.5, 140.0, WaveShape::Gaussian).inverted()),
            None,
        ),
    };

    if let (Some(p), Some(pr_ms)) = (p_wave, config.pr_interval_ms) {
        let p_frag = render_wave(&p, sampling_rate);
        let p_onset = onset as i64 - ms_to_samples(pr_ms) as i64;
        add_fragment(buffer, p_onset, &p_frag, scale);
    }

    let qrs_frag = render_wave(&qrs, sampling_rate);
    add_fragment(buffer, onset as i64, &qrs_frag, scale);

    if let Some(t) = t_wave {
        let qt_ms = config.qt_interval_ms.unwrap_or(400.0);
        let t_onset =
            onset as i64 + ms_to_samples(qt_ms - t.duration_ms).max(0.0) as i64;
        let t_frag = render_wave(&t, sampling_rate);
        add_fragment(buffer, t_onset, &t_frag, scale);
    }
}

/// Compose a whole scheduled beat train into a fresh buffer
pub fn render_beat_train(
    schedule: &BeatSchedule,
    config: &RhythmConfig,
    sampling_rate: u32,
    num_samples: usize,
    scale: f64,
) -> Vec<f64> {
    let mut buffer = vec![0.0; num_samples];
    for event in &schedule.events {
        add_beat(&mut buffer, event.offset, event.class, config, sampling_rate, scale);
    }
    buffer
}

/// Continuous baseline texture underlying (or replacing) the beat train
pub fn render_texture(
    texture: BaselineTexture,
    sampling_rate: u32,
    num_samples: usize,
    scale: f64,
    rng: &mut StdRng,
) -> Vec<f64> {
    let dt = 1.0 / sampling_rate as f64;
    match texture {
        BaselineTexture::Flat => vec![0.0; num_samples],

        // Low-amplitude multi-frequency wobble standing in for f waves
        BaselineTexture::Fibrillatory => {
            oscillator_sum(num_samples, dt, scale, rng, &[(4.0, 9.0, 0.05), (7.0, 12.0, 0.03)])
        }

        // Sawtooth at ~300/min (5 Hz)
        BaselineTexture::Flutter => {
            let phase0: f64 = rng.gen_range(0.0..1.0);
            (0..num_samples)
                .map(|i| {
                    let phase = (i as f64 * dt * 5.0 + phase0).fract();
                    scale * 0.2 * (2.0 * phase - 1.0)
                })
                .collect()
        }

        BaselineTexture::Chaotic => {
            oscillator_sum(num_samples, dt, scale, rng, &[
                (3.0, 6.0, 0.45),
                (4.0, 8.0, 0.30),
                (6.0, 10.0, 0.20),
            ])
        }

        BaselineTexture::ChaoticFine => {
            oscillator_sum(num_samples, dt, scale, rng, &[
                (4.0, 8.0, 0.12),
                (6.0, 11.0, 0.08),
                (8.0, 13.0, 0.05),
            ])
        }

        // Wide complexes whose amplitude twists around the baseline
        BaselineTexture::Torsades => {
            let f_qrs: f64 = rng.gen_range(3.5..5.0); // 210-300 bpm
            let f_twist: f64 = rng.gen_range(0.2..0.4);
            let phase: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
            (0..num_samples)
                .map(|i| {
                    let t = i as f64 * dt;
                    let envelope = (std::f64::consts::TAU * f_twist * t).sin();
                    scale * 1.2 * envelope * (std::f64::consts::TAU * f_qrs * t + phase).sin()
                })
                .collect()
        }
    }
}

/// Sum of randomly-phased sinusoids, one per (f_min, f_max, amplitude) band
fn oscillator_sum(
    num_samples: usize,
    dt: f64,
    scale: f64,
    rng: &mut StdRng,
    bands: &[(f64, f64, f64)],
) -> Vec<f64> {
    let components: Vec<(f64, f64, f64)> = bands
        .iter()
        .map(|&(lo, hi, amp)| {
            (rng.gen_range(lo..hi), rng.gen_range(0.0..std::f64::consts::TAU), amp)
        })
        .collect();

    (0..num_samples)
        .map(|i| {
            let t = i as f64 * dt;
            components
                .iter()
                .map(|&(f, phase, amp)| {
                    scale * amp * (std::f64::consts::TAU * f * t + phase).sin()
                })
                .sum()
        })
        .collect()
}
