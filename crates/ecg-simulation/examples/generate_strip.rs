//! Basic usage examples for the ECG simulator
//!
//! Generates strips across the fidelity layers, switches layers
//! mid-session and prints summary statistics for each run.

use anyhow::Result;
use ecg_core::{Lead, Rhythm};
use ecg_simulation::{EcgSimulator, LayerKind, SimulatorConfig};

fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    println!("=== ECG Simulator Examples ===\n");

    single_lead_example()?;
    twelve_lead_example()?;
    layer_switching_example()?;
    arrhythmia_tour()?;

    println!("=== All examples completed ===");
    Ok(())
}

/// Example 1: a 10 second lead II sinus strip
fn single_lead_example() -> Result<()> {
    println!("1. Single-lead Normal Sinus Strip");

    let config = SimulatorConfig { seed: Some(42), ..SimulatorConfig::default() };
    let mut sim = EcgSimulator::new(config)?;

    let record = sim.generate(Rhythm::NormalSinus, 10.0)?;
    let stats = record.lead_stats(Lead::II)?;

    println!("   record {} ({} samples at {}Hz)", record.id, record.num_samples(), record.sampling_rate);
    println!("   lead II: peak-to-peak {:.2}mV, RMS {:.3}mV", stats.peak_to_peak, stats.rms);
    Ok(())
}

/// Example 2: all twelve leads at once
fn twelve_lead_example() -> Result<()> {
    println!("\n2. Twelve-lead Strip");

    let config = SimulatorConfig {
        leads: Lead::STANDARD_12.to_vec(),
        seed: Some(42),
        ..SimulatorConfig::default()
    };
    let mut sim = EcgSimulator::new(config)?;

    let record = sim.generate(Rhythm::SinusTachycardia, 5.0)?;
    for &lead in record.leads() {
        let stats = record.lead_stats(lead)?;
        println!("   {:>4}: peak-to-peak {:.2}mV", lead.as_str(), stats.peak_to_peak);
    }
    Ok(())
}

/// Example 3: switch fidelity layers without losing the beat train
fn layer_switching_example() -> Result<()> {
    println!("\n3. Layer Switching");

    let config = SimulatorConfig { seed: Some(7), ..SimulatorConfig::default() };
    let mut sim = EcgSimulator::new(config)?;

    for kind in [LayerKind::Lookup, LayerKind::Parametric, LayerKind::Biophysical] {
        sim.switch_layer(kind)?;
        let record = sim.generate(Rhythm::NormalSinus, 4.0)?;
        let stats = record.lead_stats(Lead::II)?;
        println!("   {:>12} layer: peak-to-peak {:.2}mV", kind.as_str(), stats.peak_to_peak);
    }
    Ok(())
}

/// Example 4: a quick tour of the arrhythmia taxonomy
fn arrhythmia_tour() -> Result<()> {
    println!("\n4. Arrhythmia Tour");

    let config = SimulatorConfig { seed: Some(99), ..SimulatorConfig::default() };
    let mut sim = EcgSimulator::new(config)?;

    let tour = [
        Rhythm::AtrialFibrillation,
        Rhythm::AvBlockWenckebach,
        Rhythm::PvcBigeminy,
        Rhythm::VentricularTachycardiaMono,
        Rhythm::VentricularFibrillationCoarse,
        Rhythm::Asystole,
    ];
    for rhythm in tour {
        let record = sim.generate(rhythm, 6.0)?;
        let stats = record.lead_stats(Lead::II)?;
        println!(
            "   {:<36} peak-to-peak {:.2}mV, std {:.3}mV",
            rhythm.as_str(),
            stats.peak_to_peak,
            stats.std_dev
        );
    }
    Ok(())
}
