//! SignalRecord: container for one generated multi-lead ECG strip

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EcgError, EcgResult};
use crate::lead::Lead;
use crate::rhythm::Rhythm;

/// One generated ECG strip: per-lead sample buffers plus the parameters
/// that produced them
#[derive(Debug, Clone)]
pub struct SignalRecord {
    /// Unique identifier for this record
    pub id: Uuid,
    /// Rhythm that was simulated
    pub rhythm: Rhythm,
    /// Sampling rate in Hz
    pub sampling_rate: u32,
    /// Strip duration in seconds
    pub duration: f64,
    /// Leads in the order they were requested
    leads: Vec<Lead>,
    /// Per-lead voltage samples in millivolts
    samples: HashMap<Lead, Vec<f64>>,
}

impl SignalRecord {
    /// Create a record, validating that every lead buffer has the length
    /// implied by duration and sampling rate
    pub fn new(
        rhythm: Rhythm,
        sampling_rate: u32,
        duration: f64,
        channels: Vec<(Lead, Vec<f64>)>,
    ) -> EcgResult<Self> {
        if channels.is_empty() {
            return Err(EcgError::InconsistentRecord {
                reason: "record must contain at least one lead".to_string(),
            });
        }

        let expected = (duration * sampling_rate as f64).floor() as usize;
        let mut leads = Vec::with_capacity(channels.len());
        let mut samples = HashMap::with_capacity(channels.len());

        for (lead, buffer) in channels {
            if buffer.len() != expected {
                return Err(EcgError::InconsistentRecord {
                    reason: format!(
                        "lead {} has {} samples, expected {} ({}s at {}Hz)",
                        lead,
                        buffer.len(),
                        expected,
                        duration,
                        sampling_rate
                    ),
                });
            }
            if samples.insert(lead, buffer).is_some() {
                return Err(EcgError::InconsistentRecord {
                    reason: format!("lead {} appears more than once", lead),
                });
            }
            leads.push(lead);
        }

        Ok(SignalRecord {
            id: Uuid::new_v4(),
            rhythm,
            sampling_rate,
            duration,
            leads,
            samples,
        })
    }

    /// Leads in request order
    pub fn leads(&self) -> &[Lead] {
        &self.leads
    }

    /// Samples for one lead
    pub fn lead(&self, lead: Lead) -> EcgResult<&[f64]> {
        self.samples
            .get(&lead)
            .map(|v| v.as_slice())
            .ok_or_else(|| EcgError::UnknownLead {
                requested: lead,
                available: self.leads.clone(),
            })
    }

    /// Number of samples per lead
    pub fn num_samples(&self) -> usize {
        (self.duration * self.sampling_rate as f64).floor() as usize
    }

    /// Time axis in seconds, one entry per sample
    pub fn time_axis(&self) -> Vec<f64> {
        let dt = 1.0 / self.sampling_rate as f64;
        (0..self.num_samples()).map(|i| i as f64 * dt).collect()
    }

    /// All leads as rows, in request order
    pub fn to_matrix(&self) -> Vec<Vec<f64>> {
        self.leads
            .iter()
            .map(|lead| self.samples[lead].clone())
            .collect()
    }

    /// Basic statistics for one lead
    pub fn lead_stats(&self, lead: Lead) -> EcgResult<ChannelStats> {
        let data = self.lead(lead)?;
        Ok(ChannelStats::calculate(data))
    }
}

/// Basic statistics for one lead buffer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelStats {
    pub mean: f64,
    pub rms: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub peak_to_peak: f64,
}

impl ChannelStats {
    pub fn calculate(data: &[f64]) -> Self {
        if data.is_empty() {
            return Self {
                mean: 0.0,
                rms: 0.0,
                std_dev: 0.0,
                min: 0.0,
                max: 0.0,
                peak_to_peak: 0.0,
            };
        }

        let n = data.len() as f64;
        let mean = data.iter().sum::<f64>() / n;
        let rms = (data.iter().map(|x| x * x).sum::<f64>() / n).sqrt();
        let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();
        let min = data.iter().fold(f64::INFINITY, |a, &b| a.min(b));
        let max = data.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));

        Self {
            mean,
            rms,
            std_dev,
            min,
            max,
            peak_to_peak: max - min,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_channel(lead: Lead, n: usize) -> (Lead, Vec<f64>) {
        (lead, vec![0.0; n])
    }

    #[test]
    fn test_record_creation() {
        let record = SignalRecord::new(
            Rhythm::NormalSinus,
            500,
            2.0,
            vec![flat_channel(Lead::II, 1000)],
        )
        .unwrap();

        assert_eq!(record.num_samples(), 1000);
        assert_eq!(record.leads(), &[Lead::II]);
        assert_eq!(record.lead(Lead::II).unwrap().len(), 1000);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let result = SignalRecord::new(
            Rhythm::NormalSinus,
            500,
            2.0,
            vec![flat_channel(Lead::II, 999)],
        );
        assert!(matches!(result, Err(EcgError::InconsistentRecord { .. })));
    }

    #[test]
    fn test_duplicate_lead_rejected() {
        let result = SignalRecord::new(
            Rhythm::NormalSinus,
            250,
            1.0,
            vec![flat_channel(Lead::I, 250), flat_channel(Lead::I, 250)],
        );
        assert!(matches!(result, Err(EcgError::InconsistentRecord { .. })));
    }

    #[test]
    fn test_missing_lead_reports_available() {
        let record = SignalRecord::new(
            Rhythm::NormalSinus,
            250,
            1.0,
            vec![flat_channel(Lead::I, 250), flat_channel(Lead::II, 250)],
        )
        .unwrap();

        match record.lead(Lead::V3) {
            Err(EcgError::UnknownLead { requested, available }) => {
                assert_eq!(requested, Lead::V3);
                assert_eq!(available, vec![Lead::I, Lead::II]);
            }
            other => panic!("expected UnknownLead, got {:?}", other),
        }
    }

    #[test]
    fn test_time_axis_and_stats() {
        let samples: Vec<f64> = (0..500).map(|i| if i == 250 { 1.0 } else { 0.0 }).collect();
        let record =
            SignalRecord::new(Rhythm::NormalSinus, 500, 1.0, vec![(Lead::II, samples)]).unwrap();

        let t = record.time_axis();
        assert_eq!(t.len(), 500);
        assert!((t[499] - 0.998).abs() < 1e-9);

        let stats = record.lead_stats(Lead::II).unwrap();
        assert_eq!(stats.max, 1.0);
        assert_eq!(stats.min, 0.0);
        assert_eq!(stats.peak_to_peak, 1.0);
    }
}
