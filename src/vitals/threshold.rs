//! Threshold alerts
//!
//! The dashboard cards and any other alert display share one rule:
//! a reading is abnormal when it is strictly past its threshold,
//! above it by default or below it for `low_is_bad` vitals.

use serde::{Deserialize, Serialize};

use super::VitalsSample;

/// Visual state of a card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CardState {
    Normal,
    Abnormal,
}

/// Strict comparison; a value equal to the threshold is normal
pub fn is_abnormal(value: f64, threshold: f64, low_is_bad: bool) -> bool {
    if low_is_bad {
        value < threshold
    } else {
        value > threshold
    }
}

/// One vital reading with its alert state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VitalCard {
    pub label: &'static str,
    pub value: f64,
    pub unit: &'static str,
    pub threshold: f64,
    pub low_is_bad: bool,
}

impl VitalCard {
    pub fn new(label: &'static str, value: f64, unit: &'static str, threshold: f64) -> Self {
        Self {
            label,
            value,
            unit,
            threshold,
            low_is_bad: false,
        }
    }

    pub fn low_is_bad(mut self) -> Self {
        self.low_is_bad = true;
        self
    }

    pub fn state(&self) -> CardState {
        if is_abnormal(self.value, self.threshold, self.low_is_bad) {
            CardState::Abnormal
        } else {
            CardState::Normal
        }
    }

    pub fn is_abnormal(&self) -> bool {
        self.state() == CardState::Abnormal
    }
}

/// Alert thresholds for the dashboard cards
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Thresholds {
    #[serde(default = "default_heart_rate")]
    pub heart_rate: f64,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_spo2")]
    pub spo2: f64,
}

fn default_heart_rate() -> f64 {
    100.0
}

fn default_temperature() -> f64 {
    37.5
}

fn default_spo2() -> f64 {
    94.0
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            heart_rate: default_heart_rate(),
            temperature: default_temperature(),
            spo2: default_spo2(),
        }
    }
}

/// Heart rate, temperature and SpO₂ cards for one sample
pub fn vital_cards(sample: &VitalsSample, thresholds: &Thresholds) -> [VitalCard; 3] {
    [
        VitalCard::new("Heart Rate", sample.heart_rate, "bpm", thresholds.heart_rate),
        VitalCard::new("Temperature", sample.temperature, "°C", thresholds.temperature),
        VitalCard::new("SpO₂", sample.spo2, "%", thresholds.spo2).low_is_bad(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_high_is_bad() {
        assert!(is_abnormal(101.0, 100.0, false));
        assert!(!is_abnormal(99.0, 100.0, false));
    }

    #[test]
    fn test_low_is_bad() {
        assert!(is_abnormal(93.0, 94.0, true));
        assert!(!is_abnormal(95.0, 94.0, true));
    }

    #[test]
    fn test_boundary_is_normal() {
        assert!(!is_abnormal(100.0, 100.0, false));
        assert!(!is_abnormal(94.0, 94.0, true));
        assert_eq!(VitalCard::new("Temperature", 37.5, "°C", 37.5).state(), CardState::Normal);
    }

    #[test]
    fn test_default_cards() {
        let sample = VitalsSample {
            heart_rate: 130.0,
            temperature: 36.8,
            spo2: 91.0,
            timestamp: "2024-03-01T10:00:00Z".to_string(),
        };

        let cards = vital_cards(&sample, &Thresholds::default());
        let states: Vec<_> = cards.iter().map(|c| (c.label, c.state())).collect();
        assert_eq!(
            states,
            vec![
                ("Heart Rate", CardState::Abnormal),
                ("Temperature", CardState::Normal),
                ("SpO₂", CardState::Abnormal),
            ]
        );
        assert!(cards[2].low_is_bad);
    }

    #[test]
    fn test_custom_thresholds() {
        let sample = VitalsSample {
            heart_rate: 110.0,
            temperature: 37.0,
            spo2: 96.0,
            timestamp: String::new(),
        };
        let thresholds = Thresholds {
            heart_rate: 120.0,
            temperature: 36.9,
            spo2: 97.0,
        };

        let cards = vital_cards(&sample, &thresholds);
        assert!(!cards[0].is_abnormal());
        assert!(cards[1].is_abnormal());
        assert!(cards[2].is_abnormal());
    }
}
