//! Per-year scalar diagnostics recorded as a glacier evolves.

use serde::{Deserialize, Serialize};

/// One year's worth of diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Glacier age (yr).
    pub time: f64,
    /// Glacier length (m).
    pub length_m: f64,
    /// Glacier area (km^2).
    pub area_km2: f64,
    /// Ice volume (km^3).
    pub volume_km3: f64,
    /// Effective equilibrium line altitude (m).
    pub ela_m: f64,
    /// Applied temperature bias (K).
    pub temp_bias: f64,
    /// Maximum ice velocity during the year (m/yr).
    pub max_velocity_m_yr: f64,
}

/// Append-only table of per-year diagnostics, one column per field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct History {
    time: Vec<f64>,
    length_m: Vec<f64>,
    area_km2: Vec<f64>,
    volume_km3: Vec<f64>,
    ela_m: Vec<f64>,
    temp_bias: Vec<f64>,
    max_velocity_m_yr: Vec<f64>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-allocate all columns for `n` records.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            time: Vec::with_capacity(n),
            length_m: Vec::with_capacity(n),
            area_km2: Vec::with_capacity(n),
            volume_km3: Vec::with_capacity(n),
            ela_m: Vec::with_capacity(n),
            temp_bias: Vec::with_capacity(n),
            max_velocity_m_yr: Vec::with_capacity(n),
        }
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Append a record.
    ///
    /// Panics if `record.time` does not come strictly after the last record.
    pub fn push(&mut self, record: HistoryRecord) {
        if let Some(&last) = self.time.last() {
            if record.time <= last {
                panic!(
                    "history time must be strictly increasing: {} after {}",
                    record.time, last
                );
            }
        }
        self.time.push(record.time);
        self.length_m.push(record.length_m);
        self.area_km2.push(record.area_km2);
        self.volume_km3.push(record.volume_km3);
        self.ela_m.push(record.ela_m);
        self.temp_bias.push(record.temp_bias);
        self.max_velocity_m_yr.push(record.max_velocity_m_yr);
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn length_m(&self) -> &[f64] {
        &self.length_m
    }

    pub fn area_km2(&self) -> &[f64] {
        &self.area_km2
    }

    pub fn volume_km3(&self) -> &[f64] {
        &self.volume_km3
    }

    pub fn ela_m(&self) -> &[f64] {
        &self.ela_m
    }

    pub fn temp_bias(&self) -> &[f64] {
        &self.temp_bias
    }

    pub fn max_velocity_m_yr(&self) -> &[f64] {
        &self.max_velocity_m_yr
    }

    /// The record at index `i`.
    pub fn record(&self, i: usize) -> HistoryRecord {
        HistoryRecord {
            time: self.time[i],
            length_m: self.length_m[i],
            area_km2: self.area_km2[i],
            volume_km3: self.volume_km3[i],
            ela_m: self.ela_m[i],
            temp_bias: self.temp_bias[i],
            max_velocity_m_yr: self.max_velocity_m_yr[i],
        }
    }

    pub fn last(&self) -> Option<HistoryRecord> {
        if self.is_empty() {
            None
        } else {
            Some(self.record(self.len() - 1))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = HistoryRecord> + '_ {
        (0..self.len()).map(move |i| self.record(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(time: f64, volume: f64) -> HistoryRecord {
        HistoryRecord {
            time,
            length_m: 1000.0,
            area_km2: 0.3,
            volume_km3: volume,
            ela_m: 3000.0,
            temp_bias: 0.0,
            max_velocity_m_yr: 20.0,
        }
    }

    #[test]
    fn test_push_and_read_back() {
        let mut history = History::new();
        history.push(record(0.0, 0.0));
        history.push(record(1.0, 0.1));

        assert_eq!(history.len(), 2);
        assert_eq!(history.time(), &[0.0, 1.0]);
        assert_eq!(history.volume_km3(), &[0.0, 0.1]);
        assert_eq!(history.last().unwrap().time, 1.0);
    }

    #[test]
    #[should_panic]
    fn test_non_monotonic_time_panics() {
        let mut history = History::new();
        history.push(record(5.0, 0.0));
        history.push(record(5.0, 0.1));
    }

    #[test]
    fn test_iter_round_trips_records() {
        let mut history = History::new();
        for i in 0..10 {
            history.push(record(i as f64, i as f64 * 0.01));
        }

        let collected: Vec<HistoryRecord> = history.iter().collect();
        assert_eq!(collected.len(), 10);
        assert_eq!(collected[3], history.record(3));
    }

    #[test]
    fn test_serialization() {
        let mut history = History::new();
        history.push(record(0.0, 0.0));
        history.push(record(1.0, 0.2));

        let json = serde_json::to_string(&history).expect("Serialization failed");
        let parsed: History = serde_json::from_str(&json).expect("Deserialization failed");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.volume_km3(), history.volume_km3());
    }
}
