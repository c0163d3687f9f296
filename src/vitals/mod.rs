//! Append-only log of glucose readings and the statistics derived from it

mod types;

pub use types::*;

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::storage;

/// Readings in insertion order. Entries are never edited or removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VitalsLog {
    entries: Vec<VitalLog>,
}

impl VitalsLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a glucose value as typed by the user
    pub fn parse_glucose(input: &str) -> Result<u32> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Error::validation("glucose level is required"));
        }
        match trimmed.parse::<u32>() {
            Ok(0) | Err(_) => Err(Error::validation(format!(
                "glucose level must be a positive whole number, got {:?}",
                trimmed
            ))),
            Ok(value) => Ok(value),
        }
    }

    /// Records a reading taken now
    pub fn append(&mut self, reading: NewReading) -> Result<&VitalLog> {
        self.append_at(reading, storage::now())
    }

    /// Records a reading with an explicit timestamp
    pub fn append_at(
        &mut self,
        reading: NewReading,
        timestamp: DateTime<Utc>,
    ) -> Result<&VitalLog> {
        if reading.blood_sugar == 0 {
            return Err(Error::validation("glucose level must be positive"));
        }
        let entry = VitalLog {
            id: Uuid::new_v4().to_string(),
            timestamp,
            blood_sugar: reading.blood_sugar,
            context: reading.context,
            notes: reading.notes,
        };
        debug!(
            "recorded {} mg/dL ({}) as {}",
            entry.blood_sugar, entry.context, entry.id
        );
        self.entries.push(entry);
        Ok(&self.entries[self.entries.len() - 1])
    }

    pub fn entries(&self) -> &[VitalLog] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The last appended reading
    pub fn latest(&self) -> Option<&VitalLog> {
        self.entries.last()
    }

    /// Arithmetic mean of every recorded value
    pub fn average(&self) -> Option<f64> {
        if self.entries.is_empty() {
            return None;
        }
        let total: u64 = self.entries.iter().map(|v| u64::from(v.blood_sugar)).sum();
        Some(total as f64 / self.entries.len() as f64)
    }

    /// The mean rounded half away from zero, as shown on the dashboard
    pub fn rounded_average(&self) -> Option<u32> {
        self.average().map(|avg| avg.round() as u32)
    }

    /// Classification of each reading in insertion order
    pub fn statuses(&self) -> Vec<GlucoseStatus> {
        self.entries.iter().map(VitalLog::status).collect()
    }

    /// The last `n` readings, oldest first
    pub fn window(&self, n: usize) -> &[VitalLog] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    /// The last `n` readings, newest first
    pub fn most_recent(&self, n: usize) -> impl Iterator<Item = &VitalLog> {
        self.entries.iter().rev().take(n)
    }

    pub fn summary(&self) -> VitalsSummary {
        let latest = self.latest().cloned();
        VitalsSummary {
            latest_status: latest.as_ref().map(VitalLog::status),
            latest,
            average: self.average(),
            count: self.entries.len(),
        }
    }
}

/// Snapshot of the statistics shown on the dashboard
#[derive(Debug, Clone, PartialEq)]
pub struct VitalsSummary {
    pub latest: Option<VitalLog>,
    pub latest_status: Option<GlucoseStatus>,
    pub average: Option<f64>,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000 + minutes * 60_000)
            .unwrap()
    }

    fn log_of(values: &[u32]) -> VitalsLog {
        let mut log = VitalsLog::new();
        for (i, value) in values.iter().enumerate() {
            log.append_at(NewReading::new(*value, ReadingContext::Random), at(i as i64))
                .unwrap();
        }
        log
    }

    #[test]
    fn test_three_reading_scenario() {
        let log = log_of(&[120, 65, 190]);
        let summary = log.summary();
        assert_eq!(summary.latest.unwrap().blood_sugar, 190);
        assert_eq!(summary.latest_status, Some(GlucoseStatus::High));
        assert_eq!(summary.average, Some(125.0));
        assert_eq!(
            log.statuses(),
            vec![GlucoseStatus::Normal, GlucoseStatus::Low, GlucoseStatus::High]
        );
    }

    #[test]
    fn test_threshold_boundaries() {
        assert_eq!(GlucoseStatus::classify(69), GlucoseStatus::Low);
        assert_eq!(GlucoseStatus::classify(70), GlucoseStatus::Normal);
        assert_eq!(GlucoseStatus::classify(180), GlucoseStatus::Normal);
        assert_eq!(GlucoseStatus::classify(181), GlucoseStatus::High);
    }

    #[test]
    fn test_latest_and_average_track_every_append() {
        let values = [95, 210, 143, 66, 180, 71, 300, 88];
        let mut log = VitalsLog::new();
        let mut sum = 0u64;
        for (i, value) in values.iter().enumerate() {
            log.append(NewReading::new(*value, ReadingContext::Fasting)).unwrap();
            sum += u64::from(*value);
            assert_eq!(log.latest().unwrap().blood_sugar, *value);
            let expected = sum as f64 / (i + 1) as f64;
            assert!((log.average().unwrap() - expected).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_empty_log() {
        let log = VitalsLog::new();
        assert!(log.latest().is_none());
        assert!(log.average().is_none());
        assert!(log.rounded_average().is_none());
        assert!(log.window(7).is_empty());
    }

    #[test]
    fn test_rounded_average() {
        assert_eq!(log_of(&[100, 101]).rounded_average(), Some(101));
        assert_eq!(log_of(&[100, 100, 101]).rounded_average(), Some(100));
    }

    #[test]
    fn test_window_and_most_recent() {
        let log = log_of(&[1, 2, 3, 4, 5, 6, 7, 8, 9]);
        let window: Vec<u32> = log.window(7).iter().map(|v| v.blood_sugar).collect();
        assert_eq!(window, vec![3, 4, 5, 6, 7, 8, 9]);
        let recent: Vec<u32> = log.most_recent(3).map(|v| v.blood_sugar).collect();
        assert_eq!(recent, vec![9, 8, 7]);
    }

    #[test]
    fn test_ids_are_unique() {
        let log = log_of(&[100; 50]);
        let mut ids: Vec<&str> = log.entries().iter().map(|v| v.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 50);
    }

    #[test]
    fn test_parse_glucose() {
        assert_eq!(VitalsLog::parse_glucose(" 142 ").unwrap(), 142);
        assert!(VitalsLog::parse_glucose("").unwrap_err().is_validation());
        assert!(VitalsLog::parse_glucose("0").is_err());
        assert!(VitalsLog::parse_glucose("-5").is_err());
        assert!(VitalsLog::parse_glucose("abc").is_err());
    }

    #[test]
    fn test_serialized_shape() {
        let mut log = VitalsLog::new();
        log.append_at(
            NewReading::new(150, ReadingContext::PostMeal).with_notes("after lunch"),
            at(0),
        )
        .unwrap();
        let value = serde_json::to_value(&log).unwrap();
        let entry = &value.as_array().unwrap()[0];
        assert_eq!(entry["bloodSugar"], 150);
        assert_eq!(entry["context"], "Post-Meal");
        assert_eq!(entry["timestamp"], 1_700_000_000_000i64);
        assert_eq!(entry["notes"], "after lunch");
    }

    #[test]
    fn test_blank_note_is_absent() {
        let reading = NewReading::new(100, ReadingContext::Random).with_notes("   ");
        assert!(reading.notes.is_none());
    }
}
