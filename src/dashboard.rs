//! Dashboard derived from the vitals log

use chrono::{DateTime, Datelike, Local, Timelike};
use std::fmt::Write as _;

use crate::assistant::format_timestamp;
use crate::profile::UserProfile;
use crate::vitals::{GlucoseStatus, VitalLog, VitalsLog};

/// Readings plotted on the trend chart
pub const CHART_WINDOW: usize = 7;
/// Readings shown in the history preview
pub const HISTORY_PREVIEW: usize = 5;

pub const TIPS: [&str; 4] = [
    "Walking for just 10 minutes after a meal can help improve blood sugar levels.",
    "Stay hydrated! Water helps your kidneys flush out excess sugar through urine.",
    "Fiber is your friend. Vegetables and whole grains help slow sugar absorption.",
    "Consistency is key. Try to eat at similar times each day to keep levels stable.",
];

pub fn greeting(hour: u32) -> &'static str {
    if hour < 12 {
        "Good Morning"
    } else if hour < 18 {
        "Good Afternoon"
    } else {
        "Good Evening"
    }
}

pub fn daily_tip(day_of_month: u32) -> &'static str {
    TIPS[day_of_month as usize % TIPS.len()]
}

/// One point of the trend chart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartPoint {
    /// Local `HH:MM`
    pub label: String,
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub greeting: &'static str,
    pub tip: &'static str,
    pub latest: Option<VitalLog>,
    pub latest_status: Option<GlucoseStatus>,
    pub average: Option<u32>,
    pub chart: Vec<ChartPoint>,
    /// Newest first
    pub history: Vec<VitalLog>,
}

impl Dashboard {
    pub fn build(vitals: &VitalsLog, now: DateTime<Local>) -> Self {
        let summary = vitals.summary();
        let chart = vitals
            .window(CHART_WINDOW)
            .iter()
            .map(|v| ChartPoint {
                label: v.timestamp.with_timezone(&Local).format("%H:%M").to_string(),
                value: v.blood_sugar,
            })
            .collect();

        Self {
            greeting: greeting(now.hour()),
            tip: daily_tip(now.day()),
            latest: summary.latest,
            latest_status: summary.latest_status,
            average: vitals.rounded_average(),
            chart,
            history: vitals.most_recent(HISTORY_PREVIEW).cloned().collect(),
        }
    }

    /// A trend needs at least two points
    pub fn has_trend(&self) -> bool {
        self.chart.len() > 1
    }

    pub fn render(&self, profile: &UserProfile) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}, {}", self.greeting, profile.name);
        let _ = writeln!(out);

        match (&self.latest, self.latest_status) {
            (Some(latest), Some(status)) => {
                let _ = writeln!(out, "Latest: {} mg/dL [{}]", latest.blood_sugar, status);
            }
            _ => {
                let _ = writeln!(out, "Latest: -- mg/dL");
            }
        }
        match self.average {
            Some(avg) => {
                let _ = writeln!(out, "Average: {} mg/dL", avg);
            }
            None => {
                let _ = writeln!(out, "Average: -- mg/dL");
            }
        }

        let _ = writeln!(out);
        if self.has_trend() {
            let _ = writeln!(out, "Trend (last {}):", self.chart.len());
            let max = self.chart.iter().map(|p| p.value).max().unwrap_or(1).max(1);
            for point in &self.chart {
                let width = (point.value as usize * 30) / max as usize;
                let bar = "#".repeat(width.max(1));
                let _ = writeln!(out, "  {} {:>4} {}", point.label, point.value, bar);
            }
        } else {
            let _ = writeln!(out, "Log at least two readings to see your trend.");
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "Tip of the day: {}", self.tip);
        let _ = writeln!(out);
        let _ = writeln!(out, "Recent readings:");
        if self.history.is_empty() {
            let _ = writeln!(out, "  No records yet. Start by logging your first reading.");
        }
        for vital in &self.history {
            let _ = write!(
                out,
                "  {}  {:>4} mg/dL  {:<9} {}",
                format_timestamp(&vital.timestamp),
                vital.blood_sugar,
                vital.context.as_str(),
                vital.status()
            );
            if let Some(notes) = &vital.notes {
                let _ = write!(out, "  ({})", notes);
            }
            let _ = writeln!(out);
        }
        out
    }
}
