//! Usage bands for colour-coded displays.

use serde::{Deserialize, Serialize};

pub const DEFAULT_LOW_THRESHOLD: f32 = 50.0;
pub const DEFAULT_HIGH_THRESHOLD: f32 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageBand {
    Low,
    Medium,
    High,
}

/// Display style of a usage bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarStyle {
    Normal,
    Hot,
}

/// Band boundaries; both bounds are inclusive upper limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub low: f32,
    pub high: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            low: DEFAULT_LOW_THRESHOLD,
            high: DEFAULT_HIGH_THRESHOLD,
        }
    }
}

impl Thresholds {
    pub fn band(&self, value: f32) -> UsageBand {
        if value <= self.low {
            UsageBand::Low
        } else if value <= self.high {
            UsageBand::Medium
        } else {
            UsageBand::High
        }
    }

    /// Style for a possibly-missing value. Missing values render `Normal`.
    pub fn style(&self, value: Option<f32>) -> BarStyle {
        value.map_or(BarStyle::Normal, |v| self.band(v).style())
    }
}

impl UsageBand {
    /// Medium and High both render `Hot`, matching the existing dashboards.
    pub fn style(self) -> BarStyle {
        match self {
            UsageBand::Low => BarStyle::Normal,
            UsageBand::Medium | UsageBand::High => BarStyle::Hot,
        }
    }
}
