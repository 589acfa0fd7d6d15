//! CPU temperature lookup from grouped sensor readings.
//!
//! Platforms report temperatures as named groups (a hwmon chip, an ACPI
//! zone, ...) each holding one or more readings. Which group belongs to the
//! CPU is not standardised, so the lookup is a naming heuristic: the first
//! group whose name starts with one of an ordered list of prefixes wins and
//! its readings are averaged. This is best-effort. A board that names its
//! CPU chip something unexpected reports no temperature, and a group that
//! happens to match a prefix is trusted even if it is not the CPU.

use serde::{Deserialize, Serialize};

/// Default prefixes, matched case-insensitively against group names.
pub const DEFAULT_SENSOR_PREFIXES: &[&str] = &["core", "cpu"];

/// One named group of temperature readings in °C.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorGroup {
    pub name: String,
    pub readings: Vec<f32>,
}

impl SensorGroup {
    pub fn new(name: impl Into<String>, readings: Vec<f32>) -> Self {
        Self {
            name: name.into(),
            readings,
        }
    }

    fn mean(&self) -> Option<f32> {
        if self.readings.is_empty() {
            return None;
        }
        Some(self.readings.iter().sum::<f32>() / self.readings.len() as f32)
    }
}

/// Ordered list of group-name prefixes that identify CPU sensors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorMatcher {
    prefixes: Vec<String>,
}

impl SensorMatcher {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            prefixes: prefixes
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn matches(&self, group_name: &str) -> bool {
        let name = group_name.to_lowercase();
        self.prefixes.iter().any(|p| name.starts_with(p.as_str()))
    }

    /// Mean of the first matching, non-empty group in source order.
    pub fn cpu_temperature(&self, groups: &[SensorGroup]) -> Option<f32> {
        groups
            .iter()
            .filter(|g| self.matches(&g.name))
            .find_map(SensorGroup::mean)
    }
}

impl Default for SensorMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_SENSOR_PREFIXES)
    }
}

/// Groups flat `(label, temperature)` component readings by chip name.
///
/// Component labels look like `"coretemp Core 0"` or `"k10temp Tctl"`; the
/// first whitespace-separated token is the chip and becomes the group name.
/// Group order follows first appearance. Non-finite readings are dropped.
pub fn group_component_readings<'a, I>(readings: I) -> Vec<SensorGroup>
where
    I: IntoIterator<Item = (&'a str, f32)>,
{
    let mut groups: Vec<SensorGroup> = Vec::new();

    for (label, temp) in readings {
        if !temp.is_finite() {
            continue;
        }
        let chip = label.split_whitespace().next().unwrap_or(label);
        match groups.iter_mut().find(|g| g.name == chip) {
            Some(group) => group.readings.push(temp),
            None => groups.push(SensorGroup::new(chip, vec![temp])),
        }
    }

    groups
}
