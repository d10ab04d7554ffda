//! Intended-state snapshots and their diff.
//!
//! A snapshot maps device name → pin name → evaluated value. The diff of
//! two snapshots is the minimal set of entries that must be pushed to
//! devices; it is a pure function of its inputs.

use std::collections::BTreeMap;

use crate::expr::Value;

/// The set of entries that changed between two snapshots.
pub type StateDelta = IntendedState;

/// What every output pin should currently read, keyed by device and pin.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntendedState {
    map: BTreeMap<String, BTreeMap<String, Value>>,
}

impl IntendedState {
    /// Record the intended value for one pin.
    pub fn insert(&mut self, device: &str, pin: &str, value: Value) {
        self.map
            .entry(device.to_string())
            .or_default()
            .insert(pin.to_string(), value);
    }

    /// Look up one pin's intended value.
    #[must_use]
    pub fn get(&self, device: &str, pin: &str) -> Option<&Value> {
        self.map.get(device)?.get(pin)
    }

    /// All pins of one device.
    #[must_use]
    pub fn device(&self, device: &str) -> Option<&BTreeMap<String, Value>> {
        self.map.get(device)
    }

    /// Whether the snapshot holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterate `(device, pin, value)` entries in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, &Value)> {
        self.map.iter().flat_map(|(device, pins)| {
            pins.iter()
                .map(move |(pin, value)| (device.as_str(), pin.as_str(), value))
        })
    }

    /// Entries of `after` that are absent from or unequal in `self`.
    ///
    /// Equality is strict ([`Value`] identity, no coercion). Entries
    /// present only in `self` — pins deleted between the snapshots —
    /// are not reported: a vanished pin has no intended state to push.
    #[must_use]
    pub fn diff(&self, after: &IntendedState) -> StateDelta {
        let mut delta = StateDelta::default();
        for (device, pin, value) in after.entries() {
            if self.get(device, pin) != Some(value) {
                delta.insert(device, pin, value.clone());
            }
        }
        delta
    }
}
