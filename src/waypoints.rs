//! Waypoint file loading
//!
//! A waypoint file is a JSON object mapping labels to six-element arrays:
//!
//! ```json
//! { "home": [0, 0, 0, 0, 0, 0], "p1": [100, 50, 75, 0, 0, 0] }
//! ```
//!
//! Entries run in the order they appear in the file, so the object is read
//! with a map visitor instead of going through `serde_json::Map`.

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::{config::PoseLimits, pose::Pose, Result, RunnerError};

/// A labelled target pose.
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub label: String,
    pub pose: Pose,
}

/// Waypoints in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaypointSet {
    waypoints: Vec<Waypoint>,
}

/// Raw entries as they appear on disk, before pose validation.
struct RawEntries(Vec<(String, Vec<f64>)>);

impl<'de> Deserialize<'de> for RawEntries {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = RawEntries;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping waypoint labels to arrays of numbers")
            }

            fn visit_map<M>(self, mut map: M) -> std::result::Result<RawEntries, M::Error>
            where
                M: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((label, values)) = map.next_entry::<String, Vec<f64>>()? {
                    entries.push((label, values));
                }
                Ok(RawEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

impl WaypointSet {
    /// Read and validate a waypoint file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            RunnerError::DataFormat(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let set = Self::from_json_str(&contents)
            .map_err(|e| RunnerError::DataFormat(format!("{}: {}", path.display(), strip(e))))?;
        debug!("Loaded {} waypoints from {}", set.len(), path.display());
        Ok(set)
    }

    /// Parse waypoints from JSON text.
    ///
    /// The whole document is validated before anything is returned: every
    /// entry must carry exactly six finite numbers, labels must be unique,
    /// and the set must not be empty.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let RawEntries(entries) = serde_json::from_str(json)
            .map_err(|e| RunnerError::DataFormat(format!("invalid waypoint JSON: {}", e)))?;

        if entries.is_empty() {
            return Err(RunnerError::DataFormat("no waypoints defined".to_string()));
        }

        let mut seen = HashSet::new();
        let mut waypoints = Vec::with_capacity(entries.len());
        for (label, values) in entries {
            if !seen.insert(label.clone()) {
                return Err(RunnerError::DataFormat(format!(
                    "duplicate waypoint label '{}'",
                    label
                )));
            }
            let pose = Pose::from_values(&values).map_err(|e| {
                RunnerError::DataFormat(format!("waypoint '{}': {}", label, strip(e)))
            })?;
            waypoints.push(Waypoint { label, pose });
        }

        Ok(Self { waypoints })
    }

    /// Reject any waypoint whose position falls outside `limits`.
    pub fn check_limits(&self, limits: &PoseLimits) -> Result<()> {
        for waypoint in &self.waypoints {
            let position = waypoint.pose.position();
            for axis in 0..3 {
                let v = position[axis];
                if v < limits.position_min[axis] || v > limits.position_max[axis] {
                    return Err(RunnerError::Validation(format!(
                        "waypoint '{}' {} = {} outside [{}, {}]",
                        waypoint.label,
                        ["px", "py", "pz"][axis],
                        v,
                        limits.position_min[axis],
                        limits.position_max[axis]
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Waypoint> {
        self.waypoints.iter()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.waypoints.iter().map(|w| w.label.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

impl<'a> IntoIterator for &'a WaypointSet {
    type Item = &'a Waypoint;
    type IntoIter = std::slice::Iter<'a, Waypoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.waypoints.iter()
    }
}

/// Unwrap the message of a `DataFormat` error so nested context doesn't repeat the prefix.
fn strip(err: RunnerError) -> String {
    match err {
        RunnerError::DataFormat(msg) => msg,
        other => other.to_string(),
    }
}
