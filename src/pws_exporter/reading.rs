// pws_exporter - Prometheus metrics exporter for personal weather stations
//
// Copyright 2022 Nick Pillitteri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

use crate::schema::{DATE_UTC, VARIABLES};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashMap;

/// Form values exactly as pushed by the station, keyed by variable name.
pub type RawReading = HashMap<String, String>;

/// A reading after unit conversion, keyed by schema variable name.
///
/// The timestamp is kept as the opaque string sent by the station. Numeric values
/// are only present for variables that were successfully parsed or computed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reading {
    timestamp: String,
    values: HashMap<&'static str, f64>,
}

impl Reading {
    pub fn new<S: Into<String>>(timestamp: S) -> Self {
        Reading {
            timestamp: timestamp.into(),
            values: HashMap::new(),
        }
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn set(&mut self, name: &'static str, value: f64) {
        self.values.insert(name, value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Serialized as a flat map in schema order, `dateutc` first. Absent values are skipped.
impl Serialize for Reading {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.values.len() + 1))?;
        map.serialize_entry(DATE_UTC, &self.timestamp)?;
        for var in VARIABLES.iter().filter(|v| !v.is_timestamp()) {
            if let Some(v) = self.values.get(var.name) {
                map.serialize_entry(var.name, v)?;
            }
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::Reading;

    #[test]
    fn test_set_replaces() {
        let mut r = Reading::new("2024-06-03 01:02:17");
        r.set("tempf", 68.0);
        r.set("tempf", 20.0);
        assert_eq!(Some(20.0), r.get("tempf"));
        assert_eq!(1, r.len());
        assert_eq!(None, r.get("humidity"));
    }

    #[test]
    fn test_serialize_schema_order() {
        let mut r = Reading::new("2024-06-03 01:02:17");
        r.set("feelslike", 19.5);
        r.set("humidity", 50.0);
        r.set("tempf", 20.0);

        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(
            r#"{"dateutc":"2024-06-03 01:02:17","tempf":20.0,"humidity":50.0,"feelslike":19.5}"#,
            json
        );
    }
}
