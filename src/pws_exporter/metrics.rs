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

use crate::reading::Reading;
use crate::schema;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;
use std::error;
use std::fmt;
use std::sync::atomic::AtomicU64;

type FloatGauge = Gauge<f64, AtomicU64>;

/// A reading that was ready to publish had no value for a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingFieldError {
    pub field: &'static str,
}

impl fmt::Display for MissingFieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no value for {}", self.field)
    }
}

impl error::Error for MissingFieldError {}

/// Holder for one gauge per published weather variable.
///
/// All gauges are created, set to zero, and registered upon call to `WeatherMetrics::new()`.
/// Each gauge is named after the variable the station uses (e.g. `tempf`) even though
/// the value is converted to metric units.
#[derive(Debug)]
pub struct WeatherMetrics {
    gauges: Vec<(&'static str, FloatGauge)>,
}

impl WeatherMetrics {
    /// Create a new `WeatherMetrics` and register each gauge with the provided `Registry`.
    pub fn new(reg: &mut Registry) -> Self {
        let gauges = schema::gauges()
            .map(|var| {
                let gauge = FloatGauge::default();
                gauge.set(0.0);
                reg.register(var.name, var.description, gauge.clone());
                (var.name, gauge)
            })
            .collect();

        Self { gauges }
    }

    /// Set every gauge from the provided reading, in schema order.
    ///
    /// If the reading doesn't contain a value for a particular variable, the gauge is
    /// not updated and the variable is included in the returned errors.
    pub fn observe(&self, reading: &Reading) -> Vec<MissingFieldError> {
        let mut missing = Vec::new();
        for (name, gauge) in self.gauges.iter() {
            match reading.get(name) {
                Some(v) => {
                    gauge.set(v);
                }
                None => missing.push(MissingFieldError { field: *name }),
            }
        }

        missing
    }

    /// Current value of the gauge for `name`, if there is one.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.gauges.iter().find(|(n, _)| *n == name).map(|(_, g)| g.get())
    }
}
