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

//! Prometheus metrics exporter for personal weather stations
//!
//! ## Features
//!
//! `pws_exporter` accepts readings pushed by a personal weather station running the
//! EasyWeatherPro firmware (Ambient Weather, Ecowitt and other Fine Offset clones) using
//! the "customized" Ecowitt upload protocol and emits them as Prometheus metrics.
//! Readings are converted to metric units and a few values are derived from them. Each
//! metric is named after the field the station sends, even when the unit differs.
//!
//! * `tempinf`, `tempf` - Indoor and outdoor temperature, in degrees celsius.
//! * `humidityin`, `humidity` - Indoor and outdoor relative humidity (0-100).
//! * `baromrelin`, `baromabsin` - Relative and absolute barometric pressure, in hectopascals.
//! * `winddir` - Wind direction, in degrees.
//! * `windspeedmph`, `windgustmph`, `maxdailygust` - Wind speed and gusts, in km/h.
//! * `solarradiation` - Solar radiation, in W/m^2.
//! * `uv` - UV index.
//! * `rainratein`, `eventrainin`, `hourlyrainin`, `dailyrainin`, `weeklyrainin`,
//!   `monthlyrainin`, `yearlyrainin`, `totalrainin` - Rainfall as reported by the station.
//! * `dewpt` - Dew point, in degrees celsius.
//! * `frostpt` - Frost point, in degrees celsius.
//! * `chillpt` - Wind chill index, in degrees celsius (`0` above 10°C or below 5 km/h of wind).
//! * `feelslike` - MetService "feels like" temperature, in degrees celsius.
//!
//! Only the most recent reading is kept. Metrics are updated from it at a fixed interval
//! and keep their last value until the station sends a new reading.
//!
//! ## Build
//!
//! `pws_exporter` is a Rust program and must be built from source using a [Rust toolchain](https://rustup.rs/).
//!
//! ```text
//! cargo build --release
//! ```
//!
//! ## Usage
//!
//! ### Station
//!
//! In the WS View or EasyWeatherPro app, add a customized upload server using the
//! Ecowitt protocol, the address of the host running `pws_exporter`, port `1111`, and
//! the path `/telemetry`. Then run `pws_exporter`.
//!
//! ```text
//! ./pws_exporter --ingest-bind 0.0.0.0:1111 --metrics-bind 0.0.0.0:8080
//! ```
//!
//! Each accepted reading is appended to `pws.txt` in the working directory as a JSON object
//! per line. Use `--reading-log` to pick another file or `--no-reading-log` to disable it.
//! The exporter stops on `SIGINT`, `SIGTERM`, or a request to `/stop` on the ingestion port.
//!
//! ### Prometheus
//!
//! Prometheus metrics are exposed on port `8080` at `/metrics`. Add the host running
//! `pws_exporter` as a target under the Prometheus `scrape_configs` section as described by
//! the example below.
//!
//! ```yaml
//! scrape_configs:
//! - job_name: pws_exporter
//!   static_configs:
//!   - targets: ['example:8080']
//! ```
//!

pub mod convert;
pub mod http;
pub mod ingest;
pub mod metrics;
pub mod publish;
pub mod reading;
pub mod schema;
pub mod shutdown;
pub mod sink;
pub mod staging;
