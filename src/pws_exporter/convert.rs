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

//! Unit conversions and derived meteorological values.
//!
//! Everything here is pure. Temperatures are in Celsius, wind speeds in km/h and
//! relative humidity in percent (0-100) unless a function name says otherwise.

use crate::reading::Reading;
use crate::schema::{
    Conversion, DEW_POINT, FEELS_LIKE, FROST_POINT, HUMIDITY_OUTDOOR, TEMP_OUTDOOR, VARIABLES, WIND_CHILL, WIND_SPEED,
};
use std::error;
use std::fmt;

const HPA_PER_INHG: f64 = 0.029529983071445;
const KMH_PER_MPH: f64 = 1.609344;
const KELVIN_OFFSET: f64 = 273.15;

// Magnus coefficients (1974 Psychrometry and Psychrometric Charts)
const MAGNUS_A: f64 = 17.27;
const MAGNUS_B: f64 = 237.7;

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Convert Fahrenheit to Celsius rounded to one decimal. A missing value becomes `0`.
pub fn fahrenheit_to_celsius(f: Option<f64>) -> f64 {
    f.map(|f| round1((f - 32.0) / 1.8)).unwrap_or(0.0)
}

/// Convert Celsius to Fahrenheit rounded to one decimal. A missing value becomes `0`.
pub fn celsius_to_fahrenheit(c: Option<f64>) -> f64 {
    c.map(|c| round1(c * 1.8 + 32.0)).unwrap_or(0.0)
}

/// Convert inches of mercury to hectopascals rounded to one decimal.
pub fn inhg_to_hpa(inhg: f64) -> f64 {
    round1(inhg / HPA_PER_INHG)
}

/// Convert miles per hour to kilometers per hour rounded to one decimal.
pub fn mph_to_kmh(mph: f64) -> f64 {
    round1(mph * KMH_PER_MPH)
}

fn magnus_dew_point(temp: f64, humidity: f64) -> f64 {
    let alpha = (MAGNUS_A * temp) / (MAGNUS_B + temp) + (humidity / 100.0).ln();
    (MAGNUS_B * alpha) / (MAGNUS_A - alpha)
}

fn wind_chill(temp: f64, wind: f64) -> f64 {
    let w = wind.powf(0.16);
    13.112 + 0.6215 * temp - 11.37 * w + 0.3965 * temp * w
}

/// Dew point rounded to one decimal.
///
/// Not finite when `humidity` is zero or negative.
pub fn dew_point(temp: f64, humidity: f64) -> f64 {
    round1(magnus_dew_point(temp, humidity))
}

/// Frost point from temperature and dew point, rounded to one decimal.
///
/// See <https://docs.vaisala.com/r/M211280EN-D/en-US> for the constants.
pub fn frost_point(temp: f64, dew_point: f64) -> f64 {
    let temp_k = temp + KELVIN_OFFSET;
    let dew_point_k = dew_point + KELVIN_OFFSET;
    let frost_point_k =
        dew_point_k - temp_k + 2671.02 / ((2954.61 / temp_k) + 2.193665 * temp_k.ln() - 13.3448);
    round1(frost_point_k - KELVIN_OFFSET)
}

/// Wind chill index rounded to a whole degree.
///
/// Only defined below 10°C with wind of at least 5 km/h. Outside that range the
/// result is exactly `0`, not an approximation.
pub fn wind_chill_index(temp: f64, wind: f64) -> f64 {
    if temp < 10.0 && wind >= 5.0 {
        wind_chill(temp, wind).round()
    } else {
        0.0
    }
}

/// MetService "feels like" temperature.
///
/// Picks wind chill when cold and windy, a linear blend between 11°C and 15°C, and
/// otherwise the larger of the measured and apparent temperatures. The wind chill
/// branch applies to any wind above 4 km/h, which is intentionally not the same
/// range as [`wind_chill_index`].
///
/// See <https://blog.metservice.com/FeelsLikeTemp>
pub fn feels_like(temp: f64, wind: f64, humidity: f64) -> f64 {
    let dew_point = magnus_dew_point(temp, humidity);
    let wind_ms = (wind * 1000.0) / 3600.0;
    let apparent = temp + 0.33 * dew_point - 0.7 * wind_ms - 4.0;

    if temp < 10.0 && wind > 4.0 {
        wind_chill(temp, wind)
    } else if temp > 11.0 && temp < 15.0 {
        temp - ((temp - dew_point) * (14.0 - temp) / 4.0)
    } else {
        temp.max(apparent)
    }
}

/// A derived value that could not be computed from the inputs of a reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NonFiniteError {
    pub field: &'static str,
    pub value: f64,
}

impl fmt::Display for NonFiniteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "derived value {} for {} is not finite", self.value, self.field)
    }
}

impl error::Error for NonFiniteError {}

fn finite(field: &'static str, value: f64) -> Result<f64, NonFiniteError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(NonFiniteError { field, value })
    }
}

/// Convert every measured value of `reading` to metric in place and compute the
/// derived values from the converted ones.
///
/// Derived values whose inputs are missing are left untouched. The order is fixed:
/// unit conversions, dew point, frost point, wind chill index, feels like.
pub fn normalize(reading: &mut Reading) -> Result<(), NonFiniteError> {
    for var in VARIABLES.iter() {
        match var.conversion() {
            Conversion::Temperature => reading.set(var.name, fahrenheit_to_celsius(reading.get(var.name))),
            Conversion::Pressure => {
                if let Some(v) = reading.get(var.name) {
                    reading.set(var.name, inhg_to_hpa(v));
                }
            }
            Conversion::Speed => {
                if let Some(v) = reading.get(var.name) {
                    reading.set(var.name, mph_to_kmh(v));
                }
            }
            Conversion::None => {}
        }
    }

    // Always set by the temperature conversion above
    let temp = reading.get(TEMP_OUTDOOR).unwrap_or(0.0);
    let humidity = reading.get(HUMIDITY_OUTDOOR);
    let wind = reading.get(WIND_SPEED);

    if let Some(rh) = humidity {
        let dp = finite(DEW_POINT, dew_point(temp, rh))?;
        reading.set(DEW_POINT, dp);
        reading.set(FROST_POINT, finite(FROST_POINT, frost_point(temp, dp))?);
    }

    if let Some(w) = wind {
        reading.set(WIND_CHILL, finite(WIND_CHILL, wind_chill_index(temp, w))?);
    }

    if let (Some(w), Some(rh)) = (wind, humidity) {
        reading.set(FEELS_LIKE, finite(FEELS_LIKE, feels_like(temp, w, rh))?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{
        celsius_to_fahrenheit, dew_point, fahrenheit_to_celsius, feels_like, frost_point, inhg_to_hpa, mph_to_kmh,
        normalize, round1, wind_chill, wind_chill_index,
    };
    use crate::reading::Reading;

    fn assert_close(expected: f64, actual: f64, tolerance: f64) {
        assert!(
            (expected - actual).abs() <= tolerance,
            "expected {} +/- {}, got {}",
            expected,
            tolerance,
            actual
        );
    }

    #[test]
    fn test_round1_half_away_from_zero() {
        // 0.15 * 10 is exactly 1.5 after the multiply
        assert_eq!(0.2, round1(0.15));
        assert_eq!(0.3, round1(0.25));
        assert_eq!(-0.3, round1(-0.25));
        assert_eq!(1013.2, round1(1013.2143));
    }

    #[test]
    fn test_fahrenheit_to_celsius() {
        assert_eq!(20.0, fahrenheit_to_celsius(Some(68.0)));
        assert_eq!(0.0, fahrenheit_to_celsius(Some(32.0)));
        assert_eq!(-40.0, fahrenheit_to_celsius(Some(-40.0)));
        assert_eq!(0.0, fahrenheit_to_celsius(None));
    }

    #[test]
    fn test_celsius_round_trip() {
        let mut c = -40.0;
        while c <= 50.0 {
            let back = fahrenheit_to_celsius(Some(celsius_to_fahrenheit(Some(c))));
            assert_close(c, back, 0.1);
            c += 0.7;
        }
    }

    #[test]
    fn test_inhg_to_hpa() {
        assert_close(1013.2, inhg_to_hpa(29.92), 0.1);
        assert_eq!(0.0, inhg_to_hpa(0.0));
    }

    #[test]
    fn test_mph_to_kmh() {
        assert_eq!(16.1, mph_to_kmh(10.0));
        assert_eq!(0.0, mph_to_kmh(0.0));
        assert_eq!(160.9, mph_to_kmh(100.0));
    }

    #[test]
    fn test_dew_point() {
        assert_close(9.3, dew_point(20.0, 50.0), 0.1);
        assert_close(25.0, dew_point(25.0, 100.0), 0.1);
        assert!(!dew_point(20.0, 0.0).is_finite());
    }

    #[test]
    fn test_frost_point() {
        assert_close(6.6, frost_point(20.0, 9.3), 0.1);
        assert_close(-5.0, frost_point(0.0, -5.0), 0.1);
    }

    #[test]
    fn test_wind_chill_index_out_of_range() {
        assert_eq!(0.0, wind_chill_index(10.0, 30.0));
        assert_eq!(0.0, wind_chill_index(25.0, 30.0));
        assert_eq!(0.0, wind_chill_index(5.0, 4.9));
        assert_eq!(0.0, wind_chill_index(-20.0, 0.0));
    }

    #[test]
    fn test_wind_chill_index_in_range() {
        assert_eq!(3.0, wind_chill_index(5.0, 10.0));
        assert_eq!(-18.0, wind_chill_index(-10.0, 20.0));
        assert_eq!(wind_chill(0.0, 5.0).round(), wind_chill_index(0.0, 5.0));
    }

    #[test]
    fn test_feels_like_wind_chill() {
        assert_close(2.6504, feels_like(5.0, 10.0, 50.0), 0.0001);
    }

    #[test]
    fn test_feels_like_wind_chill_gate_differs_from_index() {
        // 4.5 km/h counts as windy here but not for the wind chill index
        assert_close(4.2779, feels_like(5.0, 4.5, 50.0), 0.0001);
        assert_eq!(0.0, wind_chill_index(5.0, 4.5));
    }

    #[test]
    fn test_feels_like_rollover() {
        assert_close(10.4547, feels_like(13.0, 1.0, 50.0), 0.0001);
    }

    #[test]
    fn test_feels_like_max_of_measured_and_apparent() {
        assert_eq!(25.0, feels_like(25.0, 5.0, 50.0));
        assert_close(28.2778, feels_like(25.0, 5.0, 100.0), 0.0001);
    }

    #[test]
    fn test_normalize() {
        let mut r = Reading::new("2024-06-03 01:02:17");
        r.set("tempinf", 77.0);
        r.set("tempf", 68.0);
        r.set("humidity", 50.0);
        r.set("baromrelin", 29.92);
        r.set("baromabsin", 29.5);
        r.set("windspeedmph", 10.0);
        r.set("windgustmph", 20.0);
        r.set("maxdailygust", 0.0);
        r.set("uv", 3.0);

        normalize(&mut r).unwrap();

        assert_eq!(Some(25.0), r.get("tempinf"));
        assert_eq!(Some(20.0), r.get("tempf"));
        assert_eq!(Some(50.0), r.get("humidity"));
        assert_eq!(Some(1013.2), r.get("baromrelin"));
        assert_eq!(Some(16.1), r.get("windspeedmph"));
        assert_eq!(Some(32.2), r.get("windgustmph"));
        assert_eq!(Some(0.0), r.get("maxdailygust"));
        assert_eq!(Some(3.0), r.get("uv"));
        assert_eq!(Some(9.3), r.get("dewpt"));
        assert_eq!(Some(6.6), r.get("frostpt"));
        assert_eq!(Some(0.0), r.get("chillpt"));
        assert_eq!(Some(20.0), r.get("feelslike"));
    }

    #[test]
    fn test_normalize_uses_converted_values() {
        // 41°F is 5°C: wind chill only applies once the temperature is in Celsius
        let mut r = Reading::new("");
        r.set("tempf", 41.0);
        r.set("humidity", 50.0);
        r.set("windspeedmph", 10.0);

        normalize(&mut r).unwrap();

        assert_eq!(Some(5.0), r.get("tempf"));
        assert_eq!(Some(2.0), r.get("chillpt"));
        assert_close(feels_like(5.0, 16.1, 50.0), r.get("feelslike").unwrap(), 1e-9);
    }

    #[test]
    fn test_normalize_missing_temperature_is_zero() {
        let mut r = Reading::new("");
        normalize(&mut r).unwrap();

        assert_eq!(Some(0.0), r.get("tempf"));
        assert_eq!(Some(0.0), r.get("tempinf"));
        assert_eq!(None, r.get("dewpt"));
        assert_eq!(None, r.get("chillpt"));
    }

    #[test]
    fn test_normalize_zero_humidity() {
        let mut r = Reading::new("");
        r.set("tempf", 68.0);
        r.set("humidity", 0.0);

        let err = normalize(&mut r).unwrap_err();
        assert_eq!("dewpt", err.field);
    }
}
