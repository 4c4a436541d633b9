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

//! The fixed set of variables a station pushes and the exporter publishes.

pub const DATE_UTC: &str = "dateutc";
pub const TEMP_INDOOR: &str = "tempinf";
pub const HUMIDITY_INDOOR: &str = "humidityin";
pub const BAROM_RELATIVE: &str = "baromrelin";
pub const BAROM_ABSOLUTE: &str = "baromabsin";
pub const TEMP_OUTDOOR: &str = "tempf";
pub const HUMIDITY_OUTDOOR: &str = "humidity";
pub const WIND_DIRECTION: &str = "winddir";
pub const WIND_SPEED: &str = "windspeedmph";
pub const WIND_GUST: &str = "windgustmph";
pub const MAX_DAILY_GUST: &str = "maxdailygust";
pub const SOLAR_RADIATION: &str = "solarradiation";
pub const UV_INDEX: &str = "uv";
pub const RAIN_RATE: &str = "rainratein";
pub const RAIN_EVENT: &str = "eventrainin";
pub const RAIN_HOURLY: &str = "hourlyrainin";
pub const RAIN_DAILY: &str = "dailyrainin";
pub const RAIN_WEEKLY: &str = "weeklyrainin";
pub const RAIN_MONTHLY: &str = "monthlyrainin";
pub const RAIN_YEARLY: &str = "yearlyrainin";
pub const RAIN_TOTAL: &str = "totalrainin";
pub const DEW_POINT: &str = "dewpt";
pub const WIND_CHILL: &str = "chillpt";
pub const FROST_POINT: &str = "frostpt";
pub const FEELS_LIKE: &str = "feelslike";

/// Unit conversion applied to a measured variable before it is published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    None,
    /// Fahrenheit to Celsius
    Temperature,
    /// Inches of mercury to hectopascals
    Pressure,
    /// Miles per hour to kilometers per hour
    Speed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Opaque timestamp string, never published as a gauge.
    Timestamp,
    /// Sent by the station. `required` variables are inputs to derived values and
    /// a reading without a valid value for one of them is rejected.
    Measured { conversion: Conversion, required: bool },
    /// Computed by the exporter, any value sent by the station is ignored.
    Derived,
}

/// One entry in the variable schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variable {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: Kind,
}

impl Variable {
    const fn timestamp(name: &'static str, description: &'static str) -> Self {
        Variable {
            name,
            description,
            kind: Kind::Timestamp,
        }
    }

    const fn required(name: &'static str, description: &'static str, conversion: Conversion) -> Self {
        Variable {
            name,
            description,
            kind: Kind::Measured {
                conversion,
                required: true,
            },
        }
    }

    const fn optional(name: &'static str, description: &'static str) -> Self {
        Variable {
            name,
            description,
            kind: Kind::Measured {
                conversion: Conversion::None,
                required: false,
            },
        }
    }

    const fn derived(name: &'static str, description: &'static str) -> Self {
        Variable {
            name,
            description,
            kind: Kind::Derived,
        }
    }

    pub fn is_timestamp(&self) -> bool {
        self.kind == Kind::Timestamp
    }

    pub fn is_derived(&self) -> bool {
        self.kind == Kind::Derived
    }

    pub fn is_required(&self) -> bool {
        matches!(self.kind, Kind::Measured { required: true, .. })
    }

    pub fn conversion(&self) -> Conversion {
        match self.kind {
            Kind::Measured { conversion, .. } => conversion,
            _ => Conversion::None,
        }
    }
}

/// Every variable in the order the station sends them and the exporter publishes them.
pub static VARIABLES: [Variable; 25] = [
    Variable::timestamp(DATE_UTC, "Timestamp"),
    Variable::required(TEMP_INDOOR, "Indoor temperature °C", Conversion::Temperature),
    Variable::optional(HUMIDITY_INDOOR, "Indoor humidity %"),
    Variable::required(BAROM_RELATIVE, "Barometric pressure hPa (relative)", Conversion::Pressure),
    Variable::required(BAROM_ABSOLUTE, "Barometric pressure hPa (absolute)", Conversion::Pressure),
    Variable::required(TEMP_OUTDOOR, "Outdoor temperature °C", Conversion::Temperature),
    Variable::required(HUMIDITY_OUTDOOR, "Outdoor humidity %", Conversion::None),
    Variable::optional(WIND_DIRECTION, "Wind direction °"),
    Variable::required(WIND_SPEED, "Wind speed km/h", Conversion::Speed),
    Variable::required(WIND_GUST, "Wind gust km/h", Conversion::Speed),
    Variable::required(MAX_DAILY_GUST, "Max daily wind gust km/h", Conversion::Speed),
    Variable::optional(SOLAR_RADIATION, "Solar radiation W/m^2"),
    Variable::optional(UV_INDEX, "UV index"),
    Variable::optional(RAIN_RATE, "Rain rate in/h"),
    Variable::optional(RAIN_EVENT, "Rain for the current event in"),
    Variable::optional(RAIN_HOURLY, "Rain in the last hour in"),
    Variable::optional(RAIN_DAILY, "Rain today in"),
    Variable::optional(RAIN_WEEKLY, "Rain this week in"),
    Variable::optional(RAIN_MONTHLY, "Rain this month in"),
    Variable::optional(RAIN_YEARLY, "Rain this year in"),
    Variable::optional(RAIN_TOTAL, "Total rain since power on in"),
    Variable::derived(DEW_POINT, "Dew point temperature °C"),
    Variable::derived(WIND_CHILL, "Wind chill index °C"),
    Variable::derived(FROST_POINT, "Frost point temperature °C"),
    Variable::derived(FEELS_LIKE, "MetService \"feels like\" temperature °C"),
];

/// Look up a variable by the name the station uses for it.
pub fn lookup(name: &str) -> Option<&'static Variable> {
    VARIABLES.iter().find(|v| v.name == name)
}

/// Variables that are exported as gauges, in schema order.
pub fn gauges() -> impl Iterator<Item = &'static Variable> {
    VARIABLES.iter().filter(|v| !v.is_timestamp())
}

#[cfg(test)]
mod tests {
    use super::{gauges, lookup, Conversion, VARIABLES};
    use std::collections::HashSet;

    #[test]
    fn test_variable_names_unique() {
        let names: HashSet<&str> = VARIABLES.iter().map(|v| v.name).collect();
        assert_eq!(VARIABLES.len(), names.len());
    }

    #[test]
    fn test_timestamp_first_and_only() {
        assert!(VARIABLES[0].is_timestamp());
        assert_eq!(1, VARIABLES.iter().filter(|v| v.is_timestamp()).count());
        assert_eq!(24, gauges().count());
    }

    #[test]
    fn test_derived_are_last_four() {
        let derived: Vec<&str> = VARIABLES.iter().filter(|v| v.is_derived()).map(|v| v.name).collect();
        assert_eq!(vec!["dewpt", "chillpt", "frostpt", "feelslike"], derived);
    }

    #[test]
    fn test_lookup() {
        let tempf = lookup("tempf").unwrap();
        assert_eq!(Conversion::Temperature, tempf.conversion());
        assert!(tempf.is_required());

        let uv = lookup("uv").unwrap();
        assert!(!uv.is_required());
        assert_eq!(Conversion::None, uv.conversion());

        assert!(lookup("PASSKEY").is_none());
    }
}
