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

use crate::convert::{self, NonFiniteError};
use crate::reading::{RawReading, Reading};
use crate::schema::{self, Kind, VARIABLES};
use crate::staging::StagingSlot;
use std::error;
use std::fmt;
use std::sync::Arc;

/// A value sent by the station that isn't a finite number.
///
/// Fields that were not sent at all are reported with empty `raw` text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueFormatError {
    pub field: &'static str,
    pub raw: String,
}

impl fmt::Display for ValueFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid value {:?} for {}", self.raw, self.field)
    }
}

impl error::Error for ValueFormatError {}

/// Reasons a reading is not staged at all.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestError {
    /// At least one value needed to compute derived values was invalid. Contains
    /// every invalid value of the reading, not only the required ones.
    Incomplete(Vec<ValueFormatError>),
    NonFinite(NonFiniteError),
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Incomplete(errors) => {
                write!(f, "incomplete reading, {} invalid values", errors.len())?;
                for e in errors {
                    write!(f, "; {}", e)?;
                }
                Ok(())
            }
            Self::NonFinite(e) => write!(f, "{}", e),
        }
    }
}

impl error::Error for IngestError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::NonFinite(e) => Some(e),
            _ => None,
        }
    }
}

/// A reading that was normalized and staged for publishing.
///
/// Optional values that could not be parsed are left out of the reading and listed
/// in `errors`.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct Accepted {
    pub reading: Reading,
    pub errors: Vec<ValueFormatError>,
}

impl Accepted {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Result of parsing each value of a raw reading, before any conversion.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct Parsed {
    pub reading: Reading,
    pub errors: Vec<ValueFormatError>,
}

fn parse_value(field: &'static str, raw: Option<&String>) -> Result<f64, ValueFormatError> {
    let text = raw.map(|s| s.trim()).unwrap_or("");
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ValueFormatError {
            field,
            raw: raw.cloned().unwrap_or_default(),
        }),
    }
}

/// Parse every variable of the schema from `raw` without stopping at the first
/// invalid value. Derived variables start at `0` regardless of what was sent.
///
/// The timestamp is opaque text. A missing or blank one is reported but the reading
/// is kept with an empty timestamp.
pub fn parse(raw: &RawReading) -> Parsed {
    let timestamp = raw.get(schema::DATE_UTC).cloned().unwrap_or_default();
    let mut reading = Reading::new(timestamp.clone());
    let mut errors = Vec::new();

    for var in VARIABLES.iter() {
        match var.kind {
            Kind::Timestamp => {
                if timestamp.trim().is_empty() {
                    errors.push(ValueFormatError {
                        field: var.name,
                        raw: timestamp.clone(),
                    });
                }
            }
            Kind::Derived => reading.set(var.name, 0.0),
            Kind::Measured { .. } => match parse_value(var.name, raw.get(var.name)) {
                Ok(v) => reading.set(var.name, v),
                Err(e) => errors.push(e),
            },
        }
    }

    Parsed { reading, errors }
}

/// Turns raw readings pushed by a station into normalized readings in a `StagingSlot`.
#[derive(Debug)]
pub struct Receiver {
    slot: Arc<StagingSlot>,
}

impl Receiver {
    pub fn new(slot: Arc<StagingSlot>) -> Self {
        Receiver { slot }
    }

    /// Parse, normalize and stage a reading, replacing any reading already staged.
    ///
    /// Readings missing a value needed to compute derived values are rejected and
    /// the staged reading is left as-is.
    pub fn receive(&self, raw: &RawReading) -> Result<Accepted, IngestError> {
        let Parsed { mut reading, errors } = parse(raw);

        let missing_required = errors
            .iter()
            .any(|e| schema::lookup(e.field).map(|v| v.is_required()).unwrap_or(false));
        if missing_required {
            return Err(IngestError::Incomplete(errors));
        }

        convert::normalize(&mut reading).map_err(IngestError::NonFinite)?;
        self.slot.publish(reading.clone());

        Ok(Accepted { reading, errors })
    }
}
