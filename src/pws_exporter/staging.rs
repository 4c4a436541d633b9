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
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Slot {
    reading: Option<Reading>,
    ready: bool,
}

/// Hand-off point between readings pushed by a station and the periodic publisher.
///
/// Holds only the most recent reading. A reading staged before the previous one was
/// taken replaces it: the publisher only ever sees the latest. Staging and taking are
/// atomic with respect to each other so a half written reading is never observed.
#[derive(Debug, Default)]
pub struct StagingSlot {
    inner: Mutex<Slot>,
}

impl StagingSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        // Neither operation can leave the slot half updated, the data is fine to use
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the content of the slot with `reading` and mark it as ready.
    pub fn publish(&self, reading: Reading) {
        let mut slot = self.lock();
        slot.reading = Some(reading);
        slot.ready = true;
    }

    /// Return a copy of the staged reading if it hasn't been taken yet, clearing
    /// the ready flag. The reading itself stays in the slot.
    pub fn take(&self) -> Option<Reading> {
        let mut slot = self.lock();
        if !slot.ready {
            return None;
        }

        slot.ready = false;
        slot.reading.clone()
    }

    /// Return a copy of the most recently staged reading without consuming it.
    pub fn latest(&self) -> Option<Reading> {
        self.lock().reading.clone()
    }

    pub fn is_ready(&self) -> bool {
        self.lock().ready
    }
}
