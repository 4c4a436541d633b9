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
use std::error;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// The reading log could not be opened or written to.
#[derive(Debug)]
pub enum SinkUnavailableError {
    Io(PathBuf, io::Error),
    Encode(serde_json::Error),
}

impl fmt::Display for SinkUnavailableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(path, e) => write!(f, "unable to write reading log {}: {}", path.display(), e),
            Self::Encode(e) => write!(f, "unable to encode reading: {}", e),
        }
    }
}

impl error::Error for SinkUnavailableError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Io(_, e) => Some(e),
            Self::Encode(e) => Some(e),
        }
    }
}

/// Append-only log of accepted readings, one JSON object per line.
///
/// The file is opened for each reading and closed before `append` returns, so a log
/// that is rotated or removed out from under the exporter is recreated.
#[derive(Debug, Clone)]
pub struct ReadingLog {
    path: PathBuf,
}

impl ReadingLog {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        ReadingLog { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, reading: &Reading) -> Result<(), SinkUnavailableError> {
        let mut line = serde_json::to_vec(reading).map_err(SinkUnavailableError::Encode)?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        file.write_all(&line).await.map_err(|e| self.io_error(e))?;
        file.flush().await.map_err(|e| self.io_error(e))
    }

    fn io_error(&self, e: io::Error) -> SinkUnavailableError {
        SinkUnavailableError::Io(self.path.clone(), e)
    }
}
