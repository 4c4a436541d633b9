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

use crate::metrics::{MissingFieldError, WeatherMetrics};
use crate::shutdown::Shutdown;
use crate::staging::StagingSlot;
use std::sync::Arc;
use std::time::Duration;

/// What a single publish tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Nothing new was staged since the last tick, gauges were left as-is.
    NoData,
    /// A staged reading was copied into the gauges. Any variables it had no value
    /// for kept their previous value.
    Published { timestamp: String, missing: Vec<MissingFieldError> },
}

/// Periodically copies the latest staged reading into gauges.
#[derive(Debug)]
pub struct Publisher {
    slot: Arc<StagingSlot>,
    metrics: WeatherMetrics,
}

impl Publisher {
    pub fn new(slot: Arc<StagingSlot>, metrics: WeatherMetrics) -> Self {
        Publisher { slot, metrics }
    }

    pub fn metrics(&self) -> &WeatherMetrics {
        &self.metrics
    }

    /// Copy the staged reading into gauges if there's one that hasn't been published yet.
    pub fn tick(&self) -> PublishOutcome {
        let reading = match self.slot.take() {
            Some(r) => r,
            None => return PublishOutcome::NoData,
        };

        let missing = self.metrics.observe(&reading);
        for e in missing.iter() {
            tracing::warn!(message = "reading missing value, gauge not updated", timestamp = %reading.timestamp(), error = %e);
        }

        PublishOutcome::Published {
            timestamp: reading.timestamp().to_owned(),
            missing,
        }
    }

    /// Run `tick()` every `period` until `shutdown` is triggered. The first tick runs immediately.
    ///
    /// # Panics
    ///
    /// If `period` is zero.
    pub async fn run(self, period: Duration, shutdown: Shutdown) {
        let mut interval = tokio::time::interval(period);
        tracing::info!(message = "metric publishing started", period_secs = period.as_secs());

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.tick() {
                        PublishOutcome::NoData => {
                            tracing::debug!(message = "no new reading to publish");
                        }
                        PublishOutcome::Published { timestamp, missing } => {
                            tracing::info!(message = "published new reading", timestamp = %timestamp, missing = missing.len());
                        }
                    }
                }
                _ = shutdown.wait() => {
                    tracing::info!("metric publishing stopped");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PublishOutcome, Publisher};
    use crate::metrics::{MissingFieldError, WeatherMetrics};
    use crate::reading::Reading;
    use crate::shutdown::Shutdown;
    use crate::staging::StagingSlot;
    use prometheus_client::registry::Registry;
    use std::sync::Arc;
    use std::time::Duration;

    fn full_reading(ts: &str, temp: f64) -> Reading {
        let mut r = Reading::new(ts);
        for var in crate::schema::gauges() {
            r.set(var.name, 1.0);
        }
        r.set("tempf", temp);
        r
    }

    fn publisher() -> (Arc<StagingSlot>, Publisher) {
        let mut reg = Registry::default();
        let slot = Arc::new(StagingSlot::new());
        let publisher = Publisher::new(Arc::clone(&slot), WeatherMetrics::new(&mut reg));
        (slot, publisher)
    }

    #[test]
    fn test_tick_no_data() {
        let (_slot, publisher) = publisher();
        assert_eq!(PublishOutcome::NoData, publisher.tick());
        assert_eq!(Some(0.0), publisher.metrics().value("tempf"));
    }

    #[test]
    fn test_tick_publishes_once() {
        let (slot, publisher) = publisher();
        slot.publish(full_reading("a", 20.0));

        assert_eq!(
            PublishOutcome::Published {
                timestamp: "a".to_owned(),
                missing: vec![]
            },
            publisher.tick()
        );
        assert_eq!(Some(20.0), publisher.metrics().value("tempf"));
        assert_eq!(Some(1.0), publisher.metrics().value("uv"));

        // Second tick without a new reading leaves gauges alone
        assert_eq!(PublishOutcome::NoData, publisher.tick());
        assert_eq!(Some(20.0), publisher.metrics().value("tempf"));
    }

    #[test]
    fn test_tick_latest_reading_only() {
        let (slot, publisher) = publisher();
        slot.publish(full_reading("a", 20.0));
        slot.publish(full_reading("b", 21.5));

        match publisher.tick() {
            PublishOutcome::Published { timestamp, .. } => assert_eq!("b", timestamp),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(Some(21.5), publisher.metrics().value("tempf"));
    }

    #[test]
    fn test_tick_missing_field_keeps_previous() {
        let (slot, publisher) = publisher();
        slot.publish(full_reading("a", 20.0));
        let _ = publisher.tick();

        let mut partial = Reading::new("b");
        partial.set("tempf", 18.0);
        for var in crate::schema::gauges().filter(|v| v.name != "uv" && v.name != "tempf") {
            partial.set(var.name, 2.0);
        }
        slot.publish(partial);

        assert_eq!(
            PublishOutcome::Published {
                timestamp: "b".to_owned(),
                missing: vec![MissingFieldError { field: "uv" }]
            },
            publisher.tick()
        );
        assert_eq!(Some(18.0), publisher.metrics().value("tempf"));
        assert_eq!(Some(1.0), publisher.metrics().value("uv"));
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let (slot, publisher) = publisher();
        slot.publish(full_reading("a", 20.0));
        let shutdown = Shutdown::new();
        let handle = tokio::spawn(publisher.run(Duration::from_millis(10), shutdown.clone()));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!slot.is_ready());

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
    }
}
