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

use clap::Parser;
use prometheus_client::registry::Registry;
use pws_exporter::http::{IngestContext, MetricsContext};
use pws_exporter::ingest::Receiver;
use pws_exporter::metrics::WeatherMetrics;
use pws_exporter::publish::Publisher;
use pws_exporter::shutdown::Shutdown;
use pws_exporter::sink::ReadingLog;
use pws_exporter::staging::StagingSlot;
use std::error::Error;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{self, SignalKind};
use tracing::Level;

const DEFAULT_LOG_LEVEL: Level = Level::INFO;
const DEFAULT_INGEST_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 1111);
const DEFAULT_METRICS_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 8080);
const DEFAULT_PUBLISH_SECS: u64 = 30;
const DEFAULT_READING_LOG: &str = "pws.txt";

#[derive(Debug, Parser)]
#[clap(name = "pws_exporter", version = clap::crate_version!())]
struct PwsExporterApplication {
    /// Logging verbosity. Allowed values are 'trace', 'debug', 'info', 'warn', and 'error'
    /// (case insensitive)
    #[clap(long, default_value_t = DEFAULT_LOG_LEVEL)]
    log_level: Level,

    /// Copy the most recent reading from the weather station to metrics at this interval,
    /// in seconds. Must be at least 1.
    #[clap(long, default_value_t = DEFAULT_PUBLISH_SECS, value_parser = clap::value_parser!(u64).range(1..))]
    publish_secs: u64,

    /// Address to accept readings pushed by the weather station on. By default, pws_exporter
    /// will bind to a public address since the station is a separate device on the network.
    #[clap(long, default_value_t = DEFAULT_INGEST_ADDR.into())]
    ingest_bind: SocketAddr,

    /// Address to expose metrics on. By default, pws_exporter will bind to public address since
    /// the purpose is to expose metrics to an external system (Prometheus or another
    /// agent for ingestion)
    #[clap(long, default_value_t = DEFAULT_METRICS_ADDR.into())]
    metrics_bind: SocketAddr,

    /// File to append each accepted reading to, as a JSON object per line.
    #[clap(long, default_value = DEFAULT_READING_LOG)]
    reading_log: PathBuf,

    /// Don't write accepted readings to a file.
    #[clap(long)]
    no_reading_log: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let opts = PwsExporterApplication::parse();
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(opts.log_level)
            .finish(),
    )
    .expect("failed to set tracing subscriber");

    let shutdown = Shutdown::new();
    let slot = Arc::new(StagingSlot::new());
    let mut registry = Registry::default();
    let metrics = WeatherMetrics::new(&mut registry);

    let publisher = Publisher::new(Arc::clone(&slot), metrics);
    let publishing = tokio::spawn(publisher.run(Duration::from_secs(opts.publish_secs), shutdown.clone()));

    let reading_log = if opts.no_reading_log {
        None
    } else {
        tracing::info!(message = "appending readings to log", path = %opts.reading_log.display());
        Some(ReadingLog::new(&opts.reading_log))
    };

    let ingest_context = Arc::new(IngestContext::new(Receiver::new(slot), reading_log, shutdown.clone()));
    let ingest_server = axum::Server::try_bind(&opts.ingest_bind)
        .unwrap_or_else(|e| {
            tracing::error!(message = "error binding to address", address = %opts.ingest_bind, error = %e);
            process::exit(1)
        })
        .serve(pws_exporter::http::ingest_router(ingest_context).into_make_service());
    tracing::info!(message = "ingestion server started", address = %ingest_server.local_addr());

    let metrics_context = Arc::new(MetricsContext::new(registry));
    let metrics_server = axum::Server::try_bind(&opts.metrics_bind)
        .unwrap_or_else(|e| {
            tracing::error!(message = "error binding to address", address = %opts.metrics_bind, error = %e);
            process::exit(1)
        })
        .serve(pws_exporter::http::metrics_router(metrics_context).into_make_service());
    tracing::info!(message = "metrics server started", address = %metrics_server.local_addr());

    let signals = shutdown.clone();
    tokio::spawn(async move {
        // Wait for either SIGTERM or SIGINT to shutdown
        tokio::select! {
            _ = sigterm() => {}
            _ = sigint() => {}
        }

        signals.trigger();
    });

    let (ingest_res, metrics_res) = tokio::join!(
        ingest_server.with_graceful_shutdown(stopped(shutdown.clone())),
        metrics_server.with_graceful_shutdown(stopped(shutdown.clone())),
    );

    if let Err(e) = ingest_res {
        tracing::error!(message = "ingestion server error", error = %e);
    }
    if let Err(e) = metrics_res {
        tracing::error!(message = "metrics server error", error = %e);
    }

    // A server that failed returns without shutdown being triggered
    shutdown.trigger();
    publishing.await?;

    tracing::info!("server shutdown");
    Ok(())
}

/// Return after the exporter has been asked to stop
async fn stopped(shutdown: Shutdown) {
    shutdown.wait().await
}

/// Return after the first SIGTERM signal received by this process
async fn sigterm() -> io::Result<()> {
    unix::signal(SignalKind::terminate())?.recv().await;
    Ok(())
}

/// Return after the first SIGINT signal received by this process
async fn sigint() -> io::Result<()> {
    unix::signal(SignalKind::interrupt())?.recv().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{PwsExporterApplication, DEFAULT_PUBLISH_SECS};
    use clap::error::ErrorKind;
    use clap::Parser;

    #[test]
    fn test_publish_secs_default() {
        let opts = PwsExporterApplication::try_parse_from(["pws_exporter"]).unwrap();
        assert_eq!(DEFAULT_PUBLISH_SECS, opts.publish_secs);
    }

    #[test]
    fn test_publish_secs_zero_rejected() {
        let err = PwsExporterApplication::try_parse_from(["pws_exporter", "--publish-secs", "0"]).unwrap_err();
        assert_eq!(ErrorKind::ValueValidation, err.kind());
    }

    #[test]
    fn test_publish_secs_one_accepted() {
        let opts = PwsExporterApplication::try_parse_from(["pws_exporter", "--publish-secs", "1"]).unwrap();
        assert_eq!(1, opts.publish_secs);
    }
}
