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

use crate::ingest::Receiver;
use crate::reading::RawReading;
use crate::shutdown::Shutdown;
use crate::sink::ReadingLog;
use axum::extract::{Form, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use prometheus_client::registry::Registry;
use std::fmt::Write;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

const TEXT_FORMAT: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";
const ACK_READ: &str = "Ok read.";
const ACK_GENERIC: &str = "Weather Easy Weather Pro Prometheus Exporter.";
const ACK_STOP: &str = "Stopping.";

const INDEX_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>pws_exporter</title></head>
<body>
<h1>Prometheus exporter for EasyWeatherPro weather stations</h1>
<ul>
<li>Readings are accepted on <code>/telemetry</code> of this address</li>
<li>Metrics are available on <code>/metrics</code> of the metrics address</li>
<li><a href="/stop">Stop</a> this exporter</li>
</ul>
</body>
</html>
"#;

/// State shared by request handlers of the ingestion server.
#[derive(Debug)]
pub struct IngestContext {
    receiver: Receiver,
    log: Option<ReadingLog>,
    shutdown: Shutdown,
}

impl IngestContext {
    pub fn new(receiver: Receiver, log: Option<ReadingLog>, shutdown: Shutdown) -> Self {
        IngestContext { receiver, log, shutdown }
    }
}

/// State shared by request handlers of the metrics server.
#[derive(Debug)]
pub struct MetricsContext {
    registry: Registry,
}

impl MetricsContext {
    pub fn new(registry: Registry) -> Self {
        MetricsContext { registry }
    }
}

/// Routes for weather stations pushing readings and for stopping the exporter.
pub fn ingest_router(context: Arc<IngestContext>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/favicon.ico", get(favicon))
        .route("/telemetry", get(telemetry_ack).post(telemetry_submit))
        .route("/stop", get(stop))
        .layer(TraceLayer::new_for_http())
        .with_state(context)
}

/// Routes for Prometheus scraping metrics.
pub fn metrics_router(context: Arc<MetricsContext>) -> Router {
    Router::new()
        .route("/metrics", get(text_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(context)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

// No icon is bundled
async fn favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn telemetry_ack() -> &'static str {
    ACK_GENERIC
}

async fn telemetry_submit(State(context): State<Arc<IngestContext>>, Form(raw): Form<RawReading>) -> Response {
    let accepted = match context.receiver.receive(&raw) {
        Ok(a) => a,
        Err(e) => {
            tracing::warn!(message = "rejected reading", error = %e);
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    tracing::debug!(message = "staged new reading", timestamp = %accepted.reading.timestamp());

    if let Some(log) = &context.log {
        if let Err(e) = log.append(&accepted.reading).await {
            tracing::error!(message = "unable to append to reading log", error = %e);
        }
    }

    let mut body = String::from(ACK_READ);
    for e in accepted.errors.iter() {
        tracing::warn!(message = "invalid value in reading", timestamp = %accepted.reading.timestamp(), error = %e);
        let _ = write!(body, "\n{}", e);
    }

    (StatusCode::OK, body).into_response()
}

async fn stop(State(context): State<Arc<IngestContext>>) -> &'static str {
    tracing::info!("stop requested");
    context.shutdown.trigger();
    ACK_STOP
}

async fn text_metrics(State(context): State<Arc<MetricsContext>>) -> Response {
    let mut buf = String::new();

    match prometheus_client::encoding::text::encode(&mut buf, &context.registry) {
        Ok(_) => {
            tracing::debug!(message = "encoded prometheus metrics to text format", num_bytes = buf.len());
            (StatusCode::OK, [(CONTENT_TYPE, TEXT_FORMAT)], buf).into_response()
        }
        Err(e) => {
            tracing::error!(message = "error encoding metrics", error = %e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
