#![allow(dead_code)]
//! A local stand-in for the forecast API.

use serde_json::json;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const FORECAST_PATH: &str = "/v1/forecast";

/// A forecast body shaped like the real API's response.
pub fn forecast_body(elevation: f64) -> serde_json::Value {
    json!({
        "latitude": 52.52,
        "longitude": 13.419998,
        "generationtime_ms": 0.05,
        "utc_offset_seconds": 0,
        "timezone": "GMT",
        "elevation": elevation,
        "hourly_units": { "time": "iso8601", "temperature_2m": "°C" },
        "hourly": {
            "time": ["2024-05-01T00:00", "2024-05-01T01:00", "2024-05-01T02:00"],
            "temperature_2m": [11.0, 10.5, 10.1]
        }
    })
}

/// Starts a server that answers every forecast request with `forecast_body(elevation)`.
pub async fn start(elevation: f64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FORECAST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(elevation)))
        .mount(&server)
        .await;
    server
}

/// Starts a server that fails every forecast request with `status`.
pub async fn start_failing(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FORECAST_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;
    server
}

pub fn endpoint(server: &MockServer) -> String {
    format!("{}{}", server.uri(), FORECAST_PATH)
}
