use anyhow::Result;
use axum::{
    Router,
    body::Body,
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tracing::info;
use uuid::Uuid;

use crate::actions;
use crate::flights_client::FlightDataClient;

// App state for sharing the upstream client
#[derive(Clone)]
pub struct AppState {
    pub client: FlightDataClient,
}

const WELCOME: &str = "flightboard: flight board API\n\
\n\
Routes under /api/flights:\n\
  getNumberOfFlights\n\
  getNumberOfOutboundFlights\n\
  getNumberOfInboundFlights\n\
  getNumberOfFlightsToAndFromCountry?country=<name>\n\
  getNumberOfOutboundFlightsToCountry?country=<name>\n\
  getNumberOfInboundFlightsFromCountry?country=<name>\n\
  getNumberOfDelayedFlights\n\
  getMostPopularDestination\n\
  getQuickGetawayFromIsrael\n";

async fn welcome() -> &'static str {
    WELCOME
}

// Middleware for request logging with correlation ID
async fn request_logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = Uuid::new_v4().to_string()[..8].to_string();
    let start_time = Instant::now();

    info!("Started {} {} [{}]", method, path, request_id);

    let response = next.run(request).await;
    let duration = start_time.elapsed();
    let status = response.status();

    info!(
        "Completed {} {} [{}] {} in {:.2}ms",
        method,
        path,
        request_id,
        status.as_u16(),
        duration.as_secs_f64() * 1000.0
    );

    response
}

/// Build the application router. Factored out of [`start_web_server`] so
/// tests can drive it without binding a socket.
pub fn app_router(state: AppState) -> Router {
    let flights_router = Router::new()
        .route("/getNumberOfFlights", get(actions::get_number_of_flights))
        .route(
            "/getNumberOfOutboundFlights",
            get(actions::get_number_of_outbound_flights),
        )
        .route(
            "/getNumberOfInboundFlights",
            get(actions::get_number_of_inbound_flights),
        )
        .route(
            "/getNumberOfFlightsToAndFromCountry",
            get(actions::get_number_of_flights_to_and_from_country),
        )
        .route(
            "/getNumberOfOutboundFlightsToCountry",
            get(actions::get_number_of_outbound_flights_to_country),
        )
        .route(
            "/getNumberOfInboundFlightsFromCountry",
            get(actions::get_number_of_inbound_flights_from_country),
        )
        .route(
            "/getNumberOfDelayedFlights",
            get(actions::get_number_of_delayed_flights),
        )
        .route(
            "/getMostPopularDestination",
            get(actions::get_most_popular_destination),
        )
        .route(
            "/getQuickGetawayFromIsrael",
            get(actions::get_quick_getaway_from_israel),
        );

    Router::new()
        .route("/", get(welcome))
        .nest("/api/flights", flights_router)
        .with_state(state)
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(CorsLayer::permissive())
}

pub async fn start_web_server(interface: String, port: u16, client: FlightDataClient) -> Result<()> {
    info!("Starting web server on {}:{}", interface, port);

    let app = app_router(AppState { client });

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", interface, port)).await?;
    info!("Web server listening on http://{}:{}", interface, port);

    axum::serve(listener, app).await?;

    Ok(())
}
