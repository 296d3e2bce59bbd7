use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};

use crate::actions::{fetch_failed, json_error};
use crate::flights::{Direction, FlightFilter, find_quick_getaway, most_popular_destination};
use crate::web::AppState;

#[derive(Debug, Deserialize)]
pub struct CountryParams {
    pub country: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FlightCountResponse {
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct QuickGetawayResponse {
    pub departure: String,
    pub arrival: String,
}

/// Total number of flights on the current board.
pub async fn get_number_of_flights(State(state): State<AppState>) -> impl IntoResponse {
    match state.client.fetch_flights(&FlightFilter::default()).await {
        Ok(flights) => Json(FlightCountResponse {
            count: flights.len(),
        })
        .into_response(),
        Err(e) => fetch_failed(e),
    }
}

pub async fn get_number_of_outbound_flights(State(state): State<AppState>) -> impl IntoResponse {
    match state
        .client
        .fetch_flights(&FlightFilter::direction(Direction::Outbound))
        .await
    {
        Ok(flights) => Json(flights.len()).into_response(),
        Err(e) => fetch_failed(e),
    }
}

pub async fn get_number_of_inbound_flights(State(state): State<AppState>) -> impl IntoResponse {
    match state
        .client
        .fetch_flights(&FlightFilter::direction(Direction::Inbound))
        .await
    {
        Ok(flights) => Json(flights.len()).into_response(),
        Err(e) => fetch_failed(e),
    }
}

/// Flights to and from a country, both directions.
pub async fn get_number_of_flights_to_and_from_country(
    State(state): State<AppState>,
    Query(params): Query<CountryParams>,
) -> impl IntoResponse {
    count_with_country(state, params.country, Direction::Any).await
}

pub async fn get_number_of_outbound_flights_to_country(
    State(state): State<AppState>,
    Query(params): Query<CountryParams>,
) -> impl IntoResponse {
    count_with_country(state, params.country, Direction::Outbound).await
}

pub async fn get_number_of_inbound_flights_from_country(
    State(state): State<AppState>,
    Query(params): Query<CountryParams>,
) -> impl IntoResponse {
    count_with_country(state, params.country, Direction::Inbound).await
}

/// Shared body of the three country-scoped count routes. A missing or empty
/// `country` query parameter is a 400, never a 500.
async fn count_with_country(
    state: AppState,
    country: Option<String>,
    direction: Direction,
) -> axum::response::Response {
    let Some(country) = country.filter(|c| !c.is_empty()) else {
        return json_error(StatusCode::BAD_REQUEST, "country name is missing!").into_response();
    };

    match state
        .client
        .fetch_flights(&FlightFilter::country(direction, country))
        .await
    {
        Ok(flights) => Json(flights.len()).into_response(),
        Err(e) => fetch_failed(e),
    }
}

/// Flights whose actual time differs from the scheduled time. Raw string
/// comparison, by contract.
pub async fn get_number_of_delayed_flights(State(state): State<AppState>) -> impl IntoResponse {
    match state.client.fetch_flights(&FlightFilter::default()).await {
        Ok(flights) => {
            let delayed = flights.iter().filter(|f| f.is_delayed()).count();
            Json(delayed).into_response()
        }
        Err(e) => fetch_failed(e),
    }
}

/// City with the highest number of outbound flights, as a bare JSON string.
pub async fn get_most_popular_destination(State(state): State<AppState>) -> impl IntoResponse {
    match state
        .client
        .fetch_flights(&FlightFilter::direction(Direction::Outbound))
        .await
    {
        Ok(flights) => match most_popular_destination(&flights) {
            Some(city) => Json(city.to_string()).into_response(),
            None => json_error(StatusCode::NOT_FOUND, "no outbound flights found").into_response(),
        },
        Err(e) => fetch_failed(e),
    }
}

/// Same-city round-trip finder: an outbound flight and a later inbound
/// flight from the same city. Two upstream fetches, one per direction, then
/// the cross-product scan in [`find_quick_getaway`].
pub async fn get_quick_getaway_from_israel(State(state): State<AppState>) -> impl IntoResponse {
    let outbound = match state
        .client
        .fetch_flights(&FlightFilter::direction(Direction::Outbound))
        .await
    {
        Ok(flights) => flights,
        Err(e) => return fetch_failed(e),
    };

    let inbound = match state
        .client
        .fetch_flights(&FlightFilter::direction(Direction::Inbound))
        .await
    {
        Ok(flights) => flights,
        Err(e) => return fetch_failed(e),
    };

    match find_quick_getaway(&outbound, &inbound) {
        Some((departure, arrival)) => Json(QuickGetawayResponse {
            departure: departure.flight_code(),
            arrival: arrival.flight_code(),
        })
        .into_response(),
        None => {
            json_error(StatusCode::NOT_FOUND, "couldn't find matching flights").into_response()
        }
    }
}
