//! flightboard - HTTP API over the Israel Airports Authority flight board
//! open dataset.
//!
//! Proxies the data.gov.il datastore into convenience endpoints: counts,
//! country/direction filters, a most-popular-destination aggregation, and a
//! same-city round-trip matcher. Every request fetches a fresh snapshot from
//! upstream; nothing is cached or persisted.

pub mod actions;
pub mod flights;
pub mod flights_client;
pub mod web;

pub use flights::{Direction, FlightFilter, FlightRecord};
pub use flights_client::{FlightDataClient, FlightDataConfig};
