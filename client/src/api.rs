use serde::de::DeserializeOwned;
use thiserror::Error;

use starchart_shared::{LocationId, RouteResponse, SubLocation, Waypoint};

use crate::config::{route_url, sub_locations_url};

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("fetch error: {0}")]
    Transport(#[source] gloo_net::Error),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("parse error: {0}")]
    Parse(#[source] gloo_net::Error),
    #[error("no route: {0}")]
    NoRoute(String),
}

impl QueryError {
    /// Notice shown when a route request fails.
    pub fn route_notice(&self) -> &'static str {
        match self {
            Self::NoRoute(_) => "NO ROUTE FOUND BETWEEN SELECTED LOCATIONS",
            _ => "FAILED TO CALCULATE ROUTE",
        }
    }
}

async fn get_json<T: DeserializeOwned>(url: &str) -> Result<T, QueryError> {
    let resp = gloo_net::http::Request::get(url)
        .send()
        .await
        .map_err(QueryError::Transport)?;

    if !resp.ok() {
        return Err(QueryError::Status(resp.status()));
    }

    resp.json::<T>().await.map_err(QueryError::Parse)
}

/// Areas inside a location, shown in the location panel.
pub async fn fetch_sub_locations(location_id: LocationId) -> Result<Vec<SubLocation>, QueryError> {
    get_json(&sub_locations_url(location_id)).await
}

/// Shortest corridor path between two locations.
pub async fn fetch_route(from: LocationId, to: LocationId) -> Result<Vec<Waypoint>, QueryError> {
    match get_json::<RouteResponse>(&route_url(from, to)).await? {
        RouteResponse::Found { path } => Ok(path),
        RouteResponse::Failed { error } => Err(QueryError::NoRoute(error)),
    }
}
