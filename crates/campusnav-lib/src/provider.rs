//! Directions provider gateway.
//!
//! [`RouteProvider`] is the seam between the navigation core and the external
//! directions service. [`OrsDirectionsClient`] speaks the openrouteservice
//! GeoJSON directions API; [`FixtureRouteProvider`] answers every query from a
//! saved response body and is used for offline runs and tests.

use std::fs;
use std::path::Path;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::NavigatorConfig;
use crate::error::{Error, Result};
use crate::location::Coordinates;
use crate::route::{maneuver_name, RouteCandidate, RouteQuery, TurnStep};

/// Source of ranked route alternatives.
#[async_trait]
pub trait RouteProvider: Send + Sync + 'static {
    /// Request alternatives for `query`, ranked as the provider returns them.
    ///
    /// An empty result is reported as [`Error::RouteUnavailable`], never as `Ok(vec![])`.
    async fn request_routes(&self, query: &RouteQuery) -> Result<Vec<RouteCandidate>>;
}

#[derive(Debug, Serialize)]
struct DirectionsRequest {
    coordinates: [[f64; 2]; 2],
    alternative_routes: AlternativeRoutes,
    instructions: bool,
}

#[derive(Debug, Serialize)]
struct AlternativeRoutes {
    target_count: u8,
    share_factor: f64,
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    features: Vec<RouteFeature>,
}

#[derive(Debug, Deserialize)]
struct RouteFeature {
    properties: RouteProperties,
    geometry: LineGeometry,
}

#[derive(Debug, Deserialize)]
struct RouteProperties {
    #[serde(default)]
    summary: RouteSummary,
    #[serde(default)]
    segments: Vec<RouteSegment>,
}

#[derive(Debug, Default, Deserialize)]
struct RouteSummary {
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct RouteSegment {
    #[serde(default)]
    steps: Vec<WireStep>,
}

#[derive(Debug, Deserialize)]
struct WireStep {
    #[serde(rename = "type")]
    maneuver: Maneuver,
    instruction: String,
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Maneuver {
    Code(u8),
    Name(String),
}

impl Maneuver {
    fn into_kind(self) -> String {
        match self {
            Maneuver::Code(code) => maneuver_name(code).to_string(),
            Maneuver::Name(name) => name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LineGeometry {
    /// Positions may carry a third (elevation) ordinate which is ignored.
    coordinates: Vec<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: ProviderErrorDetail,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProviderErrorDetail {
    Structured { message: String },
    Text(String),
}

/// Convert a GeoJSON directions response into ranked candidates for `query`.
///
/// Only the first segment's steps are used: queries have a single origin and
/// destination, so there is exactly one leg.
pub fn parse_directions(body: &str, query: &RouteQuery) -> Result<Vec<RouteCandidate>> {
    let response: DirectionsResponse =
        serde_json::from_str(body).map_err(|err| Error::MalformedResponse {
            message: err.to_string(),
        })?;

    if response.features.is_empty() {
        return Err(Error::RouteUnavailable {
            reason: format!(
                "provider returned no routes from {} to {}",
                query.origin_label, query.destination_label
            ),
        });
    }

    response
        .features
        .into_iter()
        .enumerate()
        .map(|(index, feature)| into_candidate(index, feature, query))
        .collect()
}

fn into_candidate(index: usize, feature: RouteFeature, query: &RouteQuery) -> Result<RouteCandidate> {
    let path = feature
        .geometry
        .coordinates
        .into_iter()
        .map(|position| match position.as_slice() {
            [lon, lat, ..] => Ok(Coordinates::new(*lon, *lat)),
            _ => Err(Error::MalformedResponse {
                message: format!("route {} has a position with fewer than two ordinates", index + 1),
            }),
        })
        .collect::<Result<Vec<_>>>()?;

    let steps = feature
        .properties
        .segments
        .into_iter()
        .next()
        .map(|segment| {
            segment
                .steps
                .into_iter()
                .map(|step| TurnStep {
                    kind: step.maneuver.into_kind(),
                    instruction: step.instruction,
                    distance_meters: step.distance,
                    duration_seconds: step.duration,
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(RouteCandidate {
        id: index,
        summary: format!("Route {}", index + 1),
        distance_meters: feature.properties.summary.distance,
        duration_seconds: feature.properties.summary.duration,
        path,
        steps,
        origin_label: query.origin_label.clone(),
        destination_label: query.destination_label.clone(),
        mode: query.mode,
    })
}

/// Client for the openrouteservice directions API.
#[derive(Debug, Clone)]
pub struct OrsDirectionsClient {
    client: Client,
    base_url: String,
    api_key: String,
    alternative_count: u8,
    share_factor: f64,
}

impl OrsDirectionsClient {
    pub fn new(config: &NavigatorConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| Error::InvalidConfig {
            key: crate::config::API_KEY_ENV.to_string(),
            message: "an API key is required to reach the directions provider".to_string(),
        })?;

        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(user_agent())
            .build()
            .map_err(Error::Http)?;

        Ok(Self {
            client,
            base_url: config.directions_base_url.trim_end_matches('/').to_string(),
            api_key,
            alternative_count: config.alternative_count,
            share_factor: config.share_factor,
        })
    }

    fn endpoint(&self, query: &RouteQuery) -> String {
        format!(
            "{}/v2/directions/{}/geojson",
            self.base_url,
            query.mode.profile()
        )
    }

    fn request_body(&self, query: &RouteQuery) -> DirectionsRequest {
        DirectionsRequest {
            coordinates: [query.origin.into(), query.destination.into()],
            alternative_routes: AlternativeRoutes {
                target_count: self.alternative_count,
                share_factor: self.share_factor,
            },
            instructions: true,
        }
    }
}

fn user_agent() -> String {
    format!("campusnav-lib/{}", env!("CARGO_PKG_VERSION"))
}

#[async_trait]
impl RouteProvider for OrsDirectionsClient {
    async fn request_routes(&self, query: &RouteQuery) -> Result<Vec<RouteCandidate>> {
        let url = self.endpoint(query);
        info!(
            profile = query.mode.profile(),
            origin = %query.origin,
            destination = %query.destination,
            "requesting routes"
        );

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, &self.api_key)
            .header(ACCEPT, "application/geo+json, application/json")
            .json(&self.request_body(query))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::Provider {
                status: status.as_u16(),
                message: provider_message(&body),
            });
        }

        let candidates = parse_directions(&body, query)?;
        debug!(count = candidates.len(), "received route alternatives");
        Ok(candidates)
    }
}

fn provider_message(body: &str) -> String {
    match serde_json::from_str::<ProviderErrorBody>(body) {
        Ok(ProviderErrorBody {
            error: ProviderErrorDetail::Structured { message },
        })
        | Ok(ProviderErrorBody {
            error: ProviderErrorDetail::Text(message),
        }) => message,
        Err(_) => body.chars().take(200).collect(),
    }
}

/// Answers every query from one saved provider response.
#[derive(Debug, Clone)]
pub struct FixtureRouteProvider {
    body: String,
}

impl FixtureRouteProvider {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        Ok(Self::new(fs::read_to_string(path)?))
    }
}

#[async_trait]
impl RouteProvider for FixtureRouteProvider {
    async fn request_routes(&self, query: &RouteQuery) -> Result<Vec<RouteCandidate>> {
        parse_directions(&self.body, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::TravelMode;

    fn query(mode: TravelMode) -> RouteQuery {
        RouteQuery {
            origin: Coordinates::new(-84.5847, 34.0379),
            destination: Coordinates::new(-84.5835, 34.0381),
            mode,
            origin_label: "Kennesaw Hall".to_string(),
            destination_label: "Sturgis Library".to_string(),
        }
    }

    const ONE_ROUTE: &str = r#"{
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {
                "summary": {"distance": 120.0, "duration": 90.0},
                "segments": [
                    {"steps": [
                        {"type": 11, "instruction": "Head east", "distance": 100.0, "duration": 70.0},
                        {"type": 10, "instruction": "Arrive", "distance": 20.0, "duration": 20.0}
                    ]},
                    {"steps": [
                        {"type": 0, "instruction": "Ignored second leg", "distance": 1.0, "duration": 1.0}
                    ]}
                ]
            },
            "geometry": {"type": "LineString", "coordinates": [[-84.5847, 34.0379, 312.0], [-84.5835, 34.0381, 315.5]]}
        }]
    }"#;

    #[test]
    fn parses_first_segment_steps_and_drops_elevation() {
        let candidates = parse_directions(ONE_ROUTE, &query(TravelMode::Wheelchair)).unwrap();
        assert_eq!(candidates.len(), 1);

        let route = &candidates[0];
        assert_eq!(route.id, 0);
        assert_eq!(route.summary, "Route 1");
        assert_eq!(route.mode, TravelMode::Wheelchair);
        assert_eq!(route.path[1], Coordinates::new(-84.5835, 34.0381));
        assert_eq!(route.steps.len(), 2);
        assert_eq!(route.steps[0].kind, "depart");
        assert_eq!(route.steps[1].kind, "goal");
        assert_eq!(route.destination_label, "Sturgis Library");
    }

    #[test]
    fn zero_features_is_route_unavailable() {
        let err = parse_directions(r#"{"features": []}"#, &query(TravelMode::Walking)).unwrap_err();
        assert!(matches!(err, Error::RouteUnavailable { .. }));
    }

    #[test]
    fn garbage_is_malformed() {
        let err = parse_directions("<html>502</html>", &query(TravelMode::Walking)).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse { .. }));
    }

    #[test]
    fn request_body_asks_for_alternatives_and_instructions() {
        let config = NavigatorConfig::default().with_api_key("test-key");
        let client = OrsDirectionsClient::new(&config).unwrap();
        let q = query(TravelMode::Walking);

        assert_eq!(
            client.endpoint(&q),
            "https://api.openrouteservice.org/v2/directions/foot-walking/geojson"
        );
        let body = serde_json::to_value(client.request_body(&q)).unwrap();
        assert_eq!(body["alternative_routes"]["target_count"], 3);
        assert_eq!(body["alternative_routes"]["share_factor"], 0.6);
        assert_eq!(body["instructions"], true);
        assert_eq!(body["coordinates"][0][0], -84.5847);
    }

    #[test]
    fn client_requires_api_key() {
        let err = OrsDirectionsClient::new(&NavigatorConfig::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    fn provider_error_messages_are_extracted() {
        assert_eq!(
            provider_message(r#"{"error": {"code": 2010, "message": "Could not find routable point"}}"#),
            "Could not find routable point"
        );
        assert_eq!(
            provider_message(r#"{"error": "Access to this API has been disallowed"}"#),
            "Access to this API has been disallowed"
        );
        assert_eq!(provider_message("Bad Gateway"), "Bad Gateway");
    }
}
