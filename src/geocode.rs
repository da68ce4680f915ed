//! Debounced, cached, de-duplicated address resolution for one card
//! instance. The cache is owned by the card and dies with it; nothing is
//! shared across cards, so an ambiguous address resolved for one record can
//! never leak into another's map.
//!
//! Failures here are always silent: the location tab degrades to the
//! configured fallback center and the rest of the card renders normally.

use std::num::NonZeroUsize;

use lru::LruCache;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::capabilities::{HttpError, HttpRequest};
use crate::model::CardConfig;
use crate::{LatLon, UnixTimeMs, GEOCODE_CACHE_CAPACITY, GEOCODE_RESULT_LIMIT};

/// Scoping parameters forwarded to the lookup service unmodified. Whether
/// and how the service biases results is the service's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeScope {
    pub limit: u8,
    pub country_codes: Option<String>,
    pub viewbox: Option<Viewbox>,
    pub bounded: bool,
}

impl Default for GeocodeScope {
    fn default() -> Self {
        Self {
            limit: GEOCODE_RESULT_LIMIT,
            country_codes: Some("de".into()),
            viewbox: None,
            bounded: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewbox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub coord: LatLon,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeEntry {
    pub location: ResolvedLocation,
    pub fetched_at: UnixTimeMs,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeQuery {
    Forward { address: String },
    Reverse { coord: LatLon },
}

impl GeocodeQuery {
    #[must_use]
    pub fn forward(address: &str) -> Self {
        Self::Forward {
            address: address.trim().to_string(),
        }
    }

    #[must_use]
    pub fn cache_key(&self) -> String {
        match self {
            Self::Forward { address } => address.clone(),
            Self::Reverse { coord } => format!("rev:{:.5},{:.5}", coord.lat, coord.lon),
        }
    }
}

/// What the caller should do after asking for a resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeocodePlan {
    /// Served from cache; `resolved` is already updated.
    CacheHit,
    /// A lookup for this key is in flight or already armed; do nothing.
    AlreadyScheduled,
    /// Arm the debounce timer with this generation.
    Debounce { generation: u64 },
}

pub struct GeocodeState {
    cache: LruCache<String, GeocodeEntry>,
    /// Cache key of the request currently on the wire, if any. At most one
    /// per card instance.
    in_flight: Option<String>,
    /// Debounce token; completions carrying an older value are stale.
    generation: u64,
    pending: Option<GeocodeQuery>,
    pub resolved: Option<ResolvedLocation>,
}

impl Default for GeocodeState {
    fn default() -> Self {
        Self {
            cache: LruCache::new(
                NonZeroUsize::new(GEOCODE_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            ),
            in_flight: None,
            generation: 0,
            pending: None,
            resolved: None,
        }
    }
}

impl GeocodeState {
    /// Ask for `query` to be resolved. Cache hits complete synchronously;
    /// everything else goes through the debounce window.
    pub fn schedule(&mut self, query: GeocodeQuery) -> GeocodePlan {
        let key = query.cache_key();

        if let Some(entry) = self.cache.get(&key) {
            self.resolved = Some(entry.location.clone());
            return GeocodePlan::CacheHit;
        }

        if self.in_flight.as_deref() == Some(key.as_str()) {
            return GeocodePlan::AlreadyScheduled;
        }
        if self
            .pending
            .as_ref()
            .is_some_and(|p| p.cache_key() == key)
        {
            return GeocodePlan::AlreadyScheduled;
        }

        self.pending = Some(query);
        self.generation += 1;
        GeocodePlan::Debounce {
            generation: self.generation,
        }
    }

    /// The debounce timer fired. Returns the query to put on the wire, or
    /// `None` when the completion is stale or a request is already in
    /// flight (the pending query is kept and re-armed on completion).
    pub fn debounce_elapsed(&mut self, generation: u64) -> Option<GeocodeQuery> {
        if generation != self.generation {
            return None;
        }
        if self.in_flight.is_some() {
            return None;
        }
        let query = self.pending.take()?;
        self.in_flight = Some(query.cache_key());
        Some(query)
    }

    /// A lookup finished. Successes are cached; failures are not, so a
    /// later attempt with the same address hits the network again.
    pub fn complete(&mut self, key: &str, outcome: Option<ResolvedLocation>) {
        if self.in_flight.as_deref() == Some(key) {
            self.in_flight = None;
        }
        if let Some(location) = outcome {
            self.cache.put(
                key.to_string(),
                GeocodeEntry {
                    location: location.clone(),
                    fetched_at: UnixTimeMs::now(),
                },
            );
            self.resolved = Some(location);
        }
    }

    /// Re-arm the debounce for a query that was deferred behind an
    /// in-flight request. Returns the new generation to start a timer for.
    pub fn rearm(&mut self) -> Option<u64> {
        if self.pending.is_some() && self.in_flight.is_none() {
            self.generation += 1;
            Some(self.generation)
        } else {
            None
        }
    }

    /// Known coordinates need no lookup at all.
    pub fn resolve_immediate(&mut self, location: ResolvedLocation) {
        self.resolved = Some(location);
    }

    /// Unmount (or record replacement): drop the pending query and make
    /// every outstanding completion stale.
    pub fn abandon(&mut self) {
        self.generation += 1;
        self.pending = None;
        self.in_flight = None;
    }

    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some() || self.in_flight.is_some()
    }
}

/// Build the forward-search request. Scope parameters are passed through
/// exactly as configured.
pub fn forward_request(config: &CardConfig, address: &str) -> Result<HttpRequest, HttpError> {
    let mut url = parse_base(&config.geocode_base_url)?;
    url.set_path("/search");
    {
        let mut pairs = url.query_pairs_mut();
        pairs
            .append_pair("q", address)
            .append_pair("format", "jsonv2")
            .append_pair("addressdetails", "0")
            .append_pair("limit", &config.geocode_scope.limit.to_string());
        if let Some(cc) = &config.geocode_scope.country_codes {
            pairs.append_pair("countrycodes", cc);
        }
        if let Some(vb) = &config.geocode_scope.viewbox {
            pairs.append_pair(
                "viewbox",
                &format!("{},{},{},{}", vb.min_lon, vb.min_lat, vb.max_lon, vb.max_lat),
            );
        }
        if config.geocode_scope.bounded {
            pairs.append_pair("bounded", "1");
        }
    }

    HttpRequest::get(url.as_str())?
        .with_header("Accept", "application/json")?
        .with_timeout_ms(config.geocode_timeout_ms)
}

/// Build the reverse-search request for a coordinate-only record.
pub fn reverse_request(config: &CardConfig, coord: LatLon) -> Result<HttpRequest, HttpError> {
    let mut url = parse_base(&config.geocode_base_url)?;
    url.set_path("/reverse");
    url.query_pairs_mut()
        .append_pair("lat", &format!("{:.6}", coord.lat))
        .append_pair("lon", &format!("{:.6}", coord.lon))
        .append_pair("format", "jsonv2");

    HttpRequest::get(url.as_str())?
        .with_header("Accept", "application/json")?
        .with_timeout_ms(config.geocode_timeout_ms)
}

pub fn request_for(config: &CardConfig, query: &GeocodeQuery) -> Result<HttpRequest, HttpError> {
    match query {
        GeocodeQuery::Forward { address } => forward_request(config, address),
        GeocodeQuery::Reverse { coord } => reverse_request(config, *coord),
    }
}

fn parse_base(base: &str) -> Result<Url, HttpError> {
    Url::parse(base).map_err(|e| HttpError::InvalidUrl {
        url: base.to_string(),
        reason: e.to_string(),
    })
}

/// Nominatim-style result row. Coordinates arrive as strings on the wire.
#[derive(Debug, Clone, Deserialize)]
struct Place {
    #[serde(default)]
    display_name: String,
    lat: String,
    lon: String,
}

impl Place {
    fn into_location(self) -> Option<ResolvedLocation> {
        let lat = self.lat.parse::<f64>().ok()?;
        let lon = self.lon.parse::<f64>().ok()?;
        let coord = LatLon::new(lat, lon).ok()?;
        Some(ResolvedLocation {
            coord,
            display_name: self.display_name,
        })
    }
}

/// Parse a forward-search response body. Any malformed or out-of-range
/// payload yields `None`: silent degradation, never an error surface.
#[must_use]
pub fn parse_forward(body: &[u8]) -> Option<ResolvedLocation> {
    serde_json::from_slice::<Vec<Place>>(body)
        .ok()?
        .into_iter()
        .find_map(Place::into_location)
}

#[must_use]
pub fn parse_reverse(body: &[u8]) -> Option<ResolvedLocation> {
    serde_json::from_slice::<Place>(body).ok()?.into_location()
}
