//! In-memory state: routing rules, provider clients and the geocode cache.

use crate::cache::{is_fresh, prune_cache, CacheEntry};
use crate::config::Config;
use dashmap::DashMap;
use pavepath_core::{Coordinate, Geocoder, RoutingProviderError, RoutingRules};
use pavepath_providers::{SharedDirections, SharedGeocoder};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CachedGeocode {
    coordinate: Option<Coordinate>,
    fetched_at: Instant,
}

impl CacheEntry for CachedGeocode {
    fn fetched_at(&self) -> Instant {
        self.fetched_at
    }
}

/// Application state shared by every handler.
pub struct AppState {
    rules: RoutingRules,
    directions: Option<SharedDirections>,
    geocoder: Option<SharedGeocoder>,
    geocode_cache: DashMap<String, CachedGeocode>,
    geocode_cache_ttl: Duration,
    geocode_cache_max_entries: usize,
}

impl AppState {
    pub fn new(rules: RoutingRules) -> Self {
        Self {
            rules,
            directions: None,
            geocoder: None,
            geocode_cache: DashMap::new(),
            geocode_cache_ttl: Duration::from_secs(3600),
            geocode_cache_max_entries: 1024,
        }
    }

    /// Build state from configuration, constructing provider clients.
    ///
    /// Provider clients are blocking; call this outside the async runtime.
    pub fn from_config(config: &Config, rules: RoutingRules) -> Result<Self, RoutingProviderError> {
        let mut state = Self::new(rules)
            .with_geocode_cache(config.geocode_cache_ttl, config.geocode_cache_max_entries);
        state.directions = config.providers.build_directions()?;
        state.geocoder = config.providers.build_geocoder()?;
        Ok(state)
    }

    pub fn with_directions(mut self, directions: SharedDirections) -> Self {
        self.directions = Some(directions);
        self
    }

    pub fn with_geocoder(mut self, geocoder: SharedGeocoder) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    pub fn with_geocode_cache(mut self, ttl: Duration, max_entries: usize) -> Self {
        self.geocode_cache_ttl = ttl;
        self.geocode_cache_max_entries = max_entries;
        self
    }

    pub fn rules(&self) -> &RoutingRules {
        &self.rules
    }

    pub fn directions(&self) -> Option<&SharedDirections> {
        self.directions.as_ref()
    }

    pub fn geocoder(&self) -> Option<&SharedGeocoder> {
        self.geocoder.as_ref()
    }

    /// Fresh cached answer for `query`; `Some(None)` is a cached miss.
    fn cached_geocode(&self, query: &str) -> Option<Option<Coordinate>> {
        let entry = self.geocode_cache.get(query)?;
        is_fresh(entry.value(), self.geocode_cache_ttl).then_some(entry.coordinate)
    }

    fn store_geocode(&self, query: String, coordinate: Option<Coordinate>) {
        self.geocode_cache.insert(
            query,
            CachedGeocode {
                coordinate,
                fetched_at: Instant::now(),
            },
        );
        prune_cache(
            &self.geocode_cache,
            self.geocode_cache_max_entries,
            self.geocode_cache_ttl,
        );
    }

    pub fn geocode_cache_len(&self) -> usize {
        self.geocode_cache.len()
    }
}

/// Geocoder that answers from the state's cache before asking the provider.
pub struct CachingGeocoder<'a> {
    state: &'a AppState,
}

impl<'a> CachingGeocoder<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }
}

impl Geocoder for CachingGeocoder<'_> {
    fn resolve(&self, address: &str) -> Result<Option<Coordinate>, RoutingProviderError> {
        let key = address.trim().to_lowercase();
        if let Some(cached) = self.state.cached_geocode(&key) {
            tracing::debug!(address, "geocode cache hit");
            return Ok(cached);
        }
        let geocoder = self
            .state
            .geocoder()
            .ok_or(RoutingProviderError::NotConfigured { what: "geocoding" })?;
        let coordinate = geocoder.resolve(address)?;
        self.state.store_geocode(key, coordinate);
        Ok(coordinate)
    }
}
