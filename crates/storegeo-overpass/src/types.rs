use std::collections::BTreeMap;

use serde::Deserialize;
use storegeo_core::{Coordinates, PoiCandidate};

/// Top-level Overpass JSON response.
#[derive(Debug, Deserialize)]
pub struct OverpassResponse {
    pub elements: Vec<RawElement>,
    /// Set by the server on runtime errors such as query timeouts.
    #[serde(default)]
    pub remark: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RawElement {
    Node {
        id: u64,
        #[serde(flatten)]
        position: RawPosition,
        #[serde(default)]
        tags: BTreeMap<String, String>,
    },
    Way {
        id: u64,
        center: Option<RawPosition>,
        #[serde(default)]
        tags: BTreeMap<String, String>,
    },
    Relation {
        id: u64,
        center: Option<RawPosition>,
        #[serde(default)]
        tags: BTreeMap<String, String>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RawPosition {
    lat: f64,
    lon: f64,
}

impl RawElement {
    /// Converts to a candidate. Elements without a usable position are
    /// dropped.
    #[must_use]
    pub fn into_candidate(self) -> Option<PoiCandidate> {
        let (source_id, position, tags) = match self {
            Self::Node { id, position, tags } => (format!("node/{id}"), Some(position), tags),
            Self::Way { id, center, tags } => (format!("way/{id}"), center, tags),
            Self::Relation { id, center, tags } => (format!("relation/{id}"), center, tags),
            Self::Other => return None,
        };

        let coordinates = position.map(|p| Coordinates::new(p.lat, p.lon))?;
        if !coordinates.is_valid() {
            tracing::debug!(source_id, "dropping OSM element with invalid position");
            return None;
        }

        Some(PoiCandidate {
            name: tags.get("name").cloned().unwrap_or_default(),
            coordinates,
            source_id,
            tags,
        })
    }
}

impl OverpassResponse {
    #[must_use]
    pub fn into_candidates(self) -> Vec<PoiCandidate> {
        self.elements
            .into_iter()
            .filter_map(RawElement::into_candidate)
            .collect()
    }
}
