//! Overpass QL construction for POI searches.

use storegeo_core::{is_apostrophe, Coordinates};

use crate::error::QueryError;

/// How the `name` tag is compared on the server side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameFilter {
    /// `["name"="..."]`
    Exact,
    /// Case-insensitive substring: `["name"~"...",i]`
    #[default]
    Contains,
}

/// Where to look.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchArea {
    /// Radius search around a point.
    Around { center: Coordinates, radius_m: u32 },
    /// Administrative area with the given name, e.g. a city.
    Locality(String),
    BoundingBox {
        south: f64,
        west: f64,
        north: f64,
        east: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PoiSearchSpec {
    pub name: String,
    /// Alternative spellings OR-ed with `name`.
    pub aliases: Vec<String>,
    pub name_filter: NameFilter,
    /// Accepted `shop` values. Empty means no `shop` filter.
    pub shop_types: Vec<String>,
    pub area: Option<SearchArea>,
}

impl PoiSearchSpec {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            name_filter: NameFilter::default(),
            shop_types: Vec::new(),
            area: None,
        }
    }

    #[must_use]
    pub fn exact(mut self) -> Self {
        self.name_filter = NameFilter::Exact;
        self
    }

    #[must_use]
    pub fn with_aliases(mut self, aliases: Vec<String>) -> Self {
        self.aliases = aliases;
        self
    }

    /// `name` followed by the non-blank aliases, trimmed, without
    /// case-insensitive duplicates.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for candidate in std::iter::once(&self.name).chain(&self.aliases) {
            let candidate = candidate.trim();
            let duplicate = names
                .iter()
                .any(|n| n.to_lowercase() == candidate.to_lowercase());
            if !candidate.is_empty() && !duplicate {
                names.push(candidate);
            }
        }
        names
    }

    #[must_use]
    pub fn with_shop_types(mut self, shop_types: Vec<String>) -> Self {
        self.shop_types = shop_types;
        self
    }

    #[must_use]
    pub fn with_area(mut self, area: SearchArea) -> Self {
        self.area = Some(area);
        self
    }
}

/// Escapes a value for use inside a double-quoted Overpass QL string.
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Optional apostrophe between two letters of a name.
const OPTIONAL_APOSTROPHE: &str = "('|\u{2019})?";

/// Regex for a contains-search on `name` that ignores apostrophes and
/// whitespace runs the way local name comparison does, so "Denns BioMarkt"
/// also finds "denn's Biomarkt".
fn loose_name_pattern(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| !is_apostrophe(*c))
                .map(|c| regex::escape(c.encode_utf8(&mut [0; 4])))
                .collect::<Vec<_>>()
                .join(OPTIONAL_APOSTROPHE)
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" +")
}

/// Alternation of the loose patterns, dropping case-insensitive duplicates.
fn contains_alternation(names: &[&str]) -> String {
    let mut patterns: Vec<String> = Vec::new();
    for pattern in names.iter().map(|n| loose_name_pattern(n)) {
        let duplicate = patterns
            .iter()
            .any(|p| p.to_lowercase() == pattern.to_lowercase());
        if !pattern.is_empty() && !duplicate {
            patterns.push(pattern);
        }
    }
    patterns.join("|")
}

fn shop_filter(shop_types: &[String]) -> String {
    match shop_types {
        [] => String::new(),
        [single] => format!("[\"shop\"={}]", quote(single)),
        many => {
            let alternatives = many
                .iter()
                .map(|s| regex::escape(s))
                .collect::<Vec<_>>()
                .join("|");
            format!("[\"shop\"~{}]", quote(&format!("^({alternatives})$")))
        }
    }
}

/// Builds the Overpass QL for a POI search.
///
/// Ways and relations are returned with their `center`, nodes with their own
/// position.
///
/// # Errors
///
/// Returns [`QueryError::InvalidQuery`] when the name is blank or the area
/// is malformed.
pub fn build_query(spec: &PoiSearchSpec, timeout_secs: u64) -> Result<String, QueryError> {
    if spec.name.trim().is_empty() {
        return Err(QueryError::InvalidQuery(
            "name fragment must be non-empty".to_string(),
        ));
    }

    let names = spec.names();
    let alternation = || {
        names
            .iter()
            .map(|n| regex::escape(n))
            .collect::<Vec<_>>()
            .join("|")
    };
    let name_filter = match (spec.name_filter, names.as_slice()) {
        (NameFilter::Exact, [single]) => format!("[\"name\"={}]", quote(single)),
        (NameFilter::Exact, _) => {
            format!("[\"name\"~{}]", quote(&format!("^({})$", alternation())))
        }
        (NameFilter::Contains, _) => {
            let alternation = contains_alternation(&names);
            if alternation.is_empty() {
                return Err(QueryError::InvalidQuery(
                    "name fragment has no searchable characters".to_string(),
                ));
            }
            format!("[\"name\"~{},i]", quote(&alternation))
        }
    };
    let shop_filter = shop_filter(&spec.shop_types);

    let (prefix, area_filter) = match &spec.area {
        None => (String::new(), String::new()),
        Some(SearchArea::Around { center, radius_m }) => {
            if !center.is_valid() {
                return Err(QueryError::InvalidQuery(format!(
                    "search center ({}, {}) is not a valid coordinate",
                    center.lat, center.lon
                )));
            }
            (
                String::new(),
                format!("(around:{radius_m},{},{})", center.lat, center.lon),
            )
        }
        Some(SearchArea::Locality(locality)) => {
            let locality = locality.trim();
            if locality.is_empty() {
                return Err(QueryError::InvalidQuery(
                    "locality must be non-empty".to_string(),
                ));
            }
            (
                format!(
                    "area[\"name\"={}][\"boundary\"=\"administrative\"]->.searchArea;",
                    quote(locality)
                ),
                "(area.searchArea)".to_string(),
            )
        }
        Some(SearchArea::BoundingBox {
            south,
            west,
            north,
            east,
        }) => {
            let corners_valid = Coordinates::new(*south, *west).is_valid()
                && Coordinates::new(*north, *east).is_valid();
            if !corners_valid || south > north || west > east {
                return Err(QueryError::InvalidQuery(format!(
                    "bounding box ({south},{west},{north},{east}) is malformed"
                )));
            }
            (String::new(), format!("({south},{west},{north},{east})"))
        }
    };

    Ok(format!(
        "[out:json][timeout:{timeout_secs}];{prefix}nwr{name_filter}{shop_filter}{area_filter};out center tags;"
    ))
}
