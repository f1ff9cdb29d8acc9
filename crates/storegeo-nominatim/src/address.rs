use storegeo_core::StoreQuery;

/// English country name for an ISO 3166-1 alpha-2 code.
///
/// Only the countries the retailer operates in or borders are listed;
/// unknown codes yield `None` and are passed through verbatim.
#[must_use]
pub fn country_name(code: &str) -> Option<&'static str> {
    let name = match code.trim().to_ascii_uppercase().as_str() {
        "DE" => "Germany",
        "AT" => "Austria",
        "CH" => "Switzerland",
        "FR" => "France",
        "IT" => "Italy",
        "ES" => "Spain",
        "NL" => "Netherlands",
        "BE" => "Belgium",
        "PL" => "Poland",
        "CZ" => "Czech Republic",
        "DK" => "Denmark",
        "LU" => "Luxembourg",
        _ => return None,
    };
    Some(name)
}

/// Address components handed to the geocoder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostalAddress {
    pub street: String,
    pub zip: String,
    pub city: String,
    pub country_code: Option<String>,
}

impl PostalAddress {
    #[must_use]
    pub fn from_query(query: &StoreQuery) -> Self {
        Self {
            street: query.street.clone(),
            zip: query.zip.clone(),
            city: query.city.clone(),
            country_code: query.country_code.clone(),
        }
    }

    /// Free-form search string `"street, zip, city, country"` with blank
    /// parts skipped. `None` when street, zip, and city are all blank.
    #[must_use]
    pub fn to_query_string(&self) -> Option<String> {
        let local: Vec<&str> = [&self.street, &self.zip, &self.city]
            .into_iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        if local.is_empty() {
            return None;
        }

        let country = self
            .country_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(|c| country_name(c).unwrap_or(c));

        let mut parts = local;
        parts.extend(country);
        Some(parts.join(", "))
    }
}
