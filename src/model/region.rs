use crate::HarvestError;
use std::fmt;

/// US states as (full name, postal code)
const US_STATES: &[(&str, &str)] = &[
    ("Alabama", "AL"),
    ("Alaska", "AK"),
    ("Arizona", "AZ"),
    ("Arkansas", "AR"),
    ("California", "CA"),
    ("Colorado", "CO"),
    ("Connecticut", "CT"),
    ("Delaware", "DE"),
    ("Florida", "FL"),
    ("Georgia", "GA"),
    ("Hawaii", "HI"),
    ("Idaho", "ID"),
    ("Illinois", "IL"),
    ("Indiana", "IN"),
    ("Iowa", "IA"),
    ("Kansas", "KS"),
    ("Kentucky", "KY"),
    ("Louisiana", "LA"),
    ("Maine", "ME"),
    ("Maryland", "MD"),
    ("Massachusetts", "MA"),
    ("Michigan", "MI"),
    ("Minnesota", "MN"),
    ("Mississippi", "MS"),
    ("Missouri", "MO"),
    ("Montana", "MT"),
    ("Nebraska", "NE"),
    ("Nevada", "NV"),
    ("New Hampshire", "NH"),
    ("New Jersey", "NJ"),
    ("New Mexico", "NM"),
    ("New York", "NY"),
    ("North Carolina", "NC"),
    ("North Dakota", "ND"),
    ("Ohio", "OH"),
    ("Oklahoma", "OK"),
    ("Oregon", "OR"),
    ("Pennsylvania", "PA"),
    ("Rhode Island", "RI"),
    ("South Carolina", "SC"),
    ("South Dakota", "SD"),
    ("Tennessee", "TN"),
    ("Texas", "TX"),
    ("Utah", "UT"),
    ("Vermont", "VT"),
    ("Virginia", "VA"),
    ("Washington", "WA"),
    ("West Virginia", "WV"),
    ("Wisconsin", "WI"),
    ("Wyoming", "WY"),
];

/// A search location: a state code plus a city name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Region {
    /// Upper-case two-letter state code
    pub state_code: String,

    /// City name as the operator typed it (trimmed)
    pub city: String,
}

impl Region {
    /// Builds a region from a state code or full state name and a city
    ///
    /// # Errors
    ///
    /// Returns `HarvestError::UnknownRegion` when the state is not recognised,
    /// the city is blank, or the city could escape the state folder once it
    /// becomes part of a file name (path separators, `..`, control characters).
    ///
    /// # Example
    ///
    /// ```
    /// use listing_harvest::Region;
    ///
    /// let region = Region::new("Washington", "Aberdeen").unwrap();
    /// assert_eq!(region.state_code, "WA");
    /// assert_eq!(region.geo_location_terms(), "Aberdeen, WA");
    /// ```
    pub fn new(state: &str, city: &str) -> Result<Self, HarvestError> {
        let state_code = resolve_state_code(state)
            .ok_or_else(|| HarvestError::UnknownRegion(state.to_string()))?;

        let city = city.trim();
        if city.is_empty() {
            return Err(HarvestError::UnknownRegion(format!(
                "{} (missing city)",
                state_code
            )));
        }

        if !is_safe_city(city) {
            return Err(HarvestError::UnknownRegion(format!(
                "{} (invalid city {:?})",
                state_code, city
            )));
        }

        Ok(Self {
            state_code: state_code.to_string(),
            city: city.to_string(),
        })
    }

    /// The location string the directory's search form expects
    pub fn geo_location_terms(&self) -> String {
        format!("{}, {}", self.city, self.state_code)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.city, self.state_code)
    }
}

/// Resolves a postal code or full state name (case-insensitive) to its code
pub fn resolve_state_code(input: &str) -> Option<&'static str> {
    let input = input.trim();
    US_STATES
        .iter()
        .find(|(name, code)| code.eq_ignore_ascii_case(input) || name.eq_ignore_ascii_case(input))
        .map(|(_, code)| *code)
}

/// City names end up in output file names
fn is_safe_city(city: &str) -> bool {
    !city.contains(['/', '\\'])
        && !city.contains("..")
        && !city.chars().any(char::is_control)
}

/// Returns true if the folder name looks like a state output folder
pub fn is_state_folder(name: &str) -> bool {
    US_STATES.iter().any(|(_, code)| *code == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_by_code() {
        assert_eq!(resolve_state_code("WA"), Some("WA"));
        assert_eq!(resolve_state_code("wa"), Some("WA"));
        assert_eq!(resolve_state_code(" ny "), Some("NY"));
    }

    #[test]
    fn test_resolve_by_name() {
        assert_eq!(resolve_state_code("Washington"), Some("WA"));
        assert_eq!(resolve_state_code("new york"), Some("NY"));
        assert_eq!(resolve_state_code("West Virginia"), Some("WV"));
    }

    #[test]
    fn test_unknown_state() {
        assert_eq!(resolve_state_code("ZZ"), None);
        assert!(Region::new("Atlantis", "Aberdeen").is_err());
    }

    #[test]
    fn test_blank_city_rejected() {
        assert!(Region::new("WA", "   ").is_err());
    }

    #[test]
    fn test_path_like_city_rejected() {
        assert!(Region::new("WA", "../../etc").is_err());
        assert!(Region::new("WA", "Aberdeen/Hoquiam").is_err());
        assert!(Region::new("WA", "Aberdeen\\Hoquiam").is_err());
        assert!(Region::new("WA", "..").is_err());
        assert!(Region::new("WA", "Aber\ndeen").is_err());

        let region = Region::new("WA", "Coeur d'Alene St. Maries").unwrap();
        assert_eq!(region.city, "Coeur d'Alene St. Maries");
    }

    #[test]
    fn test_geo_location_terms() {
        let region = Region::new("wa", " Aberdeen ").unwrap();
        assert_eq!(region.state_code, "WA");
        assert_eq!(region.city, "Aberdeen");
        assert_eq!(region.geo_location_terms(), "Aberdeen, WA");
    }

    #[test]
    fn test_state_table_complete() {
        assert_eq!(US_STATES.len(), 50);
        assert!(is_state_folder("WA"));
        assert!(!is_state_folder("wa"));
        assert!(!is_state_folder("src"));
    }
}
