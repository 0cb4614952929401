//! Coordinates from embedded JSON-LD blocks

use crate::parser::chain::select_all;
use scraper::Html;
use serde_json::{Map, Value};

/// Latitude and longitude exactly as the page states them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Coordinates {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

/// Scans `application/ld+json` blocks in document order for coordinates
///
/// Blocks that are not valid JSON are skipped. The first object exposing a
/// non-empty `geo` (directly or under `location`) wins.
pub fn find_coordinates(document: &Html) -> Option<Coordinates> {
    select_all(document.root_element(), r#"script[type="application/ld+json"]"#)
        .into_iter()
        .filter_map(|script| {
            let raw: String = script.text().collect();
            serde_json::from_str::<Value>(raw.trim()).ok()
        })
        .find_map(|value| coordinates_from_json(&value))
}

/// Pulls coordinates out of one parsed JSON-LD value
///
/// Accepts a single object or a list of objects; in a list the first item with
/// a geo object is used.
pub fn coordinates_from_json(value: &Value) -> Option<Coordinates> {
    match value {
        Value::Object(object) => coordinates_from_object(object),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_object)
            .find_map(coordinates_from_object),
        _ => None,
    }
}

fn coordinates_from_object(object: &Map<String, Value>) -> Option<Coordinates> {
    let geo = non_empty_geo(object).or_else(|| {
        object
            .get("location")
            .and_then(Value::as_object)
            .and_then(non_empty_geo)
    })?;

    Some(Coordinates {
        latitude: geo.get("latitude").and_then(scalar_text),
        longitude: geo.get("longitude").and_then(scalar_text),
    })
}

fn non_empty_geo(object: &Map<String, Value>) -> Option<&Map<String, Value>> {
    object
        .get("geo")
        .and_then(Value::as_object)
        .filter(|geo| !geo.is_empty())
}

/// Numbers keep their JSON rendering, strings are taken verbatim
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(number) => Some(number.to_string()),
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(blocks: &[&str]) -> Html {
        let scripts: String = blocks
            .iter()
            .map(|b| format!(r#"<script type="application/ld+json">{}</script>"#, b))
            .collect();
        Html::parse_document(&format!("<html><head>{}</head><body></body></html>", scripts))
    }

    #[test]
    fn test_geo_from_second_list_item() {
        let doc = page(&[r#"[{"@type":"WebPage"},{"geo":{"latitude":47.0,"longitude":-122.0}}]"#]);
        let coords = find_coordinates(&doc).unwrap();
        assert_eq!(coords.latitude.as_deref(), Some("47.0"));
        assert_eq!(coords.longitude.as_deref(), Some("-122.0"));
    }

    #[test]
    fn test_geo_under_location() {
        let value = json!({"location": {"geo": {"latitude": "46.97", "longitude": "-123.81"}}});
        let coords = coordinates_from_json(&value).unwrap();
        assert_eq!(coords.latitude.as_deref(), Some("46.97"));
        assert_eq!(coords.longitude.as_deref(), Some("-123.81"));
    }

    #[test]
    fn test_malformed_block_skipped() {
        let doc = page(&["{not json", r#"{"geo":{"latitude":1.5,"longitude":2}}"#]);
        let coords = find_coordinates(&doc).unwrap();
        assert_eq!(coords.latitude.as_deref(), Some("1.5"));
        assert_eq!(coords.longitude.as_deref(), Some("2"));
    }

    #[test]
    fn test_first_block_with_geo_wins() {
        let doc = page(&[
            r#"{"@type":"Organization"}"#,
            r#"{"geo":{"latitude":10,"longitude":20}}"#,
            r#"{"geo":{"latitude":30,"longitude":40}}"#,
        ]);
        assert_eq!(find_coordinates(&doc).unwrap().latitude.as_deref(), Some("10"));
    }

    #[test]
    fn test_empty_geo_ignored() {
        let value = json!([{"geo": {}}, {"geo": {"latitude": 3, "longitude": 4}}]);
        let coords = coordinates_from_json(&value).unwrap();
        assert_eq!(coords.latitude.as_deref(), Some("3"));
    }

    #[test]
    fn test_partial_geo() {
        let value = json!({"geo": {"latitude": 3}});
        let coords = coordinates_from_json(&value).unwrap();
        assert_eq!(coords.latitude.as_deref(), Some("3"));
        assert!(coords.longitude.is_none());
    }

    #[test]
    fn test_no_json_ld() {
        let doc = Html::parse_document("<html><body><p>hi</p></body></html>");
        assert!(find_coordinates(&doc).is_none());
    }
}
