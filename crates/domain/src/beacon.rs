//! Object identifiers and beacon URIs
//!
//! Objects can be referred to by a bare UUID, by a beacon
//! (`weaviate://localhost/<uuid>` or `weaviate://localhost/<Class>/<uuid>`),
//! or by a REST URL ending in `/v1/objects/<uuid>`. [`parse_object_uuid`]
//! accepts all three.

use url::Url;
use uuid::Uuid;

use crate::constants::BEACON_PREFIX;
use crate::errors::{Result, WeaveError};

/// Extracts and validates the UUID of an object reference.
///
/// # Errors
/// Returns [`WeaveError::InvalidInput`] when no valid UUID can be extracted.
pub fn parse_object_uuid(input: &str) -> Result<Uuid> {
    let candidate = if is_beacon(input) || is_object_url(input) {
        input.trim_end_matches('/').rsplit('/').next().unwrap_or_default()
    } else {
        input
    };

    Uuid::parse_str(candidate).map_err(|_| {
        WeaveError::InvalidInput(format!(
            "Not valid 'uuid' or 'uuid' can not be extracted from value: {input}"
        ))
    })
}

fn is_beacon(input: &str) -> bool {
    input.starts_with("weaviate://")
}

fn is_object_url(input: &str) -> bool {
    Url::parse(input)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.path().contains("/v1/objects/"))
        .unwrap_or(false)
}

/// Upper-cases the first character of a class name.
pub fn capitalize_first_letter(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Beacon pointing at an object, optionally qualified by class.
pub fn object_beacon(class_name: Option<&str>, id: &Uuid) -> String {
    match class_name {
        Some(class_name) => format!("{BEACON_PREFIX}/{class_name}/{id}"),
        None => format!("{BEACON_PREFIX}/{id}"),
    }
}

/// Beacon pointing at a reference property of an object.
pub fn property_beacon(class_name: &str, id: &Uuid, property: &str) -> String {
    format!("{BEACON_PREFIX}/{class_name}/{id}/{property}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "fc7eb129-f138-457f-b727-1b29db191a67";

    #[test]
    fn accepts_plain_uuid() {
        assert_eq!(parse_object_uuid(ID).unwrap().to_string(), ID);
    }

    #[test]
    fn extracts_uuid_from_beacon_and_url() {
        let beacon = format!("weaviate://localhost/{ID}");
        let classed = format!("weaviate://localhost/Article/{ID}");
        let url = format!("http://localhost:8080/v1/objects/{ID}");

        for input in [beacon, classed, url] {
            assert_eq!(parse_object_uuid(&input).unwrap().to_string(), ID, "input: {input}");
        }
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(parse_object_uuid("not-a-uuid"), Err(WeaveError::InvalidInput(_))));
        assert!(parse_object_uuid("http://localhost:8080/v1/objects/nope").is_err());
        assert!(parse_object_uuid("").is_err());
    }

    #[test]
    fn capitalizes_only_the_first_letter() {
        assert_eq!(capitalize_first_letter("article"), "Article");
        assert_eq!(capitalize_first_letter("a"), "A");
        assert_eq!(capitalize_first_letter("myClass"), "MyClass");
        assert_eq!(capitalize_first_letter(""), "");
    }

    #[test]
    fn builds_reference_beacons() {
        let id = Uuid::parse_str(ID).unwrap();
        assert_eq!(
            property_beacon("Author", &id, "wroteArticles"),
            format!("weaviate://localhost/Author/{ID}/wroteArticles")
        );
        assert_eq!(object_beacon(None, &id), format!("weaviate://localhost/{ID}"));
        assert_eq!(
            object_beacon(Some("Article"), &id),
            format!("weaviate://localhost/Article/{ID}")
        );
    }
}
