//! Store keys are 12-byte object ids rendered as 24 hexadecimal characters.

use bson::oid::ObjectId;

const OBJECT_ID_HEX_LEN: usize = 24;

/// Parse a store key, rejecting anything that is not exactly 24 hex digits.
pub fn parse_object_id(raw: &str) -> Option<ObjectId> {
    if raw.len() != OBJECT_ID_HEX_LEN || !raw.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    ObjectId::parse_str(raw).ok()
}

pub fn is_object_id(raw: &str) -> bool {
    parse_object_id(raw).is_some()
}

/// Lower-case hex form of a store key, so every spelling of one id compares equal.
pub fn canonical_object_id(raw: &str) -> Option<String> {
    parse_object_id(raw).map(|id| id.to_hex())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_24_hex_digits() {
        let id = parse_object_id("60c72b2f9e1d9f4d2c96b3c3").unwrap();
        assert_eq!(id.to_hex(), "60c72b2f9e1d9f4d2c96b3c3");
        assert!(is_object_id("60C72B2F9E1D9F4D2C96B3C3"));
    }

    #[test]
    fn rejects_malformed_keys() {
        assert!(!is_object_id("not-a-valid-id"));
        assert!(!is_object_id(""));
        // 12-character strings are valid raw ids for some drivers, not here
        assert!(!is_object_id("abcdefghijkl"));
        assert!(!is_object_id("60c72b2f9e1d9f4d2c96b3c"));
        assert!(!is_object_id("60c72b2f9e1d9f4d2c96b3c3a"));
        assert!(!is_object_id("60c72b2f9e1d9f4d2c96b3zz"));
    }

    #[test]
    fn canonical_form_is_lower_case() {
        assert_eq!(
            canonical_object_id("60C72B2F9E1D9F4D2C96B3C3").as_deref(),
            Some("60c72b2f9e1d9f4d2c96b3c3")
        );
        assert_eq!(canonical_object_id("nope"), None);
    }

    #[test]
    fn fresh_ids_round_trip() {
        let id = ObjectId::new();
        assert_eq!(parse_object_id(&id.to_hex()), Some(id));
    }
}
