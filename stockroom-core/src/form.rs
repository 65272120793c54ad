//! URL-encoded form processing

use crate::Error;
use serde::de::DeserializeOwned;

/// Parse URL-encoded form data
pub fn parse_form<T: DeserializeOwned>(body: &[u8]) -> Result<T, Error> {
    serde_urlencoded::from_bytes(body)
        .map_err(|e| Error::Deserialization(format!("Failed to parse form data: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct SearchForm {
        #[serde(default)]
        id: String,
        has_photo: Option<String>,
    }

    #[test]
    fn test_parse_form() {
        let form: SearchForm = parse_form(b"id=abc-123&has_photo=on").unwrap();
        assert_eq!(form.id, "abc-123");
        assert_eq!(form.has_photo.as_deref(), Some("on"));
    }

    #[test]
    fn test_parse_form_decodes_values() {
        let form: SearchForm = parse_form(b"id=a%20b").unwrap();
        assert_eq!(form.id, "a b");
        assert!(form.has_photo.is_none());

        let form: SearchForm = parse_form(b"id=one+two").unwrap();
        assert_eq!(form.id, "one two");
    }

    #[test]
    fn test_parse_form_missing_fields_default() {
        let form: SearchForm = parse_form(b"").unwrap();
        assert_eq!(form.id, "");
        assert!(form.has_photo.is_none());
    }
}
