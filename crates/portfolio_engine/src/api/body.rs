/* 📖 # Why parse bodies in two steps?

The body is first parsed into a generic JSON value and only then mapped onto the
payload type. The first step decides between "not JSON at all" (400) and "JSON of the
wrong shape" (422), so the two failure classes never depend on how serde happens to
classify an error halfway through a struct.

When the object does not fit the payload type, each key is tried on its own. Payload
types accept any subset of their keys, so the keys that fail alone are exactly the
ones with a wrong type, and each gets its own field error.
*/

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use portfolio_base::pal::http::HttpRequest;
use portfolio_base::{FieldError, PortfolioError, PortfolioResult};

const BODY_FIELD: &str = "body";

/// Decode the JSON body of `request` into `T`.
///
/// A missing `Content-Type` is accepted; any other media type than JSON is not.
pub fn parse_json_body<T: DeserializeOwned>(request: &HttpRequest) -> PortfolioResult<T> {
    if let Some(content_type) = request.headers().get("Content-Type") {
        if !is_json_media_type(content_type) {
            return Err(Box::new(PortfolioError::malformed_request(format!(
                "Unsupported Content-Type '{}', expected application/json",
                content_type
            ))));
        }
    }
    if request.body().is_empty() {
        return Err(Box::new(PortfolioError::malformed_request(
            "Request body must not be empty",
        )));
    }

    let value: Value = serde_json::from_slice(request.body().as_bytes()).map_err(|e| {
        Box::new(PortfolioError::malformed_request(format!(
            "Invalid JSON body: {}",
            e
        )))
    })?;
    let Value::Object(object) = value else {
        return Err(Box::new(PortfolioError::validation(vec![FieldError::new(
            BODY_FIELD,
            "expected a JSON object",
        )])));
    };
    serde_json::from_value(Value::Object(object.clone())).map_err(|e| {
        let mut errors = field_errors::<T>(&object);
        if errors.is_empty() {
            errors.push(FieldError::new(BODY_FIELD, e.to_string()));
        }
        Box::new(PortfolioError::validation(errors))
    })
}

/// One error per key whose value alone cannot be decoded into `T`.
fn field_errors<T: DeserializeOwned>(object: &Map<String, Value>) -> Vec<FieldError> {
    object
        .iter()
        .filter_map(|(key, value)| {
            let single: Map<String, Value> =
                std::iter::once((key.clone(), value.clone())).collect();
            serde_json::from_value::<T>(Value::Object(single))
                .err()
                .map(|e| FieldError::new(key.as_str(), e.to_string()))
        })
        .collect()
}

fn is_json_media_type(content_type: &str) -> bool {
    let media_type = content_type.split(';').next().unwrap_or("").trim();
    let Some((kind, subtype)) = media_type.split_once('/') else {
        return false;
    };
    kind.eq_ignore_ascii_case("application")
        && (subtype.eq_ignore_ascii_case("json")
            || subtype.to_ascii_lowercase().ends_with("+json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{Patch, ProjectDraft, ProjectPatch};
    use portfolio_base::ErrorKind;
    use portfolio_base::pal::http::HttpMethod;

    fn post(body: &str) -> HttpRequest {
        HttpRequest::new(HttpMethod::Post, "/projects").with_json(body)
    }

    #[test]
    fn test_media_types() {
        assert!(is_json_media_type("application/json"));
        assert!(is_json_media_type("Application/JSON; charset=utf-8"));
        assert!(is_json_media_type("application/merge-patch+json"));
        assert!(!is_json_media_type("text/plain"));
        assert!(!is_json_media_type("application/x-www-form-urlencoded"));
        assert!(!is_json_media_type("json"));
    }

    #[test]
    fn test_parse_valid_body() {
        let draft: ProjectDraft =
            parse_json_body(&post(r#"{"title":"T","description":"D","technologies":[]}"#))
                .unwrap();
        assert_eq!(draft.title.as_deref(), Some("T"));
    }

    #[test]
    fn test_missing_content_type_is_accepted() {
        let request = HttpRequest::new(HttpMethod::Patch, "/projects/1").with_body(r#"{"url":null}"#);
        let patch: ProjectPatch = parse_json_body(&request).unwrap();
        assert_eq!(patch.url, Patch::Null);
    }

    #[test]
    fn test_wrong_content_type_is_malformed() {
        let request = HttpRequest::new(HttpMethod::Post, "/projects")
            .with_header("Content-Type", "text/plain")
            .with_body("{}");
        let err = parse_json_body::<ProjectDraft>(&request).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::MalformedRequest { .. }));
    }

    #[test]
    fn test_empty_body_is_malformed() {
        let err = parse_json_body::<ProjectDraft>(&post("")).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::MalformedRequest { .. }));
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let err = parse_json_body::<ProjectDraft>(&post(r#"{"title": "#)).unwrap_err();
        match err.kind() {
            ErrorKind::MalformedRequest { message } => {
                assert!(message.starts_with("Invalid JSON body"), "{}", message)
            }
            other => panic!("Expected MalformedRequest, got {:?}", other),
        }
    }

    fn field_errors_of(err: &PortfolioError) -> Vec<FieldError> {
        match err.kind() {
            ErrorKind::Validation { errors } => errors.clone(),
            other => panic!("Expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_type_names_the_field() {
        let err = parse_json_body::<ProjectDraft>(&post(
            r#"{"title":5,"description":"d","technologies":["x"]}"#,
        ))
        .unwrap_err();
        assert_eq!(
            field_errors_of(&err),
            [FieldError::new(
                "title",
                "invalid type: integer `5`, expected a string"
            )]
        );
    }

    #[test]
    fn test_every_wrongly_typed_field_is_reported() {
        let err = parse_json_body::<ProjectDraft>(&post(
            r#"{"title":"T","description":false,"technologies":"Rust"}"#,
        ))
        .unwrap_err();
        let fields: Vec<String> = field_errors_of(&err).into_iter().map(|e| e.field).collect();
        assert_eq!(fields, ["description", "technologies"]);
    }

    #[test]
    fn test_wrong_type_in_patch_names_the_field() {
        let request =
            HttpRequest::new(HttpMethod::Patch, "/projects/1").with_json(r#"{"technologies":"Rust"}"#);
        let err = parse_json_body::<ProjectPatch>(&request).unwrap_err();
        let errors = field_errors_of(&err);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "technologies");
        assert!(errors[0].message.starts_with("invalid type"), "{}", errors[0].message);
    }

    #[test]
    fn test_non_object_is_validation_error() {
        let err = parse_json_body::<ProjectPatch>(&post("[]")).unwrap_err();
        match err.kind() {
            ErrorKind::Validation { errors } => {
                assert_eq!(errors, &[FieldError::new("body", "expected a JSON object")])
            }
            other => panic!("Expected Validation, got {:?}", other),
        }
    }
}
