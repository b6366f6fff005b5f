use lambda_http::{http::StatusCode, Body, Error, Request, RequestPayloadExt, Response};
use serde::{de::DeserializeOwned, Serialize};

/// Decode a request body into `T`.
///
/// JSON and urlencoded forms are decoded by content type. A body without a
/// recognised content type is tried as JSON, and an empty body yields
/// `T::default()` so handlers see every field as absent.
pub fn decode_payload<T>(event: &Request) -> Result<T, String>
where
    T: DeserializeOwned + Default,
{
    if event.body().is_empty() {
        return Ok(T::default());
    }

    match event.payload::<T>() {
        Ok(Some(payload)) => Ok(payload),
        Ok(None) => serde_json::from_slice(event.body()).map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    }
}

pub fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(serde_json::to_string(value)?.into())
        .map_err(Box::new)?)
}

/// `{"error": message}` with the given status.
pub fn error_response(status: StatusCode, message: &str) -> Result<Response<Body>, Error> {
    json_response(status, &serde_json::json!({ "error": message }))
}

pub fn malformed_body(reason: &str) -> Result<Response<Body>, Error> {
    tracing::warn!("Rejecting malformed request body: {}", reason);
    error_response(StatusCode::BAD_REQUEST, "Malformed request body")
}

/// Plain-text 500. The cause is logged by the caller, never sent to the client.
pub fn server_error() -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header("Content-Type", "text/plain; charset=utf-8")
        .body("Server error".into())
        .map_err(Box::new)?)
}

/// Decode `%XX` escapes in a path segment. Invalid escapes are kept as
/// written and non-UTF-8 results are replaced lossily.
pub fn percent_decode(segment: &str) -> String {
    let bytes = segment.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hi = (bytes[i + 1] as char).to_digit(16);
            let lo = (bytes[i + 2] as char).to_digit(16);
            if let (Some(hi), Some(lo)) = (hi, lo) {
                out.push((hi * 16 + lo) as u8);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct FormFields {
        name: Option<String>,
        submitted_by: Option<String>,
    }

    fn request(content_type: Option<&str>, body: &str) -> Request {
        let mut builder = lambda_http::http::Request::builder()
            .method("POST")
            .uri("/getAllSentByUser");
        if let Some(content_type) = content_type {
            builder = builder.header("content-type", content_type);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[test]
    fn decodes_json_and_urlencoded_bodies() {
        let json = request(Some("application/json"), r#"{"name":"alice","submittedBy":"bob"}"#);
        let form = request(
            Some("application/x-www-form-urlencoded"),
            "name=alice&submittedBy=bob",
        );
        let expected = FormFields {
            name: Some("alice".to_string()),
            submitted_by: Some("bob".to_string()),
        };

        assert_eq!(decode_payload::<FormFields>(&json).unwrap(), expected);
        assert_eq!(decode_payload::<FormFields>(&form).unwrap(), expected);
    }

    #[test]
    fn empty_body_decodes_as_default() {
        assert_eq!(decode_payload::<FormFields>(&request(None, "")).unwrap(), FormFields::default());
        assert_eq!(
            decode_payload::<FormFields>(&request(Some("application/json"), "")).unwrap(),
            FormFields::default()
        );
    }

    #[test]
    fn json_without_content_type_is_still_decoded() {
        let fields = decode_payload::<FormFields>(&request(None, r#"{"name":"alice"}"#)).unwrap();
        assert_eq!(fields.name.as_deref(), Some("alice"));
    }

    #[test]
    fn broken_json_is_an_error() {
        assert!(decode_payload::<FormFields>(&request(Some("application/json"), "{name")).is_err());
        assert!(decode_payload::<FormFields>(&request(None, "not json")).is_err());
    }

    #[test]
    fn percent_escapes_in_path_segments_are_decoded() {
        assert_eq!(percent_decode("a%20b"), "a b");
        assert_eq!(percent_decode("caf%C3%A9"), "café");
        assert_eq!(percent_decode("plain-id"), "plain-id");
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz%4"), "%zz%4");
    }

    #[test]
    fn server_error_is_plain_text() {
        let resp = server_error().unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(resp.body().as_ref(), b"Server error");
    }
}
