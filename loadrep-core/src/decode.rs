use http::HeaderMap;
use http::header::CONTENT_TYPE;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// How a captured body is turned into a report value, picked from its content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Entities are unescaped, the result is kept as text.
    Html,
    /// Parsed into a generic JSON value.
    Json,
    /// Kept verbatim. Structural decoding would need a schema we don't have.
    Xml,
    Text,
}

impl BodyKind {
    pub fn from_content_type(content_type: &str) -> Self {
        if content_type.contains("text/html") {
            Self::Html
        } else if content_type.contains("application/json") {
            Self::Json
        } else if content_type.contains("application/xml") {
            Self::Xml
        } else {
            Self::Text
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedBody {
    pub headers: BTreeMap<String, String>,
    pub body: Value,
}

/// First `content-type` value, or `""` when absent or not visible ASCII.
pub fn content_type(headers: &HeaderMap) -> &str {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// Collapses multi-valued headers into one comma-joined string per name.
pub fn fold_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .keys()
        .map(|name| {
            let joined = headers
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()))
                .collect::<Vec<_>>()
                .join(",");
            (name.as_str().to_string(), joined)
        })
        .collect()
}

pub fn decode_body(content_type: &str, raw: &[u8]) -> Result<Value> {
    let body = match BodyKind::from_content_type(content_type) {
        BodyKind::Html => {
            let text = String::from_utf8_lossy(raw);
            Value::String(html_escape::decode_html_entities(&text).into_owned())
        }
        BodyKind::Json => serde_json::from_slice(raw).map_err(Error::Decode)?,
        BodyKind::Xml | BodyKind::Text => Value::String(String::from_utf8_lossy(raw).into_owned()),
    };
    Ok(body)
}

pub fn decode(headers: &HeaderMap, content_type: &str, raw: &[u8]) -> Result<DecodedBody> {
    Ok(DecodedBody {
        headers: fold_headers(headers),
        body: decode_body(content_type, raw)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use serde_json::json;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut h = HeaderMap::new();
        for (k, v) in pairs {
            h.append(*k, HeaderValue::from_static(v));
        }
        h
    }

    #[test]
    fn json_body_is_parsed() {
        let v = match decode_body("application/json; charset=utf-8", br#"{"a":1}"#) {
            Ok(v) => v,
            Err(err) => panic!("decode failed: {err}"),
        };
        assert_eq!(v, json!({"a": 1}));
    }

    #[test]
    fn malformed_json_is_an_error() {
        let res = decode(
            &headers(&[("content-type", "application/json")]),
            "application/json",
            br#"{"a":"#,
        );
        assert!(matches!(res, Err(Error::Decode(_))));
    }

    #[test]
    fn html_entities_are_unescaped() {
        let v = decode_body("text/html", b"&lt;b&gt;").ok();
        assert_eq!(v, Some(Value::String("<b>".to_string())));
    }

    #[test]
    fn xml_and_unknown_types_pass_through() {
        let xml = "<a>&lt;</a>";
        assert_eq!(
            decode_body("application/xml", xml.as_bytes()).ok(),
            Some(Value::String(xml.to_string()))
        );
        assert_eq!(
            decode_body("image/png", b"raw").ok(),
            Some(Value::String("raw".to_string()))
        );
        assert_eq!(
            decode_body("", b"{\"a\":1}").ok(),
            Some(Value::String("{\"a\":1}".to_string()))
        );
    }

    #[test]
    fn first_matching_content_type_wins() {
        assert_eq!(
            BodyKind::from_content_type("text/html, application/json"),
            BodyKind::Html
        );
        assert_eq!(
            BodyKind::from_content_type("application/json+xml; application/xml"),
            BodyKind::Json
        );
    }

    #[test]
    fn multi_valued_headers_are_joined() {
        let h = headers(&[
            ("set-cookie", "a=1"),
            ("set-cookie", "b=2"),
            ("content-type", "text/plain"),
        ]);
        let folded = fold_headers(&h);
        assert_eq!(folded.get("set-cookie").map(String::as_str), Some("a=1,b=2"));
        assert_eq!(
            folded.get("content-type").map(String::as_str),
            Some("text/plain")
        );
        assert_eq!(content_type(&h), "text/plain");
        assert_eq!(content_type(&HeaderMap::new()), "");
    }
}
