use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::decode::{content_type, decode, decode_body, fold_headers};
use crate::error::{Error, Result};
use crate::types::{DebugInfo, ScenarioResult, ScenarioStepResult};

/// Literal request/response exchange of one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerboseHttpRequestInfo {
    #[serde(rename = "stepId")]
    pub step_id: u16,
    pub request: VerboseRequest,
    #[serde(flatten)]
    pub outcome: VerboseOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerboseRequest {
    pub url: String,
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub body: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerboseResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Value,
}

/// Either the response or the error message, never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerboseOutcome {
    Response(VerboseResponse),
    Error(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DebugDocument {
    pub steps: BTreeMap<u16, VerboseHttpRequestInfo>,
}

impl DebugDocument {
    /// Adds every decodable step of `record`. A step id seen before is overwritten.
    pub fn push(&mut self, record: &ScenarioResult) -> Result<()> {
        for step in &record.steps {
            if let Some(info) = verbose_info(step)? {
                self.steps.insert(info.step_id, info);
            }
        }
        Ok(())
    }
}

/// Builds the verbose entry of one step.
///
/// Returns `Ok(None)` when the response body can't be decoded; the step is left out
/// of the document. Missing capture data is a contract violation of the producer
/// and is returned as an error.
pub fn verbose_info(step: &ScenarioStepResult) -> Result<Option<VerboseHttpRequestInfo>> {
    let debug = step
        .debug
        .as_ref()
        .ok_or(Error::MissingDebugInfo { step_id: step.id })?;

    let request = verbose_request(debug);

    let outcome = match &step.error {
        Some(err) => VerboseOutcome::Error(err.to_string()),
        None => match verbose_response(step, debug) {
            Ok(resp) => VerboseOutcome::Response(resp),
            Err(Error::Decode(err)) => {
                tracing::warn!(step_id = step.id, "dropping step from debug output: {err}");
                return Ok(None);
            }
            Err(err) => return Err(err),
        },
    };

    Ok(Some(VerboseHttpRequestInfo {
        step_id: step.id,
        request,
        outcome,
    }))
}

fn verbose_request(debug: &DebugInfo) -> VerboseRequest {
    let body = if debug.request_body.is_empty() {
        Value::Null
    } else {
        decode_body(content_type(&debug.request_headers), &debug.request_body).unwrap_or_else(
            |_| Value::String(String::from_utf8_lossy(&debug.request_body).into_owned()),
        )
    };

    VerboseRequest {
        url: debug.url.clone(),
        method: debug.method.to_string(),
        headers: fold_headers(&debug.request_headers),
        body,
    }
}

fn verbose_response(step: &ScenarioStepResult, debug: &DebugInfo) -> Result<VerboseResponse> {
    let headers = debug
        .response_headers
        .as_ref()
        .ok_or(Error::MissingDebugField {
            step_id: step.id,
            field: "response_headers",
        })?;
    let body = debug
        .response_body
        .as_ref()
        .ok_or(Error::MissingDebugField {
            step_id: step.id,
            field: "response_body",
        })?;

    let decoded = decode(headers, content_type(headers), body)?;
    Ok(VerboseResponse {
        status_code: step.status_code,
        headers: decoded.headers,
        body: decoded.body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{StepError, StepErrorKind};
    use bytes::Bytes;
    use http::{HeaderMap, HeaderValue, Method};
    use serde_json::json;

    fn json_headers() -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert("content-type", HeaderValue::from_static("application/json"));
        h
    }

    fn captured(id: u16, response_body: &'static [u8]) -> ScenarioStepResult {
        ScenarioStepResult {
            id,
            status_code: 201,
            debug: Some(DebugInfo {
                url: "http://localhost/items".to_string(),
                method: Method::POST,
                request_headers: json_headers(),
                request_body: Bytes::from_static(br#"{"name":"x"}"#),
                response_headers: Some(json_headers()),
                response_body: Some(Bytes::from_static(response_body)),
            }),
            ..ScenarioStepResult::default()
        }
    }

    #[test]
    fn response_is_decoded() {
        let info = match verbose_info(&captured(1, br#"{"id":7}"#)) {
            Ok(Some(info)) => info,
            Ok(None) => panic!("step was dropped"),
            Err(err) => panic!("verbose_info failed: {err}"),
        };

        assert_eq!(info.request.method, "POST");
        assert_eq!(info.request.body, json!({"name": "x"}));
        match info.outcome {
            VerboseOutcome::Response(resp) => {
                assert_eq!(resp.status_code, 201);
                assert_eq!(resp.body, json!({"id": 7}));
                assert_eq!(
                    resp.headers.get("content-type").map(String::as_str),
                    Some("application/json")
                );
            }
            VerboseOutcome::Error(e) => panic!("unexpected error outcome: {e}"),
        }
    }

    #[test]
    fn malformed_response_drops_the_step() {
        assert!(matches!(verbose_info(&captured(1, br#"{"a":"#)), Ok(None)));
    }

    #[test]
    fn error_suppresses_response() {
        let mut step = captured(3, br#"{"a":"#);
        step.error = Some(StepError::new(StepErrorKind::Timeout, "timed out"));

        let v = match verbose_info(&step) {
            Ok(Some(info)) => match serde_json::to_value(&info) {
                Ok(v) => v,
                Err(err) => panic!("to_value failed: {err}"),
            },
            other => panic!("unexpected result: {other:?}"),
        };

        assert_eq!(v.get("error").and_then(Value::as_str), Some("timed out"));
        assert!(v.get("response").is_none());
        assert_eq!(v.get("stepId").and_then(Value::as_u64), Some(3));
    }

    #[test]
    fn missing_capture_is_an_error() {
        let step = ScenarioStepResult {
            id: 9,
            ..ScenarioStepResult::default()
        };
        assert!(matches!(
            verbose_info(&step),
            Err(Error::MissingDebugInfo { step_id: 9 })
        ));

        let mut step = captured(4, b"{}");
        if let Some(d) = step.debug.as_mut() {
            d.response_body = None;
        }
        assert!(matches!(
            verbose_info(&step),
            Err(Error::MissingDebugField {
                step_id: 4,
                field: "response_body"
            })
        ));
    }

    #[test]
    fn later_records_overwrite_same_step_id() {
        let mut doc = DebugDocument::default();
        let first = ScenarioResult {
            steps: vec![captured(1, br#"{"n":1}"#), captured(2, br#"{"n":2}"#)],
        };
        let second = ScenarioResult {
            steps: vec![captured(1, br#"{"n":3}"#)],
        };
        if let Err(err) = doc.push(&first).and_then(|()| doc.push(&second)) {
            panic!("push failed: {err}");
        }

        assert_eq!(doc.steps.len(), 2);
        match &doc.steps[&1].outcome {
            VerboseOutcome::Response(r) => assert_eq!(r.body, json!({"n": 3})),
            VerboseOutcome::Error(e) => panic!("unexpected error outcome: {e}"),
        }
    }
}
