use anyhow::Context as _;
use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::Method;
use loadrep_core::{DebugInfo, ScenarioResult, ScenarioStepResult, StepError, StepErrorKind};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::str::FromStr as _;
use std::time::Duration;

/// One line of the input file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ScenarioRecord {
    #[serde(default)]
    pub steps: Vec<StepRecord>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub(crate) struct StepRecord {
    pub id: u16,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status_code: u16,
    #[serde(default)]
    pub error: Option<ErrorRecord>,
    /// Internal phase name -> elapsed time.
    #[serde(default)]
    pub durations: BTreeMap<String, WireDuration>,
    #[serde(default)]
    pub debug: Option<DebugRecord>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ErrorRecord {
    /// e.g. `connectionError`
    pub kind: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub(crate) struct DebugRecord {
    pub url: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub request_headers: BTreeMap<String, HeaderValues>,
    #[serde(default)]
    pub request_body: String,
    #[serde(default)]
    pub response_headers: Option<BTreeMap<String, HeaderValues>>,
    #[serde(default)]
    pub response_body: Option<String>,
}

fn default_method() -> String {
    "GET".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum HeaderValues {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct WireDuration(Duration);

impl<'de> Deserialize<'de> for WireDuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct V;

        impl serde::de::Visitor<'_> for V {
            type Value = WireDuration;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("duration as string (e.g. 120ms), integer seconds, or float seconds")
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(WireDuration(Duration::from_secs(v)))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                if v < 0 {
                    return Err(E::custom("duration must not be negative"));
                }
                Ok(WireDuration(Duration::from_secs(v as u64)))
            }

            fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                if v < 0.0 {
                    return Err(E::custom("duration must not be negative"));
                }
                let d = Duration::try_from_secs_f64(v).map_err(E::custom)?;
                Ok(WireDuration(d))
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                let d = humantime::parse_duration(v).map_err(E::custom)?;
                Ok(WireDuration(d))
            }
        }

        deserializer.deserialize_any(V)
    }
}

/// Parses one NDJSON line into a scenario result.
pub(crate) fn parse_line(line: &str) -> anyhow::Result<ScenarioResult> {
    let record: ScenarioRecord = serde_json::from_str(line)?;
    record.try_into()
}

impl TryFrom<ScenarioRecord> for ScenarioResult {
    type Error = anyhow::Error;

    fn try_from(record: ScenarioRecord) -> anyhow::Result<Self> {
        let steps = record
            .steps
            .into_iter()
            .map(|s| {
                let id = s.id;
                ScenarioStepResult::try_from(s).with_context(|| format!("step {id}"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(ScenarioResult { steps })
    }
}

impl TryFrom<StepRecord> for ScenarioStepResult {
    type Error = anyhow::Error;

    fn try_from(s: StepRecord) -> anyhow::Result<Self> {
        let error = s
            .error
            .map(|e| -> anyhow::Result<StepError> {
                let kind = StepErrorKind::from_str(&e.kind)
                    .map_err(|_| anyhow::anyhow!("unknown error kind `{}`", e.kind))?;
                Ok(StepError::new(kind, e.reason))
            })
            .transpose()?;

        let debug = s.debug.map(DebugInfo::try_from).transpose()?;

        Ok(ScenarioStepResult {
            id: s.id,
            name: s.name,
            status_code: s.status_code,
            error,
            durations: s.durations.into_iter().map(|(k, v)| (k, v.0)).collect(),
            debug,
        })
    }
}

impl TryFrom<DebugRecord> for DebugInfo {
    type Error = anyhow::Error;

    fn try_from(d: DebugRecord) -> anyhow::Result<Self> {
        let method = Method::from_bytes(d.method.as_bytes())
            .with_context(|| format!("invalid method `{}`", d.method))?;

        Ok(DebugInfo {
            url: d.url,
            method,
            request_headers: header_map(&d.request_headers).context("request headers")?,
            request_body: Bytes::from(d.request_body),
            response_headers: d
                .response_headers
                .as_ref()
                .map(header_map)
                .transpose()
                .context("response headers")?,
            response_body: d.response_body.map(Bytes::from),
        })
    }
}

fn header_map(raw: &BTreeMap<String, HeaderValues>) -> anyhow::Result<HeaderMap> {
    let mut out = HeaderMap::new();
    for (name, values) in raw {
        let name = HeaderName::from_bytes(name.as_bytes())
            .with_context(|| format!("invalid header name `{name}`"))?;
        let values = match values {
            HeaderValues::One(v) => std::slice::from_ref(v),
            HeaderValues::Many(v) => v.as_slice(),
        };
        for v in values {
            let v = HeaderValue::from_str(v)
                .with_context(|| format!("invalid value for header `{name}`"))?;
            out.append(name.clone(), v);
        }
    }
    Ok(out)
}
