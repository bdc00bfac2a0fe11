use crate::types::phase;

const KEYS: [(&str, &str); 7] = [
    (phase::DNS, "dns"),
    (phase::CONNECTION, "connection"),
    (phase::TLS, "tls"),
    (phase::REQUEST_WRITE, "request_write"),
    (phase::SERVER_PROCESSING, "server_processing"),
    (phase::RESPONSE_READ, "response_read"),
    (phase::TOTAL, "total"),
];

/// Maps an internal phase name to the field name used in reports.
///
/// Unknown phases are returned unchanged.
pub fn rename(internal: &str) -> &str {
    KEYS.iter()
        .find(|(from, _)| *from == internal)
        .map_or(internal, |&(_, to)| to)
}

/// Whether `internal` is one of the fixed phase names.
pub fn is_known(internal: &str) -> bool {
    KEYS.iter().any(|(from, _)| *from == internal)
}
