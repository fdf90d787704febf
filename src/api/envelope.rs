//! Response envelopes
//!
//! Successful responses wrap their payload as `{request_id, result}`,
//! `{request_id, results}` or `{request_id, jobs_url}`; count responses nest
//! the number as `result.count`. Any status >= 400 carries an error envelope.

use crate::error::{ApiError, Error, ErrorDetail, Result};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub results: Option<Vec<Value>>,
    #[serde(default)]
    pub jobs_url: Option<String>,
}

/// What a successful envelope carries, told apart by presence.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Single(Value),
    Multi(Vec<Value>),
    None,
}

impl Envelope {
    pub fn parse(status: u16, body: &[u8]) -> Result<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body).map_err(|source| Error::Parse { status, source })
    }

    /// Split off the payload. Both `result` and `results` at once is a protocol error.
    pub fn take_payload(&mut self) -> Result<Payload> {
        match (self.result.take(), self.results.take()) {
            (Some(_), Some(_)) => Err(Error::UnexpectedShape(
                "envelope carries both result and results".to_string(),
            )),
            (Some(single), None) => Ok(Payload::Single(single)),
            (None, Some(multi)) => Ok(Payload::Multi(multi)),
            (None, None) => Ok(Payload::None),
        }
    }

    /// `result.count` of a count envelope.
    pub fn count(&self) -> Option<u64> {
        self.result.as_ref()?.get("count")?.as_u64()
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    request_id: String,
    error_type: String,
    #[serde(default)]
    error_message: String,
    #[serde(default)]
    error_details: Vec<ErrorDetail>,
}

/// Decode the error envelope of a >= 400 response.
pub fn parse_error(status: u16, body: &[u8]) -> Error {
    match serde_json::from_slice::<ErrorEnvelope>(body) {
        Ok(envelope) => Error::Api(ApiError {
            status,
            request_id: envelope.request_id,
            error_type: envelope.error_type,
            message: envelope.error_message,
            details: envelope.error_details,
        }),
        Err(source) => Error::Parse { status, source },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_and_multi_are_told_apart() {
        let mut single = Envelope::parse(200, br#"{"request_id":"r1","result":{"id":"a"}}"#).unwrap();
        assert_eq!(single.request_id, "r1");
        assert!(matches!(single.take_payload().unwrap(), Payload::Single(_)));

        let mut multi = Envelope::parse(200, br#"{"request_id":"r2","results":[{"id":"a"}]}"#).unwrap();
        assert!(matches!(multi.take_payload().unwrap(), Payload::Multi(v) if v.len() == 1));
    }

    #[test]
    fn test_null_result_counts_as_absent() {
        let mut env = Envelope::parse(200, br#"{"request_id":"r","result":null,"results":[]}"#).unwrap();
        assert_eq!(env.take_payload().unwrap(), Payload::Multi(vec![]));
    }

    #[test]
    fn test_both_shapes_is_an_error() {
        let mut env = Envelope::parse(200, br#"{"result":{},"results":[]}"#).unwrap();
        assert!(matches!(env.take_payload(), Err(Error::UnexpectedShape(_))));
    }

    #[test]
    fn test_count_and_jobs_url() {
        let env = Envelope::parse(200, br#"{"request_id":"r","result":{"count":7}}"#).unwrap();
        assert_eq!(env.count(), Some(7));

        let accepted = Envelope::parse(202, br#"{"request_id":"r","jobs_url":"/jobs/9"}"#).unwrap();
        assert_eq!(accepted.jobs_url.as_deref(), Some("/jobs/9"));
    }

    #[test]
    fn test_empty_body_is_an_empty_envelope() {
        let env = Envelope::parse(204, b"").unwrap();
        assert!(env.request_id.is_empty());
    }

    #[test]
    fn test_error_envelope_decodes() {
        let body = br#"{"request_id":"r","error_type":"not_found","error_message":"no such app",
            "error_details":[{"code":"not_found","attribute":"app_id"}]}"#;
        let err = parse_error(404, body);
        let api = err.api().expect("api error");
        assert_eq!(api.status, 404);
        assert_eq!(api.is_not_found(), Some("app_id"));
    }

    #[test]
    fn test_malformed_error_body_is_a_parse_error() {
        assert!(matches!(parse_error(502, b"<html>bad gateway</html>"), Error::Parse { status: 502, .. }));
        assert!(matches!(parse_error(500, br#"{"message":"x"}"#), Error::Parse { .. }));
    }

    #[test]
    fn test_malformed_success_body_is_a_parse_error() {
        assert!(matches!(Envelope::parse(200, b"not json"), Err(Error::Parse { status: 200, .. })));
    }
}
