//! # Wire Codec
//!
//! Decoding of raw payloads into validated calls and encoding of response
//! sets into the final body.
//!
//! Decoding keeps per-item granularity once the payload is known to be
//! well-formed JSON: a broken batch element becomes an `Err` item in place,
//! its siblings are still decoded. A payload of exactly one item is returned
//! unwrapped, and encoding mirrors this: one response is written as a bare
//! object, never as a one-element array.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{DecodeError, RpcError};
use crate::notification::JsonRpcNotification;
use crate::request::{BatchRequest, Call, CallItem, Deserialized, JsonRpcRequest, RequestParams};
use crate::types::{JsonRpcVersion, RequestId};

/// Nesting allowed for a batch of call objects with flat params:
/// batch array, call object, params container, one value level.
pub const BASE_DEPTH: usize = 4;

/// Ceiling for the nesting limit, kept below the JSON parser's own
/// recursion limit of 128
pub const MAX_DEPTH: usize = 126;

/// Body sent when a response set cannot be encoded
pub const SERIALIZATION_FALLBACK: &str = r#"{"jsonrpc":"2.0","error":{"code":-32099,"message":"Error serializing response."},"id":null}"#;

const MEMBERS: [&str; 4] = ["id", "jsonrpc", "method", "params"];

/// JSON codec for calls and responses
pub struct JsonSerializer;

impl JsonSerializer {
    /// Decode a payload into one call item or a batch of them.
    ///
    /// `params_depth` extends the nesting limit beyond [`BASE_DEPTH`], up to
    /// [`MAX_DEPTH`].
    /// Errors returned here concern the payload as a whole; per-call
    /// validation failures are carried as `Err` items instead.
    pub fn deserialize_calls(body: &[u8], params_depth: usize) -> Result<Deserialized, RpcError> {
        let value = Self::decode(body, BASE_DEPTH.saturating_add(params_depth))?;

        let items: Vec<CallItem> = match value {
            Value::Object(call) => vec![Self::deserialize_call(call)],
            Value::Array(elements) => elements
                .into_iter()
                .map(|element| match element {
                    Value::Object(call) => Self::deserialize_call(call),
                    _ => Err(RpcError::invalid_request("Invalid Request")),
                })
                .collect(),
            _ => {
                return Err(RpcError::invalid_request(
                    "Invalid Request: Expected Request object or array of Request objects.",
                ));
            }
        };

        debug!(items = items.len(), "decoded JSON-RPC payload");

        let mut items = items.into_iter();
        match (items.next(), items.next()) {
            (None, _) => Err(RpcError::invalid_request(
                "Invalid Request: Expected at least one valid Request or Notification.",
            )),
            (Some(single), None) => Ok(Deserialized::Single(single)),
            (Some(first), Some(second)) => {
                let calls: Vec<CallItem> = [first, second].into_iter().chain(items).collect();
                BatchRequest::new(calls).map(Deserialized::Batch).ok_or_else(|| {
                    RpcError::invalid_request(
                        "Invalid Request: Expected at least one valid Request or Notification.",
                    )
                })
            }
        }
    }

    /// Validate one call object.
    ///
    /// Members are checked in the order `id`, `jsonrpc`, `method`, `params`,
    /// then extra keys. Failures after the id is known carry it as their
    /// correlation id.
    pub fn deserialize_call(call: Map<String, Value>) -> CallItem {
        let (mut is_notification, id, presumed_v1) = match call.get("id") {
            None => (true, None, false),
            Some(Value::Null) => (true, None, true),
            Some(value) => match RequestId::from_value(value) {
                Some(id) => (false, Some(id), false),
                None => {
                    return Err(RpcError::invalid_request(
                        "Invalid Request: Expected member \"id\" to be NULL, a string, an integer or not defined.",
                    ));
                }
            },
        };
        let fail = |message: &str| {
            Err(RpcError::invalid_request(message).with_correlation_id(id.clone()))
        };

        let version = match call.get("jsonrpc") {
            None | Some(Value::Null) => JsonRpcVersion::V1_0,
            Some(Value::String(v)) if v == "2.0" => {
                // 2.0 defines a notification only by an omitted id; an explicit
                // null id is a request whose id is null
                if presumed_v1 {
                    is_notification = false;
                }
                JsonRpcVersion::V2_0
            }
            Some(_) => return fail("Invalid Request: Expected JSON-RPC Version 1.0 or 2.0."),
        };

        let method = match call.get("method") {
            None | Some(Value::Null) => {
                return fail("Invalid Request: Missing required member \"method\".");
            }
            Some(Value::String(method)) => method.clone(),
            Some(_) => return fail("Invalid Request: Expected member \"method\" to be string."),
        };

        let params = match call.get("params") {
            None | Some(Value::Null) => RequestParams::default(),
            Some(Value::Array(params)) => RequestParams::Array(params.clone()),
            Some(Value::Object(_)) if version.is_v1() => {
                return fail("Invalid Request: Expected member \"params\" to be array.");
            }
            Some(Value::Object(params)) => RequestParams::Object(params.clone()),
            Some(_) => {
                return fail(
                    "Invalid Request: Expected member \"params\" to be array, object or not defined.",
                );
            }
        };

        if call.keys().any(|key| !MEMBERS.contains(&key.as_str())) {
            return fail("Invalid Request: Unexpected members.");
        }

        Ok(if is_notification {
            Call::Notification(JsonRpcNotification {
                version,
                method,
                params,
            })
        } else {
            Call::Request(JsonRpcRequest {
                version,
                method,
                params,
                id,
            })
        })
    }

    /// Encode a response set into the body to send.
    ///
    /// More than one response gives an array, exactly one gives the bare
    /// envelope and none gives an empty string (no body at all). If encoding
    /// fails the output is replaced by [`SERIALIZATION_FALLBACK`].
    pub fn serialize_responses<T: Serialize>(responses: &[T]) -> String {
        let encoded = match responses {
            [] => return String::new(),
            [single] => serde_json::to_string(single),
            batch => serde_json::to_string(batch),
        };

        encoded.unwrap_or_else(|err| {
            warn!(error = %err, "failed to encode JSON-RPC responses, sending fallback error");
            SERIALIZATION_FALLBACK.to_string()
        })
    }

    fn decode(body: &[u8], max_depth: usize) -> Result<Value, RpcError> {
        let text = std::str::from_utf8(body).map_err(|e| {
            debug!(error = %e, "rejecting payload with invalid encoding");
            DecodeError::from(e)
        })?;
        let limit = max_depth.min(MAX_DEPTH);

        // The first problem in wire order wins: an anomaly only counts when
        // the parser got past it before failing.
        let (parsed, reached) = match serde_json::from_str::<Value>(text) {
            Ok(value) => (Ok(value), text.len()),
            Err(err) => {
                let reached = error_offset(text, &err).saturating_sub(1);
                (Err(err), reached)
            }
        };

        match find_anomaly(text.as_bytes(), limit) {
            Some((offset, Anomaly::TooDeep)) if offset < reached => {
                debug!(limit, offset, "rejecting payload exceeding nesting limit");
                Err(DecodeError::DepthExceeded { limit }.into())
            }
            Some((offset, Anomaly::LoneSurrogate)) if offset < reached => {
                debug!(offset, "rejecting payload with unpaired surrogate escape");
                Err(DecodeError::LoneSurrogate { offset }.into())
            }
            _ => parsed.map_err(|e| DecodeError::from(e).into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anomaly {
    TooDeep,
    LoneSurrogate,
}

/// Byte offset just past the position a parse error points at
fn error_offset(text: &str, err: &serde_json::Error) -> usize {
    let line_start: usize = text
        .split_inclusive('\n')
        .take(err.line().saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + err.column()).min(text.len())
}

/// First offset in `text` where container nesting goes deeper than `limit`
/// or an unpaired UTF-16 surrogate escape starts. String contents never
/// count towards nesting.
fn find_anomaly(text: &[u8], limit: usize) -> Option<(usize, Anomaly)> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut high_surrogate: Option<usize> = None;
    let mut i = 0;

    while i < text.len() {
        let byte = text[i];
        if !in_string {
            match byte {
                b'"' => in_string = true,
                b'[' | b'{' => {
                    depth += 1;
                    if depth > limit {
                        return Some((i, Anomaly::TooDeep));
                    }
                }
                b']' | b'}' => depth = depth.saturating_sub(1),
                _ => {}
            }
            i += 1;
            continue;
        }

        match (byte, utf16_escape(&text[i..])) {
            (b'\\', Some(0xD800..=0xDBFF)) => {
                if let Some(start) = high_surrogate.replace(i) {
                    return Some((start, Anomaly::LoneSurrogate));
                }
                i += 6;
                continue;
            }
            (b'\\', Some(0xDC00..=0xDFFF)) => {
                if high_surrogate.take().is_none() {
                    return Some((i, Anomaly::LoneSurrogate));
                }
                i += 6;
                continue;
            }
            _ => {}
        }
        if let Some(start) = high_surrogate {
            return Some((start, Anomaly::LoneSurrogate));
        }
        match byte {
            b'\\' => i += 2,
            b'"' => {
                in_string = false;
                i += 1;
            }
            _ => i += 1,
        }
    }
    high_surrogate.map(|start| (start, Anomaly::LoneSurrogate))
}

/// Code unit of a `\uXXXX` escape at the start of `escape`
fn utf16_escape(escape: &[u8]) -> Option<u16> {
    let digits = escape.strip_prefix(b"\\u")?.get(..4)?;
    if !digits.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    u16::from_str_radix(std::str::from_utf8(digits).ok()?, 16).ok()
}
