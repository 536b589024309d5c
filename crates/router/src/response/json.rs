//! The JSON envelope.
//!
//! Successful responses wrap their payload as `{"data": ...}`, error responses carry an
//! aggregated list as `{"errors": ["...", ...]}`. The payload kind is explicit: callers
//! build a [`JsonPayload`] from data, from one error or from a list of errors.

use crate::error::Error;
use http::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Display;

/// The value handed to a JSON or JSONP response
#[derive(Debug, Clone, PartialEq)]
pub enum JsonPayload {
    Data(Value),
    Errors(Vec<String>),
}

impl JsonPayload {
    /// Serializes any value into a data payload
    pub fn data<T: Serialize + ?Sized>(value: &T) -> Result<Self, Error> {
        Ok(Self::Data(serde_json::to_value(value)?))
    }

    pub fn error<E: Display + ?Sized>(err: &E) -> Self {
        Self::Errors(vec![err.to_string()])
    }

    pub fn errors<I, E>(errs: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Display,
    {
        Self::Errors(errs.into_iter().map(|e| e.to_string()).collect())
    }
}

impl From<Value> for JsonPayload {
    fn from(value: Value) -> Self {
        Self::Data(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
}

impl Envelope {
    /// Builds the envelope of a JSON response with the given status
    ///
    /// Below 400 every payload is data, error messages included. From 400 on only
    /// error payloads are accepted.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidErrorPayload`] when an error status is paired with a data payload.
    pub fn for_status(status: StatusCode, payload: JsonPayload) -> Result<Self, Error> {
        match (status.as_u16() < 400, payload) {
            (true, JsonPayload::Data(value)) => Ok(Self::with_data(value)),
            (true, JsonPayload::Errors(messages)) => Ok(Self::with_data(Value::from(messages))),
            (false, JsonPayload::Errors(messages)) => Ok(Self::with_errors(messages)),
            (false, JsonPayload::Data(_)) => Err(Error::InvalidErrorPayload { status }),
        }
    }

    /// Builds an envelope from the payload kind alone, no status is involved
    pub fn from_payload(payload: JsonPayload) -> Self {
        match payload {
            JsonPayload::Data(value) => Self::with_data(value),
            JsonPayload::Errors(messages) => Self::with_errors(messages),
        }
    }

    fn with_data(value: Value) -> Self {
        Self { data: Some(value), errors: Vec::new() }
    }

    fn with_errors(messages: Vec<String>) -> Self {
        Self { data: None, errors: messages }
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Returns the data, or every carried error message as [`Error::Envelope`]
    pub fn into_result(self) -> Result<Option<Value>, Error> {
        if self.errors.is_empty() { Ok(self.data) } else { Err(Error::envelope(self.errors)) }
    }
}

/// Decodes a JSON envelope produced by this crate
///
/// Returns `Ok(None)` when the envelope has neither data nor errors.
///
/// # Errors
///
/// [`Error::Envelope`] when the envelope carries errors, [`Error::Json`] when the bytes
/// are not an envelope or the data does not fit `T`.
pub fn decode_envelope<T: DeserializeOwned>(bytes: &[u8]) -> Result<Option<T>, Error> {
    let envelope: Envelope = serde_json::from_slice(bytes)?;
    match envelope.into_result()? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}
