//! Response variants returned by handlers.
//!
//! Every variant exposes a status code, an optional content type and a way to write its
//! body into any [`io::Write`] sink. Two variants are rendered specially by the
//! dispatcher: [`Response::Redirect`] becomes a `Location` header plus its status, and
//! [`Response::Adopt`] marks that the handler already took over the raw writer.

mod json;

pub use json::{decode_envelope, Envelope, JsonPayload};

use crate::error::Error;
use bytes::Bytes;
use http::StatusCode;
use mime::Mime;
use std::io;

const JSONP_ENDING: &[u8] = b");";

#[derive(Debug, Clone)]
pub enum Response {
    Text { status: StatusCode, body: Bytes },
    Html { status: StatusCode, body: Bytes },
    Xml { status: StatusCode, body: Bytes },
    Json { status: StatusCode, envelope: Envelope },
    Jsonp { callback: String, envelope: Envelope },
    Redirect { status: StatusCode, location: String },
    NoContent,
    Adopt,
}

impl Response {
    pub fn text(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self::Text { status, body: body.into() }
    }

    pub fn html(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self::Html { status, body: body.into() }
    }

    pub fn xml(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self::Xml { status, body: body.into() }
    }

    /// Creates a JSON response, see [`Envelope::for_status`] for the envelope rules
    ///
    /// # Errors
    ///
    /// [`Error::InvalidErrorPayload`] when `status` is 400 or above and the payload is
    /// data instead of errors.
    pub fn json(status: StatusCode, payload: impl Into<JsonPayload>) -> Result<Self, Error> {
        let envelope = Envelope::for_status(status, payload.into())?;
        Ok(Self::Json { status, envelope })
    }

    /// Creates a JSONP response, always `200 OK`
    pub fn jsonp(callback: impl Into<String>, payload: impl Into<JsonPayload>) -> Self {
        Self::Jsonp { callback: callback.into(), envelope: Envelope::from_payload(payload.into()) }
    }

    pub fn redirect(status: StatusCode, location: impl Into<String>) -> Self {
        Self::Redirect { status, location: location.into() }
    }

    pub fn no_content() -> Self {
        Self::NoContent
    }

    /// The marker a handler returns after writing through [`Context::writer`](crate::Context::writer) itself
    pub fn adopt() -> Self {
        Self::Adopt
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Text { status, .. }
            | Self::Html { status, .. }
            | Self::Xml { status, .. }
            | Self::Json { status, .. }
            | Self::Redirect { status, .. } => *status,
            Self::Jsonp { .. } | Self::Adopt => StatusCode::OK,
            Self::NoContent => StatusCode::NO_CONTENT,
        }
    }

    /// The content type, `None` for redirects
    pub fn content_type(&self) -> Option<Mime> {
        match self {
            Self::Text { .. } | Self::NoContent | Self::Adopt => Some(mime::TEXT_PLAIN),
            Self::Html { .. } => Some(mime::TEXT_HTML),
            Self::Xml { .. } => Some(mime::TEXT_XML),
            Self::Json { .. } => Some(mime::APPLICATION_JSON),
            Self::Jsonp { .. } => Some(mime::APPLICATION_JAVASCRIPT),
            Self::Redirect { .. } => None,
        }
    }

    pub fn location(&self) -> Option<&str> {
        match self {
            Self::Redirect { location, .. } => Some(location.as_str()),
            _ => None,
        }
    }

    #[inline]
    pub fn is_adopt(&self) -> bool {
        matches!(self, Self::Adopt)
    }

    /// Writes the body into `w`, returning the number of bytes written
    pub fn write_to<W: io::Write + ?Sized>(&self, w: &mut W) -> Result<u64, Error> {
        match self {
            Self::Text { body, .. } | Self::Html { body, .. } | Self::Xml { body, .. } => {
                w.write_all(body)?;
                Ok(body.len() as u64)
            }
            Self::Json { envelope, .. } => {
                let bytes = serde_json::to_vec(envelope)?;
                w.write_all(&bytes)?;
                Ok(bytes.len() as u64)
            }
            Self::Jsonp { callback, envelope } => {
                // buffered so a failed encode leaves the sink untouched
                let mut buf = Vec::with_capacity(callback.len() + 64);
                buf.extend_from_slice(callback.as_bytes());
                buf.push(b'(');
                serde_json::to_writer(&mut buf, envelope)?;
                buf.extend_from_slice(JSONP_ENDING);

                w.write_all(&buf)?;
                Ok(buf.len() as u64)
            }
            Self::Redirect { .. } | Self::NoContent | Self::Adopt => Ok(0),
        }
    }
}
