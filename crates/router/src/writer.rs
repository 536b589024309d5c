//! The outbound side of a request.
//!
//! [`ResponseWriter`] is the sink a listener hands to [`Router::serve`](crate::Router::serve):
//! headers are mutable until the status is written, the body goes through
//! [`io::Write`]. [`BufferedWriter`] keeps everything in memory and converts into an
//! [`http::Response`] once dispatch returns.

use bytes::{Bytes, BytesMut};
use http::{HeaderMap, Response, StatusCode};
use std::io;
use tracing::warn;

pub trait ResponseWriter: io::Write {
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Sends the status line, only the first call has an effect
    fn write_status(&mut self, status: StatusCode);

    /// True once a status was sent, explicitly or by writing body bytes
    fn status_written(&self) -> bool;
}

/// An in-memory [`ResponseWriter`]
#[derive(Debug, Default)]
pub struct BufferedWriter {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: BytesMut,
}

impl BufferedWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The written status, `200 OK` if nothing was written yet
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_response(self) -> Response<Bytes> {
        let mut response = Response::new(self.body.freeze());
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = self.headers;
        response
    }
}

impl ResponseWriter for BufferedWriter {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_status(&mut self, status: StatusCode) {
        match self.status {
            Some(current) => warn!(%current, ignored = %status, "superfluous write_status call"),
            None => self.status = Some(status),
        }
    }

    fn status_written(&self) -> bool {
        self.status.is_some()
    }
}

impl io::Write for BufferedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // writing a body commits an implicit 200
        self.status.get_or_insert(StatusCode::OK);
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
