//! Per-request state handed to every handler of a chain.
//!
//! A [`Context`] owns the inbound request, the captured [`Params`], a string scratch
//! [`Storage`] shared by the handlers of the chain, and the hooks registered while the
//! chain runs. It borrows the outbound [`ResponseWriter`] for the duration of dispatch.
//!
//! Writes are at most once: the first successful write or redirect completes the
//! context, every later write returns [`Error::ContextClosed`] without touching the
//! response that was already sent.

use crate::error::Error;
use crate::params::Params;
use crate::response::{Envelope, JsonPayload, Response};
use crate::utils::ensure;
use crate::writer::ResponseWriter;
use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE, LOCATION};
use http::{HeaderValue, Method, Request, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Read};
use tracing::warn;

/// Request scoped key/value scratch space
pub type Storage = HashMap<String, String>;

/// A callback run after the response has been rendered
///
/// Hooks run last registered first and receive the final status code.
pub type Hook = Box<dyn FnOnce(StatusCode, &mut Context<'_>)>;

#[derive(Debug, Deserialize)]
struct RedirectQuery {
    #[serde(default)]
    redirect: Option<String>,
}

pub struct Context<'w> {
    request: Request<Bytes>,
    writer: &'w mut dyn ResponseWriter,
    params: Params,
    storage: Storage,
    hooks: Vec<Hook>,
    completed: bool,
    status: StatusCode,
}

impl<'w> Context<'w> {
    pub fn new(writer: &'w mut dyn ResponseWriter, request: Request<Bytes>, params: Params) -> Self {
        Self {
            request,
            writer,
            params,
            storage: Storage::new(),
            hooks: Vec::new(),
            completed: false,
            status: StatusCode::OK,
        }
    }

    /// Returns the value of the path param named `key`
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.by_name(key)
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Retrieves a value from the context storage
    pub fn get(&self, key: &str) -> Option<&str> {
        self.storage.get(key).map(String::as_str)
    }

    /// Sets a value into the context storage
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.storage.insert(key.into(), value.into());
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Adds a hook to be run once the response has been rendered
    pub fn add_hook<F>(&mut self, hook: F)
    where
        F: FnOnce(StatusCode, &mut Context<'_>) + 'static,
    {
        self.hooks.push(Box::new(hook));
    }

    pub fn request(&self) -> &Request<Bytes> {
        &self.request
    }

    /// The raw outbound writer
    ///
    /// Writing through it bypasses completion tracking, handlers doing so should return
    /// [`Response::adopt`] so the dispatcher leaves the response alone.
    pub fn writer(&mut self) -> &mut dyn ResponseWriter {
        &mut *self.writer
    }

    #[inline]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// True once a response has started, through this context or the raw writer
    pub(crate) fn is_sent(&self) -> bool {
        self.completed || self.writer.status_written()
    }

    /// The status written so far, `200 OK` while nothing has been written
    #[inline]
    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    /// Writes a byte body with the given status and content type
    pub fn write(&mut self, status: StatusCode, content_type: &str, body: &[u8]) -> Result<(), Error> {
        ensure!(!self.completed, Error::ContextClosed);

        let content_type = HeaderValue::from_str(content_type)?;
        if self.intercept(status)? {
            return Ok(());
        }

        self.commit(status, Some(content_type));
        self.writer.write_all(body)?;
        Ok(())
    }

    pub fn write_string(&mut self, status: StatusCode, content_type: &str, body: &str) -> Result<(), Error> {
        self.write(status, content_type, body.as_bytes())
    }

    /// Copies everything `reader` yields into the response body
    pub fn write_reader<R: Read>(&mut self, status: StatusCode, content_type: &str, mut reader: R) -> Result<(), Error> {
        ensure!(!self.completed, Error::ContextClosed);

        let content_type = HeaderValue::from_str(content_type)?;
        if self.intercept(status)? {
            return Ok(());
        }

        self.commit(status, Some(content_type));
        io::copy(&mut reader, &mut *self.writer)?;
        Ok(())
    }

    /// Writes `payload` wrapped in the JSON envelope
    ///
    /// The envelope is validated before anything is sent, an invalid payload leaves the
    /// context open.
    pub fn write_json(&mut self, status: StatusCode, payload: impl Into<JsonPayload>) -> Result<(), Error> {
        ensure!(!self.completed, Error::ContextClosed);

        let body = serde_json::to_vec(&Envelope::for_status(status, payload.into())?)?;
        if self.intercept(status)? {
            return Ok(());
        }

        self.commit(status, Some(HeaderValue::from_static("application/json")));
        self.writer.write_all(&body)?;
        Ok(())
    }

    pub fn write_no_content(&mut self) -> Result<(), Error> {
        ensure!(!self.completed, Error::ContextClosed);

        if self.intercept(StatusCode::NO_CONTENT)? {
            return Ok(());
        }

        self.commit(StatusCode::NO_CONTENT, None);
        Ok(())
    }

    /// Redirects the client to `destination`
    pub fn redirect(&mut self, status: StatusCode, destination: &str) -> Result<(), Error> {
        ensure!(!self.completed, Error::ContextClosed);
        self.send_redirect(status, destination)
    }

    /// Renders a [`Response`] through this context
    ///
    /// Redirects become a `Location` header plus their status. Any other variant is
    /// written like the matching `write*` call. [`Response::Adopt`] renders nothing.
    pub fn respond(&mut self, response: &Response) -> Result<(), Error> {
        if response.is_adopt() {
            return Ok(());
        }

        ensure!(!self.completed, Error::ContextClosed);

        if let Some(location) = response.location() {
            return self.redirect(response.status_code(), location);
        }

        let status = response.status_code();
        let content_type =
            response.content_type().map(|content_type| HeaderValue::from_str(content_type.as_ref())).transpose()?;

        // encode before committing so an encoder failure leaves the context open
        let mut body = Vec::new();
        response.write_to(&mut body)?;

        if self.intercept(status)? {
            return Ok(());
        }

        self.commit(status, content_type);
        self.writer.write_all(&body)?;
        Ok(())
    }

    /// Deserializes the request body according to its content type
    ///
    /// `application/x-www-form-urlencoded` bodies are decoded as forms, anything else as JSON.
    pub fn bind<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let is_form = self
            .request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with(mime::APPLICATION_WWW_FORM_URLENCODED.as_ref()));

        if is_form { self.bind_form() } else { self.bind_json() }
    }

    pub fn bind_json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(serde_json::from_slice(self.request.body())?)
    }

    pub fn bind_form<T: DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(serde_urlencoded::from_bytes(self.request.body())?)
    }

    /// Runs the registered hooks, last registered first
    pub(crate) fn process_hooks(&mut self) {
        let status = self.status;
        let hooks = std::mem::take(&mut self.hooks);
        for hook in hooks.into_iter().rev() {
            hook(status, self);
        }
    }

    /// Drops the request body once the response is out
    pub(crate) fn release_body(&mut self) {
        *self.request.body_mut() = Bytes::new();
    }

    /// Applies redirect interception to a write on an open context
    ///
    /// Returns true if the write was turned into a redirect.
    fn intercept(&mut self, status: StatusCode) -> Result<bool, Error> {
        match self.redirect_target(status) {
            Some(destination) => self.send_redirect(StatusCode::FOUND, &destination).map(|()| true),
            None => Ok(false),
        }
    }

    fn commit(&mut self, status: StatusCode, content_type: Option<HeaderValue>) {
        if let Some(content_type) = content_type {
            self.writer.headers_mut().insert(CONTENT_TYPE, content_type);
        }

        self.writer.write_status(status);
        self.status = status;
        self.completed = true;
    }

    fn send_redirect(&mut self, status: StatusCode, destination: &str) -> Result<(), Error> {
        let location = HeaderValue::from_str(destination)?;
        self.writer.headers_mut().append(LOCATION, location);
        self.commit(status, None);
        Ok(())
    }

    /// Browser form posts may ask to be sent elsewhere on success
    ///
    /// Applies to 2xx writes of non GET requests (or 204 writes of any request) whose first
    /// accepted type is `text/html` and whose query carries a non empty `redirect`.
    fn redirect_target(&self, status: StatusCode) -> Option<String> {
        if !status.is_success() {
            return None;
        }

        if self.request.method() == Method::GET && status != StatusCode::NO_CONTENT {
            return None;
        }

        let first_accept = self.request.headers().get(ACCEPT)?.to_str().ok()?.split(',').next()?.trim();
        if first_accept != mime::TEXT_HTML.as_ref() {
            return None;
        }

        let query = self.request.uri().query()?;
        match serde_urlencoded::from_str::<RedirectQuery>(query) {
            Ok(RedirectQuery { redirect }) => redirect.filter(|target| !target.is_empty()),
            Err(e) => {
                warn!(cause = %e, query, "unable to parse redirect query");
                None
            }
        }
    }
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("method", self.request.method())
            .field("uri", self.request.uri())
            .field("params", &self.params)
            .field("storage", &self.storage)
            .field("hooks", &self.hooks.len())
            .field("completed", &self.completed)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}
