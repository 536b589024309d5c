//! Request handlers and handler chains.
//!
//! A [`Handler`] runs against the per-request [`Context`] and either returns a
//! [`Response`] to render, writes directly through the context, or does neither and lets
//! the next handler in the chain run.
//!
//! A [`HandlerChain`] is the ordered, immutable list of handlers composed for one route at
//! registration time (group middleware first, route handlers last).

use crate::context::Context;
use crate::error::Error;
use crate::response::Response;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// What a handler hands back to its chain
pub type HandlerResult = Result<Option<Response>, Error>;

pub trait Handler: Send + Sync {
    fn call(&self, ctx: &mut Context<'_>) -> HandlerResult;
}

/// Handlers are shared between every route a group registers
pub type BoxHandler = Arc<dyn Handler>;

/// Receives the payload of a panic recovered at the dispatch boundary
pub type PanicHandler = Arc<dyn Fn(&(dyn Any + Send)) + Send + Sync>;

/// Receives per-request errors that cannot be returned to a caller
pub type ErrorHandler = Arc<dyn Fn(&Error) + Send + Sync>;

/// a closure holder which represents any `Fn(&mut Context) -> HandlerResult`
pub struct FnHandler<F> {
    f: F,
}

impl<F> Handler for FnHandler<F>
where
    F: Fn(&mut Context<'_>) -> HandlerResult + Send + Sync,
{
    #[inline]
    fn call(&self, ctx: &mut Context<'_>) -> HandlerResult {
        (self.f)(ctx)
    }
}

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

pub fn handler_fn<F>(f: F) -> BoxHandler
where
    F: Fn(&mut Context<'_>) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(FnHandler { f })
}

/// An ordered list of handlers executed against one context
#[derive(Clone)]
pub struct HandlerChain {
    handlers: Arc<[BoxHandler]>,
}

impl HandlerChain {
    pub fn new<I: IntoIterator<Item = BoxHandler>>(handlers: I) -> Self {
        Self { handlers: handlers.into_iter().collect() }
    }

    pub fn empty() -> Self {
        Self::new([])
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Runs the handlers in order
    ///
    /// Stops at the first handler that returns a response or an error, or as soon as a
    /// handler has completed the context with a direct write.
    pub fn run(&self, ctx: &mut Context<'_>) -> HandlerResult {
        for handler in self.handlers.iter() {
            let response = handler.call(ctx)?;
            if response.is_some() {
                return Ok(response);
            }

            if ctx.is_completed() {
                break;
            }
        }

        Ok(None)
    }
}

impl fmt::Debug for HandlerChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerChain").field("len", &self.handlers.len()).finish()
    }
}

impl FromIterator<BoxHandler> for HandlerChain {
    fn from_iter<T: IntoIterator<Item = BoxHandler>>(iter: T) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::{handler_fn, HandlerChain};
    use crate::context::Context;
    use crate::error::Error;
    use crate::params::Params;
    use crate::response::Response;
    use crate::writer::BufferedWriter;
    use bytes::Bytes;
    use http::{Request, StatusCode};
    use std::sync::{Arc, Mutex};

    fn request() -> Request<Bytes> {
        Request::builder().uri("/").body(Bytes::new()).unwrap()
    }

    #[test]
    fn test_chain_stops_at_first_response() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let (c1, c2, c3) = (Arc::clone(&calls), Arc::clone(&calls), Arc::clone(&calls));

        let chain = HandlerChain::new([
            handler_fn(move |_| {
                c1.lock().unwrap().push(1);
                Ok(None)
            }),
            handler_fn(move |_| {
                c2.lock().unwrap().push(2);
                Ok(Some(Response::text(StatusCode::OK, "done")))
            }),
            handler_fn(move |_| {
                c3.lock().unwrap().push(3);
                Ok(None)
            }),
        ]);

        let mut writer = BufferedWriter::new();
        let mut ctx = Context::new(&mut writer, request(), Params::new());
        let response = chain.run(&mut ctx).unwrap();

        assert!(response.is_some());
        assert_eq!(*calls.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_chain_stops_once_completed() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let (c1, c2) = (Arc::clone(&calls), Arc::clone(&calls));

        let chain = HandlerChain::new([
            handler_fn(move |ctx| {
                c1.lock().unwrap().push(1);
                ctx.write_string(StatusCode::OK, "text/plain", "direct")?;
                Ok(None)
            }),
            handler_fn(move |_| {
                c2.lock().unwrap().push(2);
                Ok(None)
            }),
        ]);

        let mut writer = BufferedWriter::new();
        let mut ctx = Context::new(&mut writer, request(), Params::new());

        assert!(chain.run(&mut ctx).unwrap().is_none());
        assert_eq!(*calls.lock().unwrap(), vec![1]);
    }

    #[test]
    fn test_chain_stops_at_error() {
        let chain = HandlerChain::new([
            handler_fn(|_| Err(Error::ContextClosed)),
            handler_fn(|_| panic!("must not run")),
        ]);

        let mut writer = BufferedWriter::new();
        let mut ctx = Context::new(&mut writer, request(), Params::new());

        assert!(chain.run(&mut ctx).unwrap_err().is_context_closed());
    }

    #[test]
    fn test_empty_chain() {
        let chain = HandlerChain::empty();
        assert!(chain.is_empty());

        let mut writer = BufferedWriter::new();
        let mut ctx = Context::new(&mut writer, request(), Params::new());
        assert!(chain.run(&mut ctx).unwrap().is_none());
    }
}
