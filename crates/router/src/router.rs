//! The route table and the per-request dispatch boundary.
//!
//! Routes are kept per method in registration order and the first route that matches a
//! path wins, a later and more specific route never shadows an earlier one. The table is
//! filled during a single threaded setup phase and only read afterwards, so a built
//! [`Router`] can be shared between any number of workers without locking.
//!
//! [`Router::serve`] is the entry point a listener calls once per request. Everything the
//! handlers do, hooks included, runs inside one unwind guard: a panic is logged through
//! the panic handler and turned into a fixed 500 response without touching router state.

use crate::context::Context;
use crate::error::Error;
use crate::group::Group;
use crate::handler::{handler_fn, BoxHandler, ErrorHandler, HandlerChain, PanicHandler};
use crate::params::Params;
use crate::pattern::Pattern;
use crate::response::Response;
use crate::route::Route;
use crate::utils::method_route;
use crate::writer::ResponseWriter;
use bytes::Bytes;
use http::{Method, Request, StatusCode};
use percent_encoding::percent_decode_str;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error};

const NOT_FOUND_BODY: &str = "404, not found";
const INTERNAL_ERROR_BODY: &str = "500, internal server error";

pub struct Router {
    routes: HashMap<Method, Vec<Route>>,
    not_found: HandlerChain,
    panic_handler: PanicHandler,
    error_handler: ErrorHandler,
    max_params: usize,
}

/// Result of matching a request line against the route table
#[derive(Debug)]
pub struct RouteMatch<'router> {
    pub chain: &'router HandlerChain,
    pub params: Params,
    /// false when `chain` is the not found chain
    pub matched: bool,
}

/// How a dispatch ended
#[derive(Debug)]
pub enum Dispatch {
    /// The response was rendered and the hooks ran, carries the final status
    Completed(StatusCode),
    /// A handler took over the raw writer, nothing was rendered by the router
    Adopted,
    /// A handler or hook panicked, carries the panic payload
    Panicked(Box<dyn Any + Send>),
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            not_found: HandlerChain::new([default_not_found()]),
            panic_handler: Arc::new(log_panic),
            error_handler: Arc::new(log_error),
            max_params: 0,
        }
    }

    /// Registers a route for `method`
    ///
    /// The handlers form the route's chain in the given order. Routes are tried in the
    /// order they were registered.
    ///
    /// # Errors
    ///
    /// [`Error::Route`] when `pattern` does not compile.
    pub fn handle<I>(&mut self, method: Method, pattern: &str, handlers: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = BoxHandler>,
    {
        let compiled = Pattern::compile(pattern).map_err(|e| Error::route(method.clone(), pattern, e))?;
        let route = Route::new(method.clone(), compiled, HandlerChain::new(handlers));

        self.max_params = self.max_params.max(route.num_params());
        debug!(%method, pattern, "route registered");
        self.routes.entry(method).or_default().push(route);
        Ok(())
    }

    method_route!(get, GET);
    method_route!(put, PUT);
    method_route!(post, POST);
    method_route!(delete, DELETE);
    method_route!(options, OPTIONS);
    method_route!(patch, PATCH);
    method_route!(head, HEAD);

    /// Opens a group rooted at `prefix` whose middleware runs before every route it registers
    pub fn group<I>(&mut self, prefix: &str, handlers: I) -> Group<'_>
    where
        I: IntoIterator<Item = BoxHandler>,
    {
        Group::new(self, prefix, handlers.into_iter().collect())
    }

    /// Replaces the chain run when no route matches
    pub fn set_not_found<I>(&mut self, handlers: I)
    where
        I: IntoIterator<Item = BoxHandler>,
    {
        self.not_found = HandlerChain::new(handlers);
    }

    /// Replaces the callback receiving recovered panic payloads
    pub fn set_panic<F>(&mut self, f: F)
    where
        F: Fn(&(dyn Any + Send)) + Send + Sync + 'static,
    {
        self.panic_handler = Arc::new(f);
    }

    /// Replaces the callback receiving per-request errors
    pub fn set_on_error<F>(&mut self, f: F)
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        self.error_handler = Arc::new(f);
    }

    /// The largest number of params any registered route captures
    #[inline]
    pub fn max_params(&self) -> usize {
        self.max_params
    }

    /// Finds the chain serving `method` and `path`
    ///
    /// Falls back to the not found chain with `matched == false` when the method has no
    /// routes or none of them matches.
    pub fn at(&self, method: &Method, path: &str) -> RouteMatch<'_> {
        let mut params = Params::with_capacity(self.max_params);

        if let Some(routes) = self.routes.get(method) {
            for route in routes {
                if route.match_into(path, &mut params) {
                    return RouteMatch { chain: route.chain(), params, matched: true };
                }
                params.clear();
            }
        }

        RouteMatch { chain: &self.not_found, params, matched: false }
    }

    /// Dispatches one request into `writer`
    ///
    /// Routes are matched against the percent decoded path, so params come back decoded.
    pub fn serve(&self, writer: &mut dyn ResponseWriter, request: Request<Bytes>) -> Dispatch {
        let RouteMatch { chain, params, .. } = {
            let path = percent_decode_str(request.uri().path()).decode_utf8_lossy();
            let route = self.at(request.method(), &path);
            if !route.matched {
                debug!(method = %request.method(), path = %path, "no route matched");
            }
            route
        };

        let mut ctx = Context::new(writer, request, params);
        match panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(chain, &mut ctx))) {
            Ok(dispatch) => dispatch,
            Err(payload) => {
                (self.panic_handler)(&*payload);
                // a handler may have started a raw response before panicking
                if !ctx.is_sent()
                    && let Err(e) = ctx.write_string(StatusCode::INTERNAL_SERVER_ERROR, "text/plain", INTERNAL_ERROR_BODY)
                {
                    (self.error_handler)(&e);
                }
                Dispatch::Panicked(payload)
            }
        }
    }

    fn dispatch(&self, chain: &HandlerChain, ctx: &mut Context<'_>) -> Dispatch {
        match chain.run(ctx) {
            Ok(Some(response)) if response.is_adopt() => return Dispatch::Adopted,
            Ok(Some(response)) => {
                if let Err(e) = ctx.respond(&response) {
                    self.fail(ctx, e);
                }
            }
            Ok(None) => {
                if !ctx.is_completed() {
                    debug!(path = ctx.request().uri().path(), "handler chain finished without a response");
                }
            }
            Err(e) => self.fail(ctx, e),
        }

        ctx.release_body();
        ctx.process_hooks();
        Dispatch::Completed(ctx.status_code())
    }

    /// Reports `err` and answers with a 500 if nothing was sent yet
    fn fail(&self, ctx: &mut Context<'_>, err: Error) {
        (self.error_handler)(&err);

        if !ctx.is_sent()
            && let Err(e) = ctx.write_string(StatusCode::INTERNAL_SERVER_ERROR, "text/plain", INTERNAL_ERROR_BODY)
        {
            (self.error_handler)(&e);
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes)
            .field("not_found", &self.not_found)
            .field("max_params", &self.max_params)
            .finish_non_exhaustive()
    }
}

impl Dispatch {
    pub fn is_panicked(&self) -> bool {
        matches!(self, Self::Panicked(_))
    }
}

fn default_not_found() -> BoxHandler {
    handler_fn(|_| Ok(Some(Response::text(StatusCode::NOT_FOUND, NOT_FOUND_BODY))))
}

fn log_panic(payload: &(dyn Any + Send)) {
    error!(cause = panic_message(payload), "recovered from handler panic");
}

fn log_error(err: &Error) {
    error!(cause = %err, "error serving request");
}

/// Extracts the message of a `panic!` payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non string panic payload")
}
