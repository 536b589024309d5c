//! A small HTTP request router
//!
//! Routes are compiled from templates such as `/users/:id` or `/files/*`, kept per
//! method in registration order and matched first come first served. Every request runs
//! a chain of handlers against a [`Context`] that carries the captured params, a
//! request scoped storage and the hooks to run once the response is out.
//!
//! # Features
//!
//! - Ordered route matching with named params and trailing wildcards
//! - Groups sharing a path prefix and middleware
//! - At most once response writes with a closed context error afterwards
//! - Text, HTML, XML, JSON and JSONP responses with a `{data}` / `{errors}` envelope
//! - Post response hooks run in reverse registration order
//! - Panic isolation at the dispatch boundary
//! - An HTTP/1 listener on top of hyper
//!
//! # Example
//!
//! ```no_run
//! use http::StatusCode;
//! use micro_router::{handler_fn, Response, Router, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut router = Router::new();
//!
//!     let auth = handler_fn(|ctx| {
//!         if ctx.request().headers().contains_key("authorization") {
//!             return Ok(None);
//!         }
//!         Ok(Some(Response::text(StatusCode::UNAUTHORIZED, "unauthorized")))
//!     });
//!
//!     let mut api = router.group("/api", [auth]);
//!     api.get("/users/:id", [handler_fn(|ctx| {
//!         let id = ctx.param("id").unwrap_or_default().to_owned();
//!         Ok(Some(Response::json(StatusCode::OK, serde_json::json!({ "id": id }))?))
//!     })])?;
//!
//!     Server::builder().router(router).address("127.0.0.1:8080").build()?.start().await?;
//!     Ok(())
//! }
//! ```

mod context;
mod error;
mod group;
mod handler;
mod params;
mod pattern;
mod route;
mod router;
mod utils;
mod writer;

pub mod response;
pub mod server;
pub mod upgrader;

pub use context::{Context, Hook, Storage};
pub use error::{Error, PatternError};
pub use group::Group;
pub use handler::{handler_fn, BoxHandler, ErrorHandler, FnHandler, Handler, HandlerChain, HandlerResult, PanicHandler};
pub use params::{Param, Params};
pub use pattern::{Pattern, Segment};
pub use response::{decode_envelope, Envelope, JsonPayload, Response};
pub use route::Route;
pub use router::{Dispatch, RouteMatch, Router};
pub use server::{Config, Server, ServerBuilder, ServerError};
pub use upgrader::https_upgrader;
pub use writer::{BufferedWriter, ResponseWriter};
