//! A router sending every plain HTTP request to its HTTPS counterpart.

use crate::context::Context;
use crate::error::Error;
use crate::handler::{handler_fn, HandlerResult};
use crate::response::Response;
use crate::router::Router;
use http::header::HOST;
use http::StatusCode;

/// Builds a router answering every `GET` with a `301` to the same host, path and query on
/// `https://host:port`
///
/// Serve it on the plain HTTP port next to the TLS listener.
pub fn https_upgrader(port: u16) -> Result<Router, Error> {
    let mut router = Router::new();
    router.get("/*", [handler_fn(move |ctx| upgrade(ctx, port))])?;
    Ok(router)
}

fn upgrade(ctx: &mut Context<'_>, port: u16) -> HandlerResult {
    let request = ctx.request();
    let host = request
        .headers()
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| request.uri().host());

    let Some(host) = host else {
        return Ok(Some(Response::text(StatusCode::BAD_REQUEST, "400, missing host")));
    };

    // drop any port the client used
    let hostname = host.split(':').next().unwrap_or(host);
    let path_and_query = request.uri().path_and_query().map_or("/", |pq| pq.as_str());

    let location = format!("https://{hostname}:{port}{path_and_query}");
    Ok(Some(Response::redirect(StatusCode::MOVED_PERMANENTLY, location)))
}
