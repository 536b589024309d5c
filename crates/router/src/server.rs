//! An HTTP/1 listener driving a [`Router`].
//!
//! Each accepted connection is served by `hyper` on its own task. A request body is
//! buffered completely, then the synchronous [`Router::serve`] runs on tokio's blocking
//! pool against a [`BufferedWriter`], whose content becomes the hyper response.
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
//!     router.get("/hello/:name", [handler_fn(|ctx| {
//!         let name = ctx.param("name").unwrap_or("world").to_owned();
//!         Ok(Some(Response::text(StatusCode::OK, format!("hello {name}"))))
//!     })])?;
//!
//!     let server = Server::builder().router(router).address("127.0.0.1:8080").build()?;
//!     server.start().await?;
//!     Ok(())
//! }
//! ```

use crate::router::Router;
use crate::writer::BufferedWriter;
use bytes::Bytes;
use http::{Request, Response, StatusCode};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use std::convert::Infallible;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// hyper refuses read buffers smaller than this
const MIN_BUF_SIZE: usize = 8192;

/// Listener settings, never seen by the router itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// How long a connection may take to send the request headers
    pub read_timeout: Duration,
    pub max_header_bytes: usize,
    /// Larger request bodies are answered with `413 Payload Too Large`
    pub max_body_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(5 * 60),
            max_header_bytes: 16 * 1024,
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("router must be set")]
    MissingRouter,
    #[error("address must be set")]
    MissingAddress,
    #[error("invalid address: {0}")]
    InvalidAddress(#[source] io::Error),
    #[error("bind server error: {0}")]
    Bind(#[source] io::Error),
}

#[derive(Debug)]
pub struct ServerBuilder {
    router: Option<Router>,
    address: Option<io::Result<Vec<SocketAddr>>>,
    config: Config,
}

impl ServerBuilder {
    fn new() -> Self {
        Self { router: None, address: None, config: Config::default() }
    }

    pub fn address<A: ToSocketAddrs>(mut self, address: A) -> Self {
        self.address = Some(address.to_socket_addrs().map(|addrs| addrs.collect()));
        self
    }

    pub fn router(mut self, router: Router) -> Self {
        self.router = Some(router);
        self
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Server, ServerError> {
        let router = self.router.ok_or(ServerError::MissingRouter)?;
        let address = self.address.ok_or(ServerError::MissingAddress)?.map_err(ServerError::InvalidAddress)?;
        if address.is_empty() {
            return Err(ServerError::InvalidAddress(io::Error::new(
                io::ErrorKind::InvalidInput,
                "address resolved to nothing",
            )));
        }

        Ok(Server { router: Arc::new(router), address, config: self.config })
    }
}

#[derive(Debug)]
pub struct Server {
    router: Arc<Router>,
    address: Vec<SocketAddr>,
    config: Config,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Serves until the process ends
    pub async fn start(self) -> Result<(), ServerError> {
        self.serve_until(std::future::pending()).await
    }

    /// Serves until `shutdown` resolves
    ///
    /// Connections already accepted keep running their in-flight requests.
    pub async fn serve_until<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
        if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
            debug!(cause = %e, "keeping the installed tracing subscriber");
        }

        let listener = TcpListener::bind(self.address.as_slice()).await.map_err(|e| {
            error!(cause = %e, "bind server error");
            ServerError::Bind(e)
        })?;
        info!(address = ?self.address, "start listening");

        self.serve_on(listener, shutdown).await;
        Ok(())
    }

    /// Accepts connections from an already bound `listener` until `shutdown` resolves
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let (tcp_stream, remote_addr) = tokio::select! {
                () = &mut shutdown => {
                    info!("shutdown requested, stop accepting connections");
                    return;
                }
                accepted = listener.accept() => match accepted {
                    Ok(stream_and_addr) => stream_and_addr,
                    Err(e) => {
                        warn!(cause = %e, "failed to accept");
                        continue;
                    }
                },
            };

            let router = Arc::clone(&self.router);
            let config = self.config;

            tokio::spawn(async move {
                let service =
                    service_fn(move |request| dispatch(Arc::clone(&router), request, config.max_body_bytes));
                let io = TokioIo::new(tcp_stream);

                let result = http1::Builder::new()
                    .timer(TokioTimer::new())
                    .header_read_timeout(config.read_timeout)
                    .max_buf_size(config.max_header_bytes.max(MIN_BUF_SIZE))
                    .serve_connection(io, service)
                    .await;

                match result {
                    Ok(()) => debug!(%remote_addr, "connection closed"),
                    Err(e) => warn!(%remote_addr, cause = %e, "connection closed with error"),
                }
            });
        }
    }
}

async fn dispatch(
    router: Arc<Router>,
    request: Request<Incoming>,
    max_body_bytes: usize,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = request.into_parts();
    let body = match Limited::new(body, max_body_bytes).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.is::<LengthLimitError>() => {
            warn!(limit = max_body_bytes, "request body too large");
            return Ok(empty(StatusCode::PAYLOAD_TOO_LARGE));
        }
        Err(e) => {
            warn!(cause = %e, "failed to read request body");
            return Ok(empty(StatusCode::BAD_REQUEST));
        }
    };

    let request = Request::from_parts(parts, body);
    let served = tokio::task::spawn_blocking(move || {
        let mut writer = BufferedWriter::new();
        router.serve(&mut writer, request);
        writer.into_response()
    })
    .await;

    match served {
        Ok(response) => Ok(response.map(Full::new)),
        Err(e) => {
            error!(cause = %e, "dispatch task failed");
            Ok(empty(StatusCode::INTERNAL_SERVER_ERROR))
        }
    }
}

fn empty(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

#[cfg(test)]
mod tests {
    use super::{Config, Server, ServerError};
    use crate::handler::handler_fn;
    use crate::response::Response;
    use crate::router::Router;
    use http::StatusCode;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::oneshot;

    fn router() -> Router {
        let mut router = Router::new();
        router
            .get(
                "/hello/:name",
                [handler_fn(|ctx| {
                    let name = ctx.param("name").unwrap_or_default().to_owned();
                    Ok(Some(Response::text(StatusCode::OK, format!("hello {name}"))))
                })],
            )
            .unwrap();
        router
            .post(
                "/echo",
                [handler_fn(|ctx| {
                    let body: serde_json::Value = ctx.bind()?;
                    Ok(Some(Response::json(StatusCode::CREATED, body)?))
                })],
            )
            .unwrap();
        router
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.read_timeout, Duration::from_secs(300));
        assert_eq!(config.max_header_bytes, 16384);
        assert_eq!(config.max_body_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_builder_errors() {
        let err = Server::builder().address("127.0.0.1:0").build().unwrap_err();
        assert!(matches!(err, ServerError::MissingRouter));

        let err = Server::builder().router(Router::new()).build().unwrap_err();
        assert!(matches!(err, ServerError::MissingAddress));

        let err = Server::builder().router(Router::new()).address("not an address").build().unwrap_err();
        assert!(matches!(err, ServerError::InvalidAddress(_)));

        let server = Server::builder()
            .router(Router::new())
            .address("127.0.0.1:0")
            .config(Config { read_timeout: Duration::from_secs(1), ..Config::default() })
            .build()
            .unwrap();
        assert_eq!(server.config().read_timeout, Duration::from_secs(1));
    }

    async fn roundtrip(addr: std::net::SocketAddr, raw: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(raw.as_bytes()).await.unwrap();

        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn test_serve_requests() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = Server::builder().router(router()).address(addr).build().unwrap();

        let (stop, stopped) = oneshot::channel::<()>();
        let serving = tokio::spawn(server.serve_on(listener, async move {
            let _ = stopped.await;
        }));

        let response = roundtrip(addr, "GET /hello/josh HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.contains("content-type: text/plain"));
        assert!(response.ends_with("hello josh"));

        let body = r#"{"n":1}"#;
        let request = format!(
            "POST /echo HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let response = roundtrip(addr, &request).await;
        assert!(response.starts_with("HTTP/1.1 201 Created"));
        assert!(response.ends_with(r#"{"data":{"n":1}}"#));

        let response = roundtrip(addr, "GET /missing HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 404 Not Found"));
        assert!(response.ends_with("404, not found"));

        stop.send(()).unwrap();
        serving.await.unwrap();
    }

    #[tokio::test]
    async fn test_body_over_limit_is_rejected() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let config = Config { max_body_bytes: 8, ..Config::default() };
        let server = Server::builder().router(router()).address(addr).config(config).build().unwrap();

        let (stop, stopped) = oneshot::channel::<()>();
        let serving = tokio::spawn(server.serve_on(listener, async move {
            let _ = stopped.await;
        }));

        let body = r#"{"name":"longer than eight"}"#;
        let request = format!(
            "POST /echo HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let response = roundtrip(addr, &request).await;
        assert!(response.starts_with("HTTP/1.1 413 Payload Too Large"));

        let small = r#"{"n":1}"#;
        let request = format!(
            "POST /echo HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{small}",
            small.len()
        );
        let response = roundtrip(addr, &request).await;
        assert!(response.starts_with("HTTP/1.1 201 Created"));

        stop.send(()).unwrap();
        serving.await.unwrap();
    }
}
