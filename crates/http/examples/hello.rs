use std::fmt::Write;
use std::path::Path;

use http::StatusCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;
use verbatim_http::handler::{HandlerError, make_handler};
use verbatim_http::protocol::{FileContent, Request, Response};
use verbatim_http::server::Server;

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let server = match Server::builder().address("127.0.0.1:8080").handler(make_handler(route)).build() {
        Ok(server) => server,
        Err(e) => {
            error!(cause = %e, "build server error");
            return;
        }
    };

    let handle = server.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("stopping");
            handle.stop();
        }
    });

    if let Err(e) = server.start().await {
        error!(cause = %e, "server error");
    }
}

fn route(request: &mut Request<'_>) -> Result<(), HandlerError> {
    match request.uri().path() {
        "/" => hello(request),
        "/headers" => echo_headers(request),
        "/file" => send_manifest(request),
        // the connection answers 404
        _ => Ok(()),
    }
}

fn hello(request: &mut Request<'_>) -> Result<(), HandlerError> {
    let user_agent = request.headers().user_agent().unwrap_or_default();
    let html = format!("<html><body><h1>Hello!</h1><p>{}</p></body></html>", escape(&user_agent));
    request.send_response(Response::html(StatusCode::OK, html))?;
    Ok(())
}

/// Sends the request headers back, each value exactly as it was received.
fn echo_headers(request: &mut Request<'_>) -> Result<(), HandlerError> {
    let mut text = format!("{} {} {}\n", request.method(), request.target(), request.version());
    for (name, value) in request.headers().iter() {
        writeln!(text, "{name}: {value}")?;
    }
    request.send_response(Response::text(StatusCode::OK, text))?;
    Ok(())
}

/// Sends this example's manifest, honoring the first range of a `Range` header.
fn send_manifest(request: &mut Request<'_>) -> Result<(), HandlerError> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml");
    let mut content = FileContent::open(path)?.with_media_type("text/plain;charset=utf-8");

    let range = request.headers().range().ranges().first().copied();
    if let Some(range) = range {
        content = match content.with_range(range) {
            Ok(content) => content,
            Err(e) => {
                request.send_response(Response::text(StatusCode::RANGE_NOT_SATISFIABLE, e.to_string()))?;
                return Ok(());
            }
        };
    }
    request.send_response(Response::file(content))?;
    Ok(())
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
