//! oxide-web demo
//!
//! Serves a small demo application over HTTP, or runs single requests
//! through it in-process.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context as _};
use clap::{Parser, Subcommand};
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request as HyperRequest, Response as HyperResponse, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_web::{
    App, AuthMiddleware, Context, Engine, Logger, Method, Recovery, Request, Response, RouteGroup,
    TemplateError, TemplateRenderer, TEXT_PLAIN,
};

/// Dynamic routing and middleware chains, demonstrated.
#[derive(Parser)]
#[command(name = "oxide-web")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the demo application over HTTP/1.
    Serve {
        /// Address to listen on.
        #[arg(short, long, env = "OXIDE_WEB_ADDR", default_value = "127.0.0.1:9999")]
        addr: SocketAddr,
    },

    /// Run one request through the demo application and print the response.
    Dispatch {
        /// Request method, e.g. GET.
        method: String,

        /// Request target, e.g. `/hello?name=ann`.
        target: String,

        /// Request header as `key:value`. May be repeated.
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Request body.
        #[arg(short, long)]
        body: Option<String>,
    },

    /// List the registered route patterns.
    Routes {
        /// Only list routes of this method.
        #[arg(short, long)]
        method: Option<String>,
    },
}

/// Renders the two demo pages without a template engine.
struct DemoPages;

impl TemplateRenderer for DemoPages {
    fn render(&self, name: &str, data: &serde_json::Value) -> Result<String, TemplateError> {
        let field = |key: &str| data[key].as_str().unwrap_or_default().to_string();
        match name {
            "index" => Ok(format!("<h1>{}</h1>", field("title"))),
            "group" => Ok(format!("<h1>group {}</h1>", field("group"))),
            other => Err(TemplateError::NotFound(other.to_string())),
        }
    }
}

/// Logs how long the rest of the chain took for one group.
fn timed(group: &'static str) -> impl Fn(&mut Context) + Send + Sync + 'static {
    move |ctx| {
        let started = Instant::now();
        debug!(group, path = ctx.path(), "entering group");
        ctx.next();
        debug!(group, status = ctx.status(), elapsed = ?started.elapsed(), "leaving group");
    }
}

fn greet(ctx: &mut Context) {
    let body = format!(
        "hello {}, you're at {}\n",
        ctx.param("name").unwrap_or_default(),
        ctx.path()
    );
    ctx.string(200, body);
}

fn login(ctx: &mut Context) {
    let user = ctx.post_form("userName");
    let password = ctx.post_form("passWord");
    ctx.json(200, &json!({ "userName": user, "passWord": password }));
}

fn build_app() -> oxide_web::Result<App> {
    Engine::new()
        .middleware(Logger)
        .middleware(Recovery)
        .renderer(DemoPages)
        .get("/", |ctx| ctx.html(200, "index", &json!({ "title": "oxide-web" })))
        .get("/panic", |ctx| {
            let names = vec!["ann"];
            let index = names.len() + 9;
            ctx.string(200, names[index]);
        })
        .get("/hello", |ctx| {
            let body = format!(
                "Hello {}, here is {}\n",
                ctx.query("name").unwrap_or_default(),
                ctx.path()
            );
            ctx.string(200, body);
        })
        .get("/hello/:name", greet)
        .get("/hello/:name/doc", greet)
        .get("/assets/*filepath", |ctx| {
            let filepath = ctx.param("filepath").unwrap_or_default().to_string();
            ctx.json(200, &json!({ "filepath": filepath }));
        })
        .post("/login", login)
        .put("/put", |ctx| ctx.data(200, "Method: PUT"))
        .group(
            RouteGroup::new("/g1")
                .middleware(timed("g1"))
                .get("/", |ctx| ctx.html(200, "group", &json!({ "group": "g1" })))
                .get("/hello", |ctx| {
                    let body = format!(
                        "Hello {}, here is {}\n",
                        ctx.query("name").unwrap_or_default(),
                        ctx.path()
                    );
                    ctx.string(200, body);
                }),
        )
        .group(
            RouteGroup::new("/g2")
                .middleware(timed("g2"))
                .middleware(AuthMiddleware::new().exclude(&["/g2/assets"]))
                .get("/", |ctx| ctx.html(200, "group", &json!({ "group": "g2" })))
                .get("/hello/:name", greet)
                .get("/assets/:filepath", |ctx| {
                    let filepath = ctx.param("filepath").unwrap_or_default().to_string();
                    ctx.json(200, &json!({ "filepath": filepath }));
                })
                .post("/login", login),
        )
        .build()
}

fn parse_request(
    method: &str,
    target: &str,
    headers: &[String],
    body: Option<String>,
) -> anyhow::Result<Request> {
    let method: Method = method.parse()?;
    let mut request = Request::from_target(method, target);
    for header in headers {
        let Some((key, value)) = header.split_once(':') else {
            bail!("header '{header}' is not in key:value form");
        };
        request = request.header(key.trim(), value.trim());
    }
    if let Some(body) = body {
        request = request.body(body);
    }
    Ok(request)
}

fn print_response(response: &Response) {
    println!("HTTP/1.1 {} {}", response.status, response.status_text());
    let mut headers: Vec<_> = response.headers.iter().collect();
    headers.sort();
    for (key, value) in headers {
        println!("{key}: {value}");
    }
    println!();
    println!("{}", String::from_utf8_lossy(&response.body));
}

async fn handle_request(
    req: HyperRequest<Incoming>,
    app: Arc<App>,
) -> Result<HyperResponse<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();

    let Ok(method) = parts.method.as_str().parse::<Method>() else {
        return Ok(into_hyper(Response::new(405).body("Method Not Allowed")));
    };

    // Convert hyper request to oxide_web Request
    let mut request = Request::new(method, parts.uri.path());
    if let Some(query) = parts.uri.query() {
        request.query = Request::parse_query_string(query);
    }
    for (key, value) in &parts.headers {
        if let Ok(v) = value.to_str() {
            request.headers.insert(key.to_string(), v.to_string());
        }
    }
    request.body = match body.collect().await {
        Ok(collected) => collected.to_bytes().to_vec(),
        Err(err) => {
            warn!(path = parts.uri.path(), error = %err, "failed to read request body");
            return Ok(into_hyper(bad_request()));
        }
    };

    Ok(into_hyper(app.dispatch(request)))
}

fn bad_request() -> Response {
    Response::new(400)
        .header("Content-Type", TEXT_PLAIN)
        .body("Bad Request")
}

fn into_hyper(response: Response) -> HyperResponse<Full<Bytes>> {
    let mut builder = HyperResponse::builder().status(
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
    );
    for (key, value) in &response.headers {
        builder = builder.header(key.as_str(), value.as_str());
    }

    builder
        .body(Full::new(Bytes::from(response.body)))
        .unwrap_or_else(|err| {
            warn!(error = %err, "invalid response, sending 500");
            let mut fallback =
                HyperResponse::new(Full::new(Bytes::from_static(b"Internal Server Error")));
            *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
}

async fn serve(app: Arc<App>, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "listening");

    loop {
        let (stream, peer) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let app = Arc::clone(&app);

        tokio::task::spawn(async move {
            let service = service_fn(move |req| handle_request(req, Arc::clone(&app)));
            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                warn!(%peer, error = %err, "error serving connection");
            }
        });
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let app = build_app()?;

    match cli.command {
        Commands::Serve { addr } => serve(Arc::new(app), addr).await?,

        Commands::Dispatch {
            method,
            target,
            headers,
            body,
        } => {
            let request = parse_request(&method, &target, &headers, body)?;
            print_response(&app.dispatch(request));
        }

        Commands::Routes { method } => {
            let methods = match method {
                Some(m) => vec![m.parse::<Method>()?],
                None => Method::ALL.to_vec(),
            };
            for method in methods {
                for pattern in app.routes(method) {
                    println!("{:<7} {pattern}", method.as_str());
                }
            }
        }
    }

    Ok(())
}
