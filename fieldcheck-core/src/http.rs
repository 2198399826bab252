//! Async HTTP server: tokio + hyper (HTTP/1).
//!
//! GET requests are checked against their query string (flattened into a JSON object of
//! strings); every other method is checked against its body. `GET /openapi.json` serves the
//! OpenAPI document built from the registered routes.

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response as HyperResponse, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::{Map, Value};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::{App, CoreError, Response, ServerConfig};

const OPENAPI_PATH: &str = "openapi.json";

/// App plus the pre-rendered OpenAPI document; what the server shares between connections.
pub struct Service {
    app: App,
    openapi_spec: Value,
}

impl Service {
    pub fn new(app: App, openapi_title: &str, openapi_version: &str) -> Self {
        let openapi_spec = app.openapi_spec(openapi_title, openapi_version);
        Self { app, openapi_spec }
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    /// One request, transport-independent. Never fails: errors become error responses.
    pub fn call(&self, method: &str, path: &str, query: Option<&str>, body: &[u8]) -> Response {
        let is_get = method.eq_ignore_ascii_case("GET");
        if is_get && path.trim_matches('/') == OPENAPI_PATH {
            return Response::ok(&self.openapi_spec);
        }
        if is_get {
            let document = query_to_json(query.unwrap_or(""));
            self.app.respond(method, path, document.to_string().as_bytes())
        } else {
            self.app.respond(method, path, body)
        }
    }
}

/// `a=1&b=` -> `{"a":"1","b":""}`. Keys and values are percent-decoded, `+` reads as a space.
/// Keys without a name are skipped; undecodable pairs are kept as sent.
pub fn query_to_json(query: &str) -> Value {
    let params: Map<String, Value> = query
        .split('&')
        .filter_map(|p| {
            let mut it = p.splitn(2, '=');
            let k = decode_component(it.next()?);
            let v = decode_component(it.next().unwrap_or(""));
            if k.is_empty() {
                None
            } else {
                Some((k, Value::String(v)))
            }
        })
        .collect();
    Value::Object(params)
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.trim().replace('+', " ");
    let decoded = urlencoding::decode(&spaced).map(|d| d.into_owned());
    decoded.unwrap_or(spaced)
}

/// Accept loop. Returns once `shutdown` resolves; in-flight connections finish on their own tasks.
pub async fn serve<F>(listener: TcpListener, service: Arc<Service>, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutting down");
                return Ok(());
            }
            accept_result = listener.accept() => {
                let (stream, peer) = match accept_result {
                    Ok(x) => x,
                    Err(e) => {
                        warn!(error = %e, "accept error");
                        continue;
                    }
                };
                let io = TokioIo::new(stream);
                let service = Arc::clone(&service);
                tokio::task::spawn(async move {
                    let svc = service_fn(move |req: Request<Incoming>| {
                        let service = Arc::clone(&service);
                        async move { handle(service, req).await }
                    });
                    if let Err(e) = http1::Builder::new().serve_connection(io, svc).await {
                        debug!(%peer, error = %e, "serve_connection error");
                    }
                });
            }
        }
    }
}

/// Bind `config`, serve until Ctrl-C. Blocks on its own multi-thread runtime.
pub fn run(
    app: App,
    config: &ServerConfig,
    openapi_title: &str,
    openapi_version: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let service = Arc::new(Service::new(app, openapi_title, openapi_version));
    let addr = config.to_string();
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    rt.block_on(async move {
        let listener = TcpListener::bind(&addr).await?;
        info!(%addr, routes = service.app().routes().len(), "listening");
        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for ctrl-c");
            }
        };
        serve(listener, service, shutdown).await
    })?;
    Ok(())
}

async fn handle(
    service: Arc<Service>,
    req: Request<Incoming>,
) -> Result<HyperResponse<Full<Bytes>>, Infallible> {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(String::from);
    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            let err = CoreError::Validation(format!("could not read request body: {}", e));
            return Ok(into_hyper(Response::from_error(&err)));
        }
    };
    let response = service.call(&method, &path, query.as_deref(), &body);
    debug!(%method, %path, status = response.status_code, "handled request");
    Ok(into_hyper(response))
}

fn into_hyper(response: Response) -> HyperResponse<Full<Bytes>> {
    let mut out = HyperResponse::new(Full::new(Bytes::from(response.body)));
    *out.status_mut() =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if let Some(ct) = response.content_type {
        if let Ok(v) = HeaderValue::from_str(&ct) {
            out.headers_mut().insert(CONTENT_TYPE, v);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FieldSpec;
    use serde_json::json;

    fn service() -> Service {
        let mut app = App::new();
        app.register_route("GET", "example", FieldSpec::new(["email"]), None);
        app.register_route("POST", "example", FieldSpec::new(["email"]), None);
        Service::new(app, "Test", "0.0.1")
    }

    #[test]
    fn query_parsing() {
        assert_eq!(
            query_to_json("email=a@b&name=&=skip&flag"),
            json!({"email": "a@b", "name": "", "flag": ""})
        );
        assert_eq!(query_to_json(""), json!({}));
    }

    #[test]
    fn query_keys_and_values_decoded() {
        assert_eq!(
            query_to_json("first%20name=Ann+Lee&e%6Dail=a%40b&bad=%FF"),
            json!({"first name": "Ann Lee", "email": "a@b", "bad": "%FF"})
        );
    }

    #[test]
    fn encoded_query_satisfies_required_fields() {
        let mut app = App::new();
        app.register_route("GET", "signup", FieldSpec::new(["first name", "email"]), None);
        let svc = Service::new(app, "Test", "0.0.1");
        let resp = svc.call("GET", "/signup", Some("first%20name=Ann&e%6Dail=a%40b"), b"");
        assert_eq!(resp.status_code, 200);
    }

    #[test]
    fn get_checks_query_string() {
        let svc = service();
        assert_eq!(svc.call("GET", "/example", Some("email=x"), b"").status_code, 200);
        let resp = svc.call("GET", "/example", None, b"");
        assert_eq!(resp.status_code, 400);
        assert_eq!(resp.json_body().unwrap()["missing_fields"], json!(["email"]));
    }

    #[test]
    fn post_checks_body() {
        let svc = service();
        let resp = svc.call("POST", "/example", Some("email=x"), br#"{"aneh":"x"}"#);
        assert_eq!(resp.status_code, 400);
    }

    #[test]
    fn openapi_served() {
        let svc = service();
        let resp = svc.call("GET", "/openapi.json", None, b"");
        assert_eq!(resp.status_code, 200);
        let spec = resp.json_body().unwrap();
        assert_eq!(spec["info"]["title"], "Test");
        assert!(spec["paths"]["/example"]["get"].is_object());
        assert!(spec["paths"]["/example"]["post"].is_object());
    }

    #[test]
    fn status_mapping() {
        let resp = into_hyper(Response::invalid(&["a".into()]));
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(resp.headers()[CONTENT_TYPE], "application/json");
    }
}
