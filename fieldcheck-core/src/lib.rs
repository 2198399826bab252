//! Fieldcheck core: required-field validation, routing, request handling, HTTP server.

pub mod config;
pub mod http;
pub mod required;
pub mod response;
pub mod router;

pub use config::ServerConfig;
pub use required::{
    validate, validate_body, validate_with, FieldSpec, MalformedInputError, Presence,
    ValidationResult,
};
pub use response::{Response, SUCCESS_MESSAGE};
pub use router::{RouteId, Router};

use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("route not found: {0}")]
    NotFound(String),
    #[error("malformed input: {0}")]
    Malformed(#[from] MalformedInputError),
    /// Rejection reported by a route handler after the required-field check passed.
    #[error("{0}")]
    Validation(String),
    /// Failure on the server side of a handler; answered with 500.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn status_code(&self) -> u16 {
        match self {
            CoreError::NotFound(_) => 404,
            CoreError::Malformed(_) | CoreError::Validation(_) => 400,
            CoreError::Internal(_) => 500,
        }
    }
}

/// Registered route: method, path, required fields of the body, optional OpenAPI tag.
#[derive(Clone, Debug)]
pub struct Route {
    pub id: RouteId,
    pub method: String,
    pub path: String,
    pub required: FieldSpec,
    pub openapi_tag: Option<String>,
}

/// Called with the parsed document once it passed the required-field check.
/// The returned value becomes the 200 body.
pub type RequestCallback = Box<dyn Fn(RouteId, Value) -> Result<Value, CoreError> + Send + Sync>;

/// Core app: routes and one callback. Immutable once serving; share behind `Arc`.
pub struct App {
    pub router: Router,
    routes: HashMap<RouteId, Route>,
    next_route_id: u32,
    callback: Option<RequestCallback>,
}

impl App {
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            routes: HashMap::new(),
            next_route_id: 0,
            callback: None,
        }
    }

    /// Register a route. Path is exact (e.g. "example" or "users/register").
    /// Registering the same method and path again replaces the earlier route.
    pub fn register_route(
        &mut self,
        method: &str,
        path: &str,
        required: FieldSpec,
        openapi_tag: Option<&str>,
    ) -> RouteId {
        let path = path.trim_matches('/');
        let id = RouteId(self.next_route_id);
        self.next_route_id += 1;
        if let Some(old) = self.router.add(method, path, id) {
            self.routes.remove(&old);
        }
        self.routes.insert(
            id,
            Route {
                id,
                method: method.to_uppercase(),
                path: path.to_owned(),
                required,
                openapi_tag: openapi_tag.map(String::from),
            },
        );
        id
    }

    pub fn set_callback(&mut self, cb: RequestCallback) {
        self.callback = Some(cb);
    }

    pub fn route(&self, id: RouteId) -> Option<&Route> {
        self.routes.get(&id)
    }

    /// Routes ordered by registration.
    pub fn routes(&self) -> Vec<&Route> {
        let mut routes: Vec<&Route> = self.routes.values().collect();
        routes.sort_by_key(|r| r.id.0);
        routes
    }

    /// Match route and check the body's required fields.
    /// `Ok(Err(missing))` is a well-formed document that failed the check.
    pub fn match_route_and_validate(
        &self,
        method: &str,
        path: &str,
        body: &[u8],
    ) -> Result<(RouteId, Result<Value, Vec<String>>), CoreError> {
        let route_id = self
            .router
            .match_route(method, path)
            .ok_or_else(|| CoreError::NotFound(format!("{} {}", method, path)))?;
        let route = self
            .routes
            .get(&route_id)
            .ok_or_else(|| CoreError::NotFound(format!("route_id {:?}", route_id)))?;
        let (document, result) = validate_body(body, &route.required)?;
        let outcome = match result {
            ValidationResult::Valid => Ok(document),
            ValidationResult::Invalid { missing_fields } => Err(missing_fields),
        };
        Ok((route_id, outcome))
    }

    /// Handle a request without HTTP: match route, validate body, call callback.
    /// Missing fields produce a 400 response, not an error.
    pub fn handle_request(
        &self,
        method: &str,
        path: &str,
        body: &[u8],
    ) -> Result<Response, CoreError> {
        let (route_id, outcome) = self.match_route_and_validate(method, path, body)?;
        let document = match outcome {
            Ok(document) => document,
            Err(missing) => return Ok(Response::invalid(&missing)),
        };
        match self.callback {
            Some(ref cb) => Ok(Response::ok(&cb(route_id, document)?)),
            None => Ok(Response::success()),
        }
    }

    /// Like `handle_request`, but errors are rendered as responses too.
    pub fn respond(&self, method: &str, path: &str, body: &[u8]) -> Response {
        self.handle_request(method, path, body)
            .unwrap_or_else(|e| Response::from_error(&e))
    }

    /// Run HTTP server (blocks until Ctrl-C). Serves routes and GET /openapi.json.
    pub fn run(
        self,
        config: &ServerConfig,
        openapi_title: &str,
        openapi_version: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        http::run(self, config, openapi_title, openapi_version)
    }

    /// OpenAPI spec from registered routes (minimal).
    pub fn openapi_spec(&self, title: &str, version: &str) -> Value {
        let mut paths = serde_json::Map::new();
        for r in self.routes() {
            let key = format!("/{}", r.path);
            let mut op = serde_json::Map::new();
            let tags = r
                .openapi_tag
                .as_ref()
                .map(|t| serde_json::json!([t.as_str()]))
                .unwrap_or(serde_json::json!([]));
            op.insert("tags".into(), tags);
            op.insert(
                "requestBody".into(),
                serde_json::json!({
                    "content": { "application/json": { "schema": r.required.to_schema() } }
                }),
            );
            op.insert(
                "responses".into(),
                serde_json::json!({
                    "200": { "description": SUCCESS_MESSAGE },
                    "400": { "description": "Missing required fields or malformed input" }
                }),
            );
            let entry = paths
                .entry(key)
                .or_insert_with(|| Value::Object(serde_json::Map::new()));
            if let Value::Object(methods) = entry {
                methods.insert(r.method.to_lowercase(), Value::Object(op));
            }
        }
        serde_json::json!({
            "openapi": "3.0.0",
            "info": { "title": title, "version": version },
            "paths": paths
        })
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}
