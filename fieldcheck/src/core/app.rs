//! Application: registers validated routes with core and dispatches to Rust handlers.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use fieldcheck_core::{App, CoreError, FieldSpec, Response, Route, RouteId, ServerConfig};

use super::Module;

/// Handler: receives the JSON document after its required fields passed, returns JSON or error.
pub type Handler = Box<dyn Fn(Value) -> Result<Value, CoreError> + Send + Sync>;

/// Application: core routes plus one handler per route.
pub struct Application {
    pub(crate) core: App,
    pub(crate) handlers: HashMap<RouteId, Handler>,
}

impl Application {
    pub fn new() -> Self {
        Self {
            core: App::new(),
            handlers: HashMap::new(),
        }
    }

    /// Register a route and handler. Path e.g. "users/register".
    pub fn register_route(
        &mut self,
        method: &str,
        path: &str,
        required: FieldSpec,
        handler: Handler,
        openapi_tag: Option<&str>,
    ) -> RouteId {
        let id = self.core.register_route(method, path, required, openapi_tag);
        self.handlers.retain(|rid, _| self.core.route(*rid).is_some());
        self.handlers.insert(id, handler);
        id
    }

    /// Register a module (group of routes).
    pub fn register(&mut self, module: &mut dyn Module) -> Result<(), CoreError> {
        module.register_into(self)
    }

    pub fn routes(&self) -> Vec<&Route> {
        self.core.routes()
    }

    /// One line per route: method, path, required fields.
    pub fn describe_routes(&self) -> Vec<String> {
        self.routes()
            .into_iter()
            .map(|r| {
                format!(
                    "{:<6} /{}  required: [{}]",
                    r.method,
                    r.path,
                    r.required.fields.join(", ")
                )
            })
            .collect()
    }

    /// Handle one request (for tests or when HTTP is external). Missing fields are a 400 response.
    pub fn handle_request(
        &self,
        method: &str,
        path: &str,
        body: &[u8],
    ) -> Result<Response, CoreError> {
        let (route_id, outcome) = self.core.match_route_and_validate(method, path, body)?;
        match outcome {
            Ok(document) => dispatch(&self.handlers, route_id, document).map(|v| Response::ok(&v)),
            Err(missing) => Ok(Response::invalid(&missing)),
        }
    }

    /// Like `handle_request`, with errors rendered as responses.
    pub fn respond(&self, method: &str, path: &str, body: &[u8]) -> Response {
        self.handle_request(method, path, body)
            .unwrap_or_else(|e| Response::from_error(&e))
    }

    /// OpenAPI spec as JSON value.
    pub fn openapi_spec(&self, title: &str, version: &str) -> Value {
        self.core.openapi_spec(title, version)
    }

    /// Core app with a callback dispatching to the registered handlers.
    pub fn into_core(self) -> App {
        let mut core = self.core;
        let handlers = Arc::new(self.handlers);
        core.set_callback(Box::new(move |route_id: RouteId, document: Value| {
            dispatch(&handlers, route_id, document)
        }));
        core
    }

    /// Run HTTP server (blocks until Ctrl-C). Serves routes and /openapi.json.
    pub fn run(
        self,
        config: &ServerConfig,
        openapi_title: &str,
        openapi_version: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.into_core().run(config, openapi_title, openapi_version)
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

fn dispatch(
    handlers: &HashMap<RouteId, Handler>,
    route_id: RouteId,
    document: Value,
) -> Result<Value, CoreError> {
    let handler = handlers
        .get(&route_id)
        .ok_or_else(|| CoreError::NotFound(format!("route_id {:?}", route_id)))?;
    handler(document)
}
