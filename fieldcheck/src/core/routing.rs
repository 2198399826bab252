//! ValidationModule: routes under a common prefix, each with its required fields.

use std::sync::Arc;

use fieldcheck_core::{CoreError, FieldSpec, SUCCESS_MESSAGE};
use serde_json::{json, Value};

use super::app::Application;
use super::{Handler, Module};

type SharedHandler = Arc<dyn Fn(Value) -> Result<Value, CoreError> + Send + Sync>;

struct ModuleRoute {
    path: String,
    method: String,
    required: FieldSpec,
    handler: SharedHandler,
}

/// Route module: name + prefix + routes. Attach via `app.register(&mut module)`.
pub struct ValidationModule {
    pub name: String,
    pub prefix: String,
    routes: Vec<ModuleRoute>,
}

impl ValidationModule {
    /// Prefix defaults to `/{name}`.
    pub fn new(name: &str, prefix: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            prefix: prefix.map_or_else(|| format!("/{}", name), String::from),
            routes: Vec::new(),
        }
    }

    /// Add a route. path is relative to the module prefix; methods e.g. ["GET"], ["GET", "POST"].
    pub fn route(
        mut self,
        path: &str,
        required: FieldSpec,
        handler: impl Fn(Value) -> Result<Value, CoreError> + Send + Sync + 'static,
        methods: &[&str],
    ) -> Self {
        let full_path = format!(
            "{}/{}",
            self.prefix.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let handler: SharedHandler = Arc::new(handler);
        for method in methods {
            self.routes.push(ModuleRoute {
                path: full_path.clone(),
                method: method.to_string(),
                required: required.clone(),
                handler: Arc::clone(&handler),
            });
        }
        self
    }

    /// Route that only checks required fields and answers with [`accept`].
    pub fn check(self, path: &str, required: FieldSpec, methods: &[&str]) -> Self {
        self.route(path, required, accept, methods)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Default handler: success message plus the accepted document.
pub fn accept(document: Value) -> Result<Value, CoreError> {
    Ok(json!({ "message": SUCCESS_MESSAGE, "document": document }))
}

impl Module for ValidationModule {
    fn register_into(&mut self, app: &mut Application) -> Result<(), CoreError> {
        for route in self.routes.drain(..) {
            let shared = route.handler;
            let handler: Handler = Box::new(move |v: Value| shared(v));
            app.register_route(&route.method, &route.path, route.required, handler, Some(&self.name));
        }
        Ok(())
    }
}
