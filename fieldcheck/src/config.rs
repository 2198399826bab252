//! Route configuration file (JSON): which paths exist and which fields each one requires.
//!
//! ```json
//! {
//!   "title": "Signup API",
//!   "routes": [
//!     { "methods": ["GET", "POST"], "path": "example", "required": ["email"] },
//!     { "method": "POST", "path": "users", "schema": { "required": ["email", "name"] },
//!       "presence": "non_empty" }
//!   ]
//! }
//! ```

use std::path::{Path, PathBuf};

use fieldcheck_core::{FieldSpec, Presence};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::core::ValidationModule;

const KNOWN_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("route {index}: {reason}")]
    InvalidRoute { index: usize, reason: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutesConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_version")]
    pub version: String,
    pub routes: Vec<RouteConfig>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<String>,
    pub path: String,
    #[serde(default)]
    pub required: Vec<String>,
    /// JSON Schema whose top-level `required` array is appended to `required`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
    #[serde(default)]
    pub presence: Presence,
}

fn default_title() -> String {
    "Fieldcheck".to_string()
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

impl RouteConfig {
    /// `method` and `methods` combined, uppercased, without repeats. POST when neither is given.
    pub fn all_methods(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for m in self.method.iter().chain(self.methods.iter()) {
            let m = m.trim().to_uppercase();
            if !out.contains(&m) {
                out.push(m);
            }
        }
        if out.is_empty() {
            out.push("POST".to_string());
        }
        out
    }

    pub fn field_spec(&self) -> FieldSpec {
        let mut fields = self.required.clone();
        if let Some(ref schema) = self.schema {
            fields.extend(FieldSpec::from_schema(schema).fields);
        }
        FieldSpec { fields, presence: self.presence }
    }
}

impl RoutesConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: RoutesConfig =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.check()?;
        Ok(config)
    }

    /// The built-in route set: GET and POST `/example`, requiring `email`.
    pub fn example() -> Self {
        Self {
            title: default_title(),
            version: default_version(),
            routes: vec![RouteConfig {
                method: None,
                methods: vec!["GET".into(), "POST".into()],
                path: "example".into(),
                required: vec!["email".into()],
                schema: None,
                presence: Presence::default(),
            }],
        }
    }

    /// Reject empty paths and unknown methods.
    pub fn check(&self) -> Result<(), ConfigError> {
        for (index, route) in self.routes.iter().enumerate() {
            if route.path.trim_matches('/').trim().is_empty() {
                return Err(ConfigError::InvalidRoute {
                    index,
                    reason: "path is empty".into(),
                });
            }
            if let Some(m) = route
                .all_methods()
                .into_iter()
                .find(|m| !KNOWN_METHODS.contains(&m.as_str()))
            {
                return Err(ConfigError::InvalidRoute {
                    index,
                    reason: format!("unsupported method {:?}", m),
                });
            }
        }
        Ok(())
    }

    /// Module with one checking route per configured path and method.
    pub fn to_module(&self) -> ValidationModule {
        let mut module = ValidationModule::new("routes", Some("/"));
        for route in &self.routes {
            let methods = route.all_methods();
            let methods: Vec<&str> = methods.iter().map(String::as_str).collect();
            module = module.check(&route.path, route.field_spec(), &methods);
        }
        module
    }
}
