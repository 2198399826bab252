//! Fieldcheck facade: Application with per-route handlers, route modules, route config file.

pub mod check;
pub mod config;
pub mod core;

pub use check::{check, check_input, read_input, CheckReport};
pub use config::{ConfigError, RouteConfig, RoutesConfig};
pub use crate::core::{accept, Application, Handler, Module, ValidationModule};
pub use fieldcheck_core::{
    validate, validate_with, CoreError, FieldSpec, MalformedInputError, Presence, Response,
    ServerConfig, ValidationResult,
};
