//! Module: register into app.

use fieldcheck_core::CoreError;

use super::app::Application;

/// Module: a group of routes registered into the app together.
pub trait Module {
    fn register_into(&mut self, app: &mut Application) -> Result<(), CoreError>;
}
