//! Exact-match router: (method, path) -> RouteId.

use std::collections::HashMap;

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct RouteId(pub u32);

/// Methods are compared uppercased; paths with leading and trailing slashes trimmed.
pub struct Router {
    table: HashMap<(String, String), RouteId>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// Returns the id previously bound to the same method and path, if any.
    pub fn add(&mut self, method: &str, path: &str, id: RouteId) -> Option<RouteId> {
        self.table.insert(key(method, path), id)
    }

    pub fn match_route(&self, method: &str, path: &str) -> Option<RouteId> {
        self.table.get(&key(method, path)).copied()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

fn key(method: &str, path: &str) -> (String, String) {
    (method.to_uppercase(), path.trim_matches('/').to_owned())
}
