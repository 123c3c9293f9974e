//! Index definition

use serde::Serialize;

/// A named index with a free-form expression such as `(name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Index {
    name: String,
    expression: String,
}

impl Index {
    pub fn new(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expression: expression.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Expression text; empty for introspected indexes
    pub fn expression(&self) -> &str {
        &self.expression
    }
}
