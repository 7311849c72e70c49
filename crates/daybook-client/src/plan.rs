//! Fallback plans: for every logical operation, the ordered request shapes
//! to try.
//!
//! Plans are data. Which shapes a deployment actually answers is a
//! configuration concern, so the runner never branches on the operation.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One concrete request shape. `path` may contain `{id}` and `{type}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    pub method: Method,
    pub path: String,
}

impl Attempt {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }

    /// Substitute placeholders with percent-encoded values.
    #[must_use]
    pub fn render(&self, vars: &[(&str, &str)]) -> String {
        vars.iter().fold(self.path.clone(), |path, (name, value)| {
            path.replace(&format!("{{{name}}}"), &encode(value))
        })
    }
}

/// Encodes everything but unreserved characters, valid in a path segment
/// and in a query value alike.
fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointPlans {
    pub list: Vec<Attempt>,
    pub get: Vec<Attempt>,
    pub create: Vec<Attempt>,
    pub update: Vec<Attempt>,
    pub delete: Vec<Attempt>,
}

impl Default for EndpointPlans {
    fn default() -> Self {
        Self {
            list: vec![Attempt::new(Method::Get, "/reports?type={type}")],
            get: vec![
                Attempt::new(Method::Get, "/reports/{id}"),
                Attempt::new(Method::Get, "/reports?id={id}"),
            ],
            create: vec![Attempt::new(Method::Post, "/reports")],
            update: vec![
                Attempt::new(Method::Put, "/reports/{id}"),
                Attempt::new(Method::Patch, "/reports/{id}"),
                Attempt::new(Method::Put, "/reports?id={id}"),
                Attempt::new(Method::Patch, "/reports?id={id}"),
            ],
            delete: vec![
                Attempt::new(Method::Delete, "/reports/{id}"),
                Attempt::new(Method::Delete, "/reports?id={id}"),
            ],
        }
    }
}
