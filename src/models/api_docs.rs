use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>, param_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.param_type)
    }
}

fn join_parameters(parameters: &[Parameter]) -> String {
    parameters
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub body: Vec<Parameter>,
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = join_parameters(&self.parameters);
        let body = join_parameters(&self.body);

        match (params.is_empty(), body.is_empty()) {
            (true, true) => Ok(()),
            (true, false) => f.write_str(&body),
            (false, true) => f.write_str(&params),
            (false, false) => write!(f, "{params}, ({body})"),
        }
    }
}

/// How a response body is encoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyMode {
    #[default]
    RawText,
    Structured,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub code: i64,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    pub body_mode: BodyMode,
    #[serde(default)]
    pub body_string: String,
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&join_parameters(&self.parameters))
    }
}

/// One concrete operation extracted from an API collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiItem {
    pub method: String,
    pub path: String,
    pub description: String,
    pub operation_id: String,
    pub tags: Vec<String>,
    pub request: Request,
    pub response: Vec<Response>,
}

impl ApiItem {
    /// Responses rendered positionally, skipping the ones with nothing to show.
    pub fn response_signature(&self) -> String {
        self.response
            .iter()
            .map(ToString::to_string)
            .filter(|it| !it.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A flattened bundle of items produced from one folder of the source tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiCollection {
    pub name: String,
    pub description: String,
    pub items: Vec<ApiItem>,
}

impl ApiCollection {
    pub fn new(name: impl Into<String>, description: impl Into<String>, items: Vec<ApiItem>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            items,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedCollection {
    pub source: String,
    pub collections: Vec<ApiCollection>,
    pub parsed_at: chrono::DateTime<chrono::Utc>,
}

impl ParsedCollection {
    pub fn items(&self) -> impl Iterator<Item = &ApiItem> {
        self.collections.iter().flat_map(|c| c.items.iter())
    }
}
