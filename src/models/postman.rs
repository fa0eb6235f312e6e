//! Postman collection (v2.0 / v2.1) export format.
//!
//! Only the fields the normalizer reads are modeled; everything is optional
//! because real exports omit fields freely.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostmanCollection {
    #[serde(default)]
    pub info: Option<PostmanInfo>,
    #[serde(default)]
    pub item: Option<Vec<PostmanItem>>,
    #[serde(default)]
    pub variable: Option<Vec<PostmanVariable>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostmanInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub schema: Option<String>,
}

/// A node of the collection tree. Postman uses the same shape for folders
/// and requests; [`PostmanItem::node`] tells them apart.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostmanItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub item: Option<Vec<PostmanItem>>,
    #[serde(default)]
    pub request: Option<PostmanRequest>,
    #[serde(default)]
    pub response: Option<Vec<PostmanResponse>>,
}

/// Borrowed view of what a tree node holds.
#[derive(Debug, Clone, Copy)]
pub enum ItemNode<'a> {
    Branch(&'a [PostmanItem]),
    Leaf(&'a PostmanRequest),
    Empty,
}

impl PostmanItem {
    pub fn node(&self) -> ItemNode<'_> {
        match (&self.item, &self.request) {
            (Some(children), _) if !children.is_empty() => ItemNode::Branch(children.as_slice()),
            (Some(_), _) => ItemNode::Empty,
            (None, Some(request)) => ItemNode::Leaf(request),
            (None, None) => ItemNode::Empty,
        }
    }

    pub fn responses(&self) -> &[PostmanResponse] {
        self.response.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostmanRequest {
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub url: Option<PostmanUrl>,
    #[serde(default)]
    pub body: Option<PostmanBody>,
    #[serde(default)]
    pub description: Option<PostmanDescription>,
}

/// A request URL is either the raw string or a structured object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PostmanUrl {
    Raw(String),
    Detailed(PostmanUrlDetail),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostmanUrlDetail {
    #[serde(default)]
    pub raw: Option<String>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub host: Option<StringOrSegments>,
    #[serde(default)]
    pub path: Option<StringOrSegments>,
    #[serde(default)]
    pub query: Option<Vec<PostmanKeyValue>>,
    #[serde(default)]
    pub variable: Option<Vec<PostmanKeyValue>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringOrSegments {
    Joined(String),
    Segments(Vec<String>),
}

impl StringOrSegments {
    fn join(&self, separator: &str) -> String {
        match self {
            Self::Joined(value) => value.clone(),
            Self::Segments(segments) => segments.join(separator),
        }
    }
}

impl PostmanUrl {
    /// The URL template before variable substitution.
    pub fn template(&self) -> String {
        match self {
            Self::Raw(raw) => raw.clone(),
            Self::Detailed(detail) => match &detail.raw {
                Some(raw) => raw.clone(),
                None => detail.assemble(),
            },
        }
    }

    pub fn variables(&self) -> &[PostmanKeyValue] {
        match self {
            Self::Raw(_) => &[],
            Self::Detailed(detail) => detail.variable.as_deref().unwrap_or_default(),
        }
    }

    pub fn queries(&self) -> &[PostmanKeyValue] {
        match self {
            Self::Raw(_) => &[],
            Self::Detailed(detail) => detail.query.as_deref().unwrap_or_default(),
        }
    }
}

impl PostmanUrlDetail {
    fn assemble(&self) -> String {
        let mut url = String::new();
        if let Some(protocol) = &self.protocol {
            url.push_str(protocol);
            url.push_str("://");
        }
        if let Some(host) = &self.host {
            url.push_str(&host.join("."));
        }
        if let Some(path) = &self.path {
            let path = path.join("/");
            if !path.starts_with('/') {
                url.push('/');
            }
            url.push_str(&path);
        }

        let query: Vec<String> = self
            .query
            .iter()
            .flatten()
            .map(|q| {
                format!(
                    "{}={}",
                    q.key.as_deref().unwrap_or_default(),
                    q.value.as_deref().unwrap_or_default()
                )
            })
            .collect();
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.join("&"));
        }
        url
    }
}

/// Query parameters, path variables and form fields all share this shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostmanKeyValue {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub disabled: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostmanBody {
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub raw: Option<String>,
    #[serde(default)]
    pub formdata: Option<Vec<PostmanKeyValue>>,
    #[serde(default)]
    pub urlencoded: Option<Vec<PostmanKeyValue>>,
}

impl PostmanBody {
    /// Form-encoded fields, multipart first.
    pub fn form_fields(&self) -> impl Iterator<Item = &PostmanKeyValue> {
        self.formdata.iter().flatten().chain(self.urlencoded.iter().flatten())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PostmanDescription {
    Text(String),
    Detailed {
        #[serde(default)]
        content: Option<String>,
    },
}

impl PostmanDescription {
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Detailed { content } => content.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostmanResponse {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostmanVariable {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub disabled: Option<bool>,
}
