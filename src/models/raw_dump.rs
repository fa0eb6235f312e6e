use serde::{Deserialize, Deserializer, Serialize};

/// One source file from a raw code dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDump {
    pub repo_name: String,
    pub path: String,
    #[serde(deserialize_with = "string_or_number")]
    pub copies: String,
    #[serde(deserialize_with = "number_or_string")]
    pub size: i64,
    pub content: String,
    pub license: String,
}

impl RawDump {
    pub fn identifier_name(&self) -> String {
        path_to_identifier(&self.path)
    }
}

/// A single method split out of a class, ready for the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSnippet {
    pub identifier_name: String,
    pub content: String,
    pub path: String,
    pub size: usize,
    pub imports: Vec<String>,
    pub required_type: Vec<String>,
}

const SOURCE_ROOTS: [&str; 5] = [
    "src/main/kotlin/",
    "src/main/java/",
    "src/test/kotlin/",
    "src/test/java/",
    "src/",
];

/// Turn a source path into a dotted identifier, e.g.
/// `app/src/main/kotlin/cc/unitmesh/Foo.kt` -> `cc.unitmesh.Foo`.
pub fn path_to_identifier(path: &str) -> String {
    let relative = SOURCE_ROOTS
        .iter()
        .find_map(|root| path.rfind(root).map(|idx| &path[idx + root.len()..]))
        .unwrap_or(path);

    let file_name_start = relative.rfind('/').map_or(0, |idx| idx + 1);
    let without_ext = match relative[file_name_start..].rfind('.') {
        Some(dot) if dot > 0 => &relative[..file_name_start + dot],
        _ => relative,
    };

    without_ext.trim_start_matches('/').replace('/', ".")
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(value) => Ok(value),
        serde_json::Value::Null => Ok(String::new()),
        other => Ok(other.to_string()),
    }
}

fn number_or_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(number) => number
            .as_i64()
            .ok_or_else(|| serde::de::Error::custom(format!("size out of range: {number}"))),
        serde_json::Value::String(value) => value
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid size: {value}"))),
        other => Err(serde::de::Error::custom(format!("invalid size: {other}"))),
    }
}
