use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use regex::Regex;
use tracing::{debug, info};
use url::Url;

use super::variables::{PostmanVariables, UNDEFINED, VariableResolver};
use crate::models::postman::{ItemNode, PostmanCollection, PostmanItem, PostmanRequest, PostmanUrl};
use crate::models::{ApiCollection, ApiItem, BodyMode, Parameter, Request, Response};

static NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("numeric pattern is valid"));
static BOOLEAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(true|false)$").expect("boolean pattern is valid"));

/// What a subtree turns into while the tree is being flattened.
#[derive(Debug, Clone, PartialEq)]
enum ChildType {
    /// A subtree mixing folders and plain items.
    NestedFolder {
        folders: Vec<ApiCollection>,
        items: Vec<ApiItem>,
    },
    Folder(ApiCollection),
    Item(Vec<ApiItem>),
}

/// Flattens a Postman collection tree into tagged [`ApiCollection`]s.
pub struct PostmanParser<R = PostmanVariables> {
    variables: R,
}

impl Default for PostmanParser {
    fn default() -> Self {
        Self::new(PostmanVariables::default())
    }
}

impl<R: VariableResolver> PostmanParser<R> {
    pub fn new(variables: R) -> Self {
        Self { variables }
    }

    pub fn parse(&self, collection: &PostmanCollection) -> Vec<ApiCollection> {
        let collections: Vec<ApiCollection> = collection
            .item
            .iter()
            .flatten()
            .flat_map(|item| self.parse_folder(item, item.name.as_deref()))
            .collect();

        info!(
            "Normalized {} collections with {} operations",
            collections.len(),
            collections.iter().map(|c| c.items.len()).sum::<usize>()
        );
        collections
    }

    fn parse_folder(&self, item: &PostmanItem, folder_name: Option<&str>) -> Vec<ApiCollection> {
        let mut details = Vec::new();
        let ancestor = folder_name.unwrap_or_default();

        match item.node() {
            ItemNode::Branch(children) => {
                let child_types: Vec<ChildType> = children
                    .iter()
                    .flat_map(|child| self.classify(child, folder_name, item.name.as_deref()))
                    .collect();

                let mut nested = Vec::new();
                let mut items = Vec::new();
                for child_type in child_types {
                    match child_type {
                        ChildType::Folder(collection) => details.push(collection),
                        ChildType::NestedFolder {
                            folders,
                            items: nested_items,
                        } => nested.push((folders, nested_items)),
                        ChildType::Item(api_items) => items.extend(api_items),
                    }
                }

                for (folders, nested_items) in nested {
                    details.extend(folders);
                    details.push(ApiCollection::new(ancestor, "", nested_items));
                }

                if !items.is_empty() {
                    let description = description_name(folder_name, item.name.as_deref());
                    details.push(ApiCollection::new(ancestor, description, items));
                }
            }
            ItemNode::Leaf(request) => {
                if let Some(api_item) = self.process_api_item(item, request, folder_name, item.name.as_deref()) {
                    let description = description_name(folder_name, item.name.as_deref());
                    details.push(ApiCollection::new(ancestor, description, vec![api_item]));
                }
            }
            ItemNode::Empty => {
                debug!("Skipping empty node {:?}", item.name);
            }
        }

        details
    }

    fn classify(&self, sub_item: &PostmanItem, folder_name: Option<&str>, item_name: Option<&str>) -> Vec<ChildType> {
        match sub_item.node() {
            ItemNode::Branch(children) => {
                let child_types: Vec<ChildType> = children
                    .iter()
                    .flat_map(|child| self.classify(child, folder_name, item_name))
                    .collect();

                let item_count = child_types
                    .iter()
                    .filter(|c| matches!(c, ChildType::Item(_)))
                    .count();
                let has_folders = child_types.iter().any(|c| matches!(c, ChildType::Folder(_)));

                if has_folders && item_count > 0 {
                    let mut folders = Vec::new();
                    let mut items = Vec::new();
                    for child_type in child_types {
                        match child_type {
                            ChildType::Folder(collection) => folders.push(collection),
                            ChildType::Item(api_items) => items.extend(api_items),
                            ChildType::NestedFolder {
                                folders: nested_folders,
                                items: nested_items,
                            } => {
                                folders.extend(nested_folders);
                                items.extend(nested_items);
                            }
                        }
                    }
                    return vec![ChildType::NestedFolder { folders, items }];
                }

                if item_count == child_types.len() && item_count == children.len() {
                    let items = child_types
                        .into_iter()
                        .flat_map(|c| match c {
                            ChildType::Item(api_items) => api_items,
                            _ => Vec::new(),
                        })
                        .collect();
                    let collection = ApiCollection::new(
                        folder_name.unwrap_or_default(),
                        sub_item.name.as_deref().unwrap_or_default(),
                        items,
                    );
                    return vec![ChildType::Folder(collection)];
                }

                child_types
            }
            ItemNode::Leaf(request) => {
                let items = self
                    .process_api_item(sub_item, request, folder_name, item_name)
                    .into_iter()
                    .collect();
                vec![ChildType::Item(items)]
            }
            ItemNode::Empty => Vec::new(),
        }
    }

    fn process_api_item(
        &self,
        sub_item: &PostmanItem,
        request: &PostmanRequest,
        folder_name: Option<&str>,
        item_name: Option<&str>,
    ) -> Option<ApiItem> {
        let path = self.resolve_path(request.url.as_ref());
        if path.is_empty() {
            debug!("Rejecting {:?}: empty path", sub_item.name);
            return None;
        }

        let responses = sub_item
            .responses()
            .iter()
            .map(|it| Response {
                code: it.code.unwrap_or(0),
                parameters: Vec::new(),
                body_mode: BodyMode::RawText,
                body_string: it.body.clone().unwrap_or_default(),
            })
            .collect();

        let body = request
            .body
            .iter()
            .flat_map(|b| b.form_fields())
            .map(|field| {
                Parameter::new(
                    field.key.as_deref().unwrap_or_default(),
                    field.value.as_deref().unwrap_or_default(),
                )
            })
            .collect();

        let description = request
            .description
            .as_ref()
            .and_then(|d| d.text())
            .map(replace_line_break)
            .unwrap_or_default();

        Some(ApiItem {
            method: request.method.clone().unwrap_or_default(),
            path,
            description,
            operation_id: sub_item.name.clone().unwrap_or_default(),
            tags: vec![
                folder_name.unwrap_or_default().to_string(),
                item_name.unwrap_or_default().to_string(),
            ],
            request: Request {
                parameters: url_parameters(request.url.as_ref()),
                body,
            },
            response: responses,
        })
    }

    fn resolve_path(&self, url: Option<&PostmanUrl>) -> String {
        let Some(url) = url else {
            return String::new();
        };

        let resolved = neutralize_undefined(&self.variables.resolve(&url.template()));
        let path = uri_path(&resolved).unwrap_or(resolved);

        if path.starts_with('/') {
            return path;
        }
        match path.find('/') {
            Some(idx) => path[idx..].to_string(),
            None => String::new(),
        }
    }
}

fn description_name(folder_name: Option<&str>, own_name: Option<&str>) -> String {
    if folder_name == own_name {
        String::new()
    } else {
        own_name.unwrap_or_default().to_string()
    }
}

fn neutralize_undefined(uri: &str) -> String {
    uri.replace(&format!("http://{UNDEFINED}"), "")
        .replace(&format!("https://{UNDEFINED}"), "")
        .replace(UNDEFINED, "{}")
}

/// Path component of an absolute URI, percent-decoded.
fn uri_path(uri: &str) -> Result<String, url::ParseError> {
    let parsed = Url::parse(uri)?;
    Ok(percent_decode_str(parsed.path()).decode_utf8_lossy().into_owned())
}

fn url_parameters(url: Option<&PostmanUrl>) -> Vec<Parameter> {
    let Some(url) = url else {
        return Vec::new();
    };

    url.variables()
        .iter()
        .chain(url.queries())
        .map(|it| {
            Parameter::new(
                it.key.as_deref().unwrap_or_default(),
                format_value(it.value.as_deref()),
            )
        })
        .collect()
}

fn replace_line_break(text: &str) -> String {
    text.replace(['\n', '\r'], "")
}

/// Display form of a sample value: numbers and booleans stay bare, other
/// text is quoted.
pub fn format_value(value: Option<&str>) -> String {
    match value {
        Some(v) if NUMERIC.is_match(v) || BOOLEAN.is_match(v) => v.to_string(),
        Some(v) if !v.is_empty() => format!("\"{v}\""),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn parser() -> PostmanParser {
        PostmanParser::default()
    }

    fn leaf(name: &str, method: &str, url: &str) -> serde_json::Value {
        json!({"name": name, "request": {"method": method, "url": url}})
    }

    fn item(value: serde_json::Value) -> PostmanItem {
        serde_json::from_value(value).unwrap()
    }

    fn collection(items: Vec<serde_json::Value>) -> PostmanCollection {
        serde_json::from_value(json!({ "item": items })).unwrap()
    }

    fn operation_ids(collection: &ApiCollection) -> Vec<&str> {
        collection.items.iter().map(|i| i.operation_id.as_str()).collect()
    }

    #[test]
    fn format_value_infers_literals() {
        assert_eq!(format_value(Some("42")), "42");
        assert_eq!(format_value(Some("true")), "true");
        assert_eq!(format_value(Some("false")), "false");
        assert_eq!(format_value(Some("hello")), "\"hello\"");
        assert_eq!(format_value(Some("4.2")), "\"4.2\"");
        assert_eq!(format_value(Some("")), "");
        assert_eq!(format_value(None), "");
    }

    #[test]
    fn leaf_with_empty_path_classifies_to_empty_item() {
        let parser = parser();
        let node = item(leaf("Broken", "GET", "{{host}}"));

        let result = parser.classify(&node, Some("Root"), Some("Root"));
        assert_eq!(result, vec![ChildType::Item(vec![])]);
    }

    #[test]
    fn branch_of_leaves_merges_into_one_folder() {
        let parser = parser();
        let node = item(json!({
            "name": "Admin",
            "item": [leaf("Create", "POST", "/admin"), leaf("Delete", "DELETE", "/admin/:id")]
        }));

        let result = parser.classify(&node, Some("Root"), Some("Root"));
        assert_eq!(result.len(), 1);
        let ChildType::Folder(collection) = &result[0] else {
            panic!("expected a folder, got {result:?}");
        };
        assert_eq!(collection.name, "Root");
        assert_eq!(collection.description, "Admin");
        assert_eq!(operation_ids(collection), vec!["Create", "Delete"]);
    }

    #[test]
    fn top_level_folder_of_leaves() {
        let parser = parser();
        let source = collection(vec![json!({
            "name": "Users",
            "item": [leaf("Get", "GET", "/users/{id}"), leaf("List", "GET", "/users")]
        })]);

        let collections = parser.parse(&source);
        assert_eq!(collections.len(), 1);
        let users = &collections[0];
        assert_eq!(users.name, "Users");
        assert_eq!(users.description, "");
        assert_eq!(operation_ids(users), vec!["Get", "List"]);
        assert_eq!(users.items[0].path, "/users/{id}");
        assert_eq!(users.items[1].path, "/users");
        for api_item in &users.items {
            assert_eq!(api_item.tags, vec!["Users".to_string(), "Users".to_string()]);
        }
    }

    #[test]
    fn nested_folder_contributes_folders_then_ancestor_bundle() {
        let parser = parser();
        let source = collection(vec![json!({
            "name": "Root",
            "item": [
                leaf("Ping", "GET", "/ping"),
                {
                    "name": "Admin",
                    "item": [
                        {"name": "Users", "item": [leaf("ListUsers", "GET", "/admin/users")]},
                        leaf("Stats", "GET", "/admin/stats")
                    ]
                }
            ]
        })]);

        let collections = parser.parse(&source);
        let summary: Vec<(&str, &str, Vec<&str>)> = collections
            .iter()
            .map(|c| (c.name.as_str(), c.description.as_str(), operation_ids(c)))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("Root", "Users", vec!["ListUsers"]),
                ("Root", "", vec!["Stats"]),
                ("Root", "", vec!["Ping"]),
            ]
        );
    }

    #[test]
    fn nested_folder_beside_item_passes_through() {
        let parser = parser();
        let source = collection(vec![json!({
            "name": "Root",
            "item": [{
                "name": "A",
                "item": [
                    {
                        "name": "B",
                        "item": [
                            {"name": "C", "item": [leaf("l1", "GET", "/l1")]},
                            leaf("l2", "GET", "/l2")
                        ]
                    },
                    leaf("l3", "GET", "/l3")
                ]
            }]
        })]);

        let collections = parser.parse(&source);
        let summary: Vec<(&str, &str, Vec<&str>)> = collections
            .iter()
            .map(|c| (c.name.as_str(), c.description.as_str(), operation_ids(c)))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("Root", "C", vec!["l1"]),
                ("Root", "", vec!["l2"]),
                ("Root", "", vec!["l3"]),
            ]
        );
    }

    #[test]
    fn folder_variants_come_before_plain_items() {
        let parser = parser();
        let source = collection(vec![json!({
            "name": "Shop",
            "item": [
                leaf("Health", "GET", "/health"),
                {"name": "Orders", "item": [leaf("ListOrders", "GET", "/orders")]}
            ]
        })]);

        let collections = parser.parse(&source);
        assert_eq!(collections.len(), 2);
        assert_eq!(collections[0].description, "Orders");
        assert_eq!(operation_ids(&collections[0]), vec!["ListOrders"]);
        assert_eq!(collections[1].description, "");
        assert_eq!(operation_ids(&collections[1]), vec!["Health"]);
    }

    #[test]
    fn top_level_leaf_becomes_single_item_collection() {
        let parser = parser();
        let source = collection(vec![leaf("Health", "GET", "/health"), leaf("Bad", "GET", "nothing")]);

        let collections = parser.parse(&source);
        assert_eq!(collections.len(), 1);
        assert_eq!(collections[0].name, "Health");
        assert_eq!(collections[0].description, "");
        assert_eq!(collections[0].items[0].tags, vec!["Health", "Health"]);
    }

    #[test]
    fn description_is_kept_only_when_names_differ() {
        assert_eq!(description_name(Some("Users"), Some("Users")), "");
        assert_eq!(description_name(Some("Root"), Some("Users")), "Users");
        assert_eq!(description_name(None, None), "");
    }

    #[test]
    fn undefined_sentinel_never_reaches_the_path() {
        let parser = parser();
        let source = collection(vec![
            leaf("A", "GET", "https://{{host}}/users/{{id}}"),
            leaf("B", "GET", "{{baseUrl}}/orders?limit={{limit}}"),
        ]);

        let paths: Vec<String> = parser
            .parse(&source)
            .into_iter()
            .flat_map(|c| c.items)
            .map(|i| i.path)
            .collect();

        assert_eq!(paths, vec!["/users/{}", "/orders?limit={}"]);
        assert!(paths.iter().all(|p| !p.contains(UNDEFINED)));
    }

    #[test]
    fn resolved_urls_keep_only_the_path() {
        let mut variables = PostmanVariables::new();
        variables.insert("baseUrl", "https://api.example.com/v1");
        let parser = PostmanParser::new(variables);
        let source = collection(vec![leaf("Search", "GET", "{{baseUrl}}/users/{{userId}}?page=2")]);

        let collections = parser.parse(&source);
        assert_eq!(collections[0].items[0].path, "/v1/users/{}");
    }

    #[test]
    fn api_item_carries_parameters_body_and_responses() {
        let parser = parser();
        let source = collection(vec![json!({
            "name": "Pets",
            "item": [{
                "name": "createPet",
                "request": {
                    "method": "POST",
                    "description": "Creates a pet\r\nin the store",
                    "url": {
                        "raw": "https://petstore.example/pets/:owner?dry_run=true&limit=10",
                        "variable": [{"key": "owner", "value": "alice"}],
                        "query": [
                            {"key": "dry_run", "value": "true"},
                            {"key": "limit", "value": "10"},
                            {"key": "note"}
                        ]
                    },
                    "body": {
                        "mode": "formdata",
                        "formdata": [{"key": "name", "value": "Rex"}, {"key": "age", "value": "3"}]
                    }
                },
                "response": [
                    {"name": "created", "code": 201, "body": "{\"id\": 1}"},
                    {"name": "unknown"}
                ]
            }]
        })]);

        let collections = parser.parse(&source);
        let pet = &collections[0].items[0];

        assert_eq!(pet.method, "POST");
        assert_eq!(pet.path, "/pets/:owner");
        assert_eq!(pet.description, "Creates a petin the store");
        assert_eq!(
            pet.request.parameters,
            vec![
                Parameter::new("owner", "\"alice\""),
                Parameter::new("dry_run", "true"),
                Parameter::new("limit", "10"),
                Parameter::new("note", ""),
            ]
        );
        assert_eq!(
            pet.request.body,
            vec![Parameter::new("name", "Rex"), Parameter::new("age", "3")]
        );
        assert_eq!(pet.response.len(), 2);
        assert_eq!(pet.response[0].code, 201);
        assert_eq!(pet.response[0].body_string, "{\"id\": 1}");
        assert_eq!(pet.response[1].code, 0);
        assert!(pet.response.iter().all(|r| r.body_mode == BodyMode::RawText && r.parameters.is_empty()));
    }

    #[test]
    fn empty_nodes_contribute_nothing() {
        let parser = parser();
        let source = collection(vec![
            json!({"name": "Empty", "item": []}),
            json!({"name": "Nothing"}),
        ]);
        assert!(parser.parse(&source).is_empty());
    }
}
