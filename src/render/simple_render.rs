use std::fmt;

use crate::models::ApiItem;

/// Rendered text for one tag group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiTagOutput(pub String);

impl fmt::Display for ApiTagOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub trait ApiDetailRender {
    fn render_collection(&self, items: &[ApiItem]) -> String;

    fn render_item(&self, tags: &[String], items: &[&ApiItem]) -> ApiTagOutput;
}

/// One line per operation, grouped under a tag header.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleApiRender;

impl SimpleApiRender {
    fn group_by_tags<'a>(items: &'a [ApiItem]) -> Vec<(&'a [String], Vec<&'a ApiItem>)> {
        let mut groups: Vec<(&[String], Vec<&ApiItem>)> = Vec::new();
        for item in items {
            match groups.iter_mut().find(|(tags, _)| join_tags(tags) == join_tags(&item.tags)) {
                Some((_, members)) => members.push(item),
                None => groups.push((item.tags.as_slice(), vec![item])),
            }
        }
        groups
    }
}

impl ApiDetailRender for SimpleApiRender {
    fn render_collection(&self, items: &[ApiItem]) -> String {
        Self::group_by_tags(items)
            .into_iter()
            .map(|(tags, members)| self.render_item(tags, &members).to_string())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn render_item(&self, tags: &[String], items: &[&ApiItem]) -> ApiTagOutput {
        let lines = items
            .iter()
            .map(|it| format!("{} {} {} ", it.method, it.path, operation_information(it)))
            .collect::<Vec<_>>()
            .join("\n");

        ApiTagOutput(format!("{}\n{}", join_tags(tags), lines))
    }
}

fn join_tags(tags: &[String]) -> String {
    tags.join(", ")
}

fn operation_information(item: &ApiItem) -> String {
    if item.operation_id.is_empty() {
        return String::new();
    }
    format!(" {}{}", item.operation_id, io_parameters(item))
}

fn io_parameters(item: &ApiItem) -> String {
    let inputs = item.request.to_string();
    let outputs = item.response_signature();

    match (inputs.is_empty(), outputs.is_empty()) {
        (true, true) => "()".to_string(),
        (true, false) => format!("(): {outputs}"),
        (false, true) => format!("({inputs})"),
        (false, false) => format!("({inputs}) : {outputs}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BodyMode, Parameter, Request, Response};
    use pretty_assertions::assert_eq;

    fn api_item(method: &str, path: &str, operation_id: &str, tags: [&str; 2]) -> ApiItem {
        ApiItem {
            method: method.to_string(),
            path: path.to_string(),
            description: String::new(),
            operation_id: operation_id.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            request: Request::default(),
            response: Vec::new(),
        }
    }

    #[test]
    fn groups_by_tags_in_first_seen_order() {
        let mut get = api_item("GET", "/users/{id}", "getUser", ["Users", "Users"]);
        get.request.parameters.push(Parameter::new("id", "1"));
        let items = vec![
            get,
            api_item("GET", "/orders", "listOrders", ["Shop", "Shop"]),
            api_item("DELETE", "/users/{id}", "", ["Users", "Users"]),
        ];

        let text = SimpleApiRender.render_collection(&items);
        assert_eq!(
            text,
            "Users, Users\nGET /users/{id}  getUser(id: 1) \nDELETE /users/{id}  \n\nShop, Shop\nGET /orders  listOrders() "
        );
    }

    #[test]
    fn line_layout_keeps_separator_spaces() {
        let named = api_item("GET", "/x", "op", ["a", "b"]);
        let anonymous = api_item("GET", "/x", "", ["a", "b"]);

        let block = SimpleApiRender.render_item(&named.tags, &[&named, &anonymous]);
        assert_eq!(block.to_string(), "a, b\nGET /x  op() \nGET /x  ");
    }

    #[test]
    fn io_signature_variants() {
        let mut item = api_item("POST", "/pets", "createPet", ["", ""]);
        assert_eq!(io_parameters(&item), "()");

        item.response.push(Response {
            code: 200,
            parameters: vec![Parameter::new("id", "Int")],
            body_mode: BodyMode::Structured,
            body_string: String::new(),
        });
        assert_eq!(io_parameters(&item), "(): id: Int");

        item.request.body.push(Parameter::new("name", "Rex"));
        assert_eq!(io_parameters(&item), "(name: Rex) : id: Int");

        item.response.clear();
        assert_eq!(io_parameters(&item), "(name: Rex)");
    }

    #[test]
    fn responses_without_parameters_do_not_show() {
        let mut item = api_item("GET", "/pets", "listPets", ["Pets", "Pets"]);
        item.response.push(Response {
            code: 200,
            parameters: vec![],
            body_mode: BodyMode::RawText,
            body_string: "[]".into(),
        });
        assert_eq!(io_parameters(&item), "()");
    }

    #[test]
    fn rendering_is_repeatable() {
        let items = vec![
            api_item("GET", "/a", "a", ["X", "Y"]),
            api_item("GET", "/b", "b", ["X", "Z"]),
        ];
        let render = SimpleApiRender;
        assert_eq!(render.render_collection(&items), render.render_collection(&items));
        assert_eq!(render.render_collection(&[]), "");
    }
}
