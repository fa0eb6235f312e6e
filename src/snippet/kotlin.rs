//! Kotlin source structure on top of tree-sitter.
//!
//! Classes, member functions, annotations and imports are read from the
//! syntax tree. Sources the grammar rejects are reported as [`ParseError`].

use thiserror::Error;
use tree_sitter::{Node, Parser};

use super::{CodeParser, CodeStructure};

const CLASS_KINDS: &[&str] = &["class_declaration", "object_declaration", "interface_declaration"];
const CLASS_BODY_KINDS: &[&str] = &["class_body", "enum_class_body"];
const CLASS_KEYWORDS: &[&str] = &["class", "interface", "object"];
const NAME_KINDS: &[&str] = &["identifier", "simple_identifier", "type_identifier"];
const IMPORT_KINDS: &[&str] = &["import_header", "import"];

const BUILTIN_TYPES: &[&str] = &[
    "Any", "Array", "Boolean", "Byte", "Char", "Collection", "Deprecated", "Double", "Exception",
    "Float", "Int", "Iterable", "JvmStatic", "List", "Long", "Map", "MutableList", "MutableMap",
    "MutableSet", "Nothing", "Pair", "Result", "Sequence", "Set", "Short", "String", "Suppress",
    "Throwable", "Triple", "Unit",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("failed to load the Kotlin grammar: {0}")]
    Language(String),
    #[error("parser returned no tree")]
    NoTree,
    #[error("syntax error at line {line}, column {column}")]
    Syntax { line: usize, column: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodNode {
    pub name: String,
    /// Simple names of the annotations on the declaration.
    pub annotations: Vec<String>,
    pub text: String,
    /// Simple type names referenced by the declaration, annotations excluded.
    pub type_names: Vec<String>,
}

impl MethodNode {
    pub fn has_annotation(&self, marker: &str) -> bool {
        self.annotations.iter().any(|a| a == marker)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassNode {
    pub name: String,
    /// Declaration line(s) up to and including the opening brace.
    pub header: String,
    pub methods: Vec<MethodNode>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct KotlinParser;

impl CodeParser for KotlinParser {
    type Unit = KotlinCodeProcessor;

    fn parse(&self, source: &str) -> Result<Self::Unit, ParseError> {
        KotlinCodeProcessor::parse(source)
    }
}

#[derive(Debug, Clone)]
pub struct KotlinCodeProcessor {
    package: Option<String>,
    imports: Vec<String>,
    classes: Vec<ClassNode>,
}

impl KotlinCodeProcessor {
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_kotlin_ng::LANGUAGE.into())
            .map_err(|e| ParseError::Language(e.to_string()))?;

        let tree = parser.parse(source, None).ok_or(ParseError::NoTree)?;
        let root = tree.root_node();
        if root.has_error() {
            let at = first_error(root).unwrap_or(root).start_position();
            return Err(ParseError::Syntax {
                line: at.row + 1,
                column: at.column + 1,
            });
        }

        let mut classes = Vec::new();
        collect_classes(root, source, &mut classes);

        Ok(Self {
            package: package_name(root, source),
            imports: imports(root, source),
            classes,
        })
    }

    fn resolve(&self, name: &str) -> Option<String> {
        self.imports
            .iter()
            .find(|import| import.rsplit('.').next() == Some(name))
            .cloned()
            .or_else(|| self.package.as_ref().map(|package| format!("{package}.{name}")))
    }
}

impl CodeStructure for KotlinCodeProcessor {
    fn package_name(&self) -> Option<&str> {
        self.package.as_deref()
    }

    fn imports(&self) -> &[String] {
        &self.imports
    }

    fn classes(&self) -> &[ClassNode] {
        &self.classes
    }

    fn split_class_methods(&self, class: &ClassNode) -> Vec<String> {
        class
            .methods
            .iter()
            .map(|method| format!("{}\n{}\n}}", class.header, method.text))
            .collect()
    }

    fn required_types(&self, method: &MethodNode) -> Vec<String> {
        let mut types: Vec<String> = Vec::new();
        for name in method.type_names.iter().filter(|name| is_project_type(name)) {
            if let Some(resolved) = self.resolve(name) {
                if !types.contains(&resolved) {
                    types.push(resolved);
                }
            }
        }
        types
    }
}

fn is_project_type(name: &str) -> bool {
    let constant = name
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
    name.len() > 1
        && name.starts_with(|c: char| c.is_ascii_uppercase())
        && !constant
        && !BUILTIN_TYPES.contains(&name)
}

fn children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

fn text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    source.get(node.byte_range()).unwrap_or_default()
}

fn line_start(source: &str, at: usize) -> usize {
    source[..at].rfind('\n').map_or(0, |p| p + 1)
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    children(node)
        .into_iter()
        .filter(|child| child.has_error())
        .find_map(first_error)
}

/// Dotted path following a `package` or `import` keyword.
fn header_path(text: &str, keyword: &str) -> String {
    let rest = text.trim_start();
    rest.strip_prefix(keyword)
        .unwrap_or(rest)
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .trim_end_matches(';')
        .to_string()
}

fn package_name(root: Node<'_>, source: &str) -> Option<String> {
    children(root)
        .into_iter()
        .find(|node| node.kind() == "package_header")
        .map(|node| header_path(text(node, source), "package"))
        .filter(|package| !package.is_empty())
}

fn is_import(node: &Node<'_>) -> bool {
    node.is_named() && IMPORT_KINDS.contains(&node.kind())
}

fn imports(root: Node<'_>, source: &str) -> Vec<String> {
    let mut found = Vec::new();
    for node in children(root) {
        if node.kind() == "import_list" {
            found.extend(
                children(node)
                    .iter()
                    .filter(|n| is_import(n))
                    .map(|n| header_path(text(*n, source), "import")),
            );
        } else if is_import(&node) {
            found.push(header_path(text(node, source), "import"));
        }
    }
    found
}

fn declared_name(node: Node<'_>, source: &str) -> Option<String> {
    node.child_by_field_name("name")
        .or_else(|| {
            children(node)
                .into_iter()
                .find(|child| NAME_KINDS.contains(&child.kind()))
        })
        .map(|name| text(name, source).to_string())
}

fn collect_classes(node: Node<'_>, source: &str, out: &mut Vec<ClassNode>) {
    if CLASS_KINDS.contains(&node.kind()) {
        if let Some(class) = class_node(node, source) {
            out.push(class);
        }
    }
    for child in children(node) {
        collect_classes(child, source, out);
    }
}

fn class_node(node: Node<'_>, source: &str) -> Option<ClassNode> {
    let name = declared_name(node, source)?;
    let parts = children(node);
    let body = parts
        .iter()
        .find(|child| CLASS_BODY_KINDS.contains(&child.kind()))?;

    // Annotations on the class stay out of the header.
    let keyword_at = parts
        .iter()
        .find(|child| CLASS_KEYWORDS.contains(&child.kind()))
        .map_or(node.start_byte(), |keyword| keyword.start_byte());
    let header = source
        .get(line_start(source, keyword_at)..=body.start_byte())?
        .trim_start()
        .to_string();

    let methods = children(*body)
        .into_iter()
        .filter(|member| member.kind() == "function_declaration")
        .filter_map(|member| method_node(member, source))
        .collect();

    Some(ClassNode {
        name,
        header,
        methods,
    })
}

fn method_node(node: Node<'_>, source: &str) -> Option<MethodNode> {
    let name = declared_name(node, source)?;

    let mut annotations = Vec::new();
    for child in children(node) {
        match child.kind() {
            "modifiers" => collect_annotations(child, source, &mut annotations),
            "annotation" => annotations.push(annotation_name(text(child, source))),
            _ => {}
        }
    }

    let line = line_start(source, node.start_byte());
    let start = if source[line..node.start_byte()].trim().is_empty() {
        line
    } else {
        node.start_byte()
    };

    let mut type_names = Vec::new();
    collect_type_names(node, source, &mut type_names);

    Some(MethodNode {
        name,
        annotations,
        text: source[start..node.end_byte()].trim_end().to_string(),
        type_names,
    })
}

fn collect_annotations(node: Node<'_>, source: &str, out: &mut Vec<String>) {
    for child in children(node) {
        if child.kind() == "annotation" {
            out.push(annotation_name(text(child, source)));
        } else {
            collect_annotations(child, source, out);
        }
    }
}

/// `@Query("...")`, `@androidx.room.Query` and `@get:Query` all name `Query`.
fn annotation_name(text: &str) -> String {
    let body = text.trim_start_matches('@');
    let head = body
        .split(|c: char| c == '(' || c == '<' || c.is_whitespace())
        .next()
        .unwrap_or(body);
    head.rsplit(['.', ':']).next().unwrap_or(head).to_string()
}

fn collect_type_names(node: Node<'_>, source: &str, out: &mut Vec<String>) {
    match node.kind() {
        "modifiers" | "annotation" => return,
        "type_identifier" => push_unique(out, text(node, source)),
        "user_type" => {
            for part in children(node).into_iter().filter(|p| p.kind() == "identifier") {
                push_unique(out, text(part, source));
            }
        }
        _ => {}
    }
    for child in children(node) {
        collect_type_names(child, source, out);
    }
}

fn push_unique(out: &mut Vec<String>, name: &str) {
    if !out.iter().any(|n| n == name) {
        out.push(name.to_string());
    }
}

/// Java's `String.hashCode`, used to keep snippet ids stable across tools.
pub fn java_string_hash(text: &str) -> i32 {
    text.encode_utf16()
        .fold(0i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(i32::from(unit)))
}
