//! Source-snippet pipeline: filter raw dumps by annotated methods, split
//! them into per-method snippets and resolve the types they reference.

pub mod kotlin;
pub mod pipeline;
pub mod store;

pub use kotlin::{ClassNode, KotlinCodeProcessor, KotlinParser, MethodNode, ParseError};
pub use pipeline::{
    AnalysisSummary, filter_dumps, resolve_types, run_analysis, run_arrow_export, run_sqlite_export,
    run_type_resolution, split_dumps,
};

/// Structural view of one parsed source file.
pub trait CodeStructure {
    fn package_name(&self) -> Option<&str>;

    fn imports(&self) -> &[String];

    fn classes(&self) -> &[ClassNode];

    /// Each method of `class` wrapped in the class declaration on its own.
    fn split_class_methods(&self, class: &ClassNode) -> Vec<String>;

    /// Fully qualified names of the types a method refers to.
    fn required_types(&self, method: &MethodNode) -> Vec<String>;

    fn methods_with_annotation(&self, marker: &str) -> Vec<&MethodNode> {
        self.classes()
            .iter()
            .flat_map(|class| class.methods.iter())
            .filter(|method| method.has_annotation(marker))
            .collect()
    }
}

/// Turns source text into a [`CodeStructure`].
pub trait CodeParser {
    type Unit: CodeStructure;

    fn parse(&self, source: &str) -> Result<Self::Unit, ParseError>;
}
