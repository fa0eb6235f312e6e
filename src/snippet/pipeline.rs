use std::collections::HashMap;

use tracing::{debug, info};

use super::kotlin::java_string_hash;
use super::store::{export_arrow, export_sqlite, read_dump_lists, read_json, write_json};
use super::{CodeParser, CodeStructure};
use crate::config::DatasetConfig;
use crate::error::Result;
use crate::models::{CodeSnippet, RawDump};

/// Counts reported by [`run_analysis`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisSummary {
    pub filtered: usize,
    pub snippets: usize,
}

/// Keep the dumps containing at least one method annotated with `marker`.
/// Sources that fail to parse are dropped.
pub fn filter_dumps<P: CodeParser>(parser: &P, dumps: Vec<RawDump>, marker: &str) -> Vec<RawDump> {
    dumps
        .into_iter()
        .filter(|dump| match parser.parse(&dump.content) {
            Ok(unit) => !unit.methods_with_annotation(marker).is_empty(),
            Err(err) => {
                debug!("Skipping {}: {}", dump.path, err);
                false
            }
        })
        .collect()
}

/// Explode every class method into its own snippet.
pub fn split_dumps<P: CodeParser>(parser: &P, dumps: &[RawDump], max_size: usize) -> Vec<CodeSnippet> {
    let mut results = Vec::new();

    for dump in dumps {
        let unit = match parser.parse(&dump.content) {
            Ok(unit) => unit,
            Err(err) => {
                debug!("Skipping {}: {}", dump.path, err);
                continue;
            }
        };
        let imports = unit.imports().to_vec();

        for class in unit.classes() {
            let identifier_name = match unit.package_name() {
                Some(package) => format!("{package}.{}", class.name),
                None => class.name.clone(),
            };

            let contents = unit.split_class_methods(class);
            for (method, content) in class.methods.iter().zip(contents) {
                let size = content.chars().count();
                if size > max_size {
                    info!("size too large: {} ({})", dump.path, method.name);
                    continue;
                }

                results.push(CodeSnippet {
                    identifier_name: identifier_name.clone(),
                    path: format!("{}#{}", dump.path, java_string_hash(&method.text)),
                    size,
                    content,
                    imports: imports.clone(),
                    required_type: unit.required_types(method),
                });
            }
        }
    }

    results
}

/// Look up a raw dump for each type the snippets require, renamed to the
/// type it provides.
pub fn resolve_types(snippets: &[CodeSnippet], dumps: &[RawDump]) -> Vec<RawDump> {
    let mut types: Vec<&str> = Vec::new();
    for required in snippets.iter().flat_map(|s| s.required_type.iter()) {
        if !types.contains(&required.as_str()) {
            types.push(required);
        }
    }

    let by_identifier: HashMap<String, &RawDump> =
        dumps.iter().map(|d| (d.identifier_name(), d)).collect();

    types
        .into_iter()
        .filter_map(|ty| {
            by_identifier.get(ty).map(|dump| RawDump {
                path: ty.to_string(),
                ..(*dump).clone()
            })
        })
        .collect()
}

/// Filter the raw dumps (reusing an existing filtered file) and split the
/// survivors into snippets.
pub fn run_analysis<P: CodeParser>(config: &DatasetConfig, parser: &P) -> Result<AnalysisSummary> {
    info!("Analysis Started");

    let filtered_file = config.filtered_file();
    if filtered_file.exists() {
        info!("Skip filtering, {} already exists", filtered_file.display());
    } else {
        let dumps = read_dump_lists(&config.rawdump_dir())?;
        let total = dumps.len();
        let outputs = filter_dumps(parser, dumps, &config.marker);
        info!("Kept {} of {} dumps with @{} methods", outputs.len(), total, config.marker);
        write_json(&filtered_file, &outputs)?;
    }

    let filtered: Vec<RawDump> = read_json(&filtered_file)?;
    let snippets = split_dumps(parser, &filtered, config.max_snippet_size);
    write_json(&config.split_file(), &snippets)?;

    info!("Analysis finished: {} snippets", snippets.len());
    Ok(AnalysisSummary {
        filtered: filtered.len(),
        snippets: snippets.len(),
    })
}

pub fn run_type_resolution(config: &DatasetConfig) -> Result<usize> {
    let snippets: Vec<CodeSnippet> = read_json(&config.split_file())?;
    let dumps = read_dump_lists(&config.rawdump_dir())?;

    let type_items = resolve_types(&snippets, &dumps);
    write_json(&config.types_file(), &type_items)?;

    info!("Resolved {} types into {}", type_items.len(), config.types_file().display());
    Ok(type_items.len())
}

pub fn run_sqlite_export(config: &DatasetConfig) -> Result<usize> {
    info!("Initialize the database");
    let dumps = read_dump_lists(&config.rawdump_dir())?;
    export_sqlite(&config.database_file(), &dumps)
}

pub fn run_arrow_export(config: &DatasetConfig) -> Result<usize> {
    let dumps = read_dump_lists(&config.rawdump_dir())?;
    export_arrow(&config.arrow_file(), &dumps)
}
