use std::fs;

use api_dataset_prep::DatasetConfig;
use api_dataset_prep::models::{CodeSnippet, RawDump};
use api_dataset_prep::snippet::store::read_json;
use api_dataset_prep::snippet::{
    KotlinParser, run_analysis, run_arrow_export, run_sqlite_export, run_type_resolution,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::tempdir;

const DAO: &str = "package demo.dao\n\nimport demo.model.Order\n\n@Dao\ninterface OrderDao {\n    @Query(\"SELECT * FROM orders WHERE id = :id\")\n    fun byId(id: Long): Order?\n\n    @Query(\"SELECT * FROM orders\")\n    fun all(): List<Order>\n}\n";
const MODEL: &str = "package demo.model\n\ndata class Order(val id: Long, val total: Double) {\n    fun isFree(): Boolean = total == 0.0\n}\n";
const BROKEN: &str = "package demo\n\nclass Half {\n    @Query(\"x\")\n    fun open() {\n";

fn dump_line(path: &str, content: &str) -> String {
    json!({
        "repo_name": "demo/orders",
        "path": path,
        "copies": 3,
        "size": content.len().to_string(),
        "content": content,
        "license": "apache-2.0",
    })
    .to_string()
}

fn seed(config: &DatasetConfig) {
    let rawdump = config.rawdump_dir();
    fs::create_dir_all(&rawdump).unwrap();
    fs::write(
        rawdump.join("00000.json"),
        [
            dump_line("src/main/kotlin/demo/dao/OrderDao.kt", DAO),
            dump_line("src/main/kotlin/demo/model/Order.kt", MODEL),
            dump_line("src/main/kotlin/demo/Half.kt", BROKEN),
        ]
        .join("\n"),
    )
    .unwrap();
}

#[test]
fn analysis_then_type_resolution() {
    let dir = tempdir().unwrap();
    let config = DatasetConfig::new(dir.path().join("datasets"));
    seed(&config);

    let summary = run_analysis(&config, &KotlinParser).unwrap();
    assert_eq!(summary.filtered, 1);
    assert_eq!(summary.snippets, 2);

    let filtered: Vec<RawDump> = read_json(&config.filtered_file()).unwrap();
    assert_eq!(filtered[0].path, "src/main/kotlin/demo/dao/OrderDao.kt");
    assert_eq!(filtered[0].copies, "3");

    let snippets: Vec<CodeSnippet> = read_json(&config.split_file()).unwrap();
    assert!(snippets.iter().all(|s| s.identifier_name == "demo.dao.OrderDao"));
    assert!(snippets[0].content.starts_with("interface OrderDao {\n"));
    assert!(snippets[0].content.contains("fun byId(id: Long): Order?"));
    assert!(snippets[1].content.contains("fun all(): List<Order>"));
    assert_eq!(snippets[1].required_type, vec!["demo.model.Order"]);

    assert_eq!(run_type_resolution(&config).unwrap(), 1);
    let types: Vec<RawDump> = read_json(&config.types_file()).unwrap();
    assert_eq!(types[0].path, "demo.model.Order");
    assert_eq!(types[0].content, MODEL);
}

#[test]
fn existing_filtered_file_is_reused() {
    let dir = tempdir().unwrap();
    let config = DatasetConfig::new(dir.path());
    seed(&config);
    fs::write(config.filtered_file(), "[]").unwrap();

    let summary = run_analysis(&config, &KotlinParser).unwrap();
    assert_eq!(summary.filtered, 0);
    assert_eq!(summary.snippets, 0);
}

#[test]
fn size_limit_drops_every_snippet() {
    let dir = tempdir().unwrap();
    let config = DatasetConfig::new(dir.path()).with_max_snippet_size(10);
    seed(&config);

    let summary = run_analysis(&config, &KotlinParser).unwrap();
    assert_eq!(summary.filtered, 1);
    assert_eq!(summary.snippets, 0);
}

#[test]
fn sqlite_export_counts_all_dumps() {
    let dir = tempdir().unwrap();
    let config = DatasetConfig::new(dir.path());
    seed(&config);

    assert_eq!(run_sqlite_export(&config).unwrap(), 3);
    assert!(config.database_file().exists());
}

#[test]
fn arrow_export_counts_all_dumps() {
    let dir = tempdir().unwrap();
    let config = DatasetConfig::new(dir.path());
    seed(&config);

    assert_eq!(run_arrow_export(&config).unwrap(), 3);
    assert!(config.arrow_file().exists());
}
