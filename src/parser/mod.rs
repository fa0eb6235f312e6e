pub mod postman_parser;
pub mod variables;

use std::path::Path;

use tracing::info;

use crate::error::{PrepError, Result};
use crate::models::PostmanCollection;

pub use postman_parser::{PostmanParser, format_value};
pub use variables::{PostmanEnvironment, PostmanVariables, VariableResolver};

/// Read a Postman collection export from disk.
pub fn load_collection(path: &Path) -> Result<PostmanCollection> {
    let content = std::fs::read_to_string(path).map_err(|e| PrepError::io(path, e))?;
    let collection: PostmanCollection =
        serde_json::from_str(&content).map_err(|e| PrepError::json(path, e))?;

    info!(
        "Loaded collection {:?} from {}",
        collection.info.as_ref().and_then(|i| i.name.as_deref()).unwrap_or("<unnamed>"),
        path.display()
    );
    Ok(collection)
}

/// Variables for a collection: its own `variable` table, then the
/// environment file on top when one is given.
pub fn collection_variables(
    collection: &PostmanCollection,
    environment: Option<&Path>,
) -> Result<PostmanVariables> {
    let mut variables = PostmanVariables::new()
        .with_collection_variables(collection.variable.as_deref().unwrap_or_default());
    if let Some(path) = environment {
        variables = variables.with_environment(&PostmanEnvironment::load(path)?);
    }
    Ok(variables)
}
