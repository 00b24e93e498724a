//! Loading schema trees from JSON documents.

use std::path::{Path, PathBuf};

use super::SchemaTree;

/// Errors raised while reading schema documents.
#[derive(Debug, thiserror::Error)]
pub enum SchemaLoadError {
    #[error("Failed to read schema file {1}: {0}")]
    Io(std::io::Error, PathBuf),

    #[error("Failed to parse schema file {1}: {0}")]
    Parse(serde_json::Error, PathBuf),
}

/// Read every file and merge their units into one tree.
///
/// Each file holds a serialized [`SchemaTree`]. Unit order in the result is
/// not significant; compilation sorts units by path.
pub fn load_schema_files<P: AsRef<Path>>(paths: &[P]) -> Result<SchemaTree, SchemaLoadError> {
    let mut tree = SchemaTree::default();

    for path in paths {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SchemaLoadError::Io(e, path.to_path_buf()))?;
        let parsed: SchemaTree = serde_json::from_str(&contents)
            .map_err(|e| SchemaLoadError::Parse(e, path.to_path_buf()))?;

        tracing::debug!(
            path = %path.display(),
            units = parsed.units.len(),
            "Loaded schema file"
        );
        tree.units.extend(parsed.units);
    }

    Ok(tree)
}
