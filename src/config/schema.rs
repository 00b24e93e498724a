use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Schema-tree sources.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaConfig {
    /// JSON schema-tree documents, merged in order.
    #[serde(default)]
    pub files: Vec<PathBuf>,
}

impl SchemaConfig {
    pub(crate) fn resolve_relative_to(&mut self, base: &Path) {
        for file in &mut self.files {
            if file.is_relative() {
                *file = base.join(&*file);
            }
        }
    }
}
