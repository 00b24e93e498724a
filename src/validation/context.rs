use http::Method;

/// Per-request values visible to every validator in one call tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationContext {
    method: Option<Method>,
    allow_unknown_fields: Option<bool>,
}

impl ValidationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the active HTTP verb.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Set the resolved permissiveness flag of the matched binding.
    pub fn with_allow_unknown_fields(mut self, allow: bool) -> Self {
        self.allow_unknown_fields = Some(allow);
        self
    }

    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    /// The active verb, or an empty string when none is set.
    pub fn method_str(&self) -> &str {
        self.method.as_ref().map(Method::as_str).unwrap_or("")
    }

    pub fn allow_unknown_fields(&self) -> Option<bool> {
        self.allow_unknown_fields
    }
}

/// Append a field name to a document path.
pub fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

/// Path of the `index`-th element of the array at `parent`.
pub fn index_path(parent: &str, index: usize) -> String {
    format!("{}.[{}]", parent, index)
}
