//! Validation option blocks and their resolution.
//!
//! Options are declared at four scopes. Only `allow_unknown_fields` is
//! hierarchical (method > service > file); the `deny` and `required`
//! operation lists are purely field-local.

use http::Method;
use serde::{Deserialize, Serialize};

use super::{MethodDecl, SchemaUnit, ServiceDecl};

/// File-scoped options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileValidateOption {
    #[serde(default)]
    pub allow_unknown_fields: bool,
}

/// Service-scoped options. A present block overrides the file scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceValidateOption {
    #[serde(default)]
    pub allow_unknown_fields: bool,
}

/// Method-scoped options. A present block overrides service and file scopes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MethodValidateOption {
    #[serde(default)]
    pub allow_unknown_fields: bool,
}

/// Field-scoped options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldValidateOption {
    /// Operations for which the field must not be present.
    #[serde(default)]
    pub deny: Vec<Operation>,

    /// Operations for which the field must be present.
    #[serde(default)]
    pub required: Vec<Operation>,
}

/// Resolve the permissiveness flag for a binding.
///
/// The nearest present option block wins. A missing file block means `false`.
pub fn resolve_allow_unknown(
    file: Option<&FileValidateOption>,
    service: Option<&ServiceValidateOption>,
    method: Option<&MethodValidateOption>,
) -> bool {
    if let Some(method) = method {
        return method.allow_unknown_fields;
    }
    if let Some(service) = service {
        return service.allow_unknown_fields;
    }
    file.is_some_and(|f| f.allow_unknown_fields)
}

impl SchemaUnit {
    /// Resolved `allow_unknown_fields` for a method declared in this unit.
    pub fn allow_unknown_for(&self, service: &ServiceDecl, method: &MethodDecl) -> bool {
        resolve_allow_unknown(
            self.options.as_ref(),
            service.options.as_ref(),
            method.options.as_ref(),
        )
    }

    /// File-level `allow_unknown_fields`, used for objects validated outside
    /// of any binding.
    pub fn file_allow_unknown(&self) -> bool {
        resolve_allow_unknown(self.options.as_ref(), None, None)
    }
}

/// Kind of write operation a field rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    Update,
    Replace,
}

impl Operation {
    pub const ALL: [Operation; 3] = [Operation::Create, Operation::Update, Operation::Replace];

    /// The HTTP verb this operation is carried by.
    pub fn http_method(self) -> Method {
        match self {
            Operation::Create => Method::POST,
            Operation::Update => Method::PATCH,
            Operation::Replace => Method::PUT,
        }
    }

    /// The operation carried by an HTTP verb, if any.
    pub fn from_method(method: &Method) -> Option<Self> {
        if method == Method::POST {
            Some(Operation::Create)
        } else if method == Method::PATCH {
            Some(Operation::Update)
        } else if method == Method::PUT {
            Some(Operation::Replace)
        } else {
            None
        }
    }

    fn bit(self) -> u8 {
        match self {
            Operation::Create => 0b001,
            Operation::Update => 0b010,
            Operation::Replace => 0b100,
        }
    }
}

/// Deduplicated set of operations.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct OperationSet(u8);

impl OperationSet {
    pub const EMPTY: OperationSet = OperationSet(0);

    pub fn contains(&self, op: Operation) -> bool {
        self.0 & op.bit() != 0
    }

    pub fn insert(&mut self, op: Operation) {
        self.0 |= op.bit();
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// True when every operation kind is included, making the rule
    /// independent of the active verb.
    pub fn is_all(&self) -> bool {
        Operation::ALL.iter().all(|op| self.contains(*op))
    }

    /// Whether the rule applies to a request with the given verb.
    pub fn applies_to(&self, method: Option<&Method>) -> bool {
        method
            .and_then(Operation::from_method)
            .is_some_and(|op| self.contains(op))
    }

    /// Operations in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = Operation> + '_ {
        Operation::ALL.into_iter().filter(|op| self.contains(*op))
    }

    /// HTTP verbs in canonical order.
    pub fn http_methods(&self) -> Vec<Method> {
        self.iter().map(Operation::http_method).collect()
    }
}

impl FromIterator<Operation> for OperationSet {
    fn from_iter<I: IntoIterator<Item = Operation>>(iter: I) -> Self {
        let mut set = OperationSet::EMPTY;
        for op in iter {
            set.insert(op);
        }
        set
    }
}

impl std::fmt::Debug for OperationSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl Serialize for OperationSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_method_overrides_service_and_file() {
        let file = FileValidateOption {
            allow_unknown_fields: false,
        };
        let service = ServiceValidateOption {
            allow_unknown_fields: false,
        };
        let method = MethodValidateOption {
            allow_unknown_fields: true,
        };
        assert!(resolve_allow_unknown(
            Some(&file),
            Some(&service),
            Some(&method)
        ));
    }

    #[test]
    fn test_explicit_false_at_method_wins() {
        let service = ServiceValidateOption {
            allow_unknown_fields: true,
        };
        let method = MethodValidateOption::default();
        assert!(!resolve_allow_unknown(None, Some(&service), Some(&method)));
    }

    #[test]
    fn test_absent_scopes_fall_through() {
        let file = FileValidateOption {
            allow_unknown_fields: true,
        };
        assert!(resolve_allow_unknown(Some(&file), None, None));
        assert!(!resolve_allow_unknown(None, None, None));
    }

    #[rstest]
    #[case::create(Operation::Create, Method::POST)]
    #[case::update(Operation::Update, Method::PATCH)]
    #[case::replace(Operation::Replace, Method::PUT)]
    fn test_operation_verb_mapping(#[case] op: Operation, #[case] method: Method) {
        assert_eq!(op.http_method(), method);
        assert_eq!(Operation::from_method(&method), Some(op));
    }

    #[test]
    fn test_non_write_verbs_have_no_operation() {
        assert_eq!(Operation::from_method(&Method::GET), None);
        assert_eq!(Operation::from_method(&Method::DELETE), None);
    }

    #[test]
    fn test_operation_set_dedup_and_order() {
        let set: OperationSet = [Operation::Replace, Operation::Create, Operation::Replace]
            .into_iter()
            .collect();
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![Operation::Create, Operation::Replace]
        );
        assert_eq!(set.http_methods(), vec![Method::POST, Method::PUT]);
        assert!(!set.is_all());
    }

    #[test]
    fn test_operation_set_applies_to() {
        let set: OperationSet = [Operation::Update].into_iter().collect();
        assert!(set.applies_to(Some(&Method::PATCH)));
        assert!(!set.applies_to(Some(&Method::POST)));
        assert!(!set.applies_to(None));

        let all: OperationSet = Operation::ALL.into_iter().collect();
        assert!(all.is_all());
    }
}
