//! Depth-first enumeration of the declarations a unit needs compiled.

use super::{HttpRule, MessageDecl, MethodDecl, SchemaUnit, ServiceDecl};

/// A message reached by the walk, with its qualified name.
#[derive(Debug, Clone, Copy)]
pub struct MessageRef<'a> {
    pub qualified_name: &'a str,
    pub decl: &'a MessageDecl,
}

/// One HTTP binding of one RPC method.
#[derive(Debug, Clone, Copy)]
pub struct BindingRef<'a> {
    pub service: &'a ServiceDecl,
    pub method: &'a MethodDecl,
    /// Zero-based position among the method's bindings.
    pub index: usize,
    pub rule: &'a HttpRule,
}

/// Result of walking a single unit.
///
/// Messages are listed parent first, then nested types, in declaration
/// order. Synthetic map-entry types are excluded from `messages` and listed
/// separately so field classification can recognize map fields.
#[derive(Debug)]
pub struct SchemaWalk<'a> {
    pub unit: &'a SchemaUnit,
    names: Vec<String>,
    decls: Vec<&'a MessageDecl>,
    map_entries: Vec<String>,
    pub bindings: Vec<BindingRef<'a>>,
}

impl<'a> SchemaWalk<'a> {
    pub fn new(unit: &'a SchemaUnit) -> Self {
        let mut walk = SchemaWalk {
            unit,
            names: Vec::new(),
            decls: Vec::new(),
            map_entries: Vec::new(),
            bindings: Vec::new(),
        };

        let scope = unit.scope();
        for message in &unit.messages {
            walk.visit_message(&scope, message);
        }

        for service in &unit.services {
            for method in &service.methods {
                let Some(rule) = &method.http else {
                    continue;
                };
                for (index, rule) in rule.bindings().enumerate() {
                    walk.bindings.push(BindingRef {
                        service,
                        method,
                        index,
                        rule,
                    });
                }
            }
        }

        walk
    }

    fn visit_message(&mut self, scope: &str, message: &'a MessageDecl) {
        let name = format!("{}.{}", scope, message.name);
        if message.map_entry {
            self.map_entries.push(name);
            return;
        }

        self.names.push(name.clone());
        self.decls.push(message);
        for nested in &message.nested {
            self.visit_message(&name, nested);
        }
    }

    /// Messages needing a validator.
    pub fn messages(&self) -> impl Iterator<Item = MessageRef<'_>> {
        self.names
            .iter()
            .zip(self.decls.iter())
            .map(|(name, decl)| MessageRef {
                qualified_name: name,
                decl,
            })
    }

    /// Qualified names of the synthetic map-entry types.
    pub fn map_entries(&self) -> impl Iterator<Item = &str> {
        self.map_entries.iter().map(String::as_str)
    }
}
