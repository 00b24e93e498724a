//! Shared schema fixtures.

use serde_json::{Value, json};

use crate::{
    compiler::{self, CompiledUnit},
    schema::SchemaTree,
    validation::{HookRegistry, Validators},
};

/// `users/users.proto`: the user object used by most scenarios.
pub fn users_unit() -> Value {
    json!({
        "path": "users/users.proto",
        "package": "users",
        "options": { "allow_unknown_fields": false },
        "messages": [
            {
                "name": "User",
                "fields": [
                    { "name": "id", "type": { "scalar": "string" } },
                    { "name": "name", "type": { "scalar": "string" },
                      "options": { "required": ["create"] } },
                    { "name": "address", "type": { "message": ".users.Address" } },
                    { "name": "parents", "type": { "message": ".users.User.Parent" }, "repeated": true },
                    { "name": "labels", "type": { "message": ".users.User.LabelsEntry" }, "repeated": true },
                    { "name": "secret", "type": { "scalar": "string" },
                      "options": { "deny": ["update"] } },
                    { "name": "actor", "type": { "message": ".audit.Actor" } },
                    { "name": "extra", "type": { "message": ".google.protobuf.Struct" } },
                    { "name": "attachments", "type": { "message": ".google.protobuf.Any" }, "repeated": true }
                ],
                "nested": [
                    { "name": "Parent", "fields": [{ "name": "name", "type": { "scalar": "string" } }] },
                    {
                        "name": "LabelsEntry",
                        "map_entry": true,
                        "fields": [
                            { "name": "key", "type": { "scalar": "string" } },
                            { "name": "value", "type": { "scalar": "string" } }
                        ]
                    }
                ]
            },
            {
                "name": "Address",
                "fields": [
                    { "name": "city", "type": { "scalar": "string" } },
                    { "name": "zip", "type": { "scalar": "string" } }
                ]
            },
            {
                "name": "Account",
                "fields": [
                    { "name": "key", "type": { "scalar": "string" },
                      "options": { "required": ["create", "update", "replace"] } },
                    { "name": "owner", "type": { "message": ".users.User" } }
                ]
            },
            {
                "name": "UpdateUserRequest",
                "fields": [
                    { "name": "user", "type": { "message": ".users.User" } },
                    { "name": "update_mask", "type": { "scalar": "string" } }
                ]
            }
        ],
        "services": [{
            "name": "Users",
            "options": { "allow_unknown_fields": false },
            "methods": [
                {
                    "name": "Create",
                    "input_type": ".users.User",
                    "http": { "post": "/v1/users", "body": "*" }
                },
                {
                    "name": "Update",
                    "input_type": ".users.UpdateUserRequest",
                    "http": {
                        "patch": "/v1/users/{user.id}",
                        "body": "user",
                        "additional_bindings": [{ "put": "/v1/users/{user.id}", "body": "user" }]
                    }
                },
                {
                    "name": "Get",
                    "input_type": ".users.User",
                    "http": { "get": "/v1/users/{id}" }
                },
                {
                    "name": "Import",
                    "input_type": ".users.User",
                    "options": { "allow_unknown_fields": true },
                    "http": { "post": "/v1/users:import", "body": "*" }
                }
            ]
        }]
    })
}

/// `audit/audit.proto`: a second unit referenced from the users unit.
pub fn audit_unit() -> Value {
    json!({
        "path": "audit/audit.proto",
        "package": "audit",
        "messages": [{
            "name": "Actor",
            "fields": [
                { "name": "name", "type": { "scalar": "string" } },
                { "name": "kind", "type": { "scalar": "string" } }
            ]
        }],
        "services": [{
            "name": "Audit",
            "options": { "allow_unknown_fields": true },
            "methods": [{
                "name": "Record",
                "input_type": ".audit.Actor",
                "http": { "post": "/v1/audit", "body": "*" }
            }]
        }]
    })
}

pub fn tree(units: Vec<Value>) -> SchemaTree {
    serde_json::from_value(json!({ "units": units })).expect("fixture schema is valid")
}

/// Both fixture units, compiled.
pub fn compiled() -> Vec<CompiledUnit> {
    compiler::compile(&tree(vec![users_unit(), audit_unit()])).expect("fixture compiles")
}

pub fn validators(hooks: &HookRegistry) -> Validators {
    Validators::link(&compiled(), hooks).expect("fixture links")
}
