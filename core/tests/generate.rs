//! End-to-end generation scenarios: source text in, document out.

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use swaggen_core::{Config, Generator, Spec};

fn build_spec_with(config: Config, files: &[(&str, &str, &str)]) -> Spec {
    let mut generator = Generator::new(config);
    for (pkg, path, source) in files {
        generator.collect_file(pkg, path, source, false).unwrap();
    }
    generator.build().unwrap()
}

fn build_spec(files: &[(&str, &str, &str)]) -> Spec {
    build_spec_with(Config::default(), files)
}

fn to_value(spec: &Spec) -> Value {
    serde_json::to_value(spec).unwrap()
}

/// Collects every `$ref` target reachable anywhere in the document.
fn collect_refs(value: &Value, refs: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(target)) = map.get("$ref") {
                refs.push(target.clone());
            }
            for nested in map.values() {
                collect_refs(nested, refs);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_refs(item, refs);
            }
        }
        _ => {}
    }
}

fn assert_refs_resolve(spec: &Spec) {
    let value = to_value(spec);
    let mut refs = Vec::new();
    collect_refs(&value, &mut refs);
    for target in refs {
        let name = target
            .strip_prefix("#/definitions/")
            .unwrap_or_else(|| panic!("malformed reference '{}'", target));
        assert!(
            spec.definitions.contains_key(name),
            "dangling reference '{}'",
            target
        );
    }
}

#[test]
fn scenario_json_omitempty_and_required() {
    let spec = build_spec(&[
        (
            "example.com/user",
            "user/user.go",
            r#"
package user

type User struct {
	Email string `json:"email,omitempty"`
	Name  string `json:"name" binding:"required"`
}
"#,
        ),
        (
            "example.com/handlers",
            "handlers/user.go",
            r#"
package handlers

// @Success 200 {object} user.User
// @Router /users/me [get]
func Me() {}
"#,
        ),
    ]);

    let value = to_value(&spec);
    assert_eq!(
        value["definitions"]["User"],
        json!({
            "type": "object",
            "properties": {
                "email": {"type": "string"},
                "name": {"type": "string"}
            },
            "required": ["name"]
        })
    );
    assert_refs_resolve(&spec);
}

#[test]
fn scenario_response_wrapper_with_data_override() {
    let spec = build_spec(&[
        (
            "example.com/response",
            "response/response.go",
            r#"
package response

type SuccessResponse struct {
	Code int         `json:"code"`
	Data interface{} `json:"data"`
}
"#,
        ),
        (
            "example.com/account",
            "account/account.go",
            r#"
package account

type Account struct {
	ID string `json:"id"`
}
"#,
        ),
        (
            "example.com/handlers",
            "handlers/account.go",
            r#"
package handlers

// @Success 200 {object} response.SuccessResponse{data=account.Account}
// @Router /accounts/{id} [get]
func GetAccount() {}
"#,
        ),
    ]);

    let value = to_value(&spec);
    let schema = &value["paths"]["/accounts/{id}"]["get"]["responses"]["200"]["schema"];
    assert_eq!(
        schema["allOf"][0],
        json!({"$ref": "#/definitions/SuccessResponse"})
    );
    assert_eq!(
        schema["allOf"][1]["properties"]["data"],
        json!({"$ref": "#/definitions/Account"})
    );
    // Overrides are also visible without walking allOf.
    assert_eq!(
        schema["properties"]["data"],
        json!({"$ref": "#/definitions/Account"})
    );
    assert_refs_resolve(&spec);
}

#[test]
fn scenario_array_override() {
    let spec = build_spec(&[
        (
            "example.com/app",
            "app/app.go",
            r#"
package app

type Response struct {
	Data interface{} `json:"data"`
}

type Account struct {
	ID string `json:"id"`
}
"#,
        ),
        (
            "example.com/app",
            "app/handlers.go",
            r#"
package app

// @Success 200 {object} Response{data=[]Account}
// @Router /accounts [get]
func List() {}
"#,
        ),
    ]);

    let value = to_value(&spec);
    let schema = &value["paths"]["/accounts"]["get"]["responses"]["200"]["schema"];
    assert_eq!(
        schema["allOf"][1]["properties"]["data"],
        json!({
            "type": "array",
            "items": {"$ref": "#/definitions/Account"}
        })
    );
    assert_refs_resolve(&spec);
}

#[test]
fn scenario_public_qualification_in_combined_type() {
    let spec = build_spec(&[
        (
            "example.com/app",
            "app/app.go",
            r#"
package app

type SuccessResponse struct {
	Code int         `json:"code"`
	Data interface{} `json:"data"`
}

type Account struct {
	ID     string `json:"id" public:"view"`
	Email  string `json:"email" public:"edit"`
	Secret string `json:"secret"`
}
"#,
        ),
        (
            "example.com/app",
            "app/handlers.go",
            r#"
package app

// @Public
// @Success 200 {object} SuccessResponse{data=Account}
// @Router /public/account [get]
func PublicAccount() {}
"#,
        ),
    ]);

    let value = to_value(&spec);
    let schema = &value["paths"]["/public/account"]["get"]["responses"]["200"]["schema"];
    // The base wrapper keeps its non-public form.
    assert_eq!(
        schema["allOf"][0],
        json!({"$ref": "#/definitions/SuccessResponse"})
    );
    // The payload becomes the public variant.
    assert_eq!(
        schema["allOf"][1]["properties"]["data"],
        json!({"$ref": "#/definitions/AccountPublic"})
    );

    let public = &value["definitions"]["AccountPublic"];
    assert_eq!(
        public["properties"],
        json!({
            "id": {"type": "string"},
            "email": {"type": "string"}
        })
    );
    assert_refs_resolve(&spec);
}

#[test]
fn scenario_enum_alias() {
    let spec = build_spec(&[
        (
            "example.com/role",
            "role/role.go",
            r#"
package role

type Role int

const (
	RoleAdmin Role = 1
	RoleUser  Role = 2
	RoleGuest Role = 3
)
"#,
        ),
        (
            "example.com/handlers",
            "handlers/role.go",
            r#"
package handlers

// @Success 200 {object} role.Role
// @Router /role [get]
func GetRole() {}
"#,
        ),
    ]);

    let value = to_value(&spec);
    assert_eq!(
        value["definitions"]["Role"],
        json!({
            "type": "integer",
            "enum": [1, 2, 3],
            "x-enum-varnames": ["RoleAdmin", "RoleUser", "RoleGuest"]
        })
    );
    assert_refs_resolve(&spec);
}

#[test]
fn scenario_embedded_struct_merges_fields() {
    let spec = build_spec(&[
        (
            "example.com/account",
            "account/account.go",
            r#"
package account

type Base struct {
	ID string `json:"id"`
}

type Account struct {
	Base
	Email string `json:"email"`
}
"#,
        ),
        (
            "example.com/handlers",
            "handlers/account.go",
            r#"
package handlers

// @Success 200 {object} account.Account
// @Router /account [get]
func GetAccount() {}
"#,
        ),
    ]);

    let value = to_value(&spec);
    assert_eq!(
        value["definitions"]["Account"]["properties"],
        json!({
            "id": {"type": "string"},
            "email": {"type": "string"}
        })
    );
    assert_refs_resolve(&spec);
}

#[test]
fn unused_definitions_are_swept() {
    let spec = build_spec(&[
        (
            "example.com/app",
            "app/app.go",
            r#"
package app

type Used struct {
	ID string `json:"id"`
}

type Unused struct {
	X string `json:"x"`
}
"#,
        ),
        (
            "example.com/app",
            "app/handlers.go",
            r#"
package app

// @Success 200 {object} Used
// @Router /used [get]
func GetUsed() {}
"#,
        ),
    ]);

    assert!(spec.definitions.contains_key("Used"));
    assert!(!spec.definitions.contains_key("Unused"));
    // The companion of an unreferenced public variant is swept too.
    assert!(!spec.definitions.contains_key("UnusedPublic"));
    assert_refs_resolve(&spec);
}

#[test]
fn cross_package_name_collision_disambiguates() {
    let spec = build_spec(&[
        (
            "example.com/account",
            "account/model.go",
            r#"
package account

type Model struct {
	ID string `json:"id"`
}
"#,
        ),
        (
            "example.com/billing",
            "billing/model.go",
            r#"
package billing

type Model struct {
	Total int `json:"total"`
}
"#,
        ),
        (
            "example.com/handlers",
            "handlers/both.go",
            r#"
package handlers

import (
	"example.com/account"
	"example.com/billing"
)

// @Success 200 {object} account.Model
// @Failure 402 {object} billing.Model
// @Router /both [get]
func Both() {}
"#,
        ),
    ]);

    assert!(spec.definitions.contains_key("account.Model"));
    assert!(spec.definitions.contains_key("billing.Model"));
    assert!(!spec.definitions.contains_key("Model"));
    assert_refs_resolve(&spec);
}

#[test]
fn self_referential_type_terminates() {
    let spec = build_spec(&[
        (
            "example.com/tree",
            "tree/node.go",
            r#"
package tree

type Node struct {
	Value    string  `json:"value"`
	Children []*Node `json:"children"`
}
"#,
        ),
        (
            "example.com/handlers",
            "handlers/tree.go",
            r#"
package handlers

// @Success 200 {object} tree.Node
// @Router /tree [get]
func GetTree() {}
"#,
        ),
    ]);

    let value = to_value(&spec);
    assert_eq!(
        value["definitions"]["Node"]["properties"]["children"]["items"],
        json!({"$ref": "#/definitions/Node"})
    );
    assert_refs_resolve(&spec);
}

#[test]
fn unresolved_type_emits_object_fallback() {
    let spec = build_spec(&[(
        "example.com/handlers",
        "handlers/get.go",
        r#"
package handlers

// @Success 200 {object} ghost.Missing
// @Router /ghost [get]
func GetGhost() {}
"#,
    )]);

    let value = to_value(&spec);
    assert_eq!(
        value["paths"]["/ghost"]["get"]["responses"]["200"]["schema"],
        json!({"type": "object"})
    );
}

#[test]
fn generic_wrapper_instantiation() {
    let spec = build_spec(&[
        (
            "example.com/response",
            "response/wrapper.go",
            r#"
package response

type Wrapper[T any] struct {
	Data  T   `json:"data"`
	Total int `json:"total"`
}
"#,
        ),
        (
            "example.com/account",
            "account/account.go",
            r#"
package account

type Account struct {
	ID string `json:"id"`
}
"#,
        ),
        (
            "example.com/handlers",
            "handlers/list.go",
            r#"
package handlers

// @Success 200 {object} response.Wrapper[account.Account]
// @Router /accounts [get]
func ListAccounts() {}
"#,
        ),
    ]);

    let value = to_value(&spec);
    assert_eq!(
        value["paths"]["/accounts"]["get"]["responses"]["200"]["schema"],
        json!({"$ref": "#/definitions/Wrapper[account_Account]"})
    );
    assert_eq!(
        value["definitions"]["Wrapper[account_Account]"]["properties"]["data"],
        json!({"$ref": "#/definitions/Account"})
    );
    assert_refs_resolve(&spec);
}

#[test]
fn snakecase_strategy_applies_to_untagged_fields() {
    let config = Config {
        property_strategy: swaggen_core::PropertyStrategy::SnakeCase,
        ..Config::default()
    };
    let spec = build_spec_with(
        config,
        &[
            (
                "example.com/user",
                "user/user.go",
                r#"
package user

type User struct {
	CreatedAt string `binding:"required"`
}
"#,
            ),
            (
                "example.com/handlers",
                "handlers/user.go",
                r#"
package handlers

// @Success 200 {object} user.User
// @Router /me [get]
func Me() {}
"#,
            ),
        ],
    );

    let value = to_value(&spec);
    assert_eq!(
        value["definitions"]["User"]["properties"]["created_at"],
        json!({"type": "string"})
    );
    assert_eq!(value["definitions"]["User"]["required"], json!(["created_at"]));
}

#[test]
fn definitions_are_sorted_by_name() {
    let spec = build_spec(&[
        (
            "example.com/app",
            "app/app.go",
            r#"
package app

type Zeta struct {
	A string `json:"a"`
}

type Alpha struct {
	Z *Zeta `json:"z"`
}
"#,
        ),
        (
            "example.com/app",
            "app/handlers.go",
            r#"
package app

// @Success 200 {object} Zeta
// @Failure 400 {object} Alpha
// @Router /sorted [get]
func Sorted() {}
"#,
        ),
    ]);

    let names: Vec<&String> = spec.definitions.keys().collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
}

#[test]
fn extended_primitives_stay_inline() {
    let spec = build_spec(&[
        (
            "example.com/event",
            "event/event.go",
            r#"
package event

import (
	"time"

	"github.com/google/uuid"
	"github.com/shopspring/decimal"
)

type Event struct {
	ID     uuid.UUID       `json:"id"`
	At     time.Time       `json:"at"`
	Amount decimal.Decimal `json:"amount"`
}
"#,
        ),
        (
            "example.com/handlers",
            "handlers/event.go",
            r#"
package handlers

// @Success 200 {object} event.Event
// @Router /events/latest [get]
func Latest() {}
"#,
        ),
    ]);

    let value = to_value(&spec);
    assert_eq!(
        value["definitions"]["Event"]["properties"],
        json!({
            "id": {"type": "string", "format": "uuid"},
            "at": {"type": "string", "format": "date-time"},
            "amount": {"type": "number"}
        })
    );
    assert_refs_resolve(&spec);
}
