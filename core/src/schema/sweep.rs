//! # Unused-Definition Sweeper
//!
//! Fixed-point mark-and-sweep over the document. Roots are the schemas
//! reachable from any operation's parameters and responses; marking
//! follows `$ref` chains through definitions. Unmarked definitions are
//! removed, and the pass repeats until nothing is deleted.

use crate::spec::{Schema, Spec};
use indexmap::IndexMap;
use std::collections::HashSet;

/// Removes definitions not reachable from any operation root.
pub fn sweep_unused_definitions(spec: &mut Spec) {
    loop {
        let mut marked: HashSet<String> = HashSet::new();

        for path_item in spec.paths.values() {
            for operation in path_item.operations.values() {
                for parameter in &operation.parameters {
                    if let Some(schema) = &parameter.schema {
                        mark_schema(schema, &spec.definitions, &mut marked);
                    }
                }
                for response in operation.responses.values() {
                    if let Some(schema) = &response.schema {
                        mark_schema(schema, &spec.definitions, &mut marked);
                    }
                }
            }
        }

        let before = spec.definitions.len();
        spec.definitions.retain(|name, _| marked.contains(name));
        if spec.definitions.len() == before {
            break;
        }
    }
}

/// Marks every definition reachable from `schema`.
fn mark_schema(
    schema: &Schema,
    definitions: &IndexMap<String, Schema>,
    marked: &mut HashSet<String>,
) {
    if let Some(name) = schema.ref_name() {
        if marked.insert(name.to_string()) {
            if let Some(target) = definitions.get(name) {
                mark_schema(target, definitions, marked);
            }
        }
    }
    if let Some(items) = &schema.items {
        mark_schema(items, definitions, marked);
    }
    if let Some(additional) = &schema.additional_properties {
        mark_schema(additional, definitions, marked);
    }
    for property in schema.properties.values() {
        mark_schema(property, definitions, marked);
    }
    for member in &schema.all_of {
        mark_schema(member, definitions, marked);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{Operation, PathItem, Response};
    use pretty_assertions::assert_eq;

    fn spec_with_response_schema(schema: Schema) -> Spec {
        let mut spec = Spec::default();
        let mut operation = Operation::default();
        operation.responses.insert(
            "200".to_string(),
            Response {
                description: "OK".to_string(),
                schema: Some(schema),
                headers: IndexMap::new(),
            },
        );
        let mut item = PathItem::default();
        item.operations.insert("get".to_string(), operation);
        spec.paths.insert("/things".to_string(), item);
        spec
    }

    #[test]
    fn test_unreferenced_definition_is_removed() {
        let mut spec = spec_with_response_schema(Schema::reference("Used"));
        spec.definitions.insert("Used".into(), Schema::object());
        spec.definitions.insert("Orphan".into(), Schema::object());

        sweep_unused_definitions(&mut spec);

        assert!(spec.definitions.contains_key("Used"));
        assert!(!spec.definitions.contains_key("Orphan"));
    }

    #[test]
    fn test_transitive_references_survive() {
        let mut used = Schema::object();
        used.properties
            .insert("nested".to_string(), Schema::reference("Nested"));
        let mut spec = spec_with_response_schema(Schema::reference("Used"));
        spec.definitions.insert("Used".into(), used);
        spec.definitions.insert("Nested".into(), Schema::object());

        sweep_unused_definitions(&mut spec);

        assert_eq!(spec.definitions.len(), 2);
    }

    #[test]
    fn test_self_reference_terminates() {
        let mut recursive = Schema::object();
        recursive
            .properties
            .insert("next".to_string(), Schema::reference("Node"));
        let mut spec = spec_with_response_schema(Schema::reference("Node"));
        spec.definitions.insert("Node".into(), recursive);

        sweep_unused_definitions(&mut spec);

        assert!(spec.definitions.contains_key("Node"));
    }

    #[test]
    fn test_all_of_and_items_are_walked() {
        let mut composed = Schema::default();
        composed.all_of = vec![
            Schema::reference("Base"),
            Schema::array(Schema::reference("Item")),
        ];
        let mut spec = spec_with_response_schema(composed);
        spec.definitions.insert("Base".into(), Schema::object());
        spec.definitions.insert("Item".into(), Schema::object());
        spec.definitions.insert("Orphan".into(), Schema::object());

        sweep_unused_definitions(&mut spec);

        assert_eq!(spec.definitions.len(), 2);
    }

    #[test]
    fn test_no_roots_clears_everything() {
        let mut spec = Spec::default();
        spec.definitions.insert("A".into(), Schema::object());
        sweep_unused_definitions(&mut spec);
        assert!(spec.definitions.is_empty());
    }
}
