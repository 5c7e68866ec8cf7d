//! # AllOf Composer
//!
//! Composes a base schema with a set of per-field override schemas.
//! Output schemas are always fresh; a base retrieved from the definitions
//! map is never mutated in place.

use crate::spec::Schema;
use indexmap::IndexMap;

/// Composes `(base, {field -> override})` into one response schema.
///
/// No overrides returns the base unchanged. An empty-object base takes
/// the overrides directly as properties. Any other base becomes
/// `allOf: [base, {object with overrides}]`.
pub fn compose(base: Schema, overrides: IndexMap<String, Schema>) -> Schema {
    if overrides.is_empty() {
        return base;
    }

    if base.is_empty_object() {
        let mut merged = base;
        merged.schema_type = Some("object".to_string());
        merged.properties = overrides;
        return merged;
    }

    let mut override_object = Schema::object();
    override_object.properties = overrides;

    let mut composed = Schema::default();
    composed.all_of = vec![base, override_object];
    composed
}

/// Propagates override properties of a two-element `allOf` (base `$ref`
/// plus property object) up to the top-level schema, so consumers can
/// read override fields without walking `allOf`.
pub fn flatten_composed(mut schema: Schema) -> Schema {
    if schema.all_of.len() == 2 {
        let is_ref_base = schema.all_of[0].reference.is_some();
        let has_props = !schema.all_of[1].properties.is_empty();
        if is_ref_base && has_props && schema.properties.is_empty() {
            schema.properties = schema.all_of[1].properties.clone();
        }
    }
    schema
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn overrides_of(field: &str, schema: Schema) -> IndexMap<String, Schema> {
        let mut map = IndexMap::new();
        map.insert(field.to_string(), schema);
        map
    }

    #[test]
    fn test_no_overrides_returns_base() {
        let base = Schema::reference("Success");
        let composed = compose(base.clone(), IndexMap::new());
        assert_eq!(composed, base);
    }

    #[test]
    fn test_empty_object_base_merges_properties() {
        let composed = compose(
            Schema::object(),
            overrides_of("data", Schema::reference("Account")),
        );
        assert!(composed.all_of.is_empty());
        assert_eq!(
            composed.properties.get("data"),
            Some(&Schema::reference("Account"))
        );
    }

    #[test]
    fn test_ref_base_composes_all_of() {
        let composed = compose(
            Schema::reference("Success"),
            overrides_of("data", Schema::reference("Account")),
        );
        assert_eq!(composed.all_of.len(), 2);
        assert_eq!(composed.all_of[0], Schema::reference("Success"));
        assert_eq!(
            composed.all_of[1].properties.get("data"),
            Some(&Schema::reference("Account"))
        );
    }

    #[test]
    fn test_base_with_properties_composes_all_of() {
        let mut base = Schema::object();
        base.properties
            .insert("code".to_string(), Schema::primitive("integer", None));
        let composed = compose(base, overrides_of("data", Schema::object()));
        assert_eq!(composed.all_of.len(), 2);
    }

    #[test]
    fn test_flatten_composed_propagates_properties() {
        let composed = compose(
            Schema::reference("Success"),
            overrides_of("data", Schema::reference("Account")),
        );
        let flattened = flatten_composed(composed);
        assert_eq!(flattened.all_of.len(), 2);
        assert_eq!(
            flattened.properties.get("data"),
            Some(&Schema::reference("Account"))
        );
    }

    #[test]
    fn test_flatten_leaves_other_shapes_alone() {
        let plain = Schema::reference("Account");
        assert_eq!(flatten_composed(plain.clone()), plain);
    }
}
