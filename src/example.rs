use crate::engine::BuildContext;
use crate::error::Result;
use crate::generics::GenericBinding;
use crate::mock;
use crate::model::{PrimitiveType, TypeKind, TypeRef};
use crate::policy::FieldDecision;
use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Serialize, Serializer};
use serde_json::{json, Value};

/// Generated example payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExampleValue {
    /// Number or boolean literal, emitted bare when it reads as one
    Primitive(String),
    /// String-typed literal, always emitted quoted
    Text(String),
    Object(IndexMap<String, ExampleValue>),
    Array(Vec<ExampleValue>),
    /// Gap left by truncation or an unsupported shape; the string says why
    Placeholder(String),
}

impl ExampleValue {
    /// Branch cut by self-reference or the registry guard
    pub const CYCLE: &'static str = "cycle";
    pub const ANY_OBJECT: &'static str = "any object";
    pub const NON_DISPLAY_GENERICS: &'static str = "You may have used non-display generics.";
    pub const VOID: &'static str = "void";

    pub fn primitive(value: impl Into<String>) -> Self {
        ExampleValue::Primitive(value.into())
    }

    pub fn text(value: impl Into<String>) -> Self {
        ExampleValue::Text(value.into())
    }

    /// Literal for a field of `kind`, quoted unless the kind is numeric or boolean
    pub fn scalar(kind: TypeKind, value: impl Into<String>) -> Self {
        if is_bare_kind(kind) {
            ExampleValue::primitive(value)
        } else {
            ExampleValue::text(value)
        }
    }

    pub fn placeholder(reason: impl Into<String>) -> Self {
        ExampleValue::Placeholder(reason.into())
    }

    pub fn cycle() -> Self {
        ExampleValue::placeholder(Self::CYCLE)
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, ExampleValue::Placeholder(_))
    }

    /// Member of an object value
    pub fn get(&self, key: &str) -> Option<&ExampleValue> {
        match self {
            ExampleValue::Object(map) => map.get(key),
            _ => None,
        }
    }

    /// Render as JSON.
    ///
    /// Numeric and boolean primitives that parse as such are emitted bare. A cycle
    /// becomes `{"$ref":"..."}`, any other placeholder `{"warning": reason}`.
    pub fn to_json(&self) -> Value {
        match self {
            ExampleValue::Primitive(text) => bare_literal(text).unwrap_or_else(|| Value::String(text.clone())),
            ExampleValue::Text(text) => Value::String(text.clone()),
            ExampleValue::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
            ExampleValue::Array(items) => Value::Array(items.iter().map(ExampleValue::to_json).collect()),
            ExampleValue::Placeholder(reason) if reason == Self::CYCLE => json!({ "$ref": "..." }),
            ExampleValue::Placeholder(reason) => json!({ "warning": reason }),
        }
    }

    /// Convert parsed JSON (a mock literal, say) back into an example value
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => ExampleValue::primitive("null"),
            Value::Bool(b) => ExampleValue::primitive(b.to_string()),
            Value::Number(n) => ExampleValue::primitive(n.to_string()),
            Value::String(s) => ExampleValue::text(s.clone()),
            Value::Array(items) => ExampleValue::Array(items.iter().map(Self::from_json).collect()),
            Value::Object(map) => ExampleValue::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), Self::from_json(value)))
                    .collect(),
            ),
        }
    }
}

fn is_bare_kind(kind: TypeKind) -> bool {
    matches!(
        kind,
        TypeKind::Primitive(
            PrimitiveType::Byte
                | PrimitiveType::Short
                | PrimitiveType::Int
                | PrimitiveType::Long
                | PrimitiveType::Float
                | PrimitiveType::Double
                | PrimitiveType::Decimal
                | PrimitiveType::Boolean
        )
    )
}

fn bare_literal(text: &str) -> Option<Value> {
    match text {
        "true" => Some(Value::Bool(true)),
        "false" => Some(Value::Bool(false)),
        _ => text.parse::<serde_json::Number>().ok().map(Value::Number),
    }
}

impl Serialize for ExampleValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Recursive example synthesis over the type graph.
pub struct ExampleMaterializer;

impl ExampleMaterializer {
    /// Example value for `ty`, with type variables looked up in `binding`
    pub fn materialize(
        ctx: &mut BuildContext<'_>,
        ty: &TypeRef,
        binding: &GenericBinding,
    ) -> Result<ExampleValue> {
        let ty = ctx.normalize(ty, binding);
        let kind = ctx.kind_of(&ty);
        debug!("Materializing {} as {:?}", ty, kind);

        match kind {
            TypeKind::Primitive(_) | TypeKind::String => Ok(ExampleValue::scalar(
                kind,
                mock::mock_value(kind, ctx.current_field()).unwrap_or_default(),
            )),
            TypeKind::Enum => Ok(Self::enum_value(ctx, &ty)),
            TypeKind::Collection | TypeKind::Array => Self::collection(ctx, &ty, binding),
            TypeKind::Map => Self::map(ctx, &ty, binding),
            TypeKind::GenericObject if ty.is_type_variable() => {
                warn!("Unresolved type variable {} in {:?}", ty, ctx.current_field());
                Ok(ExampleValue::placeholder(ExampleValue::NON_DISPLAY_GENERICS))
            }
            TypeKind::GenericObject | TypeKind::ReactiveWrapper => {
                Ok(ExampleValue::placeholder(ExampleValue::ANY_OBJECT))
            }
            TypeKind::Object => Self::object(ctx, &ty, binding),
        }
    }

    fn enum_value(ctx: &BuildContext<'_>, ty: &TypeRef) -> ExampleValue {
        match ctx.provider().resolve(ty).default_constant() {
            Some(constant) => ExampleValue::text(constant.serialized()),
            None => ExampleValue::text(""),
        }
    }

    fn collection(
        ctx: &mut BuildContext<'_>,
        ty: &TypeRef,
        binding: &GenericBinding,
    ) -> Result<ExampleValue> {
        let Some(element) = ty.element() else {
            return Ok(ExampleValue::Array(vec![ExampleValue::placeholder(
                ExampleValue::ANY_OBJECT,
            )]));
        };
        let element = ctx.normalize(&element, binding);
        let kind = ctx.kind_of(&element);
        if matches!(kind, TypeKind::Collection | TypeKind::Array) {
            warn!("Nested collection {} is not expanded", ty);
            return Ok(ExampleValue::Array(vec![ExampleValue::placeholder(
                ExampleValue::NON_DISPLAY_GENERICS,
            )]));
        }

        let item = ctx.within_element(|ctx| Self::materialize(ctx, &element, binding))?;
        if kind.is_scalar() || kind == TypeKind::Enum {
            Ok(ExampleValue::Array(vec![item.clone(), item]))
        } else {
            Ok(ExampleValue::Array(vec![item]))
        }
    }

    fn map(ctx: &mut BuildContext<'_>, ty: &TypeRef, binding: &GenericBinding) -> Result<ExampleValue> {
        let ty = binding.substitute(ty);
        if let Some(key) = ctx.unsupported_map_key(&ty)? {
            return Ok(ExampleValue::placeholder(format!(
                "unsupported map key type {}",
                key
            )));
        }
        let value = match ty.args.get(1) {
            Some(value_ty) => ctx.within_element(|ctx| Self::materialize(ctx, value_ty, binding))?,
            None => ExampleValue::Object(IndexMap::new()),
        };
        let mut map = IndexMap::new();
        map.insert(MAP_KEY.to_string(), value);
        Ok(ExampleValue::Object(map))
    }

    fn object(ctx: &mut BuildContext<'_>, ty: &TypeRef, binding: &GenericBinding) -> Result<ExampleValue> {
        if ctx.is_self_reference(ty) {
            debug!("{} refers to itself", ty);
            return Ok(ExampleValue::cycle());
        }
        if !ctx.enter(ty) {
            return Ok(ExampleValue::cycle());
        }

        let own_binding = ctx.bind(ty, binding);
        let provider = ctx.provider();
        let owner = provider.resolve(ty);
        let fields = provider.fields_of(&ty.name);
        let policy = ctx.policy();
        let direction = ctx.direction();

        let entries = ctx.within_object(ty, |ctx| -> Result<IndexMap<String, ExampleValue>> {
            let mut entries = IndexMap::new();
            for field in &fields {
                let decision = policy.include(field, &owner, direction, ctx.groups());
                let literal = match decision {
                    FieldDecision::Skip => continue,
                    FieldDecision::Override(over) => over.value,
                    FieldDecision::Mock(value) => Some(value),
                    FieldDecision::Pass => None,
                };
                let field_binding = own_binding.scope_of(&field.declared_in);
                let field_ty = ctx.normalize(&field.declared_type, field_binding);
                let value = ctx.within_field(&ty.name, &field.name, |ctx| {
                    match literal.and_then(|l| Self::literal(ctx.kind_of(&field_ty), l)) {
                        Some(value) => Ok(value),
                        None => Self::materialize(ctx, &field_ty, field_binding),
                    }
                })?;
                entries.insert(policy.display_name(field, direction), value);
            }
            Ok(entries)
        })?;

        Ok(ExampleValue::Object(entries))
    }

    /// A configured literal for a field of the given kind.
    ///
    /// Scalars take it verbatim; containers and objects only when it parses as JSON,
    /// otherwise the field is still expanded from its type.
    fn literal(kind: TypeKind, literal: String) -> Option<ExampleValue> {
        if kind.is_scalar() || kind == TypeKind::Enum {
            return Some(ExampleValue::scalar(kind, literal));
        }
        serde_json::from_str::<Value>(&literal)
            .ok()
            .map(|value| ExampleValue::from_json(&value))
    }
}

/// Synthetic key used for the single entry of a map example
pub const MAP_KEY: &str = "mapKey";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CustomField, Direction, DocConfig};
    use crate::engine::DocEngine;
    use crate::model::{FieldDescriptor, FieldTags, TypeCatalog, TypeDescriptor};
    use pretty_assertions::assert_eq;

    fn ty(s: &str) -> TypeRef {
        TypeRef::parse(s).unwrap()
    }

    fn example(catalog: &TypeCatalog, config: &DocConfig, root: &str) -> ExampleValue {
        DocEngine::new(catalog, config)
            .build_example(&ty(root), Direction::Response, &[])
            .unwrap()
    }

    fn order_catalog() -> TypeCatalog {
        [
            TypeDescriptor::object("Order")
                .with_field(FieldDescriptor::parsed("id", "Integer"))
                .with_field(FieldDescriptor::parsed("name", "String"))
                .with_field(FieldDescriptor::parsed("tags", "List<String>")),
            TypeDescriptor::object("Page")
                .with_type_params(&["T"])
                .with_field(FieldDescriptor::parsed("items", "List<T>"))
                .with_field(FieldDescriptor::parsed("total", "long")),
            TypeDescriptor::object("Node").with_field(FieldDescriptor::parsed("next", "Node")),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_flat_object() {
        let catalog = order_catalog();
        let value = example(&catalog, &DocConfig::default(), "Order");

        let mut expected = IndexMap::new();
        expected.insert("id".to_string(), ExampleValue::primitive("0"));
        expected.insert("name".to_string(), ExampleValue::text("sample"));
        expected.insert(
            "tags".to_string(),
            ExampleValue::Array(vec![ExampleValue::text("sample"), ExampleValue::text("sample")]),
        );
        assert_eq!(value, ExampleValue::Object(expected));
    }

    #[test]
    fn test_generic_envelope() {
        let catalog = order_catalog();
        let value = example(&catalog, &DocConfig::default(), "Page<Order>");
        assert_eq!(
            value.to_json().to_string(),
            r#"{"items":[{"id":0,"name":"sample","tags":["sample","sample"]}],"total":0}"#
        );
    }

    #[test]
    fn test_raw_generic_type_warns() {
        let catalog = order_catalog();
        let value = example(&catalog, &DocConfig::default(), "Page");
        assert_eq!(
            value.get("items"),
            Some(&ExampleValue::Array(vec![ExampleValue::placeholder(
                ExampleValue::NON_DISPLAY_GENERICS
            )]))
        );
    }

    #[test]
    fn test_self_reference() {
        let catalog = order_catalog();
        let value = example(&catalog, &DocConfig::default(), "Node");
        assert_eq!(value.get("next"), Some(&ExampleValue::cycle()));
        assert_eq!(value.to_json().to_string(), r#"{"next":{"$ref":"..."}}"#);
    }

    #[test]
    fn test_collections_and_maps() {
        let catalog = order_catalog();
        let config = DocConfig::default();
        assert_eq!(
            example(&catalog, &config, "List<List<String>>").to_json().to_string(),
            r#"[{"warning":"You may have used non-display generics."}]"#
        );
        assert_eq!(
            example(&catalog, &config, "Map<String, Order>").to_json().to_string(),
            r#"{"mapKey":{"id":0,"name":"sample","tags":["sample","sample"]}}"#
        );
        assert_eq!(example(&catalog, &config, "Map").to_json().to_string(), r#"{"mapKey":{}}"#);
        assert_eq!(
            example(&catalog, &config, "Map<i64, String>"),
            ExampleValue::placeholder("unsupported map key type i64")
        );
        assert_eq!(
            example(&catalog, &config, "Order[]").to_json().to_string(),
            r#"[{"id":0,"name":"sample","tags":["sample","sample"]}]"#
        );
        assert_eq!(
            example(&catalog, &config, "List").to_json().to_string(),
            r#"[{"warning":"any object"}]"#
        );
    }

    #[test]
    fn test_strict_mode_accepts_only_string_keys() {
        let mut catalog = order_catalog();
        catalog.insert(TypeDescriptor::enumeration("Status", &["OPEN", "CLOSED"]));
        catalog.insert(
            TypeDescriptor::object("Holder")
                .with_field(FieldDescriptor::parsed("byName", "Map<String, String>"))
                .with_field(FieldDescriptor::parsed("byStatus", "Map<Status, String>"))
                .with_field(FieldDescriptor::parsed("byObject", "Map<Object, String>")),
        );

        let lenient = example(&catalog, &DocConfig::default(), "Holder");
        assert_eq!(
            lenient.to_json().to_string(),
            r#"{"byName":{"mapKey":"sample"},"byStatus":{"warning":"unsupported map key type Status"},"byObject":{"warning":"unsupported map key type Object"}}"#
        );

        let strict = DocConfig {
            strict: true,
            ..DocConfig::default()
        };
        match DocEngine::new(&catalog, &strict).build_example(&ty("Holder"), Direction::Response, &[]) {
            Err(crate::error::Error::Validation { owner, field, key_type }) => {
                assert_eq!(owner, "Holder");
                assert_eq!(field, "byStatus");
                assert_eq!(key_type, "Status");
            }
            other => panic!("expected a validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_mock_and_override_literals() {
        let mut catalog = order_catalog();
        catalog.insert(
            TypeDescriptor::object("Profile")
                .with_field(FieldDescriptor::parsed("nick", "String").with_tags(FieldTags {
                    mock: Some("neo".to_string()),
                    ..FieldTags::default()
                }))
                .with_field(FieldDescriptor::parsed("scores", "List<i32>").with_tags(FieldTags {
                    mock: Some("[1, 2, 3]".to_string()),
                    ..FieldTags::default()
                }))
                .with_field(FieldDescriptor::parsed("order", "Order").with_tags(FieldTags {
                    mock: Some("not json".to_string()),
                    ..FieldTags::default()
                }))
                .with_field(FieldDescriptor::parsed("level", "i32")),
        );
        let config = DocConfig::default().with_custom_field(
            Direction::Response,
            "Profile.level",
            CustomField {
                value: Some("9".to_string()),
                ..CustomField::default()
            },
        );

        let value = example(&catalog, &config, "Profile");
        assert_eq!(
            value.to_json().to_string(),
            r#"{"nick":"neo","scores":[1,2,3],"order":{"id":0,"name":"sample","tags":["sample","sample"]},"level":9}"#
        );
    }

    #[test]
    fn test_string_literals_stay_quoted() {
        let mut catalog = order_catalog();
        catalog.insert(
            TypeDescriptor::object("Zip")
                .with_field(FieldDescriptor::parsed("zipCode", "String").with_tags(FieldTags {
                    mock: Some("10001".to_string()),
                    ..FieldTags::default()
                }))
                .with_field(FieldDescriptor::parsed("flag", "String"))
                .with_field(FieldDescriptor::parsed("active", "bool"))
                .with_field(FieldDescriptor::parsed("born", "LocalDate").with_tags(FieldTags {
                    mock: Some("2000".to_string()),
                    ..FieldTags::default()
                })),
        );
        let config = DocConfig::default().with_custom_field(
            Direction::Response,
            "Zip.flag",
            CustomField {
                value: Some("true".to_string()),
                ..CustomField::default()
            },
        );

        let value = example(&catalog, &config, "Zip");
        assert_eq!(
            value.to_json().to_string(),
            r#"{"zipCode":"10001","flag":"true","active":true,"born":"2000"}"#
        );
    }

    #[test]
    fn test_collection_elements_are_one_level_deeper() {
        let catalog: TypeCatalog = [
            TypeDescriptor::object("Trunk").with_field(FieldDescriptor::parsed("branch", "Branch")),
            TypeDescriptor::object("Branch").with_field(FieldDescriptor::parsed("leaf", "Leaf")),
            TypeDescriptor::object("Leaf").with_field(FieldDescriptor::parsed("value", "i32")),
        ]
        .into_iter()
        .collect();
        let config = DocConfig {
            recursion_limit: 1,
            ..DocConfig::default()
        };

        assert_eq!(
            example(&catalog, &config, "Trunk").to_json().to_string(),
            r#"{"branch":{"leaf":{"$ref":"..."}}}"#
        );
        assert_eq!(
            example(&catalog, &config, "List<Trunk>").to_json().to_string(),
            r#"[{"branch":{"$ref":"..."}}]"#
        );
        assert_eq!(
            example(&catalog, &config, "Map<String, Trunk>").to_json().to_string(),
            r#"{"mapKey":{"branch":{"$ref":"..."}}}"#
        );
    }

    #[test]
    fn test_inherited_fields_use_supertype_binding() {
        let mut catalog = order_catalog();
        catalog.insert(
            TypeDescriptor::object("Wrapper")
                .with_type_params(&["T"])
                .with_field(FieldDescriptor::parsed("value", "T")),
        );
        catalog.insert(
            TypeDescriptor::object("Listing")
                .with_type_params(&["T"])
                .with_super_type(ty("Wrapper<List<T>>"))
                .with_field(FieldDescriptor::parsed("first", "T")),
        );

        let value = example(&catalog, &DocConfig::default(), "Listing<Order>");
        assert_eq!(
            value.to_json().to_string(),
            r#"{"first":{"id":0,"name":"sample","tags":["sample","sample"]},"value":[{"id":0,"name":"sample","tags":["sample","sample"]}]}"#
        );
    }

    #[test]
    fn test_serialize_matches_to_json() {
        let value = ExampleValue::Array(vec![
            ExampleValue::primitive("007"),
            ExampleValue::primitive("1.5"),
            ExampleValue::primitive("false"),
            ExampleValue::text("42"),
            ExampleValue::placeholder("any object"),
        ]);
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"["007",1.5,false,"42",{"warning":"any object"}]"#
        );
    }
}
