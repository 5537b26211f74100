use crate::engine::BuildContext;
use crate::error::Result;
use crate::generics::GenericBinding;
use crate::mock;
use crate::model::{PrimitiveType, TypeKind, TypeRef};
use crate::policy::FieldDecision;
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormEntryKind {
    Text,
    File,
}

/// One multipart form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormEntry {
    pub key: String,
    #[serde(rename = "type")]
    pub kind: FormEntryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub value: String,
}

impl FormEntry {
    fn text(key: String, value: String, description: Option<String>) -> Self {
        Self {
            key,
            kind: FormEntryKind::Text,
            description,
            value,
        }
    }

    fn file(key: String, description: Option<String>) -> Self {
        Self {
            key,
            kind: FormEntryKind::File,
            description,
            value: String::new(),
        }
    }
}

/// Flattens a request type into multipart form entries.
///
/// Nested objects become `parent.child` keys and object collections
/// `items[0].child`. Maps and unresolved generics have no form representation and
/// are left out.
pub struct FormDataMaterializer;

impl FormDataMaterializer {
    pub fn build(
        ctx: &mut BuildContext<'_>,
        root: &TypeRef,
        binding: &GenericBinding,
    ) -> Result<Vec<FormEntry>> {
        let mut entries = Vec::new();
        let root = ctx.normalize(root, binding);
        match ctx.kind_of(&root) {
            TypeKind::Object => Self::object(ctx, &root, binding, "", &mut entries)?,
            other => debug!("Form data for a {:?} root has no fields", other),
        }
        Ok(entries)
    }

    fn object(
        ctx: &mut BuildContext<'_>,
        ty: &TypeRef,
        binding: &GenericBinding,
        prefix: &str,
        entries: &mut Vec<FormEntry>,
    ) -> Result<()> {
        if ctx.is_self_reference(ty) || !ctx.enter(ty) {
            return Ok(());
        }

        let own_binding = ctx.bind(ty, binding);
        let provider = ctx.provider();
        let owner = provider.resolve(ty);
        let fields = provider.fields_of(&ty.name);
        let policy = ctx.policy();
        let direction = ctx.direction();

        ctx.within_object(ty, |ctx| -> Result<()> {
            for field in &fields {
                let literal = match policy.include(field, &owner, direction, ctx.groups()) {
                    FieldDecision::Skip => continue,
                    FieldDecision::Override(over) => over.value,
                    FieldDecision::Mock(value) => Some(value),
                    FieldDecision::Pass => None,
                };
                let key = format!("{}{}", prefix, policy.display_name(field, direction));
                let description = field.comment.clone();
                let field_binding = own_binding.scope_of(&field.declared_in);
                let field_ty = ctx.normalize(&field.declared_type, field_binding);

                match ctx.kind_of(&field_ty) {
                    TypeKind::Primitive(PrimitiveType::Binary) => {
                        entries.push(FormEntry::file(key, description));
                    }
                    kind @ (TypeKind::Primitive(_) | TypeKind::String) => {
                        let value = literal
                            .or_else(|| mock::mock_value(kind, &field.name))
                            .unwrap_or_default();
                        entries.push(FormEntry::text(key, value, description));
                    }
                    TypeKind::Enum => {
                        let value = literal.unwrap_or_else(|| enum_default(ctx, &field_ty));
                        entries.push(FormEntry::text(key, value, description));
                    }
                    TypeKind::Collection | TypeKind::Array => {
                        let Some(element) = field_ty.element() else {
                            continue;
                        };
                        let element = ctx.normalize(&element, field_binding);
                        match ctx.kind_of(&element) {
                            TypeKind::Primitive(PrimitiveType::Binary) => {
                                entries.push(FormEntry::file(key, description));
                            }
                            kind @ (TypeKind::Primitive(_) | TypeKind::String) => {
                                let value = literal
                                    .or_else(|| mock::mock_value(kind, &field.name))
                                    .unwrap_or_default();
                                entries.push(FormEntry::text(format!("{}[]", key), value, description));
                            }
                            TypeKind::Enum => {
                                let value = literal.unwrap_or_else(|| enum_default(ctx, &element));
                                entries.push(FormEntry::text(format!("{}[]", key), value, description));
                            }
                            TypeKind::Object => {
                                ctx.within_field(&ty.name, &field.name, |ctx| {
                                    ctx.within_element(|ctx| {
                                        Self::object(ctx, &element, field_binding, &format!("{}[0].", key), entries)
                                    })
                                })?;
                            }
                            _ => debug!("No form entry for {}.{}", ty, field.name),
                        }
                    }
                    TypeKind::Object => {
                        ctx.within_field(&ty.name, &field.name, |ctx| {
                            Self::object(ctx, &field_ty, field_binding, &format!("{}.", key), entries)
                        })?;
                    }
                    TypeKind::Map | TypeKind::GenericObject | TypeKind::ReactiveWrapper => {
                        debug!("No form entry for {}.{}", ty, field.name);
                    }
                }
            }
            Ok(())
        })
    }
}

fn enum_default(ctx: &BuildContext<'_>, ty: &TypeRef) -> String {
    ctx.provider()
        .resolve(ty)
        .default_constant()
        .map(|c| c.serialized().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DocConfig;
    use crate::engine::DocEngine;
    use crate::model::{FieldDescriptor, FieldTags, TypeCatalog, TypeDescriptor};
    use pretty_assertions::assert_eq;

    fn ty(s: &str) -> TypeRef {
        TypeRef::parse(s).unwrap()
    }

    fn catalog() -> TypeCatalog {
        [
            TypeDescriptor::object("Upload")
                .with_field(FieldDescriptor::parsed("file", "MultipartFile").with_comment("Attachment"))
                .with_field(FieldDescriptor::parsed("title", "String"))
                .with_field(FieldDescriptor::parsed("tags", "List<String>"))
                .with_field(FieldDescriptor::parsed("meta", "Map<String, String>"))
                .with_field(FieldDescriptor::parsed("owner", "Person"))
                .with_field(FieldDescriptor::parsed("reviewers", "List<Person>"))
                .with_field(FieldDescriptor::parsed("extra", "Object"))
                .with_field(FieldDescriptor::parsed("kind", "Kind"))
                .with_field(FieldDescriptor::parsed("internal", "String").with_tags(FieldTags {
                    ignore: true,
                    ..FieldTags::default()
                })),
            TypeDescriptor::object("Person")
                .with_field(FieldDescriptor::parsed("name", "String"))
                .with_field(FieldDescriptor::parsed("boss", "Person")),
            TypeDescriptor::enumeration("Kind", &["DOC", "IMAGE"]),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_form_entries() {
        let catalog = catalog();
        let config = DocConfig::default();
        let entries = DocEngine::new(&catalog, &config)
            .build_form_data(&ty("Upload"), &[])
            .unwrap();

        let keys: Vec<(&str, FormEntryKind, &str)> = entries
            .iter()
            .map(|e| (e.key.as_str(), e.kind, e.value.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("file", FormEntryKind::File, ""),
                ("title", FormEntryKind::Text, "sample"),
                ("tags[]", FormEntryKind::Text, "sample"),
                ("owner.name", FormEntryKind::Text, "sample"),
                ("reviewers[0].name", FormEntryKind::Text, "sample"),
                ("kind", FormEntryKind::Text, "DOC"),
            ]
        );
        assert_eq!(entries[0].description.as_deref(), Some("Attachment"));
    }

    #[test]
    fn test_non_object_root_has_no_entries() {
        let catalog = catalog();
        let config = DocConfig::default();
        let engine = DocEngine::new(&catalog, &config);
        assert!(engine.build_form_data(&ty("String"), &[]).unwrap().is_empty());
        assert!(engine.build_form_data(&ty("Map<String, Person>"), &[]).unwrap().is_empty());
    }

    #[test]
    fn test_entry_serialization() {
        let entry = FormEntry::file("avatar".to_string(), None);
        assert_eq!(
            serde_json::to_string(&entry).unwrap(),
            r#"{"key":"avatar","type":"file","value":""}"#
        );
    }
}
