use crate::engine::BuildContext;
use crate::error::{Error, Result};
use crate::example::{ExampleValue, MAP_KEY};
use crate::generics::{mentions_variable, GenericBinding};
use crate::mock;
use crate::model::{kind_display_name, EnumConstant, FieldDescriptor, TypeKind, TypeRef};
use crate::policy::FieldDecision;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

pub const NO_COMMENTS_FOUND: &str = "No comments found.";
pub const ANY_OBJECT_DESC: &str = "Any object.";
pub const DEFAULT_SINCE: &str = "-";

/// One row of a parameter table.
///
/// `children` stays empty in the flat list produced by [`ParamDescriptorBuilder`];
/// [`crate::tree::TreeReconstructor`] fills it in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamNode {
    pub id: u32,
    /// 0 for top-level rows
    pub parent_id: u32,
    /// Display path, e.g. `items[].customer.name`
    pub field_path: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub required: bool,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    pub since: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ParamNode>,
}

impl ParamNode {
    pub fn new(id: u32, parent_id: u32, field_path: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            id,
            parent_id,
            field_path: field_path.into(),
            type_name: type_name.into(),
            required: false,
            description: NO_COMMENTS_FOUND.to_string(),
            example_value: None,
            enum_values: None,
            since: DEFAULT_SINCE.to_string(),
            max_length: None,
            children: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id == 0
    }
}

/// Builds the flat, pre-ordered parameter rows of a type.
///
/// Ids follow `rows so far in this subtree + parent id + 1`, which numbers the
/// whole list 1..=n in pre-order. A branch refused by the registry guard yields no
/// rows at all.
pub struct ParamDescriptorBuilder;

impl ParamDescriptorBuilder {
    pub fn build(
        ctx: &mut BuildContext<'_>,
        root: &TypeRef,
        binding: &GenericBinding,
    ) -> Result<Vec<ParamNode>> {
        let mut rows = Vec::new();
        Self::root(ctx, root, binding, &mut rows)?;
        debug!("Built {} parameter rows for {}", rows.len(), root);
        Ok(rows)
    }

    fn root(
        ctx: &mut BuildContext<'_>,
        ty: &TypeRef,
        binding: &GenericBinding,
        rows: &mut Vec<ParamNode>,
    ) -> Result<()> {
        let ty = ctx.normalize(ty, binding);
        let kind = ctx.kind_of(&ty);
        match kind {
            TypeKind::Primitive(_) | TypeKind::String => {
                rows.push(Self::return_row(kind_display_name(kind)));
            }
            TypeKind::Enum => {
                let constants = ctx.provider().enum_constants_of(&ty.name);
                let mut row = Self::return_row("enum");
                row.description = append_listing(&row.description, &constants);
                row.enum_values = Some(serialized(&constants));
                rows.push(row);
            }
            TypeKind::Collection | TypeKind::Array => {
                if let Some(element) = ty.element() {
                    let element = ctx.normalize(&element, binding);
                    if matches!(ctx.kind_of(&element), TypeKind::Collection | TypeKind::Array) {
                        warn!("Nested collection {} has no parameter rows", ty);
                    } else {
                        ctx.within_element(|ctx| Self::root(ctx, &element, binding, rows))?;
                    }
                }
            }
            TypeKind::Map => {
                if ctx.unsupported_map_key(&ty)?.is_none() {
                    if let Some(value) = ty.args.get(1) {
                        ctx.within_element(|ctx| Self::root(ctx, value, binding, rows))?;
                    }
                }
            }
            TypeKind::GenericObject if ty.is_type_variable() => {
                warn!("Unresolved type variable {} at the root", ty);
            }
            TypeKind::GenericObject | TypeKind::ReactiveWrapper => {
                let mut row = ParamNode::new(1, 0, "any object", "object");
                row.description = ANY_OBJECT_DESC.to_string();
                rows.push(row);
            }
            TypeKind::Object => Self::object(ctx, &ty, binding, "", 0, rows)?,
        }
        Ok(())
    }

    fn return_row(type_name: &str) -> ParamNode {
        let mut row = ParamNode::new(1, 0, "-", type_name);
        row.description = format!("Return {}.", type_name);
        row
    }

    fn object(
        ctx: &mut BuildContext<'_>,
        ty: &TypeRef,
        binding: &GenericBinding,
        prefix: &str,
        parent_id: u32,
        rows: &mut Vec<ParamNode>,
    ) -> Result<()> {
        if !ctx.enter(ty) {
            return Ok(());
        }

        let own_binding = ctx.bind(ty, binding);
        let provider = ctx.provider();
        let owner = provider.resolve(ty);
        let fields = provider.fields_of(&ty.name);
        let policy = ctx.policy();
        let direction = ctx.direction();
        let base = rows.len();

        ctx.within_object(ty, |ctx| -> Result<()> {
            for field in &fields {
                let decision = policy.include(field, &owner, direction, ctx.groups());
                let (literal, override_desc) = match decision {
                    FieldDecision::Skip => continue,
                    FieldDecision::Override(over) => (over.value, over.description),
                    FieldDecision::Mock(value) => (Some(value), None),
                    FieldDecision::Pass => (None, None),
                };
                let row = FieldRow {
                    field,
                    path: format!("{}{}", prefix, policy.display_name(field, direction)),
                    id: (rows.len() - base) as u32 + parent_id + 1,
                    parent_id,
                    literal,
                    override_desc,
                    required: policy.is_required(field, &owner, direction, ctx.groups()),
                    max_length: policy.max_length(field),
                };
                ctx.within_field(&ty.name, &field.name, |ctx| {
                    Self::field(ctx, ty, own_binding.scope_of(&field.declared_in), row, rows)
                })?;
            }
            Ok(())
        })
    }

    fn field(
        ctx: &mut BuildContext<'_>,
        owner: &TypeRef,
        binding: &GenericBinding,
        plan: FieldRow<'_>,
        rows: &mut Vec<ParamNode>,
    ) -> Result<()> {
        let field = plan.field;
        let field_ty = ctx.normalize(&field.declared_type, binding);
        let kind = ctx.kind_of(&field_ty);

        let description = match plan.override_desc.clone().or_else(|| field.comment.clone()) {
            Some(description) => description,
            None if ctx.config().strict && ctx.direction().is_request() && kind.is_scalar() => {
                return Err(Error::DocumentationIncomplete {
                    owner: owner.name.clone(),
                    field: field.name.clone(),
                });
            }
            None => NO_COMMENTS_FOUND.to_string(),
        };

        let mut row = ParamNode::new(plan.id, plan.parent_id, plan.path.clone(), kind_display_name(kind));
        row.required = plan.required;
        row.description = description;
        row.since = field
            .tags
            .since
            .clone()
            .unwrap_or_else(|| DEFAULT_SINCE.to_string());
        row.max_length = plan.max_length.clone();
        if ctx.config().display_actual_type && mentions_variable(&field.declared_type) {
            row.description = format!("{} (ActualType: {})", row.description, field_ty);
        }

        // Object to expand below this row, and whether it sits behind a collection or map step
        let mut child: Option<(TypeRef, String, bool)> = None;
        match kind {
            TypeKind::Primitive(_) | TypeKind::String => {
                row.example_value = plan.literal.or_else(|| mock::mock_value(kind, &field.name));
            }
            TypeKind::Enum => {
                let constants = ctx.provider().enum_constants_of(&field_ty.name);
                row.example_value = plan.literal.or_else(|| default_constant(&constants));
                row.description = append_listing(&row.description, &constants);
                row.enum_values = Some(serialized(&constants));
            }
            TypeKind::Collection | TypeKind::Array => {
                row.example_value = plan.literal;
                if let Some(element) = field_ty.element() {
                    let element = ctx.normalize(&element, binding);
                    let element_kind = ctx.kind_of(&element);
                    match element_kind {
                        TypeKind::Primitive(_) | TypeKind::String => {
                            row.type_name = format!("array[{}]", kind_display_name(element_kind));
                            if row.example_value.is_none() {
                                let item = ExampleValue::scalar(
                                    element_kind,
                                    mock::mock_value(element_kind, &field.name).unwrap_or_default(),
                                );
                                row.example_value =
                                    Some(ExampleValue::Array(vec![item.clone(), item]).to_json().to_string());
                            }
                        }
                        TypeKind::Enum => {
                            let constants = ctx.provider().enum_constants_of(&element.name);
                            row.type_name = "array[enum]".to_string();
                            row.description = append_listing(&row.description, &constants);
                            row.enum_values = Some(serialized(&constants));
                        }
                        TypeKind::Object if !ctx.is_self_reference(&element) => {
                            child = Some((element, format!("{}[].", plan.path), true));
                        }
                        TypeKind::GenericObject if element.is_type_variable() => {
                            row.description =
                                format!("{} {}", row.description, ExampleValue::NON_DISPLAY_GENERICS);
                        }
                        TypeKind::Collection | TypeKind::Array => {
                            row.description =
                                format!("{} {}", row.description, ExampleValue::NON_DISPLAY_GENERICS);
                        }
                        _ => {}
                    }
                }
            }
            TypeKind::Map => {
                row.example_value = plan.literal;
                if let Some(key) = ctx.unsupported_map_key(&field_ty)? {
                    row.description = format!("{} (unsupported map key type {})", row.description, key);
                } else if let Some(value) = field_ty.args.get(1) {
                    let value = ctx.normalize(value, binding);
                    let value_kind = ctx.kind_of(&value);
                    match value_kind {
                        TypeKind::Primitive(_) | TypeKind::String => {
                            row.type_name = format!("map[{}]", kind_display_name(value_kind));
                            if row.example_value.is_none() {
                                let mock = mock::mock_value(value_kind, MAP_KEY).unwrap_or_default();
                                let mut entry = indexmap::IndexMap::new();
                                entry.insert(MAP_KEY.to_string(), ExampleValue::scalar(value_kind, mock));
                                row.example_value = Some(ExampleValue::Object(entry).to_json().to_string());
                            }
                        }
                        TypeKind::Object if !ctx.is_self_reference(&value) => {
                            child = Some((value, format!("{}.{}.", plan.path, MAP_KEY), true));
                        }
                        _ => {}
                    }
                }
            }
            TypeKind::GenericObject if field_ty.is_type_variable() => {
                warn!("Unresolved type variable {} on {}.{}", field_ty, owner, field.name);
                row.description = format!("{} {}", row.description, ExampleValue::NON_DISPLAY_GENERICS);
            }
            TypeKind::GenericObject | TypeKind::ReactiveWrapper => {
                row.example_value = plan.literal;
            }
            TypeKind::Object => {
                row.example_value = plan.literal;
                if ctx.is_self_reference(&field_ty) {
                    debug!("{}.{} refers to its own type", owner, field.name);
                } else {
                    child = Some((field_ty.clone(), format!("{}.", plan.path), false));
                }
            }
        }

        let id = row.id;
        rows.push(row);
        match child {
            Some((child_ty, prefix, true)) => {
                ctx.within_element(|ctx| Self::object(ctx, &child_ty, binding, &prefix, id, rows))?;
            }
            Some((child_ty, prefix, false)) => Self::object(ctx, &child_ty, binding, &prefix, id, rows)?,
            None => {}
        }
        Ok(())
    }
}

/// Row settings computed by the owning object before the field itself is expanded
struct FieldRow<'f> {
    field: &'f FieldDescriptor,
    path: String,
    id: u32,
    parent_id: u32,
    literal: Option<String>,
    override_desc: Option<String>,
    required: bool,
    max_length: Option<String>,
}

fn serialized(constants: &[EnumConstant]) -> Vec<String> {
    constants.iter().map(|c| c.serialized().to_string()).collect()
}

fn default_constant(constants: &[EnumConstant]) -> Option<String> {
    constants
        .iter()
        .find(|c| c.default)
        .or_else(|| constants.first())
        .map(|c| c.serialized().to_string())
}

/// `description` followed by the enum's values, e.g. `Status\nOPEN(Still open), CLOSED`
fn append_listing(description: &str, constants: &[EnumConstant]) -> String {
    if constants.is_empty() {
        return description.to_string();
    }
    let listing = constants
        .iter()
        .map(|c| match &c.description {
            Some(desc) => format!("{}({})", c.serialized(), desc),
            None => c.serialized().to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}\n{}", description, listing)
}
