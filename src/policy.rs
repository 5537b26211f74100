use crate::config::{CustomField, Direction, DocConfig};
use crate::model::{FieldAccess, FieldDescriptor, TypeDescriptor, ValidationKind};
use heck::ToSnakeCase;
use log::debug;

/// Outcome of [`FieldPolicy::include`] for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldDecision {
    /// Leave the field out
    Skip,
    /// A configured override; nested fields of object types are still traversed
    Override(FieldOverride),
    /// Example literal taken from the field's mock tag
    Mock(String),
    /// Synthesize everything from the type
    Pass,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldOverride {
    pub value: Option<String>,
    pub description: Option<String>,
    pub required: bool,
}

/// Direction-aware field inclusion, naming and override rules.
#[derive(Debug, Clone, Copy)]
pub struct FieldPolicy<'a> {
    config: &'a DocConfig,
}

impl<'a> FieldPolicy<'a> {
    pub fn new(config: &'a DocConfig) -> Self {
        Self { config }
    }

    /// Decide how `field` of `owner` is documented.
    ///
    /// Checked in order: transient skip, ignore rules, configured override, mock tag.
    pub fn include(
        &self,
        field: &FieldDescriptor,
        owner: &TypeDescriptor,
        direction: Direction,
        groups: &[String],
    ) -> FieldDecision {
        if field.is_transient && self.config.skip_transient_field {
            debug!("Skipping transient field {}.{}", owner.name, field.name);
            return FieldDecision::Skip;
        }
        if self.is_ignored(field, owner, direction, groups) {
            debug!("Skipping ignored field {}.{}", owner.name, field.name);
            return FieldDecision::Skip;
        }

        let mock = field
            .tags
            .mock
            .as_deref()
            .filter(|m| !m.is_empty())
            .map(|m| self.config.resolve_constant(m).to_string());

        if let Some(custom) = self.custom_field(field, owner, direction) {
            if custom.value.is_some() || custom.desc.is_some() || custom.require {
                return FieldDecision::Override(FieldOverride {
                    value: custom
                        .value
                        .as_deref()
                        .map(|v| self.config.resolve_constant(v).to_string())
                        .or(mock),
                    description: custom.desc.clone(),
                    required: custom.require && direction.is_request(),
                });
            }
        }

        match mock {
            Some(mock) => FieldDecision::Mock(mock),
            None => FieldDecision::Pass,
        }
    }

    fn is_ignored(
        &self,
        field: &FieldDescriptor,
        owner: &TypeDescriptor,
        direction: Direction,
        groups: &[String],
    ) -> bool {
        if field.tags.skip || owner.ignored_fields.iter().any(|f| f == &field.name) {
            return true;
        }
        if field.tags.ignore && direction.is_request() {
            return true;
        }
        match (field.tags.access, direction) {
            (Some(FieldAccess::ReadOnly), Direction::Request)
            | (Some(FieldAccess::WriteOnly), Direction::Response) => return true,
            _ => {}
        }
        if direction.is_request()
            && field
                .tags
                .validations
                .iter()
                .any(|v| v.kind == ValidationKind::Null && intersects(&v.groups, groups))
        {
            return true;
        }
        self.custom_field(field, owner, direction)
            .is_some_and(|custom| custom.ignore)
    }

    /// Override configured for the field, looked up on the owner first and then on
    /// the type that declares the field
    pub fn custom_field(
        &self,
        field: &FieldDescriptor,
        owner: &TypeDescriptor,
        direction: Direction,
    ) -> Option<&'a CustomField> {
        self.config
            .custom_field(direction, &owner.name, &field.name)
            .or_else(|| {
                if field.declared_in.is_empty() || field.declared_in == owner.name {
                    None
                } else {
                    self.config
                        .custom_field(direction, &field.declared_in, &field.name)
                }
            })
    }

    /// Serialized name, snake-cased when the direction asks for it
    pub fn display_name(&self, field: &FieldDescriptor, direction: Direction) -> String {
        let name = field.tags.rename.as_deref().unwrap_or(&field.name);
        if self.config.underscore(direction) {
            name.to_snake_case()
        } else {
            name.to_string()
        }
    }

    /// Whether the field is documented as required.
    ///
    /// In requests the first required-marking validation tag decides: it counts when
    /// its groups intersect the active ones, or when no group is active. The
    /// `@required` tag only counts when no such validation tag exists. A request
    /// override with `require` always wins.
    pub fn is_required(
        &self,
        field: &FieldDescriptor,
        owner: &TypeDescriptor,
        direction: Direction,
        groups: &[String],
    ) -> bool {
        if direction.is_request()
            && self
                .custom_field(field, owner, direction)
                .is_some_and(|custom| custom.require)
        {
            return true;
        }

        let validation = direction
            .is_request()
            .then(|| field.tags.validations.iter().find(|v| v.kind.marks_required()))
            .flatten();
        match validation {
            Some(tag) => groups.is_empty() || intersects(&tag.groups, groups),
            None => field.tags.required,
        }
    }

    /// Maximum length with named constants resolved
    pub fn max_length(&self, field: &FieldDescriptor) -> Option<String> {
        field
            .tags
            .max_length
            .as_deref()
            .map(|m| self.config.resolve_constant(m).to_string())
    }

    pub fn config(&self) -> &'a DocConfig {
        self.config
    }
}

fn intersects(tag_groups: &[String], active: &[String]) -> bool {
    tag_groups.iter().any(|g| active.iter().any(|a| a == g))
}
