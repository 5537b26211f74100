//! Build configuration, read once and shared read-only by every build call.

use crate::error::{Error, Result};
use crate::model::simple_name;
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Which side of an API call a type is documented for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Request,
    Response,
}

impl Direction {
    pub fn is_request(self) -> bool {
        self == Direction::Request
    }
}

/// Per-field override, keyed by `Owner.field` in [`DocConfig`].
///
/// A key without an owner (`field`) applies to that field name in every type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomField {
    /// Hide the field entirely
    pub ignore: bool,
    /// Literal example value
    pub value: Option<String>,
    /// Replacement description
    pub desc: Option<String>,
    /// Force the field to be required (request direction only)
    pub require: bool,
}

/// Documentation build settings.
///
/// Deserialized from camelCase keys; anything missing takes its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocConfig {
    /// Absolute nesting ceiling for object traversal
    pub recursion_limit: usize,
    /// Turn unsupported map keys and undocumented request parameters into errors
    pub strict: bool,
    pub skip_transient_field: bool,
    /// Snake-case request field names
    pub request_field_to_underline: bool,
    /// Snake-case response field names
    pub response_field_to_underline: bool,
    pub custom_request_fields: IndexMap<String, CustomField>,
    pub custom_response_fields: IndexMap<String, CustomField>,
    /// Named constants that mock values, override values and max lengths may refer to
    pub constants: IndexMap<String, String>,
    /// Generic envelope every response root is wrapped in, e.g. `CommonResult`
    pub response_wrapper: Option<String>,
    /// Append `(ActualType: X)` to rows whose declared type is a type variable
    pub display_actual_type: bool,
}

impl Default for DocConfig {
    fn default() -> Self {
        Self {
            recursion_limit: 7,
            strict: false,
            skip_transient_field: true,
            request_field_to_underline: false,
            response_field_to_underline: false,
            custom_request_fields: IndexMap::new(),
            custom_response_fields: IndexMap::new(),
            constants: IndexMap::new(),
            response_wrapper: None,
            display_actual_type: false,
        }
    }
}

impl DocConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: DocConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: DocConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file
    pub fn from_path(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            _ => Err(Error::InvalidArgument(format!(
                "unsupported configuration file extension: {}",
                path.display()
            ))),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.recursion_limit == 0 {
            return Err(Error::InvalidArgument(
                "recursionLimit must be at least 1".to_string(),
            ));
        }
        if let Some(wrapper) = &self.response_wrapper {
            crate::model::TypeRef::parse(wrapper)?;
        }
        Ok(())
    }

    pub fn custom_fields(&self, direction: Direction) -> &IndexMap<String, CustomField> {
        match direction {
            Direction::Request => &self.custom_request_fields,
            Direction::Response => &self.custom_response_fields,
        }
    }

    /// Override for `owner.field`, accepting qualified owner names and owner-less keys
    pub fn custom_field(&self, direction: Direction, owner: &str, field: &str) -> Option<&CustomField> {
        let fields = self.custom_fields(direction);
        if fields.is_empty() {
            return None;
        }
        let owner = simple_name(owner);
        fields
            .get(&format!("{}.{}", owner, field))
            .or_else(|| {
                fields.iter().find_map(|(key, custom)| match key.rsplit_once('.') {
                    Some((key_owner, key_field)) => {
                        (key_field == field && simple_name(key_owner) == owner).then_some(custom)
                    }
                    None => None,
                })
            })
            .or_else(|| fields.get(field))
    }

    pub fn underscore(&self, direction: Direction) -> bool {
        match direction {
            Direction::Request => self.request_field_to_underline,
            Direction::Response => self.response_field_to_underline,
        }
    }

    /// The literal a named constant stands for, or the value itself
    pub fn resolve_constant<'a>(&'a self, value: &'a str) -> &'a str {
        self.constants
            .get(value)
            .map(String::as_str)
            .unwrap_or(value)
    }

    /// Register an override; mostly useful when building a configuration in code
    pub fn with_custom_field(
        mut self,
        direction: Direction,
        key: impl Into<String>,
        field: CustomField,
    ) -> Self {
        match direction {
            Direction::Request => self.custom_request_fields.insert(key.into(), field),
            Direction::Response => self.custom_response_fields.insert(key.into(), field),
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = DocConfig::default();
        assert_eq!(config.recursion_limit, 7);
        assert!(!config.strict);
        assert!(config.skip_transient_field);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_with_partial_keys() {
        let config = DocConfig::from_yaml_str(
            r#"
recursionLimit: 3
strict: true
responseFieldToUnderline: true
customRequestFields:
  com.acme.Order.id:
    value: "42"
    require: true
  Order.secret:
    ignore: true
constants:
  NAME_MAX: "32"
"#,
        )
        .unwrap();

        assert_eq!(config.recursion_limit, 3);
        assert!(config.strict);
        assert!(config.skip_transient_field);
        assert!(config.underscore(Direction::Response));
        assert!(!config.underscore(Direction::Request));

        let id = config.custom_field(Direction::Request, "Order", "id").unwrap();
        assert_eq!(id.value.as_deref(), Some("42"));
        assert!(id.require);
        assert!(config.custom_field(Direction::Request, "Order", "secret").unwrap().ignore);
        assert!(config.custom_field(Direction::Response, "Order", "id").is_none());
        assert_eq!(config.resolve_constant("NAME_MAX"), "32");
        assert_eq!(config.resolve_constant("64"), "64");
    }

    #[test]
    fn test_owner_less_key_applies_everywhere() {
        let config = DocConfig::default().with_custom_field(
            Direction::Response,
            "createdBy",
            CustomField {
                desc: Some("Audit user".to_string()),
                ..CustomField::default()
            },
        );
        let custom = config
            .custom_field(Direction::Response, "Invoice", "createdBy")
            .unwrap();
        assert_eq!(custom.desc.as_deref(), Some("Audit user"));
    }

    #[test]
    fn test_zero_recursion_limit_is_rejected() {
        let err = DocConfig::from_json_str(r#"{"recursionLimit": 0}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_from_path_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("doc.json");
        fs::write(&path, r#"{"responseWrapper": "CommonResult", "displayActualType": true}"#).unwrap();

        let config = DocConfig::from_path(&path).unwrap();
        assert_eq!(config.response_wrapper.as_deref(), Some("CommonResult"));
        assert!(config.display_actual_type);

        let txt = temp_dir.path().join("doc.txt");
        fs::write(&txt, "").unwrap();
        assert!(DocConfig::from_path(&txt).is_err());
    }
}
