//! Resolved type model consumed by the traversal engine.
//!
//! The engine never parses sources or reflects over anything itself: it asks a
//! [`TypeModelProvider`] for [`TypeDescriptor`]s by name. [`TypeCatalog`] is the
//! in-memory provider, filled either from a YAML/JSON type-model file or from Rust
//! sources through [`source::SourceLoader`].
//!
//! # Example
//!
//! ```
//! use apidoc_materializer::model::{TypeCatalog, TypeKind, TypeModelProvider, TypeRef};
//!
//! let catalog = TypeCatalog::from_yaml_str(r#"
//! types:
//!   - name: Order
//!     fields:
//!       - name: id
//!         type: i64
//! "#).unwrap();
//!
//! let order = TypeRef::parse("Order").unwrap();
//! assert_eq!(catalog.kind_of(&order), TypeKind::Object);
//! assert_eq!(catalog.fields_of("Order").len(), 1);
//! ```

pub mod source;
pub mod type_ref;

pub use type_ref::{simple_name, TypeRef};

use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Closed classification of a type, dispatched on exhaustively by every builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TypeKind {
    Primitive(PrimitiveType),
    String,
    Collection,
    Array,
    Map,
    Enum,
    #[default]
    Object,
    /// Transparent single-argument wrapper (`Option<T>`, `Box<T>`, `Mono<T>`, ...)
    ReactiveWrapper,
    /// `Object`-like or unresolvable types, including bare type variables
    GenericObject,
}

impl TypeKind {
    /// Kinds rendered as a single literal
    pub fn is_scalar(&self) -> bool {
        matches!(self, TypeKind::Primitive(_) | TypeKind::String)
    }

    pub fn is_container(&self) -> bool {
        matches!(self, TypeKind::Collection | TypeKind::Array | TypeKind::Map)
    }
}

/// Primitive types supported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrimitiveType {
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Decimal,
    Boolean,
    Char,
    Date,
    DateTime,
    Time,
    Uuid,
    /// File uploads and raw byte payloads
    Binary,
}

impl PrimitiveType {
    /// Type name shown in parameter tables
    pub fn display_name(&self) -> &'static str {
        match self {
            PrimitiveType::Byte | PrimitiveType::Short | PrimitiveType::Int => "int32",
            PrimitiveType::Long => "int64",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
            PrimitiveType::Decimal => "number",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Char => "char",
            PrimitiveType::Date => "date",
            PrimitiveType::DateTime => "datetime",
            PrimitiveType::Time => "time",
            PrimitiveType::Uuid => "uuid",
            PrimitiveType::Binary => "file",
        }
    }
}

/// Display name of a kind in parameter tables
pub fn kind_display_name(kind: TypeKind) -> &'static str {
    match kind {
        TypeKind::Primitive(prim) => prim.display_name(),
        TypeKind::String => "string",
        TypeKind::Collection | TypeKind::Array => "array",
        TypeKind::Map => "map",
        TypeKind::Enum => "enum",
        TypeKind::Object | TypeKind::ReactiveWrapper | TypeKind::GenericObject => "object",
    }
}

/// Classify names the provider knows without a catalogue entry.
///
/// Both Rust and JVM spellings are accepted since type-model files may come from
/// either side.
pub fn builtin_kind(name: &str) -> Option<TypeKind> {
    let kind = match simple_name(name) {
        "String" | "str" | "string" | "CharSequence" | "OsString" | "PathBuf" => TypeKind::String,
        "i8" | "u8" | "byte" | "Byte" => TypeKind::Primitive(PrimitiveType::Byte),
        "i16" | "u16" | "short" | "Short" => TypeKind::Primitive(PrimitiveType::Short),
        "i32" | "u32" | "int" | "Integer" | "integer" | "NonZeroU32" => {
            TypeKind::Primitive(PrimitiveType::Int)
        }
        "i64" | "u64" | "i128" | "u128" | "isize" | "usize" | "long" | "Long" | "BigInteger"
        | "NonZeroU64" => TypeKind::Primitive(PrimitiveType::Long),
        "f32" | "float" | "Float" => TypeKind::Primitive(PrimitiveType::Float),
        "f64" | "double" | "Double" => TypeKind::Primitive(PrimitiveType::Double),
        "Decimal" | "BigDecimal" | "Number" | "number" => TypeKind::Primitive(PrimitiveType::Decimal),
        "bool" | "boolean" | "Boolean" => TypeKind::Primitive(PrimitiveType::Boolean),
        "char" | "Character" => TypeKind::Primitive(PrimitiveType::Char),
        "Date" | "LocalDate" | "NaiveDate" => TypeKind::Primitive(PrimitiveType::Date),
        "DateTime" | "LocalDateTime" | "NaiveDateTime" | "Instant" | "Timestamp"
        | "OffsetDateTime" | "ZonedDateTime" | "SystemTime" => {
            TypeKind::Primitive(PrimitiveType::DateTime)
        }
        "Time" | "LocalTime" | "NaiveTime" => TypeKind::Primitive(PrimitiveType::Time),
        "Uuid" | "UUID" => TypeKind::Primitive(PrimitiveType::Uuid),
        "MultipartFile" | "File" | "FilePart" | "Part" | "Bytes" => {
            TypeKind::Primitive(PrimitiveType::Binary)
        }
        "Vec" | "VecDeque" | "LinkedList" | "HashSet" | "BTreeSet" | "IndexSet" | "BinaryHeap"
        | "List" | "ArrayList" | "Set" | "TreeSet" | "LinkedHashSet" | "Collection"
        | "Iterable" | "Queue" | "Deque" => TypeKind::Collection,
        "HashMap" | "BTreeMap" | "IndexMap" | "Map" | "LinkedHashMap" | "TreeMap"
        | "ConcurrentHashMap" => TypeKind::Map,
        "Option" | "Optional" | "Box" | "Rc" | "Arc" | "Cow" | "RefCell" | "Cell" | "Mono"
        | "Flux" | "CompletableFuture" | "Future" | "Json" => TypeKind::ReactiveWrapper,
        "Object" | "Value" | "JsonValue" | "JSONObject" | "Any" | "?" => TypeKind::GenericObject,
        _ => return None,
    };
    Some(kind)
}

/// Resolved shape of a type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDescriptor {
    pub name: String,
    /// Declared type variables, in order (`["T"]` for `Page<T>`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_params: Vec<String>,
    /// Own fields in declaration order; inherited ones come from [`TypeModelProvider::fields_of`]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDescriptor>,
    /// Generic signature of the supertype, e.g. `Page<Order>` for `OrderPage extends Page<Order>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub super_type: Option<TypeRef>,
    #[serde(default)]
    pub kind: TypeKind,
    /// Enum constants in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constants: Vec<EnumConstant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Field names hidden by a type-level ignore annotation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignored_fields: Vec<String>,
}

impl TypeDescriptor {
    /// Create an object descriptor with no fields
    pub fn object(name: impl Into<String>) -> Self {
        Self::builtin(name, TypeKind::Object)
    }

    /// Descriptor synthesized for types without a catalogue entry
    pub fn builtin(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            type_params: Vec::new(),
            fields: Vec::new(),
            super_type: None,
            kind,
            constants: Vec::new(),
            comment: None,
            ignored_fields: Vec::new(),
        }
    }

    /// Create an enum descriptor from constant names
    pub fn enumeration(name: impl Into<String>, constants: &[&str]) -> Self {
        let mut descriptor = Self::builtin(name, TypeKind::Enum);
        descriptor.constants = constants.iter().map(|c| EnumConstant::new(*c)).collect();
        descriptor
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_type_params(mut self, params: &[&str]) -> Self {
        self.type_params = params.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn with_super_type(mut self, super_type: TypeRef) -> Self {
        self.super_type = Some(super_type);
        self
    }

    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }

    /// The constant used as the example value: the flagged default, else the first one
    pub fn default_constant(&self) -> Option<&EnumConstant> {
        self.constants
            .iter()
            .find(|c| c.default)
            .or_else(|| self.constants.first())
    }
}

/// One field of an object type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub name: String,
    /// Declared type, possibly a bare type variable
    #[serde(rename = "type")]
    pub declared_type: TypeRef,
    #[serde(default)]
    pub tags: FieldTags,
    #[serde(default)]
    pub is_transient: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Type that declares the field; filled in by [`TypeModelProvider::fields_of`]
    #[serde(default, skip_serializing)]
    pub declared_in: String,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, declared_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            declared_type,
            tags: FieldTags::default(),
            is_transient: false,
            comment: None,
            declared_in: String::new(),
        }
    }

    /// Shorthand taking the type in its textual form; panics on malformed input, test/fixture use only
    pub fn parsed(name: impl Into<String>, declared_type: &str) -> Self {
        let ty = TypeRef::parse(declared_type)
            .unwrap_or_else(|e| panic!("bad type reference in field definition: {}", e));
        Self::new(name, ty)
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_tags(mut self, tags: FieldTags) -> Self {
        self.tags = tags;
        self
    }

    pub fn transient(mut self) -> Self {
        self.is_transient = true;
        self
    }

    /// Generic signature with variable names retained, e.g. `List<T>`
    pub fn generic_signature(&self) -> String {
        self.declared_type.to_string()
    }
}

/// Annotations and doc tags attached to a field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldTags {
    /// Hidden from request documentation
    pub ignore: bool,
    /// Literal example value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mock: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<String>,
    /// Serialized name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rename: Option<String>,
    /// Never serialized, in either direction
    pub skip: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access: Option<FieldAccess>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validations: Vec<ValidationTag>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldAccess {
    ReadOnly,
    WriteOnly,
}

/// A validation constraint, optionally scoped to validation groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationTag {
    pub kind: ValidationKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
}

impl ValidationTag {
    pub fn new(kind: ValidationKind) -> Self {
        Self {
            kind,
            groups: Vec::new(),
        }
    }

    pub fn in_groups(kind: ValidationKind, groups: &[&str]) -> Self {
        Self {
            kind,
            groups: groups.iter().map(|g| g.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationKind {
    NotNull,
    NotEmpty,
    NotBlank,
    /// Must be absent; hides the field from requests of the matching groups
    Null,
}

impl ValidationKind {
    pub fn marks_required(&self) -> bool {
        matches!(
            self,
            ValidationKind::NotNull | ValidationKind::NotEmpty | ValidationKind::NotBlank
        )
    }
}

/// One enum constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumConstant {
    pub name: String,
    /// Designated external representation, when it differs from the name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Flagged as the serialization/default value
    #[serde(default)]
    pub default: bool,
}

impl EnumConstant {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            description: None,
            default: false,
        }
    }

    /// The value this constant serializes to
    pub fn serialized(&self) -> &str {
        self.value.as_deref().unwrap_or(&self.name)
    }
}

/// Source of resolved type descriptors.
///
/// Implementations are read-only once built, so a provider can be shared by
/// concurrent build calls without locking.
pub trait TypeModelProvider: Send + Sync {
    /// Catalogue entry for a (possibly qualified) type name
    fn lookup(&self, name: &str) -> Option<&TypeDescriptor>;

    /// Resolve a reference to its descriptor, synthesizing one for builtin and unknown names.
    fn resolve(&self, ty: &TypeRef) -> Cow<'_, TypeDescriptor> {
        if ty.is_array() {
            return Cow::Owned(TypeDescriptor::builtin(ty.to_string(), TypeKind::Array));
        }
        if let Some(descriptor) = self.lookup(&ty.name) {
            return Cow::Borrowed(descriptor);
        }
        let kind = if ty.is_type_variable() {
            TypeKind::GenericObject
        } else {
            builtin_kind(&ty.name).unwrap_or_else(|| {
                debug!("Type {} is unknown to the type model", ty.name);
                TypeKind::GenericObject
            })
        };
        Cow::Owned(TypeDescriptor::builtin(ty.name.clone(), kind))
    }

    fn kind_of(&self, ty: &TypeRef) -> TypeKind {
        self.resolve(ty).kind
    }

    /// Own fields followed by inherited ones, walking the supertype chain.
    ///
    /// A field redeclared by a subtype hides the supertype's field of the same name.
    fn fields_of(&self, name: &str) -> Vec<FieldDescriptor> {
        let mut fields = Vec::new();
        let mut seen_types = HashSet::new();
        let mut seen_fields = HashSet::new();
        let mut current = self.lookup(name);

        while let Some(descriptor) = current {
            if !seen_types.insert(descriptor.name.clone()) {
                warn!("Supertype chain of {} loops back to {}", name, descriptor.name);
                break;
            }
            for field in &descriptor.fields {
                if seen_fields.insert(field.name.clone()) {
                    let mut field = field.clone();
                    field.declared_in = descriptor.name.clone();
                    fields.push(field);
                }
            }
            current = descriptor
                .super_type
                .as_ref()
                .and_then(|super_type| self.lookup(&super_type.name));
        }
        fields
    }

    fn enum_constants_of(&self, name: &str) -> Vec<EnumConstant> {
        self.lookup(name)
            .map(|descriptor| descriptor.constants.clone())
            .unwrap_or_default()
    }
}

/// Immutable in-memory type catalogue.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    types: IndexMap<String, TypeDescriptor>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    types: Vec<TypeDescriptor>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a descriptor, returning the one it replaces
    pub fn insert(&mut self, descriptor: TypeDescriptor) -> Option<TypeDescriptor> {
        let key = simple_name(&descriptor.name).to_string();
        let previous = self.types.insert(key, descriptor);
        if let Some(previous) = &previous {
            warn!("Type {} is defined more than once; keeping the last definition", previous.name);
        }
        previous
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.values()
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let file: CatalogFile = serde_yaml::from_str(content)?;
        Ok(file.types.into_iter().collect())
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(content)?;
        Ok(file.types.into_iter().collect())
    }

    /// Load a type-model file, choosing the format by extension (`.json`, `.yaml`, `.yml`)
    pub fn from_path(path: &Path) -> Result<Self> {
        debug!("Loading type model from {}", path.display());
        let content = fs::read_to_string(path)?;
        let catalog = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content)?,
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content)?,
            _ => {
                return Err(Error::InvalidArgument(format!(
                    "unsupported type model file: {}",
                    path.display()
                )))
            }
        };
        debug!("Loaded {} types from {}", catalog.len(), path.display());
        Ok(catalog)
    }
}

impl FromIterator<TypeDescriptor> for TypeCatalog {
    fn from_iter<I: IntoIterator<Item = TypeDescriptor>>(iter: I) -> Self {
        let mut catalog = TypeCatalog::new();
        for descriptor in iter {
            catalog.insert(descriptor);
        }
        catalog
    }
}

impl TypeModelProvider for TypeCatalog {
    fn lookup(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(simple_name(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> TypeCatalog {
        [
            TypeDescriptor::object("Base")
                .with_type_params(&["T"])
                .with_field(FieldDescriptor::parsed("id", "i64"))
                .with_field(FieldDescriptor::parsed("data", "T")),
            TypeDescriptor::object("Order")
                .with_super_type(TypeRef::parse("Base<String>").unwrap())
                .with_field(FieldDescriptor::parsed("id", "String"))
                .with_field(FieldDescriptor::parsed("name", "String")),
            TypeDescriptor::enumeration("Status", &["OPEN", "CLOSED"]),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_builtin_classification() {
        let catalog = TypeCatalog::new();
        let kind = |s: &str| catalog.kind_of(&TypeRef::parse(s).unwrap());

        assert_eq!(kind("i32"), TypeKind::Primitive(PrimitiveType::Int));
        assert_eq!(kind("java.lang.Long"), TypeKind::Primitive(PrimitiveType::Long));
        assert_eq!(kind("String"), TypeKind::String);
        assert_eq!(kind("Vec<String>"), TypeKind::Collection);
        assert_eq!(kind("HashMap<String, i32>"), TypeKind::Map);
        assert_eq!(kind("Option<String>"), TypeKind::ReactiveWrapper);
        assert_eq!(kind("Order[]"), TypeKind::Array);
        assert_eq!(kind("T"), TypeKind::GenericObject);
        assert_eq!(kind("Unknown"), TypeKind::GenericObject);
    }

    #[test]
    fn test_catalogue_entries_take_precedence() {
        let catalog = catalog();
        assert_eq!(catalog.kind_of(&TypeRef::new("Status")), TypeKind::Enum);
        assert_eq!(catalog.kind_of(&TypeRef::new("Order")), TypeKind::Object);
        assert!(matches!(catalog.resolve(&TypeRef::new("Order")), Cow::Borrowed(_)));
    }

    #[test]
    fn test_fields_own_before_inherited_with_shadowing() {
        let catalog = catalog();
        let fields = catalog.fields_of("Order");
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();

        assert_eq!(names, vec!["id", "name", "data"]);
        assert_eq!(fields[0].declared_type.name, "String");
        assert_eq!(fields[0].declared_in, "Order");
        assert_eq!(fields[2].declared_in, "Base");
    }

    #[test]
    fn test_fields_of_cyclic_supertypes_terminates() {
        let catalog: TypeCatalog = [
            TypeDescriptor::object("A")
                .with_super_type(TypeRef::new("B"))
                .with_field(FieldDescriptor::parsed("a", "i32")),
            TypeDescriptor::object("B")
                .with_super_type(TypeRef::new("A"))
                .with_field(FieldDescriptor::parsed("b", "i32")),
        ]
        .into_iter()
        .collect();

        assert_eq!(catalog.fields_of("A").len(), 2);
    }

    #[test]
    fn test_default_constant_prefers_flagged_one() {
        let mut status = TypeDescriptor::enumeration("Status", &["OPEN", "CLOSED"]);
        assert_eq!(status.default_constant().unwrap().name, "OPEN");

        status.constants[1].default = true;
        status.constants[1].value = Some("closed".to_string());
        assert_eq!(status.default_constant().unwrap().serialized(), "closed");
    }

    #[test]
    fn test_catalog_from_yaml() {
        let yaml = r#"
types:
  - name: Page
    typeParams: [T]
    fields:
      - name: items
        type: List<T>
      - name: total
        type: long
        comment: total rows
        tags:
          mock: "42"
  - name: Status
    kind: enum
    constants:
      - name: OPEN
      - name: CLOSED
        value: closed
        default: true
"#;
        let catalog = TypeCatalog::from_yaml_str(yaml).unwrap();
        assert_eq!(catalog.len(), 2);

        let page = catalog.lookup("Page").unwrap();
        assert_eq!(page.type_params, vec!["T".to_string()]);
        assert_eq!(page.fields[0].generic_signature(), "List<T>");
        assert_eq!(page.fields[1].tags.mock.as_deref(), Some("42"));

        let constants = catalog.enum_constants_of("Status");
        assert_eq!(constants.len(), 2);
        assert!(constants[1].default);
    }

    #[test]
    fn test_catalog_from_json_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("model.json");
        fs::write(
            &path,
            r#"{"types":[{"name":"User","fields":[{"name":"id","type":"u32"}]}]}"#,
        )
        .unwrap();

        let catalog = TypeCatalog::from_path(&path).unwrap();
        assert!(catalog.lookup("com.acme.User").is_some());

        let bad = dir.path().join("model.txt");
        fs::write(&bad, "").unwrap();
        assert!(matches!(
            TypeCatalog::from_path(&bad),
            Err(Error::InvalidArgument(_))
        ));
    }
}
