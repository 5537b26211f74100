//! Builds a [`TypeCatalog`] from Rust source files.
//!
//! Structs become object descriptors and enums become enum descriptors. Serde and
//! validator attributes, plus `@tag value` lines inside doc comments, are mapped onto
//! [`FieldTags`]:
//!
//! | Source | Model |
//! |---|---|
//! | `#[serde(rename = "x")]`, `#[serde(rename_all = "camelCase")]` | `tags.rename` / constant `value` |
//! | `#[serde(skip)]`, or both one-way skips | `tags.skip` |
//! | `#[serde(skip_serializing)]` | write-only access (request only) |
//! | `#[serde(skip_deserializing)]` | read-only access (response only) |
//! | first `#[serde(flatten)]` on a named type | `super_type` (its fields are inherited) |
//! | `#[validate(required)]` | not-null validation tag |
//! | `#[validate(length(max = N))]` | `tags.max_length` |
//! | `/// @mock v`, `@ignore`, `@since v`, `@required` | matching tag |
//! | `#[default]` on a variant | default enum constant |

use super::{
    builtin_kind, EnumConstant, FieldAccess, FieldDescriptor, FieldTags, TypeCatalog, TypeDescriptor, TypeKind,
    TypeRef, ValidationKind, ValidationTag,
};
use crate::error::{Error, Result};
use crate::scanner::SourceScanner;
use heck::{
    ToKebabCase, ToLowerCamelCase, ToShoutyKebabCase, ToShoutySnakeCase, ToSnakeCase,
    ToUpperCamelCase,
};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use syn::visit::Visit;

/// Loads type descriptors from a directory of Rust sources.
pub struct SourceLoader {
    root: PathBuf,
}

impl SourceLoader {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Scan the root directory and describe every struct and enum found.
    ///
    /// Files that fail to parse are logged and skipped so that a single broken file
    /// does not hide the rest of the model.
    pub fn load(&self) -> Result<TypeCatalog> {
        let scan = SourceScanner::new(self.root.clone()).scan()?;
        for warning in &scan.warnings {
            warn!("{}", warning);
        }
        debug!("Loading types from {} Rust files", scan.rust_files.len());

        let mut catalog = TypeCatalog::new();
        for path in &scan.rust_files {
            match Self::parse_file(path) {
                Ok(file) => {
                    for descriptor in Self::describe_file(&file) {
                        catalog.insert(descriptor);
                    }
                }
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }
        debug!("Loaded {} types from {}", catalog.len(), self.root.display());
        Ok(catalog)
    }

    pub fn parse_file(path: &Path) -> Result<syn::File> {
        debug!("Parsing file: {}", path.display());
        let content = fs::read_to_string(path)?;
        syn::parse_file(&content).map_err(|e| Error::Parse {
            file: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Describe the types declared in a source string
    pub fn load_str(code: &str) -> Result<TypeCatalog> {
        let file = syn::parse_file(code)?;
        Ok(Self::describe_file(&file).into_iter().collect())
    }

    /// Describe every struct and enum in a parsed file, including those in inline modules
    pub fn describe_file(file: &syn::File) -> Vec<TypeDescriptor> {
        let mut collector = ItemCollector::default();
        collector.visit_file(file);
        collector.descriptors
    }
}

#[derive(Default)]
struct ItemCollector {
    descriptors: Vec<TypeDescriptor>,
}

impl<'ast> Visit<'ast> for ItemCollector {
    fn visit_item_struct(&mut self, item: &'ast syn::ItemStruct) {
        self.descriptors.push(describe_struct(item));
    }

    fn visit_item_enum(&mut self, item: &'ast syn::ItemEnum) {
        self.descriptors.push(describe_enum(item));
    }
}

fn describe_struct(item: &syn::ItemStruct) -> TypeDescriptor {
    let name = item.ident.to_string();
    debug!("Describing struct {}", name);

    let container = SerdeAttrs::parse(&item.attrs);
    let (comment, _) = DocComment::parse(&item.attrs).split();
    let mut descriptor = TypeDescriptor::object(name);
    descriptor.comment = comment;
    descriptor.type_params = item
        .generics
        .type_params()
        .map(|param| param.ident.to_string())
        .collect();

    if let syn::Fields::Named(named) = &item.fields {
        for field in &named.named {
            let Some(ident) = field.ident.as_ref() else {
                continue;
            };
            let field_name = ident.to_string();
            let declared_type = type_ref_of(&field.ty);
            let serde = SerdeAttrs::parse(&field.attrs);

            if serde.flatten && builtin_kind(&declared_type.name).is_none() {
                if descriptor.super_type.is_none() {
                    debug!("{} inherits the fields of {}", descriptor.name, declared_type);
                    descriptor.super_type = Some(declared_type);
                    continue;
                }
                warn!(
                    "{} flattens more than one type; {}.{} is documented as a nested object",
                    descriptor.name, descriptor.name, field_name
                );
            }

            let (comment, mut tags) = DocComment::parse(&field.attrs).split();
            tags.rename = serde.rename.or_else(|| {
                container
                    .rename_all
                    .as_deref()
                    .map(|rule| apply_rename_rule(rule, &field_name))
                    .filter(|renamed| renamed != &field_name)
            });
            match (serde.skip_serializing, serde.skip_deserializing) {
                (true, true) => tags.skip = true,
                (true, false) => tags.access = Some(FieldAccess::WriteOnly),
                (false, true) => tags.access = Some(FieldAccess::ReadOnly),
                (false, false) => {}
            }
            tags.skip |= serde.skip;
            apply_validate_attrs(&field.attrs, &mut tags);

            let mut descriptor_field = FieldDescriptor::new(field_name, declared_type).with_tags(tags);
            descriptor_field.comment = comment;
            descriptor.fields.push(descriptor_field);
        }
    }

    debug!("Described {} fields", descriptor.fields.len());
    descriptor
}

fn describe_enum(item: &syn::ItemEnum) -> TypeDescriptor {
    let name = item.ident.to_string();
    debug!("Describing enum {}", name);

    let container = SerdeAttrs::parse(&item.attrs);
    let mut descriptor = TypeDescriptor::builtin(name, TypeKind::Enum);
    descriptor.comment = DocComment::parse(&item.attrs).split().0;

    for variant in &item.variants {
        let variant_name = variant.ident.to_string();
        let serde = SerdeAttrs::parse(&variant.attrs);
        let value = serde.rename.or_else(|| {
            container
                .rename_all
                .as_deref()
                .map(|rule| apply_rename_rule(rule, &variant_name))
        });

        let mut constant = EnumConstant::new(variant_name);
        constant.value = value.filter(|v| v != &constant.name);
        constant.description = DocComment::parse(&variant.attrs).split().0;
        constant.default = variant.attrs.iter().any(|a| a.path().is_ident("default"));
        descriptor.constants.push(constant);
    }

    debug!("Described {} constants", descriptor.constants.len());
    descriptor
}

/// Convert a `syn::Type` into a [`TypeRef`]
pub fn type_ref_of(ty: &syn::Type) -> TypeRef {
    match ty {
        syn::Type::Path(type_path) => type_ref_of_path(&type_path.path),
        syn::Type::Reference(reference) => match reference.elem.as_ref() {
            syn::Type::Slice(slice) => TypeRef::array_of(type_ref_of(&slice.elem)),
            other => type_ref_of(other),
        },
        syn::Type::Slice(slice) => TypeRef::array_of(type_ref_of(&slice.elem)),
        syn::Type::Array(array) => TypeRef::array_of(type_ref_of(&array.elem)),
        syn::Type::Paren(paren) => type_ref_of(&paren.elem),
        syn::Type::Group(group) => type_ref_of(&group.elem),
        _ => TypeRef::new("Object"),
    }
}

fn type_ref_of_path(path: &syn::Path) -> TypeRef {
    let Some(segment) = path.segments.last() else {
        return TypeRef::new("Object");
    };
    let mut ty = TypeRef::new(segment.ident.to_string());
    if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
        for arg in &args.args {
            if let syn::GenericArgument::Type(inner) = arg {
                ty.args.push(type_ref_of(inner));
            }
        }
    }
    ty
}

/// Apply a serde `rename_all` rule to an identifier
pub fn apply_rename_rule(rule: &str, name: &str) -> String {
    match rule {
        "lowercase" => name.to_lowercase(),
        "UPPERCASE" => name.to_uppercase(),
        "camelCase" => name.to_lower_camel_case(),
        "PascalCase" => name.to_upper_camel_case(),
        "snake_case" => name.to_snake_case(),
        "SCREAMING_SNAKE_CASE" => name.to_shouty_snake_case(),
        "kebab-case" => name.to_kebab_case(),
        "SCREAMING-KEBAB-CASE" => name.to_shouty_kebab_case(),
        other => {
            warn!("Unknown rename rule {}, keeping {}", other, name);
            name.to_string()
        }
    }
}

#[derive(Debug, Default)]
struct SerdeAttrs {
    rename: Option<String>,
    rename_all: Option<String>,
    skip: bool,
    skip_serializing: bool,
    skip_deserializing: bool,
    flatten: bool,
}

impl SerdeAttrs {
    fn parse(attrs: &[syn::Attribute]) -> Self {
        let mut out = SerdeAttrs::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
            let result = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    out.rename = string_or_serialize(&meta)?;
                } else if meta.path.is_ident("rename_all") {
                    out.rename_all = string_or_serialize(&meta)?;
                } else if meta.path.is_ident("skip") {
                    out.skip = true;
                } else if meta.path.is_ident("skip_serializing") {
                    out.skip_serializing = true;
                } else if meta.path.is_ident("skip_deserializing") {
                    out.skip_deserializing = true;
                } else if meta.path.is_ident("flatten") {
                    out.flatten = true;
                } else {
                    skip_meta_value(&meta)?;
                }
                Ok(())
            });
            if let Err(e) = result {
                debug!("Ignoring unparsable serde attribute: {}", e);
            }
        }
        out
    }
}

/// `key = "value"` or `key(serialize = "value", ...)`
fn string_or_serialize(meta: &syn::meta::ParseNestedMeta) -> syn::Result<Option<String>> {
    if meta.input.peek(syn::Token![=]) {
        let lit: syn::LitStr = meta.value()?.parse()?;
        return Ok(Some(lit.value()));
    }
    let mut serialized = None;
    meta.parse_nested_meta(|inner| {
        let lit: syn::LitStr = inner.value()?.parse()?;
        if inner.path.is_ident("serialize") {
            serialized = Some(lit.value());
        }
        Ok(())
    })?;
    Ok(serialized)
}

fn skip_meta_value(meta: &syn::meta::ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(syn::Token![=]) {
        meta.value()?.parse::<syn::Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        meta.input.parse::<syn::Expr>()?;
    }
    Ok(())
}

fn apply_validate_attrs(attrs: &[syn::Attribute], tags: &mut FieldTags) {
    for attr in attrs.iter().filter(|a| a.path().is_ident("validate")) {
        let result = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("required") {
                tags.validations.push(ValidationTag::new(ValidationKind::NotNull));
            } else if meta.path.is_ident("length") && meta.input.peek(syn::token::Paren) {
                meta.parse_nested_meta(|inner| {
                    if inner.path.is_ident("max") {
                        let expr: syn::Expr = inner.value()?.parse()?;
                        tags.max_length = expr_text(&expr);
                    } else if inner.path.is_ident("min") {
                        let expr: syn::Expr = inner.value()?.parse()?;
                        if expr_text(&expr).is_some_and(|min| min != "0") {
                            tags.validations.push(ValidationTag::new(ValidationKind::NotEmpty));
                        }
                    } else {
                        skip_meta_value(&inner)?;
                    }
                    Ok(())
                })?;
            } else {
                skip_meta_value(&meta)?;
            }
            Ok(())
        });
        if let Err(e) = result {
            debug!("Ignoring unparsable validate attribute: {}", e);
        }
    }
}

/// Literal digits, or the last path segment for a named constant
fn expr_text(expr: &syn::Expr) -> Option<String> {
    match expr {
        syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Int(int),
            ..
        }) => Some(int.base10_digits().to_string()),
        syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Str(s),
            ..
        }) => Some(s.value()),
        syn::Expr::Path(path) => path.path.segments.last().map(|s| s.ident.to_string()),
        _ => None,
    }
}

/// Doc comment lines of an item, split into prose and `@tag` lines.
struct DocComment {
    lines: Vec<String>,
}

impl DocComment {
    fn parse(attrs: &[syn::Attribute]) -> Self {
        let lines = attrs
            .iter()
            .filter(|attr| attr.path().is_ident("doc"))
            .filter_map(|attr| match &attr.meta {
                syn::Meta::NameValue(nv) => match &nv.value {
                    syn::Expr::Lit(syn::ExprLit {
                        lit: syn::Lit::Str(s),
                        ..
                    }) => Some(s.value()),
                    _ => None,
                },
                _ => None,
            })
            .flat_map(|doc| {
                doc.lines()
                    .map(|line| line.trim().to_string())
                    .collect::<Vec<_>>()
            })
            .collect();
        Self { lines }
    }

    fn split(self) -> (Option<String>, FieldTags) {
        let mut tags = FieldTags::default();
        let mut prose = Vec::new();

        for line in self.lines {
            let Some(rest) = line.strip_prefix('@') else {
                if !line.is_empty() {
                    prose.push(line);
                }
                continue;
            };
            let (tag, value) = match rest.split_once(char::is_whitespace) {
                Some((tag, value)) => (tag, value.trim()),
                None => (rest, ""),
            };
            match tag {
                "mock" if !value.is_empty() => tags.mock = Some(value.to_string()),
                "ignore" => tags.ignore = true,
                "since" if !value.is_empty() => tags.since = Some(value.to_string()),
                "required" => tags.required = true,
                _ => prose.push(line.clone()),
            }
        }

        let comment = if prose.is_empty() {
            None
        } else {
            Some(prose.join("\n"))
        };
        (comment, tags)
    }
}
