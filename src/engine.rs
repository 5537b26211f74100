//! Top-level build calls and the per-call traversal state.
//!
//! A [`DocEngine`] only borrows the read-only type model and configuration, so one
//! engine (or several) can serve concurrent build calls. Everything mutable lives in
//! a [`BuildContext`] created fresh for each call and dropped when it returns.

use crate::config::{Direction, DocConfig};
use crate::error::{Error, Result};
use crate::example::{ExampleMaterializer, ExampleValue};
use crate::form::{FormDataMaterializer, FormEntry};
use crate::generics::{GenericBinding, GenericResolver};
use crate::guard::RegistryGuard;
use crate::model::{builtin_kind, TypeKind, TypeModelProvider, TypeRef};
use crate::params::{ParamDescriptorBuilder, ParamNode};
use crate::policy::FieldPolicy;
use crate::tree::TreeReconstructor;
use log::{debug, info};

/// Entry point for every documentation build.
///
/// # Example
///
/// ```
/// use apidoc_materializer::config::{Direction, DocConfig};
/// use apidoc_materializer::engine::DocEngine;
/// use apidoc_materializer::model::{TypeCatalog, TypeRef};
///
/// let catalog = TypeCatalog::from_yaml_str(r#"
/// types:
///   - name: Order
///     fields:
///       - name: id
///         type: i64
///       - name: tags
///         type: Vec<String>
/// "#).unwrap();
/// let config = DocConfig::default();
/// let engine = DocEngine::new(&catalog, &config);
///
/// let order = TypeRef::parse("Order").unwrap();
/// let example = engine.build_example(&order, Direction::Response, &[]).unwrap();
/// assert_eq!(example.to_json().to_string(), r#"{"id":0,"tags":["sample","sample"]}"#);
/// ```
#[derive(Clone, Copy)]
pub struct DocEngine<'a> {
    provider: &'a dyn TypeModelProvider,
    config: &'a DocConfig,
}

impl<'a> DocEngine<'a> {
    pub fn new(provider: &'a dyn TypeModelProvider, config: &'a DocConfig) -> Self {
        Self { provider, config }
    }

    fn context(&self, direction: Direction, groups: &[String]) -> BuildContext<'a> {
        BuildContext::new(self.provider, self.config, direction, groups)
    }

    /// Example payload for `root`
    pub fn build_example(
        &self,
        root: &TypeRef,
        direction: Direction,
        groups: &[String],
    ) -> Result<ExampleValue> {
        debug!("Building {:?} example for {}", direction, root);
        let mut ctx = self.context(direction, groups);
        ExampleMaterializer::materialize(&mut ctx, root, &GenericBinding::empty())
    }

    /// Flat parameter rows for `root`, in pre-order with ids starting at 1
    pub fn build_params(
        &self,
        root: &TypeRef,
        direction: Direction,
        groups: &[String],
    ) -> Result<Vec<ParamNode>> {
        debug!("Building {:?} parameters for {}", direction, root);
        let mut ctx = self.context(direction, groups);
        ParamDescriptorBuilder::build(&mut ctx, root, &GenericBinding::empty())
    }

    /// Parameter rows rebuilt into a tree
    pub fn build_tree(
        &self,
        root: &TypeRef,
        direction: Direction,
        groups: &[String],
    ) -> Result<Vec<ParamNode>> {
        let flat = self.build_params(root, direction, groups)?;
        Ok(TreeReconstructor::to_tree(&flat))
    }

    /// Multipart form entries for a request body of type `root`
    pub fn build_form_data(&self, root: &TypeRef, groups: &[String]) -> Result<Vec<FormEntry>> {
        debug!("Building form data for {}", root);
        let mut ctx = self.context(Direction::Request, groups);
        FormDataMaterializer::build(&mut ctx, root, &GenericBinding::empty())
    }

    /// Example of a method's return value, wrapped in the configured response envelope.
    ///
    /// `None` stands for a method without a return value.
    pub fn build_return_example(&self, return_type: Option<&TypeRef>) -> Result<ExampleValue> {
        match self.response_root(return_type)? {
            Some(root) => self.build_example(&root, Direction::Response, &[]),
            None => Ok(ExampleValue::placeholder(ExampleValue::VOID)),
        }
    }

    /// Parameter rows of a method's return value, wrapped like [`Self::build_return_example`]
    pub fn build_return_params(&self, return_type: Option<&TypeRef>) -> Result<Vec<ParamNode>> {
        match self.response_root(return_type)? {
            Some(root) => self.build_params(&root, Direction::Response, &[]),
            None => Ok(Vec::new()),
        }
    }

    /// The type actually documented for a return value
    pub fn response_root(&self, return_type: Option<&TypeRef>) -> Result<Option<TypeRef>> {
        let Some(wrapper) = self.config.response_wrapper.as_deref() else {
            return Ok(return_type.cloned());
        };
        let wrapper = TypeRef::parse(wrapper)?;
        let root = match return_type {
            Some(ty) if ty.is_named(&wrapper.name) => ty.clone(),
            Some(ty) => TypeRef::generic(wrapper.name.clone(), vec![ty.clone()]),
            None => TypeRef::generic(wrapper.name.clone(), vec![TypeRef::new("Object")]),
        };
        info!("Documenting response as {}", root);
        Ok(Some(root))
    }

    /// Fail with [`Error::TypeNotFound`] when `root` is neither catalogued nor builtin
    pub fn ensure_known(&self, root: &TypeRef) -> Result<()> {
        if root.is_array()
            || self.provider.lookup(&root.name).is_some()
            || builtin_kind(&root.name).is_some()
        {
            Ok(())
        } else {
            Err(Error::TypeNotFound(root.name.clone()))
        }
    }
}

/// Mutable state of one build call.
///
/// Holds the registry guard, the stack of enclosing object types used for
/// self-reference detection, and the trail of fields being expanded (for error
/// messages and name-based mock values).
pub struct BuildContext<'a> {
    provider: &'a dyn TypeModelProvider,
    config: &'a DocConfig,
    policy: FieldPolicy<'a>,
    resolver: GenericResolver<'a>,
    direction: Direction,
    groups: Vec<String>,
    guard: RegistryGuard,
    enclosing: Vec<TypeRef>,
    field_trail: Vec<(String, String)>,
}

impl<'a> BuildContext<'a> {
    pub fn new(
        provider: &'a dyn TypeModelProvider,
        config: &'a DocConfig,
        direction: Direction,
        groups: &[String],
    ) -> Self {
        Self {
            provider,
            config,
            policy: FieldPolicy::new(config),
            resolver: GenericResolver::new(provider),
            direction,
            groups: groups.to_vec(),
            guard: RegistryGuard::new(config.recursion_limit),
            enclosing: Vec::new(),
            field_trail: Vec::new(),
        }
    }

    pub fn provider(&self) -> &'a dyn TypeModelProvider {
        self.provider
    }

    pub fn config(&self) -> &'a DocConfig {
        self.config
    }

    pub fn policy(&self) -> FieldPolicy<'a> {
        self.policy
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn guard(&self) -> &RegistryGuard {
        &self.guard
    }

    /// Ask the guard whether `ty` may be expanded at the current depth
    pub fn enter(&mut self, ty: &TypeRef) -> bool {
        self.guard.enter(&ty.name)
    }

    pub fn kind_of(&self, ty: &TypeRef) -> TypeKind {
        self.provider.kind_of(ty)
    }

    /// Binding for the variables of `ty`, with its arguments substituted through `enclosing`
    pub fn bind(&self, ty: &TypeRef, enclosing: &GenericBinding) -> GenericBinding {
        self.resolver.resolve(ty, enclosing)
    }

    /// Substitute type variables and strip transparent wrappers (`Option`, `Box`, `Mono`, ...)
    pub fn normalize(&self, ty: &TypeRef, binding: &GenericBinding) -> TypeRef {
        let mut ty = binding.substitute(ty);
        while self.kind_of(&ty) == TypeKind::ReactiveWrapper {
            match ty.args.first() {
                Some(inner) => ty = binding.substitute(inner),
                None => break,
            }
        }
        ty
    }

    /// Whether `ty` is the object type whose fields are being expanded right now
    pub fn is_self_reference(&self, ty: &TypeRef) -> bool {
        self.enclosing.last() == Some(ty)
    }

    /// Run `f` one level deeper, inside the fields of `ty`
    pub fn within_object<T>(&mut self, ty: &TypeRef, f: impl FnOnce(&mut Self) -> T) -> T {
        self.guard.descend();
        self.enclosing.push(ty.clone());
        let result = f(self);
        self.enclosing.pop();
        self.guard.ascend();
        result
    }

    /// Run `f` one level deeper, on the element or value type of a collection or map
    pub fn within_element<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.guard.descend();
        let result = f(self);
        self.guard.ascend();
        result
    }

    /// Run `f` while expanding `owner.field`
    pub fn within_field<T>(
        &mut self,
        owner: &str,
        field: &str,
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        self.field_trail.push((owner.to_string(), field.to_string()));
        let result = f(self);
        self.field_trail.pop();
        result
    }

    /// Name of the field being expanded, empty at the root
    pub fn current_field(&self) -> &str {
        self.field_trail
            .last()
            .map(|(_, field)| field.as_str())
            .unwrap_or("")
    }

    /// Check the key type of a map.
    ///
    /// Returns the offending key type when it is not a string. In strict mode that
    /// is an [`Error::Validation`] naming the owning type and field instead.
    pub fn unsupported_map_key(&self, map: &TypeRef) -> Result<Option<TypeRef>> {
        let Some(key) = map.args.first() else {
            return Ok(None);
        };
        match self.kind_of(key) {
            TypeKind::String => Ok(None),
            _ if self.config.strict => {
                let (owner, field) = self
                    .field_trail
                    .last()
                    .cloned()
                    .unwrap_or_else(|| (map.to_string(), "-".to_string()));
                Err(Error::Validation {
                    owner,
                    field,
                    key_type: key.to_string(),
                })
            }
            _ => {
                debug!("Map {} has an unsupported key type {}", map, key);
                Ok(Some(key.clone()))
            }
        }
    }
}
