use crate::model::{TypeModelProvider, TypeRef};
use indexmap::IndexMap;
use log::{debug, warn};

/// Type-variable bindings for one branch of a traversal.
///
/// Bindings are never mutated once handed to the builders; descending into a
/// nested generic type produces a new binding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenericBinding {
    vars: IndexMap<String, TypeRef>,
    /// Actual arguments of the bound type, used for variables with no declared name
    positional: Vec<TypeRef>,
    /// Bindings of the supertypes, keyed by supertype name
    inherited: IndexMap<String, GenericBinding>,
}

impl GenericBinding {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, TypeRef)>,
        S: Into<String>,
    {
        let vars: IndexMap<String, TypeRef> =
            pairs.into_iter().map(|(k, v)| (k.into(), v)).collect();
        let positional = vars.values().cloned().collect();
        Self {
            vars,
            positional,
            inherited: IndexMap::new(),
        }
    }

    pub fn get(&self, var: &str) -> Option<&TypeRef> {
        self.vars.get(var)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty() && self.positional.is_empty() && self.inherited.is_empty()
    }

    /// Binding that applies to fields declared in `declaring_type`.
    ///
    /// That is the supertype's own binding when `declaring_type` is one of the bound
    /// type's supertypes, and this binding otherwise.
    pub fn scope_of(&self, declaring_type: &str) -> &GenericBinding {
        self.inherited.get(declaring_type).unwrap_or(self)
    }

    /// A copy of this binding with `other`'s entries layered on top
    pub fn extend(&self, other: &GenericBinding) -> GenericBinding {
        let mut vars = self.vars.clone();
        for (var, ty) in &other.vars {
            vars.insert(var.clone(), ty.clone());
        }
        let positional = if other.positional.is_empty() {
            self.positional.clone()
        } else {
            other.positional.clone()
        };
        let mut inherited = self.inherited.clone();
        for (name, scope) in &other.inherited {
            inherited.insert(name.clone(), scope.clone());
        }
        GenericBinding {
            vars,
            positional,
            inherited,
        }
    }

    /// Replace every type variable in `ty` with its bound type.
    ///
    /// A variable missing from the map falls back to the first positional argument;
    /// with no positional arguments either it is left as is.
    pub fn substitute(&self, ty: &TypeRef) -> TypeRef {
        if is_variable_name(ty) {
            let bound = self
                .vars
                .get(&ty.name)
                .or_else(|| self.positional.first())
                .cloned();
            return match bound {
                Some(mut bound) => {
                    bound.array_dims += ty.array_dims;
                    bound
                }
                None => ty.clone(),
            };
        }
        if ty.args.is_empty() {
            return ty.clone();
        }
        TypeRef {
            name: ty.name.clone(),
            args: ty.args.iter().map(|arg| self.substitute(arg)).collect(),
            array_dims: ty.array_dims,
        }
    }
}

/// `T` or `T[]`
fn is_variable_name(ty: &TypeRef) -> bool {
    ty.args.is_empty() && ty.name.len() == 1 && ty.name.chars().all(|c| c.is_ascii_uppercase())
}

/// Whether a type variable appears anywhere in `ty`
pub fn mentions_variable(ty: &TypeRef) -> bool {
    is_variable_name(ty) || ty.args.iter().any(mentions_variable)
}

/// Computes the [`GenericBinding`] of a concrete type reference.
pub struct GenericResolver<'a> {
    provider: &'a dyn TypeModelProvider,
}

impl<'a> GenericResolver<'a> {
    pub fn new(provider: &'a dyn TypeModelProvider) -> Self {
        Self { provider }
    }

    /// Bind the declared variables of `ty` and of each of its supertypes.
    ///
    /// Arguments of `ty` are first substituted through `enclosing`. Every supertype
    /// gets its own scope, reachable through [`GenericBinding::scope_of`], whose
    /// variables are bound to the arguments the subtype declares it with. So for
    /// `Sub<T> extends Base<List<T>>`, `Sub<Order>` binds `T` to `Order` while the
    /// fields of `Base` see `T` as `List<Order>`. When `ty` carries no arguments, the
    /// arguments of its supertype become the positional fallback, which covers a
    /// concrete subclass of a generic envelope.
    pub fn resolve(&self, ty: &TypeRef, enclosing: &GenericBinding) -> GenericBinding {
        let args: Vec<TypeRef> = ty.args.iter().map(|a| enclosing.substitute(a)).collect();
        let mut binding = GenericBinding {
            positional: args.clone(),
            ..GenericBinding::default()
        };

        let Some(descriptor) = self.provider.lookup(&ty.name) else {
            return binding;
        };
        bind_params(&mut binding, &descriptor.type_params, &args, &descriptor.name);

        let mut scope = binding.clone();
        let mut seen = vec![descriptor.name.clone()];
        let mut next = descriptor.super_type.clone();
        while let Some(super_ref) = next {
            let super_args: Vec<TypeRef> =
                super_ref.args.iter().map(|a| scope.substitute(a)).collect();
            if binding.positional.is_empty() {
                binding.positional = super_args.clone();
            }
            let Some(super_desc) = self.provider.lookup(&super_ref.name) else {
                break;
            };
            if seen.contains(&super_desc.name) {
                warn!("Supertype cycle through {}, stopping generic resolution", super_desc.name);
                break;
            }
            seen.push(super_desc.name.clone());

            let mut super_scope = GenericBinding {
                positional: if super_args.is_empty() {
                    scope.positional.clone()
                } else {
                    super_args.clone()
                },
                ..GenericBinding::default()
            };
            bind_params(&mut super_scope, &super_desc.type_params, &super_args, &super_desc.name);
            binding.inherited.insert(super_desc.name.clone(), super_scope.clone());
            scope = super_scope;
            next = super_desc.super_type.clone();
        }

        debug!("Resolved generics of {}: {:?}", ty, binding.vars);
        binding
    }
}

fn bind_params(binding: &mut GenericBinding, params: &[String], args: &[TypeRef], owner: &str) {
    if !args.is_empty() && args.len() != params.len() {
        debug!(
            "{} declares {} type parameters but {} arguments were supplied",
            owner,
            params.len(),
            args.len()
        );
    }
    for (param, arg) in params.iter().zip(args) {
        binding.vars.insert(param.clone(), arg.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldDescriptor, TypeCatalog, TypeDescriptor};
    use pretty_assertions::assert_eq;

    fn ty(s: &str) -> TypeRef {
        TypeRef::parse(s).unwrap()
    }

    fn catalog() -> TypeCatalog {
        [
            TypeDescriptor::object("Page")
                .with_type_params(&["T"])
                .with_field(FieldDescriptor::parsed("items", "List<T>")),
            TypeDescriptor::object("Pair")
                .with_type_params(&["K", "V"])
                .with_field(FieldDescriptor::parsed("left", "K"))
                .with_field(FieldDescriptor::parsed("right", "V")),
            TypeDescriptor::object("OrderPage").with_super_type(ty("Page<Order>")),
            TypeDescriptor::object("Order"),
            TypeDescriptor::object("Batch")
                .with_type_params(&["T"])
                .with_super_type(ty("Page<List<T>>"))
                .with_field(FieldDescriptor::parsed("head", "T")),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_binds_declared_variables() {
        let catalog = catalog();
        let resolver = GenericResolver::new(&catalog);

        let binding = resolver.resolve(&ty("Pair<String, Order>"), &GenericBinding::empty());
        assert_eq!(binding.get("K"), Some(&ty("String")));
        assert_eq!(binding.get("V"), Some(&ty("Order")));
        assert_eq!(binding.substitute(&ty("Map<K, V[]>")), ty("Map<String, Order[]>"));
    }

    #[test]
    fn test_arguments_substituted_through_enclosing_binding() {
        let catalog = catalog();
        let resolver = GenericResolver::new(&catalog);
        let enclosing = GenericBinding::from_pairs([("T", ty("Order"))]);

        let binding = resolver.resolve(&ty("Page<List<T>>"), &enclosing);
        assert_eq!(binding.get("T"), Some(&ty("List<Order>")));
    }

    #[test]
    fn test_concrete_subclass_of_generic_base() {
        let catalog = catalog();
        let resolver = GenericResolver::new(&catalog);

        let binding = resolver.resolve(&ty("OrderPage"), &GenericBinding::empty());
        assert_eq!(binding.scope_of("Page").get("T"), Some(&ty("Order")));
        assert_eq!(binding.substitute(&ty("List<T>")), ty("List<Order>"));
        assert_eq!(
            binding.scope_of("Page").substitute(&ty("List<T>")),
            ty("List<Order>")
        );
    }

    #[test]
    fn test_supertype_variables_resolve_in_their_own_scope() {
        let catalog = catalog();
        let resolver = GenericResolver::new(&catalog);

        let binding = resolver.resolve(&ty("Batch<Order>"), &GenericBinding::empty());
        assert_eq!(binding.get("T"), Some(&ty("Order")));
        assert_eq!(binding.scope_of("Batch").get("T"), Some(&ty("Order")));
        assert_eq!(binding.scope_of("Page").get("T"), Some(&ty("List<Order>")));
        assert_eq!(
            binding.scope_of("Page").substitute(&ty("List<T>")),
            ty("List<List<Order>>")
        );
    }

    #[test]
    fn test_unresolved_variable_stays_literal() {
        let catalog = catalog();
        let resolver = GenericResolver::new(&catalog);

        let binding = resolver.resolve(&ty("Page"), &GenericBinding::empty());
        assert!(binding.is_empty());
        assert_eq!(binding.substitute(&ty("T")), ty("T"));
    }

    #[test]
    fn test_positional_fallback_for_unknown_variable() {
        let binding = GenericBinding {
            positional: vec![ty("Order")],
            ..GenericBinding::default()
        };
        assert_eq!(binding.substitute(&ty("E")), ty("Order"));
    }

    #[test]
    fn test_extend_layers_new_entries() {
        let base = GenericBinding::from_pairs([("T", ty("Order")), ("U", ty("String"))]);
        let extended = base.extend(&GenericBinding::from_pairs([("T", ty("Invoice"))]));
        assert_eq!(extended.get("T"), Some(&ty("Invoice")));
        assert_eq!(extended.get("U"), Some(&ty("String")));
        assert_eq!(base.get("T"), Some(&ty("Order")));
    }

    #[test]
    fn test_mentions_variable() {
        assert!(mentions_variable(&ty("T")));
        assert!(mentions_variable(&ty("List<Map<String, V>>")));
        assert!(!mentions_variable(&ty("List<Order>")));
    }
}
