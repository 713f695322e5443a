use std::fmt;

/// Who declares a generic parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericParamKind {
    /// Parameter of a generic type (`!n`)
    Type,
    /// Parameter of a generic method (`!!n`)
    Method,
}

/// Reference to a generic parameter by owner kind and position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenericParamSig {
    /// Owner kind
    pub kind: GenericParamKind,
    /// Zero-based position within the owner's generic parameter list
    pub position: u16,
    /// Declared name (`T`, `TKey`, ...), informational only
    pub name: String,
}

/// Reference to a named type, possibly instantiated with generic arguments.
///
/// Nested types carry the namespace of their outermost declaring type plus the chain
/// of enclosing type names, so `Android.Views.View/IOnClickListener` is
/// `namespace = "Android.Views"`, `enclosing = ["View"]`, `name = "IOnClickListener"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRefSig {
    /// Name of the assembly the referenced type lives in
    pub scope: String,
    /// Namespace of the (outermost) type
    pub namespace: String,
    /// Enclosing type names, outermost first
    pub enclosing: Vec<String>,
    /// Simple name, including the generic arity suffix (e.g. ``List`1``)
    pub name: String,
    /// Generic arguments; empty unless this is a generic instantiation
    pub generic_args: Vec<TypeSig>,
}

impl TypeRefSig {
    /// Full metadata name without generic arguments (`Ns.Outer/Inner`)
    #[must_use]
    pub fn fullname(&self) -> String {
        let mut name = String::new();
        if !self.namespace.is_empty() {
            name.push_str(&self.namespace);
            name.push('.');
        }
        for outer in &self.enclosing {
            name.push_str(outer);
            name.push('/');
        }
        name.push_str(&self.name);
        name
    }

    /// Returns true if this reference instantiates a generic type
    #[must_use]
    pub fn is_generic_instance(&self) -> bool {
        !self.generic_args.is_empty()
    }
}

/// A type as it appears in a signature: return types, parameters, fields, locals and
/// instruction operands.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSig {
    /// A named class, interface or value type
    Named(TypeRefSig),
    /// Single dimension array of the element type
    Array(Box<TypeSig>),
    /// Managed reference to the element type
    ByRef(Box<TypeSig>),
    /// Generic type or method parameter
    GenericParam(GenericParamSig),
}

impl TypeSig {
    /// Creates a non-generic, non-nested named type reference
    pub fn named(scope: &str, namespace: &str, name: &str) -> Self {
        TypeSig::Named(TypeRefSig {
            scope: scope.to_string(),
            namespace: namespace.to_string(),
            enclosing: Vec::new(),
            name: name.to_string(),
            generic_args: Vec::new(),
        })
    }

    /// Creates a reference to a generic type parameter at `position`
    pub fn type_param(position: u16, name: &str) -> Self {
        TypeSig::GenericParam(GenericParamSig {
            kind: GenericParamKind::Type,
            position,
            name: name.to_string(),
        })
    }

    /// Creates a reference to a generic method parameter at `position`
    pub fn method_param(position: u16, name: &str) -> Self {
        TypeSig::GenericParam(GenericParamSig {
            kind: GenericParamKind::Method,
            position,
            name: name.to_string(),
        })
    }

    /// Wraps this type into a single dimension array
    #[must_use]
    pub fn array(self) -> Self {
        TypeSig::Array(Box::new(self))
    }

    /// Wraps this type into a managed reference
    #[must_use]
    pub fn by_ref(self) -> Self {
        TypeSig::ByRef(Box::new(self))
    }

    /// Instantiates a named generic type with `args`.
    ///
    /// Arrays, by-refs and generic parameters are returned unchanged.
    #[must_use]
    pub fn instantiate(self, args: Vec<TypeSig>) -> Self {
        match self {
            TypeSig::Named(mut named) => {
                named.generic_args = args;
                TypeSig::Named(named)
            }
            other => other,
        }
    }

    /// Returns true for generic type and method parameters
    #[must_use]
    pub fn is_generic_parameter(&self) -> bool {
        matches!(self, TypeSig::GenericParam(_))
    }

    /// Returns true for arrays
    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self, TypeSig::Array(_))
    }

    /// Returns true for managed references
    #[must_use]
    pub fn is_by_ref(&self) -> bool {
        matches!(self, TypeSig::ByRef(_))
    }

    /// Returns true for generic instantiations
    #[must_use]
    pub fn is_generic_instance(&self) -> bool {
        matches!(self, TypeSig::Named(named) if named.is_generic_instance())
    }

    /// The named reference, if this is a named type
    #[must_use]
    pub fn as_named(&self) -> Option<&TypeRefSig> {
        match self {
            TypeSig::Named(named) => Some(named),
            _ => None,
        }
    }

    /// Immediate element type of arrays and by-refs
    #[must_use]
    pub fn element(&self) -> Option<&TypeSig> {
        match self {
            TypeSig::Array(inner) | TypeSig::ByRef(inner) => Some(inner),
            _ => None,
        }
    }

    /// Innermost element type, stripping every array and by-ref layer
    #[must_use]
    pub fn element_type(&self) -> &TypeSig {
        let mut current = self;
        while let Some(inner) = current.element() {
            current = inner;
        }
        current
    }

    /// Simple name of the innermost element type
    #[must_use]
    pub fn name(&self) -> &str {
        match self.element_type() {
            TypeSig::Named(named) => &named.name,
            TypeSig::GenericParam(param) => &param.name,
            TypeSig::Array(_) | TypeSig::ByRef(_) => "",
        }
    }

    /// Namespace of the innermost element type (empty for generic parameters)
    #[must_use]
    pub fn namespace(&self) -> &str {
        match self.element_type() {
            TypeSig::Named(named) => &named.namespace,
            _ => "",
        }
    }

    /// Assembly scope of the innermost element type
    #[must_use]
    pub fn scope(&self) -> Option<&str> {
        match self.element_type() {
            TypeSig::Named(named) => Some(&named.scope),
            _ => None,
        }
    }

    /// Metadata full name, including generic arguments and array/by-ref suffixes.
    ///
    /// Generic parameters render positionally (`!0`, `!!1`) so that references built
    /// against an open definition compare equal regardless of declared names.
    #[must_use]
    pub fn fullname(&self) -> String {
        match self {
            TypeSig::Named(named) => {
                let mut name = named.fullname();
                if named.is_generic_instance() {
                    name.push('<');
                    let args: Vec<String> = named.generic_args.iter().map(TypeSig::fullname).collect();
                    name.push_str(&args.join(","));
                    name.push('>');
                }
                name
            }
            TypeSig::Array(inner) => format!("{}[]", inner.fullname()),
            TypeSig::ByRef(inner) => format!("{}&", inner.fullname()),
            TypeSig::GenericParam(param) => match param.kind {
                GenericParamKind::Type => format!("!{}", param.position),
                GenericParamKind::Method => format!("!!{}", param.position),
            },
        }
    }

    /// Visits this signature and every nested signature (elements, generic arguments)
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a TypeSig)) {
        visit(self);
        match self {
            TypeSig::Named(named) => {
                for arg in &named.generic_args {
                    arg.walk(visit);
                }
            }
            TypeSig::Array(inner) | TypeSig::ByRef(inner) => inner.walk(visit),
            TypeSig::GenericParam(_) => {}
        }
    }
}

impl fmt::Display for TypeSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fullname())
    }
}
