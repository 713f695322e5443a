use std::fmt;

use crate::metadata::signatures::TypeSig;

/// Reference to a method, as used by instruction operands and explicit overrides.
///
/// A reference names its declaring type by signature, so a method of a generic
/// instantiation (`Dictionary<string,int>::set_Item`) keeps the open parameter types of
/// the definition (`!0`, `!1`) while the declaring type carries the arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodRef {
    /// Declaring type of the method
    pub declaring_type: TypeSig,
    /// Method name
    pub name: String,
    /// Return type
    pub return_type: TypeSig,
    /// Parameter types in declaration order
    pub params: Vec<TypeSig>,
    /// Number of generic parameters of the method itself
    pub generic_arity: usize,
    /// Instance method (`this` is passed implicitly)
    pub has_this: bool,
}

impl MethodRef {
    /// Creates a reference to a parameterless instance method
    pub fn new(declaring_type: TypeSig, name: &str, return_type: TypeSig) -> Self {
        MethodRef {
            declaring_type,
            name: name.to_string(),
            return_type,
            params: Vec::new(),
            generic_arity: 0,
            has_this: true,
        }
    }

    /// Appends a parameter type
    #[must_use]
    pub fn with_param(mut self, param: TypeSig) -> Self {
        self.params.push(param);
        self
    }

    /// Marks the reference as static
    #[must_use]
    pub fn static_method(mut self) -> Self {
        self.has_this = false;
        self
    }

    /// Re-targets the reference at another declaring type, e.g. a generic instantiation
    /// of the original declaring type
    #[must_use]
    pub fn on_type(mut self, declaring_type: TypeSig) -> Self {
        self.declaring_type = declaring_type;
        self
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.params.iter().map(TypeSig::fullname).collect();
        write!(
            f,
            "{} {}::{}({})",
            self.return_type,
            self.declaring_type,
            self.name,
            params.join(",")
        )
    }
}

/// Reference to a field, as used by instruction operands.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    /// Declaring type of the field
    pub declaring_type: TypeSig,
    /// Field name
    pub name: String,
    /// Field type
    pub field_type: TypeSig,
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}::{}",
            self.field_type, self.declaring_type, self.name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_ref_display() {
        let app_domain = TypeSig::named("mscorlib", "System", "AppDomain");
        let string = TypeSig::named("mscorlib", "System", "String");
        let create = MethodRef::new(app_domain.clone(), "CreateDomain", app_domain)
            .with_param(string)
            .static_method();

        assert!(!create.has_this);
        assert_eq!(
            create.to_string(),
            "System.AppDomain System.AppDomain::CreateDomain(System.String)"
        );
    }

    #[test]
    fn test_method_ref_on_generic_instance() {
        let dictionary = TypeSig::named("mscorlib", "System.Collections.Generic", "Dictionary`2");
        let void = TypeSig::named("mscorlib", "System", "Void");
        let set_item = MethodRef::new(dictionary.clone(), "set_Item", void)
            .with_param(TypeSig::type_param(0, "TKey"))
            .with_param(TypeSig::type_param(1, "TValue"))
            .on_type(dictionary.instantiate(vec![
                TypeSig::named("mscorlib", "System", "String"),
                TypeSig::named("mscorlib", "System", "Int32"),
            ]));

        assert_eq!(
            set_item.to_string(),
            "System.Void System.Collections.Generic.Dictionary`2<System.String,System.Int32>::set_Item(!0,!1)"
        );
    }
}
