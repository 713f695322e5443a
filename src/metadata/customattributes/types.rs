use crate::metadata::signatures::TypeSig;

/// Represents a single fixed custom attribute argument value
#[derive(Debug, Clone, PartialEq)]
pub enum CustomAttributeArgument {
    /// Boolean value
    Bool(bool),
    /// Signed 32-bit integer
    I4(i32),
    /// String value (`None` encodes a null string)
    String(Option<String>),
    /// Type reference (`typeof(...)`)
    Type(TypeSig),
}

/// A custom attribute applied to a type or method.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomAttribute {
    /// Type of the attribute
    pub attribute_type: TypeSig,
    /// Fixed arguments from the constructor signature
    pub fixed_args: Vec<CustomAttributeArgument>,
}

impl CustomAttribute {
    /// Creates an attribute without arguments
    pub fn new(attribute_type: TypeSig) -> Self {
        CustomAttribute {
            attribute_type,
            fixed_args: Vec::new(),
        }
    }

    /// Appends a string argument
    #[must_use]
    pub fn with_string(mut self, value: &str) -> Self {
        self.fixed_args
            .push(CustomAttributeArgument::String(Some(value.to_string())));
        self
    }

    /// Appends an arbitrary argument
    #[must_use]
    pub fn with_arg(mut self, value: CustomAttributeArgument) -> Self {
        self.fixed_args.push(value);
        self
    }

    /// Full name of the attribute type
    #[must_use]
    pub fn type_name(&self) -> String {
        self.attribute_type.fullname()
    }

    /// String value of the fixed argument at `index`, if it is a non-null string
    #[must_use]
    pub fn string_arg(&self, index: usize) -> Option<&str> {
        match self.fixed_args.get(index) {
            Some(CustomAttributeArgument::String(Some(value))) => Some(value.as_str()),
            _ => None,
        }
    }
}
