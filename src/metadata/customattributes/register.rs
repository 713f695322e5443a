use crate::metadata::customattributes::CustomAttribute;

/// Decoded bridge registration attribute: `[Register (name, signature, connector)]`.
///
/// `name` and `signature` identify the native (JNI) member, `connector` names the managed
/// member that produces the native callback delegate. Only attributes with a non-empty
/// connector are relevant for member preservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterAttribute {
    /// Native member name
    pub name: String,
    /// Native (JNI) signature, e.g. `(Ljava/lang/String;I)V`
    pub signature: String,
    /// Connector specification, `Member` or `Member:Type.Full/Name, Assembly`
    pub connector: Option<String>,
}

/// Connector split into its member name and optional qualifying type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorTarget<'a> {
    /// Name of the connector member
    pub member: &'a str,
    /// Full name of the type declaring the member, when it differs from the attributed one
    pub type_name: Option<&'a str>,
    /// Assembly qualifier of `type_name`, if present
    pub assembly: Option<&'a str>,
}

impl RegisterAttribute {
    /// Decodes `attribute` if it is an instance of `attribute_name` with at least the
    /// native name and signature arguments.
    #[must_use]
    pub fn from_attribute(attribute: &CustomAttribute, attribute_name: &str) -> Option<Self> {
        if attribute.type_name() != attribute_name {
            return None;
        }

        let name = attribute.string_arg(0)?;
        let signature = attribute.string_arg(1)?;
        let connector = attribute
            .string_arg(2)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        Some(RegisterAttribute {
            name: name.to_string(),
            signature: signature.to_string(),
            connector,
        })
    }

    /// Splits the connector into member and qualifying type
    #[must_use]
    pub fn connector_target(&self) -> Option<ConnectorTarget<'_>> {
        let connector = self.connector.as_deref()?;
        match connector.find(':') {
            Some(pos) if pos > 0 => {
                let (type_name, assembly) = match connector[pos + 1..].split_once(',') {
                    Some((type_name, qualifier)) => {
                        // Version, culture and key token follow the simple name
                        let assembly = qualifier.split(',').next().unwrap_or_default().trim();
                        (type_name.trim(), Some(assembly).filter(|a| !a.is_empty()))
                    }
                    None => (connector[pos + 1..].trim(), None),
                };
                Some(ConnectorTarget {
                    member: &connector[..pos],
                    type_name: Some(type_name),
                    assembly,
                })
            }
            _ => Some(ConnectorTarget {
                member: connector,
                type_name: None,
                assembly: None,
            }),
        }
    }

    /// Name of the generated marshal thunk for this registration.
    ///
    /// The thunk is `n_<name>`, suffixed with `__<mangled arguments>` when the native
    /// signature takes arguments. Mangling follows the JNI short-name rules for the
    /// characters that occur in descriptors.
    #[must_use]
    pub fn marshal_method_name(&self) -> String {
        let mut name = format!("n_{}", self.name);

        let arguments = self
            .signature
            .strip_prefix('(')
            .and_then(|rest| rest.split_once(')'))
            .map_or("", |(args, _)| args);

        if !arguments.is_empty() {
            name.push_str("__");
            for c in arguments.chars() {
                match c {
                    '_' => name.push_str("_1"),
                    ';' => name.push_str("_2"),
                    '[' => name.push_str("_3"),
                    '/' => name.push('_'),
                    other => name.push(other),
                }
            }
        }
        name
    }
}
