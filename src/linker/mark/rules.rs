//! Implicit dependencies of foundational runtime types.
//!
//! Some framework types are accessed by the native runtime by field offset or by
//! reflection, neither of which shows up in managed code. Marking such a type must also
//! mark those members. The rules form a closed table keyed by assembly, namespace and
//! type name; [`rules_for`] performs the lookup.

/// What to mark when a rule applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyAction {
    /// Every non-static field of the marked type
    InstanceFields,
    /// Every field of the marked type
    AllFields,
    /// Named methods, of the marked type or of another type
    Methods {
        /// Assembly of the target type; `None` for the marked type's assembly
        assembly: Option<&'static str>,
        /// Full name of the target type; `None` for the marked type itself
        type_name: Option<&'static str>,
        /// Method names to mark
        methods: &'static [&'static str],
    },
}

/// One entry of the implicit dependency table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyRule {
    /// Assembly defining the type
    pub assembly: &'static str,
    /// Namespace of the type; empty for nested types
    pub namespace: &'static str,
    /// Simple name of the type
    pub type_name: &'static str,
    /// Rule applies to nested types only, matched by simple name
    pub nested: bool,
    /// Rule applies to debug builds (symbols linked) only
    pub debug_only: bool,
    /// Members to mark
    pub action: DependencyAction,
}

const fn fields(assembly: &'static str, namespace: &'static str, type_name: &'static str) -> DependencyRule {
    DependencyRule {
        assembly,
        namespace,
        type_name,
        nested: false,
        debug_only: false,
        action: DependencyAction::InstanceFields,
    }
}

const fn nested_fields(assembly: &'static str, type_name: &'static str) -> DependencyRule {
    DependencyRule {
        assembly,
        namespace: "",
        type_name,
        nested: true,
        debug_only: false,
        action: DependencyAction::InstanceFields,
    }
}

const ASYNC_BUILDER_DEBUG_HOOKS: &[&str] = &["SetNotificationForWaitCompletion", "get_ObjectIdForDebugger"];

/// Every implicit dependency known to the linker
pub static NATIVE_DEPENDENCY_RULES: &[DependencyRule] = &[
    DependencyRule {
        assembly: "mscorlib",
        namespace: "System.Runtime.CompilerServices",
        type_name: "AsyncTaskMethodBuilder",
        nested: false,
        debug_only: true,
        action: DependencyAction::Methods {
            assembly: None,
            type_name: None,
            methods: ASYNC_BUILDER_DEBUG_HOOKS,
        },
    },
    DependencyRule {
        assembly: "mscorlib",
        namespace: "System.Runtime.CompilerServices",
        type_name: "AsyncTaskMethodBuilder`1",
        nested: false,
        debug_only: true,
        action: DependencyAction::Methods {
            assembly: None,
            type_name: None,
            methods: ASYNC_BUILDER_DEBUG_HOOKS,
        },
    },
    DependencyRule {
        assembly: "mscorlib",
        namespace: "System.Threading.Tasks",
        type_name: "Task",
        nested: false,
        debug_only: true,
        action: DependencyAction::Methods {
            assembly: None,
            type_name: None,
            methods: &["NotifyDebuggerOfWaitCompletion"],
        },
    },
    DependencyRule {
        assembly: "System.Core",
        namespace: "System.Linq.Expressions",
        type_name: "LambdaExpression",
        nested: false,
        debug_only: false,
        action: DependencyAction::Methods {
            assembly: None,
            type_name: Some("System.Linq.Expressions.Expression`1"),
            methods: &["Create"],
        },
    },
    DependencyRule {
        assembly: "System.Core",
        namespace: "System.Linq.Expressions.Compiler",
        type_name: "LambdaCompiler",
        nested: false,
        debug_only: false,
        action: DependencyAction::Methods {
            assembly: None,
            type_name: Some("System.Runtime.CompilerServices.RuntimeOps"),
            methods: &["Quote"],
        },
    },
    DependencyRule {
        assembly: "System.Data",
        namespace: "System.Data.SqlTypes",
        type_name: "SqlXml",
        nested: false,
        debug_only: false,
        action: DependencyAction::Methods {
            assembly: Some("System.Xml"),
            type_name: Some("System.Xml.XmlReader"),
            methods: &["CreateSqlReader"],
        },
    },
    fields("System", "System.Diagnostics", "FileVersionInfo"),
    fields("System", "System.Diagnostics", "ProcessModule"),
    fields("System", "System.Net.Sockets", "IPAddress"),
    fields("System", "System.Net.Sockets", "IPv6MulticastOption"),
    fields("System", "System.Net.Sockets", "LingerOption"),
    fields("System", "System.Net.Sockets", "MulticastOption"),
    fields("System", "System.Net.Sockets", "SocketAddress"),
    DependencyRule {
        assembly: "System",
        namespace: "System.Net.Sockets",
        type_name: "Socket",
        nested: false,
        debug_only: false,
        action: DependencyAction::AllFields,
    },
    nested_fields("System", "SocketAsyncResult"),
    nested_fields("System", "ProcessAsyncReader"),
];

impl DependencyRule {
    /// Returns true if the rule applies to a type
    ///
    /// # Arguments
    ///
    /// * `assembly` - Name of the assembly defining the type.
    /// * `namespace` - Namespace of the type (empty for nested types).
    /// * `type_name` - Simple name of the type.
    /// * `nested` - Whether the type is nested.
    /// * `link_symbols` - Whether this is a debug build.
    #[must_use]
    pub fn matches(
        &self,
        assembly: &str,
        namespace: &str,
        type_name: &str,
        nested: bool,
        link_symbols: bool,
    ) -> bool {
        if self.debug_only && !link_symbols {
            return false;
        }
        if self.assembly != assembly || self.type_name != type_name || self.nested != nested {
            return false;
        }
        nested || self.namespace == namespace
    }
}

/// Rules applying to a type, in table order
#[must_use]
pub fn rules_for(
    assembly: &str,
    namespace: &str,
    type_name: &str,
    nested: bool,
    link_symbols: bool,
) -> Vec<&'static DependencyRule> {
    NATIVE_DEPENDENCY_RULES
        .iter()
        .filter(|rule| rule.matches(assembly, namespace, type_name, nested, link_symbols))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_marks_all_fields() {
        let rules = rules_for("System", "System.Net.Sockets", "Socket", false, false);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].action, DependencyAction::AllFields);

        let rules = rules_for("System", "System.Net.Sockets", "LingerOption", false, false);
        assert_eq!(rules[0].action, DependencyAction::InstanceFields);
    }

    #[test]
    fn test_debug_rules_need_symbols() {
        assert!(rules_for("mscorlib", "System.Threading.Tasks", "Task", false, false).is_empty());
        assert_eq!(
            rules_for("mscorlib", "System.Threading.Tasks", "Task", false, true).len(),
            1
        );
    }

    #[test]
    fn test_nested_rules_ignore_namespace() {
        assert_eq!(rules_for("System", "", "SocketAsyncResult", true, false).len(), 1);
        assert!(rules_for("System", "System.Net.Sockets", "SocketAsyncResult", false, false).is_empty());
    }

    #[test]
    fn test_cross_assembly_target() {
        let rules = rules_for("System.Data", "System.Data.SqlTypes", "SqlXml", false, false);
        assert_eq!(
            rules[0].action,
            DependencyAction::Methods {
                assembly: Some("System.Xml"),
                type_name: Some("System.Xml.XmlReader"),
                methods: &["CreateSqlReader"],
            }
        );
    }

    #[test]
    fn test_unknown_assembly_has_no_rules() {
        assert!(rules_for("App", "System.Net.Sockets", "Socket", false, true).is_empty());
    }
}
