//! Configuration for a link run.
//!
//! [`LinkerConfig`] names the well-known runtime types and members the linker relies on
//! and switches optional behaviour. Defaults match the Android bridge runtime
//! (`Mono.Android` / `Java.Interop`).

use rustc_hash::FxHashSet;

/// Product and SDK assemblies; exempt from abstract-method completion and app-domain checks
const DEFAULT_TRUSTED_ASSEMBLIES: &[&str] = &[
    "mscorlib",
    "netstandard",
    "System",
    "System.Core",
    "System.Data",
    "System.Runtime",
    "System.Xml",
    "Java.Interop",
    "Mono.Android",
    "Mono.Android.Export",
];

/// Configuration for the linker.
#[derive(Debug, Clone)]
pub struct LinkerConfig {
    /// Assemblies known to satisfy their interface contracts.
    pub trusted_assemblies: FxHashSet<String>,

    /// Keep JNI marshal thunks alive and rewrite registration tables to the marked set
    /// (default: false).
    pub preserve_jni_marshal_methods: bool,

    /// Symbols are linked (debug build); enables debugger-support dependencies
    /// (default: false).
    pub link_symbols: bool,

    /// Name of the core library assembly.
    pub corlib: String,

    /// Assembly defining the bridge runtime types.
    pub bridge_assembly: String,

    /// Assembly defining `JniNativeMethodRegistrationArguments`.
    pub interop_assembly: String,

    /// Full name of the error type thrown by synthesized stubs.
    pub error_type: String,

    /// Only subclasses of this type are completed; `None` completes every concrete type.
    pub bridge_base_type: Option<String>,

    /// Capability interface of managed bridge objects.
    pub java_object_interface: String,

    /// Capability interface of Java.Interop peers.
    pub java_peerable_interface: String,

    /// Full name of the bridge registration attribute.
    pub register_attribute: String,

    /// Simple name of the nested type holding generated marshal thunks.
    pub marshal_methods_type: String,

    /// Name of the per-type registration method.
    pub registration_method: String,

    /// Marshal type of the built-in type manager, always part of the dispatch table.
    pub builtin_marshal_type: String,

    /// Type holding the generated dispatch table.
    pub magic_registration_type: String,
}

impl Default for LinkerConfig {
    fn default() -> Self {
        Self {
            trusted_assemblies: DEFAULT_TRUSTED_ASSEMBLIES
                .iter()
                .map(|name| (*name).to_string())
                .collect(),
            preserve_jni_marshal_methods: false,
            link_symbols: false,
            corlib: "mscorlib".to_string(),
            bridge_assembly: "Mono.Android".to_string(),
            interop_assembly: "Java.Interop".to_string(),
            error_type: "Java.Lang.AbstractMethodError".to_string(),
            bridge_base_type: Some("Java.Lang.Object".to_string()),
            java_object_interface: "Android.Runtime.IJavaObject".to_string(),
            java_peerable_interface: "Java.Interop.IJavaPeerable".to_string(),
            register_attribute: "Android.Runtime.RegisterAttribute".to_string(),
            marshal_methods_type: "__<$>_jni_marshal_methods".to_string(),
            registration_method: "__RegisterNativeMembers".to_string(),
            builtin_marshal_type:
                "Java.Interop.TypeManager/JavaTypeManager/__<$>_jni_marshal_methods".to_string(),
            magic_registration_type: "Android.Runtime.AndroidTypeManager/MagicRegistrationMap"
                .to_string(),
        }
    }
}

impl LinkerConfig {
    /// Creates a new configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `assembly` belongs to the trusted product/SDK set
    #[must_use]
    pub fn is_trusted(&self, assembly: &str) -> bool {
        self.trusted_assemblies.contains(assembly)
    }

    /// Enables or disables marshal method preservation and registration rewriting.
    ///
    /// # Arguments
    ///
    /// * `enabled` - Whether the dispatch table is rewritten after marking.
    ///
    /// # Returns
    ///
    /// The modified configuration (builder pattern).
    #[must_use]
    pub fn with_preserve_jni_marshal_methods(mut self, enabled: bool) -> Self {
        self.preserve_jni_marshal_methods = enabled;
        self
    }

    /// Marks the build as a debug build with linked symbols.
    #[must_use]
    pub fn with_link_symbols(mut self, enabled: bool) -> Self {
        self.link_symbols = enabled;
        self
    }

    /// Adds an assembly to the trusted set.
    #[must_use]
    pub fn with_trusted_assembly(mut self, name: &str) -> Self {
        self.trusted_assemblies.insert(name.to_string());
        self
    }

    /// Removes an assembly from the trusted set.
    #[must_use]
    pub fn without_trusted_assembly(mut self, name: &str) -> Self {
        self.trusted_assemblies.remove(name);
        self
    }

    /// Sets the bridge base type restricting abstract-method completion.
    ///
    /// # Arguments
    ///
    /// * `base` - Full name of the base type, or `None` to complete every concrete type.
    #[must_use]
    pub fn with_bridge_base_type(mut self, base: Option<&str>) -> Self {
        self.bridge_base_type = base.map(str::to_string);
        self
    }

    /// Sets the error type thrown by synthesized stubs.
    ///
    /// # Arguments
    ///
    /// * `assembly` - Assembly defining the type.
    /// * `fullname` - Full name of the type; its first parameterless `.ctor` is used.
    #[must_use]
    pub fn with_error_type(mut self, assembly: &str, fullname: &str) -> Self {
        self.bridge_assembly = assembly.to_string();
        self.error_type = fullname.to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LinkerConfig::default();
        assert!(config.is_trusted("Mono.Android"));
        assert!(!config.is_trusted("App"));
        assert!(!config.preserve_jni_marshal_methods);
        assert_eq!(config.bridge_base_type.as_deref(), Some("Java.Lang.Object"));
    }

    #[test]
    fn test_builder_setters() {
        let config = LinkerConfig::new()
            .with_preserve_jni_marshal_methods(true)
            .with_link_symbols(true)
            .with_trusted_assembly("Vendor.Sdk")
            .without_trusted_assembly("System")
            .with_bridge_base_type(None);

        assert!(config.preserve_jni_marshal_methods);
        assert!(config.link_symbols);
        assert!(config.is_trusted("Vendor.Sdk"));
        assert!(!config.is_trusted("System"));
        assert!(config.bridge_base_type.is_none());
    }
}
