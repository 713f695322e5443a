//! Custom attributes attached to types and methods.
//!
//! The program model keeps custom attributes in decoded form: the attribute type plus its
//! fixed (constructor) arguments. Named arguments are not needed by the linker and are not
//! modeled.
//!
//! The one attribute the linker interprets is the bridge registration attribute, see
//! [`RegisterAttribute`]. It links a managed member to its native-callable counterpart and
//! names the connector member that must survive trimming alongside it.
//!
//! # Examples
//!
//! ```rust
//! use cilshrink::metadata::customattributes::{CustomAttribute, RegisterAttribute};
//! use cilshrink::metadata::signatures::TypeSig;
//!
//! let attr = CustomAttribute::new(TypeSig::named("Mono.Android", "Android.Runtime", "RegisterAttribute"))
//!     .with_string("hasWindowFocus")
//!     .with_string("()Z")
//!     .with_string("GetHasWindowFocusHandler");
//!
//! let register = RegisterAttribute::from_attribute(&attr, "Android.Runtime.RegisterAttribute").unwrap();
//! assert_eq!(register.connector.as_deref(), Some("GetHasWindowFocusHandler"));
//! ```
//!
//! # References
//!
//! - ECMA-335 6th Edition, Partition II, Section 23.3 - Custom Attributes

mod register;
mod types;

pub use register::{ConnectorTarget, RegisterAttribute};
pub use types::{CustomAttribute, CustomAttributeArgument};
