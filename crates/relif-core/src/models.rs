//! Domain models for Relif.
//!
//! These are the UI-facing schemas produced by the transform layer.
//! Optional columns are already default-filled: collections are empty,
//! strings are empty and JSON blobs are `{}`.

/// Declares a status-like enum stored as an upper-case string column.
///
/// Generates serde impls using the column spelling, `as_str`, `parse`
/// (lenient, `None` on unknown values) and `Default`.
macro_rules! column_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            #[default]
            $default:ident => $default_str:literal,
            $($variant:ident => $s:literal),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            #[default]
            #[serde(rename = $default_str)]
            $default,
            $(#[serde(rename = $s)] $variant,)*
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$name::$default, $($name::$variant),*];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $name::$default => $default_str,
                    $($name::$variant => $s,)*
                }
            }

            /// Case-insensitive; older rows store lowercase values.
            pub fn parse(s: &str) -> Option<Self> {
                match s.to_ascii_uppercase().as_str() {
                    $default_str => Some($name::$default),
                    $($s => Some($name::$variant),)*
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use column_enum;

pub mod auth;
pub mod beneficiary;
pub mod case;
pub mod housing;
pub mod inventory;
pub mod organization;
pub mod requests;
pub mod user;
pub mod volunteer;

/// Empty JSON object, the default for nullable JSON columns.
pub fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(Default::default())
}
