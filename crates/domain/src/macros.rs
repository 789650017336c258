//! Macro for implementing Display and FromStr for wire status enums
//!
//! The Open Supply Hub API spells its statuses in SCREAMING_SNAKE_CASE
//! (`PENDING`, `NEW_FACILITY`, ...). This macro gives each status enum a
//! single mapping used for both directions.
//!
//! # Example
//!
//! ```rust
//! use oshub_domain::impl_wire_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum ReportStatus {
//!     Pending,
//!     Approved,
//! }
//!
//! impl_wire_status_conversions!(ReportStatus {
//!     Pending => "PENDING",
//!     Approved => "APPROVED",
//! });
//!
//! assert_eq!(ReportStatus::Approved.to_string(), "APPROVED");
//! assert_eq!("pending".parse::<ReportStatus>(), Ok(ReportStatus::Pending));
//! ```

/// Implements Display, FromStr and `as_str` for status enums
///
/// - Display writes the wire spelling exactly as given
/// - FromStr is case-insensitive and trims surrounding whitespace
/// - `as_str` returns the wire spelling as a `&'static str`
///
/// The wire spellings passed to the macro must be upper case.
#[macro_export]
macro_rules! impl_wire_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Wire spelling of this status.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s.trim().to_ascii_uppercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
