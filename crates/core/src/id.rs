// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ID allocation scheme shared by jobs and artifacts

/// Define a newtype ID wrapper around `SmolStr` with a type prefix.
///
/// IDs are allocated from a persisted per-scope counter, so the format is
/// `{prefix}{n}` where `n` is the allocation number (starting at 1). Only
/// that canonical form can name a stored entity; anything else a caller
/// supplies is treated as an unknown ID.
///
/// Generates `from_seq()`, `as_str()`, `seq()`, `is_canonical()`, `Display`,
/// `From<String>`, `From<&str>`, string comparisons, `Borrow<str>` (so maps
/// keyed by ID can be queried with `&str`), and `Deref<Target = str>`.
///
/// ```ignore
/// define_id! {
///     /// Doc comment for the ID type.
///     pub struct JobId("job-");
/// }
/// ```
#[macro_export]
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident($prefix:literal);
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub smol_str::SmolStr);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            /// ID for the `seq`-th allocation within its scope
            pub fn from_seq(seq: u64) -> Self {
                Self(smol_str::SmolStr::new(format!("{}{}", Self::PREFIX, seq)))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Allocation number encoded in the ID, if any.
            pub fn seq(&self) -> Option<u64> {
                self.0.strip_prefix(Self::PREFIX)?.parse().ok()
            }

            /// True when the ID is exactly `{prefix}{n}` for some `n >= 1`.
            ///
            /// Rejects leading zeros, signs, and path separators, so a
            /// canonical ID is always safe to use as a file name.
            pub fn is_canonical(&self) -> bool {
                match self.seq() {
                    Some(seq) if seq > 0 => Self::from_seq(seq) == *self,
                    _ => false,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(smol_str::SmolStr::new(s))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(smol_str::SmolStr::new(s))
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            fn deref(&self) -> &str {
                &self.0
            }
        }
    };
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
