//! Row identifiers
//!
//! Each table gets its own UUID newtype so a wallet id cannot be passed where
//! a category id is expected. Rows store the full UUID (`to_key`); people see
//! a short prefixed form (`wal-1a2b3c4d`) and may type either back.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shortest UUID prefix accepted when a user types an id
pub const MIN_ID_PREFIX: usize = 8;

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident => $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Full UUID string, as stored by the backend
            pub fn to_key(&self) -> String {
                self.0.to_string()
            }

            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                s.parse()
            }

            /// Whether `identifier` names this id: the short form, the full
            /// UUID (with or without prefix), or a long enough UUID prefix
            pub fn matches(&self, identifier: &str) -> bool {
                let typed = identifier.trim().to_lowercase();
                let typed = typed.strip_prefix($prefix).unwrap_or(&typed);
                let key = self.to_key();
                typed.len() >= MIN_ID_PREFIX && key.starts_with(typed)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let key = self.0.simple().to_string();
                write!(f, "{}{}", $prefix, &key[..MIN_ID_PREFIX])
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                Uuid::parse_str(s.strip_prefix($prefix).unwrap_or(s)).map(Self)
            }
        }
    };
}

define_id!(
    /// A signed-in user, as issued by the auth provider
    UserId => "usr-"
);
define_id!(WalletId => "wal-");
define_id!(CategoryId => "cat-");
define_id!(
    /// An income or expense row
    TransactionId => "txn-"
);
