//! Identifier newtypes.
//!
//! Backend identifiers are opaque strings (document ids). Wrapping them keeps
//! a scene id from being passed where a choice id is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps a raw backend identifier.
            #[must_use]
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Returns the raw identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }
    };
}

string_id!(
    /// Identifies a scenario (a complete branching story).
    ScenarioId
);
string_id!(
    /// Identifies a scene within a scenario.
    SceneId
);
string_id!(
    /// Identifies a choice (an edge between two scenes).
    ChoiceId
);
string_id!(
    /// Identifies a player progress record.
    ProgressId
);
string_id!(
    /// Identifies a user account.
    UserId
);
string_id!(
    /// Identifies a media asset (image, narration, music).
    AssetId
);
