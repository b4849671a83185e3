//! Domain identifier types with proper encapsulation.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Create an id from a string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generate a fresh random id.
            #[must_use]
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Get the id as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::new(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }
    };
}

string_id! {
    /// Strategy package identifier.
    StrategyId
}

string_id! {
    /// Risk assessment identifier.
    AssessmentId
}

string_id! {
    /// Risk alert identifier.
    AlertId
}

string_id! {
    /// Order identifier.
    OrderId
}

string_id! {
    /// Correlation id tying a bus request to its reply.
    CorrelationId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_round_trip() {
        let id = StrategyId::from("strat-1");
        assert_eq!(id.as_str(), "strat-1");
        assert_eq!(id.to_string(), "strat-1");
    }

    #[test]
    fn test_generate_unique() {
        assert_ne!(CorrelationId::generate(), CorrelationId::generate());
    }
}
