//! Dense integer identities.
//!
//! Every state, event and transition of a machine is identified by its
//! position in the corresponding installed table. Ids are never reused or
//! invalidated: tables are immutable once installed.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! dense_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub usize);

        impl $name {
            /// Position of this entity in its table.
            pub const fn index(self) -> usize {
                self.0
            }
        }

        impl From<usize> for $name {
            fn from(index: usize) -> Self {
                Self(index)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

dense_id!(
    /// Index of a state in the machine's state table.
    StateId,
    "state"
);

dense_id!(
    /// Index of an event in the machine's event table.
    EventId,
    "event"
);

dense_id!(
    /// Index of a transition in the machine's transition table.
    TransitionId,
    "transition"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trips_through_from() {
        assert_eq!(StateId::from(7).index(), 7);
        assert_eq!(EventId(3).index(), 3);
    }

    #[test]
    fn display_names_the_table() {
        assert_eq!(StateId(2).to_string(), "state#2");
        assert_eq!(TransitionId(0).to_string(), "transition#0");
    }

    #[test]
    fn ids_serialize_as_bare_integers() {
        let json = serde_json::to_string(&EventId(4)).unwrap();
        assert_eq!(json, "4");
    }
}
