//! Public enumerants shared with the engine. The integer values are stable and
//! form part of the public surface; they carry no behavior of their own beyond
//! selecting a mode in the accessors that accept them.

use serde::{Deserialize, Serialize};

use crate::errors::GraphError;

macro_rules! enumerant {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $value:expr),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[repr(i32)]
        pub enum $name {
            $($variant = $value),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_i32(self) -> i32 {
                self as i32
            }
        }

        impl TryFrom<i32> for $name {
            type Error = GraphError;

            fn try_from(value: i32) -> Result<Self, Self::Error> {
                match value {
                    $(v if v == $value => Ok($name::$variant),)+
                    other => Err(GraphError::invalid_operation(format!(
                        "{} has no enumerant {other}",
                        stringify!($name)
                    ))),
                }
            }
        }
    };
}

enumerant! {
    /// Direction used by adjacency queries.
    NeighborMode { Out = 1, In = 2, All = 3 }
}

enumerant! {
    /// Orientation of the spokes produced by [`crate::GraphSpec::star`].
    StarMode { Out = 0, In = 1, Undirected = 2 }
}

enumerant! {
    /// Orientation of the edges produced by [`crate::GraphSpec::tree`].
    TreeMode { Out = 0, In = 1, Undirected = 2 }
}

enumerant! {
    Connectedness { Weak = 1, Strong = 2 }
}

enumerant! {
    /// Which triangle of an undirected adjacency matrix is filled.
    AdjacencyLayout { Upper = 0, Lower = 1, Both = 2 }
}

impl Default for NeighborMode {
    fn default() -> Self {
        NeighborMode::All
    }
}

impl Default for AdjacencyLayout {
    fn default() -> Self {
        AdjacencyLayout::Both
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumerant_values_are_stable() {
        assert_eq!(NeighborMode::Out.as_i32(), 1);
        assert_eq!(NeighborMode::All.as_i32(), 3);
        assert_eq!(StarMode::Undirected.as_i32(), 2);
        assert_eq!(TreeMode::In.as_i32(), 1);
        assert_eq!(Connectedness::Strong.as_i32(), 2);
        assert_eq!(AdjacencyLayout::Upper.as_i32(), 0);
    }

    #[test]
    fn test_try_from_rejects_unknown_values() {
        assert_eq!(NeighborMode::try_from(2), Ok(NeighborMode::In));
        let err = Connectedness::try_from(0).expect_err("no such enumerant");
        assert!(matches!(err, GraphError::InvalidOperation(_)));
    }
}
