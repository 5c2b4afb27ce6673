//! Strongly typed identifier wrappers.
//!
//! IDs are dense indices: `ParcelId(i)` is row `i` of every parcel array and
//! `LinkId(j)` is row `j` of every link array.  All are `Copy + Ord + Hash`
//! so they work as map keys and in `BTreeMap` groupings without ceremony.

use std::fmt;

/// Generate a typed index wrapper around `u32`.
macro_rules! typed_id {
    ($(#[$attr:meta])* $label:literal, $vis:vis struct $name:ident;) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub u32);

        impl $name {
            /// Sentinel meaning "no valid ID" (`u32::MAX`).
            pub const INVALID: $name = $name(u32::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline(always)]
            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl Default for $name {
            /// Uninitialised IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if *self == Self::INVALID {
                    write!(f, concat!($label, "#none"))
                } else {
                    write!(f, concat!($label, "#{}"), self.0)
                }
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                u32::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Row of a sediment parcel in the ledger.
    "parcel", pub struct ParcelId;
}

typed_id! {
    /// A junction or endpoint of the river network.
    "node", pub struct NodeId;
}

typed_id! {
    /// A directed reach of the river network.
    "link", pub struct LinkId;
}

impl LinkId {
    /// Location of parcels that have left the network through the outlet.
    ///
    /// Shares its bit pattern with [`LinkId::INVALID`]: no real link can ever
    /// carry this index.
    pub const OUT_OF_NETWORK: LinkId = LinkId::INVALID;

    /// `true` for the out-of-network sentinel.
    #[inline(always)]
    pub fn is_out_of_network(self) -> bool {
        self == Self::OUT_OF_NETWORK
    }
}
