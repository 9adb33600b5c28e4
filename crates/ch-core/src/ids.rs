//! Node and edge ids.
//!
//! Both are plain `u32` positions into `GraphRep`'s flat arrays.  The inner
//! integer is `pub` so loaders can build them from file indices; `u32::MAX`
//! is reserved as the "none" value, used for the shortcut pointers of
//! original edges and for unset predecessor slots.

use std::fmt;

macro_rules! graph_id {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(pub u32);

        impl $name {
            pub const INVALID: $name = $name(u32::MAX);

            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline(always)]
            pub fn is_valid(self) -> bool {
                self.0 != u32::MAX
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::INVALID
            }
        }

        /// The bare number; messages say "node 3", "edge 7".
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

graph_id! {
    /// Position in every per-node array of `GraphRep`.
    NodeId
}

graph_id! {
    /// Position in the source-grouped edge arrays of `GraphRep`.  Shortcut
    /// pointers use the same id space.
    EdgeId
}
