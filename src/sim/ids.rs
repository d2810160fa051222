//! Arena handles
//!
//! Entities refer to each other by index into the world's vectors. Nothing is
//! removed from those vectors during a run, so a handle stays valid for the
//! run's lifetime.

use serde::{Deserialize, Serialize};

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl $name {
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            pub fn from_index(index: usize) -> Self {
                Self(index as u32)
            }
        }
    };
}

arena_id!(
    /// A book
    ItemId
);
arena_id!(
    /// A shelf
    ContainerId
);
arena_id!(
    /// A kid
    NpcId
);
