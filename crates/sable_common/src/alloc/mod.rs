mod alloc;

pub mod primitives;

pub use alloc::*;
pub use primitives::{ArenaAlloc, SystemAlloc};

cfg_if::cfg_if! {
    if #[cfg(feature = "memory_tracking")] {
        pub mod track;
    }
}
