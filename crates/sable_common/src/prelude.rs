pub use core::prelude::*;

pub use crate::alloc::{Allocator, ArenaAlloc, SystemAlloc};
pub use crate::collections::{Seq, TryReserveError};
pub use crate::seq;
