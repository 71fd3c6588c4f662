//! Global allocator.
//!
//! Every page copy clones many small dictionaries and arrays, which mimalloc
//! handles faster than the system allocator.

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;
