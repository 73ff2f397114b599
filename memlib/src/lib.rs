//! # MemLib
//!
//! Memlib is a library for simulating the memory subsystem of a computer
//!
//! It provides contiguous-block allocation with pluggable placement strategies, a power-of-two
//! buddy allocator, set-associative cache levels parameterised by a replacement policy, and a
//! paging virtual memory manager, plus a pipeline chaining address translation into a two level
//! cache lookup
//!
//! Every engine owns its state outright and processes one logical event at a time. Time is a
//! logical step counter, never the wall clock

/// Contains the contiguous allocator
pub mod allocator;

/// Contains the `Block` value describing one extent of physical memory
pub mod block;

/// Contains the buddy allocator
pub mod buddy;

/// Contains the implementation of a cache level, and a utility enum for the existing policies
pub mod cache;

/// Contains definitions for the JSON configuration format
pub mod config;

/// Contains the construction and trace error types
pub mod error;

/// Contains trace and allocation script loading
pub mod io;

/// Contains the chained translation and cache lookup
pub mod pipeline;

/// Contains the provided placement strategies, with a trait for implementing custom strategies
pub mod placement_policies;

/// Contains the provided cache replacement policies, with a trait for implementing custom
/// replacement policies
pub mod replacement_policies;

/// Contains derived statistics over engine state
pub mod stats;

/// Contains the virtual memory manager
pub mod virtual_memory;

#[cfg(test)]
mod test;
