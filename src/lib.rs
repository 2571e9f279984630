//! # memspace - A Simulated First-Fit Memory Manager
//!
//! This crate models a flat, single address space memory manager. A fixed
//! range of integer addresses is carved into variable-length blocks that are
//! allocated on request and later released. No real memory is touched:
//! addresses are plain `usize` values and blocks are `(base, length)` pairs.
//!
//! ## Overview
//!
//! ```text
//!   MemorySpace (capacity = 100), after allocate(10), allocate(20), release(0):
//!
//!   address  0        10                  30                               100
//!            ┌────────┬───────────────────┬─────────────────────────────────┐
//!            │  free  │     allocated     │              free               │
//!            └────────┴───────────────────┴─────────────────────────────────┘
//!
//!   free list:       (30 , 70) ──► (0 , 10)
//!   allocated list:  (10 , 20)
//! ```
//!
//! Released blocks are appended to the end of the free list and are never
//! merged on their own. [`MemorySpace::defragment`] coalesces free blocks
//! whose ranges touch, regardless of where they sit in the list.
//!
//! ## Crate Structure
//!
//! ```text
//!   memspace
//!   ├── block      - Block descriptor (base, length)
//!   ├── list       - BlockList, an ordered singly-linked block sequence
//!   └── space      - MemorySpace, the first-fit allocator engine
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use memspace::MemorySpace;
//!
//! let mut space = MemorySpace::new(100).unwrap();
//!
//! let a = space.allocate(10).unwrap();
//! let b = space.allocate(20).unwrap();
//! assert_eq!((a, b), (0, 10));
//!
//! space.release(a);
//! space.release(b);
//! assert_eq!(space.allocate(100), None);
//!
//! space.defragment();
//! assert_eq!(space.allocate(100), Some(0));
//! ```
//!
//! ## How It Works
//!
//! Allocation walks the free list from its head and takes the first block
//! that is large enough:
//!
//! ```text
//!   allocate(17) with first fitting free block (250 , 20):
//!
//!   before   ┌──────────────────────────────┐
//!            │ free (250 , 20)              │
//!            └──────────────────────────────┘
//!   after    ┌─────────────────────────┬────┐
//!            │ allocated (250 , 17)    │free│  (267 , 3)
//!            └─────────────────────────┴────┘
//! ```
//!
//! An exact fit removes the free block altogether, so no zero-length block
//! is ever left behind.
//!
//! ## Limitations
//!
//! - **First-fit only**: no best-fit or worst-fit search
//! - **Single-threaded**: mutation needs `&mut`, share behind a `Mutex`
//! - **Manual defragmentation**: a failed allocation does not defragment
//!
//! ## Logging
//!
//! Allocation, release and defragmentation outcomes are reported through the
//! [`log`] facade at `debug` level, individual search and merge steps at
//! `trace` level. Install any logger (for example `env_logger`) to see them.

mod block;
pub mod list;
mod space;

pub use block::Block;
pub use list::{BlockList, Cursor, ListError, NodeId};
pub use space::{MemorySpace, SpaceError};
