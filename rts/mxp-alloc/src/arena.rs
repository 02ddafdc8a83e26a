//! Monotonic arena allocator.
//!
//! An [`ArenaAllocator`] is a handle to a shared, fixed-capacity arena:
//!
//! - **Bump allocation** - O(1) allocation via cursor bumping
//! - **No per-block free** - `deallocate` only updates statistics
//! - **Scope-based lifetime** - the arena memory is returned to the system
//!   when the last handle is dropped
//!
//! Arena handles never propagate on copy- or move-assignment, and two handles
//! are the same resource only if they point at the same arena. A container
//! moved into a matrix backed by a different arena therefore relocates its
//! elements instead of adopting foreign storage.
//!
//! ```
//! use mxp_alloc::{allocate_array, deallocate_array, ArenaAllocator};
//!
//! let arena = ArenaAllocator::new(1024).unwrap();
//! let ptr = allocate_array::<f64, _>(&arena, 10).unwrap();
//! assert!(arena.used() >= 80);
//! unsafe { deallocate_array(&arena, ptr, 10) };
//! // Memory stays reserved until the arena itself goes away.
//! assert!(arena.used() >= 80);
//! ```

use crate::{align_up, AllocError, AllocResult, AllocStats, Allocator};
use std::alloc::{alloc, dealloc, Layout};
use std::cell::Cell;
use std::ptr::NonNull;
use std::rc::Rc;

/// Alignment of the arena base address.
const ARENA_ALIGN: usize = 64;

/// Default arena size (1 MB).
pub const DEFAULT_ARENA_SIZE: usize = 1024 * 1024;

/// Backing memory of an arena.
///
/// # Invariants
///
/// - `base` points to `capacity` bytes aligned to `ARENA_ALIGN`
///   (dangling when `capacity == 0`)
/// - `cursor <= capacity`
#[derive(Debug)]
struct Arena {
    base: NonNull<u8>,
    capacity: usize,
    cursor: Cell<usize>,
    stats: Cell<AllocStats>,
}

impl Arena {
    fn new(capacity: usize) -> AllocResult<Self> {
        let base = if capacity == 0 {
            NonNull::dangling()
        } else {
            let layout = Layout::from_size_align(capacity, ARENA_ALIGN)?;
            // Safety: layout is valid and non-zero
            let ptr = unsafe { alloc(layout) };
            NonNull::new(ptr).ok_or(AllocError::OutOfMemory {
                requested: capacity,
            })?
        };

        Ok(Self {
            base,
            capacity,
            cursor: Cell::new(0),
            stats: Cell::new(AllocStats::new()),
        })
    }

    fn bump(&self, layout: Layout) -> AllocResult<NonNull<u8>> {
        let base = self.base.as_ptr() as usize;
        let start = align_up(base + self.cursor.get(), layout.align()) - base;
        let end = start.checked_add(layout.size());

        match end {
            Some(end) if end <= self.capacity => {
                self.cursor.set(end);
                self.update(|s| s.record_alloc(layout.size()));
                // Safety: start is within the arena and properly aligned
                Ok(unsafe { NonNull::new_unchecked(self.base.as_ptr().add(start)) })
            }
            _ => {
                self.update(AllocStats::record_failure);
                Err(AllocError::ArenaExhausted {
                    requested: layout.size(),
                    used: self.cursor.get(),
                    capacity: self.capacity,
                })
            }
        }
    }

    fn update(&self, f: impl FnOnce(&mut AllocStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        if self.capacity == 0 {
            return;
        }
        if let Ok(layout) = Layout::from_size_align(self.capacity, ARENA_ALIGN) {
            // Safety: base was allocated with this layout
            unsafe { dealloc(self.base.as_ptr(), layout) };
        }
    }
}

/// A clonable handle to a shared monotonic arena.
#[derive(Debug, Clone)]
pub struct ArenaAllocator {
    arena: Rc<Arena>,
}

impl ArenaAllocator {
    /// Create a new arena with the specified capacity in bytes.
    pub fn new(capacity: usize) -> AllocResult<Self> {
        Ok(Self {
            arena: Rc::new(Arena::new(capacity)?),
        })
    }

    /// Create a new arena with default capacity (1 MB).
    pub fn with_default_capacity() -> AllocResult<Self> {
        Self::new(DEFAULT_ARENA_SIZE)
    }

    /// Get the total capacity of the arena in bytes.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.arena.capacity
    }

    /// Get the number of bytes handed out so far, including alignment padding.
    #[inline]
    #[must_use]
    pub fn used(&self) -> usize {
        self.arena.cursor.get()
    }

    /// Get the number of bytes remaining.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.arena.capacity - self.used()
    }

    /// Get allocation statistics for this arena.
    #[must_use]
    pub fn stats(&self) -> AllocStats {
        self.arena.stats.get()
    }
}

impl Allocator for ArenaAllocator {
    const PROPAGATE_ON_COPY_ASSIGNMENT: bool = false;
    const PROPAGATE_ON_MOVE_ASSIGNMENT: bool = false;

    unsafe fn allocate(&self, layout: Layout) -> AllocResult<NonNull<u8>> {
        self.arena.bump(layout)
    }

    unsafe fn deallocate(&self, _ptr: NonNull<u8>, layout: Layout) {
        self.arena.update(|s| s.record_dealloc(layout.size()));
    }

    fn same_resource(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.arena, &other.arena)
    }
}
