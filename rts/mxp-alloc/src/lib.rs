//! Allocation primitives for MatrixPipe containers.
//!
//! Containers in this workspace never talk to the global heap directly. They
//! are parameterized over an [`Allocator`], a cheap clonable handle that
//! hands out raw storage and constructs/destroys elements inside it.
//!
//! # Allocators
//!
//! | Allocator | Backing | Copy propagation | Move propagation |
//! |-----------|---------|------------------|------------------|
//! | [`Global`] | System heap | no | yes |
//! | [`TrackingAllocator`] | System heap + shared statistics | yes | yes |
//! | [`ArenaAllocator`] | Shared monotonic arena | no | no |
//!
//! The propagation flags decide which allocator a container ends up with
//! after copy- or move-assignment. See [`Allocator`] for the exact rules.
//!
//! # Storage
//!
//! [`RawStorage`] is the scoped acquisition used for bulk construction: it
//! owns uninitialized storage until every element has been constructed, and
//! rolls back the constructed prefix if a constructor fails.

#![warn(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod arena;
pub mod buffer;

pub use arena::ArenaAllocator;
pub use buffer::{allocate_array, deallocate_array, destroy_range, RawStorage};

use std::alloc::{Layout, LayoutError};
use std::cell::Cell;
use std::ptr::NonNull;
use std::rc::Rc;

/// Result type for allocation operations.
pub type AllocResult<T> = Result<T, AllocError>;

/// Errors that can occur during allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocError {
    /// Out of memory.
    OutOfMemory {
        /// Requested allocation size.
        requested: usize,
    },
    /// Invalid layout (size overflow or invalid alignment).
    InvalidLayout(String),
    /// Arena capacity exhausted.
    ArenaExhausted {
        /// Requested allocation size.
        requested: usize,
        /// Bytes already handed out by the arena.
        used: usize,
        /// Total arena capacity.
        capacity: usize,
    },
}

impl std::fmt::Display for AllocError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfMemory { requested } => {
                write!(f, "out of memory: failed to allocate {requested} bytes")
            }
            Self::InvalidLayout(msg) => write!(f, "invalid layout: {msg}"),
            Self::ArenaExhausted {
                requested,
                used,
                capacity,
            } => {
                write!(
                    f,
                    "arena exhausted: requested {requested} bytes with {used} of {capacity} bytes used"
                )
            }
        }
    }
}

impl std::error::Error for AllocError {}

impl From<LayoutError> for AllocError {
    fn from(e: LayoutError) -> Self {
        Self::InvalidLayout(e.to_string())
    }
}

/// A storage strategy for containers.
///
/// Implementations are handles: cloning one yields another handle to the
/// same underlying resource (or an equivalent stateless one).
///
/// # Propagation
///
/// - On copy-assignment a container adopts the source's allocator only if
///   [`PROPAGATE_ON_COPY_ASSIGNMENT`](Allocator::PROPAGATE_ON_COPY_ASSIGNMENT)
///   is set; otherwise it keeps its own.
/// - On move-assignment a container steals the source's storage if
///   [`PROPAGATE_ON_MOVE_ASSIGNMENT`](Allocator::PROPAGATE_ON_MOVE_ASSIGNMENT)
///   is set or both handles are the [`same_resource`](Allocator::same_resource).
///   Otherwise the elements are relocated into storage from its own allocator.
pub trait Allocator: Clone {
    /// Whether copy-assignment replaces the target's allocator with the source's.
    const PROPAGATE_ON_COPY_ASSIGNMENT: bool = false;

    /// Whether move-assignment replaces the target's allocator with the source's.
    const PROPAGATE_ON_MOVE_ASSIGNMENT: bool = true;

    /// Allocate a block of memory with the given layout.
    ///
    /// # Safety
    ///
    /// - `layout.size()` must be non-zero
    /// - The returned block must be released with `deallocate` on an
    ///   allocator for which `same_resource` holds, using the same layout
    unsafe fn allocate(&self, layout: Layout) -> AllocResult<NonNull<u8>>;

    /// Deallocate a previously allocated block.
    ///
    /// # Safety
    ///
    /// - `ptr` was allocated by this resource with the same `layout`
    /// - `ptr` has not been deallocated before
    /// - Every value stored in the block has already been destroyed or moved out
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);

    /// Construct `value` in the uninitialized slot.
    ///
    /// # Safety
    ///
    /// `slot` must be valid for writes and properly aligned.
    unsafe fn construct<T>(&self, slot: NonNull<T>, value: T) {
        unsafe { slot.as_ptr().write(value) }
    }

    /// Destroy the value in `slot`, leaving it uninitialized.
    ///
    /// # Safety
    ///
    /// `slot` must hold an initialized value that is not used afterwards.
    unsafe fn destroy<T>(&self, slot: NonNull<T>) {
        unsafe { std::ptr::drop_in_place(slot.as_ptr()) }
    }

    /// The allocator a freshly copy-constructed container should use.
    #[must_use]
    fn select_on_copy(&self) -> Self {
        self.clone()
    }

    /// Whether storage from `self` may be released through `other`.
    fn same_resource(&self, other: &Self) -> bool {
        let _ = other;
        true
    }
}

/// Statistics for memory allocation tracking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocStats {
    /// Total bytes currently allocated.
    pub bytes_allocated: usize,
    /// Total number of allocations performed.
    pub allocation_count: usize,
    /// Total number of deallocations performed.
    pub deallocation_count: usize,
    /// Peak memory usage in bytes.
    pub peak_bytes: usize,
    /// Number of failed allocations.
    pub failed_allocations: usize,
    /// Number of elements constructed through the allocator.
    pub constructed: usize,
    /// Number of elements destroyed through the allocator.
    pub destroyed: usize,
}

impl AllocStats {
    /// Create new empty statistics.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bytes_allocated: 0,
            allocation_count: 0,
            deallocation_count: 0,
            peak_bytes: 0,
            failed_allocations: 0,
            constructed: 0,
            destroyed: 0,
        }
    }

    /// Record an allocation.
    pub fn record_alloc(&mut self, size: usize) {
        self.bytes_allocated += size;
        self.allocation_count += 1;
        self.peak_bytes = self.peak_bytes.max(self.bytes_allocated);
    }

    /// Record a deallocation.
    pub fn record_dealloc(&mut self, size: usize) {
        self.bytes_allocated = self.bytes_allocated.saturating_sub(size);
        self.deallocation_count += 1;
    }

    /// Record a failed allocation.
    pub fn record_failure(&mut self) {
        self.failed_allocations += 1;
    }

    /// Number of elements constructed but not yet destroyed.
    #[must_use]
    pub const fn live_elements(&self) -> usize {
        self.constructed.saturating_sub(self.destroyed)
    }
}

/// Utility function to align a size up to the given alignment.
#[inline]
#[must_use]
pub const fn align_up(size: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two());
    (size + align - 1) & !(align - 1)
}

// ============================================================================
// Global Allocator
// ============================================================================

/// The system heap.
///
/// Stateless, so every handle is the same resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Global;

impl Allocator for Global {
    unsafe fn allocate(&self, layout: Layout) -> AllocResult<NonNull<u8>> {
        debug_assert!(layout.size() > 0);
        let ptr = unsafe { std::alloc::alloc(layout) };
        NonNull::new(ptr).ok_or(AllocError::OutOfMemory {
            requested: layout.size(),
        })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        unsafe { std::alloc::dealloc(ptr.as_ptr(), layout) };
    }
}

// ============================================================================
// Tracking Allocator
// ============================================================================

/// A system-heap allocator that records statistics shared by all its clones.
///
/// An optional byte limit turns it into a failure injector: any allocation
/// that would push live bytes past the limit fails with
/// [`AllocError::OutOfMemory`].
///
/// # Example
///
/// ```
/// use mxp_alloc::{allocate_array, deallocate_array, TrackingAllocator};
///
/// let alloc = TrackingAllocator::new();
/// let ptr = allocate_array::<f64, _>(&alloc, 16).unwrap();
/// assert_eq!(alloc.stats().bytes_allocated, 16 * 8);
/// unsafe { deallocate_array(&alloc, ptr, 16) };
/// assert_eq!(alloc.stats().bytes_allocated, 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TrackingAllocator {
    stats: Rc<Cell<AllocStats>>,
    limit: Option<usize>,
}

impl TrackingAllocator {
    /// Create a new tracking allocator without a byte limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tracking allocator that refuses to hold more than `limit` live bytes.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            stats: Rc::default(),
            limit: Some(limit),
        }
    }

    /// Get allocation statistics.
    #[must_use]
    pub fn stats(&self) -> AllocStats {
        self.stats.get()
    }

    fn update(&self, f: impl FnOnce(&mut AllocStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }
}

impl Allocator for TrackingAllocator {
    const PROPAGATE_ON_COPY_ASSIGNMENT: bool = true;
    const PROPAGATE_ON_MOVE_ASSIGNMENT: bool = true;

    unsafe fn allocate(&self, layout: Layout) -> AllocResult<NonNull<u8>> {
        let requested = layout.size();
        if let Some(limit) = self.limit {
            if self.stats.get().bytes_allocated + requested > limit {
                self.update(AllocStats::record_failure);
                return Err(AllocError::OutOfMemory { requested });
            }
        }

        match unsafe { Global.allocate(layout) } {
            Ok(ptr) => {
                self.update(|s| s.record_alloc(requested));
                Ok(ptr)
            }
            Err(e) => {
                self.update(AllocStats::record_failure);
                Err(e)
            }
        }
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.update(|s| s.record_dealloc(layout.size()));
        unsafe { Global.deallocate(ptr, layout) };
    }

    unsafe fn construct<T>(&self, slot: NonNull<T>, value: T) {
        unsafe { slot.as_ptr().write(value) };
        self.update(|s| s.constructed += 1);
    }

    unsafe fn destroy<T>(&self, slot: NonNull<T>) {
        self.update(|s| s.destroyed += 1);
        unsafe { std::ptr::drop_in_place(slot.as_ptr()) };
    }

    fn same_resource(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.stats, &other.stats)
    }
}
