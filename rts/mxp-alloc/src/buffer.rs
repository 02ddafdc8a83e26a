//! Typed storage on top of an [`Allocator`].
//!
//! # Design
//!
//! Bulk construction follows a scoped-acquisition pattern:
//!
//! 1. [`RawStorage::allocate`] acquires uninitialized storage for `len` elements.
//! 2. One of the `init_*` methods constructs the elements front to back.
//! 3. If a constructor panics (or returns `Err` in [`RawStorage::try_init_with`]),
//!    a drop guard destroys the constructed prefix and `RawStorage` releases
//!    the storage while the failure propagates.
//! 4. On success the storage is handed to the caller as a bare pointer; the
//!    caller owns it from then on and must release it with [`destroy_range`]
//!    followed by [`deallocate_array`].
//!
//! Zero-sized requests (`len == 0` or zero-sized `T`) never reach the
//! allocator; they are served with a dangling, well-aligned pointer.

use crate::{AllocResult, Allocator};
use std::alloc::Layout;
use std::mem;
use std::ptr::NonNull;

/// Allocate uninitialized storage for `len` values of `T`.
pub fn allocate_array<T, A: Allocator>(alloc: &A, len: usize) -> AllocResult<NonNull<T>> {
    let layout = Layout::array::<T>(len)?;
    if layout.size() == 0 {
        return Ok(NonNull::dangling());
    }

    // Safety: layout is valid and non-zero sized
    let ptr = unsafe { alloc.allocate(layout)? };
    Ok(ptr.cast())
}

/// Release storage obtained from [`allocate_array`].
///
/// # Safety
///
/// - `ptr` was returned by `allocate_array::<T>` with the same `len`, on an
///   allocator for which `same_resource(alloc)` holds
/// - All `len` elements have been destroyed or moved out
pub unsafe fn deallocate_array<T, A: Allocator>(alloc: &A, ptr: NonNull<T>, len: usize) {
    let Ok(layout) = Layout::array::<T>(len) else {
        return;
    };
    if layout.size() == 0 {
        return;
    }
    unsafe { alloc.deallocate(ptr.cast(), layout) };
}

/// Destroy `len` consecutive initialized values starting at `first`.
///
/// # Safety
///
/// All `len` slots must hold initialized values that are not used afterwards.
pub unsafe fn destroy_range<T, A: Allocator>(alloc: &A, first: NonNull<T>, len: usize) {
    for i in 0..len {
        unsafe { alloc.destroy(first.add(i)) };
    }
}

/// Destroys the constructed prefix of a range unless disarmed.
struct PrefixGuard<'a, T, A: Allocator> {
    first: NonNull<T>,
    initialized: usize,
    alloc: &'a A,
}

impl<T, A: Allocator> Drop for PrefixGuard<'_, T, A> {
    fn drop(&mut self) {
        // Safety: exactly `initialized` leading slots were constructed
        unsafe { destroy_range(self.alloc, self.first, self.initialized) };
    }
}

/// Uninitialized storage for `len` values, released on drop unless initialized.
///
/// # Example
///
/// ```
/// use mxp_alloc::{deallocate_array, destroy_range, Global, RawStorage};
///
/// let storage = RawStorage::<u32, _>::allocate(&Global, 4).unwrap();
/// let ptr = storage.init_with(|i| i as u32 * 10);
/// unsafe {
///     assert_eq!(*ptr.add(3).as_ptr(), 30);
///     destroy_range(&Global, ptr, 4);
///     deallocate_array(&Global, ptr, 4);
/// }
/// ```
pub struct RawStorage<'a, T, A: Allocator> {
    ptr: NonNull<T>,
    len: usize,
    alloc: &'a A,
}

impl<'a, T, A: Allocator> RawStorage<'a, T, A> {
    /// Acquire storage for `len` elements from `alloc`.
    pub fn allocate(alloc: &'a A, len: usize) -> AllocResult<Self> {
        let ptr = allocate_array::<T, A>(alloc, len)?;
        Ok(Self { ptr, len, alloc })
    }

    /// Number of element slots.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Check if the storage has no slots.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Construct every slot from `f(index)`, failing on the first `Err`.
    ///
    /// On failure no element is left alive and the storage is released.
    pub fn try_init_with<E, F>(self, mut f: F) -> Result<NonNull<T>, E>
    where
        F: FnMut(usize) -> Result<T, E>,
    {
        let mut guard = PrefixGuard {
            first: self.ptr,
            initialized: 0,
            alloc: self.alloc,
        };

        for i in 0..self.len {
            let value = f(i)?;
            // Safety: slot `i` is in bounds and not yet initialized
            unsafe { self.alloc.construct(self.ptr.add(i), value) };
            guard.initialized += 1;
        }

        mem::forget(guard);
        Ok(self.into_raw())
    }

    /// Construct every slot from `f(index)`.
    ///
    /// If `f` panics, the constructed prefix is destroyed and the storage
    /// released before the panic continues.
    pub fn init_with<F>(self, mut f: F) -> NonNull<T>
    where
        F: FnMut(usize) -> T,
    {
        match self.try_init_with(|i| Ok::<T, std::convert::Infallible>(f(i))) {
            Ok(ptr) => ptr,
            Err(never) => match never {},
        }
    }

    /// Default-construct every slot.
    pub fn init_default(self) -> NonNull<T>
    where
        T: Default,
    {
        self.init_with(|_| T::default())
    }

    /// Clone `value` into every slot.
    pub fn init_fill(self, value: &T) -> NonNull<T>
    where
        T: Clone,
    {
        self.init_with(|_| value.clone())
    }

    /// Clone each element of `src` into the matching slot.
    ///
    /// # Panics
    ///
    /// Panics if `src.len()` differs from the storage length. The storage is
    /// released in that case.
    pub fn init_copy(self, src: &[T]) -> NonNull<T>
    where
        T: Clone,
    {
        assert_eq!(src.len(), self.len, "source length does not match storage");
        self.init_with(|i| src[i].clone())
    }

    fn into_raw(self) -> NonNull<T> {
        let ptr = self.ptr;
        mem::forget(self);
        ptr
    }
}

impl<T, A: Allocator> Drop for RawStorage<'_, T, A> {
    fn drop(&mut self) {
        // Safety: storage came from `allocate_array` and holds no live values
        unsafe { deallocate_array(self.alloc, self.ptr, self.len) };
    }
}

impl<T, A: Allocator> std::fmt::Debug for RawStorage<'_, T, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawStorage")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .finish()
    }
}
