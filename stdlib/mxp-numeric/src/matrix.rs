//! 2-D matrices
//!
//! Allocator-aware dense matrices with in-place arithmetic.
//!
//! # Overview
//!
//! `Matrix<T, A>` owns a single row-major buffer of `rows * cols` elements
//! obtained from the allocator `A`. Element `(i, j)` lives at index
//! `i * cols + j`. An empty matrix (`len() == 0`) holds no storage at all.
//!
//! # Ownership
//!
//! - Dropping a matrix destroys every element exactly once and returns the
//!   storage to its allocator.
//! - [`Matrix::take`] moves the buffer out in O(1) and leaves the source in
//!   the empty `0x0` state.
//! - [`Matrix::move_assign`] and [`Matrix::try_clone_from`] implement move- and
//!   copy-assignment according to the allocator's propagation policy.
//!
//! Self-assignment cannot be expressed: both forms take `&mut self` together
//! with a second borrow of the source.

use crate::error::{MatrixError, MatrixResult};
use crate::scalar::ScaleBy;
use mxp_alloc::{
    allocate_array, deallocate_array, destroy_range, AllocError, Allocator, Global, RawStorage,
};
use num_traits::Zero;
use std::fmt;
use std::marker::PhantomData;
use std::ops::{AddAssign, Index, IndexMut, Mul, MulAssign};
use std::ptr::NonNull;

// ============================================================
// Core Matrix Type
// ============================================================

/// A 2-D row-major matrix backed by an allocator.
pub struct Matrix<T, A: Allocator = Global> {
    ptr: NonNull<T>,
    rows: usize,
    cols: usize,
    alloc: A,
    _owns: PhantomData<T>,
}

// Safety: Matrix exclusively owns its elements; sharing rules follow T and A.
unsafe impl<T: Send, A: Allocator + Send> Send for Matrix<T, A> {}
unsafe impl<T: Sync, A: Allocator + Sync> Sync for Matrix<T, A> {}

fn checked_len(rows: usize, cols: usize) -> MatrixResult<usize> {
    rows.checked_mul(cols).ok_or_else(|| {
        AllocError::InvalidLayout(format!("{rows}x{cols} matrix overflows usize")).into()
    })
}

impl<T, A: Allocator> Matrix<T, A> {
    /// Create an empty `0x0` matrix that will use `alloc`.
    pub fn empty_in(alloc: A) -> Self {
        Self {
            ptr: NonNull::dangling(),
            rows: 0,
            cols: 0,
            alloc,
            _owns: PhantomData,
        }
    }

    fn build_in<F>(rows: usize, cols: usize, alloc: A, init: F) -> MatrixResult<Self>
    where
        F: FnOnce(RawStorage<'_, T, A>) -> NonNull<T>,
    {
        let len = checked_len(rows, cols)?;
        let ptr = init(RawStorage::allocate(&alloc, len)?);
        Ok(Self {
            ptr,
            rows,
            cols,
            alloc,
            _owns: PhantomData,
        })
    }

    /// Create a matrix whose element `(i, j)` is `f(i, j)`.
    ///
    /// Elements are constructed in row-major order. If `f` panics, the
    /// elements built so far are destroyed and the storage released.
    pub fn from_fn_in<F>(rows: usize, cols: usize, alloc: A, mut f: F) -> MatrixResult<Self>
    where
        F: FnMut(usize, usize) -> T,
    {
        Self::build_in(rows, cols, alloc, |storage| {
            storage.init_with(|idx| f(idx / cols, idx % cols))
        })
    }

    /// Create a matrix from a fallible element function.
    ///
    /// The first `Err` aborts construction; nothing constructed so far
    /// survives and the storage is released.
    pub fn try_from_fn_in<E, F>(rows: usize, cols: usize, alloc: A, mut f: F) -> Result<Self, E>
    where
        F: FnMut(usize, usize) -> Result<T, E>,
        E: From<MatrixError>,
    {
        let len = checked_len(rows, cols)?;
        let storage = RawStorage::allocate(&alloc, len).map_err(MatrixError::from)?;
        let ptr = storage.try_init_with(|idx| f(idx / cols, idx % cols))?;
        Ok(Self {
            ptr,
            rows,
            cols,
            alloc,
            _owns: PhantomData,
        })
    }

    /// Create a matrix of default-constructed elements using `alloc`.
    pub fn new_in(rows: usize, cols: usize, alloc: A) -> MatrixResult<Self>
    where
        T: Default,
    {
        Self::build_in(rows, cols, alloc, |storage| storage.init_default())
    }

    /// Create a matrix filled with clones of `value` using `alloc`.
    pub fn filled_in(rows: usize, cols: usize, value: T, alloc: A) -> MatrixResult<Self>
    where
        T: Clone,
    {
        Self::build_in(rows, cols, alloc, |storage| storage.init_fill(&value))
    }

    /// Create a matrix from row-major data using `alloc`.
    pub fn from_vec_in(rows: usize, cols: usize, data: Vec<T>, alloc: A) -> MatrixResult<Self> {
        let expected = checked_len(rows, cols)?;
        if data.len() != expected {
            return Err(MatrixError::LengthMismatch {
                expected,
                found: data.len(),
            });
        }
        let mut values = data.into_iter();
        Self::try_from_fn_in(rows, cols, alloc, |_, _| {
            values.next().ok_or(MatrixError::LengthMismatch {
                expected,
                found: 0,
            })
        })
    }

    /// Get the number of rows
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Get the number of columns
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Get the shape as (rows, cols)
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Get the total number of elements
    #[inline]
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    /// Check if the matrix holds no elements
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if the matrix is a row or column vector
    #[inline]
    pub fn is_vector(&self) -> bool {
        self.rows == 1 || self.cols == 1
    }

    /// The allocator this matrix draws storage from.
    #[inline]
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Get a raw pointer to the data, null when the matrix is empty.
    pub fn as_ptr(&self) -> *const T {
        if self.is_empty() {
            std::ptr::null()
        } else {
            self.ptr.as_ptr()
        }
    }

    /// Get a slice view of the data (row-major)
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // Safety: ptr holds len initialized elements (or is dangling with len 0)
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len()) }
    }

    /// Get a mutable slice view of the data
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // Safety: as above, and `&mut self` guarantees exclusive access
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len()) }
    }

    /// Iterate over all elements in row-major order
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// Get a row as a slice
    pub fn row(&self, row: usize) -> Option<&[T]> {
        if row < self.rows {
            let start = row * self.cols;
            Some(&self.as_slice()[start..start + self.cols])
        } else {
            None
        }
    }

    /// Iterate over the rows as slices
    pub fn row_slices(&self) -> impl Iterator<Item = &[T]> + '_ {
        (0..self.rows).map(move |r| {
            let start = r * self.cols;
            &self.as_slice()[start..start + self.cols]
        })
    }

    /// Get an element by (row, col)
    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        if row < self.rows && col < self.cols {
            // Safety: bounds checked above
            Some(unsafe { self.get_unchecked(row, col) })
        } else {
            None
        }
    }

    /// Get a mutable element by (row, col)
    pub fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut T> {
        if row < self.rows && col < self.cols {
            // Safety: bounds checked above
            Some(unsafe { self.get_unchecked_mut(row, col) })
        } else {
            None
        }
    }

    /// Get an element without bounds checking.
    ///
    /// # Safety
    ///
    /// `row < self.rows()` and `col < self.cols()` must hold.
    #[inline]
    pub unsafe fn get_unchecked(&self, row: usize, col: usize) -> &T {
        debug_assert!(row < self.rows && col < self.cols);
        unsafe { &*self.ptr.as_ptr().add(row * self.cols + col) }
    }

    /// Get a mutable element without bounds checking.
    ///
    /// # Safety
    ///
    /// `row < self.rows()` and `col < self.cols()` must hold.
    #[inline]
    pub unsafe fn get_unchecked_mut(&mut self, row: usize, col: usize) -> &mut T {
        debug_assert!(row < self.rows && col < self.cols);
        unsafe { &mut *self.ptr.as_ptr().add(row * self.cols + col) }
    }

    // ------------------------------------------------------------
    // Ownership transfer
    // ------------------------------------------------------------

    /// Destroy all elements and release the storage, leaving a `0x0` matrix.
    pub fn clear(&mut self) {
        let (ptr, len) = (self.ptr, self.len());
        self.reset();
        // Safety: `ptr` held `len` live elements allocated from `self.alloc`
        unsafe {
            destroy_range(&self.alloc, ptr, len);
            deallocate_array(&self.alloc, ptr, len);
        }
    }

    fn reset(&mut self) {
        self.ptr = NonNull::dangling();
        self.rows = 0;
        self.cols = 0;
    }

    /// Move the buffer out, leaving `self` empty with the same allocator.
    pub fn take(&mut self) -> Self {
        let taken = Self {
            ptr: self.ptr,
            rows: self.rows,
            cols: self.cols,
            alloc: self.alloc.clone(),
            _owns: PhantomData,
        };
        self.reset();
        taken
    }

    /// Move-assign from `source`, leaving it empty.
    ///
    /// The current elements are destroyed. If the allocator propagates on
    /// move, or both matrices draw from the same resource, the source buffer
    /// is adopted as is. Otherwise the elements are relocated into fresh
    /// storage from `self`'s allocator, which can fail; on failure neither
    /// matrix is modified.
    pub fn move_assign(&mut self, source: &mut Self) -> MatrixResult<()> {
        if A::PROPAGATE_ON_MOVE_ASSIGNMENT || self.alloc.same_resource(&source.alloc) {
            self.clear();
            if A::PROPAGATE_ON_MOVE_ASSIGNMENT {
                self.alloc = source.alloc.clone();
            }
            self.ptr = source.ptr;
            self.rows = source.rows;
            self.cols = source.cols;
            source.reset();
            return Ok(());
        }

        let len = source.len();
        let ptr = allocate_array::<T, A>(&self.alloc, len)?;
        // Safety: both buffers hold `len` slots and do not overlap; the
        // source slots are treated as moved-from and only their storage is
        // released afterwards.
        unsafe {
            std::ptr::copy_nonoverlapping(source.ptr.as_ptr(), ptr.as_ptr(), len);
            deallocate_array(&source.alloc, source.ptr, len);
        }
        let (rows, cols) = source.shape();
        source.reset();

        self.clear();
        self.ptr = ptr;
        self.rows = rows;
        self.cols = cols;
        Ok(())
    }

    /// Deep copy using the allocator chosen by `select_on_copy`.
    pub fn try_clone(&self) -> MatrixResult<Self>
    where
        T: Clone,
    {
        let src = self.as_slice();
        Self::build_in(self.rows, self.cols, self.alloc.select_on_copy(), |storage| {
            storage.init_copy(src)
        })
    }

    /// Copy-assign from `source`.
    ///
    /// With a copy-propagating allocator the new storage comes from the
    /// source's allocator, which `self` then adopts; otherwise `self` keeps
    /// its own allocator. On failure `self` is unchanged.
    pub fn try_clone_from(&mut self, source: &Self) -> MatrixResult<()>
    where
        T: Clone,
    {
        let alloc = if A::PROPAGATE_ON_COPY_ASSIGNMENT {
            source.alloc.clone()
        } else {
            self.alloc.clone()
        };
        let len = checked_len(source.rows, source.cols)?;
        let ptr = RawStorage::allocate(&alloc, len)?.init_copy(source.as_slice());

        self.clear();
        self.alloc = alloc;
        self.ptr = ptr;
        self.rows = source.rows;
        self.cols = source.cols;
        Ok(())
    }
}

impl<T, A: Allocator + Default> Matrix<T, A> {
    /// Create an empty `0x0` matrix
    pub fn empty() -> Self {
        Self::empty_in(A::default())
    }

    /// Create a matrix of default-constructed elements
    pub fn new(rows: usize, cols: usize) -> MatrixResult<Self>
    where
        T: Default,
    {
        Self::new_in(rows, cols, A::default())
    }

    /// Create a matrix filled with a value
    pub fn filled(rows: usize, cols: usize, value: T) -> MatrixResult<Self>
    where
        T: Clone,
    {
        Self::filled_in(rows, cols, value, A::default())
    }

    /// Create a matrix whose element `(i, j)` is `f(i, j)`
    pub fn from_fn<F>(rows: usize, cols: usize, f: F) -> MatrixResult<Self>
    where
        F: FnMut(usize, usize) -> T,
    {
        Self::from_fn_in(rows, cols, A::default(), f)
    }

    /// Create a matrix from row-major data
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> MatrixResult<Self> {
        Self::from_vec_in(rows, cols, data, A::default())
    }
}

// ============================================================
// Numeric Operations
// ============================================================

impl<T, A> Matrix<T, A>
where
    T: Copy + AddAssign,
    A: Allocator,
{
    /// Element-wise addition in place.
    ///
    /// Fails with [`MatrixError::SizeMismatch`] unless both shapes are equal.
    pub fn try_add_assign<B: Allocator>(&mut self, rhs: &Matrix<T, B>) -> MatrixResult<&mut Self> {
        if self.shape() != rhs.shape() {
            return Err(MatrixError::size_mismatch("add", self.shape(), rhs.shape()));
        }
        for (a, &b) in self.as_mut_slice().iter_mut().zip(rhs.as_slice()) {
            *a += b;
        }
        Ok(self)
    }
}

impl<T: Copy, A: Allocator> Matrix<T, A> {
    /// Multiply every element by `factor`.
    ///
    /// `factor` may be any primitive numeric type. Each product is computed
    /// in the common type of `T` and `S` and narrowed back to `T`, see
    /// [`ScaleBy`].
    pub fn scale_assign<S: Copy>(&mut self, factor: S) -> &mut Self
    where
        T: ScaleBy<S>,
    {
        for x in self.as_mut_slice() {
            *x = x.scale_by(factor);
        }
        self
    }
}

impl<T, A> Matrix<T, A>
where
    T: Copy + Zero + Mul<Output = T>,
    A: Allocator,
{
    /// Matrix product in place: `self = self * rhs`.
    ///
    /// Naive triple loop accumulating from `T::zero()`. The product is built
    /// in a separate matrix from the same allocator and then move-assigned
    /// into `self`, so a failure leaves `self` untouched.
    pub fn try_mul_assign<B: Allocator>(&mut self, rhs: &Matrix<T, B>) -> MatrixResult<&mut Self> {
        if self.cols != rhs.rows {
            return Err(MatrixError::size_mismatch("mul", self.shape(), rhs.shape()));
        }

        let (inner, out_cols) = (self.cols, rhs.cols);
        let lhs = self.as_slice();
        let other = rhs.as_slice();
        let mut product = Self::from_fn_in(self.rows, out_cols, self.alloc.clone(), |i, j| {
            (0..inner).fold(T::zero(), |acc, r| {
                acc + lhs[i * inner + r] * other[r * out_cols + j]
            })
        })?;

        self.move_assign(&mut product)?;
        Ok(self)
    }

    /// Dot product of two vectors of equal shape.
    ///
    /// Shapes are checked first ([`MatrixError::SizeMismatch`]), then
    /// vector-ness ([`MatrixError::NotAVector`]).
    pub fn dot<B: Allocator>(&self, rhs: &Matrix<T, B>) -> MatrixResult<T> {
        if self.shape() != rhs.shape() {
            return Err(MatrixError::size_mismatch("dot", self.shape(), rhs.shape()));
        }
        if !self.is_vector() {
            return Err(MatrixError::NotAVector {
                shape: self.shape().into(),
            });
        }
        Ok(self
            .iter()
            .zip(rhs.iter())
            .fold(T::zero(), |acc, (&a, &b)| acc + a * b))
    }
}

// ============================================================
// Trait Implementations
// ============================================================

impl<T, A: Allocator> Drop for Matrix<T, A> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T, A: Allocator + Default> Default for Matrix<T, A> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Clone, A: Allocator> Clone for Matrix<T, A> {
    /// # Panics
    ///
    /// Panics if storage cannot be allocated. Use [`Matrix::try_clone`] to
    /// handle that case.
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(m) => m,
            Err(e) => panic!("failed to clone matrix: {e}"),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        if let Err(e) = self.try_clone_from(source) {
            panic!("failed to clone matrix: {e}");
        }
    }
}

impl<T, A, S> MulAssign<S> for Matrix<T, A>
where
    T: ScaleBy<S>,
    A: Allocator,
    S: Copy,
{
    fn mul_assign(&mut self, factor: S) {
        self.scale_assign(factor);
    }
}

impl<T, A: Allocator> Index<(usize, usize)> for Matrix<T, A> {
    type Output = T;

    fn index(&self, (row, col): (usize, usize)) -> &Self::Output {
        match self.get(row, col) {
            Some(x) => x,
            None => panic!(
                "index ({row}, {col}) out of bounds for {}x{} matrix",
                self.rows, self.cols
            ),
        }
    }
}

impl<T, A: Allocator> IndexMut<(usize, usize)> for Matrix<T, A> {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut Self::Output {
        let (rows, cols) = self.shape();
        match self.get_mut(row, col) {
            Some(x) => x,
            None => panic!("index ({row}, {col}) out of bounds for {rows}x{cols} matrix"),
        }
    }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for Matrix<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Matrix({}x{}, {:?})", self.rows, self.cols, self.as_slice())
    }
}

impl<T: PartialEq, A: Allocator, B: Allocator> PartialEq<Matrix<T, B>> for Matrix<T, A> {
    fn eq(&self, other: &Matrix<T, B>) -> bool {
        self.shape() == other.shape() && self.as_slice() == other.as_slice()
    }
}

impl<T: Eq, A: Allocator> Eq for Matrix<T, A> {}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use mxp_alloc::{ArenaAllocator, TrackingAllocator};

    fn m2x2(data: [f64; 4]) -> Matrix<f64> {
        Matrix::from_vec(2, 2, data.to_vec()).unwrap()
    }

    #[test]
    fn test_matrix_creation() {
        let m: Matrix<f64> = Matrix::new(2, 3).unwrap();
        assert_eq!(m.rows(), 2);
        assert_eq!(m.cols(), 3);
        assert_eq!(m.len(), 6);
        assert!(m.iter().all(|&x| x == 0.0));
        assert!(!m.as_ptr().is_null());
    }

    #[test]
    fn test_matrix_from_vec_invalid() {
        let err = Matrix::<f64>::from_vec(2, 2, vec![1.0, 2.0, 3.0]).unwrap_err();
        assert_eq!(
            err,
            MatrixError::LengthMismatch {
                expected: 4,
                found: 3
            }
        );
    }

    #[test]
    fn test_matrix_size_overflow() {
        let err = Matrix::<u8>::new(usize::MAX, 2).unwrap_err();
        assert!(matches!(err, MatrixError::Alloc(AllocError::InvalidLayout(_))));
    }

    #[test]
    fn test_empty_has_no_buffer() {
        let m: Matrix<f64> = Matrix::empty();
        assert_eq!(m.shape(), (0, 0));
        assert!(m.is_empty());
        assert!(m.as_ptr().is_null());

        let zero_rows: Matrix<f64> = Matrix::new(0, 4).unwrap();
        assert_eq!(zero_rows.len(), 0);
        assert!(zero_rows.as_ptr().is_null());
    }

    #[test]
    fn test_row_major_layout() {
        let m: Matrix<usize> = Matrix::from_fn(2, 3, |i, j| i * 10 + j).unwrap();
        assert_eq!(m.as_slice(), &[0, 1, 2, 10, 11, 12]);
        assert_eq!(m.row(1), Some([10, 11, 12].as_slice()));
        assert_eq!(m.row(2), None);
        assert_eq!(unsafe { *m.get_unchecked(1, 2) }, 12);
    }

    #[test]
    fn test_get_checks_both_bounds() {
        let m: Matrix<i32> = Matrix::filled(2, 3, 7).unwrap();
        assert_eq!(m.get(1, 2), Some(&7));
        assert_eq!(m.get(0, 3), None);
        assert_eq!(m.get(2, 0), None);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_index_out_of_bounds_panics() {
        let m: Matrix<i32> = Matrix::filled(2, 3, 7).unwrap();
        let _ = m[(0, 3)];
    }

    #[test]
    fn test_is_vector() {
        assert!(Matrix::<f64>::new(1, 5).unwrap().is_vector());
        assert!(Matrix::<f64>::new(5, 1).unwrap().is_vector());
        assert!(!Matrix::<f64>::new(2, 2).unwrap().is_vector());
        assert!(!Matrix::<f64>::empty().is_vector());
    }

    #[test]
    fn test_add_assign() {
        let mut a = m2x2([1.0, 2.0, 3.0, 4.0]);
        let b = m2x2([5.0, 6.0, 7.0, 8.0]);
        a.try_add_assign(&b).unwrap();
        assert_eq!(a.as_slice(), &[6.0, 8.0, 10.0, 12.0]);
    }

    #[test]
    fn test_add_assign_mismatch_leaves_lhs() {
        let mut a = m2x2([1.0, 2.0, 3.0, 4.0]);
        let b: Matrix<f64> = Matrix::filled(2, 3, 1.0).unwrap();
        let err = a.try_add_assign(&b).unwrap_err();
        assert!(matches!(err, MatrixError::SizeMismatch { op: "add", .. }));
        assert_eq!(a, m2x2([1.0, 2.0, 3.0, 4.0]));
    }

    #[test]
    fn test_scale_assign_any_arithmetic_type() {
        let mut m = m2x2([1.0, 2.0, 3.0, 4.0]);
        m.scale_assign(2_i32);
        assert_eq!(m.as_slice(), &[2.0, 4.0, 6.0, 8.0]);
        m *= 0.5_f32;
        assert_eq!(m.as_slice(), &[1.0, 2.0, 3.0, 4.0]);

        let mut ints: Matrix<i64> = Matrix::filled(1, 3, 3).unwrap();
        ints *= 4_u8;
        assert_eq!(ints.as_slice(), &[12, 12, 12]);
    }

    #[test]
    fn test_scale_integer_matrix_by_fraction() {
        let mut m: Matrix<i64> = Matrix::from_vec(1, 3, vec![3, 4, 10]).unwrap();
        m *= 0.5_f64;
        assert_eq!(m.as_slice(), &[1, 2, 5]);

        m.scale_assign(2.5_f32);
        assert_eq!(m.as_slice(), &[2, 5, 12]);
    }

    #[test]
    fn test_mul_assign() {
        // [1 2]   [5 6]   [19 22]
        // [3 4] x [7 8] = [43 50]
        let mut a = m2x2([1.0, 2.0, 3.0, 4.0]);
        let b = m2x2([5.0, 6.0, 7.0, 8.0]);
        a.try_mul_assign(&b).unwrap();
        assert_eq!(a.as_slice(), &[19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn test_mul_assign_changes_shape() {
        let mut a: Matrix<f64> = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let b: Matrix<f64> = Matrix::from_vec(3, 1, vec![1.0, 0.0, -1.0]).unwrap();
        a.try_mul_assign(&b).unwrap();
        assert_eq!(a.shape(), (2, 1));
        assert_eq!(a.as_slice(), &[-2.0, -2.0]);
    }

    #[test]
    fn test_mul_assign_mismatch_leaves_lhs() {
        let mut a = m2x2([1.0, 2.0, 3.0, 4.0]);
        let b: Matrix<f64> = Matrix::filled(3, 3, 1.0).unwrap();
        let err = a.try_mul_assign(&b).unwrap_err();
        assert!(matches!(err, MatrixError::SizeMismatch { op: "mul", .. }));
        assert_eq!(a, m2x2([1.0, 2.0, 3.0, 4.0]));
    }

    #[test]
    fn test_mul_assign_allocation_failure_leaves_lhs() {
        // Room for the operand and the left matrix, but not for the product.
        let alloc = TrackingAllocator::with_limit(3 * 8 + 3 * 8);
        let mut a = Matrix::from_vec_in(3, 1, vec![1.0, 2.0, 3.0], alloc.clone()).unwrap();
        let b = Matrix::from_vec_in(1, 3, vec![1.0, 1.0, 1.0], alloc.clone()).unwrap();

        let err = a.try_mul_assign(&b).unwrap_err();
        assert!(matches!(err, MatrixError::Alloc(AllocError::OutOfMemory { .. })));
        assert_eq!(a.as_slice(), &[1.0, 2.0, 3.0]);
        assert_eq!(alloc.stats().failed_allocations, 1);
    }

    #[test]
    fn test_dot() {
        let a: Matrix<f64> = Matrix::from_vec(1, 3, vec![1.0, 2.0, 3.0]).unwrap();
        let b: Matrix<f64> = Matrix::from_vec(1, 3, vec![4.0, 5.0, 6.0]).unwrap();
        assert_eq!(a.dot(&b).unwrap(), 32.0);
    }

    #[test]
    fn test_dot_errors() {
        let row: Matrix<f64> = Matrix::filled(1, 3, 1.0).unwrap();
        let col: Matrix<f64> = Matrix::filled(3, 1, 1.0).unwrap();
        assert!(matches!(
            row.dot(&col).unwrap_err(),
            MatrixError::SizeMismatch { op: "dot", .. }
        ));

        let square: Matrix<f64> = Matrix::filled(2, 2, 1.0).unwrap();
        assert_eq!(
            square.dot(&square).unwrap_err(),
            MatrixError::NotAVector {
                shape: (2, 2).into()
            }
        );
    }

    #[test]
    fn test_take_leaves_source_empty() {
        let mut m = m2x2([1.0, 2.0, 3.0, 4.0]);
        let taken = m.take();
        assert_eq!(m.shape(), (0, 0));
        assert!(m.as_ptr().is_null());
        assert_eq!(taken, m2x2([1.0, 2.0, 3.0, 4.0]));
    }

    #[test]
    fn test_drop_destroys_each_element_once() {
        let alloc = TrackingAllocator::new();
        {
            let m = Matrix::filled_in(3, 4, String::from("x"), alloc.clone()).unwrap();
            assert_eq!(alloc.stats().live_elements(), 12);
            let _copy = m.clone();
            assert_eq!(alloc.stats().live_elements(), 24);
        }
        let stats = alloc.stats();
        assert_eq!(stats.constructed, 24);
        assert_eq!(stats.destroyed, 24);
        assert_eq!(stats.bytes_allocated, 0);
    }

    #[test]
    fn test_clone_is_deep() {
        let a = m2x2([1.0, 2.0, 3.0, 4.0]);
        let mut b = a.clone();
        b[(0, 0)] = 100.0;
        assert_eq!(a[(0, 0)], 1.0);
        assert_ne!(a.as_ptr(), b.as_ptr());
    }

    #[test]
    fn test_clone_from_propagating_allocator() {
        let source_alloc = TrackingAllocator::new();
        let target_alloc = TrackingAllocator::new();
        let source = Matrix::filled_in(2, 2, 1.0, source_alloc.clone()).unwrap();
        let mut target = Matrix::filled_in(3, 3, 0.0, target_alloc.clone()).unwrap();

        target.clone_from(&source);

        assert_eq!(target, source);
        assert!(target.allocator().same_resource(&source_alloc));
        assert_eq!(target_alloc.stats().bytes_allocated, 0);
        assert_eq!(source_alloc.stats().bytes_allocated, 2 * 4 * 8);
    }

    #[test]
    fn test_clone_from_non_propagating_allocator() {
        let source_arena = ArenaAllocator::new(1024).unwrap();
        let target_arena = ArenaAllocator::new(1024).unwrap();
        let source = Matrix::filled_in(2, 2, 1.0, source_arena.clone()).unwrap();
        let mut target = Matrix::<f64, _>::empty_in(target_arena.clone());

        target.try_clone_from(&source).unwrap();

        assert_eq!(target, source);
        assert!(target.allocator().same_resource(&target_arena));
        assert_eq!(target_arena.used(), 32);
    }

    #[test]
    fn test_move_assign_steals_with_propagation() {
        let alloc = TrackingAllocator::new();
        let mut source = Matrix::filled_in(2, 2, 5_i32, alloc.clone()).unwrap();
        let mut target = Matrix::filled_in(1, 1, 0_i32, TrackingAllocator::new()).unwrap();
        let buffer = source.as_ptr();

        target.move_assign(&mut source).unwrap();

        assert_eq!(target.as_ptr(), buffer);
        assert_eq!(target.shape(), (2, 2));
        assert!(target.allocator().same_resource(&alloc));
        assert_eq!(source.shape(), (0, 0));
        assert!(source.as_ptr().is_null());
    }

    #[test]
    fn test_move_assign_relocates_across_arenas() {
        let a = ArenaAllocator::new(1024).unwrap();
        let b = ArenaAllocator::new(1024).unwrap();
        let mut source = Matrix::from_vec_in(1, 3, vec![1, 2, 3], a.clone()).unwrap();
        let mut target = Matrix::<i32, _>::empty_in(b.clone());

        target.move_assign(&mut source).unwrap();

        assert_eq!(target.as_slice(), &[1, 2, 3]);
        assert!(target.allocator().same_resource(&b));
        assert_eq!(b.stats().allocation_count, 1);
        assert_eq!(a.stats().deallocation_count, 1);
        assert!(source.is_empty());
    }

    #[test]
    fn test_move_assign_relocation_keeps_owned_values() {
        let a = ArenaAllocator::new(1024).unwrap();
        let b = ArenaAllocator::new(1024).unwrap();
        let mut source =
            Matrix::from_fn_in(2, 1, a, |i, _| format!("row{i}")).unwrap();
        let mut target = Matrix::<String, _>::empty_in(b);

        target.move_assign(&mut source).unwrap();
        drop(source);

        assert_eq!(target.as_slice(), &["row0".to_string(), "row1".to_string()]);
    }

    #[test]
    fn test_try_from_fn_in_propagates_error() {
        let alloc = TrackingAllocator::new();
        let result: Result<Matrix<f64, _>, MatrixError> =
            Matrix::try_from_fn_in(2, 2, alloc.clone(), |i, j| {
                if (i, j) == (1, 0) {
                    Err(MatrixError::LengthMismatch {
                        expected: 4,
                        found: 2,
                    })
                } else {
                    Ok(1.0)
                }
            });

        assert!(result.is_err());
        assert_eq!(alloc.stats().live_elements(), 0);
        assert_eq!(alloc.stats().bytes_allocated, 0);
    }

    #[test]
    fn test_matrix_equality_across_allocators() {
        let a: Matrix<f64> = Matrix::filled(2, 2, 1.0).unwrap();
        let b = Matrix::filled_in(2, 2, 1.0, TrackingAllocator::new()).unwrap();
        let c: Matrix<f64> = Matrix::filled(4, 1, 1.0).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_debug_format() {
        let m = m2x2([1.0, 2.0, 3.0, 4.0]);
        assert_eq!(format!("{m:?}"), "Matrix(2x2, [1.0, 2.0, 3.0, 4.0])");
    }
}
