//! Mixed-type scalar multiplication.
//!
//! [`ScaleBy`] multiplies an element by a factor of another primitive type.
//! Both operands are first widened to a common type, multiplied there, and
//! the product is narrowed back with `as` semantics:
//!
//! | element | factor | computed in |
//! |---------|--------|-------------|
//! | integer | integer | `i128` (wrapping) |
//! | integer | `f32` / `f64` | the factor's float type |
//! | `f32` | integer, `f32` | `f32` |
//! | `f32` | `f64` | `f64` |
//! | `f64` | any | `f64` |
//!
//! So `3_i64` scaled by `0.5` is `1`, not `0`.

use std::ops::Mul;

/// Multiply `self` by a factor of type `S` in their common type.
pub trait ScaleBy<S>: Copy {
    /// Return `self * factor`, narrowed back to `Self`.
    fn scale_by(self, factor: S) -> Self;
}

macro_rules! impl_scale_by {
    (@row $t:ty, $common:ty, $op:ident, [$($s:ty),*]) => {
        $(
            impl ScaleBy<$s> for $t {
                #[inline]
                fn scale_by(self, factor: $s) -> $t {
                    (self as $common).$op(factor as $common) as $t
                }
            }
        )*
    };
    ($common:ty, $op:ident; [$($t:ty),*] x $factors:tt) => {
        $( impl_scale_by!(@row $t, $common, $op, $factors); )*
    };
}

impl_scale_by!(i128, wrapping_mul;
    [i8, i16, i32, i64, isize, u8, u16, u32, u64, usize]
    x [i8, i16, i32, i64, isize, u8, u16, u32, u64, usize]);
impl_scale_by!(f32, mul; [i8, i16, i32, i64, isize, u8, u16, u32, u64, usize] x [f32]);
impl_scale_by!(f64, mul; [i8, i16, i32, i64, isize, u8, u16, u32, u64, usize] x [f64]);
impl_scale_by!(f32, mul;
    [f32] x [i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32]);
impl_scale_by!(f64, mul; [f32] x [f64]);
impl_scale_by!(f64, mul;
    [f64] x [i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64]);
