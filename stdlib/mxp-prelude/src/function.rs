//! Function combinators
//!
//! Composition is expressed as a plain value holding both callables, so a
//! composed function can be stored, cloned (when both parts are `Clone`) and
//! passed around like any other closure.

/// Identity function
///
/// Returns its argument unchanged.
#[inline]
pub fn id<A>(x: A) -> A {
    x
}

/// Two unary callables applied right to left.
///
/// `Composed { outer: f, inner: g }` computes `f(g(x))`.
#[derive(Debug, Clone, Copy)]
pub struct Composed<F, G> {
    outer: F,
    inner: G,
}

impl<F, G> Composed<F, G> {
    /// Compose `outer` after `inner`.
    pub const fn new(outer: F, inner: G) -> Self {
        Self { outer, inner }
    }

    /// Apply `inner`, then `outer`.
    #[inline]
    pub fn call<A, B, C>(&self, x: A) -> C
    where
        G: Fn(A) -> B,
        F: Fn(B) -> C,
    {
        (self.outer)((self.inner)(x))
    }

    /// Turn the composition into a closure.
    pub fn into_fn<A, B, C>(self) -> impl Fn(A) -> C
    where
        G: Fn(A) -> B,
        F: Fn(B) -> C,
    {
        move |x| self.call(x)
    }

    /// Split the composition back into `(outer, inner)`.
    pub fn into_parts(self) -> (F, G) {
        (self.outer, self.inner)
    }
}

/// Function composition
///
/// `compose(f, g)` returns a function that applies `g` first, then `f`.
#[inline]
pub const fn compose<F, G>(f: F, g: G) -> Composed<F, G> {
    Composed::new(f, g)
}
