//! Operation dispatch.
//!
//! Operation names map to binary matrix functions through a fixed-capacity
//! [`FlatMap`]. The process-wide table is built once on first use and never
//! modified afterwards.

use crate::error::{PipelineError, PipelineResult};
use crate::ops::{matrix_add, matrix_mul, vec_dot_vec};
use mxp_numeric::{Global, Matrix, MatrixResult};
use std::borrow::Borrow;
use std::fmt;
use std::sync::OnceLock;

/// A fixed-capacity map searched by linear scan.
///
/// Entries are supplied once at construction; the map has no insertion API.
/// Lookup compares keys with `==` in insertion order, so the first matching
/// entry wins.
pub struct FlatMap<K, V, const N: usize> {
    entries: [Option<(K, V)>; N],
    len: usize,
}

impl<K, V, const N: usize> FlatMap<K, V, N> {
    /// Build a map from up to `N` entries.
    ///
    /// Supplying more than `N` entries is rejected at compile time.
    pub fn from_entries<const M: usize>(entries: [(K, V); M]) -> Self {
        const { assert!(M <= N, "too many entries for FlatMap capacity") };

        let mut slots: [Option<(K, V)>; N] = std::array::from_fn(|_| None);
        for (slot, entry) in slots.iter_mut().zip(entries) {
            *slot = Some(entry);
        }
        Self { entries: slots, len: M }
    }

    /// Look up the value stored under `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        self.iter()
            .find_map(|(k, v)| (<K as Borrow<Q>>::borrow(k) == key).then_some(v))
    }

    /// Check whether `key` is present.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Iterate over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.entries[..self.len]
            .iter()
            .filter_map(|slot| slot.as_ref().map(|(k, v)| (k, v)))
    }

    /// Iterate over keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check whether the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Maximum number of entries.
    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<K: fmt::Debug, V: fmt::Debug, const N: usize> fmt::Debug for FlatMap<K, V, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Signature shared by all dispatchable operations.
pub type BinaryOp = fn(&Matrix<f64>, &Matrix<f64>) -> MatrixResult<Matrix<f64>>;

/// Number of built-in operations.
pub const OPERATION_COUNT: usize = 7;

/// Name-to-operation table.
#[derive(Debug)]
pub struct DispatchTable {
    ops: FlatMap<&'static str, BinaryOp, OPERATION_COUNT>,
}

static DISPATCH_TABLE: OnceLock<DispatchTable> = OnceLock::new();

impl DispatchTable {
    /// The process-wide table, built on first access.
    pub fn global() -> &'static Self {
        DISPATCH_TABLE.get_or_init(Self::builtin)
    }

    fn builtin() -> Self {
        Self {
            ops: FlatMap::from_entries([
                ("mat_mul_vec", matrix_mul::<f64, Global> as BinaryOp),
                ("mat_mul_mat", matrix_mul::<f64, Global> as BinaryOp),
                ("vec_mul_mat", matrix_mul::<f64, Global> as BinaryOp),
                ("vec_add_vec", matrix_add::<f64, Global> as BinaryOp),
                ("mat_add_vec", matrix_add::<f64, Global> as BinaryOp),
                ("mat_add_mat", matrix_add::<f64, Global> as BinaryOp),
                ("vec_dot_vec", vec_dot_vec::<f64, Global> as BinaryOp),
            ]),
        }
    }

    /// Resolve an operation by name.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::OperationNotFound`] for unknown names.
    pub fn lookup(&self, name: &str) -> PipelineResult<BinaryOp> {
        self.ops
            .get(name)
            .copied()
            .ok_or_else(|| PipelineError::OperationNotFound {
                name: name.to_owned(),
            })
    }

    /// Names of all registered operations.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.ops.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_map_lookup() {
        let map: FlatMap<&str, i32, 4> = FlatMap::from_entries([("a", 1), ("b", 2)]);
        assert_eq!(map.get("a"), Some(&1));
        assert_eq!(map.get("b"), Some(&2));
        assert_eq!(map.get("c"), None);
        assert_eq!(map.len(), 2);
        assert_eq!(map.capacity(), 4);
    }

    #[test]
    fn test_flat_map_first_match_wins() {
        let map: FlatMap<&str, i32, 2> = FlatMap::from_entries([("k", 1), ("k", 2)]);
        assert_eq!(map.get("k"), Some(&1));
    }

    #[test]
    fn test_flat_map_empty() {
        let map: FlatMap<u8, u8, 3> = FlatMap::from_entries([]);
        assert!(map.is_empty());
        assert_eq!(map.iter().count(), 0);
    }

    #[test]
    fn test_global_table_has_all_operations() {
        let table = DispatchTable::global();
        let names: Vec<_> = table.names().collect();
        assert_eq!(
            names,
            [
                "mat_mul_vec",
                "mat_mul_mat",
                "vec_mul_mat",
                "vec_add_vec",
                "mat_add_vec",
                "mat_add_mat",
                "vec_dot_vec",
            ]
        );
        assert!(std::ptr::eq(table, DispatchTable::global()));
    }

    #[test]
    fn test_lookup_dispatches() {
        let a: Matrix<f64> = Matrix::from_vec(1, 2, vec![1.0, 2.0]).unwrap();
        let b: Matrix<f64> = Matrix::from_vec(1, 2, vec![3.0, 4.0]).unwrap();

        let add = DispatchTable::global().lookup("vec_add_vec").unwrap();
        assert_eq!(add(&a, &b).unwrap().as_slice(), &[4.0, 6.0]);

        let dot = DispatchTable::global().lookup("vec_dot_vec").unwrap();
        assert_eq!(dot(&a, &b).unwrap().as_slice(), &[11.0]);
    }

    #[test]
    fn test_lookup_unknown() {
        let err = DispatchTable::global().lookup("mat_sub_mat").unwrap_err();
        assert!(matches!(err, PipelineError::OperationNotFound { name } if name == "mat_sub_mat"));
    }
}
