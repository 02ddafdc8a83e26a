//! Binding operations to their stored operands.

use crate::dispatch::BinaryOp;
use mxp_numeric::{Matrix, MatrixResult};
use std::fmt;

/// Argument order of a bound operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandOrder {
    /// `f(stored, running)`
    StoredFirst,
    /// `f(running, stored)`
    RunningFirst,
}

impl OperandOrder {
    /// Decide the argument order for operation `name` with a stored operand
    /// whose vector-ness is `stored_is_vector`.
    ///
    /// The stored operand goes first when the name's first three characters
    /// differ from its last three and the name starts with `vec` exactly
    /// when the stored operand is a vector.
    pub fn for_operation(name: &str, stored_is_vector: bool) -> Self {
        let prefix = name.get(..3).unwrap_or(name);
        let suffix = name
            .len()
            .checked_sub(3)
            .and_then(|start| name.get(start..))
            .unwrap_or(name);

        if prefix != suffix && (prefix == "vec") == stored_is_vector {
            Self::StoredFirst
        } else {
            Self::RunningFirst
        }
    }
}

/// An operation together with its stored operand.
pub struct BoundOperation {
    name: String,
    op: BinaryOp,
    operand: Matrix<f64>,
    order: OperandOrder,
}

impl BoundOperation {
    /// Bind `op` to `operand`, deriving the argument order from `name`.
    pub fn new(name: impl Into<String>, op: BinaryOp, operand: Matrix<f64>) -> Self {
        let name = name.into();
        let order = OperandOrder::for_operation(&name, operand.is_vector());
        Self {
            name,
            op,
            operand,
            order,
        }
    }

    /// The operation name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The stored operand.
    pub fn operand(&self) -> &Matrix<f64> {
        &self.operand
    }

    /// The argument order used by [`BoundOperation::apply`].
    pub fn order(&self) -> OperandOrder {
        self.order
    }

    /// Apply the operation to the running value.
    pub fn apply(&self, running: &Matrix<f64>) -> MatrixResult<Matrix<f64>> {
        match self.order {
            OperandOrder::StoredFirst => (self.op)(&self.operand, running),
            OperandOrder::RunningFirst => (self.op)(running, &self.operand),
        }
    }
}

impl fmt::Debug for BoundOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundOperation")
            .field("name", &self.name)
            .field("operand", &self.operand.shape())
            .field("order", &self.order)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::DispatchTable;

    fn bind(name: &str, operand: Matrix<f64>) -> BoundOperation {
        let op = DispatchTable::global().lookup(name).unwrap();
        BoundOperation::new(name, op, operand)
    }

    #[test]
    fn test_order_heuristic() {
        use OperandOrder::*;

        assert_eq!(OperandOrder::for_operation("mat_mul_vec", false), StoredFirst);
        assert_eq!(OperandOrder::for_operation("mat_mul_vec", true), RunningFirst);
        assert_eq!(OperandOrder::for_operation("vec_mul_mat", true), StoredFirst);
        assert_eq!(OperandOrder::for_operation("vec_mul_mat", false), RunningFirst);
        assert_eq!(OperandOrder::for_operation("mat_add_mat", false), RunningFirst);
        assert_eq!(OperandOrder::for_operation("vec_dot_vec", true), RunningFirst);
        assert_eq!(OperandOrder::for_operation("mat_add_vec", false), StoredFirst);
    }

    #[test]
    fn test_order_short_names() {
        assert_eq!(OperandOrder::for_operation("ab", false), OperandOrder::RunningFirst);
        assert_eq!(OperandOrder::for_operation("", true), OperandOrder::RunningFirst);
    }

    #[test]
    fn test_mat_mul_vec_with_stored_matrix() {
        // Stored 2x2 matrix goes on the left of the running column vector.
        let a: Matrix<f64> = Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let step = bind("mat_mul_vec", a);
        assert_eq!(step.order(), OperandOrder::StoredFirst);

        let x: Matrix<f64> = Matrix::from_vec(2, 1, vec![1.0, 1.0]).unwrap();
        assert_eq!(step.apply(&x).unwrap().as_slice(), &[3.0, 7.0]);
    }

    #[test]
    fn test_mat_mul_vec_with_stored_vector() {
        // Stored vector goes on the right of the running matrix.
        let v: Matrix<f64> = Matrix::from_vec(2, 1, vec![1.0, 0.0]).unwrap();
        let step = bind("mat_mul_vec", v);
        assert_eq!(step.order(), OperandOrder::RunningFirst);

        let x: Matrix<f64> = Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(step.apply(&x).unwrap().as_slice(), &[1.0, 3.0]);
    }

    #[test]
    fn test_apply_leaves_operand() {
        let v: Matrix<f64> = Matrix::from_vec(1, 2, vec![1.0, 2.0]).unwrap();
        let step = bind("vec_add_vec", v);
        let x: Matrix<f64> = Matrix::from_vec(1, 2, vec![10.0, 20.0]).unwrap();
        let y = step.apply(&x).unwrap();
        let z = step.apply(&y).unwrap();
        assert_eq!(z.as_slice(), &[12.0, 24.0]);
        assert_eq!(step.operand().as_slice(), &[1.0, 2.0]);
    }
}
