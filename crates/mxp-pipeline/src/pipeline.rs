//! Ordered sequences of fallible unary steps.

use std::fmt;

type Step<T, E> = Box<dyn Fn(&T) -> Result<T, E>>;

/// A left-to-right chain of fallible transformations.
///
/// Each step receives the previous step's result. An empty pipeline returns
/// its input unchanged.
pub struct Pipeline<T, E> {
    steps: Vec<Step<T, E>>,
}

impl<T, E> Pipeline<T, E> {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append a step.
    pub fn push<F>(&mut self, step: F)
    where
        F: Fn(&T) -> Result<T, E> + 'static,
    {
        self.steps.push(Box::new(step));
    }

    /// Append a step, builder style.
    #[must_use]
    pub fn then<F>(mut self, step: F) -> Self
    where
        F: Fn(&T) -> Result<T, E> + 'static,
    {
        self.push(step);
        self
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if the pipeline has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run `input` through every step in order.
    ///
    /// # Errors
    ///
    /// Stops at the first failing step and returns its error.
    pub fn apply(&self, input: T) -> Result<T, E> {
        self.steps.iter().try_fold(input, |value, step| step(&value))
    }
}

impl<T, E> Default for Pipeline<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> fmt::Debug for Pipeline<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("steps", &self.steps.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_empty_is_identity() {
        let p: Pipeline<i32, ()> = Pipeline::new();
        assert!(p.is_empty());
        assert_eq!(p.apply(42), Ok(42));
    }

    #[test]
    fn test_steps_run_left_to_right() {
        let p = Pipeline::<i32, ()>::new()
            .then(|x| Ok(x + 1))
            .then(|x| Ok(x * 10));
        assert_eq!(p.len(), 2);
        assert_eq!(p.apply(1), Ok(20));
    }

    #[test]
    fn test_first_failure_stops() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut p: Pipeline<i32, String> = Pipeline::new();

        let log = Rc::clone(&calls);
        p.push(move |x| {
            log.borrow_mut().push(1);
            Ok(x + 1)
        });
        let log = Rc::clone(&calls);
        p.push(move |x| {
            log.borrow_mut().push(2);
            Err(format!("rejected {x}"))
        });
        let log = Rc::clone(&calls);
        p.push(move |x| {
            log.borrow_mut().push(3);
            Ok(*x)
        });

        assert_eq!(p.apply(0), Err("rejected 1".to_string()));
        assert_eq!(*calls.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_pipeline_is_reusable() {
        let p = Pipeline::<String, ()>::new().then(|s| Ok(format!("{s}!")));
        assert_eq!(p.apply("a".into()), Ok("a!".to_string()));
        assert_eq!(p.apply("b".into()), Ok("b!".to_string()));
    }
}
