//! Combined errors for operations that keep going after a partial failure.

use std::fmt;

/// Every error collected while processing a batch.
///
/// Batch operations (pipelined writes, fan-out reads, event batches) record
/// each failure and carry on; the caller receives all of them at once.
#[derive(Debug)]
pub struct ErrorList<E>(Vec<E>);

impl<E> ErrorList<E> {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, err: E) {
        self.0.push(err);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn into_vec(self) -> Vec<E> {
        self.0
    }

    /// `Ok(())` if nothing was collected, otherwise the list wrapped by `wrap`.
    pub fn into_result<W>(self, wrap: impl FnOnce(Self) -> W) -> Result<(), W> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(wrap(self))
        }
    }
}

impl<E> Default for ErrorList<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> From<Vec<E>> for ErrorList<E> {
    fn from(errors: Vec<E>) -> Self {
        Self(errors)
    }
}

impl<E: fmt::Display> fmt::Display for ErrorList<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.len() {
            1 => write!(f, "1 error occurred: {}", self.0[0]),
            n => {
                write!(f, "{n} errors occurred:")?;
                for err in &self.0 {
                    write!(f, "\n\t* {err}")?;
                }
                Ok(())
            }
        }
    }
}

impl<E: std::error::Error> std::error::Error for ErrorList<E> {}
