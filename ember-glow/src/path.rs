//! Bounded tree path

use crate::error::{EmberError, EmberResult};

/// Numbers of the open elements from the root down
///
/// The capacity is fixed at construction; growing past it is an error,
/// never a silent truncation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlowPath {
    numbers: Vec<u32>,
    capacity: usize,
}

impl GlowPath {
    /// Create an empty path holding at most `capacity` numbers
    pub fn new(capacity: usize) -> Self {
        Self {
            numbers: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a number
    ///
    /// # Error Handling
    /// Returns `DepthExceeded` if the path is full.
    pub fn push(&mut self, number: u32) -> EmberResult<()> {
        if self.numbers.len() >= self.capacity {
            return Err(EmberError::DepthExceeded { max: self.capacity });
        }
        self.numbers.push(number);
        Ok(())
    }

    /// Remove the last number
    pub fn pop(&mut self) -> Option<u32> {
        self.numbers.pop()
    }

    /// Shorten the path to `len` numbers
    pub fn truncate(&mut self, len: usize) {
        self.numbers.truncate(len);
    }

    /// Replace the whole path
    ///
    /// # Error Handling
    /// Returns `DepthExceeded` and leaves the path unchanged if `numbers`
    /// does not fit.
    pub fn replace(&mut self, numbers: &[u32]) -> EmberResult<()> {
        if numbers.len() > self.capacity {
            return Err(EmberError::DepthExceeded { max: self.capacity });
        }
        self.numbers.clear();
        self.numbers.extend_from_slice(numbers);
        Ok(())
    }

    /// Remove all numbers
    pub fn clear(&mut self) {
        self.numbers.clear();
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    /// Check if the path is empty
    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// View as a slice
    pub fn as_slice(&self) -> &[u32] {
        &self.numbers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_push_pop() {
        let mut path = GlowPath::new(2);
        path.push(1).unwrap();
        path.push(4).unwrap();
        assert_eq!(path.as_slice(), &[1, 4]);
        assert_eq!(path.push(9), Err(EmberError::DepthExceeded { max: 2 }));
        assert_eq!(path.pop(), Some(4));
        path.truncate(0);
        assert!(path.is_empty());
    }

    #[test]
    fn test_path_replace() {
        let mut path = GlowPath::new(3);
        path.push(7).unwrap();
        path.replace(&[1, 2, 3]).unwrap();
        assert_eq!(path.as_slice(), &[1, 2, 3]);
        assert!(path.replace(&[1, 2, 3, 4]).is_err());
        assert_eq!(path.len(), 3);
    }
}
