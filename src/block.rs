use std::fmt;

/// A range of the simulated address space, `[base, base + length)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Block {
  pub base: usize,
  pub length: usize,
}

impl Block {
  pub fn new(
    base: usize,
    length: usize,
  ) -> Self {
    Self { base, length }
  }

  /// One past the last address covered by this block.
  pub fn end(&self) -> usize {
    self.base + self.length
  }

  pub fn overlaps(
    &self,
    other: &Block,
  ) -> bool {
    self.base < other.end() && other.base < self.end()
  }
}

impl fmt::Display for Block {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "({} , {})", self.base, self.length)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_equality_is_by_value() {
    assert_eq!(Block::new(4, 8), Block::new(4, 8));
    assert_ne!(Block::new(4, 8), Block::new(4, 9));
    assert_ne!(Block::new(4, 8), Block::new(5, 8));
  }

  #[test]
  fn test_overlaps() {
    let block = Block::new(10, 10);

    assert!(block.overlaps(&Block::new(15, 1)));
    assert!(block.overlaps(&Block::new(0, 11)));
    assert!(!block.overlaps(&Block::new(20, 5)));
    assert!(!block.overlaps(&Block::new(0, 10)));
    assert_eq!(block.end(), 20);
  }

  #[test]
  fn test_display() {
    assert_eq!(Block::new(30, 70).to_string(), "(30 , 70)");
  }
}
