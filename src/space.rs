use std::fmt;

use log::{debug, trace, warn};
use thiserror::Error;

use crate::{
  block::Block,
  list::{BlockList, NodeId},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpaceError {
  #[error("a memory space needs a capacity greater than zero")]
  ZeroCapacity,
}

/// First-fit manager of the address range `[0, capacity)`.
///
/// Every address is covered by exactly one block of either the free list or
/// the allocated list.
pub struct MemorySpace {
  capacity: usize,
  free: BlockList,
  allocated: BlockList,
}

impl MemorySpace {
  pub fn new(capacity: usize) -> Result<Self, SpaceError> {
    if capacity == 0 {
      return Err(SpaceError::ZeroCapacity);
    }

    let mut free = BlockList::new();
    free.push_back(Block::new(0, capacity));

    debug!("Created memory space, capacity = {}", capacity);

    Ok(Self {
      capacity,
      free,
      allocated: BlockList::new(),
    })
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  pub fn free_list(&self) -> &BlockList {
    &self.free
  }

  pub fn allocated_list(&self) -> &BlockList {
    &self.allocated
  }

  pub fn free_capacity(&self) -> usize {
    self.free.iter().map(|block| block.length).sum()
  }

  pub fn allocated_capacity(&self) -> usize {
    self.allocated.iter().map(|block| block.length).sum()
  }

  pub fn largest_free_block(&self) -> Option<usize> {
    self.free.iter().map(|block| block.length).max()
  }

  fn find_free_block(
    &self,
    length: usize,
  ) -> Option<NodeId> {
    let mut cursor = self.free.cursor();

    while let Some(id) = cursor.current() {
      if let Some(block) = self.free.get(id) {
        if block.length >= length {
          return Some(id);
        }
        trace!("  Too small: {} < {}", block, length);
      }
      cursor.advance(&self.free);
    }

    None
  }

  /// Carves `length` words out of the first free block large enough to hold
  /// them and returns the base address of the new allocated block.
  ///
  /// Returns `None` when no single free block is large enough, in which case
  /// neither list is touched. Fragmented space is not recovered here; call
  /// [`defragment`](MemorySpace::defragment) and retry.
  pub fn allocate(
    &mut self,
    length: usize,
  ) -> Option<usize> {
    if length == 0 {
      warn!("Rejected allocation of zero words");
      return None;
    }

    let Some(id) = self.find_free_block(length) else {
      debug!("Allocate {} words failed, no free block is large enough", length);
      return None;
    };

    let free_block = self.free.get_mut(id)?;
    let base = free_block.base;

    if free_block.length > length {
      free_block.base += length;
      free_block.length -= length;
    } else {
      self.free.remove_node(id);
    }

    self.allocated.push_back(Block::new(base, length));

    debug!("Allocated {} words, address = {}", length, base);

    Some(base)
  }

  /// Moves the allocated block based at `address` to the end of the free
  /// list. Returns `false` and changes nothing if no allocated block starts
  /// there.
  pub fn release(
    &mut self,
    address: usize,
  ) -> bool {
    let mut cursor = self.allocated.cursor();

    while let Some(id) = cursor.current() {
      let matches = self
        .allocated
        .get(id)
        .is_some_and(|block| block.base == address);

      if matches {
        if let Some(block) = self.allocated.remove_node(id) {
          debug!("Released {}", block);
          self.free.push_back(block);
          return true;
        }
      }

      cursor.advance(&self.allocated);
    }

    debug!("Release of address {} ignored, it is not allocated", address);

    false
  }

  /// Merges adjacent free blocks until no two free blocks touch.
  pub fn defragment(&mut self) {
    if self.free.len() <= 1 {
      return;
    }

    let before = self.free.len();
    let mut passes = 1;

    while self.merge_pass() {
      passes += 1;
    }

    debug!(
      "Defragmented free list from {} to {} blocks in {} passes",
      before,
      self.free.len(),
      passes
    );
  }

  /// One sweep over every ordered pair of free blocks. Returns whether
  /// anything was merged.
  fn merge_pass(&mut self) -> bool {
    let mut merged = false;
    let mut cursor = self.free.cursor();

    while let Some(current) = cursor.current() {
      let mut following = self.free.next(current);
      let mut current_absorbed = false;

      while let Some(candidate) = following {
        let (Some(&lower), Some(&upper)) = (self.free.get(current), self.free.get(candidate)) else {
          break;
        };

        if lower.end() == upper.base {
          trace!("  Merging {} into {}", upper, lower);
          if let Some(block) = self.free.get_mut(current) {
            block.length += upper.length;
          }
          self.free.remove_node(candidate);
          following = self.free.next(current);
          merged = true;
        } else if upper.end() == lower.base {
          trace!("  Merging {} into {}", lower, upper);
          if let Some(block) = self.free.get_mut(candidate) {
            block.length += lower.length;
          }
          // The successor recorded by the cursor may already have been
          // absorbed in this sweep, so step off `current` while it is linked.
          cursor.advance(&self.free);
          self.free.remove_node(current);
          current_absorbed = true;
          merged = true;
          break;
        } else {
          following = self.free.next(candidate);
        }
      }

      if !current_absorbed {
        cursor.advance(&self.free);
      }
    }

    merged
  }
}

impl fmt::Display for MemorySpace {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    writeln!(f, "{}", self.free)?;
    write!(f, "{}", self.allocated)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
  }

  fn blocks(list: &BlockList) -> Vec<(usize, usize)> {
    list.iter().map(|block| (block.base, block.length)).collect()
  }

  fn space_with_free(
    capacity: usize,
    free: &[(usize, usize)],
  ) -> MemorySpace {
    let mut space = MemorySpace::new(capacity).unwrap();
    space.free = BlockList::new();
    for &(base, length) in free {
      space.free.push_back(Block::new(base, length));
    }
    space
  }

  #[test]
  fn test_new() {
    let space = MemorySpace::new(100).unwrap();

    assert_eq!(blocks(space.free_list()), vec![(0, 100)]);
    assert!(space.allocated_list().is_empty());
    assert_eq!(space.capacity(), 100);
    assert_eq!(MemorySpace::new(0).err(), Some(SpaceError::ZeroCapacity));
  }

  #[test]
  fn test_allocate_splits_first_free_block() {
    init_logger();
    let mut space = MemorySpace::new(100).unwrap();

    assert_eq!(space.allocate(10), Some(0));
    assert_eq!(space.allocate(20), Some(10));

    assert_eq!(blocks(space.free_list()), vec![(30, 70)]);
    assert_eq!(blocks(space.allocated_list()), vec![(0, 10), (10, 20)]);
  }

  #[test]
  fn test_exact_fit_removes_free_block() {
    init_logger();
    let mut space = MemorySpace::new(50).unwrap();

    assert_eq!(space.allocate(50), Some(0));
    assert!(space.free_list().is_empty());

    assert_eq!(space.allocate(1), None);
    assert!(space.free_list().is_empty());
    assert_eq!(blocks(space.allocated_list()), vec![(0, 50)]);
  }

  #[test]
  fn test_allocate_zero_is_rejected() {
    init_logger();
    let mut space = MemorySpace::new(10).unwrap();

    assert_eq!(space.allocate(0), None);
    assert_eq!(blocks(space.free_list()), vec![(0, 10)]);
    assert!(space.allocated_list().is_empty());
  }

  #[test]
  fn test_first_fit_follows_list_order() {
    init_logger();
    let mut space = MemorySpace::new(100).unwrap();

    space.allocate(10);
    space.allocate(20);
    space.allocate(30);
    space.release(10);
    assert_eq!(blocks(space.free_list()), vec![(60, 40), (10, 20)]);

    // (10, 20) is an exact fit but (60, 40) comes first.
    assert_eq!(space.allocate(20), Some(60));
    assert_eq!(blocks(space.free_list()), vec![(80, 20), (10, 20)]);
  }

  #[test]
  fn test_failed_allocation_does_not_mutate() {
    init_logger();
    let mut space = space_with_free(100, &[(0, 10), (50, 10)]);

    assert_eq!(space.allocate(11), None);
    assert_eq!(blocks(space.free_list()), vec![(0, 10), (50, 10)]);
    assert!(space.allocated_list().is_empty());
  }

  #[test]
  fn test_release_appends_to_free_list() {
    init_logger();
    let mut space = MemorySpace::new(100).unwrap();

    space.allocate(10);
    space.allocate(20);

    assert!(space.release(0));
    assert_eq!(blocks(space.free_list()), vec![(30, 70), (0, 10)]);
    assert_eq!(blocks(space.allocated_list()), vec![(10, 20)]);
  }

  #[test]
  fn test_release_unknown_address_is_noop() {
    init_logger();
    let mut space = MemorySpace::new(100).unwrap();

    assert!(!space.release(0));
    assert_eq!(blocks(space.free_list()), vec![(0, 100)]);

    space.allocate(10);
    assert!(!space.release(5));
    assert!(space.release(0));
    assert!(!space.release(0));
    assert_eq!(blocks(space.free_list()), vec![(10, 90), (0, 10)]);
    assert!(space.allocated_list().is_empty());
  }

  #[test]
  fn test_defragment_leaves_non_adjacent_blocks() {
    init_logger();
    let mut space = MemorySpace::new(100).unwrap();

    space.allocate(10);
    space.allocate(20);
    space.release(0);
    space.defragment();

    assert_eq!(blocks(space.free_list()), vec![(30, 70), (0, 10)]);
  }

  #[test]
  fn test_defragment_recovers_whole_space() {
    init_logger();
    let mut space = MemorySpace::new(100).unwrap();

    space.allocate(10);
    space.allocate(20);
    space.release(0);
    space.release(10);
    assert_eq!(space.allocate(100), None);

    space.defragment();

    assert_eq!(blocks(space.free_list()), vec![(0, 100)]);
    assert_eq!(space.allocate(100), Some(0));
  }

  #[test]
  fn test_defragment_merges_following_into_current() {
    let mut space = space_with_free(30, &[(0, 10), (20, 10), (10, 10)]);

    space.defragment();

    assert_eq!(blocks(space.free_list()), vec![(0, 30)]);
  }

  #[test]
  fn test_defragment_merges_current_into_following() {
    let mut space = space_with_free(40, &[(20, 10), (35, 5), (0, 10), (10, 10)]);

    space.defragment();

    assert_eq!(blocks(space.free_list()), vec![(35, 5), (0, 30)]);
  }

  #[test]
  fn test_defragment_small_lists_are_untouched() {
    let mut empty = space_with_free(10, &[]);
    empty.defragment();
    assert!(empty.free_list().is_empty());

    let mut single = MemorySpace::new(10).unwrap();
    single.defragment();
    assert_eq!(blocks(single.free_list()), vec![(0, 10)]);
  }

  #[test]
  fn test_defragment_is_idempotent() {
    let mut space = space_with_free(100, &[(50, 10), (0, 10), (70, 5), (10, 5), (60, 5)]);

    space.defragment();
    let once = blocks(space.free_list());
    space.defragment();

    assert_eq!(blocks(space.free_list()), once);
    assert_eq!(once.len(), 3);
  }

  #[test]
  fn test_capacity_accounting() {
    let mut space = MemorySpace::new(64).unwrap();

    space.allocate(16);
    space.allocate(8);
    space.release(0);

    assert_eq!(space.allocated_capacity(), 8);
    assert_eq!(space.free_capacity(), 56);
    assert_eq!(space.largest_free_block(), Some(40));
  }

  #[test]
  fn test_display() {
    let mut space = MemorySpace::new(100).unwrap();

    space.allocate(10);
    space.allocate(20);
    space.release(0);

    assert_eq!(space.to_string(), "(30 , 70) (0 , 10)\n(10 , 20)");
  }
}
