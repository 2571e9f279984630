//! Ordered sequence of [`Block`]s used for both the free and the allocated
//! lists of a [`MemorySpace`](crate::MemorySpace).
//!
//! ```text
//!   BlockList:
//!
//!   first                                         last
//!     │                                             │
//!     ▼                                             ▼
//!   ┌──────────┐    ┌──────────┐    ┌──────────┐  ┌──────────┐
//!   │ (0 , 10) │───►│ (30 , 5) │───►│ (50 , 8) │─►│ (90 , 10)│──► ∅
//!   └──────────┘    └──────────┘    └──────────┘  └──────────┘
//! ```
//!
//! Nodes live in a slot arena and are linked forward only. A [`NodeId`] names
//! one node of one list; once the node is removed its slot is recycled under
//! a new generation, so an old handle no longer resolves to anything.

use std::{
  fmt,
  sync::atomic::{AtomicU32, Ordering},
};

use thiserror::Error;

use crate::block::Block;

static NEXT_LIST_TAG: AtomicU32 = AtomicU32::new(0);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListError {
  #[error("index {index} is out of range for a list of {len} blocks")]
  OutOfRange { index: usize, len: usize },
  #[error("block {0} is not in this list")]
  NotFound(Block),
}

/// Handle to a node of a [`BlockList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
  list: u32,
  slot: usize,
  generation: u32,
}

struct Node {
  block: Block,
  next: Option<NodeId>,
}

struct Slot {
  generation: u32,
  node: Option<Node>,
}

pub struct BlockList {
  tag: u32,
  slots: Vec<Slot>,
  vacant: Vec<usize>,
  first: Option<NodeId>,
  last: Option<NodeId>,
  len: usize,
}

impl BlockList {
  pub fn new() -> Self {
    Self {
      tag: NEXT_LIST_TAG.fetch_add(1, Ordering::Relaxed),
      slots: Vec::new(),
      vacant: Vec::new(),
      first: None,
      last: None,
      len: 0,
    }
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  pub fn first(&self) -> Option<NodeId> {
    self.first
  }

  pub fn last(&self) -> Option<NodeId> {
    self.last
  }

  /// Whether `id` names a node currently linked into this list.
  pub fn contains(
    &self,
    id: NodeId,
  ) -> bool {
    self.node(id).is_some()
  }

  pub fn get(
    &self,
    id: NodeId,
  ) -> Option<&Block> {
    self.node(id).map(|node| &node.block)
  }

  pub fn get_mut(
    &mut self,
    id: NodeId,
  ) -> Option<&mut Block> {
    self.node_mut(id).map(|node| &mut node.block)
  }

  /// The successor of `id`, or `None` when `id` is the tail or not in the list.
  pub fn next(
    &self,
    id: NodeId,
  ) -> Option<NodeId> {
    self.node(id).and_then(|node| node.next)
  }

  /// Walks from the head to the node at `index`.
  ///
  /// Only indices of existing nodes are accepted: `index == len()` is
  /// rejected like any other index past the tail.
  pub fn node_at(
    &self,
    index: usize,
  ) -> Result<NodeId, ListError> {
    let out_of_range = ListError::OutOfRange {
      index,
      len: self.len,
    };

    if index >= self.len {
      return Err(out_of_range);
    }

    let mut current = self.first;
    for _ in 0..index {
      current = current.and_then(|id| self.next(id));
    }

    current.ok_or(out_of_range)
  }

  pub fn block_at(
    &self,
    index: usize,
  ) -> Result<&Block, ListError> {
    let id = self.node_at(index)?;

    self.get(id).ok_or(ListError::OutOfRange {
      index,
      len: self.len,
    })
  }

  /// Inserts `block` so that it ends up at position `index`.
  ///
  /// `0` and `len()` are constant time; anything in between walks to the
  /// predecessor. `len()` is the one position past the tail that is accepted,
  /// and it appends.
  pub fn insert_at(
    &mut self,
    index: usize,
    block: Block,
  ) -> Result<NodeId, ListError> {
    if index > self.len {
      return Err(ListError::OutOfRange {
        index,
        len: self.len,
      });
    }

    if index == 0 {
      return Ok(self.push_front(block));
    }

    if index == self.len {
      return Ok(self.push_back(block));
    }

    let previous = self.node_at(index - 1)?;
    let id = self.allocate_node(block, self.next(previous));
    self.link(previous, Some(id));
    self.len += 1;

    Ok(id)
  }

  pub fn push_back(
    &mut self,
    block: Block,
  ) -> NodeId {
    let id = self.allocate_node(block, None);

    match self.last {
      Some(last) => self.link(last, Some(id)),
      None => self.first = Some(id),
    }

    self.last = Some(id);
    self.len += 1;

    id
  }

  pub fn push_front(
    &mut self,
    block: Block,
  ) -> NodeId {
    let id = self.allocate_node(block, self.first);

    if self.last.is_none() {
      self.last = Some(id);
    }

    self.first = Some(id);
    self.len += 1;

    id
  }

  /// Position of the first block equal to `block`.
  pub fn index_of(
    &self,
    block: &Block,
  ) -> Option<usize> {
    self.iter().position(|candidate| candidate == block)
  }

  /// Unlinks the node named by `id` and returns its block.
  ///
  /// A handle that is not linked into this list (already removed, or from
  /// another list) leaves the list untouched and returns `None`.
  pub fn remove_node(
    &mut self,
    id: NodeId,
  ) -> Option<Block> {
    if self.first == Some(id) {
      self.first = self.next(id);
      if self.first.is_none() {
        self.last = None;
      }
      self.len -= 1;

      return self.release_node(id);
    }

    let mut current = self.first;
    while let Some(previous) = current {
      let next = self.next(previous);

      if next == Some(id) {
        self.link(previous, self.next(id));
        if self.last == Some(id) {
          self.last = Some(previous);
        }
        self.len -= 1;

        return self.release_node(id);
      }

      current = next;
    }

    None
  }

  pub fn remove_at(
    &mut self,
    index: usize,
  ) -> Result<Block, ListError> {
    let id = self.node_at(index)?;

    self.remove_node(id).ok_or(ListError::OutOfRange {
      index,
      len: self.len,
    })
  }

  /// Removes the first block equal to `block`.
  pub fn remove_value(
    &mut self,
    block: &Block,
  ) -> Result<Block, ListError> {
    let index = self.index_of(block).ok_or(ListError::NotFound(*block))?;

    self.remove_at(index)
  }

  /// A fresh cursor positioned at the head.
  pub fn cursor(&self) -> Cursor {
    Cursor::at(self.first, self)
  }

  pub fn iter(&self) -> Iter<'_> {
    Iter {
      list: self,
      current: self.first,
    }
  }

  fn node(
    &self,
    id: NodeId,
  ) -> Option<&Node> {
    if id.list != self.tag {
      return None;
    }

    self
      .slots
      .get(id.slot)
      .filter(|slot| slot.generation == id.generation)
      .and_then(|slot| slot.node.as_ref())
  }

  fn node_mut(
    &mut self,
    id: NodeId,
  ) -> Option<&mut Node> {
    if id.list != self.tag {
      return None;
    }

    self
      .slots
      .get_mut(id.slot)
      .filter(|slot| slot.generation == id.generation)
      .and_then(|slot| slot.node.as_mut())
  }

  fn link(
    &mut self,
    id: NodeId,
    next: Option<NodeId>,
  ) {
    if let Some(node) = self.node_mut(id) {
      node.next = next;
    }
  }

  fn allocate_node(
    &mut self,
    block: Block,
    next: Option<NodeId>,
  ) -> NodeId {
    let node = Some(Node { block, next });

    match self.vacant.pop() {
      Some(slot) => {
        let entry = &mut self.slots[slot];
        entry.node = node;

        NodeId {
          list: self.tag,
          slot,
          generation: entry.generation,
        }
      }
      None => {
        self.slots.push(Slot {
          generation: 0,
          node,
        });

        NodeId {
          list: self.tag,
          slot: self.slots.len() - 1,
          generation: 0,
        }
      }
    }
  }

  fn release_node(
    &mut self,
    id: NodeId,
  ) -> Option<Block> {
    let entry = self.slots.get_mut(id.slot)?;
    let node = entry.node.take()?;

    entry.generation = entry.generation.wrapping_add(1);
    self.vacant.push(id.slot);

    Some(node.block)
  }
}

impl Default for BlockList {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Debug for BlockList {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_list().entries(self.iter()).finish()
  }
}

impl fmt::Display for BlockList {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    for (i, block) in self.iter().enumerate() {
      if i > 0 {
        write!(f, " ")?;
      }
      write!(f, "{block}")?;
    }

    Ok(())
  }
}

impl<'a> IntoIterator for &'a BlockList {
  type Item = &'a Block;
  type IntoIter = Iter<'a>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}

/// Forward cursor over a [`BlockList`] that does not borrow the list.
///
/// The caller may remove the node under the cursor and then call
/// [`advance`](Cursor::advance) to land on what followed it. Removing any
/// other node that the cursor has not reached yet is not supported.
#[derive(Debug, Clone, Copy)]
pub struct Cursor {
  current: Option<NodeId>,
  following: Option<NodeId>,
}

impl Cursor {
  fn at(
    current: Option<NodeId>,
    list: &BlockList,
  ) -> Self {
    Self {
      current,
      following: current.and_then(|id| list.next(id)),
    }
  }

  pub fn current(&self) -> Option<NodeId> {
    self.current
  }

  pub fn has_next(&self) -> bool {
    self.current.is_some()
  }

  pub fn advance(
    &mut self,
    list: &BlockList,
  ) {
    let next = match self.current {
      Some(id) if list.contains(id) => list.next(id),
      Some(_) => self.following,
      None => None,
    };

    *self = Cursor::at(next, list);
  }
}

pub struct Iter<'a> {
  list: &'a BlockList,
  current: Option<NodeId>,
}

impl<'a> Iterator for Iter<'a> {
  type Item = &'a Block;

  fn next(&mut self) -> Option<Self::Item> {
    let node = self.list.node(self.current?)?;
    self.current = node.next;

    Some(&node.block)
  }
}
