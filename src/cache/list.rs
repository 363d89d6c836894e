//! Ordered List Module
//!
//! Doubly-linked list threaded through a `Vec` by index, bounded by two
//! sentinel nodes that are always members.
//!
//! Layout:
//! - Front = just after the HEAD sentinel (most recent)
//! - Back = just before the TAIL sentinel (least recent)

/// Slot of the HEAD sentinel.
const HEAD: usize = 0;

/// Slot of the TAIL sentinel.
const TAIL: usize = 1;

// == Node Handle ==
/// Handle to a node pushed into an [`OrderedList`].
///
/// A handle is only meaningful for the list that issued it. Once its node is
/// removed the handle goes stale: the slot may be reused, but the generation
/// no longer matches, so the stale handle resolves to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: usize,
    generation: u64,
}

#[derive(Debug)]
struct Node<T> {
    /// `None` for sentinels and freed slots
    item: Option<T>,
    /// Bumped every time the slot is freed
    generation: u64,
    prev: usize,
    next: usize,
}

impl<T> Node<T> {
    fn sentinel() -> Self {
        Self {
            item: None,
            generation: 0,
            prev: HEAD,
            next: TAIL,
        }
    }
}

// == Ordered List ==
/// O(1) push-front, remove-by-handle and pop-back.
#[derive(Debug)]
pub struct OrderedList<T> {
    nodes: Vec<Node<T>>,
    free: Vec<usize>,
    len: usize,
}

impl<T> OrderedList<T> {
    // == Constructor ==
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty list with room for `capacity` nodes before reallocating.
    ///
    /// # Panics
    /// Panics like [`Vec::with_capacity`] if the allocation cannot be made.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut nodes = Vec::with_capacity(capacity.saturating_add(2));
        nodes.push(Node::sentinel());
        nodes.push(Node::sentinel());

        Self {
            nodes,
            free: Vec::new(),
            len: 0,
        }
    }

    // == Length ==
    /// Returns the number of items, sentinels excluded.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if only the sentinels remain.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // == Push Front ==
    /// Inserts `item` as the new front and returns its handle.
    pub fn push_front(&mut self, item: T) -> NodeId {
        let first = self.nodes[HEAD].next;

        let idx = match self.free.pop() {
            Some(idx) => {
                let node = &mut self.nodes[idx];
                node.item = Some(item);
                node.prev = HEAD;
                node.next = first;
                idx
            }
            None => {
                self.nodes.push(Node {
                    item: Some(item),
                    generation: 0,
                    prev: HEAD,
                    next: first,
                });
                self.nodes.len() - 1
            }
        };

        self.nodes[first].prev = idx;
        self.nodes[HEAD].next = idx;
        self.len += 1;
        NodeId {
            index: idx,
            generation: self.nodes[idx].generation,
        }
    }

    // == Remove ==
    /// Unlinks the node behind `id` and returns its item.
    ///
    /// Returns `None` if `id` is not a live member of this list, including a
    /// stale handle whose slot has since been reused.
    pub fn remove(&mut self, id: NodeId) -> Option<T> {
        let idx = id.index;
        let node = self.nodes.get_mut(idx)?;
        if node.generation != id.generation {
            return None;
        }
        let item = node.item.take()?;
        node.generation = node.generation.wrapping_add(1);
        let (prev, next) = (node.prev, node.next);

        self.nodes[prev].next = next;
        self.nodes[next].prev = prev;
        self.free.push(idx);
        self.len -= 1;
        Some(item)
    }

    // == Pop Back ==
    /// Removes and returns the back item.
    ///
    /// On an empty list the tail's neighbour is the head sentinel, whose item
    /// is always `None`.
    pub fn pop_back(&mut self) -> Option<T> {
        let last = self.nodes[TAIL].prev;
        let generation = self.nodes[last].generation;
        self.remove(NodeId {
            index: last,
            generation,
        })
    }

    // == Get ==
    /// Returns the item behind `id`, or `None` if the handle is not live.
    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.nodes
            .get(id.index)
            .filter(|node| node.generation == id.generation)
            .and_then(|node| node.item.as_ref())
    }

    // == Peek ==
    /// Returns the back item without removing it.
    pub fn peek_back(&self) -> Option<&T> {
        self.nodes[self.nodes[TAIL].prev].item.as_ref()
    }

    /// Returns the front item without removing it.
    pub fn peek_front(&self) -> Option<&T> {
        self.nodes[self.nodes[HEAD].next].item.as_ref()
    }

    /// Walks items front to back.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.nodes[HEAD].next,
        }
    }
}

impl<T> Default for OrderedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Front-to-back iterator over an [`OrderedList`].
pub struct Iter<'a, T> {
    list: &'a OrderedList<T>,
    cursor: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == TAIL {
            return None;
        }
        let node = &self.list.nodes[self.cursor];
        self.cursor = node.next;
        node.item.as_ref()
    }
}
