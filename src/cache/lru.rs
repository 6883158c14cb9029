//! LRU List Module
//!
//! Doubly linked recency list stored in an arena of slots addressed by index.

// == Node ==
#[derive(Debug)]
struct Node<V> {
    key: String,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

// == LRU List ==
/// Access-ordered list of entries.
///
/// - Head = Most recently used
/// - Tail = Least recently used
///
/// Nodes live in `slots`; freed slots are recycled through `free`, so a
/// handle returned by `push_front` stays valid until that node is removed.
#[derive(Debug)]
pub struct LruList<V> {
    slots: Vec<Option<Node<V>>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<V> Default for LruList<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> LruList<V> {
    // == Constructor ==
    /// Creates a new empty list.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Creates an empty list with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            ..Self::new()
        }
    }

    // == Push Front ==
    /// Inserts an entry at the most recently used position and returns its handle.
    pub fn push_front(&mut self, key: String, value: V) -> usize {
        let node = Node {
            key,
            value,
            prev: None,
            next: self.head,
        };

        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                idx
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };

        match self.head {
            Some(old_head) => self.node_mut(old_head).prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
        self.len += 1;
        idx
    }

    // == Move To Front ==
    /// Marks the node as most recently used.
    pub fn move_to_front(&mut self, idx: usize) {
        if self.head == Some(idx) || self.slot(idx).is_none() {
            return;
        }
        self.unlink(idx);

        let old_head = self.head;
        {
            let node = self.node_mut(idx);
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(h) => self.node_mut(h).prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }

    // == Remove ==
    /// Removes the node and returns its key and value.
    pub fn remove(&mut self, idx: usize) -> Option<(String, V)> {
        self.slot(idx)?;
        self.unlink(idx);

        let node = self.slots[idx].take()?;
        self.free.push(idx);
        self.len -= 1;
        Some((node.key, node.value))
    }

    // == Pop Back ==
    /// Removes and returns the least recently used entry.
    ///
    /// Returns None if the list is empty.
    pub fn pop_back(&mut self) -> Option<(String, V)> {
        let tail = self.tail?;
        self.remove(tail)
    }

    // == Peek Back ==
    /// Returns the least recently used key without removing it.
    #[cfg(test)]
    pub fn peek_back(&self) -> Option<&str> {
        self.tail
            .and_then(|idx| self.slot(idx))
            .map(|node| node.key.as_str())
    }

    // == Accessors ==
    pub fn get(&self, idx: usize) -> Option<&V> {
        self.slot(idx).map(|node| &node.value)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut V> {
        self.slots
            .get_mut(idx)
            .and_then(Option::as_mut)
            .map(|node| &mut node.value)
    }

    /// Iterates keys from most to least recently used.
    pub fn keys(&self) -> Keys<'_, V> {
        Keys {
            list: self,
            cursor: self.head,
        }
    }

    // == Length ==
    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // == Internals ==
    fn slot(&self, idx: usize) -> Option<&Node<V>> {
        self.slots.get(idx).and_then(Option::as_ref)
    }

    // Only called with handles already confirmed live.
    fn node_mut(&mut self, idx: usize) -> &mut Node<V> {
        match self.slots[idx].as_mut() {
            Some(node) => node,
            None => unreachable!("lru slot {} is vacant", idx),
        }
    }

    /// Detaches a live node from its neighbours, fixing head and tail.
    fn unlink(&mut self, idx: usize) {
        let (prev, next) = {
            let node = self.node_mut(idx);
            (node.prev.take(), node.next.take())
        };

        match prev {
            Some(p) => self.node_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev = prev,
            None => self.tail = prev,
        }
    }
}

// == Keys Iterator ==
pub struct Keys<'a, V> {
    list: &'a LruList<V>,
    cursor: Option<usize>,
}

impl<'a, V> Iterator for Keys<'a, V> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.list.slot(self.cursor?)?;
        self.cursor = node.next;
        Some(node.key.as_str())
    }
}
