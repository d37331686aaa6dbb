use std::{
    hash::{
        BuildHasher,
        Hash,
    },
    num::NonZeroU32,
    ops::{
        Index,
        IndexMut,
    },
};

use hashbrown::{
    HashTable,
    hash_table,
};
use slab::Slab;

use crate::RandomState;

/// Stable handle to an arena slot.
///
/// Niche-packed so the null sentinel costs no extra space: the all-ones
/// value stands in for "no slot", and every other value is the slot index
/// plus one.
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub(crate) struct Ptr(NonZeroU32);

impl std::fmt::Debug for Ptr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_null() {
            write!(f, "Ptr(null)")
        } else {
            write!(f, "Ptr({})", self.0.get() - 1)
        }
    }
}

impl Default for Ptr {
    fn default() -> Self {
        Ptr::null()
    }
}

impl Ptr {
    pub(crate) fn null() -> Self {
        Ptr(NonZeroU32::MAX)
    }

    pub(crate) fn is_null(&self) -> bool {
        *self == Ptr::null()
    }

    pub(crate) fn unchecked_from(index: usize) -> Self {
        debug_assert!(
            index < u32::MAX as usize - 1,
            "Index too large to fit in Ptr: {index}"
        );
        Ptr(NonZeroU32::new((index as u32).wrapping_add(1)).unwrap())
    }

    pub(crate) fn unchecked_get(self) -> usize {
        self.0.get() as usize - 1
    }

    pub(crate) fn get(self) -> Option<usize> {
        if self.is_null() {
            None
        } else {
            Some(self.unchecked_get())
        }
    }
}

#[derive(Debug, Clone)]
struct Node<K, V> {
    key: K,
    value: V,
    hash: u64,
    prev: Ptr,
    next: Ptr,
}

/// Arena-backed recency order plus key index.
///
/// Nodes live in a `Slab` and are threaded into a circular doubly linked
/// list: `head` is the most recently used entry, `tail` the eviction
/// candidate, and `head.prev == tail` / `tail.next == head` always hold
/// for a non-empty list. The `HashTable` maps keys to node handles by
/// their precomputed hash, so lookup, promotion, and removal are all
/// O(1) splices with no scanning.
#[derive(Clone)]
pub(crate) struct RecencyList<K, V> {
    head: Ptr,
    tail: Ptr,
    nodes: Slab<Node<K, V>>,
    table: HashTable<Ptr>,
    hasher: RandomState,
}

impl<K, V> Default for RecencyList<K, V> {
    fn default() -> Self {
        RecencyList {
            head: Ptr::null(),
            tail: Ptr::null(),
            nodes: Slab::new(),
            table: HashTable::new(),
            hasher: RandomState::default(),
        }
    }
}

impl<K, V> RecencyList<K, V> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        assert!(capacity < u32::MAX as usize - 1, "Capacity too large");
        RecencyList {
            head: Ptr::null(),
            tail: Ptr::null(),
            nodes: Slab::with_capacity(capacity),
            table: HashTable::with_capacity(capacity),
            hasher: RandomState::default(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn clear(&mut self) {
        self.table.clear();
        self.nodes.clear();
        self.head = Ptr::null();
        self.tail = Ptr::null();
    }

    pub(crate) fn ptr_get(&self, ptr: Ptr) -> Option<&V> {
        Some(&self.nodes[ptr.get()?].value)
    }

    pub(crate) fn ptr_get_mut(&mut self, ptr: Ptr) -> Option<&mut V> {
        Some(&mut self.nodes[ptr.get()?].value)
    }

    pub(crate) fn ptr_entry(&self, ptr: Ptr) -> Option<(&K, &V)> {
        let node = &self.nodes[ptr.get()?];
        Some((&node.key, &node.value))
    }

    pub(crate) fn tail_entry(&self) -> Option<(&K, &V)> {
        self.ptr_entry(self.tail)
    }

    fn prev_ptr(&self, ptr: Ptr) -> Option<Ptr> {
        Some(self.nodes[ptr.get()?].prev)
    }

    /// Re-links an entry as the new head. The entry keeps its slot; only
    /// the surrounding links and the head/tail handles change.
    pub(crate) fn move_to_head(&mut self, ptr: Ptr) {
        if ptr == self.head {
            return;
        }

        let (prev, next) = {
            let node = &self.nodes[ptr.unchecked_get()];
            (node.prev, node.next)
        };
        self.nodes[prev.unchecked_get()].next = next;
        self.nodes[next.unchecked_get()].prev = prev;
        if self.tail == ptr {
            self.tail = prev;
        }

        let old_head = self.head;
        let tail = self.tail;
        {
            let node = &mut self.nodes[ptr.unchecked_get()];
            node.prev = tail;
            node.next = old_head;
        }
        self.nodes[old_head.unchecked_get()].prev = ptr;
        self.nodes[tail.unchecked_get()].next = ptr;
        self.head = ptr;
    }

    pub(crate) fn remove_ptr(&mut self, ptr: Ptr) -> Option<(K, V)> {
        if ptr.is_null() {
            return None;
        }

        let node = self.nodes.remove(ptr.unchecked_get());
        match self.table.find_entry(node.hash, |p| *p == ptr) {
            Ok(occupied) => {
                occupied.remove();
            }
            Err(_) => {
                #[cfg(debug_assertions)]
                unreachable!("Pointer not found in table: {ptr:?}");
            }
        }

        self.unlink(ptr, node.prev, node.next);
        Some((node.key, node.value))
    }

    pub(crate) fn remove_tail(&mut self) -> Option<(K, V)> {
        self.remove_ptr(self.tail)
    }

    fn unlink(&mut self, ptr: Ptr, prev: Ptr, next: Ptr) {
        if self.head == ptr && self.tail == ptr {
            self.head = Ptr::null();
            self.tail = Ptr::null();
            return;
        }

        self.nodes[prev.unchecked_get()].next = next;
        self.nodes[next.unchecked_get()].prev = prev;
        if self.head == ptr {
            self.head = next;
        }
        if self.tail == ptr {
            self.tail = prev;
        }
    }

    /// Iterates in eviction order: tail first, head last.
    pub(crate) fn iter(&'_ self) -> Iter<'_, K, V> {
        Iter {
            ptr: self.tail,
            end: self.tail,
            list: self,
        }
    }

    pub(crate) fn into_iter(self) -> IntoIter<K, V> {
        IntoIter {
            ptr: self.tail,
            end: self.tail,
            nodes: self.nodes,
        }
    }

    #[cfg(test)]
    pub(crate) fn debug_validate(&self) {
        if self.is_empty() {
            assert!(self.head.is_null(), "Head of empty list should be null");
            assert!(self.tail.is_null(), "Tail of empty list should be null");
            return;
        }

        assert_eq!(
            self.nodes.len(),
            self.table.len(),
            "Arena and table should have the same length"
        );
        assert_eq!(
            self.prev_ptr(self.head),
            Some(self.tail),
            "Head should link back to tail"
        );
        assert_eq!(
            self.nodes[self.tail.unchecked_get()].next,
            self.head,
            "Tail should link forward to head"
        );

        let mut seen = 0;
        let mut ptr = self.head;
        loop {
            assert!(
                self.nodes.contains(ptr.unchecked_get()),
                "Link to vacant slot: {ptr:?}"
            );
            seen += 1;
            assert!(seen <= self.len(), "Cycle does not close at head");
            ptr = self.nodes[ptr.unchecked_get()].next;
            if ptr == self.head {
                break;
            }
        }
        assert_eq!(seen, self.len(), "List and arena disagree on length");
    }
}

impl<K: Hash + Eq, V> RecencyList<K, V> {
    pub(crate) fn entry(&'_ mut self, key: K) -> Entry<'_, K, V> {
        let hash = self.hasher.hash_one(&key);
        match self.table.entry(
            hash,
            |p| self.nodes[p.unchecked_get()].key == key,
            |p| self.nodes[p.unchecked_get()].hash,
        ) {
            hash_table::Entry::Occupied(entry) => {
                let ptr = *entry.get();
                Entry::Occupied(OccupiedEntry {
                    ptr,
                    node: &mut self.nodes[ptr.unchecked_get()],
                })
            }
            hash_table::Entry::Vacant(entry) => Entry::Vacant(VacantEntry {
                entry,
                key,
                hash,
                nodes: &mut self.nodes,
                head: &mut self.head,
                tail: &mut self.tail,
            }),
        }
    }

    /// Inserts at the head, or overwrites and promotes an existing key.
    /// Returns the replaced value, if any.
    pub(crate) fn insert_head(&mut self, key: K, value: V) -> Option<V> {
        match self.entry(key) {
            Entry::Occupied(entry) => {
                let ptr = entry.ptr();
                let old = entry.replace(value);
                self.move_to_head(ptr);
                Some(old)
            }
            Entry::Vacant(entry) => {
                entry.insert_head(value);
                None
            }
        }
    }

    pub(crate) fn get_ptr(&self, key: &K) -> Option<Ptr> {
        let hash = self.hasher.hash_one(key);
        self.table
            .find(hash, |p| self.nodes[p.unchecked_get()].key == *key)
            .copied()
    }

    pub(crate) fn get(&self, key: &K) -> Option<&V> {
        self.ptr_get(self.get_ptr(key)?)
    }

    pub(crate) fn remove(&mut self, key: &K) -> Option<V> {
        let hash = self.hasher.hash_one(key);
        let ptr = match self
            .table
            .find_entry(hash, |p| self.nodes[p.unchecked_get()].key == *key)
        {
            Ok(occupied) => {
                let (ptr, _) = occupied.remove();
                ptr
            }
            Err(_) => return None,
        };

        let node = self.nodes.remove(ptr.unchecked_get());
        self.unlink(ptr, node.prev, node.next);
        Some(node.value)
    }
}

impl<K, V> Index<Ptr> for RecencyList<K, V> {
    type Output = V;

    fn index(&self, index: Ptr) -> &Self::Output {
        &self.nodes[index.unchecked_get()].value
    }
}

impl<K, V> IndexMut<Ptr> for RecencyList<K, V> {
    fn index_mut(&mut self, index: Ptr) -> &mut Self::Output {
        &mut self.nodes[index.unchecked_get()].value
    }
}

pub(crate) enum Entry<'a, K, V> {
    Occupied(OccupiedEntry<'a, K, V>),
    Vacant(VacantEntry<'a, K, V>),
}

pub(crate) struct OccupiedEntry<'a, K, V> {
    ptr: Ptr,
    node: &'a mut Node<K, V>,
}

impl<K, V> OccupiedEntry<'_, K, V> {
    pub(crate) fn ptr(&self) -> Ptr {
        self.ptr
    }

    pub(crate) fn replace(self, value: V) -> V {
        std::mem::replace(&mut self.node.value, value)
    }
}

pub(crate) struct VacantEntry<'a, K, V> {
    key: K,
    hash: u64,
    entry: hash_table::VacantEntry<'a, Ptr>,
    nodes: &'a mut Slab<Node<K, V>>,
    head: &'a mut Ptr,
    tail: &'a mut Ptr,
}

impl<K, V> VacantEntry<'_, K, V> {
    pub(crate) fn key(&self) -> &K {
        &self.key
    }

    /// Allocates a slot for the key and links it as the new head.
    pub(crate) fn insert_head(self, value: V) -> Ptr {
        let ptr = Ptr::unchecked_from(self.nodes.insert(Node {
            key: self.key,
            value,
            hash: self.hash,
            prev: Ptr::null(),
            next: Ptr::null(),
        }));
        self.entry.insert(ptr);

        if self.head.is_null() {
            let node = &mut self.nodes[ptr.unchecked_get()];
            node.prev = ptr;
            node.next = ptr;
            *self.head = ptr;
            *self.tail = ptr;
        } else {
            let old_head = *self.head;
            let tail = *self.tail;
            {
                let node = &mut self.nodes[ptr.unchecked_get()];
                node.prev = tail;
                node.next = old_head;
            }
            self.nodes[old_head.unchecked_get()].prev = ptr;
            self.nodes[tail.unchecked_get()].next = ptr;
            *self.head = ptr;
        }
        ptr
    }
}

/// Borrowing iterator over entries in eviction order.
pub struct Iter<'a, K, V> {
    ptr: Ptr,
    end: Ptr,
    list: &'a RecencyList<K, V>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let ptr = self.ptr;
        self.ptr = self.list.prev_ptr(ptr).unwrap_or_default();
        if self.ptr == self.end {
            self.ptr = Ptr::null();
        }
        self.list.ptr_entry(ptr)
    }
}

/// Owning iterator over entries in eviction order.
pub struct IntoIter<K, V> {
    ptr: Ptr,
    end: Ptr,
    nodes: Slab<Node<K, V>>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.ptr.is_null() {
            return None;
        }

        let node = self.nodes.remove(self.ptr.unchecked_get());
        self.ptr = if node.prev == self.end {
            Ptr::null()
        } else {
            node.prev
        };
        Some((node.key, node.value))
    }
}
