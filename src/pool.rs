//! Bounded top-K retention pool.
//!
//! A fixed-capacity binary min-heap keyed by value, paired with a hash set for
//! O(1) duplicate rejection. The pool always holds the `capacity` best distinct
//! entries offered so far; the root (`value(0)`) is the weakest of them.
//!
//! ```text
//! put(x, v):
//!   x already held          → no-op
//!   len < capacity          → push, sift up
//!   v > min                 → replace root, sift down
//!   otherwise               → no-op
//! ```

use std::collections::HashSet;
use std::hash::Hash;

#[derive(Clone, Debug)]
struct Node<T> {
    item: T,
    value: f64,
}

/// Best-`capacity` distinct items seen so far.
#[derive(Clone, Debug)]
pub struct VarPool<T> {
    capacity: usize,
    heap: Vec<Node<T>>,
    members: HashSet<T>,
}

impl<T: Clone + Eq + Hash> VarPool<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            heap: Vec::with_capacity(capacity),
            members: HashSet::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Item at heap position `pos` (position 0 holds the minimum).
    pub fn get(&self, pos: usize) -> &T {
        &self.heap[pos].item
    }

    /// Value at heap position `pos`.
    pub fn value(&self, pos: usize) -> f64 {
        self.heap[pos].value
    }

    pub fn contains(&self, item: &T) -> bool {
        self.members.contains(item)
    }

    /// Offer `item`. Returns true if the pool changed.
    ///
    /// # Examples
    ///
    /// ```
    /// use xorphf::VarPool;
    ///
    /// let mut pool = VarPool::new(2);
    /// assert!(pool.put("a", 0.5));
    /// assert!(!pool.put("a", 0.9)); // duplicate
    /// assert!(pool.put("b", 0.7));
    /// assert!(pool.put("c", 0.6)); // evicts "a"
    /// assert!(!pool.put("d", 0.1)); // worse than everything held
    /// assert_eq!(pool.value(0), 0.6);
    /// ```
    pub fn put(&mut self, item: T, value: f64) -> bool {
        if self.capacity == 0 || self.members.contains(&item) {
            return false;
        }
        if self.heap.len() == self.capacity {
            if value <= self.heap[0].value {
                return false;
            }
            let evicted = std::mem::replace(&mut self.heap[0], Node { item: item.clone(), value });
            self.members.remove(&evicted.item);
            self.move_down(0);
        } else {
            self.heap.push(Node { item: item.clone(), value });
            self.move_up(self.heap.len() - 1);
        }
        self.members.insert(item);
        true
    }

    /// Remove and return the weakest entry.
    pub fn pop_min(&mut self) -> Option<(T, f64)> {
        let last = self.heap.pop()?;
        let root = if self.heap.is_empty() {
            last
        } else {
            let root = std::mem::replace(&mut self.heap[0], last);
            self.move_down(0);
            root
        };
        self.members.remove(&root.item);
        Some((root.item, root.value))
    }

    /// Entries in heap order.
    pub fn iter(&self) -> impl Iterator<Item = (&T, f64)> {
        self.heap.iter().map(|n| (&n.item, n.value))
    }

    /// Consume the pool, best entry first.
    pub fn into_sorted_vec(self) -> Vec<(T, f64)> {
        let mut out: Vec<(T, f64)> = self.heap.into_iter().map(|n| (n.item, n.value)).collect();
        out.sort_by(|a, b| b.1.total_cmp(&a.1));
        out
    }

    fn move_down(&mut self, mut idx: usize) {
        let n = self.heap.len();
        loop {
            let l = idx * 2 + 1;
            let r = l + 1;
            let mut smallest = idx;
            if l < n && self.heap[l].value < self.heap[smallest].value {
                smallest = l;
            }
            if r < n && self.heap[r].value < self.heap[smallest].value {
                smallest = r;
            }
            if smallest == idx {
                break;
            }
            self.heap.swap(idx, smallest);
            idx = smallest;
        }
    }

    fn move_up(&mut self, mut idx: usize) {
        while idx > 0 {
            let parent = (idx - 1) / 2;
            if self.heap[parent].value <= self.heap[idx].value {
                break;
            }
            self.heap.swap(parent, idx);
            idx = parent;
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::Variable;

    #[test]
    fn test_keeps_best_distinct() {
        let mut pool = VarPool::new(3);
        for (i, v) in [0.2, 0.9, 0.5, 0.1, 0.7, 0.95].iter().enumerate() {
            pool.put(i, *v);
        }
        assert_eq!(pool.len(), 3);
        let sorted: Vec<usize> = pool.into_sorted_vec().into_iter().map(|(i, _)| i).collect();
        assert_eq!(sorted, vec![5, 1, 4]);
    }

    #[test]
    fn test_min_at_root() {
        let mut pool = VarPool::new(8);
        for (i, v) in [0.4, 0.3, 0.8, 0.35, 0.9, 0.31, 0.6].iter().enumerate() {
            pool.put(i, *v);
            let min = pool.value(0);
            assert!(pool.iter().all(|(_, v)| min <= v));
        }
    }

    #[test]
    fn test_duplicate_variable_is_noop() {
        let mut pool = VarPool::new(2);
        let a = Variable::from_vids(10, &[1, 2]);
        assert!(pool.put(a.clone(), 0.5));
        assert!(!pool.put(Variable::from_vids(10, &[2, 1]), 1.0));
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.value(0), 0.5);
        assert!(pool.contains(&a));
    }

    #[test]
    fn test_evicted_item_can_return() {
        let mut pool = VarPool::new(1);
        pool.put('a', 0.1);
        pool.put('b', 0.2);
        assert!(!pool.contains(&'a'));
        assert!(pool.put('a', 0.3));
        assert_eq!(*pool.get(0), 'a');
    }

    #[test]
    fn test_pop_min_frees_a_place() {
        let mut pool = VarPool::new(3);
        for (item, v) in [('a', 0.4), ('b', 0.2), ('c', 0.9)] {
            pool.put(item, v);
        }
        assert_eq!(pool.pop_min(), Some(('b', 0.2)));
        assert!(!pool.contains(&'b'));
        assert_eq!(pool.value(0), 0.4);
        assert!(pool.put('b', 0.1));
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.pop_min(), Some(('b', 0.1)));
        assert_eq!(pool.pop_min(), Some(('a', 0.4)));
        assert_eq!(pool.pop_min(), Some(('c', 0.9)));
        assert_eq!(pool.pop_min(), None);
    }

    #[test]
    fn test_zero_capacity() {
        let mut pool = VarPool::new(0);
        assert!(!pool.put(1u8, 1.0));
        assert!(pool.is_empty());
    }
}
