use std::cmp::Ordering::{Less, Greater, Equal};
use log::debug;




/**
 * A node in a height-balanced (AVL) binary search tree. Each node exclusively
 * owns its two sub-trees, and stores the height of the sub-tree rooted at
 * itself so that balance factors can be evaluated in constant time.
 */
#[derive(Clone)]
pub struct Node<K: Ord + Copy, V> {
    key: K,
    value: V,
    height: usize,
    l: Option<Box<Node<K, V>>>,
    r: Option<Box<Node<K, V>>>,
}




// ============================================================================
impl<K: Ord + Copy, V> Node<K, V> {




    /**
     * Create a leaf node with the given key and value.
     */
    pub(crate) fn new(key: K, value: V) -> Self {
        Self { key, value, height: 1, l: None, r: None }
    }




    /**
     * Return the number of nodes contained in this sub-tree (including self).
     */
    pub(crate) fn len(&self) -> usize {
        self.l.as_ref().map_or(0, |l| l.len()) +
        self.r.as_ref().map_or(0, |r| r.len()) + 1
    }




    /**
     * Return the stored height of a maybe-node. The empty sub-tree has height
     * zero.
     */
    pub(crate) fn height(node: &Option<Box<Self>>) -> usize {
        node.as_ref().map_or(0, |n| n.height)
    }




    /**
     * Return the balance factor of a maybe-node. The empty sub-tree has a
     * balance factor of zero.
     */
    pub(crate) fn balance_factor(node: &Option<Box<Self>>) -> isize {
        node.as_ref().map_or(0, |n| n.bf())
    }




    /**
     * Height of the left sub-tree minus height of the right sub-tree.
     */
    fn bf(&self) -> isize {
        Self::height(&self.l) as isize - Self::height(&self.r) as isize
    }




    fn update_height(&mut self) {
        self.height = Self::height(&self.l).max(Self::height(&self.r)) + 1;
    }




    /**
     * Return true of the given key exists in this sub-tree.
     */
    pub(crate) fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }




    /**
     * Return an immutable reference to the value under the given key.
     */
    pub(crate) fn get(&self, key: &K) -> Option<&V> {
        match key.cmp(&self.key) {
            Less    => self.l.as_ref().and_then(|l| l.get(key)),
            Greater => self.r.as_ref().and_then(|r| r.get(key)),
            Equal   => Some(&self.value)
        }
    }




    /**
     * Return a mutable reference to the value under the given key. The key
     * itself is never handed out mutably, so the ordering cannot be disturbed
     * through this reference.
     */
    pub(crate) fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        match key.cmp(&self.key) {
            Less    => self.l.as_mut().and_then(|l| l.get_mut(key)),
            Greater => self.r.as_mut().and_then(|r| r.get_mut(key)),
            Equal   => Some(&mut self.value)
        }
    }




    /**
     * Rotate the sub-tree rooted at `y` to the right, promoting its left
     * child. Returns the new sub-tree root. A node without a left child is
     * returned unchanged.
     *
     * ```text
     *         y              x
     *        / \            / \
     *       x   C   ==>    A   y
     *      / \                / \
     *     A   B              B   C
     * ```
     */
    fn rotate_r(mut y: Box<Self>) -> Box<Self> {
        match y.l.take() {
            Some(mut x) => {
                y.l = x.r.take();
                y.update_height();
                x.r = Some(y);
                x.update_height();
                x
            }
            None => y,
        }
    }




    /**
     * Mirror image of `rotate_r`: promote the right child of `x`.
     */
    fn rotate_l(mut x: Box<Self>) -> Box<Self> {
        match x.r.take() {
            Some(mut y) => {
                x.r = y.l.take();
                x.update_height();
                y.l = Some(x);
                y.update_height();
                y
            }
            None => x,
        }
    }




    /**
     * Left-right case: rotate the left child left, then this node right.
     */
    fn rotate_lr(mut n: Box<Self>) -> Box<Self> {
        n.l = n.l.take().map(Self::rotate_l);
        Self::rotate_r(n)
    }




    /**
     * Right-left case: rotate the right child right, then this node left.
     */
    fn rotate_rl(mut n: Box<Self>) -> Box<Self> {
        n.r = n.r.take().map(Self::rotate_r);
        Self::rotate_l(n)
    }




    /**
     * Insert a node with the given key into this sub-tree. Returns false, and
     * leaves the sub-tree untouched, if the key is already present.
     */
    pub(crate) fn insert(node: &mut Option<Box<Self>>, key: K, value: V) -> bool {
        let inserted = if let Some(n) = node {
            match key.cmp(&n.key) {
                Less    => Self::insert(&mut n.l, key, value),
                Greater => Self::insert(&mut n.r, key, value),
                Equal   => false,
            }
        } else {
            *node = Some(Box::new(Self::new(key, value)));
            return true
        };

        if inserted {
            Self::rebalance_after_insert(node, &key)
        }
        inserted
    }




    /**
     * Restore the height and balance of a node on the insertion path. The
     * rotation case is chosen by comparing the inserted key against the key
     * of the child on the heavy side.
     */
    fn rebalance_after_insert(node: &mut Option<Box<Self>>, key: &K) {
        if let Some(mut n) = node.take() {
            n.update_height();

            let bf = n.bf();
            let heavy_key = if bf > 1 {
                n.l.as_ref().map(|l| l.key)
            } else if bf < -1 {
                n.r.as_ref().map(|r| r.key)
            } else {
                None
            };

            *node = Some(match heavy_key.map(|k| key.cmp(&k)) {
                Some(Less) if bf > 1 => {
                    debug!("insert: right rotation");
                    Self::rotate_r(n)
                }
                Some(Greater) if bf > 1 => {
                    debug!("insert: left-right rotation");
                    Self::rotate_lr(n)
                }
                Some(Greater) if bf < -1 => {
                    debug!("insert: left rotation");
                    Self::rotate_l(n)
                }
                Some(Less) if bf < -1 => {
                    debug!("insert: right-left rotation");
                    Self::rotate_rl(n)
                }
                _ => n,
            })
        }
    }




    /**
     * Remove the node with the given key from this sub-tree, returning its
     * key and value. Returns `None`, and leaves the sub-tree untouched, if the
     * key is absent.
     *
     * A node with two children takes over the key and value of its in-order
     * successor, which is then unlinked from the right sub-tree.
     */
    pub(crate) fn remove(node: &mut Option<Box<Self>>, key: &K) -> Option<(K, V)> {
        let removed = if let Some(n) = node {
            match key.cmp(&n.key) {
                Less    => Self::remove(&mut n.l, key),
                Greater => Self::remove(&mut n.r, key),
                Equal   => match (n.l.take(), n.r.take()) {
                    (None, None) => {
                        node.take().map(|n| (n.key, n.value))
                    }
                    (Some(l), None) => {
                        std::mem::replace(node, Some(l)).map(|n| (n.key, n.value))
                    }
                    (None, Some(r)) => {
                        std::mem::replace(node, Some(r)).map(|n| (n.key, n.value))
                    }
                    (Some(l), Some(r)) => {
                        let mut r = Some(r);
                        let successor = Self::take_lmost(&mut r);
                        n.l = Some(l);
                        n.r = r;
                        successor.map(|(k, v)| {
                            (std::mem::replace(&mut n.key, k), std::mem::replace(&mut n.value, v))
                        })
                    }
                }
            }
        } else {
            return None
        };

        if removed.is_some() {
            Self::rebalance_after_remove(node)
        }
        removed
    }




    /**
     * Unlink the left-most node of this sub-tree, returning its key and
     * value. Every node on the path down to it is rebalanced on the way back
     * up, exactly as if that key had been removed with `remove`.
     */
    fn take_lmost(node: &mut Option<Box<Self>>) -> Option<(K, V)> {
        let taken = if let Some(n) = node {
            if n.l.is_some() {
                Self::take_lmost(&mut n.l)
            } else {
                let r = n.r.take();
                return std::mem::replace(node, r).map(|n| (n.key, n.value))
            }
        } else {
            return None
        };

        Self::rebalance_after_remove(node);
        taken
    }




    /**
     * Restore the height and balance of a node on the removal path. There is
     * no inserted key to steer by, so the rotation case is chosen from the
     * balance factor of the child on the heavy side.
     */
    fn rebalance_after_remove(node: &mut Option<Box<Self>>) {
        if let Some(mut n) = node.take() {
            n.update_height();

            let bf = n.bf();

            *node = Some(if bf > 1 {
                if Self::balance_factor(&n.l) >= 0 {
                    debug!("remove: right rotation");
                    Self::rotate_r(n)
                } else {
                    debug!("remove: left-right rotation");
                    Self::rotate_lr(n)
                }
            } else if bf < -1 {
                if Self::balance_factor(&n.r) <= 0 {
                    debug!("remove: left rotation");
                    Self::rotate_l(n)
                } else {
                    debug!("remove: right-left rotation");
                    Self::rotate_rl(n)
                }
            } else {
                n
            })
        }
    }




    /**
     * Return a list of node references forming a path from this node to its
     * leftmost node. This function is to facilitate non-consuming in-order
     * traversal.
     */
    pub(crate) fn lmost_path(&self) -> Vec<&Self> {
        let mut path = vec![self];

        while let Some(l) = path.last().and_then(|b| b.l.as_ref()) {
            path.push(l)
        }
        path
    }




    /**
     * Consume this node and return a list of nodes forming a path from this
     * node to its leftmost node. This function is to facilitate consuming
     * in-order traversal.
     */
    pub(crate) fn into_lmost_path(self) -> Vec<Self> {
        let mut path = vec![self];

        while let Some(l) = path.last_mut().and_then(|n| n.l.take()) {
            path.push(*l)
        }
        path
    }




    /**
     * Panic unless a node and its entire subtree is properly ordered. This
     * function is for testing purposes.
     */
    #[cfg(test)]
    pub(crate) fn validate_order(&self) {
        if self.l.as_ref().map_or(false, |l| l.key >= self.key) ||
           self.r.as_ref().map_or(false, |r| r.key <= self.key) {
            panic!("unordered node")
        }
        if let Some(l) = &self.l {
            l.validate_order()
        }
        if let Some(r) = &self.r {
            r.validate_order()
        }
    }




    /**
     * Panic unless every node stores the true height of its sub-tree, and no
     * node has a balance factor outside of [-1, 1]. This function is for
     * testing purposes.
     */
    #[cfg(test)]
    pub(crate) fn validate_balance(&self) {
        if self.height != self.compute_height() {
            panic!("stored height out of sync with subtree");
        }
        if self.bf().abs() > 1 {
            panic!("unbalanced node (balance factor {})", self.bf());
        }
        if let Some(l) = &self.l {
            l.validate_balance()
        }
        if let Some(r) = &self.r {
            r.validate_balance()
        }
    }




    /**
     * Return the height of this sub-tree by walking it. This *should* be the
     * same as the `height` data member on the node.
     */
    #[cfg(test)]
    fn compute_height(&self) -> usize {
        self.l.as_ref().map_or(0, |l| l.compute_height()).max(
        self.r.as_ref().map_or(0, |r| r.compute_height())) + 1
    }




    /**
     * Utility function enabling in-order consuming traversals, for use by
     * iterators.
     */
    fn next(stack: &mut Vec<Self>) -> Option<Self> {

        /*
         * Pop the last node on the stack (A).
         *
         * If A has a right child (B) then take B and push it onto the stack,
         * followed by the path to its minimum node.
         *
         * Yield A.
         */

        if let Some(mut a) = stack.pop() {
            if let Some(r) = a.r.take() {
                stack.extend(r.into_lmost_path())
            }
            Some(a)
        } else {
            None
        }
    }




    /**
     * Utility function enabling in-order by-reference traversals, for use by
     * iterators.
     */
    fn next_ref<'a>(stack: &mut Vec<&'a Self>) -> Option<&'a Self> {
        if let Some(a) = stack.pop() {
            if let Some(r) = &a.r {
                stack.extend(r.lmost_path())
            }
            Some(a)
        } else {
            None
        }
    }
}




/**
 * Consuming iterator that traverses an entire sub-tree in-order, returning
 * key-value pairs.
 */
pub struct IntoIter<K: Ord + Copy, V> {
    nodes: Vec<Node<K, V>>
}

impl<K: Ord + Copy, V> IntoIter<K, V> {
    pub(crate) fn new(node: Option<Box<Node<K, V>>>) -> Self {
        Self {
            nodes: node.map_or(Vec::new(), |node| node.into_lmost_path())
        }
    }
}

impl<K: Ord + Copy, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        Node::next(&mut self.nodes).map(|n| (n.key, n.value))
    }
}




/**
 * By-reference iterator that traverses an entire sub-tree in-order. It holds
 * only the stack of pending ancestors, so each step is amortized O(1) and
 * the iterator can be abandoned at any point.
 */
pub struct Iter<'a, K: Ord + Copy, V> {
    nodes: Vec<&'a Node<K, V>>
}

impl<'a, K: Ord + Copy, V> Iter<'a, K, V> {
    pub(crate) fn new(node: &'a Option<Box<Node<K, V>>>) -> Self {
        Self {
            nodes: node.as_ref().map_or(Vec::new(), |node| node.lmost_path())
        }
    }
}

impl<'a, K: Ord + Copy, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        Node::next_ref(&mut self.nodes).map(|n| (&n.key, &n.value))
    }
}
