//! Generic AVL tree
//!
//! Nodes are owned through `Option<Box<Node>>` links from parent to child
//! only. Insertion descends recursively and rebalances every ancestor on the
//! way back up; rotations only ever touch the local subtree, so no parent
//! pointers are needed.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

type Link<K, V> = Option<Box<Node<K, V>>>;

struct Node<K, V> {
    key: K,
    value: V,
    height: i32,
    left: Link<K, V>,
    right: Link<K, V>,
}

impl<K, V> Node<K, V> {
    fn leaf(key: K, value: V) -> Self {
        Self {
            key,
            value,
            height: 1,
            left: None,
            right: None,
        }
    }

    fn update_height(&mut self) {
        self.height = 1 + height(&self.left).max(height(&self.right));
    }

    fn balance(&self) -> i32 {
        height(&self.left) - height(&self.right)
    }
}

#[inline]
fn height<K, V>(link: &Link<K, V>) -> i32 {
    link.as_ref().map_or(0, |n| n.height)
}

fn rotate_right<K, V>(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
    let Some(mut new_root) = node.left.take() else {
        return node;
    };
    node.left = new_root.right.take();
    node.update_height();
    new_root.right = Some(node);
    new_root.update_height();
    new_root
}

fn rotate_left<K, V>(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
    let Some(mut new_root) = node.right.take() else {
        return node;
    };
    node.right = new_root.left.take();
    node.update_height();
    new_root.left = Some(node);
    new_root.update_height();
    new_root
}

/// Which way insertion went at a given node.
///
/// Comparing the new key against a child's key is the same as asking which
/// way the descent turned at that child, and rotations below an unbalanced
/// node never happen on the same insertion, so this is what the rebalance
/// cases test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Descent {
    Created,
    Left,
    Right,
}

fn rebalance<K, V>(mut node: Box<Node<K, V>>, below: Descent) -> Box<Node<K, V>> {
    let balance = node.balance();

    if balance > 1 {
        match below {
            // Left-Left
            Descent::Left => return rotate_right(node),
            // Left-Right
            Descent::Right => {
                node.left = node.left.take().map(rotate_left);
                return rotate_right(node);
            }
            Descent::Created => {}
        }
    }

    if balance < -1 {
        match below {
            // Right-Right
            Descent::Right => return rotate_left(node),
            // Right-Left
            Descent::Left => {
                node.right = node.right.take().map(rotate_right);
                return rotate_left(node);
            }
            Descent::Created => {}
        }
    }

    node
}

fn insert_node<K: Ord, V>(
    slot: &mut Link<K, V>,
    key: K,
    value: V,
) -> Result<Descent, DuplicateKey<K>> {
    let Some(node) = slot.as_mut() else {
        *slot = Some(Box::new(Node::leaf(key, value)));
        return Ok(Descent::Created);
    };

    let (went, below) = match key.cmp(&node.key) {
        Ordering::Less => (Descent::Left, insert_node(&mut node.left, key, value)?),
        Ordering::Greater => (Descent::Right, insert_node(&mut node.right, key, value)?),
        Ordering::Equal => return Err(DuplicateKey { key }),
    };

    node.update_height();
    let balance = node.balance();

    if !(-1..=1).contains(&balance) {
        if let Some(owned) = slot.take() {
            *slot = Some(rebalance(owned, below));
        }
    }

    Ok(went)
}

fn preorder<K, V, F: FnMut(&K, &V)>(link: &Link<K, V>, visit: &mut F) {
    if let Some(node) = link {
        visit(&node.key, &node.value);
        preorder(&node.left, visit);
        preorder(&node.right, visit);
    }
}

fn inorder<K, V, F: FnMut(&K, &V)>(link: &Link<K, V>, visit: &mut F) {
    if let Some(node) = link {
        inorder(&node.left, visit);
        visit(&node.key, &node.value);
        inorder(&node.right, visit);
    }
}

fn postorder<K, V, F: FnMut(&K, &V)>(link: &Link<K, V>, visit: &mut F) {
    if let Some(node) = link {
        postorder(&node.left, visit);
        postorder(&node.right, visit);
        visit(&node.key, &node.value);
    }
}

fn drain_postorder<K, V, F: FnMut(K, V)>(link: Link<K, V>, visit: &mut F) {
    if let Some(node) = link {
        let Node {
            key,
            value,
            left,
            right,
            ..
        } = *node;
        drain_postorder(left, visit);
        drain_postorder(right, visit);
        visit(key, value);
    }
}

/// Returned when inserting a key that is already present
///
/// The tree is left untouched and the rejected key is handed back.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("key {key:?} already present")]
pub struct DuplicateKey<K> {
    pub key: K,
}

/// A broken structural invariant found by [`AvlTree::check_invariants`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("node {key} is unbalanced: left height {left}, right height {right}")]
    Unbalanced { key: String, left: i32, right: i32 },

    #[error("node {key} caches height {cached}, actual height is {actual}")]
    StaleHeight { key: String, cached: i32, actual: i32 },

    #[error("node {key} is out of order relative to an ancestor")]
    OutOfOrder { key: String },

    #[error("tree reports {reported} entries but holds {actual}")]
    LengthMismatch { reported: usize, actual: usize },
}

/// An AVL-balanced binary search tree
pub struct AvlTree<K, V> {
    root: Link<K, V>,
    len: usize,
}

impl<K, V> Default for AvlTree<K, V> {
    fn default() -> Self {
        Self { root: None, len: 0 }
    }
}

impl<K, V> AvlTree<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Height of the root node, 0 for an empty tree
    pub fn height(&self) -> i32 {
        height(&self.root)
    }

    /// Visit every entry, node before children
    pub fn traverse_preorder<F: FnMut(&K, &V)>(&self, mut visit: F) {
        preorder(&self.root, &mut visit);
    }

    /// Visit every entry in ascending key order
    pub fn traverse_inorder<F: FnMut(&K, &V)>(&self, mut visit: F) {
        inorder(&self.root, &mut visit);
    }

    /// Visit every entry, children before node
    pub fn traverse_postorder<F: FnMut(&K, &V)>(&self, mut visit: F) {
        postorder(&self.root, &mut visit);
    }

    /// Tear the tree down in postorder, handing each entry to `visit`
    ///
    /// Both children of a node are released before the node itself.
    pub fn into_postorder<F: FnMut(K, V)>(self, mut visit: F) {
        drain_postorder(self.root, &mut visit);
    }

    /// In-order iterator over entries
    pub fn iter(&self) -> Iter<'_, K, V> {
        let mut iter = Iter {
            stack: Vec::with_capacity(self.height().max(0) as usize),
            remaining: self.len,
        };
        iter.push_left(&self.root);
        iter
    }
}

impl<K: Ord, V> AvlTree<K, V> {
    /// Insert a new entry, rebalancing on the way back to the root
    ///
    /// An existing key is never overwritten; the attempt is reported as
    /// [`DuplicateKey`] and the tree is unchanged.
    pub fn insert(&mut self, key: K, value: V) -> Result<(), DuplicateKey<K>> {
        insert_node(&mut self.root, key, value)?;
        self.len += 1;
        Ok(())
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get_key_value(key).map(|(_, v)| v)
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut cursor = self.root.as_deref();
        while let Some(node) = cursor {
            match key.cmp(node.key.borrow()) {
                Ordering::Less => cursor = node.left.as_deref(),
                Ordering::Greater => cursor = node.right.as_deref(),
                Ordering::Equal => return Some((&node.key, &node.value)),
            }
        }
        None
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut cursor = self.root.as_deref_mut();
        while let Some(node) = cursor {
            match key.cmp(node.key.borrow()) {
                Ordering::Less => cursor = node.left.as_deref_mut(),
                Ordering::Greater => cursor = node.right.as_deref_mut(),
                Ordering::Equal => return Some(&mut node.value),
            }
        }
        None
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get_key_value(key).is_some()
    }
}

impl<K: Ord + fmt::Debug, V> AvlTree<K, V> {
    /// Walk the whole tree and verify balance, cached heights and key order
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let mut count = 0;
        check_subtree(&self.root, None, None, &mut count)?;
        if count != self.len {
            return Err(InvariantViolation::LengthMismatch {
                reported: self.len,
                actual: count,
            });
        }
        Ok(())
    }
}

fn check_subtree<K: Ord + fmt::Debug, V>(
    link: &Link<K, V>,
    lower: Option<&K>,
    upper: Option<&K>,
    count: &mut usize,
) -> Result<i32, InvariantViolation> {
    let Some(node) = link else {
        return Ok(0);
    };
    *count += 1;

    let below_lower = lower.is_some_and(|lo| node.key <= *lo);
    let above_upper = upper.is_some_and(|hi| node.key >= *hi);
    if below_lower || above_upper {
        return Err(InvariantViolation::OutOfOrder {
            key: format!("{:?}", node.key),
        });
    }

    let left = check_subtree(&node.left, lower, Some(&node.key), count)?;
    let right = check_subtree(&node.right, Some(&node.key), upper, count)?;

    if (left - right).abs() > 1 {
        return Err(InvariantViolation::Unbalanced {
            key: format!("{:?}", node.key),
            left,
            right,
        });
    }

    let actual = 1 + left.max(right);
    if node.height != actual {
        return Err(InvariantViolation::StaleHeight {
            key: format!("{:?}", node.key),
            cached: node.height,
            actual,
        });
    }

    Ok(actual)
}

/// In-order iterator over an [`AvlTree`]
pub struct Iter<'a, K, V> {
    stack: Vec<&'a Node<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    fn push_left(&mut self, mut link: &'a Link<K, V>) {
        while let Some(node) = link {
            self.stack.push(node);
            link = &node.left;
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left(&node.right);
        self.remaining = self.remaining.saturating_sub(1);
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<'a, K, V> IntoIterator for &'a AvlTree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
