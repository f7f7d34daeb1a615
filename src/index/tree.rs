//! Order-Statistics Tree
//!
//! Arena-allocated AVL tree augmented with subtree sizes.
//!
//! ```text
//!                 [player3 | 150]  size=3
//!                 /              \
//!   [player1 | 100, t=..69]    [player2 | 100, t=..70]
//!          size=1                      size=1
//! ```
//!
//! Entries are ordered by position: composite key descending, then player
//! identifier descending. In-order position is the 0-based rank, and every
//! rank query walks subtree sizes instead of scanning:
//! - `insert` / `remove`: O(log n)
//! - `rank`: O(log n)
//! - `range(start, end)`: O(log n + (end - start))
//!
//! Nodes live in a `Vec` and refer to each other by index; removed slots
//! go on a free list and are reused by later inserts.

use std::cmp::Ordering;

use crate::core::key::CompositeKey;
use super::player::PlayerId;

/// Index of a node inside the arena.
type NodeIdx = usize;

#[derive(Debug, Clone)]
struct Node {
    key: CompositeKey,
    player_id: PlayerId,
    left: Option<NodeIdx>,
    right: Option<NodeIdx>,
    height: u8,
    size: usize,
}

/// Compare two positions. `Less` means `(key, id)` ranks ahead of `(other_key, other_id)`.
#[inline]
fn position_cmp(key: CompositeKey, id: &str, other_key: CompositeKey, other_id: &str) -> Ordering {
    other_key.cmp(&key).then_with(|| other_id.cmp(id))
}

/// One entry yielded by a rank walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeEntry<'a> {
    /// 0-based descending rank.
    pub rank: usize,
    /// Player at this rank.
    pub player_id: &'a PlayerId,
    /// Player's current key.
    pub key: CompositeKey,
}

/// Size-augmented AVL tree over (key desc, id desc) positions.
#[derive(Debug, Clone, Default)]
pub struct OrderTree {
    nodes: Vec<Node>,
    free: Vec<NodeIdx>,
    root: Option<NodeIdx>,
}

impl OrderTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty tree with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            free: Vec::new(),
            root: None,
        }
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.size(self.root)
    }

    /// Is empty?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Drop every entry and release the arena.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.root = None;
    }

    /// Insert a position. Returns `false` if that exact position already exists.
    pub fn insert(&mut self, key: CompositeKey, player_id: &PlayerId) -> bool {
        let mut inserted = false;
        let root = self.insert_at(self.root, key, player_id, &mut inserted);
        self.root = Some(root);
        inserted
    }

    /// Remove a position. Returns `false` if it was not present.
    pub fn remove(&mut self, key: CompositeKey, player_id: &str) -> bool {
        let mut removed = None;
        self.root = self.remove_at(self.root, key, player_id, &mut removed);
        match removed {
            Some(idx) => {
                self.free.push(idx);
                true
            }
            None => false,
        }
    }

    /// 0-based rank of a position, or `None` if absent.
    pub fn rank(&self, key: CompositeKey, player_id: &str) -> Option<usize> {
        let mut node = self.root;
        let mut rank = 0;
        while let Some(idx) = node {
            let n = &self.nodes[idx];
            match position_cmp(key, player_id, n.key, n.player_id.as_str()) {
                Ordering::Less => node = n.left,
                Ordering::Greater => {
                    rank += self.size(n.left) + 1;
                    node = n.right;
                }
                Ordering::Equal => return Some(rank + self.size(n.left)),
            }
        }
        None
    }

    /// Entry at a given rank.
    pub fn select(&self, rank: usize) -> Option<TreeEntry<'_>> {
        self.range(rank, rank).next()
    }

    /// Walk ranks `[start, end]` inclusive, highest key first.
    ///
    /// `end` is clamped to the last rank. Empty if `start > end` or
    /// `start` is past the end.
    pub fn range(&self, start: usize, end: usize) -> RankRange<'_> {
        let len = self.len();
        if start > end || start >= len {
            return RankRange::empty(self);
        }
        let end = end.min(len - 1);
        RankRange {
            tree: self,
            stack: self.seek(start),
            next_rank: start,
            remaining: end - start + 1,
        }
    }

    /// Walk every entry in rank order.
    pub fn iter(&self) -> RankRange<'_> {
        self.range(0, usize::MAX)
    }

    /// Verify AVL balance, subtree sizes and position order.
    ///
    /// Returns the entry count on success.
    pub fn check(&self) -> Result<usize, String> {
        let (_, size) = self.check_node(self.root)?;
        let mut prev: Option<TreeEntry<'_>> = None;
        for entry in self.iter() {
            if let Some(p) = prev {
                if position_cmp(p.key, p.player_id.as_str(), entry.key, entry.player_id.as_str())
                    != Ordering::Less
                {
                    return Err(format!(
                        "rank {} ({}) not ahead of rank {} ({})",
                        p.rank, p.player_id, entry.rank, entry.player_id
                    ));
                }
            }
            prev = Some(entry);
        }
        let live = self.nodes.len() - self.free.len();
        if live != size {
            return Err(format!("{live} live slots but {size} reachable nodes"));
        }
        Ok(size)
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    #[inline]
    fn size(&self, node: Option<NodeIdx>) -> usize {
        node.map_or(0, |idx| self.nodes[idx].size)
    }

    #[inline]
    fn height(&self, node: Option<NodeIdx>) -> u8 {
        node.map_or(0, |idx| self.nodes[idx].height)
    }

    #[inline]
    fn balance(&self, idx: NodeIdx) -> i16 {
        let n = &self.nodes[idx];
        self.height(n.left) as i16 - self.height(n.right) as i16
    }

    fn alloc(&mut self, key: CompositeKey, player_id: &PlayerId) -> NodeIdx {
        let node = Node {
            key,
            player_id: player_id.clone(),
            left: None,
            right: None,
            height: 1,
            size: 1,
        };
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn update(&mut self, idx: NodeIdx) {
        let (left, right) = (self.nodes[idx].left, self.nodes[idx].right);
        let height = 1 + self.height(left).max(self.height(right));
        let size = 1 + self.size(left) + self.size(right);
        let n = &mut self.nodes[idx];
        n.height = height;
        n.size = size;
    }

    fn rotate_right(&mut self, idx: NodeIdx) -> NodeIdx {
        let Some(pivot) = self.nodes[idx].left else {
            return idx;
        };
        self.nodes[idx].left = self.nodes[pivot].right;
        self.update(idx);
        self.nodes[pivot].right = Some(idx);
        self.update(pivot);
        pivot
    }

    fn rotate_left(&mut self, idx: NodeIdx) -> NodeIdx {
        let Some(pivot) = self.nodes[idx].right else {
            return idx;
        };
        self.nodes[idx].right = self.nodes[pivot].left;
        self.update(idx);
        self.nodes[pivot].left = Some(idx);
        self.update(pivot);
        pivot
    }

    /// Refresh cached height/size and restore the AVL property at `idx`.
    fn rebalance(&mut self, idx: NodeIdx) -> NodeIdx {
        self.update(idx);
        let balance = self.balance(idx);
        if balance > 1 {
            if let Some(left) = self.nodes[idx].left {
                if self.balance(left) < 0 {
                    let new_left = self.rotate_left(left);
                    self.nodes[idx].left = Some(new_left);
                }
            }
            return self.rotate_right(idx);
        }
        if balance < -1 {
            if let Some(right) = self.nodes[idx].right {
                if self.balance(right) > 0 {
                    let new_right = self.rotate_right(right);
                    self.nodes[idx].right = Some(new_right);
                }
            }
            return self.rotate_left(idx);
        }
        idx
    }

    fn insert_at(
        &mut self,
        node: Option<NodeIdx>,
        key: CompositeKey,
        player_id: &PlayerId,
        inserted: &mut bool,
    ) -> NodeIdx {
        let Some(idx) = node else {
            *inserted = true;
            return self.alloc(key, player_id);
        };
        let n = &self.nodes[idx];
        let (left, right) = (n.left, n.right);
        match position_cmp(key, player_id.as_str(), n.key, n.player_id.as_str()) {
            Ordering::Less => {
                let child = self.insert_at(left, key, player_id, inserted);
                self.nodes[idx].left = Some(child);
            }
            Ordering::Greater => {
                let child = self.insert_at(right, key, player_id, inserted);
                self.nodes[idx].right = Some(child);
            }
            Ordering::Equal => return idx,
        }
        self.rebalance(idx)
    }

    fn remove_at(
        &mut self,
        node: Option<NodeIdx>,
        key: CompositeKey,
        player_id: &str,
        removed: &mut Option<NodeIdx>,
    ) -> Option<NodeIdx> {
        let idx = node?;
        let n = &self.nodes[idx];
        let (left, right) = (n.left, n.right);
        match position_cmp(key, player_id, n.key, n.player_id.as_str()) {
            Ordering::Less => {
                let child = self.remove_at(left, key, player_id, removed);
                self.nodes[idx].left = child;
            }
            Ordering::Greater => {
                let child = self.remove_at(right, key, player_id, removed);
                self.nodes[idx].right = child;
            }
            Ordering::Equal => {
                *removed = Some(idx);
                return match (left, right) {
                    (None, None) => None,
                    (Some(child), None) | (None, Some(child)) => Some(child),
                    (Some(left), Some(right)) => {
                        // Successor takes this node's place
                        let (new_right, successor) = self.take_min(right);
                        self.nodes[successor].left = Some(left);
                        self.nodes[successor].right = new_right;
                        Some(self.rebalance(successor))
                    }
                };
            }
        }
        Some(self.rebalance(idx))
    }

    /// Detach the leftmost node of a subtree. Returns (new subtree root, detached node).
    fn take_min(&mut self, idx: NodeIdx) -> (Option<NodeIdx>, NodeIdx) {
        match self.nodes[idx].left {
            None => (self.nodes[idx].right, idx),
            Some(left) => {
                let (new_left, min) = self.take_min(left);
                self.nodes[idx].left = new_left;
                (Some(self.rebalance(idx)), min)
            }
        }
    }

    /// Path stack positioned so the next pop yields rank `k`.
    fn seek(&self, mut k: usize) -> Vec<NodeIdx> {
        let mut stack = Vec::with_capacity(self.height(self.root) as usize);
        let mut node = self.root;
        while let Some(idx) = node {
            let n = &self.nodes[idx];
            let left = self.size(n.left);
            match k.cmp(&left) {
                Ordering::Less => {
                    stack.push(idx);
                    node = n.left;
                }
                Ordering::Equal => {
                    stack.push(idx);
                    break;
                }
                Ordering::Greater => {
                    k -= left + 1;
                    node = n.right;
                }
            }
        }
        stack
    }

    fn check_node(&self, node: Option<NodeIdx>) -> Result<(u8, usize), String> {
        let Some(idx) = node else {
            return Ok((0, 0));
        };
        let n = &self.nodes[idx];
        let (lh, ls) = self.check_node(n.left)?;
        let (rh, rs) = self.check_node(n.right)?;
        if (lh as i16 - rh as i16).abs() > 1 {
            return Err(format!("node {} unbalanced ({lh} vs {rh})", n.player_id));
        }
        if n.height != 1 + lh.max(rh) {
            return Err(format!("node {} caches height {}", n.player_id, n.height));
        }
        if n.size != 1 + ls + rs {
            return Err(format!(
                "node {} caches size {} but subtree holds {}",
                n.player_id,
                n.size,
                1 + ls + rs
            ));
        }
        Ok((n.height, n.size))
    }
}

/// In-order walk over a contiguous rank window.
pub struct RankRange<'a> {
    tree: &'a OrderTree,
    stack: Vec<NodeIdx>,
    next_rank: usize,
    remaining: usize,
}

impl<'a> RankRange<'a> {
    fn empty(tree: &'a OrderTree) -> Self {
        Self {
            tree,
            stack: Vec::new(),
            next_rank: 0,
            remaining: 0,
        }
    }
}

impl<'a> Iterator for RankRange<'a> {
    type Item = TreeEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let idx = self.stack.pop()?;
        let tree: &'a OrderTree = self.tree;
        let nodes = &tree.nodes;
        let mut child = nodes[idx].right;
        while let Some(c) = child {
            self.stack.push(c);
            child = nodes[c].left;
        }
        let entry = TreeEntry {
            rank: self.next_rank,
            player_id: &nodes[idx].player_id,
            key: nodes[idx].key,
        };
        self.next_rank += 1;
        self.remaining -= 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for RankRange<'_> {}

// =============================================================================
// TESTS
// =============================================================================
