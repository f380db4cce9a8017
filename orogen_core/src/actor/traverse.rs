// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use super::id::{ActorId, INVALID};
use super::store::SceneTree;

/// An iterator over the direct children of an actor, in paint order.
///
/// Created by [`SceneTree::children`].
#[derive(Debug)]
pub struct Children<'a> {
    tree: &'a SceneTree,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(tree: &'a SceneTree, first: u32) -> Self {
        Self {
            tree,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = ActorId;

    fn next(&mut self) -> Option<ActorId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.tree.next_sibling[idx as usize];
        Some(ActorId {
            idx,
            generation: self.tree.generation[idx as usize],
        })
    }
}

/// An iterator over raw child slot indices, in paint order.
///
/// Created by [`SceneTree::children_at`]; skips generation checks the same
/// way the `*_at` accessors do, for use in render traversals.
#[derive(Debug)]
pub struct RawChildren<'a> {
    tree: &'a SceneTree,
    current: u32,
}

impl<'a> RawChildren<'a> {
    pub(crate) fn new(tree: &'a SceneTree, first: u32) -> Self {
        Self {
            tree,
            current: first,
        }
    }
}

impl Iterator for RawChildren<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.tree.next_sibling[idx as usize];
        Some(idx)
    }
}
