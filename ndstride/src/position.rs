/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Cursors over index positions.
//!
//! A [`PositionIter`] walks the indices of a range whether the range
//! is arithmetic or an arbitrary index sequence. Almost all traversal
//! happens over arithmetic ranges, so that case is stored inline: a
//! current value and a step, advanced with plain integer arithmetic,
//! with no allocation and no dynamic dispatch. Anything else is held
//! behind a boxed [`Cursor`] trait object.
//!
//! The two representations are distinguished by an explicit enum
//! tag:
//!
//! ```text
//! PositionIter
//! ├── Linear { current, step }     inline, Copy-sized
//! └── Dyn(Box<dyn Cursor>)         heap, dynamically dispatched
//! ```
//!
//! Equality between cursors uses [`PositionIter::id`], which is
//! meaningful across representations: the inline case identifies
//! itself by its current value, the boxed case by an address.

use std::fmt;
use std::iter::FusedIterator;
use std::mem;
use std::sync::Arc;

/// A dynamically dispatched cursor over a sequence of indices.
///
/// Implement this to traverse a user-defined index sequence with a
/// [`PositionIter`].
pub trait Cursor: fmt::Debug {
    /// The index `offset` positions ahead of the cursor (behind, if
    /// negative). Does not move the cursor.
    fn value(&self, offset: isize) -> usize;

    /// Move the cursor by `delta` positions.
    fn increase(&mut self, delta: isize);

    /// Clone into a new box.
    fn clone_box(&self) -> Box<dyn Cursor>;

    /// An identity for equality comparison. Two cursors over the same
    /// sequence at the same position must return the same id.
    fn id(&self) -> usize;
}

/// A cursor over a shared index list.
#[derive(Clone, Debug)]
struct IndexListCursor {
    indices: Arc<[usize]>,
    pos: isize,
}

impl Cursor for IndexListCursor {
    fn value(&self, offset: isize) -> usize {
        self.indices[(self.pos + offset) as usize]
    }

    fn increase(&mut self, delta: isize) {
        self.pos += delta;
    }

    fn clone_box(&self) -> Box<dyn Cursor> {
        Box::new(self.clone())
    }

    fn id(&self) -> usize {
        // Address of the current slot; one past the end is still a
        // distinct, stable identity.
        (self.indices.as_ptr() as usize)
            .wrapping_add((self.pos as usize).wrapping_mul(mem::size_of::<usize>()))
    }
}

#[derive(Debug)]
enum Repr {
    Linear { current: isize, step: isize },
    Dyn(Box<dyn Cursor>),
}

/// A random-access cursor over index positions. See the
/// [module documentation](self) for the representation.
#[derive(Debug)]
pub struct PositionIter {
    repr: Repr,
}

impl PositionIter {
    /// An inline cursor over `start, start + step, ...`.
    pub fn linear(start: isize, step: isize) -> Self {
        debug_assert!(step != 0, "cursor step must be nonzero");
        Self {
            repr: Repr::Linear {
                current: start,
                step,
            },
        }
    }

    /// A cursor over `indices`, positioned at `pos`.
    pub fn general(indices: Arc<[usize]>, pos: usize) -> Self {
        Self::from_cursor(Box::new(IndexListCursor {
            indices,
            pos: pos as isize,
        }))
    }

    /// Wrap an arbitrary cursor.
    pub fn from_cursor(cursor: Box<dyn Cursor>) -> Self {
        Self {
            repr: Repr::Dyn(cursor),
        }
    }

    /// Whether this cursor is stored inline.
    pub fn is_inline(&self) -> bool {
        matches!(self.repr, Repr::Linear { .. })
    }

    /// The index `offset` positions ahead, without moving.
    #[inline]
    pub fn value(&self, offset: isize) -> usize {
        match &self.repr {
            Repr::Linear { current, step } => {
                let value = current + step * offset;
                debug_assert!(value >= 0, "cursor produced negative index {}", value);
                value as usize
            }
            Repr::Dyn(cursor) => cursor.value(offset),
        }
    }

    /// Advance by `delta` positions in place.
    #[inline]
    pub fn increase(&mut self, delta: isize) {
        match &mut self.repr {
            Repr::Linear { current, step } => {
                *current += *step * delta;
            }
            Repr::Dyn(cursor) => cursor.increase(delta),
        }
    }

    /// Identity for comparison between cursors of either
    /// representation.
    pub fn id(&self) -> usize {
        match &self.repr {
            Repr::Linear { current, .. } => *current as usize,
            Repr::Dyn(cursor) => cursor.id(),
        }
    }
}

impl Clone for PositionIter {
    fn clone(&self) -> Self {
        let repr = match &self.repr {
            Repr::Linear { current, step } => Repr::Linear {
                current: *current,
                step: *step,
            },
            Repr::Dyn(cursor) => Repr::Dyn(cursor.clone_box()),
        };
        Self { repr }
    }
}

impl PartialEq for PositionIter {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for PositionIter {}

/// A bounded iterator over the indices a [`PositionIter`] visits.
#[derive(Clone, Debug)]
pub struct Positions {
    cursor: PositionIter,
    remaining: usize,
}

impl Positions {
    /// Yield the next `len` indices of `cursor`.
    pub fn new(cursor: PositionIter, len: usize) -> Self {
        Self {
            cursor,
            remaining: len,
        }
    }
}

impl Iterator for Positions {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let value = self.cursor.value(0);
        self.cursor.increase(1);
        self.remaining -= 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        if n >= self.remaining {
            self.remaining = 0;
            return None;
        }
        self.cursor.increase(n as isize);
        self.remaining -= n;
        self.next()
    }
}

impl DoubleEndedIterator for Positions {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.cursor.value(self.remaining as isize))
    }
}

impl ExactSizeIterator for Positions {}

impl FusedIterator for Positions {}

#[cfg(test)]
mod tests {
    use super::*;

    // Visits the squares 0, 1, 4, 9, ...
    #[derive(Clone, Debug)]
    struct Squares {
        n: isize,
    }

    impl Cursor for Squares {
        fn value(&self, offset: isize) -> usize {
            let n = (self.n + offset) as usize;
            n * n
        }

        fn increase(&mut self, delta: isize) {
            self.n += delta;
        }

        fn clone_box(&self) -> Box<dyn Cursor> {
            Box::new(self.clone())
        }

        fn id(&self) -> usize {
            self.n as usize
        }
    }

    #[test]
    fn test_linear_is_inline() {
        let mut it = PositionIter::linear(3, 2);
        assert!(it.is_inline());
        assert_eq!(it.value(0), 3);
        assert_eq!(it.value(2), 7);
        it.increase(3);
        assert_eq!(it.value(0), 9);
        assert_eq!(it.value(-1), 7);
        assert!(it.is_inline());
    }

    #[test]
    fn test_inline_size() {
        // The inline case fits alongside the tag in three words.
        assert!(mem::size_of::<PositionIter>() <= 3 * mem::size_of::<usize>());
    }

    #[test]
    fn test_general_cursor() {
        let indices: Arc<[usize]> = vec![5, 1, 4].into();
        let mut it = PositionIter::general(indices, 0);
        assert!(!it.is_inline());
        assert_eq!(it.value(0), 5);
        assert_eq!(it.value(2), 4);
        it.increase(1);
        assert_eq!(it.value(0), 1);
        assert_eq!(it.value(-1), 5);
    }

    #[test]
    fn test_clone_is_independent() {
        let indices: Arc<[usize]> = vec![5, 1, 4].into();
        let a = PositionIter::general(indices, 0);
        let mut b = a.clone();
        assert_eq!(a, b);
        b.increase(1);
        assert_ne!(a, b);
        assert_eq!(a.value(0), 5);
        assert_eq!(b.value(0), 1);

        let a = PositionIter::linear(0, 1);
        let mut b = a.clone();
        b.increase(1);
        assert_ne!(a, b);
        b.increase(-1);
        assert_eq!(a, b);
    }

    #[test]
    fn test_general_identity_is_per_sequence() {
        // Equal contents, distinct allocations.
        let a = PositionIter::general(vec![0, 1].into(), 0);
        let b = PositionIter::general(vec![0, 1].into(), 0);
        assert_ne!(a, b);

        let shared: Arc<[usize]> = vec![0, 1].into();
        let a = PositionIter::general(Arc::clone(&shared), 1);
        let b = PositionIter::general(shared, 1);
        assert_eq!(a, b);
    }

    #[test]
    fn test_custom_cursor() {
        let mut it = PositionIter::from_cursor(Box::new(Squares { n: 0 }));
        assert_eq!(it.value(3), 9);
        it.increase(2);
        assert_eq!(it.value(0), 4);
        assert!(Positions::new(it, 3).eq([4, 9, 16]));
    }

    #[test]
    fn test_positions() {
        let p = Positions::new(PositionIter::linear(10, -2), 5);
        assert_eq!(p.len(), 5);
        assert!(p.clone().eq([10, 8, 6, 4, 2]));
        assert!(p.clone().rev().eq([2, 4, 6, 8, 10]));

        let mut p = p;
        assert_eq!(p.nth(1), Some(8));
        assert_eq!(p.next_back(), Some(2));
        assert_eq!(p.len(), 2);
        assert_eq!(p.nth(2), None);
        assert_eq!(p.next(), None);
    }
}
