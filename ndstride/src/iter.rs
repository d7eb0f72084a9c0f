/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Iteration over the logical elements of a [`Shape`].
//!
//! All iterators here track a *logical* position and resolve the
//! physical offset with [`Shape::at`] whenever an element is
//! accessed. The offset is never cached or advanced incrementally:
//! once an axis is strided or gathered, the offset is not an affine
//! function of the logical position.

use std::iter::FusedIterator;

use crate::shape::Shape;

/// A random-access handle on one logical position of a shape.
///
/// Moving a cursor changes only its logical position. Two in-range
/// cursors compare equal when they resolve to the same physical
/// offset, even if they reached it by different logical positions
/// (possible with repeated indices). Cursors past the end compare by
/// logical position.
#[derive(Clone, Copy, Debug)]
pub struct ShapeCursor<'a> {
    shape: &'a Shape,
    pos: usize,
}

impl<'a> ShapeCursor<'a> {
    pub fn new(shape: &'a Shape, pos: usize) -> Self {
        Self { shape, pos }
    }

    /// The first position of `shape`.
    pub fn begin(shape: &'a Shape) -> Self {
        Self::new(shape, 0)
    }

    /// One past the last position of `shape`.
    pub fn end(shape: &'a Shape) -> Self {
        Self::new(shape, shape.size())
    }

    /// The logical position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// The physical offset of the current position.
    pub fn offset(&self) -> usize {
        self.shape.at(self.pos)
    }

    /// Move by `delta` logical positions.
    pub fn advance(&mut self, delta: isize) {
        self.pos = self.pos.wrapping_add_signed(delta);
    }

    /// A cursor `delta` logical positions away.
    pub fn offset_by(mut self, delta: isize) -> Self {
        self.advance(delta);
        self
    }

    /// The signed logical distance from `other` to `self`.
    pub fn distance(&self, other: &ShapeCursor<'_>) -> isize {
        self.pos as isize - other.pos as isize
    }

    /// The element of `data` under the cursor.
    ///
    /// # Panics
    ///
    /// Panics if the cursor is out of range or `data` is shorter than
    /// the shape's [`base_size`](Shape::base_size).
    pub fn get<'b, T>(&self, data: &'b [T]) -> &'b T {
        &data[self.offset()]
    }

    /// The element of `data` under the cursor, mutably. Panics as
    /// [`get`](ShapeCursor::get) does.
    pub fn get_mut<'b, T>(&self, data: &'b mut [T]) -> &'b mut T {
        &mut data[self.offset()]
    }

    fn in_range(&self) -> bool {
        self.pos < self.shape.size()
    }
}

impl PartialEq for ShapeCursor<'_> {
    fn eq(&self, other: &Self) -> bool {
        if self.in_range() && other.in_range() {
            self.offset() == other.offset()
        } else {
            self.pos == other.pos
        }
    }
}

/// The physical offsets of a shape's logical positions, in order.
#[derive(Clone, Debug)]
pub struct Offsets<'a> {
    shape: &'a Shape,
    front: usize,
    back: usize,
}

impl<'a> Offsets<'a> {
    pub fn new(shape: &'a Shape) -> Self {
        Self {
            shape,
            front: 0,
            back: shape.size(),
        }
    }
}

impl Iterator for Offsets<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        let offset = self.shape.at(self.front);
        self.front += 1;
        Some(offset)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;
        (len, Some(len))
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.front = self.front.saturating_add(n).min(self.back);
        self.next()
    }
}

impl DoubleEndedIterator for Offsets<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        Some(self.shape.at(self.back))
    }
}

impl ExactSizeIterator for Offsets<'_> {}

impl FusedIterator for Offsets<'_> {}

/// The elements of a buffer viewed through a shape, in logical order.
#[derive(Clone, Debug)]
pub struct ShapeIter<'a, T> {
    data: &'a [T],
    offsets: Offsets<'a>,
}

impl<'a, T> ShapeIter<'a, T> {
    /// Iterate over `data` through `shape`. The length of `data` is
    /// not checked here: iteration panics on the first offset past its
    /// end. See [`Shaped::new`](crate::Shaped::new) for the checked
    /// construction.
    pub fn new(shape: &'a Shape, data: &'a [T]) -> Self {
        Self {
            data,
            offsets: Offsets::new(shape),
        }
    }
}

impl<'a, T> Iterator for ShapeIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.offsets.next().map(|offset| &self.data[offset])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.offsets.size_hint()
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.offsets.nth(n).map(|offset| &self.data[offset])
    }
}

impl<T> DoubleEndedIterator for ShapeIter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.offsets.next_back().map(|offset| &self.data[offset])
    }
}

impl<T> ExactSizeIterator for ShapeIter<'_, T> {}

impl<T> FusedIterator for ShapeIter<'_, T> {}
