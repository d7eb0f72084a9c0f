/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::fmt;

use crate::range::IndexRange;
use crate::range::LinearRange;

/// One axis of a [`Shape`](crate::Shape): the current range of
/// indices selected along the axis, together with the axis' original
/// (base) extent.
///
/// A dimension whose range is empty is *closed*: the axis has been
/// collapsed to a single index (the range's anchor). A closed
/// dimension still reports `size() == 1` and keeps contributing its
/// anchor to offsets, but it is no longer *active* and takes no part
/// in further selection.
///
/// Dimensions are values. [`select`](Dimension::select),
/// [`close_at`](Dimension::close_at) and [`reset`](Dimension::reset)
/// return new dimensions.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Dimension {
    range: IndexRange,
    base_extent: usize,
}

impl Dimension {
    /// A full axis of the given extent.
    pub fn new(base_extent: usize) -> Self {
        Self {
            range: IndexRange::Linear(LinearRange::full(base_extent)),
            base_extent,
        }
    }

    /// An axis of `base_extent` restricted to `range`.
    pub fn with_range(range: impl Into<IndexRange>, base_extent: usize) -> Self {
        Self {
            range: range.into(),
            base_extent,
        }
    }

    pub fn range(&self) -> &IndexRange {
        &self.range
    }

    /// The extent of the axis before any selection.
    pub fn base_extent(&self) -> usize {
        self.base_extent
    }

    /// The number of positions along the axis; 1 if closed.
    #[inline]
    pub fn size(&self) -> usize {
        self.range.len().max(1)
    }

    /// False once the axis has been closed.
    #[inline]
    pub fn active(&self) -> bool {
        !self.range.is_empty()
    }

    /// True iff the axis spans `0..base_extent` with unit step. An
    /// axis of extent 1 closed at its only index spans it too.
    pub fn complete(&self) -> bool {
        match self.active() {
            true => self.range.complete(self.base_extent),
            false => self.base_extent == 1,
        }
    }

    /// The index along the base axis at position `pos`. A closed
    /// axis answers its anchor for `pos == 0`.
    #[inline]
    pub fn value(&self, pos: usize) -> usize {
        self.range.value(pos)
    }

    /// Narrow the axis by `other`, expressed in this axis' current
    /// positions. An empty `other` closes the axis at the index
    /// `other` is anchored at.
    pub fn select(&self, other: &IndexRange) -> Self {
        if other.is_empty() {
            return self.close_at(other.anchor());
        }
        Self {
            range: self.range.select(other),
            base_extent: self.base_extent,
        }
    }

    /// Collapse the axis to the index at position `pos`.
    pub fn close_at(&self, pos: usize) -> Self {
        Self {
            range: self.range.close_at(pos),
            base_extent: self.base_extent,
        }
    }

    /// The full, unselected axis.
    pub fn reset(&self) -> Self {
        Self::new(self.base_extent)
    }

    /// The length of the unit-step runs the axis tiles into; 1 for a
    /// closed axis.
    pub fn unit_run_length(&self) -> usize {
        if self.active() {
            self.range.unit_run_length()
        } else {
            1
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.active() {
            write!(f, "{}/{}", self.range, self.base_extent)
        } else {
            write!(f, "@{}/{}", self.range.anchor(), self.base_extent)
        }
    }
}
