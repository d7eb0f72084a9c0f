/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::fmt;

use itertools::Itertools;

use crate::dimension::Dimension;
use crate::iter::Offsets;
use crate::iter::ShapeIter;
use crate::parse::ParseError;
use crate::range::GeneralRange;
use crate::range::IndexRange;
use crate::range::LinearRange;

// Axes are never removed: closing an axis keeps its dimension, which
// remembers the index it was closed at.

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ShapeError {
    #[error("axis {axis} has zero extent")]
    ZeroExtent { axis: usize },

    #[error("{got} selectors for {active} active axes")]
    TooManySelectors { got: usize, active: usize },

    #[error("index {index} out of range for axis {axis} of size {size}")]
    IndexOutOfRange {
        index: usize,
        axis: usize,
        size: usize,
    },

    #[error("position {pos} out of range {size}")]
    PositionOutOfRange { pos: usize, size: usize },

    #[error("selector {selector} out of range for axis {axis} of size {size}")]
    SelectorOutOfRange {
        selector: Selector,
        axis: usize,
        size: usize,
    },

    #[error("selector {selector} for axis {axis} has a zero step")]
    ZeroStep { selector: Selector, axis: usize },

    #[error("empty selector {selector} for axis {axis}")]
    EmptyRange { selector: Selector, axis: usize },

    #[error("invalid dims: expected {expected}, got {got}")]
    InvalidDims { expected: usize, got: usize },

    #[error("no active axis to close")]
    NoActiveAxis,

    #[error("buffer of {len} elements is smaller than base size {base_size}")]
    BufferTooSmall { len: usize, base_size: usize },

    #[error(transparent)]
    ParseError(#[from] ParseError),
}

/// A shape is an ordered list of [`Dimension`]s, most significant
/// axis first, describing a logical view over a flat buffer.
///
/// The physical offset of a logical position is computed as a
/// mixed-radix number whose radices are the axes' *base* extents and
/// whose digits are the axes' range-mapped indices:
///
/// ```text
/// offset = (..((d₀ × e₁ + d₁) × e₂ + d₂) ..) × eₙ₋₁ + dₙ₋₁
/// dₖ     = range_k(iₖ)
/// ```
///
/// where `eₖ` is the base extent of axis `k` and `iₖ` is the logical
/// index along that axis. Because each digit goes through the axis'
/// range, any per-axis slicing, striding, reversal or gathering is
/// expressed without changing the offset computation.
///
/// ```
/// # use ndstride::shape;
/// let s = shape![2, 3, 4];
/// assert_eq!(s.size(), 24);
/// assert_eq!(s.at(13), 13);
///
/// let s = s.sub_shape(&[1.into()]).unwrap();
/// assert_eq!(s.size(), 12);
/// assert_eq!(s.at(0), 12);
/// assert_eq!(s.at(4), 16);
/// ```
///
/// Shapes are values: every narrowing operation returns a new shape
/// and leaves `self` untouched. The number of axes never changes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Shape {
    dims: Vec<Dimension>,
}

impl Shape {
    /// A full shape over the given axis extents. Every extent must be
    /// positive.
    pub fn new(extents: impl Into<Vec<usize>>) -> Result<Self, ShapeError> {
        let extents = extents.into();
        if let Some(axis) = extents.iter().position(|&e| e == 0) {
            return Err(ShapeError::ZeroExtent { axis });
        }
        Ok(Self {
            dims: extents.into_iter().map(Dimension::new).collect(),
        })
    }

    /// Build a shape directly from dimensions.
    pub fn from_dims(dims: Vec<Dimension>) -> Self {
        Self { dims }
    }

    /// The zero-axis shape of a single element.
    pub fn unity() -> Self {
        Self { dims: Vec::new() }
    }

    pub fn dims(&self) -> &[Dimension] {
        &self.dims
    }

    /// The number of axes, active or closed.
    pub fn num_dim(&self) -> usize {
        self.dims.len()
    }

    /// The number of axes that have not been closed.
    pub fn num_active(&self) -> usize {
        self.dims.iter().filter(|d| d.active()).count()
    }

    /// The number of logical elements.
    pub fn size(&self) -> usize {
        self.dims.iter().map(Dimension::size).product()
    }

    /// The number of elements of the unselected base shape.
    pub fn base_size(&self) -> usize {
        self.dims.iter().map(Dimension::base_extent).product()
    }

    /// The visible extents: one entry per active axis.
    pub fn extents(&self) -> Vec<usize> {
        self.dims
            .iter()
            .filter(|d| d.active())
            .map(Dimension::size)
            .collect()
    }

    /// The physical offset of the logical position `pos`.
    ///
    /// `pos` is decoded against the visible extents into one digit
    /// per active axis, least significant axis last; a closed axis
    /// consumes no digit and contributes its anchor. The offset is a
    /// bijection between `0..size()` and the selected sub-grid when
    /// every axis range is injective.
    ///
    /// This is the unchecked hot path: `pos` must be below `size()`.
    /// See [`get`](Shape::get) for the checked variant.
    #[inline]
    pub fn at(&self, pos: usize) -> usize {
        debug_assert!(
            pos < self.size(),
            "position {} out of range {}",
            pos,
            self.size()
        );
        let mut rest = pos;
        let mut offset = 0;
        let mut radix = 1;
        for dim in self.dims.iter().rev() {
            let digit = if dim.active() {
                let size = dim.size();
                let digit = rest % size;
                rest /= size;
                digit
            } else {
                0
            };
            offset += dim.value(digit) * radix;
            radix *= dim.base_extent();
        }
        offset
    }

    /// Checked [`at`](Shape::at).
    pub fn get(&self, pos: usize) -> Result<usize, ShapeError> {
        let size = self.size();
        if pos >= size {
            return Err(ShapeError::PositionOutOfRange { pos, size });
        }
        Ok(self.at(pos))
    }

    /// The physical offset of a multi-index with one coordinate per
    /// active axis.
    pub fn offset_of(&self, coord: &[usize]) -> Result<usize, ShapeError> {
        let active = self.num_active();
        if coord.len() != active {
            return Err(ShapeError::InvalidDims {
                expected: active,
                got: coord.len(),
            });
        }
        let mut coord = coord.iter().copied();
        let mut offset = 0;
        for (axis, dim) in self.dims.iter().enumerate() {
            let digit = match dim.active() {
                true => coord.next().unwrap_or_default(),
                false => 0,
            };
            if digit >= dim.size() {
                return Err(ShapeError::IndexOutOfRange {
                    index: digit,
                    axis,
                    size: dim.size(),
                });
            }
            offset = offset * dim.base_extent() + dim.value(digit);
        }
        Ok(offset)
    }

    /// Narrow the shape by one selector per active axis, in axis
    /// order. Closed axes are skipped and consume no selector; axes
    /// beyond the last selector are left as they are.
    ///
    /// Selectors are validated against the current axis sizes; an
    /// out-of-range or empty selector fails the whole selection.
    pub fn sub_shape(&self, selectors: &[Selector]) -> Result<Self, ShapeError> {
        let active = self.num_active();
        if selectors.len() > active {
            return Err(ShapeError::TooManySelectors {
                got: selectors.len(),
                active,
            });
        }
        let mut selectors = selectors.iter();
        let mut dims = Vec::with_capacity(self.dims.len());
        for (axis, dim) in self.dims.iter().enumerate() {
            let selector = match dim.active() {
                true => selectors.next(),
                false => None,
            };
            let dim = match selector {
                Some(selector) => match selector.resolve(axis, dim.size())? {
                    Some(range) => dim.select(&range),
                    None => dim.clone(),
                },
                None => dim.clone(),
            };
            dims.push(dim);
        }
        Ok(Self { dims })
    }

    /// [`sub_shape`](Shape::sub_shape) with selectors parsed from the
    /// textual syntax of [`Selector::parse_list`].
    ///
    /// ```
    /// # use ndstride::shape;
    /// let s = shape![2, 3, 4].select_str("1, 1:3, 2").unwrap();
    /// assert_eq!(s.offsets().collect::<Vec<_>>(), vec![18, 22]);
    /// ```
    pub fn select_str(&self, selectors: &str) -> Result<Self, ShapeError> {
        self.sub_shape(&Selector::parse_list(selectors)?)
    }

    /// Close the first active axis at position `pos`, as for
    /// single-index element access.
    pub fn close_at(&self, pos: usize) -> Result<Self, ShapeError> {
        let axis = self
            .dims
            .iter()
            .position(Dimension::active)
            .ok_or(ShapeError::NoActiveAxis)?;
        let size = self.dims[axis].size();
        if pos >= size {
            return Err(ShapeError::IndexOutOfRange {
                index: pos,
                axis,
                size,
            });
        }
        let mut dims = self.dims.clone();
        dims[axis] = dims[axis].close_at(pos);
        Ok(Self { dims })
    }

    /// The full shape this one was selected from.
    pub fn reset(&self) -> Self {
        Self {
            dims: self.dims.iter().map(Dimension::reset).collect(),
        }
    }

    /// The length of the longest physically contiguous run that every
    /// aligned block of logical positions maps to, considering the
    /// axes from `from_axis` on.
    ///
    /// Axes are walked from the least significant. Complete axes
    /// multiply the run by their extent; the first incomplete axis
    /// contributes the length of its unit-step runs and ends the walk.
    /// Logical positions `k × r .. (k + 1) × r` then map to `r`
    /// consecutive offsets for every `k`, where `r` is the result.
    pub fn contiguous_data_length(&self, from_axis: usize) -> usize {
        let dims = self.dims.get(from_axis..).unwrap_or_default();
        let mut len = 1;
        for dim in dims.iter().rev() {
            if !dim.complete() {
                return len * dim.unit_run_length();
            }
            len *= dim.size();
        }
        len
    }

    /// Whether the whole view is one contiguous run.
    pub fn contiguous(&self) -> bool {
        self.contiguous_data_length(0) == self.size()
    }

    /// The physical offsets of all logical positions, in order.
    pub fn offsets(&self) -> Offsets<'_> {
        Offsets::new(self)
    }

    /// The elements of `data` in logical order.
    ///
    /// # Panics
    ///
    /// Iterating panics if `data` is shorter than
    /// [`base_size`](Shape::base_size). [`Shaped`](crate::Shaped)
    /// checks the length once, up front.
    pub fn iter<'a, T>(&'a self, data: &'a [T]) -> ShapeIter<'a, T> {
        ShapeIter::new(self, data)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.extents().iter().join(","))
    }
}

/// Construct a full [`Shape`] from literal axis extents.
///
/// ```
/// let s = ndstride::shape![2, 8];
/// assert_eq!(s.extents(), vec![2, 8]);
/// assert_eq!(s.to_string(), "{2,8}");
/// ```
#[macro_export]
macro_rules! shape {
    ( $( $extent:expr ),* $(,)? ) => {
        {
            let extents: Vec<usize> = vec![$($extent),*];
            $crate::shape::Shape::new(extents).unwrap()
        }
    };
}

/// A range with an optional start and end and a signed step.
///
/// A missing start or end is *delayed*: it is resolved against the
/// size of the axis the range is applied to, as the first or one
/// past the last position in the direction of the step. `Range(None,
/// None, -1)` reverses an axis of any size.
#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
pub struct Range(pub Option<isize>, pub Option<isize>, pub isize);

impl Range {
    /// `start..` with unit step.
    pub fn from_start(start: usize) -> Self {
        Self(Some(start as isize), None, 1)
    }

    /// The whole axis with the given step.
    pub fn step(step: isize) -> Self {
        Self(None, None, step)
    }

    /// Resolve against an axis of `size` positions, or `None` for a
    /// zero step.
    ///
    /// Explicit bounds are clamped to `-1..=size` and the step to
    /// `±(size + 1)`. Clamping never changes which in-axis positions
    /// are visited, so a start outside the axis still resolves to a
    /// range the caller can reject.
    pub fn resolve(&self, size: usize) -> Option<LinearRange> {
        let size = size as isize;
        let Range(start, end, step) = *self;
        let clamp = |bound: isize| bound.clamp(-1, size);
        let step = step.clamp(-(size + 1), size + 1);
        match step {
            0 => None,
            1.. => Some(LinearRange::new(
                clamp(start.unwrap_or(0)),
                clamp(end.unwrap_or(size)),
                step,
            )),
            _ => Some(LinearRange::new(
                clamp(start.unwrap_or(size - 1)),
                clamp(end.unwrap_or(-1)),
                step,
            )),
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Range(start, end, step) = self;
        if let Some(start) = start {
            write!(f, "{}", start)?;
        }
        write!(f, ":")?;
        if let Some(end) = end {
            write!(f, "{}", end)?;
        }
        if *step != 1 {
            write!(f, ":{}", step)?;
        }
        Ok(())
    }
}

impl From<std::ops::Range<usize>> for Range {
    fn from(r: std::ops::Range<usize>) -> Self {
        Self(Some(r.start as isize), Some(r.end as isize), 1)
    }
}

impl From<std::ops::RangeInclusive<usize>> for Range {
    fn from(r: std::ops::RangeInclusive<usize>) -> Self {
        Self(Some(*r.start() as isize), Some(*r.end() as isize + 1), 1)
    }
}

impl From<std::ops::RangeFrom<usize>> for Range {
    fn from(r: std::ops::RangeFrom<usize>) -> Self {
        Self::from_start(r.start)
    }
}

impl From<LinearRange> for Range {
    fn from(r: LinearRange) -> Self {
        Self(Some(r.start()), Some(r.stop()), r.step())
    }
}

/// The selection applied to one active axis.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// Close the axis at this position.
    Index(usize),
    /// Keep the positions of an arithmetic range.
    Range(Range),
    /// Keep the whole axis.
    All,
    /// Keep an explicit list of positions, in order, repeats allowed.
    List(Vec<usize>),
}

impl Selector {
    /// Validate against axis `axis` of `size` positions and produce
    /// the range to select with; `None` keeps the axis as it is.
    fn resolve(&self, axis: usize, size: usize) -> Result<Option<IndexRange>, ShapeError> {
        let out_of_range = || ShapeError::SelectorOutOfRange {
            selector: self.clone(),
            axis,
            size,
        };
        match self {
            Selector::Index(index) if *index >= size => Err(ShapeError::IndexOutOfRange {
                index: *index,
                axis,
                size,
            }),
            Selector::Index(index) => Ok(Some(IndexRange::Linear(LinearRange::closed(*index)))),
            Selector::Range(range) => {
                let Some(range) = range.resolve(size) else {
                    return Err(ShapeError::ZeroStep {
                        selector: self.clone(),
                        axis,
                    });
                };
                let Some(last) = range.last() else {
                    return Err(ShapeError::EmptyRange {
                        selector: self.clone(),
                        axis,
                    });
                };
                let bounds = 0..size as isize;
                if !bounds.contains(&range.start()) || !bounds.contains(&last) {
                    return Err(out_of_range());
                }
                Ok(Some(IndexRange::Linear(range)))
            }
            Selector::All => Ok(None),
            Selector::List(indices) if indices.is_empty() => Err(ShapeError::EmptyRange {
                selector: self.clone(),
                axis,
            }),
            Selector::List(indices) if indices.iter().any(|&i| i >= size) => Err(out_of_range()),
            Selector::List(indices) => Ok(Some(IndexRange::General(GeneralRange::new(
                indices.clone(),
            )))),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Index(index) => write!(f, "{}", index),
            Selector::Range(range) => write!(f, "{}", range),
            Selector::All => write!(f, "*"),
            Selector::List(indices) => write!(f, "[{}]", indices.iter().join(",")),
        }
    }
}

impl From<usize> for Selector {
    fn from(index: usize) -> Self {
        Selector::Index(index)
    }
}

impl From<Range> for Selector {
    fn from(range: Range) -> Self {
        Selector::Range(range)
    }
}

impl From<LinearRange> for Selector {
    fn from(range: LinearRange) -> Self {
        Selector::Range(range.into())
    }
}

impl From<std::ops::Range<usize>> for Selector {
    fn from(r: std::ops::Range<usize>) -> Self {
        Selector::Range(r.into())
    }
}

impl From<std::ops::RangeInclusive<usize>> for Selector {
    fn from(r: std::ops::RangeInclusive<usize>) -> Self {
        Selector::Range(r.into())
    }
}

impl From<std::ops::RangeFrom<usize>> for Selector {
    fn from(r: std::ops::RangeFrom<usize>) -> Self {
        Selector::Range(r.into())
    }
}

impl From<std::ops::RangeFull> for Selector {
    fn from(_: std::ops::RangeFull) -> Self {
        Selector::All
    }
}

impl From<Vec<usize>> for Selector {
    fn from(indices: Vec<usize>) -> Self {
        Selector::List(indices)
    }
}
