/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Addressing and bulk data movement for N-dimensional strided views
//! over flat buffers.
//!
//! A [`Shape`] describes a logical multi-dimensional view (axis
//! extents, sub-ranges, steps, arbitrary index lists) over a flat
//! buffer. It translates logical positions into physical offsets and
//! reports how much of the view is physically contiguous. The
//! [`copy`](crate::copy) engine uses that information to move data
//! between two views with as few bulk transfers as the layouts allow.
//!
//! ```
//! use ndstride::Selector;
//! use ndstride::shape;
//!
//! let s = shape![2, 3, 4];
//! let sub = s
//!     .sub_shape(&[Selector::from(1), (1..3).into(), 2.into()])
//!     .unwrap();
//! assert_eq!(sub.size(), 2);
//! assert_eq!(sub.at(0), 18);
//! assert_eq!(sub.at(1), 22);
//! ```
//!
//! The crate does not own memory: buffers are borrowed slices, and
//! views ([`Shaped`], [`ShapedMut`]) pair a shape with such a slice.

/// Bulk copy and fill between strided operands.
pub mod copy;

/// Per-axis state: an index range over an axis of known extent.
pub mod dimension;

/// Iteration over the logical elements of a shape.
pub mod iter;

/// A compact textual syntax for per-axis selectors.
pub mod parse;

/// Type-erased cursors over index positions.
pub mod position;

/// Arithmetic and general index ranges.
pub mod range;

/// Multi-axis shapes: offset computation and contiguity analysis.
pub mod shape;

/// Property-based generators for randomized test input.
#[cfg(test)]
pub mod strategy;

/// Borrowing views pairing a shape with a buffer.
pub mod view;

pub use copy::CopyError;
pub use copy::CopyOpts;
pub use copy::CopyPlan;
pub use copy::Operand;
pub use copy::Sink;
pub use copy::Source;
pub use dimension::Dimension;
pub use iter::Offsets;
pub use iter::ShapeCursor;
pub use iter::ShapeIter;
pub use parse::ParseError;
pub use position::Cursor;
pub use position::PositionIter;
pub use position::Positions;
pub use range::GeneralRange;
pub use range::IndexRange;
pub use range::LinearRange;
pub use shape::Range;
pub use shape::Selector;
pub use shape::Shape;
pub use shape::ShapeError;
pub use view::Shaped;
pub use view::ShapedMut;
