/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Buffers viewed through a [`Shape`].
//!
//! A [`Shaped`] pairs a borrowed buffer with a shape that addresses
//! it; [`ShapedMut`] does the same for a mutable buffer. Neither owns
//! or copies element data. Narrowing a view narrows its shape and
//! keeps the buffer, so every view of a buffer resolves offsets
//! against the same base layout:
//!
//! ```
//! # use ndstride::Shaped;
//! let data: Vec<u32> = (0..24).collect();
//! let view = Shaped::new(ndstride::shape![2, 3, 4], &data).unwrap();
//! let row = view.index(1).unwrap().index(2).unwrap();
//! assert_eq!(row.iter().copied().collect::<Vec<_>>(), vec![20, 21, 22, 23]);
//! ```
//!
//! The buffer must hold at least `shape.base_size()` elements; that is
//! checked once, on construction, and every offset a shape can produce
//! is below its base size.
//!
//! There is no mutable element iterator: a selection with repeated
//! indices visits the same element more than once, so a sequence of
//! `&mut T` could alias. Mutation goes through [`ShapedMut::get_mut`]
//! or the [`copy`](crate::copy) engine.

use crate::iter::ShapeIter;
use crate::shape::Selector;
use crate::shape::Shape;
use crate::shape::ShapeError;

fn check_len(shape: &Shape, len: usize) -> Result<(), ShapeError> {
    let base_size = shape.base_size();
    if len < base_size {
        return Err(ShapeError::BufferTooSmall { len, base_size });
    }
    Ok(())
}

/// A shared buffer addressed through a shape.
#[derive(Clone, Debug)]
pub struct Shaped<'a, T> {
    shape: Shape,
    data: &'a [T],
}

impl<'a, T> Shaped<'a, T> {
    pub fn new(shape: Shape, data: &'a [T]) -> Result<Self, ShapeError> {
        check_len(&shape, data.len())?;
        Ok(Self { shape, data })
    }

    /// The whole buffer as a single axis. Fails for an empty buffer.
    pub fn flat(data: &'a [T]) -> Result<Self, ShapeError> {
        Ok(Self {
            shape: Shape::new([data.len()])?,
            data,
        })
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// The underlying buffer, unselected.
    pub fn data(&self) -> &'a [T] {
        self.data
    }

    /// The number of logical elements.
    pub fn size(&self) -> usize {
        self.shape.size()
    }

    /// Narrow the view by one selector per active axis.
    pub fn select(&self, selectors: &[Selector]) -> Result<Self, ShapeError> {
        Ok(Self {
            shape: self.shape.sub_shape(selectors)?,
            data: self.data,
        })
    }

    /// Close the first active axis at `pos`.
    pub fn index(&self, pos: usize) -> Result<Self, ShapeError> {
        Ok(Self {
            shape: self.shape.close_at(pos)?,
            data: self.data,
        })
    }

    /// The element at logical position `pos`.
    pub fn get(&self, pos: usize) -> Result<&'a T, ShapeError> {
        Ok(&self.data[self.shape.get(pos)?])
    }

    /// The elements in logical order.
    pub fn iter(&self) -> ShapeIter<'_, T> {
        ShapeIter::new(&self.shape, self.data)
    }
}

/// A mutable buffer addressed through a shape.
#[derive(Debug)]
pub struct ShapedMut<'a, T> {
    shape: Shape,
    data: &'a mut [T],
}

impl<'a, T> ShapedMut<'a, T> {
    pub fn new(shape: Shape, data: &'a mut [T]) -> Result<Self, ShapeError> {
        check_len(&shape, data.len())?;
        Ok(Self { shape, data })
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn size(&self) -> usize {
        self.shape.size()
    }

    /// Narrow the view. The result reborrows this view's buffer.
    pub fn select(&mut self, selectors: &[Selector]) -> Result<ShapedMut<'_, T>, ShapeError> {
        Ok(ShapedMut {
            shape: self.shape.sub_shape(selectors)?,
            data: &mut *self.data,
        })
    }

    /// Close the first active axis at `pos`, reborrowing the buffer.
    pub fn index(&mut self, pos: usize) -> Result<ShapedMut<'_, T>, ShapeError> {
        Ok(ShapedMut {
            shape: self.shape.close_at(pos)?,
            data: &mut *self.data,
        })
    }

    pub fn get(&self, pos: usize) -> Result<&T, ShapeError> {
        Ok(&self.data[self.shape.get(pos)?])
    }

    pub fn get_mut(&mut self, pos: usize) -> Result<&mut T, ShapeError> {
        Ok(&mut self.data[self.shape.get(pos)?])
    }

    pub fn iter(&self) -> ShapeIter<'_, T> {
        ShapeIter::new(&self.shape, &*self.data)
    }

    /// A shared view of the same elements.
    pub fn as_shaped(&self) -> Shaped<'_, T> {
        Shaped {
            shape: self.shape.clone(),
            data: &*self.data,
        }
    }

    pub(crate) fn data_mut(&mut self) -> &mut [T] {
        &mut *self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Range;
    use crate::shape;

    #[test]
    fn test_buffer_too_small() {
        let data = [0u8; 5];
        assert!(matches!(
            Shaped::new(shape![2, 3], &data),
            Err(ShapeError::BufferTooSmall {
                len: 5,
                base_size: 6
            })
        ));
        // Larger buffers are fine; the tail is never addressed.
        assert!(Shaped::new(shape![2, 2], &data).is_ok());
    }

    #[test]
    fn test_flat() {
        let data = [7, 8, 9];
        let v = Shaped::flat(&data).unwrap();
        assert_eq!(v.shape().extents(), vec![3]);
        assert!(v.iter().eq(data.iter()));

        let empty: [u8; 0] = [];
        assert!(matches!(
            Shaped::flat(&empty),
            Err(ShapeError::ZeroExtent { axis: 0 })
        ));
    }

    #[test]
    fn test_select_and_index() {
        let data: Vec<i32> = (0..12).collect();
        let v = Shaped::new(shape![3, 4], &data).unwrap();
        let cols = v
            .select(&[Selector::All, Range::step(-2).into()])
            .unwrap();
        assert!(cols.iter().copied().eq([3, 1, 7, 5, 11, 9]));
        assert_eq!(*cols.get(2).unwrap(), 7);
        assert!(matches!(
            cols.get(6),
            Err(ShapeError::PositionOutOfRange { pos: 6, size: 6 })
        ));

        let row = cols.index(2).unwrap();
        assert!(row.iter().copied().eq([11, 9]));
        assert_eq!(row.size(), 2);
        // The original view is untouched.
        assert_eq!(v.size(), 12);
    }

    #[test]
    fn test_mutable_view() {
        let mut data: Vec<i32> = (0..12).collect();
        let mut v = ShapedMut::new(shape![3, 4], &mut data).unwrap();
        {
            let mut col = v.select(&[Selector::All, 1.into()]).unwrap();
            for pos in 0..col.size() {
                *col.get_mut(pos).unwrap() *= 10;
            }
            assert!(col.as_shaped().iter().copied().eq([10, 50, 90]));
        }
        {
            let mut row = v.index(2).unwrap();
            *row.get_mut(0).unwrap() = -1;
        }
        assert_eq!(*v.get(8).unwrap(), -1);
        drop(v);
        assert_eq!(data, vec![0, 10, 2, 3, 4, 50, 6, 7, -1, 90, 10, 11]);
    }
}
