// lcdglyph/renderer/src/pixels.rs
//
// Copyright © 2020 The lcdglyph Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Rectangular grids of 8-bit samples that the subpixel filter reads from and writes to.

use crate::error::PixelError;

/// A grid of coverage values.
pub trait PixelSource {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn stride(&self) -> usize;

    /// Returns the sample at `(x, y)`, or 0 if that lies outside the grid.
    fn read(&self, x: usize, y: usize) -> u8;
}

/// A grid that filtered values are written into.
pub trait PixelSink {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn stride(&self) -> usize;

    /// Stores `value` at `(x, y)`. Writes outside the grid are dropped.
    fn write(&mut self, x: usize, y: usize, value: u8);
}

/// Checks that `len` elements can hold `height` rows of `width` elements spaced `stride` apart.
fn check_layout(width: usize, height: usize, stride: usize, len: usize)
                -> Result<(), PixelError> {
    if height == 0 || width == 0 {
        return Ok(());
    }
    if stride < width {
        return Err(PixelError::StrideTooSmall { width, stride });
    }
    let expected = stride * (height - 1) + width;
    if len < expected {
        return Err(PixelError::BufferTooSmall { expected, actual: len });
    }
    Ok(())
}

#[inline]
fn coords_to_index(width: usize, height: usize, stride: usize, x: usize, y: usize)
                   -> Option<usize> {
    if x < width && y < height {
        Some(y * stride + x)
    } else {
        None
    }
}

/// A borrowed, strided greyscale bitmap, such as a rasterizer's glyph image.
#[derive(Clone, Copy, Debug)]
pub struct BitmapView<'a> {
    width: usize,
    height: usize,
    stride: usize,
    data: &'a [u8],
}

impl<'a> BitmapView<'a> {
    pub fn new(width: usize, height: usize, stride: usize, data: &'a [u8])
               -> Result<BitmapView<'a>, PixelError> {
        check_layout(width, height, stride, data.len())?;
        Ok(BitmapView { width, height, stride, data })
    }
}

impl<'a> PixelSource for BitmapView<'a> {
    #[inline]
    fn width(&self) -> usize {
        self.width
    }

    #[inline]
    fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    fn read(&self, x: usize, y: usize) -> u8 {
        match coords_to_index(self.width, self.height, self.stride, x, y) {
            Some(index) => self.data[index],
            None => 0,
        }
    }
}

/// A mutably borrowed, strided greyscale bitmap.
#[derive(Debug)]
pub struct BitmapViewMut<'a> {
    width: usize,
    height: usize,
    stride: usize,
    data: &'a mut [u8],
}

impl<'a> BitmapViewMut<'a> {
    pub fn new(width: usize, height: usize, stride: usize, data: &'a mut [u8])
               -> Result<BitmapViewMut<'a>, PixelError> {
        check_layout(width, height, stride, data.len())?;
        Ok(BitmapViewMut { width, height, stride, data })
    }
}

impl<'a> PixelSource for BitmapViewMut<'a> {
    #[inline]
    fn width(&self) -> usize {
        self.width
    }

    #[inline]
    fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    fn read(&self, x: usize, y: usize) -> u8 {
        match coords_to_index(self.width, self.height, self.stride, x, y) {
            Some(index) => self.data[index],
            None => 0,
        }
    }
}

impl<'a> PixelSink for BitmapViewMut<'a> {
    #[inline]
    fn width(&self) -> usize {
        self.width
    }

    #[inline]
    fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    fn write(&mut self, x: usize, y: usize, value: u8) {
        if let Some(index) = coords_to_index(self.width, self.height, self.stride, x, y) {
            self.data[index] = value;
        }
    }
}

/// An owned, tightly packed greyscale bitmap.
#[derive(Clone, PartialEq, Debug)]
pub struct Bitmap {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Bitmap {
    /// Creates a bitmap with every sample zero.
    pub fn new(width: usize, height: usize) -> Bitmap {
        Bitmap { width, height, data: vec![0; width * height] }
    }

    /// Creates a bitmap by evaluating `build` at every coordinate, row by row.
    pub fn from_builder<F>(width: usize, height: usize, mut build: F) -> Bitmap
                           where F: FnMut(usize, usize) -> u8 {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(build(x, y));
            }
        }
        Bitmap { width, height, data }
    }

    /// Copies a tightly packed buffer.
    pub fn from_bytes(width: usize, height: usize, bytes: &[u8]) -> Result<Bitmap, PixelError> {
        let view = BitmapView::new(width, height, width, bytes)?;
        Ok(Bitmap::from_builder(width, height, |x, y| view.read(x, y)))
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns row `y`, or `None` past the bottom of the bitmap.
    #[inline]
    pub fn row(&self, y: usize) -> Option<&[u8]> {
        if y < self.height {
            Some(&self.data[(y * self.width)..((y + 1) * self.width)])
        } else {
            None
        }
    }

    #[inline]
    pub fn view(&self) -> BitmapView {
        BitmapView { width: self.width, height: self.height, stride: self.width, data: &self.data }
    }
}

impl PixelSource for Bitmap {
    #[inline]
    fn width(&self) -> usize {
        self.width
    }

    #[inline]
    fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn stride(&self) -> usize {
        self.width
    }

    #[inline]
    fn read(&self, x: usize, y: usize) -> u8 {
        match coords_to_index(self.width, self.height, self.width, x, y) {
            Some(index) => self.data[index],
            None => 0,
        }
    }
}

impl PixelSink for Bitmap {
    #[inline]
    fn width(&self) -> usize {
        self.width
    }

    #[inline]
    fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn stride(&self) -> usize {
        self.width
    }

    #[inline]
    fn write(&mut self, x: usize, y: usize, value: u8) {
        if let Some(index) = coords_to_index(self.width, self.height, self.width, x, y) {
            self.data[index] = value;
        }
    }
}

/// Writes subpixels into `0x00RRGGBB` pixels, three subpixels per pixel, red first.
///
/// The width is measured in subpixels and the stride in pixels.
#[derive(Debug)]
pub struct PackedRgbSink<'a> {
    width: usize,
    height: usize,
    stride: usize,
    data: &'a mut [u32],
}

impl<'a> PackedRgbSink<'a> {
    pub fn new(width: usize, height: usize, stride: usize, data: &'a mut [u32])
               -> Result<PackedRgbSink<'a>, PixelError> {
        check_layout((width + 2) / 3, height, stride, data.len())?;
        Ok(PackedRgbSink { width, height, stride, data })
    }

    /// Returns the packed pixel that holds subpixel `(x, y)`.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        if x < self.width && y < self.height {
            Some(self.data[y * self.stride + x / 3])
        } else {
            None
        }
    }
}

impl<'a> PixelSink for PackedRgbSink<'a> {
    #[inline]
    fn width(&self) -> usize {
        self.width
    }

    #[inline]
    fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    fn write(&mut self, x: usize, y: usize, value: u8) {
        if x >= self.width || y >= self.height {
            return;
        }
        let shift = (2 - x % 3) * 8;
        let pixel = &mut self.data[y * self.stride + x / 3];
        *pixel = (*pixel & !(0xff << shift)) | (value as u32) << shift;
    }
}

#[cfg(test)]
mod test {
    use crate::error::PixelError;
    use super::{Bitmap, BitmapView, BitmapViewMut, PackedRgbSink, PixelSink, PixelSource};

    #[test]
    fn test_out_of_range_reads_are_zero() {
        let data: [u8; 8] = [1, 2, 3, 99, 4, 5, 6, 99];
        let view = BitmapView::new(3, 2, 4, &data).unwrap();
        assert_eq!((view.read(0, 0), view.read(2, 1)), (1, 6));
        assert_eq!(view.read(3, 0), 0);
        assert_eq!(view.read(0, 2), 0);
        assert_eq!(view.read(usize::MAX, 0), 0);
    }

    #[test]
    fn test_layout_is_validated() {
        let data = [0u8; 7];
        assert_eq!(BitmapView::new(3, 2, 2, &data).unwrap_err(),
                   PixelError::StrideTooSmall { width: 3, stride: 2 });
        assert_eq!(BitmapView::new(3, 3, 3, &data).unwrap_err(),
                   PixelError::BufferTooSmall { expected: 9, actual: 7 });
        // The last row needs no padding.
        assert!(BitmapView::new(3, 2, 4, &data).is_ok());
        assert!(BitmapView::new(0, 0, 0, &[]).is_ok());
    }

    #[test]
    fn test_out_of_range_writes_are_dropped() {
        let mut data = [0u8; 8];
        {
            let mut view = BitmapViewMut::new(3, 2, 4, &mut data).unwrap();
            view.write(1, 1, 7);
            view.write(3, 0, 9);
            view.write(0, 2, 9);
        }
        assert_eq!(data, [0, 0, 0, 0, 0, 7, 0, 0]);
    }

    #[test]
    fn test_bitmap_builder() {
        let bitmap = Bitmap::from_builder(4, 3, |x, y| (y * 4 + x) as u8);
        assert_eq!(bitmap.row(2).unwrap(), &[8, 9, 10, 11]);
        assert_eq!(bitmap.row(3), None);
        assert_eq!(Bitmap::new(0, 2).row(1), Some(&[][..]));
        assert_eq!(bitmap.read(3, 1), 7);
        assert_eq!(bitmap.view().read(3, 1), 7);
        assert_eq!(Bitmap::from_bytes(4, 3, bitmap.as_bytes()).unwrap(), bitmap);
        assert!(Bitmap::from_bytes(4, 4, bitmap.as_bytes()).is_err());
    }

    #[test]
    fn test_packed_rgb_channels() {
        let mut data = [0u32; 4];
        {
            let mut sink = PackedRgbSink::new(6, 2, 2, &mut data).unwrap();
            sink.write(0, 0, 0x11);
            sink.write(1, 0, 0x22);
            sink.write(2, 0, 0x33);
            sink.write(5, 1, 0x44);
            sink.write(6, 1, 0x55);
            sink.write(1, 0, 0x66);
            assert_eq!(sink.pixel(2, 0), Some(0x116633));
            assert_eq!(sink.pixel(6, 0), None);
        }
        assert_eq!(data, [0x116633, 0, 0, 0x44]);
    }
}
