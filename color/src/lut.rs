// lcdglyph/color/src/lut.rs
//
// Copyright © 2020 The lcdglyph Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Lookup tables converting between sRGB-coded and linear-coded 16-bit intensities.

use crate::{linear_to_srgb, srgb_to_linear};

/// The number of entries in each direction of the table.
pub const LUT_SIZE: usize = 65536;

lazy_static! {
    static ref COLOR_SPACE_LUT: ColorSpaceLut = {
        debug!("building shared sRGB/linear lookup tables");
        ColorSpaceLut::new()
    };
}

/// A pair of 65536-entry tables mapping sRGB-coded intensities to linear-coded ones and back.
///
/// Both tables are monotonic step functions sampled at 16-bit resolution. Building one costs a
/// couple of milliseconds, so most callers should share the process-wide instance returned by
/// `ColorSpaceLut::get()`.
pub struct ColorSpaceLut {
    s2l: Box<[u16]>,
    l2s: Box<[u16]>,
}

impl ColorSpaceLut {
    /// Builds both tables.
    pub fn new() -> ColorSpaceLut {
        let s2l = (0..LUT_SIZE).map(|c| quantize(srgb_to_linear(c as f32 / 65535.0))).collect();
        let l2s = (0..LUT_SIZE).map(|c| quantize(linear_to_srgb(c as f32 / 65535.0))).collect();
        ColorSpaceLut { s2l, l2s }
    }

    /// Returns the shared instance, building it on first use.
    pub fn get() -> &'static ColorSpaceLut {
        &*COLOR_SPACE_LUT
    }

    /// Maps an sRGB-coded intensity to a linear-coded one.
    #[inline]
    pub fn srgb_to_linear_u16(&self, c: u16) -> u16 {
        self.s2l[c as usize]
    }

    /// Maps a linear-coded intensity to an sRGB-coded one.
    #[inline]
    pub fn linear_to_srgb_u16(&self, c: u16) -> u16 {
        self.l2s[c as usize]
    }

    #[inline]
    pub fn s2l(&self) -> &[u16] {
        &self.s2l
    }

    #[inline]
    pub fn l2s(&self) -> &[u16] {
        &self.l2s
    }
}

impl Default for ColorSpaceLut {
    #[inline]
    fn default() -> ColorSpaceLut {
        ColorSpaceLut::new()
    }
}

#[inline]
fn quantize(c: f32) -> u16 {
    (c * 65535.0).round() as u16
}
