// lcdglyph/color/src/lib.rs
//
// Copyright © 2020 The lcdglyph Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! sRGB transfer functions and 16-bit round-trip lookup tables.

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;

pub mod lut;

pub use crate::lut::ColorSpaceLut;

/// Converts an sRGB-encoded intensity in `[0, 1]` to linear light.
#[inline]
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Converts a linear-light intensity in `[0, 1]` to sRGB encoding.
#[inline]
pub fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.0031308 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

#[cfg(test)]
mod test {
    use super::{linear_to_srgb, srgb_to_linear};

    #[test]
    fn test_transfer_function_endpoints() {
        assert_eq!(srgb_to_linear(0.0), 0.0);
        assert_eq!(linear_to_srgb(0.0), 0.0);
        assert!((srgb_to_linear(1.0) - 1.0).abs() < 1e-6);
        assert!((linear_to_srgb(1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_transfer_function_midtones() {
        // sRGB 0.5 is roughly 21.4% linear light.
        assert!((srgb_to_linear(0.5) - 0.21404).abs() < 1e-4);
        assert!((linear_to_srgb(0.21404) - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_transfer_function_toe_is_linear() {
        assert_eq!(srgb_to_linear(0.04045), 0.04045 / 12.92);
        assert_eq!(linear_to_srgb(0.0031308), 0.0031308 * 12.92);
    }
}
