// lcdglyph/renderer/src/lib.rs
//
// Copyright © 2020 The lcdglyph Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Subpixel (LCD) glyph postprocessing.
//!
//! Glyph coverage produced by a rasterizer is spread across neighbouring subpixels by a tri-tap
//! filter and then remapped through an *alpha correction table*, chosen so that ordinary
//! fixed-point blending in sRGB space approximates gamma-correct blending in linear light.

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;

pub mod concurrent;
pub mod error;
pub mod filter;
pub mod pixels;
pub mod table;

pub use crate::error::{PixelError, TableError};
pub use crate::filter::{FilterMode, FilterOptions, filter_horizontal};
pub use crate::pixels::{Bitmap, BitmapView, BitmapViewMut, PackedRgbSink, PixelSink, PixelSource};
pub use crate::table::{AlphaCorrectionTable, AlphaCorrectionTableBuilder, BackgroundRange};
pub use crate::table::{ErrorMap, TableOptions, TableSet};
