// lcdglyph/renderer/src/filter.rs
//
// Copyright © 2020 The lcdglyph Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Horizontal subpixel filtering of glyph coverage.
//!
//! Each row is treated as a run of subpixels cycling red, green and blue. In blurred mode every
//! subpixel is spread over its neighbours by a tri-tap kernel, which keeps colour fringes down,
//! and coverage is optionally boosted for dark foregrounds. Both modes finish by remapping the
//! coverage through the alpha correction table of the subpixel's colour channel.

use crate::pixels::{PixelSink, PixelSource};
use crate::table::TableSet;
use std::cmp;

/// Which filter to apply.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FilterMode {
    /// Tri-tap blur with dark-glyph enhancement. The output gains one subpixel of margin on each
    /// side for the blur to spill into.
    Blurred,
    /// Alpha correction only, one output subpixel per input subpixel.
    Passthrough,
}

impl FilterMode {
    /// The number of extra subpixels written on each side of a row.
    #[inline]
    pub fn margin(self) -> usize {
        match self {
            FilterMode::Blurred => 1,
            FilterMode::Passthrough => 0,
        }
    }

    /// The width of a filtered row for a source row `source_width` subpixels wide.
    #[inline]
    pub fn output_width(self, source_width: usize) -> usize {
        source_width + self.margin() * 2
    }
}

impl Default for FilterMode {
    #[inline]
    fn default() -> FilterMode {
        FilterMode::Blurred
    }
}

/// Options that control filtering.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct FilterOptions {
    pub mode: FilterMode,
    /// The text colour, one intensity per subpixel phase (red, green, blue).
    pub foreground: [u8; 3],
    /// How strongly to thicken coverage for dark foregrounds. Zero disables enhancement.
    pub dark_glyph_enhancement: u8,
}

impl Default for FilterOptions {
    #[inline]
    fn default() -> FilterOptions {
        FilterOptions { mode: FilterMode::Blurred, foreground: [0; 3], dark_glyph_enhancement: 0 }
    }
}

/// Boosts `component` towards full coverage, more so the darker `foreground` is.
///
/// The boost vanishes at zero and full coverage, and when `enhancement` is zero.
#[inline]
pub fn enhance(enhancement: u8, component: u8, foreground: u8) -> u8 {
    let contrast = (255 - foreground as u32) * enhancement as u32 >> 8;
    let component = component as u32;
    (component + (contrast * component * (255 - component) >> 16)) as u8
}

/// Averages a subpixel with its neighbours. The weights sum to 256.
#[inline]
pub fn tri_tap(previous: u8, current: u8, next: u8) -> u8 {
    ((0x55 * previous as u32 + 0x56 * current as u32 + 0x55 * next as u32 + (1 << 7)) >> 8) as u8
}

/// Filters every row of `source` into `sink`.
///
/// Only `min(source height, sink height)` rows are processed, and columns past the sink's width
/// are skipped.
pub fn filter_horizontal<S, D>(source: &S,
                               sink: &mut D,
                               tables: &TableSet,
                               options: &FilterOptions)
                               where S: PixelSource + ?Sized, D: PixelSink + ?Sized {
    let rows = cmp::min(source.height(), sink.height());
    for y in 0..rows {
        match options.mode {
            FilterMode::Blurred => filter_row_blurred(source, sink, y, tables, options),
            FilterMode::Passthrough => filter_row_passthrough(source, sink, y, tables, options),
        }
    }
}

fn filter_row_blurred<S, D>(source: &S,
                            sink: &mut D,
                            y: usize,
                            tables: &TableSet,
                            options: &FilterOptions)
                            where S: PixelSource + ?Sized, D: PixelSink + ?Sized {
    let source_width = source.width();
    let columns = cmp::min(FilterMode::Blurred.output_width(source_width), sink.width());

    // Output column `column` is centred on source column `column - 1`, so the first one is the
    // blue subpixel of the pixel left of the glyph.
    let (mut a1, mut a2, mut a3) = (0, 0, 0);
    for column in 0..columns {
        let phase = (column + 2) % 3;
        let foreground = options.foreground[phase];

        a1 = a2;
        a2 = a3;
        a3 = if column < source_width { source.read(column, y) } else { 0 };
        a3 = enhance(options.dark_glyph_enhancement, a3, foreground);

        let alpha = tri_tap(a1, a2, a3);
        sink.write(column, y, tables.get(phase).lookup(foreground, alpha));
    }
}

fn filter_row_passthrough<S, D>(source: &S,
                                sink: &mut D,
                                y: usize,
                                tables: &TableSet,
                                options: &FilterOptions)
                                where S: PixelSource + ?Sized, D: PixelSink + ?Sized {
    let columns = cmp::min(source.width(), sink.width());
    for x in 0..columns {
        let phase = x % 3;
        let foreground = options.foreground[phase];
        sink.write(x, y, tables.get(phase).lookup(foreground, source.read(x, y)));
    }
}
