// lcdglyph/renderer/src/error.rs
//
// Copyright © 2020 The lcdglyph Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Errors.

use std::error::Error;
use std::fmt::{self, Display, Formatter};

/// Errors that can occur when building or loading alpha correction tables.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum TableError {
    /// The background range was empty: its start lies above its end.
    InvalidBackgroundRange {
        start: u8,
        end: u8,
    },
    /// A caller-supplied table or error buffer cannot hold all 65536 entries.
    BufferTooSmall {
        expected: usize,
        actual: usize,
    },
}

/// Errors that can occur when wrapping a buffer as a pixel grid.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum PixelError {
    /// The stride is narrower than a row.
    StrideTooSmall {
        width: usize,
        stride: usize,
    },
    /// The buffer ends before the last row does.
    BufferTooSmall {
        expected: usize,
        actual: usize,
    },
}

impl Display for TableError {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        match *self {
            TableError::InvalidBackgroundRange { start, end } => {
                write!(formatter, "background range {}..={} is empty", start, end)
            }
            TableError::BufferTooSmall { expected, actual } => {
                write!(formatter, "table buffer holds {} entries, {} required", actual, expected)
            }
        }
    }
}

impl Error for TableError {}

impl Display for PixelError {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        match *self {
            PixelError::StrideTooSmall { width, stride } => {
                write!(formatter, "stride {} is smaller than row width {}", stride, width)
            }
            PixelError::BufferTooSmall { expected, actual } => {
                write!(formatter, "pixel buffer holds {} bytes, {} required", actual, expected)
            }
        }
    }
}

impl Error for PixelError {}
