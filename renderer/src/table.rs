// lcdglyph/renderer/src/table.rs
//
// Copyright © 2020 The lcdglyph Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Alpha correction tables.
//!
//! Blending text in sRGB space with plain coverage as alpha makes dark-on-light text look too
//! heavy and light-on-dark text too thin. Since the alpha channel may be remapped freely, we can
//! instead search, for every foreground intensity and coverage value, for the corrected alpha
//! whose fixed-point linear blend best matches the gamma-correct blend over a range of likely
//! backgrounds.
//!
//! A table is indexed by `foreground << 8 | coverage` and holds the corrected alpha.

use crate::concurrent::executor::{Executor, SequentialExecutor};
use crate::concurrent::rayon::RayonExecutor;
use crate::error::TableError;
use instant::Instant;
use lcdglyph_color::ColorSpaceLut;
use std::ops::RangeInclusive;

/// The number of entries in an alpha correction table.
pub const TABLE_SIZE: usize = 65536;

/// Multiplying an 8-bit level by this gives the equivalent 16-bit level.
const LEVEL_STEP: i32 = 0x101;

lazy_static! {
    static ref DEFAULT_TABLE: AlphaCorrectionTable = {
        let builder = AlphaCorrectionTableBuilder::new(TableOptions::default());
        builder.build_with_executor(&RayonExecutor).table
    };
}

/// The inclusive range of 8-bit background intensities a table is optimized for.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BackgroundRange {
    start: u8,
    end: u8,
}

impl BackgroundRange {
    /// Fails if `start > end`.
    #[inline]
    pub fn new(start: u8, end: u8) -> Result<BackgroundRange, TableError> {
        if start > end {
            return Err(TableError::InvalidBackgroundRange { start, end });
        }
        Ok(BackgroundRange { start, end })
    }

    /// Every background from black to white.
    #[inline]
    pub fn full() -> BackgroundRange {
        BackgroundRange { start: 0, end: 255 }
    }

    #[inline]
    pub fn start(self) -> u8 {
        self.start
    }

    #[inline]
    pub fn end(self) -> u8 {
        self.end
    }

    /// The number of background levels sampled. Always between 1 and 256.
    #[inline]
    pub fn len(self) -> usize {
        self.end as usize - self.start as usize + 1
    }

    #[inline]
    pub fn levels(self) -> RangeInclusive<u8> {
        self.start..=self.end
    }
}

impl Default for BackgroundRange {
    #[inline]
    fn default() -> BackgroundRange {
        BackgroundRange::full()
    }
}

/// Options that control table building.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct TableOptions {
    /// The backgrounds the blend error is averaged over.
    pub background: BackgroundRange,
    /// Whether to record the residual RMS error of every entry.
    pub compute_error_map: bool,
}

/// A 65536-entry map from `(foreground, coverage)` to corrected alpha.
#[derive(Clone, PartialEq)]
pub struct AlphaCorrectionTable {
    entries: Box<[u8]>,
}

impl AlphaCorrectionTable {
    /// The table that leaves alpha unchanged.
    pub fn identity() -> AlphaCorrectionTable {
        let entries = (0..TABLE_SIZE).map(|index| index as u8).collect();
        AlphaCorrectionTable { entries }
    }

    /// The table optimized for the full background range, built on first use.
    pub fn default_table() -> &'static AlphaCorrectionTable {
        &*DEFAULT_TABLE
    }

    /// Wraps a precomputed table, such as one written by `generate-alpha-lut`.
    pub fn from_bytes(bytes: &[u8]) -> Result<AlphaCorrectionTable, TableError> {
        if bytes.len() != TABLE_SIZE {
            return Err(TableError::BufferTooSmall { expected: TABLE_SIZE, actual: bytes.len() });
        }
        Ok(AlphaCorrectionTable { entries: bytes.into() })
    }

    #[inline]
    pub fn lookup(&self, foreground: u8, alpha: u8) -> u8 {
        self.entries[(foreground as usize) << 8 | alpha as usize]
    }

    /// The 256 corrected alphas for one foreground intensity.
    #[inline]
    pub fn row(&self, foreground: u8) -> &[u8] {
        let start = (foreground as usize) << 8;
        &self.entries[start..(start + 256)]
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.entries
    }
}

/// The RMS blend error left over after correction, per table entry. Diagnostic only.
#[derive(Clone, PartialEq, Debug)]
pub struct ErrorMap {
    errors: Box<[f32]>,
}

impl ErrorMap {
    #[inline]
    pub fn get(&self, foreground: u8, alpha: u8) -> f32 {
        self.errors[(foreground as usize) << 8 | alpha as usize]
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.errors
    }

    pub fn max(&self) -> f32 {
        self.errors.iter().cloned().fold(0.0, f32::max)
    }
}

/// The output of a table build.
pub struct BuiltTable {
    pub table: AlphaCorrectionTable,
    /// Present if `TableOptions::compute_error_map` was set.
    pub error_map: Option<ErrorMap>,
}

/// Per-phase tables for one filtering pass: one for each of the red, green and blue subpixels.
#[derive(Clone, Copy)]
pub struct TableSet<'a> {
    tables: [&'a AlphaCorrectionTable; 3],
}

impl<'a> TableSet<'a> {
    #[inline]
    pub fn new(red: &'a AlphaCorrectionTable,
               green: &'a AlphaCorrectionTable,
               blue: &'a AlphaCorrectionTable)
               -> TableSet<'a> {
        TableSet { tables: [red, green, blue] }
    }

    /// Uses the same table for every subpixel.
    #[inline]
    pub fn uniform(table: &'a AlphaCorrectionTable) -> TableSet<'a> {
        TableSet { tables: [table; 3] }
    }

    #[inline]
    pub fn get(&self, phase: usize) -> &'a AlphaCorrectionTable {
        self.tables[phase]
    }
}

#[derive(Clone, Copy)]
struct TableEntry {
    corrected: u8,
    rms_error: f32,
}

/// Searches for the corrected alpha of every table entry.
///
/// The only knob is the background range. There is no contrast adjustment: the search always
/// minimizes the plain sRGB blend error.
pub struct AlphaCorrectionTableBuilder {
    options: TableOptions,
    lut: &'static ColorSpaceLut,
}

impl AlphaCorrectionTableBuilder {
    pub fn new(options: TableOptions) -> AlphaCorrectionTableBuilder {
        AlphaCorrectionTableBuilder { options, lut: ColorSpaceLut::get() }
    }

    #[inline]
    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    /// Builds the table on the calling thread.
    pub fn build(&self) -> BuiltTable {
        self.build_with_executor(&SequentialExecutor)
    }

    /// Builds the table, one job per foreground level.
    pub fn build_with_executor<E>(&self, executor: &E) -> BuiltTable where E: Executor {
        let start_time = Instant::now();
        debug!("building alpha correction table with the {} executor", executor.name());

        let entries = executor.flatten_into_vector(256, |level| self.build_row(level as u8));
        debug_assert_eq!(entries.len(), TABLE_SIZE);

        let table = AlphaCorrectionTable {
            entries: entries.iter().map(|entry| entry.corrected).collect(),
        };
        let error_map = if self.options.compute_error_map {
            Some(ErrorMap { errors: entries.iter().map(|entry| entry.rms_error).collect() })
        } else {
            None
        };

        info!("built alpha correction table for backgrounds {}..={} in {:.1} ms",
              self.options.background.start(),
              self.options.background.end(),
              start_time.elapsed().as_secs_f64() * 1000.0);
        BuiltTable { table, error_map }
    }

    fn build_row(&self, foreground: u8) -> Vec<TableEntry> {
        let fg = foreground as i32 * LEVEL_STEP;
        let backgrounds = self.sample_backgrounds();
        let mut targets = Vec::with_capacity(backgrounds.len());
        let mut entries = Vec::with_capacity(256);

        // The optimal corrected alpha never decreases as alpha grows, so each search resumes
        // where the previous one ended.
        let mut start_ac = 0;
        for alpha in 0..256 {
            self.srgb_blend_targets(alpha, fg, &backgrounds, &mut targets);
            let (best_ac, best_error) = search_corrected_alpha(start_ac, fg, &backgrounds, &targets);
            start_ac = best_ac;

            let rms_error = if self.options.compute_error_map {
                (best_error as f32 / 256.0 / 256.0).sqrt()
            } else {
                0.0
            };
            entries.push(TableEntry { corrected: best_ac as u8, rms_error });
        }
        entries
    }

    /// Returns the 16-bit coded backgrounds paired with their linear-light values.
    fn sample_backgrounds(&self) -> Vec<BackgroundSample> {
        self.options.background.levels().map(|level| {
            let bg = level as i32 * LEVEL_STEP;
            BackgroundSample { bg, linear: self.lut.srgb_to_linear_u16(bg as u16) as i32 }
        }).collect()
    }

    /// The gamma-correct result of blending `fg` over each background at `alpha`.
    fn srgb_blend_targets(&self,
                          alpha: i32,
                          fg: i32,
                          backgrounds: &[BackgroundSample],
                          targets: &mut Vec<i32>) {
        let fg_linear = self.lut.srgb_to_linear_u16(fg as u16) as i32;
        targets.clear();
        targets.extend(backgrounds.iter().map(|sample| {
            let linear = (alpha * fg_linear + (255 - alpha) * sample.linear + 128) / 255;
            self.lut.linear_to_srgb_u16(linear as u16) as i32
        }));
    }
}

#[derive(Clone, Copy)]
struct BackgroundSample {
    bg: i32,
    linear: i32,
}

/// Scans corrected alphas upward from `start_ac` and stops at the first one whose error exceeds
/// the best seen so far. Returns the best corrected alpha and its summed squared error.
fn search_corrected_alpha(start_ac: i32,
                          fg: i32,
                          backgrounds: &[BackgroundSample],
                          targets: &[i32])
                          -> (i32, u64) {
    let mut best_ac = start_ac;
    let mut best_error = u64::MAX;
    for ac in start_ac..256 {
        let error = blend_error(ac, fg, backgrounds, targets);
        if error > best_error {
            break;
        }
        best_ac = ac;
        best_error = error;
    }
    (best_ac, best_error)
}

/// Sums the squared difference between the linear blend at `ac` and the sRGB-correct targets.
///
/// Differences are reduced to 12 bits before squaring, so each term fits in 24 bits.
#[inline]
fn blend_error(ac: i32, fg: i32, backgrounds: &[BackgroundSample], targets: &[i32]) -> u64 {
    backgrounds.iter().zip(targets.iter()).map(|(sample, &target)| {
        let linear_blended = (ac * fg + (255 - ac) * sample.bg + 128) / 255;
        let difference = (linear_blended - target) >> 4;
        (difference * difference) as u64
    }).sum()
}

/// Fills caller-provided buffers with a table for the given background range.
///
/// Either buffer may be omitted. On error nothing is written.
pub fn build(table_out: Option<&mut [u8]>,
             error_out: Option<&mut [f32]>,
             bg_start: u8,
             bg_end: u8)
             -> Result<(), TableError> {
    let background = BackgroundRange::new(bg_start, bg_end)?;
    for len in table_out.as_ref().map(|out| out.len()).into_iter()
                        .chain(error_out.as_ref().map(|out| out.len())) {
        if len < TABLE_SIZE {
            return Err(TableError::BufferTooSmall { expected: TABLE_SIZE, actual: len });
        }
    }

    let options = TableOptions { background, compute_error_map: error_out.is_some() };
    let built = AlphaCorrectionTableBuilder::new(options).build_with_executor(&RayonExecutor);
    if let Some(table_out) = table_out {
        table_out[..TABLE_SIZE].copy_from_slice(built.table.as_bytes());
    }
    if let (Some(error_out), Some(error_map)) = (error_out, built.error_map) {
        error_out[..TABLE_SIZE].copy_from_slice(error_map.as_slice());
    }
    Ok(())
}

/// How much a table improves blending of one foreground/background pair.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct BlendComparison {
    pub foreground: u8,
    pub background: u8,
    /// Distance from the gamma-correct result when blending with raw coverage, in 8-bit units.
    pub uncorrected_error: f32,
    /// Distance from the gamma-correct result when blending with corrected alpha.
    pub corrected_error: f32,
}

impl BlendComparison {
    /// Positive when correction moved the blend closer to the gamma-correct result.
    #[inline]
    pub fn improvement(&self) -> f32 {
        self.uncorrected_error - self.corrected_error
    }
}

/// Compares corrected and uncorrected blending at a fixed coverage for every 8-bit
/// foreground/background pair, foreground-major.
pub fn compare_blending(table: &AlphaCorrectionTable, alpha: u8) -> Vec<BlendComparison> {
    let lut = ColorSpaceLut::get();
    let alpha = alpha as i32;
    let mut comparisons = Vec::with_capacity(TABLE_SIZE);
    for foreground in 0..=255u8 {
        let fg = foreground as i32 * LEVEL_STEP;
        let fg_linear = lut.srgb_to_linear_u16(fg as u16) as i32;
        let ac = table.lookup(foreground, alpha as u8) as i32;
        for background in 0..=255u8 {
            let bg = background as i32 * LEVEL_STEP;
            let bg_linear = lut.srgb_to_linear_u16(bg as u16) as i32;
            let linear = (fg_linear * alpha + bg_linear * (255 - alpha) + 128) / 255;
            let correct = lut.linear_to_srgb_u16(linear as u16) as i32;
            let corrected = (fg * ac + bg * (255 - ac) + 128) / 255;
            let uncorrected = (fg * alpha + bg * (255 - alpha) + 128) / 255;
            comparisons.push(BlendComparison {
                foreground,
                background,
                uncorrected_error: (uncorrected - correct).abs() as f32 / LEVEL_STEP as f32,
                corrected_error: (corrected - correct).abs() as f32 / LEVEL_STEP as f32,
            });
        }
    }
    comparisons
}

#[cfg(test)]
mod test {
    use crate::concurrent::executor::SequentialExecutor;
    use crate::concurrent::rayon::RayonExecutor;
    use crate::error::TableError;
    use super::{AlphaCorrectionTable, AlphaCorrectionTableBuilder, BackgroundRange, LEVEL_STEP};
    use super::{TABLE_SIZE, TableOptions, blend_error, build, compare_blending};

    fn options(start: u8, end: u8, compute_error_map: bool) -> TableOptions {
        TableOptions {
            background: BackgroundRange::new(start, end).unwrap(),
            compute_error_map,
        }
    }

    #[test]
    fn test_empty_background_range_is_rejected() {
        assert_eq!(BackgroundRange::new(200, 100),
                   Err(TableError::InvalidBackgroundRange { start: 200, end: 100 }));
        assert_eq!(BackgroundRange::new(7, 7).map(|range| range.len()), Ok(1));
        assert_eq!(BackgroundRange::full().len(), 256);

        let mut table = vec![0xaa; TABLE_SIZE];
        assert!(build(Some(&mut table), None, 10, 9).is_err());
        assert!(table.iter().all(|&entry| entry == 0xaa));
    }

    #[test]
    fn test_short_buffers_are_rejected() {
        let mut table = vec![0; TABLE_SIZE - 1];
        assert_eq!(build(Some(&mut table), None, 0, 255),
                   Err(TableError::BufferTooSmall { expected: TABLE_SIZE, actual: TABLE_SIZE - 1 }));
        let mut errors = vec![0.0; 16];
        assert_eq!(build(None, Some(&mut errors), 0, 255),
                   Err(TableError::BufferTooSmall { expected: TABLE_SIZE, actual: 16 }));
    }

    #[test]
    fn test_boundary_entries() {
        let table = AlphaCorrectionTable::default_table();
        assert_eq!(table.lookup(0, 0), 0);
        for foreground in 0..=255u8 {
            assert_eq!(table.lookup(foreground, 0), 0, "fg={}", foreground);
            assert_eq!(table.lookup(foreground, 255), 255, "fg={}", foreground);
        }
    }

    #[test]
    fn test_rows_are_nondecreasing() {
        let table = AlphaCorrectionTable::default_table();
        for foreground in 0..=255u8 {
            let row = table.row(foreground);
            assert!(row.windows(2).all(|pair| pair[0] <= pair[1]), "fg={}", foreground);
        }
    }

    #[test]
    fn test_rows_are_nondecreasing_for_narrow_backgrounds() {
        let built = AlphaCorrectionTableBuilder::new(options(192, 255, false)).build();
        for foreground in 0..=255u8 {
            let row = built.table.row(foreground);
            assert!(row.windows(2).all(|pair| pair[0] <= pair[1]), "fg={}", foreground);
        }
    }

    // The early exit assumes the error curve is U-shaped in the corrected alpha. Check that it
    // lands on the global minimum.
    #[test]
    fn test_pruned_search_finds_global_minimum() {
        let builder = AlphaCorrectionTableBuilder::new(TableOptions::default());
        let table = AlphaCorrectionTable::default_table();
        let backgrounds = builder.sample_backgrounds();
        let mut targets = vec![];
        for foreground in (0..=255u8).step_by(51) {
            let fg = foreground as i32 * LEVEL_STEP;
            for alpha in (0..=255u8).step_by(15) {
                builder.srgb_blend_targets(alpha as i32, fg, &backgrounds, &mut targets);
                let global = (0..256).map(|ac| blend_error(ac, fg, &backgrounds, &targets))
                                     .min()
                                     .unwrap();
                let chosen = table.lookup(foreground, alpha) as i32;
                assert_eq!(blend_error(chosen, fg, &backgrounds, &targets),
                           global,
                           "fg={} alpha={}",
                           foreground,
                           alpha);
            }
        }
    }

    #[test]
    fn test_executors_agree_and_build_is_idempotent() {
        let builder = AlphaCorrectionTableBuilder::new(options(0, 127, true));
        let sequential = builder.build_with_executor(&SequentialExecutor);
        let parallel = builder.build_with_executor(&RayonExecutor);
        let again = builder.build();
        assert!(sequential.table == parallel.table);
        assert!(sequential.table == again.table);
        assert_eq!(sequential.error_map, parallel.error_map);
    }

    #[test]
    fn test_error_map() {
        let built = AlphaCorrectionTableBuilder::new(TableOptions::default()).build();
        assert!(built.error_map.is_none());

        let mut table = vec![0; TABLE_SIZE];
        let mut errors = vec![-1.0; TABLE_SIZE];
        build(Some(&mut table), Some(&mut errors), 0, 255).unwrap();
        assert_eq!(&table[..], AlphaCorrectionTable::default_table().as_bytes());
        assert!(errors.iter().all(|&error| error.is_finite() && error >= 0.0));
        // Zero coverage leaves only the sRGB round trip of the background as error.
        for foreground in 0..256 {
            assert_eq!(errors[foreground << 8], errors[0]);
        }
        assert!(errors[0] < 0.1);
        assert!(errors.iter().cloned().fold(0.0, f32::max) < 16.0);
    }

    #[test]
    fn test_pinned_entries() {
        let table = AlphaCorrectionTable::default_table();
        assert_eq!(&table.row(255)[..8], &[0, 5, 9, 13, 16, 19, 22, 24]);
        assert_eq!(table.lookup(255, 128), 171);
        assert_eq!(table.lookup(128, 128), 138);
        assert_eq!(table.lookup(128, 64), 80);
        assert_eq!(table.lookup(0, 128), 70);
    }

    #[test]
    fn test_correction_improves_blending_on_average() {
        let comparisons = compare_blending(AlphaCorrectionTable::default_table(), 128);
        assert_eq!(comparisons.len(), TABLE_SIZE);
        let mean = comparisons.iter().map(|comparison| comparison.improvement()).sum::<f32>() /
            comparisons.len() as f32;
        assert!(mean > 5.0, "mean improvement {}", mean);

        let identity = compare_blending(&AlphaCorrectionTable::identity(), 128);
        assert!(identity.iter().all(|comparison| comparison.improvement() == 0.0));
    }

    #[test]
    fn test_from_bytes() {
        let table = AlphaCorrectionTable::identity();
        let copy = AlphaCorrectionTable::from_bytes(table.as_bytes()).unwrap();
        assert!(copy == table);
        assert_eq!(copy.lookup(3, 77), 77);
        assert!(AlphaCorrectionTable::from_bytes(&[0; 255]).is_err());
    }

    #[test]
    fn test_default_table_is_shared() {
        let table = AlphaCorrectionTable::default_table();
        assert!(std::ptr::eq(table, AlphaCorrectionTable::default_table()));
        assert!(*table != AlphaCorrectionTable::identity());
    }
}
