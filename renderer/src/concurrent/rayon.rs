// lcdglyph/renderer/src/concurrent/rayon.rs
//
// Copyright © 2020 The lcdglyph Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! An implementation of the executor using the Rayon library.

use crate::concurrent::executor::Executor;
use ::rayon::iter::{IntoParallelIterator, ParallelIterator};

/// Spreads jobs over the global Rayon thread pool.
pub struct RayonExecutor;

impl Executor for RayonExecutor {
    fn flatten_into_vector<T, F>(&self, length: usize, builder: F) -> Vec<T>
                                 where T: Send, F: Fn(usize) -> Vec<T> + Send + Sync {
        // `collect` on an indexed iterator keeps job order; `flatten` afterwards keeps item order.
        let jobs: Vec<Vec<T>> = (0..length).into_par_iter().map(|index| builder(index)).collect();
        let mut items = Vec::with_capacity(jobs.iter().map(|job| job.len()).sum());
        for job in jobs {
            items.extend(job.into_iter());
        }
        items
    }

    #[inline]
    fn name(&self) -> &'static str {
        "rayon"
    }
}
