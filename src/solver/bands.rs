use std::thread;

use log::trace;
use ndarray::Axis;

use crate::solver::{EscapeField, FieldRequest, FieldSolver};
use crate::threads::RangeSplitter;

/// Cuts the pre-allocated output into disjoint row bands and fills each on
/// its own scoped thread. The scope is the join barrier.
#[derive(Clone, Copy, Debug)]
pub struct BandSolver {
    bands: usize,
}

impl BandSolver {
    pub fn new(bands: usize) -> Self {
        Self {
            bands: bands.max(1),
        }
    }
}

impl FieldSolver for BandSolver {
    fn compute(&self, request: &FieldRequest) -> EscapeField {
        let request = *request;
        let mut values = request.allocate();

        let mut rest = values.view_mut();
        let mut bands = Vec::with_capacity(self.bands);
        for (start, end) in RangeSplitter::split(0, request.height(), self.bands) {
            let (band, tail) = rest.split_at(Axis(0), end - start);
            bands.push((start, band));
            rest = tail;
        }

        thread::scope(|scope| {
            for (start, band) in bands {
                scope.spawn(move || {
                    trace!("band from row {} ({} rows)", start, band.nrows());
                    request.fill_rows(start, band);
                });
            }
        });

        request.finish(values)
    }
}
