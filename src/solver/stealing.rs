use log::warn;
use ndarray::Zip;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::solver::{EscapeField, FieldRequest, FieldSolver};

/// Per-pixel work stealing on rayon. With `threads == 0` the global rayon
/// pool is used.
pub struct RayonSolver {
    pool: Option<ThreadPool>,
}

impl RayonSolver {
    pub fn new(threads: usize) -> Self {
        if threads == 0 {
            return Self { pool: None };
        }
        match ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => Self { pool: Some(pool) },
            Err(e) => {
                warn!(
                    "could not build a {}-thread rayon pool, using the global one: {}",
                    threads, e
                );
                Self { pool: None }
            }
        }
    }

    fn fill(request: &FieldRequest) -> EscapeField {
        let mut values = request.allocate();
        Zip::indexed(&mut values).par_for_each(|(py, px), v| *v = request.pixel(px, py));
        request.finish(values)
    }
}

impl Default for RayonSolver {
    fn default() -> Self {
        Self::new(0)
    }
}

impl FieldSolver for RayonSolver {
    fn compute(&self, request: &FieldRequest) -> EscapeField {
        match &self.pool {
            Some(pool) => pool.install(|| Self::fill(request)),
            None => Self::fill(request),
        }
    }
}
