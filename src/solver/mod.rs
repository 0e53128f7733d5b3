use std::fmt;
use std::str::FromStr;

use log::warn;
use ndarray::Array2;

use crate::error::ConfigError;
use crate::threads::{Join, Split, WorkerPool};

pub mod bands;
pub mod escape;
pub mod field;
pub mod serial;
pub mod stealing;

pub use bands::BandSolver;
pub use escape::{evaluate, Escape, EscapeMode, BAILOUT_RADIUS};
pub use field::{EscapeField, FieldBand, FieldRequest, FieldStats, RowBand};
pub use serial::SerialSolver;
pub use stealing::RayonSolver;

/// Evaluates a whole frame. Implementations differ only in how pixels are
/// partitioned across threads; the resulting fields are bit-identical.
pub trait FieldSolver {
    fn compute(&self, request: &FieldRequest) -> EscapeField;
}

pub type FieldPool = WorkerPool<RowBand, FieldBand>;

pub fn pool(threads: usize) -> FieldPool {
    WorkerPool::with(threads, || |band: RowBand| band.solve())
}

impl FieldSolver for FieldPool {
    fn compute(&self, request: &FieldRequest) -> EscapeField {
        let joined = self
            .run(request.parts(self.size()))
            .and_then(Array2::<f64>::join_parts);
        match joined {
            Ok(values) => request.finish(values),
            Err(e) => {
                warn!("worker pool pass failed ({}), recomputing serially", e);
                SerialSolver.compute(request)
            }
        }
    }
}

/// How a compute pass is partitioned. A thread count of 0 means one per
/// physical core.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Strategy {
    Serial,
    Bands(usize),
    Pool(usize),
    Rayon(usize),
}

impl Default for Strategy {
    fn default() -> Self {
        Self::Pool(0)
    }
}

impl FromStr for Strategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, threads) = match s.split_once(':') {
            Some((name, n)) => match n.parse::<usize>() {
                Ok(n) => (name, n),
                Err(_) => return Err(ConfigError::UnknownStrategy(s.to_string())),
            },
            None => (s, 0),
        };
        match name {
            "serial" => Ok(Self::Serial),
            "bands" => Ok(Self::Bands(threads)),
            "pool" => Ok(Self::Pool(threads)),
            "rayon" => Ok(Self::Rayon(threads)),
            _ => Err(ConfigError::UnknownStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serial => write!(f, "serial"),
            Self::Bands(n) => write!(f, "bands:{}", n),
            Self::Pool(n) => write!(f, "pool:{}", n),
            Self::Rayon(n) => write!(f, "rayon:{}", n),
        }
    }
}

pub fn physical_threads(n: usize) -> usize {
    if n == 0 {
        num_cpus::get_physical()
    } else {
        n
    }
}

pub fn make_solver(strategy: Strategy) -> Box<dyn FieldSolver + Send> {
    match strategy {
        Strategy::Serial => Box::new(SerialSolver),
        Strategy::Bands(n) => Box::new(BandSolver::new(physical_threads(n))),
        Strategy::Pool(n) => Box::new(pool(physical_threads(n))),
        Strategy::Rayon(n) => Box::new(RayonSolver::new(n)),
    }
}
