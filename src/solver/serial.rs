use crate::solver::{EscapeField, FieldRequest, FieldSolver};

/// Row-major, single thread. The reference every other strategy must match.
#[derive(Clone, Copy, Debug, Default)]
pub struct SerialSolver;

impl FieldSolver for SerialSolver {
    fn compute(&self, request: &FieldRequest) -> EscapeField {
        let mut values = request.allocate();
        request.fill_rows(0, values.view_mut());
        request.finish(values)
    }
}
