use burnup_core::{CompBundle, Cursor, FissionYields, ReducedOrderSolver, TimeIncrement};

use super::{Coupling, Scheme, combine};
use crate::Error;

/// Four-stage Runge-Kutta analogue.
///
/// Samples reaction rates at `t`, twice at `t + dt/2`, and at `t + dt`,
/// each sample driving the next intermediate depletion from the starting
/// compositions. The final depletion uses the `(1, 2, 2, 1) / 6` weighted
/// mean of the four samples.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rk4;

impl Scheme for Rk4 {
    fn name(&self) -> &'static str {
        "rk4"
    }

    fn step<R: ReducedOrderSolver>(
        &self,
        coupling: &mut Coupling<'_, R>,
        cursor: &Cursor,
        dt: TimeIncrement,
        compositions: &CompBundle,
        flux: &[f64],
        yields: &[FissionYields],
    ) -> Result<CompBundle, Error> {
        let start = cursor.seconds();
        let half = dt * 0.5;
        let middle = start + half.seconds();
        let end = start + dt.seconds();

        let rr0 = coupling.rates_at(start, flux)?;
        let comp1 = coupling.deplete(half, compositions, &rr0, yields)?;

        let flux1 = coupling.intermediate_flux(cursor, middle, &comp1)?;
        let rr1 = coupling.rates_at(middle, &flux1)?;
        let comp2 = coupling.deplete(half, compositions, &rr1, yields)?;

        let flux2 = coupling.intermediate_flux(cursor, middle, &comp2)?;
        let rr2 = coupling.rates_at(middle, &flux2)?;
        let comp3 = coupling.deplete(dt, compositions, &rr2, yields)?;

        let flux3 = coupling.intermediate_flux(cursor, end, &comp3)?;
        let rr3 = coupling.rates_at(end, &flux3)?;

        let sixth = 1.0 / 6.0;
        let mean = combine(&[
            (sixth, rr0.as_slice()),
            (2.0 * sixth, rr1.as_slice()),
            (2.0 * sixth, rr2.as_slice()),
            (sixth, rr3.as_slice()),
        ])?;
        coupling.deplete(dt, compositions, &mean, yields)
    }
}
