use burnup_core::{CompBundle, Cursor, FissionYields, ReducedOrderSolver, TimeIncrement};

use super::{Coupling, Scheme, combine};
use crate::Error;

/// Constant-extrapolation, linear-interpolation predictor-corrector.
///
/// 1. Predict end-of-interval compositions with beginning-of-step rates.
/// 2. Evaluate the reduced-order solver on the prediction at `t + dt`.
/// 3. Deplete the starting compositions with the mean of the beginning and
///    end-of-interval rates.
#[derive(Debug, Clone, Copy, Default)]
pub struct Celi;

impl Scheme for Celi {
    fn name(&self) -> &'static str {
        "ce/li"
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
        let end = start + dt.seconds();

        let bos = coupling.rates_at(start, flux)?;
        let predicted = coupling.deplete(dt, compositions, &bos, yields)?;

        let eos_flux = coupling.intermediate_flux(cursor, end, &predicted)?;
        let eos = coupling.rates_at(end, &eos_flux)?;

        let mean = combine(&[(0.5, bos.as_slice()), (0.5, eos.as_slice())])?;
        coupling.deplete(dt, compositions, &mean, yields)
    }
}
