//! The fault injector: out of scope for the hard core, specified here only
//! through the interface the generator drives it through.

use anyhow::Result;

/// A fault injector the generator can call between operations.
///
/// No concrete fault (process kill, network partition) is implemented here —
/// that remains an external collaborator. `inject`/`heal` exist so a
/// downstream integrator can plug one in without touching
/// [`crate::generator::Generator`].
pub trait Nemesis: Send {
    fn inject(&mut self) -> Result<()>;
    fn heal(&mut self) -> Result<()>;
}

/// Does nothing. The default when `--nodes` is not given or no nemesis is
/// configured.
pub struct NoOpNemesis;

impl Nemesis for NoOpNemesis {
    fn inject(&mut self) -> Result<()> {
        Ok(())
    }

    fn heal(&mut self) -> Result<()> {
        Ok(())
    }
}
