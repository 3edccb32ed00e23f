//! Synchronous observer hooks: `PostInitialise`, `PostIteration`,
//! `PostUpdate`, `PreFinalise`. Handlers receive a read-only snapshot and
//! must not (cannot, since it is owned and detached) mutate core state.
//! An error returned by a handler is propagated to the caller of `run`/
//! `next` as a [`gpso_error::GpsoError::Observer`].

use gpso_error::GpsoResult;

/// A read-only, owned snapshot of optimizer state at the point a hook
/// fires. Detached from the optimizer so handlers cannot reach back into
/// its mutable state even by accident.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub iteration: usize,
    pub xi: f64,
    pub lb: f64,
    pub ne: usize,
    pub ng: usize,
    pub ns: usize,
}

/// Implemented by anything that wants to observe an optimization run.
/// Every method has a no-op default, so a handler interested in only one
/// event overrides only that one.
pub trait Observer {
    fn post_initialise(&mut self, _snapshot: &Snapshot) -> GpsoResult<()> {
        Ok(())
    }

    fn post_iteration(&mut self, _snapshot: &Snapshot) -> GpsoResult<()> {
        Ok(())
    }

    fn post_update(&mut self, _snapshot: &Snapshot) -> GpsoResult<()> {
        Ok(())
    }

    fn pre_finalise(&mut self, _snapshot: &Snapshot) -> GpsoResult<()> {
        Ok(())
    }
}
