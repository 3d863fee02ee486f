//! Module lock hierarchy: fdb -> bridge -> lag.
//!
//! The order is enforced by the guard types. The bridge lock can only be
//! taken from a held [`FdbGuard`] (or standalone, for collaborator paths that
//! do not touch the cache), and the LAG lock only from a held
//! [`BridgeHeld`]. Each inner guard borrows the outer one, so it is released
//! first. STP state is never locked from here; collaborators expose it
//! through a query that manages its own locking.

use parking_lot::{Mutex, MutexGuard};
use std::ops::{Deref, DerefMut};

/// Locks owned by the bridge and LAG collaborators, shared with the FDB core.
#[derive(Debug, Default)]
pub struct ModuleLocks {
    bridge: Mutex<()>,
    lag: Mutex<()>,
}

impl ModuleLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the bridge lock without the fdb lock.
    ///
    /// For bridge/VLAN/LAG call paths that never enter the FDB cache; a
    /// caller holding this must not then try to take the fdb lock.
    pub fn lock_bridge(&self) -> BridgeHeld<'_> {
        BridgeHeld {
            _guard: self.bridge.lock(),
            lag: &self.lag,
        }
    }
}

/// Proof that the bridge lock is held.
pub struct BridgeHeld<'a> {
    _guard: MutexGuard<'a, ()>,
    lag: &'a Mutex<()>,
}

impl BridgeHeld<'_> {
    pub fn lock_lag(&self) -> LagHeld<'_> {
        LagHeld {
            _guard: self.lag.lock(),
        }
    }
}

/// Proof that the LAG lock is held (and therefore the bridge lock too).
pub struct LagHeld<'a> {
    _guard: MutexGuard<'a, ()>,
}

/// Held fdb lock over the protected value `T`.
pub struct FdbGuard<'a, T> {
    inner: MutexGuard<'a, T>,
    locks: &'a ModuleLocks,
}

impl<'a, T> FdbGuard<'a, T> {
    pub(crate) fn new(inner: MutexGuard<'a, T>, locks: &'a ModuleLocks) -> Self {
        Self { inner, locks }
    }

    /// Takes the bridge lock under the fdb lock. The protected value stays
    /// reachable through the returned reference while both are held.
    pub fn lock_bridge(&mut self) -> (&mut T, BridgeHeld<'_>) {
        let bridge = self.locks.lock_bridge();
        (&mut *self.inner, bridge)
    }
}

impl<T> Deref for FdbGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T> DerefMut for FdbGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_nested_acquisition() {
        let locks = ModuleLocks::new();
        let table = Mutex::new(0u32);

        let mut guard = FdbGuard::new(table.lock(), &locks);
        *guard += 1;
        {
            let (value, bridge) = guard.lock_bridge();
            let _lag = bridge.lock_lag();
            *value += 1;
        }
        assert_eq!(*guard, 2);
    }

    #[test]
    fn test_bridge_released_with_guard() {
        let locks = Arc::new(ModuleLocks::new());
        let table = Mutex::new(());
        {
            let mut guard = FdbGuard::new(table.lock(), &locks);
            let _ = guard.lock_bridge();
        }

        let other = Arc::clone(&locks);
        let handle = thread::spawn(move || {
            let bridge = other.lock_bridge();
            let _lag = bridge.lock_lag();
        });
        assert!(handle.join().is_ok());
    }
}
