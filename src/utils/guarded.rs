use parking_lot::Mutex;
use parking_lot::MutexGuard;

/// Mutable state paired with the one mutex that protects it.
///
/// All access goes through a guard, so the lock is released on every exit
/// path of the critical section, including unwinding.
#[derive(Debug, Default)]
pub struct Guarded<T> {
    inner: Mutex<T>,
}

impl<T> Guarded<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    #[inline]
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.inner.lock()
    }

    /// Runs `f` while holding the lock and returns its result.
    ///
    /// `f` must not await or call back into code that could take this lock.
    #[inline]
    pub fn do_under_lock<R>(
        &self,
        f: impl FnOnce(&mut T) -> R,
    ) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}
