//! Spinlock implementation

use spin::mutex::{SpinMutex, SpinMutexGuard};

/// A busy-waiting lock protecting `T`
///
/// Never sleeps, so it can guard structures touched from latency-sensitive
/// contexts such as the priority list's consumer loop.
pub struct Spinlock<T> {
    inner: SpinMutex<T>,
}

/// RAII guard for [`Spinlock`]; the lock is released on drop
pub type SpinlockGuard<'a, T> = SpinMutexGuard<'a, T>;

impl<T> Spinlock<T> {
    /// Create a new, unlocked spinlock
    pub const fn new(data: T) -> Self {
        Self {
            inner: SpinMutex::new(data),
        }
    }

    /// Acquire the lock, spinning until it is free
    pub fn lock(&self) -> SpinlockGuard<'_, T> {
        self.inner.lock()
    }

    /// Try to acquire the lock without spinning
    pub fn try_lock(&self) -> Option<SpinlockGuard<'_, T>> {
        self.inner.try_lock()
    }

    /// Run `f` with the lock held
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.lock();
        f(&mut guard)
    }

    /// Whether some holder currently owns the lock
    ///
    /// Racy by nature; only useful for assertions.
    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }

    /// Mutable access without locking, proven exclusive by `&mut self`
    pub fn get_mut(&mut self) -> &mut T {
        self.inner.get_mut()
    }

    /// Consume the lock and return the protected value
    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}

impl<T: Default> Default for Spinlock<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: core::fmt::Debug> core::fmt::Debug for Spinlock<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.try_lock() {
            Some(guard) => f.debug_struct("Spinlock").field("data", &*guard).finish(),
            None => f.write_str("Spinlock { <locked> }"),
        }
    }
}
