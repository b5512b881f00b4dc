//! Mutex wrapper - uses parking_lot if available, std otherwise.

#[cfg(feature = "parking_lot")]
pub use parking_lot::Mutex;

#[cfg(not(feature = "parking_lot"))]
mod fallback {
    use std::sync::{MutexGuard, PoisonError};

    /// Thin wrapper around `std::sync::Mutex` with the `parking_lot`
    /// locking interface.
    pub struct Mutex<T>(std::sync::Mutex<T>);

    impl<T> Mutex<T> {
        /// Create a new mutex.
        pub const fn new(value: T) -> Self {
            Self(std::sync::Mutex::new(value))
        }

        /// Lock the mutex.
        ///
        /// Poisoning is ignored: the guarded state is plain bookkeeping
        /// data, and a panicking thread must not wedge teardown paths on
        /// every other thread.
        pub fn lock(&self) -> MutexGuard<'_, T> {
            self.0.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }
}

#[cfg(not(feature = "parking_lot"))]
pub use fallback::Mutex;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_roundtrip() {
        let mutex = Mutex::new(vec![1u32]);
        mutex.lock().push(2);
        assert_eq!(*mutex.lock(), vec![1, 2]);
    }
}
