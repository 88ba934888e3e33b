//! Arena configuration parameters.

use freepool_core::AllocError;

/// Configuration for a fixed-capacity arena.
///
/// The capacity is counted in element slots, not bytes: an arena for `T`
/// reserves `capacity * size_of::<T>()` bytes up front. Validated at arena
/// construction; immutable after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of element slots the arena reserves.
    ///
    /// Default: 1_000_000. The arena never grows past this ceiling; once it
    /// is exhausted (or fragmented) allocation fails with
    /// [`AllocError::OutOfMemory`].
    pub capacity: usize,
}

impl PoolConfig {
    /// Default arena capacity: one million elements of the arena's type.
    pub const DEFAULT_CAPACITY: usize = 1_000_000;

    /// Create a config with the given slot capacity.
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Bytes of backing storage an arena for `T` would reserve.
    ///
    /// Returns `None` if the byte count overflows `usize`.
    pub fn storage_bytes<T>(&self) -> Option<usize> {
        self.capacity.checked_mul(std::mem::size_of::<T>())
    }

    /// Check that an arena for `T` can be built from this config.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError::InvalidConfig`] if the capacity is zero or the
    /// storage size does not fit in `isize::MAX` bytes.
    pub fn validate<T>(&self) -> Result<(), AllocError> {
        if self.capacity == 0 {
            return Err(AllocError::InvalidConfig {
                reason: "capacity must be at least one slot".into(),
            });
        }
        match self.storage_bytes::<T>() {
            Some(bytes) if bytes <= isize::MAX as usize => Ok(()),
            _ => Err(AllocError::InvalidConfig {
                reason: format!(
                    "{} slots of {} bytes exceed the addressable limit",
                    self.capacity,
                    std::mem::size_of::<T>()
                ),
            }),
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
