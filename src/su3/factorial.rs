//! Contain factorial utilities use in matrix exponential function.

use std::fmt::{self, Display};

/// Number that can be stored in the static storage.
pub type FactorialNumber = u128;

/// Largest number `n` such that `n!` fits in a [`FactorialNumber`].
pub const MAX_NUMBER_FACTORIAL: usize = 34;

/// Size of the array for [`FactorialStorageStatic`]
const FACTORIAL_STORAGE_STAT_SIZE: usize = MAX_NUMBER_FACTORIAL + 1;

/// Static store for factorial number.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct FactorialStorageStatic {
    /// data store as an array (which is not growing)
    data: [FactorialNumber; FACTORIAL_STORAGE_STAT_SIZE],
}

impl FactorialStorageStatic {
    /// compile time evaluation of all 34 factorial numbers
    #[allow(clippy::as_conversions)] // constant function cant use try into.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        let mut data: [FactorialNumber; FACTORIAL_STORAGE_STAT_SIZE] =
            [1; FACTORIAL_STORAGE_STAT_SIZE];
        let mut i = 1;
        while i < FACTORIAL_STORAGE_STAT_SIZE {
            data[i] = data[i - 1] * i as FactorialNumber;
            i += 1;
        }
        Self { data }
    }

    /// access in O(1). Return None if `value` is bigger than 34.
    #[inline]
    #[must_use]
    pub fn try_get_factorial(&self, value: usize) -> Option<&FactorialNumber> {
        self.data.get(value)
    }
}

impl Default for FactorialStorageStatic {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Display for FactorialStorageStatic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "factorial Storage : ")?;
        for (i, n) in self.data.iter().enumerate() {
            write!(f, "{i}! = {n}")?;
            if i < self.data.len() - 1 {
                write!(f, ", ")?;
            }
        }
        Ok(())
    }
}

/// factorial number storage in order to find the exponential in O(1) for a set storage
/// the set if for all number `N` such that `\frac{1}{(N-7)!} >= \mathrm{f64::EPSILON}`
pub const FACTORIAL_STORAGE_STAT: FactorialStorageStatic = FactorialStorageStatic::new();

#[cfg(test)]
mod test {
    use super::{super::N, FactorialStorageStatic, FACTORIAL_STORAGE_STAT};
    use crate::Real;

    /// Return N such that `1/(N-7)!` < [`f64::EPSILON`].
    #[allow(clippy::as_conversions)] // no try into for f64
    #[allow(clippy::cast_precision_loss)]
    fn factorial_size_for_exp() -> usize {
        let mut n: usize = 7;
        let mut factorial_value = 1;
        while 1_f64 / (factorial_value as f64) >= Real::EPSILON {
            n += 1;
            factorial_value *= n - 7;
        }
        n
    }

    #[test]
    /// test that [`N`] is indeed what we need
    fn test_constant() {
        assert_eq!(N, factorial_size_for_exp() + 1);
    }

    #[test]
    fn factorial_storage() {
        let storage = FactorialStorageStatic::default();
        let mut expected = 1_u128;
        for i in 0..=34_u32 {
            if i > 0 {
                expected *= u128::from(i);
            }
            assert_eq!(storage.try_get_factorial(i as usize), Some(&expected));
        }
        assert!(FACTORIAL_STORAGE_STAT.try_get_factorial(35).is_none());
        assert_eq!(storage, FACTORIAL_STORAGE_STAT);
        assert!(storage.to_string().starts_with("factorial Storage : 0! = 1"));
    }
}
