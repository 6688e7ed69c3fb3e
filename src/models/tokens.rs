use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

/// Token counts for one record or one aggregate.
///
/// `usage()` is input + output only; `total()` additionally counts both
/// cache components. The distinction matters: percentages and the facade's
/// `token_usage` metric use the usage sum, while burn rates and P90 token
/// limits operate on the total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenVector {
    pub input: u64,
    pub output: u64,
    pub cache_create: u64,
    pub cache_read: u64,
}

impl TokenVector {
    pub fn new(input: u64, output: u64, cache_create: u64, cache_read: u64) -> Self {
        Self {
            input,
            output,
            cache_create,
            cache_read,
        }
    }

    /// Input + output tokens.
    pub fn usage(&self) -> u64 {
        self.input + self.output
    }

    /// All four components.
    pub fn total(&self) -> u64 {
        self.input + self.output + self.cache_create + self.cache_read
    }

    pub fn is_zero(&self) -> bool {
        self.total() == 0
    }
}

impl Add for TokenVector {
    type Output = TokenVector;

    fn add(self, rhs: TokenVector) -> TokenVector {
        TokenVector {
            input: self.input + rhs.input,
            output: self.output + rhs.output,
            cache_create: self.cache_create + rhs.cache_create,
            cache_read: self.cache_read + rhs.cache_read,
        }
    }
}

impl AddAssign for TokenVector {
    fn add_assign(&mut self, rhs: TokenVector) {
        self.input += rhs.input;
        self.output += rhs.output;
        self.cache_create += rhs.cache_create;
        self.cache_read += rhs.cache_read;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_and_total() {
        let v = TokenVector::new(1000, 500, 200, 100);
        assert_eq!(v.usage(), 1500);
        assert_eq!(v.total(), 1800);
        assert!(!v.is_zero());
        assert!(TokenVector::default().is_zero());
    }

    #[test]
    fn test_addition_is_componentwise() {
        let a = TokenVector::new(1, 2, 3, 4);
        let b = TokenVector::new(10, 20, 30, 40);
        let sum = a + b;
        assert_eq!(sum, TokenVector::new(11, 22, 33, 44));

        let mut acc = a;
        acc += b;
        assert_eq!(acc, sum);
    }
}
