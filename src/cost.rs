//! Token-vector to USD conversion at micro precision.

use std::collections::HashMap;

use crate::error::{MonitorError, Result};
use crate::models::TokenVector;
use crate::pricing::{normalize_model, rates_for_category, resolve_category, ModelCategory};
use crate::utils::round_decimals;

/// Internal cost precision in decimal places (micro-USD).
pub const MICRO_DECIMALS: u32 = 6;

/// Memoized cost calculator.
///
/// Owned by the facade, never a hidden global; the memo map is append-only
/// during a compute call and keyed on the full `(model, tokens)` tuple so
/// identical records hit the cache.
pub struct CostCalculator {
    strict: bool,
    decimals: u32,
    memo: HashMap<(String, u64, u64, u64, u64), f64>,
}

impl CostCalculator {
    pub fn new(strict: bool) -> Self {
        Self::with_precision(strict, MICRO_DECIMALS)
    }

    pub fn with_precision(strict: bool, decimals: u32) -> Self {
        CostCalculator {
            strict,
            decimals,
            memo: HashMap::new(),
        }
    }

    /// USD cost of one token vector under the given model's rates, rounded
    /// half-away-from-zero at 6 decimals.
    ///
    /// Unknown models fall back to sonnet rates unless strict mode is on, in
    /// which case the compute call fails with [`MonitorError::UnknownModel`].
    pub fn cost(&mut self, model: &str, tokens: TokenVector) -> Result<f64> {
        let key = (
            normalize_model(model),
            tokens.input,
            tokens.output,
            tokens.cache_create,
            tokens.cache_read,
        );
        if let Some(&cached) = self.memo.get(&key) {
            return Ok(cached);
        }

        let category = match resolve_category(model) {
            Some(cat) => cat,
            None if self.strict => return Err(MonitorError::UnknownModel(model.to_string())),
            None => ModelCategory::Sonnet,
        };
        let rates = rates_for_category(category);

        let usd = round_decimals(
            (tokens.input as f64 / 1e6) * rates.input_per_mtok
                + (tokens.output as f64 / 1e6) * rates.output_per_mtok
                + (tokens.cache_create as f64 / 1e6) * rates.cache_create_per_mtok
                + (tokens.cache_read as f64 / 1e6) * rates.cache_read_per_mtok,
            self.decimals,
        );
        self.memo.insert(key, usd);
        Ok(usd)
    }

    #[cfg(test)]
    fn memo_len(&self) -> usize {
        self.memo.len()
    }
}
