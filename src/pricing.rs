//! # Pricing Module
//!
//! Model pricing for cost calculations, keyed by a canonical model category.
//!
//! ## Pricing Structure
//!
//! Each category has per-million-token rates for:
//! - Input tokens
//! - Output tokens
//! - Cache creation (1.25x input unless set explicitly)
//! - Cache reads (0.1x input unless set explicitly)
//!
//! Model identifiers are normalized (lowercased, trimmed, date and version
//! suffixes stripped) before lookup; identifiers the table does not know are
//! resolved by family substring.

use once_cell::sync::Lazy;
use regex::Regex;

/// Sentinel model emitted by the assistant for synthesized messages; always
/// free regardless of token counts.
pub const SYNTHETIC_MODEL: &str = "<synthetic>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelCategory {
    Opus,
    Sonnet,
    Haiku,
    Synthetic,
}

/// USD per 1,000,000 tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    pub input_per_mtok: f64,
    pub output_per_mtok: f64,
    pub cache_create_per_mtok: f64,
    pub cache_read_per_mtok: f64,
}

impl ModelPricing {
    /// Standard cache multipliers: creation at 1.25x input, reads at 0.1x.
    fn with_default_cache(input: f64, output: f64) -> Self {
        ModelPricing {
            input_per_mtok: input,
            output_per_mtok: output,
            cache_create_per_mtok: input * 1.25,
            cache_read_per_mtok: input * 0.1,
        }
    }

    const ZERO: ModelPricing = ModelPricing {
        input_per_mtok: 0.0,
        output_per_mtok: 0.0,
        cache_create_per_mtok: 0.0,
        cache_read_per_mtok: 0.0,
    };
}

pub fn rates_for_category(category: ModelCategory) -> ModelPricing {
    match category {
        ModelCategory::Opus => ModelPricing::with_default_cache(15.0, 75.0),
        ModelCategory::Sonnet => ModelPricing::with_default_cache(3.0, 15.0),
        ModelCategory::Haiku => ModelPricing::with_default_cache(0.25, 1.25),
        ModelCategory::Synthetic => ModelPricing::ZERO,
    }
}

// Trailing -YYYYMMDD release date, e.g. claude-3-5-sonnet-20241022
static DATE_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"-\d{8}$").unwrap());
// Trailing -N-M version pair, e.g. claude-opus-4-1
static VERSION_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"-\d+-\d+$").unwrap());

/// Canonical form of a model identifier: lowercased, trimmed, with release
/// date and version suffixes removed.
pub fn normalize_model(model: &str) -> String {
    let m = model.trim().to_lowercase();
    let m = DATE_SUFFIX.replace(&m, "");
    VERSION_SUFFIX.replace(&m, "").into_owned()
}

/// Known full identifiers after normalization.
fn table_lookup(normalized: &str) -> Option<ModelCategory> {
    let category = match normalized {
        "claude-3-opus" | "claude-opus" | "claude-opus-4" => ModelCategory::Opus,
        "claude-3-5-sonnet" | "claude-3-7-sonnet" | "claude-sonnet" | "claude-sonnet-4"
        | "claude-4-sonnet" => ModelCategory::Sonnet,
        "claude-3-haiku" | "claude-3-5-haiku" | "claude-haiku" | "claude-haiku-4" => {
            ModelCategory::Haiku
        }
        SYNTHETIC_MODEL => ModelCategory::Synthetic,
        _ => return None,
    };
    Some(category)
}

/// Resolve a raw model identifier to its pricing category.
///
/// Returns `None` when neither the lookup table nor a family substring
/// matches; the cost calculator decides whether that is an error (strict
/// mode) or a sonnet fallback.
pub fn resolve_category(model: &str) -> Option<ModelCategory> {
    let normalized = normalize_model(model);
    if let Some(cat) = table_lookup(&normalized) {
        return Some(cat);
    }
    if normalized.contains("opus") {
        Some(ModelCategory::Opus)
    } else if normalized.contains("haiku") {
        Some(ModelCategory::Haiku)
    } else if normalized.contains("sonnet") {
        Some(ModelCategory::Sonnet)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_date_suffix() {
        assert_eq!(normalize_model("claude-3-5-sonnet-20241022"), "claude-3-5-sonnet");
        assert_eq!(normalize_model("  Claude-3-Opus-20240229 "), "claude-3-opus");
    }

    #[test]
    fn test_normalize_strips_version_suffix() {
        assert_eq!(normalize_model("claude-opus-4-1"), "claude-opus");
        assert_eq!(normalize_model("claude-sonnet-4-5"), "claude-sonnet");
        // Date strips before version, so both go
        assert_eq!(normalize_model("claude-opus-4-1-20250805"), "claude-opus");
    }

    #[test]
    fn test_category_table_and_substring_fallback() {
        assert_eq!(resolve_category("claude-3-5-sonnet"), Some(ModelCategory::Sonnet));
        assert_eq!(resolve_category("claude-3-opus"), Some(ModelCategory::Opus));
        assert_eq!(resolve_category("claude-3-5-haiku"), Some(ModelCategory::Haiku));
        // Unknown variants resolve by family substring
        assert_eq!(
            resolve_category("some-future-opus-model"),
            Some(ModelCategory::Opus)
        );
        assert_eq!(
            resolve_category("experimental-haiku-lite"),
            Some(ModelCategory::Haiku)
        );
        assert_eq!(resolve_category("totally-unknown"), None);
    }

    #[test]
    fn test_rates_for_known_categories() {
        let sonnet = rates_for_category(ModelCategory::Sonnet);
        assert_eq!(sonnet.input_per_mtok, 3.0);
        assert_eq!(sonnet.output_per_mtok, 15.0);
        assert_eq!(sonnet.cache_create_per_mtok, 3.75);
        assert!((sonnet.cache_read_per_mtok - 0.3).abs() < 1e-12);

        let opus = rates_for_category(ModelCategory::Opus);
        assert_eq!(opus.input_per_mtok, 15.0);
        assert_eq!(opus.output_per_mtok, 75.0);
        assert_eq!(opus.cache_create_per_mtok, 18.75);
        assert_eq!(opus.cache_read_per_mtok, 1.5);

        let haiku = rates_for_category(ModelCategory::Haiku);
        assert_eq!(haiku.input_per_mtok, 0.25);
        assert_eq!(haiku.output_per_mtok, 1.25);
    }

    #[test]
    fn test_synthetic_model_is_free() {
        assert_eq!(resolve_category("<synthetic>"), Some(ModelCategory::Synthetic));
        let rates = rates_for_category(ModelCategory::Synthetic);
        assert_eq!(rates.input_per_mtok, 0.0);
        assert_eq!(rates.output_per_mtok, 0.0);
    }
}
