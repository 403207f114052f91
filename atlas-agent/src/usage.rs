//! Token usage accounting and cost estimation (spec §4.2).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Breakdown of an LLM provider's cache accounting for one call's input tokens.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct InputTokenDetails {
    pub cache_read: u64,
    pub cache_creation: u64,
}

/// Breakdown of an LLM provider's reasoning/output accounting, when reported.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct OutputTokenDetails {
    pub reasoning_tokens: u64,
}

/// One LLM call's token accounting, tagged with the node and pipeline it ran under.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UsageRecord {
    pub node: String,
    /// `"sql"`, `"graphql"`, `"docs"`, or `"agent"`.
    pub tool_pipeline: String,
    pub model_name: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    pub input_token_details: Option<InputTokenDetails>,
    pub output_token_details: Option<OutputTokenDetails>,
}

#[allow(clippy::too_many_arguments)]
pub fn make_usage_record(
    node: impl Into<String>,
    tool_pipeline: impl Into<String>,
    input_tokens: u64,
    output_tokens: u64,
    total_tokens: u64,
    model_name: impl Into<String>,
    input_token_details: Option<InputTokenDetails>,
    output_token_details: Option<OutputTokenDetails>,
) -> UsageRecord {
    UsageRecord {
        node: node.into(),
        tool_pipeline: tool_pipeline.into(),
        model_name: model_name.into(),
        input_tokens,
        output_tokens,
        total_tokens,
        input_token_details,
        output_token_details,
    }
}

/// Builds a `UsageRecord` off the `usage_metadata` attached to a returned `Message::Ai`.
pub fn usage_record_from_llm_usage(
    node: impl Into<String>,
    tool_pipeline: impl Into<String>,
    model_name: impl Into<String>,
    usage: &crate::llm::LlmUsage,
) -> UsageRecord {
    make_usage_record(
        node,
        tool_pipeline,
        usage.prompt_tokens as u64,
        usage.completion_tokens as u64,
        usage.total_tokens as u64,
        model_name,
        None,
        None,
    )
}

/// Per-1M-token rates for one model.
#[derive(Clone, Copy, Debug)]
pub struct ModelPricing {
    pub input: f64,
    pub output: f64,
    pub cache_read: f64,
    pub cache_creation: f64,
}

const DEFAULT_PRICING: ModelPricing = ModelPricing {
    input: 2.50,
    output: 10.00,
    cache_read: 0.25,
    cache_creation: 3.75,
};

fn pricing_table() -> &'static [(&'static str, ModelPricing)] {
    &[
        (
            "gpt-4o",
            ModelPricing {
                input: 2.50,
                output: 10.00,
                cache_read: 1.25,
                cache_creation: 2.50,
            },
        ),
        (
            "gpt-4o-mini",
            ModelPricing {
                input: 0.15,
                output: 0.60,
                cache_read: 0.075,
                cache_creation: 0.15,
            },
        ),
        (
            "claude-3-5-sonnet",
            ModelPricing {
                input: 3.00,
                output: 15.00,
                cache_read: 0.30,
                cache_creation: 3.75,
            },
        ),
        (
            "gemini-1.5-pro",
            ModelPricing {
                input: 1.25,
                output: 5.00,
                cache_read: 0.3125,
                cache_creation: 1.25,
            },
        ),
    ]
}

/// Resolves pricing for `model_name`: exact match, then with a trailing
/// `-YYYY-MM-DD` date suffix stripped, then the default pricing record.
/// Total over `model_name` (spec §8 property 8: "pricing lookup is total").
pub fn resolve_pricing(model_name: &str) -> ModelPricing {
    if let Some((_, p)) = pricing_table().iter().find(|(name, _)| *name == model_name) {
        return *p;
    }
    let stripped = strip_date_suffix(model_name);
    if stripped != model_name {
        if let Some((_, p)) = pricing_table().iter().find(|(name, _)| *name == stripped) {
            return *p;
        }
    }
    DEFAULT_PRICING
}

fn strip_date_suffix(model_name: &str) -> &str {
    let bytes = model_name.as_bytes();
    if bytes.len() < 11 {
        return model_name;
    }
    let tail = &model_name[model_name.len() - 11..];
    let is_date_suffix = tail.starts_with('-')
        && tail[1..].split('-').count() == 3
        && tail[1..].chars().filter(|c| *c == '-').count() == 2
        && tail[1..].chars().all(|c| c.is_ascii_digit() || c == '-');
    if is_date_suffix {
        &model_name[..model_name.len() - 11]
    } else {
        model_name
    }
}

/// Cost in USD for a single `UsageRecord`, per spec §4.2's cache-aware formula.
pub fn record_cost_usd(record: &UsageRecord) -> f64 {
    let pricing = resolve_pricing(&record.model_name);
    let input_cost = match &record.input_token_details {
        Some(details) => {
            let fresh = record
                .input_tokens
                .saturating_sub(details.cache_read + details.cache_creation);
            fresh as f64 * pricing.input
                + details.cache_read as f64 * pricing.cache_read
                + details.cache_creation as f64 * pricing.cache_creation
        }
        None => record.input_tokens as f64 * pricing.input,
    };
    let output_cost = record.output_tokens as f64 * pricing.output;
    (input_cost + output_cost) / 1_000_000.0
}

/// Per-pipeline and grand-total cost, in USD.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UsageSummary {
    pub by_pipeline: HashMap<String, f64>,
    pub total_usd: f64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
}

pub fn aggregate_usage(records: &[UsageRecord]) -> UsageSummary {
    let mut summary = UsageSummary::default();
    for record in records {
        let cost = record_cost_usd(record);
        *summary.by_pipeline.entry(record.tool_pipeline.clone()).or_insert(0.0) += cost;
        summary.total_usd += cost;
        summary.total_input_tokens += record.input_tokens;
        summary.total_output_tokens += record.output_tokens;
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_pricing_strips_date_suffix() {
        let direct = resolve_pricing("gpt-4o");
        let dated = resolve_pricing("gpt-4o-2024-08-06");
        assert_eq!(direct.input, dated.input);
    }

    #[test]
    fn resolve_pricing_falls_back_to_default() {
        let p = resolve_pricing("some-unknown-model");
        assert_eq!(p.input, DEFAULT_PRICING.input);
    }

    #[test]
    fn cost_is_monotonic_in_token_counts() {
        let base = make_usage_record("n", "sql", 100, 50, 150, "gpt-4o", None, None);
        let more_input = make_usage_record("n", "sql", 200, 50, 250, "gpt-4o", None, None);
        assert!(record_cost_usd(&more_input) >= record_cost_usd(&base));
    }

    #[test]
    fn cache_aware_formula_matches_spec() {
        let record = make_usage_record(
            "n",
            "sql",
            1000,
            100,
            1100,
            "gpt-4o",
            Some(InputTokenDetails {
                cache_read: 400,
                cache_creation: 100,
            }),
            None,
        );
        let pricing = resolve_pricing("gpt-4o");
        let expected = (500.0 * pricing.input + 400.0 * pricing.cache_read + 100.0 * pricing.cache_creation
            + 100.0 * pricing.output)
            / 1_000_000.0;
        assert!((record_cost_usd(&record) - expected).abs() < 1e-12);
    }

    #[test]
    fn aggregate_usage_sums_by_pipeline_and_grand_total() {
        let records = vec![
            make_usage_record("n1", "sql", 10, 10, 20, "gpt-4o", None, None),
            make_usage_record("n2", "graphql", 10, 10, 20, "gpt-4o", None, None),
        ];
        let summary = aggregate_usage(&records);
        assert_eq!(summary.by_pipeline.len(), 2);
        assert!((summary.total_usd
            - (summary.by_pipeline["sql"] + summary.by_pipeline["graphql"]))
            .abs()
            < 1e-12);
    }
}
