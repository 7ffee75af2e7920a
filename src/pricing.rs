// Copyright 2025 Tracelight Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Builtin per-model token pricing.
//!
//! Used to estimate LLM call cost when the provider does not report one.
//! Prices are per token in USD and drift with vendor price changes; callers
//! that need exact accounting should pass an explicit cost to
//! [`Session::record_llm_call`](crate::Session::record_llm_call).

/// Per-token pricing for one model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    /// Cost per input token in USD.
    pub input_cost_per_token: f64,
    /// Cost per output token in USD.
    pub output_cost_per_token: f64,
}

impl ModelPricing {
    /// Calculate the cost for given token counts.
    pub fn calculate_cost(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        (input_tokens as f64 * self.input_cost_per_token)
            + (output_tokens as f64 * self.output_cost_per_token)
    }
}

/// Builtin table, longest-prefix matched so dated variants such as
/// "gpt-4o-2024-08-06" resolve to their base model.
const BUILTIN: &[(&str, ModelPricing)] = &[
    // OpenAI
    (
        "gpt-4o-mini",
        ModelPricing {
            input_cost_per_token: 0.15e-6,
            output_cost_per_token: 0.6e-6,
        },
    ),
    (
        "gpt-4o",
        ModelPricing {
            input_cost_per_token: 2.5e-6,
            output_cost_per_token: 10e-6,
        },
    ),
    (
        "gpt-4-turbo",
        ModelPricing {
            input_cost_per_token: 10e-6,
            output_cost_per_token: 30e-6,
        },
    ),
    (
        "gpt-4",
        ModelPricing {
            input_cost_per_token: 30e-6,
            output_cost_per_token: 60e-6,
        },
    ),
    // Anthropic
    (
        "claude-3-5-haiku",
        ModelPricing {
            input_cost_per_token: 0.8e-6,
            output_cost_per_token: 4e-6,
        },
    ),
    (
        "claude-3-5-sonnet",
        ModelPricing {
            input_cost_per_token: 3e-6,
            output_cost_per_token: 15e-6,
        },
    ),
    (
        "claude-3-opus",
        ModelPricing {
            input_cost_per_token: 15e-6,
            output_cost_per_token: 75e-6,
        },
    ),
    // Google
    (
        "gemini-2.5-flash",
        ModelPricing {
            input_cost_per_token: 0.15e-6,
            output_cost_per_token: 0.6e-6,
        },
    ),
    (
        "gemini-2.5-pro",
        ModelPricing {
            input_cost_per_token: 1.25e-6,
            output_cost_per_token: 10e-6,
        },
    ),
    (
        "gemini-1.5-pro",
        ModelPricing {
            input_cost_per_token: 1.25e-6,
            output_cost_per_token: 5e-6,
        },
    ),
];

/// Look up pricing for a model name. Matches on prefix, case-insensitive.
pub fn pricing_for(model: &str) -> Option<ModelPricing> {
    let model = model.to_lowercase();
    BUILTIN
        .iter()
        .find(|(prefix, _)| model.starts_with(prefix))
        .map(|(_, pricing)| *pricing)
}

/// Estimate the cost of one call in USD. Unknown models cost zero.
pub fn estimate_cost(model: &str, prompt_tokens: u64, completion_tokens: u64) -> f64 {
    pricing_for(model)
        .map(|p| p.calculate_cost(prompt_tokens, completion_tokens))
        .unwrap_or(0.0)
}
