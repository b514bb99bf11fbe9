//! LLM pricing lookup for cost estimation.
//!
//! Provides per-token pricing for known models and computes estimated costs.
//! Prices are in USD per million tokens; Ollama / unknown models default to $0.

/// Per-token pricing for a model.
#[derive(Debug, Clone, Copy)]
pub struct ModelPricing {
    /// USD per million input tokens.
    pub input_per_million: f64,
    /// USD per million output tokens.
    pub output_per_million: f64,
}

impl ModelPricing {
    /// Compute the estimated cost for the given token counts.
    pub fn compute_cost(&self, input_tokens: u32, output_tokens: u32) -> f64 {
        let input_cost = (input_tokens as f64 / 1_000_000.0) * self.input_per_million;
        let output_cost = (output_tokens as f64 / 1_000_000.0) * self.output_per_million;
        input_cost + output_cost
    }
}

/// Look up pricing for a provider + model combination.
///
/// Falls back to zero-cost for Ollama and unknown models.
pub fn lookup(provider: &str, model: &str) -> ModelPricing {
    match provider {
        "openai" => lookup_openai(model),
        "anthropic" => lookup_anthropic(model),
        "gemini" | "google" => lookup_gemini(model),
        "deepseek" => lookup_deepseek(model),
        "voyage" => lookup_voyage(model),
        // Ollama and unknowns are free (local inference).
        _ => ModelPricing {
            input_per_million: 0.0,
            output_per_million: 0.0,
        },
    }
}

/// Voyage embedding models bill per input token only; `output_per_million`
/// is always zero since embeddings have no generated text.
fn lookup_voyage(model: &str) -> ModelPricing {
    if model.contains("voyage-3-lite") {
        ModelPricing {
            input_per_million: 0.02,
            output_per_million: 0.0,
        }
    } else if model.contains("voyage-3") {
        ModelPricing {
            input_per_million: 0.06,
            output_per_million: 0.0,
        }
    } else {
        ModelPricing {
            input_per_million: 0.06,
            output_per_million: 0.0,
        }
    }
}

fn lookup_openai(model: &str) -> ModelPricing {
    if model.starts_with("gpt-4o-mini") {
        ModelPricing {
            input_per_million: 0.15,
            output_per_million: 0.60,
        }
    } else if model.starts_with("gpt-4o") {
        ModelPricing {
            input_per_million: 2.50,
            output_per_million: 10.0,
        }
    } else if model.starts_with("gpt-4-turbo") {
        ModelPricing {
            input_per_million: 10.0,
            output_per_million: 30.0,
        }
    } else if model.starts_with("gpt-3.5") {
        ModelPricing {
            input_per_million: 0.50,
            output_per_million: 1.50,
        }
    } else {
        // Unknown OpenAI model — use gpt-4o-mini as a reasonable default.
        ModelPricing {
            input_per_million: 0.15,
            output_per_million: 0.60,
        }
    }
}

fn lookup_anthropic(model: &str) -> ModelPricing {
    if model.contains("opus") {
        ModelPricing {
            input_per_million: 15.0,
            output_per_million: 75.0,
        }
    } else if model.contains("sonnet") {
        ModelPricing {
            input_per_million: 3.0,
            output_per_million: 15.0,
        }
    } else if model.contains("haiku") {
        ModelPricing {
            input_per_million: 1.0,
            output_per_million: 5.0,
        }
    } else {
        // Unknown Anthropic model — use sonnet pricing.
        ModelPricing {
            input_per_million: 3.0,
            output_per_million: 15.0,
        }
    }
}

fn lookup_gemini(model: &str) -> ModelPricing {
    if model.contains("2.5-pro") {
        ModelPricing {
            input_per_million: 1.25,
            output_per_million: 10.0,
        }
    } else if model.contains("2.5-flash") {
        ModelPricing {
            input_per_million: 0.15,
            output_per_million: 0.60,
        }
    } else if model.contains("2.0-flash") {
        ModelPricing {
            input_per_million: 0.10,
            output_per_million: 0.40,
        }
    } else if model.contains("1.5-pro") {
        ModelPricing {
            input_per_million: 1.25,
            output_per_million: 5.0,
        }
    } else if model.contains("1.5-flash") {
        ModelPricing {
            input_per_million: 0.075,
            output_per_million: 0.30,
        }
    } else {
        // Unknown Gemini model — use 2.0-flash pricing.
        ModelPricing {
            input_per_million: 0.10,
            output_per_million: 0.40,
        }
    }
}

fn lookup_deepseek(model: &str) -> ModelPricing {
    if model.contains("chat") || model.contains("v3") {
        ModelPricing {
            input_per_million: 0.27,
            output_per_million: 1.10,
        }
    } else if model.contains("reasoner") || model.contains("r1") {
        ModelPricing {
            input_per_million: 0.55,
            output_per_million: 2.19,
        }
    } else {
        // Unknown DeepSeek model — use chat pricing.
        ModelPricing {
            input_per_million: 0.27,
            output_per_million: 1.10,
        }
    }
}
