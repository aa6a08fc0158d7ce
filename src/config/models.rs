use serde::Serialize;

/// Model used when a request does not name one.
pub const DEFAULT_MODEL: &str = "mistralai/mistral-7b-instruct";

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub provider: &'static str,
    pub is_free: bool,
}

const fn model(id: &'static str, name: &'static str, provider: &'static str, is_free: bool) -> ModelInfo {
    ModelInfo { id, name, provider, is_free }
}

pub const FREE_MODELS: &[ModelInfo] = &[
    model("mistralai/mistral-small-3.2-24b-instruct:free", "Mistral Small 3.2 24B (Free)", "Mistral AI", true),
    model("moonshotai/kimi-dev-72b:free", "Kimi Dev 72B (Free)", "Moonshot AI", true),
    model("deepseek/deepseek-r1:free", "DeepSeek R1 (Free)", "DeepSeek", true),
    model("qwen/qwen3-32b:free", "Qwen 3 32B (Free)", "Qwen", true),
    model("google/gemini-2.5-pro-exp-03-25", "Gemini 2.5 Pro (Free)", "Google", true),
    model("google/gemini-1.5-flash:free", "Gemini 1.5 Flash (Free)", "Google", true),
];

pub const PAID_MODELS: &[ModelInfo] = &[
    model("openai/gpt-4o", "GPT-4o (Paid)", "OpenAI", false),
    model("anthropic/claude-3-5-sonnet", "Claude 3.5 Sonnet (Paid)", "Anthropic", false),
    model("openai/gpt-4o-mini", "GPT-4o Mini (Paid)", "OpenAI", false),
    model("anthropic/claude-3-5-haiku", "Claude 3.5 Haiku (Paid)", "Anthropic", false),
    model("google/gemini-1.5-pro", "Gemini 1.5 Pro (Paid)", "Google", false),
    model("meta-llama/llama-3.1-70b-instruct", "Llama 3.1 70B Instruct (Paid)", "Meta", false),
    model("openai/gpt-4-turbo", "GPT-4 Turbo (Paid)", "OpenAI", false),
    model("anthropic/claude-3-opus", "Claude 3 Opus (Paid)", "Anthropic", false),
    model("google/gemini-1.5-flash", "Gemini 1.5 Flash (Paid)", "Google", false),
    model("meta-llama/llama-3.1-405b-instruct", "Llama 3.1 405B Instruct (Paid)", "Meta", false),
];

pub fn find_model(id: &str) -> Option<&'static ModelInfo> {
    FREE_MODELS.iter().chain(PAID_MODELS.iter()).find(|m| m.id == id)
}
