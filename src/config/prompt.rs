use log::{ info, warn };
use serde::{ Deserialize, Serialize };
use std::collections::{ HashMap, HashSet };
use std::fs;
use std::path::{ Path, PathBuf };
use std::sync::Arc;
use thiserror::Error;

const BUILTIN_PROMPTS: &str = include_str!("../../json/prompts.json");

pub const COACH_TEMPLATE: &str = "coach";
pub const REPLY_TEMPLATE: &str = "reply";

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt template '{0}' not found")]
    TemplateNotFound(String),
    #[error("Prompt file IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Prompt JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid prompt configuration: {0}")]
    Invalid(String),
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Personality {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub system_prompt: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct PromptConfig {
    pub personalities: Vec<Personality>,
    pub templates: HashMap<String, String>,
}

impl PromptConfig {
    /// The catalog shipped inside the binary.
    pub fn builtin() -> Result<Self, PromptError> {
        Self::from_json(BUILTIN_PROMPTS)
    }

    pub fn from_json(json: &str) -> Result<Self, PromptError> {
        let config: PromptConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), PromptError> {
        for key in [COACH_TEMPLATE, REPLY_TEMPLATE] {
            if !self.templates.contains_key(key) {
                return Err(PromptError::TemplateNotFound(format!("templates:{}", key)));
            }
        }
        if self.personalities.is_empty() {
            return Err(PromptError::Invalid("no personalities defined".to_string()));
        }
        let mut seen = HashSet::new();
        for personality in &self.personalities {
            if !seen.insert(personality.id.as_str()) {
                return Err(
                    PromptError::Invalid(format!("duplicate personality id '{}'", personality.id))
                );
            }
        }
        Ok(())
    }

    pub fn find_personality(&self, id: &str) -> Option<&Personality> {
        self.personalities.iter().find(|p| p.id == id)
    }

    pub fn template(&self, key: &str) -> Result<&str, PromptError> {
        self.templates
            .get(key)
            .map(|s| s.as_str())
            .ok_or_else(|| PromptError::TemplateNotFound(format!("templates:{}", key)))
    }
}

/// Loads the prompt file at `path`, or the built-in catalog when it does not
/// exist.
pub fn load_prompts<P: AsRef<Path>>(path: P) -> Result<Arc<PromptConfig>, PromptError> {
    let path = path.as_ref();
    if !path.exists() {
        warn!("Prompts file '{}' not found, using built-in prompts", path.display());
        return PromptConfig::builtin().map(Arc::new);
    }
    let content = fs::read_to_string(path).map_err(|source| PromptError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = PromptConfig::from_json(&content)?;
    info!("Loaded {} personalities from '{}'", config.personalities.len(), path.display());
    Ok(Arc::new(config))
}

/// Substitutes `{name}` placeholders in one pass. Substituted text is never
/// rescanned and unknown placeholders are left as written.
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let replaced = after.find('}').and_then(|end| {
            let key = &after[..end];
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, end))
        });
        match replaced {
            Some((value, end)) => {
                out.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
