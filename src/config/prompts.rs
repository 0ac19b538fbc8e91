//! Prompt templates for Watchpost.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Text the model is told to return when the context does not hold the answer.
pub const NOT_AVAILABLE: &str = "The answer is not available in the context.";

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub answer: AnswerPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for grounded question answering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerPrompts {
    /// Behavioral policy: what counts as suspicious and how to treat time questions.
    pub policy: String,
    /// Full prompt; `{{policy}}`, `{{created_time}}`, `{{context}}` and `{{question}}` are filled in.
    pub template: String,
}

impl Default for AnswerPrompts {
    fn default() -> Self {
        Self {
            policy: r#"You are analyzing video footage for suspicious behavior. Flag the following actions as suspicious:
1. Anyone entering the cage or metal gate that holds the electrical systems. This area is restricted and nobody should be inside unless authorized.
2. Handling, lifting or carrying a fire extinguisher when there is no clear emergency or need. Outside an emergency this is unusual.

Always base your answers on the context from the analysis report and the video analysis results.

If the question concerns someone entering the restricted cage or handling a fire extinguisher, treat it as suspicious and flag it."#
                .to_string(),

            template: r#"{{policy}}

If someone asks about the time something happened, provide the created time: {{created_time}}.

Otherwise, answer the question in as much detail as possible using the provided context. If the answer is not in the provided context, say exactly:
"The answer is not available in the context."

Context:
{{context}}

Question:
{{question}}

Answer:"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let answer_path = custom_path.join("answer.toml");
            if answer_path.exists() {
                let content = std::fs::read_to_string(&answer_path)?;
                prompts.answer = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// The template is scanned once, so `{{name}}` sequences inside substituted
    /// values are left as they are. Unknown placeholders are kept verbatim.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find("{{") {
            result.push_str(&rest[..open]);
            let after_open = &rest[open + 2..];

            let Some(close) = after_open.find("}}") else {
                rest = &rest[open..];
                break;
            };

            let name = &after_open[..close];
            match vars.get(name) {
                Some(value) => result.push_str(value),
                None => result.push_str(&rest[open..open + 2 + close + 2]),
            }
            rest = &after_open[close + 2..];
        }

        result.push_str(rest);
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.answer.policy.contains("fire extinguisher"));
        assert!(prompts.answer.policy.contains("cage"));
        assert!(prompts.answer.template.contains(NOT_AVAILABLE));
        for var in ["{{policy}}", "{{created_time}}", "{{context}}", "{{question}}"] {
            assert!(prompts.answer.template.contains(var), "missing {}", var);
        }
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_render_does_not_rescan_values() {
        let template = "Q: {{question}} | T: {{created_time}} | C: {{context}} | {{unknown}}";
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "What is {{created_time}}?".to_string());
        vars.insert("created_time".to_string(), "T0".to_string());
        vars.insert("context".to_string(), "Report mentions {{question}} here".to_string());

        for _ in 0..32 {
            assert_eq!(
                Prompts::render(template, &vars),
                "Q: What is {{created_time}}? | T: T0 | C: Report mentions {{question}} here | {{unknown}}"
            );
        }
    }

    #[test]
    fn test_render_unclosed_placeholder() {
        let mut vars = HashMap::new();
        vars.insert("a".to_string(), "1".to_string());
        assert_eq!(Prompts::render("{{a}} and {{b", &vars), "1 and {{b");
    }

    #[test]
    fn test_custom_answer_prompts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("answer.toml"),
            "template = \"{{site}}: {{question}}\"\n",
        )
        .unwrap();

        let mut vars = HashMap::new();
        vars.insert("site".to_string(), "Warehouse 4".to_string());
        let prompts = Prompts::load(dir.path().to_str(), Some(&vars)).unwrap();

        // Policy falls back to the default when the file omits it.
        assert!(prompts.answer.policy.contains("fire extinguisher"));

        let mut q = HashMap::new();
        q.insert("question".to_string(), "Who entered?".to_string());
        assert_eq!(
            prompts.render_with_custom(&prompts.answer.template, &q),
            "Warehouse 4: Who entered?"
        );
    }
}
