//! Prompt Builder System
//!
//! Standardized prompt construction for generation requests.
//!
//! Prompts double as cache keys, so building is fully deterministic: sections
//! render in insertion order and nothing is drawn from unordered maps.
//!
//! Every request is a single user message. The role that other APIs would
//! carry in a system message is rendered as the prompt's opening section.

use crate::types::{Chunk, ContentKind};

/// Prompt section types
#[derive(Debug, Clone)]
pub enum PromptSection {
    /// Role definition with expertise area
    Role { expertise: String, task: String },
    /// Numbered requirements
    Requirements(Vec<String>),
    /// Raw text section with optional header
    Text {
        header: Option<String>,
        content: String,
    },
    /// Code block with language
    Code { language: String, content: String },
}

/// Prompt builder for consistent prompt construction
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    sections: Vec<PromptSection>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a role definition section
    pub fn role(mut self, expertise: &str, task: &str) -> Self {
        self.sections.push(PromptSection::Role {
            expertise: expertise.to_string(),
            task: task.to_string(),
        });
        self
    }

    /// Add numbered requirements
    pub fn requirements(mut self, requirements: &[&str]) -> Self {
        self.sections.push(PromptSection::Requirements(
            requirements.iter().map(|r| r.to_string()).collect(),
        ));
        self
    }

    /// Add text section
    pub fn text(mut self, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: None,
            content: content.to_string(),
        });
        self
    }

    /// Add text section with header
    pub fn section(mut self, header: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: Some(header.to_string()),
            content: content.to_string(),
        });
        self
    }

    /// Add code block
    pub fn code(mut self, language: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Code {
            language: language.to_string(),
            content: content.to_string(),
        });
        self
    }

    /// Build the final prompt string
    pub fn build(self) -> String {
        let mut prompt = String::new();

        for section in self.sections {
            match section {
                PromptSection::Role { expertise, task } => {
                    prompt.push_str(&format!(
                        "You are an expert {} specialized in {}.\n\n",
                        expertise, task
                    ));
                }
                PromptSection::Requirements(requirements) => {
                    prompt.push_str("Requirements:\n");
                    for (i, req) in requirements.iter().enumerate() {
                        prompt.push_str(&format!("{}. {}\n", i + 1, req));
                    }
                    prompt.push('\n');
                }
                PromptSection::Text { header, content } => {
                    if let Some(h) = header {
                        prompt.push_str(&format!("{}:\n", h));
                    }
                    prompt.push_str(&content);
                    prompt.push_str("\n\n");
                }
                PromptSection::Code { language, content } => {
                    prompt.push_str(&format!("```{}\n", language));
                    prompt.push_str(&content);
                    prompt.push_str("\n```\n\n");
                }
            }
        }

        prompt.trim_end().to_string()
    }
}

// =============================================================================
// Generation Templates
// =============================================================================

/// Preset prompts for each generation request
pub struct PromptTemplates;

impl PromptTemplates {
    /// Regenerate one chunk of page content
    pub fn chunk(chunk: &Chunk, kind: ContentKind) -> String {
        let requirements: &[&str] = match kind {
            ContentKind::Css => &[
                "Create modern, optimized CSS",
                "Add vendor prefixes where needed",
                "Optimize for performance",
                "Ensure browser compatibility",
                "Include helpful comments",
            ],
            ContentKind::Js => &[
                "Create modern, optimized JavaScript",
                "Include necessary polyfills",
                "Optimize for performance",
                "Ensure browser compatibility",
                "Include helpful comments",
            ],
            ContentKind::Html => &[
                "Maintain functionality and references",
                "Use semantic HTML5 elements",
                "Add ARIA attributes where needed",
                "Keep class names and IDs",
                "Optimize for performance",
            ],
        };

        PromptBuilder::new()
            .text(&format!(
                "Create modern, optimized {} for this website (part {}):",
                kind.language(),
                chunk.position()
            ))
            .text(&format!("{}:", kind.language()))
            .code(kind.fence_tag(), &chunk.text)
            .requirements(requirements)
            .text(&format!(
                "Return the result wrapped in ```{} and ``` markers.",
                kind.fence_tag()
            ))
            .build()
    }

    /// Ask for a structural summary of a whole page
    pub fn structure_analysis(html: &str) -> String {
        PromptBuilder::new()
            .role(
                "web developer",
                "analyzing website structure and creating a structural summary",
            )
            .text("Please analyze this HTML structure:")
            .code("html", html)
            .section(
                "Return a JSON object with",
                "1. main_sections: List of main sections with their purposes\n\
                 2. key_components: List of important components and their roles\n\
                 3. critical_functionality: List of critical features\n\
                 4. dependencies: List of important assets and external resources",
            )
            .text("Respond ONLY with the JSON object.")
            .build()
    }

    /// Regenerate one top-level section with the page summary as context
    pub fn section(section: &str, context_json: &str) -> String {
        PromptBuilder::new()
            .role(
                "web developer",
                "modernizing website sections while maintaining their functionality",
            )
            .text("Context from overall structure:")
            .code("json", context_json)
            .text("Please optimize this HTML section:")
            .code("html", section)
            .requirements(&[
                "Maintain functionality and references",
                "Use semantic HTML5 elements",
                "Add ARIA attributes where needed",
                "Keep class names and IDs",
                "Ensure backward compatibility",
                "Optimize for performance",
                "Add helpful comments",
            ])
            .text("Return the optimized HTML wrapped in ```html and ``` markers.")
            .build()
    }

    /// Regenerate a whole page in one request
    pub fn whole_page(html: &str) -> String {
        PromptBuilder::new()
            .role(
                "web developer",
                "cloning and modernizing websites while maintaining all functionality",
            )
            .text("Please analyze and optimize this HTML code:")
            .code("html", html)
            .requirements(&[
                "Maintain all functionality and references",
                "Use semantic HTML5 elements",
                "Add ARIA attributes where needed",
                "Keep all class names and IDs",
                "Ensure backward compatibility",
                "Optimize for performance",
                "Add helpful comments",
            ])
            .text("Return the complete, optimized HTML wrapped in ```html and ``` markers.")
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_prompt() {
        let prompt = PromptBuilder::new()
            .role("web developer", "CSS refactoring")
            .requirements(&["Keep selectors", "Add comments"])
            .build();

        assert!(prompt.starts_with("You are an expert web developer"));
        assert!(prompt.contains("1. Keep selectors"));
        assert!(prompt.contains("2. Add comments"));
    }

    #[test]
    fn test_code_block() {
        let prompt = PromptBuilder::new().code("css", "body{}").build();
        assert_eq!(prompt, "```css\nbody{}\n```");
    }

    #[test]
    fn test_chunk_prompt_embeds_position_and_fence() {
        let chunk = Chunk::new("function a() {}", 1, 3);
        let prompt = PromptTemplates::chunk(&chunk, ContentKind::Js);

        assert!(prompt.contains("JavaScript for this website (part 2/3)"));
        assert!(prompt.contains("```javascript\nfunction a() {}\n```"));
        assert!(prompt.contains("Include necessary polyfills"));
    }

    #[test]
    fn test_prompts_are_deterministic() {
        let chunk = Chunk::new("p { margin: 0 }", 0, 1);
        assert_eq!(
            PromptTemplates::chunk(&chunk, ContentKind::Css),
            PromptTemplates::chunk(&chunk, ContentKind::Css)
        );
        assert_eq!(
            PromptTemplates::section("<nav></nav>", "{}"),
            PromptTemplates::section("<nav></nav>", "{}")
        );
    }

    #[test]
    fn test_structure_prompt_names_fields() {
        let prompt = PromptTemplates::structure_analysis("<main></main>");
        for field in [
            "main_sections",
            "key_components",
            "critical_functionality",
            "dependencies",
        ] {
            assert!(prompt.contains(field));
        }
    }
}
