//! Answering prompt for the medical assistant.

use crate::core::config::PromptStyle;
use crate::llm::ChatMessage;

/// Answer the model is told to give when the context does not cover the question.
pub const FALLBACK_ANSWER: &str = "I don't know based on the provided information.";

pub const SYSTEM_PROMPT: &str = "You are a medical assistant.

Use the provided context ONLY to answer the user's question.
DO NOT mention sources, references, authors, books, page numbers, or documents.
DO NOT say \"Resources\", \"References\", or \"According to\".

Return ONLY a clear, concise, practical medical answer.
If the answer is not found in the context, say:
\"I don't know based on the provided information.\"

Context:
{context}

Question:
{input}

Answer:";

/// Separator between retrieved chunks in `{context}`.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(SYSTEM_PROMPT)
    }
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Substitutes `{context}` and `{input}` (alias `{question}`) in one pass,
    /// so braces inside retrieved text are never expanded.
    pub fn render(&self, context: &str, question: &str) -> String {
        let mut out = String::with_capacity(self.template.len() + context.len() + question.len());
        let mut rest = self.template.as_str();

        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let tail = &rest[start..];
            let replaced = [
                ("{context}", context),
                ("{input}", question),
                ("{question}", question),
            ]
            .into_iter()
            .find(|(placeholder, _)| tail.starts_with(placeholder));

            match replaced {
                Some((placeholder, value)) => {
                    out.push_str(value);
                    rest = &tail[placeholder.len()..];
                }
                None => {
                    out.push('{');
                    rest = &tail[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }

    /// Messages for one question, laid out for the provider's prompt style.
    pub fn messages(&self, style: PromptStyle, context: &str, question: &str) -> Vec<ChatMessage> {
        let rendered = self.render(context, question);
        match style {
            PromptStyle::Chat => vec![ChatMessage::system(rendered), ChatMessage::user(question)],
            PromptStyle::Completion => vec![ChatMessage::user(rendered)],
        }
    }
}

/// Joins chunk texts in rank order.
pub fn join_context<'a, I>(chunks: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    chunks.into_iter().collect::<Vec<_>>().join(CONTEXT_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template_carries_the_fallback_instruction() {
        let rendered = PromptTemplate::default().render("ctx", "q");
        assert!(rendered.contains(FALLBACK_ANSWER));
        assert!(rendered.contains("DO NOT mention sources"));
    }

    #[test]
    fn renders_context_and_question() {
        let rendered = PromptTemplate::default().render(
            "Flu causes fever.\n\nRest helps.",
            "What are the symptoms of flu?",
        );
        assert!(rendered.contains("Context:\nFlu causes fever.\n\nRest helps.\n\nQuestion:"));
        assert!(rendered.ends_with("Question:\nWhat are the symptoms of flu?\n\nAnswer:"));
        assert!(!rendered.contains("{context}"));
        assert!(!rendered.contains("{input}"));
    }

    #[test]
    fn question_is_an_alias_for_input() {
        let template = PromptTemplate::new("{context}|{question}|{input}");
        assert_eq!(template.render("c", "q"), "c|q|q");
    }

    #[test]
    fn braces_in_retrieved_text_are_left_alone() {
        let template = PromptTemplate::new("[{context}] {input} {other}");
        assert_eq!(
            template.render("see {input} {", "why?"),
            "[see {input} {] why? {other}"
        );
    }

    #[test]
    fn chat_style_sends_question_as_user_message() {
        let messages = PromptTemplate::default().messages(PromptStyle::Chat, "ctx", "What is flu?");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert!(messages[0].content.contains("ctx"));
        assert_eq!(messages[1], ChatMessage::user("What is flu?"));
    }

    #[test]
    fn completion_style_sends_one_rendered_prompt() {
        let messages =
            PromptTemplate::default().messages(PromptStyle::Completion, "ctx", "What is flu?");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
        assert!(messages[0].content.contains("Question:\nWhat is flu?"));
    }

    #[test]
    fn context_is_joined_by_blank_lines() {
        assert_eq!(join_context(["a", "b", "c"]), "a\n\nb\n\nc");
        assert_eq!(join_context(Vec::<&str>::new()), "");
    }
}
