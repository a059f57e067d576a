use std::fmt::Display;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::inference::backend::BackendError;
use crate::task::{Message, Role};

/// Prompt layout expected by the loaded model.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChatTemplate {
    #[default]
    Exaone,
    #[value(name = "chatml")]
    ChatMl,
}

impl Display for ChatTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatTemplate::Exaone => write!(f, "exaone"),
            ChatTemplate::ChatMl => write!(f, "chatml"),
        }
    }
}

impl ChatTemplate {
    pub fn eos_marker(&self) -> &'static str {
        match self {
            ChatTemplate::Exaone => "[|endofturn|]",
            ChatTemplate::ChatMl => "<|im_end|>",
        }
    }

    /// Renders the messages and appends the assistant cue so the model answers next.
    pub fn render(&self, messages: &[Message]) -> Result<String, BackendError> {
        if messages.is_empty() {
            return Err(BackendError::Template("no messages to render".into()));
        }

        let mut prompt = String::new();
        for message in messages {
            match (self, message.role) {
                (ChatTemplate::Exaone, Role::System) => {
                    prompt.push_str(&format!("[|system|]{}[|endofturn|]\n", message.content))
                }
                (ChatTemplate::Exaone, Role::User) => {
                    prompt.push_str(&format!("[|user|]{}\n", message.content))
                }
                (ChatTemplate::ChatMl, role) => prompt.push_str(&format!(
                    "<|im_start|>{}\n{}<|im_end|>\n",
                    role_name(role),
                    message.content
                )),
            }
        }

        prompt.push_str(match self {
            ChatTemplate::Exaone => "[|assistant|]",
            ChatTemplate::ChatMl => "<|im_start|>assistant\n",
        });
        Ok(prompt)
    }
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::PromptBuilder;

    #[test]
    fn renders_exaone_turns() {
        let messages = PromptBuilder::build("You are a translator.", "Translate: 안녕");
        let prompt = ChatTemplate::Exaone.render(&messages).unwrap();
        assert_eq!(
            prompt,
            "[|system|]You are a translator.[|endofturn|]\n[|user|]Translate: 안녕\n[|assistant|]"
        );
    }

    #[test]
    fn renders_chatml_turns() {
        let messages = PromptBuilder::build("sys", "hi");
        let prompt = ChatTemplate::ChatMl.render(&messages).unwrap();
        assert_eq!(
            prompt,
            "<|im_start|>system\nsys<|im_end|>\n<|im_start|>user\nhi<|im_end|>\n<|im_start|>assistant\n"
        );
    }

    #[test]
    fn rejects_empty_conversation() {
        assert!(matches!(
            ChatTemplate::Exaone.render(&[]),
            Err(BackendError::Template(_))
        ));
    }

    #[test]
    fn eos_markers_match_template() {
        assert_eq!(ChatTemplate::Exaone.eos_marker(), "[|endofturn|]");
        assert_eq!(ChatTemplate::ChatMl.eos_marker(), "<|im_end|>");
    }
}
