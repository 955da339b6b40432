//! Plain-text rendering of a conversation, one role-prefixed entry per message.

use agentflow_core::{Message, Role};
use std::fmt::Write;

/// Render `messages` as role-prefixed text.
///
/// Assistant turns that request tools render one line per call
/// (`assistant: <id> <name> <arguments>`); tool results render as
/// `tool: <id> <name>: <content>`.
pub fn render_transcript(messages: &[Message]) -> String {
    let mut out = String::new();
    for message in messages {
        match message.role {
            Role::Assistant if message.has_tool_calls() => {
                for call in &message.tool_calls {
                    let _ = writeln!(out, "assistant: {} {} {}", call.id, call.name, call.arguments);
                }
            }
            Role::Tool => {
                let _ = writeln!(
                    out,
                    "tool: {} {}: {}",
                    message.tool_call_id.as_deref().unwrap_or(""),
                    message.name.as_deref().unwrap_or(""),
                    message.text()
                );
            }
            role => {
                let _ = writeln!(out, "{role}: {}", message.text());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentflow_core::MessageToolCall;

    #[test]
    fn renders_every_role() {
        let messages = vec![
            Message::system("You are a helper."),
            Message::user("echo hi"),
            Message::assistant_tool_calls(
                Some("thinking".into()),
                vec![
                    MessageToolCall::new("call_1", "echo", r#"{"x":"hi"}"#),
                    MessageToolCall::new("call_2", "get_current_time", "{}"),
                ],
            ),
            Message::tool_result("call_1", "echo", "hi"),
            Message::assistant("Done."),
        ];
        assert_eq!(
            render_transcript(&messages),
            concat!(
                "system: You are a helper.\n",
                "user: echo hi\n",
                "assistant: call_1 echo {\"x\":\"hi\"}\n",
                "assistant: call_2 get_current_time {}\n",
                "tool: call_1 echo: hi\n",
                "assistant: Done.\n",
            )
        );
    }

    #[test]
    fn empty_conversation_renders_nothing() {
        assert_eq!(render_transcript(&[]), "");
    }
}
