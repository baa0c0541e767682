//! Summary prompt
//!
//! The summary asks for four fixed sections: topic, the user's problems, the
//! assistant's suggestions and the key points.

use crate::conversation::Conversation;

/// System instruction sent with every summary request
pub const SYSTEM_INSTRUCTION: &str = "你是一个专业的对话总结助手，擅长提炼关键信息。";

/// Message sent by the connection check
pub const CONNECTION_CHECK_MESSAGE: &str = "你好";

const SUMMARY_SECTIONS: &str = r#"请分析以下与ChatGPT的对话记录，并按以下格式生成总结：

## 对话主题
[用一句话概括这次对话的核心主题]

## 我的问题
[列出我在对话中遇到的问题、困惑或需要解决的事项]

## ChatGPT的建议/解决方案
[提炼ChatGPT给出的关键建议、方法和解决方案]

## 关键要点
[提取所有重要知识点或行动项]

---
"#;

const CLOSING_INSTRUCTION: &str = "请严格按照上述格式输出，保持简洁明了。";

/// Render the transcript as `"<speaker>: <content>"` blocks separated by a
/// blank line
pub fn format_transcript(conversation: &Conversation) -> String {
    conversation
        .messages
        .iter()
        .map(|m| format!("{}: {}", m.role.label(), m.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Build the user prompt for a summary request
pub fn generate_summary_prompt(conversation: &Conversation) -> String {
    format!(
        "{}\n对话记录标题：{}\n\n对话内容：\n{}\n\n{}",
        SUMMARY_SECTIONS,
        conversation.title,
        format_transcript(conversation),
        CLOSING_INSTRUCTION
    )
}
