//! Markdown note assembly
//!
//! [`DocumentBuilder::build`] is a pure function of the conversation, the
//! summary and the builder's UTC offset: the same inputs always produce the
//! same bytes.

use crate::conversation::Conversation;
use chrono::{DateTime, FixedOffset, Local, TimeZone, Utc};
use regex::Regex;
use std::sync::OnceLock;

/// Maximum length, in characters, of the title part of a file name
pub const MAX_TITLE_CHARS: usize = 50;

const TAGS: &str = "[chatgpt, summary]";
const SOURCE: &str = "chatgpt-web";
const SUMMARY_HEADING: &str = "# 📝 对话总结";
const TRANSCRIPT_HEADING: &str = "# 💬 原始对话";

fn unsafe_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("valid regex"))
}

fn whitespace_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

fn blank_line_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").expect("valid regex"))
}

/// A rendered note and the file name it is saved under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Full Markdown content
    pub content: String,
    /// File name, `<YYYY-MM-DD>_<title>.md`
    pub filename: String,
}

/// Builds notes from conversations
///
/// The front-matter date is rendered in the builder's offset; the file name
/// date is always the UTC date of the conversation.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentBuilder {
    offset: Option<FixedOffset>,
}

impl DocumentBuilder {
    /// Builder rendering dates in the local time zone
    pub fn local() -> Self {
        Self { offset: None }
    }

    /// Builder rendering dates in a fixed offset
    pub fn with_offset(offset: FixedOffset) -> Self {
        Self {
            offset: Some(offset),
        }
    }

    fn localized(&self, timestamp: &DateTime<Utc>) -> String {
        const FORMAT: &str = "%Y/%-m/%-d %H:%M:%S";
        match self.offset {
            Some(offset) => offset
                .from_utc_datetime(&timestamp.naive_utc())
                .format(FORMAT)
                .to_string(),
            None => Local
                .from_utc_datetime(&timestamp.naive_utc())
                .format(FORMAT)
                .to_string(),
        }
    }

    /// Render the note for `conversation` with `summary`
    ///
    /// # Examples
    ///
    /// ```
    /// use chatvault::conversation::{Conversation, Message};
    /// use chatvault::document::DocumentBuilder;
    /// use chrono::{FixedOffset, TimeZone, Utc};
    ///
    /// let conversation = Conversation {
    ///     title: "Fix bug".to_string(),
    ///     messages: vec![Message::user("why crash?")],
    ///     url: "https://chatgpt.com/c/1".to_string(),
    ///     timestamp: Utc.with_ymd_and_hms(2024, 3, 5, 8, 30, 0).unwrap(),
    /// };
    /// let builder = DocumentBuilder::with_offset(FixedOffset::east_opt(0).unwrap());
    /// let document = builder.build(&conversation, "summary");
    /// assert_eq!(document.filename, "2024-03-05_Fix_bug.md");
    /// assert!(document.content.starts_with("---\ntitle: Fix bug\n"));
    /// ```
    pub fn build(&self, conversation: &Conversation, summary: &str) -> Document {
        let mut content = format!(
            "---\ntitle: {}\ndate: {}\ntags: {}\nsource: {}\nurl: {}\n---\n\n{}\n\n{}\n\n---\n\n{}\n\n",
            conversation.title,
            self.localized(&conversation.timestamp),
            TAGS,
            SOURCE,
            conversation.url,
            SUMMARY_HEADING,
            summary,
            TRANSCRIPT_HEADING,
        );

        let sections = conversation
            .messages
            .iter()
            .map(|m| format!("## {}\n\n{}", m.role.label(), collapse_blank_lines(&m.content)))
            .collect::<Vec<_>>();
        content.push_str(&sections.join("\n\n"));

        Document {
            content,
            filename: filename_for(&conversation.title, &conversation.timestamp),
        }
    }
}

/// Collapse runs of three or more newlines to exactly two and trim the ends
pub fn collapse_blank_lines(text: &str) -> String {
    blank_line_runs()
        .replace_all(text, "\n\n")
        .trim()
        .to_string()
}

/// Make a title safe for use in a file name
///
/// Replaces `< > : " / \ | ? *` with `-`, turns whitespace runs into `_` and
/// keeps at most [`MAX_TITLE_CHARS`] characters.
///
/// # Examples
///
/// ```
/// use chatvault::document::sanitize_title;
///
/// assert_eq!(sanitize_title("a/b:  c?"), "a-b-_c-");
/// ```
pub fn sanitize_title(title: &str) -> String {
    let replaced = unsafe_chars().replace_all(title, "-");
    let collapsed = whitespace_runs().replace_all(&replaced, "_");
    collapsed.chars().take(MAX_TITLE_CHARS).collect()
}

/// File name for a note: `<UTC date>_<sanitized title>.md`
pub fn filename_for(title: &str, timestamp: &DateTime<Utc>) -> String {
    format!(
        "{}_{}.md",
        timestamp.format("%Y-%m-%d"),
        sanitize_title(title)
    )
}
