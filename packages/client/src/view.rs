//! Message list model and the views that observe it.
//!
//! The [`MessageList`] is the single ordered record of everything shown in a
//! session. Views subscribe through [`MessageView`] and are notified after each
//! append, once the list has been scrolled.

use std::{
    io::{self, Write},
    path::PathBuf,
};

use kotoba_shared::time::timestamp_to_rfc3339;
use pulldown_cmark_escape::escape_html;

use crate::{
    domain::{ConversationId, Role},
    formatter::MessageFormatter,
    ui::PROMPT,
};

/// Default scroll viewport height (rows)
pub const DEFAULT_VIEWPORT_HEIGHT: usize = 24;

/// One entry of the message list. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    role: Role,
    text: String,
    html: String,
    rendered_at: i64,
}

impl RenderedMessage {
    pub fn new(role: Role, text: String, html: String, rendered_at: i64) -> Self {
        Self {
            role,
            text,
            html,
            rendered_at,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Raw text as sent or received.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Rich-text rendering of [`Self::text`].
    pub fn html(&self) -> &str {
        &self.html
    }

    /// Unix timestamp (milliseconds) of the render.
    pub fn rendered_at(&self) -> i64 {
        self.rendered_at
    }

    /// Rows the message occupies when printed by [`MessageFormatter`]:
    /// the rendered body plus the blank line, two separators and the header.
    pub fn height(&self) -> usize {
        MessageFormatter::format_body(self).lines().count().max(1) + 4
    }
}

/// Append-only ordered list of rendered messages with a scroll viewport.
#[derive(Debug, Clone)]
pub struct MessageList {
    messages: Vec<RenderedMessage>,
    viewport_height: usize,
    scroll_top: usize,
}

impl Default for MessageList {
    fn default() -> Self {
        Self::new(DEFAULT_VIEWPORT_HEIGHT)
    }
}

impl MessageList {
    pub fn new(viewport_height: usize) -> Self {
        Self {
            messages: Vec::new(),
            viewport_height,
            scroll_top: 0,
        }
    }

    /// Append a message to the end of the list.
    pub fn append(&mut self, message: RenderedMessage) -> &RenderedMessage {
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    pub fn messages(&self) -> &[RenderedMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&RenderedMessage> {
        self.messages.last()
    }

    /// Total rows of all messages.
    pub fn content_height(&self) -> usize {
        self.messages.iter().map(RenderedMessage::height).sum()
    }

    pub fn viewport_height(&self) -> usize {
        self.viewport_height
    }

    /// Largest valid scroll offset.
    pub fn max_scroll(&self) -> usize {
        self.content_height().saturating_sub(self.viewport_height)
    }

    pub fn scroll_top(&self) -> usize {
        self.scroll_top
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_top = self.max_scroll();
    }

    pub fn is_scrolled_to_bottom(&self) -> bool {
        self.scroll_top == self.max_scroll()
    }
}

/// The text buffer the user edits before sending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputField {
    value: String,
}

impl InputField {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    /// Append typed text at the end of the buffer.
    pub fn push_str(&mut self, text: &str) {
        self.value.push_str(text);
    }

    pub fn insert_newline(&mut self) {
        self.value.push('\n');
    }

    pub fn clear(&mut self) {
        self.value.clear();
    }
}

/// Observer notified after every append to the message list.
pub trait MessageView: Send {
    fn message_appended(&mut self, message: &RenderedMessage, list: &MessageList);
}

/// Prints messages to a terminal and restores the input prompt.
pub struct TerminalView<W: Write + Send = io::Stdout> {
    out: W,
}

impl TerminalView<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> MessageView for TerminalView<W> {
    fn message_appended(&mut self, message: &RenderedMessage, _list: &MessageList) {
        let formatted = MessageFormatter::format_message(message);
        let result = write!(self.out, "{}{}", formatted, PROMPT)
            .and_then(|_| self.out.flush());
        if let Err(e) = result {
            tracing::warn!("Failed to write message to terminal: {}", e);
        }
    }
}

/// Keeps an HTML document of the message list on disk.
///
/// The document is rewritten after every append, so it always mirrors the
/// full list.
pub struct TranscriptView {
    path: PathBuf,
    conversation_id: ConversationId,
}

impl TranscriptView {
    pub fn new(path: impl Into<PathBuf>, conversation_id: ConversationId) -> Self {
        Self {
            path: path.into(),
            conversation_id,
        }
    }

    /// Write the current list to the transcript file.
    pub fn write(&self, list: &MessageList) -> io::Result<()> {
        std::fs::write(&self.path, render_transcript(&self.conversation_id, list))
    }
}

impl MessageView for TranscriptView {
    fn message_appended(&mut self, _message: &RenderedMessage, list: &MessageList) {
        if let Err(e) = self.write(list) {
            tracing::warn!(
                "Failed to write transcript to {}: {}",
                self.path.display(),
                e
            );
        }
    }
}

/// Render the message list as a standalone HTML document.
pub fn render_transcript(conversation_id: &ConversationId, list: &MessageList) -> String {
    let mut output = String::new();
    output.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    output.push_str("<title>Conversation ");
    // writing into a String cannot fail
    let _ = escape_html(&mut output, conversation_id.as_str());
    output.push_str("</title>\n</head>\n<body>\n");
    output.push_str("<div id=\"messages-container\">\n");

    for message in list.messages() {
        output.push_str(&format!(
            "<div class=\"message {}\" data-rendered-at=\"{}\"><div class=\"message-content\">{}</div></div>\n",
            message.role(),
            timestamp_to_rfc3339(message.rendered_at()),
            message.html()
        ));
    }

    output.push_str("</div>\n</body>\n</html>\n");
    output
}
