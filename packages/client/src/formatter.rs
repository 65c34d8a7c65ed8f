//! Rich-text and terminal formatting for rendered messages.

use pulldown_cmark::{CowStr, Event, LinkType, Options, Parser, Tag, TagEnd, html};

use kotoba_shared::time::timestamp_to_local_clock;

use crate::{
    domain::{ConversationId, Role},
    view::RenderedMessage,
};

const SEPARATOR: &str = "------------------------------------------------------------";

/// Link schemes that are never emitted as live destinations.
const BLOCKED_SCHEMES: [&str; 3] = ["javascript:", "vbscript:", "data:"];

const BOLD: &str = "\x1b[1m";
const BOLD_OFF: &str = "\x1b[22m";
const ITALIC: &str = "\x1b[3m";
const ITALIC_OFF: &str = "\x1b[23m";
const STRIKE: &str = "\x1b[9m";
const STRIKE_OFF: &str = "\x1b[29m";
const CODE: &str = "\x1b[36m";
const CODE_OFF: &str = "\x1b[39m";
const BULLET: &str = "• ";

/// Converts lightweight markup into HTML that is safe to insert into a page.
pub trait RichTextFormatter: Send {
    fn to_html(&self, text: &str) -> String;
}

/// Markdown formatter backed by `pulldown-cmark`.
///
/// Raw HTML in the input is escaped rather than passed through, and links or
/// images pointing at script-capable schemes are rewritten to `#`.
#[derive(Debug, Clone, Copy)]
pub struct MarkdownFormatter {
    options: Options,
}

impl Default for MarkdownFormatter {
    fn default() -> Self {
        Self {
            options: Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS,
        }
    }
}

impl MarkdownFormatter {
    /// Render markdown as ANSI-styled terminal text.
    ///
    /// Emphasis and code become SGR styles, list items get bullets or numbers,
    /// and links keep their text followed by the destination. The result has
    /// no trailing newline.
    pub fn to_terminal(&self, text: &str) -> String {
        let mut writer = AnsiWriter::default();
        for event in Parser::new_ext(text, self.options) {
            writer.handle(event);
        }
        writer.finish()
    }
}

impl RichTextFormatter for MarkdownFormatter {
    fn to_html(&self, text: &str) -> String {
        let parser = Parser::new_ext(text, self.options).map(sanitize_event);
        let mut output = String::with_capacity(text.len() * 3 / 2);
        html::push_html(&mut output, parser);
        output
    }
}

fn sanitize_event(event: Event<'_>) -> Event<'_> {
    match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_destination(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_destination(dest_url),
            title,
            id,
        }),
        other => other,
    }
}

fn safe_destination(dest_url: CowStr<'_>) -> CowStr<'_> {
    let normalized: String = dest_url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();

    if BLOCKED_SCHEMES
        .iter()
        .any(|scheme| normalized.starts_with(scheme))
    {
        CowStr::Borrowed("#")
    } else {
        dest_url
    }
}

/// Event sink turning markdown into terminal text.
#[derive(Default)]
struct AnsiWriter {
    out: String,
    /// Next number per open list, `None` for bullet lists
    lists: Vec<Option<u64>>,
    /// Destination per open link or image, `None` when the text already is the URL
    links: Vec<Option<String>>,
    table_cell: usize,
}

impl AnsiWriter {
    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) | Event::Html(text) | Event::InlineHtml(text) => {
                self.push_text(&text)
            }
            Event::Code(code) => {
                self.out.push_str(CODE);
                self.push_text(&code);
                self.out.push_str(CODE_OFF);
            }
            Event::SoftBreak | Event::HardBreak => self.out.push('\n'),
            Event::Rule => {
                self.blank_line();
                self.out.push_str(&"─".repeat(20));
                self.out.push('\n');
            }
            Event::TaskListMarker(checked) => {
                self.out.push_str(if checked { "[x] " } else { "[ ] " })
            }
            Event::FootnoteReference(label) => {
                self.out.push('[');
                self.push_text(&label);
                self.out.push(']');
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                if self.lists.is_empty() {
                    self.blank_line();
                }
            }
            Tag::Heading { .. } => {
                self.blank_line();
                self.out.push_str(BOLD);
            }
            Tag::BlockQuote(_) | Tag::CodeBlock(_) | Tag::Table(_) => self.blank_line(),
            Tag::List(first) => {
                if self.lists.is_empty() {
                    self.blank_line();
                } else {
                    self.end_line();
                }
                self.lists.push(first);
            }
            Tag::Item => {
                self.end_line();
                let depth = self.lists.len().saturating_sub(1);
                self.out.push_str(&"  ".repeat(depth));
                match self.lists.last_mut() {
                    Some(Some(number)) => {
                        self.out.push_str(&format!("{}. ", number));
                        *number += 1;
                    }
                    _ => self.out.push_str(BULLET),
                }
            }
            Tag::TableHead | Tag::TableRow => self.table_cell = 0,
            Tag::TableCell => {
                if self.table_cell > 0 {
                    self.out.push_str(" | ");
                }
                self.table_cell += 1;
            }
            Tag::Emphasis => self.out.push_str(ITALIC),
            Tag::Strong => self.out.push_str(BOLD),
            Tag::Strikethrough => self.out.push_str(STRIKE),
            Tag::Link {
                link_type,
                dest_url,
                ..
            }
            | Tag::Image {
                link_type,
                dest_url,
                ..
            } => {
                let shown = match link_type {
                    LinkType::Autolink | LinkType::Email => None,
                    _ if dest_url.is_empty() => None,
                    _ => Some(dest_url.to_string()),
                };
                self.links.push(shown);
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => {
                self.out.push_str(BOLD_OFF);
                self.end_line();
            }
            TagEnd::Paragraph | TagEnd::CodeBlock | TagEnd::Item => self.end_line(),
            TagEnd::TableHead | TagEnd::TableRow => self.end_line(),
            TagEnd::List(_) => {
                self.lists.pop();
                self.end_line();
            }
            TagEnd::Emphasis => self.out.push_str(ITALIC_OFF),
            TagEnd::Strong => self.out.push_str(BOLD_OFF),
            TagEnd::Strikethrough => self.out.push_str(STRIKE_OFF),
            TagEnd::Link | TagEnd::Image => {
                if let Some(Some(dest_url)) = self.links.pop() {
                    self.out.push_str(" (");
                    self.push_text(&dest_url);
                    self.out.push(')');
                }
            }
            _ => {}
        }
    }

    /// Append text with control characters removed, so incoming messages
    /// cannot emit escape sequences of their own.
    fn push_text(&mut self, text: &str) {
        self.out.extend(
            text.chars()
                .filter(|c| !c.is_control() || matches!(c, '\n' | '\t')),
        );
    }

    fn end_line(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
    }

    fn blank_line(&mut self) {
        self.end_line();
        if !self.out.is_empty() && !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
    }

    fn finish(mut self) -> String {
        let content_end = self.out.trim_end_matches('\n').len();
        self.out.truncate(content_end);
        self.out
    }
}

/// Message formatter for terminal display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format the banner shown once the connection is open
    ///
    /// # Arguments
    ///
    /// * `conversation_id` - The conversation being joined
    /// * `endpoint` - The socket address that was opened
    pub fn format_connected(conversation_id: &ConversationId, endpoint: &str) -> String {
        format!(
            "\nConversation {} ({})\n\
             Type a message and press Enter to send. End a line with '\\' to continue on the next line.\n\
             Press Ctrl+C or Ctrl+D to exit.\n\n",
            conversation_id, endpoint
        )
    }

    /// Terminal rendering of a message's text
    pub fn format_body(message: &RenderedMessage) -> String {
        MarkdownFormatter::default().to_terminal(message.text())
    }

    /// Format a rendered message
    ///
    /// The body is [`Self::format_body`]; the HTML rendering is kept for the
    /// transcript.
    pub fn format_message(message: &RenderedMessage) -> String {
        let label = match message.role() {
            Role::User => "you",
            Role::Ai => "ai",
            Role::System => "system",
        };
        format!(
            "\n{SEPARATOR}\n@{} [{}]\n{}\n{SEPARATOR}\n",
            label,
            timestamp_to_local_clock(message.rendered_at()),
            Self::format_body(message)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(text: &str) -> String {
        MarkdownFormatter::default().to_html(text)
    }

    #[test]
    fn test_markdown_bold() {
        // テスト項目: 太字のマークダウンが strong タグになる
        // given (前提条件):
        let text = "**hi**";

        // when (操作):
        let result = render(text);

        // then (期待する結果):
        assert_eq!(result, "<p><strong>hi</strong></p>\n");
    }

    #[test]
    fn test_markdown_lists_links_and_code() {
        // テスト項目: リスト・リンク・コードスパンが HTML に変換される
        // given (前提条件):
        let text = "- one\n- [two](https://example.com)\n\nuse `cargo`";

        // when (操作):
        let result = render(text);

        // then (期待する結果):
        assert!(result.contains("<ul>"));
        assert!(result.contains("<li>one</li>"));
        assert!(result.contains(r#"<a href="https://example.com">two</a>"#));
        assert!(result.contains("<code>cargo</code>"));
    }

    #[test]
    fn test_markdown_strikethrough() {
        // テスト項目: 取り消し線が del タグになる
        // given (前提条件):
        let text = "~~old~~";

        // when (操作):
        let result = render(text);

        // then (期待する結果):
        assert_eq!(result, "<p><del>old</del></p>\n");
    }

    #[test]
    fn test_markdown_escapes_raw_html() {
        // テスト項目: 生の HTML はエスケープされる
        // given (前提条件):
        let text = "hello <script>alert(1)</script>";

        // when (操作):
        let result = render(text);

        // then (期待する結果):
        assert!(!result.contains("<script>"));
        assert!(result.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_markdown_escapes_html_block() {
        // テスト項目: HTML ブロックもエスケープされる
        // given (前提条件):
        let text = "<div onclick=\"x()\">block</div>\n";

        // when (操作):
        let result = render(text);

        // then (期待する結果):
        assert!(!result.contains("<div"));
        assert!(result.contains("&lt;div"));
    }

    #[test]
    fn test_markdown_neutralizes_script_links() {
        // テスト項目: javascript: などの危険なリンク先は # に置き換えられる
        // given (前提条件):
        let text = "[a](javascript:alert(1)) [b](JavaScript:void) ![c](data:image/png;base64,AAAA)";

        // when (操作):
        let result = render(text);

        // then (期待する結果):
        assert!(!result.to_ascii_lowercase().contains("javascript:"));
        assert!(!result.contains("data:"));
        assert!(result.contains(r##"<a href="#">a</a>"##));
        assert!(result.contains(r##"<img src="#" alt="c" />"##));
    }

    #[test]
    fn test_format_connected() {
        // テスト項目: 接続時のバナーに会話 ID とエンドポイントが含まれる
        // given (前提条件):
        let id = ConversationId::new("abc".to_string()).unwrap();

        // when (操作):
        let result = MessageFormatter::format_connected(&id, "ws://localhost/ws/chat/abc/");

        // then (期待する結果):
        assert!(result.contains("Conversation abc"));
        assert!(result.contains("ws://localhost/ws/chat/abc/"));
    }

    #[test]
    fn test_format_message_shows_role_and_styled_text() {
        // テスト項目: 端末表示にロールと装飾済みのテキストが含まれ、マークダウン記号は残らない
        // given (前提条件):
        let message = RenderedMessage::new(
            Role::Ai,
            "**hi**".to_string(),
            "<p><strong>hi</strong></p>\n".to_string(),
            1672531200000,
        );

        // when (操作):
        let result = MessageFormatter::format_message(&message);

        // then (期待する結果):
        assert!(result.contains("@ai ["));
        assert!(result.contains("\x1b[1mhi\x1b[22m"));
        assert!(!result.contains("**"));
        assert!(!result.contains("<strong>"));
        assert!(result.contains(SEPARATOR));
    }

    #[test]
    fn test_terminal_bold_and_italic() {
        // テスト項目: 太字と斜体が ANSI の装飾になる
        // given (前提条件):
        let text = "**hi** and *there*";

        // when (操作):
        let result = MarkdownFormatter::default().to_terminal(text);

        // then (期待する結果):
        assert_eq!(result, "\x1b[1mhi\x1b[22m and \x1b[3mthere\x1b[23m");
    }

    #[test]
    fn test_terminal_lists_links_and_code() {
        // テスト項目: リストは行頭記号付き、リンクはテキストの後に URL、コードスパンは色付きで表示される
        // given (前提条件):
        let text = "- one\n- [two](https://example.com)\n\n1. first\n2. second\n\nuse `cargo`";

        // when (操作):
        let result = MarkdownFormatter::default().to_terminal(text);

        // then (期待する結果):
        assert_eq!(
            result,
            "• one\n• two (https://example.com)\n\n1. first\n2. second\n\nuse \x1b[36mcargo\x1b[39m"
        );
    }

    #[test]
    fn test_terminal_autolink_is_not_repeated() {
        // テスト項目: 自動リンクは URL を二重に表示しない
        // given (前提条件):
        let text = "<https://example.com>";

        // when (操作):
        let result = MarkdownFormatter::default().to_terminal(text);

        // then (期待する結果):
        assert_eq!(result, "https://example.com");
    }

    #[test]
    fn test_terminal_strips_escape_sequences_from_text() {
        // テスト項目: 受信テキスト中の制御文字は端末に出力されない
        // given (前提条件):
        let text = "before \x1b[2J after";

        // when (操作):
        let result = MarkdownFormatter::default().to_terminal(text);

        // then (期待する結果):
        assert_eq!(result, "before [2J after");
    }

    #[test]
    fn test_format_message_body_rows_match_height() {
        // テスト項目: 出力された行数がメッセージの高さと一致する
        // given (前提条件):
        let message = RenderedMessage::new(
            Role::Ai,
            "# Title\n\n- a\n- b\n\ntext".to_string(),
            String::new(),
            0,
        );

        // when (操作):
        let result = MessageFormatter::format_message(&message);

        // then (期待する結果):
        assert_eq!(result.lines().count(), message.height());
        assert_eq!(message.height(), 10);
    }

    #[test]
    fn test_format_message_labels_user_as_you() {
        // テスト項目: ユーザーのメッセージは "you" として表示される
        // given (前提条件):
        let message = RenderedMessage::new(
            Role::User,
            "hello".to_string(),
            "<p>hello</p>\n".to_string(),
            0,
        );

        // when (操作):
        let result = MessageFormatter::format_message(&message);

        // then (期待する結果):
        assert!(result.contains("@you ["));
    }
}
