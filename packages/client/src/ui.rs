//! Terminal input for the client.

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;

/// Prompt shown while waiting for input
pub const PROMPT: &str = "you> ";

/// Marker that continues the message on the next line
const CONTINUATION: char = '\\';

/// One line read from the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalLine {
    /// Line finished with a plain Enter
    Submit(String),
    /// Line ended with the continuation marker (Shift+Enter equivalent)
    Continue(String),
}

impl TerminalLine {
    /// Classify a raw line returned by the editor.
    pub fn parse(line: String) -> Self {
        match line.strip_suffix(CONTINUATION) {
            Some(head) => TerminalLine::Continue(head.to_string()),
            None => TerminalLine::Submit(line),
        }
    }
}

/// Spawn a blocking thread running the line editor.
///
/// Lines are forwarded untouched (blank lines included). The channel closes
/// when the user presses Ctrl+C or Ctrl+D.
pub fn spawn_line_editor(
    tx: mpsc::UnboundedSender<TerminalLine>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                tracing::error!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str()).ok();
                    }
                    if tx.send(TerminalLine::parse(line)).is_err() {
                        // Event loop is gone
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_line_submits() {
        // テスト項目: 通常の行は送信として扱われる
        // given (前提条件):
        let line = "hello".to_string();

        // when (操作):
        let result = TerminalLine::parse(line);

        // then (期待する結果):
        assert_eq!(result, TerminalLine::Submit("hello".to_string()));
    }

    #[test]
    fn test_parse_continued_line() {
        // テスト項目: 末尾がバックスラッシュの行は継続行として扱われ、マーカーは除去される
        // given (前提条件):
        let line = "first line\\".to_string();

        // when (操作):
        let result = TerminalLine::parse(line);

        // then (期待する結果):
        assert_eq!(result, TerminalLine::Continue("first line".to_string()));
    }

    #[test]
    fn test_parse_blank_line_is_still_submitted() {
        // テスト項目: 空行も送信イベントとして転送される（空判定はクライアント側で行う）
        // given (前提条件):
        let line = "   ".to_string();

        // when (操作):
        let result = TerminalLine::parse(line);

        // then (期待する結果):
        assert_eq!(result, TerminalLine::Submit("   ".to_string()));
    }
}
