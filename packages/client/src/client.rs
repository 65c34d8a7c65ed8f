//! The chat client: input events in, protocol messages out, and incoming
//! envelopes rendered into the message list.

use kotoba_shared::time::{Clock, SystemClock};

use crate::{
    domain::{ConversationId, Role, error_notice_text, prepare_outgoing},
    error::TransportError,
    formatter::{MarkdownFormatter, RichTextFormatter},
    protocol::{IncomingEnvelope, OutgoingMessage},
    transport::Transport,
    view::{DEFAULT_VIEWPORT_HEIGHT, InputField, MessageList, MessageView, RenderedMessage},
};

/// Keys the client reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Char(char),
}

/// Input events delivered to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// A key pressed in the input field
    KeyDown { key: Key, shift: bool },
    /// The send trigger was activated
    SendClicked,
}

impl InputEvent {
    pub fn enter() -> Self {
        InputEvent::KeyDown {
            key: Key::Enter,
            shift: false,
        }
    }

    pub fn shift_enter() -> Self {
        InputEvent::KeyDown {
            key: Key::Enter,
            shift: true,
        }
    }
}

/// Whether the connection is usable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Open,
    NotOpen,
}

/// Chat client bound to one conversation.
///
/// The client owns the message list and the input buffer; it is driven by a
/// single event loop and never shared between tasks.
pub struct ChatClient<T: Transport, F: RichTextFormatter = MarkdownFormatter> {
    conversation_id: ConversationId,
    transport: T,
    formatter: F,
    clock: Box<dyn Clock>,
    connection: ConnectionState,
    messages: MessageList,
    input: InputField,
    views: Vec<Box<dyn MessageView>>,
}

impl<T: Transport> ChatClient<T, MarkdownFormatter> {
    /// Create a client for an open connection.
    pub fn new(conversation_id: ConversationId, transport: T) -> Self {
        Self::with_formatter(conversation_id, transport, MarkdownFormatter::default())
    }
}

impl<T: Transport, F: RichTextFormatter> ChatClient<T, F> {
    pub fn with_formatter(conversation_id: ConversationId, transport: T, formatter: F) -> Self {
        let mut messages = MessageList::new(DEFAULT_VIEWPORT_HEIGHT);
        messages.scroll_to_bottom();

        Self {
            conversation_id,
            transport,
            formatter,
            clock: Box::new(SystemClock),
            connection: ConnectionState::Open,
            messages,
            input: InputField::default(),
            views: Vec::new(),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Resize the scroll viewport. The list stays anchored to the bottom.
    pub fn with_viewport_height(mut self, rows: usize) -> Self {
        let mut messages = MessageList::new(rows);
        for message in self.messages.messages() {
            messages.append(message.clone());
        }
        messages.scroll_to_bottom();
        self.messages = messages;
        self
    }

    /// Register a view to be notified of every append.
    pub fn subscribe(&mut self, view: Box<dyn MessageView>) {
        self.views.push(view);
    }

    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection
    }

    pub fn messages(&self) -> &MessageList {
        &self.messages
    }

    pub fn input(&self) -> &InputField {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputField {
        &mut self.input
    }

    /// Handle one input event.
    ///
    /// Enter without Shift and the send trigger both submit the buffer.
    /// Shift+Enter inserts a newline.
    pub async fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyDown {
                key: Key::Enter,
                shift: false,
            }
            | InputEvent::SendClicked => {
                self.send().await;
            }
            InputEvent::KeyDown {
                key: Key::Enter,
                shift: true,
            } => self.input.insert_newline(),
            InputEvent::KeyDown {
                key: Key::Char(c), ..
            } => self.input.push_str(c.encode_utf8(&mut [0; 4])),
        }
    }

    /// Submit the input buffer.
    ///
    /// Blank input is ignored and leaves the buffer untouched. Otherwise the
    /// trimmed text is sent, echoed locally as a `user` message, and the
    /// buffer is cleared. The echo does not depend on the send succeeding.
    ///
    /// # Returns
    ///
    /// `true` if a message was submitted
    pub async fn send(&mut self) -> bool {
        let Some(text) = prepare_outgoing(self.input.value()) else {
            return false;
        };

        if self.connection == ConnectionState::NotOpen {
            tracing::debug!("Sending while the connection is not open");
        }

        if let Err(e) = self.transmit(&text).await {
            tracing::warn!("{}", e);
        }

        self.render(Role::User, text);
        self.input.clear();
        true
    }

    async fn transmit(&mut self, text: &str) -> Result<(), TransportError> {
        let json = OutgoingMessage::new(text)
            .to_json()
            .map_err(|e| TransportError::Encode(e.to_string()))?;
        self.transport.send_text(json).await
    }

    /// Handle one incoming text frame.
    pub fn receive(&mut self, payload: &str) {
        match IncomingEnvelope::decode(payload) {
            Ok(IncomingEnvelope::AiResponse(text)) => self.render(Role::Ai, text),
            Ok(IncomingEnvelope::ErrorNotice(error)) => {
                tracing::warn!("Error: {}", error);
                self.render(Role::System, error_notice_text(&error));
            }
            Ok(IncomingEnvelope::Unrecognized) => {
                tracing::debug!("Ignoring unrecognized message: {}", payload);
            }
            Err(e) => {
                tracing::warn!("Ignoring incoming message: {}", e);
            }
        }
    }

    /// Record that the server side went away. Only logged; nothing is
    /// rendered and no reconnect is attempted.
    pub fn connection_closed(&mut self, reason: Option<&str>) {
        self.connection = ConnectionState::NotOpen;
        match reason {
            Some(reason) if !reason.is_empty() => {
                tracing::error!("Chat socket closed unexpectedly: {}", reason)
            }
            _ => tracing::error!("Chat socket closed unexpectedly"),
        }
    }

    fn render(&mut self, role: Role, text: String) {
        let html = self.formatter.to_html(&text);
        let message = RenderedMessage::new(role, text, html, self.clock.now_millis());

        self.messages.append(message);
        self.messages.scroll_to_bottom();

        if let Some(appended) = self.messages.last() {
            for view in self.views.iter_mut() {
                view.message_appended(appended, &self.messages);
            }
        }
    }
}
