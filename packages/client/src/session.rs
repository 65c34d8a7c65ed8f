//! WebSocket client session: connection setup and the event loop.

use futures_util::{Stream, StreamExt, stream::SplitSink};
use tokio::{net::TcpStream, sync::mpsc};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{self, protocol::Message},
};

use crate::{
    client::{ChatClient, InputEvent},
    error::ClientError,
    formatter::RichTextFormatter,
    transport::{Transport, WebSocketTransport},
    ui::TerminalLine,
};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Write half of an open chat socket
pub type SocketTransport = WebSocketTransport<SplitSink<Socket, Message>>;

/// Read half of an open chat socket
pub type IncomingFrames = futures_util::stream::SplitStream<Socket>;

/// Open the chat socket. No retry is attempted.
pub async fn connect(endpoint: &str) -> Result<(SocketTransport, IncomingFrames), ClientError> {
    let (ws_stream, _response) = connect_async(endpoint)
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

    tracing::info!("Connected to {}", endpoint);

    let (write, read) = ws_stream.split();
    Ok((WebSocketTransport::new(write), read))
}

/// Feed one terminal line to the client.
///
/// The line is typed into the input buffer, then Enter is pressed: with Shift
/// for a continued line, without it otherwise.
pub async fn dispatch_line<T, F>(client: &mut ChatClient<T, F>, line: TerminalLine)
where
    T: Transport,
    F: RichTextFormatter,
{
    match line {
        TerminalLine::Submit(text) => {
            client.input_mut().push_str(&text);
            client.handle_input(InputEvent::enter()).await;
        }
        TerminalLine::Continue(text) => {
            client.input_mut().push_str(&text);
            client.handle_input(InputEvent::shift_enter()).await;
        }
    }
}

/// Run the event loop until the input side closes.
///
/// Incoming frames and terminal lines are handled one at a time, in arrival
/// order. After the server closes the socket, input is still processed.
///
/// # Returns
///
/// The client, for inspecting the final message list
pub async fn run_event_loop<T, F, S>(
    mut client: ChatClient<T, F>,
    mut incoming: S,
    mut input_rx: mpsc::UnboundedReceiver<TerminalLine>,
) -> ChatClient<T, F>
where
    T: Transport,
    F: RichTextFormatter,
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    let mut connection_open = true;

    loop {
        tokio::select! {
            frame = incoming.next(), if connection_open => match frame {
                Some(Ok(Message::Text(text))) => client.receive(text.as_str()),
                Some(Ok(Message::Binary(data))) => {
                    tracing::debug!("Ignoring {} bytes of binary data", data.len());
                }
                Some(Ok(Message::Close(frame))) => {
                    client.connection_closed(frame.as_ref().map(|f| f.reason.as_str()));
                    connection_open = false;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    client.connection_closed(None);
                    connection_open = false;
                }
                None => {
                    client.connection_closed(None);
                    connection_open = false;
                }
            },
            line = input_rx.recv() => match line {
                Some(line) => dispatch_line(&mut client, line).await,
                None => break,
            },
        }
    }

    client
}
