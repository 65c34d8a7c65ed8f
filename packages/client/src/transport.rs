//! Outgoing side of the conversation connection.

use async_trait::async_trait;
use futures_util::{Sink, SinkExt};
use tokio_tungstenite::tungstenite::{self, protocol::Message};

use crate::error::TransportError;

/// Sends encoded text frames to the server.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;
}

/// Transport over the write half of a WebSocket stream.
pub struct WebSocketTransport<S> {
    sink: S,
}

impl<S> WebSocketTransport<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl<S> Transport for WebSocketTransport<S>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin + Send,
{
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.sink
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sink that always fails the way a closed socket does
    struct ClosedSink;

    impl Sink<Message> for ClosedSink {
        type Error = tungstenite::Error;

        fn poll_ready(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<Result<(), Self::Error>> {
            std::task::Poll::Ready(Err(tungstenite::Error::AlreadyClosed))
        }

        fn start_send(self: std::pin::Pin<&mut Self>, _item: Message) -> Result<(), Self::Error> {
            Err(tungstenite::Error::AlreadyClosed)
        }

        fn poll_flush(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<Result<(), Self::Error>> {
            std::task::Poll::Ready(Ok(()))
        }

        fn poll_close(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<Result<(), Self::Error>> {
            std::task::Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_send_text_writes_text_frame() {
        // テスト項目: テキストフレームとして送信される
        // given (前提条件):
        let sink = Vec::<Message>::new().sink_map_err(
            |never: std::convert::Infallible| -> tungstenite::Error { match never {} },
        );
        let mut transport = WebSocketTransport::new(sink);

        // when (操作):
        let result = transport
            .send_text(r#"{"message":"hi"}"#.to_string())
            .await;

        // then (期待する結果):
        assert!(result.is_ok());
        let frames = transport.sink.get_ref();
        assert_eq!(frames, &vec![Message::Text(r#"{"message":"hi"}"#.into())]);
    }

    #[tokio::test]
    async fn test_send_text_on_closed_connection_fails() {
        // テスト項目: 閉じた接続への送信は SendFailed エラーになる
        // given (前提条件):
        let mut transport = WebSocketTransport::new(ClosedSink);

        // when (操作):
        let result = transport.send_text("x".to_string()).await;

        // then (期待する結果):
        assert!(matches!(result, Err(TransportError::SendFailed(_))));
    }
}
