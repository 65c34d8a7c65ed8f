//! Client execution logic.

use tokio::sync::mpsc;

use crate::{
    client::ChatClient,
    config::ClientConfig,
    error::ClientError,
    formatter::MessageFormatter,
    session::{connect, run_event_loop},
    ui::spawn_line_editor,
    view::{TerminalView, TranscriptView},
};

/// Run the chat client until the user exits.
///
/// The connection is opened once; if that fails the error is returned and no
/// retry is made.
pub async fn run_client(config: ClientConfig) -> Result<(), ClientError> {
    let (origin, conversation_id) = config.resolve().await?;
    let endpoint = origin.chat_endpoint(&conversation_id);

    tracing::info!("Attempting to connect to {}", endpoint);
    let (transport, incoming) = connect(&endpoint).await?;

    print!(
        "{}",
        MessageFormatter::format_connected(&conversation_id, &endpoint)
    );

    let mut client = ChatClient::new(conversation_id.clone(), transport)
        .with_viewport_height(config.viewport_height);
    client.subscribe(Box::new(TerminalView::stdout()));

    if let Some(path) = &config.transcript {
        let transcript = TranscriptView::new(path, conversation_id);
        transcript.write(client.messages())?;
        tracing::info!("Writing transcript to {}", path.display());
        client.subscribe(Box::new(transcript));
    }

    let (input_tx, input_rx) = mpsc::unbounded_channel();
    let _line_editor = spawn_line_editor(input_tx);

    let client = run_event_loop(client, incoming, input_rx).await;

    tracing::info!(
        "Client session ended with {} messages",
        client.messages().len()
    );

    Ok(())
}
