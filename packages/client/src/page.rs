//! Conversation discovery from a rendered chat page.
//!
//! Chat pages embed their conversation id as JSON text inside an element with
//! a well-known id, e.g.
//! `<script id="conversation-id" type="application/json">"3f2a..."</script>`.

use scraper::{Html, Selector};

use crate::{
    domain::{ConversationId, Origin},
    error::ClientError,
};

/// Id of the element carrying the conversation id
pub const CONVERSATION_ELEMENT_ID: &str = "conversation-id";

/// Return the text content of the first element whose `id` attribute matches,
/// with character references decoded and surrounding whitespace trimmed.
pub fn extract_embedded_json(html: &str, element_id: &str) -> Option<String> {
    let selector = match Selector::parse(&format!("#{}", element_id)) {
        Ok(selector) => selector,
        Err(e) => {
            tracing::warn!("Invalid element id '{}': {}", element_id, e);
            return None;
        }
    };

    let document = Html::parse_document(html);
    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
}

/// Fetch a chat page and read which conversation it shows.
///
/// # Returns
///
/// The page origin (for the socket scheme and host) and the embedded
/// conversation id
pub async fn discover_conversation(
    page_url: &str,
) -> Result<(Origin, ConversationId), ClientError> {
    let origin = Origin::parse(page_url)?;

    tracing::info!("Fetching chat page {}", page_url);
    let html = reqwest::get(page_url)
        .await?
        .error_for_status()?
        .text()
        .await?;

    let embedded = extract_embedded_json(&html, CONVERSATION_ELEMENT_ID).ok_or_else(|| {
        ClientError::PageDiscovery(format!(
            "no element with id '{}' in {}",
            CONVERSATION_ELEMENT_ID, page_url
        ))
    })?;
    let conversation_id = ConversationId::from_embedded_json(&embedded)?;

    tracing::debug!("Discovered conversation {}", conversation_id);
    Ok((origin, conversation_id))
}
