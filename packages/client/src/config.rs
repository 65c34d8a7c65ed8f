//! Client configuration resolved from the command line.

use std::path::PathBuf;

use crate::{
    domain::{ConversationId, Origin},
    error::ClientError,
    page::discover_conversation,
    view::DEFAULT_VIEWPORT_HEIGHT,
};

/// Default page origin (local development server)
pub const DEFAULT_ORIGIN: &str = "http://127.0.0.1:8000";

/// Where the conversation to join comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Origin given directly; `None` starts a new conversation
    Direct {
        origin: Origin,
        conversation_id: Option<ConversationId>,
    },
    /// Chat page to read the origin and conversation from
    Page(String),
}

/// Validated client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub target: Target,
    pub transcript: Option<PathBuf>,
    pub viewport_height: usize,
}

impl ClientConfig {
    /// Build a configuration from raw command line values.
    ///
    /// `page` takes precedence over `origin` and `conversation_id`.
    pub fn new(
        origin: &str,
        conversation_id: Option<String>,
        page: Option<String>,
        transcript: Option<PathBuf>,
        viewport_height: Option<usize>,
    ) -> Result<Self, ClientError> {
        let target = match page {
            Some(page) => {
                // Fail fast on an unusable page URL
                Origin::parse(&page)?;
                Target::Page(page)
            }
            None => Target::Direct {
                origin: Origin::parse(origin)?,
                conversation_id: conversation_id.map(ConversationId::new).transpose()?,
            },
        };

        Ok(Self {
            target,
            transcript,
            viewport_height: viewport_height.unwrap_or(DEFAULT_VIEWPORT_HEIGHT),
        })
    }

    /// Resolve the origin and conversation to connect to.
    ///
    /// A page target is fetched over HTTP. A direct target without a
    /// conversation id gets a freshly generated one.
    pub async fn resolve(&self) -> Result<(Origin, ConversationId), ClientError> {
        match &self.target {
            Target::Direct {
                origin,
                conversation_id: Some(conversation_id),
            } => Ok((origin.clone(), conversation_id.clone())),
            Target::Direct {
                origin,
                conversation_id: None,
            } => {
                let conversation_id = ConversationId::generate();
                tracing::info!("Starting new conversation {}", conversation_id);
                Ok((origin.clone(), conversation_id))
            }
            Target::Page(page) => discover_conversation(page).await,
        }
    }
}
