use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::{
    messaging::{
        port::MessagingSink,
        types::{IncomingUpdate, OutboundAction},
    },
    routing::Engine,
    Result,
};

/// Entry point a transport (long-poll loop, webhook) feeds updates into.
#[async_trait]
pub trait UpdateHandler: Send + Sync {
    async fn handle_update(&self, update: IncomingUpdate) -> Result<()>;
}

/// Routing engine plus the sink its actions go to.
///
/// Built once at startup and shared by every transport task.
#[derive(Clone)]
pub struct Handler {
    engine: Engine,
    sink: Arc<dyn MessagingSink>,
}

impl Handler {
    pub fn new(engine: Engine, sink: Arc<dyn MessagingSink>) -> Self {
        Self { engine, sink }
    }

    /// Execute `actions` strictly in order.
    ///
    /// A failed send is logged and does not stop the remaining actions.
    pub async fn dispatch(&self, actions: Vec<OutboundAction>) {
        for action in actions {
            if let Err(e) = self.send(&action).await {
                warn!(error = %e, ?action, "outbound action failed");
            }
        }
    }

    async fn send(&self, action: &OutboundAction) -> Result<()> {
        match action {
            OutboundAction::Notice { chat_id, text } => self.sink.send_notice(*chat_id, text).await,
            OutboundAction::Forward { to, from, message_id } => {
                self.sink.send_forward(*to, *from, *message_id).await
            }
            OutboundAction::Reply {
                chat_id,
                in_reply_to,
                text,
            } => self.sink.send_reply(*chat_id, *in_reply_to, text).await,
            OutboundAction::AnswerSuggestions {
                query_id,
                suggestions,
            } => self.sink.answer_suggestions(query_id, suggestions).await,
        }
    }
}

#[async_trait]
impl UpdateHandler for Handler {
    async fn handle_update(&self, update: IncomingUpdate) -> Result<()> {
        if let IncomingUpdate::Message(msg) = &update {
            debug!(
                sender = msg.sender.as_deref().unwrap_or("unknown"),
                text = msg.text.as_deref().unwrap_or_default(),
                caption = msg.caption.as_deref().unwrap_or_default(),
                "incoming message"
            );
        }

        let actions = self.engine.plan(&update)?;
        self.dispatch(actions).await;
        Ok(())
    }
}
