use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tracing::{info, warn};

use retg_core::{
    config::{Config, Transport},
    handler::{Handler, UpdateHandler},
    routing::Engine,
    tree::ChatTree,
};

use crate::{convert::convert_update, webhook, TelegramMessenger};

/// Wire the Telegram messenger to the core handler and run the configured
/// transport until shutdown.
pub async fn run(cfg: Arc<Config>, tree: Arc<ChatTree>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.bot_token.clone());

    let bot_username = resolve_username(&bot, &cfg).await?;
    info!(
        username = %bot_username,
        chats = tree.all_chats().len(),
        tags = tree.all_aliases().len(),
        "bot started"
    );

    let messenger = Arc::new(TelegramMessenger::new(bot.clone()));
    let handler: Arc<dyn UpdateHandler> =
        Arc::new(Handler::new(Engine::new(tree, bot_username), messenger));

    match cfg.transport {
        Transport::Polling => {
            run_polling(bot, handler).await;
            Ok(())
        }
        Transport::Webhook => webhook::serve(cfg.listen_addr, cfg.webhook_token.clone(), handler).await,
    }
}

async fn resolve_username(bot: &Bot, cfg: &Config) -> anyhow::Result<String> {
    if let Some(username) = &cfg.bot_username {
        return Ok(username.clone());
    }

    let me = bot.get_me().await?;
    me.user
        .username
        .clone()
        .ok_or_else(|| anyhow::anyhow!("getMe returned a bot without a username"))
}

/// Long-poll Telegram, handing every update to `handler`.
pub async fn run_polling(bot: Bot, handler: Arc<dyn UpdateHandler>) {
    info!("listening for updates (long polling)");

    let tree = dptree::entry().endpoint(on_update);

    Dispatcher::builder(bot, tree)
        .dependencies(dptree::deps![handler])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn on_update(update: Update, handler: Arc<dyn UpdateHandler>) -> ResponseResult<()> {
    if let Err(e) = handler.handle_update(convert_update(&update)).await {
        warn!(update_id = update.id, error = %e, "failed to handle update");
    }
    Ok(())
}
