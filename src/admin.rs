//! Admin commands received over Telegram.
//!
//! | Command | Effect |
//! |---------|--------|
//! | `/start` | Command menu for admins, a denial for everyone else |
//! | `/run` | Run one publishing cycle now and report the outcome |
//! | `/status` | Current post cap and posted-store size |
//! | `/set_limit <n>` | Change the per-cycle post cap |
//!
//! Commands other than `/start` from non-admins are ignored. Every command that
//! touches the pipeline goes through the shared execution lock, so `/run` and
//! `/set_limit` never overlap a scheduled cycle.

use crate::models::{ChatTarget, IncomingMessage};
use crate::pipeline::CycleRunner;
use crate::telegram::{Channel, UpdateSource};
use crate::utils::backoff_delay;
use std::collections::HashSet;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

const MENU: &str = "<b>👋 Привет, Админ! Я бот канала ХайЛайт Спорт.</b>\n\n\
<b>Доступные команды:</b>\n\
🚀 /run — Запустить парсинг прямо сейчас\n\
📊 /status — Состояние бота и базы\n\
⚙️ /set_limit 3 — Изменить кол-во постов\n";
const DENIED: &str = "У вас нет прав администратора.";
const RUN_STARTED: &str = "🚀 <b>Начинаю поиск свежих новостей...</b>";
const LIMIT_USAGE: &str = "⚠️ Ошибка. Пример: <code>/set_limit 3</code>";

/// A recognised bot command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Run,
    Status,
    /// Raw argument, validated when the command is handled.
    SetLimit(Option<String>),
}

/// Parse a message into a command.
///
/// `/cmd@name` is only accepted when `name` is this bot's username; in group
/// chats the suffix addresses one bot among several.
pub fn parse_command(text: &str, bot_username: Option<&str>) -> Option<Command> {
    let mut parts = text.split_whitespace();
    let head = parts.next()?.strip_prefix('/')?;
    let name = match head.split_once('@') {
        Some((name, addressee)) => {
            bot_username.filter(|me| me.eq_ignore_ascii_case(addressee))?;
            name
        }
        None => head,
    };

    match name {
        "start" => Some(Command::Start),
        "run" => Some(Command::Run),
        "status" => Some(Command::Status),
        "set_limit" => Some(Command::SetLimit(parts.next().map(str::to_string))),
        _ => None,
    }
}

/// Routes admin commands to the shared pipeline and answers over the channel.
pub struct AdminDesk<'a, R, C> {
    runner: &'a Mutex<R>,
    channel: &'a C,
    admins: &'a HashSet<i64>,
    bot_username: Option<String>,
}

impl<'a, R, C> AdminDesk<'a, R, C>
where
    R: CycleRunner,
    C: Channel,
{
    pub fn new(runner: &'a Mutex<R>, channel: &'a C, admins: &'a HashSet<i64>) -> Self {
        Self {
            runner,
            channel,
            admins,
            bot_username: None,
        }
    }

    /// Accept `/cmd@username` commands addressed to this bot.
    pub fn with_username(mut self, username: Option<String>) -> Self {
        self.bot_username = username;
        self
    }

    /// Handle one incoming message. Non-command messages are ignored.
    #[instrument(level = "info", skip_all, fields(chat_id = message.chat_id, sender = ?message.sender_id))]
    pub async fn handle(&self, message: &IncomingMessage) {
        let Some(command) = parse_command(&message.text, self.bot_username.as_deref()) else {
            debug!("Not a command for this bot; ignoring");
            return;
        };
        let chat = ChatTarget::Id(message.chat_id);
        let is_admin = message
            .sender_id
            .is_some_and(|id| self.admins.contains(&id));

        if !is_admin {
            match command {
                Command::Start => self.reply(&chat, DENIED, Some(message.message_id)).await,
                other => warn!(command = ?other, "Ignoring admin command from non-admin"),
            }
            return;
        }

        info!(command = ?command, "Admin command");
        match command {
            Command::Start => self.reply(&chat, MENU, None).await,
            Command::Run => {
                self.reply(&chat, RUN_STARTED, None).await;
                let report = self.runner.lock().await.run_cycle().await;
                self.reply(&chat, &format!("✅ <b>Цикл завершён:</b> {report}"), None)
                    .await;
            }
            Command::Status => {
                let text = {
                    let runner = self.runner.lock().await;
                    status_text(runner.post_cap(), runner.posted_count().await)
                };
                self.reply(&chat, &text, None).await;
            }
            Command::SetLimit(arg) => match arg.as_deref().map(str::parse::<usize>) {
                Some(Ok(limit)) => {
                    self.runner.lock().await.set_post_cap(limit);
                    self.reply(&chat, &format!("✅ <b>Лимит обновлен:</b> {limit} постов."), None)
                        .await;
                }
                _ => {
                    warn!(argument = ?arg, "Rejected /set_limit argument");
                    self.reply(&chat, LIMIT_USAGE, None).await;
                }
            },
        }
    }

    async fn reply(&self, chat: &ChatTarget, text: &str, reply_to: Option<i64>) {
        if let Err(e) = self.channel.send_message(chat, text, reply_to).await {
            warn!(reason = e.reason(), error = %e, %chat, "Failed to answer admin command");
        }
    }
}

fn status_text(post_cap: usize, posted: usize) -> String {
    format!(
        "<b>📊 Статус бота:</b>\n\
         ✅ Работает\n\
         📈 Лимит за раз: {post_cap}\n\
         🗂 База (уникальных новостей): {posted}"
    )
}

/// Long-poll Telegram for updates and dispatch them to `desk`, forever.
///
/// Polling failures back off exponentially and never end the loop.
pub async fn receive_commands<U, R, C>(updates: &U, desk: &AdminDesk<'_, R, C>)
where
    U: UpdateSource,
    R: CycleRunner,
    C: Channel,
{
    let mut offset = None;
    let mut failures = 0u32;
    info!("Command receiver started");

    loop {
        match updates.get_updates(offset).await {
            Ok(updates) => {
                failures = 0;
                for update in updates {
                    offset = Some(update.update_id + 1);
                    if let Some(message) = update.into_incoming() {
                        desk.handle(&message).await;
                    }
                }
            }
            Err(e) => {
                failures += 1;
                let delay = backoff_delay(failures);
                warn!(
                    reason = e.reason(),
                    error = %e,
                    attempt = failures,
                    ?delay,
                    "getUpdates failed; backing off"
                );
                sleep(delay).await;
            }
        }
    }
}
