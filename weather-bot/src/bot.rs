//! Telegram long-polling runtime.
//!
//! Maps updates to conversation [`Event`]s and sends the resulting replies in
//! order. An escalated handler error ends the process with a non-zero status.

use log::{error, info};
use std::sync::Arc;
use teloxide::{
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode},
    utils::command::BotCommands,
};

use crate::{
    conversation::{Conversation, Event, HandlerError, Reply},
    format::MenuButton,
};

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
enum Command {
    #[command(description = "ask for a city name.")]
    Help,
    #[command(description = "same as /help.")]
    Start,
}

pub async fn run(token: String, conversation: Conversation) {
    let bot = Bot::new(token);
    info!("starting long polling");

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(on_command),
        )
        .branch(Update::filter_message().endpoint(on_message))
        .branch(Update::filter_callback_query().endpoint(on_callback));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![Arc::new(conversation)])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("dispatcher stopped");
}

async fn on_command(
    bot: Bot,
    msg: Message,
    _cmd: Command,
    conversation: Arc<Conversation>,
) -> ResponseResult<()> {
    dispatch(&bot, msg.chat.id, &conversation, Event::Help).await
}

async fn on_message(bot: Bot, msg: Message, conversation: Arc<Conversation>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    dispatch(&bot, msg.chat.id, &conversation, Event::CityQuery(text.to_string())).await
}

async fn on_callback(
    bot: Bot,
    q: CallbackQuery,
    conversation: Arc<Conversation>,
) -> ResponseResult<()> {
    bot.answer_callback_query(q.id.clone()).await?;

    let Some(chat_id) = q.message.as_ref().map(|m| m.chat().id) else {
        return Ok(());
    };

    let payload = q.data.unwrap_or_default();
    dispatch(&bot, chat_id, &conversation, Event::Selection(payload)).await
}

/// Exit status used when an upstream failure is escalated.
const ESCALATION_EXIT_CODE: i32 = 1;

/// What the runtime does with a handled event.
#[derive(Debug)]
enum Delivery {
    Send(Vec<Reply>),
    /// Send nothing more and stop the process with this status.
    Escalate { code: i32, error: HandlerError },
}

fn delivery(outcome: Result<Vec<Reply>, HandlerError>) -> Delivery {
    match outcome {
        Ok(replies) => Delivery::Send(replies),
        Err(error) => Delivery::Escalate { code: ESCALATION_EXIT_CODE, error },
    }
}

async fn dispatch(
    bot: &Bot,
    chat_id: ChatId,
    conversation: &Conversation,
    event: Event,
) -> ResponseResult<()> {
    match delivery(conversation.handle(event).await) {
        Delivery::Send(replies) => send_replies(bot, chat_id, replies).await,
        Delivery::Escalate { code, error } => {
            error!("fatal upstream failure, shutting down: {error}");
            std::process::exit(code);
        }
    }
}

async fn send_replies(bot: &Bot, chat_id: ChatId, replies: Vec<Reply>) -> ResponseResult<()> {
    for reply in replies {
        match reply {
            Reply::Text(text) => {
                bot.send_message(chat_id, text).parse_mode(ParseMode::Html).await?;
            }
            Reply::Menu { text, buttons } => {
                bot.send_message(chat_id, text).reply_markup(keyboard(buttons)).await?;
            }
        }
    }

    Ok(())
}

/// One button per row.
fn keyboard(buttons: Vec<MenuButton>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(
        buttons
            .into_iter()
            .map(|b| vec![InlineKeyboardButton::callback(b.label, b.payload)]),
    )
}
