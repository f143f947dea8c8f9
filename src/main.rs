use std::sync::Arc;

use anglican_quiz::config::Config;
use anglican_quiz::quiz::{
    ai_helper::{FigureSlot, QuizHelper, RequestToken},
    content::{fill, Catalog, Content, Locale, Strings},
    screens,
    session::{QuizSession, Transition},
    share::share_payload,
    tip::{create_tip_link, TipAmount},
};
use chatgpt::{client::ChatGPT, config::ChatGPTEngine};
use dotenv::dotenv;
use log::{debug, error, info};
use teloxide::{
    dispatching::dialogue::{ErasedStorage, InMemStorage, Storage},
    prelude::*,
    types::{ChatAction, ParseMode, PreCheckoutQuery},
    utils::html::escape,
};

type QuizDialogue = Dialogue<State, ErasedStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;
type FigureHelper = QuizHelper<ChatGPT>;

#[derive(Clone, Default, serde::Serialize, serde::Deserialize)]
pub enum State {
    #[default]
    Start,
    ReceiveLanguage {
        figures: FigureSlot,
        finished: Option<QuizSession>,
    },
    Answering {
        locale: Locale,
        quiz: QuizSession,
        figures: FigureSlot,
    },
    Finished {
        locale: Locale,
        quiz: QuizSession,
        figures: FigureSlot,
    },
    ReceiveTipAmount {
        locale: Locale,
        quiz: QuizSession,
        figures: FigureSlot,
    },
}

impl State {
    fn figures(&self) -> Option<&FigureSlot> {
        match self {
            State::Start => None,
            State::ReceiveLanguage { figures, .. }
            | State::Answering { figures, .. }
            | State::Finished { figures, .. }
            | State::ReceiveTipAmount { figures, .. } => Some(figures),
        }
    }

    fn locale(&self) -> Option<Locale> {
        match self {
            State::Answering { locale, .. }
            | State::Finished { locale, .. }
            | State::ReceiveTipAmount { locale, .. } => Some(*locale),
            _ => None,
        }
    }
}

// Dialogue state lives in memory only; results are not kept across restarts.
type QuizStorage = std::sync::Arc<ErasedStorage<State>>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    pretty_env_logger::init();
    log::info!("Starting anglican quiz bot...");

    let config = Arc::new(Config::from_env()?);
    let bot = Bot::from_env();
    let storage: QuizStorage = InMemStorage::<State>::new().erase();

    info!("Loading quiz content from {}", config.content_dir.display());
    let catalog = Arc::new(Catalog::load(&config.content_dir)?);

    let gpt = {
        let mut gpt = ChatGPT::new(config.chatgpt_api_key.clone())?;

        gpt.config.engine = ChatGPTEngine::Gpt35Turbo;
        gpt.config.timeout = config.chatgpt_timeout;

        gpt
    };
    let helper: Arc<FigureHelper> = Arc::new(QuizHelper::new(gpt));

    if config.payment_provider_token.is_none() {
        info!("PAYMENT_PROVIDER_TOKEN is not set, tips are disabled");
    }

    let handler = dptree::entry()
        .branch(Update::filter_pre_checkout_query().endpoint(confirm_tip))
        .branch(
            Update::filter_message()
                .enter_dialogue::<Message, ErasedStorage<State>, State>()
                .branch(
                    dptree::filter(|msg: Message| msg.successful_payment().is_some())
                        .endpoint(thank_for_tip),
                )
                .branch(dptree::filter(|msg: Message| msg.text() == Some("/start")).endpoint(start))
                .branch(
                    dptree::filter(|msg: Message| msg.text() == Some("/language"))
                        .endpoint(change_language),
                )
                .branch(dptree::case![State::Start].endpoint(start))
                .branch(
                    dptree::case![State::ReceiveLanguage { figures, finished }]
                        .endpoint(receive_language),
                )
                .branch(dptree::case![State::Answering { locale, quiz, figures }].endpoint(answering))
                .branch(dptree::case![State::Finished { locale, quiz, figures }].endpoint(finished))
                .branch(
                    dptree::case![State::ReceiveTipAmount {
                        locale,
                        quiz,
                        figures
                    }]
                    .endpoint(receive_tip_amount),
                ),
        );

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![storage, config, catalog, helper])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
    Ok(())
}

async fn start(
    bot: Bot,
    dialogue: QuizDialogue,
    msg: Message,
    catalog: Arc<Catalog>,
) -> HandlerResult {
    let mut figures = dialogue
        .get()
        .await?
        .and_then(|s| s.figures().cloned())
        .unwrap_or_default();
    figures.invalidate();

    let locale = Locale::from_language_code(msg.from().and_then(|u| u.language_code.as_deref()));
    bot.send_message(msg.chat.id, screens::greeting_text(&catalog.get(locale).strings))
        .parse_mode(ParseMode::Html)
        .reply_markup(screens::language_keyboard(&catalog))
        .await?;

    dialogue
        .update(State::ReceiveLanguage {
            figures,
            finished: None,
        })
        .await?;
    Ok(())
}

async fn change_language(
    bot: Bot,
    dialogue: QuizDialogue,
    msg: Message,
    catalog: Arc<Catalog>,
) -> HandlerResult {
    let state = dialogue.get().await?.unwrap_or_default();
    let fallback_locale = Locale::from_language_code(msg.from().and_then(|u| u.language_code.as_deref()));
    let locale = state.locale().unwrap_or(fallback_locale);

    // A finished result survives the switch; a quiz in progress starts over.
    let (figures, finished) = match state {
        State::Finished { quiz, figures, .. } | State::ReceiveTipAmount { quiz, figures, .. } => {
            (figures, Some(quiz))
        }
        other => {
            let mut figures = other.figures().cloned().unwrap_or_default();
            figures.invalidate();
            (figures, None)
        }
    };

    prompt_language(&bot, &dialogue, msg.chat.id, &catalog, locale, figures, finished).await
}

async fn prompt_language(
    bot: &Bot,
    dialogue: &QuizDialogue,
    chat_id: ChatId,
    catalog: &Catalog,
    locale: Locale,
    figures: FigureSlot,
    finished: Option<QuizSession>,
) -> HandlerResult {
    bot.send_message(chat_id, escape(&catalog.get(locale).strings.choose_language))
        .parse_mode(ParseMode::Html)
        .reply_markup(screens::language_keyboard(catalog))
        .await?;
    dialogue
        .update(State::ReceiveLanguage { figures, finished })
        .await?;
    Ok(())
}

async fn receive_language(
    bot: Bot,
    dialogue: QuizDialogue,
    (figures, finished): (FigureSlot, Option<QuizSession>),
    msg: Message,
    catalog: Arc<Catalog>,
    config: Arc<Config>,
    helper: Arc<FigureHelper>,
) -> HandlerResult {
    let Some(locale) = msg.text().and_then(|t| screens::parse_language(&catalog, t)) else {
        let locale = Locale::from_language_code(msg.from().and_then(|u| u.language_code.as_deref()));
        bot.send_message(msg.chat.id, escape(&catalog.get(locale).strings.choose_language))
            .reply_markup(screens::language_keyboard(&catalog))
            .await?;
        return Ok(());
    };
    debug!("Chat {} picked locale {}", msg.chat.id, locale.code());

    match finished {
        Some(quiz) => {
            show_results(&bot, &dialogue, msg.chat.id, locale, quiz, figures, &catalog, &config, &helper)
                .await
        }
        None => {
            let content = catalog.get(locale);
            let quiz = QuizSession::for_questions(
                &content.questions,
                config.shuffle_questions,
                &mut rand::thread_rng(),
            );
            send_question(&bot, msg.chat.id, content, &quiz).await?;
            dialogue
                .update(State::Answering {
                    locale,
                    quiz,
                    figures,
                })
                .await?;
            Ok(())
        }
    }
}

async fn send_question(
    bot: &Bot,
    chat_id: ChatId,
    content: &Content,
    quiz: &QuizSession,
) -> HandlerResult {
    let Some(text) = screens::question_text(content, quiz) else {
        return Ok(());
    };
    bot.send_message(chat_id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(screens::question_keyboard(&content.strings, quiz))
        .await?;
    Ok(())
}

async fn answering(
    bot: Bot,
    dialogue: QuizDialogue,
    (locale, mut quiz, mut figures): (Locale, QuizSession, FigureSlot),
    msg: Message,
    catalog: Arc<Catalog>,
    config: Arc<Config>,
    helper: Arc<FigureHelper>,
) -> HandlerResult {
    let content = catalog.get(locale);
    let strings = &content.strings;
    let text = msg.text().unwrap_or_default().trim();

    let transition = if text == strings.back_button {
        quiz.retreat()
    } else if text == strings.restart_button {
        quiz.restart(&mut rand::thread_rng());
        figures.invalidate();
        Transition::Moved { index: 0 }
    } else {
        match screens::parse_choice(text, quiz.current_options().len()) {
            Some(position) => quiz.answer(&content.questions, position),
            None => {
                bot.send_message(msg.chat.id, escape(&strings.choose_option))
                    .reply_markup(screens::question_keyboard(strings, &quiz))
                    .await?;
                return Ok(());
            }
        }
    };

    match transition {
        Transition::Completed { scores } => {
            info!("Chat {} completed the quiz with {:?}", msg.chat.id, scores);
            show_results(&bot, &dialogue, msg.chat.id, locale, quiz, figures, &catalog, &config, &helper)
                .await
        }
        Transition::Moved { .. } | Transition::Ignored => {
            send_question(&bot, msg.chat.id, content, &quiz).await?;
            dialogue
                .update(State::Answering {
                    locale,
                    quiz,
                    figures,
                })
                .await?;
            Ok(())
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn show_results(
    bot: &Bot,
    dialogue: &QuizDialogue,
    chat_id: ChatId,
    locale: Locale,
    quiz: QuizSession,
    mut figures: FigureSlot,
    catalog: &Arc<Catalog>,
    config: &Config,
    helper: &Arc<FigureHelper>,
) -> HandlerResult {
    let content = catalog.get(locale);
    let scores = quiz.scores();

    bot.send_message(chat_id, screens::results_text(content, &scores, config.total_max))
        .parse_mode(ParseMode::Html)
        .reply_markup(screens::results_keyboard(
            &content.strings,
            config.payment_provider_token.is_some(),
        ))
        .await?;

    // The state has to hold the new token before the request can answer.
    let token = figures.request(scores, locale);
    dialogue
        .update(State::Finished {
            locale,
            quiz,
            figures,
        })
        .await?;

    if let Some(token) = token {
        bot.send_message(chat_id, screens::loading_text(&content.strings))
            .parse_mode(ParseMode::Html)
            .await?;
        // We don't really care if this fails, it only shows "typing..."
        let _ = bot.send_chat_action(chat_id, ChatAction::Typing).await;

        spawn_figure_request(
            bot.clone(),
            dialogue.clone(),
            chat_id,
            token,
            catalog.clone(),
            helper.clone(),
        );
    }
    Ok(())
}

/// Fetch the figure in the background and post it only if the chat is still
/// showing the result the request was made for.
fn spawn_figure_request(
    bot: Bot,
    dialogue: QuizDialogue,
    chat_id: ChatId,
    token: RequestToken,
    catalog: Arc<Catalog>,
    helper: Arc<FigureHelper>,
) {
    tokio::spawn(async move {
        let content = catalog.get(token.locale);
        let outcome = helper
            .historical_figure_or_fallback(content, &token.scores)
            .await;

        let state = match dialogue.get().await {
            Ok(state) => state,
            Err(e) => {
                error!("Failed to read dialogue state for chat {}: {}", chat_id, e);
                return;
            }
        };
        let Some(outcome) = state
            .as_ref()
            .and_then(State::figures)
            .and_then(|figures| figures.accept(&token, outcome))
        else {
            return;
        };

        if let Err(e) = bot
            .send_message(chat_id, screens::figure_text(&content.strings, &outcome))
            .parse_mode(ParseMode::Html)
            .await
        {
            error!("Failed to send figure to chat {}: {}", chat_id, e);
        }
    });
}

fn is_results_button(strings: &Strings, text: &str) -> bool {
    [
        &strings.take_again_button,
        &strings.share_button,
        &strings.tip_button,
        &strings.language_button,
    ]
    .iter()
    .any(|b| b.as_str() == text.trim())
}

async fn finished(
    bot: Bot,
    dialogue: QuizDialogue,
    (locale, mut quiz, mut figures): (Locale, QuizSession, FigureSlot),
    msg: Message,
    catalog: Arc<Catalog>,
    config: Arc<Config>,
) -> HandlerResult {
    let content = catalog.get(locale);
    let strings = &content.strings;
    let text = msg.text().unwrap_or_default().trim();

    if text == strings.take_again_button {
        quiz.restart(&mut rand::thread_rng());
        figures.invalidate();
        send_question(&bot, msg.chat.id, content, &quiz).await?;
        dialogue
            .update(State::Answering {
                locale,
                quiz,
                figures,
            })
            .await?;
    } else if text == strings.share_button {
        let title = screens::result_title(content, &quiz.scores());
        let share = share_payload(strings, &title, &config.quiz_url);
        let links = format!(
            "{}\n\n<a href=\"{}\">Telegram</a> · <a href=\"{}\">WhatsApp</a> · <a href=\"{}\">X</a>",
            escape(&share.text),
            escape(&share.telegram),
            escape(&share.whatsapp),
            escape(&share.x)
        );
        bot.send_message(msg.chat.id, links)
            .parse_mode(ParseMode::Html)
            .await?;
    } else if text == strings.tip_button {
        if config.payment_provider_token.is_none() {
            bot.send_message(msg.chat.id, escape(&strings.tip_unavailable))
                .await?;
            return Ok(());
        }
        bot.send_message(msg.chat.id, escape(&strings.tip_prompt))
            .await?;
        dialogue
            .update(State::ReceiveTipAmount {
                locale,
                quiz,
                figures,
            })
            .await?;
    } else if text == strings.language_button {
        prompt_language(&bot, &dialogue, msg.chat.id, &catalog, locale, figures, Some(quiz)).await?;
    } else {
        bot.send_message(msg.chat.id, escape(&strings.choose_option))
            .reply_markup(screens::results_keyboard(
                strings,
                config.payment_provider_token.is_some(),
            ))
            .await?;
    }
    Ok(())
}

async fn receive_tip_amount(
    bot: Bot,
    dialogue: QuizDialogue,
    (locale, quiz, figures): (Locale, QuizSession, FigureSlot),
    msg: Message,
    catalog: Arc<Catalog>,
    config: Arc<Config>,
) -> HandlerResult {
    let strings = &catalog.get(locale).strings;

    let amount = match msg.text().unwrap_or_default().parse::<TipAmount>() {
        Ok(amount) => amount,
        Err(e) => {
            if msg.text().is_some_and(|t| is_results_button(strings, t)) {
                return finished(bot, dialogue, (locale, quiz, figures), msg, catalog, config).await;
            }
            debug!("Rejected tip from chat {}: {}", msg.chat.id, e);
            bot.send_message(msg.chat.id, escape(&strings.tip_invalid))
                .await?;
            return Ok(());
        }
    };

    let reply = match config.payment_provider_token.as_deref() {
        None => strings.tip_unavailable.clone(),
        Some(provider_token) => match create_tip_link(&bot, provider_token, strings, amount).await {
            Ok(url) => fill(&strings.tip_link, &[("url", &url)]),
            Err(e) => {
                error!("Failed to create tip link: {}", e);
                strings.tip_error.clone()
            }
        },
    };
    bot.send_message(msg.chat.id, reply)
        .reply_markup(screens::results_keyboard(
            strings,
            config.payment_provider_token.is_some(),
        ))
        .await?;

    dialogue
        .update(State::Finished {
            locale,
            quiz,
            figures,
        })
        .await?;
    Ok(())
}

async fn confirm_tip(bot: Bot, query: PreCheckoutQuery) -> HandlerResult {
    info!("Confirming tip checkout {}", query.invoice_payload);
    bot.answer_pre_checkout_query(query.id, true).await?;
    Ok(())
}

async fn thank_for_tip(
    bot: Bot,
    dialogue: QuizDialogue,
    msg: Message,
    catalog: Arc<Catalog>,
) -> HandlerResult {
    let locale = dialogue
        .get()
        .await?
        .and_then(|s| s.locale())
        .unwrap_or_else(|| Locale::from_language_code(msg.from().and_then(|u| u.language_code.as_deref())));
    bot.send_message(msg.chat.id, escape(&catalog.get(locale).strings.tip_thanks))
        .await?;
    Ok(())
}
