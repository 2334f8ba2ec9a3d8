use std::io::Write as _;
use std::sync::Arc;

use arsenal::config::{AppConfig, CompletionConfig, IdentityConfig};
use arsenal::identity::IdentityProvider;
use arsenal::identity::local::LocalIdentity;
use arsenal::identity::supabase::SupabaseIdentity;
use arsenal::llm::mock::MockCompletionProvider;
use arsenal::llm::types::{CompletionProvider, LlmChat};
use arsenal::llm::{ChatCompletionProvider, LlmClient};
use arsenal::services::chat::{
    GenerationError, GenerationStatus, QUICK_PROMPTS, ResponseOrchestrator, SendOptions,
};
use arsenal::services::login::{AuthMode, FormPhase, LoginForm, NoticeKind, cooldown_ticker};
use arsenal::services::session::SessionGate;
use arsenal::store::{ConversationStore, StoreEvent};
use arsenal::types::{Conversation, Message, Role, Session};
use time::macros::format_description;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

type Input = Lines<BufReader<Stdin>>;

const HELP: &str = "\
/new              start a new conversation
/list             list conversations
/select <n>       switch to conversation n
/delete <n>       delete conversation n
/rename <title>   rename the active conversation
/find <query>     filter conversations by title
/search on|off    toggle web search mode
/signout          sign out
/quit             exit";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "arsenal=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = AppConfig::from_env()?;
    let (identity, local) = build_identity(&config.identity)?;
    let provider = build_provider(&config.completion)?;
    let gate = SessionGate::new(identity);
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let session = match gate.resolve_session().await {
            Some(session) => session,
            None => match login(&gate, local.as_deref(), &mut input).await? {
                Some(session) => session,
                None => return Ok(()),
            },
        };

        let store = ConversationStore::with_welcome(session.id);
        let mut orchestrator = ResponseOrchestrator::new(store, Arc::clone(&provider));
        if let Some(timeout) = config.generation_timeout {
            orchestrator = orchestrator.with_timeout(timeout);
        }

        match chat(&gate, &session, &orchestrator, &mut input).await? {
            ChatExit::SignedOut => {}
            ChatExit::Quit => return Ok(()),
        }
    }
}

// =============================================================================
// WIRING
// =============================================================================

type IdentityHandles = (Arc<dyn IdentityProvider>, Option<Arc<LocalIdentity>>);

fn build_identity(config: &IdentityConfig) -> Result<IdentityHandles, Box<dyn std::error::Error>> {
    match config {
        IdentityConfig::Local { require_confirmation, email_interval } => {
            let local = Arc::new(LocalIdentity::new(*require_confirmation, *email_interval));
            tracing::info!(require_confirmation, "using local identity provider");
            Ok((local.clone(), Some(local)))
        }
        IdentityConfig::Supabase(supabase) => {
            tracing::info!(url = %supabase.url, "using supabase identity provider");
            Ok((Arc::new(SupabaseIdentity::new(supabase.clone())?), None))
        }
    }
}

fn build_provider(config: &CompletionConfig) -> Result<Arc<dyn CompletionProvider>, Box<dyn std::error::Error>> {
    match config {
        CompletionConfig::Mock { delay, jitter } => Ok(Arc::new(MockCompletionProvider::new(*delay, *jitter))),
        CompletionConfig::Llm(llm) => {
            let client = LlmClient::from_config(llm)?;
            tracing::info!(model = client.model(), "LLM client initialized");
            let chat: Arc<dyn LlmChat> = Arc::new(client);
            Ok(Arc::new(ChatCompletionProvider::new(chat, llm.max_tokens)))
        }
    }
}

// =============================================================================
// LOGIN
// =============================================================================

async fn prompt(input: &mut Input, label: &str) -> std::io::Result<Option<String>> {
    print!("{label}");
    std::io::stdout().flush()?;
    Ok(input.next_line().await?.map(|line| line.trim().to_owned()))
}

async fn login(
    gate: &SessionGate,
    local: Option<&LocalIdentity>,
    input: &mut Input,
) -> std::io::Result<Option<Session>> {
    let mut form = LoginForm::new();
    println!("Arsenal AI: Advanced AI Assistant Platform");

    loop {
        if let Some(notice) = form.notice() {
            let tag = match notice.kind {
                NoticeKind::Warning => "wait",
                NoticeKind::Info => "info",
                NoticeKind::Error => "error",
            };
            println!("[{tag}] {}", notice.text);
        }

        if !form.can_submit() {
            let mut ticker = cooldown_ticker();
            while form.cooldown_remaining() > 0 {
                print!("\r{}   ", form.submit_label());
                std::io::stdout().flush()?;
                ticker.tick().await;
                form.tick();
            }
            println!();
            continue;
        }

        let heading = match form.mode() {
            AuthMode::SignIn => "Sign in (/signup to create an account, /quit to exit)",
            AuthMode::SignUp => "Create an account (/signin if you already have one, /quit to exit)",
        };
        println!("{heading}");

        let Some(email) = prompt(input, "Email: ").await? else {
            return Ok(None);
        };
        match email.as_str() {
            "/quit" => return Ok(None),
            "/signup" => {
                form.set_mode(AuthMode::SignUp);
                continue;
            }
            "/signin" => {
                form.set_mode(AuthMode::SignIn);
                continue;
            }
            "/dismiss" => {
                form.dismiss();
                continue;
            }
            _ => {}
        }
        if let Some(address) = email.strip_prefix("/confirm ") {
            match local {
                Some(local) if local.confirm_email(address) => println!("Confirmed {address}."),
                Some(_) => println!("No pending account for {address}."),
                None => println!("Confirmation links are sent by email."),
            }
            continue;
        }
        form.email = email;

        let Some(password) = prompt(input, "Password: ").await? else {
            return Ok(None);
        };
        form.password = password;

        if form.mode() == AuthMode::SignUp {
            let Some(name) = prompt(input, "Full name: ").await? else {
                return Ok(None);
            };
            form.name = name;
        }

        println!("Please wait...");
        if form.submit(gate).await == FormPhase::Success {
            if let Some(session) = gate.session() {
                println!("Welcome, {}.", session.name);
                return Ok(Some(session));
            }
            println!("Account created. Check your email for the confirmation link, then sign in.");
            form.set_mode(AuthMode::SignIn);
        }
        form.password.clear();
    }
}

// =============================================================================
// CHAT
// =============================================================================

enum ChatExit {
    SignedOut,
    Quit,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Help,
    New,
    List,
    Select(usize),
    Delete(usize),
    Rename(String),
    Find(String),
    Search(bool),
    SignOut,
    Quit,
    Send(String),
    Invalid(String),
}

fn parse_command(line: &str) -> Command {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Send(line.to_owned());
    };
    let (name, arg) = rest.split_once(' ').map_or((rest, ""), |(n, a)| (n, a.trim()));
    let index = |arg: &str| arg.parse::<usize>().ok().filter(|n| *n > 0);
    match (name, arg) {
        ("help", _) => Command::Help,
        ("new", _) => Command::New,
        ("list", _) => Command::List,
        ("select", a) => index(a).map_or_else(|| Command::Invalid("usage: /select <n>".into()), Command::Select),
        ("delete", a) => index(a).map_or_else(|| Command::Invalid("usage: /delete <n>".into()), Command::Delete),
        ("rename", a) => Command::Rename(a.to_owned()),
        ("find", a) => Command::Find(a.to_owned()),
        ("search", "on") => Command::Search(true),
        ("search", "off") => Command::Search(false),
        ("search", _) => Command::Invalid("usage: /search on|off".into()),
        ("signout", _) => Command::SignOut,
        ("quit", _) => Command::Quit,
        _ => Command::Invalid(format!("unknown command /{name}; /help lists commands")),
    }
}

async fn chat(
    gate: &SessionGate,
    session: &Session,
    orchestrator: &ResponseOrchestrator,
    input: &mut Input,
) -> std::io::Result<ChatExit> {
    let store = orchestrator.store();
    let mut subscription = store.subscribe();
    let (failures_tx, mut failures_rx) = mpsc::channel::<(Uuid, GenerationError)>(16);
    let mut search_mode = false;

    println!("Signed in as {} <{}>. /help lists commands.", session.name, session.email);
    render_active(orchestrator);
    print_prompt(search_mode)?;

    let exit = loop {
        tokio::select! {
            line = input.next_line() => {
                let Some(line) = line? else {
                    break ChatExit::Quit;
                };
                if line.trim().is_empty() {
                    print_prompt(search_mode)?;
                    continue;
                }
                match parse_command(&line) {
                    Command::Help => println!("{HELP}"),
                    Command::New => {
                        store.create_conversation(session.id);
                    }
                    Command::List => print_list(store, &store.list_conversations()),
                    Command::Select(n) => match nth_conversation(store, n) {
                        Some(id) => {
                            if let Err(e) = store.select_conversation(id) {
                                println!("[error] {e}");
                            }
                        }
                        None => println!("[error] no conversation {n}"),
                    },
                    Command::Delete(n) => match nth_conversation(store, n) {
                        Some(id) => {
                            store.delete_conversation(id);
                        }
                        None => println!("[error] no conversation {n}"),
                    },
                    Command::Rename(title) => match store.active_conversation_id() {
                        Some(id) => {
                            if let Err(e) = store.rename_conversation(id, &title) {
                                println!("[error] {e}");
                            }
                        }
                        None => println!("[error] no active conversation"),
                    },
                    Command::Find(query) => print_list(store, &store.filter_conversations(&query)),
                    Command::Search(on) => {
                        search_mode = on;
                        println!("Web search {}.", if on { "on" } else { "off" });
                    }
                    Command::SignOut => match gate.sign_out().await {
                        Ok(()) => break ChatExit::SignedOut,
                        Err(e) => println!("[error] {e}"),
                    },
                    Command::Quit => break ChatExit::Quit,
                    Command::Invalid(msg) => println!("[error] {msg}"),
                    Command::Send(text) => {
                        send(orchestrator, session.id, &failures_tx, text, search_mode);
                    }
                }
                print_prompt(search_mode)?;
            }
            Some(event) = subscription.events.recv() => {
                render_event(orchestrator, &event);
            }
            Some((conversation_id, err)) = failures_rx.recv() => {
                let title = store.get_conversation(conversation_id).map_or_else(String::new, |c| c.title);
                println!("\n[error] {title}: {err}");
                print_prompt(search_mode)?;
            }
        }
    };

    store.unsubscribe(subscription.id);
    Ok(exit)
}

fn send(
    orchestrator: &ResponseOrchestrator,
    owner: Uuid,
    failures: &mpsc::Sender<(Uuid, GenerationError)>,
    text: String,
    search_mode: bool,
) {
    let store = orchestrator.store();
    let conversation_id = match store.active_conversation_id() {
        Some(id) => id,
        None => store.create_conversation(owner),
    };
    if orchestrator.status(conversation_id) == GenerationStatus::InFlight {
        println!("[wait] Arsenal AI is still answering in this conversation.");
        return;
    }

    let orchestrator = orchestrator.clone();
    let failures = failures.clone();
    tokio::spawn(async move {
        let options = SendOptions { search_mode };
        if let Err(e) = orchestrator.send_user_message(conversation_id, &text, options).await {
            let _ = failures.send((conversation_id, e)).await;
        }
    });
}

// =============================================================================
// RENDERING
// =============================================================================

fn nth_conversation(store: &ConversationStore, n: usize) -> Option<Uuid> {
    store.list_conversations().get(n - 1).map(|c| c.id)
}

fn print_prompt(search_mode: bool) -> std::io::Result<()> {
    print!("{}> ", if search_mode { "[search] " } else { "" });
    std::io::stdout().flush()
}

fn print_list(store: &ConversationStore, shown: &[Conversation]) {
    let all = store.list_conversations();
    let active = store.active_conversation_id();
    if shown.is_empty() {
        println!("No conversations yet.");
        return;
    }
    for conversation in shown {
        let Some(position) = all.iter().position(|c| c.id == conversation.id) else {
            continue;
        };
        let marker = if Some(conversation.id) == active { '*' } else { ' ' };
        println!(
            "{marker}{:>3}. {} ({} messages)",
            position + 1,
            conversation.title,
            conversation.message_count
        );
    }
}

fn render_message(message: &Message) {
    let clock = format_description!("[hour]:[minute]");
    let at = message.timestamp.format(clock).unwrap_or_default();
    let who = match message.role {
        Role::User => "You",
        Role::Assistant => "Arsenal AI",
    };
    println!("{who} [{at}]: {}", message.content);
    for source in message.sources.iter().flatten() {
        println!("    source: {source}");
    }
}

fn render_active(orchestrator: &ResponseOrchestrator) {
    let store = orchestrator.store();
    let Some(id) = store.active_conversation_id() else {
        println!("No conversation selected. Type a message or /new to start one.");
        return;
    };
    let Some(conversation) = store.get_conversation(id) else {
        return;
    };
    println!("== {} ==", conversation.title);
    if let Ok(messages) = store.get_messages(id) {
        messages.iter().for_each(render_message);
    }
    if orchestrator.status(id) == GenerationStatus::InFlight {
        println!("Arsenal AI is thinking...");
    }
    if orchestrator.quick_prompts_visible(id) {
        println!("Try: {}", QUICK_PROMPTS.join(" | "));
    }
}

fn render_event(orchestrator: &ResponseOrchestrator, event: &StoreEvent) {
    let store = orchestrator.store();
    match event {
        StoreEvent::Selected { .. } => render_active(orchestrator),
        StoreEvent::Renamed { conversation_id } => {
            if let Some(conversation) = store.get_conversation(*conversation_id) {
                println!("Renamed to \"{}\".", conversation.title);
            }
        }
        StoreEvent::MessageAppended { conversation_id, message_id } => {
            if store.active_conversation_id() != Some(*conversation_id) {
                return;
            }
            let Ok(messages) = store.get_messages(*conversation_id) else {
                return;
            };
            let Some(message) = messages.iter().find(|m| m.id == *message_id) else {
                return;
            };
            if message.role == Role::Assistant {
                println!();
                render_message(message);
            } else if orchestrator.status(*conversation_id) == GenerationStatus::InFlight {
                println!("Arsenal AI is thinking...");
            }
        }
        StoreEvent::Created { .. } | StoreEvent::Deleted { .. } => {}
    }
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
