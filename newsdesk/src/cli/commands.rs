//! CLI command execution.
//!
//! This is a thin client - every operation is a call to the backend API.

use std::io::Write as _;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::api::ApiClient;
use crate::auth::{reduce, AuthAction, AuthState};
use crate::chat::{render_message, render_session_row, truncate, ConversationStore};
use crate::config::{Settings, ENV_TOKEN};
use crate::error::ApiResult;
use crate::models::{BatchOutcome, DocumentQuery, IngestResult};
use crate::pipeline::{self, PipelineEvent, PipelineSocket};

use super::args::{Cli, Commands, DocsAction, IngestSource, RssAction, SessionAction};

/// Longest auto-generated session title, in characters.
const AUTO_TITLE_LEN: usize = 60;

/// How long to keep following the socket for `ai_done` once the reply is in.
const AI_DONE_GRACE: Duration = Duration::from_secs(2);

// === Command Execution ===

pub async fn execute(cli: Cli) -> Result<()> {
    let mut settings = Settings::load()?;
    if let Some(url) = cli.api_url {
        settings.api_url = url;
    }
    if cli.token.is_some() {
        settings.token = cli.token;
    }

    let mut app = App::new(settings)?;

    match cli.command {
        Commands::Login { username, password } => {
            let password = match password {
                Some(p) => p,
                None => read_password().await?,
            };
            app.login(&username, &password).await
        }
        Commands::Whoami => app.whoami().await,
        Commands::Ask {
            session,
            title,
            quiet,
            message,
        } => {
            let question = message.join(" ");
            if question.trim().is_empty() {
                bail!("Message is required for ask command");
            }
            app.ask(session, title, &question, !quiet).await
        }
        Commands::Chat { session, quiet } => app.chat(session, !quiet).await,
        Commands::Sessions { action } => app.sessions(action).await,
        Commands::Ingest { source } => app.ingest(source).await,
        Commands::Rss { action } => app.rss(action).await,
        Commands::Docs { action } => app.docs(action).await,
        Commands::Stats => app.stats().await,
        Commands::Health => app.health().await,
    }
}

/// Per-invocation state: settings, API client and auth state.
struct App {
    settings: Settings,
    client: ApiClient,
    auth: AuthState,
}

impl App {
    fn new(settings: Settings) -> Result<Self> {
        let client = ApiClient::from_settings(&settings)
            .with_context(|| format!("Invalid API URL: {}", settings.api_url))?;
        let auth = AuthState::with_token(settings.token.clone());
        Ok(Self {
            settings,
            client,
            auth,
        })
    }

    fn dispatch(&mut self, action: AuthAction) {
        self.auth = reduce(std::mem::take(&mut self.auth), action);
        self.client.set_token(self.auth.token.clone());
    }

    /// Convert an API result, logging out on rejected credentials.
    fn check<T>(&mut self, result: ApiResult<T>) -> Result<T> {
        match result {
            Ok(value) => Ok(value),
            Err(e) if e.is_unauthorized() => {
                self.dispatch(AuthAction::LoggedOut);
                bail!("{e}. Run `newsdesk login` and export {ENV_TOKEN}.")
            }
            Err(e) => Err(e.into()),
        }
    }

    // === Auth ===

    async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        self.dispatch(AuthAction::LoginStarted);

        match self.client.login(username, password).await {
            Ok(response) => {
                self.dispatch(AuthAction::LoginSucceeded {
                    user: response.user,
                    token: response.token,
                });
            }
            Err(e) => {
                let message = if e.is_unauthorized() {
                    "Invalid username or password".to_string()
                } else {
                    e.to_string()
                };
                self.dispatch(AuthAction::LoginFailed(message));
            }
        }

        if let Some(ref error) = self.auth.error {
            bail!("Login failed: {error}");
        }

        let (Some(user), Some(token)) = (&self.auth.user, &self.auth.token) else {
            bail!("Login failed: no session returned");
        };
        println!("Logged in as {}", user.username);
        println!();
        println!("export {ENV_TOKEN}={token}");
        Ok(())
    }

    async fn whoami(&mut self) -> Result<()> {
        let Some(token) = self.auth.token.clone() else {
            bail!("Not logged in. Run `newsdesk login` and export {ENV_TOKEN}.");
        };

        let result = self.client.current_user().await;
        let user = self.check(result)?;
        self.dispatch(AuthAction::SessionRestored { user, token });

        if let Some(ref user) = self.auth.user {
            println!("{}", user.username);
            if let Some(ref email) = user.email {
                println!("{email}");
            }
        }
        Ok(())
    }

    // === Conversation ===

    async fn ask(
        &mut self,
        session: Option<String>,
        title: Option<String>,
        question: &str,
        follow_status: bool,
    ) -> Result<()> {
        let mut store = ConversationStore::new(self.settings.status_clear_delay());
        let session = match session {
            Some(id) => {
                let result = self.client.get_session(&id).await;
                self.check(result)?
            }
            None => {
                let title = title.unwrap_or_else(|| auto_title(question));
                let result = self.client.create_session(Some(&title)).await;
                let session = self.check(result)?;
                println!("Session: {}", session.id);
                session
            }
        };
        store.load(session);

        let mut socket = if follow_status {
            self.open_socket(&store).await
        } else {
            None
        };

        self.converse(&mut store, &mut socket, question).await
    }

    async fn chat(&mut self, session: Option<String>, follow_status: bool) -> Result<()> {
        let mut store = ConversationStore::new(self.settings.status_clear_delay());
        let session = match session {
            Some(id) => {
                let result = self.client.get_session(&id).await;
                self.check(result)?
            }
            None => {
                let result = self.client.create_session(None).await;
                self.check(result)?
            }
        };
        store.load(session);

        println!(
            "{} ({})",
            store.title().unwrap_or("New conversation"),
            store.session_id().unwrap_or_default()
        );
        println!("Commands: /history, /clear, /quit");
        println!();
        for message in store.messages() {
            println!("{}", render_message(message));
        }

        let mut socket = if follow_status {
            self.open_socket(&store).await
        } else {
            None
        };

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = prompt_line(&mut lines, &mut store).await? else {
                break;
            };
            let line = line.trim();

            match line {
                "" => continue,
                "/quit" | "/exit" => break,
                "/history" => {
                    for message in store.messages() {
                        println!("{}", render_message(message));
                    }
                }
                "/clear" => {
                    let session_id = store.session_id().unwrap_or_default().to_string();
                    let result = self.client.clear_session(&session_id).await;
                    self.check(result)?;
                    store.clear();
                    println!("Conversation cleared.");
                }
                question => {
                    if let Err(e) = self.converse(&mut store, &mut socket, question).await {
                        eprintln!("Error: {e:#}");
                        if self.auth.token.is_none() {
                            break;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    async fn open_socket(&self, store: &ConversationStore) -> Option<PipelineSocket> {
        let session_id = store.session_id()?;
        let url = self.settings.socket_url();
        match pipeline::connect(&url, session_id).await {
            Ok(socket) => Some(socket),
            Err(e) => {
                warn!(error = %e, %url, "pipeline status unavailable");
                None
            }
        }
    }

    /// Send one question and narrate pipeline status until the answer arrives.
    ///
    /// Events left over from an earlier question are discarded first. When
    /// the reply beats `ai_done`, the socket is followed for up to
    /// [`AI_DONE_GRACE`] so the cycle ends with streaming off.
    async fn converse(
        &mut self,
        store: &mut ConversationStore,
        socket: &mut Option<PipelineSocket>,
        question: &str,
    ) -> Result<()> {
        let session_id = store
            .session_id()
            .context("No active session")?
            .to_string();

        if let Some(live) = socket.as_mut() {
            let stale = live.drain();
            if stale > 0 {
                debug!(stale, "discarding pipeline events from a previous question");
            }
        }
        store.begin_question(question);

        let result = {
            let request = self.client.send_message(&session_id, question);
            tokio::pin!(request);

            loop {
                let next_clear = store.narrator().next_clear();
                tokio::select! {
                    result = &mut request => break result,
                    event = next_event(socket) => narrate(store, socket, event),
                    () = wait_until(next_clear) => {
                        store.tick(Instant::now());
                    }
                }
            }
        };

        if result.is_ok() && store.narrator().is_streaming() {
            let grace = Instant::now() + AI_DONE_GRACE;
            while store.narrator().is_streaming() && socket.is_some() {
                let next_clear = store.narrator().next_clear();
                tokio::select! {
                    event = next_event(socket) => narrate(store, socket, event),
                    () = wait_until(next_clear) => {
                        store.tick(Instant::now());
                    }
                    () = tokio::time::sleep_until(grace) => {
                        debug!("no ai_done before the grace period ended");
                        break;
                    }
                }
            }
        }

        for logged in store.narrator().events() {
            debug!(event = %logged.kind, at = %logged.received_at, payload = %logged.payload, "pipeline log");
        }

        let reply = self.check(result)?;
        let message = store.complete_question(reply.into_message());
        println!();
        println!("{}", render_message(message));
        Ok(())
    }

    // === Sessions ===

    async fn sessions(&mut self, action: SessionAction) -> Result<()> {
        match action {
            SessionAction::List => {
                let result = self.client.list_sessions().await;
                let mut sessions = self.check(result)?;
                if sessions.is_empty() {
                    println!("No sessions found.");
                    return Ok(());
                }
                sessions.sort_by_key(|s| std::cmp::Reverse(s.last_activity()));

                println!(
                    "{:<38} {:<30} {:<8} {}",
                    "ID", "TITLE", "MSGS", "LAST ACTIVITY"
                );
                println!("{}", "-".repeat(95));
                for session in &sessions {
                    println!("{}", render_session_row(session));
                }
            }
            SessionAction::New { title } => {
                let title = title.join(" ");
                let title = (!title.trim().is_empty()).then_some(title);
                let result = self.client.create_session(title.as_deref()).await;
                let session = self.check(result)?;
                println!("Created session {}", session.id);
            }
            SessionAction::Show { id } => {
                let result = self.client.get_session(&id).await;
                let session = self.check(result)?;

                let mut store = ConversationStore::new(self.settings.status_clear_delay());
                store.load(session);

                println!("{}", store.title().unwrap_or("(untitled)"));
                println!();
                if store.messages().is_empty() {
                    println!("No messages yet.");
                }
                for message in store.messages() {
                    println!("{}", render_message(message));
                }
            }
            SessionAction::Delete { id } => {
                let result = self.client.delete_session(&id).await;
                self.check(result)?;
                println!("Deleted session {id}");
            }
            SessionAction::Clear { id } => {
                let result = self.client.clear_session(&id).await;
                self.check(result)?;
                println!("Cleared session {id}");
            }
        }
        Ok(())
    }

    // === Ingestion ===

    async fn ingest(&mut self, source: IngestSource) -> Result<()> {
        match source {
            IngestSource::File { paths } => {
                let outcome = self.upload_files(paths.as_slice()).await?;
                println!();
                println!(
                    "Uploaded {} of {} file(s), {} failed.",
                    outcome.succeeded,
                    outcome.total(),
                    outcome.failed()
                );
                for (item, error) in &outcome.failures {
                    println!("  {item}: {error}");
                }
                if outcome.succeeded == 0 {
                    bail!("No files were uploaded");
                }
            }
            IngestSource::Url { url } => {
                let result = self.client.ingest_url(&url).await;
                let result = self.check(result)?;
                print_ingest_result(&url, &result);
            }
            IngestSource::Text {
                title,
                source,
                file,
                content,
            } => {
                let content = match file {
                    Some(path) => tokio::fs::read_to_string(&path)
                        .await
                        .with_context(|| format!("Failed to read {}", path.display()))?,
                    None => content.join(" "),
                };
                if content.trim().is_empty() {
                    bail!("Text content is required");
                }
                let result = self
                    .client
                    .ingest_text(&title, &content, source.as_deref())
                    .await;
                let result = self.check(result)?;
                print_ingest_result(&title, &result);
            }
        }
        Ok(())
    }

    /// Upload files one at a time. A failure never stops the loop, except
    /// rejected credentials, which would fail every remaining file too.
    async fn upload_files(&mut self, paths: &[impl AsRef<Path>]) -> Result<BatchOutcome> {
        let mut outcome = BatchOutcome::default();
        for path in paths {
            let path = path.as_ref();
            let label = path.display().to_string();
            match self.client.upload_file(path).await {
                Ok(result) => {
                    print_ingest_result(&label, &result);
                    outcome.record_success();
                }
                Err(e) if e.is_unauthorized() => {
                    return self.check(Err(e));
                }
                Err(e) => {
                    eprintln!("x {label}: {e}");
                    outcome.record_failure(label, e);
                }
            }
        }
        Ok(outcome)
    }

    async fn rss(&mut self, action: RssAction) -> Result<()> {
        match action {
            RssAction::Preview { feed_url, limit } => {
                let result = self.client.rss_preview(&feed_url, limit).await;
                let items = self.check(result)?;
                if items.is_empty() {
                    println!("Feed has no entries.");
                    return Ok(());
                }
                for (i, item) in items.iter().enumerate() {
                    println!("{:>3}. {}", i + 1, item.title);
                    println!("     {}", item.link);
                    if let Some(ref published) = item.published {
                        println!("     {published}");
                    }
                    if let Some(ref summary) = item.summary {
                        println!("     {}", truncate(summary.trim(), 120));
                    }
                }
            }
            RssAction::Ingest { feed_url, limit } => {
                let result = self.client.rss_ingest(&feed_url, limit).await;
                let result = self.check(result)?;
                println!(
                    "Ingested {}, skipped {}, failed {}.",
                    result.ingested, result.skipped, result.failed
                );
                for doc in &result.documents {
                    println!("  {} {}", doc.id, doc.title);
                }
            }
        }
        Ok(())
    }

    // === Documents ===

    async fn docs(&mut self, action: DocsAction) -> Result<()> {
        match action {
            DocsAction::List {
                search,
                source,
                limit,
                offset,
            } => {
                let query = DocumentQuery {
                    search,
                    source,
                    limit: Some(limit),
                    offset: Some(offset),
                };
                let result = self.client.list_documents(&query).await;
                let page = self.check(result)?;
                if page.documents.is_empty() {
                    println!("No documents found.");
                    return Ok(());
                }

                println!(
                    "{:<38} {:<40} {:<16} {:<6}",
                    "ID", "TITLE", "SOURCE", "CHUNKS"
                );
                println!("{}", "-".repeat(103));
                for doc in &page.documents {
                    println!(
                        "{:<38} {:<40} {:<16} {:<6}",
                        doc.id,
                        truncate(&doc.title, 38),
                        truncate(&doc.source, 14),
                        doc.chunk_count,
                    );
                }
                println!();
                println!(
                    "Showing {}-{} of {}",
                    offset + 1,
                    offset + page.documents.len(),
                    page.total
                );
            }
            DocsAction::Delete { id } => {
                let result = self.client.delete_document(&id).await;
                self.check(result)?;
                println!("Deleted document {id}");
            }
        }
        Ok(())
    }

    // === System ===

    async fn stats(&mut self) -> Result<()> {
        let result = self.client.stats().await;
        let stats = self.check(result)?;
        println!("Documents: {}", stats.total_documents);
        println!("Chunks:    {}", stats.total_chunks);
        println!("Sessions:  {}", stats.total_sessions);
        println!("Messages:  {}", stats.total_messages);
        if !stats.documents_by_source.is_empty() {
            println!();
            println!("By source:");
            for (source, count) in &stats.documents_by_source {
                println!("  {source:<24} {count}");
            }
        }
        Ok(())
    }

    async fn health(&mut self) -> Result<()> {
        let result = self.client.health().await;
        let health = self.check(result)?;
        println!("Backend: {} ({})", self.client.base_url(), health.status);
        if let Some(ref version) = health.version {
            println!("Version: {version}");
        }
        for (component, status) in &health.components {
            println!("  {component:<20} {status}");
        }

        let result = self.client.server_config().await;
        match self.check(result) {
            Ok(config) => {
                println!();
                println!(
                    "Embedding model: {}",
                    config.embedding_model.as_deref().unwrap_or("-")
                );
                println!("LLM model:       {}", config.llm_model.as_deref().unwrap_or("-"));
                if let Some(top_k) = config.top_k {
                    println!("Top k:           {top_k}");
                }
                if let Some(chunk_size) = config.chunk_size {
                    println!("Chunk size:      {chunk_size}");
                }
            }
            Err(e) => warn!(error = %e, "could not read server config"),
        }

        if !health.is_healthy() {
            bail!("Backend reports status '{}'", health.status);
        }
        Ok(())
    }
}

/// Apply one socket result to the store, printing any new status line.
fn narrate(
    store: &mut ConversationStore,
    socket: &mut Option<PipelineSocket>,
    event: Option<PipelineEvent>,
) {
    match event {
        Some(event) => {
            if let Some(line) = store.apply_event(event, Instant::now()) {
                eprintln!("  .. {line}");
            }
        }
        None => {
            debug!("pipeline socket closed");
            *socket = None;
        }
    }
}

/// Read the next prompt line, firing status clears that fall due meanwhile.
async fn prompt_line<R>(
    lines: &mut Lines<R>,
    store: &mut ConversationStore,
) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let next_clear = store.narrator().next_clear();
        tokio::select! {
            line = lines.next_line() => return line,
            () = wait_until(next_clear) => {
                store.tick(Instant::now());
            }
        }
    }
}

/// Next event from the socket; pends forever when there is none.
async fn next_event(socket: &mut Option<PipelineSocket>) -> Option<PipelineEvent> {
    match socket {
        Some(socket) => socket.recv().await,
        None => std::future::pending().await,
    }
}

/// Sleep until `deadline`; pends forever when there is none.
async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Session title derived from the first question.
fn auto_title(question: &str) -> String {
    truncate(question.trim(), AUTO_TITLE_LEN)
}

fn print_ingest_result(label: &str, result: &IngestResult) {
    let title = result.title.as_deref().unwrap_or(label);
    match result.document_id {
        Some(ref id) => println!("+ {title} ({id}, {} chunks)", result.chunks_created),
        None => println!("+ {title} ({} chunks)", result.chunks_created),
    }
    if let Some(ref message) = result.message {
        println!("  {message}");
    }
}

async fn read_password() -> Result<String> {
    eprint!("Password: ");
    std::io::stderr().flush()?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let line = lines
        .next_line()
        .await?
        .context("No password given on stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
