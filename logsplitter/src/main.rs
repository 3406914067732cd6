//! logsplitter - command-line client for the LogSplitter log analysis service
//!
//! Uploads log files and browses, searches and analyzes them, and manages API
//! keys, webhooks and billing for the signed-in account.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Config: $XDG_CONFIG_HOME/logsplitter/config.toml (~/.config/logsplitter/config.toml)
//! - Logs: $XDG_STATE_HOME/logsplitter/logsplitter.log (~/.local/state/logsplitter/logsplitter.log)

mod render;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use logsplitter_core::auth::{AuthPhase, PermissionsStatus};
use logsplitter_core::identity::StaticIdentity;
use logsplitter_core::store::{analytics, search, uploads, webhooks};
use logsplitter_core::types::{
    limits, CreateWebhookRequest, LogLevel, SearchFilters, SettingsUpdate, UpdateWebhookRequest, WebhookEvent,
};
use logsplitter_core::{Config, LogSplitter, Outcome};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "logsplitter")]
#[command(about = "Upload, browse and search logs on LogSplitter")]
#[command(version)]
struct Args {
    /// Verbose output (debug-level log file)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show configuration and session state
    Status,

    /// Show the plan's features and usage limits
    Permissions,

    /// Upload a .log or .txt file
    Upload {
        file: PathBuf,
    },

    /// Browse uploaded files
    #[command(subcommand)]
    Uploads(UploadsCommand),

    /// Search log groups across all uploads
    Search {
        /// Text to search for
        query: Option<String>,

        #[arg(short, long)]
        level: Option<LogLevel>,

        /// Start date (ISO 8601)
        #[arg(long)]
        from: Option<String>,

        /// End date (ISO 8601)
        #[arg(long)]
        to: Option<String>,

        #[arg(long, default_value_t = search::DEFAULT_SEARCH_LIMIT)]
        limit: u32,

        /// Keep loading pages until there are no more
        #[arg(long)]
        all: bool,
    },

    /// Show popular messages worth searching for
    Suggestions {
        #[arg(long, default_value_t = search::DEFAULT_SUGGESTIONS_LIMIT)]
        limit: u32,
    },

    /// Show analytics across all uploads
    Analytics,

    /// Manage API keys
    #[command(subcommand)]
    Keys(KeysCommand),

    /// Manage webhooks
    #[command(subcommand)]
    Webhooks(WebhooksCommand),

    /// List available plans
    Plans,

    /// Start a checkout for a plan and print the URL to continue at
    Checkout {
        /// Plan slug (see 'plans')
        plan: String,
    },

    /// Print the billing portal URL
    Portal,

    /// Show the account profile
    Profile,

    /// Show or change preferences
    Settings {
        #[arg(long)]
        email_notifications: Option<bool>,

        #[arg(long)]
        dark_mode: Option<bool>,

        #[arg(long)]
        timezone: Option<String>,
    },

    /// Show the dashboard summary
    Dashboard,
}

#[derive(Subcommand)]
enum UploadsCommand {
    /// List uploads, newest first
    List {
        #[arg(long, default_value_t = uploads::DEFAULT_LIST_LIMIT)]
        limit: u32,

        #[arg(long, default_value_t = 0)]
        offset: u32,

        /// Keep loading pages until there are no more
        #[arg(long)]
        all: bool,
    },

    /// Show an upload's log groups
    Show {
        id: String,

        #[arg(short, long)]
        level: Option<LogLevel>,

        #[arg(long, default_value_t = uploads::DEFAULT_GROUPS_LIMIT)]
        limit: u32,

        #[arg(long)]
        all: bool,
    },

    /// Search within one upload
    Search {
        id: String,

        #[arg(short, long)]
        query: Option<String>,

        #[arg(short, long)]
        level: Option<LogLevel>,

        #[arg(long, default_value_t = uploads::DEFAULT_GROUPS_LIMIT)]
        limit: u32,

        #[arg(long)]
        all: bool,
    },

    /// Delete an upload and its groups
    Delete {
        id: String,
    },
}

#[derive(Subcommand)]
enum KeysCommand {
    /// List active API keys
    List,

    /// Create a key; the secret is printed once
    Create {
        name: String,
    },

    /// Revoke a key
    Revoke {
        id: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Switch {
    On,
    Off,
}

#[derive(Subcommand)]
enum WebhooksCommand {
    /// List webhooks with delivery stats
    List,

    /// Show a webhook and its latest deliveries
    Show {
        id: String,
    },

    /// Create a webhook; the signing secret is printed once
    Create {
        /// HTTPS endpoint to deliver to
        #[arg(long)]
        url: String,

        /// Event to subscribe to (repeatable)
        #[arg(long = "event")]
        events: Vec<WebhookEvent>,

        #[arg(long)]
        description: Option<String>,

        /// Errors per upload that count as a spike (with error.spike)
        #[arg(long)]
        threshold: Option<u32>,

        /// Create the webhook disabled
        #[arg(long)]
        inactive: bool,
    },

    /// Change a webhook
    Update {
        id: String,

        #[arg(long)]
        url: Option<String>,

        /// Replace subscribed events (repeatable)
        #[arg(long = "event")]
        events: Vec<WebhookEvent>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        threshold: Option<u32>,
    },

    /// Enable or disable delivery
    Toggle {
        id: String,

        #[arg(value_enum)]
        state: Switch,
    },

    /// Delete a webhook
    Delete {
        id: String,
    },

    /// Send a test event
    Test {
        id: String,
    },

    /// Replace the signing secret; the new secret is printed once
    RegenerateSecret {
        id: String,
    },

    /// Show a webhook's delivery log
    Deliveries {
        id: String,

        #[arg(long, default_value_t = webhooks::DEFAULT_DELIVERIES_LIMIT)]
        limit: u32,

        #[arg(long, default_value_t = 0)]
        offset: u32,

        #[arg(long)]
        all: bool,
    },
}

/// Connected client plus output preferences
struct Session {
    client: LogSplitter,
    json: bool,
}

impl Session {
    /// Print `value` as JSON when `--json` was given
    fn json<T: Serialize>(&self, value: &T) -> Result<bool> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value).context("failed to encode JSON")?);
        }
        Ok(self.json)
    }
}

/// Turn a failed outcome into an error for the exit status
fn check<T>(outcome: Outcome<T>) -> Result<Option<T>> {
    outcome.into_result().map_err(anyhow::Error::msg)
}

/// Like [`check`], for actions that must return data
fn require<T>(outcome: Outcome<T>) -> Result<T> {
    check(outcome)?.context("server returned no data")
}

/// Drain `load_more` until it reports nothing more to fetch
async fn load_all<F, Fut>(mut load_more: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Option<Outcome>>,
{
    while let Some(outcome) = load_more().await {
        check(outcome)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Ensure XDG environment variables are set before any thread starts
    Config::ensure_xdg_env();

    let mut config = Config::load().context("failed to load configuration")?;
    if args.verbose {
        config.logging.level = "debug".to_string();
    }

    let _log_guard =
        logsplitter_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!(api = %config.api.base_url, "logsplitter starting");

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(run(args, config))
}

async fn run(args: Args, config: Config) -> Result<()> {
    let identity = Arc::new(StaticIdentity::from_config(&config.identity));
    let client = LogSplitter::connect(&config, identity)
        .await
        .context("failed to create API client")?;

    // Every store scope is a child of the client's, so this cancels them all
    let handle = client.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nCancelling...");
        handle.close();
    })
    .context("failed to set Ctrl+C handler")?;

    let session = Session {
        client,
        json: args.json,
    };

    match args.command {
        Command::Status => cmd_status(&session, &config),
        Command::Permissions => cmd_permissions(&session),
        Command::Upload { file } => cmd_upload(&session, &file).await,
        Command::Uploads(cmd) => cmd_uploads(&session, cmd).await,
        Command::Search {
            query,
            level,
            from,
            to,
            limit,
            all,
        } => {
            let filters = SearchFilters {
                query: query.unwrap_or_default(),
                level,
                start_date: from,
                end_date: to,
            };
            cmd_search(&session, filters, limit, all).await
        }
        Command::Suggestions { limit } => cmd_suggestions(&session, limit).await,
        Command::Analytics => cmd_analytics(&session).await,
        Command::Keys(cmd) => cmd_keys(&session, cmd).await,
        Command::Webhooks(cmd) => cmd_webhooks(&session, cmd).await,
        Command::Plans => cmd_plans(&session).await,
        Command::Checkout { plan } => {
            let url = require(session.client.billing().create_checkout_session(&plan).await)?;
            println!("Continue at: {}", url);
            Ok(())
        }
        Command::Portal => {
            let url = require(session.client.billing().open_customer_portal().await)?;
            println!("Manage billing at: {}", url);
            Ok(())
        }
        Command::Profile => cmd_profile(&session).await,
        Command::Settings {
            email_notifications,
            dark_mode,
            timezone,
        } => {
            let update = SettingsUpdate {
                email_notifications,
                dark_mode,
                timezone,
            };
            cmd_settings(&session, update).await
        }
        Command::Dashboard => cmd_dashboard(&session).await,
    }
}

fn cmd_status(session: &Session, config: &Config) -> Result<()> {
    render::heading("LogSplitter");
    println!("API URL:      {}", config.api.base_url);
    println!(
        "Timeout:      {}",
        config
            .api
            .timeout_secs
            .map(|s| format!("{}s", s))
            .unwrap_or_else(|| "none".to_string())
    );
    println!(
        "Token:        {}",
        if config.identity.token.is_some() {
            "<set>"
        } else {
            "<not set>"
        }
    );
    println!("Config file:  {}", Config::config_path().display());
    println!("Log file:     {}", logsplitter_core::logging::log_file_path().display());
    println!();

    let auth = session.client.auth();
    match auth.phase() {
        AuthPhase::Uninitialized => println!("Session:      not loaded"),
        AuthPhase::SignedOut => {
            println!("Session:      signed out");
            println!();
            println!("Set a token to sign in, either in config.toml:");
            println!();
            println!("  [identity]");
            println!("  token = \"<session token>\"");
            println!();
            println!("or with LOGSPLITTER_TOKEN.");
        }
        AuthPhase::SignedIn(status) => {
            let user = auth.session();
            println!(
                "Session:      signed in as {}",
                user.email.or(user.user_id).unwrap_or_else(|| "<unknown>".to_string())
            );
            match status {
                PermissionsStatus::Loading => println!("Permissions:  loading"),
                PermissionsStatus::Ready => {
                    let plan = auth.permissions().and_then(|p| p.plan);
                    println!("Permissions:  ready (plan: {})", plan.as_deref().unwrap_or("unknown"));
                }
                PermissionsStatus::Unavailable => println!(
                    "Permissions:  unavailable ({})",
                    auth.last_error().as_deref().unwrap_or("unknown error")
                ),
            }
        }
    }
    Ok(())
}

fn cmd_permissions(session: &Session) -> Result<()> {
    let auth = session.client.auth();
    match auth.phase() {
        AuthPhase::SignedIn(PermissionsStatus::Ready) => {}
        AuthPhase::SignedIn(_) => anyhow::bail!(
            "Permissions unavailable: {}",
            auth.last_error().as_deref().unwrap_or("unknown error")
        ),
        _ => anyhow::bail!("Not signed in. Set LOGSPLITTER_TOKEN or [identity] token in config.toml"),
    }
    let permissions = auth.permissions().context("permissions not loaded")?;
    if session.json(&permissions)? {
        return Ok(());
    }

    render::heading("Permissions");
    println!("Plan: {}", permissions.plan.as_deref().unwrap_or("unknown"));
    println!();
    println!("Features:");
    let mut features: Vec<_> = permissions.features.iter().collect();
    features.sort();
    for (slug, enabled) in features {
        println!("  {:<24} {}", slug, if *enabled { "yes" } else { "no" });
    }
    println!();
    println!("Limits:");
    let mut slugs: Vec<_> = permissions.limits.keys().collect();
    slugs.sort();
    for slug in slugs {
        let check = auth.check_limit(slug);
        let max = if check.max < 0 {
            "unlimited".to_string()
        } else {
            check.max.to_string()
        };
        println!(
            "  {:<24} {} used of {}, {} remaining",
            slug, check.used, max, check.remaining
        );
    }

    let uploads = auth.check_limit(limits::MONTHLY_UPLOADS);
    if !uploads.allowed {
        println!();
        println!("Monthly upload limit reached. Run 'logsplitter plans' to upgrade.");
    }
    Ok(())
}

async fn cmd_upload(session: &Session, file: &Path) -> Result<()> {
    let store = session.client.upload(None);
    let size = std::fs::metadata(file).ok().map(|m| m.len());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(format!("Uploading {}", file.display()));
    pb.enable_steady_tick(Duration::from_millis(100));

    let outcome = store.upload_path(file).await;
    pb.finish_and_clear();

    let result = require(outcome)?;
    if session.json(&result)? {
        return Ok(());
    }
    render::upload_result(&result, size);
    Ok(())
}

async fn cmd_uploads(session: &Session, cmd: UploadsCommand) -> Result<()> {
    let store = session.client.uploads();
    match cmd {
        UploadsCommand::List { limit, offset, all } => {
            check(store.fetch_uploads(limit, offset).await)?;
            if all {
                load_all(|| store.load_more()).await?;
            }
            let state = store.state();
            if session.json(&state.uploads.items)? {
                return Ok(());
            }
            render::uploads(&state.uploads.items);
            render::showing(state.uploads.items.len(), state.uploads.pagination);
        }
        UploadsCommand::Show { id, level, limit, all } => {
            check(store.fetch_upload_detail(&id, level, limit, 0).await)?;
            if all {
                load_all(|| store.load_more_groups()).await?;
            }
            let detail = store.state().detail;
            if session.json(&detail.groups.items)? {
                return Ok(());
            }
            if let Some(upload) = &detail.upload {
                render::upload_header(upload);
            }
            render::groups(&detail.groups.items);
            render::showing(detail.groups.items.len(), detail.groups.pagination);
        }
        UploadsCommand::Search {
            id,
            query,
            level,
            limit,
            all,
        } => {
            check(store.search_upload(&id, query.as_deref(), level, limit, 0).await)?;
            if all {
                load_all(|| store.load_more_groups()).await?;
            }
            let detail = store.state().detail;
            if session.json(&detail.groups.items)? {
                return Ok(());
            }
            render::groups(&detail.groups.items);
            render::showing(detail.groups.items.len(), detail.groups.pagination);
        }
        UploadsCommand::Delete { id } => {
            check(store.delete_upload(&id).await)?;
            println!("Deleted upload {}", id);
        }
    }
    Ok(())
}

async fn cmd_search(session: &Session, filters: SearchFilters, limit: u32, all: bool) -> Result<()> {
    if filters.is_unscoped() {
        println!("Enter a query, --level or --from to search.");
        return Ok(());
    }

    let store = session.client.search();
    check(store.search(filters, 0, limit).await)?;
    if all {
        load_all(|| store.load_more()).await?;
    }

    let results = store.state().results;
    if session.json(&results.items)? {
        return Ok(());
    }
    render::search_results(&results.items);
    render::showing(results.items.len(), results.pagination);
    Ok(())
}

async fn cmd_suggestions(session: &Session, limit: u32) -> Result<()> {
    let store = session.client.search();
    check(store.fetch_suggestions(limit).await)?;
    let suggestions = store.state().suggestions;
    if session.json(&suggestions)? {
        return Ok(());
    }
    render::suggestions(&suggestions);
    Ok(())
}

async fn cmd_analytics(session: &Session) -> Result<()> {
    let store = session.client.analytics();
    let outcome = store.fetch_all().await;
    if outcome.is_cancelled() {
        return check(outcome).map(|_| ());
    }

    let state = store.state();
    if session.json(&state.stats.data)? {
        return Ok(());
    }
    render::analytics(&state, store.has_advanced_analytics(), analytics::UPGRADE_MESSAGE);
    check(outcome)?;
    Ok(())
}

async fn cmd_keys(session: &Session, cmd: KeysCommand) -> Result<()> {
    let store = session.client.api_keys();
    match cmd {
        KeysCommand::List => {
            check(store.fetch_keys().await)?;
            let keys = store.state().keys;
            if session.json(&keys)? {
                return Ok(());
            }
            render::api_keys(&keys);
        }
        KeysCommand::Create { name } => {
            let created = require(store.create_key(&name).await)?;
            if session.json(&created)? {
                return Ok(());
            }
            println!("Created API key {} ({})", created.key.name, created.key.prefix);
            println!();
            println!("Secret (shown once, store it now):");
            println!("  {}", created.secret);
        }
        KeysCommand::Revoke { id } => {
            check(store.revoke_key(&id).await)?;
            println!("Revoked API key {}", id);
        }
    }
    Ok(())
}

async fn cmd_webhooks(session: &Session, cmd: WebhooksCommand) -> Result<()> {
    let store = session.client.webhooks();
    match cmd {
        WebhooksCommand::List => {
            check(store.fetch_webhooks().await)?;
            let state = store.state();
            if session.json(&state.webhooks)? {
                return Ok(());
            }
            render::webhooks(&state.webhooks);
        }
        WebhooksCommand::Show { id } => {
            check(store.fetch_webhook_detail(&id).await)?;
            check(store.fetch_deliveries(&id, webhooks::DEFAULT_DELIVERIES_LIMIT, 0).await)?;
            let detail = store.state().detail;
            if session.json(&detail.webhook)? {
                return Ok(());
            }
            if let Some(webhook) = &detail.webhook {
                render::webhook(webhook, detail.stats.as_ref());
            }
            println!();
            render::deliveries(&detail.deliveries.items);
            render::showing(detail.deliveries.items.len(), detail.deliveries.pagination);
        }
        WebhooksCommand::Create {
            url,
            events,
            description,
            threshold,
            inactive,
        } => {
            let request = CreateWebhookRequest {
                url,
                events,
                description,
                is_active: !inactive,
                error_spike_threshold: threshold,
            };
            let created = require(store.create_webhook(request).await)?;
            if session.json(&created)? {
                return Ok(());
            }
            render::webhook(&created.webhook, None);
            println!();
            println!("Signing secret (shown once, store it now):");
            println!("  {}", created.secret);
        }
        WebhooksCommand::Update {
            id,
            url,
            events,
            description,
            threshold,
        } => {
            let update = UpdateWebhookRequest {
                url,
                events: (!events.is_empty()).then_some(events),
                description,
                is_active: None,
                error_spike_threshold: threshold,
            };
            check(store.update_webhook(&id, update).await)?;
            println!("Updated webhook {}", id);
        }
        WebhooksCommand::Toggle { id, state } => {
            let active = matches!(state, Switch::On);
            check(store.toggle_active(&id, active).await)?;
            println!(
                "Webhook {} {}",
                id,
                if active { "enabled" } else { "disabled" }
            );
        }
        WebhooksCommand::Delete { id } => {
            check(store.delete_webhook(&id).await)?;
            println!("Deleted webhook {}", id);
        }
        WebhooksCommand::Test { id } => {
            let result = require(store.test_webhook(&id).await)?;
            if session.json(&result)? {
                return Ok(());
            }
            println!("Test event sent to webhook {}", id);
            if let Some(status) = result.response_status {
                println!("  Response status: {}", status);
            }
            if let Some(message) = result.message {
                println!("  {}", message);
            }
        }
        WebhooksCommand::RegenerateSecret { id } => {
            let secret = require(store.regenerate_secret(&id).await)?;
            println!("New signing secret (shown once, store it now):");
            println!("  {}", secret);
        }
        WebhooksCommand::Deliveries {
            id,
            limit,
            offset,
            all,
        } => {
            check(store.fetch_deliveries(&id, limit, offset).await)?;
            if all {
                load_all(|| store.load_more_deliveries(&id)).await?;
            }
            let deliveries = store.state().detail.deliveries;
            if session.json(&deliveries.items)? {
                return Ok(());
            }
            render::deliveries(&deliveries.items);
            render::showing(deliveries.items.len(), deliveries.pagination);
        }
    }
    Ok(())
}

async fn cmd_plans(session: &Session) -> Result<()> {
    let store = session.client.billing();
    check(store.fetch_plans().await)?;
    let plans = store.state().plans;
    if session.json(&plans)? {
        return Ok(());
    }
    render::plans(&plans);
    Ok(())
}

async fn cmd_profile(session: &Session) -> Result<()> {
    let store = session.client.profile();
    check(store.fetch_profile().await)?;
    let profile = store.state().profile.context("server returned no profile")?;
    if session.json(&profile)? {
        return Ok(());
    }
    render::profile(&profile);
    Ok(())
}

async fn cmd_settings(session: &Session, update: SettingsUpdate) -> Result<()> {
    if update.is_empty() {
        return cmd_profile(session).await;
    }
    let settings = require(session.client.profile().update_settings(update).await)?;
    if session.json(&settings)? {
        return Ok(());
    }
    println!("Settings saved.");
    println!("Email notifications: {}", settings.email_notifications);
    println!("Dark mode:           {}", settings.dark_mode);
    println!("Timezone:            {}", settings.timezone);
    Ok(())
}

async fn cmd_dashboard(session: &Session) -> Result<()> {
    let store = session.client.dashboard();
    check(store.fetch_dashboard().await)?;
    let data = store.state().data.context("server returned no dashboard data")?;
    if session.json(&data)? {
        return Ok(());
    }
    render::dashboard(&data);
    Ok(())
}
