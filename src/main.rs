//! `pethaven`: command-line client for the Pet Haven communities API.
//!
//! Every subcommand goes through the same store and view controllers a UI
//! would use, so membership preconditions, validation and error codes match.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use pethaven::config::{ClientConfig, ConfigError, normalize_base_url};
use pethaven::error::ErrorCode;
use pethaven::net::api::{ApiError, Session};
use pethaven::net::http::HttpCommunityApi;
use pethaven::net::types::{Category, ImagePreview, Rule};
use pethaven::state::community::CommunityStore;
use pethaven::state::error::StoreError;
use pethaven::views::create::CreateForm;
use pethaven::views::detail::{DetailView, member_actions};
use pethaven::views::list::ListView;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("cannot read {path}: {source}")]
    ReadImage { path: String, source: std::io::Error },
    #[error("output encoding failed: {0}")]
    Output(#[from] serde_json::Error),
}

impl ErrorCode for CliError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "E_CONFIG",
            Self::Api(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
            Self::ReadImage { .. } => "E_IO",
            Self::Output(_) => "E_OUTPUT",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Api(e) => e.retryable(),
            Self::Store(e) => e.retryable(),
            _ => false,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "pethaven", about = "Pet Haven communities CLI")]
struct Cli {
    /// Overrides `PETHAVEN_API_BASE_URL`.
    #[arg(long)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List communities, optionally filtered by text.
    List {
        #[arg(long)]
        query: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Show a community with its posts and chat.
    Show { id: String },
    Create(CreateArgs),
    Update(UpdateArgs),
    Delete { id: String },
    Join { id: String },
    Leave { id: String },
    /// Post a chat message.
    Say { id: String, message: String },
}

#[derive(Args, Debug)]
struct CreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    description: String,
    #[arg(long)]
    category: Category,
    #[arg(long, default_value_t = false)]
    private: bool,
    /// Repeatable, as `title=description`.
    #[arg(long = "rule", value_parser = parse_rule)]
    rules: Vec<Rule>,
    #[arg(long = "tag")]
    tags: Vec<String>,
    #[arg(long)]
    avatar: Option<PathBuf>,
    #[arg(long)]
    cover_image: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct UpdateArgs {
    id: String,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    category: Option<Category>,
    #[arg(long)]
    private: Option<bool>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    if let Err(err) = dotenv {
        if err.not_found() {
            debug!("no .env file");
        } else {
            warn!(%err, ".env load failed");
        }
    }

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error [{}]: {err}", err.error_code());
            if err.retryable() {
                eprintln!("the request may succeed if retried");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = cli.base_url {
        config.api_base_url = normalize_base_url(&base_url);
    }
    let api = HttpCommunityApi::from_config(&config, Session::new())?;
    let store = CommunityStore::new(Arc::new(api), config.user.clone());

    match cli.command {
        Command::List { query, page } => {
            let (communities, pagination) = store.list_communities_page(page).await?;
            let mut view = ListView::new(config.page_size);
            view.set_query(query.unwrap_or_default());
            let matches = view.filtered(&communities);
            print_json(&json!({ "pagination": pagination, "communities": matches.as_slice() }))
        }
        Command::Show { id } => {
            let (community, posts, chat) = tokio::join!(
                store.get_community(&id),
                store.get_community_posts(&id),
                store.get_community_chat(&id)
            );
            let community = community?;
            let actions = member_actions(store.current_user(), &community);
            print_json(&json!({
                "community": community,
                "actions": actions,
                "posts": posts?,
                "chat": chat?,
            }))
        }
        Command::Create(args) => {
            let form = build_form(args).await?;
            match form.submit(&store).await {
                Ok(created) => {
                    debug!(navigation = ?created.navigation, "create finished");
                    print_json(&created.community)
                }
                Err(failure) => Err(failure.error.into()),
            }
        }
        Command::Update(args) => run_update(&store, args).await,
        Command::Delete { id } => {
            let community = store.get_community(&id).await?;
            let mut view = DetailView::new();
            view.open_delete(Some(&community));
            if let Some(result) = view.confirm_delete(&store).await {
                let navigation = result?;
                info!(?navigation, community_id = %id, "deleted");
            }
            print_json(&json!({ "deleted": id }))
        }
        Command::Join { id } => {
            store.get_community(&id).await?;
            print_json(&store.join_community(&id).await?)
        }
        Command::Leave { id } => {
            store.get_community(&id).await?;
            print_json(&store.leave_community(&id).await?)
        }
        Command::Say { id, message } => {
            store.get_community(&id).await?;
            let mut view = DetailView::new();
            view.sync_active(store.snapshot().active.as_ref());
            view.set_message_input(message);
            match view.submit_message(&store).await? {
                Some(sent) => print_json(&sent),
                None => Err(StoreError::EmptyMessage.into()),
            }
        }
    }
}

async fn run_update(store: &CommunityStore, args: UpdateArgs) -> Result<(), CliError> {
    let community = store.get_community(&args.id).await?;
    let mut view = DetailView::new();
    view.sync_active(Some(&community));
    view.open_edit(Some(&community));
    if let Some(draft) = view.edit_draft_mut() {
        if let Some(name) = args.name {
            draft.name = name;
        }
        if let Some(description) = args.description {
            draft.description = description;
        }
        if let Some(category) = args.category {
            draft.category = category;
        }
        if let Some(private) = args.private {
            draft.is_private = private;
        }
    }
    match view.submit_edit(store).await {
        Some(result) => print_json(&result?),
        None => Ok(()),
    }
}

async fn build_form(args: CreateArgs) -> Result<CreateForm, CliError> {
    let mut form = CreateForm::new();
    form.set_name(args.name);
    form.set_description(args.description);
    form.set_category(args.category);
    form.set_private(args.private);
    for (index, rule) in args.rules.into_iter().enumerate() {
        if index > 0 {
            form.add_rule();
        }
        form.update_rule(index, rule)?;
    }
    for tag in &args.tags {
        if !form.add_tag(tag)? {
            debug!(%tag, "duplicate tag skipped");
        }
    }
    if let Some(path) = &args.avatar {
        form.set_avatar(read_image(path).await?)?;
    }
    if let Some(path) = &args.cover_image {
        form.set_cover_image(read_image(path).await?)?;
    }
    Ok(form)
}

fn parse_rule(raw: &str) -> Result<Rule, String> {
    let (title, description) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected title=description, got `{raw}`"))?;
    if title.trim().is_empty() {
        return Err("rule title is empty".into());
    }
    Ok(Rule { title: title.trim().to_string(), description: description.trim().to_string() })
}

async fn read_image(path: &Path) -> Result<ImagePreview, CliError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| CliError::ReadImage { path: path.display().to_string(), source })?;
    let file_name = path
        .file_name()
        .map_or_else(|| "image".to_string(), |n| n.to_string_lossy().into_owned());
    Ok(ImagePreview::new(file_name, content_type_for(path), bytes))
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
