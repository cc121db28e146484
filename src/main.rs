use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use mstodo::{
    cli,
    config::{self, Settings},
    error,
    graph::GraphConnector,
    identity::PublicClient,
    management::{AuthManager, SessionContext, TokenCacheStore},
    output,
    query::QueryFlags,
    utils, warning,
};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    /// Output in JSON format
    #[clap(long, global = true)]
    json: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Login with Microsoft Graph services
    Login,

    /// Logout from Microsoft Graph services
    Logout,

    /// Show current user information
    User,

    /// Show your todo lists
    #[clap(visible_alias = "list")]
    Lists,

    /// Show tasks in a todo list
    #[clap(visible_alias = "view")]
    Show(ShowOptions),

    /// Add a new task to a specific list
    #[clap(visible_alias = "create")]
    Add(AddOptions),

    /// Complete a task in a specific list
    #[clap(visible_aliases = ["done", "strike"])]
    Complete(TaskOptions),

    /// Delete a task in a specific list
    Delete(TaskOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct ShowOptions {
    /// List position or name
    pub list: String,

    /// Maximum number of tasks to show
    #[clap(long, allow_hyphen_values = true)]
    pub limit: Option<String>,

    /// Number of tasks to skip
    #[clap(long, allow_hyphen_values = true)]
    pub skip: Option<String>,

    /// Raw OData filter expression, e.g. "status eq 'completed'"
    #[clap(long)]
    pub filter: Option<String>,

    /// Search title and description
    #[clap(long)]
    pub search: Option<String>,

    /// OData sort expression, e.g. "createdDateTime desc"
    #[clap(long)]
    pub orderby: Option<String>,

    /// Only show important tasks
    #[clap(long)]
    pub important: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct AddOptions {
    /// List position or name
    pub list: String,

    /// Task title
    #[clap(required = true, num_args = 1..)]
    pub title: Vec<String>,

    /// Mark the task as important
    #[clap(long)]
    pub important: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct TaskOptions {
    /// List position or name
    pub list: String,

    /// Task position or title
    #[clap(required = true, num_args = 1..)]
    pub task: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        warning!("{}", e);
    }

    let cli = Cli::parse();

    if let Command::Completions(opt) = &cli.command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
        return;
    }

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => error!("{}", e),
    };

    let out = output::formatter(cli.json);
    let auth = AuthManager::new(
        TokenCacheStore::new(&settings.app_dir),
        Box::new(PublicClient::new(&settings)),
        settings.scopes.clone(),
    );
    let mut ctx = SessionContext::new(auth, Box::new(GraphConnector::new(&settings.graph_url)));

    let result = match cli.command {
        Command::Login => cli::login(&mut ctx, out.as_ref()).await,
        Command::Logout => cli::logout(&mut ctx).await,
        Command::User => cli::user(&mut ctx, out.as_ref()).await,
        Command::Lists => cli::lists(&mut ctx, out.as_ref()).await,
        Command::Show(opt) => {
            let flags = QueryFlags {
                limit: opt.limit,
                skip: opt.skip,
                filter: opt.filter,
                search: opt.search,
                orderby: opt.orderby,
                important: opt.important,
            };
            cli::show(&mut ctx, out.as_ref(), &opt.list, &flags).await
        }
        Command::Add(opt) => {
            cli::add(&mut ctx, out.as_ref(), &opt.list, &opt.title, opt.important).await
        }
        Command::Complete(opt) => cli::complete(&mut ctx, out.as_ref(), &opt.list, &opt.task).await,
        Command::Delete(opt) => cli::delete(&mut ctx, out.as_ref(), &opt.list, &opt.task).await,
        Command::Completions(_) => Ok(()),
    };

    if let Err(e) = result {
        let log_path = settings.app_dir.join(utils::ERROR_LOG_FILE);
        if let Err(log_err) = utils::append_error_log(&settings.app_dir, &e).await {
            warning!("Cannot write {}: {}", log_path.display(), log_err);
        }
        error!(
            "{}\nFor more details, please check the log file: {}",
            e,
            log_path.display()
        );
    }
}
