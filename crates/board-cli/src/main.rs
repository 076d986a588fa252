mod output;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{bail, Context};
use async_trait::async_trait;
use board_client::{ApiClient, ApiError};
use board_core::config::normalize_api_url;
use board_core::paths::{ensure_dir, session_store_path};
use board_core::{
    ApplicationStatus, Config, EmploymentType, ExperienceLevel, JobDraft, JobFilters,
    ProfileUpdate, Role, Surface,
};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde::de::DeserializeOwned;
use session_manager::{
    CredentialStore, FileKeyValueStore, KeyValueStore, LoginRedirect, SessionManager,
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "job-board")]
#[command(about = "Command line client for the job board")]
#[command(version)]
struct Cli {
    /// Use the admin session instead of the public one
    #[arg(long, global = true)]
    admin: bool,

    /// API root, e.g. http://127.0.0.1:8000/api
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session
    Login {
        username: String,
        #[arg(long, env = "JOB_BOARD_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Create an account
    Register {
        username: String,
        email: String,
        #[arg(long, env = "JOB_BOARD_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        #[arg(long)]
        role: Option<Role>,
    },
    /// Show the logged in user
    Whoami {
        /// Ask the API instead of trusting the stored identity
        #[arg(long)]
        verify: bool,
    },
    /// List jobs
    Jobs {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        location: Option<String>,
        /// entry, mid or senior
        #[arg(long, value_parser = parse_wire::<ExperienceLevel>)]
        level: Option<ExperienceLevel>,
        /// full-time, part-time, contract or remote
        #[arg(long = "type", value_parser = parse_wire::<EmploymentType>)]
        employment_type: Option<EmploymentType>,
    },
    /// List job applications, or review one
    Applications {
        #[command(subcommand)]
        action: Option<ApplicationAction>,
    },
    /// Publish a job posting (admin)
    PostJob(PostJobArgs),
    /// Manage user accounts (admin)
    Users {
        #[command(subcommand)]
        action: Option<UserAction>,
    },
    /// Change your username or email
    Profile {
        #[command(flatten)]
        update: ProfileArgs,
    },
    /// Show dashboard statistics
    Stats,
}

#[derive(Subcommand)]
enum ApplicationAction {
    /// Move an application to pending, reviewed, accepted or rejected (admin)
    SetStatus {
        id: i64,
        #[arg(value_parser = parse_wire::<ApplicationStatus>)]
        status: ApplicationStatus,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// List every account
    List,
    /// Delete an account
    Delete { id: i64 },
    /// Change another account's username or email
    Update {
        id: i64,
        #[command(flatten)]
        update: ProfileArgs,
    },
}

#[derive(Args)]
struct ProfileArgs {
    #[arg(long)]
    username: Option<String>,
    #[arg(long)]
    email: Option<String>,
}

impl ProfileArgs {
    fn into_update(self) -> anyhow::Result<ProfileUpdate> {
        let update = ProfileUpdate {
            username: self.username,
            email: self.email,
        };
        if update.is_empty() {
            bail!("nothing to change, pass --username and/or --email");
        }
        Ok(update)
    }
}

#[derive(Args)]
struct PostJobArgs {
    title: String,
    #[arg(long)]
    company: String,
    #[arg(long)]
    location: String,
    #[arg(long, default_value = "")]
    description: String,
    /// May be repeated, one requirement per flag
    #[arg(long = "requirement")]
    requirements: Vec<String>,
    #[arg(long)]
    salary_min: Option<i64>,
    #[arg(long)]
    salary_max: Option<i64>,
    #[arg(long, default_value = "USD")]
    currency: String,
    /// full-time, part-time, contract or remote
    #[arg(long = "type", value_parser = parse_wire::<EmploymentType>)]
    employment_type: EmploymentType,
    /// entry, mid or senior
    #[arg(long, value_parser = parse_wire::<ExperienceLevel>)]
    level: ExperienceLevel,
    #[arg(long)]
    category_id: i64,
    /// Save the posting without publishing it
    #[arg(long)]
    inactive: bool,
}

impl PostJobArgs {
    fn into_draft(self) -> anyhow::Result<JobDraft> {
        if let (Some(min), Some(max)) = (self.salary_min, self.salary_max) {
            if min > max {
                bail!("--salary-min ({min}) is above --salary-max ({max})");
            }
        }
        Ok(JobDraft {
            title: self.title,
            company: self.company,
            location: self.location,
            description: self.description,
            requirements: self.requirements.join("\n"),
            salary_min: self.salary_min,
            salary_max: self.salary_max,
            currency: self.currency,
            employment_type: self.employment_type,
            experience_level: self.level,
            category_id: self.category_id,
            is_active: !self.inactive,
        })
    }
}

/// Parse a value using its API spelling.
fn parse_wire<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(raw.trim().to_string()))
        .map_err(|_| format!("unsupported value '{raw}'"))
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(
            fmt::layer()
                .with_target(debug)
                .with_line_number(debug)
                .with_writer(io::stderr),
        )
        .init();
}

/// Tells the user to log in again once the session could not be refreshed.
struct LoginHint {
    surface: Surface,
}

#[async_trait]
impl LoginRedirect for LoginHint {
    async fn redirect_to_login(&self) {
        let command = match self.surface {
            Surface::Public => "job-board login <username>",
            Surface::Admin => "job-board --admin login <username>",
        };
        eprintln!(
            "{}",
            format!("Your session has expired. Run `{command}` to sign in again.").yellow()
        );
    }
}

struct App {
    client: ApiClient,
    session: SessionManager,
    surface: Surface,
}

impl App {
    async fn start(config: &Config, surface: Surface) -> anyhow::Result<Self> {
        let data_dir = ensure_dir(&config.data_dir())
            .with_context(|| format!("cannot create {}", config.data_dir().display()))?;
        let store: Arc<dyn KeyValueStore> =
            Arc::new(FileKeyValueStore::new(session_store_path(&data_dir)));

        let client = ApiClient::new(
            config,
            CredentialStore::new(store.clone(), surface.storage_keys()),
        )?;
        let session = SessionManager::for_surface(Arc::new(client.clone()), store, surface);
        client
            .set_login_redirect(session.login_redirect(Arc::new(LoginHint { surface })))
            .await;

        session.restore_session().await?;
        Ok(Self {
            client,
            session,
            surface,
        })
    }

    async fn require_login(&self) -> anyhow::Result<()> {
        if !self.session.is_authenticated().await {
            bail!("not logged in, run `job-board login <username>` first");
        }
        Ok(())
    }

    async fn require_admin(&self) -> anyhow::Result<()> {
        if self.surface != Surface::Admin {
            bail!("this command needs the admin session, add --admin");
        }
        self.require_login().await
    }
}

fn read_password(provided: Option<String>) -> anyhow::Result<String> {
    if let Some(password) = provided {
        return Ok(password);
    }
    print!("Password: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("a password is required");
    }
    Ok(password)
}

fn load_config(api_url: Option<&str>) -> Config {
    let mut config = Config::new();
    if let Some(url) = api_url {
        config.api_url = normalize_api_url(url);
    }
    config
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let config = load_config(cli.api_url.as_deref());
    let surface = if cli.admin {
        Surface::Admin
    } else {
        Surface::Public
    };
    tracing::debug!("Using {} ({:?} surface)", config.api_base(), surface);

    let app = App::start(&config, surface).await?;
    match run(&app, cli.command).await {
        // the login hint has already been printed
        Err(e) if matches!(e.downcast_ref::<ApiError>(), Some(ApiError::SessionExpired(_))) => {
            std::process::exit(1)
        }
        other => other,
    }
}

async fn run(app: &App, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Login { username, password } => {
            let password = read_password(password)?;
            let user = app.session.login(&username, &password).await?;
            print!("{} ", "Logged in as".green());
            output::print_user(&user);
        }
        Commands::Logout => {
            app.session.logout().await;
            println!("{}", "Logged out".green());
        }
        Commands::Register {
            username,
            email,
            password,
            role,
        } => {
            let password = read_password(password)?;
            app.session
                .register(&username, &email, &password, role)
                .await?;
            println!(
                "{}",
                format!("Account {username} created. Log in with `job-board login {username}`.")
                    .green()
            );
        }
        Commands::Whoami { verify } => {
            app.require_login().await?;
            let user = if verify {
                app.client.me().await?
            } else {
                match app.session.current_user().await {
                    Some(user) => user,
                    None => bail!("no stored identity"),
                }
            };
            output::print_user(&user);
        }
        Commands::Jobs {
            search,
            category,
            location,
            level,
            employment_type,
        } => {
            let filters = JobFilters {
                search,
                category,
                location,
                experience_level: level,
                employment_type,
            };
            let jobs = app.client.search_jobs(&filters).await?;
            output::print_jobs(&jobs);
        }
        Commands::Applications { action: None } => {
            app.require_login().await?;
            let applications = app.client.list_applications().await?;
            output::print_applications(&applications);
        }
        Commands::Applications {
            action: Some(ApplicationAction::SetStatus { id, status }),
        } => {
            app.require_admin().await?;
            let application = app.client.update_application_status(id, status).await?;
            print!("{} ", "Updated".green());
            output::print_applications(std::slice::from_ref(&application));
        }
        Commands::PostJob(args) => {
            app.require_admin().await?;
            let draft = args.into_draft()?;
            let job = app.client.create_job(&draft).await?;
            println!("{}", format!("Posted job {}", job.id).green());
            output::print_jobs(std::slice::from_ref(&job));
        }
        Commands::Users { action } => {
            app.require_admin().await?;
            match action.unwrap_or(UserAction::List) {
                UserAction::List => {
                    let users = app.client.list_users().await?;
                    output::print_users(&users);
                }
                UserAction::Delete { id } => {
                    app.client.delete_user(id).await?;
                    println!("{}", format!("Deleted user {id}").green());
                }
                UserAction::Update { id, update } => {
                    let account = app.client.update_user(id, &update.into_update()?).await?;
                    output::print_users(std::slice::from_ref(&account));
                }
            }
        }
        Commands::Profile { update } => {
            app.require_login().await?;
            let update = update.into_update()?;
            let Some(user) = app.session.current_user().await else {
                bail!("no stored identity");
            };
            let account = app.client.update_user(user.id, &update).await?;
            output::print_users(std::slice::from_ref(&account));
        }
        Commands::Stats => {
            app.require_login().await?;
            let stats = app.client.dashboard_stats().await?;
            output::print_stats(&stats);
        }
    }
    Ok(())
}
