//! Vitalwatch CLI
//!
//! Command-line client for the patient vitals backend:
//! - Log in and out
//! - Browse a patient's vitals with threshold alerts
//! - Export a page of vitals to CSV
//! - Manage users and datasets (admins)

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vitalwatch::api::{ApiClient, ApiClientConfig, DatasetUpload, VitalsApi};
use vitalwatch::config::{self, Config, LoggingConfig};
use vitalwatch::live::{LiveRefresh, StopReason};
use vitalwatch::query::QueryClient;
use vitalwatch::session::{Role, SessionStore};
use vitalwatch::views::{
    render, resolve, AdminError, AdminPanel, Dashboard, DashboardError, DashboardView, LoginForm,
    Notification, NotificationLevel, Notifier, RegisterForm, Route,
};
use vitalwatch::vitals::{PatientId, CSV_FILE_NAME};

#[derive(Parser)]
#[command(name = "vitalwatch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Patient vital-signs monitoring client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Backend URL (overrides config)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store the session
    Login {
        #[arg(short, long)]
        username: String,
        /// Prompted on stdin when omitted
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Create an account
    Register {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Show the current role
    Whoami,

    /// Show patient vitals
    Dashboard {
        /// Patient to show (default: first listed)
        #[arg(long)]
        patient: Option<String>,
        /// Page number, starting at 0
        #[arg(long, default_value = "0")]
        page: u32,
        /// Re-fetch every refresh interval until Ctrl-C
        #[arg(short, long)]
        watch: bool,
    },

    /// Export one page of vitals to CSV
    Export {
        #[arg(long)]
        patient: Option<String>,
        #[arg(long, default_value = "0")]
        page: u32,
        /// Output file ("-" for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Admin operations
    Admin {
        #[command(subcommand)]
        command: AdminCommand,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum AdminCommand {
    /// List user accounts
    Users,

    /// Create a user account
    CreateUser {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
        /// doctor, nurse or admin
        #[arg(short, long, default_value = "doctor")]
        role: Role,
    },

    /// Delete a user account
    DeleteUser {
        id: i64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Upload a vitals CSV file
    Upload { path: PathBuf },

    /// Clear all vitals
    Reset {
        #[arg(short, long)]
        yes: bool,
    },

    /// Insert sample vitals
    Seed,
}

impl Commands {
    fn route(&self) -> Option<Route> {
        match self {
            Commands::Login { .. } => Some(Route::Login),
            Commands::Register { .. } => Some(Route::Register),
            Commands::Dashboard { .. } | Commands::Export { .. } => Some(Route::Dashboard),
            Commands::Admin { .. } => Some(Route::Admin),
            Commands::Logout | Commands::Whoami | Commands::Config { .. } => None,
        }
    }
}

/// Shared services for one invocation
struct App {
    config: Config,
    api: Arc<dyn VitalsApi>,
    session: Arc<SessionStore>,
    queries: Arc<QueryClient>,
    notifier: Arc<Notifier>,
    format: OutputFormat,
}

impl App {
    fn new(config: Config, format: OutputFormat) -> anyhow::Result<Self> {
        let api = ApiClient::new(ApiClientConfig::from(&config.api))
            .context("Failed to build HTTP client")?;
        let session = SessionStore::with_file(&config.session.file);

        Ok(Self {
            config,
            api: Arc::new(api),
            session: Arc::new(session),
            queries: Arc::new(QueryClient::new()),
            notifier: Arc::new(Notifier::new()),
            format,
        })
    }

    fn dashboard(&self) -> Dashboard {
        Dashboard::new(self.api.clone(), self.session.clone(), self.queries.clone())
            .with_page_size(self.config.dashboard.page_size)
            .with_thresholds(self.config.thresholds)
    }

    fn admin(&self) -> AdminPanel {
        AdminPanel::new(
            self.api.clone(),
            self.session.clone(),
            self.queries.clone(),
            self.notifier.clone(),
        )
    }

    fn print_view(&self, view: &DashboardView) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Table => print!("{}", render::dashboard(view)),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(view)?),
        }
        Ok(())
    }

    /// Print and clear pending notifications
    fn flush_notifications(&self) {
        for n in self.notifier.drain() {
            print_notification(&n);
        }
    }

    /// Print notifications still within their ttl, keeping them queued
    fn show_active_notifications(&self) {
        for n in self.notifier.active(chrono::Utc::now()) {
            print_notification(&n);
        }
    }
}

fn print_notification(n: &Notification) {
    match n.level {
        NotificationLevel::Success => println!("{}", render::notification(n)),
        NotificationLevel::Error => eprintln!("{}", render::notification(n)),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (mut config, config_error) = match &cli.config {
        Some(path) => (Config::load_with_env(path)?, None),
        None => match Config::load_default() {
            Ok(config) => (config, None),
            Err(e) => (Config::from_env(), Some(e)),
        },
    };
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }

    init_logging(&config.logging);

    if let Some(e) = config_error {
        eprintln!("Warning: {}", e);
        eprintln!("Continuing with default settings.");
    }

    if let Commands::Config { output } = &cli.command {
        return write_default_config(output.as_deref());
    }

    let app = App::new(config, cli.format)?;

    // Role gating before any request goes out
    if let Some(requested) = cli.command.route() {
        let current = app.session.current();
        let shown = resolve(requested, current.as_ref());
        if shown != requested {
            match (requested, current) {
                (Route::Login | Route::Register, Some(session)) => {
                    println!(
                        "Already logged in as {}. Run `vitalwatch logout` first.",
                        session.role
                    );
                    return Ok(());
                }
                (_, None) => bail!("Not logged in. Run `vitalwatch login` first."),
                (_, Some(_)) => bail!("Admin access required"),
            }
        }
    }

    match cli.command {
        Commands::Login { username, password } => {
            let password = match password {
                Some(password) => password,
                None => prompt("Password: ")?,
            };
            let (role, _) = LoginForm::new(username, password)
                .submit(app.api.as_ref(), &app.session)
                .await?;
            println!("Logged in as {}", role);
        }

        Commands::Logout => {
            app.session.logout();
            app.queries.clear();
            println!("Logged out");
        }

        Commands::Register { username, password } => {
            let password = match password {
                Some(password) => password,
                None => prompt("Password: ")?,
            };
            let mut form = RegisterForm::new(username, password);
            let result = form.submit(app.api.as_ref(), &app.notifier).await;
            app.flush_notifications();
            if let Err(e) = result {
                bail!(form.error.unwrap_or_else(|| e.to_string()));
            }
        }

        Commands::Whoami => match app.session.role() {
            Some(role) => println!("{}", role),
            None => println!("Not logged in"),
        },

        Commands::Dashboard {
            patient,
            page,
            watch,
        } => {
            let mut dashboard = app.dashboard();
            navigate(&app, &mut dashboard, patient, page).await?;

            if watch {
                let interval = Duration::from_secs(app.config.dashboard.refresh_interval_secs);
                let mut print_error = None;
                let reason = LiveRefresh::new(interval)
                    .with_notifier(app.notifier.clone())
                    .run(&mut dashboard, |view| {
                        if app.format == OutputFormat::Table {
                            // Clear screen and home cursor
                            print!("\x1B[2J\x1B[H");
                        }
                        match app.print_view(view) {
                            Ok(()) => {
                                app.show_active_notifications();
                                ControlFlow::Continue(())
                            }
                            Err(e) => {
                                print_error = Some(e);
                                ControlFlow::Break(())
                            }
                        }
                    })
                    .await;

                if let Some(e) = print_error {
                    return Err(e);
                }
                if reason == StopReason::Terminated {
                    std::process::exit(1);
                }
            } else {
                app.print_view(&dashboard.render())?;
                if dashboard.is_terminated() {
                    std::process::exit(1);
                }
            }
        }

        Commands::Export {
            patient,
            page,
            output,
        } => {
            let mut dashboard = app.dashboard();
            navigate(&app, &mut dashboard, patient, page).await?;

            if dashboard.is_terminated() {
                app.print_view(&dashboard.render())?;
                std::process::exit(1);
            }

            let csv = match dashboard.export_csv() {
                Some(csv) => csv.context("Failed to encode CSV")?,
                None => bail!("No vitals loaded; nothing to export"),
            };

            let path = output.unwrap_or_else(|| PathBuf::from(CSV_FILE_NAME));
            if path.as_os_str() == "-" {
                println!("{}", csv);
            } else {
                std::fs::write(&path, &csv)
                    .with_context(|| format!("Failed to write {:?}", path))?;
                println!("Exported to {:?}", path);
            }
        }

        Commands::Admin { command } => {
            let result = run_admin(&app, command).await;
            app.flush_notifications();
            match result {
                Ok(()) => {}
                Err(AdminError::Cancelled) => println!("Cancelled"),
                Err(AdminError::Terminated) => {
                    eprintln!("Session expired. Logging out...");
                    std::process::exit(1);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Commands::Config { .. } => {}
    }

    Ok(())
}

/// Move the dashboard to the requested patient and page
async fn navigate(
    app: &App,
    dashboard: &mut Dashboard,
    patient: Option<String>,
    page: u32,
) -> anyhow::Result<()> {
    dashboard.load().await;
    if dashboard.is_terminated() {
        return Ok(());
    }

    let nurse = app.session.role() == Some(Role::Nurse);
    if nurse && (patient.is_some() || page > 0) {
        eprintln!("Note: patient and page selection are not available for nurses");
        return Ok(());
    }

    if let Some(id) = patient {
        match dashboard.select_patient(&PatientId::new(id)).await {
            Ok(_) => {}
            Err(DashboardError::NotReady) => return Ok(()),
            Err(e) => bail!(e),
        }
    }

    for _ in 0..page {
        match dashboard.next_page().await {
            Ok(_) => {}
            Err(DashboardError::NoNextPage) => {
                eprintln!("Note: no data past page {}", dashboard.page());
                break;
            }
            Err(DashboardError::Terminated) => break,
            Err(e) => bail!(e),
        }
    }

    Ok(())
}

async fn run_admin(app: &App, command: AdminCommand) -> Result<(), AdminError> {
    let mut panel = app.admin();

    match command {
        AdminCommand::Users => {
            let rows = panel.rows().await?;
            match app.format {
                OutputFormat::Table => print!("{}", render::users(&rows)),
                OutputFormat::Json => match serde_json::to_string_pretty(&rows) {
                    Ok(json) => println!("{}", json),
                    Err(e) => eprintln!("Failed to encode users: {}", e),
                },
            }
        }

        AdminCommand::CreateUser {
            username,
            password,
            role,
        } => {
            panel.form.username = username;
            panel.form.password = password;
            panel.form.role = role;
            panel.create_user().await?;
        }

        AdminCommand::DeleteUser { id, yes } => {
            let confirm = |prompt: &str| yes || confirm_stdin(prompt);
            panel.delete_user(id, &confirm).await?;
        }

        AdminCommand::Upload { path } => {
            let upload = DatasetUpload::from_path(&path).map_err(|e| {
                AdminError::Validation(if e.kind() == std::io::ErrorKind::NotFound {
                    "File not found"
                } else {
                    "Could not read file"
                })
            })?;
            panel.select_file(upload);
            panel.upload_dataset().await?;
        }

        AdminCommand::Reset { yes } => {
            let confirm = |prompt: &str| yes || confirm_stdin(prompt);
            panel.reset_data(&confirm).await?;
        }

        AdminCommand::Seed => {
            panel.seed_sample().await?;
        }
    }

    Ok(())
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("vitalwatch={}", logging.level)));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format.eq_ignore_ascii_case("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn write_default_config(output: Option<&Path>) -> anyhow::Result<()> {
    let config = config::generate_default_config();

    match output {
        Some(path) => {
            // Create parent directory if needed
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &config)?;
            println!("Config written to {:?}", path);
        }
        None => {
            print!("{}", config);
        }
    }
    Ok(())
}

fn prompt(label: &str) -> anyhow::Result<String> {
    eprint!("{}", label);
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn confirm_stdin(question: &str) -> bool {
    match prompt(&format!("{} [y/N] ", question)) {
        Ok(answer) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}
