//! CLI for fieldcheck: check a JSON document, or serve validated routes over HTTP.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use fieldcheck::{check_input, Application, FieldSpec, Presence, RoutesConfig, ServerConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8000;

#[derive(Parser)]
#[command(name = "fieldcheck")]
#[command(about = "Check JSON documents for required top-level fields", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check one document. Exit status: 0 valid, 1 missing fields, 2 malformed input, 3 I/O error.
    Check {
        /// Required field names, comma separated or repeated (e.g. -r email,name)
        #[arg(short, long, value_delimiter = ',', required = true)]
        require: Vec<String>,
        /// When a present key counts as filled in
        #[arg(long, value_enum, default_value_t = PresenceArg::NonNull)]
        presence: PresenceArg,
        /// JSON file to check; stdin when omitted or "-"
        file: Option<PathBuf>,
    },
    /// Serve routes over HTTP. HOST and PORT env vars apply unless --host/--port are given.
    Serve {
        /// Route config file (JSON). Without it, GET/POST /example requiring "email" is served.
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the routes a config file would serve.
    Routes {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PresenceArg {
    KeyOnly,
    NonNull,
    NonEmpty,
}

impl From<PresenceArg> for Presence {
    fn from(p: PresenceArg) -> Self {
        match p {
            PresenceArg::KeyOnly => Presence::KeyOnly,
            PresenceArg::NonNull => Presence::NonNull,
            PresenceArg::NonEmpty => Presence::NonEmpty,
        }
    }
}

fn run_check(require: Vec<String>, presence: PresenceArg, file: Option<PathBuf>) -> ExitCode {
    let spec = FieldSpec::new(require).with_presence(presence.into());
    let report = check_input(file.as_deref(), &spec);
    if report.exit_code == fieldcheck::check::EXIT_IO {
        let reason = report.output["error"].as_str().unwrap_or_default();
        error!(error = reason, "failed to read input");
    } else {
        println!("{}", report.output);
    }
    ExitCode::from(report.exit_code)
}

fn load_routes(config: Option<&Path>) -> Result<RoutesConfig, Box<dyn std::error::Error + Send + Sync>> {
    match config {
        Some(path) => {
            let routes = RoutesConfig::load(path)?;
            info!(path = %path.display(), routes = routes.routes.len(), "loaded route config");
            Ok(routes)
        }
        None => Ok(RoutesConfig::example()),
    }
}

fn build_app(routes: &RoutesConfig) -> Result<Application, Box<dyn std::error::Error + Send + Sync>> {
    let mut app = Application::new();
    app.register(&mut routes.to_module())?;
    Ok(app)
}

fn run_serve(
    config: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let routes = load_routes(config.as_deref())?;
    let app = build_app(&routes)?;
    for route in app.routes() {
        info!(method = %route.method, path = %format!("/{}", route.path), required = ?route.required.fields, "route");
    }
    let server = ServerConfig::from_env(DEFAULT_HOST, DEFAULT_PORT).with_overrides(host, port);
    info!("listening on http://{} (GET /openapi.json for the route list)", server);
    app.run(&server, &routes.title, &routes.version)
}

fn run_routes(config: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let routes = load_routes(config.as_deref())?;
    let app = build_app(&routes)?;
    for line in app.describe_routes() {
        println!("{}", line);
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Check {
            require,
            presence,
            file,
        } => return run_check(require, presence, file),
        Commands::Serve { config, host, port } => run_serve(config, host, port),
        Commands::Routes { config } => run_routes(config),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "fieldcheck failed");
            ExitCode::FAILURE
        }
    }
}
