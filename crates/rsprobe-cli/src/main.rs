mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{Overrides, EXIT_CONFIG_ERROR, EXIT_DISCOVERY_ERROR, EXIT_FAILURE};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "rsprobe",
    version,
    about = "Conformance test suite for remoteStorage servers"
)]
struct Cli {
    /// JSON configuration file. Replaces the environment variables.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Server under test (repeatable). Overrides SERVER_URL.
    #[arg(long = "server", global = true)]
    servers: Vec<String>,

    /// Account name or user@host address. Overrides ACCOUNT.
    #[arg(long, global = true)]
    account: Option<String>,

    /// Storage category the tokens are scoped to. Overrides TOKEN_SCOPE.
    #[arg(long, global = true)]
    scope: Option<String>,

    /// Protocol draft to test against instead of the declared one.
    #[arg(long, global = true)]
    spec_version: Option<u32>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Discover every configured server and run the conformance suite.
    Run {
        /// Only run these scenario groups (comma-separated or repeated).
        #[arg(long = "group", value_delimiter = ',')]
        groups: Vec<String>,
    },
    /// Resolve each server's storage root, version and auth endpoint.
    Discover,
    /// Show the expected behaviors for a protocol draft.
    Policy {
        /// Draft number, e.g. 2 for draft-dejong-remotestorage-02.
        version: u32,
    },
    /// Build the OAuth authorization URL for obtaining a token.
    AuthUrl {
        /// Token permission: rw, r, or * (global).
        permission: String,
        /// Redirect target that receives the token.
        #[arg(long, default_value = "http://localhost:8000/")]
        redirect_uri: String,
        /// Authorization endpoint to use instead of discovering it.
        #[arg(long)]
        endpoint: Option<String>,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("RSPROBE_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let overrides = Overrides {
        config: cli.config,
        servers: cli.servers,
        account: cli.account,
        scope: cli.scope,
        spec_version: cli.spec_version,
    };
    let json_output = cli.json;

    let result = match cli.command {
        Commands::Run { groups } => commands::run::run(&overrides, &groups, json_output),
        Commands::Discover => commands::discover::run(&overrides, json_output),
        Commands::Policy { version } => commands::policy::run(version, json_output),
        Commands::AuthUrl {
            permission,
            redirect_uri,
            endpoint,
        } => commands::auth_url::run(
            &overrides,
            &permission,
            &redirect_uri,
            endpoint.as_deref(),
            json_output,
        ),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("config error:") || msg.starts_with("configuration error:") {
                EXIT_CONFIG_ERROR
            } else if msg.starts_with("discovery error:") {
                EXIT_DISCOVERY_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}
