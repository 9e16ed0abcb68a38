use anyhow::Context;
use evently::cli::init::{self, InitConfig, InitResult};
use evently::cli::output::Output;
use evently::cli::{Cli, Commands};
use evently::utils::toml_config::{ConfigError, EventlyConfig};
use evently::{build_app, AppState, DatabaseProvider};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    // A missing .env is fine; real deployments set variables directly
    let _ = dotenvy::dotenv();

    let result = match cli.command {
        Some(Commands::Init {
            path,
            force,
            host,
            port,
        }) => {
            return match init::run(
                InitConfig {
                    path,
                    force,
                    host,
                    port,
                },
                &output,
            ) {
                InitResult::Success => ExitCode::SUCCESS,
                InitResult::AlreadyExists | InitResult::Error(_) => ExitCode::FAILURE,
            };
        }
        Some(Commands::Config { validate }) => show_config(&cli.config, validate, &output),
        Some(Commands::Serve) | None => serve(&cli.config, cli.verbose, &output).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output.error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: &std::path::Path, output: &Output) -> anyhow::Result<EventlyConfig> {
    EventlyConfig::load(path).map_err(|e| {
        if matches!(e, ConfigError::FileNotFound(_)) {
            output.hint("Run 'evently-server init' to create a starter configuration");
        }
        anyhow::Error::new(e)
    })
    .with_context(|| format!("Failed to load {}", path.display()))
}

fn show_config(path: &std::path::Path, validate: bool, output: &Output) -> anyhow::Result<()> {
    output.banner();

    let config = if validate {
        load_config(path, output)?
    } else {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str::<EventlyConfig>(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?
    };

    output.header("Configuration");
    output.kv("file", &path.display().to_string());
    output.kv("listen", &config.bind_address());
    output.kv("log level", &config.server.log_level);
    output.kv("secret variable", &config.auth.jwt_secret_env);
    output.kv("token expiry", &format!("{}s", config.auth.token_expiry));
    output.kv(
        "hashing",
        &format!(
            "argon2id m={}KiB t={} p={}",
            config.auth.hashing.memory_kib,
            config.auth.hashing.iterations,
            config.auth.hashing.parallelism
        ),
    );
    output.kv(
        "store",
        &format!("{:?}", redact(DatabaseProvider::from_config(&config))),
    );

    output.newline();
    if validate {
        output.success("Configuration is valid");
    } else {
        output.hint("Use --validate to also check the environment");
    }

    Ok(())
}

fn redact(provider: DatabaseProvider) -> DatabaseProvider {
    match provider {
        DatabaseProvider::Turso { url, .. } => DatabaseProvider::Turso {
            url,
            auth_token: "***".to_string(),
        },
        other => other,
    }
}

fn init_tracing(config: &EventlyConfig, verbose: bool) {
    let default_filter = if verbose {
        "debug".to_string()
    } else {
        format!("{},tower_http=info", config.server.log_level)
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init();
}

async fn serve(path: &std::path::Path, verbose: bool, output: &Output) -> anyhow::Result<()> {
    let config = load_config(path, output)?;
    init_tracing(&config, verbose);
    output.banner();

    let addr = config.bind_address();
    let state = AppState::from_config(config)
        .await
        .context("Failed to initialize application state")?;
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    output.success(&format!("Listening on http://{}", addr));
    tracing::info!(%addr, "server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
