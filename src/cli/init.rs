//! Init command implementation
//!
//! Writes a starter `evently.toml` and `.env.example` into a directory.

use super::output::Output;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of the init operation
#[derive(Debug)]
pub enum InitResult {
    Success,
    /// evently.toml already present and `--force` not given
    AlreadyExists,
    Error(String),
}

/// Configuration for the init command
pub struct InitConfig {
    /// Directory to initialize
    pub path: PathBuf,
    /// Overwrite existing files
    pub force: bool,
    pub host: String,
    pub port: u16,
}

/// Run the init command
pub fn run(config: InitConfig, output: &Output) -> InitResult {
    output.banner();
    output.header("Initializing Evently");

    let base_path = &config.path;
    let config_path = base_path.join("evently.toml");
    if config_path.exists() && !config.force {
        output.warning("evently.toml already exists!");
        output.hint("Use --force to overwrite existing files");
        return InitResult::AlreadyExists;
    }

    let data_dir = base_path.join("data");
    if data_dir.exists() {
        output.skipped("data", "already exists");
    } else if let Err(e) = fs::create_dir_all(&data_dir) {
        output.error(&format!("Failed to create data: {}", e));
        return InitResult::Error(e.to_string());
    } else {
        output.created("directory", "data");
    }

    if let Err(e) = write_file(&config_path, &generate_evently_toml(&config), config.force) {
        output.error(&format!("Failed to create evently.toml: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.created("config", "evently.toml");

    let env_example_path = base_path.join(".env.example");
    if let Err(e) = write_file(&env_example_path, generate_env_example(), config.force) {
        output.error(&format!("Failed to create .env.example: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.created("env", ".env.example");

    output.header("Next Steps");
    output.info("1. Set the signing secret:");
    output.command("cp .env.example .env");
    output.command("# Edit .env and set JWT_SECRET (min 32 chars)");
    output.info("2. Start the server:");
    output.command("evently-server");
    output.hint(&format!(
        "Server will be available at http://{}:{}",
        config.host, config.port
    ));

    InitResult::Success
}

fn write_file(path: &Path, content: &str, force: bool) -> std::io::Result<()> {
    if path.exists() && !force {
        return Ok(());
    }
    fs::write(path, content)
}

fn generate_evently_toml(config: &InitConfig) -> String {
    format!(
        r#"# Evently configuration

[server]
host = "{host}"
port = {port}
log_level = "info"

[auth]
# Name of the environment variable that holds the token signing secret
jwt_secret_env = "JWT_SECRET"
# Token validity in seconds (24h)
token_expiry = 86400

[auth.hashing]
# Argon2id cost
memory_kib = 19456
iterations = 2
parallelism = 1

[database]
# "sqlite" (file, ":memory:" or remote Turso) or "memory"
backend = "sqlite"
url = "./data/evently.db"
# turso_url_env = "TURSO_URL"
# turso_token_env = "TURSO_AUTH_TOKEN"
"#,
        host = config.host,
        port = config.port
    )
}

fn generate_env_example() -> &'static str {
    r#"# Evently environment variables
# Copy this file to .env and fill in the values.

# REQUIRED: token signing secret (minimum 32 characters)
# Generate with: openssl rand -base64 32
JWT_SECRET=change-me-in-production-use-at-least-32-characters

# Optional: log filter (overrides server.log_level)
RUST_LOG=info,evently=debug

# Optional: Turso cloud database
# TURSO_URL=libsql://your-db.turso.io
# TURSO_AUTH_TOKEN=your-token
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::toml_config::EventlyConfig;
    use tempfile::TempDir;

    fn create_test_config(temp_dir: &TempDir) -> InitConfig {
        InitConfig {
            path: temp_dir.path().to_path_buf(),
            force: false,
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }

    #[test]
    fn test_generated_toml_parses() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config = create_test_config(&temp_dir);

        let parsed: EventlyConfig =
            toml::from_str(&generate_evently_toml(&config)).expect("generated config parses");

        assert_eq!(parsed.server.port, 8080);
        assert_eq!(parsed.auth.token_expiry, 86_400);
        assert_eq!(parsed.database.url, "./data/evently.db");
    }

    #[test]
    fn test_write_file_skips_existing_without_force() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let file_path = temp_dir.path().join("test.txt");

        fs::write(&file_path, "original").expect("Failed to write");

        write_file(&file_path, "new content", false).expect("should not fail");

        let content = fs::read_to_string(&file_path).expect("Failed to read file");
        assert_eq!(content, "original");
    }

    #[test]
    fn test_write_file_overwrites_with_force() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let file_path = temp_dir.path().join("test.txt");

        fs::write(&file_path, "original").expect("Failed to write");

        write_file(&file_path, "new content", true).expect("should write");

        let content = fs::read_to_string(&file_path).expect("Failed to read file");
        assert_eq!(content, "new content");
    }

    #[test]
    fn test_run_creates_all_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let result = run(create_test_config(&temp_dir), &Output::no_color());

        assert!(matches!(result, InitResult::Success));
        assert!(temp_dir.path().join("evently.toml").exists());
        assert!(temp_dir.path().join(".env.example").exists());
        assert!(temp_dir.path().join("data").is_dir());
    }

    #[test]
    fn test_run_already_exists_without_force() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        fs::write(temp_dir.path().join("evently.toml"), "existing").expect("Failed to write");

        let result = run(create_test_config(&temp_dir), &Output::no_color());

        assert!(matches!(result, InitResult::AlreadyExists));
        let content =
            fs::read_to_string(temp_dir.path().join("evently.toml")).expect("Failed to read");
        assert_eq!(content, "existing");
    }

    #[test]
    fn test_run_force_overwrites() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        fs::write(temp_dir.path().join("evently.toml"), "existing").expect("Failed to write");

        let mut config = create_test_config(&temp_dir);
        config.force = true;
        let result = run(config, &Output::no_color());

        assert!(matches!(result, InitResult::Success));
        let content =
            fs::read_to_string(temp_dir.path().join("evently.toml")).expect("Failed to read");
        assert!(content.contains("[server]"));
    }
}
