use std::process::ExitCode;
use std::sync::Arc;

use chat_session::{
    AuthApi, ConfigError, HttpAuthApi, LoginData, Notifier, PresenceTransport, ProfileUpdate, SessionConfig,
    SessionState, SessionStore, SignupData, SocketIoTransport, TracingNotifier,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("http client setup failed: {0}")]
    Api(#[from] chat_session::ApiError),
    #[error("not authenticated")]
    NotAuthenticated,
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("signal handling failed: {0}")]
    Signal(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "chat-session", about = "Chat auth session and presence client")]
struct Cli {
    /// Session cookie value from a previous login.
    #[arg(long, env = "CHAT_SESSION_TOKEN")]
    session_token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the user bound to the current session.
    Check,
    Signup {
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Keep the presence channel open and print online users.
        #[arg(long, default_value_t = false)]
        watch: bool,
    },
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value_t = false)]
        watch: bool,
    },
    UpdateProfile {
        #[arg(long)]
        profile_pic: String,
    },
    Logout,
    /// Validate the session, then print online users until Ctrl-C.
    Watch,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    exit_code(run(Cli::parse()).await)
}

/// Print a failed command's message and map it to a non-zero status.
fn exit_code(result: Result<(), CliError>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = SessionConfig::from_env()?;
    tracing::debug!(api = %config.api_base_url, socket = %config.socket_url, mode = ?config.mode, "config loaded");

    let api: Arc<dyn AuthApi> = Arc::new(HttpAuthApi::new(&config, cli.session_token.as_deref())?);
    let transport: Arc<dyn PresenceTransport> = Arc::new(SocketIoTransport::from_config(&config));
    let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);
    let store = SessionStore::new(api, transport, notifier);

    match cli.command {
        Command::Check => {
            store.check_auth().await;
            let state = store.snapshot();
            store.disconnect_socket().await;
            if !state.is_authenticated() {
                return Err(CliError::NotAuthenticated);
            }
            print_user(&state)
        }
        Command::Signup { full_name, email, password, watch } => {
            store.signup(&SignupData { full_name, email, password }).await;
            finish(&store, watch).await
        }
        Command::Login { email, password, watch } => {
            store.login(&LoginData { email, password }).await;
            finish(&store, watch).await
        }
        Command::UpdateProfile { profile_pic } => {
            store.update_profile(&ProfileUpdate { profile_pic }).await;
            print_user(&store.snapshot())
        }
        Command::Logout => {
            store.logout().await;
            Ok(())
        }
        Command::Watch => {
            store.check_auth().await;
            finish(&store, true).await
        }
    }
}

async fn finish(store: &SessionStore, watch: bool) -> Result<(), CliError> {
    print_user(&store.snapshot())?;
    if watch {
        watch_presence(store).await?;
    }
    store.disconnect_socket().await;
    Ok(())
}

async fn watch_presence(store: &SessionStore) -> Result<(), CliError> {
    let mut rx = store.subscribe();
    let mut last = rx.borrow_and_update().online_users.clone();
    print_online(&last);

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                eprintln!("stopping");
                return Ok(());
            }
            changed = rx.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let online = rx.borrow_and_update().online_users.clone();
                if online != last {
                    print_online(&online);
                    last = online;
                }
            }
        }
    }
}

fn print_user(state: &SessionState) -> Result<(), CliError> {
    let rendered = render_user(state)?;
    println!("{rendered}");
    Ok(())
}

fn render_user(state: &SessionState) -> Result<String, CliError> {
    let Some(user) = &state.auth_user else {
        return Err(CliError::NotAuthenticated);
    };
    eprintln!("signed in as {}", user.display_name());
    Ok(serde_json::to_string_pretty(user)?)
}

fn print_online(ids: &[String]) {
    println!("online ({}): {}", ids.len(), ids.join(", "));
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
