// # contactctl - ContactSphere command line client
//
// A thin shell over contactsync-core: every command bootstraps the session
// from the persisted credential, runs one operation and prints its outcome.
// No contact or session logic lives here.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// - `CONTACTSYNC_BASE_URL`: Backend base URL (required)
// - `CONTACTSYNC_STATE_PATH`: Credential file (default: `$HOME/.config/contactsync/credentials.json`,
//   in-memory when `HOME` is unset)
// - `CONTACTSYNC_TOKEN_SLOT`: Credential slot name (default: `contactsphere_token`)
// - `CONTACTSYNC_TIMEOUT_SECS`: HTTP request timeout in seconds (default: none)
// - `CONTACTSYNC_LOG_LEVEL`: trace, debug, info, warn, error (default: warn)
//
// ## Example
//
// ```bash
// export CONTACTSYNC_BASE_URL=http://localhost:5000
// contactctl login --email alice@example.com --password secret
// contactctl add --name "Jane Smith" --email jane@x.com --phone 555-0101
// contactctl search jane
// ```

use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use contactsync_core::{
    ClientConfig, Contact, ContactClient, ContactDraft, ContactPatch, DEFAULT_CREDENTIAL_SLOT,
    Outcome, SessionState,
};
use contactsync_http::HttpContactApi;
use tracing::{Level, debug, error};
use tracing_subscriber::FmtSubscriber;

/// Exit codes
///
/// - 0: Operation succeeded
/// - 1: Configuration or startup error
/// - 2: Operation failed (rejected input, backend error, not logged in)
#[derive(Debug, Clone, Copy)]
enum CtlExitCode {
    Success = 0,
    ConfigError = 1,
    OperationFailed = 2,
}

impl From<CtlExitCode> for ExitCode {
    fn from(code: CtlExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// ContactSphere contacts from the terminal
#[derive(Parser)]
#[command(name = "contactctl", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an account
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "CONTACTSYNC_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Log in and remember the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "CONTACTSYNC_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// List all contacts
    List,

    /// Search contacts by name, email or phone
    Search {
        query: String,
    },

    /// Show one contact as stored on the backend
    Show {
        id: String,
    },

    /// Add a contact
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
    },

    /// Change fields of a contact
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },

    /// Delete a contact
    Remove {
        id: String,
    },
}

/// Application configuration
struct Config {
    base_url: String,
    state_path: Option<String>,
    token_slot: String,
    timeout_secs: Option<u64>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let timeout_secs = match env::var("CONTACTSYNC_TIMEOUT_SECS") {
            Ok(raw) => Some(raw.trim().parse::<u64>().map_err(|e| {
                anyhow::anyhow!("CONTACTSYNC_TIMEOUT_SECS must be a number of seconds: {}", e)
            })?),
            Err(_) => None,
        };

        let state_path = env::var("CONTACTSYNC_STATE_PATH").ok().or_else(|| {
            env::var("HOME")
                .ok()
                .map(|home| format!("{}/.config/contactsync/credentials.json", home))
        });

        Ok(Self {
            base_url: env::var("CONTACTSYNC_BASE_URL").map_err(|_| {
                anyhow::anyhow!(
                    "CONTACTSYNC_BASE_URL is required. \
                    Set it via: export CONTACTSYNC_BASE_URL=https://api.contactsphere.com"
                )
            })?,
            state_path,
            token_slot: env::var("CONTACTSYNC_TOKEN_SLOT")
                .unwrap_or_else(|_| DEFAULT_CREDENTIAL_SLOT.to_string()),
            timeout_secs,
            log_level: env::var("CONTACTSYNC_LOG_LEVEL").unwrap_or_else(|_| "warn".to_string()),
        })
    }

    /// Validate the configuration and build the client configuration
    fn client_config(&self) -> Result<ClientConfig> {
        log_level(&self.log_level)?;

        let mut config = ClientConfig::new(self.base_url.clone()).with_credential_slot(self.token_slot.clone());
        if let Some(path) = &self.state_path {
            config = config.with_credential_file(path.clone());
        }
        config.http.request_timeout_secs = self.timeout_secs;

        config.validate()?;
        Ok(config)
    }
}

fn log_level(raw: &str) -> Result<Level> {
    match raw.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "CONTACTSYNC_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            raw
        ),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return CtlExitCode::ConfigError.into();
        }
    };

    let client_config = match config.client_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration validation error: {}", e);
            return CtlExitCode::ConfigError.into();
        }
    };

    let level = log_level(&config.log_level).unwrap_or(Level::WARN);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return CtlExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return CtlExitCode::ConfigError.into();
        }
    };

    rt.block_on(async {
        let client = match open_client(client_config).await {
            Ok(client) => client,
            Err(e) => {
                eprintln!("Startup error: {}", e);
                return CtlExitCode::ConfigError;
            }
        };
        let code = run(&client, cli.command).await;
        if let Err(e) = client.close().await {
            error!("Failed to flush credential store: {}", e);
        }
        code
    })
    .into()
}

async fn open_client(config: ClientConfig) -> Result<ContactClient> {
    let api = Arc::new(HttpContactApi::from_config(&config)?);
    Ok(ContactClient::open(config, api).await?)
}

/// Run one command against a bootstrapped client
async fn run(client: &ContactClient, command: Command) -> CtlExitCode {
    let state = client.bootstrap().await;
    debug!("Session state after bootstrap: {:?}", state);

    match command {
        Command::Register {
            username,
            email,
            password,
        } => report(&client.register(&username, &email, &password).await),
        Command::Login { email, password } => report(&client.login(&email, &password).await),
        Command::Logout => report(&client.logout().await),
        command => {
            if state != SessionState::Authenticated {
                eprintln!("Not logged in. Run `contactctl login` first.");
                return CtlExitCode::OperationFailed;
            }
            run_authenticated(client, command).await
        }
    }
}

async fn run_authenticated(client: &ContactClient, command: Command) -> CtlExitCode {
    let contacts = client.contacts();

    match command {
        Command::Whoami => match client.sessions().current_user().await {
            Some(user) => {
                println!("{} <{}> (id {})", user.username, user.email, user.id);
                if let Ok(Some(record)) = client.session().persisted_record().await {
                    println!("Logged in since {}", record.saved_at.to_rfc3339());
                }
                CtlExitCode::Success
            }
            None => CtlExitCode::OperationFailed,
        },
        Command::Show { id } => {
            let outcome = contacts.fetch(&id).await;
            if let Some(contact) = &outcome.value {
                print_contact(contact);
                return CtlExitCode::Success;
            }
            report(&outcome)
        }
        Command::Add { name, email, phone } => {
            report(&contacts.create(ContactDraft::new(name, email, phone)).await)
        }
        Command::Remove { id } => report(&contacts.delete(&id).await),
        command => {
            // The remaining commands work on the loaded collection
            let loaded = contacts.refresh().await;
            if !loaded.ok {
                return report(&loaded);
            }

            match command {
                Command::List => {
                    contacts.contacts().await.iter().for_each(print_contact);
                    CtlExitCode::Success
                }
                Command::Search { query } => {
                    contacts.search(&query).await.iter().for_each(print_contact);
                    CtlExitCode::Success
                }
                Command::Edit {
                    id,
                    name,
                    email,
                    phone,
                } => {
                    let patch = ContactPatch { name, email, phone };
                    if patch.is_empty() {
                        eprintln!("Nothing to change: pass --name, --email or --phone");
                        return CtlExitCode::OperationFailed;
                    }
                    report(&contacts.update(&id, patch).await)
                }
                _ => CtlExitCode::OperationFailed,
            }
        }
    }
}

fn print_contact(contact: &Contact) {
    println!("{}\t{}\t{}\t{}", contact.id, contact.name, contact.email, contact.phone);
}

/// Print an outcome and map it to an exit code
fn report<T>(outcome: &Outcome<T>) -> CtlExitCode {
    if outcome.ok {
        println!("{}: {}", outcome.title, outcome.message);
        return CtlExitCode::Success;
    }

    eprintln!("{}: {}", outcome.title, outcome.message);
    if let Some(errors) = &outcome.field_errors {
        for (field, message) in errors.iter() {
            eprintln!("  {}: {}", field, message);
        }
    }
    CtlExitCode::OperationFailed
}
