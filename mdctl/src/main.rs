use clap::{Parser, Subcommand};
use mdctl::{
    ApiClient, Config, ConversionWorkflow, FsSink, InMemoryStore, OutputFormat, Session,
};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Client for a remote markdown conversion API")]
struct Cli {
    #[command(flatten)]
    args: mdctl::Args,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert markdown from a file (or stdin) to the requested format
    Convert {
        /// Input markdown file; reads stdin when omitted
        input: Option<PathBuf>,

        /// Target output format (html, txt, pdf, docx)
        #[arg(short = 't', long, default_value = "html")]
        format: String,

        /// Override the configured output directory for downloads
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },

    /// List the formats the API can produce
    Formats,

    /// Check whether the API is reachable
    Health,

    /// Log in and store the session token
    Login {
        email: String,

        #[arg(long, env = "MDCTL_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Register a new account and store the session token
    Register {
        email: String,

        #[arg(long, env = "MDCTL_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// List past conversions
    History,

    /// Download one past conversion by id
    Fetch {
        id: i64,

        /// Override the configured output directory
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.args)?;

    if cli.args.validate {
        println!("Configuration is valid.");
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mdctl=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let Some(command) = cli.command else {
        eprintln!("No command given. Try `mdctl --help`.");
        std::process::exit(2);
    };

    if let Err(err) = run(command, config).await {
        tracing::error!(error = %err, "command failed");
        eprintln!("{}", err.user_message());
        std::process::exit(1);
    }
    Ok(())
}

async fn run(command: Command, config: Config) -> mdctl::Result<()> {
    let client = ApiClient::new(&config);
    let mut session = match config.token_file.clone() {
        Some(path) => Session::load(path)?,
        None => Session::new(),
    };

    match command {
        Command::Convert {
            input,
            format,
            out_dir,
        } => {
            let format: OutputFormat = format.parse()?;
            let content = read_input(input)?;

            let store = Arc::new(InMemoryStore::new());
            let mut workflow = ConversionWorkflow::new(client, store);
            workflow.convert(&session, &content, format).await?;

            if let Some(output) = workflow.output() {
                println!("{output}");
            }
            let sink = FsSink::new(out_dir.unwrap_or_else(|| config.output_dir.clone()));
            if let Some(path) = workflow.download(&sink)? {
                eprintln!("Saved {}", path.display());
            }
        }
        Command::Formats => {
            for format in client.formats().await {
                println!("{format}");
            }
        }
        Command::Health => {
            let health = client.health().await?;
            println!("{}: {}", health.status, health.message);
        }
        Command::Login { email, password } => {
            client.login(&mut session, &email, &password).await?;
            eprintln!("Logged in as {email}");
        }
        Command::Register { email, password } => {
            client.register(&mut session, &email, &password).await?;
            eprintln!("Registered {email}");
        }
        Command::History => {
            for entry in client.history(&session).await? {
                println!("{}\t{}", entry.id, entry.filename);
            }
        }
        Command::Fetch { id, out_dir } => {
            let entries = client.history(&session).await?;
            let entry = entries
                .into_iter()
                .find(|e| e.id == id)
                .ok_or_else(|| mdctl::Error::business(format!("No history entry with id {id}")))?;

            let store = Arc::new(InMemoryStore::new());
            let workflow = ConversionWorkflow::new(client, store);
            let sink = FsSink::new(out_dir.unwrap_or_else(|| config.output_dir.clone()));
            let path = workflow
                .download_history_entry(&session, &entry, &sink)
                .await?;
            eprintln!("Saved {}", path.display());
        }
    }

    Ok(())
}

fn read_input(input: Option<PathBuf>) -> mdctl::Result<String> {
    match input {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut content = String::new();
            std::io::stdin().read_to_string(&mut content)?;
            Ok(content)
        }
    }
}
