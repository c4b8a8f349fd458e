use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    render::{render_log, MarkupPolicy},
    AcceptList, AssistantApi, FileUpload, HttpAssistantApi, SessionController, SessionError,
    SessionSnapshot,
};
use colored::Colorize;
use shared::domain::StoreCredentials;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod printer;
mod view;

use commands::{parse_line, OperatorCommand, HELP};
use printer::EventPrinter;

#[derive(Parser, Debug)]
#[command(name = "store-operator", about = "Chat with the store assistant from a terminal")]
struct Args {
    /// Assistant base URL, overrides config and environment.
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// `sanitize` (default) or `trust`.
    #[arg(long)]
    markup: Option<MarkupPolicy>,
    #[arg(long)]
    user_id: Option<String>,
}

type InputLines = Lines<BufReader<Stdin>>;

const CREDENTIAL_FIELDS: [&str; 5] = [
    "Store URL",
    "Consumer Key",
    "Consumer Secret",
    "Access Token",
    "Access Token Secret",
];

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = config::load_settings(&args.config)?;
    if let Some(api_url) = args.api_url {
        settings.api_base_url = api_url;
    }
    if let Some(policy) = args.markup {
        settings.markup_policy = policy;
    }
    if let Some(user_id) = args.user_id {
        settings.user_id = user_id;
    }
    let settings = config::finalize(settings)?;
    if settings.markup_policy == MarkupPolicy::Trust {
        warn!("markup policy is 'trust'; assistant text is printed without sanitizing");
    }

    let api = Arc::new(HttpAssistantApi::new(
        &settings.api_base_url,
        settings.request_timeout(),
    )?);
    match api.health().await {
        Ok(health) => info!(base_url = api.base_url(), status = %health.status, "assistant reachable"),
        Err(err) => warn!(base_url = api.base_url(), error = %err, "assistant health check failed"),
    }

    let controller = SessionController::with_user_id(api, settings.user_id.clone());
    let policy = settings.markup_policy;
    println!("{}\n\n{HELP}\n", transcript(&controller.snapshot(), policy));
    let printer = EventPrinter::spawn(controller.clone(), policy, std::io::stdout());
    let accept = settings.accept_list();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        printer.settle().await;
        prompt(view::input_placeholder(&controller.snapshot())).await?;
        let Some(line) = lines.next_line().await.context("failed to read input")? else {
            break;
        };

        let command = parse_line(&line);
        debug!(command = command.name(), "operator input");
        match command {
            OperatorCommand::Quit => break,
            OperatorCommand::Help => println!("{HELP}"),
            OperatorCommand::Status => {
                let snapshot = controller.snapshot();
                println!(
                    "{}\n{}",
                    transcript(&snapshot, policy),
                    view::connection_panel(&snapshot)
                );
            }
            OperatorCommand::NewChat => println!("{}", "Chat sessions are not available yet.".dimmed()),
            OperatorCommand::Unknown(name) => {
                println!("{}", format!("Unknown command '/{name}'. Try /help.").red())
            }
            OperatorCommand::Connect => {
                if !controller.snapshot().can_connect() {
                    refuse(&SessionError::AlreadyConnected);
                    continue;
                }
                let Some(credentials) = read_credentials(&mut lines).await? else {
                    break;
                };
                match controller.connect(credentials).await {
                    // The printer already shows the failure detail as the connection status.
                    Ok(_) | Err(SessionError::ConnectFailed(_)) => {}
                    Err(err) => refuse(&err),
                }
            }
            OperatorCommand::Disconnect => {
                if !controller.disconnect() {
                    refuse(&SessionError::NotConnected);
                }
            }
            OperatorCommand::Upload(path) => {
                let file = match path {
                    Some(path) => match FileUpload::from_path(&path, &accept).await {
                        Ok(file) => Some(file),
                        Err(err) => {
                            println!("{}", err.to_string().red());
                            continue;
                        }
                    },
                    None => None,
                };
                match controller.upload_file(file).await {
                    Ok(Some(_)) => {}
                    Ok(None) => println!("{}", upload_usage(&accept).dimmed()),
                    Err(err) => refuse(&err),
                }
            }
            OperatorCommand::Chat(text) => {
                if let Err(err) = controller.send_message(&text).await {
                    refuse(&err);
                }
            }
        }
    }

    printer.stop();
    Ok(())
}

fn transcript(snapshot: &SessionSnapshot, policy: MarkupPolicy) -> String {
    view::log(&render_log(&snapshot.messages, snapshot.pending, policy))
}

async fn prompt(placeholder: &str) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(format!("{} {} ", placeholder.dimmed(), "›".bold()).as_bytes())
        .await?;
    stdout.flush().await?;
    Ok(())
}

/// Prompts for every credential field. `None` when input ends first.
async fn read_credentials(lines: &mut InputLines) -> Result<Option<StoreCredentials>> {
    let mut values = Vec::with_capacity(CREDENTIAL_FIELDS.len());
    for field in CREDENTIAL_FIELDS {
        loop {
            prompt(field).await?;
            let Some(value) = lines.next_line().await.context("failed to read input")? else {
                return Ok(None);
            };
            let value = value.trim().to_string();
            if !value.is_empty() {
                values.push(value);
                break;
            }
            println!("{}", format!("{field} is required.").red());
        }
    }

    let [store_url, consumer_key, consumer_secret, access_token, access_token_secret]: [String; 5] =
        values
            .try_into()
            .map_err(|_| anyhow::anyhow!("credential prompt collected an unexpected field count"))?;
    Ok(Some(StoreCredentials {
        store_url,
        consumer_key,
        consumer_secret,
        access_token,
        access_token_secret,
    }))
}

fn refuse(err: &SessionError) {
    println!("{}", err.to_string().red());
}

fn upload_usage(accept: &AcceptList) -> String {
    format!("Usage: /upload <path> (accepted: {accept})")
}
