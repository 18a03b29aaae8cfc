// # cloudctl - CloudControl command-line tool
//
// Thin integration layer: parses arguments, sets up logging and the runtime,
// builds the connection session over the protected profile store, and hands
// off to one command in `commands`. API and persistence logic live in
// `cloudcontrol-core` and `cloudcontrol-client`.
//
// ## Output
//
// - Records: stdout, one JSON document per line
// - Error records: stderr, `{errorId, category, message, target}`
// - Logs: stderr
//
// ## Environment
//
// - `HOME`: settings root (`$HOME/.mcp`)
// - `CLOUDCTL_LOG_LEVEL`: default log level (trace, debug, info, warn, error)
// - `CLOUDCTL_PASSWORD`: password for `connection new`
//
// ## Example
//
// ```bash
// cloudctl connection new --name prod --region AU --user admin --default
// cloudctl vlan get --network-domain 8cdfd607-f429-4df6-9352-162cfc0891be \
//     | cloudctl vlan remove --input -
// ```

mod commands;
mod input;
mod output;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use cloudcontrol_client::CloudControlClientFactory;
use cloudcontrol_core::{
    AesGcmProtector, CancellationToken, ClientConfig, ConnectionSession, Error, FileProfileStore,
    MasterKey, PollerConfig, ResourceStatePoller, Settings,
};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

use commands::Context;
use commands::account::AccountCommand;
use commands::connection::ConnectionCommand;
use commands::nat_rule::NatRuleCommand;
use commands::network_domain::NetworkDomainCommand;
use commands::resource::ResourceCommand;
use commands::server::ServerCommand;
use commands::vlan::VlanCommand;
use output::Output;

/// Exit codes
///
/// - 0: Every item succeeded
/// - 1: A fatal error stopped the command
/// - 2: The command completed, but reported non-fatal errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloudctlExitCode {
    Success = 0,
    Fatal = 1,
    CompletedWithErrors = 2,
}

impl From<CloudctlExitCode> for ExitCode {
    fn from(code: CloudctlExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

#[derive(Parser, Debug)]
#[command(name = "cloudctl", version)]
#[command(about = "Manage CloudControl network domains, VLANs, servers and connections")]
struct Cli {
    /// Connection to use (defaults to the default connection)
    #[arg(long, global = true)]
    connection: Option<String>,

    /// Log level: trace, debug, info, warn or error
    #[arg(long, global = true, env = "CLOUDCTL_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage connection profiles
    #[command(subcommand)]
    Connection(ConnectionCommand),
    /// Show the authenticated account
    #[command(subcommand)]
    Account(AccountCommand),
    /// Manage network domains
    #[command(subcommand)]
    NetworkDomain(NetworkDomainCommand),
    /// Manage VLANs
    #[command(subcommand)]
    Vlan(VlanCommand),
    /// Manage servers
    #[command(subcommand)]
    Server(ServerCommand),
    /// Show NAT rules
    #[command(subcommand)]
    NatRule(NatRuleCommand),
    /// Operations on any resource kind
    #[command(subcommand)]
    Resource(ResourceCommand),
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Connection(_) => "connection",
            Command::Account(_) => "account",
            Command::NetworkDomain(_) => "network-domain",
            Command::Vlan(_) => "vlan",
            Command::Server(_) => "server",
            Command::NatRule(_) => "nat-rule",
            Command::Resource(_) => "resource",
        }
    }
}

fn parse_log_level(level: &str) -> anyhow::Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "Log level '{}' is not valid. Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

/// Final exit code from the command result and the number of reported errors
fn exit_code(result: &cloudcontrol_core::Result<()>, reported_errors: usize) -> CloudctlExitCode {
    match result {
        Err(err) if err.is_fatal() => CloudctlExitCode::Fatal,
        Err(_) => CloudctlExitCode::CompletedWithErrors,
        Ok(()) if reported_errors > 0 => CloudctlExitCode::CompletedWithErrors,
        Ok(()) => CloudctlExitCode::Success,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match parse_log_level(&cli.log_level) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return CloudctlExitCode::Fatal.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return CloudctlExitCode::Fatal.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return CloudctlExitCode::Fatal.into();
        }
    };

    rt.block_on(run(cli)).into()
}

async fn run(cli: Cli) -> CloudctlExitCode {
    let mut output = Output::stdio();
    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_shutdown_signal(cancel.clone()));

    let (session, poller) = match startup().await {
        Ok(parts) => parts,
        Err(e) => {
            error!("Startup failed: {:#}", e);
            let err = e.downcast::<Error>().unwrap_or_else(Error::from);
            let result = Err(err);
            report_failure(&mut output, &result);
            return exit_code(&result, output.error_count());
        }
    };

    let mut ctx = Context {
        session,
        connection: cli.connection,
        poller,
        cancel,
        output,
    };

    let name = cli.command.name();
    debug!("Running '{}' command", name);

    let result = match cli.command {
        Command::Connection(command) => commands::connection::run(&mut ctx, command).await,
        Command::Account(command) => commands::account::run(&mut ctx, command).await,
        Command::NetworkDomain(command) => commands::network_domain::run(&mut ctx, command).await,
        Command::Vlan(command) => commands::vlan::run(&mut ctx, command).await,
        Command::Server(command) => commands::server::run(&mut ctx, command).await,
        Command::NatRule(command) => commands::nat_rule::run(&mut ctx, command).await,
        Command::Resource(command) => commands::resource::run(&mut ctx, command).await,
    };

    ctx.session.close_all().await;
    report_failure(&mut ctx.output, &result);

    let code = exit_code(&result, ctx.output.error_count());
    info!("'{}' finished: {:?}", name, code);
    code
}

fn report_failure(output: &mut Output, result: &cloudcontrol_core::Result<()>) {
    if let Err(err) = result
        && let Err(write_err) = output.error(err)
    {
        // stderr is gone; the log is all that is left
        error!("Failed to write error record: {}", write_err);
    }
}

async fn startup() -> anyhow::Result<(ConnectionSession, ResourceStatePoller)> {
    let poller = build_poller(&PollerConfig::default())?;
    let session = build_session().await?;
    Ok((session, poller))
}

fn build_poller(config: &PollerConfig) -> cloudcontrol_core::Result<ResourceStatePoller> {
    config.validate()?;
    Ok(ResourceStatePoller::new(config))
}

/// Session over the per-user protected profile store
async fn build_session() -> anyhow::Result<ConnectionSession> {
    let settings = Settings::from_env()?;
    debug!("Settings directory: {}", settings.settings_dir.display());

    let master_key = MasterKey::load_or_create(&settings.protection_key_file())
        .await
        .context("Failed to load the credential protection key")?;
    let protector = Arc::new(AesGcmProtector::for_connection_credentials(&master_key));
    let store = Arc::new(FileProfileStore::new(
        settings.connection_settings_file(),
        protector,
    ));

    let config = ClientConfig::default();
    config.validate()?;
    let factory = Arc::new(CloudControlClientFactory::new(config));

    Ok(ConnectionSession::new(store, factory))
}

/// Cancel `cancel` on SIGINT or SIGTERM
#[cfg(unix)]
async fn cancel_on_shutdown_signal(cancel: CancellationToken) {
    let (mut sigterm, mut sigint) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
        (Err(e), _) | (_, Err(e)) => {
            error!("Failed to set up signal handlers: {}", e);
            return;
        }
    };

    let received = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    info!("Received {}, cancelling", received);
    cancel.cancel();
}

/// Cancel `cancel` on Ctrl-C
#[cfg(not(unix))]
async fn cancel_on_shutdown_signal(cancel: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("Received Ctrl-C, cancelling");
            cancel.cancel();
        }
        Err(e) => error!("Failed to wait for Ctrl-C: {}", e),
    }
}
