//! Command implementations, one module per resource noun
//!
//! Every command runs as one sequential async flow against a [`Context`].
//! Errors that concern a single input item are reported through
//! [`Context::report`] and processing moves on; fatal errors end the command.

pub mod account;
pub mod connection;
pub mod nat_rule;
pub mod network_domain;
pub mod resource;
pub mod server;
pub mod vlan;

use clap::Args;
use cloudcontrol_core::model::{ApiResponse, PagedResult, Paging, Resource};
use cloudcontrol_core::{
    CancellationToken, CloudControlApi, ConnectionSession, Error, ResourceFetcher,
    ResourceStatePoller, Result, Target, resolve_target,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::input::read_records;
use crate::output::Output;

/// Everything a command needs to run
pub struct Context {
    pub session: ConnectionSession,

    /// Connection named on the command line; the default is used otherwise
    pub connection: Option<String>,

    pub poller: ResourceStatePoller,

    /// Cancelled on Ctrl-C
    pub cancel: CancellationToken,

    pub output: Output,
}

impl Context {
    /// Client for the selected connection
    pub async fn client(&self, command: &str) -> Result<Arc<dyn CloudControlApi>> {
        self.session
            .client(self.connection.as_deref(), command)
            .await
    }

    /// Pass a per-item result through, reporting it if it failed
    ///
    /// Non-fatal errors are written as error records and yield `Ok(None)`;
    /// fatal errors are returned so the command stops.
    pub fn report<T>(&mut self, result: Result<T>) -> Result<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(err) if !err.is_fatal() => {
                debug!("Continuing after non-fatal error: {}", err);
                self.output.error(&err)?;
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

/// How an existing resource is selected
#[derive(Args, Debug, Clone, Default)]
pub struct Selector {
    /// Resource id
    #[arg(long, conflicts_with_all = ["name", "input"])]
    pub id: Option<String>,

    /// Resource name
    #[arg(long, conflicts_with = "input")]
    pub name: Option<String>,

    /// Read resource records from a file, or `-` for stdin
    #[arg(long, value_name = "FILE")]
    pub input: Option<String>,
}

impl Selector {
    /// Whether no selection was made at all
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.name.is_none() && self.input.is_none()
    }

    /// Build the command's targets
    ///
    /// `parent` scopes a by-name lookup. `parameter_set` names the command
    /// for the error raised when nothing was selected.
    pub async fn targets<R: DeserializeOwned>(
        &self,
        parent: Option<&str>,
        parameter_set: &str,
    ) -> Result<Vec<Target<R>>> {
        match (&self.id, &self.name, &self.input) {
            (Some(id), None, None) => Ok(vec![Target::ById(id.clone())]),
            (None, Some(name), None) => Ok(vec![Target::ByName {
                name: name.clone(),
                parent: parent.map(str::to_string),
            }]),
            (None, None, Some(source)) => Ok(read_records(source)
                .await?
                .into_iter()
                .map(Target::ByObject)
                .collect()),
            _ => Err(Error::unrecognized_parameter_set(parameter_set)),
        }
    }
}

/// Paging options for listing commands
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct PageArgs {
    /// Return a single page of at most this many records
    #[arg(long)]
    pub first: Option<u32>,

    /// Skip this many records before the page returned by --first
    #[arg(long, requires = "first")]
    pub skip: Option<u32>,
}

/// Drives list requests page by page
///
/// With `--first` exactly one page is requested. Otherwise pages are followed
/// until the API reports the last one.
#[derive(Debug)]
pub struct Pager {
    next: Option<Option<Paging>>,
    follow: bool,
}

impl Pager {
    pub fn new(args: &PageArgs) -> Self {
        match args
            .first
            .and_then(|first| Paging::from_first_skip(first, args.skip.unwrap_or(0)))
        {
            Some(paging) => Self {
                next: Some(Some(paging)),
                follow: false,
            },
            None => Self {
                next: Some(None),
                follow: true,
            },
        }
    }

    /// Paging for the next request, or `None` when listing is done
    pub fn next_request(&mut self) -> Option<Option<Paging>> {
        self.next.take()
    }

    /// Record a received page
    pub fn advance<T>(&mut self, page: &PagedResult<T>) {
        if self.follow {
            self.next = page.next_page().map(Some);
        }
    }
}

/// Options for commands that can wait for a new resource to settle
#[derive(Args, Debug, Clone, Default)]
pub struct WaitArgs {
    /// Wait until the new resource reaches this state (e.g. NORMAL)
    #[arg(long, value_name = "STATE")]
    pub wait_for: Option<String>,

    /// How long to wait, in seconds
    #[arg(long, default_value_t = 1200)]
    pub timeout_secs: u64,
}

impl WaitArgs {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Id of a newly created resource, from the response's `info` list
pub(crate) fn created_id(response: &ApiResponse, key: &str) -> Result<String> {
    response
        .info_value(key)
        .map(str::to_string)
        .ok_or_else(|| {
            Error::api(
                response.response_code.clone(),
                format!(
                    "The response to {} did not include '{}'.",
                    response.operation, key
                ),
            )
        })
}

/// Resolve each target and write it as a record
pub(crate) async fn emit_targets<R, F>(
    ctx: &mut Context,
    fetcher: &F,
    targets: Vec<Target<R>>,
) -> Result<()>
where
    R: Resource,
    F: ResourceFetcher<R> + ?Sized,
{
    for target in targets {
        let resolved = resolve_target(fetcher, target, &ctx.cancel).await;
        if let Some(resource) = ctx.report(resolved)? {
            ctx.output.record(&resource)?;
        }
    }
    Ok(())
}

/// Id of the resource a target names
///
/// Only by-name targets need a remote lookup.
pub(crate) async fn target_id<R, F>(
    fetcher: &F,
    target: Target<R>,
    cancel: &CancellationToken,
) -> Result<String>
where
    R: Resource,
    F: ResourceFetcher<R> + ?Sized,
{
    match target {
        Target::ById(id) => Ok(id),
        Target::ByObject(resource) => Ok(resource.id().to_string()),
        by_name => Ok(resolve_target(fetcher, by_name, cancel)
            .await?
            .id()
            .to_string()),
    }
}
