//! `cloudctl resource`: operations shared by every resource kind

use clap::{Subcommand, ValueEnum};
use cloudcontrol_core::Result;
use cloudcontrol_core::model::{NetworkDomain, Server, Vlan};
use std::time::Duration;

use super::Context;

/// Resource kinds that can be waited on
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum WaitKind {
    NetworkDomain,
    Vlan,
    Server,
}

#[derive(Subcommand, Debug)]
pub enum ResourceCommand {
    /// Wait until a resource reaches a state
    Wait {
        #[arg(long, value_enum)]
        kind: WaitKind,

        /// Resource id
        #[arg(long)]
        id: String,

        /// State to wait for (case-sensitive, e.g. NORMAL)
        #[arg(long)]
        state: String,

        #[arg(long, default_value_t = 1200)]
        timeout_secs: u64,
    },
}

pub async fn run(ctx: &mut Context, command: ResourceCommand) -> Result<()> {
    match command {
        ResourceCommand::Wait {
            kind,
            id,
            state,
            timeout_secs,
        } => {
            let client = ctx.client("resource wait").await?;
            let timeout = Duration::from_secs(timeout_secs);
            let poller = &ctx.poller;

            match kind {
                WaitKind::NetworkDomain => {
                    let domain = poller
                        .wait_for_state::<NetworkDomain, _>(&*client, &id, &state, timeout, &ctx.cancel)
                        .await?;
                    ctx.output.record(&domain)
                }
                WaitKind::Vlan => {
                    let vlan = poller
                        .wait_for_state::<Vlan, _>(&*client, &id, &state, timeout, &ctx.cancel)
                        .await?;
                    ctx.output.record(&vlan)
                }
                WaitKind::Server => {
                    let server = poller
                        .wait_for_state::<Server, _>(&*client, &id, &state, timeout, &ctx.cancel)
                        .await?;
                    ctx.output.record(&server)
                }
            }
        }
    }
}
