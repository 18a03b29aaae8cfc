//! `cloudctl server`

use clap::Subcommand;
use cloudcontrol_core::Result;
use cloudcontrol_core::model::Server;

use super::{Context, PageArgs, Pager, Selector, emit_targets, target_id};

#[derive(Subcommand, Debug)]
pub enum ServerCommand {
    /// Show servers; lists them all when none is selected
    Get {
        #[command(flatten)]
        selector: Selector,

        /// Network domain to list, or to look a name up in
        #[arg(long)]
        network_domain: Option<String>,

        #[command(flatten)]
        page: PageArgs,
    },
    /// Delete servers
    Remove {
        #[command(flatten)]
        selector: Selector,

        /// Network domain to look a name up in
        #[arg(long)]
        network_domain: Option<String>,
    },
}

pub async fn run(ctx: &mut Context, command: ServerCommand) -> Result<()> {
    match command {
        ServerCommand::Get {
            selector,
            network_domain,
            page,
        } => {
            let client = ctx.client("server get").await?;

            if selector.is_empty() {
                let mut pager = Pager::new(&page);
                while let Some(paging) = pager.next_request() {
                    let result = client
                        .list_servers(network_domain.as_deref(), paging, &ctx.cancel)
                        .await?;
                    pager.advance(&result);
                    ctx.output.records(&result.items)?;
                }
                return Ok(());
            }

            let targets = selector
                .targets::<Server>(network_domain.as_deref(), "server get")
                .await?;
            emit_targets(ctx, &*client, targets).await
        }
        ServerCommand::Remove {
            selector,
            network_domain,
        } => {
            let client = ctx.client("server remove").await?;
            let targets = selector
                .targets::<Server>(network_domain.as_deref(), "server remove")
                .await?;

            for target in targets {
                let result = async {
                    let id = target_id(&*client, target, &ctx.cancel).await?;
                    client.delete_server(&id, &ctx.cancel).await
                }
                .await;

                if let Some(response) = ctx.report(result)? {
                    ctx.output.record(&response)?;
                }
            }
            Ok(())
        }
    }
}
