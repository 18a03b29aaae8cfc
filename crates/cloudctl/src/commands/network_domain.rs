//! `cloudctl network-domain`

use clap::{Subcommand, ValueEnum};
use cloudcontrol_core::model::{NetworkDomain, NetworkDomainEdit, NetworkDomainType, NewNetworkDomain};
use cloudcontrol_core::Result;

use super::{
    Context, PageArgs, Pager, Selector, WaitArgs, created_id, emit_targets, target_id,
};

#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum DomainType {
    #[default]
    Essentials,
    Advanced,
}

impl From<DomainType> for NetworkDomainType {
    fn from(value: DomainType) -> Self {
        match value {
            DomainType::Essentials => NetworkDomainType::Essentials,
            DomainType::Advanced => NetworkDomainType::Advanced,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum NetworkDomainCommand {
    /// Show network domains; lists them all when none is selected
    Get {
        #[command(flatten)]
        selector: Selector,

        /// Datacenter to list, or to look a name up in
        #[arg(long)]
        datacenter: Option<String>,

        #[command(flatten)]
        page: PageArgs,
    },
    /// Deploy a network domain
    New {
        /// Datacenter to deploy into (e.g. AU9)
        #[arg(long)]
        datacenter: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        description: Option<String>,

        #[arg(long = "type", value_enum, default_value_t)]
        domain_type: DomainType,

        #[command(flatten)]
        wait: WaitArgs,
    },
    /// Change a network domain's name, description or type
    Edit {
        #[command(flatten)]
        selector: Selector,

        /// Datacenter to look a name up in
        #[arg(long)]
        datacenter: Option<String>,

        #[arg(long)]
        new_name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long = "type", value_enum)]
        domain_type: Option<DomainType>,
    },
    /// Delete network domains
    Remove {
        #[command(flatten)]
        selector: Selector,

        /// Datacenter to look a name up in
        #[arg(long)]
        datacenter: Option<String>,
    },
}

pub async fn run(ctx: &mut Context, command: NetworkDomainCommand) -> Result<()> {
    match command {
        NetworkDomainCommand::Get {
            selector,
            datacenter,
            page,
        } => {
            let client = ctx.client("network-domain get").await?;

            if selector.is_empty() {
                let mut pager = Pager::new(&page);
                while let Some(paging) = pager.next_request() {
                    let result = client
                        .list_network_domains(datacenter.as_deref(), paging, &ctx.cancel)
                        .await?;
                    pager.advance(&result);
                    ctx.output.records(&result.items)?;
                }
                return Ok(());
            }

            let targets = selector
                .targets::<NetworkDomain>(datacenter.as_deref(), "network-domain get")
                .await?;
            emit_targets(ctx, &*client, targets).await
        }
        NetworkDomainCommand::New {
            datacenter,
            name,
            description,
            domain_type,
            wait,
        } => {
            let client = ctx.client("network-domain new").await?;
            let request = NewNetworkDomain {
                datacenter_id: datacenter,
                name,
                description,
                domain_type: domain_type.into(),
            };

            let response = client.create_network_domain(&request, &ctx.cancel).await?;
            let Some(target_state) = wait.wait_for.as_deref() else {
                return ctx.output.record(&response);
            };

            let id = created_id(&response, "networkDomainId")?;
            let domain = ctx
                .poller
                .wait_for_state::<NetworkDomain, _>(
                    &*client,
                    &id,
                    target_state,
                    wait.timeout(),
                    &ctx.cancel,
                )
                .await?;
            ctx.output.record(&domain)
        }
        NetworkDomainCommand::Edit {
            selector,
            datacenter,
            new_name,
            description,
            domain_type,
        } => {
            let client = ctx.client("network-domain edit").await?;
            let targets = selector
                .targets::<NetworkDomain>(datacenter.as_deref(), "network-domain edit")
                .await?;

            for target in targets {
                let result = async {
                    let edit = NetworkDomainEdit {
                        id: target_id(&*client, target, &ctx.cancel).await?,
                        name: new_name.clone(),
                        description: description.clone(),
                        domain_type: domain_type.map(Into::into),
                    };
                    client.edit_network_domain(&edit, &ctx.cancel).await
                }
                .await;

                if let Some(response) = ctx.report(result)? {
                    ctx.output.record(&response)?;
                }
            }
            Ok(())
        }
        NetworkDomainCommand::Remove {
            selector,
            datacenter,
        } => {
            let client = ctx.client("network-domain remove").await?;
            let targets = selector
                .targets::<NetworkDomain>(datacenter.as_deref(), "network-domain remove")
                .await?;

            for target in targets {
                let result = async {
                    let id = target_id(&*client, target, &ctx.cancel).await?;
                    client.delete_network_domain(&id, &ctx.cancel).await
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
