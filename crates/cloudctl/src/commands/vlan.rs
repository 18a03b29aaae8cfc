//! `cloudctl vlan`

use clap::{Subcommand, ValueEnum};
use cloudcontrol_core::model::{Ipv4Network, NewVlan, Vlan, VlanEdit, VlanGatewayAddressing};
use cloudcontrol_core::{Error, Result, resolve_target};
use tracing::info;

use super::{
    Context, PageArgs, Pager, Selector, WaitArgs, created_id, emit_targets, target_id,
};

#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum GatewayAddressing {
    #[default]
    Low,
    High,
}

impl From<GatewayAddressing> for VlanGatewayAddressing {
    fn from(value: GatewayAddressing) -> Self {
        match value {
            GatewayAddressing::Low => VlanGatewayAddressing::Low,
            GatewayAddressing::High => VlanGatewayAddressing::High,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum VlanCommand {
    /// Show VLANs; lists them all when none is selected
    Get {
        #[command(flatten)]
        selector: Selector,

        /// Network domain to list, or to look a name up in
        #[arg(long)]
        network_domain: Option<String>,

        #[command(flatten)]
        page: PageArgs,
    },
    /// Deploy a VLAN
    New {
        /// Network domain id
        #[arg(long)]
        network_domain: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        description: Option<String>,

        /// Base address of the private IPv4 range
        #[arg(long)]
        base_address: String,

        #[arg(long, default_value_t = 24)]
        prefix_size: u8,

        /// Which end of the range holds the gateway
        #[arg(long, value_enum, default_value_t)]
        gateway: GatewayAddressing,

        #[command(flatten)]
        wait: WaitArgs,
    },
    /// Change a VLAN's name or description
    Edit {
        #[command(flatten)]
        selector: Selector,

        /// Network domain to look a name up in
        #[arg(long)]
        network_domain: Option<String>,

        #[arg(long)]
        new_name: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },
    /// Grow a VLAN's private IPv4 range
    Expand {
        #[command(flatten)]
        selector: Selector,

        /// Network domain to look a name up in
        #[arg(long)]
        network_domain: Option<String>,

        /// New prefix size; must be smaller than the current one
        #[arg(long)]
        prefix_size: u8,
    },
    /// Delete VLANs
    Remove {
        #[command(flatten)]
        selector: Selector,

        /// Network domain to look a name up in
        #[arg(long)]
        network_domain: Option<String>,
    },
}

/// Current and expanded networks for growing `vlan` to `prefix_size`
pub fn plan_expansion(vlan: &Vlan, prefix_size: u8) -> Result<(Ipv4Network, Ipv4Network)> {
    let range = &vlan.private_ipv4_range;
    let current = Ipv4Network::parse(&range.address, range.prefix_size)?;

    if prefix_size >= current.prefix_size() {
        return Err(Error::invalid_parameter(
            "prefix-size",
            format!(
                "The new prefix size ({}) must be smaller than the current prefix size of VLAN '{}' ({}).",
                prefix_size,
                vlan.name,
                current.prefix_size()
            ),
        ));
    }

    let expanded = current.with_prefix_size(prefix_size)?;
    Ok((current, expanded))
}

pub async fn run(ctx: &mut Context, command: VlanCommand) -> Result<()> {
    match command {
        VlanCommand::Get {
            selector,
            network_domain,
            page,
        } => {
            let client = ctx.client("vlan get").await?;

            if selector.is_empty() {
                let mut pager = Pager::new(&page);
                while let Some(paging) = pager.next_request() {
                    let result = client
                        .list_vlans(network_domain.as_deref(), paging, &ctx.cancel)
                        .await?;
                    pager.advance(&result);
                    ctx.output.records(&result.items)?;
                }
                return Ok(());
            }

            let targets = selector
                .targets::<Vlan>(network_domain.as_deref(), "vlan get")
                .await?;
            emit_targets(ctx, &*client, targets).await
        }
        VlanCommand::New {
            network_domain,
            name,
            description,
            base_address,
            prefix_size,
            gateway,
            wait,
        } => {
            // Reject a bad range before anything goes over the wire
            Ipv4Network::parse(&base_address, prefix_size)?;

            let client = ctx.client("vlan new").await?;
            let request = NewVlan {
                network_domain_id: network_domain,
                name,
                description,
                private_ipv4_base_address: base_address,
                private_ipv4_prefix_size: prefix_size,
                gateway_addressing: gateway.into(),
            };

            let response = client.create_vlan(&request, &ctx.cancel).await?;
            let Some(target_state) = wait.wait_for.as_deref() else {
                return ctx.output.record(&response);
            };

            let id = created_id(&response, "vlanId")?;
            let vlan = ctx
                .poller
                .wait_for_state::<Vlan, _>(&*client, &id, target_state, wait.timeout(), &ctx.cancel)
                .await?;
            ctx.output.record(&vlan)
        }
        VlanCommand::Edit {
            selector,
            network_domain,
            new_name,
            description,
        } => {
            let client = ctx.client("vlan edit").await?;
            let targets = selector
                .targets::<Vlan>(network_domain.as_deref(), "vlan edit")
                .await?;

            for target in targets {
                let result = async {
                    let edit = VlanEdit {
                        id: target_id(&*client, target, &ctx.cancel).await?,
                        name: new_name.clone(),
                        description: description.clone(),
                    };
                    client.edit_vlan(&edit, &ctx.cancel).await
                }
                .await;

                if let Some(response) = ctx.report(result)? {
                    ctx.output.record(&response)?;
                }
            }
            Ok(())
        }
        VlanCommand::Expand {
            selector,
            network_domain,
            prefix_size,
        } => {
            let client = ctx.client("vlan expand").await?;
            let targets = selector
                .targets::<Vlan>(network_domain.as_deref(), "vlan expand")
                .await?;

            for target in targets {
                let result = async {
                    let vlan = resolve_target(&*client, target, &ctx.cancel).await?;
                    let (current, expanded) = plan_expansion(&vlan, prefix_size)?;
                    info!(
                        "Expanding VLAN '{}' ({}) from {} to {}",
                        vlan.name, vlan.id, current, expanded
                    );
                    client.expand_vlan(&vlan.id, prefix_size, &ctx.cancel).await
                }
                .await;

                if let Some(response) = ctx.report(result)? {
                    ctx.output.record(&response)?;
                }
            }
            Ok(())
        }
        VlanCommand::Remove {
            selector,
            network_domain,
        } => {
            let client = ctx.client("vlan remove").await?;
            let targets = selector
                .targets::<Vlan>(network_domain.as_deref(), "vlan remove")
                .await?;

            for target in targets {
                let result = async {
                    let id = target_id(&*client, target, &ctx.cancel).await?;
                    client.delete_vlan(&id, &ctx.cancel).await
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
