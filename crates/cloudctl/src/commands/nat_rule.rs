//! `cloudctl nat-rule`

use clap::Subcommand;
use cloudcontrol_core::model::NatRule;
use cloudcontrol_core::{Error, Result, Target};

use super::{Context, PageArgs, Pager, emit_targets};
use crate::input::read_records;

#[derive(Subcommand, Debug)]
pub enum NatRuleCommand {
    /// Show NAT rules by id, or list those in a network domain
    Get {
        /// NAT rule id
        #[arg(long, conflicts_with_all = ["network_domain", "input"])]
        id: Option<String>,

        /// Network domain whose rules to list
        #[arg(long, conflicts_with = "input")]
        network_domain: Option<String>,

        /// Read NAT rule records from a file, or `-` for stdin
        #[arg(long, value_name = "FILE")]
        input: Option<String>,

        #[command(flatten)]
        page: PageArgs,
    },
}

pub async fn run(ctx: &mut Context, command: NatRuleCommand) -> Result<()> {
    match command {
        NatRuleCommand::Get {
            id,
            network_domain,
            input,
            page,
        } => {
            let client = ctx.client("nat-rule get").await?;

            let targets: Vec<Target<NatRule>> = match (id, network_domain, input) {
                (Some(id), None, None) => vec![Target::ById(id)],
                (None, None, Some(source)) => read_records(&source)
                    .await?
                    .into_iter()
                    .map(Target::ByObject)
                    .collect(),
                (None, Some(network_domain), None) => {
                    let mut pager = Pager::new(&page);
                    while let Some(paging) = pager.next_request() {
                        let result = client
                            .list_nat_rules(&network_domain, paging, &ctx.cancel)
                            .await?;
                        pager.advance(&result);
                        ctx.output.records(&result.items)?;
                    }
                    return Ok(());
                }
                _ => return Err(Error::unrecognized_parameter_set("nat-rule get")),
            };

            emit_targets(ctx, &*client, targets).await
        }
    }
}
