//! `cloudctl account`

use clap::Subcommand;
use cloudcontrol_core::Result;

use super::Context;

#[derive(Subcommand, Debug)]
pub enum AccountCommand {
    /// Show the account the connection authenticates as
    Get,
}

pub async fn run(ctx: &mut Context, command: AccountCommand) -> Result<()> {
    match command {
        AccountCommand::Get => {
            let client = ctx.client("account get").await?;
            let account = client.get_account(&ctx.cancel).await?;
            ctx.output.record(&account)
        }
    }
}
