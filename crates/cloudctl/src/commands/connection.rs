//! `cloudctl connection`: manage stored connection profiles

use clap::Subcommand;
use cloudcontrol_core::{ConnectionProfile, Error, Result};
use serde::Serialize;
use tracing::info;

use super::Context;

#[derive(Subcommand, Debug)]
pub enum ConnectionCommand {
    /// Add a connection profile
    New {
        /// Connection name
        #[arg(long)]
        name: String,

        /// Region identifier (e.g. AU, NA, EU)
        #[arg(long)]
        region: String,

        /// User name
        #[arg(long)]
        user: String,

        /// Password
        #[arg(long, env = "CLOUDCTL_PASSWORD", hide_env_values = true)]
        password: String,

        /// Make this the default connection
        #[arg(long)]
        default: bool,
    },
    /// Show connection profiles
    Get {
        /// Show only this connection
        #[arg(long)]
        name: Option<String>,
    },
    /// Remove a connection profile
    Remove {
        #[arg(long)]
        name: String,
    },
    /// Close a connection's client, keeping its profile
    Close {
        #[arg(long)]
        name: String,
    },
    /// Make a connection the default
    SetDefault {
        #[arg(long)]
        name: String,
    },
}

/// A connection profile as shown to users; never includes the password
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRecord {
    pub name: String,
    pub region: String,
    pub user_name: String,
    pub is_default: bool,
}

impl From<&ConnectionProfile> for ConnectionRecord {
    fn from(profile: &ConnectionProfile) -> Self {
        Self {
            name: profile.name.clone(),
            region: profile.region.clone(),
            user_name: profile.user_name.clone(),
            is_default: profile.is_default,
        }
    }
}

pub async fn run(ctx: &mut Context, command: ConnectionCommand) -> Result<()> {
    match command {
        ConnectionCommand::New {
            name,
            region,
            user,
            password,
            default,
        } => {
            let profile = ConnectionProfile::new(name, region, user, password);
            let added = ctx.session.add_connection(profile, default).await?;
            ctx.output.record(&ConnectionRecord::from(&added))
        }
        ConnectionCommand::Get { name: Some(name) } => {
            let profile = ctx
                .session
                .connection(&name)
                .await?
                .ok_or(Error::ConnectionDoesNotExist(name))?;
            ctx.output.record(&ConnectionRecord::from(&profile))
        }
        ConnectionCommand::Get { name: None } => {
            let records: Vec<ConnectionRecord> = ctx
                .session
                .connections()
                .await?
                .iter()
                .map(ConnectionRecord::from)
                .collect();
            ctx.output.records(&records)
        }
        ConnectionCommand::Remove { name } => {
            let removed = ctx.session.remove_connection(&name).await?;
            ctx.output.record(&ConnectionRecord::from(&removed))
        }
        ConnectionCommand::Close { name } => {
            if ctx.session.connection(&name).await?.is_none() {
                return Err(Error::ConnectionDoesNotExist(name));
            }
            if !ctx.session.close_connection(&name).await {
                info!("Connection '{}' has no open client", name);
            }
            Ok(())
        }
        ConnectionCommand::SetDefault { name } => {
            ctx.session.set_default_connection(&name).await?;
            match ctx.session.connection(&name).await? {
                Some(profile) => ctx.output.record(&ConnectionRecord::from(&profile)),
                None => Err(Error::ConnectionDoesNotExist(name)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::context;

    fn new_connection(name: &str, default: bool) -> ConnectionCommand {
        ConnectionCommand::New {
            name: name.to_string(),
            region: "AU".to_string(),
            user: format!("{}-user", name),
            password: "secret".to_string(),
            default,
        }
    }

    #[tokio::test]
    async fn test_first_connection_becomes_default() {
        let (mut ctx, records, _errors) = context();

        run(&mut ctx, new_connection("prod", false)).await.unwrap();
        run(&mut ctx, new_connection("dev", false)).await.unwrap();

        let lines = records.lines();
        assert_eq!(lines[0]["name"], "prod");
        assert_eq!(lines[0]["isDefault"], true);
        assert_eq!(lines[1]["isDefault"], false);
        assert!(lines.iter().all(|line| line.get("password").is_none()));
    }

    #[tokio::test]
    async fn test_set_default_moves_the_flag() {
        let (mut ctx, records, _errors) = context();
        run(&mut ctx, new_connection("prod", false)).await.unwrap();
        run(&mut ctx, new_connection("dev", false)).await.unwrap();

        run(&mut ctx, ConnectionCommand::SetDefault { name: "dev".to_string() })
            .await
            .unwrap();
        run(&mut ctx, ConnectionCommand::Get { name: None }).await.unwrap();

        let listed: Vec<_> = records.lines().into_iter().skip(3).collect();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0]["name"], "dev");
        assert_eq!(listed[0]["isDefault"], true);
        assert_eq!(listed[1]["name"], "prod");
        assert_eq!(listed[1]["isDefault"], false);
    }

    #[tokio::test]
    async fn test_duplicate_name_is_rejected() {
        let (mut ctx, _records, _errors) = context();
        run(&mut ctx, new_connection("prod", false)).await.unwrap();

        let err = run(&mut ctx, new_connection("prod", true)).await.unwrap_err();
        assert_eq!(err.error_id(), "CloudControl.Connection.Exists");
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn test_unknown_connection() {
        let (mut ctx, _records, _errors) = context();

        for command in [
            ConnectionCommand::Get { name: Some("nope".to_string()) },
            ConnectionCommand::Remove { name: "nope".to_string() },
            ConnectionCommand::Close { name: "nope".to_string() },
            ConnectionCommand::SetDefault { name: "nope".to_string() },
        ] {
            let err = run(&mut ctx, command).await.unwrap_err();
            assert_eq!(err.error_id(), "CloudControl.Connection.DoesNotExist");
        }
    }

    #[tokio::test]
    async fn test_remove_reports_the_removed_profile() {
        let (mut ctx, records, _errors) = context();
        run(&mut ctx, new_connection("prod", false)).await.unwrap();

        run(&mut ctx, ConnectionCommand::Remove { name: "prod".to_string() })
            .await
            .unwrap();

        assert_eq!(records.lines()[1]["name"], "prod");
        assert!(ctx.session.connections().await.unwrap().is_empty());
    }
}
