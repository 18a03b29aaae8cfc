//! Command targets
//!
//! Commands that act on an existing resource accept it in one of three forms,
//! decided once when arguments are parsed.

use tokio_util::sync::CancellationToken;

use crate::model::Resource;
use crate::traits::ResourceFetcher;
use crate::{Error, Result};

/// How a command names the resource it acts on
#[derive(Debug, Clone, PartialEq)]
pub enum Target<T> {
    /// Resource id
    ById(String),

    /// Resource name, optionally scoped to a parent (datacenter or network domain id)
    ByName {
        name: String,
        parent: Option<String>,
    },

    /// A resource record supplied directly, e.g. the output of another command
    ByObject(T),
}

impl<T: Resource> Target<T> {
    /// Short description for log lines
    pub fn describe(&self) -> String {
        match self {
            Target::ById(id) => format!("{} '{}'", T::KIND, id),
            Target::ByName { name, parent: Some(parent) } => format!(
                "{} named '{}' in {} '{}'",
                T::KIND,
                name,
                T::KIND.parent_description(),
                parent
            ),
            Target::ByName { name, parent: None } => format!("{} named '{}'", T::KIND, name),
            Target::ByObject(resource) => format!("{} '{}'", T::KIND, resource.id()),
        }
    }
}

/// Turn a target into the resource it names
///
/// By-object targets are returned as given without a remote call.
pub async fn resolve_target<R, F>(
    fetcher: &F,
    target: Target<R>,
    cancel: &CancellationToken,
) -> Result<R>
where
    R: Resource,
    F: ResourceFetcher<R> + ?Sized,
{
    match target {
        Target::ById(id) => fetcher
            .fetch(&id, cancel)
            .await?
            .ok_or_else(|| Error::not_found_by_id(R::KIND, id)),
        Target::ByName { name, parent } => fetcher
            .fetch_by_name(&name, parent.as_deref(), cancel)
            .await?
            .ok_or_else(|| Error::not_found_by_name(R::KIND, name, parent.as_deref())),
        Target::ByObject(resource) => Ok(resource),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NatRule;
    use async_trait::async_trait;

    struct OneRule;

    fn rule(id: &str) -> NatRule {
        NatRule {
            id: id.to_string(),
            network_domain_id: "nd-1".to_string(),
            internal_ip: "10.0.0.5".to_string(),
            external_ip: "168.128.1.1".to_string(),
            create_time: None,
            state: "NORMAL".to_string(),
            datacenter_id: None,
        }
    }

    #[async_trait]
    impl ResourceFetcher<NatRule> for OneRule {
        async fn fetch(&self, id: &str, _cancel: &CancellationToken) -> Result<Option<NatRule>> {
            Ok((id == "r-1").then(|| rule(id)))
        }
    }

    #[tokio::test]
    async fn test_resolve_by_id() {
        let cancel = CancellationToken::new();
        let found = resolve_target(&OneRule, Target::ById("r-1".to_string()), &cancel)
            .await
            .unwrap();
        assert_eq!(found.id, "r-1");

        let err = resolve_target(&OneRule, Target::ById("r-2".to_string()), &cancel)
            .await
            .unwrap_err();
        assert_eq!(err.error_id(), "CloudControl.NatRule.NotFound");
    }

    #[tokio::test]
    async fn test_by_name_unsupported_for_nat_rules() {
        let target = Target::ByName {
            name: "x".to_string(),
            parent: None,
        };
        let err = resolve_target::<NatRule, _>(&OneRule, target, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnrecognizedParameterSet(_)));
    }

    #[tokio::test]
    async fn test_by_object_needs_no_fetch() {
        let resolved = resolve_target(&OneRule, Target::ByObject(rule("r-9")), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(resolved.id, "r-9");
    }

    #[test]
    fn test_describe() {
        let target: Target<NatRule> = Target::ById("r-1".to_string());
        assert_eq!(target.describe(), "NAT rule 'r-1'");
    }
}
