//! Domain lookup and creation helpers built on [`DomainApi`].

use std::convert::Infallible;
use std::str::FromStr;

use camino::Utf8Path;
use serde_json::Value;
use tracing::info;

use super::errors::ApiError;
use super::payloads::Domain;
use super::{API_TARGET, DomainApi};

/// How a user refers to a domain on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainSelector {
    /// A numeric id, used as is.
    Id(u64),
    /// A name that must match exactly one domain.
    Name(String),
}

impl FromStr for DomainSelector {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(value
            .parse::<u64>()
            .map_or_else(|_| Self::Name(value.to_owned()), Self::Id))
    }
}

/// Resolves a selector to a domain id.
///
/// # Errors
///
/// Returns [`ApiError::UnknownDomain`] when no domain carries the name and
/// [`ApiError::AmbiguousDomain`] when several do.
pub fn resolve_domain(api: &dyn DomainApi, selector: &DomainSelector) -> Result<u64, ApiError> {
    let name = match selector {
        DomainSelector::Id(id) => return Ok(*id),
        DomainSelector::Name(name) => name,
    };
    let ids: Vec<u64> = api
        .domains()?
        .into_iter()
        .filter(|domain| &domain.name == name)
        .map(|domain| domain.id)
        .collect();
    match ids.as_slice() {
        [] => Err(ApiError::UnknownDomain { name: name.clone() }),
        [id] => Ok(*id),
        _ => Err(ApiError::AmbiguousDomain {
            name: name.clone(),
            ids,
        }),
    }
}

/// Appends a sentence pair to the domain named or numbered by `selector`.
pub fn append_to_domain(
    api: &dyn DomainApi,
    selector: &str,
    source: &str,
    target: &str,
) -> Result<Option<Value>, ApiError> {
    let Ok(parsed) = selector.parse::<DomainSelector>();
    let id = resolve_domain(api, &parsed)?;
    info!(target: API_TARGET, domain = id, "appending sentence pair");
    api.append_to_domain(id, source, target)
}

/// Creates a domain and imports `tmx` into it.
///
/// The domain name defaults to the file stem of `tmx`.
pub fn create_domain_from_tmx(
    api: &dyn DomainApi,
    tmx: &Utf8Path,
    name: Option<&str>,
) -> Result<Domain, ApiError> {
    let domain_name = name
        .or_else(|| tmx.file_stem())
        .ok_or_else(|| ApiError::InvalidDomainName {
            path: tmx.to_owned(),
        })?;
    let domain = api.create_domain(domain_name)?;
    info!(target: API_TARGET, domain = domain.id, name = domain_name, file = %tmx, "importing TMX");
    api.import_into_domain(domain.id, tmx)?;
    Ok(domain)
}
