//! `mmt domain create|import|append`.

use std::io::Write;

use mmt_cluster::RestClient;
use mmt_cluster::api::{DomainApi, DomainSelector, append_to_domain, resolve_domain};
use mmt_config::Config;

use crate::AppError;
use crate::cli::DomainAction;
use crate::output::CommandOutput;

pub(super) fn domain<W: Write, E: Write>(
    config: &Config,
    action: &DomainAction,
    output: &mut CommandOutput<W, E>,
) -> Result<(), AppError> {
    let client = RestClient::local(config.api_port())?;
    match action {
        DomainAction::Create { tmx, name } => {
            let created = client.create_domain_from_tmx(tmx, name.as_deref())?;
            output.stdout_line(format_args!(
                "Created domain '{}' with id {}; importing {tmx}",
                created.name, created.id
            ))?;
        }
        DomainAction::Import { domain, tmx } => {
            let Ok(selector) = domain.parse::<DomainSelector>();
            let id = resolve_domain(&client, &selector)?;
            client.import_into_domain(id, tmx)?;
            output.stdout_line(format_args!("Importing {tmx} into domain {id}"))?;
        }
        DomainAction::Append {
            domain,
            source,
            target,
        } => {
            append_to_domain(&client, domain, source, target)?;
            output.stdout_line(format_args!("Appended sentence pair to domain {domain}"))?;
        }
    }
    Ok(())
}
