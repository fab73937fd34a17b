//! Command dispatch: bridges CLI args -> ActionClient calls -> output formatting.

pub mod actions;
pub mod annotations;
pub mod config_cmd;
pub mod specs;
pub mod status;
pub mod util;

use std::time::Duration;

use jujuact_core::ActionClient;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a controller-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    client: &ActionClient,
    global: &GlobalOpts,
    timeout: Duration,
) -> Result<(), CliError> {
    match cmd {
        Command::Status => status::status(client, global, timeout).await,
        Command::Units { service } => status::units(client, service, global, timeout).await,
        Command::Specs { service } => specs::handle(client, service, global, timeout).await,
        Command::Run(args) => actions::run(client, args, global, timeout).await,
        Command::Show { tag } => actions::show(client, &tag, global, timeout).await,
        Command::Wait(args) => actions::wait(client, args, global, timeout).await,
        Command::Cancel { tag } => actions::cancel(client, &tag, global, timeout).await,
        Command::List { service } => actions::list(client, service, global, timeout).await,
        Command::Annotations { services } => {
            annotations::handle(client, &services, global, timeout).await
        }
        // Handled before a connection is opened.
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "config and completions do not use a controller connection".into(),
        )),
    }
}
