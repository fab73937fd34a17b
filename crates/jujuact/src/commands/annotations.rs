//! Service annotations handler.

use std::time::Duration;

use serde::Serialize;
use tabled::Tabled;

use jujuact_core::ActionClient;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Serialize)]
struct Annotation<'a> {
    service: &'a str,
    key: &'a str,
    value: &'a str,
}

#[derive(Tabled)]
struct AnnotationRow {
    #[tabled(rename = "Service")]
    service: String,
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
}

pub async fn handle(
    client: &ActionClient,
    services: &[String],
    global: &GlobalOpts,
    timeout: Duration,
) -> Result<(), CliError> {
    let annotations = util::timed(timeout, client.get_annotations(services)).await?;

    let entries: Vec<Annotation<'_>> = annotations
        .iter()
        .flat_map(|(service, pairs)| {
            pairs.iter().map(move |(key, value)| Annotation {
                service,
                key,
                value,
            })
        })
        .collect();

    let out = output::render_list(
        &global.output,
        &entries,
        |a| AnnotationRow {
            service: a.service.to_owned(),
            key: a.key.to_owned(),
            value: a.value.to_owned(),
        },
        |a| format!("{}={}", a.key, a.value),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
