//! Action lifecycle handlers: run, show, wait, cancel, list.

use std::time::Duration;

use serde_json::{Map, Value};
use tabled::Tabled;

use jujuact_core::model::receiver_tag;
use jujuact_core::{ActionClient, ActionRecord, ActionResult, ActionStatus, ActionTag};

use crate::cli::{GlobalOpts, RunArgs, WaitArgs};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct ActionRow {
    #[tabled(rename = "Receiver")]
    receiver: String,
    #[tabled(rename = "Tag")]
    tag: String,
    #[tabled(rename = "Action")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Enqueued")]
    enqueued: String,
    #[tabled(rename = "Message")]
    message: String,
}

impl ActionRow {
    fn new(record: &ActionRecord, color: bool) -> Self {
        Self {
            receiver: record.receiver().to_owned(),
            tag: record.tag.to_string(),
            name: record.name().to_owned(),
            status: output::paint_status(record.status, color),
            enqueued: record
                .enqueued()
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
            message: record.message().to_owned(),
        }
    }
}

#[derive(Tabled)]
struct CancelRow {
    #[tabled(rename = "Tag")]
    tag: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Error")]
    error: String,
}

impl From<&ActionResult> for CancelRow {
    fn from(r: &ActionResult) -> Self {
        Self {
            tag: r.action.as_ref().map(|a| a.tag.clone()).unwrap_or_default(),
            status: r.status.clone(),
            error: r.error.as_ref().map(|e| e.message.clone()).unwrap_or_default(),
        }
    }
}

fn detail(record: &ActionRecord, color: bool) -> String {
    let mut pairs = vec![
        ("Tag", record.tag.to_string()),
        ("Action", record.name().to_owned()),
        ("Receiver", record.receiver().to_owned()),
        ("Status", output::paint_status(record.status, color)),
    ];
    if record.raw_status() != record.status.as_ref() {
        pairs.push(("Reported", record.raw_status().to_owned()));
    }
    if let Some(enqueued) = record.enqueued() {
        pairs.push(("Enqueued", enqueued.to_rfc3339()));
    }
    if let Some(elapsed) = record.elapsed() {
        pairs.push(("Elapsed", format!("{}s", elapsed.num_seconds())));
    }
    if !record.message().is_empty() {
        pairs.push(("Message", record.message().to_owned()));
    }
    if !record.output().is_empty() {
        pairs.push(("Output", util::join_pairs(record.output())));
    }
    output::detail_lines(&pairs)
}

fn print_record(record: &ActionRecord, global: &GlobalOpts) {
    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        record,
        |r| detail(r, color),
        |r| r.tag.to_string(),
    );
    output::print_output(&out, global.quiet);
}

fn not_found(tag: &ActionTag) -> CliError {
    CliError::NotFound {
        resource_type: "action".into(),
        identifier: tag.to_string(),
        list_command: "list".into(),
    }
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn run(
    client: &ActionClient,
    args: RunArgs,
    global: &GlobalOpts,
    timeout: Duration,
) -> Result<(), CliError> {
    let receivers: Vec<String> = args.receivers.iter().map(|r| receiver_tag(r)).collect();
    let pairs = args.params.iter().map(|(k, v)| (k.as_str(), v.as_str()));

    let params = match args.service {
        Some(ref service) => {
            let specs =
                util::timed(timeout, client.get_action_specs(Some(service.as_str()))).await?;
            let spec = specs
                .get(service)
                .and_then(|actions| actions.get(&args.action))
                .ok_or_else(|| CliError::NotFound {
                    resource_type: "action".into(),
                    identifier: format!("{service}:{}", args.action),
                    list_command: format!("specs --service {service}"),
                })?;
            spec.coerce_params(pairs)?
        }
        None => pairs
            .map(|(k, v)| (k.to_owned(), Value::String(v.to_owned())))
            .collect::<Map<_, _>>(),
    };

    let record = util::timed(
        timeout,
        client.enqueue_action(&args.action, &receivers, params),
    )
    .await?;

    if args.wait {
        if !global.quiet {
            eprintln!("Queued {}; waiting...", record.tag);
        }
        let tag = record.tag.clone();
        return wait_until_done(client, &tag, args.interval, global, timeout).await;
    }

    print_record(&record, global);
    Ok(())
}

pub async fn show(
    client: &ActionClient,
    tag: &str,
    global: &GlobalOpts,
    timeout: Duration,
) -> Result<(), CliError> {
    let tag = ActionTag::new(tag);
    let record = util::timed(timeout, client.find_action(&tag))
        .await?
        .ok_or_else(|| not_found(&tag))?;
    print_record(&record, global);
    Ok(())
}

pub async fn wait(
    client: &ActionClient,
    args: WaitArgs,
    global: &GlobalOpts,
    timeout: Duration,
) -> Result<(), CliError> {
    let tag = ActionTag::new(&args.tag);
    wait_until_done(client, &tag, args.interval, global, timeout).await
}

/// Poll until the action reaches a terminal state, then print it.
/// A failed action is an error.
async fn wait_until_done(
    client: &ActionClient,
    tag: &ActionTag,
    interval: u64,
    global: &GlobalOpts,
    timeout: Duration,
) -> Result<(), CliError> {
    let interval = Duration::from_secs(interval.max(1));
    loop {
        match util::timed(timeout, client.find_action(tag)).await? {
            Some(record) if record.status.is_terminal() => {
                print_record(&record, global);
                if record.status == ActionStatus::Failed {
                    return Err(CliError::ActionFailed {
                        tag: tag.to_string(),
                        message: if record.message().is_empty() {
                            record.raw_status().to_owned()
                        } else {
                            record.message().to_owned()
                        },
                    });
                }
                return Ok(());
            }
            Some(record) => {
                tracing::debug!(tag = %tag, status = record.raw_status(), "action still pending");
            }
            None => tracing::debug!(tag = %tag, "action not visible in status yet"),
        }
        tokio::time::sleep(interval).await;
    }
}

pub async fn cancel(
    client: &ActionClient,
    tag: &str,
    global: &GlobalOpts,
    timeout: Duration,
) -> Result<(), CliError> {
    let tag = ActionTag::new(tag);
    if !util::confirm(&format!("Cancel action {tag}?"), "cancel", global.yes)? {
        return Ok(());
    }

    let results = util::timed(timeout, client.cancel_action(&tag)).await?;

    let out = output::render_list(
        &global.output,
        &results,
        |r| CancelRow::from(r),
        |r| r.status.clone(),
    );
    output::print_output(&out, global.quiet);

    match results.iter().find_map(|r| r.error.as_ref()) {
        Some(err) if !err.message.is_empty() => Err(CliError::Rpc {
            message: err.message.clone(),
            code: Some(err.code.clone()).filter(|c| !c.is_empty()),
        }),
        _ => Ok(()),
    }
}

pub async fn list(
    client: &ActionClient,
    service: Option<String>,
    global: &GlobalOpts,
    timeout: Duration,
) -> Result<(), CliError> {
    let listed = util::timed(timeout, client.list_actions(service.as_deref())).await?;

    for entry in &listed {
        if let Some(ref err) = entry.error {
            tracing::warn!(
                receiver = %entry.receiver,
                error = %err,
                "controller could not list actions"
            );
        }
    }

    let records: Vec<&ActionRecord> = listed.iter().flat_map(|entry| &entry.actions).collect();
    let color = output::should_color(&global.color);

    let out = output::render_list(
        &global.output,
        &records,
        |r| ActionRow::new(r, color),
        |r| r.tag.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
