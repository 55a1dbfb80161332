//! `devtrail record` command implementation.

use anyhow::Result;
use devtrail_core::DevtrailConfig;
use devtrail_logger::{DispatchOutcome, ErrorInfo, Logger};

/// Arguments of one `record` invocation.
#[derive(Debug, Clone)]
pub struct RecordArgs {
    pub actor: String,
    pub action: String,
    pub model: String,
    pub method: String,
    pub result: String,
    /// Fault kind and message to attach.
    pub error: Option<(String, String)>,
    pub detach: bool,
}

pub async fn run(config: &DevtrailConfig, args: RecordArgs) -> Result<()> {
    let logger = Logger::from_config(config)?;
    let outcome = dispatch(&logger, args).await;

    match outcome {
        Some(outcome) => println!("{}", describe(outcome)),
        None => println!("dispatched in background"),
    }
    Ok(())
}

/// Dispatch the event. Detached dispatches are awaited before returning so
/// the process does not exit under them; they report no outcome.
async fn dispatch(logger: &Logger, args: RecordArgs) -> Option<DispatchOutcome> {
    let error = args
        .error
        .map(|(kind, message)| ErrorInfo::new(kind, message));

    if args.detach {
        logger.record_event_detached(
            &args.actor,
            &args.action,
            &args.model,
            &args.method,
            &args.result,
            error,
        );
        logger.wait_idle().await;
        None
    } else {
        Some(
            logger
                .record_event(
                    &args.actor,
                    &args.action,
                    &args.model,
                    &args.method,
                    &args.result,
                    error,
                )
                .await,
        )
    }
}

fn describe(outcome: DispatchOutcome) -> &'static str {
    match outcome {
        DispatchOutcome::Persisted => "recorded",
        DispatchOutcome::Rejected => "rejected: actor is not authorized",
        DispatchOutcome::Recovered => "failed to record; stored an error record instead",
        DispatchOutcome::Dropped => "failed to record; nothing was stored",
    }
}
