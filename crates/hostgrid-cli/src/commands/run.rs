use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::info;

use hostgrid_core::HostgridConfig;
use hostgrid_lifecycle::{DriverHandle, LifecycleController, LifecycleDriver, TokioClock};

use crate::commands::fleet;
use crate::script::{self, ScriptCommand};

pub async fn run(fixture: &Path, config: &HostgridConfig) -> anyhow::Result<()> {
    let store = fleet::load_fixture(fixture)?;
    let controller =
        LifecycleController::from_config(store, Arc::new(TokioClock::new()), config)?;
    let driver = LifecycleDriver::new(controller);
    let handle = driver.handle();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let driver_task = tokio::spawn(driver.run(shutdown_rx));
    info!(
        delay_ms = config.lifecycle.transition_delay_ms,
        "reading lifecycle commands from stdin"
    );

    let stdin = BufReader::new(tokio::io::stdin());
    let report = run_script(&handle, stdin, &mut std::io::stdout(), &mut std::io::stderr()).await;

    info!("script finished, stopping lifecycle driver");
    // A send error means the driver task already ended; awaiting it reports why.
    let _ = shutdown_tx.send(true);
    driver_task.await?;

    let report = report?;
    info!(applied = report.applied, failed = report.failed, "script done");
    Ok(())
}

/// Counters for one script run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ScriptReport {
    pub applied: usize,
    pub failed: usize,
}

/// Execute script lines from `input` until EOF or `quit`.
///
/// Results go to `out`, failures to `err`. A failing line is reported and
/// the script carries on.
pub(crate) async fn run_script<R, O, E>(
    handle: &DriverHandle,
    input: R,
    out: &mut O,
    err: &mut E,
) -> anyhow::Result<ScriptReport>
where
    R: AsyncBufRead + Unpin,
    O: Write,
    E: Write,
{
    let mut report = ScriptReport::default();
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let command = match script::parse_line(&line) {
            Ok(Some(ScriptCommand::Quit)) => break,
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                writeln!(err, "✗ {}: {e:#}", line.trim())?;
                report.failed += 1;
                continue;
            }
        };

        match execute(handle, command).await {
            Ok(Some(output)) => writeln!(out, "{output}")?,
            Ok(None) => writeln!(out, "✓ {}", line.trim())?,
            Err(e) => {
                writeln!(err, "✗ {}: {e:#}", line.trim())?;
                report.failed += 1;
                continue;
            }
        }
        report.applied += 1;
    }
    Ok(report)
}

/// Apply one script command. Returns text to print for read commands.
pub(crate) async fn execute(
    handle: &DriverHandle,
    command: ScriptCommand,
) -> anyhow::Result<Option<String>> {
    match command {
        ScriptCommand::Start(id) => handle.start_deployment(&id).await?,
        ScriptCommand::Stop(id) => handle.stop_deployment(&id).await?,
        ScriptCommand::Restart(id) => handle.restart_deployment(&id).await?,
        ScriptCommand::Delete(id) => {
            handle.delete_deployment(&id).await?;
        }
        ScriptCommand::StartService {
            deployment,
            service,
        } => handle.start_service(&deployment, &service).await?,
        ScriptCommand::StopService {
            deployment,
            service,
        } => handle.stop_service(&deployment, &service).await?,
        ScriptCommand::Scale {
            deployment,
            service,
            replicas,
        } => handle.scale_service(&deployment, &service, replicas).await?,
        ScriptCommand::Wait(duration) => tokio::time::sleep(duration).await,
        ScriptCommand::Show(deployment) => {
            let rendered = handle
                .read(|c| fleet::render(c.store(), deployment.as_deref()))
                .await?;
            return Ok(Some(rendered));
        }
        ScriptCommand::Totals => {
            let value = handle.read(|c| fleet::totals_json(c.store())).await;
            return Ok(Some(serde_json::to_string_pretty(&value)?));
        }
        ScriptCommand::Quit => {}
    }
    Ok(None)
}
