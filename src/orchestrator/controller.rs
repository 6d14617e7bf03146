//! Live run watch.
//!
//! Polls the run while it is still moving, executes user commands, and
//! emits events for presentation layers.

use super::detail::{ActionOutcome, RunDetail, RunDetailController};
use crate::api::RunsApi;
use crate::error::{ApiError, ApiResult};
use crate::status::RunAction;
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::time::{Duration, MissedTickBehavior};

/// Commands emitted by UI layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UiCommand {
    Approve,
    Discard,
    Cancel,
    Refresh,
    Quit,
}

impl UiCommand {
    fn action(self) -> Option<RunAction> {
        match self {
            UiCommand::Approve => Some(RunAction::Approve),
            UiCommand::Discard => Some(RunAction::Discard),
            UiCommand::Cancel => Some(RunAction::Cancel),
            UiCommand::Refresh | UiCommand::Quit => None,
        }
    }
}

/// Events emitted by the controller to presentation layers.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ConsoleEvent {
    Loaded(Box<RunDetail>),
    Info(String),
    LoadFailed(String),
    ActionFailed(String),
    /// The server rejected the session token. The loop has stopped.
    SessionExpired,
}

enum Flow {
    Continue,
    Stop,
}

type ActionHandle = tokio::task::JoinHandle<ApiResult<ActionOutcome>>;

/// Drive one run detail view until `Quit`, the command channel closes, or
/// the session expires.
///
/// A run that cannot be loaded at all (bad id, no access) is an error. Once
/// it has loaded, later load failures are reported and polling goes on.
pub(crate) async fn run_controller<A: RunsApi + 'static>(
    detail: Arc<RunDetailController<A>>,
    poll_interval: Duration,
    event_tx: UnboundedSender<ConsoleEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut polling = match detail.load().await {
        Ok(Some(d)) => {
            let polling = !d.status().is_terminal();
            let _ = event_tx.send(ConsoleEvent::Loaded(Box::new(d)));
            polling
        }
        Ok(None) => {
            detail.close();
            return Ok(());
        }
        Err(e) if e.is_unauthorized() => {
            let _ = event_tx.send(ConsoleEvent::SessionExpired);
            detail.close();
            return Ok(());
        }
        Err(e) => {
            detail.close();
            return Err(anyhow::Error::new(e).context(format!("load run {}", detail.run_id())));
        }
    };

    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // First tick completes immediately; the initial load already happened.
    ticker.tick().await;

    let mut action: Option<ActionHandle> = None;

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Quit) | None => break,
                    Some(UiCommand::Refresh) => {
                        if let Flow::Stop = load_and_emit(&detail, &event_tx, &mut polling).await {
                            break;
                        }
                    }
                    Some(cmd) => {
                        let Some(run_action) = cmd.action() else { continue };
                        if action.is_some() {
                            let _ = event_tx.send(ConsoleEvent::ActionFailed(ApiError::Busy.user_message()));
                            continue;
                        }
                        let detail = detail.clone();
                        action = Some(tokio::spawn(async move { detail.perform(run_action).await }));
                    }
                }
            }
            // Keep the JoinHandle in place until this branch wins, so it is
            // never dropped by another branch being selected.
            done = async {
                match action.as_mut() {
                    Some(h) => h.await,
                    None => futures::future::pending().await,
                }
            } => {
                action = None;
                let flow = match done {
                    Ok(Ok(outcome)) => {
                        let _ = event_tx.send(ConsoleEvent::Info(outcome.message.to_string()));
                        if let Some(d) = outcome.detail {
                            polling = !d.status().is_terminal();
                            let _ = event_tx.send(ConsoleEvent::Loaded(Box::new(d)));
                        }
                        Flow::Continue
                    }
                    Ok(Err(e)) => report_failure(&event_tx, e, ConsoleEvent::ActionFailed),
                    Err(e) => {
                        let _ = event_tx.send(ConsoleEvent::ActionFailed(format!("Action task failed: {e}")));
                        Flow::Continue
                    }
                };
                if let Flow::Stop = flow {
                    break;
                }
            }
            _ = ticker.tick(), if polling => {
                if let Flow::Stop = load_and_emit(&detail, &event_tx, &mut polling).await {
                    break;
                }
            }
        }
    }

    detail.close();
    Ok(())
}

async fn load_and_emit<A: RunsApi>(
    detail: &RunDetailController<A>,
    event_tx: &UnboundedSender<ConsoleEvent>,
    polling: &mut bool,
) -> Flow {
    match detail.load().await {
        Ok(Some(d)) => {
            *polling = !d.status().is_terminal();
            if !*polling {
                tracing::debug!(run_id = detail.run_id(), status = %d.status(), "run finished, polling stopped");
            }
            let _ = event_tx.send(ConsoleEvent::Loaded(Box::new(d)));
            Flow::Continue
        }
        Ok(None) => Flow::Continue,
        Err(e) => report_failure(event_tx, e, ConsoleEvent::LoadFailed),
    }
}

fn report_failure(
    event_tx: &UnboundedSender<ConsoleEvent>,
    err: ApiError,
    wrap: fn(String) -> ConsoleEvent,
) -> Flow {
    if err.is_unauthorized() {
        let _ = event_tx.send(ConsoleEvent::SessionExpired);
        return Flow::Stop;
    }
    let _ = event_tx.send(wrap(err.user_message()));
    Flow::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::fake::FakeRunsApi;
    use crate::status::RunStatus;
    use tokio::sync::mpsc;

    struct Harness {
        api: Arc<FakeRunsApi>,
        cmd_tx: mpsc::UnboundedSender<UiCommand>,
        event_rx: mpsc::UnboundedReceiver<ConsoleEvent>,
        task: tokio::task::JoinHandle<Result<()>>,
    }

    fn start(status: RunStatus, poll: Duration) -> Harness {
        let api = Arc::new(FakeRunsApi::with_run("r-1", status));
        let detail = Arc::new(RunDetailController::new(api.clone(), "r-1"));
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_controller(detail, poll, event_tx, cmd_rx));
        Harness {
            api,
            cmd_tx,
            event_rx,
            task,
        }
    }

    async fn next_loaded(rx: &mut mpsc::UnboundedReceiver<ConsoleEvent>) -> RunDetail {
        loop {
            match rx.recv().await {
                Some(ConsoleEvent::Loaded(d)) => return *d,
                Some(_) => continue,
                None => panic!("controller stopped"),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn polls_until_terminal() {
        let mut h = start(RunStatus::Planning, Duration::from_secs(3));
        assert_eq!(next_loaded(&mut h.event_rx).await.status(), RunStatus::Planning);

        h.api.set_status("r-1", RunStatus::Errored);
        assert_eq!(next_loaded(&mut h.event_rx).await.status(), RunStatus::Errored);
        let calls = h.api.fetch_run_calls();

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(h.api.fetch_run_calls(), calls);

        h.cmd_tx.send(UiCommand::Quit).unwrap();
        h.task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn approve_emits_message_then_reloaded_detail() {
        let mut h = start(RunStatus::NeedsConfirmation, Duration::from_secs(60));
        next_loaded(&mut h.event_rx).await;

        h.cmd_tx.send(UiCommand::Approve).unwrap();
        assert_eq!(
            h.event_rx.recv().await,
            Some(ConsoleEvent::Info("Run approved! Applying...".into()))
        );
        assert_eq!(next_loaded(&mut h.event_rx).await.status(), RunStatus::Applying);

        h.cmd_tx.send(UiCommand::Quit).unwrap();
        h.task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn illegal_action_reports_failure_and_keeps_running() {
        let mut h = start(RunStatus::Applied, Duration::from_secs(60));
        next_loaded(&mut h.event_rx).await;

        h.cmd_tx.send(UiCommand::Cancel).unwrap();
        match h.event_rx.recv().await {
            Some(ConsoleEvent::ActionFailed(msg)) => assert!(msg.contains("cancel")),
            other => panic!("unexpected: {other:?}"),
        }
        h.cmd_tx.send(UiCommand::Refresh).unwrap();
        next_loaded(&mut h.event_rx).await;
        assert!(h.api.actions().is_empty());

        drop(h.cmd_tx);
        h.task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn missing_run_ends_the_watch() {
        let api = Arc::new(FakeRunsApi::default());
        let detail = Arc::new(RunDetailController::new(api.clone(), "r-404"));
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (_cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_controller(detail, Duration::from_secs(3), event_tx, cmd_rx));

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(task.is_finished());
        let err = task.await.unwrap().unwrap_err();
        let api_err = err.downcast_ref::<ApiError>().unwrap();
        assert_eq!(api_err.status(), Some(reqwest::StatusCode::NOT_FOUND));
        assert_eq!(api.fetch_run_calls(), 1);
        assert_eq!(event_rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn later_load_failures_keep_polling() {
        let mut h = start(RunStatus::Planning, Duration::from_secs(3));
        next_loaded(&mut h.event_rx).await;

        h.api.remove_run("r-1");
        match h.event_rx.recv().await {
            Some(ConsoleEvent::LoadFailed(msg)) => assert_eq!(msg, "Run not found"),
            other => panic!("unexpected: {other:?}"),
        }
        h.api.put_run(crate::model::fixtures::run("r-1", RunStatus::Planned));
        assert_eq!(next_loaded(&mut h.event_rx).await.status(), RunStatus::Planned);

        h.cmd_tx.send(UiCommand::Quit).unwrap();
        h.task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn unauthorized_stops_with_session_expired() {
        let mut h = start(RunStatus::Planning, Duration::from_secs(60));
        next_loaded(&mut h.event_rx).await;

        h.api.expire_session();
        h.cmd_tx.send(UiCommand::Refresh).unwrap();
        assert_eq!(h.event_rx.recv().await, Some(ConsoleEvent::SessionExpired));
        h.task.await.unwrap().unwrap();
        assert_eq!(h.event_rx.recv().await, None);
    }
}
