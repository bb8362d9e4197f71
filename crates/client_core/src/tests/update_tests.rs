use super::*;

use crate::{
    test_support::{shared_state, RecordingProcess, ScriptedUpdater},
    view::NoticeKind,
};

struct FixedPrompt(UpdateDecision);

#[async_trait]
impl UpdatePrompt for FixedPrompt {
    async fn decide(&self, _info: &UpdateInfo) -> Result<UpdateDecision> {
        Ok(self.0)
    }
}

struct BrokenPrompt;

#[async_trait]
impl UpdatePrompt for BrokenPrompt {
    async fn decide(&self, _info: &UpdateInfo) -> Result<UpdateDecision> {
        Err(anyhow!("dialog surface crashed"))
    }
}

fn manager(
    updater: Option<Arc<ScriptedUpdater>>,
    prompt: Option<Arc<dyn UpdatePrompt>>,
    process: Arc<RecordingProcess>,
    state: SharedState,
) -> Arc<UpdateManager> {
    Arc::new(UpdateManager::new(
        updater.map(|updater| updater as Arc<dyn Updater>),
        prompt,
        process,
        state,
        Duration::from_millis(1500),
    ))
}

#[test]
fn percent_follows_known_total() {
    let mut progress = DownloadProgress::default();
    progress.start(Some(1000));
    progress.advance(250);
    assert_eq!(progress.percent(), Some(25));
    progress.advance(250);
    assert_eq!(progress.percent(), Some(50));
    progress.advance(10_000);
    assert_eq!(progress.percent(), Some(100));
}

#[test]
fn percent_rounds_half_up() {
    let mut progress = DownloadProgress::default();
    progress.start(Some(200));
    progress.advance(1);
    assert_eq!(progress.percent(), Some(1));
    progress.start(Some(3));
    assert_eq!(progress.percent(), Some(33));
}

#[test]
fn unknown_total_holds_the_floor() {
    for content_length in [None, Some(0)] {
        let mut progress = DownloadProgress::default();
        progress.start(content_length);
        progress.advance(4096);
        progress.advance(4096);
        assert_eq!(progress.percent(), None);
        assert_eq!(progress.display_percent(), DOWNLOAD_PERCENT_FLOOR);
        assert_eq!(progress.downloaded_bytes(), 8192);
    }
}

#[test]
fn release_notes_default_when_missing() {
    let info = UpdateInfo::from_check(UpdateCheck::available("1.4.0", None)).expect("info");
    assert_eq!(info.version, "1.4.0");
    assert_eq!(info.release_notes, DEFAULT_RELEASE_NOTES);
    assert!(UpdateInfo::from_check(UpdateCheck::none()).is_none());
}

#[tokio::test(start_paused = true)]
async fn missing_updater_stays_idle() {
    let process = Arc::new(RecordingProcess::default());
    let manager = manager(None, None, process.clone(), shared_state());

    assert_eq!(manager.run().await, UpdateOutcome::Unavailable);
    assert_eq!(manager.phase().await, UpdatePhase::Idle);
    assert!(process.exits().is_empty());
}

#[tokio::test(start_paused = true)]
async fn no_update_returns_to_idle() {
    let updater = Arc::new(ScriptedUpdater::up_to_date());
    let state = shared_state();
    let manager = manager(
        Some(updater.clone()),
        None,
        Arc::new(RecordingProcess::default()),
        state.clone(),
    );

    assert_eq!(manager.run().await, UpdateOutcome::UpToDate);
    assert_eq!(manager.phase().await, UpdatePhase::Idle);
    assert_eq!(updater.downloads(), 0);
    assert_eq!(state.lock().await.view.update, UpdateOverlay::Hidden);
}

#[tokio::test(start_paused = true)]
async fn declining_never_downloads() {
    let updater = Arc::new(ScriptedUpdater::offering("2.0.0", Some("Nuevo motor de fusión")));
    let state = shared_state();
    let process = Arc::new(RecordingProcess::default());
    let manager = manager(
        Some(updater.clone()),
        Some(Arc::new(FixedPrompt(UpdateDecision::Later))),
        process.clone(),
        state.clone(),
    );

    assert_eq!(manager.run().await, UpdateOutcome::Declined);
    assert_eq!(manager.phase().await, UpdatePhase::Idle);
    assert_eq!(updater.downloads(), 0);
    assert!(process.exits().is_empty());
    assert_eq!(state.lock().await.view.update, UpdateOverlay::Hidden);
}

#[tokio::test(start_paused = true)]
async fn prompt_shows_version_and_notes_until_answered() {
    let updater = Arc::new(ScriptedUpdater::offering("2.1.0", None));
    let state = shared_state();
    let (prompt, handle) = ChannelPrompt::new();
    let manager = manager(
        Some(updater.clone()),
        Some(Arc::new(prompt)),
        Arc::new(RecordingProcess::default()),
        state.clone(),
    );

    let running = tokio::spawn({
        let manager = manager.clone();
        async move { manager.run().await }
    });
    time::sleep(Duration::from_secs(60)).await;

    assert_eq!(manager.phase().await, UpdatePhase::AwaitingUserDecision);
    assert_eq!(
        state.lock().await.view.update,
        UpdateOverlay::Question {
            version: "2.1.0".to_string(),
            notes: DEFAULT_RELEASE_NOTES.to_string(),
        }
    );
    assert_eq!(manager.run().await, UpdateOutcome::Busy);
    assert_eq!(updater.checks(), 1);

    assert!(handle.answer(UpdateDecision::Later).await);
    assert_eq!(running.await.expect("run"), UpdateOutcome::Declined);
}

#[tokio::test(start_paused = true)]
async fn accepted_update_downloads_installs_and_exits() {
    let updater = Arc::new(ScriptedUpdater::offering("2.0.0", None));
    let state = shared_state();
    let process = Arc::new(RecordingProcess::default());
    let (prompt, handle) = ChannelPrompt::new();
    let manager = manager(
        Some(updater.clone()),
        Some(Arc::new(prompt)),
        process.clone(),
        state.clone(),
    );

    let running = tokio::spawn({
        let manager = manager.clone();
        async move { manager.run().await }
    });
    assert!(handle.answer(UpdateDecision::Accept).await);

    time::sleep(Duration::from_millis(25)).await;
    assert_eq!(manager.phase().await, UpdatePhase::Downloading);
    assert_eq!(
        state.lock().await.view.update,
        UpdateOverlay::Download {
            percent: 25,
            status: DOWNLOADING_STATUS.to_string(),
        }
    );

    time::sleep(Duration::from_millis(40)).await;
    assert_eq!(manager.phase().await, UpdatePhase::Installing);
    assert_eq!(
        state.lock().await.view.update,
        UpdateOverlay::Download {
            percent: 100,
            status: INSTALLING_STATUS.to_string(),
        }
    );
    assert!(process.exits().is_empty(), "exit must wait for the restart delay");

    assert_eq!(running.await.expect("run"), UpdateOutcome::Restarting);
    assert_eq!(process.exits(), [0]);
    assert_eq!(manager.phase().await, UpdatePhase::Exiting);
}

#[tokio::test(start_paused = true)]
async fn no_prompt_surface_accepts_immediately() {
    let updater = Arc::new(ScriptedUpdater::offering("3.0.0", None));
    let process = Arc::new(RecordingProcess::default());
    let manager = manager(Some(updater.clone()), None, process.clone(), shared_state());

    assert_eq!(manager.run().await, UpdateOutcome::Restarting);
    assert_eq!(updater.downloads(), 1);
    assert_eq!(process.exits(), [0]);
}

#[tokio::test(start_paused = true)]
async fn unknown_size_download_keeps_floor_percent() {
    let updater = Arc::new(ScriptedUpdater::offering("3.0.0", None).with_events(vec![
        DownloadEvent::Started {
            content_length: None,
        },
        DownloadEvent::Progress { chunk_length: 512 },
        DownloadEvent::Progress { chunk_length: 512 },
    ]));
    let state = shared_state();
    let (prompt, handle) = ChannelPrompt::new();
    let manager = manager(
        Some(updater),
        Some(Arc::new(prompt)),
        Arc::new(RecordingProcess::default()),
        state.clone(),
    );

    let running = tokio::spawn({
        let manager = manager.clone();
        async move { manager.run().await }
    });
    handle.answer(UpdateDecision::Accept).await;
    time::sleep(Duration::from_millis(25)).await;
    assert_eq!(
        state.lock().await.view.update,
        UpdateOverlay::Download {
            percent: DOWNLOAD_PERCENT_FLOOR,
            status: DOWNLOADING_STATUS.to_string(),
        }
    );

    // Resolving without a Finished event still installs.
    assert_eq!(running.await.expect("run"), UpdateOutcome::Restarting);
}

#[tokio::test(start_paused = true)]
async fn check_failure_is_logged_and_hidden() {
    let updater = Arc::new(ScriptedUpdater::failing_check("network unreachable"));
    let state = shared_state();
    let manager = manager(
        Some(updater),
        None,
        Arc::new(RecordingProcess::default()),
        state.clone(),
    );

    let outcome = manager.run().await;
    assert!(matches!(&outcome, UpdateOutcome::Failed(message) if message.contains("network unreachable")));
    assert_eq!(manager.phase().await, UpdatePhase::Idle);
    let guard = state.lock().await;
    assert_eq!(guard.view.update, UpdateOverlay::Hidden);
    assert!(guard.view.notice.is_none());
}

#[tokio::test(start_paused = true)]
async fn prompt_failure_abandons_flow() {
    let updater = Arc::new(ScriptedUpdater::offering("2.0.0", None));
    let state = shared_state();
    let manager = manager(
        Some(updater.clone()),
        Some(Arc::new(BrokenPrompt)),
        Arc::new(RecordingProcess::default()),
        state.clone(),
    );

    assert!(matches!(manager.run().await, UpdateOutcome::Failed(_)));
    assert_eq!(updater.downloads(), 0);
    assert_eq!(state.lock().await.view.update, UpdateOverlay::Hidden);
}

#[tokio::test(start_paused = true)]
async fn download_failure_hides_overlay_without_exit() {
    let updater =
        Arc::new(ScriptedUpdater::offering("2.0.0", None).with_download_error("signature mismatch"));
    let state = shared_state();
    let process = Arc::new(RecordingProcess::default());
    let manager = manager(Some(updater), None, process.clone(), state.clone());

    let outcome = manager.run().await;
    assert!(matches!(&outcome, UpdateOutcome::Failed(message) if message.contains("signature mismatch")));
    assert!(process.exits().is_empty());
    assert_eq!(state.lock().await.view.update, UpdateOverlay::Hidden);
    assert_eq!(manager.phase().await, UpdatePhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn exit_failure_surfaces_error_notice() {
    let updater = Arc::new(ScriptedUpdater::offering("2.0.0", None));
    let state = shared_state();
    let manager = manager(
        Some(updater),
        None,
        Arc::new(RecordingProcess::failing("permission denied")),
        state.clone(),
    );

    let outcome = manager.run().await;
    assert_eq!(
        outcome,
        UpdateOutcome::ExitFailed("EXIT FAILED: permission denied".to_string())
    );
    let notice = state.lock().await.view.notice.clone().expect("notice");
    assert_eq!(notice.kind, NoticeKind::Error);
    assert_eq!(notice.message, "EXIT FAILED: permission denied");
}

#[tokio::test(start_paused = true)]
async fn scheduled_run_waits_for_delay() {
    let updater = Arc::new(ScriptedUpdater::up_to_date());
    let manager = manager(
        Some(updater.clone()),
        None,
        Arc::new(RecordingProcess::default()),
        shared_state(),
    );

    let scheduled = manager.schedule(Duration::from_millis(2000));
    time::sleep(Duration::from_millis(1999)).await;
    assert_eq!(updater.checks(), 0);

    assert_eq!(scheduled.await.expect("scheduled"), UpdateOutcome::UpToDate);
    assert_eq!(updater.checks(), 1);
}
