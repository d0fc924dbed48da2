use crate::{
    DbRecord, DialogError, DialogLayout, DialogTab, LayoutProbe, LongReadGuard, RecordFetcher,
    RecordRef, SidebarMode, TabRegistry,
};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Delay between close-guard re-checks while a long read is in flight.
const CLOSE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Where the dialog stands with respect to its record fetch.
///
/// `Failed` keeps the reason for display, but callers that only care about
/// the spinner can keep using [`EditDialogController::is_loading`]; a failed
/// fetch leaves the dialog visible and blank, never errors out of `open`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadPhase {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

type ClosedCallback = Box<dyn FnMut() + Send>;

struct DialogInner {
    visible: bool,
    load: LoadPhase,
    active_tab: DialogTab,
    width_px: u32,
    sidebar: SidebarMode,
    closing: bool,
    fetch_seq: u64,
    record: Option<DbRecord>,
    on_closed: Option<ClosedCallback>,
    poller: Option<JoinHandle<()>>,
}

impl DialogInner {
    fn new() -> Self {
        Self {
            visible: false,
            load: LoadPhase::Idle,
            active_tab: DialogTab::default(),
            width_px: 0,
            sidebar: SidebarMode::default(),
            closing: false,
            fetch_seq: 0,
            record: None,
            on_closed: None,
            poller: None,
        }
    }
}

/// Orchestrates the "edit instance" dialog: visibility, the fetched record,
/// tab selection, responsive sizing and the guarded close protocol.
///
/// Cheap to clone; all clones share one dialog state. Methods are meant to
/// be called from the shell's event loop; fetches run as spawned tasks on
/// the same runtime, so every state mutation happens in an ordinary
/// interleaving of callbacks, never in parallel sections the caller has to
/// lock around.
#[derive(Clone)]
pub struct EditDialogController {
    state: Arc<Mutex<DialogInner>>,
    tabs: Arc<tokio::sync::Mutex<TabRegistry>>,
    fetcher: Arc<dyn RecordFetcher>,
    layout: Arc<dyn LayoutProbe>,
    long_reads: LongReadGuard,
}

impl EditDialogController {
    pub fn new(
        fetcher: Arc<dyn RecordFetcher>,
        layout: Arc<dyn LayoutProbe>,
        long_reads: LongReadGuard,
        tabs: TabRegistry,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(DialogInner::new())),
            tabs: Arc::new(tokio::sync::Mutex::new(tabs)),
            fetcher,
            layout,
            long_reads,
        }
    }

    fn state(&self) -> MutexGuard<'_, DialogInner> {
        // State is only touched from event-loop callbacks; a poisoned lock
        // would mean a panic mid-mutation, recover with whatever is there.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Open the dialog for the referenced record.
    ///
    /// Sets `loading` and `visible` synchronously, re-resolves the dialog
    /// geometry from the current viewport, then fetches the full record in
    /// the background. A fetch failure is absorbed: the dialog stays
    /// visible with no content and the spinner stops.
    pub fn open(&self, record_ref: &RecordRef) -> Result<(), DialogError> {
        if record_ref.db_id.trim().is_empty() {
            return Err(DialogError::EmptyRecordId);
        }

        let seq = self.begin_fetch();
        log::info!(
            "Opening edit dialog for db_id {} (fetch #{})",
            record_ref.db_id,
            seq
        );
        self.spawn_fetch(record_ref.db_id.clone(), seq);
        Ok(())
    }

    /// Re-fetch the currently held record, keeping the dialog open. Same
    /// contract as `open`; errors only if nothing was ever loaded.
    pub fn refresh(&self) -> Result<(), DialogError> {
        let db_id = self
            .state()
            .record
            .as_ref()
            .and_then(DbRecord::db_id)
            .ok_or(DialogError::NothingLoaded)?;

        let seq = self.begin_fetch();
        log::info!("Refreshing db_id {} (fetch #{})", db_id, seq);
        self.spawn_fetch(db_id, seq);
        Ok(())
    }

    /// Shared `open`/`refresh` preamble: spinner on, geometry re-resolved
    /// (never cached, the viewport may have changed), next fetch tagged.
    fn begin_fetch(&self) -> u64 {
        let layout = DialogLayout::resolve(
            self.layout.viewport_px(),
            self.layout.sidebar_toggle_present(),
        );

        let mut state = self.state();
        state.load = LoadPhase::Loading;
        state.width_px = layout.width_px;
        state.sidebar = layout.sidebar;
        state.visible = true;
        state.fetch_seq += 1;
        state.fetch_seq
    }

    fn spawn_fetch(&self, db_id: String, seq: u64) {
        let controller = self.clone();
        tokio::spawn(async move {
            let result = controller.fetcher.get_record(&db_id).await;

            let mut state = controller.state();
            if seq != state.fetch_seq {
                // A newer fetch was issued while this one was in flight;
                // the newer resolution owns the record and the spinner.
                log::debug!("Discarding stale fetch #{} for db_id {}", seq, db_id);
                return;
            }

            match result {
                Ok(record) => {
                    state.record = Some(record);
                    state.load = LoadPhase::Loaded;
                    log::info!("Fetch #{} resolved for db_id {}", seq, db_id);
                }
                Err(err) => {
                    // Swallowed: dialog stays visible and blank, prior
                    // record (if any) is kept untouched.
                    state.load = LoadPhase::Failed(err.to_string());
                    log::warn!("Fetch #{} failed for db_id {}: {}", seq, db_id, err);
                }
            }
        });
    }

    /// Switch the visible tab. Idempotent; selecting the already active tab
    /// changes nothing. The selection silently survives reloads because the
    /// tab strip is simply not rendered while a fetch is in flight.
    pub fn select_tab(&self, tab: DialogTab) {
        let mut state = self.state();
        if state.active_tab != tab {
            log::debug!("Switching tab {:?} -> {:?}", state.active_tab, tab);
            state.active_tab = tab;
        }
    }

    /// Display the active tab, loading its module on first use and handing
    /// it the current record. Does nothing while a fetch is in flight or
    /// when no record is held (the blank-panel case after a failed fetch).
    pub async fn show_active_tab(&self) {
        let (tab, record) = {
            let state = self.state();
            if !state.visible || state.load == LoadPhase::Loading {
                return;
            }
            (state.active_tab, state.record.clone())
        };

        let Some(record) = record else { return };
        self.tabs.lock().await.activate(tab, &record).await;
    }

    /// Register a notification invoked after every completed close. The
    /// callback survives across opens.
    pub fn set_on_closed(&self, callback: impl FnMut() + Send + 'static) {
        self.state().on_closed = Some(Box::new(callback));
    }

    /// Hand over a background poller (e.g. a task-log tailer) whose
    /// lifetime is bounded by the dialog. It is aborted when the dialog
    /// finishes closing. A previously attached poller is aborted right away.
    pub fn attach_poller(&self, handle: JoinHandle<()>) {
        if let Some(old) = self.state().poller.replace(handle) {
            old.abort();
        }
    }

    /// Close the dialog, deferring teardown while a long read is writing
    /// into dialog-owned state.
    ///
    /// While the long-read guard reports an in-flight read, re-check on a
    /// fixed interval without touching `do_close`. Once clear: abort the
    /// attached poller, drop the `closing` marker, run `do_close` (the
    /// embedder's actual teardown), then the registered on-closed
    /// notification.
    pub async fn request_close(&self, do_close: impl FnOnce()) {
        self.state().closing = true;

        while self.long_reads.is_in_flight() {
            log::info!("Close deferred, waiting for long read to return");
            tokio::time::sleep(CLOSE_POLL_INTERVAL).await;
        }

        let poller = {
            let mut state = self.state();
            state.closing = false;
            state.visible = false;
            state.poller.take()
        };
        if let Some(poller) = poller {
            log::debug!("Aborting dialog poller on close");
            poller.abort();
        }

        do_close();

        // Invoked outside the lock: the callback may well call back into
        // this controller.
        let callback = self.state().on_closed.take();
        if let Some(mut callback) = callback {
            callback();
            let mut state = self.state();
            if state.on_closed.is_none() {
                state.on_closed = Some(callback);
            }
        }
    }

    pub fn is_visible(&self) -> bool {
        self.state().visible
    }

    pub fn is_loading(&self) -> bool {
        self.state().load == LoadPhase::Loading
    }

    pub fn is_closing(&self) -> bool {
        self.state().closing
    }

    pub fn load_phase(&self) -> LoadPhase {
        self.state().load.clone()
    }

    pub fn active_tab(&self) -> DialogTab {
        self.state().active_tab
    }

    pub fn width_px(&self) -> u32 {
        self.state().width_px
    }

    pub fn sidebar(&self) -> SidebarMode {
        self.state().sidebar
    }

    pub fn record(&self) -> Option<DbRecord> {
        self.state().record.clone()
    }

    /// The tab strip only exists once a fetch settled; while loading the
    /// previously selected tab persists invisibly.
    pub fn tab_strip_visible(&self) -> bool {
        let state = self.state();
        state.visible && state.load != LoadPhase::Loading
    }

    /// Dialog title derived from the held record's endpoint, `None` until a
    /// record has been fetched.
    pub fn title(&self) -> Option<String> {
        let state = self.state();
        let record = state.record.as_ref()?;
        Some(format!(
            "Edit ( DB - {}:{} )",
            record.host().unwrap_or(""),
            record.port().map(|p| p.to_string()).unwrap_or_default()
        ))
    }
}
