use std::io::{self, Write};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use gridcast_core::{update, AppState, CoreSettings, Effect, JobId, JobRequest, Msg};
use gridcast_engine::{EngineHandle, KeyValueStore};
use gridcast_logging::{gc_debug, gc_info};

use super::effects::EffectRunner;
use super::ui;

const TICK: Duration = Duration::from_millis(50);

/// What happened to the jobs submitted during one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub started: usize,
    pub completed: usize,
    pub failed: usize,
    /// Following stopped before the jobs finished.
    pub detached: bool,
}

impl RunSummary {
    pub fn succeeded(&self) -> bool {
        self.started > 0 && self.failed == 0 && self.completed == self.started
    }
}

/// Single owner of [`AppState`]. Messages from the engine and from timers are
/// applied one at a time and the notification list is redrawn after each change.
pub struct App<W: Write> {
    state: AppState,
    runner: EffectRunner,
    msg_rx: mpsc::Receiver<Msg>,
    out: W,
    summary: RunSummary,
}

impl<W: Write> App<W> {
    pub fn new(
        settings: CoreSettings,
        engine: EngineHandle,
        store: Arc<dyn KeyValueStore>,
        out: W,
    ) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel();
        Self {
            state: AppState::with_settings(settings),
            runner: EffectRunner::new(engine, store, msg_tx),
            msg_rx,
            out,
            summary: RunSummary::default(),
        }
    }

    pub fn with_project_name(mut self, name: Option<String>) -> Self {
        self.runner.set_project_name(name);
        self
    }

    pub fn submit(&mut self, request: JobRequest) -> io::Result<()> {
        gc_info!("Submitting {}", request.display_name());
        self.dispatch(Msg::SubmitRequested(request))
    }

    /// Runs until nothing is pending or on screen.
    ///
    /// The first interrupt asks the server to cancel every job that still
    /// offers cancellation; a second one stops following.
    pub fn follow(&mut self, interrupts: &mpsc::Receiver<()>) -> io::Result<RunSummary> {
        let mut interrupted = false;
        while !self.state.is_idle() {
            while let Ok(msg) = self.msg_rx.try_recv() {
                self.dispatch(msg)?;
            }
            if interrupts.try_recv().is_ok() {
                if interrupted {
                    writeln!(self.out, "Stopped following; the server keeps the job running")?;
                    self.summary.detached = true;
                    break;
                }
                interrupted = true;
                self.cancel_all()?;
            }
            if let Some(msg) = self.runner.next_msg(TICK) {
                self.dispatch(msg)?;
            }
        }
        Ok(self.summary)
    }

    #[cfg(test)]
    pub fn view(&self) -> gridcast_core::AppViewModel {
        self.state.view()
    }

    /// Stops the engine and hands back the output sink.
    pub fn shutdown(self) -> W {
        self.runner.shutdown();
        self.out
    }

    fn cancel_all(&mut self) -> io::Result<()> {
        let targets: Vec<JobId> = self
            .state
            .notifications()
            .iter()
            .filter(|item| item.shows_cancel())
            .map(|item| item.job_id.clone())
            .collect();
        if targets.is_empty() {
            writeln!(self.out, "Nothing to cancel; press Ctrl-C again to stop following")?;
        }
        for job_id in targets {
            self.dispatch(Msg::CancelClicked { job_id })?;
        }
        Ok(())
    }

    fn dispatch(&mut self, msg: Msg) -> io::Result<()> {
        if msg == Msg::NoOp {
            return Ok(());
        }
        gc_debug!("dispatch {:?}", msg);
        if matches!(msg, Msg::SubmitFailed { .. }) {
            self.summary.failed += 1;
        }

        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        self.tally(&effects);
        let changed = state.consume_dirty();
        self.state = state;

        for notice in self.runner.run(effects) {
            ui::render::notice(&mut self.out, &notice)?;
        }
        if changed {
            ui::render::render(&mut self.out, &self.state.view())?;
        }
        Ok(())
    }

    fn tally(&mut self, effects: &[Effect]) {
        for effect in effects {
            match effect {
                Effect::StartJob { .. } => self.summary.started += 1,
                Effect::JobCompleted { .. } => self.summary.completed += 1,
                Effect::JobFailed { .. } => self.summary.failed += 1,
                _ => {}
            }
        }
    }
}
