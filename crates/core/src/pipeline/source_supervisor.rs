//! Keeps a frame source alive across backend failures.
//!
//! A dead source is never revived in place: the supervisor asks the factory
//! for a replacement. Reinitializations are always separated by at least one
//! read attempt, so a permanently failing backend costs one backoff sleep per
//! attempt instead of a hot loop.

use std::sync::Arc;
use std::time::Duration;

use crate::shared::constants::{DEFAULT_POLL_BACKOFF_MS, DEFAULT_REINIT_BACKOFF_MS};
use crate::shared::frame::Frame;
use crate::video::domain::frame_source::{FrameSource, FrameSourceFactory, SourceKind};

use super::clock::Clock;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceState {
    Opening,
    Ready,
    EndOfStream,
    ReinitPending,
}

/// Outcome of one [`SourceSupervisor::poll`].
#[derive(Debug)]
pub enum SourcePoll {
    Frame(Frame),
    /// Nothing to process this iteration; poll again.
    Idle,
    /// The source is gone for good.
    Finished,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SupervisorConfig {
    /// Restart file sources at end of stream. Ignored for other sources.
    pub repeat: bool,
    pub reinit_backoff: Duration,
    pub poll_backoff: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            repeat: false,
            reinit_backoff: Duration::from_millis(DEFAULT_REINIT_BACKOFF_MS),
            poll_backoff: Duration::from_millis(DEFAULT_POLL_BACKOFF_MS),
        }
    }
}

pub struct SourceSupervisor {
    factory: Box<dyn FrameSourceFactory>,
    source: Box<dyn FrameSource>,
    clock: Arc<dyn Clock>,
    config: SupervisorConfig,
    state: SourceState,
    reinit_requested: bool,
    reads_since_reinit: usize,
    reinits: usize,
    frames_read: usize,
    dimensions: Option<(u32, u32)>,
}

impl SourceSupervisor {
    /// Opens the first source immediately.
    pub fn new(
        factory: Box<dyn FrameSourceFactory>,
        clock: Arc<dyn Clock>,
        config: SupervisorConfig,
    ) -> Self {
        let source = factory.open();
        Self {
            factory,
            source,
            clock,
            config,
            state: SourceState::Opening,
            reinit_requested: false,
            reads_since_reinit: 0,
            reinits: 0,
            frames_read: 0,
            dimensions: None,
        }
    }

    pub fn state(&self) -> SourceState {
        self.state
    }

    pub fn kind(&self) -> SourceKind {
        self.factory.kind()
    }

    /// Whether end of stream restarts the source.
    pub fn loops(&self) -> bool {
        self.config.repeat && self.factory.kind() == SourceKind::File
    }

    pub fn reinit_count(&self) -> usize {
        self.reinits
    }

    /// Frame size latched from the first frame, if any arrived yet.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.dimensions
    }

    pub fn poll(&mut self) -> SourcePoll {
        let open = self.source.is_open();
        let loops = self.loops();

        if self.reinit_requested || (!open && loops && self.reads_since_reinit > 0) {
            self.reopen();
            self.clock.sleep(self.config.reinit_backoff);
            return SourcePoll::Idle;
        }

        if !open && !loops {
            self.state = SourceState::EndOfStream;
            return SourcePoll::Finished;
        }

        // A closed source right after a reinit still gets its read attempt.
        if open && !self.source.is_ready() {
            self.clock.sleep(self.config.poll_backoff);
            return SourcePoll::Idle;
        }

        self.reads_since_reinit += 1;
        match self.source.read() {
            Some(frame) => self.accept(frame),
            None if loops => {
                self.state = SourceState::EndOfStream;
                self.reinit_requested = true;
                SourcePoll::Idle
            }
            None => {
                self.state = SourceState::EndOfStream;
                SourcePoll::Finished
            }
        }
    }

    pub fn close(&mut self) {
        self.source.close();
    }

    fn reopen(&mut self) {
        log::debug!("Reinitializing {:?} source", self.factory.kind());
        self.source.close();
        self.source = self.factory.open();
        self.state = SourceState::ReinitPending;
        self.reinit_requested = false;
        self.reads_since_reinit = 0;
        self.reinits += 1;
    }

    fn accept(&mut self, mut frame: Frame) -> SourcePoll {
        self.state = SourceState::Ready;
        let dims = frame.dimensions();
        match self.dimensions {
            None => self.dimensions = Some(dims),
            Some(expected) if expected != dims => {
                log::warn!(
                    "Dropping {}x{} frame, session is {}x{}",
                    dims.0,
                    dims.1,
                    expected.0,
                    expected.1
                );
                return SourcePoll::Idle;
            }
            Some(_) => {}
        }
        frame.set_index(self.frames_read);
        self.frames_read += 1;
        SourcePoll::Frame(frame)
    }
}

impl Drop for SourceSupervisor {
    fn drop(&mut self) {
        self.source.close();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::pipeline::clock::tests::FakeClock;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// What a scripted source does on each read.
    #[derive(Clone, Copy, Debug)]
    pub(crate) enum Step {
        Frame(u32, u32),
        Fail,
        /// `is_ready()` reports false once.
        Warmup,
    }

    /// Every `open()` hands out the next script. An exhausted script closes
    /// the source.
    pub(crate) struct ScriptedFactory {
        kind: SourceKind,
        scripts: Arc<Mutex<VecDeque<Vec<Step>>>>,
        pub(crate) opens: Arc<Mutex<usize>>,
        /// Shared event trace: "open" and "read" entries in call order.
        pub(crate) events: Arc<Mutex<Vec<&'static str>>>,
    }

    impl ScriptedFactory {
        pub(crate) fn new(kind: SourceKind, scripts: Vec<Vec<Step>>) -> Self {
            Self {
                kind,
                scripts: Arc::new(Mutex::new(scripts.into())),
                opens: Arc::new(Mutex::new(0)),
                events: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl FrameSourceFactory for ScriptedFactory {
        fn open(&self) -> Box<dyn FrameSource> {
            *self.opens.lock().unwrap() += 1;
            self.events.lock().unwrap().push("open");
            let steps = self.scripts.lock().unwrap().pop_front().unwrap_or_default();
            Box::new(ScriptedSource {
                steps: Mutex::new(steps.into()),
                events: Arc::clone(&self.events),
            })
        }

        fn kind(&self) -> SourceKind {
            self.kind
        }
    }

    struct ScriptedSource {
        steps: Mutex<VecDeque<Step>>,
        events: Arc<Mutex<Vec<&'static str>>>,
    }

    impl FrameSource for ScriptedSource {
        fn is_open(&self) -> bool {
            !self.steps.lock().unwrap().is_empty()
        }

        fn is_ready(&self) -> bool {
            let mut steps = self.steps.lock().unwrap();
            if let Some(Step::Warmup) = steps.front() {
                steps.pop_front();
                return false;
            }
            true
        }

        fn read(&mut self) -> Option<Frame> {
            self.events.lock().unwrap().push("read");
            match self.steps.lock().unwrap().pop_front() {
                Some(Step::Frame(w, h)) => Some(Frame::blank(w, h, 0)),
                _ => None,
            }
        }

        fn close(&mut self) {
            self.steps.lock().unwrap().clear();
        }
    }

    fn supervisor(factory: ScriptedFactory, repeat: bool) -> (SourceSupervisor, Arc<FakeClock>) {
        let clock = Arc::new(FakeClock::new());
        let config = SupervisorConfig {
            repeat,
            ..Default::default()
        };
        (SourceSupervisor::new(Box::new(factory), clock.clone(), config), clock)
    }

    fn drain(supervisor: &mut SourceSupervisor, max_polls: usize) -> (Vec<Frame>, bool) {
        let mut frames = Vec::new();
        for _ in 0..max_polls {
            match supervisor.poll() {
                SourcePoll::Frame(frame) => frames.push(frame),
                SourcePoll::Idle => {}
                SourcePoll::Finished => return (frames, true),
            }
        }
        (frames, false)
    }

    #[test]
    fn test_reads_until_end_without_repeat() {
        let factory = ScriptedFactory::new(
            SourceKind::File,
            vec![vec![Step::Frame(4, 4), Step::Frame(4, 4), Step::Fail]],
        );
        let opens = Arc::clone(&factory.opens);
        let (mut sup, _) = supervisor(factory, false);

        let (frames, finished) = drain(&mut sup, 10);
        assert!(finished);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].index(), 1);
        assert_eq!(*opens.lock().unwrap(), 1);
        assert_eq!(sup.state(), SourceState::EndOfStream);
    }

    #[test]
    fn test_closed_source_finishes_without_repeat() {
        let factory = ScriptedFactory::new(SourceKind::Camera, vec![vec![]]);
        let (mut sup, _) = supervisor(factory, true);
        assert!(matches!(sup.poll(), SourcePoll::Finished));
    }

    #[test]
    fn test_repeat_restarts_file_and_keeps_counting() {
        let factory = ScriptedFactory::new(
            SourceKind::File,
            vec![
                vec![Step::Frame(4, 4), Step::Fail],
                vec![Step::Frame(4, 4), Step::Fail],
            ],
        );
        let opens = Arc::clone(&factory.opens);
        let (mut sup, clock) = supervisor(factory, true);

        let (frames, finished) = drain(&mut sup, 6);
        assert!(!finished);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].index(), 1);
        assert!(*opens.lock().unwrap() >= 2);
        assert!(sup.reinit_count() >= 1);
        assert!(clock.sleeps().contains(&Duration::from_millis(1)));
    }

    #[test]
    fn test_repeat_is_ignored_for_cameras() {
        let factory = ScriptedFactory::new(SourceKind::Camera, vec![vec![Step::Frame(4, 4), Step::Fail]]);
        let (mut sup, _) = supervisor(factory, true);
        assert!(!sup.loops());

        let (frames, finished) = drain(&mut sup, 10);
        assert!(finished);
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn test_never_reinits_twice_without_a_read() {
        // Every replacement source fails immediately.
        let factory = ScriptedFactory::new(SourceKind::File, vec![vec![Step::Fail]; 20]);
        let events = Arc::clone(&factory.events);
        let (mut sup, _) = supervisor(factory, true);

        let (_, finished) = drain(&mut sup, 30);
        assert!(!finished);

        let events = events.lock().unwrap();
        assert!(events.iter().filter(|e| **e == "open").count() > 3);
        for pair in events.windows(2) {
            assert_ne!(pair, ["open", "open"], "two reinits without a read: {events:?}");
        }
    }

    #[test]
    fn test_missing_file_with_repeat_keeps_retrying() {
        // Sources that are closed from the start still get one read each.
        let factory = ScriptedFactory::new(SourceKind::File, vec![]);
        let events = Arc::clone(&factory.events);
        let (mut sup, _) = supervisor(factory, true);

        let (_, finished) = drain(&mut sup, 10);
        assert!(!finished);
        let events = events.lock().unwrap();
        for pair in events.windows(2) {
            assert_ne!(pair, ["open", "open"]);
        }
    }

    #[test]
    fn test_warmup_sleeps_poll_backoff() {
        let factory = ScriptedFactory::new(
            SourceKind::Camera,
            vec![vec![Step::Warmup, Step::Frame(4, 4)]],
        );
        let (mut sup, clock) = supervisor(factory, false);

        assert!(matches!(sup.poll(), SourcePoll::Idle));
        assert_eq!(sup.state(), SourceState::Opening);
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(1)]);
        assert!(matches!(sup.poll(), SourcePoll::Frame(_)));
        assert_eq!(sup.state(), SourceState::Ready);
    }

    #[test]
    fn test_mismatched_frame_size_is_dropped() {
        let factory = ScriptedFactory::new(
            SourceKind::RawStream,
            vec![vec![Step::Frame(4, 4), Step::Frame(8, 8), Step::Frame(4, 4), Step::Fail]],
        );
        let (mut sup, _) = supervisor(factory, false);

        let (frames, finished) = drain(&mut sup, 10);
        assert!(finished);
        assert_eq!(frames.len(), 2);
        assert_eq!(sup.dimensions(), Some((4, 4)));
        assert_eq!(frames[1].index(), 1);
    }
}
