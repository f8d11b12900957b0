use crate::shared::frame::Frame;

/// What kind of backend a source wraps. Looped playback only applies to files.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    Camera,
    File,
    RawStream,
}

/// Uniform polling interface over a capture backend.
///
/// Sources never fail loudly: a broken backend reports `is_open() == false`
/// and reads return `None`. Deciding what to do next belongs to the caller.
pub trait FrameSource: Send {
    /// False once the backend reports terminal closure.
    fn is_open(&self) -> bool;

    /// False while the backend is still warming up.
    fn is_ready(&self) -> bool;

    /// Reads the next frame, or `None` on failure or end of stream.
    fn read(&mut self) -> Option<Frame>;

    /// Releases the backend. Further reads return `None`.
    fn close(&mut self);
}

/// Builds fresh sources from a fixed configuration.
///
/// Recovery never revives a dead handle: it asks the factory for a new one.
pub trait FrameSourceFactory: Send {
    fn open(&self) -> Box<dyn FrameSource>;

    fn kind(&self) -> SourceKind;
}
