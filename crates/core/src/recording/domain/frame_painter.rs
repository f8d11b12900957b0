use crate::recording::domain::overlay_plan::OverlayPlan;
use crate::shared::frame::Frame;

/// Rasterizes an overlay plan onto a frame in place.
///
/// Marks that fall partly or fully outside the frame are clipped.
pub trait FramePainter: Send {
    fn paint(&self, frame: &mut Frame, plan: &OverlayPlan);
}
