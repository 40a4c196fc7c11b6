/// A discrete player intent, as delivered by whatever device layer sits above.
///
/// The beam tool never sees actions directly; they are folded into an
/// [`InputSnapshot`](crate::InputSnapshot) once per tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// The activation button went down.
    BeamPressed,
    /// The activation button went up.
    BeamReleased,
    /// The cycle-mode button was pressed.
    CycleMode,
    /// Scroll wheel moved by a signed amount.
    Scroll(f32),
}
