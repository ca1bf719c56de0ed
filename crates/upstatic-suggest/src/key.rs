/// Input events a session reacts to.
///
/// `Shift`, `Alt`, `ArrowLeft` and `ArrowRight` are accepted but never trigger
/// a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Escape,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Enter,
    Tab,
    Shift,
    Alt,
    /// Any other key; carries the full input value after the keystroke.
    Input(String),
}
