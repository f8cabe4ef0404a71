/// Display mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Interacting with a line opens its note for editing
    #[default]
    Edit,
    /// Interacting with a line shows its note as a tooltip
    Reveal,
}

impl Mode {
    pub fn toggled(self) -> Self {
        match self {
            Mode::Edit => Mode::Reveal,
            Mode::Reveal => Mode::Edit,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Edit => "edit",
            Mode::Reveal => "reveal",
        }
    }
}

/// What a front end should do when the user interacts with a line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineAction<'a> {
    /// Open the editor, prefilled with the current note if any
    Edit { current: Option<&'a str> },
    /// Show the note as a transient tooltip; `None` shows nothing
    Reveal(Option<&'a str>),
}
