//! Enumerations for TUI state management.

/// The three top-level screens.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum View {
    Workspace,
    Insights,
    Archive,
}

impl View {
    pub const ALL: [View; 3] = [View::Workspace, View::Insights, View::Archive];

    pub fn title(self) -> &'static str {
        match self {
            View::Workspace => "Workspace",
            View::Insights => "Insights",
            View::Archive => "Archive",
        }
    }

    /// The view after this one, wrapping around.
    pub fn next(self) -> View {
        match self {
            View::Workspace => View::Insights,
            View::Insights => View::Archive,
            View::Archive => View::Workspace,
        }
    }

    pub fn prev(self) -> View {
        match self {
            View::Workspace => View::Archive,
            View::Insights => View::Workspace,
            View::Archive => View::Insights,
        }
    }
}

/// What the keyboard is currently driving.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AppState {
    Browse,
    /// Typing into the archive search box.
    Search,
    /// Typing the handoff note before finishing the selected item.
    ConfirmHandoff,
    ConfirmDelete,
    Help,
}

/// A visible spreadsheet row: a task, or a subtask under its task.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RowRef {
    Task(usize),
    Sub(usize, usize),
}
