//! Main application logic for the terminal user interface.
//!
//! This module contains the `App` struct which holds the TUI state, keeps a
//! task snapshot in sync with the store, recomputes the dashboard after each
//! change and turns key presses into workspace operations. Rendering lives
//! in `tui::views`.

use std::cell::RefCell;
use std::collections::HashSet;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{backend::Backend, widgets::TableState, Terminal};

use crate::db::local_today;
use crate::error::Result;
use crate::fields::{Status, StatusFilter};
use crate::metrics::items::archive;
use crate::metrics::status::{filter_top_level, toggle_filter};
use crate::metrics::summary::Dashboard;
use crate::store::{delete_item, handoff, update_item, TaskStore, WatchId};
use crate::task::{Handoff, ItemUpdate, Task, User, WorkItem};
use crate::tui::enums::{AppState, RowRef, View};
use crate::tui::input::InputField;

/// Main application state for the terminal user interface.
pub struct App<'a> {
    store: &'a mut dyn TaskStore,
    watch: Option<WatchId>,
    latest: Rc<RefCell<Option<Vec<Task>>>>,
    pub(crate) actor: String,
    pub(crate) tasks: Vec<Task>,
    pub(crate) users: Vec<User>,
    pub(crate) dashboard: Dashboard,
    pub(crate) view: View,
    pub(crate) state: AppState,
    pub(crate) filter: Option<StatusFilter>,
    pub(crate) expanded: HashSet<String>,
    pub(crate) rows: Vec<RowRef>,
    pub(crate) table_state: TableState,
    pub(crate) archive_state: TableState,
    pub(crate) search: InputField,
    pub(crate) handoff_note: InputField,
    pub(crate) status_message: String,
    pub(crate) today: NaiveDate,
}

/// Spreadsheet rows for the tasks passing `filter`, with the subtasks of
/// expanded tasks directly under them.
fn build_rows(tasks: &[Task], filter: Option<StatusFilter>, expanded: &HashSet<String>) -> Vec<RowRef> {
    let keep: HashSet<&str> = filter_top_level(tasks, filter).into_iter().map(Task::id).collect();
    let mut rows = Vec::new();
    for (i, task) in tasks.iter().enumerate() {
        if !keep.contains(task.id()) {
            continue;
        }
        rows.push(RowRef::Task(i));
        if expanded.contains(task.id()) {
            rows.extend((0..task.sub_tasks.len()).map(|j| RowRef::Sub(i, j)));
        }
    }
    rows
}

/// Status reached by pressing `s`. Finished is only reachable through a handoff.
fn next_status(status: Status) -> Status {
    match status {
        Status::NotStarted => Status::InProgress,
        Status::InProgress => Status::AwaitingClarity,
        Status::AwaitingClarity | Status::Finished => Status::NotStarted,
    }
}

impl<'a> App<'a> {
    /// Subscribe to the store and build the first snapshot.
    pub fn new(store: &'a mut dyn TaskStore, actor: &str) -> Result<Self> {
        let users = store.fetch_users()?;
        let latest: Rc<RefCell<Option<Vec<Task>>>> = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&latest);
        let watch = store.watch_tasks(Box::new(move |tasks: &[Task]| {
            *sink.borrow_mut() = Some(tasks.to_vec());
        }));

        let mut app = App {
            store,
            watch: Some(watch),
            latest,
            actor: actor.to_string(),
            tasks: Vec::new(),
            dashboard: Dashboard::compute(&[], &users),
            users,
            view: View::Workspace,
            state: AppState::Browse,
            filter: None,
            expanded: HashSet::new(),
            rows: Vec::new(),
            table_state: TableState::default(),
            archive_state: TableState::default(),
            search: InputField::new(),
            handoff_note: InputField::new(),
            status_message: String::new(),
            today: local_today(),
        };
        app.refresh();
        Ok(app)
    }

    /// Take the newest snapshot, if any, and recompute everything derived from it.
    fn refresh(&mut self) {
        if let Some(tasks) = self.latest.borrow_mut().take() {
            self.tasks = tasks;
        }
        self.dashboard = Dashboard::compute(&self.tasks, &self.users);
        self.rebuild_rows();
        let archived = self.archive_items().len();
        clamp(&mut self.archive_state, archived);
    }

    fn rebuild_rows(&mut self) {
        self.rows = build_rows(&self.tasks, self.filter, &self.expanded);
        clamp(&mut self.table_state, self.rows.len());
    }

    pub(crate) fn item_at(&self, row: RowRef) -> Option<&WorkItem> {
        match row {
            RowRef::Task(i) => self.tasks.get(i).map(|t| &t.item),
            RowRef::Sub(i, j) => self.tasks.get(i).and_then(|t| t.sub_tasks.get(j)),
        }
    }

    fn selected_row(&self) -> Option<RowRef> {
        self.table_state.selected().and_then(|i| self.rows.get(i).copied())
    }

    /// The work item under the cursor in the current view.
    pub(crate) fn selected_item(&self) -> Option<&WorkItem> {
        match self.view {
            View::Workspace => self.selected_row().and_then(|r| self.item_at(r)),
            View::Archive => {
                let items = self.archive_items();
                self.archive_state.selected().and_then(|i| items.get(i).copied())
            }
            View::Insights => None,
        }
    }

    pub(crate) fn archive_items(&self) -> Vec<&WorkItem> {
        archive(&self.tasks, self.search.as_str())
    }

    pub(crate) fn user_name(&self, id: &str) -> &str {
        self.users.iter().find(|u| u.id == id).map_or("-", |u| u.name.as_str())
    }

    fn set_status_message(&mut self, msg: String) {
        self.status_message = msg;
    }

    fn report(&mut self, outcome: Result<String>) {
        match outcome {
            Ok(msg) => self.set_status_message(msg),
            Err(e) => self.set_status_message(format!("Error: {e}")),
        }
        self.refresh();
    }

    fn toggle_card(&mut self, index: usize) {
        let card = StatusFilter::CARDS[index];
        self.filter = toggle_filter(self.filter, card);
        self.rebuild_rows();
        self.table_state.select(if self.rows.is_empty() { None } else { Some(0) });
        let label = match self.filter {
            Some(f) => format!("Filter: {}", f.label()),
            None => "Filter cleared".to_string(),
        };
        self.set_status_message(label);
    }

    fn toggle_expand(&mut self) {
        let Some(row) = self.selected_row() else { return };
        let task_index = match row {
            RowRef::Task(i) | RowRef::Sub(i, _) => i,
        };
        let Some(task) = self.tasks.get(task_index) else { return };
        if task.sub_tasks.is_empty() {
            let msg = format!("{} has no subtasks", task.id());
            self.set_status_message(msg);
            return;
        }
        let id = task.id().to_string();
        if !self.expanded.remove(&id) {
            self.expanded.insert(id);
        }
        self.rebuild_rows();
        let at = self.rows.iter().position(|r| *r == RowRef::Task(task_index));
        self.table_state.select(at);
    }

    fn cycle_status(&mut self) {
        let Some(item) = self.selected_item() else { return };
        if item.is_finished() {
            let msg = format!("{} is finished", item.id);
            self.set_status_message(msg);
            return;
        }
        let id = item.id.clone();
        let status = next_status(item.status);
        let update = ItemUpdate { status: Some(status), ..Default::default() };
        let outcome = update_item(&mut *self.store, &id, &update, Utc::now()).map(|_| format!("{id} is now {status}"));
        self.report(outcome);
    }

    fn begin_handoff(&mut self) {
        let Some(item) = self.selected_item() else { return };
        if item.is_finished() {
            let msg = format!("{} was already handed off", item.id);
            self.set_status_message(msg);
            return;
        }
        self.handoff_note.clear();
        self.state = AppState::ConfirmHandoff;
    }

    fn confirm_handoff(&mut self) {
        let Some(id) = self.selected_item().map(|i| i.id.clone()) else {
            self.state = AppState::Browse;
            return;
        };
        let note = self.handoff_note.as_str().trim();
        let details = Handoff {
            comment: (!note.is_empty()).then(|| note.to_string()),
            ..Default::default()
        };
        let outcome = handoff(&mut *self.store, &id, &details, Utc::now()).map(|_| format!("Handed off {id}"));
        self.state = AppState::Browse;
        self.report(outcome);
    }

    fn confirm_delete(&mut self) {
        let Some(id) = self.selected_item().map(|i| i.id.clone()) else {
            self.state = AppState::Browse;
            return;
        };
        let outcome = delete_item(&mut *self.store, &id, Utc::now()).map(|_| format!("Deleted {id}"));
        self.state = AppState::Browse;
        self.report(outcome);
    }

    fn move_selection(&mut self, down: bool) {
        let (state, len) = match self.view {
            View::Workspace => (&mut self.table_state, self.rows.len()),
            View::Archive => {
                let len = archive(&self.tasks, self.search.as_str()).len();
                (&mut self.archive_state, len)
            }
            View::Insights => return,
        };
        if len == 0 {
            state.select(None);
            return;
        }
        let next = match state.selected() {
            Some(i) if down => (i + 1).min(len - 1),
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        state.select(Some(next));
    }

    fn handle_text_input(field: &mut InputField, key: KeyCode) {
        match key {
            KeyCode::Char(c) => field.handle_char(c),
            KeyCode::Backspace => field.handle_backspace(),
            KeyCode::Delete => field.handle_delete(),
            KeyCode::Left => field.move_cursor_left(),
            KeyCode::Right => field.move_cursor_right(),
            _ => {}
        }
    }

    fn handle_search_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.search.clear();
                self.state = AppState::Browse;
            }
            KeyCode::Enter => self.state = AppState::Browse,
            other => Self::handle_text_input(&mut self.search, other),
        }
        let len = self.archive_items().len();
        self.archive_state.select(if len == 0 { None } else { Some(0) });
    }

    fn handle_browse_input(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab => self.view = self.view.next(),
            KeyCode::BackTab => self.view = self.view.prev(),
            KeyCode::Char('1') => self.view = View::Workspace,
            KeyCode::Char('2') => self.view = View::Insights,
            KeyCode::Char('3') => self.view = View::Archive,
            KeyCode::Char('?') => self.state = AppState::Help,
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(false),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(true),
            KeyCode::Char('/') if self.view == View::Archive => self.state = AppState::Search,
            KeyCode::F(n @ 1..=5) if self.view == View::Workspace => self.toggle_card(usize::from(n - 1)),
            KeyCode::Enter | KeyCode::Char(' ') if self.view == View::Workspace => self.toggle_expand(),
            KeyCode::Char('s') if self.view == View::Workspace => self.cycle_status(),
            KeyCode::Char('h') if self.view == View::Workspace => self.begin_handoff(),
            KeyCode::Char('d') if self.view == View::Workspace && self.selected_item().is_some() => {
                self.state = AppState::ConfirmDelete;
            }
            _ => {}
        }
        false
    }

    /// Apply one key press. Returns true when the application should quit.
    pub fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        if modifiers.contains(KeyModifiers::CONTROL) && key == KeyCode::Char('c') {
            return true;
        }
        self.status_message.clear();

        match self.state {
            AppState::Browse => return self.handle_browse_input(key),
            AppState::Search => self.handle_search_input(key),
            AppState::ConfirmHandoff => match key {
                KeyCode::Enter => self.confirm_handoff(),
                KeyCode::Esc => self.state = AppState::Browse,
                other => Self::handle_text_input(&mut self.handoff_note, other),
            },
            AppState::ConfirmDelete => match key {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => self.confirm_delete(),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => self.state = AppState::Browse,
                _ => {}
            },
            AppState::Help => self.state = AppState::Browse,
        }
        false
    }

    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(self.handle_key(key.code, key.modifiers));
                }
            }
        }
        Ok(false)
    }

    /// Main event loop for the TUI application.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}

impl Drop for App<'_> {
    fn drop(&mut self) {
        if let Some(id) = self.watch.take() {
            self.store.unwatch(id);
        }
    }
}

fn clamp(state: &mut TableState, len: usize) {
    match state.selected() {
        _ if len == 0 => state.select(None),
        Some(i) if i >= len => state.select(Some(len - 1)),
        None => state.select(Some(0)),
        Some(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{find_owner, MemoryStore};
    use chrono::TimeZone;

    fn demo_store() -> MemoryStore {
        MemoryStore::demo(
            NaiveDate::from_ymd_opt(2025, 3, 12).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 12, 9, 0, 0).unwrap(),
        )
    }

    fn press(app: &mut App, key: KeyCode) -> bool {
        app.handle_key(key, KeyModifiers::NONE)
    }

    #[test]
    fn starts_on_workspace_with_first_row_selected() {
        let mut store = demo_store();
        let app = App::new(&mut store, "u1").unwrap();
        assert_eq!(app.view, View::Workspace);
        assert_eq!(app.rows, vec![RowRef::Task(0), RowRef::Task(1)]);
        assert_eq!(app.selected_item().map(|i| i.id.as_str()), Some("t1"));
        assert_eq!(app.dashboard.stat_cards.total, 3);
    }

    #[test]
    fn stat_card_keys_toggle_the_filter() {
        let mut store = demo_store();
        let mut app = App::new(&mut store, "u1").unwrap();
        press(&mut app, KeyCode::F(5));
        assert_eq!(app.filter, Some(StatusFilter::Only(Status::Finished)));
        // t1 stays because its subtask is finished
        assert_eq!(app.rows, vec![RowRef::Task(0)]);
        press(&mut app, KeyCode::F(5));
        assert_eq!(app.filter, None);
        assert_eq!(app.rows.len(), 2);
        press(&mut app, KeyCode::F(1));
        assert_eq!(app.filter, Some(StatusFilter::Total));
        assert_eq!(app.rows.len(), 2);
    }

    #[test]
    fn enter_expands_subtasks_under_their_task() {
        let mut store = demo_store();
        let mut app = App::new(&mut store, "u1").unwrap();
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.rows, vec![RowRef::Task(0), RowRef::Sub(0, 0), RowRef::Task(1)]);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.selected_item().map(|i| i.id.as_str()), Some("s1"));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.rows, vec![RowRef::Task(0), RowRef::Task(1)]);
        assert_eq!(app.table_state.selected(), Some(0));
    }

    #[test]
    fn status_cycles_and_dashboard_follows() {
        let mut store = demo_store();
        {
            let mut app = App::new(&mut store, "u1").unwrap();
            press(&mut app, KeyCode::Down);
            press(&mut app, KeyCode::Char('s'));
            assert_eq!(app.dashboard.stat_cards.in_progress, 2);
            assert_eq!(app.dashboard.stat_cards.not_started, 0);
        }
        assert_eq!(find_owner(&store, "t2").unwrap().item.status, Status::InProgress);
    }

    #[test]
    fn handoff_records_the_note() {
        let mut store = demo_store();
        {
            let mut app = App::new(&mut store, "u1").unwrap();
            press(&mut app, KeyCode::Char('h'));
            assert_eq!(app.state, AppState::ConfirmHandoff);
            for c in "ready".chars() {
                press(&mut app, KeyCode::Char(c));
            }
            press(&mut app, KeyCode::Enter);
            assert_eq!(app.state, AppState::Browse);
            assert_eq!(app.dashboard.stat_cards.finished, 2);

            press(&mut app, KeyCode::Char('h'));
            assert_eq!(app.state, AppState::Browse);
            assert!(app.status_message.contains("already"));
        }
        let t1 = find_owner(&store, "t1").unwrap();
        assert_eq!(t1.item.handoff_comment.as_deref(), Some("ready"));
        assert!(t1.item.completed_at.is_some());
    }

    #[test]
    fn delete_needs_confirmation() {
        let mut store = demo_store();
        {
            let mut app = App::new(&mut store, "u1").unwrap();
            press(&mut app, KeyCode::Char('d'));
            press(&mut app, KeyCode::Char('n'));
            assert_eq!(app.rows.len(), 2);
            press(&mut app, KeyCode::Char('d'));
            press(&mut app, KeyCode::Char('y'));
            assert_eq!(app.rows, vec![RowRef::Task(0)]);
            assert_eq!(app.selected_item().map(|i| i.id.as_str()), Some("t2"));
        }
        assert_eq!(store.fetch_tasks().unwrap().len(), 1);
    }

    #[test]
    fn archive_search_narrows_finished_items() {
        let mut store = demo_store();
        let mut app = App::new(&mut store, "u1").unwrap();
        press(&mut app, KeyCode::Char('3'));
        assert_eq!(app.archive_items().len(), 1);
        press(&mut app, KeyCode::Char('/'));
        for c in "nothing".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        assert!(app.archive_items().is_empty());
        assert_eq!(app.archive_state.selected(), None);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.state, AppState::Browse);
        assert_eq!(app.archive_items().len(), 1);
        // 'q' quits only outside the search box
        assert!(press(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn ctrl_c_always_quits() {
        let mut store = demo_store();
        let mut app = App::new(&mut store, "u1").unwrap();
        press(&mut app, KeyCode::Char('h'));
        assert!(app.handle_key(KeyCode::Char('c'), KeyModifiers::CONTROL));
    }
}
