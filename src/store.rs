//! Persistence capability for tasks and projects.
//!
//! The rest of the crate talks to storage only through [`TaskStore`]. Two
//! backends are provided: [`FileStore`], a JSON workspace file written after
//! every change, and [`MemoryStore`], an in-memory workspace used for mock
//! mode and tests. The workspace operations at the bottom of this module
//! (add, handoff, delete, seed...) are written against the trait.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::db::{demo_projects, demo_tasks, next_id, Workspace};
use crate::error::{Result, TaskFirstError};
use crate::fields::Priority;
use crate::task::{Handoff, ItemUpdate, Project, SubTask, Task, User, WorkItem};

/// Callback receiving every new task snapshot.
pub type TaskWatcher = Box<dyn FnMut(&[Task])>;

/// Handle returned by [`TaskStore::watch_tasks`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchId(usize);

/// Read and write access to a workspace backend.
pub trait TaskStore {
    fn fetch_tasks(&self) -> Result<Vec<Task>>;
    fn fetch_projects(&self) -> Result<Vec<Project>>;
    fn fetch_users(&self) -> Result<Vec<User>>;
    fn fetch_departments(&self) -> Result<Vec<String>>;
    fn fetch_task_types(&self) -> Result<Vec<String>>;

    /// Insert the task, or replace the stored task with the same id.
    fn save_task(&mut self, task: Task) -> Result<()>;
    /// Remove a task together with its subtasks.
    fn delete_task(&mut self, id: &str) -> Result<()>;
    fn save_project(&mut self, project: Project) -> Result<()>;
    fn delete_project(&mut self, id: &str) -> Result<()>;

    /// Subscribe to task snapshots. The watcher receives the current tasks
    /// immediately and the full list again after every change.
    fn watch_tasks(&mut self, watcher: TaskWatcher) -> WatchId;
    fn unwatch(&mut self, id: WatchId);
}

fn upsert_task(workspace: &mut Workspace, task: Task) {
    match workspace.tasks.iter_mut().find(|t| t.id() == task.id()) {
        Some(existing) => *existing = task,
        None => workspace.tasks.push(task),
    }
}

fn remove_task(workspace: &mut Workspace, id: &str) -> Result<()> {
    let before = workspace.tasks.len();
    workspace.tasks.retain(|t| t.id() != id);
    if workspace.tasks.len() == before {
        return Err(TaskFirstError::TaskNotFound(id.to_string()));
    }
    Ok(())
}

fn upsert_project(workspace: &mut Workspace, project: Project) {
    match workspace.projects.iter_mut().find(|p| p.id == project.id) {
        Some(existing) => *existing = project,
        None => workspace.projects.push(project),
    }
}

fn remove_project(workspace: &mut Workspace, id: &str) -> Result<()> {
    let before = workspace.projects.len();
    workspace.projects.retain(|p| p.id != id);
    if workspace.projects.len() == before {
        return Err(TaskFirstError::ProjectNotFound(id.to_string()));
    }
    let orphaned = workspace.tasks.iter().filter(|t| t.project_id == id).count();
    if orphaned > 0 {
        warn!(project = id, tasks = orphaned, "deleted project still referenced by tasks");
    }
    Ok(())
}

/// In-memory workspace backend.
#[derive(Default)]
pub struct MemoryStore {
    workspace: Workspace,
    watchers: Vec<(WatchId, TaskWatcher)>,
    next_watch: usize,
}

impl MemoryStore {
    pub fn new(workspace: Workspace) -> Self {
        MemoryStore { workspace, watchers: Vec::new(), next_watch: 0 }
    }

    /// The demo workspace used in mock mode.
    pub fn demo(today: NaiveDate, now: DateTime<Utc>) -> Self {
        MemoryStore::new(Workspace::demo(today, now))
    }

    fn notify(&mut self) {
        debug!(watchers = self.watchers.len(), tasks = self.workspace.tasks.len(), "publishing task snapshot");
        let tasks = &self.workspace.tasks;
        for (_, watcher) in self.watchers.iter_mut() {
            watcher(tasks);
        }
    }
}

impl TaskStore for MemoryStore {
    fn fetch_tasks(&self) -> Result<Vec<Task>> {
        Ok(self.workspace.tasks.clone())
    }

    fn fetch_projects(&self) -> Result<Vec<Project>> {
        Ok(self.workspace.projects.clone())
    }

    fn fetch_users(&self) -> Result<Vec<User>> {
        Ok(self.workspace.users.clone())
    }

    fn fetch_departments(&self) -> Result<Vec<String>> {
        Ok(self.workspace.departments.clone())
    }

    fn fetch_task_types(&self) -> Result<Vec<String>> {
        Ok(self.workspace.task_types.clone())
    }

    fn save_task(&mut self, task: Task) -> Result<()> {
        upsert_task(&mut self.workspace, task);
        self.notify();
        Ok(())
    }

    fn delete_task(&mut self, id: &str) -> Result<()> {
        remove_task(&mut self.workspace, id)?;
        self.notify();
        Ok(())
    }

    fn save_project(&mut self, project: Project) -> Result<()> {
        upsert_project(&mut self.workspace, project);
        Ok(())
    }

    fn delete_project(&mut self, id: &str) -> Result<()> {
        remove_project(&mut self.workspace, id)
    }

    fn watch_tasks(&mut self, mut watcher: TaskWatcher) -> WatchId {
        let id = WatchId(self.next_watch);
        self.next_watch += 1;
        watcher(&self.workspace.tasks);
        self.watchers.push((id, watcher));
        id
    }

    fn unwatch(&mut self, id: WatchId) {
        self.watchers.retain(|(w, _)| *w != id);
    }
}

/// JSON-file workspace backend. Every change is written straight to disk.
pub struct FileStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl FileStore {
    /// Open the workspace at `path`, creating it with reference data when
    /// the file does not exist yet.
    pub fn open(path: &Path) -> Result<Self> {
        let existed = path.exists();
        let workspace = Workspace::load(path)?;
        let store = FileStore { path: path.to_path_buf(), inner: MemoryStore::new(workspace) };
        if !existed {
            info!(path = %path.display(), "creating workspace");
            store.persist()?;
        } else {
            debug!(path = %path.display(), tasks = store.inner.workspace.tasks.len(), "loaded workspace");
        }
        Ok(store)
    }

    fn persist(&self) -> Result<()> {
        self.inner.workspace.save(&self.path)
    }

    /// Apply `change` to a copy of the workspace and write it out. Memory is
    /// only replaced once the file is on disk.
    fn commit<F>(&mut self, change: F) -> Result<()>
    where
        F: FnOnce(&mut Workspace) -> Result<()>,
    {
        let mut next = self.inner.workspace.clone();
        change(&mut next)?;
        next.save(&self.path)?;
        self.inner.workspace = next;
        Ok(())
    }
}

impl TaskStore for FileStore {
    fn fetch_tasks(&self) -> Result<Vec<Task>> {
        self.inner.fetch_tasks()
    }

    fn fetch_projects(&self) -> Result<Vec<Project>> {
        self.inner.fetch_projects()
    }

    fn fetch_users(&self) -> Result<Vec<User>> {
        self.inner.fetch_users()
    }

    fn fetch_departments(&self) -> Result<Vec<String>> {
        self.inner.fetch_departments()
    }

    fn fetch_task_types(&self) -> Result<Vec<String>> {
        self.inner.fetch_task_types()
    }

    fn save_task(&mut self, task: Task) -> Result<()> {
        self.commit(|ws| {
            upsert_task(ws, task);
            Ok(())
        })?;
        self.inner.notify();
        Ok(())
    }

    fn delete_task(&mut self, id: &str) -> Result<()> {
        self.commit(|ws| remove_task(ws, id))?;
        self.inner.notify();
        Ok(())
    }

    fn save_project(&mut self, project: Project) -> Result<()> {
        self.commit(|ws| {
            upsert_project(ws, project);
            Ok(())
        })
    }

    fn delete_project(&mut self, id: &str) -> Result<()> {
        self.commit(|ws| remove_project(ws, id))
    }

    fn watch_tasks(&mut self, watcher: TaskWatcher) -> WatchId {
        self.inner.watch_tasks(watcher)
    }

    fn unwatch(&mut self, id: WatchId) {
        self.inner.unwatch(id);
    }
}

// ============================================================================
// Workspace operations
// ============================================================================

/// Fields for a new task or subtask. Unset fields take workspace defaults.
#[derive(Debug, Clone, Default)]
pub struct NewItem {
    pub title: String,
    pub description: Option<String>,
    pub project_id: Option<String>,
    pub assignee_id: Option<String>,
    pub team: Option<String>,
    pub task_type: Option<String>,
    pub priority: Option<Priority>,
    pub deadline: Option<NaiveDate>,
    pub estimated_hours: Option<f64>,
}

/// Team given to new items when none is chosen.
pub const DEFAULT_TEAM: &str = "Design";
/// Task type used when the workspace defines none.
pub const FALLBACK_TASK_TYPE: &str = "General";
/// Project created when a task is added to a workspace without projects.
pub const DEFAULT_PROJECT_NAME: &str = "Default Project";

fn build_item<S: TaskStore + ?Sized>(store: &S, id: String, new: &NewItem, actor: &str) -> Result<WorkItem> {
    if new.title.trim().is_empty() {
        return Err(TaskFirstError::InvalidInput("title cannot be empty".into()));
    }
    let assignee = new.assignee_id.as_deref().unwrap_or(actor);
    let users = store.fetch_users()?;
    for id in [actor, assignee] {
        if !users.iter().any(|u| u.id == id) {
            return Err(TaskFirstError::UserNotFound(id.to_string()));
        }
    }
    let task_type = match new.task_type.clone() {
        Some(t) => t,
        None => store.fetch_task_types()?.into_iter().next().unwrap_or_else(|| FALLBACK_TASK_TYPE.to_string()),
    };
    let team = new.team.as_deref().unwrap_or(DEFAULT_TEAM);

    let mut item = WorkItem::new(id, new.title.clone(), assignee, team, &task_type);
    item.creator_id = actor.to_string();
    item.description = new.description.clone();
    if let Some(priority) = new.priority {
        item.priority = priority;
    }
    item.deadline = new.deadline;
    if let Some(est) = new.estimated_hours {
        item.apply(&ItemUpdate { estimated_hours: Some(est), ..Default::default() })?;
    }
    Ok(item)
}

fn all_item_ids(tasks: &[Task]) -> impl Iterator<Item = &str> {
    tasks.iter().flat_map(|t| std::iter::once(t.id()).chain(t.sub_tasks.iter().map(|s| s.id.as_str())))
}

/// Create a top-level task. Without a project it lands in the first
/// project, or in a freshly created default project.
pub fn add_task<S: TaskStore + ?Sized>(store: &mut S, new: &NewItem, actor: &str, now: DateTime<Utc>) -> Result<Task> {
    let tasks = store.fetch_tasks()?;
    let id = next_id("t", all_item_ids(&tasks));
    let item = build_item(store, id, new, actor)?;

    let projects = store.fetch_projects()?;
    let project_id = match new.project_id.clone() {
        Some(id) if projects.iter().any(|p| p.id == id) => id,
        Some(id) => return Err(TaskFirstError::ProjectNotFound(id)),
        None => match projects.first() {
            Some(p) => p.id.clone(),
            None => add_project(store, DEFAULT_PROJECT_NAME)?.id,
        },
    };
    let task = Task::new(item, project_id, now);
    store.save_task(task.clone())?;
    info!(id = task.id(), title = %task.item.title, "task added");
    Ok(task)
}

/// Append a subtask to the task `parent_id`.
pub fn add_subtask<S: TaskStore + ?Sized>(
    store: &mut S,
    parent_id: &str,
    new: &NewItem,
    actor: &str,
    now: DateTime<Utc>,
) -> Result<SubTask> {
    let tasks = store.fetch_tasks()?;
    let id = next_id("s", all_item_ids(&tasks));
    let mut parent = tasks
        .into_iter()
        .find(|t| t.id() == parent_id)
        .ok_or_else(|| TaskFirstError::TaskNotFound(parent_id.to_string()))?;

    let sub = build_item(store, id, new, actor)?;
    parent.sub_tasks.push(sub.clone());
    parent.updated_at = now;
    store.save_task(parent)?;
    info!(id = %sub.id, parent = parent_id, "subtask added");
    Ok(sub)
}

/// The task owning `id`, where `id` names the task or one of its subtasks.
pub fn find_owner<S: TaskStore + ?Sized>(store: &S, id: &str) -> Result<Task> {
    store
        .fetch_tasks()?
        .into_iter()
        .find(|t| t.find_item(id).is_some())
        .ok_or_else(|| TaskFirstError::TaskNotFound(id.to_string()))
}

fn modify_item<S, F>(store: &mut S, id: &str, now: DateTime<Utc>, change: F) -> Result<WorkItem>
where
    S: TaskStore + ?Sized,
    F: FnOnce(&mut WorkItem) -> Result<()>,
{
    let mut owner = find_owner(store, id)?;
    let item = owner.find_item_mut(id).ok_or_else(|| TaskFirstError::TaskNotFound(id.to_string()))?;
    change(item)?;
    let updated = item.clone();
    owner.updated_at = now;
    store.save_task(owner)?;
    Ok(updated)
}

/// Edit a task or subtask in place. Moving a task to another project is
/// only meaningful for top-level tasks.
pub fn update_item<S: TaskStore + ?Sized>(
    store: &mut S,
    id: &str,
    update: &ItemUpdate,
    now: DateTime<Utc>,
) -> Result<WorkItem> {
    if let Some(ref assignee) = update.assignee_id {
        if !store.fetch_users()?.iter().any(|u| &u.id == assignee) {
            return Err(TaskFirstError::UserNotFound(assignee.clone()));
        }
    }
    if let Some(ref project_id) = update.project_id {
        if !store.fetch_projects()?.iter().any(|p| &p.id == project_id) {
            return Err(TaskFirstError::ProjectNotFound(project_id.clone()));
        }
    }

    let mut owner = find_owner(store, id)?;
    if let Some(ref project_id) = update.project_id {
        if owner.id() != id {
            return Err(TaskFirstError::InvalidInput(format!("subtask '{id}' has no project of its own")));
        }
        owner.project_id = project_id.clone();
    }
    let item = owner.find_item_mut(id).ok_or_else(|| TaskFirstError::TaskNotFound(id.to_string()))?;
    item.apply(update)?;
    let item = item.clone();
    owner.updated_at = now;
    store.save_task(owner)?;
    debug!(id, "item updated");
    Ok(item)
}

/// Hand off a task or subtask: mark it Finished and stamp `now`.
pub fn handoff<S: TaskStore + ?Sized>(store: &mut S, id: &str, handoff: &Handoff, now: DateTime<Utc>) -> Result<WorkItem> {
    let item = modify_item(store, id, now, |item| item.handoff(handoff, now))?;
    info!(id, "deliverable handed off");
    Ok(item)
}

/// Delete a task with all its subtasks, or a single subtask.
pub fn delete_item<S: TaskStore + ?Sized>(store: &mut S, id: &str, now: DateTime<Utc>) -> Result<()> {
    let mut owner = find_owner(store, id)?;
    if owner.id() == id {
        let subtasks = owner.sub_tasks.len();
        store.delete_task(id)?;
        info!(id, subtasks, "task deleted");
    } else {
        owner.sub_tasks.retain(|s| s.id != id);
        owner.updated_at = now;
        store.save_task(owner)?;
        info!(id, "subtask deleted");
    }
    Ok(())
}

/// Register a new project.
pub fn add_project<S: TaskStore + ?Sized>(store: &mut S, name: &str) -> Result<Project> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TaskFirstError::InvalidInput("project name cannot be empty".into()));
    }
    let projects = store.fetch_projects()?;
    let id = next_id("p", projects.iter().map(|p| p.id.as_str()));
    let project = Project { id, name: name.to_string() };
    store.save_project(project.clone())?;
    info!(id = %project.id, name, "project added");
    Ok(project)
}

/// Fill an empty store with the demo projects and tasks. Returns whether
/// anything was written; a store holding tasks or projects is left alone.
pub fn seed<S: TaskStore + ?Sized>(store: &mut S, today: NaiveDate, now: DateTime<Utc>) -> Result<bool> {
    if !store.fetch_tasks()?.is_empty() || !store.fetch_projects()?.is_empty() {
        debug!("store not empty, skipping seed");
        return Ok(false);
    }
    info!("store empty, seeding demo data");
    for project in demo_projects() {
        store.save_project(project)?;
    }
    for task in demo_tasks(today, now) {
        store.save_task(task)?;
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Status;
    use chrono::TimeZone;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::TempDir;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 12).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 12, 9, 0, 0).unwrap()
    }

    fn new_item(title: &str) -> NewItem {
        NewItem { title: title.into(), ..Default::default() }
    }

    #[test]
    fn add_task_uses_workspace_defaults() {
        let mut store = MemoryStore::new(Workspace { projects: demo_projects(), ..Workspace::reference() });
        let task = add_task(&mut store, &new_item("New Mission Item"), "u1", now()).unwrap();
        assert_eq!(task.id(), "t1");
        assert_eq!(task.project_id, "p1");
        assert_eq!(task.item.assignee_id, "u1");
        assert_eq!(task.item.creator_id, "u1");
        assert_eq!(task.item.team, DEFAULT_TEAM);
        assert_eq!(task.item.task_type, "UI Design");
        assert_eq!(task.item.priority, Priority::Medium);
        assert_eq!(task.item.status, Status::NotStarted);
        assert_eq!(store.fetch_tasks().unwrap().len(), 1);
    }

    #[test]
    fn add_task_without_projects_creates_default_project() {
        let mut store = MemoryStore::new(Workspace::reference());
        let task = add_task(&mut store, &new_item("Orphan"), "u1", now()).unwrap();
        let projects = store.fetch_projects().unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].name, DEFAULT_PROJECT_NAME);
        assert_eq!(task.project_id, projects[0].id);
    }

    #[test]
    fn add_rejects_unknown_references() {
        let mut store = MemoryStore::new(Workspace { projects: demo_projects(), ..Workspace::reference() });
        let bad_user = NewItem { assignee_id: Some("u99".into()), ..new_item("x") };
        assert!(matches!(add_task(&mut store, &bad_user, "u1", now()), Err(TaskFirstError::UserNotFound(_))));
        let bad_project = NewItem { project_id: Some("p99".into()), ..new_item("x") };
        assert!(matches!(add_task(&mut store, &bad_project, "u1", now()), Err(TaskFirstError::ProjectNotFound(_))));
        assert!(matches!(add_task(&mut store, &new_item("  "), "u1", now()), Err(TaskFirstError::InvalidInput(_))));
    }

    #[test]
    fn subtask_ids_do_not_collide_with_demo_ids() {
        let mut store = MemoryStore::demo(today(), now());
        let sub = add_subtask(&mut store, "t2", &new_item("Action Point"), "u1", now()).unwrap();
        assert_eq!(sub.id, "s2");
        let owner = find_owner(&store, "s2").unwrap();
        assert_eq!(owner.id(), "t2");
        assert!(matches!(
            add_subtask(&mut store, "s1", &new_item("nested"), "u1", now()),
            Err(TaskFirstError::TaskNotFound(_))
        ));
    }

    #[test]
    fn handoff_subtask_stamps_and_persists() {
        let mut store = MemoryStore::demo(today(), now());
        let later = now() + chrono::Duration::hours(3);
        let handed = handoff(&mut store, "t2", &Handoff { comment: Some("shipped".into()), ..Default::default() }, later)
            .unwrap();
        assert_eq!(handed.status, Status::Finished);
        let task = find_owner(&store, "t2").unwrap();
        assert_eq!(task.item.completed_at, Some(later));
        assert_eq!(task.updated_at, later);

        let again = handoff(&mut store, "t2", &Handoff::default(), later);
        assert!(matches!(again, Err(TaskFirstError::AlreadyFinished(_))));
    }

    #[test]
    fn update_moves_task_between_projects_but_not_subtasks() {
        let mut store = MemoryStore::demo(today(), now());
        let update = ItemUpdate { project_id: Some("p3".into()), ..Default::default() };
        update_item(&mut store, "t1", &update, now()).unwrap();
        assert_eq!(find_owner(&store, "t1").unwrap().project_id, "p3");
        assert!(matches!(update_item(&mut store, "s1", &update, now()), Err(TaskFirstError::InvalidInput(_))));
    }

    #[test]
    fn failed_update_leaves_project_unchanged() {
        let mut store = MemoryStore::demo(today(), now());
        let before = find_owner(&store, "t1").unwrap().project_id;
        let update = ItemUpdate { project_id: Some("p3".into()), estimated_hours: Some(-1.0), ..Default::default() };
        assert!(matches!(update_item(&mut store, "t1", &update, now()), Err(TaskFirstError::InvalidInput(_))));
        assert_eq!(find_owner(&store, "t1").unwrap().project_id, before);
        assert_ne!(before, "p3");
    }

    #[test]
    fn handed_off_item_stays_finished() {
        let mut store = MemoryStore::demo(today(), now());
        handoff(&mut store, "t2", &Handoff::default(), now()).unwrap();

        let reopen = ItemUpdate { status: Some(Status::InProgress), ..Default::default() };
        let later = now() + chrono::Duration::days(3);
        assert!(matches!(update_item(&mut store, "t2", &reopen, later), Err(TaskFirstError::AlreadyFinished(_))));
        assert!(matches!(handoff(&mut store, "t2", &Handoff::default(), later), Err(TaskFirstError::AlreadyFinished(_))));

        let task = find_owner(&store, "t2").unwrap();
        assert_eq!(task.item.status, Status::Finished);
        assert_eq!(task.item.completed_at, Some(now()));
    }

    #[test]
    fn unknown_actor_cannot_create_items() {
        let mut store = MemoryStore::demo(today(), now());
        let item = NewItem { assignee_id: Some("u1".into()), ..new_item("Ghost") };
        assert!(matches!(add_task(&mut store, &item, "u99", now()), Err(TaskFirstError::UserNotFound(id)) if id == "u99"));
        assert!(matches!(add_subtask(&mut store, "t1", &item, "u99", now()), Err(TaskFirstError::UserNotFound(_))));
        assert_eq!(store.fetch_tasks().unwrap().len(), 2);
    }

    #[test]
    fn deleting_task_discards_subtasks() {
        let mut store = MemoryStore::demo(today(), now());
        delete_item(&mut store, "t1", now()).unwrap();
        assert!(matches!(find_owner(&store, "s1"), Err(TaskFirstError::TaskNotFound(_))));
        assert_eq!(store.fetch_tasks().unwrap().len(), 1);
    }

    #[test]
    fn deleting_subtask_keeps_parent() {
        let mut store = MemoryStore::demo(today(), now());
        delete_item(&mut store, "s1", now()).unwrap();
        let parent = find_owner(&store, "t1").unwrap();
        assert!(parent.sub_tasks.is_empty());
    }

    #[test]
    fn seed_only_fills_empty_store() {
        let mut store = MemoryStore::new(Workspace::reference());
        assert!(seed(&mut store, today(), now()).unwrap());
        assert_eq!(store.fetch_tasks().unwrap().len(), 2);
        assert_eq!(store.fetch_projects().unwrap().len(), 3);
        assert!(!seed(&mut store, today(), now()).unwrap());
        assert_eq!(store.fetch_tasks().unwrap().len(), 2);
    }

    #[test]
    fn watchers_see_every_snapshot() {
        let seen: Rc<RefCell<Vec<usize>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut store = MemoryStore::demo(today(), now());
        let id = store.watch_tasks(Box::new(move |tasks: &[Task]| sink.borrow_mut().push(tasks.len())));

        add_task(&mut store, &new_item("Third"), "u1", now()).unwrap();
        delete_item(&mut store, "t1", now()).unwrap();
        store.unwatch(id);
        add_task(&mut store, &new_item("Unseen"), "u1", now()).unwrap();

        assert_eq!(*seen.borrow(), vec![2, 3, 2]);
    }

    #[test]
    fn file_store_creates_and_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("workspace.json");
        {
            let mut store = FileStore::open(&path).unwrap();
            assert!(path.exists());
            add_task(&mut store, &new_item("Persisted"), "u1", now()).unwrap();
        }
        let reopened = FileStore::open(&path).unwrap();
        let tasks = reopened.fetch_tasks().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].item.title, "Persisted");
    }

    #[test]
    fn file_store_failed_update_is_not_written() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("workspace.json");
        {
            let mut store = FileStore::open(&path).unwrap();
            seed(&mut store, today(), now()).unwrap();
            let update = ItemUpdate { project_id: Some("p3".into()), estimated_hours: Some(-1.0), ..Default::default() };
            assert!(update_item(&mut store, "t1", &update, now()).is_err());
        }
        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(find_owner(&reopened, "t1").unwrap().project_id, "p1");
    }

    #[test]
    fn file_store_keeps_memory_when_write_fails() {
        let dir = TempDir::new().unwrap();
        let folder = dir.path().join("ws");
        let path = folder.join("workspace.json");
        let mut store = FileStore::open(&path).unwrap();
        let seen: Rc<RefCell<Vec<usize>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        store.watch_tasks(Box::new(move |tasks: &[Task]| sink.borrow_mut().push(tasks.len())));

        // parent directory replaced by a plain file
        std::fs::remove_dir_all(&folder).unwrap();
        std::fs::write(&folder, "not a directory").unwrap();

        let result = add_task(&mut store, &new_item("Lost"), "u1", now());
        assert!(matches!(result, Err(TaskFirstError::Io { .. })));
        assert!(store.fetch_tasks().unwrap().is_empty());
        assert!(store.fetch_projects().unwrap().is_empty());
        assert_eq!(*seen.borrow(), vec![0]);
    }

    #[test]
    fn deleting_missing_things_fails() {
        let mut store = MemoryStore::new(Workspace::reference());
        assert!(matches!(store.delete_task("t9"), Err(TaskFirstError::TaskNotFound(_))));
        assert!(matches!(store.delete_project("p9"), Err(TaskFirstError::ProjectNotFound(_))));
        assert!(matches!(delete_item(&mut store, "t9", now()), Err(TaskFirstError::TaskNotFound(_))));
    }
}
