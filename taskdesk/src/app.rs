//! Application state and event handling.
//!
//! [`App`] is pure state: key presses come in through
//! [`App::handle_key_event`], which may return a [`NetCommand`] for the
//! data task, and results come back through [`App::apply_event`].

use std::fmt::Write as _;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use taskdesk_proto::task::{Priority, Task, TaskFilter, TaskId, TaskStatus};
use taskdesk_proto::validate::{FieldError, validate_create};
use taskdesk_proto::wire::TaskPayload;

use crate::api::ClientError;
use crate::data::Connectivity;
use crate::net::{NetCommand, NetEvent};

/// Shown whenever the server cannot be reached.
pub const OFFLINE_NOTICE: &str = "cannot reach server, press r to retry";

/// Date format used by the form's due date field.
pub const FORM_DATE_FORMAT: &str = "%Y-%m-%d";

/// What the main area is showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// The task list has the keyboard.
    Browse,
    /// The create/edit dialog is open.
    Form(TaskForm),
    /// Waiting for y/n on a delete.
    ConfirmDelete {
        /// Task to delete.
        id: TaskId,
        /// Its title, for the prompt.
        title: String,
    },
}

/// Severity of a status bar notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Confirmation of a completed action.
    Info,
    /// Something failed.
    Error,
}

/// One-line message shown in the status bar until replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Message text.
    pub text: String,
    /// Severity.
    pub kind: NoticeKind,
}

impl Notice {
    fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: NoticeKind::Info,
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: NoticeKind::Error,
        }
    }
}

/// Input fields of the task form, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    /// Title text.
    Title,
    /// Description text.
    Description,
    /// Due date as `YYYY-MM-DD`.
    DueDate,
    /// Priority selector.
    Priority,
}

impl FormField {
    /// All fields in tab order.
    pub const ALL: [Self; 4] = [Self::Title, Self::Description, Self::DueDate, Self::Priority];

    /// Label shown next to the input.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Description => "Description",
            Self::DueDate => "Due date",
            Self::Priority => "Priority",
        }
    }

    /// Field name used in validation errors.
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::DueDate => "dueDate",
            Self::Priority => "priority",
        }
    }

    const fn next(self) -> Self {
        match self {
            Self::Title => Self::Description,
            Self::Description => Self::DueDate,
            Self::DueDate => Self::Priority,
            Self::Priority => Self::Title,
        }
    }

    const fn prev(self) -> Self {
        match self {
            Self::Title => Self::Priority,
            Self::Description => Self::Title,
            Self::DueDate => Self::Description,
            Self::Priority => Self::DueDate,
        }
    }
}

/// State of the create/edit dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskForm {
    /// `Some` when editing an existing task.
    pub editing: Option<TaskId>,
    /// Title input.
    pub title: String,
    /// Description input.
    pub description: String,
    /// Due date input.
    pub due_date: String,
    /// Selected priority.
    pub priority: Priority,
    /// Focused field.
    pub focus: FormField,
    /// Errors from local checks or the server.
    pub errors: Vec<FieldError>,
    /// A save is in flight.
    pub submitting: bool,
    /// Due date of the task being edited. Its time of day survives edits
    /// that only touch the date, and edits that leave the date alone.
    original_due: Option<DateTime<Utc>>,
}

impl TaskForm {
    /// Empty form for a new task: due today, medium priority.
    #[must_use]
    pub fn create() -> Self {
        Self {
            editing: None,
            title: String::new(),
            description: String::new(),
            due_date: chrono::Local::now()
                .date_naive()
                .format(FORM_DATE_FORMAT)
                .to_string(),
            priority: Priority::Medium,
            focus: FormField::Title,
            errors: Vec::new(),
            submitting: false,
            original_due: None,
        }
    }

    /// Form pre-filled from `task`.
    #[must_use]
    pub fn edit(task: &Task) -> Self {
        Self {
            editing: Some(task.id),
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            due_date: task.due_date.format(FORM_DATE_FORMAT).to_string(),
            priority: task.priority,
            focus: FormField::Title,
            errors: Vec::new(),
            submitting: false,
            original_due: Some(task.due_date),
        }
    }

    /// Dialog title.
    #[must_use]
    pub const fn heading(&self) -> &'static str {
        if self.editing.is_some() {
            "Edit Task"
        } else {
            "Create New Task"
        }
    }

    /// First error for `field`, if any.
    #[must_use]
    pub fn error_for(&self, field: FormField) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field.wire_name())
            .map(|e| e.message.as_str())
    }

    /// Current text of a text field. Priority has no text.
    #[must_use]
    pub fn text(&self, field: FormField) -> &str {
        match field {
            FormField::Title => &self.title,
            FormField::Description => &self.description,
            FormField::DueDate => &self.due_date,
            FormField::Priority => self.priority.as_str(),
        }
    }

    fn text_mut(&mut self, field: FormField) -> Option<&mut String> {
        match field {
            FormField::Title => Some(&mut self.title),
            FormField::Description => Some(&mut self.description),
            FormField::DueDate => Some(&mut self.due_date),
            FormField::Priority => None,
        }
    }

    fn cycle_priority(&mut self, forward: bool) {
        let all = Priority::ALL;
        let idx = all.iter().position(|p| *p == self.priority).unwrap_or(1);
        let next = if forward {
            (idx + 1) % all.len()
        } else {
            (idx + all.len() - 1) % all.len()
        };
        self.priority = all[next];
    }

    /// Request body for the form's current contents. The description is
    /// always sent so clearing it on edit removes it.
    #[must_use]
    pub fn payload(&self) -> TaskPayload {
        TaskPayload {
            title: Some(self.title.clone()),
            description: Some(self.description.clone()),
            due_date: Some(self.due_date_text()),
            priority: Some(self.priority.as_str().to_string()),
            status: None,
        }
    }

    /// The due date to send. When editing, a plain `YYYY-MM-DD` keeps the
    /// task's original time of day; anything else is sent as typed.
    fn due_date_text(&self) -> String {
        let typed = self.due_date.trim();
        let Some(original) = self.original_due else {
            return typed.to_string();
        };
        match NaiveDate::parse_from_str(typed, FORM_DATE_FORMAT) {
            Ok(date) => date
                .and_time(original.time())
                .and_utc()
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            Err(_) => typed.to_string(),
        }
    }

    /// Runs the same checks the server does, so obvious mistakes never
    /// leave the client.
    fn check(&self) -> Result<TaskPayload, Vec<FieldError>> {
        let payload = self.payload();
        validate_create(&payload)
            .map(|_| payload)
            .map_err(taskdesk_proto::validate::ValidationErrors::into_errors)
    }
}

/// Main application state.
pub struct App {
    /// Tasks for the current filter, sorted by due date.
    pub tasks: Vec<Task>,
    /// Index of the highlighted task.
    pub selected: usize,
    /// Active list filter.
    pub filter: TaskFilter,
    /// What has the keyboard.
    pub mode: Mode,
    /// Server reachability as last reported.
    pub connectivity: Connectivity,
    /// A list load is outstanding.
    pub loading: bool,
    /// Status bar message.
    pub notice: Option<Notice>,
    /// Due date display format.
    pub date_format: String,
    /// Whether the app should quit.
    pub should_quit: bool,
}

impl App {
    /// Create an empty app. Nothing is shown until the first
    /// [`NetEvent::TasksLoaded`].
    #[must_use]
    pub fn new(date_format: impl Into<String>) -> Self {
        Self {
            tasks: Vec::new(),
            selected: 0,
            filter: TaskFilter::ALL,
            mode: Mode::Browse,
            connectivity: Connectivity::Unknown,
            loading: true,
            notice: None,
            date_format: date_format.into(),
            should_quit: false,
        }
    }

    /// The command that starts the session.
    #[must_use]
    pub const fn connect_command(&self) -> NetCommand {
        NetCommand::Connect {
            filter: self.filter,
        }
    }

    /// The highlighted task.
    #[must_use]
    pub fn selected_task(&self) -> Option<&Task> {
        self.tasks.get(self.selected)
    }

    /// `task`'s due date in the configured display format. Falls back to
    /// ISO dates if the configured format is invalid.
    #[must_use]
    pub fn format_due(&self, task: &Task) -> String {
        let mut out = String::new();
        match write!(out, "{}", task.due_date.format(&self.date_format)) {
            Ok(()) => out,
            Err(_) => task.due_date.format(FORM_DATE_FORMAT).to_string(),
        }
    }

    /// Handle a key event.
    ///
    /// Returns `Some(NetCommand)` when the key requires work from the data
    /// task.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<NetCommand> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return None;
        }

        match &self.mode {
            Mode::Browse => self.handle_browse_key(key),
            Mode::Form(_) => self.handle_form_key(key),
            Mode::ConfirmDelete { .. } => self.handle_confirm_key(key),
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent) -> Option<NetCommand> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.tasks.len() {
                    self.selected += 1;
                }
                None
            }
            KeyCode::Char('r') => {
                self.loading = true;
                if self.connectivity.is_online() {
                    Some(NetCommand::Refresh {
                        filter: self.filter,
                    })
                } else {
                    Some(self.connect_command())
                }
            }
            KeyCode::Char('s') => {
                self.filter.status = cycle(&TaskStatus::ALL, self.filter.status);
                Some(self.reload())
            }
            KeyCode::Char('p') => {
                self.filter.priority = cycle(&Priority::ALL, self.filter.priority);
                Some(self.reload())
            }
            KeyCode::Char('n') => {
                if self.refuse_offline() {
                    return None;
                }
                self.mode = Mode::Form(TaskForm::create());
                None
            }
            KeyCode::Char('e') => {
                if self.refuse_offline() {
                    return None;
                }
                if let Some(task) = self.selected_task() {
                    self.mode = Mode::Form(TaskForm::edit(task));
                }
                None
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                if self.refuse_offline() {
                    return None;
                }
                let task = self.selected_task()?.clone();
                self.loading = true;
                Some(NetCommand::Toggle {
                    task,
                    filter: self.filter,
                })
            }
            KeyCode::Char('d') => {
                if self.refuse_offline() {
                    return None;
                }
                let task = self.selected_task()?;
                self.mode = Mode::ConfirmDelete {
                    id: task.id,
                    title: task.title.clone(),
                };
                None
            }
            _ => None,
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Option<NetCommand> {
        let filter = self.filter;
        let Mode::Form(form) = &mut self.mode else {
            return None;
        };
        if form.submitting {
            // Only cancelling is allowed while a save is in flight.
            if key.code == KeyCode::Esc {
                self.mode = Mode::Browse;
            }
            return None;
        }

        match key.code {
            KeyCode::Esc => {
                self.mode = Mode::Browse;
                None
            }
            KeyCode::Tab | KeyCode::Down => {
                form.focus = form.focus.next();
                None
            }
            KeyCode::BackTab | KeyCode::Up => {
                form.focus = form.focus.prev();
                None
            }
            KeyCode::Left if form.focus == FormField::Priority => {
                form.cycle_priority(false);
                None
            }
            KeyCode::Right | KeyCode::Char(' ') if form.focus == FormField::Priority => {
                form.cycle_priority(true);
                None
            }
            KeyCode::Enter => match form.check() {
                Ok(payload) => {
                    form.errors.clear();
                    form.submitting = true;
                    Some(match form.editing {
                        Some(id) => NetCommand::Update {
                            id,
                            payload,
                            filter,
                        },
                        None => NetCommand::Create { payload, filter },
                    })
                }
                Err(errors) => {
                    form.errors = errors;
                    None
                }
            },
            KeyCode::Backspace => {
                if let Some(text) = form.text_mut(form.focus) {
                    text.pop();
                }
                None
            }
            KeyCode::Char(c) => {
                if let Some(text) = form.text_mut(form.focus) {
                    text.push(c);
                }
                None
            }
            _ => None,
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) -> Option<NetCommand> {
        match key.code {
            KeyCode::Char('y' | 'Y') => {
                let Mode::ConfirmDelete { id, .. } = std::mem::replace(&mut self.mode, Mode::Browse)
                else {
                    return None;
                };
                self.loading = true;
                Some(NetCommand::Delete {
                    id,
                    filter: self.filter,
                })
            }
            KeyCode::Char('n' | 'N') | KeyCode::Esc => {
                self.mode = Mode::Browse;
                None
            }
            _ => None,
        }
    }

    fn reload(&mut self) -> NetCommand {
        self.loading = true;
        self.selected = 0;
        NetCommand::Load {
            filter: self.filter,
        }
    }

    /// Sets the offline notice and returns `true` if mutations are blocked.
    fn refuse_offline(&mut self) -> bool {
        if self.connectivity.is_online() {
            return false;
        }
        self.notice = Some(Notice::error(OFFLINE_NOTICE));
        true
    }

    fn report(&mut self, context: &str, error: &ClientError) {
        let text = if error.is_unreachable() {
            OFFLINE_NOTICE.to_string()
        } else {
            format!("{context}: {error}")
        };
        self.notice = Some(Notice::error(text));
    }

    /// Apply an event from the data task.
    pub fn apply_event(&mut self, event: NetEvent) {
        match event {
            NetEvent::Connectivity(state) => {
                match &state {
                    Connectivity::Online => {
                        if self
                            .notice
                            .as_ref()
                            .is_some_and(|n| n.text == OFFLINE_NOTICE)
                        {
                            self.notice = None;
                        }
                    }
                    Connectivity::Offline(_) => {
                        self.loading = false;
                        self.notice = Some(Notice::error(OFFLINE_NOTICE));
                    }
                    Connectivity::Unknown => {}
                }
                self.connectivity = state;
            }
            NetEvent::TasksLoaded { filter, tasks } => {
                // A reply for a filter the user has since moved away from.
                if filter != self.filter {
                    return;
                }
                self.tasks = tasks;
                self.selected = self.selected.min(self.tasks.len().saturating_sub(1));
                self.loading = false;
            }
            NetEvent::LoadFailed { filter, error } => {
                if filter == self.filter {
                    self.loading = false;
                    self.report("Failed to load tasks", &error);
                }
            }
            NetEvent::Saved { task, created } => {
                if matches!(self.mode, Mode::Form(_)) {
                    self.mode = Mode::Browse;
                }
                let verb = if created { "created" } else { "updated" };
                self.notice = Some(Notice::info(format!("Task \"{}\" {verb}", task.title)));
                self.loading = true;
            }
            NetEvent::SaveRejected(errors) => {
                if let Mode::Form(form) = &mut self.mode {
                    form.submitting = false;
                    form.errors = errors;
                }
            }
            NetEvent::SaveFailed(error) => {
                if let Mode::Form(form) = &mut self.mode {
                    form.submitting = false;
                }
                self.report("Failed to save task", &error);
            }
            NetEvent::StatusChanged(task) => {
                self.notice = Some(Notice::info(format!(
                    "Task \"{}\" marked {}",
                    task.title, task.status
                )));
                if let Some(slot) = self.tasks.iter_mut().find(|t| t.id == task.id) {
                    *slot = task;
                }
            }
            NetEvent::Deleted(id) => {
                self.tasks.retain(|t| t.id != id);
                self.selected = self.selected.min(self.tasks.len().saturating_sub(1));
                self.notice = Some(Notice::info("Task deleted"));
            }
            NetEvent::MutationFailed(error) => {
                self.loading = false;
                self.report("Request failed", &error);
            }
        }
    }

    /// Shows a local problem, such as a full command channel. The command
    /// that hit it was never sent.
    pub fn push_error(&mut self, text: impl Into<String>) {
        self.loading = false;
        if let Mode::Form(form) = &mut self.mode {
            form.submitting = false;
        }
        self.notice = Some(Notice::error(text));
    }
}

/// `None` → first → … → last → `None`.
fn cycle<T: Copy + PartialEq>(all: &[T], current: Option<T>) -> Option<T> {
    match current {
        None => all.first().copied(),
        Some(value) => {
            let idx = all.iter().position(|v| *v == value)?;
            all.get(idx + 1).copied()
        }
    }
}
