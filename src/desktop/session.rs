//! Desktop reducer and the async session that executes its effects.

use std::collections::HashMap;

use thiserror::Error;

use super::cache::{Mutation, MutationOutcome, QueryCache, QueryKey};
use super::geometry::{Point, Viewport};
use super::icons::{layout_icons, DesktopIcon, IconDrag};
use super::menu::{Command, ContextMenu, MenuTarget};
use super::viewer::{TextViewer, Viewer};
use super::window::{WindowDescriptor, WindowError, WindowId, WindowManager};
use crate::api::dto::{FileResponse, LoginRequest, UpdateSettingsRequest, UserResponse};
use crate::client::{ApiClient, ClientError, UploadFile};

#[derive(Debug, Error)]
pub enum DesktopError {
    #[error(transparent)]
    Window(#[from] WindowError),
    #[error("file not on the desktop: {0}")]
    UnknownFile(String),
    #[error("window {0} has no text viewer")]
    NotEditable(WindowId),
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// UI events accepted by [`Desktop::reduce`].
#[derive(Debug, Clone, PartialEq)]
pub enum DesktopAction {
    OpenFile(String),
    OpenWindow(WindowDescriptor),
    CloseWindow(WindowId),
    FocusWindow(WindowId),
    MinimizeWindow(WindowId),
    MaximizeWindow(WindowId),
    TaskbarClick(WindowId),
    Home,
    SetViewport(Viewport),
    BeginWindowDrag { window_id: WindowId, pointer: Point },
    BeginWindowResize { window_id: WindowId, pointer: Point },
    PointerMove(Point),
    PointerUp,
    SelectFile(Option<String>),
    IconPress { file_id: String, pointer: Point },
    OpenContextMenu { target: MenuTarget, pointer: Point },
    ActivateMenuItem(usize),
    DismissMenu,
    Run(Command),
    EditText(WindowId),
    SetDraft { window_id: WindowId, text: String },
    SaveText(WindowId),
    SubmitRename { file_id: String, name: String },
    SubmitUpload(Vec<UploadFile>),
    RestoreFile(String),
    PermanentDelete(String),
    SaveSettings(UpdateSettingsRequest),
    AddSharedFile(String),
}

/// Work the reducer asks its host to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum DesktopEffect {
    Mutate(Mutation),
    LogOut,
}

/// Client-side desktop state. All transitions go through [`Desktop::reduce`],
/// and mutation results come back through [`Desktop::mutation_succeeded`] or
/// [`Desktop::mutation_failed`].
#[derive(Debug, Clone, Default)]
pub struct Desktop {
    pub windows: WindowManager,
    pub cache: QueryCache,
    menu: Option<ContextMenu>,
    icon_drag: Option<IconDrag>,
    selected_file: Option<String>,
    viewers: HashMap<WindowId, Viewer>,
    upload_pending: bool,
}

impl Desktop {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            windows: WindowManager::new(viewport),
            ..Self::default()
        }
    }

    pub fn menu(&self) -> Option<&ContextMenu> {
        self.menu.as_ref()
    }

    pub fn icon_drag(&self) -> Option<&IconDrag> {
        self.icon_drag.as_ref()
    }

    pub fn selected_file(&self) -> Option<&str> {
        self.selected_file.as_deref()
    }

    pub fn upload_pending(&self) -> bool {
        self.upload_pending
    }

    pub fn viewer(&self, id: &WindowId) -> Option<&Viewer> {
        self.viewers.get(id)
    }

    /// Icons for the cached desktop listing; the dragged icon shows at its live cell.
    pub fn icons(&self) -> Vec<DesktopIcon> {
        let mut icons = layout_icons(self.cache.files.get().map(Vec::as_slice).unwrap_or_default());
        if let Some(ref drag) = self.icon_drag {
            if let Some(icon) = icons.iter_mut().find(|i| i.file_id == drag.file_id()) {
                icon.position = drag.current();
            }
        }
        icons
    }

    pub fn reduce(&mut self, action: DesktopAction) -> Result<Vec<DesktopEffect>, DesktopError> {
        let mut effects = Vec::new();

        match action {
            DesktopAction::OpenFile(file_id) => self.open_file(&file_id)?,
            DesktopAction::OpenWindow(descriptor) => {
                self.windows.open(descriptor);
            }
            DesktopAction::CloseWindow(id) => {
                self.windows.close(&id)?;
                self.viewers.remove(&id);
            }
            DesktopAction::FocusWindow(id) => self.windows.focus(&id)?,
            DesktopAction::MinimizeWindow(id) => self.windows.minimize(&id)?,
            DesktopAction::MaximizeWindow(id) => self.windows.maximize(&id)?,
            DesktopAction::TaskbarClick(id) => self.windows.taskbar_click(&id)?,
            DesktopAction::Home => self.windows.home(),
            DesktopAction::SetViewport(viewport) => self.windows.set_viewport(viewport),
            DesktopAction::BeginWindowDrag { window_id, pointer } => {
                self.windows.begin_drag(&window_id, pointer)?;
            }
            DesktopAction::BeginWindowResize { window_id, pointer } => {
                self.windows.begin_resize(&window_id, pointer)?;
            }
            DesktopAction::PointerMove(pointer) => {
                if let Some(ref mut drag) = self.icon_drag {
                    drag.update(pointer);
                } else if self.windows.dragging().is_some() {
                    self.windows.update_drag(pointer);
                } else if self.windows.resizing().is_some() {
                    self.windows.update_resize(pointer);
                }
            }
            DesktopAction::PointerUp => {
                if let Some(drag) = self.icon_drag.take() {
                    if let Some((file_id, position)) = drag.end() {
                        effects.push(DesktopEffect::Mutate(Mutation::UpdatePosition {
                            file_id,
                            x: position.x,
                            y: position.y,
                        }));
                    }
                }
                self.windows.end_drag();
                self.windows.end_resize();
            }
            DesktopAction::SelectFile(file_id) => self.selected_file = file_id,
            DesktopAction::IconPress { file_id, pointer } => {
                let icon = self
                    .icons()
                    .into_iter()
                    .find(|i| i.file_id == file_id)
                    .ok_or_else(|| DesktopError::UnknownFile(file_id.clone()))?;
                self.selected_file = Some(file_id.clone());
                self.icon_drag = Some(IconDrag::begin(file_id, pointer, icon.position));
            }
            DesktopAction::OpenContextMenu { target, pointer } => {
                if let MenuTarget::File(ref file_id) = target {
                    self.selected_file = Some(file_id.clone());
                }
                self.menu = Some(ContextMenu::open(
                    target,
                    pointer,
                    self.windows.viewport(),
                    self.cache.trash_empty(),
                ));
            }
            DesktopAction::ActivateMenuItem(index) => {
                let command = self.menu.as_ref().and_then(|menu| menu.activate(index));
                if let Some(command) = command {
                    self.menu = None;
                    effects.extend(self.run(command)?);
                }
            }
            DesktopAction::DismissMenu => self.menu = None,
            DesktopAction::Run(command) => effects.extend(self.run(command)?),
            DesktopAction::EditText(id) => {
                self.text_viewer(&id)?.toggle_mode();
            }
            DesktopAction::SetDraft { window_id, text } => {
                self.text_viewer(&window_id)?.set_draft(text);
            }
            DesktopAction::SaveText(id) => {
                let mutation = self.text_viewer(&id)?.save();
                effects.push(DesktopEffect::Mutate(mutation));
            }
            DesktopAction::SubmitRename { file_id, name } => {
                effects.push(DesktopEffect::Mutate(Mutation::Rename { file_id, name }));
            }
            DesktopAction::SubmitUpload(files) => {
                self.upload_pending = true;
                effects.push(DesktopEffect::Mutate(Mutation::Upload(files)));
            }
            DesktopAction::RestoreFile(file_id) => {
                effects.push(DesktopEffect::Mutate(Mutation::Restore { file_id }));
            }
            DesktopAction::PermanentDelete(file_id) => {
                effects.push(DesktopEffect::Mutate(Mutation::PermanentDelete { file_id }));
            }
            DesktopAction::SaveSettings(update) => {
                effects.push(DesktopEffect::Mutate(Mutation::UpdateSettings(update)));
            }
            DesktopAction::AddSharedFile(token) => {
                effects.push(DesktopEffect::Mutate(Mutation::AddShared { token }));
            }
        }

        Ok(effects)
    }

    fn run(&mut self, command: Command) -> Result<Vec<DesktopEffect>, DesktopError> {
        let mut effects = Vec::new();

        match command {
            Command::OpenFile(file_id) => self.open_file(&file_id)?,
            Command::RenameFile(file_id) => {
                let file = self.cached_file(&file_id)?;
                self.windows.open(WindowDescriptor::rename(&file));
            }
            Command::ShareFile(file_id) => {
                let file = self.cached_file(&file_id)?;
                if file.share_token.is_some() {
                    self.windows.open(WindowDescriptor::share(&file));
                } else {
                    effects.push(DesktopEffect::Mutate(Mutation::Share { file_id }));
                }
            }
            Command::DeleteFile(file_id) => {
                effects.push(DesktopEffect::Mutate(Mutation::Delete { file_id }));
            }
            Command::Upload => {
                self.windows.open(WindowDescriptor::upload());
            }
            Command::OpenSettings => {
                self.windows.open(WindowDescriptor::settings());
            }
            Command::OpenRecycleBin => {
                self.windows.open(WindowDescriptor::recycle_bin());
            }
            Command::EmptyTrash => effects.push(DesktopEffect::Mutate(Mutation::EmptyTrash)),
            Command::OpenProfile => {
                self.windows.open(WindowDescriptor::user());
            }
            Command::LogOut => effects.push(DesktopEffect::LogOut),
        }

        Ok(effects)
    }

    /// Apply a successful mutation: invalidate its reads, then update windows.
    pub fn mutation_succeeded(&mut self, mutation: &Mutation, outcome: &MutationOutcome) {
        for key in mutation.invalidates() {
            self.cache.invalidate(*key);
        }

        match (mutation, outcome) {
            (Mutation::Upload(_), _) => {
                self.upload_pending = false;
                let _ = self.windows.close(&WindowId::upload());
            }
            (Mutation::Rename { file_id, .. }, MutationOutcome::File(file)) => {
                let _ = self.windows.close(&WindowId::rename(file_id));
                self.retitle(file);
            }
            (Mutation::Share { .. }, MutationOutcome::File(file)) => {
                self.windows.open(WindowDescriptor::share(file));
            }
            (Mutation::Delete { file_id }, _) | (Mutation::PermanentDelete { file_id }, _) => {
                for id in self.windows.close_for_file(file_id) {
                    self.viewers.remove(&id);
                }
                if self.selected_file.as_deref() == Some(file_id.as_str()) {
                    self.selected_file = None;
                }
            }
            (Mutation::UpdateSettings(_), MutationOutcome::Settings(settings)) => {
                self.cache.settings.set(settings.clone());
            }
            _ => {}
        }
    }

    /// A failed mutation changes nothing except clearing the pending upload flag.
    pub fn mutation_failed(&mut self, mutation: &Mutation) {
        if matches!(mutation, Mutation::Upload(_)) {
            self.upload_pending = false;
        }
    }

    fn open_file(&mut self, file_id: &str) -> Result<(), DesktopError> {
        let file = self.cached_file(file_id)?;
        let descriptor = WindowDescriptor::file(&file);

        // Viewer is resolved once, when the window first opens
        if !self.windows.is_open(&descriptor.id) {
            self.viewers
                .insert(descriptor.id.clone(), Viewer::resolve(&file));
        }
        self.windows.open(descriptor);
        Ok(())
    }

    fn retitle(&mut self, file: &FileResponse) {
        let _ = self
            .windows
            .set_title(&WindowId::file(&file.id), file.file_name());
    }

    fn cached_file(&self, file_id: &str) -> Result<FileResponse, DesktopError> {
        self.cache
            .find_file(file_id)
            .cloned()
            .ok_or_else(|| DesktopError::UnknownFile(file_id.to_string()))
    }

    fn text_viewer(&mut self, id: &WindowId) -> Result<&mut TextViewer, DesktopError> {
        self.viewers
            .get_mut(id)
            .and_then(Viewer::as_text_mut)
            .ok_or_else(|| DesktopError::NotEditable(id.clone()))
    }
}

/// A [`Desktop`] wired to a live server.
pub struct DesktopSession {
    pub desktop: Desktop,
    client: ApiClient,
}

impl DesktopSession {
    pub fn new(client: ApiClient, viewport: Viewport) -> Self {
        Self {
            desktop: Desktop::new(viewport),
            client,
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub async fn login(
        &mut self,
        claims: &LoginRequest,
        shared_secret: Option<&str>,
    ) -> Result<UserResponse, DesktopError> {
        let user = self.client.login(claims, shared_secret).await?;
        self.desktop.cache.clear();
        self.desktop.cache.user.set(user.clone());
        self.refresh().await?;
        Ok(user)
    }

    /// Refetch every missing or stale read.
    pub async fn refresh(&mut self) -> Result<(), DesktopError> {
        for key in self.desktop.cache.pending() {
            let cache = &mut self.desktop.cache;
            match key {
                QueryKey::Files => cache.files.set(self.client.list_files().await?),
                QueryKey::DeletedFiles => {
                    cache.deleted_files.set(self.client.list_deleted_files().await?)
                }
                QueryKey::Settings => cache.settings.set(self.client.get_settings().await?),
                QueryKey::User => cache.user.set(self.client.current_user().await?),
            }
        }
        Ok(())
    }

    /// Reduce an action, carry out its effects, then refetch whatever went stale.
    pub async fn dispatch(&mut self, action: DesktopAction) -> Result<(), DesktopError> {
        let effects = self.desktop.reduce(action)?;

        for effect in effects {
            match effect {
                DesktopEffect::Mutate(mutation) => {
                    self.mutate(mutation).await?;
                }
                DesktopEffect::LogOut => {
                    self.client.logout().await?;
                    self.desktop = Desktop::new(self.desktop.windows.viewport());
                    return Ok(());
                }
            }
        }

        self.refresh().await
    }

    /// Execute one mutation and report the result back to the desktop.
    pub async fn mutate(&mut self, mutation: Mutation) -> Result<MutationOutcome, DesktopError> {
        match self.client.execute(&mutation).await {
            Ok(outcome) => {
                tracing::debug!(?outcome, "Mutation applied");
                self.desktop.mutation_succeeded(&mutation, &outcome);
                Ok(outcome)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Mutation failed");
                self.desktop.mutation_failed(&mutation);
                Err(e.into())
            }
        }
    }
}
