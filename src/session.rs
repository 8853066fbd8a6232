//! Interactive session state: the gallery, the active artifact, its edit
//! history, and the notifier, behind one control flow.
//!
//! Every mutating entry point runs under a single busy flag. While an
//! operation is outstanding, any other entry point is refused with
//! [`SessionError::Busy`]. Every failure is reported twice: as the returned
//! error, and as a toast.

use crate::config::AppConfig;
use crate::credentials::ApiKey;
use crate::export::{ExportError, ExportFormat, ExportSettings, export_image, write_artifact};
use crate::gallery::{Gallery, ZipScope};
use crate::generation::{
    BatchSummary, GenerationError, GenerationEvent, edit_image, run_batch,
};
use crate::history::EditHistory;
use crate::imaging::RasterSurface;
use crate::notify::{Notifier, ToastMessage};
use crate::service::ImageService;
use crate::types::{ArtifactId, GenerationConfig, IdSequence};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Another operation is still running")]
    Busy,
    #[error("No active design; generate or activate one first")]
    NoActive,
    #[error("Nothing to undo")]
    NothingToUndo,
    #[error("No design {0} in the gallery")]
    UnknownArtifact(ArtifactId),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error("Export failed: {0}")]
    Export(#[from] ExportError),
}

pub struct Session<S, R> {
    service: S,
    surface: R,
    key: ApiKey,
    settings: ExportSettings,
    output_dir: PathBuf,
    form: GenerationConfig,
    gallery: Gallery,
    history: EditHistory,
    active: Option<ArtifactId>,
    busy: bool,
    ids: IdSequence,
    notifier: Notifier,
    progress: Option<Sender<GenerationEvent>>,
}

impl<S: ImageService, R: RasterSurface> Session<S, R> {
    pub fn new(service: S, surface: R, key: ApiKey, config: &AppConfig) -> Self {
        Self {
            service,
            surface,
            key,
            settings: config.export_settings(),
            output_dir: config.export.output_dir.clone(),
            form: GenerationConfig::free(""),
            gallery: Gallery::new(),
            history: EditHistory::new(config.history.max_depth),
            active: None,
            busy: false,
            ids: IdSequence::new(),
            notifier: Notifier::new(config.notifications.dismiss_after()),
            progress: None,
        }
    }

    pub fn with_toast_sink(mut self, sink: Sender<ToastMessage>) -> Self {
        self.notifier = self.notifier.with_sink(sink);
        self
    }

    pub fn with_progress(mut self, progress: Sender<GenerationEvent>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_output_dir(mut self, dir: &Path) -> Self {
        self.output_dir = dir.to_path_buf();
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn form(&self) -> &GenerationConfig {
        &self.form
    }

    pub fn set_form(&mut self, form: GenerationConfig) {
        self.form = form;
    }

    pub fn gallery(&self) -> &Gallery {
        &self.gallery
    }

    pub fn active(&self) -> Option<ArtifactId> {
        self.active
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    // =========================================================================
    // Mutating entry points
    // =========================================================================

    /// Generate `count` designs from the current form. The newest success
    /// becomes active and its history starts over; a rejected or fully
    /// failed batch leaves the active design and its history alone.
    pub fn generate(&mut self, count: u32) -> Result<BatchSummary, SessionError> {
        self.exclusive(|s| {
            let mut newest = None;
            let summary = run_batch(
                &s.service,
                &s.key,
                &s.form,
                count,
                &mut s.ids,
                s.progress.as_ref(),
                |result| match result {
                    Ok(artifact) => {
                        newest = Some((artifact.id, artifact.image.clone()));
                        s.gallery.add(artifact);
                    }
                    Err(err) if err.is_safety_block() => {
                        s.notifier.warning(err.to_string());
                    }
                    // Generic failures are reported once, after the batch.
                    Err(_) => {}
                },
            )?;

            if let Some((id, image)) = newest {
                s.active = Some(id);
                s.history.reset_to(image);
            }
            if let Some((severity, text)) = summary.aggregate_toast() {
                s.notifier.show(severity, text);
            }
            Ok(summary)
        })
    }

    /// Apply an edit operation to the active design.
    pub fn edit(&mut self, operation_id: &str) -> Result<(), SessionError> {
        self.exclusive(|s| {
            let id = s.active.ok_or(SessionError::NoActive)?;
            let current = s
                .gallery
                .get(id)
                .ok_or(SessionError::UnknownArtifact(id))?
                .image
                .clone();
            if s.history.is_empty() {
                s.history.reset_to(current.clone());
            }

            let edited = edit_image(&s.service, &s.key, &current, operation_id)?;
            s.gallery.replace_image(id, edited.clone());
            s.history.push(edited);
            s.notifier.success("Edit applied");
            Ok(())
        })
    }

    /// Step the active design back to its previous snapshot.
    pub fn undo(&mut self) -> Result<(), SessionError> {
        self.exclusive(|s| {
            let id = s.active.ok_or(SessionError::NoActive)?;
            let restored = s
                .history
                .undo()
                .map(<[u8]>::to_vec)
                .ok_or(SessionError::NothingToUndo)?;
            s.gallery.replace_image(id, restored);
            s.notifier.success("Reverted to the previous version");
            Ok(())
        })
    }

    /// Make `id` the active design. Its edit history starts over.
    pub fn activate(&mut self, id: ArtifactId) -> Result<(), SessionError> {
        self.exclusive(|s| {
            let image = s
                .gallery
                .get(id)
                .ok_or(SessionError::UnknownArtifact(id))?
                .image
                .clone();
            s.active = Some(id);
            s.history.reset_to(image);
            Ok(())
        })
    }

    /// Export the active design and write it to the output directory.
    pub fn export(&mut self, format: ExportFormat) -> Result<PathBuf, SessionError> {
        self.exclusive(|s| {
            let id = s.active.ok_or(SessionError::NoActive)?;
            let dir = s.output_dir.clone();
            s.export_item(id, format, &dir)
        })
    }

    /// Export design `id` into `dir` instead of the output directory.
    pub fn export_to(
        &mut self,
        id: ArtifactId,
        format: ExportFormat,
        dir: &Path,
    ) -> Result<PathBuf, SessionError> {
        self.exclusive(|s| s.export_item(id, format, dir))
    }

    /// Write a ZIP of the selected (or all) designs to the output directory.
    pub fn export_zip(&mut self, scope: ZipScope) -> Result<PathBuf, SessionError> {
        self.exclusive(|s| {
            let artifact = s.gallery.export_zip(scope)?;
            let path = write_artifact(&s.output_dir, &artifact)?;
            s.notifier.success(format!("Saved {}", artifact.filename));
            Ok(path)
        })
    }

    pub fn toggle_selection(&mut self, id: ArtifactId) -> Result<bool, SessionError> {
        self.exclusive(|s| {
            s.gallery
                .toggle(id)
                .ok_or(SessionError::UnknownArtifact(id))
        })
    }

    pub fn select_all(&mut self) -> Result<(), SessionError> {
        self.exclusive(|s| {
            s.gallery.select_all();
            Ok(())
        })
    }

    pub fn deselect_all(&mut self) -> Result<(), SessionError> {
        self.exclusive(|s| {
            s.gallery.deselect_all();
            Ok(())
        })
    }

    fn export_item(
        &mut self,
        id: ArtifactId,
        format: ExportFormat,
        dir: &Path,
    ) -> Result<PathBuf, SessionError> {
        let item = self.gallery.get(id).ok_or(SessionError::UnknownArtifact(id))?;
        let artifact = export_image(
            &self.surface,
            &item.image,
            &item.config,
            format,
            &self.settings,
            item.created_at,
        )?;
        let path = write_artifact(dir, &artifact)?;
        self.notifier.success(format!("Saved {}", artifact.filename));
        Ok(path)
    }

    /// Run `op` under the busy flag. Failures are toasted on the way out.
    fn exclusive<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<T, SessionError>,
    ) -> Result<T, SessionError> {
        if self.busy {
            return Err(self.report(SessionError::Busy));
        }
        self.busy = true;
        let result = op(self);
        self.busy = false;
        result.map_err(|err| self.report(err))
    }

    fn report(&mut self, err: SessionError) -> SessionError {
        match &err {
            SessionError::Generation(GenerationError::SafetyBlocked { .. })
            | SessionError::Busy
            | SessionError::NothingToUndo => {
                self.notifier.warning(err.to_string());
            }
            _ => {
                self.notifier.error(err.to_string());
            }
        }
        tracing::warn!(error = %err, "session operation failed");
        err
    }
}
