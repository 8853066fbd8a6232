//! In-memory gallery of generated designs, newest first, with a selection
//! set for bulk ZIP download.

use crate::export::archive::{ZipEntry, build_zip};
use crate::export::{ExportArtifact, ExportError, ZIP_MIME};
use crate::generation::GeneratedArtifact;
use crate::naming::{ZIP_FILENAME, zip_entry_name};
use crate::types::ArtifactId;
use std::collections::HashSet;

pub type GalleryItem = GeneratedArtifact;

/// Which items a ZIP export covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ZipScope {
    Selected,
    All,
}

#[derive(Debug, Default)]
pub struct Gallery {
    items: Vec<GalleryItem>,
    selected: HashSet<ArtifactId>,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend: the newest item is always first.
    pub fn add(&mut self, item: GalleryItem) {
        self.items.insert(0, item);
    }

    pub fn items(&self) -> &[GalleryItem] {
        &self.items
    }

    pub fn get(&self, id: ArtifactId) -> Option<&GalleryItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Replace the stored image of `id`. Returns `false` for unknown ids.
    pub fn replace_image(&mut self, id: ArtifactId, image: Vec<u8>) -> bool {
        match self.items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.image = image;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Flip selection of `id`; returns the new state, or `None` if the id is
    /// not in the gallery.
    pub fn toggle(&mut self, id: ArtifactId) -> Option<bool> {
        self.get(id)?;
        if self.selected.remove(&id) {
            Some(false)
        } else {
            self.selected.insert(id);
            Some(true)
        }
    }

    pub fn select_all(&mut self) {
        self.selected = self.items.iter().map(|item| item.id).collect();
    }

    pub fn deselect_all(&mut self) {
        self.selected.clear();
    }

    pub fn is_selected(&self, id: ArtifactId) -> bool {
        self.selected.contains(&id)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Items covered by `scope`, in gallery order.
    pub fn scoped_items(&self, scope: ZipScope) -> Vec<&GalleryItem> {
        self.items
            .iter()
            .filter(|item| scope == ZipScope::All || self.selected.contains(&item.id))
            .collect()
    }

    /// Pack the raw images covered by `scope` into one archive.
    ///
    /// Entry names carry the position inside this archive, so they never
    /// collide even when two items share a topic and a date.
    pub fn export_zip(&self, scope: ZipScope) -> Result<ExportArtifact, ExportError> {
        let items = self.scoped_items(scope);
        if items.is_empty() {
            return Err(ExportError::Empty);
        }
        let names: Vec<String> = items
            .iter()
            .enumerate()
            .map(|(index, item)| zip_entry_name(index, &item.config, item.created_at))
            .collect();
        let entries = items.iter().zip(&names).map(|(item, name)| ZipEntry {
            name,
            bytes: &item.image,
            modified: item.created_at,
        });
        let bytes = build_zip(entries)?;
        tracing::info!(entries = items.len(), bytes = bytes.len(), "gallery archive built");
        Ok(ExportArtifact {
            filename: ZIP_FILENAME.to_string(),
            mime: ZIP_MIME,
            bytes,
        })
    }
}
