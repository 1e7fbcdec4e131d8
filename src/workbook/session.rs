use crate::error::{Result, SyncError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use umya_spreadsheet::{reader, writer, Spreadsheet, Worksheet};

/// How a workbook is opened.
///
/// Source workbooks are often flagged read-only or carry external links, so
/// every switch defaults to the permissive setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenOptions {
    /// External-link parts are kept as stored; the xlsx backend never re-resolves them.
    pub update_links: bool,
    /// Open files that are read-only on disk instead of refusing them.
    pub ignore_read_only_recommended: bool,
    /// When false the handle can be inspected but never saved.
    pub editable: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            update_links: true,
            ignore_read_only_recommended: true,
            editable: true,
        }
    }
}

/// Run `f` inside one spreadsheet session, tearing the session down on every exit path.
pub fn with_session<T, F>(f: F) -> Result<T>
where
    F: FnOnce(&mut WorkbookSession) -> Result<T>,
{
    let mut session = WorkbookSession::start()?;
    let outcome = f(&mut session);

    if let Err(e) = session.close() {
        tracing::warn!(error = %e, "spreadsheet session teardown failed");
    }

    outcome
}

/// Process-wide spreadsheet session. Saves are staged in a private scratch
/// directory and moved into place once fully written.
pub struct WorkbookSession {
    staging: TempDir,
    opened: usize,
    saved: usize,
}

impl WorkbookSession {
    pub fn start() -> Result<Self> {
        Self::start_in(&std::env::temp_dir())
    }

    pub fn start_in(parent: &Path) -> Result<Self> {
        let staging = tempfile::Builder::new()
            .prefix("pv-sync-")
            .tempdir_in(parent)
            .map_err(|e| {
                SyncError::SessionFailure(format!(
                    "failed to create staging directory in {}: {}",
                    parent.display(),
                    e
                ))
            })?;

        tracing::debug!(staging = %staging.path().display(), "spreadsheet session started");

        Ok(Self {
            staging,
            opened: 0,
            saved: 0,
        })
    }

    pub fn staging_path(&self) -> &Path {
        self.staging.path()
    }

    pub fn workbooks_opened(&self) -> usize {
        self.opened
    }

    pub fn workbooks_saved(&self) -> usize {
        self.saved
    }

    /// Open a workbook. The returned handle borrows the session, so only one
    /// workbook can be open at a time.
    pub fn open(&mut self, path: &Path, options: OpenOptions) -> Result<WorkbookHandle<'_>> {
        let open_failure = |reason: String| SyncError::WorkbookOpenFailure {
            path: path.to_path_buf(),
            reason,
        };

        let metadata = fs::metadata(path).map_err(|e| open_failure(e.to_string()))?;
        if !metadata.is_file() {
            return Err(open_failure("not a regular file".to_string()));
        }
        if metadata.permissions().readonly() && !options.ignore_read_only_recommended {
            return Err(open_failure("file is marked read-only".to_string()));
        }

        let book = reader::xlsx::read(path).map_err(|e| open_failure(e.to_string()))?;

        tracing::debug!(
            workbook = %path.display(),
            update_links = options.update_links,
            editable = options.editable,
            "workbook opened"
        );
        self.opened += 1;

        Ok(WorkbookHandle {
            session: self,
            path: path.to_path_buf(),
            destination: path.to_path_buf(),
            book,
            options,
            released: false,
        })
    }

    pub fn close(self) -> Result<()> {
        tracing::debug!(
            opened = self.opened,
            saved = self.saved,
            "spreadsheet session closing"
        );
        self.staging.close().map_err(|e| {
            SyncError::SessionFailure(format!("failed to remove staging directory: {}", e))
        })
    }
}

/// One open workbook, owned by the session for the duration of a station's cycle.
pub struct WorkbookHandle<'s> {
    session: &'s mut WorkbookSession,
    path: PathBuf,
    destination: PathBuf,
    book: Spreadsheet,
    options: OpenOptions,
    released: bool,
}

impl<'s> WorkbookHandle<'s> {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Redirect the next save; defaults to the source path.
    pub fn set_destination(&mut self, destination: PathBuf) {
        self.destination = destination;
    }

    pub fn options(&self) -> OpenOptions {
        self.options
    }

    pub fn worksheet(&self, name: &str) -> Result<&Worksheet> {
        self.book
            .get_sheet_by_name(name)
            .ok_or_else(|| SyncError::SheetNotFound {
                sheet: name.to_string(),
                workbook: self.path.clone(),
            })
    }

    pub fn worksheet_mut(&mut self, name: &str) -> Result<&mut Worksheet> {
        let path = &self.path;
        self.book
            .get_sheet_by_name_mut(name)
            .ok_or_else(|| SyncError::SheetNotFound {
                sheet: name.to_string(),
                workbook: path.clone(),
            })
    }

    /// Write the workbook to its destination through the session's staging directory.
    pub fn save(&mut self) -> Result<PathBuf> {
        if !self.options.editable {
            return Err(SyncError::ReadOnlyWorkbook {
                path: self.path.clone(),
            });
        }

        let destination = self.destination.clone();
        let file_name = destination.file_name().ok_or_else(|| {
            SyncError::InvalidFormat(format!(
                "Destination has no file name: {}",
                destination.display()
            ))
        })?;
        let staged = self.session.staging_path().join(file_name);

        writer::xlsx::write(&self.book, &staged).map_err(|e| SyncError::WorkbookSaveFailure {
            path: destination.clone(),
            reason: e.to_string(),
        })?;
        move_into_place(&staged, &destination)?;

        self.session.saved += 1;
        tracing::debug!(destination = %destination.display(), "workbook saved");
        Ok(destination)
    }

    /// Redirect and save in one step.
    pub fn save_as(&mut self, destination: PathBuf) -> Result<PathBuf> {
        self.set_destination(destination);
        self.save()
    }

    /// Release the handle, saving first when asked. The handle is released even if the save fails.
    pub fn close(mut self, save: bool) -> Result<()> {
        let outcome = if save { self.save().map(|_| ()) } else { Ok(()) };
        self.release();
        outcome
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            tracing::trace!(workbook = %self.path.display(), "workbook released");
        }
    }
}

impl Drop for WorkbookHandle<'_> {
    fn drop(&mut self) {
        if !self.released {
            tracing::debug!(workbook = %self.path.display(), "workbook dropped without close");
            self.release();
        }
    }
}

fn move_into_place(staged: &Path, destination: &Path) -> Result<()> {
    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    // rename fails across filesystems; fall back to copying
    if fs::rename(staged, destination).is_err() {
        fs::copy(staged, destination)?;
        fs::remove_file(staged)?;
    }
    Ok(())
}
