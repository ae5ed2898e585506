//! Hierarchical navigation through cases and nested folders.
//!
//! The `Navigator` owns the current case, the current folder and the stack of
//! folders visited on the way down. The stack never contains the current
//! folder itself: it grows only when descending from a folder into a child
//! and shrinks only when moving up.

use super::{rebase, Case, EngineError};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Navigator {
    current_case: Option<Case>,
    current_folder: Option<PathBuf>,
    stack: Vec<PathBuf>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_case(&self) -> Option<&Case> {
        self.current_case.as_ref()
    }

    pub fn current_folder(&self) -> Option<&Path> {
        self.current_folder.as_deref()
    }

    pub fn stack(&self) -> &[PathBuf] {
        &self.stack
    }

    /// The directory currently being listed: the open folder, or the case root.
    pub fn browsing_path(&self) -> Option<PathBuf> {
        self.current_folder
            .clone()
            .or_else(|| self.current_case.as_ref().map(|c| c.path.clone()))
    }

    /// Switches to `case` (or to no case), always resetting folder and stack.
    pub fn select_case(&mut self, case: Option<Case>) {
        self.current_case = case;
        self.current_folder = None;
        self.stack.clear();
    }

    /// Replaces the stored record of the current case without navigating.
    pub fn update_case(&mut self, case: Case) {
        if self.current_case.as_ref().map(|c| &c.path) == Some(&case.path) {
            self.current_case = Some(case);
        }
    }

    /// Descends one level into `path`.
    pub fn open_folder(&mut self, path: impl Into<PathBuf>) -> Result<(), EngineError> {
        if self.current_case.is_none() {
            return Err(EngineError::NoCaseSelected {
                operation: "open folder",
            });
        }
        if let Some(current) = self.current_folder.take() {
            self.stack.push(current);
        }
        self.current_folder = Some(path.into());
        Ok(())
    }

    /// Returns to the case root from any folder depth.
    pub fn go_back_to_case(&mut self) {
        self.current_folder = None;
        self.stack.clear();
    }

    /// Steps up one level: to the previous folder, or to the case root.
    pub fn go_back_to_parent_folder(&mut self) {
        self.current_folder = self.stack.pop();
    }

    /// Breadcrumb jump to `target`.
    ///
    /// Jumping to the case root behaves like `go_back_to_case`. Jumping to a
    /// folder in the stack truncates the stack at that folder. Any other target
    /// is opened directly and the stack is left untouched.
    pub fn navigate_to_folder(&mut self, target: &Path) {
        if self.current_case.as_ref().map(|c| c.path.as_path()) == Some(target) {
            self.go_back_to_case();
            return;
        }
        if self.current_folder.as_deref() == Some(target) {
            return;
        }
        if let Some(index) = self.stack.iter().position(|p| p == target) {
            self.stack.truncate(index);
            self.current_folder = Some(target.to_path_buf());
            return;
        }
        tracing::debug!(
            "Jumping to {:?}, which is neither in the navigation stack nor current",
            target
        );
        self.current_folder = Some(target.to_path_buf());
    }

    /// Opens `folder` as the only level below the case root.
    pub fn jump_to_folder(&mut self, folder: PathBuf) {
        self.stack.clear();
        self.current_folder = Some(folder);
    }

    /// Rewrites every route entry at or below `from` to live under `to`.
    ///
    /// Returns the number of entries rewritten.
    pub fn replace_path(&mut self, from: &Path, to: &Path) -> usize {
        let mut replaced = 0;
        for entry in self
            .stack
            .iter_mut()
            .chain(self.current_folder.iter_mut())
        {
            if let Some(rebased) = rebase(entry, from, to) {
                *entry = rebased;
                replaced += 1;
            }
        }
        replaced
    }

    pub fn folder_snapshot(&self) -> (Option<PathBuf>, Vec<PathBuf>) {
        (self.current_folder.clone(), self.stack.clone())
    }

    /// `true` if `path` is the open folder or any folder above it.
    pub fn is_on_current_route(&self, path: &Path) -> bool {
        self.current_folder.as_deref() == Some(path) || self.stack.iter().any(|p| p == path)
    }

    /// Case root first, then each stack entry, then the current folder.
    pub fn breadcrumbs(&self) -> Vec<PathBuf> {
        let Some(case) = &self.current_case else {
            return Vec::new();
        };
        let mut crumbs = Vec::with_capacity(self.stack.len() + 2);
        crumbs.push(case.path.clone());
        crumbs.extend(self.stack.iter().cloned());
        if let Some(folder) = &self.current_folder {
            crumbs.push(folder.clone());
        }
        crumbs
    }
}
