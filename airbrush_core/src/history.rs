//! The stroke document and its undo/redo history.
//!
//! Invariant: outside an open stroke, `segments` is exactly the
//! concatenation of the groups on the undo stack.  The redo stack holds
//! groups removed by undo, most recent last, and is emptied whenever a new
//! stroke is recorded.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::stroke::Segment;
use crate::{Error, Result};

// ════════════════════════════════════════════════════════════════════════════
// StrokeGroup / Document
// ════════════════════════════════════════════════════════════════════════════

/// The segments of one pen-down interval; never empty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrokeGroup {
    segments: Vec<Segment>,
}

impl StrokeGroup {
    pub fn segments(&self) -> &[Segment] { &self.segments }
    pub fn len(&self) -> usize { self.segments.len() }
    pub fn is_empty(&self) -> bool { self.segments.is_empty() }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub segments:   Vec<Segment>,
    pub undo_stack: Vec<StrokeGroup>,
    pub redo_stack: Vec<StrokeGroup>,
}

impl Document {
    /// Check the segments/undo-stack invariant, that no group is empty,
    /// and that every dash pattern is drawable.
    pub fn validate(&self) -> Result<()> {
        if self.undo_stack.iter().chain(&self.redo_stack).any(|g| g.is_empty()) {
            return Err(Error::Config("document contains an empty stroke group".to_string()));
        }
        let redo = self.redo_stack.iter().flat_map(|g| g.segments.iter());
        if let Some(bad) = self.segments.iter().chain(redo).find(|s| !s.style.dash_is_valid()) {
            return Err(Error::Config(format!(
                "dash lengths must be 0 or at least {}, got {:?}",
                crate::brush::MIN_DASH, bad.style.dash
            )));
        }
        let mut flat = self.undo_stack.iter().flat_map(|g| g.segments.iter());
        let matches = self.segments.iter().all(|s| flat.next() == Some(s));
        if !matches || flat.next().is_some() {
            return Err(Error::Config(
                "document segments do not match its undo history".to_string(),
            ));
        }
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// History
// ════════════════════════════════════════════════════════════════════════════

/// Owner of the [`Document`]; the only thing allowed to change its stacks.
#[derive(Clone, Debug, Default)]
pub struct History {
    doc:  Document,
    /// Length of `segments` when the current stroke began.
    open: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_document(doc: Document) -> Result<Self> {
        doc.validate()?;
        Ok(History { doc, open: None })
    }

    pub fn document(&self) -> &Document { &self.doc }
    pub fn segments(&self) -> &[Segment] { &self.doc.segments }
    pub fn undo_depth(&self) -> usize { self.doc.undo_stack.len() }
    pub fn redo_depth(&self) -> usize { self.doc.redo_stack.len() }
    pub fn is_stroke_open(&self) -> bool { self.open.is_some() }

    // ── stroke bracket ────────────────────────────────────────────────────

    /// Mark the start of a stroke at the current end of the segment list.
    pub fn begin_stroke(&mut self) {
        if self.open.is_some() {
            self.end_stroke();
        }
        self.open = Some(self.doc.segments.len());
    }

    pub fn push_segment(&mut self, segment: Segment) -> &Segment {
        self.doc.segments.push(segment);
        &self.doc.segments[self.doc.segments.len() - 1]
    }

    /// Close the stroke.  Segments appended since [`begin_stroke`]
    /// become one group and the redo stack is dropped; an empty stroke
    /// records nothing.  Returns the group's size.
    ///
    /// [`begin_stroke`]: Self::begin_stroke
    pub fn end_stroke(&mut self) -> Option<usize> {
        let start = self.open.take()?;
        if start >= self.doc.segments.len() {
            return None;
        }
        let group = StrokeGroup { segments: self.doc.segments[start..].to_vec() };
        let len = group.len();
        self.doc.undo_stack.push(group);
        self.doc.redo_stack.clear();
        Some(len)
    }

    /// Seal an open stroke, run `op`, then reopen the stroke at the new end.
    fn sealed<T>(&mut self, op: impl FnOnce(&mut Document) -> T) -> T {
        let was_open = self.open.is_some();
        if was_open {
            self.end_stroke();
        }
        let out = op(&mut self.doc);
        if was_open {
            self.open = Some(self.doc.segments.len());
        }
        out
    }

    // ── undo / redo / clear ───────────────────────────────────────────────

    /// Remove the last stroke.  Returns its size, or `None` if there was
    /// nothing to undo.
    pub fn undo(&mut self) -> Option<usize> {
        let removed = self.sealed(|doc| {
            let group = doc.undo_stack.pop()?;
            let keep = doc.segments.len() - group.len();
            doc.segments.truncate(keep);
            let len = group.len();
            doc.redo_stack.push(group);
            Some(len)
        });
        if let Some(n) = removed {
            info!(segments = n, remaining = self.doc.segments.len(), "undo");
        }
        removed
    }

    /// Restore the most recently undone stroke.  Returns the restored
    /// segments, or `None` if there was nothing to redo.
    pub fn redo(&mut self) -> Option<&[Segment]> {
        let start = self.sealed(|doc| {
            let group = doc.redo_stack.pop()?;
            let start = doc.segments.len();
            doc.segments.extend_from_slice(group.segments());
            doc.undo_stack.push(group);
            Some(start)
        })?;
        info!(segments = self.doc.segments.len() - start, "redo");
        Some(&self.doc.segments[start..])
    }

    /// Drop every segment and both stacks.
    pub fn clear(&mut self) {
        self.sealed(|doc| *doc = Document::default());
        info!("document cleared");
    }

    // ── persistence ───────────────────────────────────────────────────────

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.doc)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_document(serde_json::from_str(json)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
