//! Editing sessions, one per attached buffer.
//!
//! The registry is the host boundary: the host attaches text, reports edits
//! and cursor moves, and gets attribute updates back through its sink.
//! Buffers are addressed by `BufferId` handles that stay unknown once
//! detached.

use crate::buffer::TextBuffer;
use crate::config::HighlightConfig;
use crate::cursor::CursorPosition;
use crate::error::{HighlightError, Result};
use crate::syntax::{edit, AttributeSink, BuiltinGrammars, GrammarProvider, Highlighter, Theme};
use std::ops::Range;

/// Unique identifier for an attached buffer.
pub type BufferId = usize;

/// A buffer with its highlighter.
pub struct EditorSession {
    buffer: TextBuffer,
    highlighter: Highlighter,
}

impl EditorSession {
    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn highlighter(&self) -> &Highlighter {
        &self.highlighter
    }

    /// Returns the buffer contents as a string.
    pub fn text(&self) -> String {
        self.buffer.to_string()
    }

    pub fn cursor_positions(&self) -> &[CursorPosition] {
        self.highlighter.cursor_positions()
    }

    /// Replaces `range` with `text` and updates highlighting.
    ///
    /// An invalid range is rejected before anything changes.
    pub fn on_edit(&mut self, range: Range<usize>, text: &str) -> Result<()> {
        let descriptor = edit::translate(range.clone(), text, &self.buffer)?;
        self.buffer.replace(range, text)?;
        self.highlighter.on_text_changed(&descriptor, &self.buffer);
        Ok(())
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.highlighter.set_theme(theme, &self.buffer);
    }

    pub fn disable_highlighting(&mut self) {
        self.highlighter.disable(&self.buffer);
    }

    pub fn enable_highlighting(&mut self) {
        self.highlighter.enable(&self.buffer);
    }

    pub fn set_cursor_positions(&mut self, positions: Vec<CursorPosition>) {
        self.highlighter.set_cursor_positions(positions);
    }

    /// Applies finished background highlights.
    pub fn poll(&mut self) -> usize {
        self.highlighter.poll()
    }

    /// Runs one step of deferred highlighting. Returns true while work remains.
    pub fn on_idle(&mut self) -> bool {
        self.highlighter.on_idle(&self.buffer)
    }
}

/// Manages all attached buffers.
pub struct SessionRegistry<P: GrammarProvider = BuiltinGrammars> {
    provider: P,
    config: HighlightConfig,
    /// All sessions, indexed by BufferId.
    sessions: Vec<Option<EditorSession>>,
    /// Next buffer ID to assign.
    next_id: BufferId,
}

impl Default for SessionRegistry<BuiltinGrammars> {
    fn default() -> Self {
        Self::new(BuiltinGrammars, HighlightConfig::default())
    }
}

impl<P: GrammarProvider> SessionRegistry<P> {
    /// Creates an empty registry.
    pub fn new(provider: P, config: HighlightConfig) -> Self {
        Self {
            provider,
            config,
            sessions: Vec::new(),
            next_id: 0,
        }
    }

    pub fn config(&self) -> &HighlightConfig {
        &self.config
    }

    /// Starts highlighting `buffer` and returns its handle.
    ///
    /// Fails with `UnsupportedLanguage` when the provider has no grammar for
    /// `language_id`; the host may attach again as `"plaintext"`. A grammar
    /// that exists but fails to load still attaches, unhighlighted.
    pub fn attach(
        &mut self,
        buffer: TextBuffer,
        language_id: &str,
        theme: Theme,
        sink: impl AttributeSink + 'static,
    ) -> Result<BufferId> {
        let grammar = self.grammar(language_id)?;

        let id = self.next_id;
        self.next_id += 1;

        let mut highlighter = Highlighter::new(self.config.clone(), theme, Box::new(sink));
        highlighter.set_language(&grammar, &buffer);
        log::info!(
            "Attached buffer {} ({} bytes) as {}",
            id,
            buffer.len_bytes(),
            grammar.id
        );

        // Ensure sessions vec is large enough
        if id >= self.sessions.len() {
            self.sessions.resize_with(id + 1, || None);
        }
        self.sessions[id] = Some(EditorSession { buffer, highlighter });
        Ok(id)
    }

    /// Stops highlighting and hands the buffer back.
    pub fn detach(&mut self, id: BufferId) -> Result<TextBuffer> {
        let session = self
            .sessions
            .get_mut(id)
            .and_then(Option::take)
            .ok_or(HighlightError::UnknownBuffer(id))?;
        log::debug!("Detached buffer {}: {}", id, session.highlighter.stats().summary());
        Ok(session.buffer)
    }

    /// Returns a reference to a session.
    pub fn get(&self, id: BufferId) -> Option<&EditorSession> {
        self.sessions.get(id).and_then(|opt| opt.as_ref())
    }

    /// Returns a mutable reference to a session.
    pub fn get_mut(&mut self, id: BufferId) -> Option<&mut EditorSession> {
        self.sessions.get_mut(id).and_then(|opt| opt.as_mut())
    }

    fn session_mut(&mut self, id: BufferId) -> Result<&mut EditorSession> {
        self.get_mut(id).ok_or(HighlightError::UnknownBuffer(id))
    }

    /// Handles of all attached buffers, in attach order.
    pub fn ids(&self) -> Vec<BufferId> {
        self.sessions
            .iter()
            .enumerate()
            .filter_map(|(id, session)| session.as_ref().map(|_| id))
            .collect()
    }

    /// Returns the number of attached buffers.
    pub fn len(&self) -> usize {
        self.sessions.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replaces `range` of buffer `id` with `text`.
    pub fn on_edit(&mut self, id: BufferId, range: Range<usize>, text: &str) -> Result<()> {
        self.session_mut(id)?.on_edit(range, text)
    }

    pub fn set_theme(&mut self, id: BufferId, theme: Theme) -> Result<()> {
        self.session_mut(id)?.set_theme(theme);
        Ok(())
    }

    /// Switches the buffer to another language and rehighlights it.
    pub fn set_language(&mut self, id: BufferId, language_id: &str) -> Result<()> {
        let grammar = self.grammar(language_id)?;
        let session = self.session_mut(id)?;
        session.highlighter.set_language(&grammar, &session.buffer);
        Ok(())
    }

    pub fn disable_highlighting(&mut self, id: BufferId) -> Result<()> {
        self.session_mut(id)?.disable_highlighting();
        Ok(())
    }

    pub fn enable_highlighting(&mut self, id: BufferId) -> Result<()> {
        self.session_mut(id)?.enable_highlighting();
        Ok(())
    }

    pub fn set_cursor_positions(&mut self, id: BufferId, positions: Vec<CursorPosition>) -> Result<()> {
        self.session_mut(id)?.set_cursor_positions(positions);
        Ok(())
    }

    /// Applies finished background highlights for every buffer.
    pub fn poll(&mut self) -> usize {
        self.sessions.iter_mut().flatten().map(EditorSession::poll).sum()
    }

    /// Runs one step of deferred work for buffer `id`.
    pub fn on_idle(&mut self, id: BufferId) -> Result<bool> {
        Ok(self.session_mut(id)?.on_idle())
    }

    fn grammar(&self, language_id: &str) -> Result<crate::syntax::Grammar> {
        match self.provider.grammar(language_id) {
            Err(HighlightError::GrammarNotFound(id)) => Err(HighlightError::UnsupportedLanguage(id)),
            other => other,
        }
    }
}
