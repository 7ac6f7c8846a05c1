use std::sync::Arc;
use std::time::Instant;

use rand::Rng;

use super::{
    catalog::WordCategory,
    grid::Cell,
    hint::{ActiveHint, HintEngine, HintOutcome},
    progress::{FoundWord, PuzzleProgress},
    selection::{SelectionTracker, SelectionUpdate},
    timer::PuzzleTimer,
    validator::{RejectReason, Verdict, WordValidator},
};
use crate::{
    palette::{ColorTag, Palette, SPANGRAM_COLOR},
    progress::{ProgressSnapshot, SnapshotError},
    puzzles::Puzzle,
};

/// Something the player's view needs to hear about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The live selection path, in order. Empty after a word was submitted.
    SelectionChanged(Vec<Cell>),
    WordAccepted(FoundWord),
    WordRejected { word: String, reason: RejectReason },
    HintsChanged(u32),
    HintRevealed(ActiveHint),
    HintCleared,
    PuzzleCompleted { elapsed_seconds: u64, hints_used: u32 },
    /// Progress worth saving has changed
    ProgressChanged,
}

/// All mutable state of one player working on one puzzle.
///
/// Gestures come in as method calls and go out as [`SessionEvent`]s, in the
/// order they happened. Methods that can start or stop the clock take the
/// current instant.
#[derive(Debug)]
pub struct GameSession {
    puzzle: Arc<Puzzle>,
    palette: Palette,
    progress: PuzzleProgress,
    tracker: SelectionTracker,
    hints: HintEngine,
    timer: PuzzleTimer,
    starting_hints: u32,
    completed: bool,
}

impl GameSession {
    pub fn new(puzzle: Arc<Puzzle>, palette: Palette, starting_hints: u32) -> Self {
        Self {
            puzzle,
            palette,
            progress: PuzzleProgress::new(starting_hints),
            tracker: SelectionTracker::new(),
            hints: HintEngine::new(),
            timer: PuzzleTimer::new(),
            starting_hints,
            completed: false,
        }
    }

    /// Rebuild a session from saved progress without re-validating words.
    /// A puzzle that was already complete stays complete and does not
    /// announce completion again.
    pub fn restore(
        puzzle: Arc<Puzzle>,
        palette: Palette,
        starting_hints: u32,
        snapshot: &ProgressSnapshot,
    ) -> Result<Self, SnapshotError> {
        snapshot.check(&puzzle.grid)?;
        let found = snapshot.restore_found_words(&puzzle.catalog)?;

        let mut session = Self::new(puzzle, palette, starting_hints);
        let bonus_words = found
            .iter()
            .filter(|f| f.category == WordCategory::NonTheme)
            .count() as u32;
        for word in found {
            session.progress.record(word);
        }

        session.progress.hints_used = snapshot.hints_used;
        session.progress.hints_remaining = snapshot
            .hints_remaining
            .unwrap_or(starting_hints + bonus_words);

        session.completed = snapshot.completed || session.all_required_found();
        session.timer = if session.completed {
            PuzzleTimer::stopped_at(snapshot.elapsed_seconds)
        } else {
            PuzzleTimer::resumed_from(snapshot.elapsed_seconds)
        };

        if let Some(word) = &snapshot.active_hint {
            let catalog = &session.puzzle.catalog;
            if !session.completed && catalog.is_theme_word(word) && !session.progress.is_found(word) {
                session.hints.restore(&session.puzzle.grid, word.clone());
            }
        }

        Ok(session)
    }

    pub fn puzzle(&self) -> &Arc<Puzzle> {
        &self.puzzle
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    pub fn progress(&self) -> &PuzzleProgress {
        &self.progress
    }

    pub fn active_hint(&self) -> Option<&ActiveHint> {
        self.hints.active()
    }

    pub fn selection(&self) -> &[Cell] {
        self.tracker.path()
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn is_timer_running(&self) -> bool {
        self.timer.is_running()
    }

    pub fn elapsed_seconds(&self, now: Instant) -> u64 {
        self.timer.elapsed_seconds(now)
    }

    /// Theme words and spangram found so far, and how many there are
    pub fn completion_progress(&self) -> (usize, usize) {
        (self.progress.completion_count(), self.puzzle.catalog.required_count())
    }

    pub fn press(&mut self, cell: Cell, now: Instant) -> Vec<SessionEvent> {
        if self.completed {
            return Vec::new();
        }

        let grid = &self.puzzle.grid;
        let progress = &self.progress;
        if grid.contains(cell) && self.timer.start(now) {
            tracing::debug!("Timer started on puzzle {}", self.puzzle.id);
        }

        let update = self
            .tracker
            .press(cell, |c| grid.contains(c) && !progress.is_cell_found(c));
        self.apply(update, now)
    }

    pub fn drag(&mut self, cell: Cell, now: Instant) -> Vec<SessionEvent> {
        if self.completed {
            return Vec::new();
        }

        let grid = &self.puzzle.grid;
        let progress = &self.progress;
        let update = self
            .tracker
            .drag(cell, |c| grid.contains(c) && !progress.is_cell_found(c));
        self.apply(update, now)
    }

    pub fn release(&mut self, now: Instant) -> Vec<SessionEvent> {
        let update = self.tracker.release();
        self.apply(update, now)
    }

    pub fn pointer_left(&mut self, now: Instant) -> Vec<SessionEvent> {
        let update = self.tracker.pointer_left();
        self.apply(update, now)
    }

    fn apply(&mut self, update: SelectionUpdate, now: Instant) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        if let Some(path) = update.submitted {
            self.submit(&path, now, &mut events);
        }
        if update.changed {
            events.push(SessionEvent::SelectionChanged(self.tracker.path().to_vec()));
        }

        events
    }

    fn submit(&mut self, path: &[Cell], now: Instant, events: &mut Vec<SessionEvent>) {
        let verdict =
            WordValidator::validate(&self.puzzle.grid, &self.puzzle.catalog, &self.progress, path);

        let (word, category) = match verdict {
            Verdict::Accepted { word, category } => (word, category),
            Verdict::Rejected { word, reason } => {
                tracing::debug!("Rejected {} on puzzle {}: {:?}", word, self.puzzle.id, reason);
                events.push(SessionEvent::WordRejected { word, reason });
                return;
            }
        };

        let color = match category {
            WordCategory::Spangram => Some(SPANGRAM_COLOR),
            WordCategory::Theme => Some(self.palette.found_color),
            WordCategory::NonTheme => None,
        };
        let found = FoundWord {
            word: word.clone(),
            path: path.to_vec(),
            category,
            color,
        };
        tracing::debug!("Accepted {} ({:?}) on puzzle {}", word, category, self.puzzle.id);

        self.progress.record(found.clone());
        events.push(SessionEvent::WordAccepted(found));

        if category == WordCategory::NonTheme {
            self.progress.hints_remaining += 1;
            events.push(SessionEvent::HintsChanged(self.progress.hints_remaining));
        }

        if self.hints.clear_if(&word) {
            events.push(SessionEvent::HintCleared);
        }

        self.check_completion(now, events);
        events.push(SessionEvent::ProgressChanged);
    }

    fn all_required_found(&self) -> bool {
        let catalog = &self.puzzle.catalog;
        catalog.required_count() > 0 && catalog.required_words().all(|w| self.progress.is_found(w))
    }

    fn check_completion(&mut self, now: Instant, events: &mut Vec<SessionEvent>) {
        if self.completed || !self.all_required_found() {
            return;
        }

        self.timer.stop(now);
        self.completed = true;
        self.tracker.clear();

        let elapsed_seconds = self.timer.elapsed_seconds(now);
        tracing::info!(
            "Puzzle {} completed in {}s with {} hints",
            self.puzzle.id,
            elapsed_seconds,
            self.progress.hints_used
        );

        events.push(SessionEvent::PuzzleCompleted {
            elapsed_seconds,
            hints_used: self.progress.hints_used,
        });
    }

    /// Spend a hint. Nothing happens when the budget is empty or the last
    /// hint has not been found yet.
    pub fn request_hint(&mut self, rng: &mut impl Rng) -> Vec<SessionEvent> {
        if self.completed {
            return Vec::new();
        }

        let outcome = self.hints.request_hint(
            &self.puzzle.grid,
            &self.puzzle.catalog,
            &mut self.progress,
            rng,
        );

        match outcome {
            HintOutcome::NoHintsLeft | HintOutcome::Pending => {
                tracing::debug!("Hint request on puzzle {} ignored: {:?}", self.puzzle.id, outcome);
                Vec::new()
            }
            HintOutcome::Exhausted => vec![
                SessionEvent::HintsChanged(self.progress.hints_remaining),
                SessionEvent::HintCleared,
                SessionEvent::ProgressChanged,
            ],
            HintOutcome::Revealed(hint) => vec![
                SessionEvent::HintsChanged(self.progress.hints_remaining),
                SessionEvent::HintRevealed(hint),
                SessionEvent::ProgressChanged,
            ],
        }
    }

    /// Zero the clock; it starts again on the next press. A finished time is
    /// kept. Returns whether the timer was reset.
    pub fn reset_timer(&mut self) -> bool {
        if self.completed {
            return false;
        }
        self.timer.reset();
        true
    }

    /// Forget every found word and start the puzzle over
    pub fn reset_progress(&mut self) -> Vec<SessionEvent> {
        self.progress = PuzzleProgress::new(self.starting_hints);
        self.tracker.clear();
        self.hints.reset();
        self.timer.reset();
        self.completed = false;

        vec![
            SessionEvent::SelectionChanged(Vec::new()),
            SessionEvent::HintCleared,
            SessionEvent::HintsChanged(self.starting_hints),
        ]
    }

    /// Highlight color of every cell, row by row
    pub fn cell_colors(&self) -> Vec<Vec<Option<ColorTag>>> {
        let grid = &self.puzzle.grid;
        let mut colors = vec![vec![None; grid.cols()]; grid.rows()];

        for found in self.progress.found_words() {
            if !found.category.counts_toward_completion() {
                continue;
            }
            for cell in &found.path {
                if let Some(slot) = colors.get_mut(cell.row).and_then(|row| row.get_mut(cell.col)) {
                    *slot = found.color;
                }
            }
        }

        colors
    }

    pub fn snapshot(&self, now: Instant) -> ProgressSnapshot {
        let found = self.progress.found_words();
        let mut found_cells: Vec<Cell> = self.progress.found_cells().iter().copied().collect();
        found_cells.sort();

        ProgressSnapshot {
            found_words: found.iter().map(|f| f.word.clone()).collect(),
            found_word_positions: found.iter().map(|f| f.path.clone()).collect(),
            word_colors: found.iter().map(|f| f.color).collect(),
            cell_colors: self.cell_colors(),
            found_cells,
            word_categories: found.iter().map(|f| f.category).collect(),
            hints_remaining: Some(self.progress.hints_remaining),
            hints_used: self.progress.hints_used,
            completed: self.completed,
            elapsed_seconds: self.timer.elapsed_seconds(now),
            active_hint: self.hints.active().map(|hint| hint.word.clone()),
        }
    }
}
