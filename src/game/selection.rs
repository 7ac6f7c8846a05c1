use super::grid::Cell;

/// Interaction state of the selection tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionState {
    #[default]
    Idle,
    /// Pointer is held down and sweeping across cells
    Dragging,
    /// A single tap left a live path that further taps extend
    ClickExtending,
}

/// What a gesture did to the live selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionUpdate {
    /// Path handed off for validation, if the gesture finished one
    pub submitted: Option<Vec<Cell>>,
    /// Whether the live path changed (line drawing must be refreshed)
    pub changed: bool,
}

impl SelectionUpdate {
    fn unchanged() -> Self {
        Self::default()
    }

    fn changed() -> Self {
        Self {
            submitted: None,
            changed: true,
        }
    }

    fn submit(path: Vec<Cell>) -> Self {
        Self {
            submitted: Some(path),
            changed: true,
        }
    }
}

/// Turns press/drag/release gestures into an ordered path of cells.
///
/// Consecutive cells of the live path are always 8-adjacent and no cell
/// repeats. Requests that would break this are ignored.
#[derive(Debug, Clone, Default)]
pub struct SelectionTracker {
    state: SelectionState,
    path: Vec<Cell>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    /// The live path, in selection order
    pub fn path(&self) -> &[Cell] {
        &self.path
    }

    /// Drop any live selection and return to idle
    pub fn clear(&mut self) -> SelectionUpdate {
        let had_path = !self.path.is_empty();
        self.path.clear();
        self.state = SelectionState::Idle;
        SelectionUpdate {
            submitted: None,
            changed: had_path,
        }
    }

    /// Pointer pressed on `cell`. `selectable` reports whether a cell is on the
    /// grid and not already part of a found word.
    pub fn press(&mut self, cell: Cell, selectable: impl Fn(Cell) -> bool) -> SelectionUpdate {
        if !selectable(cell) {
            return SelectionUpdate::unchanged();
        }

        match self.state {
            SelectionState::Idle => {
                self.path = vec![cell];
                self.state = SelectionState::Dragging;
                SelectionUpdate::changed()
            }
            // A second pointer going down mid-drag is ignored
            SelectionState::Dragging => SelectionUpdate::unchanged(),
            SelectionState::ClickExtending => self.tap(cell),
        }
    }

    fn tap(&mut self, cell: Cell) -> SelectionUpdate {
        let Some(&last) = self.path.last() else {
            self.path = vec![cell];
            return SelectionUpdate::changed();
        };

        if self.path.contains(&cell) {
            // Tapping a selected cell finalizes the current path
            self.state = SelectionState::Idle;
            return SelectionUpdate::submit(std::mem::take(&mut self.path));
        }

        if last.is_adjacent(cell) {
            self.path.push(cell);
            return SelectionUpdate::changed();
        }

        // Non-adjacent tap: finalize the current path and start a new one here
        let finished = std::mem::replace(&mut self.path, vec![cell]);
        SelectionUpdate::submit(finished)
    }

    /// Pointer moved over `cell` while held down
    pub fn drag(&mut self, cell: Cell, selectable: impl Fn(Cell) -> bool) -> SelectionUpdate {
        if self.state != SelectionState::Dragging
            || !selectable(cell)
            || self.path.contains(&cell)
        {
            return SelectionUpdate::unchanged();
        }

        match self.path.last() {
            Some(last) if last.is_adjacent(cell) => {
                self.path.push(cell);
                SelectionUpdate::changed()
            }
            _ => SelectionUpdate::unchanged(),
        }
    }

    /// Pointer released
    pub fn release(&mut self) -> SelectionUpdate {
        if self.state != SelectionState::Dragging {
            return SelectionUpdate::unchanged();
        }

        if self.path.len() > 1 {
            self.state = SelectionState::Idle;
            SelectionUpdate::submit(std::mem::take(&mut self.path))
        } else {
            // A pure tap keeps its single cell live for click-to-extend
            self.state = SelectionState::ClickExtending;
            SelectionUpdate::unchanged()
        }
    }

    /// Pointer left the grid area while a drag may be in progress
    pub fn pointer_left(&mut self) -> SelectionUpdate {
        if self.state == SelectionState::Dragging && self.path.len() > 1 {
            self.release()
        } else {
            SelectionUpdate::unchanged()
        }
    }
}
