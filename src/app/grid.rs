// Pane grid - a ragged 2-D arrangement of panes with one cursor and a focus flag.
// Unfocused, the arrow/hjkl keys move the cursor between panes; focused, input
// goes to the pane under the cursor.

use super::items::Item;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaneId {
    NowPlaying,
    Artists,
    Tracks,
    Playlists,
    PlaylistItems,
    Devices,
    Queue,
    Recent,
    Controls,
}

impl PaneId {
    pub fn title(&self) -> &'static str {
        match self {
            PaneId::NowPlaying => "Now Playing",
            PaneId::Artists => "Top Artists",
            PaneId::Tracks => "Top Tracks",
            PaneId::Playlists => "Playlists",
            PaneId::PlaylistItems => "Playlist",
            PaneId::Devices => "Devices",
            PaneId::Queue => "Queue",
            PaneId::Recent => "Recently Played",
            PaneId::Controls => "Controls",
        }
    }

    pub fn kind(&self) -> PaneKind {
        match self {
            PaneId::NowPlaying => PaneKind::ReadOnly,
            PaneId::Controls => PaneKind::Media,
            _ => PaneKind::List,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneKind {
    /// Shown, never focused, skipped by cursor movement
    ReadOnly,
    List,
    Media,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaButton {
    Previous,
    PlayPause,
    Next,
    VolumeDown,
    VolumeUp,
}

impl MediaButton {
    pub const ALL: [MediaButton; 5] = [
        MediaButton::Previous,
        MediaButton::PlayPause,
        MediaButton::Next,
        MediaButton::VolumeDown,
        MediaButton::VolumeUp,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MediaButton::Previous => "|<<",
            MediaButton::PlayPause => "play/pause",
            MediaButton::Next => ">>|",
            MediaButton::VolumeDown => "vol -",
            MediaButton::VolumeUp => "vol +",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pane {
    pub id: PaneId,
    pub items: Vec<Item>,
    /// Row in a list pane, button index in the media pane
    pub selected: usize,
}

impl Pane {
    pub fn new(id: PaneId) -> Self {
        Self {
            id,
            items: Vec::new(),
            selected: 0,
        }
    }

    pub fn is_focusable(&self) -> bool {
        self.id.kind() != PaneKind::ReadOnly
    }

    fn len(&self) -> usize {
        match self.id.kind() {
            PaneKind::Media => MediaButton::ALL.len(),
            _ => self.items.len(),
        }
    }

    /// Moves the selection by `delta`, clamped to the pane's rows.
    pub fn move_selection(&mut self, delta: isize) {
        let len = self.len();
        if len == 0 {
            self.selected = 0;
            return;
        }
        let next = self.selected as isize + delta;
        self.selected = next.clamp(0, len as isize - 1) as usize;
    }

    pub fn selected_item(&self) -> Option<&Item> {
        self.items.get(self.selected)
    }

    pub fn selected_button(&self) -> Option<MediaButton> {
        match self.id.kind() {
            PaneKind::Media => MediaButton::ALL.get(self.selected).copied(),
            _ => None,
        }
    }

    /// Replaces the rows, keeping the selection in range.
    pub fn set_items(&mut self, items: Vec<Item>) {
        self.items = items;
        if self.selected >= self.items.len() {
            self.selected = self.items.len().saturating_sub(1);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    rows: Vec<Vec<Pane>>,
    cursor: Position,
    focused: bool,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(vec![
            vec![PaneId::NowPlaying],
            vec![
                PaneId::Artists,
                PaneId::Tracks,
                PaneId::Playlists,
                PaneId::PlaylistItems,
            ],
            vec![PaneId::Devices, PaneId::Queue, PaneId::Recent],
            vec![PaneId::Controls],
        ])
    }
}

impl Grid {
    /// Cursor starts on the first focusable pane, reading row by row.
    pub fn new(layout: Vec<Vec<PaneId>>) -> Self {
        let rows: Vec<Vec<Pane>> = layout
            .into_iter()
            .map(|row| row.into_iter().map(Pane::new).collect())
            .collect();

        let cursor = rows
            .iter()
            .enumerate()
            .find_map(|(r, row)| {
                row.iter()
                    .position(Pane::is_focusable)
                    .map(|c| Position::new(r, c))
            })
            .unwrap_or_default();

        Self {
            rows,
            cursor,
            focused: false,
        }
    }

    pub fn rows(&self) -> &[Vec<Pane>] {
        &self.rows
    }

    pub fn cursor(&self) -> Position {
        self.cursor
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn current(&self) -> Option<&Pane> {
        self.rows.get(self.cursor.row)?.get(self.cursor.col)
    }

    pub fn current_mut(&mut self) -> Option<&mut Pane> {
        self.rows.get_mut(self.cursor.row)?.get_mut(self.cursor.col)
    }

    pub fn pane(&self, id: PaneId) -> Option<&Pane> {
        self.rows.iter().flatten().find(|p| p.id == id)
    }

    pub fn pane_mut(&mut self, id: PaneId) -> Option<&mut Pane> {
        self.rows.iter_mut().flatten().find(|p| p.id == id)
    }

    pub fn set_items(&mut self, id: PaneId, items: Vec<Item>) {
        if let Some(pane) = self.pane_mut(id) {
            pane.set_items(items);
        }
    }

    /// Focuses the pane under the cursor. False when it cannot take focus.
    pub fn focus(&mut self) -> bool {
        let focusable = self.current().is_some_and(Pane::is_focusable);
        if focusable {
            self.focused = true;
        }
        focusable
    }

    pub fn unfocus(&mut self) {
        self.focused = false;
    }

    /// Cursor movement between panes. Out of bounds is a no-op, read-only
    /// panes and rows without a focusable pane are stepped over.
    pub fn move_cursor(&mut self, direction: Direction) {
        if self.focused {
            return;
        }
        let next = match direction {
            Direction::Up => self.next_row(-1),
            Direction::Down => self.next_row(1),
            Direction::Left => self.next_col(-1),
            Direction::Right => self.next_col(1),
        };
        if let Some(pos) = next {
            self.cursor = pos;
        }
    }

    fn next_row(&self, step: isize) -> Option<Position> {
        let mut row = self.cursor.row as isize;
        loop {
            row += step;
            if row < 0 || row as usize >= self.rows.len() {
                return None;
            }
            let panes = &self.rows[row as usize];
            if panes.is_empty() {
                continue;
            }
            // same column if the row is wide enough, else its last pane
            let wanted = self.cursor.col.min(panes.len() - 1);
            if let Some(col) = nearest_focusable(panes, wanted) {
                return Some(Position::new(row as usize, col));
            }
        }
    }

    fn next_col(&self, step: isize) -> Option<Position> {
        let panes = self.rows.get(self.cursor.row)?;
        let mut col = self.cursor.col as isize;
        loop {
            col += step;
            if col < 0 || col as usize >= panes.len() {
                return None;
            }
            if panes[col as usize].is_focusable() {
                return Some(Position::new(self.cursor.row, col as usize));
            }
        }
    }
}

fn nearest_focusable(panes: &[Pane], wanted: usize) -> Option<usize> {
    (0..panes.len())
        .filter(|&c| panes[c].is_focusable())
        .min_by_key(|&c| c.abs_diff(wanted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spotify::types::Artist;

    fn artist(name: &str) -> Item {
        Item::Artist(Artist {
            id: name.into(),
            name: name.into(),
            genres: vec![],
            popularity: 0,
            uri: String::new(),
        })
    }

    #[test]
    fn test_cursor_starts_below_read_only_row() {
        let grid = Grid::default();
        assert_eq!(grid.cursor(), Position::new(1, 0));
        assert_eq!(grid.current().unwrap().id, PaneId::Artists);
        assert!(!grid.is_focused());
    }

    #[test]
    fn test_moving_up_into_read_only_row_is_a_no_op() {
        let mut grid = Grid::default();
        grid.move_cursor(Direction::Up);
        assert_eq!(grid.cursor(), Position::new(1, 0));
    }

    #[test]
    fn test_edges_clamp_instead_of_wrapping() {
        let mut grid = Grid::default();
        grid.move_cursor(Direction::Left);
        assert_eq!(grid.cursor(), Position::new(1, 0));

        for _ in 0..10 {
            grid.move_cursor(Direction::Right);
        }
        assert_eq!(grid.cursor(), Position::new(1, 3));

        for _ in 0..10 {
            grid.move_cursor(Direction::Down);
        }
        assert_eq!(grid.cursor(), Position::new(3, 0));
        assert_eq!(grid.current().unwrap().id, PaneId::Controls);
    }

    #[test]
    fn test_column_clamps_into_shorter_row() {
        let mut grid = Grid::default();
        for _ in 0..3 {
            grid.move_cursor(Direction::Right);
        }
        grid.move_cursor(Direction::Down);
        assert_eq!(grid.cursor(), Position::new(2, 2));
        assert_eq!(grid.current().unwrap().id, PaneId::Recent);
    }

    #[test]
    fn test_read_only_panes_are_skipped_sideways() {
        let mut grid = Grid::new(vec![vec![PaneId::Artists, PaneId::NowPlaying, PaneId::Tracks]]);
        grid.move_cursor(Direction::Right);
        assert_eq!(grid.current().unwrap().id, PaneId::Tracks);
        grid.move_cursor(Direction::Left);
        assert_eq!(grid.current().unwrap().id, PaneId::Artists);
    }

    #[test]
    fn test_rows_without_focusable_panes_are_skipped() {
        let mut grid = Grid::new(vec![
            vec![PaneId::Artists],
            vec![PaneId::NowPlaying],
            vec![PaneId::Tracks],
        ]);
        grid.move_cursor(Direction::Down);
        assert_eq!(grid.current().unwrap().id, PaneId::Tracks);
        grid.move_cursor(Direction::Up);
        assert_eq!(grid.current().unwrap().id, PaneId::Artists);
    }

    #[test]
    fn test_focus_freezes_cursor() {
        let mut grid = Grid::default();
        assert!(grid.focus());
        grid.move_cursor(Direction::Right);
        assert_eq!(grid.cursor(), Position::new(1, 0));
        grid.unfocus();
        grid.move_cursor(Direction::Right);
        assert_eq!(grid.cursor(), Position::new(1, 1));
    }

    #[test]
    fn test_selection_clamps_and_survives_shrinking() {
        let mut pane = Pane::new(PaneId::Artists);
        pane.set_items(vec![artist("a"), artist("b"), artist("c")]);
        pane.move_selection(5);
        assert_eq!(pane.selected, 2);
        pane.move_selection(-10);
        assert_eq!(pane.selected, 0);

        pane.move_selection(2);
        pane.set_items(vec![artist("x")]);
        assert_eq!(pane.selected, 0);
        assert_eq!(pane.selected_item(), Some(&artist("x")));
    }

    #[test]
    fn test_media_pane_selects_buttons() {
        let mut pane = Pane::new(PaneId::Controls);
        assert_eq!(pane.selected_button(), Some(MediaButton::Previous));
        pane.move_selection(1);
        assert_eq!(pane.selected_button(), Some(MediaButton::PlayPause));
        pane.move_selection(10);
        assert_eq!(pane.selected_button(), Some(MediaButton::VolumeUp));
    }
}
