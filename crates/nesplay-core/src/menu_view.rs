use crate::host::{HostEvent, Key, KeyAction, Rect, Rgba};
use crate::view::{Transition, View, ViewContext};
use log::debug;
use std::path::{Path, PathBuf};

const COLUMNS: usize = 4;
const VISIBLE_ROWS: usize = 3;
const CELL_PADDING: f32 = 0.04;

const BACKGROUND: Rgba = Rgba::new(51, 51, 51, 255);
const CELL_COLOR: Rgba = Rgba::new(90, 90, 90, 255);
const SELECTED_COLOR: Rgba = Rgba::new(230, 230, 230, 255);

/// Grid of program images to pick from.
///
/// The menu is created once by the director and kept alive across game
/// sessions, so the selection survives a round trip through a game.
pub struct MenuView {
    paths: Vec<PathBuf>,
    selected: usize,
}

impl MenuView {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths, selected: 0 }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_path(&self) -> Option<&Path> {
        self.paths.get(self.selected).map(PathBuf::as_path)
    }

    fn move_selection(&mut self, dx: isize, dy: isize) {
        if self.paths.is_empty() {
            return;
        }
        let last = self.paths.len() as isize - 1;
        let next = self.selected as isize + dx + dy * COLUMNS as isize;
        self.selected = next.clamp(0, last) as usize;
    }

    fn first_visible_row(&self) -> usize {
        let row = self.selected / COLUMNS;
        row.saturating_sub(VISIBLE_ROWS - 1)
    }

    fn cell_rect(column: usize, visible_row: usize) -> Rect {
        let w = 2.0 / COLUMNS as f32;
        let h = 2.0 / VISIBLE_ROWS as f32;
        let x = -1.0 + column as f32 * w;
        let y = 1.0 - (visible_row + 1) as f32 * h;
        Rect::new(
            x + CELL_PADDING,
            y + CELL_PADDING,
            w - 2.0 * CELL_PADDING,
            h - 2.0 * CELL_PADDING,
        )
    }
}

impl View for MenuView {
    fn enter(&mut self, ctx: &mut ViewContext<'_>) {
        ctx.host.set_clear_color(BACKGROUND);
        ctx.host.set_title("Select Game");
        if self.selected >= self.paths.len() {
            self.selected = 0;
        }
    }

    fn exit(&mut self, ctx: &mut ViewContext<'_>) {
        ctx.host.set_clear_color(Rgba::BLACK);
    }

    fn update(&mut self, ctx: &mut ViewContext<'_>, _t: f64, _dt: f64) {
        let first_row = self.first_visible_row();
        let start = first_row * COLUMNS;
        let end = (start + COLUMNS * VISIBLE_ROWS).min(self.paths.len());
        for index in start..end {
            let offset = index - start;
            let rect = Self::cell_rect(offset % COLUMNS, offset / COLUMNS);
            let color = if index == self.selected {
                SELECTED_COLOR
            } else {
                CELL_COLOR
            };
            ctx.host.fill_rect(rect, color);
        }
    }

    fn handle_event(&mut self, ctx: &mut ViewContext<'_>, event: &HostEvent) {
        let HostEvent::Key { key, action, .. } = *event else {
            return;
        };
        if action == KeyAction::Release {
            return;
        }

        match key {
            Key::Left => self.move_selection(-1, 0),
            Key::Right => self.move_selection(1, 0),
            Key::Up => self.move_selection(0, -1),
            Key::Down => self.move_selection(0, 1),
            Key::Enter if action == KeyAction::Press => {
                if let Some(path) = self.selected_path() {
                    debug!("Menu selected {}", path.display());
                    ctx.request(Transition::PlayGame(path.to_path_buf()));
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu(n: usize) -> MenuView {
        MenuView::new((0..n).map(|i| PathBuf::from(format!("{i}.nes"))).collect())
    }

    #[test]
    fn selection_clamps_to_bounds() {
        let mut m = menu(6);
        m.move_selection(-1, 0);
        assert_eq!(m.selected(), 0);
        m.move_selection(0, 1);
        assert_eq!(m.selected(), 4);
        m.move_selection(0, 1);
        assert_eq!(m.selected(), 5);
        m.move_selection(0, -1);
        assert_eq!(m.selected(), 1);
    }

    #[test]
    fn empty_menu_has_no_selection() {
        let mut m = menu(0);
        m.move_selection(1, 1);
        assert_eq!(m.selected(), 0);
        assert!(m.selected_path().is_none());
    }

    #[test]
    fn scrolls_to_keep_selection_visible() {
        let mut m = menu(20);
        assert_eq!(m.first_visible_row(), 0);
        m.move_selection(0, 3);
        assert_eq!(m.selected(), 12);
        assert_eq!(m.first_visible_row(), 1);
    }
}
