//! Paged menu rendering onto the 29x13 character grid.
//!
//! Row 0 carries the framed title; the 12 rows below it show either the
//! first page of children or, once the highlight moves past the page, a
//! sliding window that keeps the selected entry on the last visible row.
//! Every row is written at full width so stale text from a longer list is
//! always overwritten.

use anyhow::Result;

use crate::{
    config::ColorScheme,
    hal::{Rgb, TextScreen, TextStyle},
    menu::{Entry, MenuId, MenuTree},
    util::{center, pad_row, truncate_chars},
};

/// Characters per row at the standard font.
pub const ROW_CHARS: usize = 29;
/// Row pitch in pixels.
pub const ROW_HEIGHT_PX: i32 = 18;
/// Content rows below the title row.
pub const VISIBLE_ROWS: usize = 12;
/// The framed header truncates the title harder than child rows do.
pub const HEADER_TITLE_CHARS: usize = 19;

pub const SCREEN_WIDTH_PX: u32 = 320;
pub const SCREEN_HEIGHT_PX: u32 = 240;

/// Resolved theme colors.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub background: Rgb,
    pub text: Rgb,
    pub selected_text: Rgb,
    pub selected_background: Rgb,
}

impl Palette {
    pub fn from_scheme(colors: &ColorScheme) -> Self {
        Self {
            background: parse_color(&colors.background, Rgb::WHITE),
            text: parse_color(&colors.text, Rgb::BLACK),
            selected_text: parse_color(&colors.selected_text, Rgb::WHITE),
            selected_background: parse_color(&colors.selected_background, Rgb::BLACK),
        }
    }
}

fn parse_color(input: &str, fallback: Rgb) -> Rgb {
    let hex = input.trim().trim_start_matches('#');
    if hex.len() == 6 {
        if let Ok(value) = u32::from_str_radix(hex, 16) {
            return Rgb::new(
                ((value >> 16) & 0xFF) as u8,
                ((value >> 8) & 0xFF) as u8,
                (value & 0xFF) as u8,
            );
        }
    }
    fallback
}

pub struct MenuRenderer {
    palette: Palette,
}

impl MenuRenderer {
    pub fn new(palette: Palette) -> Self {
        Self { palette }
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    /// Repaint the whole menu view for `id`.
    pub fn draw(&self, screen: &mut dyn TextScreen, tree: &MenuTree, id: MenuId) -> Result<()> {
        let menu = tree.menu(id);
        let header = center(
            &format!(" --- {} ---", truncate_chars(menu.title(), HEADER_TITLE_CHARS)),
            ROW_CHARS,
        );
        self.write_row(screen, 0, &header, false)?;

        let children = menu.children();
        let selected = menu.selected();

        if selected < VISIBLE_ROWS {
            // First page; blank the tail rows so a shorter list erases a
            // longer one drawn before it.
            for row in 0..VISIBLE_ROWS {
                let line = row + 1;
                match children.get(row) {
                    Some(entry) => {
                        let text = self.entry_text(tree, id, entry);
                        self.write_row(screen, line, &text, row == selected)?;
                    }
                    None => self.write_row(screen, line, &" ".repeat(ROW_CHARS), false)?,
                }
            }
        } else {
            // Sliding window: exactly VISIBLE_ROWS entries ending at the
            // selection, so the highlight sits on the last visible row.
            let start = selected + 1 - VISIBLE_ROWS;
            for (line_offset, idx) in (start..=selected).enumerate() {
                let text = self.entry_text(tree, id, &children[idx]);
                self.write_row(screen, line_offset + 1, &text, idx == selected)?;
            }
        }
        Ok(())
    }

    fn entry_text(&self, tree: &MenuTree, current: MenuId, entry: &Entry) -> String {
        let menu = tree.menu(current);
        if menu.is_go_up(entry) {
            return pad_row("..", ROW_CHARS);
        }
        match entry {
            Entry::Menu(id) => pad_row(
                &format!("> {}", truncate_chars(tree.menu(*id).title(), 27)),
                ROW_CHARS,
            ),
            Entry::Item(item) => pad_row(item.label(), ROW_CHARS),
        }
    }

    fn write_row(
        &self,
        screen: &mut dyn TextScreen,
        line: usize,
        text: &str,
        highlighted: bool,
    ) -> Result<()> {
        let y = line as i32 * ROW_HEIGHT_PX;
        if highlighted {
            screen.write_text(
                0,
                y,
                text,
                TextStyle::Highlight,
                self.palette.selected_text,
                self.palette.selected_background,
            )
        } else {
            screen.write_text(
                0,
                y,
                text,
                TextStyle::Normal,
                self.palette.text,
                self.palette.background,
            )
        }
    }
}
