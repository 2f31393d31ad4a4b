//! The menu tree and its navigation operations.
//!
//! Menus live in an arena indexed by [`MenuId`]; the id doubles as the
//! identity used for the synthetic go-up entry, so two menus with equal
//! titles can never be confused. The whole tree is built once during setup
//! and never restructured afterwards.

use anyhow::Result;

use crate::{
    hal::TextScreen,
    runner::{Activity, TaskRunner},
    util::{ellipsize, truncate_chars},
};

/// Longest string an entry may occupy on screen.
pub const ENTRY_MAX_CHARS: usize = 29;

/// Arena index; compared for identity, never by menu content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuId(usize);

/// What selecting an item does.
pub enum Action {
    /// Long-running effect handed to the [`TaskRunner`]; the factory builds
    /// a fresh activity on every launch so effects restart from scratch.
    Effect(Box<dyn Fn() -> Box<dyn Activity> + Send + Sync>),
    /// Synchronous work executed on the controller thread with the text
    /// screen borrowed; returns before the menu is repainted.
    Script(Box<dyn FnMut(&mut dyn TextScreen) -> Result<()> + Send>),
}

pub struct Item {
    label: String,
    action: Action,
}

impl Item {
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// A child slot of a menu: either a submenu reference or a leaf item.
/// The first child of every non-root menu is its parent's id (the go-up
/// entry).
pub enum Entry {
    Menu(MenuId),
    Item(Item),
}

pub struct Menu {
    title: String,
    children: Vec<Entry>,
    selected: usize,
    parent: Option<MenuId>,
}

impl Menu {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn children(&self) -> &[Entry] {
        &self.children
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn parent(&self) -> Option<MenuId> {
        self.parent
    }

    /// Identity check for the synthetic go-up entry.
    pub fn is_go_up(&self, entry: &Entry) -> bool {
        match (entry, self.parent) {
            (Entry::Menu(id), Some(parent)) => *id == parent,
            _ => false,
        }
    }
}

#[derive(Default)]
pub struct MenuTree {
    menus: Vec<Menu>,
}

impl MenuTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a menu. A non-root menu starts with the go-up entry and is
    /// appended to its parent's child list.
    pub fn add_menu(&mut self, parent: Option<MenuId>, title: &str) -> MenuId {
        let id = MenuId(self.menus.len());
        let children = match parent {
            Some(parent_id) => vec![Entry::Menu(parent_id)],
            None => Vec::new(),
        };
        self.menus.push(Menu {
            // Menu titles give up one more char than items: the child-list
            // row spends two on the "> " marker.
            title: if title.chars().count() > ENTRY_MAX_CHARS {
                format!("{}...", truncate_chars(title, 25))
            } else {
                title.to_string()
            },
            children,
            selected: 0,
            parent,
        });
        if let Some(parent_id) = parent {
            self.menus[parent_id.0].children.push(Entry::Menu(id));
        }
        id
    }

    pub fn add_item(&mut self, menu: MenuId, label: &str, action: Action) {
        let label = ellipsize(label, ENTRY_MAX_CHARS);
        self.menus[menu.0]
            .children
            .push(Entry::Item(Item { label, action }));
    }

    pub fn menu(&self, id: MenuId) -> &Menu {
        &self.menus[id.0]
    }

    /// Move the highlight one row up, wrapping at the top.
    pub fn move_up(&mut self, id: MenuId) {
        let menu = &mut self.menus[id.0];
        let total = menu.children.len();
        if total == 0 {
            return;
        }
        menu.selected = (menu.selected + total - 1) % total;
    }

    /// Move the highlight one row down, wrapping at the bottom.
    pub fn move_down(&mut self, id: MenuId) {
        let menu = &mut self.menus[id.0];
        let total = menu.children.len();
        if total == 0 {
            return;
        }
        menu.selected = (menu.selected + 1) % total;
    }

    /// Act on the selected entry and return the menu that should be current
    /// afterwards: the target submenu (or parent, via the go-up entry) for a
    /// menu entry, the unchanged menu for an item.
    pub fn activate(
        &mut self,
        id: MenuId,
        screen: &mut dyn TextScreen,
        runner: &mut TaskRunner,
    ) -> Result<MenuId> {
        let menu = &mut self.menus[id.0];
        let selected = menu.selected;
        match menu.children.get_mut(selected) {
            None => Ok(id),
            Some(Entry::Menu(target)) => Ok(*target),
            Some(Entry::Item(item)) => {
                tracing::info!(item = %item.label, "item selected");
                match &mut item.action {
                    Action::Effect(factory) => runner.start(factory())?,
                    Action::Script(script) => script(screen)?,
                }
                Ok(id)
            }
        }
    }
}
