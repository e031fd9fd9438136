//! Stateful observers that turn the command stream into live side panels.
//!
//! The bank grid tracks which banks are open, the page grid tracks what has
//! happened to each column of the open pages, and the data panel formats
//! the most recent burst. The per-bus adapters reduce every command to a
//! [`Target`] plus a [`BankAction`] and feed the shared grids, so the grid
//! update rules live in one place.

mod ddr5;
mod hbm2e;

pub use ddr5::{Ddr5BankAnnotator, Ddr5DataAnnotator, Ddr5PageAnnotator};
pub use hbm2e::{Hbm2eBankAnnotator, Hbm2eDataAnnotator, Hbm2ePageAnnotator};

use buslens_waveform::BitString;

use crate::render::color;

/// A consumer of decoded commands that renders a fixed-width panel.
pub trait Annotator<T> {
    fn observe(&mut self, packet: &T);
    fn render(&self) -> String;
}

/// Geometry of the annotated channel.
#[derive(Debug, Clone)]
pub struct AnnotatorConfig {
    pub ranks: usize,
    /// Stacked chips per rank (3DS parts); 1 for planar devices.
    pub chips: usize,
    pub banks_per_rank: usize,
    /// Banks per bank group, for same-bank commands that hit every group.
    pub banks_per_group: usize,
    /// Cells of the page panel.
    pub page_columns: usize,
    /// Right-shift applied to column addresses before they index the page
    /// panel, folding the full column space onto the cells.
    pub column_shift: u32,
    /// 32-bit words shown by the data panel.
    pub data_words: usize,
}

impl AnnotatorConfig {
    pub fn ddr5() -> AnnotatorConfig {
        AnnotatorConfig {
            ranks: 2,
            chips: 1,
            banks_per_rank: 32,
            banks_per_group: 4,
            page_columns: 32,
            column_shift: 6,
            data_words: 4,
        }
    }

    pub fn hbm2e() -> AnnotatorConfig {
        AnnotatorConfig {
            ranks: 2,
            chips: 1,
            banks_per_rank: 16,
            banks_per_group: 16,
            page_columns: 64,
            column_shift: 0,
            data_words: 8,
        }
    }

    fn cells(&self) -> usize {
        self.ranks * self.chips * self.banks_per_rank
    }
}

/// What a command does to its target banks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankAction {
    Activate,
    Read,
    ReadAutoPrecharge,
    Write,
    WriteAutoPrecharge,
    Precharge,
    Refresh,
}

impl BankAction {
    fn glyph(self) -> char {
        match self {
            BankAction::Activate => 'A',
            BankAction::Read | BankAction::ReadAutoPrecharge => 'R',
            BankAction::Write | BankAction::WriteAutoPrecharge => 'W',
            BankAction::Precharge => 'P',
            BankAction::Refresh => 'F',
        }
    }

    fn glyph_color(self) -> &'static str {
        match self {
            BankAction::Activate => color::RED,
            BankAction::Read | BankAction::ReadAutoPrecharge => color::YELLOW,
            BankAction::Write | BankAction::WriteAutoPrecharge => color::CYAN,
            BankAction::Precharge => color::GREEN,
            BankAction::Refresh => color::BLUE,
        }
    }

    fn closes_row(self) -> bool {
        matches!(
            self,
            BankAction::Precharge | BankAction::ReadAutoPrecharge | BankAction::WriteAutoPrecharge
        )
    }
}

/// Which banks of the addressed rank/chip a command touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankScope {
    One(usize),
    /// The same bank address in every bank group.
    SameAcrossGroups(usize),
    /// Every bank of the rank.
    Rank,
}

/// The banks addressed by one command, as a plain record so the grid
/// update rules stay pure.
#[derive(Debug, Clone, Copy)]
pub struct Target {
    pub rank: usize,
    pub chip: usize,
    pub scope: BankScope,
    pub column: Option<u64>,
}

impl Target {
    fn cells(&self, config: &AnnotatorConfig) -> Vec<usize> {
        let base = (self.rank % config.ranks * config.chips + self.chip % config.chips)
            * config.banks_per_rank;
        match self.scope {
            BankScope::One(bank) => vec![base + bank % config.banks_per_rank],
            BankScope::SameAcrossGroups(bank) => {
                let groups = config.banks_per_rank / config.banks_per_group;
                (0..groups)
                    .map(|group| {
                        base + group * config.banks_per_group + bank % config.banks_per_group
                    })
                    .collect()
            }
            BankScope::Rank => (base..base + config.banks_per_rank).collect(),
        }
    }
}

const ACTIVE_GLYPH: char = '=';
const INACTIVE_GLYPH: char = '-';

/// Per-bank open/closed state across the whole channel.
pub struct BankGrid {
    config: AnnotatorConfig,
    active: Vec<bool>,
    last_line: String,
}

impl BankGrid {
    pub fn new(config: AnnotatorConfig) -> BankGrid {
        let cells = config.cells();
        let mut grid = BankGrid {
            config,
            active: vec![false; cells],
            last_line: String::new(),
        };
        grid.last_line = grid.render_cells(&[], None);
        grid
    }

    pub fn is_active(&self, cell: usize) -> bool {
        self.active.get(cell).copied().unwrap_or(false)
    }

    /// Applies one command and re-renders the panel with the touched banks
    /// overprinted by the action glyph.
    pub fn update(&mut self, target: &Target, action: BankAction) {
        let cells = target.cells(&self.config);
        match action {
            BankAction::Activate => {
                for cell in &cells {
                    self.active[*cell] = true;
                }
            }
            action if action.closes_row() => {
                for cell in &cells {
                    self.active[*cell] = false;
                }
            }
            _ => {}
        }
        self.last_line = self.render_cells(&cells, Some(action));
    }

    /// A command with no bank target: re-render the panel unchanged.
    pub fn update_idle(&mut self) {
        self.last_line = self.render_cells(&[], None);
    }

    pub fn line(&self) -> &str {
        &self.last_line
    }

    fn render_cells(&self, marked: &[usize], action: Option<BankAction>) -> String {
        let mut out = String::new();
        for cell in 0..self.config.cells() {
            if cell > 0 && cell % self.config.banks_per_rank == 0 {
                out.push(' ');
            }
            match action {
                Some(action) if marked.contains(&cell) => {
                    out.push_str(action.glyph_color());
                    out.push(action.glyph());
                    out.push_str(color::RESET);
                }
                _ => {
                    out.push(if self.active[cell] {
                        ACTIVE_GLYPH
                    } else {
                        INACTIVE_GLYPH
                    });
                }
            }
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    Inactive,
    Unused,
    Read,
    Written,
}

impl PageStatus {
    fn glyph(self) -> char {
        match self {
            PageStatus::Inactive => ' ',
            PageStatus::Unused => '.',
            PageStatus::Read => 'r',
            PageStatus::Written => 'w',
        }
    }

    fn glyph_color(self) -> Option<&'static str> {
        match self {
            PageStatus::Read => Some(color::YELLOW),
            PageStatus::Written => Some(color::CYAN),
            _ => None,
        }
    }
}

/// Per-column page status of every bank, rendered for the most recently
/// addressed bank.
pub struct PageGrid {
    config: AnnotatorConfig,
    rows: Vec<Vec<PageStatus>>,
    focus: usize,
    last_line: String,
}

impl PageGrid {
    pub fn new(config: AnnotatorConfig) -> PageGrid {
        let cells = config.cells();
        let columns = config.page_columns;
        let mut grid = PageGrid {
            config,
            rows: vec![vec![PageStatus::Inactive; columns]; cells],
            focus: 0,
            last_line: String::new(),
        };
        grid.last_line = grid.render_row(grid.focus, false);
        grid
    }

    pub fn status(&self, cell: usize, column: usize) -> PageStatus {
        self.rows[cell][column]
    }

    pub fn update(&mut self, target: &Target, action: BankAction) {
        let cells = target.cells(&self.config);
        if let BankScope::One(_) = target.scope {
            self.focus = cells[0];
        }
        let column_cell = target
            .column
            .map(|column| (column >> self.config.column_shift) as usize % self.config.page_columns);

        match action {
            BankAction::Activate => {
                for cell in &cells {
                    self.rows[*cell] = vec![PageStatus::Unused; self.config.page_columns];
                }
                self.last_line = self.render_row(self.focus, false);
            }
            BankAction::Read | BankAction::Write => {
                if let Some(column) = column_cell {
                    for cell in &cells {
                        self.touch(*cell, column, action);
                    }
                }
                self.last_line = self.render_row(self.focus, false);
            }
            BankAction::ReadAutoPrecharge | BankAction::WriteAutoPrecharge => {
                if let Some(column) = column_cell {
                    for cell in &cells {
                        self.touch(*cell, column, action);
                    }
                }
                self.last_line = self.render_row(self.focus, true);
                self.reset(&cells);
            }
            BankAction::Precharge => {
                self.last_line = self.render_row(self.focus, true);
                self.reset(&cells);
            }
            BankAction::Refresh => {
                self.last_line = self.render_row(self.focus, false);
            }
        }
    }

    pub fn update_idle(&mut self) {
        self.last_line = self.render_row(self.focus, false);
    }

    pub fn line(&self) -> &str {
        &self.last_line
    }

    fn touch(&mut self, cell: usize, column: usize, action: BankAction) {
        let status = &mut self.rows[cell][column];
        match action {
            BankAction::Write | BankAction::WriteAutoPrecharge => {
                *status = PageStatus::Written;
            }
            BankAction::Read | BankAction::ReadAutoPrecharge => {
                // A column that was written stays marked as written.
                if *status != PageStatus::Written {
                    *status = PageStatus::Read;
                }
            }
            _ => {}
        }
    }

    fn reset(&mut self, cells: &[usize]) {
        for cell in cells {
            self.rows[*cell] = vec![PageStatus::Inactive; self.config.page_columns];
        }
    }

    fn render_row(&self, cell: usize, precharge_overlay: bool) -> String {
        let mut out = String::new();
        if precharge_overlay {
            out.push_str(color::BG_GREEN);
        }
        for status in &self.rows[cell] {
            match status.glyph_color() {
                Some(code) => {
                    out.push_str(code);
                    out.push(status.glyph());
                    out.push_str(color::RESET);
                    if precharge_overlay {
                        out.push_str(color::BG_GREEN);
                    }
                }
                None => out.push(status.glyph()),
            }
        }
        if precharge_overlay {
            out.push_str(color::RESET);
        }
        out
    }
}

/// Formats a burst as 32-bit words, most significant first, fainting the
/// zero digits so sparse data reads at a glance. Commands without data
/// render as blank space of the same width.
pub fn format_data_words(data: Option<&BitString>, words: usize) -> String {
    let panel_width = words * 9;
    let data = match data {
        Some(data) if data.width() > 0 => data,
        _ => return " ".repeat(panel_width),
    };
    let mut out = String::new();
    let mut visible = 0usize;
    let width = data.width();
    let count = width.div_ceil(32);
    for index in 0..count {
        let hi = width - 32 * index;
        let lo = hi.saturating_sub(32);
        let word = data.slice(lo, hi);
        for digit in word.to_hex().chars() {
            if digit == '0' {
                out.push_str(color::FAINT);
                out.push(digit);
                out.push_str(color::RESET);
            } else {
                out.push(digit);
            }
            visible += 1;
        }
        out.push(' ');
        visible += 1;
    }
    while visible < panel_width {
        out.push(' ');
        visible += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::visible_text;

    fn small_config() -> AnnotatorConfig {
        AnnotatorConfig {
            ranks: 1,
            chips: 1,
            banks_per_rank: 8,
            banks_per_group: 4,
            page_columns: 8,
            column_shift: 0,
            data_words: 2,
        }
    }

    fn one_bank(bank: usize) -> Target {
        Target {
            rank: 0,
            chip: 0,
            scope: BankScope::One(bank),
            column: None,
        }
    }

    #[test]
    fn bank_grid_follows_activate_read_precharge() {
        let mut grid = BankGrid::new(small_config());
        grid.update(&one_bank(3), BankAction::Activate);
        assert!(grid.is_active(3));
        assert_eq!(visible_text(grid.line()), "---A----");

        grid.update(&one_bank(3), BankAction::Read);
        assert!(grid.is_active(3));
        assert_eq!(visible_text(grid.line()), "---R----");

        grid.update(&one_bank(3), BankAction::Precharge);
        assert!(!grid.is_active(3));
        assert_eq!(visible_text(grid.line()), "---P----");

        grid.update_idle();
        assert_eq!(visible_text(grid.line()), "--------");
    }

    #[test]
    fn auto_precharge_closes_the_bank_after_the_access() {
        let mut grid = BankGrid::new(small_config());
        grid.update(&one_bank(2), BankAction::Activate);
        grid.update(&one_bank(2), BankAction::WriteAutoPrecharge);
        assert!(!grid.is_active(2));
        grid.update_idle();
        assert_eq!(visible_text(grid.line()), "--------");
    }

    #[test]
    fn rank_scope_touches_every_bank() {
        let mut grid = BankGrid::new(small_config());
        grid.update(&one_bank(1), BankAction::Activate);
        grid.update(&one_bank(5), BankAction::Activate);
        let target = Target {
            rank: 0,
            chip: 0,
            scope: BankScope::Rank,
            column: None,
        };
        grid.update(&target, BankAction::Refresh);
        assert_eq!(visible_text(grid.line()), "FFFFFFFF");
        // Refresh does not change the open state.
        assert!(grid.is_active(1));
        assert!(grid.is_active(5));

        grid.update(&target, BankAction::Precharge);
        assert!(!grid.is_active(1));
        assert!(!grid.is_active(5));
    }

    #[test]
    fn same_bank_scope_hits_every_group() {
        let mut grid = BankGrid::new(small_config());
        let target = Target {
            rank: 0,
            chip: 0,
            scope: BankScope::SameAcrossGroups(1),
            column: None,
        };
        grid.update(&target, BankAction::Refresh);
        assert_eq!(visible_text(grid.line()), "-F---F--");
    }

    #[test]
    fn page_grid_written_dominates_read() {
        let mut grid = PageGrid::new(small_config());
        let access = |column: u64| Target {
            rank: 0,
            chip: 0,
            scope: BankScope::One(0),
            column: Some(column),
        };
        grid.update(&one_bank(0), BankAction::Activate);
        assert_eq!(visible_text(grid.line()), "........");
        grid.update(&access(2), BankAction::Write);
        assert_eq!(visible_text(grid.line()), "..w.....");
        grid.update(&access(2), BankAction::Read);
        assert_eq!(visible_text(grid.line()), "..w.....");
        grid.update(&access(5), BankAction::Read);
        assert_eq!(visible_text(grid.line()), "..w..r..");
        grid.update(&one_bank(0), BankAction::Precharge);
        // The overlayed render still shows the final page contents...
        assert_eq!(visible_text(grid.line()), "..w..r..");
        // ...and the stored state is cleared.
        grid.update_idle();
        assert_eq!(visible_text(grid.line()), "        ");
    }

    #[test]
    fn activate_reinitializes_the_row() {
        let mut grid = PageGrid::new(small_config());
        let access = |column: u64| Target {
            rank: 0,
            chip: 0,
            scope: BankScope::One(1),
            column: Some(column),
        };
        grid.update(&one_bank(1), BankAction::Activate);
        grid.update(&access(7), BankAction::Write);
        grid.update(&one_bank(1), BankAction::Activate);
        assert_eq!(visible_text(grid.line()), "........");
    }

    #[test]
    fn data_panel_formats_words_and_pads() {
        let data = BitString::from_token("b1", 64);
        let panel = format_data_words(Some(&data), 2);
        assert_eq!(visible_text(&panel), "00000000 00000001 ");
        let blank = format_data_words(None, 2);
        assert_eq!(blank, " ".repeat(18));
    }
}
