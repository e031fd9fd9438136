//! DDR5 adapters for the shared annotation grids.

use buslens_waveform::BitString;

use crate::ddr5::Ddr5Command;

use super::{
    format_data_words, Annotator, AnnotatorConfig, BankAction, BankGrid, BankScope, PageGrid,
    Target,
};

fn index_of(value: &BitString) -> usize {
    value.to_decimal().unwrap_or(0) as usize
}

/// Reduces a command to the banks it addresses. Commands without a bank
/// target (mode registers, Vref, MPC, power-down, errors) return `None`.
fn target_of(command: &Ddr5Command) -> Option<(Target, BankAction)> {
    let rank = index_of(command.chip_select());
    let target = |chip: &BitString, scope: BankScope, column: Option<u64>| Target {
        rank,
        chip: index_of(chip),
        scope,
        column,
    };
    match command {
        Ddr5Command::Activate {
            chip_id,
            bank_group_address,
            bank_address,
            ..
        } => Some((
            target(
                chip_id,
                BankScope::One(bank_of(bank_group_address, bank_address)),
                None,
            ),
            BankAction::Activate,
        )),
        Ddr5Command::Read {
            chip_id,
            bank_group_address,
            bank_address,
            column_address,
            ..
        } => Some((
            target(
                chip_id,
                BankScope::One(bank_of(bank_group_address, bank_address)),
                column_address.to_decimal(),
            ),
            BankAction::Read,
        )),
        Ddr5Command::ReadAutoPrecharge {
            chip_id,
            bank_group_address,
            bank_address,
            column_address,
            ..
        } => Some((
            target(
                chip_id,
                BankScope::One(bank_of(bank_group_address, bank_address)),
                column_address.to_decimal(),
            ),
            BankAction::ReadAutoPrecharge,
        )),
        Ddr5Command::Write {
            chip_id,
            bank_group_address,
            bank_address,
            column_address,
            ..
        }
        | Ddr5Command::WritePattern {
            chip_id,
            bank_group_address,
            bank_address,
            column_address,
            ..
        } => Some((
            target(
                chip_id,
                BankScope::One(bank_of(bank_group_address, bank_address)),
                column_address.to_decimal(),
            ),
            BankAction::Write,
        )),
        Ddr5Command::WriteAutoPrecharge {
            chip_id,
            bank_group_address,
            bank_address,
            column_address,
            ..
        }
        | Ddr5Command::WritePatternAutoPrecharge {
            chip_id,
            bank_group_address,
            bank_address,
            column_address,
            ..
        } => Some((
            target(
                chip_id,
                BankScope::One(bank_of(bank_group_address, bank_address)),
                column_address.to_decimal(),
            ),
            BankAction::WriteAutoPrecharge,
        )),
        Ddr5Command::Precharge {
            chip_id,
            bank_group_address,
            bank_address,
            ..
        } => Some((
            target(
                chip_id,
                BankScope::One(bank_of(bank_group_address, bank_address)),
                None,
            ),
            BankAction::Precharge,
        )),
        Ddr5Command::PrechargeSameBank {
            chip_id,
            bank_address,
            ..
        } => Some((
            target(
                chip_id,
                BankScope::SameAcrossGroups(index_of(bank_address)),
                None,
            ),
            BankAction::Precharge,
        )),
        Ddr5Command::PrechargeAll { chip_id, .. } => Some((
            target(chip_id, BankScope::Rank, None),
            BankAction::Precharge,
        )),
        Ddr5Command::RefreshAll { chip_id, .. }
        | Ddr5Command::RefreshManagementAll { chip_id, .. } => {
            Some((target(chip_id, BankScope::Rank, None), BankAction::Refresh))
        }
        Ddr5Command::RefreshSameBank {
            chip_id,
            bank_address,
            ..
        }
        | Ddr5Command::RefreshManagementSameBank {
            chip_id,
            bank_address,
            ..
        } => Some((
            target(
                chip_id,
                BankScope::SameAcrossGroups(index_of(bank_address)),
                None,
            ),
            BankAction::Refresh,
        )),
        _ => None,
    }
}

fn bank_of(bank_group_address: &BitString, bank_address: &BitString) -> usize {
    let banks_per_group = 1 << bank_address.width().max(1);
    index_of(bank_group_address) * banks_per_group + index_of(bank_address)
}

pub struct Ddr5BankAnnotator {
    grid: BankGrid,
}

impl Ddr5BankAnnotator {
    pub fn new(config: AnnotatorConfig) -> Ddr5BankAnnotator {
        Ddr5BankAnnotator {
            grid: BankGrid::new(config),
        }
    }
}

impl Default for Ddr5BankAnnotator {
    fn default() -> Self {
        Ddr5BankAnnotator::new(AnnotatorConfig::ddr5())
    }
}

impl Annotator<Ddr5Command> for Ddr5BankAnnotator {
    fn observe(&mut self, packet: &Ddr5Command) {
        match target_of(packet) {
            Some((target, action)) => self.grid.update(&target, action),
            None => self.grid.update_idle(),
        }
    }

    fn render(&self) -> String {
        self.grid.line().to_string()
    }
}

pub struct Ddr5PageAnnotator {
    grid: PageGrid,
}

impl Ddr5PageAnnotator {
    pub fn new(config: AnnotatorConfig) -> Ddr5PageAnnotator {
        Ddr5PageAnnotator {
            grid: PageGrid::new(config),
        }
    }
}

impl Default for Ddr5PageAnnotator {
    fn default() -> Self {
        Ddr5PageAnnotator::new(AnnotatorConfig::ddr5())
    }
}

impl Annotator<Ddr5Command> for Ddr5PageAnnotator {
    fn observe(&mut self, packet: &Ddr5Command) {
        match target_of(packet) {
            Some((target, action)) => self.grid.update(&target, action),
            None => self.grid.update_idle(),
        }
    }

    fn render(&self) -> String {
        self.grid.line().to_string()
    }
}

pub struct Ddr5DataAnnotator {
    words: usize,
    last_line: String,
}

impl Ddr5DataAnnotator {
    pub fn new(config: AnnotatorConfig) -> Ddr5DataAnnotator {
        Ddr5DataAnnotator {
            words: config.data_words,
            last_line: format_data_words(None, config.data_words),
        }
    }
}

impl Default for Ddr5DataAnnotator {
    fn default() -> Self {
        Ddr5DataAnnotator::new(AnnotatorConfig::ddr5())
    }
}

impl Annotator<Ddr5Command> for Ddr5DataAnnotator {
    fn observe(&mut self, packet: &Ddr5Command) {
        self.last_line = format_data_words(packet.data(), self.words);
    }

    fn render(&self) -> String {
        self.last_line.clone()
    }
}
