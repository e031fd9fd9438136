//! HBM2e adapters for the shared annotation grids.
//!
//! Bank state lives on the row bus and page traffic on the column bus, so
//! these annotators consume the merged [`Hbm2eCommand`] stream. The pseudo
//! channel plays the rank role of the grid geometry.

use buslens_waveform::BitString;

use crate::hbm2e::{Hbm2eColumnCommand, Hbm2eCommand, Hbm2eRowCommand};

use super::{
    format_data_words, Annotator, AnnotatorConfig, BankAction, BankGrid, BankScope, PageGrid,
    Target,
};

fn index_of(value: &BitString) -> usize {
    value.to_decimal().unwrap_or(0) as usize
}

fn target_of(command: &Hbm2eCommand) -> Option<(Target, BankAction)> {
    match command {
        Hbm2eCommand::Row(row) => row_target(row),
        Hbm2eCommand::Column(column) => column_target(column),
    }
}

fn row_target(command: &Hbm2eRowCommand) -> Option<(Target, BankAction)> {
    let target = |pseudo_channel: &BitString, stack_id: &BitString, scope: BankScope| Target {
        rank: index_of(pseudo_channel),
        chip: index_of(stack_id),
        scope,
        column: None,
    };
    match command {
        Hbm2eRowCommand::Activate {
            pseudo_channel,
            stack_id,
            bank_address,
            ..
        } => Some((
            target(
                pseudo_channel,
                stack_id,
                BankScope::One(index_of(bank_address)),
            ),
            BankAction::Activate,
        )),
        Hbm2eRowCommand::Precharge {
            pseudo_channel,
            stack_id,
            bank_address,
            ..
        } => Some((
            target(
                pseudo_channel,
                stack_id,
                BankScope::One(index_of(bank_address)),
            ),
            BankAction::Precharge,
        )),
        Hbm2eRowCommand::PrechargeAll { pseudo_channel, .. } => Some((
            Target {
                rank: index_of(pseudo_channel),
                chip: 0,
                scope: BankScope::Rank,
                column: None,
            },
            BankAction::Precharge,
        )),
        Hbm2eRowCommand::SingleBankRefresh {
            pseudo_channel,
            stack_id,
            bank_address,
            ..
        } => Some((
            target(
                pseudo_channel,
                stack_id,
                BankScope::One(index_of(bank_address)),
            ),
            BankAction::Refresh,
        )),
        Hbm2eRowCommand::Refresh { pseudo_channel, .. } => Some((
            Target {
                rank: index_of(pseudo_channel),
                chip: 0,
                scope: BankScope::Rank,
                column: None,
            },
            BankAction::Refresh,
        )),
        _ => None,
    }
}

fn column_target(command: &Hbm2eColumnCommand) -> Option<(Target, BankAction)> {
    let (pseudo_channel, stack_id, bank_address, column_address, action) = match command {
        Hbm2eColumnCommand::Read {
            pseudo_channel,
            stack_id,
            bank_address,
            column_address,
            ..
        } => (
            pseudo_channel,
            stack_id,
            bank_address,
            column_address,
            BankAction::Read,
        ),
        Hbm2eColumnCommand::ReadAutoPrecharge {
            pseudo_channel,
            stack_id,
            bank_address,
            column_address,
            ..
        } => (
            pseudo_channel,
            stack_id,
            bank_address,
            column_address,
            BankAction::ReadAutoPrecharge,
        ),
        Hbm2eColumnCommand::Write {
            pseudo_channel,
            stack_id,
            bank_address,
            column_address,
            ..
        } => (
            pseudo_channel,
            stack_id,
            bank_address,
            column_address,
            BankAction::Write,
        ),
        Hbm2eColumnCommand::WriteAutoPrecharge {
            pseudo_channel,
            stack_id,
            bank_address,
            column_address,
            ..
        } => (
            pseudo_channel,
            stack_id,
            bank_address,
            column_address,
            BankAction::WriteAutoPrecharge,
        ),
        _ => return None,
    };
    Some((
        Target {
            rank: index_of(pseudo_channel),
            chip: index_of(stack_id),
            scope: BankScope::One(index_of(bank_address)),
            column: column_address.to_decimal(),
        },
        action,
    ))
}

pub struct Hbm2eBankAnnotator {
    grid: BankGrid,
}

impl Hbm2eBankAnnotator {
    pub fn new(config: AnnotatorConfig) -> Hbm2eBankAnnotator {
        Hbm2eBankAnnotator {
            grid: BankGrid::new(config),
        }
    }
}

impl Default for Hbm2eBankAnnotator {
    fn default() -> Self {
        Hbm2eBankAnnotator::new(AnnotatorConfig::hbm2e())
    }
}

impl Annotator<Hbm2eCommand> for Hbm2eBankAnnotator {
    fn observe(&mut self, packet: &Hbm2eCommand) {
        match target_of(packet) {
            Some((target, action)) => self.grid.update(&target, action),
            None => self.grid.update_idle(),
        }
    }

    fn render(&self) -> String {
        self.grid.line().to_string()
    }
}

pub struct Hbm2ePageAnnotator {
    grid: PageGrid,
}

impl Hbm2ePageAnnotator {
    pub fn new(config: AnnotatorConfig) -> Hbm2ePageAnnotator {
        Hbm2ePageAnnotator {
            grid: PageGrid::new(config),
        }
    }
}

impl Default for Hbm2ePageAnnotator {
    fn default() -> Self {
        Hbm2ePageAnnotator::new(AnnotatorConfig::hbm2e())
    }
}

impl Annotator<Hbm2eCommand> for Hbm2ePageAnnotator {
    fn observe(&mut self, packet: &Hbm2eCommand) {
        match target_of(packet) {
            Some((target, action)) => self.grid.update(&target, action),
            None => self.grid.update_idle(),
        }
    }

    fn render(&self) -> String {
        self.grid.line().to_string()
    }
}

pub struct Hbm2eDataAnnotator {
    words: usize,
    last_line: String,
}

impl Hbm2eDataAnnotator {
    pub fn new(config: AnnotatorConfig) -> Hbm2eDataAnnotator {
        Hbm2eDataAnnotator {
            words: config.data_words,
            last_line: format_data_words(None, config.data_words),
        }
    }
}

impl Default for Hbm2eDataAnnotator {
    fn default() -> Self {
        Hbm2eDataAnnotator::new(AnnotatorConfig::hbm2e())
    }
}

impl Annotator<Hbm2eCommand> for Hbm2eDataAnnotator {
    fn observe(&mut self, packet: &Hbm2eCommand) {
        let data = match packet {
            Hbm2eCommand::Column(column) => column.data(),
            Hbm2eCommand::Row(_) => None,
        };
        self.last_line = format_data_words(data, self.words);
    }

    fn render(&self) -> String {
        self.last_line.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::visible_text;

    #[test]
    fn row_and_column_commands_share_the_grid() {
        let mut annotator = Hbm2eBankAnnotator::default();
        annotator.observe(&Hbm2eCommand::Row(Hbm2eRowCommand::Activate {
            timestamp: 0,
            parity: BitString::from_token("b00", 2),
            pseudo_channel: BitString::from_token("0", 1),
            stack_id: BitString::from_token("b00", 2),
            bank_address: BitString::from_token("b0011", 4),
            row_address: BitString::from_token("b0", 15),
        }));
        let line = visible_text(&annotator.render());
        assert_eq!(line.chars().nth(3), Some('A'));

        annotator.observe(&Hbm2eCommand::Column(Hbm2eColumnCommand::Read {
            timestamp: 10,
            parity: BitString::from_token("0", 1),
            pseudo_channel: BitString::from_token("0", 1),
            stack_id: BitString::from_token("0", 1),
            bank_address: BitString::from_token("b0011", 4),
            column_address: BitString::from_token("b000001", 6),
            data: None,
        }));
        let line = visible_text(&annotator.render());
        assert_eq!(line.chars().nth(3), Some('R'));
    }
}
