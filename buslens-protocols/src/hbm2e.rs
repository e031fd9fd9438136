//! HBM2e command decoding.
//!
//! The row and column buses carry independent command streams, so the
//! decoder exposes two walkers. Commands are two UIs wide (word 0 on a CK_T
//! rising edge, word 1 on the following falling edge); Activate extends to
//! four. Column accesses address one pseudo-channel, which selects a 64-bit
//! half of the DQ bus and a strobe lane pair.

use buslens_waveform::{Bit, BitString, EdgeKind, EdgePolarity, SignalCursor, VcdFile};

use crate::apb::sample_or_none;
use crate::binding::Hbm2ePaths;
use crate::merge::Packet;
use crate::render::{self, color, LineStyle};

const RISING: EdgeKind = EdgeKind::Polarity(EdgePolarity::Rising);
const FALLING: EdgeKind = EdgeKind::Polarity(EdgePolarity::Falling);

#[derive(Debug, Clone)]
pub struct Hbm2eConfig {
    pub read_latency: usize,
    pub write_latency: usize,
    pub burst_length: usize,
    pub enable_data_bus_inversion: bool,
    pub capture_data: bool,
}

impl Default for Hbm2eConfig {
    fn default() -> Self {
        Hbm2eConfig {
            read_latency: 20,
            write_latency: 8,
            burst_length: 4,
            enable_data_bus_inversion: true,
            capture_data: true,
        }
    }
}

pub struct Hbm2eSignals {
    pub ck_t: Option<SignalCursor>,
    pub ck_c: Option<SignalCursor>,
    pub cke: Option<SignalCursor>,
    pub r: Option<SignalCursor>,
    pub c: Option<SignalCursor>,
    pub rdqs_t: Option<SignalCursor>,
    pub rdqs_c: Option<SignalCursor>,
    pub wdqs_t: Option<SignalCursor>,
    pub wdqs_c: Option<SignalCursor>,
    pub dq: Option<SignalCursor>,
    pub dbi: Option<SignalCursor>,
    pub dm: Option<SignalCursor>,
    pub par: Option<SignalCursor>,
    pub derr: Option<SignalCursor>,
    pub aerr: Option<SignalCursor>,
}

impl Hbm2eSignals {
    pub fn bind(file: &VcdFile, paths: &Hbm2ePaths) -> Hbm2eSignals {
        Hbm2eSignals {
            ck_t: file.get_signal(&paths.ck_t),
            ck_c: file.get_signal(&paths.ck_c),
            cke: file.get_signal(&paths.cke),
            r: file.get_signal(&paths.r),
            c: file.get_signal(&paths.c),
            rdqs_t: file.get_signal(&paths.rdqs_t),
            rdqs_c: file.get_signal(&paths.rdqs_c),
            wdqs_t: file.get_signal(&paths.wdqs_t),
            wdqs_c: file.get_signal(&paths.wdqs_c),
            dq: file.get_signal(&paths.dq),
            dbi: file.get_signal(&paths.dbi),
            dm: file.get_signal(&paths.dm),
            par: file.get_signal(&paths.par),
            derr: file.get_signal(&paths.derr),
            aerr: file.get_signal(&paths.aerr),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Hbm2eRowCommand {
    Error {
        timestamp: u64,
    },
    Activate {
        timestamp: u64,
        parity: BitString,
        pseudo_channel: BitString,
        stack_id: BitString,
        bank_address: BitString,
        row_address: BitString,
    },
    Precharge {
        timestamp: u64,
        parity: BitString,
        pseudo_channel: BitString,
        stack_id: BitString,
        bank_address: BitString,
    },
    PrechargeAll {
        timestamp: u64,
        parity: BitString,
        pseudo_channel: BitString,
    },
    SingleBankRefresh {
        timestamp: u64,
        parity: BitString,
        pseudo_channel: BitString,
        stack_id: BitString,
        bank_address: BitString,
    },
    Refresh {
        timestamp: u64,
        parity: BitString,
        pseudo_channel: BitString,
    },
    PowerDownEntry {
        timestamp: u64,
        parity: BitString,
    },
    SelfRefreshEntry {
        timestamp: u64,
        parity: BitString,
    },
    PowerDownSelfRefreshExit {
        timestamp: u64,
    },
}

#[derive(Debug, Clone)]
pub enum Hbm2eColumnCommand {
    Error {
        timestamp: u64,
    },
    Read {
        timestamp: u64,
        parity: BitString,
        pseudo_channel: BitString,
        stack_id: BitString,
        bank_address: BitString,
        column_address: BitString,
        data: Option<BitString>,
    },
    ReadAutoPrecharge {
        timestamp: u64,
        parity: BitString,
        pseudo_channel: BitString,
        stack_id: BitString,
        bank_address: BitString,
        column_address: BitString,
        data: Option<BitString>,
    },
    Write {
        timestamp: u64,
        parity: BitString,
        pseudo_channel: BitString,
        stack_id: BitString,
        bank_address: BitString,
        column_address: BitString,
        data: Option<BitString>,
    },
    WriteAutoPrecharge {
        timestamp: u64,
        parity: BitString,
        pseudo_channel: BitString,
        stack_id: BitString,
        bank_address: BitString,
        column_address: BitString,
        data: Option<BitString>,
    },
    ModeRegisterSet {
        timestamp: u64,
        parity: BitString,
        mode_register: BitString,
        operation: BitString,
    },
}

/// A row or column command, for merged single-stream consumers.
#[derive(Debug, Clone)]
pub enum Hbm2eCommand {
    Row(Hbm2eRowCommand),
    Column(Hbm2eColumnCommand),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowFunction {
    Activate,
    Precharge,
    PrechargeAll,
    SingleBankRefresh,
    Refresh,
    PowerDownEntry,
    SelfRefreshEntry,
    Error,
}

fn row_mask(pattern: &str) -> BitString {
    BitString::from_token(pattern, 7)
}

/// Row bus truth table. A fully driven idle pattern never reaches the
/// walker, so the CKE-qualified rows only fire on X-laden encodings.
fn decode_row_function(w0: &BitString, w1: &BitString, cke: &BitString) -> RowFunction {
    if w0.equal_masked(&row_mask("bxxxxx10")) {
        RowFunction::Activate
    } else if w0.equal_masked(&row_mask("bxxxx011")) && w1.equal_masked(&row_mask("bxx0xxxx")) {
        RowFunction::Precharge
    } else if w0.equal_masked(&row_mask("bxxxx011")) && w1.equal_masked(&row_mask("bxx1xxxx")) {
        RowFunction::PrechargeAll
    } else if w0.equal_masked(&row_mask("bxxxx100")) && w1.equal_masked(&row_mask("bxx0xxxx")) {
        RowFunction::SingleBankRefresh
    } else if w0.equal_masked(&row_mask("bxxxx100")) && w1.equal_masked(&row_mask("bxx1xxxx")) {
        RowFunction::Refresh
    } else if w0.equal_masked(&row_mask("bxxxx111")) && cke.is_zero() {
        RowFunction::PowerDownEntry
    } else if w0.equal_masked(&row_mask("bxxxx100")) && cke.is_zero() {
        RowFunction::SelfRefreshEntry
    } else {
        RowFunction::Error
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnFunction {
    Read,
    ReadAutoPrecharge,
    Write,
    WriteAutoPrecharge,
    ModeRegisterSet,
    Error,
}

fn column_mask(pattern: &str) -> BitString {
    BitString::from_token(pattern, 9)
}

fn decode_column_function(w0: &BitString) -> ColumnFunction {
    if w0.equal_masked(&column_mask("bxxxxx0101")) {
        ColumnFunction::Read
    } else if w0.equal_masked(&column_mask("bxxxxx1101")) {
        ColumnFunction::ReadAutoPrecharge
    } else if w0.equal_masked(&column_mask("bxxxxx0001")) {
        ColumnFunction::Write
    } else if w0.equal_masked(&column_mask("bxxxxx1001")) {
        ColumnFunction::WriteAutoPrecharge
    } else if w0.equal_masked(&column_mask("bxxxxxx000")) {
        ColumnFunction::ModeRegisterSet
    } else {
        ColumnFunction::Error
    }
}

pub struct Hbm2eDecoder {
    signals: Hbm2eSignals,
    config: Hbm2eConfig,
}

impl Hbm2eDecoder {
    pub fn new(signals: Hbm2eSignals, config: Hbm2eConfig) -> Hbm2eDecoder {
        Hbm2eDecoder { signals, config }
    }

    pub fn bind(file: &VcdFile, paths: &Hbm2ePaths, config: Hbm2eConfig) -> Hbm2eDecoder {
        Hbm2eDecoder::new(Hbm2eSignals::bind(file, paths), config)
    }

    /// Decodes the next command on the row bus.
    pub fn next_row_command(&mut self) -> Option<Hbm2eRowCommand> {
        let signals = &mut self.signals;
        let r = signals.r.as_mut()?;
        let ck_t = signals.ck_t.as_mut()?;

        let idle = row_mask("bxxxx111");
        let row_sample = r.next_edge(&EdgeKind::NotMatches(idle), true)?;

        let w0_edge = ck_t.edge_at(row_sample.timestamp, EdgePolarity::Rising, true)?;
        let timestamp = w0_edge.timestamp;
        let w0 = r
            .value_at(timestamp, false)
            .map(|sample| sample.value)
            .unwrap_or_else(BitString::none);
        let cke = sample_or_none(&mut signals.cke, timestamp);

        let w1_edge = ck_t.next_edge(&FALLING, true)?;
        let w1 = r
            .value_at(w1_edge.timestamp, false)
            .map(|sample| sample.value)
            .unwrap_or_else(BitString::none);

        let function = decode_row_function(&w0, &w1, &cke);
        if function == RowFunction::Error {
            log::warn!("unknown HBM2e row command word {w0} at {timestamp}");
        }

        let command = match function {
            RowFunction::Activate => {
                // Two more UIs.
                let w2_edge = ck_t.next_edge(&RISING, true)?;
                let w2 = r
                    .value_at(w2_edge.timestamp, false)
                    .map(|sample| sample.value)
                    .unwrap_or_else(BitString::none);
                let w3_edge = ck_t.next_edge(&FALLING, true)?;
                let w3 = r
                    .value_at(w3_edge.timestamp, false)
                    .map(|sample| sample.value)
                    .unwrap_or_else(BitString::none);
                Hbm2eRowCommand::Activate {
                    timestamp,
                    parity: w3.bit_value(2).concat(&w1.bit_value(2)),
                    pseudo_channel: w1.bit_value(3),
                    stack_id: w1.bit_value(6).concat(&w0.bit_value(2)),
                    bank_address: w1.bit_value(5).concat(&w0.slice(3, 6)),
                    row_address: w0
                        .bit_value(6)
                        .concat(&w1.bit_value(4))
                        .concat(&w1.slice(0, 2))
                        .concat(&w2.slice(0, 6))
                        .concat(&w3.slice(3, 6))
                        .concat(&w3.slice(0, 2)),
                }
            }
            RowFunction::Precharge => Hbm2eRowCommand::Precharge {
                timestamp,
                parity: w1.bit_value(2),
                pseudo_channel: w1.bit_value(3),
                stack_id: w0.bit_value(6).concat(&w1.bit_value(1)),
                bank_address: w1.bit_value(5).concat(&w0.slice(3, 6)),
            },
            RowFunction::PrechargeAll => Hbm2eRowCommand::PrechargeAll {
                timestamp,
                parity: w1.bit_value(2),
                pseudo_channel: w1.bit_value(3),
            },
            RowFunction::SingleBankRefresh => Hbm2eRowCommand::SingleBankRefresh {
                timestamp,
                parity: w1.bit_value(2),
                pseudo_channel: w1.bit_value(3),
                stack_id: w0.bit_value(6).concat(&w1.bit_value(1)),
                bank_address: w1.bit_value(5).concat(&w0.slice(3, 6)),
            },
            RowFunction::Refresh => Hbm2eRowCommand::Refresh {
                timestamp,
                parity: w1.bit_value(2),
                pseudo_channel: w1.bit_value(3),
            },
            RowFunction::PowerDownEntry => Hbm2eRowCommand::PowerDownEntry {
                timestamp,
                parity: w1.bit_value(2),
            },
            RowFunction::SelfRefreshEntry => Hbm2eRowCommand::SelfRefreshEntry {
                timestamp,
                parity: w1.bit_value(2),
            },
            RowFunction::Error => Hbm2eRowCommand::Error { timestamp },
        };
        Some(command)
    }

    /// Decodes the next command on the column bus.
    pub fn next_column_command(&mut self) -> Option<Hbm2eColumnCommand> {
        let (timestamp, w0, w1) = {
            let signals = &mut self.signals;
            let c = signals.c.as_mut()?;
            let ck_t = signals.ck_t.as_mut()?;

            let idle = column_mask("bxxxxxx111");
            let column_sample = c.next_edge(&EdgeKind::NotMatches(idle), true)?;

            let w0_edge = ck_t.edge_at(column_sample.timestamp, EdgePolarity::Rising, true)?;
            let timestamp = w0_edge.timestamp;
            let w0 = c
                .value_at(timestamp, false)
                .map(|sample| sample.value)
                .unwrap_or_else(BitString::none);
            let w1_edge = ck_t.next_edge(&FALLING, true)?;
            let w1 = c
                .value_at(w1_edge.timestamp, false)
                .map(|sample| sample.value)
                .unwrap_or_else(BitString::none);
            (timestamp, w0, w1)
        };

        let function = decode_column_function(&w0);
        if function == ColumnFunction::Error {
            log::warn!("unknown HBM2e column command word {w0} at {timestamp}");
        }

        let parity = w1.bit_value(8);
        let pseudo_channel = w0.bit_value(4);
        let stack_id = w0.bit_value(8);
        let bank_address = w1.bit_value(7).concat(&w0.slice(5, 8));
        let column_address = w1.slice(0, 6);

        let mut command = match function {
            ColumnFunction::Read => Hbm2eColumnCommand::Read {
                timestamp,
                parity,
                pseudo_channel,
                stack_id,
                bank_address,
                column_address,
                data: None,
            },
            ColumnFunction::ReadAutoPrecharge => Hbm2eColumnCommand::ReadAutoPrecharge {
                timestamp,
                parity,
                pseudo_channel,
                stack_id,
                bank_address,
                column_address,
                data: None,
            },
            ColumnFunction::Write => Hbm2eColumnCommand::Write {
                timestamp,
                parity,
                pseudo_channel,
                stack_id,
                bank_address,
                column_address,
                data: None,
            },
            ColumnFunction::WriteAutoPrecharge => Hbm2eColumnCommand::WriteAutoPrecharge {
                timestamp,
                parity,
                pseudo_channel,
                stack_id,
                bank_address,
                column_address,
                data: None,
            },
            ColumnFunction::ModeRegisterSet => Hbm2eColumnCommand::ModeRegisterSet {
                timestamp,
                parity,
                mode_register: w0.slice(5, 9),
                operation: w1.slice(0, 8),
            },
            ColumnFunction::Error => Hbm2eColumnCommand::Error { timestamp },
        };

        if self.config.capture_data {
            let pseudo_channel_index = match &command {
                Hbm2eColumnCommand::Read { pseudo_channel, .. }
                | Hbm2eColumnCommand::ReadAutoPrecharge { pseudo_channel, .. }
                | Hbm2eColumnCommand::Write { pseudo_channel, .. }
                | Hbm2eColumnCommand::WriteAutoPrecharge { pseudo_channel, .. } => {
                    pseudo_channel.to_decimal().unwrap_or(0) as usize
                }
                _ => 0,
            };
            match &mut command {
                Hbm2eColumnCommand::Read { data, .. }
                | Hbm2eColumnCommand::ReadAutoPrecharge { data, .. } => {
                    *data = Some(self.capture_burst(timestamp, pseudo_channel_index, false)?);
                }
                Hbm2eColumnCommand::Write { data, .. }
                | Hbm2eColumnCommand::WriteAutoPrecharge { data, .. } => {
                    *data = Some(self.capture_burst(timestamp, pseudo_channel_index, true)?);
                }
                _ => {}
            }
        }

        Some(command)
    }

    /// Gathers one pseudo-channel burst. Beats alternate between the true
    /// and complement strobe lanes of the addressed pseudo-channel; each
    /// beat reads the matching 64-bit DQ half, undoes data-bus inversion
    /// per byte, swaps the two 32-bit halves, and lands MSB-first in the
    /// result.
    fn capture_burst(
        &mut self,
        anchor: u64,
        pseudo_channel: usize,
        write: bool,
    ) -> Option<BitString> {
        let signals = &mut self.signals;
        let ck_c = signals.ck_c.as_mut()?;
        let latency = if write {
            self.config.write_latency
        } else {
            self.config.read_latency
        };

        ck_c.value_at(anchor, true)?;
        let mut latch_timestamp = anchor;
        for _ in 0..latency.saturating_sub(1) {
            latch_timestamp = ck_c.next_edge(&RISING, true)?.timestamp;
        }

        let (strobe_t, strobe_c) = if write {
            (signals.wdqs_t.as_mut()?, signals.wdqs_c.as_mut()?)
        } else {
            (signals.rdqs_t.as_mut()?, signals.rdqs_c.as_mut()?)
        };
        strobe_t.value_at(latch_timestamp, true);
        strobe_c.value_at(latch_timestamp, true);
        let dq = signals.dq.as_mut()?;

        let strobe_pattern = if pseudo_channel == 0 {
            BitString::from_token("bxx11", 4)
        } else {
            BitString::from_token("b11xx", 4)
        };
        let (dq_lo, dq_hi) = if pseudo_channel == 0 { (0, 64) } else { (64, 128) };

        let mut data = BitString::none();
        for beat in 0..self.config.burst_length {
            let strobe_sample = if beat % 2 == 0 {
                strobe_t.next_edge(&EdgeKind::Matches(strobe_pattern.clone()), true)?
            } else {
                strobe_c.next_edge(&EdgeKind::Matches(strobe_pattern.clone()), true)?
            };
            let full = dq
                .value_at(strobe_sample.timestamp, true)
                .map(|sample| sample.value)
                .unwrap_or_else(BitString::none);
            let mut half = full.slice(dq_lo, dq_hi);
            if self.config.enable_data_bus_inversion {
                let inversion = sample_or_none(&mut signals.dbi, strobe_sample.timestamp)
                    .slice(pseudo_channel * 8, pseudo_channel * 8 + 8);
                half = undo_data_bus_inversion(&half, &inversion);
            }
            // Bus-specific byte ordering: the two 32-bit halves of every
            // beat swap before concatenation.
            let swapped = half.slice(0, 32).concat(&half.slice(32, 64));
            data = data.concat(&swapped);
        }
        Some(data)
    }

    pub fn row_commands(&mut self) -> impl Iterator<Item = Hbm2eRowCommand> + '_ {
        std::iter::from_fn(move || self.next_row_command())
    }

    pub fn column_commands(&mut self) -> impl Iterator<Item = Hbm2eColumnCommand> + '_ {
        std::iter::from_fn(move || self.next_column_command())
    }

    pub fn config(&self) -> &Hbm2eConfig {
        &self.config
    }
}

/// Complements every byte whose inversion bit is set.
fn undo_data_bus_inversion(half: &BitString, inversion: &BitString) -> BitString {
    if inversion.is_none() {
        return half.clone();
    }
    let mut out = BitString::none();
    for byte_index in 0..half.width().div_ceil(8) {
        let byte = half.slice(byte_index * 8, byte_index * 8 + 8);
        let byte = if inversion.bit(byte_index) == Bit::One {
            byte.complement()
        } else {
            byte
        };
        out = byte.concat(&out);
    }
    out
}

impl Hbm2eRowCommand {
    pub fn timestamp(&self) -> u64 {
        match self {
            Hbm2eRowCommand::Error { timestamp }
            | Hbm2eRowCommand::Activate { timestamp, .. }
            | Hbm2eRowCommand::Precharge { timestamp, .. }
            | Hbm2eRowCommand::PrechargeAll { timestamp, .. }
            | Hbm2eRowCommand::SingleBankRefresh { timestamp, .. }
            | Hbm2eRowCommand::Refresh { timestamp, .. }
            | Hbm2eRowCommand::PowerDownEntry { timestamp, .. }
            | Hbm2eRowCommand::SelfRefreshEntry { timestamp, .. }
            | Hbm2eRowCommand::PowerDownSelfRefreshExit { timestamp } => *timestamp,
        }
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Hbm2eRowCommand::Error { .. } => "ERROR",
            Hbm2eRowCommand::Activate { .. } => "ACT",
            Hbm2eRowCommand::Precharge { .. } => "PRE",
            Hbm2eRowCommand::PrechargeAll { .. } => "PREA",
            Hbm2eRowCommand::SingleBankRefresh { .. } => "REFSB",
            Hbm2eRowCommand::Refresh { .. } => "REF",
            Hbm2eRowCommand::PowerDownEntry { .. } => "PDE",
            Hbm2eRowCommand::SelfRefreshEntry { .. } => "SRE",
            Hbm2eRowCommand::PowerDownSelfRefreshExit { .. } => "PDX/SRX",
        }
    }

    fn pseudo_channel(&self) -> Option<&BitString> {
        match self {
            Hbm2eRowCommand::Activate { pseudo_channel, .. }
            | Hbm2eRowCommand::Precharge { pseudo_channel, .. }
            | Hbm2eRowCommand::PrechargeAll { pseudo_channel, .. }
            | Hbm2eRowCommand::SingleBankRefresh { pseudo_channel, .. }
            | Hbm2eRowCommand::Refresh { pseudo_channel, .. } => Some(pseudo_channel),
            _ => None,
        }
    }

    fn bus_color(&self) -> &'static str {
        match self {
            Hbm2eRowCommand::Error { .. } => render::ERROR_COLOR,
            Hbm2eRowCommand::Activate { .. } => color::BG_RED,
            Hbm2eRowCommand::Precharge { .. } | Hbm2eRowCommand::PrechargeAll { .. } => {
                color::BG_GREEN
            }
            Hbm2eRowCommand::SingleBankRefresh { .. } | Hbm2eRowCommand::Refresh { .. } => {
                color::BG_BLUE
            }
            Hbm2eRowCommand::PowerDownEntry { .. }
            | Hbm2eRowCommand::SelfRefreshEntry { .. }
            | Hbm2eRowCommand::PowerDownSelfRefreshExit { .. } => render::POWER_COLOR,
        }
    }

    fn parameters(&self) -> Vec<(&'static str, String)> {
        let mut parameters: Vec<(&'static str, String)> = Vec::new();
        match self {
            Hbm2eRowCommand::Activate {
                stack_id,
                bank_address,
                row_address,
                ..
            } => {
                parameters.push(("SID", render::dec_or_x(stack_id)));
                parameters.push(("BA", render::dec_or_x(bank_address)));
                parameters.push(("RA", render::dec_or_x(row_address)));
            }
            Hbm2eRowCommand::Precharge {
                stack_id,
                bank_address,
                ..
            }
            | Hbm2eRowCommand::SingleBankRefresh {
                stack_id,
                bank_address,
                ..
            } => {
                parameters.push(("SID", render::dec_or_x(stack_id)));
                parameters.push(("BA", render::dec_or_x(bank_address)));
            }
            _ => {}
        }
        parameters
    }
}

impl Hbm2eColumnCommand {
    pub fn timestamp(&self) -> u64 {
        match self {
            Hbm2eColumnCommand::Error { timestamp }
            | Hbm2eColumnCommand::Read { timestamp, .. }
            | Hbm2eColumnCommand::ReadAutoPrecharge { timestamp, .. }
            | Hbm2eColumnCommand::Write { timestamp, .. }
            | Hbm2eColumnCommand::WriteAutoPrecharge { timestamp, .. }
            | Hbm2eColumnCommand::ModeRegisterSet { timestamp, .. } => *timestamp,
        }
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Hbm2eColumnCommand::Error { .. } => "ERROR",
            Hbm2eColumnCommand::Read { .. } => "RD",
            Hbm2eColumnCommand::ReadAutoPrecharge { .. } => "RDA",
            Hbm2eColumnCommand::Write { .. } => "WR",
            Hbm2eColumnCommand::WriteAutoPrecharge { .. } => "WRA",
            Hbm2eColumnCommand::ModeRegisterSet { .. } => "MRS",
        }
    }

    fn pseudo_channel(&self) -> Option<&BitString> {
        match self {
            Hbm2eColumnCommand::Read { pseudo_channel, .. }
            | Hbm2eColumnCommand::ReadAutoPrecharge { pseudo_channel, .. }
            | Hbm2eColumnCommand::Write { pseudo_channel, .. }
            | Hbm2eColumnCommand::WriteAutoPrecharge { pseudo_channel, .. } => {
                Some(pseudo_channel)
            }
            _ => None,
        }
    }

    /// The captured burst, for the commands that carry one.
    pub fn data(&self) -> Option<&BitString> {
        match self {
            Hbm2eColumnCommand::Read { data, .. }
            | Hbm2eColumnCommand::ReadAutoPrecharge { data, .. }
            | Hbm2eColumnCommand::Write { data, .. }
            | Hbm2eColumnCommand::WriteAutoPrecharge { data, .. } => data.as_ref(),
            _ => None,
        }
    }

    fn bus_color(&self) -> &'static str {
        match self {
            Hbm2eColumnCommand::Error { .. } => render::ERROR_COLOR,
            Hbm2eColumnCommand::Read { .. } | Hbm2eColumnCommand::ReadAutoPrecharge { .. } => {
                color::BG_YELLOW
            }
            Hbm2eColumnCommand::Write { .. } | Hbm2eColumnCommand::WriteAutoPrecharge { .. } => {
                color::BG_CYAN
            }
            Hbm2eColumnCommand::ModeRegisterSet { .. } => color::BG_MAGENTA,
        }
    }

    fn parameters(&self) -> Vec<(&'static str, String)> {
        let mut parameters: Vec<(&'static str, String)> = Vec::new();
        match self {
            Hbm2eColumnCommand::Read {
                stack_id,
                bank_address,
                column_address,
                ..
            }
            | Hbm2eColumnCommand::ReadAutoPrecharge {
                stack_id,
                bank_address,
                column_address,
                ..
            }
            | Hbm2eColumnCommand::Write {
                stack_id,
                bank_address,
                column_address,
                ..
            }
            | Hbm2eColumnCommand::WriteAutoPrecharge {
                stack_id,
                bank_address,
                column_address,
                ..
            } => {
                parameters.push(("SID", render::dec_or_x(stack_id)));
                parameters.push(("BA", render::dec_or_x(bank_address)));
                parameters.push(("C", render::dec_or_x(column_address)));
            }
            Hbm2eColumnCommand::ModeRegisterSet {
                mode_register,
                operation,
                ..
            } => {
                parameters.push(("MR", render::dec_or_x(mode_register)));
                parameters.push(("OP", render::dec_or_x(operation)));
            }
            Hbm2eColumnCommand::Error { .. } => {}
        }
        parameters
    }
}

impl Hbm2eCommand {
    pub fn timestamp(&self) -> u64 {
        match self {
            Hbm2eCommand::Row(row) => row.timestamp(),
            Hbm2eCommand::Column(column) => column.timestamp(),
        }
    }
}

impl Packet for Hbm2eCommand {
    fn timestamp(&self) -> u64 {
        Hbm2eCommand::timestamp(self)
    }

    fn render_line(&self, style: &LineStyle) -> String {
        let (mnemonic, bus_color, parameters, pseudo_channel) = match self {
            Hbm2eCommand::Row(row) => (
                row.mnemonic(),
                row.bus_color(),
                row.parameters(),
                row.pseudo_channel(),
            ),
            Hbm2eCommand::Column(column) => (
                column.mnemonic(),
                column.bus_color(),
                column.parameters(),
                column.pseudo_channel(),
            ),
        };
        let context = pseudo_channel.map(|value| format!("PC{}", render::dec_or_x(value)));
        render::packet_line(
            style,
            Hbm2eCommand::timestamp(self),
            context.as_deref(),
            mnemonic,
            &parameters,
            bus_color,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_truth_table() {
        let cke_high = BitString::from_token("1", 1);
        let cke_low = BitString::from_token("0", 1);
        let w = |token: &str| BitString::from_token(token, 7);
        assert_eq!(
            decode_row_function(&w("b0000010"), &w("b0000000"), &cke_high),
            RowFunction::Activate
        );
        assert_eq!(
            decode_row_function(&w("b0000011"), &w("b0000000"), &cke_high),
            RowFunction::Precharge
        );
        assert_eq!(
            decode_row_function(&w("b0000011"), &w("b0010000"), &cke_high),
            RowFunction::PrechargeAll
        );
        assert_eq!(
            decode_row_function(&w("b0000100"), &w("b0000000"), &cke_high),
            RowFunction::SingleBankRefresh
        );
        assert_eq!(
            decode_row_function(&w("b0000100"), &w("b0010000"), &cke_high),
            RowFunction::Refresh
        );
        assert_eq!(
            decode_row_function(&w("b0000111"), &w("b0000000"), &cke_low),
            RowFunction::PowerDownEntry
        );
        assert_eq!(
            decode_row_function(&w("b0000001"), &w("b0000000"), &cke_high),
            RowFunction::Error
        );
    }

    #[test]
    fn column_truth_table() {
        let w = |token: &str| BitString::from_token(token, 9);
        assert_eq!(decode_column_function(&w("b000000101")), ColumnFunction::Read);
        assert_eq!(
            decode_column_function(&w("b000001101")),
            ColumnFunction::ReadAutoPrecharge
        );
        assert_eq!(decode_column_function(&w("b000000001")), ColumnFunction::Write);
        assert_eq!(
            decode_column_function(&w("b000001001")),
            ColumnFunction::WriteAutoPrecharge
        );
        assert_eq!(
            decode_column_function(&w("b000000000")),
            ColumnFunction::ModeRegisterSet
        );
        assert_eq!(decode_column_function(&w("b000000111")), ColumnFunction::Error);
    }

    #[test]
    fn data_bus_inversion_flips_flagged_bytes() {
        let half = BitString::from_token("b1111111100000000", 16);
        let inversion = BitString::from_token("b01", 2);
        let restored = undo_data_bus_inversion(&half, &inversion);
        assert_eq!(restored.to_hex(), "FFFF");
        let untouched = undo_data_bus_inversion(&half, &BitString::from_token("b00", 2));
        assert_eq!(untouched.to_hex(), "FF00");
        let none = undo_data_bus_inversion(&half, &BitString::none());
        assert_eq!(none.to_hex(), "FF00");
    }
}
