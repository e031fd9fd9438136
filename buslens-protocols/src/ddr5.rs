//! DDR5 command decoding.
//!
//! A command starts when CS_N leaves its all-ones idle pattern. The decoder
//! reads four CA words on consecutive CK_T rising edges, dispatches on the
//! JEDEC truth table, and extracts the operand fields by concatenating bit
//! slices of the command words. Read and write commands additionally gather
//! their data burst from the DQ bus under the data strobes, a configurable
//! latency after the column command.

use buslens_waveform::{Bit, BitString, EdgeKind, EdgePolarity, SignalCursor, VcdFile};

use crate::apb::sample_or_none;
use crate::binding::Ddr5Paths;
use crate::merge::Packet;
use crate::render::{self, color, LineStyle};

const RISING: EdgeKind = EdgeKind::Polarity(EdgePolarity::Rising);

/// Decode-time knobs. The latencies are in CK_C edges between the column
/// command and the first data beat; the defaults are the DDR5-5200 values.
#[derive(Debug, Clone)]
pub struct Ddr5Config {
    pub read_latency: usize,
    pub write_latency: usize,
    pub burst_length: usize,
    /// Gather data bursts for read/write commands.
    pub capture_data: bool,
}

impl Default for Ddr5Config {
    fn default() -> Self {
        Ddr5Config {
            read_latency: 46,
            write_latency: 38,
            burst_length: 16,
            capture_data: true,
        }
    }
}

pub struct Ddr5Signals {
    pub ck_t: Option<SignalCursor>,
    pub ck_c: Option<SignalCursor>,
    pub cs_n: Option<SignalCursor>,
    pub ca: Option<SignalCursor>,
    pub dqs_t: Option<SignalCursor>,
    pub dqs_c: Option<SignalCursor>,
    pub wdqs_t: Option<SignalCursor>,
    pub wdqs_c: Option<SignalCursor>,
    pub dq: Option<SignalCursor>,
    pub cb: Option<SignalCursor>,
}

impl Ddr5Signals {
    pub fn bind(file: &VcdFile, paths: &Ddr5Paths) -> Ddr5Signals {
        Ddr5Signals {
            ck_t: file.get_signal(&paths.ck_t),
            ck_c: file.get_signal(&paths.ck_c),
            cs_n: file.get_signal(&paths.cs_n),
            ca: file.get_signal(&paths.ca),
            dqs_t: file.get_signal(&paths.dqs_t),
            dqs_c: file.get_signal(&paths.dqs_c),
            wdqs_t: file.get_signal(&paths.wdqs_t),
            wdqs_c: file.get_signal(&paths.wdqs_c),
            dq: file.get_signal(&paths.dq),
            cb: file.get_signal(&paths.cb),
        }
    }
}

/// One decoded DDR5 command. The timestamp is the second-word clock edge
/// for the two-UI commands and the first-word edge for the single-UI ones;
/// `chip_select` is the decoded one-hot-low rank index.
#[derive(Debug, Clone)]
pub enum Ddr5Command {
    Error {
        timestamp: u64,
        chip_select: BitString,
    },
    Activate {
        timestamp: u64,
        chip_select: BitString,
        chip_id: BitString,
        bank_group_address: BitString,
        bank_address: BitString,
        row_address: BitString,
    },
    WritePattern {
        timestamp: u64,
        chip_select: BitString,
        chip_id: BitString,
        bank_group_address: BitString,
        bank_address: BitString,
        column_address: BitString,
    },
    WritePatternAutoPrecharge {
        timestamp: u64,
        chip_select: BitString,
        chip_id: BitString,
        bank_group_address: BitString,
        bank_address: BitString,
        column_address: BitString,
    },
    ModeRegisterWrite {
        timestamp: u64,
        chip_select: BitString,
        mode_register: BitString,
        operation: BitString,
        control_word: BitString,
    },
    ModeRegisterRead {
        timestamp: u64,
        chip_select: BitString,
        mode_register: BitString,
        control_word: BitString,
    },
    Write {
        timestamp: u64,
        chip_select: BitString,
        chip_id: BitString,
        bank_group_address: BitString,
        bank_address: BitString,
        column_address: BitString,
        burst_length: BitString,
        partial_write: BitString,
        data: Option<BitString>,
    },
    WriteAutoPrecharge {
        timestamp: u64,
        chip_select: BitString,
        chip_id: BitString,
        bank_group_address: BitString,
        bank_address: BitString,
        column_address: BitString,
        burst_length: BitString,
        partial_write: BitString,
        data: Option<BitString>,
    },
    Read {
        timestamp: u64,
        chip_select: BitString,
        chip_id: BitString,
        bank_group_address: BitString,
        bank_address: BitString,
        column_address: BitString,
        burst_length: BitString,
        data: Option<BitString>,
    },
    ReadAutoPrecharge {
        timestamp: u64,
        chip_select: BitString,
        chip_id: BitString,
        bank_group_address: BitString,
        bank_address: BitString,
        column_address: BitString,
        burst_length: BitString,
        data: Option<BitString>,
    },
    VrefCa {
        timestamp: u64,
        chip_select: BitString,
        operation: BitString,
    },
    VrefCs {
        timestamp: u64,
        chip_select: BitString,
        operation: BitString,
    },
    RefreshAll {
        timestamp: u64,
        chip_select: BitString,
        chip_id: BitString,
        refresh_interval_rate: BitString,
    },
    RefreshManagementAll {
        timestamp: u64,
        chip_select: BitString,
        chip_id: BitString,
    },
    RefreshSameBank {
        timestamp: u64,
        chip_select: BitString,
        chip_id: BitString,
        bank_address: BitString,
        refresh_interval_rate: BitString,
    },
    RefreshManagementSameBank {
        timestamp: u64,
        chip_select: BitString,
        chip_id: BitString,
        bank_address: BitString,
    },
    PrechargeAll {
        timestamp: u64,
        chip_select: BitString,
        chip_id: BitString,
    },
    PrechargeSameBank {
        timestamp: u64,
        chip_select: BitString,
        chip_id: BitString,
        bank_address: BitString,
    },
    Precharge {
        timestamp: u64,
        chip_select: BitString,
        chip_id: BitString,
        bank_group_address: BitString,
        bank_address: BitString,
    },
    SelfRefreshEntry {
        timestamp: u64,
        chip_select: BitString,
    },
    SelfRefreshEntryFrequencyChange {
        timestamp: u64,
        chip_select: BitString,
    },
    PowerDownEntry {
        timestamp: u64,
        chip_select: BitString,
        on_die_termination: BitString,
    },
    MultiPurposeCommand {
        timestamp: u64,
        chip_select: BitString,
        operation: BitString,
    },
}

/// The command classes of the CA truth table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ddr5Function {
    Activate,
    WritePattern,
    WritePatternAutoPrecharge,
    ModeRegisterWrite,
    ModeRegisterRead,
    Write,
    WriteAutoPrecharge,
    Read,
    ReadAutoPrecharge,
    VrefCa,
    VrefCs,
    RefreshAll,
    RefreshManagementAll,
    RefreshSameBank,
    RefreshManagementSameBank,
    PrechargeAll,
    PrechargeSameBank,
    Precharge,
    SelfRefreshEntry,
    SelfRefreshEntryFrequencyChange,
    PowerDownEntry,
    MultiPurposeCommand,
    Error,
}

fn mask(pattern: &str) -> BitString {
    BitString::from_token(pattern, 7)
}

/// Dispatch on command word 0, refined by words 1 and 3 where the encoding
/// needs them. Only the decoding bits of the truth table are matched; the
/// rest stay wildcards.
fn decode_function(words: &[BitString; 4]) -> Ddr5Function {
    let w0 = &words[0];
    let w1 = &words[1];
    let w3 = &words[3];
    if w0.equal_masked(&mask("bxxxxx00")) {
        Ddr5Function::Activate
    } else if w0.equal_masked(&mask("bxx01001")) && w3.equal_masked(&mask("bxxx1xxx")) {
        Ddr5Function::WritePattern
    } else if w0.equal_masked(&mask("bxx01001")) && w3.equal_masked(&mask("bxxx0xxx")) {
        Ddr5Function::WritePatternAutoPrecharge
    } else if w0.equal_masked(&mask("bxx00101")) {
        Ddr5Function::ModeRegisterWrite
    } else if w0.equal_masked(&mask("bxx10101")) {
        Ddr5Function::ModeRegisterRead
    } else if w0.equal_masked(&mask("bxx01101")) && w3.equal_masked(&mask("bxxx1xxx")) {
        Ddr5Function::Write
    } else if w0.equal_masked(&mask("bxx01101")) && w3.equal_masked(&mask("bxxx0xxx")) {
        Ddr5Function::WriteAutoPrecharge
    } else if w0.equal_masked(&mask("bxx11101")) && w3.equal_masked(&mask("bxxx1xxx")) {
        Ddr5Function::Read
    } else if w0.equal_masked(&mask("bxx11101")) && w3.equal_masked(&mask("bxxx0xxx")) {
        Ddr5Function::ReadAutoPrecharge
    } else if w0.equal_masked(&mask("bxx00011")) && w1.equal_masked(&mask("bx0xxxxx")) {
        Ddr5Function::VrefCa
    } else if w0.equal_masked(&mask("bxx00011")) && w1.equal_masked(&mask("bx1xxxxx")) {
        Ddr5Function::VrefCs
    } else if w0.equal_masked(&mask("bxx10011")) && w1.equal_masked(&mask("bxxx01xx")) {
        Ddr5Function::RefreshAll
    } else if w0.equal_masked(&mask("bxx10011")) && w1.equal_masked(&mask("bxxx00xx")) {
        Ddr5Function::RefreshManagementAll
    } else if w0.equal_masked(&mask("bxx10011")) && w1.equal_masked(&mask("bxxx11xx")) {
        Ddr5Function::RefreshSameBank
    } else if w0.equal_masked(&mask("bxx10011")) && w1.equal_masked(&mask("bxxx10xx")) {
        Ddr5Function::RefreshManagementSameBank
    } else if w0.equal_masked(&mask("bxx01011")) && w1.equal_masked(&mask("bxxx0xxx")) {
        Ddr5Function::PrechargeAll
    } else if w0.equal_masked(&mask("bxx01011")) && w1.equal_masked(&mask("bxxx1xxx")) {
        Ddr5Function::PrechargeSameBank
    } else if w0.equal_masked(&mask("bxx11011")) {
        Ddr5Function::Precharge
    } else if w0.equal_masked(&mask("bxx10111")) && w1.equal_masked(&mask("bxxx01xx")) {
        Ddr5Function::SelfRefreshEntry
    } else if w0.equal_masked(&mask("bxx10111")) && w1.equal_masked(&mask("bxxx00xx")) {
        Ddr5Function::SelfRefreshEntryFrequencyChange
    } else if w0.equal_masked(&mask("bxx10111")) && w1.equal_masked(&mask("bxxx1xxx")) {
        Ddr5Function::PowerDownEntry
    } else if w0.equal_masked(&mask("bxx01111")) {
        Ddr5Function::MultiPurposeCommand
    } else {
        Ddr5Function::Error
    }
}

/// The rank index from a one-hot-low CS_N sample.
fn decode_chip_select(value: &BitString) -> BitString {
    let zeros: Vec<usize> = (0..value.width())
        .filter(|i| value.bit(*i) == Bit::Zero)
        .collect();
    match zeros.as_slice() {
        [index] => BitString::from_real(*index as f64),
        _ => BitString::from_real(0.0),
    }
}

pub struct Ddr5Decoder {
    signals: Ddr5Signals,
    config: Ddr5Config,
}

impl Ddr5Decoder {
    pub fn new(signals: Ddr5Signals, config: Ddr5Config) -> Ddr5Decoder {
        Ddr5Decoder { signals, config }
    }

    pub fn bind(file: &VcdFile, paths: &Ddr5Paths, config: Ddr5Config) -> Ddr5Decoder {
        Ddr5Decoder::new(Ddr5Signals::bind(file, paths), config)
    }

    /// Decodes the next command, or `None` at the end of the waveform.
    pub fn next_command(&mut self) -> Option<Ddr5Command> {
        let signals = &mut self.signals;
        let cs_n = signals.cs_n.as_mut()?;
        let ck_t = signals.ck_t.as_mut()?;
        let ca = signals.ca.as_mut()?;

        let idle = BitString::ones(cs_n.width());
        let select_sample = cs_n.next_edge(&EdgeKind::NotMatches(idle), true)?;
        let chip_select = decode_chip_select(&select_sample.value);

        // Four UIs of CA, one per rising edge.
        let mut words: Vec<BitString> = Vec::with_capacity(4);
        let mut word_timestamps = [0u64; 4];
        let mut edge = ck_t.edge_at(select_sample.timestamp, EdgePolarity::Rising, true)?;
        for index in 0..4 {
            word_timestamps[index] = edge.timestamp;
            words.push(
                ca.value_at(edge.timestamp, true)
                    .map(|sample| sample.value)
                    .unwrap_or_else(BitString::none),
            );
            if index < 3 {
                edge = ck_t.next_edge(&RISING, true)?;
            }
        }
        let words: [BitString; 4] = words.try_into().ok()?;

        let function = decode_function(&words);
        if function == Ddr5Function::Error {
            log::warn!(
                "unknown DDR5 command word {} at {}",
                words[0],
                word_timestamps[0]
            );
        }
        let w0 = &words[0];
        let w1 = &words[1];
        let w2 = &words[2];
        let w3 = &words[3];

        let chip_id = w1.slice(4, 7);
        let bank_group_address = w1.slice(1, 4);
        let bank_address = w1.bit_value(0).concat(&w0.bit_value(6));

        let mut command = match function {
            Ddr5Function::Activate => Ddr5Command::Activate {
                timestamp: word_timestamps[2],
                chip_select,
                chip_id,
                bank_group_address,
                bank_address,
                row_address: w3
                    .slice(0, 7)
                    .concat(&w2.slice(0, 7))
                    .concat(&w0.slice(2, 6)),
            },
            Ddr5Function::WritePattern => Ddr5Command::WritePattern {
                timestamp: word_timestamps[2],
                chip_select,
                chip_id,
                bank_group_address,
                bank_address,
                column_address: w2.slice(1, 7).concat(&w3.slice(0, 2)).shift_left(3),
            },
            Ddr5Function::WritePatternAutoPrecharge => Ddr5Command::WritePatternAutoPrecharge {
                timestamp: word_timestamps[2],
                chip_select,
                chip_id,
                bank_group_address,
                bank_address,
                column_address: w2.slice(1, 7).concat(&w3.slice(0, 2)).shift_left(3),
            },
            Ddr5Function::ModeRegisterWrite => Ddr5Command::ModeRegisterWrite {
                timestamp: word_timestamps[2],
                chip_select,
                mode_register: w0.slice(5, 7).concat(&w1.slice(0, 6)),
                operation: w2.slice(0, 7).concat(&w3.bit_value(0)),
                control_word: w3.bit_value(3),
            },
            Ddr5Function::ModeRegisterRead => Ddr5Command::ModeRegisterRead {
                timestamp: word_timestamps[2],
                chip_select,
                mode_register: w0.slice(5, 7).concat(&w1.slice(0, 6)),
                control_word: w3.bit_value(3),
            },
            Ddr5Function::Write => Ddr5Command::Write {
                timestamp: word_timestamps[2],
                chip_select,
                chip_id,
                bank_group_address,
                bank_address,
                column_address: w2.slice(1, 7).concat(&w3.slice(0, 2)).shift_left(3),
                burst_length: w0.bit_value(5),
                partial_write: w3.bit_value(4),
                data: None,
            },
            Ddr5Function::WriteAutoPrecharge => Ddr5Command::WriteAutoPrecharge {
                timestamp: word_timestamps[2],
                chip_select,
                chip_id,
                bank_group_address,
                bank_address,
                column_address: w2.slice(1, 7).concat(&w3.slice(0, 2)).shift_left(3),
                burst_length: w0.bit_value(5),
                partial_write: w3.bit_value(4),
                data: None,
            },
            Ddr5Function::Read => Ddr5Command::Read {
                timestamp: word_timestamps[2],
                chip_select,
                chip_id,
                bank_group_address,
                bank_address,
                column_address: w2.slice(0, 7).concat(&w3.slice(0, 2)).shift_left(2),
                burst_length: w0.bit_value(5),
                data: None,
            },
            Ddr5Function::ReadAutoPrecharge => Ddr5Command::ReadAutoPrecharge {
                timestamp: word_timestamps[2],
                chip_select,
                chip_id,
                bank_group_address,
                bank_address,
                column_address: w2.slice(0, 7).concat(&w3.slice(0, 2)).shift_left(2),
                burst_length: w0.bit_value(5),
                data: None,
            },
            Ddr5Function::VrefCa => Ddr5Command::VrefCa {
                timestamp: word_timestamps[0],
                chip_select,
                operation: w1.slice(0, 5).concat(&w0.slice(5, 7)),
            },
            Ddr5Function::VrefCs => Ddr5Command::VrefCs {
                timestamp: word_timestamps[0],
                chip_select,
                operation: w1.slice(0, 5).concat(&w0.slice(5, 7)),
            },
            Ddr5Function::RefreshAll => Ddr5Command::RefreshAll {
                timestamp: word_timestamps[0],
                chip_select,
                chip_id,
                refresh_interval_rate: w1.bit_value(1),
            },
            Ddr5Function::RefreshManagementAll => Ddr5Command::RefreshManagementAll {
                timestamp: word_timestamps[0],
                chip_select,
                chip_id,
            },
            Ddr5Function::RefreshSameBank => Ddr5Command::RefreshSameBank {
                timestamp: word_timestamps[0],
                chip_select,
                chip_id,
                bank_address,
                refresh_interval_rate: w1.bit_value(1),
            },
            Ddr5Function::RefreshManagementSameBank => Ddr5Command::RefreshManagementSameBank {
                timestamp: word_timestamps[0],
                chip_select,
                chip_id,
                bank_address,
            },
            Ddr5Function::PrechargeAll => Ddr5Command::PrechargeAll {
                timestamp: word_timestamps[0],
                chip_select,
                chip_id,
            },
            Ddr5Function::PrechargeSameBank => Ddr5Command::PrechargeSameBank {
                timestamp: word_timestamps[0],
                chip_select,
                chip_id,
                bank_address,
            },
            Ddr5Function::Precharge => Ddr5Command::Precharge {
                timestamp: word_timestamps[0],
                chip_select,
                chip_id,
                bank_group_address,
                bank_address,
            },
            Ddr5Function::SelfRefreshEntry => Ddr5Command::SelfRefreshEntry {
                timestamp: word_timestamps[0],
                chip_select,
            },
            Ddr5Function::SelfRefreshEntryFrequencyChange => {
                Ddr5Command::SelfRefreshEntryFrequencyChange {
                    timestamp: word_timestamps[0],
                    chip_select,
                }
            }
            Ddr5Function::PowerDownEntry => Ddr5Command::PowerDownEntry {
                timestamp: word_timestamps[0],
                chip_select,
                on_die_termination: w1.bit_value(4),
            },
            Ddr5Function::MultiPurposeCommand => Ddr5Command::MultiPurposeCommand {
                timestamp: word_timestamps[0],
                chip_select,
                operation: w1.slice(0, 6).concat(&w0.slice(5, 7)),
            },
            Ddr5Function::Error => Ddr5Command::Error {
                timestamp: word_timestamps[0],
                chip_select,
            },
        };

        if self.config.capture_data {
            match &mut command {
                Ddr5Command::Read { data, .. } | Ddr5Command::ReadAutoPrecharge { data, .. } => {
                    *data = Some(self.capture_burst(word_timestamps[2], false)?);
                }
                Ddr5Command::Write { data, .. } | Ddr5Command::WriteAutoPrecharge { data, .. } => {
                    *data = Some(self.capture_burst(word_timestamps[2], true)?);
                }
                _ => {}
            }
        }

        Some(command)
    }

    /// Gathers one burst off the DQ bus. The complement clock is anchored at
    /// the column command and advanced `latency - 1` edges; from there, even
    /// beats latch on the true strobe and odd beats on the complement
    /// strobe, each at its next not-idle sample.
    fn capture_burst(&mut self, anchor: u64, write: bool) -> Option<BitString> {
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
            (signals.dqs_t.as_mut()?, signals.dqs_c.as_mut()?)
        };
        strobe_t.value_at(latch_timestamp, true);
        strobe_c.value_at(latch_timestamp, true);
        let dq = signals.dq.as_mut()?;

        let idle_t = BitString::zeros(strobe_t.width());
        let idle_c = BitString::zeros(strobe_c.width());
        let mut data = BitString::none();
        for beat in 0..self.config.burst_length {
            let strobe_sample = if beat % 2 == 0 {
                strobe_t.next_edge(&EdgeKind::NotMatches(idle_t.clone()), true)?
            } else {
                strobe_c.next_edge(&EdgeKind::NotMatches(idle_c.clone()), true)?
            };
            let beat_value = dq
                .value_at(strobe_sample.timestamp, true)
                .map(|sample| sample.value)
                .unwrap_or_else(BitString::none);
            data = beat_value.concat(&data);
        }
        Some(data)
    }

    pub fn commands(&mut self) -> impl Iterator<Item = Ddr5Command> + '_ {
        std::iter::from_fn(move || self.next_command())
    }

    pub fn config(&self) -> &Ddr5Config {
        &self.config
    }
}

impl Ddr5Command {
    pub fn timestamp(&self) -> u64 {
        match self {
            Ddr5Command::Error { timestamp, .. }
            | Ddr5Command::Activate { timestamp, .. }
            | Ddr5Command::WritePattern { timestamp, .. }
            | Ddr5Command::WritePatternAutoPrecharge { timestamp, .. }
            | Ddr5Command::ModeRegisterWrite { timestamp, .. }
            | Ddr5Command::ModeRegisterRead { timestamp, .. }
            | Ddr5Command::Write { timestamp, .. }
            | Ddr5Command::WriteAutoPrecharge { timestamp, .. }
            | Ddr5Command::Read { timestamp, .. }
            | Ddr5Command::ReadAutoPrecharge { timestamp, .. }
            | Ddr5Command::VrefCa { timestamp, .. }
            | Ddr5Command::VrefCs { timestamp, .. }
            | Ddr5Command::RefreshAll { timestamp, .. }
            | Ddr5Command::RefreshManagementAll { timestamp, .. }
            | Ddr5Command::RefreshSameBank { timestamp, .. }
            | Ddr5Command::RefreshManagementSameBank { timestamp, .. }
            | Ddr5Command::PrechargeAll { timestamp, .. }
            | Ddr5Command::PrechargeSameBank { timestamp, .. }
            | Ddr5Command::Precharge { timestamp, .. }
            | Ddr5Command::SelfRefreshEntry { timestamp, .. }
            | Ddr5Command::SelfRefreshEntryFrequencyChange { timestamp, .. }
            | Ddr5Command::PowerDownEntry { timestamp, .. }
            | Ddr5Command::MultiPurposeCommand { timestamp, .. } => *timestamp,
        }
    }

    pub fn chip_select(&self) -> &BitString {
        match self {
            Ddr5Command::Error { chip_select, .. }
            | Ddr5Command::Activate { chip_select, .. }
            | Ddr5Command::WritePattern { chip_select, .. }
            | Ddr5Command::WritePatternAutoPrecharge { chip_select, .. }
            | Ddr5Command::ModeRegisterWrite { chip_select, .. }
            | Ddr5Command::ModeRegisterRead { chip_select, .. }
            | Ddr5Command::Write { chip_select, .. }
            | Ddr5Command::WriteAutoPrecharge { chip_select, .. }
            | Ddr5Command::Read { chip_select, .. }
            | Ddr5Command::ReadAutoPrecharge { chip_select, .. }
            | Ddr5Command::VrefCa { chip_select, .. }
            | Ddr5Command::VrefCs { chip_select, .. }
            | Ddr5Command::RefreshAll { chip_select, .. }
            | Ddr5Command::RefreshManagementAll { chip_select, .. }
            | Ddr5Command::RefreshSameBank { chip_select, .. }
            | Ddr5Command::RefreshManagementSameBank { chip_select, .. }
            | Ddr5Command::PrechargeAll { chip_select, .. }
            | Ddr5Command::PrechargeSameBank { chip_select, .. }
            | Ddr5Command::Precharge { chip_select, .. }
            | Ddr5Command::SelfRefreshEntry { chip_select, .. }
            | Ddr5Command::SelfRefreshEntryFrequencyChange { chip_select, .. }
            | Ddr5Command::PowerDownEntry { chip_select, .. }
            | Ddr5Command::MultiPurposeCommand { chip_select, .. } => chip_select,
        }
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Ddr5Command::Error { .. } => "ERROR",
            Ddr5Command::Activate { .. } => "ACT",
            Ddr5Command::WritePattern { .. } => "WRP",
            Ddr5Command::WritePatternAutoPrecharge { .. } => "WRPA",
            Ddr5Command::ModeRegisterWrite { .. } => "MRW",
            Ddr5Command::ModeRegisterRead { .. } => "MRR",
            Ddr5Command::Write { .. } => "WR",
            Ddr5Command::WriteAutoPrecharge { .. } => "WRA",
            Ddr5Command::Read { .. } => "RD",
            Ddr5Command::ReadAutoPrecharge { .. } => "RDA",
            Ddr5Command::VrefCa { .. } => "VrefCA",
            Ddr5Command::VrefCs { .. } => "VrefCS",
            Ddr5Command::RefreshAll { .. } => "REFab",
            Ddr5Command::RefreshManagementAll { .. } => "RFMab",
            Ddr5Command::RefreshSameBank { .. } => "REFsb",
            Ddr5Command::RefreshManagementSameBank { .. } => "RFMsb",
            Ddr5Command::PrechargeAll { .. } => "PREab",
            Ddr5Command::PrechargeSameBank { .. } => "PREsb",
            Ddr5Command::Precharge { .. } => "PREpb",
            Ddr5Command::SelfRefreshEntry { .. } => "SRE",
            Ddr5Command::SelfRefreshEntryFrequencyChange { .. } => "SREF",
            Ddr5Command::PowerDownEntry { .. } => "PDE",
            Ddr5Command::MultiPurposeCommand { .. } => "MPC",
        }
    }

    fn bus_color(&self) -> &'static str {
        match self {
            Ddr5Command::Error { .. } => render::ERROR_COLOR,
            Ddr5Command::Activate { .. } => color::BG_RED,
            Ddr5Command::WritePattern { .. }
            | Ddr5Command::WritePatternAutoPrecharge { .. }
            | Ddr5Command::Write { .. }
            | Ddr5Command::WriteAutoPrecharge { .. } => color::BG_CYAN,
            Ddr5Command::Read { .. } | Ddr5Command::ReadAutoPrecharge { .. } => color::BG_YELLOW,
            Ddr5Command::ModeRegisterWrite { .. }
            | Ddr5Command::ModeRegisterRead { .. }
            | Ddr5Command::VrefCa { .. }
            | Ddr5Command::VrefCs { .. }
            | Ddr5Command::MultiPurposeCommand { .. } => color::BG_MAGENTA,
            Ddr5Command::RefreshAll { .. }
            | Ddr5Command::RefreshManagementAll { .. }
            | Ddr5Command::RefreshSameBank { .. }
            | Ddr5Command::RefreshManagementSameBank { .. } => color::BG_BLUE,
            Ddr5Command::PrechargeAll { .. }
            | Ddr5Command::PrechargeSameBank { .. }
            | Ddr5Command::Precharge { .. } => color::BG_GREEN,
            Ddr5Command::SelfRefreshEntry { .. }
            | Ddr5Command::SelfRefreshEntryFrequencyChange { .. }
            | Ddr5Command::PowerDownEntry { .. } => render::POWER_COLOR,
        }
    }

    fn parameters(&self, enable_cid: bool) -> Vec<(&'static str, String)> {
        let mut parameters: Vec<(&'static str, String)> = Vec::new();
        let cid = |value: &BitString, parameters: &mut Vec<(&'static str, String)>| {
            if enable_cid {
                parameters.push(("CID", render::dec_or_x(value)));
            }
        };
        match self {
            Ddr5Command::Error { .. } => {}
            Ddr5Command::Activate {
                chip_id,
                bank_group_address,
                bank_address,
                row_address,
                ..
            } => {
                cid(chip_id, &mut parameters);
                parameters.push(("BG", render::dec_or_x(bank_group_address)));
                parameters.push(("BA", render::dec_or_x(bank_address)));
                parameters.push(("R", render::dec_or_x(row_address)));
            }
            Ddr5Command::WritePattern {
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
            } => {
                cid(chip_id, &mut parameters);
                parameters.push(("BG", render::dec_or_x(bank_group_address)));
                parameters.push(("BA", render::dec_or_x(bank_address)));
                parameters.push(("C", render::dec_or_x(column_address)));
            }
            Ddr5Command::ModeRegisterWrite {
                mode_register,
                operation,
                control_word,
                ..
            } => {
                parameters.push(("MRA", render::dec_or_x(mode_register)));
                parameters.push(("OP", render::dec_or_x(operation)));
                parameters.push(("CW", render::dec_or_x(control_word)));
            }
            Ddr5Command::ModeRegisterRead {
                mode_register,
                control_word,
                ..
            } => {
                parameters.push(("MRA", render::dec_or_x(mode_register)));
                parameters.push(("CW", render::dec_or_x(control_word)));
            }
            Ddr5Command::Write {
                chip_id,
                bank_group_address,
                bank_address,
                column_address,
                burst_length,
                partial_write,
                ..
            }
            | Ddr5Command::WriteAutoPrecharge {
                chip_id,
                bank_group_address,
                bank_address,
                column_address,
                burst_length,
                partial_write,
                ..
            } => {
                cid(chip_id, &mut parameters);
                parameters.push(("BG", render::dec_or_x(bank_group_address)));
                parameters.push(("BA", render::dec_or_x(bank_address)));
                parameters.push(("C", render::dec_or_x(column_address)));
                parameters.push(("BL", render::dec_or_x(burst_length)));
                parameters.push(("WRP", render::dec_or_x(partial_write)));
            }
            Ddr5Command::Read {
                chip_id,
                bank_group_address,
                bank_address,
                column_address,
                burst_length,
                ..
            }
            | Ddr5Command::ReadAutoPrecharge {
                chip_id,
                bank_group_address,
                bank_address,
                column_address,
                burst_length,
                ..
            } => {
                cid(chip_id, &mut parameters);
                parameters.push(("BG", render::dec_or_x(bank_group_address)));
                parameters.push(("BA", render::dec_or_x(bank_address)));
                parameters.push(("C", render::dec_or_x(column_address)));
                parameters.push(("BL", render::dec_or_x(burst_length)));
            }
            Ddr5Command::VrefCa { operation, .. } | Ddr5Command::VrefCs { operation, .. } => {
                parameters.push(("OP", render::dec_or_x(operation)));
            }
            Ddr5Command::RefreshAll {
                chip_id,
                refresh_interval_rate,
                ..
            } => {
                cid(chip_id, &mut parameters);
                parameters.push(("RIR", render::dec_or_x(refresh_interval_rate)));
            }
            Ddr5Command::RefreshManagementAll { chip_id, .. }
            | Ddr5Command::PrechargeAll { chip_id, .. } => {
                cid(chip_id, &mut parameters);
            }
            Ddr5Command::RefreshSameBank {
                chip_id,
                bank_address,
                refresh_interval_rate,
                ..
            } => {
                cid(chip_id, &mut parameters);
                parameters.push(("BA", render::dec_or_x(bank_address)));
                parameters.push(("RIR", render::dec_or_x(refresh_interval_rate)));
            }
            Ddr5Command::RefreshManagementSameBank {
                chip_id,
                bank_address,
                ..
            }
            | Ddr5Command::PrechargeSameBank {
                chip_id,
                bank_address,
                ..
            } => {
                cid(chip_id, &mut parameters);
                parameters.push(("BA", render::dec_or_x(bank_address)));
            }
            Ddr5Command::Precharge {
                chip_id,
                bank_group_address,
                bank_address,
                ..
            } => {
                cid(chip_id, &mut parameters);
                parameters.push(("BG", render::dec_or_x(bank_group_address)));
                parameters.push(("BA", render::dec_or_x(bank_address)));
            }
            Ddr5Command::SelfRefreshEntry { .. }
            | Ddr5Command::SelfRefreshEntryFrequencyChange { .. } => {}
            Ddr5Command::PowerDownEntry {
                on_die_termination, ..
            } => {
                parameters.push(("ODT", render::dec_or_x(on_die_termination)));
            }
            Ddr5Command::MultiPurposeCommand { operation, .. } => {
                parameters.push(("OP", render::dec_or_x(operation)));
            }
        }
        parameters
    }

    /// The captured burst, for the commands that carry one.
    pub fn data(&self) -> Option<&BitString> {
        match self {
            Ddr5Command::Write { data, .. }
            | Ddr5Command::WriteAutoPrecharge { data, .. }
            | Ddr5Command::Read { data, .. }
            | Ddr5Command::ReadAutoPrecharge { data, .. } => data.as_ref(),
            _ => None,
        }
    }
}

impl Packet for Ddr5Command {
    fn timestamp(&self) -> u64 {
        Ddr5Command::timestamp(self)
    }

    fn render_line(&self, style: &LineStyle) -> String {
        let context = format!("CS{}", render::dec_or_x(self.chip_select()));
        render::packet_line(
            style,
            Ddr5Command::timestamp(self),
            Some(&context),
            self.mnemonic(),
            &self.parameters(style.enable_cid),
            self.bus_color(),
        )
    }
}
