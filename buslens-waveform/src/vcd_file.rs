use std::io::BufRead;

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::bitstring::BitString;
use crate::signal::{Sample, SignalCursor};

#[derive(Debug, Error)]
pub enum WaveformError {
    #[error("VCD read error: {0}")]
    Io(#[from] std::io::Error),
}

/// A fully parsed VCD file: the declaration header plus every value change,
/// bucketed per signal.
///
/// Loading walks the dump exactly once. Cursors handed out by
/// [`get_signal`](VcdFile::get_signal) are independent of each other, so the
/// same net can back several decoders without shared state.
pub struct VcdFile {
    header: vcd::Header,
    tokens: FxHashMap<vcd::IdCode, Vec<(u64, String)>>,
}

impl VcdFile {
    pub fn load<R: BufRead>(reader: R) -> Result<VcdFile, WaveformError> {
        let mut parser = vcd::Parser::new(reader);
        let header = parser.parse_header()?;

        let mut tokens: FxHashMap<vcd::IdCode, Vec<(u64, String)>> = FxHashMap::default();
        let mut current_timestamp = 0u64;
        for command in &mut parser {
            match command? {
                vcd::Command::Timestamp(timestamp) => {
                    if timestamp < current_timestamp {
                        log::warn!(
                            "non-monotonic timestamp in VCD: #{timestamp} after #{current_timestamp}"
                        );
                    }
                    current_timestamp = timestamp;
                }
                vcd::Command::ChangeScalar(id, value) => {
                    push_token(&mut tokens, id, current_timestamp, scalar_token(value));
                }
                vcd::Command::ChangeVector(id, vector) => {
                    push_token(&mut tokens, id, current_timestamp, vector_token(&vector));
                }
                vcd::Command::ChangeReal(id, value) => {
                    push_token(&mut tokens, id, current_timestamp, format!("r{value}"));
                }
                _ => {}
            }
        }
        Ok(VcdFile { header, tokens })
    }

    /// Looks up a signal by its dotted path and materializes a cursor with
    /// the declared width. `None` when the path does not resolve or the
    /// signal never changes; the caller treats that as an unbound signal.
    pub fn get_signal(&self, path: &str) -> Option<SignalCursor> {
        let parts: Vec<&str> = path.split('.').filter(|part| !part.is_empty()).collect();
        let var = self.header.find_var(&parts)?;
        let changes = self.tokens.get(&var.code)?;
        let width = var.size as usize;
        let samples = changes
            .iter()
            .map(|(timestamp, token)| Sample {
                timestamp: *timestamp,
                value: BitString::from_token(token, width),
            })
            .collect();
        Some(SignalCursor::new(width, samples))
    }
}

fn push_token(
    tokens: &mut FxHashMap<vcd::IdCode, Vec<(u64, String)>>,
    id: vcd::IdCode,
    timestamp: u64,
    token: String,
) {
    let changes = tokens.entry(id).or_default();
    // Several changes inside one timestep: the last one wins, keeping the
    // per-signal timestamps strictly increasing.
    match changes.last_mut() {
        Some(last) if last.0 == timestamp => last.1 = token,
        _ => changes.push((timestamp, token)),
    }
}

fn bit_char(value: vcd::Value) -> char {
    match value {
        vcd::Value::V0 => '0',
        vcd::Value::V1 => '1',
        vcd::Value::X => 'x',
        vcd::Value::Z => 'z',
    }
}

fn scalar_token(value: vcd::Value) -> String {
    bit_char(value).to_string()
}

fn vector_token(vector: &vcd::Vector) -> String {
    let mut token = String::from("b");
    for value in vector.iter() {
        token.push(bit_char(value));
    }
    token
}
