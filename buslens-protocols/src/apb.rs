//! APB transaction decoding.
//!
//! A transfer starts when `penable` rises; the access phase is sampled at
//! the next `pclock` rising edge and the response phase at the rising edge
//! following the `pready` assertion.

use buslens_waveform::{BitString, EdgeKind, EdgePolarity, SignalCursor, VcdFile};

use crate::binding::ApbPaths;
use crate::merge::Packet;
use crate::render::{self, color, LineStyle};

const RISING: EdgeKind = EdgeKind::Polarity(EdgePolarity::Rising);

/// The bound cursors of one APB interface. Optional signals that are not
/// present in the dump stay `None` and sample as the none value.
pub struct ApbSignals {
    pub pclock: Option<SignalCursor>,
    pub psel: Option<SignalCursor>,
    pub penable: Option<SignalCursor>,
    pub pready: Option<SignalCursor>,
    pub paddr: Option<SignalCursor>,
    pub pprot: Option<SignalCursor>,
    pub pnse: Option<SignalCursor>,
    pub pwrite: Option<SignalCursor>,
    pub pstrb: Option<SignalCursor>,
    pub pwdata: Option<SignalCursor>,
    pub prdata: Option<SignalCursor>,
    pub pslverr: Option<SignalCursor>,
}

impl ApbSignals {
    pub fn bind(file: &VcdFile, paths: &ApbPaths) -> ApbSignals {
        ApbSignals {
            pclock: file.get_signal(&paths.pclock),
            psel: file.get_signal(&paths.psel),
            penable: file.get_signal(&paths.penable),
            pready: file.get_signal(&paths.pready),
            paddr: file.get_signal(&paths.paddr),
            pprot: file.get_signal(&paths.pprot),
            pnse: file.get_signal(&paths.pnse),
            pwrite: file.get_signal(&paths.pwrite),
            pstrb: file.get_signal(&paths.pstrb),
            pwdata: file.get_signal(&paths.pwdata),
            prdata: file.get_signal(&paths.prdata),
            pslverr: file.get_signal(&paths.pslverr),
        }
    }
}

/// Samples an optional signal without disturbing its cursor.
pub(crate) fn sample_or_none(cursor: &mut Option<SignalCursor>, timestamp: u64) -> BitString {
    match cursor {
        Some(cursor) => cursor
            .value_at(timestamp, false)
            .map(|sample| sample.value)
            .unwrap_or_else(BitString::none),
        None => BitString::none(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApbOperation {
    Read,
    Write,
    /// `pwrite` carried X or Z at the access phase.
    Error,
}

#[derive(Debug, Clone)]
pub struct ApbTransaction {
    pub operation: ApbOperation,
    pub timestamp_request: u64,
    pub timestamp_response: u64,
    pub paddr: BitString,
    pub pprot: BitString,
    pub pnse: BitString,
    pub pwrite: BitString,
    pub pstrb: BitString,
    pub pwdata: BitString,
    pub prdata: BitString,
    pub pslverr: BitString,
}

pub struct ApbDecoder {
    signals: ApbSignals,
}

impl ApbDecoder {
    pub fn new(signals: ApbSignals) -> ApbDecoder {
        ApbDecoder { signals }
    }

    pub fn bind(file: &VcdFile, paths: &ApbPaths) -> ApbDecoder {
        ApbDecoder::new(ApbSignals::bind(file, paths))
    }

    /// Decodes the next transfer, or `None` at the end of the waveform.
    pub fn next_transaction(&mut self) -> Option<ApbTransaction> {
        let signals = &mut self.signals;
        let penable = signals.penable.as_mut()?;
        let pclock = signals.pclock.as_mut()?;

        let enable_timestamp = penable.next_edge(&RISING, true)?.timestamp;
        let timestamp_request = pclock
            .edge_at(enable_timestamp, EdgePolarity::Rising, false)?
            .timestamp;

        let paddr = sample_or_none(&mut signals.paddr, timestamp_request);
        let pprot = sample_or_none(&mut signals.pprot, timestamp_request);
        let pnse = sample_or_none(&mut signals.pnse, timestamp_request);
        let pwrite = sample_or_none(&mut signals.pwrite, timestamp_request);
        let pstrb = sample_or_none(&mut signals.pstrb, timestamp_request);
        let pwdata = sample_or_none(&mut signals.pwdata, timestamp_request);

        let pready = signals.pready.as_mut()?;
        pready.value_at(timestamp_request, true);
        let ready_timestamp = pready
            .edge_at(timestamp_request, EdgePolarity::Rising, true)?
            .timestamp;
        let timestamp_response = pclock
            .edge_at(ready_timestamp, EdgePolarity::Rising, false)?
            .timestamp;

        let prdata = sample_or_none(&mut signals.prdata, timestamp_response);
        let pslverr = sample_or_none(&mut signals.pslverr, timestamp_response);

        let operation = if pwrite.has_xz() {
            ApbOperation::Error
        } else if pwrite.is_one() {
            ApbOperation::Write
        } else {
            ApbOperation::Read
        };

        Some(ApbTransaction {
            operation,
            timestamp_request,
            timestamp_response,
            paddr,
            pprot,
            pnse,
            pwrite,
            pstrb,
            pwdata,
            prdata,
            pslverr,
        })
    }

    /// Lazily yields transactions until the waveform runs out.
    pub fn transactions(&mut self) -> impl Iterator<Item = ApbTransaction> + '_ {
        std::iter::from_fn(move || self.next_transaction())
    }
}

impl Packet for ApbTransaction {
    fn timestamp(&self) -> u64 {
        self.timestamp_request
    }

    fn render_line(&self, style: &LineStyle) -> String {
        let (command, bus_color): (&str, &str) = match self.operation {
            ApbOperation::Read => ("READ", color::BG_YELLOW),
            ApbOperation::Write => ("WRITE", color::BG_CYAN),
            ApbOperation::Error => ("ERROR", render::ERROR_COLOR),
        };
        let mut parameters: Vec<(&str, String)> =
            vec![("ADDR ", render::hex_or_dash(&self.paddr))];
        match self.operation {
            ApbOperation::Write => {
                parameters.push(("DATA ", render::hex_or_dash(&self.pwdata)));
            }
            ApbOperation::Read => {
                parameters.push(("DATA ", render::hex_or_dash(&self.prdata)));
            }
            ApbOperation::Error => {
                parameters.push(("WDATA ", render::hex_or_dash(&self.pwdata)));
                parameters.push(("RDATA ", render::hex_or_dash(&self.prdata)));
            }
        }
        if self.pslverr.is_one() {
            parameters.push(("SLVERR ", String::new()));
        }
        render::packet_line(
            style,
            self.timestamp_request,
            None,
            command,
            &parameters,
            bus_color,
        )
    }
}
