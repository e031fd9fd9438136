//! AXI transaction decoding.
//!
//! The write walker follows the AW, W and B channels through their
//! valid/ready handshakes; the read walker follows AR and R. Data beats are
//! concatenated with the first beat least significant. Signals missing from
//! the dump sample as the none value, since not every implementation wires
//! the optional fields.

use buslens_waveform::{next_handshake, BitString, SignalCursor, VcdFile};

use crate::apb::sample_or_none;
use crate::binding::AxiPaths;
use crate::merge::Packet;
use crate::render::{self, color, LineStyle};

pub struct AxiSignals {
    pub aclock: Option<SignalCursor>,
    pub awid: Option<SignalCursor>,
    pub awaddr: Option<SignalCursor>,
    pub awlen: Option<SignalCursor>,
    pub awsize: Option<SignalCursor>,
    pub awburst: Option<SignalCursor>,
    pub awprot: Option<SignalCursor>,
    pub awvalid: Option<SignalCursor>,
    pub awready: Option<SignalCursor>,
    pub wdata: Option<SignalCursor>,
    pub wstrb: Option<SignalCursor>,
    pub wlast: Option<SignalCursor>,
    pub wvalid: Option<SignalCursor>,
    pub wready: Option<SignalCursor>,
    pub bid: Option<SignalCursor>,
    pub bresp: Option<SignalCursor>,
    pub bvalid: Option<SignalCursor>,
    pub bready: Option<SignalCursor>,
    pub arid: Option<SignalCursor>,
    pub araddr: Option<SignalCursor>,
    pub arlen: Option<SignalCursor>,
    pub arsize: Option<SignalCursor>,
    pub arburst: Option<SignalCursor>,
    pub arprot: Option<SignalCursor>,
    pub arvalid: Option<SignalCursor>,
    pub arready: Option<SignalCursor>,
    pub rid: Option<SignalCursor>,
    pub rresp: Option<SignalCursor>,
    pub rdata: Option<SignalCursor>,
    pub rlast: Option<SignalCursor>,
    pub rvalid: Option<SignalCursor>,
    pub rready: Option<SignalCursor>,
}

impl AxiSignals {
    pub fn bind(file: &VcdFile, paths: &AxiPaths) -> AxiSignals {
        AxiSignals {
            aclock: file.get_signal(&paths.aclock),
            awid: file.get_signal(&paths.awid),
            awaddr: file.get_signal(&paths.awaddr),
            awlen: file.get_signal(&paths.awlen),
            awsize: file.get_signal(&paths.awsize),
            awburst: file.get_signal(&paths.awburst),
            awprot: file.get_signal(&paths.awprot),
            awvalid: file.get_signal(&paths.awvalid),
            awready: file.get_signal(&paths.awready),
            wdata: file.get_signal(&paths.wdata),
            wstrb: file.get_signal(&paths.wstrb),
            wlast: file.get_signal(&paths.wlast),
            wvalid: file.get_signal(&paths.wvalid),
            wready: file.get_signal(&paths.wready),
            bid: file.get_signal(&paths.bid),
            bresp: file.get_signal(&paths.bresp),
            bvalid: file.get_signal(&paths.bvalid),
            bready: file.get_signal(&paths.bready),
            arid: file.get_signal(&paths.arid),
            araddr: file.get_signal(&paths.araddr),
            arlen: file.get_signal(&paths.arlen),
            arsize: file.get_signal(&paths.arsize),
            arburst: file.get_signal(&paths.arburst),
            arprot: file.get_signal(&paths.arprot),
            arvalid: file.get_signal(&paths.arvalid),
            arready: file.get_signal(&paths.arready),
            rid: file.get_signal(&paths.rid),
            rresp: file.get_signal(&paths.rresp),
            rdata: file.get_signal(&paths.rdata),
            rlast: file.get_signal(&paths.rlast),
            rvalid: file.get_signal(&paths.rvalid),
            rready: file.get_signal(&paths.rready),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AxiWrite {
    pub timestamp_address: u64,
    pub timestamp_data_first: Option<u64>,
    pub timestamp_data_last: Option<u64>,
    pub timestamp_response: u64,
    pub identifier: BitString,
    pub address: BitString,
    pub length: BitString,
    pub size: BitString,
    pub burst: BitString,
    pub permissions: BitString,
    pub data: BitString,
    pub response: BitString,
}

#[derive(Debug, Clone)]
pub struct AxiRead {
    pub timestamp_address: u64,
    pub timestamp_data_first: Option<u64>,
    pub timestamp_data_last: Option<u64>,
    pub identifier: BitString,
    pub address: BitString,
    pub length: BitString,
    pub size: BitString,
    pub burst: BitString,
    pub permissions: BitString,
    pub data: BitString,
    pub response: BitString,
}

#[derive(Debug, Clone)]
pub enum AxiTransaction {
    Write(AxiWrite),
    Read(AxiRead),
}

pub struct AxiDecoder {
    signals: AxiSignals,
}

impl AxiDecoder {
    pub fn new(signals: AxiSignals) -> AxiDecoder {
        AxiDecoder { signals }
    }

    pub fn bind(file: &VcdFile, paths: &AxiPaths) -> AxiDecoder {
        AxiDecoder::new(AxiSignals::bind(file, paths))
    }

    /// Decodes the next write transaction: AW handshake, `awlen + 1` W
    /// beats, then the B response.
    pub fn next_write_transaction(&mut self) -> Option<AxiWrite> {
        let signals = &mut self.signals;

        let timestamp_address = next_handshake(
            signals.aclock.as_mut()?,
            signals.awvalid.as_mut()?,
            signals.awready.as_mut()?,
        )?;

        let identifier = sample_or_none(&mut signals.awid, timestamp_address);
        let address = sample_or_none(&mut signals.awaddr, timestamp_address);
        let length = sample_or_none(&mut signals.awlen, timestamp_address);
        let size = sample_or_none(&mut signals.awsize, timestamp_address);
        let burst = sample_or_none(&mut signals.awburst, timestamp_address);
        let permissions = sample_or_none(&mut signals.awprot, timestamp_address);

        let beats = length.to_decimal()? + 1;
        let mut timestamp_data_first = None;
        let mut timestamp_data_last = None;
        let mut data = BitString::none();
        for _ in 0..beats {
            let timestamp_data = next_handshake(
                signals.aclock.as_mut()?,
                signals.wvalid.as_mut()?,
                signals.wready.as_mut()?,
            )?;
            let _strobe = sample_or_none(&mut signals.wstrb, timestamp_data);
            let beat = sample_or_none(&mut signals.wdata, timestamp_data);
            let last = sample_or_none(&mut signals.wlast, timestamp_data);

            data = beat.concat(&data);
            if timestamp_data_first.is_none() {
                timestamp_data_first = Some(timestamp_data);
            }
            if last.is_one() {
                timestamp_data_last = Some(timestamp_data);
            }
        }

        let timestamp_response = next_handshake(
            signals.aclock.as_mut()?,
            signals.bvalid.as_mut()?,
            signals.bready.as_mut()?,
        )?;
        let _bid = sample_or_none(&mut signals.bid, timestamp_response);
        let response = sample_or_none(&mut signals.bresp, timestamp_response);

        Some(AxiWrite {
            timestamp_address,
            timestamp_data_first,
            timestamp_data_last,
            timestamp_response,
            identifier,
            address,
            length,
            size,
            burst,
            permissions,
            data,
            response,
        })
    }

    /// Decodes the next read transaction: AR handshake then `arlen + 1` R
    /// beats. The response code of the last beat is the one reported.
    pub fn next_read_transaction(&mut self) -> Option<AxiRead> {
        let signals = &mut self.signals;

        let timestamp_address = next_handshake(
            signals.aclock.as_mut()?,
            signals.arvalid.as_mut()?,
            signals.arready.as_mut()?,
        )?;

        let identifier = sample_or_none(&mut signals.arid, timestamp_address);
        let address = sample_or_none(&mut signals.araddr, timestamp_address);
        let length = sample_or_none(&mut signals.arlen, timestamp_address);
        let size = sample_or_none(&mut signals.arsize, timestamp_address);
        let burst = sample_or_none(&mut signals.arburst, timestamp_address);
        let permissions = sample_or_none(&mut signals.arprot, timestamp_address);

        let beats = length.to_decimal()? + 1;
        let mut timestamp_data_first = None;
        let mut timestamp_data_last = None;
        let mut data = BitString::none();
        let mut response = BitString::none();
        for _ in 0..beats {
            let timestamp_data = next_handshake(
                signals.aclock.as_mut()?,
                signals.rvalid.as_mut()?,
                signals.rready.as_mut()?,
            )?;
            let _rid = sample_or_none(&mut signals.rid, timestamp_data);
            response = sample_or_none(&mut signals.rresp, timestamp_data);
            let beat = sample_or_none(&mut signals.rdata, timestamp_data);
            let last = sample_or_none(&mut signals.rlast, timestamp_data);

            data = beat.concat(&data);
            if timestamp_data_first.is_none() {
                timestamp_data_first = Some(timestamp_data);
            }
            if last.is_one() {
                timestamp_data_last = Some(timestamp_data);
            }
        }

        Some(AxiRead {
            timestamp_address,
            timestamp_data_first,
            timestamp_data_last,
            identifier,
            address,
            length,
            size,
            burst,
            permissions,
            data,
            response,
        })
    }

    pub fn write_transactions(&mut self) -> impl Iterator<Item = AxiWrite> + '_ {
        std::iter::from_fn(move || self.next_write_transaction())
    }

    pub fn read_transactions(&mut self) -> impl Iterator<Item = AxiRead> + '_ {
        std::iter::from_fn(move || self.next_read_transaction())
    }
}

impl Packet for AxiTransaction {
    fn timestamp(&self) -> u64 {
        match self {
            AxiTransaction::Write(write) => write.timestamp_address,
            AxiTransaction::Read(read) => read.timestamp_address,
        }
    }

    fn render_line(&self, style: &LineStyle) -> String {
        let (command, bus_color, identifier, address, data) = match self {
            AxiTransaction::Write(write) => (
                "WRITE",
                color::BG_CYAN,
                &write.identifier,
                &write.address,
                &write.data,
            ),
            AxiTransaction::Read(read) => (
                "READ",
                color::BG_YELLOW,
                &read.identifier,
                &read.address,
                &read.data,
            ),
        };
        let parameters = vec![
            ("ID ", render::hex_or_dash(identifier)),
            ("ADDR ", render::hex_or_dash(address)),
            ("DATA ", render::hex_or_dash(data)),
        ];
        render::packet_line(style, self.timestamp(), None, command, &parameters, bus_color)
    }
}
