//! Bit-accurate waveform access for bus decoding.
//!
//! This crate holds the value model shared by every buslens decoder: a
//! 4-state [`BitString`], per-signal [`SignalCursor`]s with binary-search
//! random access and edge navigation, the valid/ready [`handshake`]
//! primitive, and a [`VcdFile`] loader that turns a Value Change Dump into
//! cursors. The low-level VCD tokenization is done by the [`vcd`] crate;
//! this crate only buckets the value changes per signal and reconstructs
//! the raw tokens.
//!
//! ## Example
//!
//! ```
//! use buslens_waveform::{BitString, EdgeKind, EdgePolarity, VcdFile};
//!
//! # fn main() -> Result<(), buslens_waveform::WaveformError> {
//! let text = b"\
//! $timescale 1 ns $end
//! $scope module top $end
//! $var wire 1 ! clk $end
//! $upscope $end
//! $enddefinitions $end
//! #0 0!
//! #5 1!
//! #10 0!
//! #15 1!
//! ";
//! let file = VcdFile::load(&text[..])?;
//! let mut clk = file.get_signal("top.clk").unwrap();
//! let edge = clk.next_edge(&EdgeKind::Polarity(EdgePolarity::Rising), true);
//! assert_eq!(edge.unwrap().timestamp, 5);
//! # Ok(())
//! # }
//! ```

mod bitstring;
mod handshake;
mod signal;
mod vcd_file;

pub use bitstring::{Bit, BitString};
pub use handshake::next_handshake;
pub use signal::{EdgeKind, EdgePolarity, Sample, SignalCursor};
pub use vcd_file::{VcdFile, WaveformError};
