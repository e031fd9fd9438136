use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "buslens",
    version,
    about = r#"
buslens reconstructs bus transactions from VCD waveform dumps and renders
them as colorized command lines.

EXAMPLES:
    # Decode an APB interface whose signals live under top.dut:
    buslens apb trace.vcd --base top.dut

    # DDR5 with uppercase signal names and a custom read latency:
    buslens ddr5 trace.vcd --base tb.channel0 --read-latency 44 --annotate

    # Explicit per-signal paths from a JSON map:
    buslens axi trace.vcd --signals axi_signals.json
"#
)]
pub struct Opt {
    #[command(subcommand)]
    pub action: Action,
}

#[derive(Debug, Subcommand)]
pub enum Action {
    /// Decode APB transfers.
    Apb(ApbArgs),

    /// Decode AXI transactions, merging the write and read channels.
    Axi(AxiArgs),

    /// Decode DDR5 commands.
    Ddr5(Ddr5Args),

    /// Decode HBM2e commands, merging the row and column buses.
    Hbm2e(Hbm2eArgs),
}

#[derive(Debug, Args)]
pub struct BindArgs {
    /// Path to the VCD file to inspect.
    pub file: PathBuf,

    /// Scope path the signals live under, e.g. "top.dut.bus".
    #[arg(long, default_value = "")]
    pub base: String,

    /// Prefix prepended to every canonical signal name.
    #[arg(long, default_value = "")]
    pub prefix: String,

    /// Suffix appended to every canonical signal name.
    #[arg(long, default_value = "")]
    pub suffix: String,

    /// JSON file with explicit per-signal paths; overrides the composed
    /// names.
    #[arg(long)]
    pub signals: Option<PathBuf>,

    /// Print to stdout instead of piping through a pager.
    #[arg(long)]
    pub no_pager: bool,
}

#[derive(Debug, Args)]
pub struct ApbArgs {
    #[command(flatten)]
    pub bind: BindArgs,

    /// Compose signal names in uppercase.
    #[arg(long)]
    pub uppercase: bool,
}

#[derive(Debug, Args)]
pub struct AxiArgs {
    #[command(flatten)]
    pub bind: BindArgs,

    /// Compose signal names in uppercase.
    #[arg(long)]
    pub uppercase: bool,
}

#[derive(Debug, Args)]
pub struct Ddr5Args {
    #[command(flatten)]
    pub bind: BindArgs,

    /// CK_C edges between a read command and its first data beat.
    #[arg(long, default_value = "46")]
    pub read_latency: usize,

    /// CK_C edges between a write command and its first data beat.
    #[arg(long, default_value = "38")]
    pub write_latency: usize,

    /// Beats per data burst.
    #[arg(long, default_value = "16")]
    pub burst_length: usize,

    /// Skip data burst capture.
    #[arg(long)]
    pub no_data: bool,

    /// Hide the chip identifier of 3DS parts.
    #[arg(long)]
    pub no_cid: bool,

    /// Compose signal names in lowercase; DRAM dumps default to uppercase.
    #[arg(long)]
    pub lowercase: bool,

    /// Append live bank, page and data panels to every line.
    #[arg(long)]
    pub annotate: bool,
}

#[derive(Debug, Args)]
pub struct Hbm2eArgs {
    #[command(flatten)]
    pub bind: BindArgs,

    /// CK_C edges between a read command and its first data beat.
    #[arg(long, default_value = "20")]
    pub read_latency: usize,

    /// CK_C edges between a write command and its first data beat.
    #[arg(long, default_value = "8")]
    pub write_latency: usize,

    /// Beats per data burst.
    #[arg(long, default_value = "4")]
    pub burst_length: usize,

    /// Skip data burst capture.
    #[arg(long)]
    pub no_data: bool,

    /// Treat the DBI signal as unused.
    #[arg(long)]
    pub no_dbi: bool,

    /// Compose signal names in lowercase; DRAM dumps default to uppercase.
    #[arg(long)]
    pub lowercase: bool,

    /// Append live bank, page and data panels to every line.
    #[arg(long)]
    pub annotate: bool,
}

impl Ddr5Args {
    pub fn config(&self) -> buslens_protocols::ddr5::Ddr5Config {
        buslens_protocols::ddr5::Ddr5Config {
            read_latency: self.read_latency,
            write_latency: self.write_latency,
            burst_length: self.burst_length,
            capture_data: !self.no_data,
        }
    }
}

impl Hbm2eArgs {
    pub fn config(&self) -> buslens_protocols::hbm2e::Hbm2eConfig {
        buslens_protocols::hbm2e::Hbm2eConfig {
            read_latency: self.read_latency,
            write_latency: self.write_latency,
            burst_length: self.burst_length,
            enable_data_bus_inversion: !self.no_dbi,
            capture_data: !self.no_data,
        }
    }
}
