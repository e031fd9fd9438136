mod cli;
mod error;
mod pager;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use buslens_protocols::annotate::{
    Annotator, Ddr5BankAnnotator, Ddr5DataAnnotator, Ddr5PageAnnotator, Hbm2eBankAnnotator,
    Hbm2eDataAnnotator, Hbm2ePageAnnotator,
};
use buslens_protocols::apb::ApbDecoder;
use buslens_protocols::axi::{AxiDecoder, AxiTransaction};
use buslens_protocols::binding::{ApbPaths, AxiPaths, Ddr5Paths, Hbm2ePaths};
use buslens_protocols::ddr5::{Ddr5Command, Ddr5Decoder};
use buslens_protocols::hbm2e::{Hbm2eCommand, Hbm2eDecoder};
use buslens_protocols::merge::{annotated_lines, MergedStream};
use buslens_protocols::render::LineStyle;
use buslens_waveform::VcdFile;

use error::Error;

fn main() {
    env_logger::init();

    use clap::Parser;
    let opt = cli::Opt::parse();
    let result = match opt.action {
        cli::Action::Apb(args) => do_apb_action(args),
        cli::Action::Axi(args) => do_axi_action(args),
        cli::Action::Ddr5(args) => do_ddr5_action(args),
        cli::Action::Hbm2e(args) => do_hbm2e_action(args),
    };
    if let Err(err) = result {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn load_vcd(path: &Path) -> Result<VcdFile, Error> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("Could not open file {path:?}: {err}");
            std::process::exit(1)
        }
    };
    match VcdFile::load(BufReader::new(file)) {
        Ok(vcd) => Ok(vcd),
        Err(err) => {
            eprintln!("Could not parse {path:?} as a VCD file: {err}");
            std::process::exit(1)
        }
    }
}

/// Reads an explicit signal map, or composes the paths from the base /
/// prefix / suffix flags.
fn resolve_paths<P>(bind: &cli::BindArgs, generated: impl FnOnce() -> P) -> Result<P, Error>
where
    P: serde::de::DeserializeOwned,
{
    match &bind.signals {
        Some(path) => {
            let file = File::open(path)?;
            serde_json::from_reader(BufReader::new(file)).map_err(|source| Error::SignalMap {
                path: path.clone(),
                source,
            })
        }
        None => Ok(generated()),
    }
}

fn do_apb_action(args: cli::ApbArgs) -> Result<(), Error> {
    let vcd = load_vcd(&args.bind.file)?;
    let bind = &args.bind;
    let paths: ApbPaths = resolve_paths(bind, || {
        ApbPaths::generated(&bind.base, &bind.prefix, &bind.suffix, args.uppercase)
    })?;
    let mut decoder = ApbDecoder::bind(&vcd, &paths);
    let style = LineStyle::apb();
    let lines = annotated_lines(decoder.transactions(), Vec::new(), style);
    pager::display_lines(lines, !args.bind.no_pager)?;
    Ok(())
}

fn do_axi_action(args: cli::AxiArgs) -> Result<(), Error> {
    let vcd = load_vcd(&args.bind.file)?;
    let bind = &args.bind;
    let paths: AxiPaths = resolve_paths(bind, || {
        AxiPaths::generated(&bind.base, &bind.prefix, &bind.suffix, args.uppercase)
    })?;
    // Separate bindings so the write and read walkers never share a cursor.
    let mut write_decoder = AxiDecoder::bind(&vcd, &paths);
    let mut read_decoder = AxiDecoder::bind(&vcd, &paths);
    let writes = write_decoder
        .write_transactions()
        .map(AxiTransaction::Write);
    let reads = read_decoder.read_transactions().map(AxiTransaction::Read);
    let streams: Vec<Box<dyn Iterator<Item = AxiTransaction> + '_>> =
        vec![Box::new(writes), Box::new(reads)];
    let merged = MergedStream::new(streams);
    let lines = annotated_lines(merged, Vec::new(), LineStyle::axi());
    pager::display_lines(lines, !args.bind.no_pager)?;
    Ok(())
}

fn do_ddr5_action(args: cli::Ddr5Args) -> Result<(), Error> {
    let vcd = load_vcd(&args.bind.file)?;
    let bind = &args.bind;
    let paths: Ddr5Paths = resolve_paths(bind, || {
        Ddr5Paths::generated(&bind.base, &bind.prefix, &bind.suffix, !args.lowercase)
    })?;
    let config = args.config();
    let mut decoder = Ddr5Decoder::bind(&vcd, &paths, config);

    let annotators: Vec<Box<dyn Annotator<Ddr5Command>>> = if args.annotate {
        vec![
            Box::new(Ddr5BankAnnotator::default()),
            Box::new(Ddr5PageAnnotator::default()),
            Box::new(Ddr5DataAnnotator::default()),
        ]
    } else {
        Vec::new()
    };
    let style = LineStyle {
        enable_cid: !args.no_cid,
        ..LineStyle::ddr5()
    };
    let lines = annotated_lines(decoder.commands(), annotators, style);
    pager::display_lines(lines, !args.bind.no_pager)?;
    Ok(())
}

fn do_hbm2e_action(args: cli::Hbm2eArgs) -> Result<(), Error> {
    let vcd = load_vcd(&args.bind.file)?;
    let bind = &args.bind;
    let paths: Hbm2ePaths = resolve_paths(bind, || {
        Hbm2ePaths::generated(&bind.base, &bind.prefix, &bind.suffix, !args.lowercase)
    })?;
    let config = args.config();
    // Separate bindings so the row and column walkers never share a cursor.
    let mut row_decoder = Hbm2eDecoder::bind(&vcd, &paths, config.clone());
    let mut column_decoder = Hbm2eDecoder::bind(&vcd, &paths, config);
    let rows = row_decoder.row_commands().map(Hbm2eCommand::Row);
    let columns = column_decoder.column_commands().map(Hbm2eCommand::Column);
    let streams: Vec<Box<dyn Iterator<Item = Hbm2eCommand> + '_>> =
        vec![Box::new(rows), Box::new(columns)];
    let merged = MergedStream::new(streams);

    let annotators: Vec<Box<dyn Annotator<Hbm2eCommand>>> = if args.annotate {
        vec![
            Box::new(Hbm2eBankAnnotator::default()),
            Box::new(Hbm2ePageAnnotator::default()),
            Box::new(Hbm2eDataAnnotator::default()),
        ]
    } else {
        Vec::new()
    };
    let lines = annotated_lines(merged, annotators, LineStyle::hbm2e());
    pager::display_lines(lines, !args.bind.no_pager)?;
    Ok(())
}
