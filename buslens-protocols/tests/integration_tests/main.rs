use buslens_protocols::annotate::{Annotator, Ddr5BankAnnotator, Ddr5DataAnnotator};
use buslens_protocols::apb::{ApbDecoder, ApbOperation};
use buslens_protocols::axi::{AxiDecoder, AxiSignals, AxiTransaction};
use buslens_protocols::binding::ApbPaths;
use buslens_protocols::ddr5::{Ddr5Command, Ddr5Config, Ddr5Decoder, Ddr5Signals};
use buslens_protocols::hbm2e::{
    Hbm2eColumnCommand, Hbm2eCommand, Hbm2eConfig, Hbm2eDecoder, Hbm2eRowCommand, Hbm2eSignals,
};
use buslens_protocols::merge::{annotated_lines, MergedStream};
use buslens_protocols::render::{visible_text, LineStyle};
use buslens_protocols::Packet;
use buslens_waveform::{SignalCursor, VcdFile};

/// A clock that toggles every `half` time units starting low, so the rising
/// edges land on the even multiples of `half`.
fn toggling_clock(half: u64, until: u64) -> SignalCursor {
    let transitions: Vec<(u64, &str)> = (0u64..)
        .map(|i| (i * half + half, if i % 2 == 0 { "0" } else { "1" }))
        .take_while(|(t, _)| *t <= until)
        .collect();
    SignalCursor::from_transitions(1, &transitions)
}

fn ddr5_signals(
    cs_n: SignalCursor,
    ck_t: SignalCursor,
    ca: SignalCursor,
) -> Ddr5Signals {
    Ddr5Signals {
        ck_t: Some(ck_t),
        ck_c: None,
        cs_n: Some(cs_n),
        ca: Some(ca),
        dqs_t: None,
        dqs_c: None,
        wdqs_t: None,
        wdqs_c: None,
        dq: None,
        cb: None,
    }
}

fn no_data() -> Ddr5Config {
    Ddr5Config {
        capture_data: false,
        ..Ddr5Config::default()
    }
}

#[test]
fn ddr5_activate_decode() {
    // CS_N drops out of idle at 100; CK_T rises at 100, 110, 120, 130.
    let cs_n = SignalCursor::from_transitions(3, &[(0, "b111"), (100, "b110")]);
    let ck_t = SignalCursor::from_transitions(
        1,
        &[
            (95, "0"),
            (100, "1"),
            (105, "0"),
            (110, "1"),
            (115, "0"),
            (120, "1"),
            (125, "0"),
            (130, "1"),
        ],
    );
    let ca = SignalCursor::from_transitions(7, &[(0, "b0000000")]);

    let mut decoder = Ddr5Decoder::new(ddr5_signals(cs_n, ck_t, ca), no_data());
    let command = decoder.next_command().unwrap();
    match &command {
        Ddr5Command::Activate {
            timestamp,
            chip_select,
            chip_id,
            bank_group_address,
            bank_address,
            row_address,
        } => {
            assert_eq!(*timestamp, 120);
            assert_eq!(chip_select.to_decimal(), Some(0));
            assert_eq!(chip_id.to_decimal(), Some(0));
            assert_eq!(bank_group_address.to_decimal(), Some(0));
            assert_eq!(bank_address.to_decimal(), Some(0));
            assert_eq!(row_address.to_decimal(), Some(0));
            assert_eq!(row_address.width(), 18);
        }
        other => panic!("expected Activate, got {other:?}"),
    }
    assert!(decoder.next_command().is_none());
}

#[test]
fn ddr5_unknown_word_is_an_error() {
    let cs_n = SignalCursor::from_transitions(3, &[(0, "b111"), (100, "b110")]);
    let ck_t = SignalCursor::from_transitions(
        1,
        &[
            (95, "0"),
            (100, "1"),
            (105, "0"),
            (110, "1"),
            (115, "0"),
            (120, "1"),
            (125, "0"),
            (130, "1"),
        ],
    );
    let ca = SignalCursor::from_transitions(7, &[(0, "b1111111")]);

    let mut decoder = Ddr5Decoder::new(ddr5_signals(cs_n, ck_t, ca), no_data());
    let command = decoder.next_command().unwrap();
    match &command {
        Ddr5Command::Error { timestamp, .. } => assert_eq!(*timestamp, 100),
        other => panic!("expected Error, got {other:?}"),
    }
}

#[test]
fn ddr5_read_gathers_its_burst() {
    let cs_n = SignalCursor::from_transitions(1, &[(0, "1"), (100, "0"), (140, "1")]);
    let ck_t = SignalCursor::from_transitions(
        1,
        &[
            (95, "0"),
            (100, "1"),
            (105, "0"),
            (110, "1"),
            (115, "0"),
            (120, "1"),
            (125, "0"),
            (130, "1"),
        ],
    );
    // Word 0 encodes RD (not auto-precharge: word 3 bit 3 high), word 2
    // carries column bits.
    let ca = SignalCursor::from_transitions(
        7,
        &[
            (95, "b0011101"),
            (105, "b0000000"),
            (115, "b0000001"),
            (125, "b0001000"),
        ],
    );
    let ck_c = SignalCursor::from_transitions(
        1,
        &[
            (100, "0"),
            (105, "1"),
            (110, "0"),
            (115, "1"),
            (120, "0"),
            (125, "1"),
            (130, "0"),
            (135, "1"),
        ],
    );
    let dqs_t = SignalCursor::from_transitions(
        1,
        &[(0, "0"), (130, "1"), (132, "0"), (134, "1"), (136, "0")],
    );
    let dqs_c = SignalCursor::from_transitions(
        1,
        &[(0, "0"), (132, "1"), (134, "0"), (136, "1"), (138, "0")],
    );
    let dq = SignalCursor::from_transitions(
        4,
        &[
            (0, "b0000"),
            (129, "b0001"),
            (131, "b0010"),
            (133, "b0011"),
            (135, "b0100"),
        ],
    );

    let signals = Ddr5Signals {
        ck_t: Some(ck_t),
        ck_c: Some(ck_c),
        cs_n: Some(cs_n),
        ca: Some(ca),
        dqs_t: Some(dqs_t),
        dqs_c: Some(dqs_c),
        wdqs_t: None,
        wdqs_c: None,
        dq: Some(dq),
        cb: None,
    };
    let config = Ddr5Config {
        read_latency: 2,
        burst_length: 4,
        ..Ddr5Config::default()
    };
    let mut decoder = Ddr5Decoder::new(signals, config);
    let command = decoder.next_command().unwrap();
    match &command {
        Ddr5Command::Read {
            timestamp,
            column_address,
            data,
            ..
        } => {
            assert_eq!(*timestamp, 120);
            assert_eq!(column_address.to_decimal(), Some(16));
            // First beat lands in the least significant nibble.
            assert_eq!(data.as_ref().unwrap().to_hex(), "4321");
        }
        other => panic!("expected Read, got {other:?}"),
    }
}

#[test]
fn ddr5_commands_emit_in_timestamp_order() {
    // Two commands: an Activate at the first CS_N pulse and a PrechargeAll
    // at the second.
    let cs_n = SignalCursor::from_transitions(
        1,
        &[(0, "1"), (100, "0"), (105, "1"), (200, "0"), (205, "1")],
    );
    let transitions: Vec<(u64, &str)> = (19u64..60)
        .map(|i| (i * 5, if i % 2 == 0 { "1" } else { "0" }))
        .collect();
    let ck_t = SignalCursor::from_transitions(1, &transitions);
    let ca = SignalCursor::from_transitions(
        7,
        &[(0, "b0000000"), (195, "b0001011"), (205, "b0000000")],
    );

    let mut decoder = Ddr5Decoder::new(ddr5_signals(cs_n, ck_t, ca), no_data());
    let commands: Vec<Ddr5Command> = decoder.commands().collect();
    assert_eq!(commands.len(), 2);
    assert!(matches!(commands[0], Ddr5Command::Activate { .. }));
    assert!(matches!(commands[1], Ddr5Command::PrechargeAll { .. }));
    assert!(Packet::timestamp(&commands[0]) <= Packet::timestamp(&commands[1]));
}

#[test]
fn hbm2e_refresh_decode() {
    let r = SignalCursor::from_transitions(
        7,
        &[
            (0, "bxxxx111"),
            (50, "b0000100"),
            (53, "b0010000"),
            (57, "bxxxx111"),
        ],
    );
    let ck_t = SignalCursor::from_transitions(
        1,
        &[(45, "0"), (50, "1"), (55, "0"), (60, "1"), (65, "0")],
    );
    let cke = SignalCursor::from_transitions(1, &[(0, "1")]);

    let signals = Hbm2eSignals {
        ck_t: Some(ck_t),
        ck_c: None,
        cke: Some(cke),
        r: Some(r),
        c: None,
        rdqs_t: None,
        rdqs_c: None,
        wdqs_t: None,
        wdqs_c: None,
        dq: None,
        dbi: None,
        dm: None,
        par: None,
        derr: None,
        aerr: None,
    };
    let config = Hbm2eConfig {
        capture_data: false,
        ..Hbm2eConfig::default()
    };
    let mut decoder = Hbm2eDecoder::new(signals, config);
    let command = decoder.next_row_command().unwrap();
    match &command {
        Hbm2eRowCommand::Refresh {
            timestamp,
            pseudo_channel,
            ..
        } => {
            assert_eq!(*timestamp, 50);
            assert_eq!(pseudo_channel.to_decimal(), Some(0));
        }
        other => panic!("expected Refresh, got {other:?}"),
    }
    assert!(decoder.next_row_command().is_none());
}

#[test]
fn hbm2e_activate_row_fields() {
    // Four UIs: w0/w2 on rising edges, w1/w3 on falling edges.
    let r = SignalCursor::from_transitions(
        7,
        &[
            (0, "bxxxx111"),
            (50, "b1000010"),
            (53, "b0101000"),
            (58, "b0000001"),
            (63, "b0000110"),
            (68, "bxxxx111"),
        ],
    );
    let ck_t = SignalCursor::from_transitions(
        1,
        &[
            (45, "0"),
            (50, "1"),
            (55, "0"),
            (60, "1"),
            (65, "0"),
            (70, "1"),
        ],
    );
    let cke = SignalCursor::from_transitions(1, &[(0, "1")]);

    let signals = Hbm2eSignals {
        ck_t: Some(ck_t),
        ck_c: None,
        cke: Some(cke),
        r: Some(r),
        c: None,
        rdqs_t: None,
        rdqs_c: None,
        wdqs_t: None,
        wdqs_c: None,
        dq: None,
        dbi: None,
        dm: None,
        par: None,
        derr: None,
        aerr: None,
    };
    let mut decoder = Hbm2eDecoder::new(
        signals,
        Hbm2eConfig {
            capture_data: false,
            ..Hbm2eConfig::default()
        },
    );
    let command = decoder.next_row_command().unwrap();
    match &command {
        Hbm2eRowCommand::Activate {
            timestamp,
            pseudo_channel,
            stack_id,
            bank_address,
            row_address,
            ..
        } => {
            assert_eq!(*timestamp, 50);
            // w1 = 0101000: PC = bit 3 = 1.
            assert_eq!(pseudo_channel.to_decimal(), Some(1));
            // SID = w1[6] ++ w0[2]: 0 ++ 0.
            assert_eq!(stack_id.to_decimal(), Some(0));
            // BA = w1[5] ++ w0[5:3]: 1 ++ 000.
            assert_eq!(bank_address.to_decimal(), Some(8));
            assert_eq!(row_address.width(), 15);
            // RA = w0[6] ++ w1[4] ++ w1[1:0] ++ w2[5:0] ++ w3[5:3] ++ w3[1:0]
            //    = 1 ++ 0 ++ 00 ++ 000001 ++ 000 ++ 10.
            assert_eq!(row_address.to_decimal(), Some(0b100000000100010));
        }
        other => panic!("expected Activate, got {other:?}"),
    }
}

#[test]
fn hbm2e_write_burst_swaps_and_orders_beats() {
    let c = SignalCursor::from_transitions(
        9,
        &[
            (0, "bxxxxxx111"),
            (98, "b000000001"),
            (103, "b000000010"),
            (107, "bxxxxxx111"),
        ],
    );
    let ck_t = SignalCursor::from_transitions(
        1,
        &[(95, "0"), (100, "1"), (105, "0"), (110, "1"), (115, "0")],
    );
    let ck_c = SignalCursor::from_transitions(
        1,
        &[(100, "0"), (105, "1"), (110, "0"), (115, "1"), (120, "0")],
    );
    let wdqs_t = SignalCursor::from_transitions(
        4,
        &[(0, "b0000"), (120, "b0011"), (122, "b0000")],
    );
    let wdqs_c = SignalCursor::from_transitions(
        4,
        &[(0, "b0000"), (122, "b0011"), (124, "b0000")],
    );
    let beat0 = format!("b{:064b}{:032b}{:032b}", 0u64, 0u32, u32::MAX);
    let beat1 = format!("b{:064b}{:032b}{:032b}", 0u64, 0x11111111u32, 0x22222222u32);
    let dq = SignalCursor::from_transitions(
        128,
        &[(0, beat0.as_str()), (121, beat1.as_str())],
    );

    let signals = Hbm2eSignals {
        ck_t: Some(ck_t),
        ck_c: Some(ck_c),
        cke: None,
        r: None,
        c: Some(c),
        rdqs_t: None,
        rdqs_c: None,
        wdqs_t: Some(wdqs_t),
        wdqs_c: Some(wdqs_c),
        dq: Some(dq),
        dbi: None,
        dm: None,
        par: None,
        derr: None,
        aerr: None,
    };
    let config = Hbm2eConfig {
        write_latency: 2,
        burst_length: 2,
        ..Hbm2eConfig::default()
    };
    let mut decoder = Hbm2eDecoder::new(signals, config);
    let command = decoder.next_column_command().unwrap();
    match &command {
        Hbm2eColumnCommand::Write {
            timestamp,
            pseudo_channel,
            column_address,
            data,
            ..
        } => {
            assert_eq!(*timestamp, 100);
            assert_eq!(pseudo_channel.to_decimal(), Some(0));
            assert_eq!(column_address.to_decimal(), Some(2));
            // Each beat swaps its 32-bit halves, and the first beat is the
            // most significant.
            assert_eq!(
                data.as_ref().unwrap().to_hex(),
                "FFFFFFFF000000002222222211111111"
            );
        }
        other => panic!("expected Write, got {other:?}"),
    }
}

#[test]
fn hbm2e_row_and_column_streams_merge_by_timestamp() {
    let row = vec![
        Hbm2eCommand::Row(Hbm2eRowCommand::Refresh {
            timestamp: 10,
            parity: buslens_waveform::BitString::none(),
            pseudo_channel: buslens_waveform::BitString::none(),
        }),
        Hbm2eCommand::Row(Hbm2eRowCommand::Error { timestamp: 40 }),
    ];
    let column = vec![Hbm2eCommand::Column(Hbm2eColumnCommand::Error {
        timestamp: 25,
    })];
    let merged: Vec<Hbm2eCommand> =
        MergedStream::new(vec![row.into_iter(), column.into_iter()]).collect();
    let timestamps: Vec<u64> = merged.iter().map(Hbm2eCommand::timestamp).collect();
    assert_eq!(timestamps, vec![10, 25, 40]);
}

#[test]
fn apb_pipeline_from_vcd_text() {
    let dump: &[u8] = b"\
$timescale 1 ns $end
$scope module top $end
$scope module apb $end
$var wire 1 ! pclock $end
$var wire 1 \" psel $end
$var wire 1 # penable $end
$var wire 1 $ pready $end
$var wire 8 % paddr $end
$var wire 1 & pwrite $end
$var wire 8 ' pwdata $end
$var wire 8 ( prdata $end
$var wire 1 ) pslverr $end
$upscope $end
$upscope $end
$enddefinitions $end
#5
0!
#10
1!
#15
0!
0#
0$
b00001111 %
1&
b10101010 '
b0 (
0)
1\"
#20
1!
#25
0!
1#
#30
1!
#35
0!
1$
#40
1!
#45
0!
0#
0$
";
    let file = VcdFile::load(dump).unwrap();
    let paths = ApbPaths::generated("top.apb", "", "", false);
    let mut decoder = ApbDecoder::bind(&file, &paths);
    let transactions: Vec<_> = decoder.transactions().collect();
    assert_eq!(transactions.len(), 1);
    let transaction = &transactions[0];
    assert_eq!(transaction.operation, ApbOperation::Write);
    assert_eq!(transaction.timestamp_request, 30);
    assert_eq!(transaction.timestamp_response, 40);
    assert_eq!(transaction.paddr.to_hex(), "0F");
    assert_eq!(transaction.pwdata.to_hex(), "AA");

    let line = transaction.render_line(&LineStyle::apb());
    let visible = visible_text(&line);
    assert!(visible.contains("WRITE"));
    assert!(visible.contains("ADDR 0F"));
}

#[test]
fn axi_merged_stream_orders_writes_and_reads() {
    fn clock() -> Option<SignalCursor> {
        Some(toggling_clock(5, 200))
    }
    fn empty_signals() -> AxiSignals {
        AxiSignals {
            aclock: None,
            awid: None,
            awaddr: None,
            awlen: None,
            awsize: None,
            awburst: None,
            awprot: None,
            awvalid: None,
            awready: None,
            wdata: None,
            wstrb: None,
            wlast: None,
            wvalid: None,
            wready: None,
            bid: None,
            bresp: None,
            bvalid: None,
            bready: None,
            arid: None,
            araddr: None,
            arlen: None,
            arsize: None,
            arburst: None,
            arprot: None,
            arvalid: None,
            arready: None,
            rid: None,
            rresp: None,
            rdata: None,
            rlast: None,
            rvalid: None,
            rready: None,
        }
    }
    fn high() -> Option<SignalCursor> {
        Some(SignalCursor::from_transitions(1, &[(0, "1")]))
    }

    // The write decoder and the read decoder each own their cursors.
    let mut write_signals = empty_signals();
    write_signals.aclock = clock();
    write_signals.awvalid = Some(SignalCursor::from_transitions(
        1,
        &[(0, "0"), (48, "1"), (52, "0")],
    ));
    write_signals.awready = high();
    write_signals.wvalid = Some(SignalCursor::from_transitions(
        1,
        &[(0, "0"), (58, "1"), (62, "0")],
    ));
    write_signals.wready = high();
    write_signals.wdata = Some(SignalCursor::from_transitions(8, &[(0, "b00000001")]));
    write_signals.bvalid = Some(SignalCursor::from_transitions(
        1,
        &[(0, "0"), (68, "1"), (72, "0")],
    ));
    write_signals.bready = high();

    let mut read_signals = empty_signals();
    read_signals.aclock = clock();
    read_signals.arvalid = Some(SignalCursor::from_transitions(
        1,
        &[(0, "0"), (18, "1"), (22, "0")],
    ));
    read_signals.arready = high();
    read_signals.rvalid = Some(SignalCursor::from_transitions(
        1,
        &[(0, "0"), (28, "1"), (32, "0")],
    ));
    read_signals.rready = high();
    read_signals.rdata = Some(SignalCursor::from_transitions(8, &[(0, "b00000010")]));

    let mut write_decoder = AxiDecoder::new(write_signals);
    let mut read_decoder = AxiDecoder::new(read_signals);
    let writes: Vec<AxiTransaction> = write_decoder
        .write_transactions()
        .map(AxiTransaction::Write)
        .collect();
    let reads: Vec<AxiTransaction> = read_decoder
        .read_transactions()
        .map(AxiTransaction::Read)
        .collect();
    let merged: Vec<AxiTransaction> =
        MergedStream::new(vec![writes.into_iter(), reads.into_iter()]).collect();
    assert_eq!(merged.len(), 2);
    assert!(matches!(merged[0], AxiTransaction::Read(_)));
    assert!(matches!(merged[1], AxiTransaction::Write(_)));
    assert!(Packet::timestamp(&merged[0]) < Packet::timestamp(&merged[1]));
}

#[test]
fn annotated_ddr5_lines_carry_the_side_panels() {
    let cs_n = SignalCursor::from_transitions(3, &[(0, "b111"), (100, "b110")]);
    let ck_t = SignalCursor::from_transitions(
        1,
        &[
            (95, "0"),
            (100, "1"),
            (105, "0"),
            (110, "1"),
            (115, "0"),
            (120, "1"),
            (125, "0"),
            (130, "1"),
        ],
    );
    let ca = SignalCursor::from_transitions(7, &[(0, "b0000000")]);
    let mut decoder = Ddr5Decoder::new(ddr5_signals(cs_n, ck_t, ca), no_data());

    let annotators: Vec<Box<dyn Annotator<Ddr5Command>>> = vec![
        Box::new(Ddr5BankAnnotator::default()),
        Box::new(Ddr5DataAnnotator::default()),
    ];
    let lines: Vec<String> =
        annotated_lines(decoder.commands(), annotators, LineStyle::ddr5()).collect();
    assert_eq!(lines.len(), 1);
    let visible = visible_text(&lines[0]);
    assert!(visible.contains("ACT"));
    // Bank 0 of rank 0 is overprinted with the activate glyph.
    assert!(visible.contains('A'));
}
