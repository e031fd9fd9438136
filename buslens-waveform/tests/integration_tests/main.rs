use buslens_waveform::{
    next_handshake, BitString, EdgeKind, EdgePolarity, SignalCursor, VcdFile,
};

const SMALL_DUMP: &[u8] = b"\
$date today $end
$version buslens test $end
$timescale 1 ns $end
$scope module top $end
$scope module dut $end
$var wire 1 ! clk $end
$var wire 8 \" data $end
$var real 64 # temperature $end
$upscope $end
$upscope $end
$enddefinitions $end
#0
0!
b0 \"
#5
1!
b10101010 \"
r25 #
#10
0!
#15
1!
bxxxxzzzz \"
";

#[test]
fn load_and_look_up_signals() {
    let file = VcdFile::load(SMALL_DUMP).unwrap();

    let mut clk = file.get_signal("top.dut.clk").unwrap();
    assert_eq!(clk.width(), 1);
    let rising = EdgeKind::Polarity(EdgePolarity::Rising);
    assert_eq!(clk.next_edge(&rising, true).unwrap().timestamp, 5);
    assert_eq!(clk.next_edge(&rising, true).unwrap().timestamp, 15);
    assert_eq!(clk.next_edge(&rising, true), None);

    let mut data = file.get_signal("top.dut.data").unwrap();
    assert_eq!(data.width(), 8);
    let at_7 = data.value_at(7, false).unwrap();
    assert_eq!(at_7.timestamp, 5);
    assert_eq!(at_7.value.to_hex(), "AA");
    let last = data.value_at(100, false).unwrap();
    assert!(last.value.has_xz());
    assert_eq!(last.value.to_hex(), "xz");

    assert!(file.get_signal("top.dut.nonexistent").is_none());
    assert!(file.get_signal("top.clk").is_none());
}

#[test]
fn real_changes_parse_as_numbers() {
    let file = VcdFile::load(SMALL_DUMP).unwrap();
    let mut temperature = file.get_signal("top.dut.temperature").unwrap();
    let sample = temperature.value_at(5, false).unwrap();
    assert_eq!(sample.value.to_decimal(), Some(25));
}

#[test]
fn vector_padding_uses_declared_width() {
    let file = VcdFile::load(SMALL_DUMP).unwrap();
    let mut data = file.get_signal("top.dut.data").unwrap();
    // `b0` at width 8 pads out to eight zero bits.
    let first = data.value_at(0, false).unwrap();
    assert_eq!(first.value.width(), 8);
    assert_eq!(first.value.to_decimal(), Some(0));
}

#[test]
fn cursors_are_independent() {
    let file = VcdFile::load(SMALL_DUMP).unwrap();
    let mut a = file.get_signal("top.dut.clk").unwrap();
    let b = file.get_signal("top.dut.clk").unwrap();
    let rising = EdgeKind::Polarity(EdgePolarity::Rising);
    a.next_edge(&rising, true);
    assert_eq!(b.position(), 0);
}

#[test]
fn handshake_over_loaded_cursors() {
    let dump: &[u8] = b"\
$timescale 1 ns $end
$scope module top $end
$var wire 1 ! clk $end
$var wire 1 \" valid $end
$var wire 1 # ready $end
$upscope $end
$enddefinitions $end
#0
0!
0\"
1#
#5
1!
#10
0!
#12
1\"
#15
1!
#20
0!
#25
1!
";
    let file = VcdFile::load(dump).unwrap();
    let mut clk = file.get_signal("top.clk").unwrap();
    let mut valid = file.get_signal("top.valid").unwrap();
    let mut ready = file.get_signal("top.ready").unwrap();
    assert_eq!(next_handshake(&mut clk, &mut valid, &mut ready), Some(15));
}

#[test]
fn masked_search_skips_undriven_values() {
    let dump: &[u8] = b"\
$timescale 1 ns $end
$scope module top $end
$var wire 3 ! cs_n $end
$upscope $end
$enddefinitions $end
#0
bxxx !
#10
b111 !
#20
b110 !
#30
b111 !
";
    let file = VcdFile::load(dump).unwrap();
    let mut cs_n = file.get_signal("top.cs_n").unwrap();
    let idle = BitString::ones(3);
    let hit = cs_n.next_edge(&EdgeKind::NotMatches(idle), true).unwrap();
    assert_eq!(hit.timestamp, 20);
}
