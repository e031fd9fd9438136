//! Colorized, column-aligned command lines.
//!
//! A rendered line is a bold timestamp block, an optional context token
//! (e.g. a chip-select tag), the command mnemonic, and a `KEY VALUE`
//! parameter list, padded out to a configured line width. The visible width
//! is tracked while the line is built, so the SGR escape codes never have to
//! be stripped back out.

use buslens_waveform::BitString;

/// ANSI SGR escape codes used by the renderers and annotators.
pub mod color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const FAINT: &str = "\x1b[2m";
    pub const BLINK: &str = "\x1b[5m";

    pub const BLACK: &str = "\x1b[30m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const MAGENTA: &str = "\x1b[35m";
    pub const CYAN: &str = "\x1b[36m";
    pub const WHITE: &str = "\x1b[37m";

    pub const BG_BLACK: &str = "\x1b[40m";
    pub const BG_RED: &str = "\x1b[41m";
    pub const BG_GREEN: &str = "\x1b[42m";
    pub const BG_YELLOW: &str = "\x1b[43m";
    pub const BG_BLUE: &str = "\x1b[44m";
    pub const BG_MAGENTA: &str = "\x1b[45m";
    pub const BG_CYAN: &str = "\x1b[46m";
    pub const BG_WHITE: &str = "\x1b[47m";
}

/// Composite style for ERROR lines: blinking red on black.
pub const ERROR_COLOR: &str = "\x1b[40m\x1b[31m\x1b[5m";

/// Composite style for power-down and self-refresh lines: black on white.
pub const POWER_COLOR: &str = "\x1b[47m\x1b[30m";

/// Column widths for one bus family's rendered lines.
#[derive(Debug, Clone)]
pub struct LineStyle {
    pub timestamp_width: usize,
    pub context_width: usize,
    pub command_width: usize,
    pub value_width: usize,
    pub line_width: usize,
    /// Show the chip identifier parameter of 3DS DRAM parts.
    pub enable_cid: bool,
}

impl Default for LineStyle {
    fn default() -> Self {
        LineStyle {
            timestamp_width: 5,
            context_width: 0,
            command_width: 5,
            value_width: 2,
            line_width: 50,
            enable_cid: true,
        }
    }
}

impl LineStyle {
    pub fn apb() -> LineStyle {
        LineStyle {
            command_width: 5,
            line_width: 72,
            ..LineStyle::default()
        }
    }

    pub fn axi() -> LineStyle {
        LineStyle {
            command_width: 5,
            line_width: 96,
            ..LineStyle::default()
        }
    }

    pub fn ddr5() -> LineStyle {
        LineStyle {
            command_width: 6,
            line_width: 62,
            ..LineStyle::default()
        }
    }

    pub fn hbm2e() -> LineStyle {
        LineStyle {
            command_width: 6,
            line_width: 64,
            ..LineStyle::default()
        }
    }
}

/// A string under construction whose visible length is tracked separately
/// from the escape codes.
struct LineBuilder {
    out: String,
    visible: usize,
}

impl LineBuilder {
    fn new() -> LineBuilder {
        LineBuilder {
            out: String::new(),
            visible: 0,
        }
    }

    fn code(&mut self, code: &str) {
        self.out.push_str(code);
    }

    fn text(&mut self, text: &str) {
        self.visible += text.chars().count();
        self.out.push_str(text);
    }

    fn pad_to(&mut self, width: usize) {
        while self.visible < width {
            self.text(" ");
        }
    }

    fn finish(mut self) -> String {
        self.code(color::RESET);
        self.out
    }
}

/// Formats one decoded command as a colorized line.
pub fn packet_line(
    style: &LineStyle,
    timestamp: u64,
    context: Option<&str>,
    command: &str,
    parameters: &[(&str, String)],
    bus_color: &str,
) -> String {
    let mut line = LineBuilder::new();

    line.code(color::BLACK);
    line.code(color::BG_WHITE);
    line.code(color::BOLD);
    line.text(&format!(
        "[ {:>width$} ]",
        timestamp,
        width = style.timestamp_width
    ));
    line.code(color::RESET);

    if let Some(context) = context {
        line.code(color::WHITE);
        line.code(bus_color);
        line.text(" ");
        line.text(&format!("{:<width$}", context, width = style.context_width));
        line.code(color::RESET);
    }

    line.code(color::BOLD);
    line.code(color::WHITE);
    line.code(bus_color);
    line.text(" ");
    line.text(&format!("{:<width$}", command, width = style.command_width));
    line.text(" ");
    line.code(color::RESET);

    line.code(color::WHITE);
    line.code(bus_color);
    for (key, value) in parameters {
        line.text(key);
        line.text(&format!("{:<width$}", value, width = style.value_width));
        line.text(" ");
    }
    line.pad_to(style.line_width);
    line.finish()
}

/// Hexadecimal parameter value; a dash when the signal was unbound.
pub fn hex_or_dash(value: &BitString) -> String {
    if value.is_none() {
        "-".to_string()
    } else {
        value.to_hex()
    }
}

/// Decimal parameter value; an `X` when undecodable.
pub fn dec_or_x(value: &BitString) -> String {
    match value.to_decimal() {
        Some(value) => value.to_string(),
        None => "X".to_string(),
    }
}

/// Strips SGR escape codes; used by tests and width assertions.
pub fn visible_text(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for code in chars.by_ref() {
                if code == 'm' {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}
