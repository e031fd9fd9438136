//! Signal-path records for each bus family.
//!
//! A record holds one dotted VCD path per canonical protocol signal. It can
//! be written out explicitly (the records deserialize from JSON signal-map
//! files) or composed from a base path plus optional prefix/suffix and an
//! uppercase flag, in which case every path is
//! `{base}.{prefix}{cased canonical name}{suffix}`.

use serde_derive::{Deserialize, Serialize};

fn change_case(name: &str, uppercase: bool) -> String {
    if uppercase {
        name.to_uppercase()
    } else {
        name.to_lowercase()
    }
}

fn compose(base: &str, prefix: &str, name: &str, suffix: &str, uppercase: bool) -> String {
    format!("{base}.{prefix}{}{suffix}", change_case(name, uppercase))
}

macro_rules! paths_record {
    ($(#[$doc:meta])* $record:ident, [$($field:ident => $canonical:expr),+ $(,)?]) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct $record {
            $(pub $field: String,)+
        }

        impl Default for $record {
            fn default() -> Self {
                Self {
                    $($field: $canonical.to_string(),)+
                }
            }
        }

        impl $record {
            /// Composes every path from a common base, in the canonical
            /// casing of this bus unless `uppercase` overrides it.
            pub fn generated(base: &str, prefix: &str, suffix: &str, uppercase: bool) -> Self {
                Self {
                    $($field: compose(base, prefix, $canonical, suffix, uppercase),)+
                }
            }
        }
    };
}

paths_record!(
    /// APB requester signals.
    ApbPaths,
    [
        pclock => "pclock",
        psel => "psel",
        penable => "penable",
        pready => "pready",
        paddr => "paddr",
        pprot => "pprot",
        pnse => "pnse",
        pwrite => "pwrite",
        pstrb => "pstrb",
        pwdata => "pwdata",
        prdata => "prdata",
        pslverr => "pslverr",
    ]
);

paths_record!(
    /// AXI signals across the five channels.
    AxiPaths,
    [
        aclock => "aclock",
        awid => "awid",
        awaddr => "awaddr",
        awlen => "awlen",
        awsize => "awsize",
        awburst => "awburst",
        awprot => "awprot",
        awvalid => "awvalid",
        awready => "awready",
        wdata => "wdata",
        wstrb => "wstrb",
        wlast => "wlast",
        wvalid => "wvalid",
        wready => "wready",
        bid => "bid",
        bresp => "bresp",
        bvalid => "bvalid",
        bready => "bready",
        arid => "arid",
        araddr => "araddr",
        arlen => "arlen",
        arsize => "arsize",
        arburst => "arburst",
        arprot => "arprot",
        arvalid => "arvalid",
        arready => "arready",
        rid => "rid",
        rresp => "rresp",
        rdata => "rdata",
        rlast => "rlast",
        rvalid => "rvalid",
        rready => "rready",
    ]
);

paths_record!(
    /// DDR5 channel signals. The write strobes are bound explicitly; by
    /// default they point at the same nets as the read strobes, since the
    /// strobe pins are bidirectional.
    Ddr5Paths,
    [
        ck_t => "CK_T",
        ck_c => "CK_C",
        cs_n => "CS_N",
        ca => "CA",
        dqs_t => "DQS_T",
        dqs_c => "DQS_C",
        wdqs_t => "DQS_T",
        wdqs_c => "DQS_C",
        dq => "DQ",
        cb => "CB",
    ]
);

paths_record!(
    /// HBM2e channel signals.
    Hbm2ePaths,
    [
        ck_t => "CK_T",
        ck_c => "CK_C",
        cke => "CKE",
        r => "R",
        c => "C",
        rdqs_t => "RDQS_T",
        rdqs_c => "RDQS_C",
        wdqs_t => "WDQS_T",
        wdqs_c => "WDQS_C",
        dq => "DQ",
        dbi => "DBI",
        dm => "DM",
        par => "PAR",
        derr => "DERR",
        aerr => "AERR",
    ]
);
