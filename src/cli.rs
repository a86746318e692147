//! Command-line flags, matching the original driver's getopt-style
//! `-r -f -j -k -l -i -h` surface.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(about = "Cycle-accurate out-of-order superscalar pipeline simulator")]
pub struct CliArgs {
    /// Number of result (common data) buses
    #[arg(short = 'r', default_value_t = 2)]
    pub r: usize,

    /// Instructions fetched per cycle
    #[arg(short = 'f', default_value_t = 4)]
    pub f: usize,

    /// k0 functional-unit pool size
    #[arg(short = 'j', default_value_t = 3)]
    pub k0: usize,

    /// k1 functional-unit pool size
    #[arg(short = 'k', default_value_t = 2)]
    pub k1: usize,

    /// k2 functional-unit pool size
    #[arg(short = 'l', default_value_t = 1)]
    pub k2: usize,

    /// Trace input file; reads standard input if omitted
    #[arg(short = 'i')]
    pub input: Option<std::path::PathBuf>,
}
