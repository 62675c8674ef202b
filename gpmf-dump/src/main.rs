//! Reads a GoPro video from stdin and writes its decoded telemetry tree to stdout as pretty JSON.

use std::io::Read as _;
use std::io::{self, Write as _};

pub fn main() {
    env_logger::builder().filter_level(log::LevelFilter::Info).parse_default_env().init();

    let mut input = Vec::with_capacity(100 * 1024);
    io::stdin().read_to_end(&mut input).expect("can read stdin");

    let elements = gpmf::decode(io::Cursor::new(input)).expect("valid input");
    log::info!("decoded {} top level elements", elements.len());

    let mut stdout = io::stdout().lock();
    gpmf::dump::to_writer(&mut stdout, &elements).expect("can write to stdout");
    writeln!(stdout).expect("can write to stdout");
}
