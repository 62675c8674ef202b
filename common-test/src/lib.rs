use std::fs;
use std::io;
use std::io::Read;
use std::path::Path;

use libflate::gzip;

//
// public types
//

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TestType {
    /// A capture which must decode without error.
    Valid,
    /// A capture which must fail to decode.
    InvalidFail,
}

//
// private types
//

struct TestDirSpec {
    path: &'static str,
    test_type: TestType,
}

macro_rules! test_dir {
    ($name:literal, $test_type:ident) => {
        $crate::TestDirSpec {
            path: concat!(env!("CARGO_MANIFEST_DIR"), "/../test-data/", $name),
            test_type: TestType::$test_type,
        }
    };
}

const TEST_DATA_DIRS: &[TestDirSpec] = &[test_dir!("valid", Valid), test_dir!("invalid-fail", InvalidFail)];

//
// public functions
//

pub fn init_logger() {
    // Ignore errors initializing the logger if tests race to configure it
    let _ignore = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .is_test(true)
        .try_init();
}

/// Run `decode` over every capture ending in `ext` (optionally gzip-compressed) in the `test-data` directories.
///
/// Missing directories are skipped, so the test passes vacuously on checkouts without captures.
pub fn test_data<F: FnMut(TestType, &str, &[u8])>(ext: &str, mut decode: F) {
    init_logger();
    let ext_gz = ext.to_string() + ".gz";
    for dir_spec in TEST_DATA_DIRS {
        let dir_entries = match fs::read_dir(dir_spec.path) {
            Ok(dir_entries) => dir_entries,
            Err(err) => match err.kind() {
                io::ErrorKind::NotFound => continue,
                _ => panic!("could not read test data directory: {err}"),
            },
        };

        for dir_entry in dir_entries.map(Result::unwrap) {
            let file_name = dir_entry.file_name().to_string_lossy().into_owned();
            let data = match &file_name {
                name if name.ends_with(ext) => Some(fs::read(dir_entry.path()).unwrap()),
                name if name.ends_with(&ext_gz) => Some(gunzip(&dir_entry.path())),
                _ => None,
            };
            if let Some(data) = data {
                match dir_spec.test_type {
                    TestType::Valid => log::info!("running test on valid capture: {file_name}"),
                    TestType::InvalidFail => log::info!("running test on invalid capture: {file_name}"),
                }
                decode(dir_spec.test_type, &file_name, &data[..]);
            }
        }
    }
}

//
// private functions
//

fn gunzip(path: &Path) -> Vec<u8> {
    let input = fs::read(path).unwrap();
    let mut decoder = gzip::Decoder::new(&input[..]).unwrap();
    let mut data = Vec::new();
    decoder.read_to_end(&mut data).unwrap();
    data
}
