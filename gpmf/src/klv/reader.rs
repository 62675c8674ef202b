use bytes::{Buf, Bytes};
use gpmf_common::Result;

use super::{Element, KlvHeader, Metadata, MetadataContext, Value};
use crate::parse::error::{ParseResultExt, WhileDecoding};
use crate::parse::ParseError;
use crate::semantic::{self, SiblingState};

/// The deepest level at which records are decoded. Top-level records are at level 0.
pub const MAX_NESTING_LEVEL: usize = 32;

/// Read every record in `data`, which holds the complete payload of one telemetry chunk.
///
/// Semantic parsers are run on each record as soon as its value is known, so the returned elements carry their
/// final values and metadata.
pub fn read_elements(data: Bytes) -> Result<Vec<Element>, ParseError> {
    let root = MetadataContext::root();
    let (elements, _) = read_level(data, 0, &root)?;
    Ok(elements)
}

/// Read the sibling records in `data`, returning them along with the metadata they declared.
fn read_level(
    mut data: Bytes,
    level: usize,
    parent: &MetadataContext<'_>,
) -> Result<(Vec<Element>, Metadata), ParseError> {
    let mut state = SiblingState::new(parent.child());
    let mut elements = Vec::new();

    while let Some(header) = KlvHeader::parse(&mut data)? {
        let KlvHeader { key, type_code, item_size, item_count } = header;
        log::debug!("{:indent$}{key} {type_code} {item_size}x{item_count}", "", indent = level * 2);

        ensure_attach!(
            data.remaining() >= header.padded_len(),
            ParseError::TruncatedStream,
            format!("{} bytes left for {} byte payload", data.remaining(), header.padded_len()),
            WhileDecoding(key),
        );
        let mut payload = data.split_to(header.padded_len());

        let mut element = if header.is_nested() {
            ensure_attach!(
                level < MAX_NESTING_LEVEL,
                ParseError::InvalidInput,
                format!("records nested deeper than {MAX_NESTING_LEVEL} levels"),
                WhileDecoding(key),
            );
            let (nested, declared) = read_level(payload, level + 1, &state.metadata).while_decoding(key)?;
            Element { metadata: declared, nested, ..Element::new(level, header, Value::Nested) }
        } else {
            payload.truncate(header.payload_len());
            let value = Value::decode(&header, &payload).while_decoding(key)?;
            Element::new(level, header, value)
        };
        semantic::apply(&mut element, &mut state).while_decoding(key)?;
        elements.push(element);
    }
    Ok((elements, state.into_declared()))
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;
    use gpmf_test::klv;

    use super::*;
    use crate::keys;
    use crate::semantic::{Axes, Samples};

    #[test]
    fn nested() {
        let data = klv::nested("DEVC", [
            klv::u32s("DVID", &[1]),
            klv::string("DVNM", "Camera"),
            klv::nested("STRM", [klv::string("STNM", "Accelerometer"), klv::i16s("TMPC", &[42])]),
        ]);
        let elements = read_elements(data.into()).unwrap();
        assert_eq!(elements.len(), 1);

        let devc = &elements[0];
        assert_eq!(devc.level, 0);
        assert_eq!(devc.key(), keys::DEVC);
        assert_eq!(devc.nested.len(), 3);
        assert_eq!(devc.metadata["device_name"], Value::String("Camera".into()));
        assert_eq!(devc.metadata["device_id"], Value::U32(1));

        let strm = &devc.nested[2];
        assert_eq!(strm.level, 1);
        assert_eq!(strm.nested[1].level, 2);
        assert_eq!(strm.metadata["stream_name"], Value::String("Accelerometer".into()));
        assert!(!strm.metadata.contains_key("device_name"));
    }

    #[test]
    fn padding_skipped() {
        let data = [klv::string("DVNM", "Hero"), klv::string("STNM", "GPS"), klv::u32s("TSMP", &[7])].concat();
        let elements = read_elements(data.into()).unwrap();
        assert_eq!(elements.len(), 3);
        assert_eq!(elements[1].value, Value::String("GPS".into()));
        assert_eq!(elements[2].value, Value::U32(7));
    }

    #[test]
    fn scale_applied_once() {
        let data = klv::nested("STRM", [
            klv::i16s("SCAL", &[10]),
            klv::i16s("ACCL", &[30, 20, 10]),
            klv::i16s("GYRO", &[30, 20, 10]),
        ]);
        let elements = read_elements(data.into()).unwrap();
        let strm = &elements[0];
        assert_matches!(&strm.nested[1].value, Value::Samples(Samples::Acceleration(axes)) => {
            assert_eq!(axes[..], [Axes { z: 3.0, x: 2.0, y: 1.0, ..Default::default() }]);
        });
        assert_matches!(&strm.nested[2].value, Value::Samples(Samples::Gyroscope(axes)) => {
            assert_eq!(axes[..], [Axes { z: 30.0, x: 20.0, y: 10.0, ..Default::default() }]);
        });
    }

    #[test]
    fn scale_before_nested() {
        let data = [klv::i16s("SCAL", &[10]), klv::nested("STRM", [])].concat();
        assert_matches!(read_elements(data.into()), Err(err) => {
            assert_matches!(err.get_ref(), ParseError::ScaleTypeMismatch("Nested"));
        });
    }

    #[test]
    fn truncated_payload() {
        let mut data = klv::i16s("ACCL", &[1, 2, 3]);
        data.truncate(data.len() - 1);
        assert_matches!(read_elements(data.into()), Err(err) => {
            assert_matches!(err.get_ref(), ParseError::TruncatedStream);
        });
    }

    #[test]
    fn truncated_nested() {
        let mut data = klv::nested("DEVC", [klv::string("DVNM", "Camera")]);
        data.truncate(data.len() - 4);
        assert_matches!(read_elements(data.into()), Err(err) => {
            assert_matches!(err.get_ref(), ParseError::TruncatedStream);
        });
    }

    #[test]
    fn truncated_header() {
        let data = [klv::u32s("TSMP", &[7]), b"DEVC".to_vec()].concat();
        assert_matches!(read_elements(data.into()), Err(err) => {
            assert_matches!(err.get_ref(), ParseError::TruncatedStream);
        });
    }

    #[test]
    fn string_zero_item_size() {
        let data = klv::record("DVNM", b'c', 0, 2, &[]);
        assert_matches!(read_elements(data.into()), Err(err) => {
            assert_matches!(err.get_ref(), ParseError::InvalidSampleCount { count: 2, width: 0 });
        });
    }

    fn nested_chain(depth: usize) -> Vec<u8> {
        let mut data = klv::u32s("TSMP", &[1]);
        for _ in 0..depth {
            data = klv::nested("DEVC", [data]);
        }
        data
    }

    #[test]
    fn deepest_nesting() {
        let elements = read_elements(nested_chain(MAX_NESTING_LEVEL).into()).unwrap();
        let mut element = &elements[0];
        while let [child] = &element.nested[..] {
            element = child;
        }
        assert_eq!(element.level, MAX_NESTING_LEVEL);
        assert_eq!(element.value, Value::U32(1));
    }

    #[test]
    fn nesting_too_deep() {
        assert_matches!(read_elements(nested_chain(MAX_NESTING_LEVEL + 1).into()), Err(err) => {
            assert_matches!(err.get_ref(), ParseError::InvalidInput);
        });
    }

    #[test]
    fn empty() {
        assert_eq!(read_elements(Bytes::new()).unwrap(), vec![]);
    }
}
