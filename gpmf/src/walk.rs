//! Depth-first traversal of decoded records.

use crate::klv::Element;

/// What a visitor wants done after visiting an element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Walk {
    /// Visit the element's children next.
    Continue,
    /// Skip the element's children.
    Skip,
}

/// Visit every element of `elements` and their children, parents before children.
///
/// An error returned by `visitor` ends the walk.
pub fn walk<E, F>(elements: &[Element], visitor: &mut F) -> Result<(), E>
where
    F: FnMut(&Element) -> Result<Walk, E>,
{
    for element in elements {
        if visitor(element)? == Walk::Continue {
            walk(&element.nested, visitor)?;
        }
    }
    Ok(())
}

/// Like [`walk`], allowing `visitor` to modify each element.
pub fn walk_mut<E, F>(elements: &mut [Element], visitor: &mut F) -> Result<(), E>
where
    F: FnMut(&mut Element) -> Result<Walk, E>,
{
    for element in elements {
        if visitor(element)? == Walk::Continue {
            walk_mut(&mut element.nested, visitor)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use std::convert::Infallible;

    use super::*;
    use crate::keys;
    use crate::klv::{KlvHeader, TypeCode, Value};
    use crate::parse::FourCC;

    fn element(key: &str, nested: Vec<Element>) -> Element {
        let type_code = if nested.is_empty() { TypeCode::U8 } else { TypeCode::Nested };
        let header = KlvHeader { key: FourCC::from_str(key), type_code, item_size: 1, item_count: 1 };
        let value = if nested.is_empty() { Value::U8(0) } else { Value::Nested };
        Element { nested, ..Element::new(0, header, value) }
    }

    fn tree() -> Vec<Element> {
        vec![
            element("DEVC", vec![element("DVID", vec![]), element("STRM", vec![element("ACCL", vec![])])]),
            element("DEVC", vec![element("STRM", vec![element("GYRO", vec![])])]),
        ]
    }

    #[test]
    fn pre_order() {
        let mut seen = Vec::new();
        walk(&tree(), &mut |element| {
            seen.push(element.key().to_string());
            Ok::<_, Infallible>(Walk::Continue)
        })
        .unwrap();
        assert_eq!(seen, ["DEVC", "DVID", "STRM", "ACCL", "DEVC", "STRM", "GYRO"]);
    }

    #[test]
    fn skip() {
        let mut seen = Vec::new();
        walk(&tree(), &mut |element| {
            seen.push(element.key().to_string());
            match element.key() == keys::STRM {
                true => Ok::<_, Infallible>(Walk::Skip),
                false => Ok(Walk::Continue),
            }
        })
        .unwrap();
        assert_eq!(seen, ["DEVC", "DVID", "STRM", "DEVC", "STRM"]);
    }

    #[test]
    fn abort() {
        let mut visited = 0;
        let result = walk(&tree(), &mut |element| {
            visited += 1;
            match element.key() == keys::ACCL {
                true => Err("found"),
                false => Ok(Walk::Continue),
            }
        });
        assert_eq!(result, Err("found"));
        assert_eq!(visited, 4);
    }

    #[test]
    fn modify() {
        let mut elements = tree();
        walk_mut(&mut elements, &mut |element| {
            element.level += 1;
            Ok::<_, Infallible>(Walk::Continue)
        })
        .unwrap();
        assert!(elements.iter().all(|element| element.level == 1));
        assert_eq!(elements[0].nested[1].nested[0].level, 1);
    }
}
