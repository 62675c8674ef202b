//! Scale declarations.

use gpmf_common::Result;

use super::{floats, SiblingState};
use crate::keys::KeyInfo;
use crate::klv::{Element, Value};
use crate::parse::ParseError;

/// The divisors declared for the record which follows a scale declaration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scale {
    divisors: Vec<f64>,
}

/// Parse a scale declaration, handing it to the next sibling.
pub(crate) fn parse(info: &KeyInfo, element: &mut Element, state: &mut SiblingState<'_>) -> Result<(), ParseError> {
    let divisors = floats(&element.value)?;
    element.value = Value::Scale(divisors.clone());
    state.metadata.declare(info.name, element.value.clone());
    state.pending_scale = Some(Scale::new(divisors));
    Ok(())
}

impl Scale {
    /// A scale cycling through `divisors`.
    pub fn new(divisors: Vec<f64>) -> Self {
        Self { divisors }
    }

    /// The divisors, in the order they are applied.
    pub fn divisors(&self) -> &[f64] {
        &self.divisors
    }

    /// Divide the values of `element` by the divisors, cycling through them.
    ///
    /// A scale without divisors converts the values to floats unchanged.
    pub fn apply(&self, element: &mut Element) -> Result<(), ParseError> {
        let Some(values) = element.value.to_float_seq() else {
            bail_attach!(ParseError::ScaleTypeMismatch(element.value.type_name()));
        };
        element.value = Value::Scaled(self.scale(values));
        Ok(())
    }

    fn scale(&self, mut values: Vec<f64>) -> Vec<f64> {
        if self.divisors.is_empty() {
            return values;
        }
        for (value, divisor) in values.iter_mut().zip(self.divisors.iter().cycle()) {
            *value /= divisor;
        }
        values
    }
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;

    use super::*;
    use crate::keys;
    use crate::klv::{KlvHeader, MetadataContext, TypeCode};
    use crate::parse::FourCC;

    fn element(value: Value) -> Element {
        let key = FourCC::from_str("GPS5");
        let header = KlvHeader { key, type_code: TypeCode::I32, item_size: 20, item_count: 1 };
        Element::new(1, header, value)
    }

    #[test]
    fn cyclic() {
        let scale = Scale::new(vec![10.0, 100.0]);
        let mut element = element(Value::I32s(vec![10, 100, 20, 200, 30]));
        scale.apply(&mut element).unwrap();
        assert_eq!(element.value, Value::Scaled(vec![1.0, 1.0, 2.0, 2.0, 3.0]));
    }

    #[test]
    fn longer_than_values() {
        let scale = Scale::new(vec![2.0, 4.0, 8.0]);
        let mut element = element(Value::U16(8));
        scale.apply(&mut element).unwrap();
        assert_eq!(element.value, Value::Scaled(vec![4.0]));
    }

    #[test]
    fn declared_for_next_sibling() {
        let root = MetadataContext::root();
        let mut state = SiblingState::new(root.child());
        let mut element = element(Value::I16s(vec![10, 100]));
        parse(keys::key_info(keys::SCAL).unwrap(), &mut element, &mut state).unwrap();
        assert_eq!(element.value, Value::Scale(vec![10.0, 100.0]));
        assert_eq!(state.pending_scale.as_ref().map(Scale::divisors), Some(&[10.0, 100.0][..]));
        assert_eq!(state.metadata.get("scale"), Some(&Value::Scale(vec![10.0, 100.0])));
    }

    #[test]
    fn empty() {
        let mut element = element(Value::I8s(vec![3, -3]));
        Scale::default().apply(&mut element).unwrap();
        assert_eq!(element.value, Value::Scaled(vec![3.0, -3.0]));
    }

    #[test]
    fn not_numeric() {
        let mut element = element(Value::String("m/s".into()));
        assert_matches!(Scale::new(vec![1.0]).apply(&mut element), Err(err) => {
            assert_matches!(err.get_ref(), ParseError::ScaleTypeMismatch("String"));
        });
    }
}
