//! Face detection records, whose layout depends on the camera generation.

use bytes::Buf;
use gpmf_common::Result;
use serde::Serialize;

use super::{Samples, SiblingState};
use crate::keys::{self, KeyInfo};
use crate::klv::{Element, Value};
use crate::parse::ParseError;

/// A detected face.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(untagged)]
#[allow(missing_docs)]
pub enum Face {
    Hero6(FaceHero6),
    Hero7(FaceHero7),
    Hero8(FaceHero8),
    Hero10(FaceHero10),
}

/// A face bounding box, with coordinates relative to the frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
#[allow(missing_docs)]
pub struct FaceHero6 {
    /// Identifies the face across samples.
    #[serde(rename = "ID")]
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// A face bounding box with a smile confidence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FaceHero7 {
    /// The bounding box.
    #[serde(flatten)]
    pub face: FaceHero6,
    /// Confidence that the face is smiling.
    pub smile: f32,
}

/// A face bounding box with face and smile confidences.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FaceHero8 {
    /// The bounding box.
    #[serde(flatten)]
    pub face: FaceHero6,
    /// Confidence that the box contains a face.
    pub confidence: f32,
    /// Confidence that the face is smiling.
    pub smile: f32,
}

/// A face bounding box with quantized coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
#[allow(missing_docs)]
pub struct FaceHero10 {
    pub version: u8,
    pub confidence: u8,
    #[serde(rename = "ID")]
    pub id: u16,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub smile: u8,
    pub blink: u8,
}

struct FaceLayout {
    type_def: &'static str,
    size: u8,
    parse: fn(&[u8]) -> Face,
}

const LAYOUTS: [FaceLayout; 4] = [
    FaceLayout { type_def: "Lffff", size: 20, parse: |raw| Face::Hero6(FaceHero6::read(raw)) },
    FaceLayout { type_def: "Lffffffffffffffffffffff", size: 92, parse: FaceHero7::read },
    FaceLayout { type_def: "Lffffff", size: 28, parse: FaceHero8::read },
    FaceLayout { type_def: "BBSSSSSBB", size: 14, parse: FaceHero10::read },
];

/// Offset of the smile confidence in a Hero7 face, after 17 undocumented floats.
const HERO7_SMILE_OFFSET: usize = 88;

/// Parse face detection records using the layout selected by the visible type definition.
pub(crate) fn parse(_: &KeyInfo, element: &mut Element, state: &mut SiblingState<'_>) -> Result<(), ParseError> {
    element.metadata = state.metadata.snapshot();
    if element.header.item_count == 0 {
        element.value = Value::Samples(Samples::Faces(Vec::new()));
        return Ok(());
    }

    // The layout comes from the sticky TYPE declaration, which an earlier sibling or enclosing stream made.
    let type_def = keys::friendly_name(keys::TYPE).and_then(|name| state.metadata.get(name));
    let Some(type_def) = type_def else {
        bail_attach!(ParseError::MissingTypeDefinition);
    };
    let Some(type_def) = type_def.as_str() else {
        bail_attach!(ParseError::UnexpectedValueType(type_def.type_name()), "type definition");
    };
    let Some(layout) = LAYOUTS.iter().find(|layout| layout.type_def == type_def) else {
        bail_attach!(ParseError::UnknownFaceLayout(type_def.to_string()));
    };
    ensure_attach!(
        layout.size == element.header.item_size,
        ParseError::TypeDefinitionSizeMismatch { expected: layout.size, actual: element.header.item_size },
    );
    ensure_matches_attach!(
        &element.value,
        Value::Complex(raw),
        ParseError::UnexpectedValueType(element.value.type_name()),
    );

    let faces = raw.chunks_exact(usize::from(layout.size)).map(layout.parse).collect();
    element.value = Value::Samples(Samples::Faces(faces));
    Ok(())
}

impl FaceHero6 {
    fn read(mut raw: &[u8]) -> Self {
        Self { id: raw.get_u32(), x: raw.get_f32(), y: raw.get_f32(), width: raw.get_f32(), height: raw.get_f32() }
    }
}

impl FaceHero7 {
    fn read(raw: &[u8]) -> Face {
        let face = FaceHero6::read(raw);
        let smile = (&raw[HERO7_SMILE_OFFSET..]).get_f32();
        Face::Hero7(Self { face, smile })
    }
}

impl FaceHero8 {
    fn read(raw: &[u8]) -> Face {
        let face = FaceHero6::read(raw);
        let mut rest = &raw[20..];
        Face::Hero8(Self { face, confidence: rest.get_f32(), smile: rest.get_f32() })
    }
}

impl FaceHero10 {
    fn read(mut raw: &[u8]) -> Face {
        Face::Hero10(Self {
            version: raw.get_u8(),
            confidence: raw.get_u8(),
            id: raw.get_u16(),
            x: raw.get_u16(),
            y: raw.get_u16(),
            width: raw.get_u16(),
            height: raw.get_u16(),
            smile: raw.get_u8(),
            blink: raw.get_u8(),
        })
    }
}
