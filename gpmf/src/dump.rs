//! Diagnostic output of decoded records.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::io;

use serde::Serialize;

use crate::keys;
use crate::klv::{Element, Value};
use crate::parse::FourCC;
use crate::semantic::{GpsDop, Samples};
use crate::walk::{walk, Walk};

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Dump<'a> {
    data: &'a [Element],
}

/// Sample counts and GPS quality collected from decoded records.
#[derive(Clone, Debug, Default)]
pub struct Stats {
    counts: BTreeMap<FourCC, usize>,
    gps: Vec<GpsStats>,
}

/// The quality of one GPS record.
#[derive(Clone, Debug, PartialEq)]
pub struct GpsStats {
    /// The description of the fix, if one was declared.
    pub fix: Option<String>,
    /// The dilution of precision, if one was declared.
    pub dop: Option<GpsDop>,
    /// The number of points in the record.
    pub points: usize,
}

/// Write `elements` as pretty-printed JSON, in the form `{"Data": [...]}`.
pub fn to_writer<W: io::Write>(writer: W, elements: &[Element]) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(writer, &Dump { data: elements })
}

/// Like [`to_writer`], returning a string.
pub fn to_string(elements: &[Element]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&Dump { data: elements })
}

impl Stats {
    /// Empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect stats over every element of `elements` and their children.
    pub fn collect(elements: &[Element]) -> Self {
        let mut stats = Self::new();
        stats.walk(elements);
        stats
    }

    /// Add every element of `elements` and their children.
    pub fn walk(&mut self, elements: &[Element]) {
        let result = walk(elements, &mut |element| self.visit(element));
        result.unwrap_or_else(|never| match never {})
    }

    /// Record one element, as a visitor for [`walk`].
    pub fn visit(&mut self, element: &Element) -> Result<Walk, Infallible> {
        if let Value::Samples(Samples::Gps(points)) = &element.value {
            let fix = element.metadata.get(keys::GPS_FIX_DESCRIPTION).and_then(Value::as_str);
            let dop = match element.metadata_by_key(keys::GPSP) {
                Some(Value::GpsDop(dop)) => Some(*dop),
                _ => None,
            };
            self.gps.push(GpsStats { fix: fix.map(str::to_string), dop, points: points.len() });
        }
        if let Some(count) = element.value.sample_count() {
            *self.counts.entry(element.key()).or_default() += count;
        }
        Ok(Walk::Continue)
    }

    /// The number of samples recorded per key.
    pub fn counts(&self) -> &BTreeMap<FourCC, usize> {
        &self.counts
    }

    /// The GPS records seen, in order.
    pub fn gps(&self) -> &[GpsStats] {
        &self.gps
    }

    /// Print the GPS quality of each GPS record, then `KEY = count` lines sorted by key.
    pub fn results<W: io::Write>(&self, mut writer: W) -> io::Result<()> {
        for GpsStats { fix, dop, points } in &self.gps {
            let fix = fix.as_deref().unwrap_or("unknown");
            match dop {
                Some(dop) => writeln!(writer, "gps: {points} points, fix: {fix}, dop: {dop} {:?}", dop.classes())?,
                None => writeln!(writer, "gps: {points} points, fix: {fix}")?,
            }
        }
        for (key, count) in &self.counts {
            writeln!(writer, "{key} = {count}")?;
        }
        Ok(())
    }
}
