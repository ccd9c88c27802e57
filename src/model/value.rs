//! Attribute values: scalars and geometries.
//!
//! A feature is a flat list of named, typed attribute values. Geometry
//! values are first-class because the reconciler treats them specially:
//! equality is exact structural equality over the coordinate sequences
//! (never reference or tolerance-based comparison), and divergent geometry
//! edits get an edit-script merge fallback instead of a plain conflict.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Coord
// ---------------------------------------------------------------------------

/// A 2D coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// The shape class of a [`Geometry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Point => write!(f, "POINT"),
            Self::LineString => write!(f, "LINESTRING"),
            Self::Polygon => write!(f, "POLYGON"),
            Self::MultiPoint => write!(f, "MULTIPOINT"),
            Self::MultiLineString => write!(f, "MULTILINESTRING"),
            Self::MultiPolygon => write!(f, "MULTIPOLYGON"),
        }
    }
}

/// A geometry value: a shape kind plus its coordinate parts.
///
/// `parts` is one coordinate sequence per sub-geometry: a point or line
/// string has a single part, a polygon has one part per ring, and multi
/// geometries have one part per member. Two geometries are equal iff kind,
/// part count, and every coordinate match exactly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub kind: GeometryKind,
    pub parts: Vec<Vec<Coord>>,
}

impl Geometry {
    /// A single point.
    #[must_use]
    pub fn point(x: f64, y: f64) -> Self {
        Self {
            kind: GeometryKind::Point,
            parts: vec![vec![Coord::new(x, y)]],
        }
    }

    /// A line string through the given coordinates.
    #[must_use]
    pub fn line_string(coords: Vec<Coord>) -> Self {
        Self {
            kind: GeometryKind::LineString,
            parts: vec![coords],
        }
    }

    /// A polygon from an outer ring plus optional inner rings.
    #[must_use]
    pub fn polygon(rings: Vec<Vec<Coord>>) -> Self {
        Self {
            kind: GeometryKind::Polygon,
            parts: rings,
        }
    }

    /// Total number of coordinates across all parts.
    #[must_use]
    pub fn coord_count(&self) -> usize {
        self.parts.iter().map(Vec::len).sum()
    }

    /// Exact structural equality (same kind, same parts, same coordinates).
    ///
    /// This is the only geometry comparison the merge engine performs;
    /// topological equivalence of differently-ordered coordinates is
    /// deliberately treated as inequality.
    #[must_use]
    pub fn equals_exact(&self, other: &Self) -> bool {
        self == other
    }
}

impl fmt::Display for Geometry {
    /// WKT-like rendering, used in diff output and log messages.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.kind)?;
        if self.parts.len() == 1 {
            write_part(f, &self.parts[0])
        } else {
            write!(f, "(")?;
            for (i, part) in self.parts.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write_part(f, part)?;
            }
            write!(f, ")")
        }
    }
}

fn write_part(f: &mut fmt::Formatter<'_>, part: &[Coord]) -> fmt::Result {
    write!(f, "(")?;
    for (i, c) in part.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{c}")?;
    }
    write!(f, ")")
}

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// A single attribute value inside a feature.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// The attribute is unset.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Geometry(Geometry),
}

impl Value {
    /// Returns `true` if this value is a geometry.
    #[must_use]
    pub const fn is_geometry(&self) -> bool {
        matches!(self, Self::Geometry(_))
    }

    /// Returns the geometry payload, if any.
    #[must_use]
    pub const fn as_geometry(&self) -> Option<&Geometry> {
        match self {
            Self::Geometry(g) => Some(g),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "<null>"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::Geometry(g) => write!(f, "{g}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<Geometry> for Value {
    fn from(g: Geometry) -> Self {
        Self::Geometry(g)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_equality_is_exact() {
        let a = Geometry::point(1.0, 2.0);
        let b = Geometry::point(1.0, 2.0);
        let c = Geometry::point(1.0, 2.000_000_001);
        assert!(a.equals_exact(&b));
        assert!(!a.equals_exact(&c));
    }

    #[test]
    fn kind_participates_in_equality() {
        let p = Geometry::point(0.0, 0.0);
        let ls = Geometry::line_string(vec![Coord::new(0.0, 0.0)]);
        assert!(!p.equals_exact(&ls));
    }

    #[test]
    fn coord_count_spans_parts() {
        let poly = Geometry::polygon(vec![
            vec![
                Coord::new(0.0, 0.0),
                Coord::new(1.0, 0.0),
                Coord::new(1.0, 1.0),
                Coord::new(0.0, 0.0),
            ],
            vec![
                Coord::new(0.2, 0.2),
                Coord::new(0.4, 0.2),
                Coord::new(0.2, 0.2),
            ],
        ]);
        assert_eq!(poly.coord_count(), 7);
    }

    #[test]
    fn geometry_display_is_wkt_like() {
        let p = Geometry::point(1.0, 2.0);
        assert_eq!(format!("{p}"), "POINT (1 2)");

        let ls = Geometry::line_string(vec![Coord::new(0.0, 0.0), Coord::new(3.0, 4.0)]);
        assert_eq!(format!("{ls}"), "LINESTRING (0 0, 3 4)");
    }

    #[test]
    fn value_geometry_accessors() {
        let v = Value::from(Geometry::point(5.0, 6.0));
        assert!(v.is_geometry());
        assert!(v.as_geometry().is_some());

        let t = Value::from("name");
        assert!(!t.is_geometry());
        assert!(t.as_geometry().is_none());
    }

    #[test]
    fn value_serde_roundtrip() {
        let values = vec![
            Value::Null,
            Value::Bool(true),
            Value::Int(-7),
            Value::Float(2.5),
            Value::from("road"),
            Value::from(Geometry::line_string(vec![
                Coord::new(0.0, 0.0),
                Coord::new(1.0, 1.0),
            ])),
        ];
        for v in values {
            let json = serde_json::to_string(&v).unwrap();
            let decoded: Value = serde_json::from_str(&json).unwrap();
            assert_eq!(decoded, v);
        }
    }
}
