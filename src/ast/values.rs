use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A geographic position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self { longitude, latitude }
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.longitude, self.latitude)
    }
}

/// A typed literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constant {
    Null,
    Boolean(bool),
    /// Numeric literal, kept exactly as written (`10`, `-4`, `2.5`, `1e3`)
    Number(String),
    /// Decoded string value (no surrounding quotes, no escaping)
    String(String),
    /// Enum member qualified by its type: `Ns.Type'Member'`
    Enum { type_name: String, member: String },
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
    Guid(Uuid),
    GeographyPoint(GeoPoint),
    GeographyLineString(Vec<GeoPoint>),
    GeographyPolygon(Vec<Vec<GeoPoint>>),
}

impl Constant {
    pub fn string(value: impl Into<String>) -> Self {
        Constant::String(value.into())
    }

    pub fn number(value: impl ToString) -> Self {
        Constant::Number(value.to_string())
    }

    pub fn enum_member(type_name: impl Into<String>, member: impl Into<String>) -> Self {
        Constant::Enum {
            type_name: type_name.into(),
            member: member.into(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Constant::Null)
    }
}

/// Renders the literal the way it appears in an OData query string.
impl std::fmt::Display for Constant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Constant::Null => write!(f, "null"),
            Constant::Boolean(b) => write!(f, "{}", b),
            Constant::Number(n) => write!(f, "{}", n),
            Constant::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Constant::Enum { type_name, member } => write!(f, "{}'{}'", type_name, member),
            Constant::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Constant::DateTime(dt) => {
                write!(f, "{}", dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Constant::Guid(g) => write!(f, "{}", g),
            Constant::GeographyPoint(p) => write!(f, "geography'POINT({})'", p),
            Constant::GeographyLineString(points) => {
                write!(f, "geography'LINESTRING({})'", join_points(points))
            }
            Constant::GeographyPolygon(rings) => {
                let rings: Vec<String> = rings
                    .iter()
                    .map(|ring| format!("({})", join_points(ring)))
                    .collect();
                write!(f, "geography'POLYGON({})'", rings.join(","))
            }
        }
    }
}

fn join_points(points: &[GeoPoint]) -> String {
    points
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
