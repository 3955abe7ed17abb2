//! GeoJSON rendering of geography literals.

use serde_json::{Value, json};

use crate::ast::{Constant, GeoPoint};

fn position(p: &GeoPoint) -> Value {
    json!([p.longitude, p.latitude])
}

fn positions(points: &[GeoPoint]) -> Value {
    Value::Array(points.iter().map(position).collect())
}

/// GeoJSON object text for a geography constant.
///
/// `None` for other constants and for shapes with no positions: a line
/// without points, or a polygon whose rings are all empty. Empty rings
/// of a polygon are dropped.
pub fn geojson(constant: &Constant) -> Option<String> {
    let value = match constant {
        Constant::GeographyPoint(p) => json!({ "type": "Point", "coordinates": position(p) }),
        Constant::GeographyLineString(points) if !points.is_empty() => {
            json!({ "type": "LineString", "coordinates": positions(points) })
        }
        Constant::GeographyPolygon(rings) => {
            let rings: Vec<Value> = rings
                .iter()
                .filter(|ring| !ring.is_empty())
                .map(|ring| positions(ring))
                .collect();
            if rings.is_empty() {
                return None;
            }
            json!({ "type": "Polygon", "coordinates": rings })
        }
        _ => return None,
    };
    Some(value.to_string())
}
