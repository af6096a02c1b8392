//! Request body parsing. Clients send coordinates either as JSON numbers or
//! as numeric strings, so bodies are read as loose JSON and validated here.

use crate::error::AppError;
use agrisure::models::GeoPoint;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct CropRequest {
    /// Upper-cased crop name
    pub crop_name: String,
    pub point: GeoPoint,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherRiskRequest {
    pub point: GeoPoint,
    pub language: Option<String>,
}

pub fn parse_crop_request(body: &Value) -> Result<CropRequest, AppError> {
    let fields = require_fields(body, &["cropName", "locationLat", "locationLong"])?;

    let crop_name = fields["cropName"]
        .as_str()
        .map(|s| s.trim().to_uppercase())
        .ok_or_else(|| AppError::BadRequest("cropName must be a string".into()))?;

    Ok(CropRequest {
        crop_name,
        point: point(fields)?,
    })
}

pub fn parse_weather_risk_request(body: &Value) -> Result<WeatherRiskRequest, AppError> {
    let fields = require_fields(body, &["locationLat", "locationLong"])?;

    let language = match fields.get("language") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => return Err(AppError::BadRequest("language must be a string".into())),
    };

    Ok(WeatherRiskRequest {
        point: point(fields)?,
        language,
    })
}

fn require_fields<'a>(body: &'a Value, required: &[&str]) -> Result<&'a Map<String, Value>, AppError> {
    let fields = body
        .as_object()
        .ok_or_else(|| AppError::BadRequest("Request body must be a JSON object".into()))?;

    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|name| fields.get(*name).is_none_or(Value::is_null))
        .collect();

    if !missing.is_empty() {
        return Err(AppError::BadRequest(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    Ok(fields)
}

fn point(fields: &Map<String, Value>) -> Result<GeoPoint, AppError> {
    let lat = coordinate(&fields["locationLat"])?;
    let lon = coordinate(&fields["locationLong"])?;
    Ok(GeoPoint::new(lat, lon)?)
}

fn coordinate(value: &Value) -> Result<f64, AppError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| AppError::BadRequest(format!("Invalid numeric input: {}", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_numbers_and_numeric_strings() {
        let req = parse_crop_request(&json!({
            "cropName": "rice",
            "locationLat": "23.2324",
            "locationLong": 87.8615
        }))
        .unwrap();

        assert_eq!(req.crop_name, "RICE");
        assert_eq!(req.point.lat, 23.2324);
        assert_eq!(req.point.lon, 87.8615);
    }

    #[test]
    fn lists_missing_fields_in_order() {
        let err = parse_crop_request(&json!({ "locationLat": 22.5, "locationLong": null }))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required fields: cropName, locationLong"
        );
    }

    #[test]
    fn rejects_non_numeric_coordinates() {
        let err = parse_crop_request(&json!({
            "cropName": "RICE",
            "locationLat": "north",
            "locationLong": 88.0
        }))
        .unwrap_err();
        assert!(err.to_string().starts_with("Invalid numeric input"));
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let err = parse_crop_request(&json!({
            "cropName": "RICE",
            "locationLat": 95,
            "locationLong": 88.0
        }))
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid latitude or longitude values");
    }

    #[test]
    fn language_is_optional() {
        let req = parse_weather_risk_request(&json!({
            "locationLat": 22.57,
            "locationLong": "88.36"
        }))
        .unwrap();
        assert_eq!(req.language, None);

        let req = parse_weather_risk_request(&json!({
            "locationLat": 22.57,
            "locationLong": 88.36,
            "language": "Bengali"
        }))
        .unwrap();
        assert_eq!(req.language.as_deref(), Some("Bengali"));
    }

    #[test]
    fn body_must_be_an_object() {
        assert!(parse_crop_request(&json!([1, 2, 3])).is_err());
    }
}
