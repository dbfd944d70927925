//! Geographic point field
//!
//! Copyright (c) 2025 Extra Fields Team
//! Licensed under the Apache-2.0 license

use super::{messages, Field, FieldDeclaration, FieldOptions, FloatField};
use crate::error::{ValidationError, ValidationResult};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::trace;

pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";
pub const SRID: &str = "srid";

/// A point on the globe, in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub latitude: f64,
    pub longitude: f64,
    /// Spatial reference system identifier
    pub srid: Option<u32>,
}

impl Point {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            srid: None,
        }
    }

    pub fn with_srid(mut self, srid: u32) -> Self {
        self.srid = Some(srid);
        self
    }
}

/// Field accepting `{"latitude": .., "longitude": ..}` mappings
///
/// Coordinates may be numbers or numeric strings. A string holding a JSON
/// object is accepted as well (single quotes are tolerated), and an empty
/// string means "no point".
#[derive(Debug, Clone)]
pub struct PointField {
    options: FieldOptions,
    srid: Option<u32>,
    str_points: bool,
    latitude: FloatField,
    longitude: FloatField,
}

impl Default for PointField {
    fn default() -> Self {
        Self {
            options: FieldOptions::nullable(),
            srid: None,
            str_points: false,
            latitude: FloatField::new().min_value(-90.0).max_value(90.0),
            longitude: FloatField::new().min_value(-180.0).max_value(180.0),
        }
    }
}

impl PointField {
    pub fn new() -> Self {
        Self::default()
    }

    /// SRID attached to points that do not carry their own
    pub fn srid(mut self, srid: u32) -> Self {
        self.srid = Some(srid);
        self
    }

    /// Render coordinates as strings
    pub fn str_points(mut self, str_points: bool) -> Self {
        self.str_points = str_points;
        self
    }

    /// The mapping behind `data`, decoding JSON object strings
    fn mapping(data: &Value) -> Option<Map<String, Value>> {
        match data {
            Value::Object(map) => Some(map.clone()),
            Value::String(text) => match serde_json::from_str(&text.replace('\'', "\"")) {
                Ok(Value::Object(map)) => Some(map),
                _ => None,
            },
            _ => None,
        }
    }

    fn parse_srid(&self, data: Option<&Value>) -> ValidationResult<Option<u32>> {
        match data {
            None | Some(Value::Null) => Ok(self.srid),
            Some(value) => value
                .as_u64()
                .and_then(|srid| u32::try_from(srid).ok())
                .map(Some)
                .ok_or_else(|| ValidationError::new(messages::INVALID_INTEGER)),
        }
    }

    fn render_coordinate(&self, child: &FloatField, value: f64) -> Value {
        if self.str_points {
            Value::String(value.to_string())
        } else {
            child.to_representation(&value)
        }
    }
}

impl FieldDeclaration for PointField {
    fn options_mut(&mut self) -> &mut FieldOptions {
        &mut self.options
    }
}

impl Field for PointField {
    type Value = Point;

    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn to_internal_value(&self, data: &Value) -> ValidationResult<Option<Point>> {
        if matches!(data, Value::String(text) if text.is_empty()) {
            return Ok(None);
        }
        let mapping = Self::mapping(data).ok_or_else(|| {
            trace!(kind = messages::json_type_name(data), "point input is not a mapping");
            ValidationError::new(messages::not_a_dict(data))
        })?;

        let mut errors = BTreeMap::new();
        let mut coordinate = |key: &str, child: &FloatField| {
            match child.run_validation(mapping.get(key)) {
                Ok(validated) => validated.into_option(),
                Err(error) => {
                    errors.insert(key.to_string(), error.into_detail());
                    None
                }
            }
        };
        let latitude = coordinate(LATITUDE, &self.latitude);
        let longitude = coordinate(LONGITUDE, &self.longitude);

        let srid = match self.parse_srid(mapping.get(SRID)) {
            Ok(srid) => srid,
            Err(error) => {
                errors.insert(SRID.to_string(), error.into_detail());
                None
            }
        };

        match (latitude, longitude) {
            (Some(latitude), Some(longitude)) if errors.is_empty() => Ok(Some(Point {
                latitude,
                longitude,
                srid,
            })),
            _ => Err(ValidationError::from_map(errors)),
        }
    }

    fn to_representation(&self, value: &Point) -> Value {
        let mut output = Map::new();
        output.insert(
            LATITUDE.to_string(),
            self.render_coordinate(&self.latitude, value.latitude),
        );
        output.insert(
            LONGITUDE.to_string(),
            self.render_coordinate(&self.longitude, value.longitude),
        );
        if let Some(srid) = value.srid {
            output.insert(SRID.to_string(), Value::from(srid));
        }
        Value::Object(output)
    }
}
