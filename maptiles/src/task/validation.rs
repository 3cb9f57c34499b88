//! Submission validation.
//!
//! Runs before anything is persisted or launched. Bounding-box range checks
//! are delegated to [`crate::coord::tile_count`] so that validation and the
//! geometry layer share one definition of a valid box.

use super::model::TaskSubmission;
use crate::coord::{tile_count, BoundingBox, CoordError, ZoomRange};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use url::Url;

/// Maximum task name length, in characters.
pub const MAX_NAME_CHARS: usize = 63;

/// Maximum URL template length, in characters.
pub const MAX_URL_CHARS: usize = 511;

/// Submission-time zoom bounds (narrower than the geometry layer accepts).
pub const MIN_SUBMIT_ZOOM: i64 = 1;
pub const MAX_SUBMIT_ZOOM: i64 = 25;

/// Placeholders substituted by the worker with zoom, column and row.
pub const URL_PLACEHOLDERS: [&str; 3] = ["{z}", "{x}", "{y}"];

/// Submission field that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    TaskName,
    Url,
    ZoomMin,
    ZoomMax,
    West,
    North,
    East,
    South,
    BoundingBox,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::TaskName => "task_name",
            Field::Url => "url",
            Field::ZoomMin => "zoom_min",
            Field::ZoomMax => "zoom_max",
            Field::West => "west",
            Field::North => "north",
            Field::East => "east",
            Field::South => "south",
            Field::BoundingBox => "bounding_box",
        };
        f.write_str(name)
    }
}

/// A rejected submission, naming the offending field.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: Field,
    pub reason: String,
}

impl ValidationError {
    fn new(field: Field, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// A submission that passed every check, in typed form.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedTask {
    pub name: String,
    pub url_template: String,
    pub bbox: BoundingBox,
    pub zoom: ZoomRange,
    /// Closed-form estimate of the tiles the worker will fetch.
    pub tile_count: u64,
}

/// Checks submissions against the domain constraints.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskValidator;

impl TaskValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validates every field of `submission`.
    ///
    /// Fields are checked in order: name, zoom range, bounding box, URL.
    /// The first failure is returned.
    pub fn validate(&self, submission: &TaskSubmission) -> Result<ValidatedTask, ValidationError> {
        let name = validate_name(&submission.task_name)?;
        let zoom = validate_zoom(submission.zoom_min, submission.zoom_max)?;

        let bbox = BoundingBox::new(
            submission.west,
            submission.north,
            submission.east,
            submission.south,
        );
        let tile_count =
            tile_count(&bbox, zoom).map_err(|e| bbox_error(e, submission))?;

        let url_template = validate_url(&submission.url)?;

        Ok(ValidatedTask {
            name,
            url_template,
            bbox,
            zoom,
            tile_count,
        })
    }
}

fn validate_name(raw: &str) -> Result<String, ValidationError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::new(Field::TaskName, "must not be empty"));
    }
    let chars = name.chars().count();
    if chars > MAX_NAME_CHARS {
        return Err(ValidationError::new(
            Field::TaskName,
            format!("{} characters exceeds the limit of {}", chars, MAX_NAME_CHARS),
        ));
    }
    Ok(name.to_string())
}

fn validate_zoom(min: i64, max: i64) -> Result<ZoomRange, ValidationError> {
    let in_range = MIN_SUBMIT_ZOOM..=MAX_SUBMIT_ZOOM;
    if !in_range.contains(&min) {
        return Err(ValidationError::new(
            Field::ZoomMin,
            format!("{} is outside {}..={}", min, MIN_SUBMIT_ZOOM, MAX_SUBMIT_ZOOM),
        ));
    }
    if !in_range.contains(&max) {
        return Err(ValidationError::new(
            Field::ZoomMax,
            format!("{} is outside {}..={}", max, MIN_SUBMIT_ZOOM, MAX_SUBMIT_ZOOM),
        ));
    }
    if min > max {
        return Err(ValidationError::new(
            Field::ZoomMax,
            format!("zoom_max {} is below zoom_min {}", max, min),
        ));
    }
    // Both fit in u8 after the range checks above
    Ok(ZoomRange::new(min as u8, max as u8))
}

fn bbox_error(error: CoordError, submission: &TaskSubmission) -> ValidationError {
    let field = match &error {
        CoordError::InvalidLongitude(lon) if same_value(*lon, submission.west) => Field::West,
        CoordError::InvalidLongitude(_) => Field::East,
        CoordError::InvalidLatitude(lat) if same_value(*lat, submission.north) => Field::North,
        CoordError::InvalidLatitude(_) => Field::South,
        CoordError::InvalidZoomRange { .. } => Field::ZoomMax,
        CoordError::InvertedBox { .. } => Field::BoundingBox,
    };
    ValidationError::new(field, error.to_string())
}

// Bitwise comparison so NaN inputs are attributed to the right field
fn same_value(a: f64, b: f64) -> bool {
    a.to_bits() == b.to_bits()
}

fn validate_url(raw: &str) -> Result<String, ValidationError> {
    let template = raw.trim();
    let chars = template.chars().count();
    if chars > MAX_URL_CHARS {
        return Err(ValidationError::new(
            Field::Url,
            format!("{} characters exceeds the limit of {}", chars, MAX_URL_CHARS),
        ));
    }

    let missing: Vec<&str> = URL_PLACEHOLDERS
        .iter()
        .copied()
        .filter(|placeholder| !template.contains(placeholder))
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::new(
            Field::Url,
            format!("missing placeholder(s) {}", missing.join(", ")),
        ));
    }

    let concrete = URL_PLACEHOLDERS
        .iter()
        .fold(template.to_string(), |url, placeholder| {
            url.replace(placeholder, "0")
        });
    let parsed = Url::parse(&concrete)
        .map_err(|e| ValidationError::new(Field::Url, format!("not a valid URL: {}", e)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ValidationError::new(
            Field::Url,
            format!("unsupported scheme '{}'", parsed.scheme()),
        ));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(ValidationError::new(Field::Url, "missing host"));
    }

    Ok(template.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission() -> TaskSubmission {
        TaskSubmission {
            task_name: "shenzhen".to_string(),
            url: "https://tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            zoom_min: 12,
            zoom_max: 15,
            west: 114.903983,
            north: 22.677423,
            east: 114.969300,
            south: 22.638533,
        }
    }

    fn field_of(submission: &TaskSubmission) -> Field {
        TaskValidator::new().validate(submission).unwrap_err().field
    }

    #[test]
    fn test_valid_submission() {
        let validated = TaskValidator::new().validate(&submission()).unwrap();
        assert_eq!(validated.name, "shenzhen");
        assert_eq!(validated.zoom, ZoomRange::new(12, 15));
        assert_eq!(validated.tile_count, 57);
    }

    #[test]
    fn test_name_trimmed() {
        let mut s = submission();
        s.task_name = "  harbour  ".to_string();
        assert_eq!(TaskValidator::new().validate(&s).unwrap().name, "harbour");
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut s = submission();
        s.task_name = "   ".to_string();
        assert_eq!(field_of(&s), Field::TaskName);
    }

    #[test]
    fn test_name_length_counts_characters() {
        let mut s = submission();
        s.task_name = "瓦".repeat(MAX_NAME_CHARS);
        assert!(TaskValidator::new().validate(&s).is_ok());

        s.task_name = "a".repeat(MAX_NAME_CHARS + 1);
        assert_eq!(field_of(&s), Field::TaskName);
    }

    #[test]
    fn test_zoom_bounds() {
        let mut s = submission();
        s.zoom_min = 0;
        assert_eq!(field_of(&s), Field::ZoomMin);

        let mut s = submission();
        s.zoom_max = 26;
        assert_eq!(field_of(&s), Field::ZoomMax);

        let mut s = submission();
        s.zoom_min = 16;
        s.zoom_max = 12;
        assert_eq!(field_of(&s), Field::ZoomMax);
    }

    #[test]
    fn test_coordinates_attributed_to_field() {
        let mut s = submission();
        s.west = -180.5;
        assert_eq!(field_of(&s), Field::West);

        let mut s = submission();
        s.east = 190.0;
        assert_eq!(field_of(&s), Field::East);

        let mut s = submission();
        s.north = 86.0;
        assert_eq!(field_of(&s), Field::North);

        let mut s = submission();
        s.south = f64::NAN;
        assert_eq!(field_of(&s), Field::South);
    }

    #[test]
    fn test_inverted_box_rejected() {
        let mut s = submission();
        std::mem::swap(&mut s.north, &mut s.south);
        assert_eq!(field_of(&s), Field::BoundingBox);
    }

    #[test]
    fn test_antimeridian_box_accepted() {
        let mut s = submission();
        s.west = 179.5;
        s.east = -179.5;
        let validated = TaskValidator::new().validate(&s).unwrap();
        assert!(validated.bbox.crosses_antimeridian());
        assert!(validated.tile_count > 0);
    }

    #[test]
    fn test_url_missing_placeholder() {
        let mut s = submission();
        s.url = "https://tile.example.org/{z}/{x}.png".to_string();
        let err = TaskValidator::new().validate(&s).unwrap_err();
        assert_eq!(err.field, Field::Url);
        assert!(err.reason.contains("{y}"));
    }

    #[test]
    fn test_url_syntax_and_scheme() {
        let mut s = submission();
        s.url = "not a url {z}{x}{y}".to_string();
        assert_eq!(field_of(&s), Field::Url);

        s.url = "ftp://tiles.example.org/{z}/{x}/{y}.png".to_string();
        assert_eq!(field_of(&s), Field::Url);
    }

    #[test]
    fn test_url_with_query_placeholders() {
        let mut s = submission();
        s.url = "https://tiles.example.org/img?z={z}&x={x}&y={y}&key=abc".to_string();
        assert!(TaskValidator::new().validate(&s).is_ok());
    }

    #[test]
    fn test_url_length_limit() {
        let mut s = submission();
        let padding = "a".repeat(MAX_URL_CHARS);
        s.url = format!("https://tile.example.org/{{z}}/{{x}}/{{y}}.png?k={}", padding);
        assert_eq!(field_of(&s), Field::Url);
    }

    #[test]
    fn test_error_display_names_field() {
        let mut s = submission();
        s.task_name.clear();
        let err = TaskValidator::new().validate(&s).unwrap_err();
        assert_eq!(err.to_string(), "task_name: must not be empty");
    }
}
