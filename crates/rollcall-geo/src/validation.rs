use rollcall_core::error::{AttendanceError, Result};
use rollcall_core::models::Coordinates;

/// Parse one hand-typed coordinate component
pub fn parse_coordinate(field: &str, input: &str) -> Result<f64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AttendanceError::validation(field, "is required"));
    }

    let value = trimmed
        .parse::<f64>()
        .map_err(|_| AttendanceError::validation(field, format!("'{}' is not a number", trimmed)))?;

    if !value.is_finite() {
        return Err(AttendanceError::validation(field, "must be a finite number"));
    }

    Ok(value)
}

/// Parse and range-check a hand-typed latitude/longitude pair
pub fn parse_manual_coordinates(latitude: &str, longitude: &str) -> Result<Coordinates> {
    let lat = parse_coordinate("latitude", latitude)?;
    let lon = parse_coordinate("longitude", longitude)?;
    Coordinates::new(lat, lon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parses_trimmed_values() {
        let coords = parse_manual_coordinates(" 12.97 ", "77.59").unwrap();
        assert_eq!(coords.latitude(), 12.97);
        assert_eq!(coords.longitude(), 77.59);
    }

    #[test]
    fn test_empty_input_rejected() {
        let err = parse_manual_coordinates("", "77.59").unwrap_err();
        assert_eq!(err.to_string(), "Invalid latitude: is required");
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(parse_manual_coordinates("12.9N", "77.59").is_err());
        assert!(parse_manual_coordinates("12.97", "east").is_err());
        assert!(parse_manual_coordinates("NaN", "77.59").is_err());
        assert!(parse_manual_coordinates("12.97", "inf").is_err());
    }

    proptest! {
        #[test]
        fn prop_in_range_pairs_accepted(lat in -90.0f64..=90.0, lon in -180.0f64..=180.0) {
            let coords = parse_manual_coordinates(&lat.to_string(), &lon.to_string()).unwrap();
            prop_assert_eq!(coords.latitude(), lat);
            prop_assert_eq!(coords.longitude(), lon);
        }

        #[test]
        fn prop_out_of_range_latitude_rejected(
            lat in prop_oneof![-1.0e6f64..-90.0001, 90.0001f64..1.0e6],
            lon in -180.0f64..=180.0,
        ) {
            let err = parse_manual_coordinates(&lat.to_string(), &lon.to_string()).unwrap_err();
            let is_latitude_error =
                matches!(err, AttendanceError::Validation { ref field, .. } if field == "latitude");
            prop_assert!(is_latitude_error);
        }

        #[test]
        fn prop_out_of_range_longitude_rejected(
            lat in -90.0f64..=90.0,
            lon in prop_oneof![-1.0e6f64..-180.0001, 180.0001f64..1.0e6],
        ) {
            let err = parse_manual_coordinates(&lat.to_string(), &lon.to_string()).unwrap_err();
            let is_longitude_error =
                matches!(err, AttendanceError::Validation { ref field, .. } if field == "longitude");
            prop_assert!(is_longitude_error);
        }
    }
}
