use serde::{Deserialize, Serialize};

/// Marker prepended to the encoded JPEG text so clients can drop it straight
/// into an `<img src>`.
pub const IMAGE_PREFIX: &str = "data:image/jpeg;base64,";

/// Pothole case as stored in the `Pothole` collection.
///
/// `threat` and `comment` are carried for document compatibility; no endpoint
/// writes them after creation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(rename = "_id")]
    pub report_id: String,
    pub image: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_by: Option<String>,
    pub resolved: bool,
    pub threat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Validated input for a new report, produced from an [`UploadReportPayload`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
    pub image: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub submitted_by: Option<String>,
}

/// DynamoDB accepts numbers of magnitude 1e-130 up to (not including) 1e126,
/// plus zero.
fn storable(value: f64) -> bool {
    value == 0.0 || (1e-130..1e126).contains(&value.abs())
}

/// Coordinate as it arrives on the wire: a JSON number, or text from a
/// urlencoded form.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum RawCoordinate {
    Number(f64),
    Text(String),
}

impl RawCoordinate {
    /// Finite value or nothing.
    pub fn value(&self) -> Option<f64> {
        let value = match self {
            RawCoordinate::Number(n) => *n,
            RawCoordinate::Text(s) => s.trim().parse().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReportPayload {
    pub image: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<RawCoordinate>,
    pub longitude: Option<RawCoordinate>,
    pub submitted_by: Option<String>,
}

impl UploadReportPayload {
    pub fn into_new_report(self) -> Result<NewReport, &'static str> {
        let image = match self.image {
            Some(image) if !image.is_empty() => image,
            _ => return Err("Image not provided"),
        };

        let latitude = self.latitude.as_ref().and_then(RawCoordinate::value);
        let longitude = self.longitude.as_ref().and_then(RawCoordinate::value);
        let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
            return Err("Latitude and longitude must be numeric");
        };
        if !storable(latitude) || !storable(longitude) {
            return Err("Latitude and longitude out of range");
        }

        Ok(NewReport {
            image,
            latitude,
            longitude,
            address: self.address,
            submitted_by: self.submitted_by,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateImagePayload {
    pub id: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvePayload {
    pub submitted_by: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedByPayload {
    pub submitted_by: Option<String>,
}

/// Prefix `image` with [`IMAGE_PREFIX`] unless it already carries it.
pub fn normalize_image(image: &str) -> String {
    if image.starts_with(IMAGE_PREFIX) {
        image.to_string()
    } else {
        format!("{}{}", IMAGE_PREFIX, image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalize_prefixes_once() {
        assert_eq!(normalize_image("abc"), "data:image/jpeg;base64,abc");
        let prefixed = normalize_image("abc");
        assert_eq!(normalize_image(&prefixed), prefixed);
    }

    #[test]
    fn coordinates_accept_numbers_and_numeric_text() {
        let payload: UploadReportPayload = serde_json::from_value(json!({
            "image": "abc",
            "latitude": 40.7,
            "longitude": " -74.0 ",
        }))
        .unwrap();
        let report = payload.into_new_report().unwrap();
        assert_eq!(report.latitude, 40.7);
        assert_eq!(report.longitude, -74.0);
        assert_eq!(report.address, None);
    }

    #[test]
    fn integer_coordinates_are_accepted() {
        let payload: UploadReportPayload =
            serde_json::from_value(json!({"image": "abc", "latitude": 40, "longitude": -74}))
                .unwrap();
        let report = payload.into_new_report().unwrap();
        assert_eq!((report.latitude, report.longitude), (40.0, -74.0));
    }

    #[test]
    fn missing_or_empty_image_is_rejected() {
        let payload = UploadReportPayload {
            latitude: Some(RawCoordinate::Number(1.0)),
            longitude: Some(RawCoordinate::Number(2.0)),
            ..Default::default()
        };
        assert_eq!(payload.into_new_report(), Err("Image not provided"));

        let payload = UploadReportPayload {
            image: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(payload.into_new_report(), Err("Image not provided"));
    }

    #[test]
    fn non_numeric_or_infinite_coordinates_are_rejected() {
        for latitude in [json!("north"), json!("inf"), json!("NaN"), json!(null)] {
            let payload: UploadReportPayload = serde_json::from_value(json!({
                "image": "abc",
                "latitude": latitude,
                "longitude": 1.5,
            }))
            .unwrap();
            assert_eq!(
                payload.into_new_report(),
                Err("Latitude and longitude must be numeric")
            );
        }
    }

    #[test]
    fn unstorable_magnitudes_are_rejected() {
        for latitude in [1e200, -1e126, 1e-200, 5e-324] {
            let payload = UploadReportPayload {
                image: Some("abc".to_string()),
                latitude: Some(RawCoordinate::Number(latitude)),
                longitude: Some(RawCoordinate::Number(1.5)),
                ..Default::default()
            };
            assert_eq!(
                payload.into_new_report(),
                Err("Latitude and longitude out of range"),
                "latitude {}",
                latitude
            );
        }

        let payload = UploadReportPayload {
            image: Some("abc".to_string()),
            latitude: Some(RawCoordinate::Number(0.0)),
            longitude: Some(RawCoordinate::Text("1e-7".to_string())),
            ..Default::default()
        };
        assert!(payload.into_new_report().is_ok());
    }

    #[test]
    fn report_serializes_with_document_field_names() {
        let report = Report {
            report_id: "r1".to_string(),
            image: normalize_image("abc"),
            latitude: 40.7,
            longitude: -74.0,
            address: Some("5th Ave".to_string()),
            submitted_by: Some("alice".to_string()),
            resolved: false,
            threat: 0,
            comment: None,
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["_id"], "r1");
        assert_eq!(value["submittedBy"], "alice");
        assert_eq!(value["threat"], 0);
        assert_eq!(value["resolved"], false);
        assert!(value.get("comment").is_none());
    }
}
