use thiserror::Error;

use super::model::{normalize_image, NewReport, Report};
use crate::store::{DocumentStore, ReportFilter, StoreError};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Pothole not found")]
    NotFound,

    #[error("Only the original submitter can resolve this pothole")]
    NotOwner,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Create a new pending report with a fresh id.
pub async fn create_report(
    store: &dyn DocumentStore,
    new_report: NewReport,
) -> Result<Report, StoreError> {
    let report = Report {
        report_id: uuid::Uuid::new_v4().to_string(),
        image: normalize_image(&new_report.image),
        latitude: new_report.latitude,
        longitude: new_report.longitude,
        address: new_report.address,
        submitted_by: new_report.submitted_by,
        resolved: false,
        threat: 0,
        comment: None,
    };

    store.insert_report(&report).await?;
    Ok(report)
}

/// Replace the image of an existing report.
pub async fn update_report_image(
    store: &dyn DocumentStore,
    report_id: &str,
    image: &str,
) -> Result<Report, ReportError> {
    let mut report = store
        .find_report(report_id)
        .await?
        .ok_or(ReportError::NotFound)?;

    report.image = normalize_image(image);
    store.save_report(&report).await?;
    Ok(report)
}

/// Flip `resolved` to true. With `acting_user` set, only the report's
/// submitter may do so.
pub async fn mark_resolved(
    store: &dyn DocumentStore,
    report_id: &str,
    acting_user: Option<&str>,
) -> Result<Report, ReportError> {
    let mut report = store
        .find_report(report_id)
        .await?
        .ok_or(ReportError::NotFound)?;

    if let Some(user) = acting_user {
        if report.submitted_by.as_deref() != Some(user) {
            return Err(ReportError::NotOwner);
        }
    }

    report.resolved = true;
    store.save_report(&report).await?;
    Ok(report)
}

pub async fn list_reports(
    store: &dyn DocumentStore,
    filter: &ReportFilter,
) -> Result<Vec<Report>, StoreError> {
    store.find_reports(filter).await
}
