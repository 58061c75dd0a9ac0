use cimes_shared::models::{Report, ReportCreation, ReportType};

use crate::api::ApiError;
use crate::error::CoreError;
use crate::notice::{Notice, Notices};
use crate::selector::EncodedPoint;

/// Report form contents. The location is not part of the draft; it comes from the
/// selector's encoded point at submit time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportDraft {
    pub title: String,
    pub report_type: Option<ReportType>,
    pub description: String,
}

impl ReportDraft {
    pub fn to_creation(&self, point: &EncodedPoint) -> Result<ReportCreation, CoreError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(CoreError::MissingField("title"));
        }
        let report_type = self.report_type.ok_or(CoreError::MissingField("report type"))?;
        if point.is_empty() {
            return Err(CoreError::MissingField("location"));
        }
        Ok(ReportCreation {
            title: title.to_string(),
            report_type,
            description: self.description.trim().to_string(),
            location: point.as_str().to_string(),
        })
    }
}

/// Turn the backend's answer into the user-facing notice.
pub fn complete(
    result: Result<Report, ApiError>,
    notices: &mut Notices,
) -> Result<Report, CoreError> {
    match result {
        Ok(report) => {
            tracing::info!(id = %report.id, "Report submitted");
            notices.push(Notice::ReportSubmitted);
            Ok(report)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Report submission failed");
            let reason = e.to_string();
            notices.push(Notice::SubmissionFailed(reason.clone()));
            Err(CoreError::SubmissionFailed(reason))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cimes_shared::models::{Coordinate, ReportStatus};
    use uuid::Uuid;

    fn draft() -> ReportDraft {
        ReportDraft {
            title: "Trail Hazard!".to_string(),
            report_type: Some(ReportType::Danger),
            description: "Loose rocks".to_string(),
        }
    }

    fn point() -> EncodedPoint {
        EncodedPoint::from_coordinate(Coordinate::new(45.83211, 6.86557))
    }

    fn stored(creation: ReportCreation) -> Report {
        Report {
            id: Uuid::new_v4(),
            title: creation.title,
            description: creation.description,
            report_type: creation.report_type,
            status: ReportStatus::Active,
            latitude: 45.83211,
            longitude: 6.86557,
            creation_time: "2025-06-01T10:00:00+00:00".to_string(),
            last_updated_time: None,
        }
    }

    #[test]
    fn test_to_creation_uses_encoded_point() {
        let creation = draft().to_creation(&point()).unwrap();
        assert_eq!(creation.location, "POINT(6.86557 45.83211)");
        assert_eq!(creation.title, "Trail Hazard!");
    }

    #[test]
    fn test_missing_fields() {
        let mut blank = draft();
        blank.title = "   ".to_string();
        assert_eq!(blank.to_creation(&point()), Err(CoreError::MissingField("title")));

        let mut untyped = draft();
        untyped.report_type = None;
        assert_eq!(
            untyped.to_creation(&point()),
            Err(CoreError::MissingField("report type"))
        );

        assert_eq!(
            draft().to_creation(&EncodedPoint::empty()),
            Err(CoreError::MissingField("location"))
        );
    }

    #[test]
    fn test_success_pushes_notice() {
        let mut notices = Notices::new();
        let creation = draft().to_creation(&point()).unwrap();

        let report = complete(Ok(stored(creation)), &mut notices).unwrap();
        assert_eq!(report.status, ReportStatus::Active);
        assert_eq!(notices.pop(), Some(Notice::ReportSubmitted));
        assert!(notices.is_empty());
    }

    #[test]
    fn test_backend_rejection_pushes_failure_notice() {
        let mut notices = Notices::new();
        let rejected = Err(ApiError::Status {
            status: 422,
            detail: "Invalid location".to_string(),
        });

        let err = complete(rejected, &mut notices).unwrap_err();
        assert!(matches!(err, CoreError::SubmissionFailed(_)));
        assert!(matches!(
            notices.pop(),
            Some(Notice::SubmissionFailed(reason)) if reason.contains("Invalid location")
        ));
    }
}
