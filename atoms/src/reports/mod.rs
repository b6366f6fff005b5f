// Re-export model types and service functions
pub mod model;
pub mod service;
pub mod http;

pub use model::{
    normalize_image, NewReport, RawCoordinate, Report, ResolvePayload, SubmittedByPayload,
    UpdateImagePayload, UploadReportPayload, IMAGE_PREFIX,
};
pub use service::*;
pub use http::*;
