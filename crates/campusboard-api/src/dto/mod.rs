//! Request and response DTOs.

pub mod request;
pub mod response;

pub use request::{CreateCommentRequest, CreateNoticeRequest, UpdateCommentRequest, UpdateNoticeRequest};
pub use response::{
    ApiResponse, CountResponse, DetailedHealthResponse, HealthResponse, MessageResponse,
    NotificationListResponse,
};
