pub mod event_post;
pub mod publish_post;
pub mod readiness_get;
pub mod register_post;
pub mod request_common;
