//! HTTP client for the remote video-generation API.
//!
//! Submits text-to-video, image-to-video, and edit jobs, polls them to
//! completion, and downloads the finished files. One request at a time;
//! batching and coordination live in `vforge-batch`.

pub mod client;
pub mod error;

pub use client::{
    CompletedVideo, EditRequest, RemoteStatus, StatusResponse, VideoApiClient, VideoApiConfig,
    VideoRequest, DEFAULT_API_BASE_URL,
};
pub use error::{ClientError, ClientResult};
