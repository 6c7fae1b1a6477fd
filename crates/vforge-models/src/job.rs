//! Job specifications and derived job kinds.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::{Validate, ValidationError};

use crate::{AspectRatio, Resolution};

/// Kind of work a job requests from the remote API.
///
/// Never stored on the job itself; always derived from the declared
/// references so that the cost estimator and the scheduler can never
/// disagree about a job's kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Text-to-video generation
    Generation,
    /// Animate a still image
    ImageToVideo,
    /// Edit an existing remote video
    Edit,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Generation => "generation",
            JobKind::ImageToVideo => "image_to_video",
            JobKind::Edit => "edit",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single user-declared unit of work.
///
/// Immutable once scheduling begins; per-job fields override the batch
/// defaults where present.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
#[validate(schema(function = validate_references))]
pub struct JobSpec {
    /// Generation prompt (required, non-empty)
    #[validate(length(min = 1, message = "prompt must not be empty"))]
    pub prompt: String,

    /// Output file path; resolved against the output directory when relative
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Model override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Requested clip duration in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = 60))]
    pub duration_seconds: Option<u32>,

    /// Aspect ratio override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<AspectRatio>,

    /// Resolution override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,

    /// Reference image URL (image-to-video)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(url(message = "image_url must be a valid URL"))]
    pub image_url: Option<String>,

    /// Reference image on the local filesystem (image-to-video)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,

    /// Source video URL; presence makes this an edit job
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(url(message = "video_url must be a valid URL"))]
    pub video_url: Option<String>,
}

impl JobSpec {
    /// Minimal spec for a text-to-video job.
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            output: None,
            model: None,
            duration_seconds: None,
            aspect_ratio: None,
            resolution: None,
            image_url: None,
            image_path: None,
            video_url: None,
        }
    }

    /// Whether the job carries an image reference (URL or local path).
    pub fn has_image_reference(&self) -> bool {
        self.image_url.is_some() || self.image_path.is_some()
    }

    /// Classify the job. Priority: source video implies an edit,
    /// otherwise an image reference implies image-to-video, otherwise
    /// plain generation. The video+image combination is rejected during
    /// validation and never reaches this point.
    pub fn kind(&self) -> JobKind {
        if self.video_url.is_some() {
            JobKind::Edit
        } else if self.has_image_reference() {
            JobKind::ImageToVideo
        } else {
            JobKind::Generation
        }
    }
}

/// Cross-field rules that the per-field validators cannot express.
fn validate_references(job: &JobSpec) -> Result<(), ValidationError> {
    if job.prompt.trim().is_empty() {
        return Err(reference_error("empty_prompt", "prompt must not be blank"));
    }
    if job.image_url.is_some() && job.image_path.is_some() {
        return Err(reference_error(
            "conflicting_image_references",
            "image_url and image_path are mutually exclusive",
        ));
    }
    if job.video_url.is_some() && job.has_image_reference() {
        return Err(reference_error(
            "conflicting_references",
            "an edit job (video_url) cannot also carry an image reference",
        ));
    }
    Ok(())
}

fn reference_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_precedence() {
        let gen = JobSpec::from_prompt("a quiet forest");
        assert_eq!(gen.kind(), JobKind::Generation);

        let mut i2v = JobSpec::from_prompt("animate this");
        i2v.image_url = Some("https://example.com/cat.png".to_string());
        assert_eq!(i2v.kind(), JobKind::ImageToVideo);

        let mut i2v_local = JobSpec::from_prompt("animate this");
        i2v_local.image_path = Some("./cat.png".to_string());
        assert_eq!(i2v_local.kind(), JobKind::ImageToVideo);

        let mut edit = JobSpec::from_prompt("make it rain");
        edit.video_url = Some("https://example.com/clip.mp4".to_string());
        assert_eq!(edit.kind(), JobKind::Edit);
    }

    #[test]
    fn test_video_and_image_references_rejected() {
        let mut job = JobSpec::from_prompt("make it rain");
        job.video_url = Some("https://example.com/clip.mp4".to_string());
        job.image_url = Some("https://example.com/cat.png".to_string());
        assert!(job.validate().is_err());
    }

    #[test]
    fn test_both_image_references_rejected() {
        let mut job = JobSpec::from_prompt("animate");
        job.image_url = Some("https://example.com/cat.png".to_string());
        job.image_path = Some("./cat.png".to_string());
        assert!(job.validate().is_err());
    }

    #[test]
    fn test_blank_prompt_rejected() {
        let job = JobSpec::from_prompt("   ");
        assert!(job.validate().is_err());
    }

    #[test]
    fn test_valid_job_passes() {
        let mut job = JobSpec::from_prompt("a quiet forest");
        job.duration_seconds = Some(8);
        assert!(job.validate().is_ok());
    }
}
