//! Output path resolution.

use std::path::{Component, Path, PathBuf};

use vforge_models::JobSpec;

use crate::error::{BatchError, BatchResult};

/// Resolve where a job's video lands on disk.
///
/// A declared output is used as-is (relative paths join the output
/// directory); without one, the file is named from the 1-based index and
/// a slug of the prompt. Any resolved path that leaves `output_dir` is
/// rejected unless `allow_any_path` is set.
pub fn resolve_output_path(
    job: &JobSpec,
    index: usize,
    output_dir: &Path,
    allow_any_path: bool,
) -> BatchResult<PathBuf> {
    let mut path = match &job.output {
        Some(declared) => {
            let declared = PathBuf::from(declared);
            if declared.is_absolute() {
                declared
            } else {
                output_dir.join(declared)
            }
        }
        None => output_dir.join(format!("{index:03}_{}.mp4", prompt_slug(&job.prompt))),
    };

    if path.extension().and_then(|e| e.to_str()) != Some("mp4") {
        path.set_extension("mp4");
    }

    if !allow_any_path && !normalize(&path).starts_with(normalize(output_dir)) {
        return Err(BatchError::PathEscape(path.display().to_string()));
    }

    Ok(path)
}

/// Filesystem-safe slug from a prompt. Non-ASCII is stripped so names
/// survive every filesystem and URL encoder unchanged.
fn prompt_slug(prompt: &str) -> String {
    let slug: String = prompt
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ' || *c == '-' || *c == '_')
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
        .chars()
        .take(40)
        .collect();
    if slug.is_empty() {
        "video".to_string()
    } else {
        slug
    }
}

/// Lexical normalization: drops `.` and resolves `..` without touching
/// the filesystem (the target usually does not exist yet).
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job_with_output(output: Option<&str>) -> JobSpec {
        let mut job = JobSpec::from_prompt("A Quiet Forest, at dawn!");
        job.output = output.map(String::from);
        job
    }

    #[test]
    fn test_generated_name_uses_index_and_slug() {
        let path =
            resolve_output_path(&job_with_output(None), 7, Path::new("/videos"), false).unwrap();
        assert_eq!(path, Path::new("/videos/007_a_quiet_forest_at_dawn.mp4"));
    }

    #[test]
    fn test_relative_output_joins_output_dir() {
        let path = resolve_output_path(
            &job_with_output(Some("clips/morning.mp4")),
            1,
            Path::new("/videos"),
            false,
        )
        .unwrap();
        assert_eq!(path, Path::new("/videos/clips/morning.mp4"));
    }

    #[test]
    fn test_extension_is_forced_to_mp4() {
        let path = resolve_output_path(
            &job_with_output(Some("clip.mov")),
            1,
            Path::new("/videos"),
            false,
        )
        .unwrap();
        assert_eq!(path, Path::new("/videos/clip.mp4"));
    }

    #[test]
    fn test_absolute_escape_rejected() {
        let err = resolve_output_path(
            &job_with_output(Some("/etc/evil.mp4")),
            1,
            Path::new("/videos"),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, BatchError::PathEscape(_)));
    }

    #[test]
    fn test_relative_escape_rejected() {
        let err = resolve_output_path(
            &job_with_output(Some("../outside.mp4")),
            1,
            Path::new("/videos"),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, BatchError::PathEscape(_)));
    }

    #[test]
    fn test_allow_any_path_overrides_check() {
        let path = resolve_output_path(
            &job_with_output(Some("/elsewhere/clip.mp4")),
            1,
            Path::new("/videos"),
            true,
        )
        .unwrap();
        assert_eq!(path, Path::new("/elsewhere/clip.mp4"));
    }

    #[test]
    fn test_absolute_path_inside_output_dir_allowed() {
        let path = resolve_output_path(
            &job_with_output(Some("/videos/sub/clip.mp4")),
            1,
            Path::new("/videos"),
            false,
        )
        .unwrap();
        assert_eq!(path, Path::new("/videos/sub/clip.mp4"));
    }

    #[test]
    fn test_empty_slug_falls_back() {
        let job = JobSpec::from_prompt("数字");
        let path = resolve_output_path(&job, 2, Path::new("/videos"), false).unwrap();
        assert_eq!(path, Path::new("/videos/002_video.mp4"));
    }
}
