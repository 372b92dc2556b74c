//! Storage path helpers.

use uuid::Uuid;

/// Heuristic for "this string is an object path, not a URL or free text".
///
/// A storage path is non-empty, is not an absolute `http(s)` URL and has at least two `/`
/// separators (`user/project/file.png`).
pub fn is_storage_path(value: &str) -> bool {
    if value.is_empty() || value.starts_with("http://") || value.starts_with("https://") {
        return false;
    }
    value.matches('/').count() >= 2
}

/// Whether `path` lives under the caller's own prefix (`{user_id}/...`).
/// Paths with `..` segments never count as owned.
pub fn belongs_to_user(path: &str, user_id: &str) -> bool {
    !user_id.is_empty()
        && path.split_once('/').is_some_and(|(owner, rest)| {
            owner == user_id && !rest.is_empty() && !rest.split('/').any(|segment| segment == "..")
        })
}

/// Object path for a generated video: `{user_id}/{project_id}/videos/{video_id}.mp4`.
/// Videos without a project are stored under `unassigned`.
pub fn generated_video_path(user_id: &str, project_id: Option<Uuid>, video_id: Uuid) -> String {
    let project = project_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "unassigned".to_string());
    format!("{}/{}/videos/{}.mp4", user_id, project, video_id)
}
