//! Build pipeline metadata sourced from the CI environment.

use clap::Args;
use herald_slack::Field;
use serde::{Deserialize, Serialize};

/// Number of commit hash characters shown on a tile.
const SHORT_COMMIT_LEN: usize = 8;

/// Metadata of the running build, as exported by Jenkins.
///
/// Every value is optional; an unset variable renders as a placeholder on
/// the tile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Args, Serialize, Deserialize)]
pub struct PipelineArgs {
    /// Name of the job being built
    #[arg(long = "job-name", env = "JOB_NAME", hide = true)]
    pub job_name: Option<String>,

    /// Number of the current build
    #[arg(long = "build-number", env = "BUILD_NUMBER", hide = true)]
    pub build_number: Option<String>,

    /// Result of the build, if the pipeline exports one
    #[arg(long = "build-status", env = "BUILD_STATUS", hide = true)]
    pub build_status: Option<String>,

    /// Result of the build so far
    #[arg(long = "current-result", env = "CURRENT_RESULT", hide = true)]
    pub current_result: Option<String>,

    /// Branch being built
    #[arg(long = "git-branch", env = "GIT_BRANCH", hide = true)]
    pub git_branch: Option<String>,

    /// Commit being built
    #[arg(long = "git-commit", env = "GIT_COMMIT", hide = true)]
    pub git_commit: Option<String>,

    /// Link to the build page
    #[arg(long = "build-url", env = "BUILD_URL", hide = true)]
    pub build_url: Option<String>,
}

impl PipelineArgs {
    /// Returns the build status reported by the pipeline.
    ///
    /// `BUILD_STATUS` takes precedence over `CURRENT_RESULT`.
    pub fn status(&self) -> Option<&str> {
        non_empty(&self.build_status).or_else(|| non_empty(&self.current_result))
    }

    /// Returns the tile fields in display order.
    ///
    /// `status_override` replaces the status reported by the pipeline.
    pub fn fields(&self, status_override: Option<&str>) -> Vec<Field> {
        let status = status_override.or_else(|| self.status());

        vec![
            field("Job", non_empty(&self.job_name)),
            field("Build", non_empty(&self.build_number).map(|n| format!("#{n}"))),
            field("Status", status),
            field("Branch", non_empty(&self.git_branch)),
            field("Commit", non_empty(&self.git_commit).map(short_commit)),
            field("Link", non_empty(&self.build_url).map(|url| format!("<{url}|Open>"))),
        ]
    }
}

fn field(label: &str, value: Option<impl Into<String>>) -> Field {
    (label.to_owned(), value.map(Into::into))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

fn short_commit(commit: &str) -> &str {
    commit
        .char_indices()
        .nth(SHORT_COMMIT_LEN)
        .map_or(commit, |(end, _)| &commit[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jenkins() -> PipelineArgs {
        PipelineArgs {
            job_name: Some("web-frontend".to_owned()),
            build_number: Some("128".to_owned()),
            build_status: None,
            current_result: Some("SUCCESS".to_owned()),
            git_branch: Some("origin/main".to_owned()),
            git_commit: Some("4f2a9c1d8e7b6a50".to_owned()),
            build_url: Some("https://ci.example.com/job/web/128/".to_owned()),
        }
    }

    #[test]
    fn test_fields_in_display_order() {
        let fields = jenkins().fields(None);
        let labels: Vec<&str> = fields.iter().map(|(label, _)| label.as_str()).collect();
        assert_eq!(labels, ["Job", "Build", "Status", "Branch", "Commit", "Link"]);
    }

    #[test]
    fn test_fields_are_formatted() {
        let fields = jenkins().fields(None);
        let values: Vec<Option<&str>> = fields.iter().map(|(_, value)| value.as_deref()).collect();

        assert_eq!(
            values,
            [
                Some("web-frontend"),
                Some("#128"),
                Some("SUCCESS"),
                Some("origin/main"),
                Some("4f2a9c1d"),
                Some("<https://ci.example.com/job/web/128/|Open>"),
            ]
        );
    }

    #[test]
    fn test_unset_variables_are_absent() {
        let fields = PipelineArgs::default().fields(None);
        assert_eq!(fields.len(), 6);
        assert!(fields.iter().all(|(_, value)| value.is_none()));
    }

    #[test]
    fn test_build_status_precedes_current_result() {
        let mut pipeline = jenkins();
        pipeline.build_status = Some("UNSTABLE".to_owned());
        assert_eq!(pipeline.status(), Some("UNSTABLE"));

        pipeline.build_status = Some(String::new());
        assert_eq!(pipeline.status(), Some("SUCCESS"));
    }

    #[test]
    fn test_status_override() {
        let fields = jenkins().fields(Some("FAILURE"));
        assert_eq!(fields[2].1.as_deref(), Some("FAILURE"));
    }

    #[test]
    fn test_short_commit_keeps_short_hashes() {
        assert_eq!(short_commit("abc"), "abc");
        assert_eq!(short_commit("0123456789"), "01234567");
    }
}
