//! Command-line surface: one subcommand per tool.

use clap::{Parser, Subcommand, ValueEnum};
use ghtools_github::{
    GitHubTools, IssueState, ListIssuesOptions, MergeMethod, MergeOptions, NewIssue, NewRelease,
    NewRepository,
};
use ghtools_protocol::OperationResult;
use serde_json::Value;

/// GitHub operations as agent tools.
///
/// Every tool prints a JSON envelope to stdout:
/// `{"successful": true, "data": ...}` or `{"successful": false, "error": ...}`.
/// Logs go to stderr; set `RUST_LOG` to change the level.
#[derive(Debug, Parser)]
#[command(name = "ghtools", version, about)]
pub struct Cli {
    /// Check the token against GitHub before running the tool.
    #[arg(long, global = true)]
    pub validate_token: bool,

    /// Pretty-print the JSON envelope.
    #[arg(long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub tool: Tool,
}

/// The available tools.
#[derive(Debug, Subcommand)]
pub enum Tool {
    /// Fetch a repository.
    GetRepository { owner: String, repo: String },

    /// Create a repository for the authenticated user or an organization.
    CreateRepository {
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        private: bool,
        /// Create an initial commit with an empty README.
        #[arg(long)]
        auto_init: bool,
        /// Create the repository in this organization.
        #[arg(long)]
        org: Option<String>,
    },

    /// List the branches of a repository.
    ListBranches {
        owner: String,
        repo: String,
        #[arg(long, default_value_t = 30)]
        per_page: u8,
    },

    /// Create a branch from another branch or a commit SHA.
    CreateBranch {
        owner: String,
        repo: String,
        branch: String,
        #[arg(long, default_value = "main")]
        from: String,
    },

    /// List the issues of a repository, excluding pull requests.
    ListIssues {
        owner: String,
        repo: String,
        #[arg(long, value_enum, default_value_t = StateArg::Open)]
        state: StateArg,
        /// Only issues with this label; repeat to require several.
        #[arg(long = "label")]
        labels: Vec<String>,
        #[arg(long, default_value_t = 30)]
        per_page: u8,
    },

    /// Open a new issue.
    CreateIssue {
        owner: String,
        repo: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: Option<String>,
        #[arg(long = "label")]
        labels: Vec<String>,
        #[arg(long = "assignee")]
        assignees: Vec<String>,
    },

    /// Fetch a pull request.
    GetPullRequest {
        owner: String,
        repo: String,
        number: u64,
    },

    /// Merge a pull request.
    MergePullRequest {
        owner: String,
        repo: String,
        number: u64,
        #[arg(long, value_enum, default_value_t = MethodArg::Merge)]
        method: MethodArg,
        #[arg(long)]
        commit_title: Option<String>,
        #[arg(long)]
        commit_message: Option<String>,
        /// Only merge if the head is still at this SHA.
        #[arg(long)]
        sha: Option<String>,
    },

    /// Fetch a file or directory listing.
    GetFileContents {
        owner: String,
        repo: String,
        path: String,
        /// Branch, tag, or commit to read from.
        #[arg(long = "ref")]
        reference: Option<String>,
    },

    /// Create a release.
    CreateRelease {
        owner: String,
        repo: String,
        tag_name: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        body: Option<String>,
        /// Branch or commit to tag, if the tag does not exist yet.
        #[arg(long)]
        target: Option<String>,
        #[arg(long)]
        draft: bool,
        #[arg(long)]
        prerelease: bool,
    },

    /// Show GitHub's view of the remaining quota.
    RateLimitStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StateArg {
    Open,
    Closed,
    All,
}

impl From<StateArg> for IssueState {
    fn from(state: StateArg) -> Self {
        match state {
            StateArg::Open => Self::Open,
            StateArg::Closed => Self::Closed,
            StateArg::All => Self::All,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MethodArg {
    Merge,
    Squash,
    Rebase,
}

impl From<MethodArg> for MergeMethod {
    fn from(method: MethodArg) -> Self {
        match method {
            MethodArg::Merge => Self::Merge,
            MethodArg::Squash => Self::Squash,
            MethodArg::Rebase => Self::Rebase,
        }
    }
}

impl Tool {
    /// Runs the tool.
    pub async fn run(self, tools: &GitHubTools) -> OperationResult<Value> {
        match self {
            Self::GetRepository { owner, repo } => tools.get_repository(&owner, &repo).await,
            Self::CreateRepository {
                name,
                description,
                private,
                auto_init,
                org,
            } => {
                let repository = NewRepository {
                    name,
                    description,
                    private,
                    auto_init,
                };
                tools.create_repository(&repository, org.as_deref()).await
            }
            Self::ListBranches {
                owner,
                repo,
                per_page,
            } => tools.list_branches(&owner, &repo, per_page).await,
            Self::CreateBranch {
                owner,
                repo,
                branch,
                from,
            } => tools.create_branch(&owner, &repo, &branch, &from).await,
            Self::ListIssues {
                owner,
                repo,
                state,
                labels,
                per_page,
            } => {
                let options = ListIssuesOptions {
                    state: state.into(),
                    labels,
                    per_page,
                };
                tools.list_issues(&owner, &repo, &options).await
            }
            Self::CreateIssue {
                owner,
                repo,
                title,
                body,
                labels,
                assignees,
            } => {
                let issue = NewIssue {
                    title,
                    body,
                    labels,
                    assignees,
                };
                tools.create_issue(&owner, &repo, &issue).await
            }
            Self::GetPullRequest {
                owner,
                repo,
                number,
            } => tools.get_pull_request(&owner, &repo, number).await,
            Self::MergePullRequest {
                owner,
                repo,
                number,
                method,
                commit_title,
                commit_message,
                sha,
            } => {
                let options = MergeOptions {
                    commit_title,
                    commit_message,
                    sha,
                    merge_method: method.into(),
                };
                tools
                    .merge_pull_request(&owner, &repo, number, &options)
                    .await
            }
            Self::GetFileContents {
                owner,
                repo,
                path,
                reference,
            } => {
                tools
                    .get_file_contents(&owner, &repo, &path, reference.as_deref())
                    .await
            }
            Self::CreateRelease {
                owner,
                repo,
                tag_name,
                name,
                body,
                target,
                draft,
                prerelease,
            } => {
                let release = NewRelease {
                    tag_name,
                    target_commitish: target,
                    name,
                    body,
                    draft,
                    prerelease,
                };
                tools.create_release(&owner, &repo, &release).await
            }
            Self::RateLimitStatus => tools.rate_limit_status().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_list_issues_filters() {
        let cli = Cli::try_parse_from([
            "ghtools",
            "list-issues",
            "rust-lang",
            "rust",
            "--state",
            "closed",
            "--label",
            "bug",
            "--label",
            "P-high",
            "--per-page",
            "5",
        ])
        .unwrap();

        match cli.tool {
            Tool::ListIssues {
                owner,
                state,
                labels,
                per_page,
                ..
            } => {
                assert_eq!(owner, "rust-lang");
                assert_eq!(IssueState::from(state), IssueState::Closed);
                assert_eq!(labels, ["bug", "P-high"]);
                assert_eq!(per_page, 5);
            }
            other => panic!("unexpected tool: {other:?}"),
        }
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["ghtools", "rate-limit-status", "--pretty"]).unwrap();
        assert!(cli.pretty);
        assert!(!cli.validate_token);
        assert!(matches!(cli.tool, Tool::RateLimitStatus));
    }

    #[test]
    fn merge_defaults_to_merge_commit() {
        let cli = Cli::try_parse_from(["ghtools", "merge-pull-request", "o", "r", "12"]).unwrap();
        match cli.tool {
            Tool::MergePullRequest { number, method, .. } => {
                assert_eq!(number, 12);
                assert_eq!(MergeMethod::from(method), MergeMethod::Merge);
            }
            other => panic!("unexpected tool: {other:?}"),
        }
    }

    #[test]
    fn create_branch_defaults_to_main() {
        let cli = Cli::try_parse_from(["ghtools", "create-branch", "o", "r", "feature"]).unwrap();
        assert!(matches!(cli.tool, Tool::CreateBranch { from, .. } if from == "main"));
    }

    #[test]
    fn rejects_non_numeric_pull_request() {
        assert!(Cli::try_parse_from(["ghtools", "get-pull-request", "o", "r", "abc"]).is_err());
    }
}
