//! `codedoc-repo`: fetching Git repositories and picking the files to document.

pub mod files;
pub mod git;

pub use files::collect_source_files;
pub use git::{checkout_dir, fetch_repository, validate_repo_url};
