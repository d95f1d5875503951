pub mod checksum;
pub mod cli;
pub mod constraint;
pub mod eval;
pub mod github;
pub mod licenses;
pub mod maven;
pub mod replace;
pub mod rules;
pub mod starlark;
pub mod version;

pub use cli::Args;
pub use eval::{Declaration, scan_file};
pub use github::{GitHubClient, GitHubResolver};
pub use licenses::LicenseChecker;
pub use maven::MavenClient;
pub use replace::Edit;
pub use rules::Handlers;
pub use version::{Version, VersionSpec};
