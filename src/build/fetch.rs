//! Shallow clone of the site repository

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::Config;
use crate::error::BuildError;

use super::context::{quote, quote_path, Shell};

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").unwrap());

static BRANCH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.][A-Za-z0-9_./-]*$").unwrap());

/// Which repository and branch to clone
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub owner: String,
    pub repository: String,
    pub branch: String,
    pub token: Option<String>,
}

impl FetchRequest {
    fn validate(&self) -> Result<(), BuildError> {
        let checks = [
            ("owner", &self.owner, &*NAME_RE),
            ("repository", &self.repository, &*NAME_RE),
            ("branch", &self.branch, &*BRANCH_RE),
        ];

        for (field, value, re) in checks {
            if !re.is_match(value) {
                return Err(BuildError::InvalidInput {
                    field: field.to_string(),
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }
}

/// HTTPS clone URL, embedding the token when one is given
pub fn fetch_url(base: &str, owner: &str, repository: &str, token: Option<&str>) -> String {
    match token.filter(|t| !t.is_empty()) {
        Some(token) => format!("https://{}@{}/{}/{}.git", token, base, owner, repository),
        None => format!("https://{}/{}/{}.git", base, owner, repository),
    }
}

/// Clone a single branch at depth 1 into the configured clone directory
///
/// The token never appears in logs or error messages.
pub fn fetch_repo(
    shell: &mut Shell<'_>,
    config: &Config,
    request: &FetchRequest,
) -> Result<(), BuildError> {
    request.validate()?;

    let token = request.token.as_deref().filter(|t| !t.is_empty());
    if let Some(token) = token {
        shell.add_secret(token);
    }

    let url = fetch_url(
        &config.fetch.repo_base_url,
        &request.owner,
        &request.repository,
        token,
    );
    let clone_dir = config.paths.clone_dir();

    tracing::info!(
        "Cloning {}/{} ({}) into {}",
        request.owner,
        request.repository,
        request.branch,
        clone_dir.display()
    );

    shell.run(&format!(
        "git clone -b {} --single-branch --depth 1 {} {}",
        quote(&request.branch),
        quote(&url),
        quote_path(&clone_dir)
    ))?;

    Ok(())
}
