//! Path value interpolation
//!
//! Expands `~`, `$VAR` and `${VAR}` in path-like configuration values.
//! Unset variables leave the value untouched so the failure shows up where
//! the path is used.

use super::model::Config;

/// Expand a single value
///
/// # Examples
///
/// ```
/// use sitebuilder::config::interpolate::interpolate_string;
///
/// std::env::set_var("SB_DOC_ROOT", "/srv");
/// assert_eq!(interpolate_string("$SB_DOC_ROOT/site_repo"), "/srv/site_repo");
/// std::env::remove_var("SB_DOC_ROOT");
/// ```
pub fn interpolate_string(s: &str) -> String {
    match shellexpand::full(s) {
        Ok(expanded) => expanded.into_owned(),
        Err(e) => {
            tracing::warn!("Could not expand config value '{}': {}", s, e);
            s.to_string()
        }
    }
}

/// Interpolate every path-like value in a Config
pub fn interpolate_config(config: &mut Config) {
    config.paths.clone_dir = interpolate_string(&config.paths.clone_dir);
    config.paths.working_dir = interpolate_string(&config.paths.working_dir);
    config.ruby.rvm_script = interpolate_string(&config.ruby.rvm_script);

    if let Some(ref mut dir) = config.node.nvm_dir {
        *dir = interpolate_string(dir);
    }
}
