//! The evaluation environment: ruby version, platforms and group filters.

use serde::Serialize;

/// Environment a Gemfile is evaluated against.
///
/// Platforms are derived from the ruby version: `ruby`, `mri`, `ruby_XY`
/// and `mri_XY`, where `XY` concatenates the first two version components
/// (`"2.5.0"` yields `ruby_25`).
#[derive(Clone, Debug, Serialize)]
pub struct Environment {
    ruby_version: String,
    platforms: Vec<String>,
    with_groups: Vec<String>,
    without_groups: Vec<String>,
}

impl Environment {
    pub fn new(ruby_version: &str) -> Self {
        let mut platforms = vec!["ruby".to_string(), "mri".to_string()];
        let short: String = ruby_version.split('.').take(2).collect();
        if !short.is_empty() {
            platforms.push(format!("ruby_{}", short));
            platforms.push(format!("mri_{}", short));
        }
        Self {
            ruby_version: ruby_version.to_string(),
            platforms,
            with_groups: vec!["default".to_string()],
            without_groups: Vec::new(),
        }
    }

    /// Enable a group.
    pub fn with_group(mut self, name: &str) -> Self {
        self.with_groups.push(name.to_string());
        self
    }

    /// Disable a group; disabling beats enabling.
    pub fn without_group(mut self, name: &str) -> Self {
        self.without_groups.push(name.to_string());
        self
    }

    pub fn ruby_version(&self) -> &str {
        &self.ruby_version
    }

    pub fn platforms(&self) -> &[String] {
        &self.platforms
    }

    /// An empty platform list imposes no restriction; otherwise at least one
    /// named platform must be active.
    pub fn match_platform(&self, names: &[String]) -> bool {
        names.is_empty() || names.iter().any(|n| self.platforms.contains(n))
    }

    /// An empty group list behaves as `[default]`. A group list matches when
    /// at least one name is enabled and none is disabled.
    pub fn match_group(&self, names: &[String]) -> bool {
        if names.is_empty() {
            return self.with_groups.iter().any(|g| g == "default");
        }
        let with = names.iter().any(|n| self.with_groups.contains(n));
        let without = names.iter().any(|n| self.without_groups.contains(n));
        with && !without
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn platforms_derive_from_ruby_version() {
        let env = Environment::new("2.5.0");
        assert_eq!(
            env.platforms(),
            &strings(&["ruby", "mri", "ruby_25", "mri_25"])[..]
        );

        let env = Environment::new("3.1.2");
        assert!(env.platforms().contains(&"ruby_31".to_string()));
    }

    #[test]
    fn empty_platform_list_matches() {
        let env = Environment::new("2.5.0");
        assert!(env.match_platform(&[]));
    }

    #[test]
    fn platform_intersection() {
        let env = Environment::new("2.5.0");
        assert!(env.match_platform(&strings(&["mri"])));
        assert!(env.match_platform(&strings(&["jruby", "ruby_25"])));
        assert!(!env.match_platform(&strings(&["jruby", "truffleruby"])));
    }

    #[test]
    fn default_group_is_enabled() {
        let env = Environment::new("2.5.0");
        assert!(env.match_group(&[]));
        assert!(env.match_group(&strings(&["default"])));
        assert!(!env.match_group(&strings(&["test"])));
    }

    #[test]
    fn enabled_and_disabled_groups() {
        let env = Environment::new("2.5.0").with_group("test");
        assert!(env.match_group(&strings(&["test"])));
        assert!(env.match_group(&strings(&["test", "development"])));

        let env = env.without_group("test");
        // disabling beats enabling
        assert!(!env.match_group(&strings(&["test"])));
        assert!(!env.match_group(&strings(&["test", "development"])));
    }
}
