//! The requirement model a Gemfile evaluates into.

use std::path::PathBuf;

use serde::Serialize;

use crate::env::Environment;
use crate::value::GemValue;

/// A `gemspec` requirement, recorded with the directory it was declared in.
#[derive(Clone, Debug, Serialize)]
pub struct Gemspec {
    pub dir: PathBuf,
}

/// The result of evaluating a Gemfile.
#[derive(Debug, Default, Serialize)]
pub struct Gemfile {
    pub source: Option<String>,
    pub gems: Vec<Gem>,
    pub gemspecs: Vec<Gemspec>,
}

impl Gemfile {
    /// Gems that survived the environment's group and platform filters.
    pub fn active_gems(&self) -> impl Iterator<Item = &Gem> {
        self.gems.iter().filter(|g| !g.ignore)
    }

    pub fn gem(&self, name: &str) -> Option<&Gem> {
        self.gems.iter().find(|g| g.name == name)
    }
}

/// One `gem` declaration.
#[derive(Debug, Default, Serialize)]
pub struct Gem {
    pub name: String,
    /// Version-spec strings following the name, in order.
    pub requirements: Vec<String>,
    /// Keyword arguments in declaration order.
    pub ivars: Vec<(String, GemValue)>,
    /// Set when the environment filters this gem out.
    pub ignore: bool,
}

impl Gem {
    /// The first string argument names the gem; later ones are version
    /// requirements.
    pub(crate) fn add_argument(&mut self, value: String) {
        if self.name.is_empty() {
            self.name = value;
        } else {
            self.requirements.push(value);
        }
    }

    pub(crate) fn set_ivar(&mut self, name: String, value: GemValue) {
        if let Some(entry) = self.ivars.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = value;
        } else {
            self.ivars.push((name, value));
        }
    }

    pub fn ivar(&self, name: &str) -> Option<&GemValue> {
        self.ivars
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    fn collect_strings(&self, names: &[&str]) -> Vec<String> {
        let mut out = Vec::new();
        for name in names {
            if let Some(value) = self.ivar(name) {
                value.push_strings(&mut out);
            }
        }
        out
    }

    /// Apply the environment's platform and group filters; either can only
    /// turn `ignore` on, never off.
    pub(crate) fn apply_environment(&mut self, env: &Environment) {
        let platforms = self.collect_strings(&["platform", "platforms"]);
        if !env.match_platform(&platforms) {
            tracing::debug!(gem = %self.name, "platform is set but does not match");
            self.ignore = true;
        }

        let groups = self.collect_strings(&["group", "groups"]);
        if !env.match_group(&groups) {
            tracing::debug!(gem = %self.name, "groups do not match the environment");
            self.ignore = true;
        }
    }
}
