//! The build driver.
//!
//! A [`Builder`] owns a rule set, a tag store, and a registry of per-pattern
//! environment stores. Building a target walks the dependency closure in
//! order, skips anything already tagged, and runs each remaining rule's
//! action with an environment composed for that rule's label. The
//! environment is a value handed to the action; nothing process-global is
//! touched.
//!
//! One builder, one thread: two builders (or two processes) pointed at the
//! same tag store race and nothing stops them.

use std::collections::BTreeMap;

use tracing::debug;

use braid_domain::{
    needed_to_build, required_by, DomainPart, EnvStore, Environment, KindPart, Label, NamePart,
    RolePart, Rule, RuleSet, TagPart, Unification,
};

use crate::error::{BuildError, IncludeError, PersistenceError};
use crate::store::TagStore;

/// How `build_label_with` resolves its target.
#[derive(Clone, Copy, Debug)]
pub struct BuildOptions {
    /// Follow dependencies (the closure), or build only the directly
    /// matching rules.
    pub use_depends: bool,
    /// Honour tags when resolving labels against the rule set.
    pub use_tags: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            use_depends: true,
            use_tags: true,
        }
    }
}

/// What one build run did.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Targets whose rules ran (or were tagged outright, for action-less
    /// rules), in execution order.
    pub executed: Vec<Label>,
    /// Targets skipped because they were already tagged.
    pub skipped: Vec<Label>,
}

pub struct Builder {
    ruleset: RuleSet,
    store: TagStore,
    env: BTreeMap<Label, EnvStore>,
    base_env: Environment,
    unifications: Vec<Unification>,
}

impl Builder {
    pub fn new(ruleset: RuleSet, store: TagStore) -> Self {
        Builder {
            ruleset,
            store,
            env: BTreeMap::new(),
            base_env: Environment::new(),
            unifications: Vec::new(),
        }
    }

    pub fn ruleset(&self) -> &RuleSet {
        &self.ruleset
    }

    pub fn ruleset_mut(&mut self) -> &mut RuleSet {
        &mut self.ruleset
    }

    pub fn store(&self) -> &TagStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut TagStore {
        &mut self.store
    }

    /// The environment every composition starts from.
    pub fn base_env_mut(&mut self) -> &mut Environment {
        &mut self.base_env
    }

    /// The environment store registered against `pattern`, inventing an
    /// empty one if there isn't one yet.
    pub fn get_environment_for(&mut self, pattern: &Label) -> &mut EnvStore {
        self.env.entry(pattern.clone()).or_default()
    }

    /// The environment an action for `label` would receive: the base
    /// environment, the default build variables, then every matching store
    /// in ascending specificity order, so the most specific store has the
    /// last word. Ties break on the pattern's label order.
    pub fn effective_environment_for(&self, label: &Label) -> Environment {
        let mut env = self.base_env.clone();
        self.default_variables_for(label).apply(&mut env);

        let mut matching: Vec<(i32, &Label, &EnvStore)> = self
            .env
            .iter()
            .filter_map(|(pattern, store)| {
                pattern
                    .match_specificity(label)
                    .map(|score| (score, pattern, store))
            })
            .collect();
        matching.sort_by_key(|&(score, pattern, _)| (score, pattern));
        for (_, _, store) in matching {
            store.apply(&mut env);
        }
        env
    }

    /// Build everything needed to assert `target`, dependencies first.
    pub fn build_label(&mut self, target: &Label) -> Result<BuildReport, BuildError> {
        self.build_label_with(target, BuildOptions::default())
    }

    /// A target matching no rule at all is "nothing to build", not an
    /// error. A failing action aborts the run immediately, leaving the
    /// remaining rules untagged.
    pub fn build_label_with(
        &mut self,
        target: &Label,
        options: BuildOptions,
    ) -> Result<BuildReport, BuildError> {
        let rules: Vec<Rule> = if options.use_depends {
            needed_to_build(&self.ruleset, target, options.use_tags, true)?
                .into_iter()
                .cloned()
                .collect()
        } else {
            self.ruleset
                .rules_for_target(target, options.use_tags, true)
                .into_iter()
                .cloned()
                .collect()
        };

        let mut report = BuildReport::default();
        for rule in rules {
            let label = rule.target;
            if self.store.is_tag(&label) {
                debug!(%label, "already tagged, skipping");
                report.skipped.push(label);
                continue;
            }
            if let Some(action) = &rule.action {
                let env = self.effective_environment_for(&label);
                debug!(%label, "building");
                action
                    .build_label(&label, &env)
                    .map_err(|source| BuildError::Action {
                        label: label.clone(),
                        source,
                    })?;
            }
            self.store.set_tag(&label)?;
            report.executed.push(label);
        }
        Ok(report)
    }

    /// Withdraw `label` and everything that depends on it. The next build
    /// redoes all of it.
    pub fn kill_label(&mut self, label: &Label) -> Result<(), PersistenceError> {
        let invalidated = required_by(&self.ruleset, label, true, true);
        debug!(%label, count = invalidated.len(), "killing");
        for target in invalidated {
            self.store.clear_tag(&target)?;
        }
        Ok(())
    }

    /// Merge a sub-build's rule set into this one under the domain `name`,
    /// remembering the projection. Including an already-domained rule set
    /// nests its domains under `name`.
    pub fn include_domain(&mut self, mut sub: RuleSet, name: &str) -> Result<(), IncludeError> {
        let target = Label::parse(&format!("*:({name})*{{*}}/*"))?;
        sub.unify(&Label::any(), &target)?;
        self.ruleset.merge(sub)?;
        self.unifications.push(Unification {
            source: Label::any(),
            target,
        });
        Ok(())
    }

    /// Project a label through every recorded domain inclusion, in the
    /// order they happened.
    pub fn apply_unifications(&self, label: &Label) -> Label {
        let mut label = label.clone();
        for unification in &self.unifications {
            if let Some(unified) = unification.apply(&label) {
                label = unified;
            }
        }
        label
    }

    fn default_variables_for(&self, label: &Label) -> EnvStore {
        let mut store = EnvStore::new();
        store.set("BRAID_ROOT", self.store.root().as_str());
        store.set("BRAID_LABEL", label.to_string());
        match label.kind() {
            KindPart::Exact(kind) => store.set("BRAID_KIND", kind.to_string()),
            KindPart::Wildcard => store.set("BRAID_KIND", "*"),
        }
        match label.name() {
            NamePart::Exact(name) => store.set("BRAID_NAME", name.clone()),
            NamePart::Wildcard => store.set("BRAID_NAME", "*"),
        }
        match label.role() {
            RolePart::None => store.erase("BRAID_ROLE"),
            RolePart::Exact(role) => store.set("BRAID_ROLE", role.clone()),
            RolePart::Wildcard => store.set("BRAID_ROLE", "*"),
        }
        match label.tag() {
            TagPart::Exact(tag) => store.set("BRAID_TAG", tag.clone()),
            TagPart::Wildcard => store.set("BRAID_TAG", "*"),
        }
        match label.domain() {
            DomainPart::None => store.erase("BRAID_DOMAIN"),
            DomainPart::Exact(path) => store.set("BRAID_DOMAIN", path.to_string()),
            DomainPart::Wildcard => store.set("BRAID_DOMAIN", "*"),
        }
        store
    }
}
