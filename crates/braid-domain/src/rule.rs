//! Rules and rule sets: the dependency graph of a build.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::action::Action;
use crate::error::ConflictError;
use crate::label::Label;

/// A target label, the action that brings it about, and the labels that must
/// be asserted first. Rules with no action exist purely to carry
/// dependencies; the driver tags their targets without doing any work.
#[derive(Clone, Debug)]
pub struct Rule {
    pub target: Label,
    pub action: Option<Arc<dyn Action>>,
    pub deps: BTreeSet<Label>,
}

impl Rule {
    pub fn new(target: Label, action: Option<Arc<dyn Action>>) -> Self {
        Rule {
            target,
            action,
            deps: BTreeSet::new(),
        }
    }

    /// A rule with a single dependency.
    pub fn with_dep(target: Label, action: Option<Arc<dyn Action>>, dep: Label) -> Self {
        let mut rule = Rule::new(target, action);
        rule.require(dep);
        rule
    }

    pub fn require(&mut self, dep: Label) {
        self.deps.insert(dep);
    }

    /// Fold another rule for the same target into this one. Dependency sets
    /// union; an empty action is overridden by a real one, but two distinct
    /// actions for one target is a build-description programming error.
    pub fn merge(&mut self, other: Rule) -> Result<(), ConflictError> {
        debug_assert_eq!(self.target, other.target);
        if let Some(action) = other.action {
            match &self.action {
                None => self.action = Some(action),
                Some(existing) if Arc::ptr_eq(existing, &action) => {}
                Some(_) => {
                    return Err(ConflictError {
                        target: self.target.clone(),
                    });
                }
            }
        }
        self.deps.extend(other.deps);
        Ok(())
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <- [", self.target)?;
        for (index, dep) in self.deps.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{dep}")?;
        }
        write!(f, "]")
    }
}

/// A mapping of target labels to rules. Keyed by the total label order, so
/// every iteration over a rule set is deterministic.
#[derive(Clone, Debug, Default)]
pub struct RuleSet {
    rules: BTreeMap<Label, Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        RuleSet::default()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values()
    }

    pub fn targets(&self) -> impl Iterator<Item = &Label> {
        self.rules.keys()
    }

    /// Insert a rule, merging with any existing rule for the same target.
    pub fn add(&mut self, rule: Rule) -> Result<(), ConflictError> {
        match self.rules.get_mut(&rule.target) {
            Some(existing) => existing.merge(rule),
            None => {
                self.rules.insert(rule.target.clone(), rule);
                Ok(())
            }
        }
    }

    /// Exact lookup of the rule for a target.
    pub fn rule_for_target(&self, target: &Label) -> Option<&Rule> {
        self.rules.get(target)
    }

    /// Exact lookup, synthesizing an empty (action-less, dependency-less)
    /// rule if the target has none.
    pub fn rule_for_target_or_insert(&mut self, target: &Label) -> &mut Rule {
        self.rules
            .entry(target.clone())
            .or_insert_with(|| Rule::new(target.clone(), None))
    }

    /// The rules whose target matches `label`.
    ///
    /// With `use_match`, wildcards on either side participate. Otherwise an
    /// exact lookup is done, or — when `use_tags` is also false — a lookup
    /// ignoring the tag field ("any state of this package").
    pub fn rules_for_target(&self, label: &Label, use_tags: bool, use_match: bool) -> Vec<&Rule> {
        if use_match {
            self.rules
                .iter()
                .filter(|(target, _)| label.match_specificity(target).is_some())
                .map(|(_, rule)| rule)
                .collect()
        } else if use_tags {
            self.rules.get(label).into_iter().collect()
        } else {
            self.rules
                .iter()
                .filter(|(target, _)| target.match_without_tag(label))
                .map(|(_, rule)| rule)
                .collect()
        }
    }

    /// All registered targets matching `pattern` (or just `pattern` itself
    /// when `use_match` is false).
    pub fn targets_match(&self, pattern: &Label, use_match: bool) -> Vec<Label> {
        if use_match {
            self.rules
                .keys()
                .filter(|target| target.match_specificity(pattern).is_some())
                .cloned()
                .collect()
        } else {
            vec![pattern.clone()]
        }
    }

    /// The rules that have `label` among their dependencies.
    pub fn rules_which_depend_on(
        &self,
        label: &Label,
        use_tags: bool,
        use_match: bool,
    ) -> Vec<&Rule> {
        self.rules
            .values()
            .filter(|rule| {
                rule.deps.iter().any(|dep| {
                    if use_match {
                        dep.match_specificity(label).is_some()
                    } else if use_tags {
                        dep == label
                    } else {
                        dep.match_without_tag(label)
                    }
                })
            })
            .collect()
    }

    pub fn merge(&mut self, other: RuleSet) -> Result<(), ConflictError> {
        for (_, rule) in other.rules {
            self.add(rule)?;
        }
        Ok(())
    }

    /// Rewrite every rule target and dependency matching `source` through the
    /// unification against `target`. Rules whose rewritten targets collide
    /// are merged. Used for domain inclusion.
    pub fn unify(&mut self, source: &Label, target: &Label) -> Result<(), ConflictError> {
        debug!(%source, %target, rules = self.rules.len(), "unifying ruleset");
        let rewrite = |label: &Label| -> Label {
            if label.match_specificity(source).is_some() {
                label.unify_with(target)
            } else {
                label.clone()
            }
        };

        let old = std::mem::take(&mut self.rules);
        for (_, rule) in old {
            let mut rewritten = Rule::new(rewrite(&rule.target), rule.action);
            for dep in &rule.deps {
                rewritten.require(rewrite(dep));
            }
            self.add(rewritten)?;
        }
        Ok(())
    }

    /// Replace the action of every rule whose target matches `pattern` with
    /// `wrapper(old_action)` — used to impose cross-cutting constraints
    /// without rewriting each rule.
    pub fn wrap_actions<F>(&mut self, pattern: &Label, wrapper: F)
    where
        F: Fn(Option<Arc<dyn Action>>) -> Option<Arc<dyn Action>>,
    {
        for (target, rule) in &mut self.rules {
            if target.match_specificity(pattern).is_some() {
                rule.action = wrapper(rule.action.take());
            }
        }
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rule in self.rules.values() {
            writeln!(f, "{rule}")?;
        }
        Ok(())
    }
}
