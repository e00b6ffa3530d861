//! Dependency closure computation over a rule set.
//!
//! `needed_to_build` is the scheduling core: a depth-first post-order walk
//! that emits every rule needed to assert a target, dependencies strictly
//! before dependents, with deterministic tie-breaking by the total label
//! order. `required_by` is its reverse: everything that would be invalidated
//! if a label changed.

use std::collections::BTreeSet;

use tracing::trace;

use crate::error::GraphError;
use crate::label::Label;
use crate::rule::{Rule, RuleSet};

/// The complete, ordered list of rules needed to build `target`.
///
/// With `use_match`, the target may be a wildcard pattern and expands to
/// every matching registered rule. With `use_tags` false, the tag field is
/// ignored when resolving labels against the rule set.
///
/// A target with no matching rule at all yields an empty list ("nothing to
/// build"); a *dependency* with no rule is an incomplete graph and fails,
/// as does any dependency cycle.
pub fn needed_to_build<'a>(
    ruleset: &'a RuleSet,
    target: &Label,
    use_tags: bool,
    use_match: bool,
) -> Result<Vec<&'a Rule>, GraphError> {
    let roots: Vec<Label> = if use_match {
        ruleset.targets_match(target, true)
    } else if ruleset.rules_for_target(target, use_tags, false).is_empty() {
        Vec::new()
    } else {
        vec![target.clone()]
    };

    let mut walk = Walk {
        ruleset,
        use_tags,
        order: Vec::new(),
        emitted: BTreeSet::new(),
        done: BTreeSet::new(),
        visiting: Vec::new(),
    };
    for root in &roots {
        walk.visit(root, target)?;
    }
    Ok(walk.order)
}

struct Walk<'a> {
    ruleset: &'a RuleSet,
    use_tags: bool,
    order: Vec<&'a Rule>,
    emitted: BTreeSet<Label>,
    done: BTreeSet<Label>,
    visiting: Vec<Label>,
}

impl<'a> Walk<'a> {
    fn visit(&mut self, label: &Label, origin: &Label) -> Result<(), GraphError> {
        if self.done.contains(label) {
            return Ok(());
        }
        if let Some(position) = self.visiting.iter().position(|seen| seen == label) {
            let mut chain = self.visiting[position..].to_vec();
            chain.push(label.clone());
            return Err(GraphError::Cycle { chain });
        }

        // In the presence of wildcard rules several rules can build one
        // label; every one of them has to be satisfied.
        let rules = if self.use_tags {
            self.ruleset.rules_for_target(label, true, true)
        } else {
            self.ruleset.rules_for_target(label, false, false)
        };
        if rules.is_empty() {
            return Err(GraphError::Missing {
                label: label.clone(),
                target: origin.clone(),
            });
        }

        self.visiting.push(label.clone());
        for rule in &rules {
            for dep in rule.deps.clone() {
                trace!(target = %label, %dep, "descending");
                self.visit(&dep, origin)?;
            }
        }
        self.visiting.pop();

        for rule in rules {
            if self.emitted.insert(rule.target.clone()) {
                self.order.push(rule);
            }
        }
        self.done.insert(label.clone());
        Ok(())
    }
}

/// The labels that (directly or transitively) depend on `label`, including
/// the matching targets themselves. This is what a change to `label` would
/// invalidate.
pub fn required_by(
    ruleset: &RuleSet,
    label: &Label,
    use_tags: bool,
    use_match: bool,
) -> BTreeSet<Label> {
    let mut depends: BTreeSet<Label> = ruleset
        .rules_for_target(label, use_tags, use_match)
        .into_iter()
        .map(|rule| rule.target.clone())
        .collect();

    loop {
        let mut extra = BTreeSet::new();
        for dep in &depends {
            for rule in ruleset.rules_which_depend_on(dep, use_tags, use_match) {
                if !depends.contains(&rule.target) {
                    extra.insert(rule.target.clone());
                }
            }
        }
        if extra.is_empty() {
            return depends;
        }
        depends.extend(extra);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Rule;

    fn label(text: &str) -> Label {
        Label::parse(text).expect(text)
    }

    fn chain_ruleset() -> RuleSet {
        // checkout:co1 <- package:p1 <- deployment:d1
        let mut ruleset = RuleSet::new();
        ruleset
            .add(Rule::new(label("checkout:co1/checked_out"), None))
            .unwrap();
        ruleset
            .add(Rule::with_dep(
                label("package:p1{r1}/preconfig"),
                None,
                label("checkout:co1/checked_out"),
            ))
            .unwrap();
        ruleset
            .add(Rule::with_dep(
                label("deployment:d1{r2}/deployed"),
                None,
                label("package:p1{r1}/preconfig"),
            ))
            .unwrap();
        ruleset
    }

    #[test]
    fn dependencies_precede_dependents() {
        let ruleset = chain_ruleset();
        let order = needed_to_build(&ruleset, &label("deployment:d1{r2}/deployed"), true, false)
            .unwrap();
        let targets: Vec<String> = order.iter().map(|r| r.target.to_string()).collect();
        assert_eq!(
            targets,
            vec![
                "checkout:co1/checked_out",
                "package:p1{r1}/preconfig",
                "deployment:d1{r2}/deployed",
            ]
        );
    }

    #[test]
    fn order_is_stable_across_calls() {
        let mut ruleset = chain_ruleset();
        // A diamond: two packages off one checkout, one deployment off both.
        ruleset
            .add(Rule::with_dep(
                label("package:p0{r1}/preconfig"),
                None,
                label("checkout:co1/checked_out"),
            ))
            .unwrap();
        ruleset
            .add(Rule::with_dep(
                label("deployment:d1{r2}/deployed"),
                None,
                label("package:p0{r1}/preconfig"),
            ))
            .unwrap();

        let target = label("deployment:d1{r2}/deployed");
        let first: Vec<String> = needed_to_build(&ruleset, &target, true, false)
            .unwrap()
            .iter()
            .map(|r| r.target.to_string())
            .collect();
        for _ in 0..5 {
            let again: Vec<String> = needed_to_build(&ruleset, &target, true, false)
                .unwrap()
                .iter()
                .map(|r| r.target.to_string())
                .collect();
            assert_eq!(again, first);
        }
        // p0 sorts before p1, so the tie breaks that way every time.
        assert_eq!(
            first,
            vec![
                "checkout:co1/checked_out",
                "package:p0{r1}/preconfig",
                "package:p1{r1}/preconfig",
                "deployment:d1{r2}/deployed",
            ]
        );
    }

    #[test]
    fn missing_top_level_target_is_nothing_to_build() {
        let ruleset = chain_ruleset();
        let order =
            needed_to_build(&ruleset, &label("package:absent{r1}/built"), true, false).unwrap();
        assert!(order.is_empty());
        let order =
            needed_to_build(&ruleset, &label("package:absent{*}/*"), true, true).unwrap();
        assert!(order.is_empty());
    }

    #[test]
    fn missing_dependency_rule_is_an_incomplete_graph() {
        let mut ruleset = RuleSet::new();
        ruleset
            .add(Rule::with_dep(
                label("package:p1{r1}/built"),
                None,
                label("checkout:ghost/checked_out"),
            ))
            .unwrap();
        let err =
            needed_to_build(&ruleset, &label("package:p1{r1}/built"), true, false).unwrap_err();
        match err {
            GraphError::Missing { label: missing, .. } => {
                assert_eq!(missing, label("checkout:ghost/checked_out"));
            }
            other => panic!("expected Missing, got {other}"),
        }
    }

    #[test]
    fn cycles_fail_and_name_the_labels() {
        let mut ruleset = RuleSet::new();
        let a = label("package:a{r}/built");
        let b = label("package:b{r}/built");
        ruleset.add(Rule::with_dep(a.clone(), None, b.clone())).unwrap();
        ruleset.add(Rule::with_dep(b.clone(), None, a.clone())).unwrap();
        let err = needed_to_build(&ruleset, &a, true, false).unwrap_err();
        match err {
            GraphError::Cycle { chain } => {
                assert!(chain.contains(&a));
                assert!(chain.contains(&b));
                assert_eq!(chain.first(), chain.last());
            }
            other => panic!("expected Cycle, got {other}"),
        }
    }

    #[test]
    fn wildcard_dependencies_expand_to_all_matching_rules() {
        let mut ruleset = RuleSet::new();
        ruleset
            .add(Rule::new(label("checkout:a/checked_out"), None))
            .unwrap();
        ruleset
            .add(Rule::new(label("checkout:b/checked_out"), None))
            .unwrap();
        ruleset
            .add(Rule::with_dep(
                label("deployment:all/deployed"),
                None,
                label("checkout:*/checked_out"),
            ))
            .unwrap();
        let order =
            needed_to_build(&ruleset, &label("deployment:all/deployed"), true, false).unwrap();
        let targets: Vec<String> = order.iter().map(|r| r.target.to_string()).collect();
        assert_eq!(
            targets,
            vec![
                "checkout:a/checked_out",
                "checkout:b/checked_out",
                "deployment:all/deployed",
            ]
        );
    }

    #[test]
    fn required_by_walks_the_reverse_closure() {
        let ruleset = chain_ruleset();
        let invalidated = required_by(&ruleset, &label("checkout:co1/checked_out"), true, true);
        assert_eq!(invalidated.len(), 3);
        assert!(invalidated.contains(&label("deployment:d1{r2}/deployed")));
    }

    #[test]
    fn required_by_of_a_leaf_is_just_its_targets() {
        let ruleset = chain_ruleset();
        let invalidated = required_by(&ruleset, &label("deployment:d1{r2}/deployed"), true, true);
        assert_eq!(invalidated.len(), 1);
    }
}
