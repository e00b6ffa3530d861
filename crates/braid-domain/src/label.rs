//! Labels: structured identifiers addressing a buildable artifact state.
//!
//! A label is written `kind:(domain)name{role}/tag[flags]`, where the domain,
//! role and flags blocks are optional. Each identity field is either an exact
//! value or a wildcard, so a pattern label and a concrete (buildable) label
//! share one type but can be told apart with [`Label::is_concrete`].

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ParseError;

/// Conventional lifecycle tags. Nothing in the engine treats these specially;
/// they are the vocabulary build descriptions are expected to share.
pub mod tags {
    // Checkouts.
    pub const CHECKED_OUT: &str = "checked_out";
    pub const PULLED: &str = "pulled";
    pub const UP_TO_DATE: &str = "up_to_date";
    pub const CHANGES_COMMITTED: &str = "changes_committed";
    pub const CHANGES_PUSHED: &str = "changes_pushed";

    // Packages.
    pub const PRECONFIG: &str = "preconfig";
    pub const CONFIGURED: &str = "configured";
    pub const BUILT: &str = "built";
    pub const INSTALLED: &str = "installed";
    pub const POST_INSTALLED: &str = "postinstalled";
    pub const CLEAN: &str = "clean";
    pub const DIST_CLEAN: &str = "distclean";

    // Deployments. Deployment and instruction application run in different
    // processes, so these two must stay independent of each other.
    pub const DEPLOYED: &str = "deployed";
    pub const INSTRUCTIONS_APPLIED: &str = "instructionsapplied";

    /// A label that should never outlive the current operation.
    pub const TEMPORARY: &str = "temporary";
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LabelKind {
    Checkout,
    Package,
    Deployment,
}

impl LabelKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LabelKind::Checkout => "checkout",
            LabelKind::Package => "package",
            LabelKind::Deployment => "deployment",
        }
    }
}

impl fmt::Display for LabelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// For every part, the wildcard sorts before any exact value (and an absent
// role/domain before both), so the derived variant order below is load-bearing.

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KindPart {
    Wildcard,
    Exact(LabelKind),
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NamePart {
    Wildcard,
    Exact(String),
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RolePart {
    None,
    Wildcard,
    Exact(String),
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TagPart {
    Wildcard,
    Exact(String),
}

/// A non-empty domain path, outermost component first. `a(b)` is
/// `DomainPath(["a", "b"])`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DomainPath(Vec<String>);

impl DomainPath {
    pub fn new(components: Vec<String>) -> Result<Self, ParseError> {
        if components.is_empty() {
            return Err(ParseError::BadPart {
                what: "domain",
                value: String::new(),
            });
        }
        for component in &components {
            check_part("domain", component)?;
        }
        Ok(DomainPath(components))
    }

    pub fn components(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for DomainPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, component) in self.0.iter().enumerate() {
            if index == 0 {
                write!(f, "{component}")?;
            } else {
                write!(f, "({component}")?;
            }
        }
        for _ in 1..self.0.len() {
            write!(f, ")")?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DomainPart {
    /// Top level: the label belongs to no sub-domain.
    None,
    Wildcard,
    Exact(DomainPath),
}

/// An immutable label. Identity is the five (domain, kind, name, role, tag)
/// fields; `transient` and `system` are metadata and take no part in
/// equality, ordering or hashing.
#[derive(Clone, Debug)]
pub struct Label {
    kind: KindPart,
    name: NamePart,
    role: RolePart,
    tag: TagPart,
    domain: DomainPart,
    transient: bool,
    system: bool,
}

fn check_part(what: &'static str, value: &str) -> Result<(), ParseError> {
    let ok = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | '-'));
    if ok {
        Ok(())
    } else {
        Err(ParseError::BadPart {
            what,
            value: value.to_string(),
        })
    }
}

impl Label {
    pub fn new(
        kind: KindPart,
        name: NamePart,
        role: RolePart,
        tag: TagPart,
        domain: DomainPart,
    ) -> Result<Self, ParseError> {
        if let NamePart::Exact(value) = &name {
            check_part("name", value)?;
        }
        if let RolePart::Exact(value) = &role {
            check_part("role", value)?;
        }
        if let TagPart::Exact(value) = &tag {
            check_part("tag", value)?;
        }
        Ok(Label {
            kind,
            name,
            role,
            tag,
            domain,
            transient: false,
            system: false,
        })
    }

    /// A concrete checkout label with no role, at top level.
    pub fn checkout(name: &str, tag: &str) -> Result<Self, ParseError> {
        Label::new(
            KindPart::Exact(LabelKind::Checkout),
            NamePart::Exact(name.to_string()),
            RolePart::None,
            TagPart::Exact(tag.to_string()),
            DomainPart::None,
        )
    }

    /// A concrete package label, at top level.
    pub fn package(name: &str, role: &str, tag: &str) -> Result<Self, ParseError> {
        Label::new(
            KindPart::Exact(LabelKind::Package),
            NamePart::Exact(name.to_string()),
            RolePart::Exact(role.to_string()),
            TagPart::Exact(tag.to_string()),
            DomainPart::None,
        )
    }

    /// A concrete deployment label with no role, at top level.
    pub fn deployment(name: &str, tag: &str) -> Result<Self, ParseError> {
        Label::new(
            KindPart::Exact(LabelKind::Deployment),
            NamePart::Exact(name.to_string()),
            RolePart::None,
            TagPart::Exact(tag.to_string()),
            DomainPart::None,
        )
    }

    /// The pattern matching every label: `*:(*)*{*}/*`.
    pub fn any() -> Self {
        Label {
            kind: KindPart::Wildcard,
            name: NamePart::Wildcard,
            role: RolePart::Wildcard,
            tag: TagPart::Wildcard,
            domain: DomainPart::Wildcard,
            transient: false,
            system: false,
        }
    }

    pub fn kind(&self) -> &KindPart {
        &self.kind
    }

    pub fn name(&self) -> &NamePart {
        &self.name
    }

    pub fn role(&self) -> &RolePart {
        &self.role
    }

    pub fn tag(&self) -> &TagPart {
        &self.tag
    }

    pub fn domain(&self) -> &DomainPart {
        &self.domain
    }

    pub fn is_transient(&self) -> bool {
        self.transient
    }

    pub fn is_system(&self) -> bool {
        self.system
    }

    /// True iff no field is a wildcard, i.e. the label may be built.
    pub fn is_concrete(&self) -> bool {
        self.kind != KindPart::Wildcard
            && self.name != NamePart::Wildcard
            && self.role != RolePart::Wildcard
            && self.tag != TagPart::Wildcard
            && self.domain != DomainPart::Wildcard
    }

    /// A copy of this label with a different tag. Transient/system flags are
    /// reset; use [`Label::with_tag_flags`] to set them.
    pub fn with_tag(&self, tag: &str) -> Result<Self, ParseError> {
        self.with_tag_flags(tag, false, false)
    }

    pub fn with_tag_flags(
        &self,
        tag: &str,
        transient: bool,
        system: bool,
    ) -> Result<Self, ParseError> {
        check_part("tag", tag)?;
        let mut label = self.clone();
        label.tag = TagPart::Exact(tag.to_string());
        label.transient = transient;
        label.system = system;
        Ok(label)
    }

    pub fn make_transient(mut self, transient: bool) -> Self {
        self.transient = transient;
        self
    }

    pub fn make_system(mut self, system: bool) -> Self {
        self.system = system;
        self
    }

    /// A copy of this label pushed one domain level down: a top-level label
    /// moves into `(name)`, a label already in `(inner)` moves into
    /// `(name(inner))`. Wildcard domains stay wildcards.
    pub fn in_domain(&self, name: &str) -> Result<Self, ParseError> {
        check_part("domain", name)?;
        let mut label = self.clone();
        label.domain = match &self.domain {
            DomainPart::None => DomainPart::Exact(DomainPath(vec![name.to_string()])),
            DomainPart::Wildcard => DomainPart::Wildcard,
            DomainPart::Exact(path) => {
                let mut components = vec![name.to_string()];
                components.extend(path.0.iter().cloned());
                DomainPart::Exact(DomainPath(components))
            }
        };
        Ok(label)
    }

    /// Match this label against another, returning the specificity: `Some(0)`
    /// for an exact match, one point off per wildcarded field, `None` if any
    /// non-wildcard field disagrees. Symmetric.
    pub fn match_specificity(&self, other: &Label) -> Option<i32> {
        let mut wildcards = 0;

        match (&self.kind, &other.kind) {
            (a, b) if a == b => {}
            (KindPart::Wildcard, _) | (_, KindPart::Wildcard) => wildcards += 1,
            _ => return None,
        }
        match (&self.name, &other.name) {
            (a, b) if a == b => {}
            (NamePart::Wildcard, _) | (_, NamePart::Wildcard) => wildcards += 1,
            _ => return None,
        }
        match (&self.role, &other.role) {
            (a, b) if a == b => {}
            (RolePart::Wildcard, _) | (_, RolePart::Wildcard) => wildcards += 1,
            _ => return None,
        }
        match (&self.tag, &other.tag) {
            (a, b) if a == b => {}
            (TagPart::Wildcard, _) | (_, TagPart::Wildcard) => wildcards += 1,
            _ => return None,
        }
        match (&self.domain, &other.domain) {
            (a, b) if a == b => {}
            (DomainPart::Wildcard, _) | (_, DomainPart::Wildcard) => wildcards += 1,
            _ => return None,
        }

        Some(-wildcards)
    }

    /// True iff the two labels have identical kind, name, role and domain,
    /// whatever their tags.
    pub fn match_without_tag(&self, other: &Label) -> bool {
        self.kind == other.kind
            && self.name == other.name
            && self.role == other.role
            && self.domain == other.domain
    }

    /// Rewrite this label per a unification target: every exact field of
    /// `target` replaces ours, wildcard fields of `target` leave ours alone.
    /// An exact target domain is prefixed onto our existing domain path, so
    /// projecting an already-nested label composes domain paths rather than
    /// discarding them.
    pub fn unify_with(&self, target: &Label) -> Label {
        let mut label = self.clone();
        if let KindPart::Exact(kind) = &target.kind {
            label.kind = KindPart::Exact(*kind);
        }
        if let NamePart::Exact(name) = &target.name {
            label.name = NamePart::Exact(name.clone());
        }
        match &target.role {
            RolePart::Wildcard => {}
            role => label.role = role.clone(),
        }
        if let TagPart::Exact(tag) = &target.tag {
            label.tag = TagPart::Exact(tag.clone());
        }
        if let DomainPart::Exact(prefix) = &target.domain {
            let mut components = prefix.0.clone();
            if let DomainPart::Exact(existing) = &label.domain {
                components.extend(existing.0.iter().cloned());
            }
            label.domain = DomainPart::Exact(DomainPath(components));
        }
        label
    }

    /// Parse the textual form `kind:(domain)name{role}/tag[flags]`.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let (kind_text, rest) = text
            .split_once(':')
            .ok_or_else(|| ParseError::bad_label(text, "missing ':' after the kind"))?;
        let kind = match kind_text {
            "*" => KindPart::Wildcard,
            "checkout" => KindPart::Exact(LabelKind::Checkout),
            "package" => KindPart::Exact(LabelKind::Package),
            "deployment" => KindPart::Exact(LabelKind::Deployment),
            other => {
                return Err(ParseError::bad_label(text, format!("unknown kind '{other}'")));
            }
        };

        let (domain, rest) = if let Some(after_open) = rest.strip_prefix('(') {
            let close = matching_close(after_open)
                .ok_or_else(|| ParseError::bad_label(text, "unbalanced '(' in domain"))?;
            let domain = parse_domain(&after_open[..close], text)?;
            (domain, &after_open[close + 1..])
        } else {
            (DomainPart::None, rest)
        };

        let name_end = rest.find(['{', '/']).unwrap_or(rest.len());
        let name = match &rest[..name_end] {
            "*" => NamePart::Wildcard,
            value => {
                check_part("name", value)?;
                NamePart::Exact(value.to_string())
            }
        };
        let rest = &rest[name_end..];

        let (role, rest) = if let Some(after_open) = rest.strip_prefix('{') {
            let close = after_open
                .find('}')
                .ok_or_else(|| ParseError::bad_label(text, "unterminated '{role}' block"))?;
            let role = match &after_open[..close] {
                "" => RolePart::None,
                "*" => RolePart::Wildcard,
                value => {
                    check_part("role", value)?;
                    RolePart::Exact(value.to_string())
                }
            };
            (role, &after_open[close + 1..])
        } else {
            (RolePart::None, rest)
        };

        let rest = rest
            .strip_prefix('/')
            .ok_or_else(|| ParseError::bad_label(text, "missing '/tag'"))?;
        let tag_end = rest.find('[').unwrap_or(rest.len());
        let tag = match &rest[..tag_end] {
            "*" => TagPart::Wildcard,
            value => {
                check_part("tag", value)?;
                TagPart::Exact(value.to_string())
            }
        };
        let rest = &rest[tag_end..];

        let mut transient = false;
        let mut system = false;
        if !rest.is_empty() {
            let flags = rest
                .strip_prefix('[')
                .and_then(|r| r.strip_suffix(']'))
                .ok_or_else(|| ParseError::bad_label(text, "malformed '[flags]' block"))?;
            for flag in flags.chars() {
                match flag {
                    'T' => transient = true,
                    'S' => system = true,
                    // Unrecognised alphanumeric flags are ignored.
                    c if c.is_ascii_alphanumeric() => {}
                    c => {
                        return Err(ParseError::bad_label(text, format!("bad flag '{c}'")));
                    }
                }
            }
        }

        Ok(Label {
            kind,
            name,
            role,
            tag,
            domain,
            transient,
            system,
        })
    }
}

/// Index of the ')' matching an already-consumed '(' at the start of `text`.
fn matching_close(text: &str) -> Option<usize> {
    let mut depth = 1usize;
    for (index, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_domain(text: &str, whole: &str) -> Result<DomainPart, ParseError> {
    if text == "*" {
        return Ok(DomainPart::Wildcard);
    }
    let mut components = Vec::new();
    let mut rest = text;
    loop {
        let end = rest.find('(').unwrap_or(rest.len());
        let component = &rest[..end];
        check_part("domain", component)?;
        components.push(component.to_string());
        if end == rest.len() {
            break;
        }
        rest = rest[end + 1..]
            .strip_suffix(')')
            .ok_or_else(|| ParseError::bad_label(whole, "unbalanced '(' in domain"))?;
    }
    Ok(DomainPart::Exact(DomainPath(components)))
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            KindPart::Wildcard => write!(f, "*:")?,
            KindPart::Exact(kind) => write!(f, "{kind}:")?,
        }
        match &self.domain {
            DomainPart::None => {}
            DomainPart::Wildcard => write!(f, "(*)")?,
            DomainPart::Exact(path) => write!(f, "({path})")?,
        }
        match &self.name {
            NamePart::Wildcard => write!(f, "*")?,
            NamePart::Exact(name) => write!(f, "{name}")?,
        }
        match &self.role {
            RolePart::None => {}
            RolePart::Wildcard => write!(f, "{{*}}")?,
            RolePart::Exact(role) => write!(f, "{{{role}}}")?,
        }
        match &self.tag {
            TagPart::Wildcard => write!(f, "/*")?,
            TagPart::Exact(tag) => write!(f, "/{tag}")?,
        }
        if self.transient || self.system {
            write!(
                f,
                "[{}{}]",
                if self.transient { "T" } else { "" },
                if self.system { "S" } else { "" }
            )?;
        }
        Ok(())
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.name == other.name
            && self.role == other.role
            && self.tag == other.tag
            && self.domain == other.domain
    }
}

impl Eq for Label {}

impl Hash for Label {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.name.hash(state);
        self.role.hash(state);
        self.tag.hash(state);
        self.domain.hash(state);
    }
}

impl Ord for Label {
    /// Domain first so that every domain's labels (and its nested
    /// sub-domains') sort contiguously, then kind, name, role, tag.
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.domain, &self.kind, &self.name, &self.role, &self.tag).cmp(&(
            &other.domain,
            &other.kind,
            &other.name,
            &other.role,
            &other.tag,
        ))
    }
}

impl PartialOrd for Label {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for Label {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Label {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Label::parse(&text).map_err(de::Error::custom)
    }
}

/// A source/target pattern pair used to project labels between domain
/// namespaces: any label matching `source` is rewritten through
/// [`Label::unify_with`] against `target`.
#[derive(Clone, Debug)]
pub struct Unification {
    pub source: Label,
    pub target: Label,
}

impl Unification {
    pub fn apply(&self, label: &Label) -> Option<Label> {
        label
            .match_specificity(&self.source)
            .map(|_| label.unify_with(&self.target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Label {
        Label::parse(text).expect(text)
    }

    #[test]
    fn round_trips_through_parse_and_format() {
        let texts = [
            "checkout:co1/checked_out",
            "package:p1{r1}/preconfig",
            "deployment:d1/deployed",
            "package:busybox{firmware}/installed[T]",
            "checkout:builds/up_to_date[TS]",
            "package:(sub)tool{arm}/built",
            "checkout:(outer(inner))first_co/checked_out",
            "*:*{*}/*",
            "package:(*)g++{*}/*",
            "package:name{}/tag",
        ];
        for text in texts {
            let label = parse(text);
            let rendered = label.to_string();
            assert_eq!(parse(&rendered), label, "{text} -> {rendered}");
            // Flags are metadata, so check them separately from equality.
            let reparsed = parse(&rendered);
            assert_eq!(reparsed.is_transient(), label.is_transient(), "{text}");
            assert_eq!(reparsed.is_system(), label.is_system(), "{text}");
        }
    }

    #[test]
    fn empty_role_block_renders_without_braces() {
        assert_eq!(parse("package:name{}/tag").to_string(), "package:name/tag");
    }

    #[test]
    fn rejects_malformed_labels() {
        for text in [
            "package:busybox",
            "nonsense:co1/tag",
            "package:bad name/tag",
            "package:name/tag[",
            "package:name/tag[T]x",
            "package:(a(b)name/tag",
            "package:name{role/tag",
            ":name/tag",
            "package:/tag",
        ] {
            assert!(Label::parse(text).is_err(), "{text} should not parse");
        }
    }

    #[test]
    fn malformed_labels_never_become_wildcards() {
        let err = Label::parse("package:bad!name/built").unwrap_err();
        assert!(matches!(err, ParseError::BadPart { what: "name", .. }));
    }

    #[test]
    fn match_scores_count_wildcards() {
        let concrete = parse("package:p1{r1}/built");
        assert_eq!(concrete.match_specificity(&concrete), Some(0));
        assert_eq!(concrete.match_specificity(&parse("package:*{r1}/built")), Some(-1));
        assert_eq!(concrete.match_specificity(&parse("package:*{*}/built")), Some(-2));
        assert_eq!(concrete.match_specificity(&parse("*:*{*}/*")), Some(-4));
        assert_eq!(concrete.match_specificity(&parse("package:p2{r1}/built")), None);
        assert_eq!(concrete.match_specificity(&parse("checkout:p1/built")), None);
    }

    #[test]
    fn role_and_domain_absence_is_not_a_wildcard() {
        let no_role = parse("checkout:co1/checked_out");
        assert_eq!(no_role.match_specificity(&parse("checkout:co1{r}/checked_out")), None);
        assert_eq!(
            no_role.match_specificity(&parse("checkout:co1{*}/checked_out")),
            Some(-1)
        );
        let domained = parse("checkout:(sub)co1/checked_out");
        assert_eq!(domained.match_specificity(&no_role), None);
        assert_eq!(domained.match_specificity(&parse("checkout:(*)co1/checked_out")), Some(-1));
        // A wildcard domain matches top-level labels too.
        assert_eq!(no_role.match_specificity(&parse("checkout:(*)co1/checked_out")), Some(-1));
    }

    #[test]
    fn equality_ignores_transient_and_system() {
        let plain = parse("package:p1{r1}/built");
        let flagged = parse("package:p1{r1}/built[TS]");
        assert_eq!(plain, flagged);
    }

    #[test]
    fn ordering_groups_domains_contiguously() {
        let mut labels = vec![
            parse("package:zeta/built"),
            parse("checkout:(sub(inner))co/checked_out"),
            parse("checkout:(sub)co/checked_out"),
            parse("checkout:(other)co/checked_out"),
            parse("checkout:alpha/checked_out"),
        ];
        labels.sort();
        let rendered: Vec<String> = labels.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "checkout:alpha/checked_out",
                "package:zeta/built",
                "checkout:(other)co/checked_out",
                "checkout:(sub)co/checked_out",
                "checkout:(sub(inner))co/checked_out",
            ]
        );
    }

    #[test]
    fn with_tag_keeps_identity_fields() {
        let label = parse("package:(sub)p1{r1}/preconfig");
        let retagged = label.with_tag_flags(tags::BUILT, true, false).unwrap();
        assert_eq!(retagged.to_string(), "package:(sub)p1{r1}/built[T]");
        assert!(retagged.is_transient());
    }

    #[test]
    fn unify_rewrites_exact_target_fields_only() {
        let label = parse("package:p1{r1}/built");
        let unified = label.unify_with(&parse("package:*{arm}/*"));
        assert_eq!(unified.to_string(), "package:p1{arm}/built");
    }

    #[test]
    fn unify_prefixes_domains_for_nested_inclusion() {
        let label = parse("checkout:co1/checked_out");
        let once = label.unify_with(&parse("*:(subdomain3)*{*}/*"));
        assert_eq!(once.to_string(), "checkout:(subdomain3)co1/checked_out");
        let twice = once.unify_with(&parse("*:(subdomain2)*{*}/*"));
        assert_eq!(twice.to_string(), "checkout:(subdomain2(subdomain3))co1/checked_out");
    }

    #[test]
    fn in_domain_nests_existing_paths() {
        let label = parse("checkout:(inner)co/checked_out");
        assert_eq!(
            label.in_domain("outer").unwrap().to_string(),
            "checkout:(outer(inner))co/checked_out"
        );
    }

    #[test]
    fn concreteness() {
        assert!(parse("package:p1{r1}/built").is_concrete());
        assert!(parse("checkout:co1/checked_out").is_concrete());
        assert!(!parse("package:*{r1}/built").is_concrete());
        assert!(!parse("package:(*)p1{r1}/built").is_concrete());
        assert!(!Label::any().is_concrete());
    }
}
