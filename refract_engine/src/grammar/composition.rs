//! Grammar composition: clone-with-overrides and ordered splicing
//!
//! Both operations walk the grammar graph by [`GrammarId`] with a visited set,
//! so self references, cycles and shared sub-grammars are handled once.

use super::{Grammar, GrammarError, GrammarId, GrammarRegistry, Rule};
use crate::config::compile_time::composition::MAX_TRAVERSAL_NODES;
use crate::logging::codes;
use crate::{log_debug, log_success, log_warning};
use std::collections::{HashMap, HashSet};

/// Composition errors
#[derive(Debug, thiserror::Error)]
pub enum CompositionError {
    #[error("Container '{0}' not found in composition root")]
    UnknownContainer(String),

    #[error("Base language '{0}' is not registered")]
    UnknownBase(String),

    #[error("Grammar traversal exceeded {limit} grammars")]
    TraversalLimitExceeded { limit: usize },

    #[error(transparent)]
    Grammar(#[from] GrammarError),
}

impl CompositionError {
    pub fn error_code(&self) -> crate::logging::Code {
        match self {
            Self::UnknownContainer(_) => codes::composition::UNKNOWN_CONTAINER,
            Self::UnknownBase(_) => codes::composition::UNKNOWN_BASE,
            Self::TraversalLimitExceeded { .. } => codes::composition::TRAVERSAL_LIMIT_EXCEEDED,
            Self::Grammar(error) => error.error_code(),
        }
    }
}

/// Where `insert_before` looks up its container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositionRoot {
    /// The container is a language name
    Languages,
    /// The container is an entry of this grammar; its rules' `inside`
    /// grammar is the one edited
    Grammar(GrammarId),
}

// ============================================================================
// EXTEND
// ============================================================================

/// Deep-clone the grammar bound to `base_language`, then apply `overrides`
/// key by key (replace in place, else append). The result is not bound to
/// any name.
pub fn extend(
    registry: &mut GrammarRegistry,
    base_language: &str,
    overrides: Grammar,
) -> Result<GrammarId, CompositionError> {
    let base = registry
        .resolve(base_language)
        .ok_or_else(|| CompositionError::UnknownBase(base_language.to_string()))?;

    let extended = deep_clone(registry, base)?;
    let grammar = registry.get_mut(extended)?;
    for entry in overrides.entries() {
        grammar.set(entry.name.clone(), entry.rules.clone());
    }
    if let Some(rest) = overrides.rest() {
        grammar.set_rest(Some(rest));
    }

    log_success!(codes::success::COMPOSITION_APPLIED, "Grammar extended",
        "base" => base_language,
        "overrides" => overrides.len(),
        "grammar" => extended
    );

    Ok(extended)
}

/// Copy every grammar reachable from `root`, rewiring references between the
/// copies. Returns the copy of `root`.
fn deep_clone(
    registry: &mut GrammarRegistry,
    root: GrammarId,
) -> Result<GrammarId, CompositionError> {
    // Walk first: a graph over the limit must not leave copies behind
    let originals = reachable(registry, vec![root], None)?;

    let mut copies: HashMap<GrammarId, GrammarId> = HashMap::new();
    for original in originals {
        let copy = registry.get(original)?.clone();
        copies.insert(original, registry.add(copy));
    }

    for copy in copies.values() {
        let grammar = registry.get_mut(*copy)?;
        for entry in grammar.entries_mut() {
            for rule in entry.rules.iter_mut() {
                if let Some(inside) = rule.inside() {
                    rule.set_inside(copies.get(&inside).copied().or(Some(inside)));
                }
            }
        }
        if let Some(rest) = grammar.rest() {
            grammar.set_rest(copies.get(&rest).copied().or(Some(rest)));
        }
    }

    log_debug!("Grammar graph cloned", "root" => root, "grammars" => copies.len());

    copies
        .get(&root)
        .copied()
        .ok_or(CompositionError::Grammar(GrammarError::UnknownGrammarId(root)))
}

/// Grammars reachable from `seeds`, each listed once. `substitute` is an
/// `(old, grammar)` pair: `old` is never entered and the references of
/// `grammar` are followed in its place. Read-only; fails before any edit
/// when the walk exceeds the traversal limit.
fn reachable(
    registry: &GrammarRegistry,
    seeds: Vec<GrammarId>,
    substitute: Option<(GrammarId, &Grammar)>,
) -> Result<Vec<GrammarId>, CompositionError> {
    let mut pending = seeds;
    let mut visited: HashSet<GrammarId> = HashSet::new();
    let mut order = Vec::new();
    let budget = match substitute {
        Some(_) => MAX_TRAVERSAL_NODES.saturating_sub(1),
        None => MAX_TRAVERSAL_NODES,
    };

    if let Some((old, grammar)) = substitute {
        pending.retain(|id| *id != old);
        pending.extend(grammar.references().filter(|id| *id != old));
    }

    while let Some(id) = pending.pop() {
        if !visited.insert(id) {
            continue;
        }
        if visited.len() > budget {
            return Err(CompositionError::TraversalLimitExceeded {
                limit: MAX_TRAVERSAL_NODES,
            });
        }

        let grammar = registry.get(id)?;
        pending.extend(grammar.references().filter(|next| {
            !visited.contains(next) && substitute.map_or(true, |(old, _)| *next != old)
        }));
        order.push(id);
    }

    Ok(order)
}

// ============================================================================
// INSERT BEFORE
// ============================================================================

/// Splice `new_entries` into the container grammar immediately before
/// `anchor`, then swap every reference to the old container for the new one.
///
/// Container entries whose names also appear in `new_entries` are dropped from
/// their old position. A missing anchor appends the new entries at the end.
pub fn insert_before(
    registry: &mut GrammarRegistry,
    root: CompositionRoot,
    container: &str,
    anchor: &str,
    new_entries: Grammar,
) -> Result<GrammarId, CompositionError> {
    let old = container_grammar(registry, root, container)?;
    let old_grammar = registry.get(old)?;

    let mut replacement = Grammar::new();
    replacement.set_rest(old_grammar.rest());
    let mut anchored = false;

    for entry in old_grammar.entries() {
        if entry.name == anchor {
            anchored = true;
            for inserted in new_entries.entries() {
                replacement.set(inserted.name.clone(), inserted.rules.clone());
            }
        }
        if !new_entries.contains(&entry.name) {
            replacement.set(entry.name.clone(), entry.rules.clone());
        }
    }

    if !anchored {
        log_warning!(code = codes::composition::ANCHOR_NOT_FOUND,
            "Insert-before anchor not found, appending entries",
            "container" => container,
            "anchor" => anchor
        );
        for inserted in new_entries.entries() {
            replacement.set(inserted.name.clone(), inserted.rules.clone());
        }
    }

    let replaced = replace_references(registry, root, old, replacement)?;
    let replacement = replaced.grammar;

    log_success!(codes::success::COMPOSITION_APPLIED, "Entries inserted",
        "container" => container,
        "anchor" => anchor,
        "inserted" => new_entries.len(),
        "references_updated" => replaced.references
    );

    Ok(replacement)
}

fn container_grammar(
    registry: &GrammarRegistry,
    root: CompositionRoot,
    container: &str,
) -> Result<GrammarId, CompositionError> {
    let found = match root {
        CompositionRoot::Languages => registry.resolve(container),
        CompositionRoot::Grammar(id) => registry
            .get(id)?
            .get(container)
            .and_then(|rules| rules.iter().find_map(Rule::inside)),
    };
    found.ok_or_else(|| CompositionError::UnknownContainer(container.to_string()))
}

struct Replacement {
    grammar: GrammarId,
    references: usize,
}

/// Add `replacement` to the registry and point every binding and every
/// reachable `inside`/`rest` reference that is `old` at it. The walk is
/// planned before the registry is touched.
fn replace_references(
    registry: &mut GrammarRegistry,
    root: CompositionRoot,
    old: GrammarId,
    replacement: Grammar,
) -> Result<Replacement, CompositionError> {
    let mut seeds: Vec<GrammarId> = registry.languages().map(|(_, id)| id).collect();
    if let CompositionRoot::Grammar(id) = root {
        seeds.push(id);
    }
    let affected = reachable(registry, seeds, Some((old, &replacement)))?;

    let new = registry.add(replacement);
    let mut replaced = 0;

    for (_, bound) in registry.bindings_mut() {
        if *bound == old {
            *bound = new;
            replaced += 1;
        }
    }

    for id in affected.into_iter().chain(std::iter::once(new)) {
        let grammar = registry.get_mut(id)?;
        for entry in grammar.entries_mut() {
            for rule in entry.rules.iter_mut() {
                if rule.inside() == Some(old) {
                    rule.set_inside(Some(new));
                    replaced += 1;
                }
            }
        }
        if grammar.rest() == Some(old) {
            grammar.set_rest(Some(new));
            replaced += 1;
        }
    }

    Ok(Replacement {
        grammar: new,
        references: replaced,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn rule(pattern: &str) -> Rule {
        Rule::new(pattern).unwrap()
    }

    fn names(registry: &GrammarRegistry, id: GrammarId) -> Vec<String> {
        registry
            .get(id)
            .unwrap()
            .names()
            .map(str::to_string)
            .collect()
    }

    fn clike(registry: &mut GrammarRegistry) -> GrammarId {
        registry.register(
            "clike",
            Grammar::new()
                .with_entry("comment", vec![rule("//.*")])
                .with_entry("string", vec![rule("\"[^\"]*\"")])
                .with_entry("keyword", vec![rule(r"\b(?:if|else)\b")])
                .with_entry("number", vec![rule(r"\d+")]),
        )
    }

    #[test]
    fn test_extend_overrides_in_place_and_appends() {
        let mut registry = GrammarRegistry::new();
        let base = clike(&mut registry);

        let overrides = Grammar::new()
            .with_entry("keyword", vec![rule(r"\b(?:let|const)\b")])
            .with_entry("regex", vec![rule("/[^/]+/")]);
        let js = extend(&mut registry, "clike", overrides).unwrap();

        assert_ne!(js, base);
        assert_eq!(
            names(&registry, js),
            vec!["comment", "string", "keyword", "number", "regex"]
        );
        // The base is untouched
        assert_eq!(names(&registry, base).len(), 4);
        let keyword = registry.get(base).unwrap().get("keyword").unwrap();
        assert!(keyword[0].pattern().as_str().contains("if"));
    }

    #[test]
    fn test_extend_clones_cycles_once() {
        let mut registry = GrammarRegistry::new();
        let shared = registry.add(Grammar::new().with_entry("punctuation", vec![rule("[{}]")]));
        let base = registry.register("block", Grammar::new());
        registry.get_mut(base).unwrap().set(
            "block",
            vec![
                rule(r"\{[^{}]*\}").with_inside(base),
                rule(r"\[[^\]]*\]").with_inside(shared),
            ],
        );
        registry
            .get_mut(base)
            .unwrap()
            .set("inner", vec![rule("<[^>]*>").with_inside(shared)]);

        let before = registry.len();
        let copy = extend(&mut registry, "block", Grammar::new()).unwrap();
        assert_eq!(registry.len(), before + 2);

        let grammar = registry.get(copy).unwrap();
        let block = grammar.get("block").unwrap();
        assert_eq!(block[0].inside(), Some(copy));

        let shared_copy = block[1].inside().unwrap();
        assert_ne!(shared_copy, shared);
        assert_eq!(grammar.get("inner").unwrap()[0].inside(), Some(shared_copy));
    }

    #[test]
    fn test_extend_unknown_base() {
        let mut registry = GrammarRegistry::new();
        assert_matches!(
            extend(&mut registry, "nope", Grammar::new()),
            Err(CompositionError::UnknownBase(name)) if name == "nope"
        );
    }

    #[test]
    fn test_insert_before_orders_entries() {
        let mut registry = GrammarRegistry::new();
        clike(&mut registry);

        let id = insert_before(
            &mut registry,
            CompositionRoot::Languages,
            "clike",
            "keyword",
            Grammar::new()
                .with_entry("regex", vec![rule("/[^/]+/")])
                .with_entry("template", vec![rule("`[^`]*`")]),
        )
        .unwrap();

        assert_eq!(registry.resolve("clike"), Some(id));
        assert_eq!(
            names(&registry, id),
            vec!["comment", "string", "regex", "template", "keyword", "number"]
        );
    }

    #[test]
    fn test_insert_before_does_not_duplicate_keys() {
        let mut registry = GrammarRegistry::new();
        clike(&mut registry);

        let id = insert_before(
            &mut registry,
            CompositionRoot::Languages,
            "clike",
            "number",
            Grammar::new()
                .with_entry("string", vec![rule("'[^']*'")])
                .with_entry("boolean", vec![rule(r"\b(?:true|false)\b")]),
        )
        .unwrap();

        assert_eq!(
            names(&registry, id),
            vec!["comment", "keyword", "string", "boolean", "number"]
        );
        let string = registry.get(id).unwrap().get("string").unwrap();
        assert_eq!(string[0].pattern().as_str(), "'[^']*'");
    }

    #[test]
    fn test_insert_before_missing_anchor_appends() {
        let mut registry = GrammarRegistry::new();
        clike(&mut registry);

        let id = insert_before(
            &mut registry,
            CompositionRoot::Languages,
            "clike",
            "no-such-entry",
            Grammar::new().with_entry("operator", vec![rule("[-+*/]")]),
        )
        .unwrap();

        assert_eq!(
            names(&registry, id),
            vec!["comment", "string", "keyword", "number", "operator"]
        );
    }

    #[test]
    fn test_insert_before_unknown_container() {
        let mut registry = GrammarRegistry::new();
        assert_matches!(
            insert_before(
                &mut registry,
                CompositionRoot::Languages,
                "missing",
                "keyword",
                Grammar::new()
            ),
            Err(CompositionError::UnknownContainer(name)) if name == "missing"
        );
    }

    #[test]
    fn test_insert_before_propagates_to_aliases_and_references() {
        let mut registry = GrammarRegistry::new();
        let markup = registry.register(
            "markup",
            Grammar::new()
                .with_entry("tag", vec![rule("<[^>]+>")])
                .with_entry("entity", vec![rule("&#?[a-z0-9]+;")]),
        );
        registry.alias("html", "markup").unwrap();
        let php = registry.register(
            "php",
            Grammar::new().with_entry("markup", vec![rule(r"\?>[\s\S]*").with_inside(markup)]),
        );
        // Self reference must end up pointing at the replacement too
        registry
            .get_mut(markup)
            .unwrap()
            .set("cdata", vec![rule("<!\\[CDATA\\[.*\\]\\]>").with_inside(markup)]);

        let new = insert_before(
            &mut registry,
            CompositionRoot::Languages,
            "markup",
            "tag",
            Grammar::new().with_entry("comment", vec![rule("<!--.*-->")]),
        )
        .unwrap();

        assert_eq!(registry.resolve("markup"), Some(new));
        assert_eq!(registry.resolve("html"), Some(new));
        assert_eq!(registry.get(php).unwrap().get("markup").unwrap()[0].inside(), Some(new));
        assert_eq!(registry.get(new).unwrap().get("cdata").unwrap()[0].inside(), Some(new));
        assert_eq!(names(&registry, new), vec!["comment", "tag", "entity", "cdata"]);
    }

    #[test]
    fn test_insert_before_with_grammar_root() {
        let mut registry = GrammarRegistry::new();
        let tag_inner = registry.add(
            Grammar::new()
                .with_entry("punctuation", vec![rule("[<>/]")])
                .with_entry("attr-name", vec![rule(r"[\w-]+")]),
        );
        let markup = registry.register(
            "markup",
            Grammar::new().with_entry("tag", vec![rule("<[^>]+>").with_inside(tag_inner)]),
        );

        let new = insert_before(
            &mut registry,
            CompositionRoot::Grammar(markup),
            "tag",
            "attr-name",
            Grammar::new().with_entry("attr-value", vec![rule("=\"[^\"]*\"")]),
        )
        .unwrap();

        let tag = registry.get(markup).unwrap().get("tag").unwrap();
        assert_eq!(tag[0].inside(), Some(new));
        assert_eq!(
            names(&registry, new),
            vec!["punctuation", "attr-value", "attr-name"]
        );

        assert_matches!(
            insert_before(
                &mut registry,
                CompositionRoot::Grammar(markup),
                "entity",
                "x",
                Grammar::new()
            ),
            Err(CompositionError::UnknownContainer(_))
        );
    }

    /// A chain of `MAX_TRAVERSAL_NODES + 1` grammars bound to "chain"
    fn long_chain(registry: &mut GrammarRegistry) -> GrammarId {
        let link = rule("x");
        let mut head = registry.add(Grammar::new());
        for _ in 0..MAX_TRAVERSAL_NODES {
            head = registry.add(Grammar::new().with_entry("next", vec![link.clone().with_inside(head)]));
        }
        registry.bind("chain", head);
        head
    }

    #[test]
    fn test_traversal_limit_leaves_registry_untouched() {
        let mut registry = GrammarRegistry::new();
        let head = long_chain(&mut registry);
        let grammars = registry.len();

        assert_matches!(
            extend(&mut registry, "chain", Grammar::new()),
            Err(CompositionError::TraversalLimitExceeded { .. })
        );
        assert_eq!(registry.len(), grammars);

        assert_matches!(
            insert_before(
                &mut registry,
                CompositionRoot::Languages,
                "chain",
                "next",
                Grammar::new().with_entry("first", vec![rule("y")])
            ),
            Err(CompositionError::TraversalLimitExceeded { .. })
        );
        assert_eq!(registry.len(), grammars);
        assert_eq!(registry.resolve("chain"), Some(head));
        assert_eq!(names(&registry, head), vec!["next"]);
    }
}
