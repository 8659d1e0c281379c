//! Call-site resolution.
//!
//! Second pass over the tree. For every call expression it determines:
//! - the caller: the nearest enclosing function-like node, named through
//!   the declared name or the bound variable's name; calls at top level or
//!   inside anonymous functions (callbacks, methods) are unattributed
//! - the callee: a bare identifier `f()`, or the property of a member call
//!   `obj.f()` / `obj?.f()`; computed members and other forms are dropped
//!
//! tree-sitter parses a tagged template (a tag followed by a template
//! literal) as a `call_expression` whose arguments are a `template_string`.
//! Those are not calls and are skipped entirely.
//!
//! An edge is kept only when both names are catalogued and the callee is not
//! denylisted. The denylist is checked first and wins over the catalog.
//!
//! The pass visits each call node exactly once, so cycles in the resulting
//! relation (recursion, mutual recursion) cannot cause non-termination.

use std::collections::{BTreeMap, BTreeSet};
use tree_sitter::Node;

use super::denylist::Denylist;
use super::extractor::{is_function_like, Catalog};
use crate::parse::SyntaxTree;

/// Caller name -> distinct callee names.
pub type CallRelation = BTreeMap<String, BTreeSet<String>>;

/// Why a call site did not become an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// No enclosing function, or the enclosing function has no usable name
    Unattributed,
    /// Call target is not an identifier or a plain member access
    UnsupportedCallee,
    /// Callee name is on the denylist
    Denylisted,
    /// Caller or callee name is not in the catalog
    NotCatalogued,
}

/// Counts of call sites seen during resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionStats {
    pub call_sites: usize,
    pub edges_recorded: usize,
    pub unattributed: usize,
    pub unsupported_callee: usize,
    pub denylisted: usize,
    pub not_catalogued: usize,
}

impl ResolutionStats {
    fn record_drop(&mut self, reason: DropReason) {
        match reason {
            DropReason::Unattributed => self.unattributed += 1,
            DropReason::UnsupportedCallee => self.unsupported_callee += 1,
            DropReason::Denylisted => self.denylisted += 1,
            DropReason::NotCatalogued => self.not_catalogued += 1,
        }
    }
}

/// Output of the resolution pass.
#[derive(Debug, Clone, Default)]
pub struct CallUsageResult {
    pub relation: CallRelation,
    pub stats: ResolutionStats,
}

/// Nearest function-like ancestor of a node.
fn enclosing_function<'t>(node: &Node<'t>) -> Option<Node<'t>> {
    let mut current = node.parent();
    while let Some(n) = current {
        if is_function_like(n.kind()) {
            return Some(n);
        }
        current = n.parent();
    }
    None
}

/// Name a call inside `func` is attributed to.
///
/// A declaration uses its own identifier. Any function that is the
/// initializer of a `variable_declarator` with a plain identifier binding uses
/// that identifier, whether or not the function also has its own name; the
/// catalog check decides later whether the name is usable.
fn caller_name<'t>(tree: &'t SyntaxTree, func: &Node<'t>) -> Option<&'t str> {
    if matches!(
        func.kind(),
        "function_declaration" | "generator_function_declaration"
    ) {
        return func.child_by_field_name("name").map(|n| tree.text(&n));
    }

    let declarator = func.parent()?;
    if declarator.kind() != "variable_declarator" {
        return None;
    }
    if declarator.child_by_field_name("value")?.id() != func.id() {
        return None;
    }
    let binding = declarator.child_by_field_name("name")?;
    (binding.kind() == "identifier").then(|| tree.text(&binding))
}

/// True for a `call_expression` node that is really a tagged template.
pub fn is_tagged_template(call: &Node<'_>) -> bool {
    call.child_by_field_name("arguments").is_some_and(|args| args.kind() == "template_string")
}

/// Name of the called function for a `call_expression`, if it has one.
pub fn callee_name<'t>(tree: &'t SyntaxTree, call: &Node<'t>) -> Option<&'t str> {
    if is_tagged_template(call) {
        return None;
    }
    let mut target = call.child_by_field_name("function")?;
    while target.kind() == "parenthesized_expression" {
        target = target.named_child(0)?;
    }

    match target.kind() {
        "identifier" => Some(tree.text(&target)),
        "member_expression" => {
            let property = target.child_by_field_name("property")?;
            (property.kind() == "property_identifier").then(|| tree.text(&property))
        }
        _ => None,
    }
}

/// Resolve a single call site to a `(caller, callee)` pair.
pub fn resolve_call<'t>(
    tree: &'t SyntaxTree,
    call: &Node<'t>,
    catalog: &Catalog,
    denylist: &Denylist,
) -> Result<(&'t str, &'t str), DropReason> {
    let caller = enclosing_function(call)
        .and_then(|func| caller_name(tree, &func))
        .ok_or(DropReason::Unattributed)?;

    let callee = callee_name(tree, call).ok_or(DropReason::UnsupportedCallee)?;

    if denylist.contains(callee) {
        return Err(DropReason::Denylisted);
    }
    if !catalog.contains(caller) || !catalog.contains(callee) {
        return Err(DropReason::NotCatalogued);
    }

    Ok((caller, callee))
}

/// Build the caller -> callee relation for a parsed file.
pub fn extract_call_usages(
    tree: &SyntaxTree,
    catalog: &Catalog,
    denylist: &Denylist,
) -> CallUsageResult {
    let mut result = CallUsageResult::default();

    tree.for_each_node(|node| {
        if node.kind() != "call_expression" || is_tagged_template(&node) {
            return;
        }
        result.stats.call_sites += 1;

        match resolve_call(tree, &node, catalog, denylist) {
            Ok((caller, callee)) => {
                let inserted = result
                    .relation
                    .entry(caller.to_string())
                    .or_default()
                    .insert(callee.to_string());
                if inserted {
                    result.stats.edges_recorded += 1;
                }
            }
            Err(reason) => result.stats.record_drop(reason),
        }
    });

    tracing::debug!(
        call_sites = result.stats.call_sites,
        edges = result.stats.edges_recorded,
        unattributed = result.stats.unattributed,
        denylisted = result.stats.denylisted,
        "resolution pass complete"
    );

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callgraph::extractor::build_catalog;
    use crate::config::DuplicatePolicy;
    use crate::parse::parse_source;

    fn relation_with(src: &str, denylist: &Denylist) -> CallUsageResult {
        let tree = parse_source(src).unwrap();
        let catalog = build_catalog(&tree, DuplicatePolicy::LastWriterWins).unwrap();
        extract_call_usages(&tree, &catalog, denylist)
    }

    fn relation(src: &str) -> CallRelation {
        relation_with(src, &Denylist::builtin()).relation
    }

    fn callees<'a>(rel: &'a CallRelation, caller: &str) -> Vec<&'a str> {
        rel.get(caller)
            .map(|set| set.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_direct_call() {
        let rel = relation("function a(){ b(); }\nfunction b(){ console.log(1); }");
        assert_eq!(rel.len(), 1);
        assert_eq!(callees(&rel, "a"), vec!["b"]);
    }

    #[test]
    fn test_distinct_callees_no_multiplicity() {
        let rel = relation("function a(){ b(); b(); c(); }\nfunction b(){}\nfunction c(){}");
        assert_eq!(callees(&rel, "a"), vec!["b", "c"]);
    }

    #[test]
    fn test_member_call_uses_property_name() {
        let src = "function run(){ api.save(); this.save(); obj?.save(); }\nfunction save(){}";
        assert_eq!(callees(&relation(src), "run"), vec!["save"]);
    }

    #[test]
    fn test_computed_member_and_private_dropped() {
        let src = r#"
class K { #save() {} go() { this.#save(); } }
function run(){ obj["save"](); }
function save(){}
"#;
        let result = relation_with(src, &Denylist::builtin());
        assert!(result.relation.is_empty());
        assert!(result.stats.unsupported_callee >= 1);
    }

    #[test]
    fn test_top_level_call_unattributed() {
        let result = relation_with("a();\nfunction a(){}", &Denylist::builtin());
        assert!(result.relation.is_empty());
        assert_eq!(result.stats.unattributed, 1);
    }

    #[test]
    fn test_call_inside_anonymous_callback_unattributed() {
        let src = r#"
function outer() {
  items.forEach(function (x) { helper(x); });
  items.forEach((x) => helper(x));
}
function helper() {}
"#;
        let rel = relation(src);
        assert!(callees(&rel, "outer").is_empty());
    }

    #[test]
    fn test_call_in_method_unattributed() {
        let src = "class S { start() { boot(); } }\nfunction boot(){}";
        assert!(relation(src).is_empty());
    }

    #[test]
    fn test_variable_bound_caller() {
        let src = "const main = () => { load(); };\nconst load = function () { decode(); };\nfunction decode(){}";
        let rel = relation(src);
        assert_eq!(callees(&rel, "main"), vec!["load"]);
        assert_eq!(callees(&rel, "load"), vec!["decode"]);
    }

    #[test]
    fn test_expression_bodied_arrow_caller() {
        let src = "const twice = (x) => double(double(x));\nfunction double(x){ return x * 2; }";
        let rel = relation(src);
        assert_eq!(callees(&rel, "twice"), vec!["double"]);
    }

    #[test]
    fn test_denylist_wins_over_catalog() {
        let src = "function map(){}\nfunction a(){ map(); list.map(f); }";
        let result = relation_with(src, &Denylist::builtin());
        assert!(result.relation.is_empty());
        assert_eq!(result.stats.denylisted, 2);
    }

    #[test]
    fn test_substituted_denylist() {
        let src = "function map(){}\nfunction a(){ map(); }";
        let result = relation_with(src, &Denylist::empty());
        assert_eq!(callees(&result.relation, "a"), vec!["map"]);
    }

    #[test]
    fn test_uncatalogued_callee_dropped() {
        let src = "import { util } from './u';\nfunction a(){ util(); fetch('/x'); }";
        let result = relation_with(src, &Denylist::builtin());
        assert!(result.relation.is_empty());
        assert_eq!(result.stats.not_catalogued, 2);
    }

    #[test]
    fn test_self_and_mutual_recursion() {
        let rel = relation("function x(){ y(); x(); }\nfunction y(){ x(); }");
        assert_eq!(callees(&rel, "x"), vec!["x", "y"]);
        assert_eq!(callees(&rel, "y"), vec!["x"]);
    }

    #[test]
    fn test_parenthesized_callee() {
        let src = "function a(){ (b)(); ((c))(); }\nfunction b(){}\nfunction c(){}";
        assert_eq!(callees(&relation(src), "a"), vec!["b", "c"]);
    }

    #[test]
    fn test_tagged_template_is_not_a_call() {
        let src = "function a(){ b`x`; css.b`y ${c()}`; }\nfunction b(){}\nfunction c(){}";
        let result = relation_with(src, &Denylist::builtin());
        assert_eq!(callees(&result.relation, "a"), vec!["c"]);
        assert_eq!(result.stats.call_sites, 1);

        let tree = parse_source("function a(){ b`x`; }\nfunction b(){}").unwrap();
        let catalog = build_catalog(&tree, DuplicatePolicy::LastWriterWins).unwrap();
        assert!(extract_call_usages(&tree, &catalog, &Denylist::builtin()).relation.is_empty());
    }

    #[test]
    fn test_named_function_expression_caller_not_catalogued() {
        let src = "const f = function g() { h(); };\nfunction h(){}";
        let result = relation_with(src, &Denylist::builtin());
        assert!(result.relation.is_empty());
        assert_eq!(result.stats.not_catalogued, 1);
    }

    #[test]
    fn test_nested_declaration_is_its_own_caller() {
        let src = "function outer(){ function inner(){ leaf(); } inner(); }\nfunction leaf(){}";
        let rel = relation(src);
        assert_eq!(callees(&rel, "outer"), vec!["inner"]);
        assert_eq!(callees(&rel, "inner"), vec!["leaf"]);
    }
}
