//! Clause assembly tests (flags, extra predicates, result parts).

use pretty_assertions::assert_eq;

use crate::ast::{OrderBy, QueryNode, QueryOptions};
use crate::error::Error;
use crate::parser::parse_query;
use crate::transpiler::{JoinClause, TranslateOptions, Translation, Translator};

fn options(query: &str) -> QueryOptions {
    parse_query(query).unwrap()
}

#[test]
fn test_flag_composition() {
    let flags = TranslateOptions::WHERE | TranslateOptions::SELECT;
    assert_eq!(flags, TranslateOptions::SELECT | TranslateOptions::WHERE);
    assert!(flags.contains(TranslateOptions::SELECT));
    assert!(!flags.contains(TranslateOptions::TOP));
    assert_eq!(TranslateOptions::ALL.bits(), 15);
    assert_eq!(TranslateOptions::JOIN.bits(), 16);
    assert_eq!(
        TranslateOptions::ALL & TranslateOptions::TOP,
        TranslateOptions::TOP
    );
}

#[test]
fn test_flags_from_str() {
    let flags: TranslateOptions = "select, where".parse().unwrap();
    assert_eq!(flags, TranslateOptions::SELECT | TranslateOptions::WHERE);
    assert_eq!("all".parse::<TranslateOptions>().unwrap(), TranslateOptions::ALL);
    assert!(matches!(
        "select,limit".parse::<TranslateOptions>(),
        Err(Error::InvalidValue { .. })
    ));
}

#[test]
fn test_where_only() {
    let sql = Translator::new().translate(
        &options("$select=id&$filter=a eq 1&$orderby=id&$top=5"),
        TranslateOptions::WHERE,
        None,
    );
    assert_eq!(sql, "WHERE c.a = 1 ");
}

#[test]
fn test_top_needs_its_flag() {
    let query = options("$top=5");
    let translator = Translator::new();
    assert_eq!(
        translator.translate(&query, TranslateOptions::SELECT, None),
        "SELECT * FROM c "
    );
    assert_eq!(
        translator.translate(&query, TranslateOptions::SELECT | TranslateOptions::TOP, None),
        "SELECT TOP 5 * FROM c "
    );
}

#[test]
fn test_zero_top_is_ignored() {
    let (sql, limit) =
        Translator::new().translate_with_limit(&options("$top=0"), TranslateOptions::ALL, None);
    assert_eq!(sql, "SELECT * FROM c ");
    assert_eq!(limit, None);
}

#[test]
fn test_item_limit_from_top() {
    let (sql, limit) = Translator::new().translate_with_limit(
        &options("$top=15&$filter=a eq 1"),
        TranslateOptions::ALL,
        None,
    );
    assert_eq!(sql, "SELECT TOP 15 * FROM c WHERE c.a = 1 ");
    assert_eq!(limit, Some(15));
}

#[test]
fn test_extra_predicate_alone() {
    let sql = Translator::new().translate(
        &QueryOptions::new(),
        TranslateOptions::ALL,
        Some("c._t = 'dataType'"),
    );
    assert_eq!(sql, "SELECT * FROM c WHERE c._t = 'dataType' ");
}

#[test]
fn test_blank_extra_predicate_ignored() {
    let sql = Translator::new().translate(&options("$filter=a eq 1"), TranslateOptions::ALL, Some("  "));
    assert_eq!(sql, "SELECT * FROM c WHERE c.a = 1 ");
}

#[test]
fn test_extra_predicate_skipped_without_where_flag() {
    let sql = Translator::new().translate(
        &QueryOptions::new(),
        TranslateOptions::SELECT,
        Some("c._t = 'dataType'"),
    );
    assert_eq!(sql, "SELECT * FROM c ");
}

#[test]
fn test_join_emitted_without_join_flag() {
    let sql = Translator::new().translate(
        &options("$filter=products/any(p: p/name eq 'a')"),
        TranslateOptions::WHERE,
        None,
    );
    assert_eq!(sql, "JOIN p IN c.products WHERE p.name = 'a' ");
}

#[test]
fn test_translation_parts() {
    let parts = Translator::new().translate_parts(
        &options("$top=3&$filter=products/any(p: p/name eq 'a')&$orderby=id desc"),
        TranslateOptions::ALL,
        None,
    );
    assert_eq!(
        parts,
        Translation {
            select: "SELECT TOP 3 VALUE c FROM c".to_string(),
            joins: vec![JoinClause::new("p", "c.products")],
            join: "JOIN p IN c.products".to_string(),
            where_clause: "WHERE p.name = 'a'".to_string(),
            order_by: "ORDER BY c.id DESC".to_string(),
            item_limit: Some(3),
        }
    );
    assert_eq!(
        parts.to_string(),
        "SELECT TOP 3 VALUE c FROM c JOIN p IN c.products WHERE p.name = 'a' ORDER BY c.id DESC "
    );
}

#[test]
fn test_search_kept_out_of_query_text() {
    let query = options("$search=blue OR red&$filter=a eq 1");
    let translator = Translator::new();
    assert_eq!(
        translator.translate(&query, TranslateOptions::ALL, None),
        "SELECT * FROM c WHERE c.a = 1 "
    );
    let search = query.search.as_ref().unwrap();
    assert_eq!(translator.translate_search(search), "blue OR red");
}

#[test]
fn test_hand_built_options() {
    let options = QueryOptions::new()
        .select("englishName")
        .filter(QueryNode::eq(QueryNode::field("id"), QueryNode::string("1")))
        .order_by(OrderBy::desc(QueryNode::field("createdDateTime")))
        .top(2);
    assert_eq!(
        Translator::new().translate(&options, TranslateOptions::ALL, None),
        "SELECT TOP 2 c.englishName FROM c WHERE c.id = '1' ORDER BY c.createdDateTime DESC "
    );
}

#[test]
fn test_translator_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Translator>();

    let translator = std::sync::Arc::new(Translator::new());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let translator = translator.clone();
            std::thread::spawn(move || {
                let query = parse_query(&format!("$filter=items/any(x: x/n eq {})", i)).unwrap();
                translator.translate(&query, TranslateOptions::ALL, None)
            })
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(
            handle.join().unwrap(),
            format!("SELECT VALUE c FROM c JOIN x IN c.items WHERE x.n = {} ", i)
        );
    }
}
