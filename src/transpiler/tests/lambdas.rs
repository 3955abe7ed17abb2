//! any/all lambda rewriting tests.

use pretty_assertions::assert_eq;

use super::{filter, sql, sql_with};
use crate::parser::{parse_filter, parse_query};
use crate::transpiler::{JoinClause, TranslateOptions, Translator};

#[test]
fn test_membership_becomes_array_contains() {
    assert_eq!(
        sql("$filter=tags/any(t: t eq 'tag1')"),
        "SELECT * FROM c WHERE ARRAY_CONTAINS(c.tags,'tag1') "
    );
}

#[test]
fn test_membership_with_number_and_enum() {
    assert_eq!(filter("points/any(p: p eq 1)"), "ARRAY_CONTAINS(c.points,1)");
    assert_eq!(
        filter("enumNumbers/any(e: e eq Mock.Number'ONE')"),
        "ARRAY_CONTAINS(c.enumNumbers,'ONE')"
    );
    assert_eq!(filter("tags/any(t: 'x' eq t)"), "ARRAY_CONTAINS(c.tags,'x')");
}

#[test]
fn test_several_memberships() {
    assert_eq!(
        filter("tags/any(t: t eq 'a') and tags/any(t: t eq 'b') or ids/any(i: i eq 3)"),
        "ARRAY_CONTAINS(c.tags,'a') AND ARRAY_CONTAINS(c.tags,'b') OR ARRAY_CONTAINS(c.ids,3)"
    );
}

#[test]
fn test_property_predicate_becomes_join() {
    assert_eq!(
        sql("$filter=products/any(p: p/name eq 'test')"),
        "SELECT VALUE c FROM c JOIN p IN c.products WHERE p.name = 'test' "
    );
}

#[test]
fn test_two_joins_in_source_order() {
    assert_eq!(
        sql("$filter=products/any(p: p/name eq 'test') and locations/any(l: l/name eq 'test2')"),
        "SELECT VALUE c FROM c JOIN p IN c.products JOIN l IN c.locations \
         WHERE p.name = 'test' AND l.name = 'test2' "
    );
}

#[test]
fn test_join_over_deep_path() {
    assert_eq!(
        sql("$filter=competitor/competitorTwo/competitor/locations/any(j: j/name eq 'x')"),
        "SELECT VALUE c FROM c JOIN j IN c.competitor.competitorTwo.competitor.locations \
         WHERE j.name = 'x' "
    );
}

#[test]
fn test_nested_join_uses_outer_alias() {
    assert_eq!(
        sql("$filter=competitor/locations/any(j: j/locations/any(l: l/id eq 'test'))"),
        "SELECT VALUE c FROM c JOIN j IN c.competitor.locations JOIN l IN j.locations \
         WHERE l.id = 'test' "
    );
    assert_eq!(
        sql("$filter=payload/bet/legs/any(l: l/outcomes/any(o: o/competitor/id eq 'test'))"),
        "SELECT VALUE c FROM c JOIN l IN c.payload.bet.legs JOIN o IN l.outcomes \
         WHERE o.competitor.id = 'test' "
    );
}

#[test]
fn test_three_levels_of_nesting() {
    let (text, joins) = Translator::new().translate_filter(
        &parse_filter("legs/any(l: l/outcomes/any(o: o/markets/any(m: m/id eq 'x')))").unwrap(),
    );
    assert_eq!(text, "p.id = 'x'");
    assert_eq!(
        joins,
        vec![
            JoinClause::new("l", "c.legs"),
            JoinClause::new("o", "l.outcomes"),
            JoinClause::new("p", "o.markets"),
        ]
    );
}

#[test]
fn test_join_with_extra_predicate() {
    assert_eq!(
        sql_with("$filter=sportSummaries/any(x: x/single/totalAmount gt 0)", "1=1"),
        "SELECT VALUE c FROM c JOIN x IN c.sportSummaries \
         WHERE (1=1) AND (x.single.totalAmount > 0) "
    );
}

#[test]
fn test_join_next_to_root_predicate() {
    assert_eq!(
        filter("products/any(p: p/name eq 'test') and englishName eq 'test1'"),
        "p.name = 'test' AND c.englishName = 'test1'"
    );
}

#[test]
fn test_alias_collision_takes_next_letter() {
    let (text, joins) = Translator::new().translate_filter(
        &parse_filter("products/any(x: x/name eq 'a') and locations/any(x: x/name eq 'b')")
            .unwrap(),
    );
    assert_eq!(text, "x.name = 'a' AND d.name = 'b'");
    assert_eq!(
        joins,
        vec![JoinClause::new("x", "c.products"), JoinClause::new("d", "c.locations")]
    );
}

#[test]
fn test_variable_named_like_root_is_renamed() {
    assert_eq!(
        sql("$filter=products/any(c: c/name eq 'a')"),
        "SELECT VALUE c FROM c JOIN d IN c.products WHERE d.name = 'a' "
    );
}

#[test]
fn test_keyword_variables_get_generated_aliases() {
    assert_eq!(
        sql("$filter=products/any(group: group/id eq 'x')"),
        "SELECT VALUE c FROM c JOIN d IN c.products WHERE d.id = 'x' "
    );
    assert_eq!(
        sql("$filter=products/any(value: value/id eq 'x')"),
        "SELECT VALUE c FROM c JOIN d IN c.products WHERE d.id = 'x' "
    );
    assert_eq!(
        filter("products/any(select: select/id eq 'x') and items/any(in: in/n gt 1)"),
        "d.id = 'x' AND e.n > 1"
    );
}

#[test]
fn test_nested_aliases_increase() {
    let (text, joins) = Translator::new()
        .translate_filter(&parse_filter("a/any(z: z/b/any(y: y/v eq 1))").unwrap());
    assert_eq!(text, "z1.v = 1");
    assert_eq!(
        joins,
        vec![JoinClause::new("z", "c.a"), JoinClause::new("z1", "z.b")]
    );

    let (text, joins) = Translator::new()
        .translate_filter(&parse_filter("a/any(x: x/b/any(c: c/v eq 1))").unwrap());
    assert_eq!(text, "y.v = 1");
    assert_eq!(
        joins,
        vec![JoinClause::new("x", "c.a"), JoinClause::new("y", "x.b")]
    );
}

#[test]
fn test_inlined_body_keeps_precedence() {
    assert_eq!(
        filter("products/any(p: p/a eq 1 or p/b eq 2) and x eq 3"),
        "(p.a = 1 OR p.b = 2) AND c.x = 3"
    );
}

#[test]
fn test_explicit_projection_kept_with_join() {
    assert_eq!(
        sql("$select=id&$filter=products/any(p: p/name eq 'a')"),
        "SELECT c.id FROM c JOIN p IN c.products WHERE p.name = 'a' "
    );
}

#[test]
fn test_membership_inside_join() {
    assert_eq!(
        sql("$filter=legs/any(l: l/tags/any(t: t eq 'x') and l/qty gt 1)"),
        "SELECT VALUE c FROM c JOIN l IN c.legs WHERE ARRAY_CONTAINS(l.tags,'x') AND l.qty > 1 "
    );
}

#[test]
fn test_empty_any_is_length_test() {
    assert_eq!(
        sql("$filter=tags/any()"),
        "SELECT * FROM c WHERE ARRAY_LENGTH(c.tags) > 0 "
    );
}

#[test]
fn test_all_becomes_not_exists() {
    assert_eq!(
        sql("$filter=products/all(p: p/price gt 5)"),
        "SELECT * FROM c WHERE NOT EXISTS(SELECT VALUE p FROM p IN c.products WHERE NOT (p.price > 5)) "
    );
}

#[test]
fn test_any_inside_all_stays_a_subquery() {
    let (text, joins) = Translator::new()
        .translate_filter(&parse_filter("orders/all(o: o/lines/any(l: l/qty gt 0))").unwrap());
    assert_eq!(
        text,
        "NOT EXISTS(SELECT VALUE o FROM o IN c.orders WHERE NOT \
         (EXISTS(SELECT VALUE p FROM p IN o.lines WHERE p.qty > 0)))"
    );
    assert!(joins.is_empty());
}

#[test]
fn test_negated_any_stays_a_subquery() {
    assert_eq!(
        sql("$filter=not products/any(p: p/name eq 'a')"),
        "SELECT * FROM c WHERE NOT(EXISTS(SELECT VALUE p FROM p IN c.products WHERE p.name = 'a')) "
    );
}

#[test]
fn test_aliases_reset_between_calls() {
    let translator = Translator::new();
    let options =
        parse_query("$filter=products/any(x: x/a eq 1) and items/any(x: x/b eq 2)").unwrap();
    let first = translator.translate(&options, TranslateOptions::ALL, None);
    let second = translator.translate(&options, TranslateOptions::ALL, None);
    assert_eq!(first, second);
    assert_eq!(
        first,
        "SELECT VALUE c FROM c JOIN x IN c.products JOIN d IN c.items WHERE x.a = 1 AND d.b = 2 "
    );
}
