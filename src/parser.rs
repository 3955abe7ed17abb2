//! OData query option parser using nom.
//!
//! Parses `$filter`, `$orderby`, `$select`, `$top` and `$search` text into
//! the AST. The translator never needs it; it exists so the CLI and tests
//! can start from query strings.
//!
//! # Filter grammar
//!
//! ```text
//! or    := and ("or" and)*
//! and   := cmp ("and" cmp)*
//! cmp   := add (("eq"|"ne"|"gt"|"ge"|"lt"|"le") add)*
//! add   := mul (("add"|"sub") mul)*
//! mul   := has (("mul"|"div"|"mod") has)*
//! has   := unary ("has" unary)*
//! unary := "not" unary | "-" unary | "(" or ")" | literal | call | path
//! path  := segment ("/" segment)* ["/any(" [var ":" or] ")" | "/all(" var ":" or ")"]
//! ```

use chrono::{DateTime, NaiveDate};
use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while, take_while1, take_while_m_n},
    character::complete::{char, digit1, multispace0, multispace1, none_of, one_of, satisfy},
    combinator::{map, map_res, not, opt, recognize, value},
    error::{Error as NomError, ErrorKind},
    multi::{many0, separated_list0, separated_list1},
    sequence::{delimited, pair, preceded, terminated, tuple},
};
use uuid::Uuid;

use crate::ast::*;
use crate::error::{Error, Result};

/// Lambda variables visible at a point of the filter.
type Scope = [String];

/// Parse a `$filter` expression.
pub fn parse_filter(input: &str) -> Result<QueryNode> {
    finish(input, or_expr(input.trim(), &[]))
}

/// Parse an `$orderby` list: `companyId desc, id`.
pub fn parse_orderby(input: &str) -> Result<Vec<OrderBy>> {
    finish(
        input,
        separated_list1(tuple((multispace0, char(','), multispace0)), order_key)(input.trim()),
    )
}

/// Parse a `$search` expression: terms combined with `AND`, `OR`, `NOT`.
pub fn parse_search(input: &str) -> Result<QueryNode> {
    finish(input, search_or(input.trim()))
}

/// Parse a `$top` value.
pub fn parse_top(input: &str) -> Result<u64> {
    input
        .trim()
        .parse::<u64>()
        .map_err(|_| Error::invalid("$top", input.trim()))
}

/// Parse a full query string: `?$filter=...&$orderby=...&$top=10`.
///
/// Parameters without a `$` prefix are ignored. Values are taken as
/// written; percent-decoding is the caller's job.
pub fn parse_query(query: &str) -> Result<QueryOptions> {
    let query = query.trim();
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut options = QueryOptions::new();

    for param in split_params(query) {
        let (key, raw) = param.split_once('=').unwrap_or((param, ""));
        match key.trim() {
            "$filter" => options.filter = Some(parse_filter(raw)?),
            "$orderby" => options.order_by = parse_orderby(raw)?,
            "$select" => {
                let raw = raw.trim();
                if !raw.is_empty() && raw != "*" {
                    options.select = Some(raw.to_string());
                }
            }
            "$top" => options.top = Some(parse_top(raw)?),
            "$search" => options.search = Some(parse_search(raw)?),
            option if option.starts_with('$') => {
                return Err(Error::UnsupportedOption(option.to_string()));
            }
            other => tracing::trace!(param = other, "ignoring custom query parameter"),
        }
    }

    Ok(options)
}

/// Split on `&` outside string literals.
fn split_params(query: &str) -> Vec<&str> {
    let mut params = Vec::new();
    let mut in_string = false;
    let mut start = 0;
    for (i, c) in query.char_indices() {
        match c {
            '\'' => in_string = !in_string,
            '&' if !in_string => {
                params.push(&query[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    params.push(&query[start..]);
    params.into_iter().filter(|p| !p.trim().is_empty()).collect()
}

/// Convert a nom result over `source` into a crate result, requiring all
/// input to be consumed.
fn finish<T>(source: &str, result: IResult<&str, T>) -> Result<T> {
    match result {
        Ok((rest, value)) => {
            let rest = rest.trim();
            if rest.is_empty() {
                Ok(value)
            } else {
                Err(Error::parse(
                    position(source, rest),
                    format!("Unexpected trailing content: '{}'", rest),
                ))
            }
        }
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(Error::parse(
            position(source, e.input),
            format!("Unexpected input near '{}'", e.input.chars().take(20).collect::<String>()),
        )),
        Err(nom::Err::Incomplete(_)) => Err(Error::parse(source.len(), "Unexpected end of input")),
    }
}

fn position(source: &str, rest: &str) -> usize {
    source.trim_end().len().saturating_sub(rest.len())
}

fn fail<T>(input: &str, kind: ErrorKind) -> IResult<&str, T> {
    Err(nom::Err::Error(NomError::new(input, kind)))
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// A word not followed by an identifier character.
fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    terminated(tag(word), not(satisfy(is_ident_char)))
}

fn symbol(input: &str, c: char) -> IResult<&str, char> {
    preceded(multispace0, char(c))(input)
}

/// Parse an identifier (property, variable, function name).
fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c: char| c.is_alphabetic() || c == '_' || c == '$'),
        take_while(is_ident_char),
    ))(input)
}

/// Dotted identifier: `geo.distance`, `Namespace.Type`.
fn qualified_identifier(input: &str) -> IResult<&str, &str> {
    recognize(separated_list1(char('.'), identifier))(input)
}

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

const OR_OPS: &[BinaryOperator] = &[BinaryOperator::Or];
const AND_OPS: &[BinaryOperator] = &[BinaryOperator::And];
const CMP_OPS: &[BinaryOperator] = &[
    BinaryOperator::Equal,
    BinaryOperator::NotEqual,
    BinaryOperator::GreaterThan,
    BinaryOperator::GreaterThanOrEqual,
    BinaryOperator::LessThan,
    BinaryOperator::LessThanOrEqual,
];
const ADD_OPS: &[BinaryOperator] = &[BinaryOperator::Add, BinaryOperator::Subtract];
const MUL_OPS: &[BinaryOperator] = &[
    BinaryOperator::Multiply,
    BinaryOperator::Divide,
    BinaryOperator::Modulo,
];
const HAS_OPS: &[BinaryOperator] = &[BinaryOperator::Has];

/// One infix operator keyword from `ops`, with its surrounding whitespace.
fn operator<'a>(input: &'a str, ops: &[BinaryOperator]) -> IResult<&'a str, BinaryOperator> {
    let (rest, _) = multispace0(input)?;
    for op in ops {
        if let Ok((rest, _)) = keyword(op.keyword())(rest) {
            let (rest, _) = multispace0(rest)?;
            return Ok((rest, *op));
        }
    }
    fail(input, ErrorKind::Tag)
}

/// Left-associative chain of one precedence level.
fn binary_level<'a>(
    input: &'a str,
    scope: &Scope,
    ops: &[BinaryOperator],
    next: fn(&'a str, &Scope) -> IResult<&'a str, QueryNode>,
) -> IResult<&'a str, QueryNode> {
    let (mut input, mut left) = next(input, scope)?;
    loop {
        match operator(input, ops) {
            Ok((rest, op)) => {
                let (rest, right) = next(rest, scope)?;
                left = QueryNode::binary(op, left, right);
                input = rest;
            }
            Err(nom::Err::Error(_)) => return Ok((input, left)),
            Err(e) => return Err(e),
        }
    }
}

fn or_expr<'a>(input: &'a str, scope: &Scope) -> IResult<&'a str, QueryNode> {
    binary_level(input, scope, OR_OPS, and_expr)
}

fn and_expr<'a>(input: &'a str, scope: &Scope) -> IResult<&'a str, QueryNode> {
    binary_level(input, scope, AND_OPS, cmp_expr)
}

fn cmp_expr<'a>(input: &'a str, scope: &Scope) -> IResult<&'a str, QueryNode> {
    binary_level(input, scope, CMP_OPS, add_expr)
}

fn add_expr<'a>(input: &'a str, scope: &Scope) -> IResult<&'a str, QueryNode> {
    binary_level(input, scope, ADD_OPS, mul_expr)
}

fn mul_expr<'a>(input: &'a str, scope: &Scope) -> IResult<&'a str, QueryNode> {
    binary_level(input, scope, MUL_OPS, has_expr)
}

fn has_expr<'a>(input: &'a str, scope: &Scope) -> IResult<&'a str, QueryNode> {
    binary_level(input, scope, HAS_OPS, unary_expr)
}

fn unary_expr<'a>(input: &'a str, scope: &Scope) -> IResult<&'a str, QueryNode> {
    let (input, _) = multispace0(input)?;

    if let Ok((rest, _)) = keyword("not")(input) {
        let (rest, operand) = unary_expr(rest, scope)?;
        return Ok((rest, QueryNode::not(operand)));
    }

    // `-5` is a literal; `-price` is a negation.
    if let Some(rest) = input.strip_prefix('-')
        && !rest.starts_with(|c: char| c.is_ascii_digit())
    {
        let (rest, operand) = unary_expr(rest, scope)?;
        return Ok((rest, QueryNode::unary(UnaryOperator::Negate, operand)));
    }

    primary(input, scope)
}

fn primary<'a>(input: &'a str, scope: &Scope) -> IResult<&'a str, QueryNode> {
    if let Ok((rest, _)) = symbol(input, '(') {
        let (rest, inner) = or_expr(rest, scope)?;
        let (rest, _) = symbol(rest, ')')?;
        return Ok((rest, inner));
    }

    if let Ok((rest, constant)) = literal(input) {
        return Ok((rest, QueryNode::Constant(constant)));
    }

    member_expr(input, scope)
}

// ---------------------------------------------------------------------------
// Paths, calls and lambdas
// ---------------------------------------------------------------------------

fn member_expr<'a>(input: &'a str, scope: &Scope) -> IResult<&'a str, QueryNode> {
    let (input, name) = qualified_identifier(input)?;

    if input.starts_with('(') {
        let (input, arguments) = call_arguments(input, scope)?;
        return Ok((input, QueryNode::function(name, arguments)));
    }

    let head = if name == "$it" {
        QueryNode::root()
    } else if scope.iter().any(|v| v == name) {
        QueryNode::variable(name)
    } else {
        QueryNode::property(QueryNode::root(), name)
    };
    path_tail(input, head, scope)
}

fn path_tail<'a>(
    mut input: &'a str,
    mut node: QueryNode,
    scope: &Scope,
) -> IResult<&'a str, QueryNode> {
    loop {
        let Ok((rest, _)) = char::<_, NomError<&str>>('/')(input) else {
            return Ok((input, node));
        };
        let (rest, segment) = qualified_identifier(rest)?;
        match segment {
            "any" | "all" if rest.starts_with('(') => {
                return lambda(rest, node, segment == "any", scope);
            }
            _ => {
                node = QueryNode::property(node, segment);
                input = rest;
            }
        }
    }
}

/// `(var: body)` after `any`/`all`; `any()` takes no variable.
fn lambda<'a>(
    input: &'a str,
    source: QueryNode,
    is_any: bool,
    scope: &Scope,
) -> IResult<&'a str, QueryNode> {
    let (input, _) = char('(')(input)?;

    if is_any && let Ok((rest, _)) = symbol(input, ')') {
        return Ok((rest, QueryNode::any_element(source)));
    }

    let (input, _) = multispace0(input)?;
    let (input, variable) = identifier(input)?;
    let (input, _) = symbol(input, ':')?;

    let mut inner: Vec<String> = scope.to_vec();
    inner.push(variable.to_string());
    let (input, body) = or_expr(input, &inner)?;
    let (input, _) = symbol(input, ')')?;

    let node = if is_any {
        QueryNode::any(source, variable, body)
    } else {
        QueryNode::all(source, variable, body)
    };
    Ok((input, node))
}

fn call_arguments<'a>(input: &'a str, scope: &Scope) -> IResult<&'a str, Vec<QueryNode>> {
    let (input, _) = char('(')(input)?;
    let (input, _) = multispace0(input)?;
    let (input, arguments) =
        separated_list0(|i: &'a str| symbol(i, ','), |i: &'a str| or_expr(i, scope))(input)?;
    let (input, _) = symbol(input, ')')?;
    Ok((input, arguments))
}

// ---------------------------------------------------------------------------
// Literals
// ---------------------------------------------------------------------------

fn literal(input: &str) -> IResult<&str, Constant> {
    alt((
        value(Constant::Null, keyword("null")),
        value(Constant::Boolean(true), keyword("true")),
        value(Constant::Boolean(false), keyword("false")),
        geography_literal,
        map(string_literal, Constant::String),
        map(guid_literal, Constant::Guid),
        map(datetime_literal, Constant::DateTime),
        map(date_literal, Constant::Date),
        map(number_literal, |n| Constant::Number(n.to_string())),
        enum_literal,
    ))(input)
}

/// `'text'` with `''` as an escaped quote.
fn string_literal(input: &str) -> IResult<&str, String> {
    map(
        delimited(
            char('\''),
            many0(alt((value('\'', tag("''")), none_of("'")))),
            char('\''),
        ),
        |chars| chars.into_iter().collect(),
    )(input)
}

fn number_literal(input: &str) -> IResult<&str, &str> {
    terminated(
        recognize(tuple((
            opt(char('-')),
            digit1,
            opt(pair(char('.'), digit1)),
            opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
        ))),
        not(satisfy(is_ident_char)),
    )(input)
}

fn is_hex(c: char) -> bool {
    c.is_ascii_hexdigit()
}

fn guid_literal(input: &str) -> IResult<&str, Uuid> {
    map_res(
        terminated(
            recognize(tuple((
                take_while_m_n(8, 8, is_hex),
                char('-'),
                take_while_m_n(4, 4, is_hex),
                char('-'),
                take_while_m_n(4, 4, is_hex),
                char('-'),
                take_while_m_n(4, 4, is_hex),
                char('-'),
                take_while_m_n(12, 12, is_hex),
            ))),
            not(satisfy(is_ident_char)),
        ),
        Uuid::parse_str,
    )(input)
}

fn digits<'a>(n: usize) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    take_while_m_n(n, n, |c: char| c.is_ascii_digit())
}

fn date_part(input: &str) -> IResult<&str, &str> {
    recognize(tuple((digits(4), char('-'), digits(2), char('-'), digits(2))))(input)
}

fn date_literal(input: &str) -> IResult<&str, NaiveDate> {
    map_res(terminated(date_part, not(satisfy(is_ident_char))), |s| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
    })(input)
}

fn datetime_literal(input: &str) -> IResult<&str, DateTime<chrono::FixedOffset>> {
    map_res(
        recognize(tuple((
            date_part,
            one_of("Tt"),
            take_while1(|c: char| c.is_ascii_digit() || matches!(c, ':' | '.' | '+' | '-' | 'Z' | 'z')),
        ))),
        DateTime::parse_from_rfc3339,
    )(input)
}

/// `Namespace.Type'Member'`
fn enum_literal(input: &str) -> IResult<&str, Constant> {
    map(pair(qualified_identifier, string_literal), |(type_name, member)| {
        Constant::enum_member(type_name, member)
    })(input)
}

fn coordinate(input: &str) -> IResult<&str, f64> {
    map_res(
        recognize(tuple((
            opt(char('-')),
            digit1,
            opt(pair(char('.'), digit1)),
        ))),
        str::parse::<f64>,
    )(input)
}

fn geo_point(input: &str) -> IResult<&str, GeoPoint> {
    let (input, _) = multispace0(input)?;
    let (input, longitude) = coordinate(input)?;
    let (input, _) = multispace1(input)?;
    let (input, latitude) = coordinate(input)?;
    let (input, _) = multispace0(input)?;
    Ok((input, GeoPoint::new(longitude, latitude)))
}

fn geo_points(input: &str) -> IResult<&str, Vec<GeoPoint>> {
    separated_list0(char(','), geo_point)(input)
}

fn geo_ring(input: &str) -> IResult<&str, Vec<GeoPoint>> {
    delimited(symbol_then('('), geo_points, symbol_then(')'))(input)
}

fn symbol_then<'a>(c: char) -> impl FnMut(&'a str) -> IResult<&'a str, char> {
    delimited(multispace0, char(c), multispace0)
}

/// `geography'POINT(lon lat)'`, `LINESTRING(...)`, `POLYGON((...),(...))`,
/// with an optional `SRID=n;` prefix. Shapes without any position fail.
fn geography_literal(input: &str) -> IResult<&str, Constant> {
    let (input, _) = tag_no_case("geography'")(input)?;
    let (input, _) = opt(tuple((tag_no_case("SRID="), digit1, char(';'))))(input)?;
    let (input, shape) = alt((
        map(preceded(tag_no_case("POINT"), geo_ring), |points| {
            match points.as_slice() {
                [point] => Some(Constant::GeographyPoint(*point)),
                _ => None,
            }
        }),
        map(preceded(tag_no_case("LINESTRING"), geo_ring), |points| {
            (!points.is_empty()).then_some(Constant::GeographyLineString(points))
        }),
        map(
            preceded(
                tag_no_case("POLYGON"),
                delimited(
                    symbol_then('('),
                    separated_list1(symbol_then(','), geo_ring),
                    symbol_then(')'),
                ),
            ),
            |rings: Vec<Vec<GeoPoint>>| {
                rings
                    .iter()
                    .any(|ring| !ring.is_empty())
                    .then_some(Constant::GeographyPolygon(rings))
            },
        ),
    ))(input)?;
    let (input, _) = char('\'')(input)?;
    match shape {
        Some(constant) => Ok((input, constant)),
        None => fail(input, ErrorKind::Verify),
    }
}

// ---------------------------------------------------------------------------
// $orderby
// ---------------------------------------------------------------------------

fn order_key(input: &str) -> IResult<&str, OrderBy> {
    let (input, expression) = or_expr(input, &[])?;
    let (input, direction) = opt(preceded(
        multispace1,
        alt((
            value(OrderDirection::Ascending, keyword("asc")),
            value(OrderDirection::Descending, keyword("desc")),
        )),
    ))(input)?;
    Ok((
        input,
        OrderBy {
            expression,
            direction: direction.unwrap_or_default(),
        },
    ))
}

// ---------------------------------------------------------------------------
// $search
// ---------------------------------------------------------------------------

fn is_search_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '(' | ')' | '"')
}

fn search_keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    terminated(tag(word), not(satisfy(is_search_char)))
}

fn search_or(input: &str) -> IResult<&str, QueryNode> {
    let (mut input, mut left) = search_and(input)?;
    while let Ok((rest, _)) = delimited(multispace1, search_keyword("OR"), multispace1)(input) {
        let (rest, right) = search_and(rest)?;
        left = QueryNode::or(left, right);
        input = rest;
    }
    Ok((input, left))
}

/// Terms separated by `AND` or plain whitespace.
fn search_and(input: &str) -> IResult<&str, QueryNode> {
    let (mut input, mut left) = search_unary(input)?;
    loop {
        let Ok((rest, _)) = multispace1::<_, NomError<&str>>(input) else {
            break;
        };
        let rest = match terminated(search_keyword("AND"), multispace1)(rest) {
            Ok((rest, _)) => rest,
            Err(_) => rest,
        };
        if search_keyword("OR")(rest).is_ok() {
            break;
        }
        match search_unary(rest) {
            Ok((rest, right)) => {
                left = QueryNode::and(left, right);
                input = rest;
            }
            Err(_) => break,
        }
    }
    Ok((input, left))
}

fn search_unary(input: &str) -> IResult<&str, QueryNode> {
    if let Ok((rest, _)) = terminated(search_keyword("NOT"), multispace1)(input) {
        let (rest, operand) = search_unary(rest)?;
        return Ok((rest, QueryNode::not(operand)));
    }
    if let Ok((rest, _)) = char::<_, NomError<&str>>('(')(input) {
        let (rest, _) = multispace0(rest)?;
        let (rest, inner) = search_or(rest)?;
        let (rest, _) = symbol(rest, ')')?;
        return Ok((rest, inner));
    }
    search_term(input)
}

fn search_term(input: &str) -> IResult<&str, QueryNode> {
    let phrase = delimited(char('"'), take_while1(|c: char| c != '"'), char('"'));
    let (rest, text) = alt((phrase, take_while1(is_search_char)))(input)?;
    if matches!(text, "AND" | "OR" | "NOT") {
        return fail(input, ErrorKind::Verify);
    }
    Ok((rest, QueryNode::SearchTerm(text.to_string())))
}
