use std::fmt::{Display, Formatter};

use log::debug;
use nom::character::complete::char as cchar;
use nom::character::complete::{anychar, multispace0};
use nom::error::Error;
use proc_macro2::TokenStream;
use quote::{quote, ToTokens};
use thompson_nfa_util::Symbol;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ast {
    Literal(Symbol),
    Union(Box<Ast>, Box<Ast>),
    Concat(Box<Ast>, Box<Ast>),
    Star(Box<Ast>),
}

impl Ast {
    pub fn char(c: char) -> Ast {
        Ast::Literal(Symbol::Char(c))
    }

    pub fn epsilon() -> Ast {
        Ast::Literal(Symbol::Epsilon)
    }

    pub fn union(left: Ast, right: Ast) -> Ast {
        Ast::Union(Box::new(left), Box::new(right))
    }

    pub fn concat(left: Ast, right: Ast) -> Ast {
        Ast::Concat(Box::new(left), Box::new(right))
    }

    pub fn star(inner: Ast) -> Ast {
        Ast::Star(Box::new(inner))
    }

    /// `e!`, three or more occurrences: `e e e*`.
    pub fn at_least_three(inner: Ast) -> Ast {
        Ast::concat(inner.clone(), Ast::concat(inner.clone(), Ast::star(inner)))
    }
}

/// Prints a fully parenthesised expression that parses back to the same tree.
impl Display for Ast {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Ast::Literal(s) => write!(f, "{}", s.input_char()),
            Ast::Union(l, r) => write!(f, "({l}+{r})"),
            Ast::Concat(l, r) => write!(f, "({l}{r})"),
            // Only one postfix operator is allowed per base
            Ast::Star(inner) if matches!(**inner, Ast::Star(_)) => write!(f, "({inner})*"),
            Ast::Star(inner) => write!(f, "{inner}*"),
        }
    }
}

/// Expands to the constructor expression rebuilding this tree.
impl ToTokens for Ast {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let root = quote! { ::thompson_nfa_regex_transformer };
        tokens.extend(match self {
            Ast::Literal(Symbol::Char(c)) => quote! {
                #root::Ast::Literal(#root::Symbol::Char(#c))
            },
            Ast::Literal(Symbol::Epsilon) => quote! {
                #root::Ast::Literal(#root::Symbol::Epsilon)
            },
            Ast::Union(l, r) => quote! {
                #root::Ast::Union(::std::boxed::Box::new(#l), ::std::boxed::Box::new(#r))
            },
            Ast::Concat(l, r) => quote! {
                #root::Ast::Concat(::std::boxed::Box::new(#l), ::std::boxed::Box::new(#r))
            },
            Ast::Star(inner) => quote! {
                #root::Ast::Star(::std::boxed::Box::new(#inner))
            },
        });
    }
}

/// Deepest group nesting, and tallest tree, the parser accepts. Everything
/// that walks an `Ast` recurses once per level.
pub const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    #[error("unexpected character '{found}' at position {position}")]
    UnexpectedCharacter { found: char, position: usize },
    #[error("unexpected end of input at position {position}")]
    UnexpectedEnd { position: usize },
    #[error("unmatched ')' at position {position}")]
    UnmatchedClose { position: usize },
    #[error("'(' at position {position} is never closed")]
    UnclosedOpen { position: usize },
    #[error("missing operand at position {position}")]
    EmptyOperand { position: usize },
    #[error("expression nests more than {} levels deep at position {position}", MAX_DEPTH)]
    TooDeep { position: usize },
}

impl SyntaxError {
    /// Character offset into the parsed input.
    pub fn position(&self) -> usize {
        match self {
            SyntaxError::UnexpectedCharacter { position, .. }
            | SyntaxError::UnexpectedEnd { position }
            | SyntaxError::UnmatchedClose { position }
            | SyntaxError::UnclosedOpen { position }
            | SyntaxError::EmptyOperand { position }
            | SyntaxError::TooDeep { position } => *position,
        }
    }
}

type PResult<'a, T> = Result<(&'a str, T), SyntaxError>;

fn skip_whitespace(input: &str) -> &str {
    multispace0::<_, Error<_>>(input).map_or(input, |(r, _)| r)
}

fn starts_base(input: &str) -> bool {
    match anychar::<_, Error<_>>(skip_whitespace(input)) {
        Ok((_, '(')) => true,
        Ok((_, c)) => Symbol::from_input(c).is_some(),
        Err(_) => false,
    }
}

/// A parsed subtree and its height, leaves being 0.
struct Tree {
    ast: Ast,
    height: usize,
}

impl Tree {
    fn leaf(symbol: Symbol) -> Tree {
        Tree { ast: Ast::Literal(symbol), height: 0 }
    }
}

struct ExprParser<'a> {
    source: &'a str,
    depth: usize,
}

impl<'a> ExprParser<'a> {
    fn position(&self, rest: &str) -> usize {
        self.source[..self.source.len() - rest.len()].chars().count()
    }

    fn unexpected(&self, rest: &'a str, found: char) -> SyntaxError {
        SyntaxError::UnexpectedCharacter { found, position: self.position(rest) }
    }

    /// Wraps `ast` unless its height passes [`MAX_DEPTH`], blaming the operand at `at`.
    fn grow(&self, at: &'a str, ast: Ast, height: usize) -> Result<Tree, SyntaxError> {
        if height > MAX_DEPTH {
            return Err(SyntaxError::TooDeep { position: self.position(skip_whitespace(at)) });
        }
        Ok(Tree { ast, height })
    }

    // expr := term ('+' term)*
    fn expr(&mut self, input: &'a str) -> PResult<'a, Tree> {
        let (mut rm, mut tree) = self.term(input, false)?;
        loop {
            let r = skip_whitespace(rm);
            match cchar::<_, Error<_>>('+')(r) {
                Ok((r, _)) => {
                    let (next, right) = self.term(r, true)?;
                    let height = tree.height.max(right.height) + 1;
                    tree = self.grow(r, Ast::union(tree.ast, right.ast), height)?;
                    rm = next;
                }
                Err(_) => return Ok((r, tree)),
            }
        }
    }

    // term := factor factor*
    fn term(&mut self, input: &'a str, after_union: bool) -> PResult<'a, Tree> {
        let (mut rm, mut tree) = self.factor(input, after_union)?;
        while starts_base(rm) {
            let (next, right) = self.factor(rm, false)?;
            let height = tree.height.max(right.height) + 1;
            tree = self.grow(rm, Ast::concat(tree.ast, right.ast), height)?;
            rm = next;
        }
        Ok((rm, tree))
    }

    // factor := base ('*' | '!')?
    fn factor(&mut self, input: &'a str, after_union: bool) -> PResult<'a, Tree> {
        let (r, base) = self.base(input, after_union)?;
        let r = skip_whitespace(r);
        if let Ok((next, _)) = cchar::<_, Error<_>>('*')(r) {
            return Ok((next, self.grow(r, Ast::star(base.ast), base.height + 1)?));
        }
        if let Ok((next, _)) = cchar::<_, Error<_>>('!')(r) {
            // e (e e*) sits three levels above e
            return Ok((next, self.grow(r, Ast::at_least_three(base.ast), base.height + 3)?));
        }
        Ok((r, base))
    }

    // base := '(' expr ')' | CHAR
    fn base(&mut self, input: &'a str, after_union: bool) -> PResult<'a, Tree> {
        let input = skip_whitespace(input);

        match anychar::<_, Error<_>>(input) {
            Err(_) if after_union => Err(SyntaxError::EmptyOperand { position: self.position(input) }),
            Err(_) => Err(SyntaxError::UnexpectedEnd { position: self.position(input) }),
            Ok((r, '(')) => {
                if skip_whitespace(r).is_empty() {
                    return Err(SyntaxError::UnclosedOpen { position: self.position(input) });
                }
                self.depth += 1;
                if self.depth > MAX_DEPTH {
                    return Err(SyntaxError::TooDeep { position: self.position(input) });
                }
                let (r, inner) = self.expr(r)?;
                match anychar::<_, Error<_>>(r) {
                    Ok((r, ')')) => {
                        self.depth -= 1;
                        Ok((r, inner))
                    }
                    Ok((_, c)) => Err(self.unexpected(r, c)),
                    Err(_) => Err(SyntaxError::UnclosedOpen { position: self.position(input) }),
                }
            }
            Ok((_, ')')) if self.depth == 0 => Err(SyntaxError::UnmatchedClose { position: self.position(input) }),
            Ok((_, ')' | '+')) => Err(SyntaxError::EmptyOperand { position: self.position(input) }),
            Ok((r, c)) => match Symbol::from_input(c) {
                Some(symbol) => Ok((r, Tree::leaf(symbol))),
                None => Err(self.unexpected(input, c)),
            },
        }
    }
}

pub fn parse(input: &str) -> Result<Ast, SyntaxError> {
    let mut parser = ExprParser { source: input, depth: 0 };
    let (r, tree) = parser.expr(input)?;
    let r = skip_whitespace(r);

    match anychar::<_, Error<_>>(r) {
        Err(_) => {
            debug!("parsed {input:?} to a tree of height {}", tree.height);
            Ok(tree.ast)
        }
        Ok((_, ')')) => Err(SyntaxError::UnmatchedClose { position: parser.position(r) }),
        Ok((_, c)) => Err(parser.unexpected(r, c)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[test]
    fn single_literal() {
        assert_eq!(parse("a").unwrap(), Ast::char('a'));
        assert_eq!(parse("λ").unwrap(), Ast::epsilon());
    }

    #[test]
    fn precedence() {
        // union < concat < star
        let expected = Ast::union(Ast::char('a'), Ast::concat(Ast::char('b'), Ast::star(Ast::char('c'))));
        assert_eq!(parse("a+bc*").unwrap(), expected);
    }

    #[test]
    fn binary_operators_are_left_associative() {
        assert_eq!(
            parse("a+b+c").unwrap(),
            Ast::union(Ast::union(Ast::char('a'), Ast::char('b')), Ast::char('c'))
        );
        assert_eq!(
            parse("abc").unwrap(),
            Ast::concat(Ast::concat(Ast::char('a'), Ast::char('b')), Ast::char('c'))
        );
    }

    #[test]
    fn groups_regroup() {
        assert_eq!(
            parse("(a+b)*c").unwrap(),
            Ast::concat(Ast::star(Ast::union(Ast::char('a'), Ast::char('b'))), Ast::char('c'))
        );
        assert_eq!(parse("((a))").unwrap(), Ast::char('a'));
    }

    #[test]
    fn whitespace_is_ignored() {
        assert_eq!(parse(" ( a + b ) * c ").unwrap(), parse("(a+b)*c").unwrap());
    }

    #[test]
    fn bang_desugars_to_three_or_more() {
        assert_eq!(parse("a!").unwrap(), Ast::at_least_three(Ast::char('a')));
        assert_eq!(
            parse("a!").unwrap(),
            Ast::concat(Ast::char('a'), Ast::concat(Ast::char('a'), Ast::star(Ast::char('a'))))
        );
        assert_eq!(
            parse("(ab)!").unwrap(),
            Ast::at_least_three(Ast::concat(Ast::char('a'), Ast::char('b')))
        );
    }

    #[rstest]
    #[case("", SyntaxError::UnexpectedEnd { position: 0 })]
    #[case("   ", SyntaxError::UnexpectedEnd { position: 3 })]
    #[case("a+", SyntaxError::EmptyOperand { position: 2 })]
    #[case("+a", SyntaxError::EmptyOperand { position: 0 })]
    #[case("a++b", SyntaxError::EmptyOperand { position: 2 })]
    #[case("()", SyntaxError::EmptyOperand { position: 1 })]
    #[case("(a+)", SyntaxError::EmptyOperand { position: 3 })]
    #[case("(a", SyntaxError::UnclosedOpen { position: 0 })]
    #[case("(", SyntaxError::UnclosedOpen { position: 0 })]
    #[case("a(b", SyntaxError::UnclosedOpen { position: 1 })]
    #[case("((a)", SyntaxError::UnclosedOpen { position: 0 })]
    #[case("a)", SyntaxError::UnmatchedClose { position: 1 })]
    #[case("(a))", SyntaxError::UnmatchedClose { position: 3 })]
    #[case(")", SyntaxError::UnmatchedClose { position: 0 })]
    #[case("1", SyntaxError::UnexpectedCharacter { found: '1', position: 0 })]
    #[case("aB", SyntaxError::UnexpectedCharacter { found: 'B', position: 1 })]
    #[case("*a", SyntaxError::UnexpectedCharacter { found: '*', position: 0 })]
    #[case("a**", SyntaxError::UnexpectedCharacter { found: '*', position: 2 })]
    #[case("a*!", SyntaxError::UnexpectedCharacter { found: '!', position: 2 })]
    #[case("(a1)", SyntaxError::UnexpectedCharacter { found: '1', position: 2 })]
    #[case("λ|", SyntaxError::UnexpectedCharacter { found: '|', position: 1 })]
    fn rejects(#[case] input: &str, #[case] expected: SyntaxError) {
        assert_eq!(parse(input), Err(expected));
    }

    #[test]
    fn deep_group_nesting_is_rejected() {
        let input = format!("{}a{}", "(".repeat(10_000), ")".repeat(10_000));
        assert_eq!(parse(&input), Err(SyntaxError::TooDeep { position: MAX_DEPTH }));

        let at_limit = format!("{}a{}", "(".repeat(MAX_DEPTH), ")".repeat(MAX_DEPTH));
        assert_eq!(parse(&at_limit), Ok(Ast::char('a')));
    }

    #[test]
    fn tall_trees_are_rejected() {
        // a flat word is a left-deep chain of concatenations
        let word = "a".repeat(200_000);
        assert_eq!(parse(&word), Err(SyntaxError::TooDeep { position: MAX_DEPTH + 1 }));
        assert!(parse(&"a".repeat(MAX_DEPTH + 1)).is_ok());

        let stars = format!("{}a{}", "(".repeat(MAX_DEPTH), ")*".repeat(MAX_DEPTH));
        assert!(parse(&stars).is_ok());

        // each `!` adds three levels, the 86th passes the limit
        let bangs = format!("{}a{}", "(".repeat(100), ")!".repeat(100));
        assert_eq!(parse(&bangs), Err(SyntaxError::TooDeep { position: 100 + 2 * 86 }));
    }

    #[test]
    fn error_messages_carry_position() {
        let err = parse("ab(c").unwrap_err();
        assert_eq!(err.position(), 2);
        assert_eq!(err.to_string(), "'(' at position 2 is never closed");
    }

    #[test]
    fn display_reparses() {
        for input in ["a", "a+b", "ab*", "(a+b)*c", "λ+a", "(a*)*", "a!"] {
            let ast = parse(input).unwrap();
            assert_eq!(parse(&ast.to_string()).unwrap(), ast, "{input} -> {ast}");
        }
    }

    #[test]
    fn tokens_rebuild_tree() {
        let tokens = parse("a+λ*").unwrap().to_token_stream().to_string();
        assert!(tokens.contains("Union"));
        assert!(tokens.contains("Epsilon"));
        assert!(tokens.contains("Star"));
        assert!(tokens.contains("'a'"));
    }

    fn arb_ast() -> impl Strategy<Value = Ast> {
        let leaf = prop_oneof![
            (b'a'..=b'z').prop_map(|b| Ast::char(b as char)),
            Just(Ast::epsilon()),
        ];
        leaf.prop_recursive(4, 32, 2, |inner| {
            prop_oneof![
                (inner.clone(), inner.clone()).prop_map(|(l, r)| Ast::union(l, r)),
                (inner.clone(), inner.clone()).prop_map(|(l, r)| Ast::concat(l, r)),
                inner.prop_map(Ast::star),
            ]
        })
    }

    proptest! {
        #[test]
        fn printed_tree_parses_back(ast in arb_ast()) {
            prop_assert_eq!(parse(&ast.to_string()).unwrap(), ast);
        }

        #[test]
        fn never_panics(input in "[a-c()+*!λ 1]{0,12}") {
            let _ = parse(&input);
        }
    }
}
