use proc_macro2::Span;
use quote::ToTokens;
use syn::{parse_macro_input, Lit};
use thompson_nfa_regex_transformer::parse;

/// Parses an expression literal at compile time and expands to its `Ast`.
///
/// A syntax error in the literal becomes a compile error pointing at it.
#[proc_macro]
pub fn regex_ast(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(input as syn::Expr);

    let lit_str = if let syn::Expr::Lit(syn::ExprLit { lit: Lit::Str(lit_str), .. }) = input {
        lit_str
    } else {
        return syn::Error::new(Span::call_site(), "expected a string literal")
            .to_compile_error()
            .into();
    };

    match parse(&lit_str.value()) {
        Ok(ast) => ast.to_token_stream().into(),
        Err(e) => syn::Error::new(lit_str.span(), format!("invalid expression: {e}"))
            .to_compile_error()
            .into(),
    }
}
