//! Best-effort rendering of syntax nodes back to compact source text.
//!
//! Token streams print with spaces between every token (`Vec < String >`);
//! the type and expression texts flowing through the pipeline are compared
//! and parsed as strings, so the spacing is normalized away.

use quote::ToTokens;

/// Renders an expression to compact text (e.g. `h.get`, `StatusCode::OK`).
pub fn expr_to_string(expr: &syn::Expr) -> String {
    compact(&expr.to_token_stream().to_string())
}

/// Renders a type to compact text (e.g. `Vec<String>`, `&mut Ctx`).
pub fn type_to_string(ty: &syn::Type) -> String {
    compact(&ty.to_token_stream().to_string())
}

/// Renders a path to compact text (e.g. `crate::handlers::User`).
pub fn path_to_string(path: &syn::Path) -> String {
    compact(&path.to_token_stream().to_string())
}

/// Removes the spaces a token-stream printer inserts around punctuation.
fn compact(rendered: &str) -> String {
    const TIGHT: &[char] = &[
        ':', '<', '>', ',', '&', '.', '(', ')', '[', ']', '#', '!', ';', '\'',
    ];

    let chars: Vec<char> = rendered.chars().collect();
    let mut out = String::with_capacity(chars.len());
    for (i, &c) in chars.iter().enumerate() {
        if c == ' ' {
            let prev = out.chars().last();
            let next = chars[i + 1..].iter().find(|c| **c != ' ');
            let tight_prev = prev.map(|p| TIGHT.contains(&p)).unwrap_or(true);
            let tight_next = next.map(|n| TIGHT.contains(n)).unwrap_or(true);
            if tight_prev || tight_next {
                continue;
            }
        }
        out.push(c);
    }
    out.trim().to_string()
}
