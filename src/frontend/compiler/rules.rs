//! The Pratt precedence ladder and per-token parse rule table
//! (spec.md §4.4, "Design Notes" §9: "a table indexed by token kind").
use crate::frontend::compiler::{Compiler, Ctx};
use crate::frontend::lexer::token::TokenKind;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub enum Precedence {
    None,
    Assignment, // =
    Or,         // or
    And,        // and
    Equality,   // == !=
    Comparison, // < > <= >=
    Term,       // + -
    Factor,     // * /
    Unary,      // ! -
    Call,       // . ()
    Primary,
}

impl Precedence {
    pub fn next(self) -> Precedence {
        match self {
            Precedence::None => Precedence::Assignment,
            Precedence::Assignment => Precedence::Or,
            Precedence::Or => Precedence::And,
            Precedence::And => Precedence::Equality,
            Precedence::Equality => Precedence::Comparison,
            Precedence::Comparison => Precedence::Term,
            Precedence::Term => Precedence::Factor,
            Precedence::Factor => Precedence::Unary,
            Precedence::Unary => Precedence::Call,
            Precedence::Call => Precedence::Primary,
            Precedence::Primary => Precedence::Primary,
        }
    }
}

pub type ParseFn = fn(&mut Ctx, &mut Compiler, bool);

pub struct ParseRule {
    pub prefix: Option<ParseFn>,
    pub infix: Option<ParseFn>,
    pub precedence: Precedence,
}

use crate::frontend::compiler::rules_fns::*;

pub fn get_rule(kind: TokenKind) -> ParseRule {
    use TokenKind::*;
    match kind {
        LeftParen => ParseRule { prefix: Some(grouping), infix: Some(call), precedence: Precedence::Call },
        Dot => ParseRule { prefix: None, infix: Some(dot), precedence: Precedence::Call },
        Minus => ParseRule { prefix: Some(unary), infix: Some(binary), precedence: Precedence::Term },
        Plus => ParseRule { prefix: None, infix: Some(binary), precedence: Precedence::Term },
        Slash => ParseRule { prefix: None, infix: Some(binary), precedence: Precedence::Factor },
        Star => ParseRule { prefix: None, infix: Some(binary), precedence: Precedence::Factor },
        Bang => ParseRule { prefix: Some(unary), infix: None, precedence: Precedence::None },
        BangEqual => ParseRule { prefix: None, infix: Some(binary), precedence: Precedence::Equality },
        EqualEqual => ParseRule { prefix: None, infix: Some(binary), precedence: Precedence::Equality },
        Greater => ParseRule { prefix: None, infix: Some(binary), precedence: Precedence::Comparison },
        GreaterEqual => ParseRule { prefix: None, infix: Some(binary), precedence: Precedence::Comparison },
        Less => ParseRule { prefix: None, infix: Some(binary), precedence: Precedence::Comparison },
        LessEqual => ParseRule { prefix: None, infix: Some(binary), precedence: Precedence::Comparison },
        Identifier => ParseRule { prefix: Some(variable), infix: None, precedence: Precedence::None },
        String => ParseRule { prefix: Some(string), infix: None, precedence: Precedence::None },
        Number => ParseRule { prefix: Some(number), infix: None, precedence: Precedence::None },
        And => ParseRule { prefix: None, infix: Some(and_), precedence: Precedence::And },
        Or => ParseRule { prefix: None, infix: Some(or_), precedence: Precedence::Or },
        False => ParseRule { prefix: Some(literal), infix: None, precedence: Precedence::None },
        Nil => ParseRule { prefix: Some(literal), infix: None, precedence: Precedence::None },
        True => ParseRule { prefix: Some(literal), infix: None, precedence: Precedence::None },
        This => ParseRule { prefix: Some(this_), infix: None, precedence: Precedence::None },
        Super => ParseRule { prefix: Some(super_), infix: None, precedence: Precedence::None },
        _ => ParseRule { prefix: None, infix: None, precedence: Precedence::None },
    }
}
