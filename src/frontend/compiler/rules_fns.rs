//! Prefix/infix parse functions dispatched through [`super::rules::get_rule`].
//! Each has the `fn(&mut Ctx, &mut Compiler, bool)` shape required to sit in
//! the rule table; the `bool` is `can_assign`, only meaningful to
//! [`named_variable`]/[`dot`].
use super::rules::Precedence;
use super::{
    argument_list, consume, emit_byte, emit_constant, emit_op, emit_ops, error, identifier_constant, match_token,
    parse_precedence, resolve_local, resolve_upvalue, Compiler, Ctx,
};
use crate::common::opcode::OpCode;
use crate::common::value::Value;
use crate::frontend::lexer::token::TokenKind;

pub(super) fn grouping(ctx: &mut Ctx, compiler: &mut Compiler, _can_assign: bool) {
    super::expression(ctx, compiler);
    consume(ctx, TokenKind::RightParen, "Expect ')' after expression.");
}

pub(super) fn unary(ctx: &mut Ctx, compiler: &mut Compiler, _can_assign: bool) {
    let operator = ctx.parser.previous.kind;
    parse_precedence(ctx, compiler, Precedence::Unary);
    match operator {
        TokenKind::Bang => emit_op(ctx, compiler, OpCode::Not),
        TokenKind::Minus => emit_op(ctx, compiler, OpCode::Negate),
        _ => unreachable!(),
    }
}

pub(super) fn binary(ctx: &mut Ctx, compiler: &mut Compiler, _can_assign: bool) {
    let operator = ctx.parser.previous.kind;
    let rule_precedence = super::rules::get_rule(operator).precedence;
    parse_precedence(ctx, compiler, rule_precedence.next());

    match operator {
        TokenKind::BangEqual => {
            emit_op(ctx, compiler, OpCode::Equal);
            emit_op(ctx, compiler, OpCode::Not);
        }
        TokenKind::EqualEqual => emit_op(ctx, compiler, OpCode::Equal),
        TokenKind::Greater => emit_op(ctx, compiler, OpCode::Greater),
        TokenKind::GreaterEqual => {
            emit_op(ctx, compiler, OpCode::Less);
            emit_op(ctx, compiler, OpCode::Not);
        }
        TokenKind::Less => emit_op(ctx, compiler, OpCode::Less),
        TokenKind::LessEqual => {
            emit_op(ctx, compiler, OpCode::Greater);
            emit_op(ctx, compiler, OpCode::Not);
        }
        TokenKind::Plus => emit_op(ctx, compiler, OpCode::Add),
        TokenKind::Minus => emit_op(ctx, compiler, OpCode::Subtract),
        TokenKind::Star => emit_op(ctx, compiler, OpCode::Multiply),
        TokenKind::Slash => emit_op(ctx, compiler, OpCode::Divide),
        _ => unreachable!(),
    }
}

pub(super) fn number(ctx: &mut Ctx, compiler: &mut Compiler, _can_assign: bool) {
    let value: f64 = ctx.parser.previous.lexeme.parse().expect("scanner only produces well-formed numbers");
    emit_constant(ctx, compiler, Value::Number(value));
}

pub(super) fn string(ctx: &mut Ctx, compiler: &mut Compiler, _can_assign: bool) {
    let lexeme = ctx.parser.previous.lexeme;
    let contents = lexeme[1..lexeme.len() - 1].to_string();
    let ptr = ctx.vm.heap.intern_string(contents);
    emit_constant(ctx, compiler, Value::Obj(ptr));
}

pub(super) fn literal(ctx: &mut Ctx, compiler: &mut Compiler, _can_assign: bool) {
    match ctx.parser.previous.kind {
        TokenKind::False => emit_op(ctx, compiler, OpCode::False),
        TokenKind::Nil => emit_op(ctx, compiler, OpCode::Nil),
        TokenKind::True => emit_op(ctx, compiler, OpCode::True),
        _ => unreachable!(),
    }
}

pub(super) fn variable(ctx: &mut Ctx, compiler: &mut Compiler, can_assign: bool) {
    let name = ctx.parser.previous.lexeme.to_string();
    named_variable(ctx, compiler, &name, can_assign);
}

/// Core local/upvalue/global resolution shared by plain identifier reads,
/// assignments, and the synthetic `this`/`super`/class-name lookups that
/// `compiler::class_declaration` emits directly.
pub(super) fn named_variable(ctx: &mut Ctx, compiler: &mut Compiler, name: &str, can_assign: bool) {
    let (get_op, set_op, arg) = if let Some((index, uninitialized)) = resolve_local(compiler, name) {
        if uninitialized {
            error(ctx, "Can't read local variable in its own initializer.");
        }
        (OpCode::GetLocal, OpCode::SetLocal, index as u8)
    } else if let Some(index) = resolve_upvalue(ctx, compiler as *mut Compiler, name) {
        (OpCode::GetUpvalue, OpCode::SetUpvalue, index)
    } else {
        let constant = identifier_constant(ctx, compiler, name);
        (OpCode::GetGlobal, OpCode::SetGlobal, constant)
    };

    if can_assign && match_token(ctx, TokenKind::Equal) {
        super::expression(ctx, compiler);
        emit_ops(ctx, compiler, set_op, arg);
    } else {
        emit_ops(ctx, compiler, get_op, arg);
    }
}

pub(super) fn and_(ctx: &mut Ctx, compiler: &mut Compiler, _can_assign: bool) {
    let end_jump = super::emit_jump(ctx, compiler, OpCode::JumpIfFalse);
    emit_op(ctx, compiler, OpCode::Pop);
    parse_precedence(ctx, compiler, Precedence::And);
    super::patch_jump(ctx, compiler, end_jump);
}

pub(super) fn or_(ctx: &mut Ctx, compiler: &mut Compiler, _can_assign: bool) {
    let else_jump = super::emit_jump(ctx, compiler, OpCode::JumpIfFalse);
    let end_jump = super::emit_jump(ctx, compiler, OpCode::Jump);

    super::patch_jump(ctx, compiler, else_jump);
    emit_op(ctx, compiler, OpCode::Pop);

    parse_precedence(ctx, compiler, Precedence::Or);
    super::patch_jump(ctx, compiler, end_jump);
}

pub(super) fn call(ctx: &mut Ctx, compiler: &mut Compiler, _can_assign: bool) {
    let arg_count = argument_list(ctx, compiler);
    emit_ops(ctx, compiler, OpCode::Call, arg_count);
}

pub(super) fn dot(ctx: &mut Ctx, compiler: &mut Compiler, can_assign: bool) {
    consume(ctx, TokenKind::Identifier, "Expect property name after '.'.");
    let name = ctx.parser.previous.lexeme.to_string();
    let name_constant = identifier_constant(ctx, compiler, &name);

    if can_assign && match_token(ctx, TokenKind::Equal) {
        super::expression(ctx, compiler);
        emit_ops(ctx, compiler, OpCode::SetProperty, name_constant);
    } else if match_token(ctx, TokenKind::LeftParen) {
        let arg_count = argument_list(ctx, compiler);
        emit_ops(ctx, compiler, OpCode::Invoke, name_constant);
        emit_byte(ctx, compiler, arg_count);
    } else {
        emit_ops(ctx, compiler, OpCode::GetProperty, name_constant);
    }
}

pub(super) fn this_(ctx: &mut Ctx, compiler: &mut Compiler, _can_assign: bool) {
    if ctx.current_class.is_null() {
        error(ctx, "Can't use 'this' outside of a class.");
        return;
    }
    variable(ctx, compiler, false);
}

pub(super) fn super_(ctx: &mut Ctx, compiler: &mut Compiler, _can_assign: bool) {
    if ctx.current_class.is_null() {
        error(ctx, "Can't use 'super' outside of a class.");
    } else if !unsafe { &*ctx.current_class }.has_superclass {
        error(ctx, "Can't use 'super' in a class with no superclass.");
    }

    consume(ctx, TokenKind::Dot, "Expect '.' after 'super'.");
    consume(ctx, TokenKind::Identifier, "Expect superclass method name.");
    let method_name = ctx.parser.previous.lexeme.to_string();
    let name_constant = identifier_constant(ctx, compiler, &method_name);

    named_variable(ctx, compiler, "this", false);
    if match_token(ctx, TokenKind::LeftParen) {
        let arg_count = argument_list(ctx, compiler);
        named_variable(ctx, compiler, "super", false);
        emit_ops(ctx, compiler, OpCode::SuperInvoke, name_constant);
        emit_byte(ctx, compiler, arg_count);
    } else {
        named_variable(ctx, compiler, "super", false);
        emit_ops(ctx, compiler, OpCode::GetSuper, name_constant);
    }
}
