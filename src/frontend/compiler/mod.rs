//! Single-pass Pratt compiler: parses and emits bytecode directly into the
//! currently-compiling function's chunk (spec.md §4.4).
pub mod rules;
mod rules_fns;

use crate::common::chunk::Chunk;
use crate::common::opcode::OpCode;
use crate::common::value::Value;
use crate::frontend::lexer::token::{Token, TokenKind};
use crate::frontend::lexer::Scanner;
use crate::memory::object::{Obj, ObjFunction};
use crate::vm::Vm;
use rules::{get_rule, Precedence};

const MAX_LOCALS: usize = 256;
const MAX_UPVALUES: usize = 256;
const MAX_PARAMS: usize = 255;
const MAX_ARGS: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FunctionType {
    Function,
    Initializer,
    Method,
    Script,
}

#[derive(Debug, Clone)]
pub struct CompileError {
    pub line: u32,
    pub at: String,
    pub message: String,
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[line {}] Error{}: {}", self.line, self.at, self.message)
    }
}

struct Local {
    name: String,
    depth: i32,
    is_captured: bool,
}

#[derive(Clone, Copy)]
struct UpvalueRef {
    index: u8,
    is_local: bool,
}

/// Per-function compiler state, chained to its lexically enclosing
/// compiler via a raw, non-owning pointer — valid for exactly the dynamic
/// extent of the recursive call that compiles the nested function body,
/// mirroring the C reference's `Compiler* enclosing` (spec.md §9).
pub struct Compiler {
    enclosing: *mut Compiler,
    function: *mut Obj,
    fn_type: FunctionType,
    locals: Vec<Local>,
    upvalues: Vec<UpvalueRef>,
    scope_depth: i32,
}

impl Compiler {
    fn new(vm: &mut Vm, fn_type: FunctionType, name: Option<String>, enclosing: *mut Compiler) -> Compiler {
        let mut function = ObjFunction::new();
        if let Some(n) = name {
            function.name = Some(vm.heap.intern_string(n));
        }
        let function = vm.heap.alloc_function(function);

        let receiver_name = if fn_type == FunctionType::Method || fn_type == FunctionType::Initializer {
            "this".to_string()
        } else {
            String::new()
        };

        Compiler {
            enclosing,
            function,
            fn_type,
            locals: vec![Local { name: receiver_name, depth: 0, is_captured: false }],
            upvalues: Vec::new(),
            scope_depth: 0,
        }
    }

    fn function_mut(&mut self) -> &mut ObjFunction {
        match unsafe { &mut (*self.function).kind } {
            crate::memory::object::ObjKind::Function(f) => f,
            _ => unreachable!(),
        }
    }

    fn chunk_mut(&mut self) -> &mut Chunk {
        &mut self.function_mut().chunk
    }

    pub fn mark_roots(&self, gray: &mut Vec<*mut Obj>) {
        crate::memory::gc::mark_object(self.function, gray);
        if !self.enclosing.is_null() {
            unsafe { &*self.enclosing }.mark_roots(gray);
        }
    }
}

struct ClassCompilerState {
    enclosing: *mut ClassCompilerState,
    has_superclass: bool,
}

struct ParserState<'src> {
    scanner: Scanner<'src>,
    current: Token<'src>,
    previous: Token<'src>,
    had_error: bool,
    panic_mode: bool,
    errors: Vec<CompileError>,
}

/// Bundles the scanner/token state with the heap-owning VM; threaded
/// through every parse function alongside the innermost `Compiler`.
pub struct Ctx<'src, 'vm> {
    parser: ParserState<'src>,
    vm: &'vm mut Vm,
    current_class: *mut ClassCompilerState,
}

/// Compiles `source` into a top-level function object, or `None` if any
/// compile error occurred. Errors are printed to stderr as they are found
/// (spec.md §7); [`compile_collecting`] is the same thing with errors
/// returned instead, for tests that assert on exact wording.
pub fn compile(vm: &mut Vm, source: &str) -> Option<*mut Obj> {
    let (result, errors) = compile_collecting(vm, source);
    for err in &errors {
        eprintln!("{err}");
    }
    result
}

pub fn compile_collecting(vm: &mut Vm, source: &str) -> (Option<*mut Obj>, Vec<CompileError>) {
    let scanner = Scanner::new(source);
    let mut ctx = Ctx {
        parser: ParserState {
            scanner,
            current: Token::synthetic(TokenKind::Eof, ""),
            previous: Token::synthetic(TokenKind::Eof, ""),
            had_error: false,
            panic_mode: false,
            errors: Vec::new(),
        },
        vm,
        current_class: std::ptr::null_mut(),
    };

    let mut compiler = Compiler::new(ctx.vm, FunctionType::Script, None, std::ptr::null_mut());
    let prev_active = ctx.vm.active_compiler.get();
    ctx.vm.active_compiler.set(&compiler as *const Compiler);

    advance(&mut ctx);
    while !match_token(&mut ctx, TokenKind::Eof) {
        declaration(&mut ctx, &mut compiler);
    }

    let function = end_compiler(&mut ctx, &mut compiler);
    ctx.vm.active_compiler.set(prev_active);

    if ctx.parser.had_error {
        (None, ctx.parser.errors)
    } else {
        (Some(function), ctx.parser.errors)
    }
}

// ---------------------------------------------------------------------
// Token stream plumbing
// ---------------------------------------------------------------------

fn advance(ctx: &mut Ctx) {
    ctx.parser.previous = ctx.parser.current;
    loop {
        ctx.parser.current = ctx.parser.scanner.scan_token();
        if ctx.parser.current.kind != TokenKind::Error {
            break;
        }
        let message = ctx.parser.current.lexeme.to_string();
        error_at_current(ctx, &message);
    }
}

fn check(ctx: &Ctx, kind: TokenKind) -> bool {
    ctx.parser.current.kind == kind
}

fn match_token(ctx: &mut Ctx, kind: TokenKind) -> bool {
    if !check(ctx, kind) {
        return false;
    }
    advance(ctx);
    true
}

fn consume(ctx: &mut Ctx, kind: TokenKind, message: &str) {
    if ctx.parser.current.kind == kind {
        advance(ctx);
        return;
    }
    error_at_current(ctx, message);
}

fn error_at_current(ctx: &mut Ctx, message: &str) {
    error_at(ctx, ctx.parser.current, message);
}

fn error(ctx: &mut Ctx, message: &str) {
    error_at(ctx, ctx.parser.previous, message);
}

fn error_at(ctx: &mut Ctx, token: Token, message: &str) {
    if ctx.parser.panic_mode {
        return;
    }
    ctx.parser.panic_mode = true;
    let at = if token.kind == TokenKind::Eof {
        " at end".to_string()
    } else if token.kind == TokenKind::Error {
        String::new()
    } else {
        format!(" at '{}'", token.lexeme)
    };
    ctx.parser.errors.push(CompileError { line: token.line, at, message: message.to_string() });
    ctx.parser.had_error = true;
}

// ---------------------------------------------------------------------
// Emission helpers
// ---------------------------------------------------------------------

fn emit_byte(ctx: &mut Ctx, compiler: &mut Compiler, byte: u8) {
    let line = ctx.parser.previous.line;
    compiler.chunk_mut().write(byte, line);
}

fn emit_op(ctx: &mut Ctx, compiler: &mut Compiler, op: OpCode) {
    emit_byte(ctx, compiler, op as u8);
}

fn emit_ops(ctx: &mut Ctx, compiler: &mut Compiler, a: OpCode, b: u8) {
    emit_op(ctx, compiler, a);
    emit_byte(ctx, compiler, b);
}

fn emit_loop(ctx: &mut Ctx, compiler: &mut Compiler, loop_start: usize) {
    emit_op(ctx, compiler, OpCode::Loop);
    let offset = compiler.chunk_mut().code.len() - loop_start + 2;
    if offset > u16::MAX as usize {
        error(ctx, "Body of loop too large.");
    }
    emit_byte(ctx, compiler, ((offset >> 8) & 0xff) as u8);
    emit_byte(ctx, compiler, (offset & 0xff) as u8);
}

fn emit_jump(ctx: &mut Ctx, compiler: &mut Compiler, op: OpCode) -> usize {
    emit_op(ctx, compiler, op);
    emit_byte(ctx, compiler, 0xff);
    emit_byte(ctx, compiler, 0xff);
    compiler.chunk_mut().code.len() - 2
}

fn patch_jump(ctx: &mut Ctx, compiler: &mut Compiler, offset: usize) {
    let jump = compiler.chunk_mut().code.len() - offset - 2;
    if jump > u16::MAX as usize {
        error(ctx, "Too much code to jump over.");
    }
    compiler.chunk_mut().code[offset] = ((jump >> 8) & 0xff) as u8;
    compiler.chunk_mut().code[offset + 1] = (jump & 0xff) as u8;
}

fn emit_return(ctx: &mut Ctx, compiler: &mut Compiler) {
    if compiler.fn_type == FunctionType::Initializer {
        emit_ops(ctx, compiler, OpCode::GetLocal, 0);
    } else {
        emit_op(ctx, compiler, OpCode::Nil);
    }
    emit_op(ctx, compiler, OpCode::Return);
}

fn make_constant(ctx: &mut Ctx, compiler: &mut Compiler, value: Value) -> u8 {
    // `value` may itself be freshly allocated (e.g. an identifier's interned
    // string); pushing it onto the VM stack keeps it reachable across the
    // allocation the constant pool's own growth may trigger (spec.md §4.2).
    ctx.vm.push(value).expect("compile-time GC-safety push never approaches stack_max");
    let result = compiler.chunk_mut().add_constant(value);
    ctx.vm.pop();
    match result {
        Ok(index) => index,
        Err(message) => {
            error(ctx, message);
            0
        }
    }
}

fn emit_constant(ctx: &mut Ctx, compiler: &mut Compiler, value: Value) {
    let index = make_constant(ctx, compiler, value);
    emit_ops(ctx, compiler, OpCode::Constant, index);
}

fn identifier_constant(ctx: &mut Ctx, compiler: &mut Compiler, name: &str) -> u8 {
    let ptr = ctx.vm.heap.intern_string(name.to_string());
    make_constant(ctx, compiler, Value::Obj(ptr))
}

fn end_compiler(ctx: &mut Ctx, compiler: &mut Compiler) -> *mut Obj {
    emit_return(ctx, compiler);
    if ctx.vm.trace.is_at_least_debug() {
        let name = match compiler.function_mut().name {
            Some(ptr) => unsafe { &(*ptr).as_str().chars }.clone(),
            None => "<script>".to_string(),
        };
        let fun = compiler.function_mut();
        println!(
            "[DEBUG] compiled fn {} (arity {}, {} upvalues, {} constants)",
            name,
            fun.arity,
            fun.upvalue_count,
            fun.chunk.constants.len()
        );
    }
    compiler.function
}

fn begin_scope(compiler: &mut Compiler) {
    compiler.scope_depth += 1;
}

fn end_scope(ctx: &mut Ctx, compiler: &mut Compiler) {
    compiler.scope_depth -= 1;
    while let Some(local) = compiler.locals.last() {
        if local.depth <= compiler.scope_depth {
            break;
        }
        if compiler.locals.last().unwrap().is_captured {
            emit_op(ctx, compiler, OpCode::CloseUpvalue);
        } else {
            emit_op(ctx, compiler, OpCode::Pop);
        }
        compiler.locals.pop();
    }
}

// ---------------------------------------------------------------------
// Scope resolution
// ---------------------------------------------------------------------

fn identifiers_equal(a: &str, b: &str) -> bool {
    a == b
}

fn resolve_local(compiler: &Compiler, name: &str) -> Option<(usize, bool)> {
    for i in (0..compiler.locals.len()).rev() {
        if identifiers_equal(&compiler.locals[i].name, name) {
            let uninitialized = compiler.locals[i].depth == -1;
            return Some((i, uninitialized));
        }
    }
    None
}

fn add_upvalue(ctx: &mut Ctx, compiler: &mut Compiler, index: u8, is_local: bool) -> u8 {
    for (i, uv) in compiler.upvalues.iter().enumerate() {
        if uv.index == index && uv.is_local == is_local {
            return i as u8;
        }
    }
    if compiler.upvalues.len() >= MAX_UPVALUES {
        error(ctx, "Too many closure variables in function.");
        return 0;
    }
    compiler.upvalues.push(UpvalueRef { index, is_local });
    compiler.function_mut().upvalue_count = compiler.upvalues.len() as u8;
    (compiler.upvalues.len() - 1) as u8
}

/// Walks the enclosing-compiler chain looking for `name`, capturing it as
/// an upvalue at every intermediate level (spec.md §4.4).
fn resolve_upvalue(ctx: &mut Ctx, compiler: *mut Compiler, name: &str) -> Option<u8> {
    let enclosing = unsafe { (*compiler).enclosing };
    if enclosing.is_null() {
        return None;
    }
    let enclosing_ref = unsafe { &mut *enclosing };
    if let Some((local_index, uninitialized)) = resolve_local(enclosing_ref, name) {
        if uninitialized {
            error(ctx, "Can't read local variable in its own initializer.");
        }
        enclosing_ref.locals[local_index].is_captured = true;
        return Some(add_upvalue(ctx, unsafe { &mut *compiler }, local_index as u8, true));
    }
    if let Some(index) = resolve_upvalue(ctx, enclosing, name) {
        return Some(add_upvalue(ctx, unsafe { &mut *compiler }, index, false));
    }
    None
}

fn add_local(ctx: &mut Ctx, compiler: &mut Compiler, name: String) {
    if compiler.locals.len() >= MAX_LOCALS {
        error(ctx, "Too many local variables in function.");
        return;
    }
    compiler.locals.push(Local { name, depth: -1, is_captured: false });
}

fn declare_variable(ctx: &mut Ctx, compiler: &mut Compiler) {
    if compiler.scope_depth == 0 {
        return;
    }
    let name = ctx.parser.previous.lexeme.to_string();
    for i in (0..compiler.locals.len()).rev() {
        let local = &compiler.locals[i];
        if local.depth != -1 && local.depth < compiler.scope_depth {
            break;
        }
        if identifiers_equal(&name, &local.name) {
            error(ctx, "Already a variable with this name in this scope.");
        }
    }
    add_local(ctx, compiler, name);
}

fn parse_variable(ctx: &mut Ctx, compiler: &mut Compiler, message: &str) -> u8 {
    consume(ctx, TokenKind::Identifier, message);
    declare_variable(ctx, compiler);
    if compiler.scope_depth > 0 {
        return 0;
    }
    let name = ctx.parser.previous.lexeme.to_string();
    identifier_constant(ctx, compiler, &name)
}

fn mark_initialized(compiler: &mut Compiler) {
    if compiler.scope_depth == 0 {
        return;
    }
    compiler.locals.last_mut().unwrap().depth = compiler.scope_depth;
}

fn define_variable(ctx: &mut Ctx, compiler: &mut Compiler, global: u8) {
    if compiler.scope_depth > 0 {
        mark_initialized(compiler);
        return;
    }
    emit_ops(ctx, compiler, OpCode::DefineGlobal, global);
}

fn argument_list(ctx: &mut Ctx, compiler: &mut Compiler) -> u8 {
    let mut count = 0u32;
    if !check(ctx, TokenKind::RightParen) {
        loop {
            expression(ctx, compiler);
            if count >= MAX_ARGS as u32 {
                error(ctx, "Can't have more than 255 arguments.");
            }
            count += 1;
            if !match_token(ctx, TokenKind::Comma) {
                break;
            }
        }
    }
    consume(ctx, TokenKind::RightParen, "Expect ')' after arguments.");
    count as u8
}

// ---------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------

fn parse_precedence(ctx: &mut Ctx, compiler: &mut Compiler, precedence: Precedence) {
    advance(ctx);
    let prefix_rule = get_rule(ctx.parser.previous.kind).prefix;
    let Some(prefix_rule) = prefix_rule else {
        error(ctx, "Expect expression.");
        return;
    };
    let can_assign = precedence <= Precedence::Assignment;
    prefix_rule(ctx, compiler, can_assign);

    while precedence <= get_rule(ctx.parser.current.kind).precedence {
        advance(ctx);
        let infix_rule = get_rule(ctx.parser.previous.kind).infix.unwrap();
        infix_rule(ctx, compiler, can_assign);
    }

    if can_assign && match_token(ctx, TokenKind::Equal) {
        error(ctx, "Invalid assignment target.");
    }
}

pub(crate) fn expression(ctx: &mut Ctx, compiler: &mut Compiler) {
    parse_precedence(ctx, compiler, Precedence::Assignment);
}

fn block(ctx: &mut Ctx, compiler: &mut Compiler) {
    while !check(ctx, TokenKind::RightBrace) && !check(ctx, TokenKind::Eof) {
        declaration(ctx, compiler);
    }
    consume(ctx, TokenKind::RightBrace, "Expect '}' after block.");
}

fn function(ctx: &mut Ctx, enclosing: &mut Compiler, fn_type: FunctionType) {
    let name = ctx.parser.previous.lexeme.to_string();
    let mut compiler = Compiler::new(ctx.vm, fn_type, Some(name), enclosing as *mut Compiler);
    let prev_active = ctx.vm.active_compiler.get();
    ctx.vm.active_compiler.set(&compiler as *const Compiler);

    begin_scope(&mut compiler);
    consume(ctx, TokenKind::LeftParen, "Expect '(' after function name.");
    if !check(ctx, TokenKind::RightParen) {
        loop {
            let fun = compiler.function_mut();
            if fun.arity as usize >= MAX_PARAMS {
                error(ctx, "Can't have more than 255 parameters.");
            }
            compiler.function_mut().arity += 1;
            let constant = parse_variable(ctx, &mut compiler, "Expect parameter name.");
            define_variable(ctx, &mut compiler, constant);
            if !match_token(ctx, TokenKind::Comma) {
                break;
            }
        }
    }
    consume(ctx, TokenKind::RightParen, "Expect ')' after parameters.");
    consume(ctx, TokenKind::LeftBrace, "Expect '{' before function body.");
    block(ctx, &mut compiler);

    let upvalues = compiler.upvalues.clone();
    let function_obj = end_compiler(ctx, &mut compiler);
    ctx.vm.active_compiler.set(prev_active);

    let constant = make_constant(ctx, enclosing, Value::Obj(function_obj));
    emit_ops(ctx, enclosing, OpCode::Closure, constant);
    for uv in upvalues {
        emit_byte(ctx, enclosing, if uv.is_local { 1 } else { 0 });
        emit_byte(ctx, enclosing, uv.index);
    }
}

fn method(ctx: &mut Ctx, compiler: &mut Compiler) {
    consume(ctx, TokenKind::Identifier, "Expect method name.");
    let name = ctx.parser.previous.lexeme.to_string();
    let constant = identifier_constant(ctx, compiler, &name);
    let fn_type = if name == "init" { FunctionType::Initializer } else { FunctionType::Method };
    function(ctx, compiler, fn_type);
    emit_ops(ctx, compiler, OpCode::Method, constant);
}

fn class_declaration(ctx: &mut Ctx, compiler: &mut Compiler) {
    consume(ctx, TokenKind::Identifier, "Expect class name.");
    let class_name = ctx.parser.previous.lexeme.to_string();
    let name_constant = identifier_constant(ctx, compiler, &class_name);
    declare_variable(ctx, compiler);

    emit_ops(ctx, compiler, OpCode::Class, name_constant);
    define_variable(ctx, compiler, name_constant);

    let mut class_compiler = ClassCompilerState { enclosing: ctx.current_class, has_superclass: false };
    ctx.current_class = &mut class_compiler;

    if match_token(ctx, TokenKind::Less) {
        consume(ctx, TokenKind::Identifier, "Expect superclass name.");
        let super_name = ctx.parser.previous.lexeme.to_string();
        variable_named(ctx, compiler, &super_name, false);

        if identifiers_equal(&class_name, &super_name) {
            error(ctx, "A class can't inherit from itself.");
        }

        begin_scope(compiler);
        add_local(ctx, compiler, "super".to_string());
        define_variable(ctx, compiler, 0);

        variable_named(ctx, compiler, &class_name, false);
        emit_op(ctx, compiler, OpCode::Inherit);
        class_compiler.has_superclass = true;
        ctx.current_class = &mut class_compiler;
    }

    variable_named(ctx, compiler, &class_name, false);
    consume(ctx, TokenKind::LeftBrace, "Expect '{' before class body.");
    while !check(ctx, TokenKind::RightBrace) && !check(ctx, TokenKind::Eof) {
        method(ctx, compiler);
    }
    consume(ctx, TokenKind::RightBrace, "Expect '}' after class body.");
    emit_op(ctx, compiler, OpCode::Pop);

    if class_compiler.has_superclass {
        end_scope(ctx, compiler);
    }
    ctx.current_class = class_compiler.enclosing;
}

fn fun_declaration(ctx: &mut Ctx, compiler: &mut Compiler) {
    let global = parse_variable(ctx, compiler, "Expect function name.");
    mark_initialized(compiler);
    function(ctx, compiler, FunctionType::Function);
    define_variable(ctx, compiler, global);
}

fn var_declaration(ctx: &mut Ctx, compiler: &mut Compiler) {
    let global = parse_variable(ctx, compiler, "Expect variable name.");
    if match_token(ctx, TokenKind::Equal) {
        expression(ctx, compiler);
    } else {
        emit_op(ctx, compiler, OpCode::Nil);
    }
    consume(ctx, TokenKind::Semicolon, "Expect ';' after variable declaration.");
    define_variable(ctx, compiler, global);
}

fn expression_statement(ctx: &mut Ctx, compiler: &mut Compiler) {
    expression(ctx, compiler);
    consume(ctx, TokenKind::Semicolon, "Expect ';' after expression.");
    emit_op(ctx, compiler, OpCode::Pop);
}

fn print_statement(ctx: &mut Ctx, compiler: &mut Compiler) {
    expression(ctx, compiler);
    consume(ctx, TokenKind::Semicolon, "Expect ';' after value.");
    emit_op(ctx, compiler, OpCode::Print);
}

fn if_statement(ctx: &mut Ctx, compiler: &mut Compiler) {
    consume(ctx, TokenKind::LeftParen, "Expect '(' after 'if'.");
    expression(ctx, compiler);
    consume(ctx, TokenKind::RightParen, "Expect ')' after condition.");

    let then_jump = emit_jump(ctx, compiler, OpCode::JumpIfFalse);
    emit_op(ctx, compiler, OpCode::Pop);
    statement(ctx, compiler);

    let else_jump = emit_jump(ctx, compiler, OpCode::Jump);
    patch_jump(ctx, compiler, then_jump);
    emit_op(ctx, compiler, OpCode::Pop);

    if match_token(ctx, TokenKind::Else) {
        statement(ctx, compiler);
    }
    patch_jump(ctx, compiler, else_jump);
}

fn while_statement(ctx: &mut Ctx, compiler: &mut Compiler) {
    let loop_start = compiler.chunk_mut().code.len();
    consume(ctx, TokenKind::LeftParen, "Expect '(' after 'while'.");
    expression(ctx, compiler);
    consume(ctx, TokenKind::RightParen, "Expect ')' after condition.");

    let exit_jump = emit_jump(ctx, compiler, OpCode::JumpIfFalse);
    emit_op(ctx, compiler, OpCode::Pop);
    statement(ctx, compiler);
    emit_loop(ctx, compiler, loop_start);

    patch_jump(ctx, compiler, exit_jump);
    emit_op(ctx, compiler, OpCode::Pop);
}

fn for_statement(ctx: &mut Ctx, compiler: &mut Compiler) {
    begin_scope(compiler);
    consume(ctx, TokenKind::LeftParen, "Expect '(' after 'for'.");

    if match_token(ctx, TokenKind::Semicolon) {
        // no initializer
    } else if match_token(ctx, TokenKind::Var) {
        var_declaration(ctx, compiler);
    } else {
        expression_statement(ctx, compiler);
    }

    let mut loop_start = compiler.chunk_mut().code.len();
    let mut exit_jump: Option<usize> = None;
    if !match_token(ctx, TokenKind::Semicolon) {
        expression(ctx, compiler);
        consume(ctx, TokenKind::Semicolon, "Expect ';' after loop condition.");
        exit_jump = Some(emit_jump(ctx, compiler, OpCode::JumpIfFalse));
        emit_op(ctx, compiler, OpCode::Pop);
    }

    if !match_token(ctx, TokenKind::RightParen) {
        let body_jump = emit_jump(ctx, compiler, OpCode::Jump);
        let increment_start = compiler.chunk_mut().code.len();
        expression(ctx, compiler);
        emit_op(ctx, compiler, OpCode::Pop);
        consume(ctx, TokenKind::RightParen, "Expect ')' after for clauses.");

        emit_loop(ctx, compiler, loop_start);
        loop_start = increment_start;
        patch_jump(ctx, compiler, body_jump);
    }

    statement(ctx, compiler);
    emit_loop(ctx, compiler, loop_start);

    if let Some(exit_jump) = exit_jump {
        patch_jump(ctx, compiler, exit_jump);
        emit_op(ctx, compiler, OpCode::Pop);
    }

    end_scope(ctx, compiler);
}

fn return_statement(ctx: &mut Ctx, compiler: &mut Compiler) {
    if compiler.fn_type == FunctionType::Script {
        error(ctx, "Can't return from top-level code.");
    }
    if match_token(ctx, TokenKind::Semicolon) {
        emit_return(ctx, compiler);
    } else {
        if compiler.fn_type == FunctionType::Initializer {
            error(ctx, "Can't return a value from an initializer.");
        }
        expression(ctx, compiler);
        consume(ctx, TokenKind::Semicolon, "Expect ';' after return value.");
        emit_op(ctx, compiler, OpCode::Return);
    }
}

fn synchronize(ctx: &mut Ctx) {
    ctx.parser.panic_mode = false;
    while ctx.parser.current.kind != TokenKind::Eof {
        if ctx.parser.previous.kind == TokenKind::Semicolon {
            return;
        }
        match ctx.parser.current.kind {
            TokenKind::Class
            | TokenKind::Fun
            | TokenKind::Var
            | TokenKind::For
            | TokenKind::If
            | TokenKind::While
            | TokenKind::Print
            | TokenKind::Return => return,
            _ => {}
        }
        advance(ctx);
    }
}

fn declaration(ctx: &mut Ctx, compiler: &mut Compiler) {
    if match_token(ctx, TokenKind::Class) {
        class_declaration(ctx, compiler);
    } else if match_token(ctx, TokenKind::Fun) {
        fun_declaration(ctx, compiler);
    } else if match_token(ctx, TokenKind::Var) {
        var_declaration(ctx, compiler);
    } else {
        statement(ctx, compiler);
    }

    if ctx.parser.panic_mode {
        synchronize(ctx);
    }
}

fn statement(ctx: &mut Ctx, compiler: &mut Compiler) {
    if match_token(ctx, TokenKind::Print) {
        print_statement(ctx, compiler);
    } else if match_token(ctx, TokenKind::For) {
        for_statement(ctx, compiler);
    } else if match_token(ctx, TokenKind::If) {
        if_statement(ctx, compiler);
    } else if match_token(ctx, TokenKind::Return) {
        return_statement(ctx, compiler);
    } else if match_token(ctx, TokenKind::While) {
        while_statement(ctx, compiler);
    } else if match_token(ctx, TokenKind::LeftBrace) {
        begin_scope(compiler);
        block(ctx, compiler);
        end_scope(ctx, compiler);
    } else {
        expression_statement(ctx, compiler);
    }
}

fn variable_named(ctx: &mut Ctx, compiler: &mut Compiler, name: &str, can_assign: bool) {
    rules_fns::named_variable(ctx, compiler, name, can_assign);
}
