//! A tiny expression engine for exercising the host end to end.
//!
//! Grammar, a small subset of EEL:
//!
//! ```text
//! seq     := expr? (';' expr?)*
//! expr    := ident ('=' | '+=') expr | ternary
//! ternary := cmp ('?' expr (':' expr)?)?
//! cmp     := add (('==' | '!=' | '<' | '>') add)?
//! add     := mul (('+' | '-') mul)*
//! mul     := unary (('*' | '/') unary)*
//! unary   := ('-' | '!') unary | primary
//! primary := number | "string" | ident | ident '(' args ')' | '(' seq ')'
//!          | 'while' '(' seq ')' ('(' seq ')')?
//! ```
//!
//! Calls reach the host through [`ScriptHost`]. Variable arguments of
//! `midirecv`, `file_var` and `file_riff` are written back.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use jsfx_config::Config;
use jsfx_core::{
    CodeHandle, Color, EngineRuntime, ExprEngine, FileSpec, LogLevel, ScriptHost, VarAccess, VarResolver, VarSlot,
};

const MEMORY_SIZE: usize = 4096;
const MAX_LOOP: usize = 100_000;

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Num(f64),
    Str(String),
    Ident(String),
    Op(&'static str),
}

const OPS: [&str; 17] = [
    "+=", "==", "!=", "=", "+", "-", "*", "/", "<", ">", "?", ":", "(", ")", ",", ";", "!",
];

fn tokenize(text: &str) -> Result<Vec<Tok>, String> {
    let bytes = text.as_bytes();
    let mut toks = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if c.is_ascii_whitespace() {
            i += 1;
        } else if text[i..].starts_with("//") {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
        } else if c.is_ascii_digit() || (c == b'.' && bytes.get(i + 1).is_some_and(u8::is_ascii_digit)) {
            let start = i;
            while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                i += 1;
            }
            let value = text[start..i].parse().map_err(|_| format!("bad number {}", &text[start..i]))?;
            toks.push(Tok::Num(value));
        } else if c.is_ascii_alphabetic() || c == b'_' {
            let start = i;
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'.') {
                i += 1;
            }
            toks.push(Tok::Ident(text[start..i].to_owned()));
        } else if c == b'"' {
            let start = i + 1;
            let Some(len) = text[start..].find('"') else {
                return Err("unterminated string".into());
            };
            toks.push(Tok::Str(text[start..start + len].to_owned()));
            i = start + len + 1;
        } else {
            let Some(op) = OPS.iter().find(|op| text[i..].starts_with(**op)) else {
                return Err(format!("unexpected character '{}'", c as char));
            };
            toks.push(Tok::Op(*op));
            i += op.len();
        }
    }
    Ok(toks)
}

#[derive(Debug)]
enum Expr {
    Num(f64),
    Str(String),
    Var(VarSlot),
    Assign(VarSlot, Box<Expr>),
    AddAssign(VarSlot, Box<Expr>),
    Bin(&'static str, Box<Expr>, Box<Expr>),
    Neg(Box<Expr>),
    Not(Box<Expr>),
    Ternary(Box<Expr>, Box<Expr>, Option<Box<Expr>>),
    Call(String, Vec<Expr>),
    While(Box<Expr>, Option<Box<Expr>>),
    Seq(Vec<Expr>),
}

#[derive(Debug, Default)]
struct Vars {
    names: Vec<String>,
    values: Vec<f64>,
}

impl Vars {
    fn slot(&mut self, name: &str) -> VarSlot {
        if let Some(i) = self.names.iter().position(|n| n == name) {
            return VarSlot(i as u32);
        }
        self.names.push(name.to_owned());
        self.values.push(0.0);
        VarSlot((self.names.len() - 1) as u32)
    }
}

struct Parser<'a> {
    toks: Vec<Tok>,
    pos: usize,
    vars: &'a mut Vars,
    resolver: &'a dyn VarResolver,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos)
    }

    fn peek_op(&self, op: &str) -> bool {
        matches!(self.peek(), Some(Tok::Op(o)) if *o == op)
    }

    fn eat(&mut self, op: &str) -> bool {
        if self.peek_op(op) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, op: &str) -> Result<(), String> {
        if self.eat(op) {
            Ok(())
        } else {
            Err(format!("expected '{op}'"))
        }
    }

    fn resolve(&mut self, name: &str) -> VarSlot {
        self.resolver.resolve(name).unwrap_or_else(|| self.vars.slot(name))
    }

    fn seq(&mut self) -> Result<Expr, String> {
        let mut items = Vec::new();
        loop {
            while self.eat(";") {}
            if self.peek().is_none() || self.peek_op(")") {
                break;
            }
            items.push(self.expr()?);
            if !self.eat(";") {
                break;
            }
        }
        Ok(Expr::Seq(items))
    }

    fn expr(&mut self) -> Result<Expr, String> {
        if let (Some(Tok::Ident(name)), Some(Tok::Op(op))) = (self.toks.get(self.pos), self.toks.get(self.pos + 1)) {
            if *op == "=" || *op == "+=" {
                let name = name.clone();
                let op = *op;
                self.pos += 2;
                let slot = self.resolve(&name);
                let value = Box::new(self.expr()?);
                return Ok(if op == "=" {
                    Expr::Assign(slot, value)
                } else {
                    Expr::AddAssign(slot, value)
                });
            }
        }
        self.ternary()
    }

    fn ternary(&mut self) -> Result<Expr, String> {
        let cond = self.cmp()?;
        if !self.eat("?") {
            return Ok(cond);
        }
        let then = self.expr()?;
        let otherwise = if self.eat(":") { Some(Box::new(self.expr()?)) } else { None };
        Ok(Expr::Ternary(Box::new(cond), Box::new(then), otherwise))
    }

    fn cmp(&mut self) -> Result<Expr, String> {
        let lhs = self.add()?;
        for op in ["==", "!=", "<", ">"] {
            if self.eat(op) {
                let rhs = self.add()?;
                return Ok(Expr::Bin(op, Box::new(lhs), Box::new(rhs)));
            }
        }
        Ok(lhs)
    }

    fn add(&mut self) -> Result<Expr, String> {
        let mut lhs = self.mul()?;
        loop {
            let op = if self.eat("+") {
                "+"
            } else if self.eat("-") {
                "-"
            } else {
                return Ok(lhs);
            };
            lhs = Expr::Bin(op, Box::new(lhs), Box::new(self.mul()?));
        }
    }

    fn mul(&mut self) -> Result<Expr, String> {
        let mut lhs = self.unary()?;
        loop {
            let op = if self.eat("*") {
                "*"
            } else if self.eat("/") {
                "/"
            } else {
                return Ok(lhs);
            };
            lhs = Expr::Bin(op, Box::new(lhs), Box::new(self.unary()?));
        }
    }

    fn unary(&mut self) -> Result<Expr, String> {
        if self.eat("-") {
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        if self.eat("!") {
            return Ok(Expr::Not(Box::new(self.unary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, String> {
        let Some(tok) = self.peek().cloned() else {
            return Err("unexpected end of input".into());
        };
        self.pos += 1;
        match tok {
            Tok::Num(v) => Ok(Expr::Num(v)),
            Tok::Str(s) => Ok(Expr::Str(s)),
            Tok::Op("(") => {
                let inner = self.seq()?;
                self.expect(")")?;
                Ok(inner)
            }
            Tok::Ident(name) if name == "while" => {
                self.expect("(")?;
                let cond = self.seq()?;
                self.expect(")")?;
                let body = if self.eat("(") {
                    let body = self.seq()?;
                    self.expect(")")?;
                    Some(Box::new(body))
                } else {
                    None
                };
                Ok(Expr::While(Box::new(cond), body))
            }
            Tok::Ident(name) => {
                if !self.eat("(") {
                    return Ok(Expr::Var(self.resolve(&name)));
                }
                let mut args = Vec::new();
                if !self.eat(")") {
                    loop {
                        args.push(self.expr()?);
                        if self.eat(")") {
                            break;
                        }
                        self.expect(",")?;
                    }
                }
                Ok(Expr::Call(name, args))
            }
            Tok::Op(op) => Err(format!("unexpected '{op}'")),
        }
    }
}

/// The test engine.
#[derive(Debug)]
pub struct MiniEngine {
    vars: Vars,
    host_vars: usize,
    codes: Vec<Arc<Expr>>,
    memory: Vec<f64>,
}

impl Default for MiniEngine {
    fn default() -> Self {
        Self {
            vars: Vars::default(),
            host_vars: 0,
            codes: Vec::new(),
            memory: vec![0.0; MEMORY_SIZE],
        }
    }
}

impl VarAccess for MiniEngine {
    fn get(&self, slot: VarSlot) -> f64 {
        self.vars.values.get(slot.0 as usize).copied().unwrap_or(0.0)
    }

    fn set(&mut self, slot: VarSlot, value: f64) {
        if let Some(v) = self.vars.values.get_mut(slot.0 as usize) {
            *v = value;
        }
    }
}

impl MiniEngine {
    fn slider_mask(&self, arg: &Expr, host: &dyn ScriptHost, value: f64) -> u64 {
        if let Expr::Var(slot) = arg {
            if let Some(index) = host.slider_of_var(*slot) {
                return 1 << index;
            }
        }
        value as u64
    }

    fn eval(&mut self, expr: &Expr, host: &mut dyn ScriptHost) -> f64 {
        match expr {
            Expr::Num(v) => *v,
            Expr::Str(_) => 0.0,
            Expr::Var(slot) => self.get(*slot),
            Expr::Assign(slot, e) => {
                let v = self.eval(e, host);
                self.set(*slot, v);
                v
            }
            Expr::AddAssign(slot, e) => {
                let v = self.get(*slot) + self.eval(e, host);
                self.set(*slot, v);
                v
            }
            Expr::Bin(op, a, b) => {
                let a = self.eval(a, host);
                let b = self.eval(b, host);
                match *op {
                    "+" => a + b,
                    "-" => a - b,
                    "*" => a * b,
                    "/" if b == 0.0 => 0.0,
                    "/" => a / b,
                    "==" => f64::from(u8::from(a == b)),
                    "!=" => f64::from(u8::from(a != b)),
                    "<" => f64::from(u8::from(a < b)),
                    _ => f64::from(u8::from(a > b)),
                }
            }
            Expr::Neg(e) => -self.eval(e, host),
            Expr::Not(e) => f64::from(u8::from(self.eval(e, host) == 0.0)),
            Expr::Ternary(c, a, b) => {
                if self.eval(c, host) != 0.0 {
                    self.eval(a, host)
                } else {
                    b.as_ref().map_or(0.0, |b| self.eval(b, host))
                }
            }
            Expr::While(cond, body) => {
                let mut last = 0.0;
                for _ in 0..MAX_LOOP {
                    if self.eval(cond, host) == 0.0 {
                        break;
                    }
                    if let Some(body) = body {
                        last = self.eval(body, host);
                    }
                }
                last
            }
            Expr::Seq(items) => {
                let mut last = 0.0;
                for item in items {
                    last = self.eval(item, host);
                }
                last
            }
            Expr::Call(name, args) => self.call(name, args, host),
        }
    }

    fn out_slot(args: &[Expr], i: usize) -> Option<VarSlot> {
        match args.get(i) {
            Some(Expr::Var(slot)) => Some(*slot),
            _ => None,
        }
    }

    fn write_out(&mut self, args: &[Expr], i: usize, value: f64) {
        if let Some(slot) = Self::out_slot(args, i) {
            self.set(slot, value);
        }
    }

    fn call(&mut self, name: &str, args: &[Expr], host: &mut dyn ScriptHost) -> f64 {
        let mut v = Vec::with_capacity(args.len());
        for arg in args {
            v.push(self.eval(arg, host));
        }
        let arg = |i: usize| v.get(i).copied().unwrap_or(0.0);
        let flag = |ok: bool| f64::from(u8::from(ok));

        match name {
            "midirecv" => {
                let Some(event) = host.midi_recv(self) else {
                    return 0.0;
                };
                let offset = f64::from(event.offset);
                let bytes: Vec<f64> = (0..3)
                    .map(|i| event.data.get(i).map_or(0.0, |&b| f64::from(b)))
                    .collect();
                self.write_out(args, 0, offset);
                for (i, b) in bytes.into_iter().enumerate() {
                    self.write_out(args, i + 1, b);
                }
                1.0
            }
            "midisend" => {
                let data = [arg(1) as u8, arg(2) as u8, arg(3) as u8];
                flag(host.midi_send(self, arg(0) as u32, &data))
            }
            "sliderchange" => {
                let mask = args.first().map_or(0, |a| self.slider_mask(a, host, arg(0)));
                host.slider_change(mask);
                0.0
            }
            "slider_automate" => {
                let mask = args.first().map_or(0, |a| self.slider_mask(a, host, arg(0)));
                host.slider_automate(mask);
                0.0
            }
            "file_open" => {
                let opened = match args.first() {
                    Some(Expr::Str(path)) => host.file_open(FileSpec::Path(path)),
                    _ => host.file_open(FileSpec::Index(arg(0) as u32)),
                };
                opened.map_or(-1.0, f64::from)
            }
            "file_close" => flag(host.file_close(arg(0) as u32)),
            "file_rewind" => flag(host.file_rewind(arg(0) as u32)),
            "file_avail" => host.file_avail(arg(0) as u32) as f64,
            "file_text" => flag(host.file_text(arg(0) as u32)),
            "file_var" => {
                let mut value = arg(1);
                let ok = host.file_var(arg(0) as u32, &mut value);
                if ok {
                    self.write_out(args, 1, value);
                }
                flag(ok)
            }
            "file_mem" => {
                let start = (arg(1).max(0.0) as usize).min(MEMORY_SIZE);
                let end = (start + arg(2).max(0.0) as usize).min(MEMORY_SIZE);
                f64::from(host.file_mem(arg(0) as u32, &mut self.memory[start..end]))
            }
            "file_riff" => match host.file_riff(arg(0) as u32) {
                Some(info) => {
                    self.write_out(args, 1, f64::from(info.channels));
                    self.write_out(args, 2, info.sample_rate);
                    1.0
                }
                None => 0.0,
            },
            "memset" => {
                let start = (arg(0).max(0.0) as usize).min(MEMORY_SIZE);
                let end = (start + arg(2).max(0.0) as usize).min(MEMORY_SIZE);
                self.memory[start..end].fill(arg(1));
                0.0
            }
            "gfx_rect" => match host.gfx() {
                Some(target) => {
                    target.rect(arg(0), arg(1), arg(2), arg(3), Color::rgb(1.0, 1.0, 1.0), true);
                    1.0
                }
                None => 0.0,
            },
            _ => 0.0,
        }
    }
}

impl ExprEngine for MiniEngine {
    fn register_var(&mut self, name: &str) -> VarSlot {
        let slot = self.vars.slot(name);
        self.host_vars = self.host_vars.max(self.vars.names.len());
        slot
    }

    fn compile(&mut self, text: &str, line_offset: u32, resolver: &dyn VarResolver) -> Result<CodeHandle, String> {
        let toks = tokenize(text).map_err(|e| format!("line {}: {e}", line_offset + 1))?;
        let mut parser = Parser {
            toks,
            pos: 0,
            vars: &mut self.vars,
            resolver,
        };
        let code = parser.seq().map_err(|e| format!("line {}: {e}", line_offset + 1))?;
        if parser.pos != parser.toks.len() {
            return Err(format!("line {}: trailing input", line_offset + 1));
        }
        self.codes.push(Arc::new(code));
        Ok(CodeHandle((self.codes.len() - 1) as u32))
    }

    fn execute(&mut self, code: CodeHandle, host: &mut dyn ScriptHost) {
        let Some(code) = self.codes.get(code.0 as usize).cloned() else {
            return;
        };
        self.eval(&code, host);
    }

    fn release_code(&mut self) {
        self.codes.clear();
        self.vars.names.truncate(self.host_vars);
        self.vars.values.truncate(self.host_vars);
    }

    fn for_each_var(&self, visit: &mut dyn FnMut(&str, VarSlot) -> bool) {
        for (i, name) in self.vars.names.iter().enumerate() {
            if !visit(name, VarSlot(i as u32)) {
                break;
            }
        }
    }

    fn read_memory(&self, addr: u32, dest: &mut [f64]) {
        for (i, slot) in dest.iter_mut().enumerate() {
            *slot = self.memory.get(addr as usize + i).copied().unwrap_or(0.0);
        }
    }
}

/// Runtime handing out [`MiniEngine`]s.
#[derive(Debug, Default)]
pub struct MiniRuntime;

impl EngineRuntime for MiniRuntime {
    fn new_engine(&self) -> Box<dyn ExprEngine> {
        Box::new(MiniEngine::default())
    }
}

/// Messages captured by [`capture_config`].
pub type Captured = Arc<Mutex<Vec<(LogLevel, String)>>>;

/// A configuration around [`MiniRuntime`].
pub fn config() -> Config {
    Config::new(Arc::new(MiniRuntime))
}

/// A configuration whose reporter records every message.
pub fn capture_config() -> (Config, Captured) {
    let log: Captured = Arc::default();
    let sink = Arc::clone(&log);
    let config = config().with_reporter(move |level, msg| {
        if let Ok(mut entries) = sink.lock() {
            entries.push((level, msg.to_owned()));
        }
    });
    (config, log)
}

/// Write `text` to `dir/name`, creating parent directories.
pub fn write_file(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, text).unwrap();
    path
}

/// Write `text` as `main.jsfx` in `dir`, create an effect from `config`
/// and load it.
pub fn load_in(dir: &Path, config: Config, text: &str) -> jsfx_host::Effect {
    let path = write_file(dir, "main.jsfx", text);
    let mut fx = jsfx_host::Effect::new(Arc::new(config));
    fx.load(&path, jsfx_host::LoadOptions::default()).unwrap();
    fx
}

/// Like [`load_in`], then compile with default options.
pub fn compiled_in(dir: &Path, config: Config, text: &str) -> jsfx_host::Effect {
    let mut fx = load_in(dir, config, text);
    fx.compile(jsfx_host::CompileOptions::default()).unwrap();
    fx
}

/// Value of the script variable `name`.
pub fn var(fx: &jsfx_host::Effect, name: &str) -> f64 {
    fx.find_var(name).map_or(f64::NAN, |slot| fx.var_value(slot))
}
