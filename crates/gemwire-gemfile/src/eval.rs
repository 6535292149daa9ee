//! Recursive-descent evaluator for the Gemfile DSL.
//!
//! Statements execute under an `execute` flag threaded through blocks: a
//! `group`/`platforms` block whose names fail the environment filter is
//! still parsed, but produces no effect. `eval_gemfile` recurses into the
//! referenced file with paths resolved against the current file's directory.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use smallvec::SmallVec;

use crate::env::Environment;
use crate::error::GemfileError;
use crate::gemfile::{Gem, Gemfile, Gemspec};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};
use crate::value::GemValue;

const MAX_INCLUDE_DEPTH: u32 = 32;
const MAX_WORD: usize = 256;

/// Parse a Gemfile under an environment.
pub fn parse(path: impl AsRef<Path>, env: &Environment) -> Result<Gemfile, GemfileError> {
    parse_with(path, env, false)
}

/// Parse a Gemfile, optionally silencing the evaluator's debug tracing.
pub fn parse_with(
    path: impl AsRef<Path>,
    env: &Environment,
    quiet: bool,
) -> Result<Gemfile, GemfileError> {
    let mut gemfile = Gemfile::default();
    eval_file(&mut gemfile, path.as_ref(), env, 0, true, quiet)?;
    Ok(gemfile)
}

fn eval_file(
    gemfile: &mut Gemfile,
    path: &Path,
    env: &Environment,
    depth: u32,
    execute: bool,
    quiet: bool,
) -> Result<(), GemfileError> {
    if depth > MAX_INCLUDE_DEPTH {
        return Err(GemfileError::TooDeep {
            path: path.to_path_buf(),
        });
    }
    let file = File::open(path).map_err(|e| GemfileError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let lexer = Lexer::new(BufReader::new(file), path);
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    let mut parser = Parser {
        lexer,
        gemfile,
        env,
        execute,
        depth,
        dir,
        quiet,
    };
    parser.block(false)
}

#[derive(Copy, Clone)]
enum FilterKind {
    Group,
    Platform,
}

struct Parser<'a, R> {
    lexer: Lexer<R>,
    gemfile: &'a mut Gemfile,
    env: &'a Environment,
    execute: bool,
    depth: u32,
    dir: PathBuf,
    quiet: bool,
}

impl<R: BufRead> Parser<'_, R> {
    /// Run statements until EOF (top level) or the closing `end` (do-block).
    fn block(&mut self, in_do: bool) -> Result<(), GemfileError> {
        loop {
            let token = self.lexer.next_token()?;
            match token.kind {
                TokenKind::Eof if !in_do => return Ok(()),
                TokenKind::Identifier => {
                    if in_do && token.text == "end" {
                        return self.expect_eol();
                    }
                    self.statement(&token)?;
                }
                _ => return Err(self.unexpected(&token)),
            }
        }
    }

    fn statement(&mut self, token: &Token) -> Result<(), GemfileError> {
        match token.text.as_str() {
            "source" => self.stmt_source(),
            "ruby" => self.stmt_ruby(),
            "gemspec" => self.stmt_gemspec(),
            "gem" => self.stmt_gem(),
            "group" => self.stmt_filter_block(FilterKind::Group),
            "platforms" | "platform" => self.stmt_filter_block(FilterKind::Platform),
            "eval_gemfile" => self.stmt_eval_gemfile(),
            "if" => Err(self.syntax(token, "if blocks are not supported")),
            _ => Err(self.unexpected(token)),
        }
    }

    fn stmt_source(&mut self) -> Result<(), GemfileError> {
        let url = self.expect_string()?;
        if self.execute {
            self.trace(format_args!("gemfile source is \"{}\"", url));
            self.gemfile.source = Some(url);
        }
        self.expect_eol()
    }

    fn stmt_ruby(&mut self) -> Result<(), GemfileError> {
        // informational only; the constraint is noted, not enforced
        let value = self.expression()?;
        if self.execute {
            self.trace(format_args!("gemfile requests ruby version {}", value));
        }
        self.expect_eol()
    }

    fn stmt_gemspec(&mut self) -> Result<(), GemfileError> {
        if self.execute {
            self.gemfile.gemspecs.push(Gemspec {
                dir: self.dir.clone(),
            });
        }
        self.expect_eol()
    }

    fn stmt_gem(&mut self) -> Result<(), GemfileError> {
        let mut gem = Gem {
            ignore: !self.execute,
            ..Gem::default()
        };
        loop {
            let token = self.lexer.next_token()?;
            match token.kind {
                TokenKind::Str => gem.add_argument(token.text),
                TokenKind::Symbol => {
                    // :key => value
                    let name = token.text;
                    let op = self.expect(TokenKind::Operator)?;
                    if op.text != "=>" {
                        return Err(self.syntax(&op, "expected operator =>"));
                    }
                    let value = self.expression()?;
                    gem.set_ivar(name, value);
                }
                TokenKind::Identifier => {
                    // key: value
                    let name = token.text;
                    self.expect(TokenKind::Colon)?;
                    let value = self.expression()?;
                    gem.set_ivar(name, value);
                }
                _ => return Err(self.unexpected(&token)),
            }
            let sep = self.lexer.next_token()?;
            if sep.is_eol() {
                break;
            }
            if sep.kind != TokenKind::Comma {
                return Err(self.unexpected(&sep));
            }
        }
        gem.apply_environment(self.env);
        if gem.ignore {
            self.trace(format_args!("gem {} is being ignored", gem.name));
        }
        self.gemfile.gems.push(gem);
        Ok(())
    }

    fn stmt_filter_block(&mut self, kind: FilterKind) -> Result<(), GemfileError> {
        let mut names: SmallVec<[String; 4]> = SmallVec::new();
        let token = loop {
            names.push(self.expect_symbol()?);
            let t = self.lexer.next_token()?;
            if t.kind != TokenKind::Comma {
                break t;
            }
        };

        if token.is_eol() {
            // a bare name list has no effect
            return Ok(());
        }
        if token.kind != TokenKind::Identifier || token.text != "do" {
            return Err(self.unexpected(&token));
        }
        self.expect_eol()?;

        let outer = self.execute;
        if outer {
            let matched = match kind {
                FilterKind::Group => self.env.match_group(&names),
                FilterKind::Platform => self.env.match_platform(&names),
            };
            if !matched {
                self.trace(format_args!(
                    "block names {:?} do not match the environment",
                    names
                ));
                self.execute = false;
            }
        }
        let result = self.block(true);
        self.execute = outer;
        result
    }

    fn stmt_eval_gemfile(&mut self) -> Result<(), GemfileError> {
        let raw = self.expect_string()?;
        let target = {
            let p = Path::new(&raw);
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                self.dir.join(p)
            }
        };
        self.trace(format_args!("including gemfile \"{}\"", target.display()));
        eval_file(
            self.gemfile,
            &target,
            self.env,
            self.depth + 1,
            self.execute,
            self.quiet,
        )?;
        self.expect_eol()
    }

    /// A literal expression: no infix operators, no method calls.
    fn expression(&mut self) -> Result<GemValue, GemfileError> {
        let token = self.lexer.next_token()?;
        match token.kind {
            TokenKind::Identifier => match token.text.as_str() {
                "true" => Ok(GemValue::Bool(true)),
                "false" => Ok(GemValue::Bool(false)),
                "RUBY_VERSION" => Ok(GemValue::Str(self.env.ruby_version().to_string())),
                _ => Err(self.unexpected(&token)),
            },
            TokenKind::Str => Ok(GemValue::Str(token.text)),
            TokenKind::Symbol => Ok(GemValue::Symbol(token.text)),
            TokenKind::LBrack => self.array_literal(),
            TokenKind::Percent => match self.lexer.next_char() {
                Some(b'w') => self.percent_w_literal(),
                Some(c) => {
                    Err(self.lexer.error(format!("unsupported %{} literal", c as char)))
                }
                None => Err(self.lexer.error("unexpected end of line")),
            },
            _ => Err(self.unexpected(&token)),
        }
    }

    fn array_literal(&mut self) -> Result<GemValue, GemfileError> {
        self.lexer.begin_group();
        let result = (|| {
            let mut items = Vec::new();
            let end = loop {
                items.push(self.expression()?);
                let t = self.lexer.next_token()?;
                if t.kind != TokenKind::Comma {
                    break t;
                }
            };
            if end.kind != TokenKind::RBrack {
                return Err(self.unexpected(&end));
            }
            Ok(GemValue::Array(items))
        })();
        self.lexer.end_group();
        result
    }

    /// The `%w[ word word ]` literal; the delimiter may be any of `[]`,
    /// `()`, `{}` or a single matched character, and words are read
    /// character by character.
    fn percent_w_literal(&mut self) -> Result<GemValue, GemfileError> {
        let left = self
            .lexer
            .next_char()
            .ok_or_else(|| self.lexer.error("unexpected end of line"))?;
        let right = match left {
            b'[' => b']',
            b'(' => b')',
            b'{' => b'}',
            other => other,
        };

        let mut items = Vec::new();
        let mut word: Vec<u8> = Vec::new();
        loop {
            let c = self
                .lexer
                .next_char()
                .ok_or_else(|| self.lexer.error("unexpected end of line"))?;
            if c == right || c.is_ascii_whitespace() {
                if !word.is_empty() {
                    items.push(GemValue::Str(String::from_utf8_lossy(&word).into_owned()));
                    word.clear();
                }
            }
            if c == right {
                return Ok(GemValue::Array(items));
            }
            if !c.is_ascii_whitespace() {
                if word.len() + 2 >= MAX_WORD {
                    return Err(self.lexer.error("word in %w literal too long"));
                }
                word.push(c);
            }
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, GemfileError> {
        let token = self.lexer.next_token()?;
        if token.kind != kind {
            return Err(self.unexpected(&token));
        }
        Ok(token)
    }

    fn expect_string(&mut self) -> Result<String, GemfileError> {
        self.expect(TokenKind::Str).map(|t| t.text)
    }

    fn expect_symbol(&mut self) -> Result<String, GemfileError> {
        self.expect(TokenKind::Symbol).map(|t| t.text)
    }

    fn expect_eol(&mut self) -> Result<(), GemfileError> {
        let token = self.lexer.next_token()?;
        if token.is_eol() {
            Ok(())
        } else {
            Err(self.unexpected(&token))
        }
    }

    /// Emit one indented debug line unless silenced.
    fn trace(&self, args: std::fmt::Arguments<'_>) {
        if !self.quiet {
            tracing::debug!("{:indent$}{}", "", args, indent = self.depth as usize * 2);
        }
    }

    fn unexpected(&self, token: &Token) -> GemfileError {
        let message = match token.kind {
            TokenKind::Eof => "unexpected end of file".to_string(),
            TokenKind::Eol => "unexpected end of line".to_string(),
            _ => format!(
                "unexpected token {} \"{}\"",
                token.kind.name(),
                token.text
            ),
        };
        self.syntax(token, message)
    }

    fn syntax(&self, token: &Token, message: impl Into<String>) -> GemfileError {
        GemfileError::Syntax {
            path: self.lexer.path().to_path_buf(),
            line: token.line,
            col: token.col,
            message: message.into(),
        }
    }
}
