// Copyright (c) 2021, BlockProject 3D
//
// All rights reserved.
//
// Redistribution and use in source and binary forms, with or without modification,
// are permitted provided that the following conditions are met:
//
//     * Redistributions of source code must retain the above copyright notice,
//       this list of conditions and the following disclaimer.
//     * Redistributions in binary form must reproduce the above copyright notice,
//       this list of conditions and the following disclaimer in the documentation
//       and/or other materials provided with the distribution.
//     * Neither the name of BlockProject 3D nor the names of its contributors
//       may be used to endorse or promote products derived from this software
//       without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS
// "AS IS" AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT
// LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR
// A PARTICULAR PURPOSE ARE DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT OWNER OR
// CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL,
// EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO,
// PROCUREMENT OF SUBSTITUTE GOODS OR SERVICES; LOSS OF USE, DATA, OR
// PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF
// LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING
// NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE OF THIS
// SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

use std::{collections::VecDeque, rc::Rc};

use log::trace;
use regex::Regex;

use crate::{
    error::{Error, Type},
    include::IncludeResolver,
    lexer::{
        state::{parse_number, CodeBlockKind, ConditionalOp, ParseState},
        token::{Token, CHR_BLOCK_END, CHR_BLOCK_START, CHR_DIRECTIVE, CHR_NL, CHR_STRING, STR_FALSE, STR_TRUE}
    }
};

#[derive(Clone, Debug)]
pub struct TokenEntry
{
    pub line: usize,
    pub col: usize,
    pub file: Option<Rc<str>>,
    pub token: Token
}

fn is_whitespace(chr: u8) -> bool
{
    matches!(chr, b'\t' | b' ' | b'\r' | CHR_NL)
}

fn is_ident_start(chr: u8) -> bool
{
    chr.is_ascii_alphabetic() || chr == b'_'
}

fn is_ident(chr: u8) -> bool
{
    chr.is_ascii_alphanumeric() || chr == b'_'
}

fn is_name(s: &str) -> bool
{
    let bytes = s.as_bytes();
    !bytes.is_empty() && is_ident_start(bytes[0]) && bytes.iter().all(|v| is_ident(*v))
}

fn split_word(text: &str) -> (&str, &str)
{
    match text.find(char::is_whitespace) {
        Some(i) => (&text[..i], text[i..].trim()),
        None => (text, "")
    }
}

/// Tokenizer with include, define, conditional and verbatim code block handling.
pub struct Lexer<'a, R: IncludeResolver>
{
    state: ParseState,
    resolver: &'a R,
    tokens: VecDeque<TokenEntry>,
    at_line_start: bool,
    int: Regex,
    hex: Regex,
    float: Regex
}

impl<'a, R: IncludeResolver> Lexer<'a, R>
{
    pub fn new(resolver: &'a R) -> Lexer<'a, R>
    {
        Lexer {
            state: ParseState::default(),
            resolver,
            tokens: VecDeque::new(),
            at_line_start: true,
            int: Regex::new(r"^-?\d+$").unwrap(),
            hex: Regex::new(r"^-?0[xX][0-9a-fA-F]+$").unwrap(),
            float: Regex::new(r"^-?(\d+\.\d*|\.\d+)f?$").unwrap()
        }
    }

    pub fn define(&mut self, name: &str, value: Option<&str>)
    {
        self.state.define(name, value);
    }

    fn peek(&self, offset: usize) -> Option<u8>
    {
        self.state.frame().and_then(|v| v.peek(offset))
    }

    fn advance(&mut self)
    {
        if let Some(frame) = self.state.frame_mut() {
            frame.advance();
        }
    }

    fn pos(&self) -> (usize, usize)
    {
        self.state.frame().map(|v| (v.line, v.col)).unwrap_or((0, 0))
    }

    fn push_token(&mut self, line: usize, col: usize, token: Token)
    {
        self.tokens.push_back(TokenEntry {
            line,
            col,
            file: self.state.file_name(),
            token
        });
    }

    fn take_while<F: Fn(u8) -> bool>(&mut self, f: F) -> String
    {
        let mut bytes = Vec::new();
        while let Some(chr) = self.peek(0) {
            if !f(chr) {
                break;
            }
            bytes.push(chr);
            self.advance();
        }
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Reads up to, but not including, the next line break.
    fn read_line(&mut self) -> String
    {
        self.take_while(|v| v != CHR_NL)
    }

    fn skip_comment(&mut self, line: usize, col: usize) -> Result<(), Error>
    {
        self.advance();
        self.advance();
        loop {
            match (self.peek(0), self.peek(1)) {
                (Some(b'*'), Some(b'/')) => {
                    self.advance();
                    self.advance();
                    return Ok(());
                },
                (Some(_), _) => self.advance(),
                (None, _) => return Err(self.state.error(line, col, Type::UnterminatedComment))
            }
        }
    }

    fn read_string(&mut self, line: usize, col: usize) -> Result<String, Error>
    {
        self.advance();
        let mut bytes = Vec::new();
        loop {
            match self.peek(0) {
                Some(CHR_STRING) => {
                    self.advance();
                    break;
                },
                Some(b'\\') => {
                    self.advance();
                    if let Some(chr) = self.peek(0) {
                        bytes.push(chr);
                        self.advance();
                    }
                },
                Some(CHR_NL) | None => return Err(self.state.error(line, col, Type::UnterminatedString)),
                Some(chr) => {
                    bytes.push(chr);
                    self.advance();
                }
            }
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn check_number(&self, word: &str) -> Option<Token>
    {
        if self.int.is_match(word) {
            return word.parse().ok().map(Token::Int);
        }
        if self.hex.is_match(word) {
            let (negative, digits) = match word.strip_prefix('-') {
                Some(v) => (true, v),
                None => (false, word)
            };
            let value = i32::from_str_radix(&digits[2..], 16).ok()?;
            return Some(Token::Int(if negative { -value } else { value }));
        }
        if self.float.is_match(word) {
            return word.trim_end_matches('f').parse().ok().map(Token::Float);
        }
        None
    }

    fn raw_block_kind(&self) -> Option<CodeBlockKind>
    {
        let n = self.tokens.len();
        match self.tokens.back().map(|v| &v.token) {
            Some(Token::Code) => Some(CodeBlockKind::Code),
            Some(Token::Identifier(_)) if n >= 2 && self.tokens[n - 2].token == Token::SubShader => {
                Some(CodeBlockKind::SubShader)
            },
            _ => None
        }
    }

    /// Captures a brace balanced block verbatim. Braces inside comments and strings are not
    /// counted.
    fn capture_raw_block(&mut self, kind: CodeBlockKind, line: usize, col: usize) -> Result<usize, Error>
    {
        self.advance();
        let index = self.state.begin_code_block(kind);
        let mut code = Vec::new();
        let mut depth = 1;
        loop {
            let chr = match self.peek(0) {
                Some(v) => v,
                None => return Err(self.state.error(line, col, Type::UnterminatedCodeBlock))
            };
            match chr {
                CHR_BLOCK_START => depth += 1,
                CHR_BLOCK_END => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        break;
                    }
                },
                b'/' if self.peek(1) == Some(b'/') => {
                    while let Some(v) = self.peek(0) {
                        if v == CHR_NL {
                            break;
                        }
                        code.push(v);
                        self.advance();
                    }
                    continue;
                },
                b'/' if self.peek(1) == Some(b'*') => {
                    code.extend_from_slice(b"/*");
                    self.advance();
                    self.advance();
                    loop {
                        match (self.peek(0), self.peek(1)) {
                            (Some(b'*'), Some(b'/')) => {
                                code.extend_from_slice(b"*/");
                                self.advance();
                                self.advance();
                                break;
                            },
                            (Some(v), _) => {
                                code.push(v);
                                self.advance();
                            },
                            (None, _) => return Err(self.state.error(line, col, Type::UnterminatedCodeBlock))
                        }
                    }
                    continue;
                },
                CHR_STRING => {
                    code.push(chr);
                    self.advance();
                    while let Some(v) = self.peek(0) {
                        code.push(v);
                        self.advance();
                        if v == b'\\' {
                            if let Some(escaped) = self.peek(0) {
                                code.push(escaped);
                                self.advance();
                            }
                        } else if v == CHR_STRING || v == CHR_NL {
                            break;
                        }
                    }
                    continue;
                },
                _ => ()
            }
            code.push(chr);
            self.advance();
        }
        trace!("Captured {:?} block #{} ({} bytes)", kind, index, code.len());
        self.state.append_code_block(kind, &String::from_utf8_lossy(&code));
        Ok(index)
    }

    fn invalid_directive(&self, line: usize, col: usize, text: &str) -> Error
    {
        self.state.error(line, col, Type::InvalidDirective(text.into()))
    }

    fn check_open(&self, directive: &'static str, line: usize, col: usize) -> Result<(), Error>
    {
        if !self.state.has_conditional() {
            return Err(self.state.error(line, col, Type::UnmatchedConditional(directive)));
        }
        Ok(())
    }

    /// Parses `NAME`, `!NAME`, `defined(NAME)`, `!defined(NAME)` or `NAME <op> <int>` into the
    /// current conditional block.
    fn parse_condition(&mut self, text: &str, line: usize, col: usize) -> Result<(), Error>
    {
        let mut expr = text.trim();
        let mut negate = false;
        if let Some(v) = expr.strip_prefix('!') {
            negate = true;
            expr = v.trim_start();
        }
        if let Some(v) = expr.strip_prefix("defined").filter(|v| v.trim_start().starts_with('(')) {
            let name = v.trim().trim_start_matches('(').trim_end_matches(')').trim();
            if !is_name(name) {
                return Err(self.invalid_directive(line, col, text));
            }
            self.state.set_conditional(name);
            self.state.set_conditional_op(match negate {
                true => ConditionalOp::NotDefined,
                false => ConditionalOp::Defined
            });
            return Ok(());
        }
        let end = expr
            .find(|v: char| !(v.is_ascii_alphanumeric() || v == '_'))
            .unwrap_or(expr.len());
        let (name, rest) = expr.split_at(end);
        if name.is_empty() {
            return Err(self.invalid_directive(line, col, text));
        }
        self.state.set_conditional(name);
        let rest = rest.trim();
        if rest.is_empty() {
            if negate {
                self.state.set_conditional_op(ConditionalOp::NotEnabled);
            }
            return Ok(());
        }
        if negate {
            return Err(self.invalid_directive(line, col, text));
        }
        let op_end = rest.find(|v: char| !"=!<>".contains(v)).unwrap_or(rest.len());
        let op = ConditionalOp::from_symbol(&rest[..op_end]).ok_or_else(|| self.invalid_directive(line, col, text))?;
        let value = parse_number(&rest[op_end..]).ok_or_else(|| self.invalid_directive(line, col, text))?;
        self.state.set_conditional_op(op);
        self.state.set_conditional_value(value);
        Ok(())
    }

    fn directive(&mut self) -> Result<(), Error>
    {
        let (line, col) = self.pos();
        self.advance();
        let raw = self.read_line();
        let text = match raw.find("//") {
            Some(i) => &raw[..i],
            None => &raw
        }
        .trim();
        let (name, rest) = split_word(text);
        let enabled = self.state.is_enabled();
        match name {
            "ifdef" => {
                if !is_name(rest) {
                    return Err(self.invalid_directive(line, col, text));
                }
                self.state.push_conditional(Some(rest));
            },
            "ifndef" => {
                if !is_name(rest) {
                    return Err(self.invalid_directive(line, col, text));
                }
                self.state.push_conditional(None);
                self.state.set_conditional(rest);
                self.state.set_conditional_op(ConditionalOp::NotDefined);
                self.state.evaluate_conditional();
            },
            "if" => {
                self.state.push_conditional(None);
                self.parse_condition(rest, line, col)?;
                self.state.evaluate_conditional();
            },
            "elif" => {
                self.check_open("elif", line, col)?;
                self.parse_condition(rest, line, col)?;
                self.state.evaluate_conditional();
            },
            "else" => {
                self.check_open("else", line, col)?;
                self.state.switch_conditional();
            },
            "endif" => {
                self.check_open("endif", line, col)?;
                self.state.pop_conditional();
            },
            _ if !enabled => (),
            "include" => {
                let file = rest
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .or_else(|| rest.strip_prefix('<').and_then(|v| v.strip_suffix('>')))
                    .filter(|v| !v.is_empty())
                    .ok_or_else(|| self.invalid_directive(line, col, text))?;
                self.state.push_include(file, self.resolver, line, col)?;
                self.at_line_start = true;
            },
            "define" => {
                let (name, expr) = split_word(rest);
                if !is_name(name) {
                    return Err(self.invalid_directive(line, col, text));
                }
                self.state.define(name, Some(expr));
            },
            "undef" => {
                if !is_name(rest) {
                    return Err(self.invalid_directive(line, col, text));
                }
                self.state.undefine(rest);
            },
            _ => return Err(self.invalid_directive(line, col, text))
        }
        Ok(())
    }

    pub fn process(&mut self, source: &str) -> Result<(), Error>
    {
        self.state.push_root(source);
        self.at_line_start = true;
        loop {
            let chr = match self.peek(0) {
                Some(v) => v,
                None => {
                    if self.state.pop_include() {
                        self.at_line_start = true;
                        continue;
                    }
                    break;
                }
            };
            if chr == CHR_NL {
                self.advance();
                self.at_line_start = true;
                continue;
            }
            if is_whitespace(chr) {
                self.advance();
                continue;
            }
            if chr == CHR_DIRECTIVE && self.at_line_start {
                self.directive()?;
                continue;
            }
            self.at_line_start = false;
            if !self.state.is_enabled() {
                self.read_line();
                continue;
            }
            let (line, col) = self.pos();
            if chr == b'/' && self.peek(1) == Some(b'/') {
                self.read_line();
                continue;
            }
            if chr == b'/' && self.peek(1) == Some(b'*') {
                self.skip_comment(line, col)?;
                continue;
            }
            if chr == CHR_STRING {
                let s = self.read_string(line, col)?;
                self.push_token(line, col, Token::Str(s));
                continue;
            }
            if chr == CHR_BLOCK_START {
                if let Some(kind) = self.raw_block_kind() {
                    let index = self.capture_raw_block(kind, line, col)?;
                    self.push_token(line, col, Token::RawBlock(index));
                    continue;
                }
            }
            if let Some(tok) = Token::punct(chr) {
                self.advance();
                self.push_token(line, col, tok);
                continue;
            }
            if chr.is_ascii_digit() || chr == b'-' || chr == b'.' {
                self.advance();
                let mut word = String::from(chr as char);
                word.push_str(&self.take_while(|v| is_ident(v) || v == b'.'));
                match self.check_number(&word) {
                    Some(tok) => self.push_token(line, col, tok),
                    None => return Err(self.state.error(line, col, Type::UnidentifiedToken(word)))
                }
                continue;
            }
            if is_ident_start(chr) {
                let word = self.take_while(is_ident);
                let tok = if word == STR_TRUE {
                    Token::Bool(true)
                } else if word == STR_FALSE {
                    Token::Bool(false)
                } else if let Some(keyword) = Token::keyword(&word) {
                    keyword
                } else {
                    Token::Identifier(word)
                };
                self.push_token(line, col, tok);
                continue;
            }
            return Err(self.state.error(line, col, Type::UnidentifiedToken((chr as char).to_string())));
        }
        if self.state.has_conditional() {
            let (line, col) = self.pos();
            return Err(self.state.error(line, col, Type::UnterminatedConditional));
        }
        Ok(())
    }

    pub fn state(&self) -> &ParseState
    {
        &self.state
    }

    pub fn into_tokens(self) -> VecDeque<TokenEntry>
    {
        self.tokens
    }

    pub fn into_parts(self) -> (VecDeque<TokenEntry>, ParseState)
    {
        (self.tokens, self.state)
    }
}

#[cfg(test)]
mod test
{
    use proptest::prelude::*;

    use super::*;
    use crate::include::{MemoryIncludes, NoIncludes};

    fn lex(source: &str) -> Vec<Token>
    {
        let mut lexer = Lexer::new(&NoIncludes);
        lexer.process(source).unwrap();
        lexer.into_tokens().into_iter().map(|TokenEntry { token, .. }| token).collect()
    }

    #[test]
    fn basic_lexer()
    {
        let toks = lex("
            shader Test
            {
                depth { read = false; compare = lte; };
                raster { depthbias = -0.5f; };
                stencil { readmask = 0xFF; };
            };
        ");
        assert_eq!(
            toks,
            vec![
                Token::Shader,
                Token::Identifier("Test".into()),
                Token::BlockStart,
                Token::Depth,
                Token::BlockStart,
                Token::Read,
                Token::Eq,
                Token::Bool(false),
                Token::Break,
                Token::Compare,
                Token::Eq,
                Token::Identifier("lte".into()),
                Token::Break,
                Token::BlockEnd,
                Token::Break,
                Token::Raster,
                Token::BlockStart,
                Token::DepthBias,
                Token::Eq,
                Token::Float(-0.5),
                Token::Break,
                Token::BlockEnd,
                Token::Break,
                Token::Stencil,
                Token::BlockStart,
                Token::ReadMask,
                Token::Eq,
                Token::Int(255),
                Token::Break,
                Token::BlockEnd,
                Token::Break,
                Token::BlockEnd,
                Token::Break
            ]
        );
    }

    #[test]
    fn lexer_comments()
    {
        let toks = lex("
            // line comment
            tags = { \"a\", /* inline */ \"b\" }
            /* multi
               line */
        ");
        assert_eq!(
            toks,
            vec![
                Token::Tags,
                Token::Eq,
                Token::BlockStart,
                Token::Str("a".into()),
                Token::Comma,
                Token::Str("b".into()),
                Token::BlockEnd
            ]
        );
    }

    #[test]
    fn code_blocks()
    {
        let mut lexer = Lexer::new(&NoIncludes);
        lexer.define("GLOBAL", Some("2"));
        lexer
            .process("
            #define LOCAL
            code { float4 fsmain() { return 0; /* } */ } // }
            }
            subshader Ext { int x = \"}\"; }
        ")
            .unwrap();
        let (tokens, state) = lexer.into_parts();
        let toks: Vec<Token> = tokens.into_iter().map(|v| v.token).collect();
        assert_eq!(
            toks,
            vec![
                Token::Code,
                Token::RawBlock(0),
                Token::SubShader,
                Token::Identifier("Ext".into()),
                Token::RawBlock(0)
            ]
        );
        let blocks = state.into_code_blocks();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].kind, CodeBlockKind::Code);
        assert_eq!(
            blocks[0].code,
            "#define GLOBAL 2\n#define LOCAL\n float4 fsmain() { return 0; /* } */ } // }\n            "
        );
        assert_eq!(blocks[1].kind, CodeBlockKind::SubShader);
        assert!(blocks[1].code.ends_with(" int x = \"}\"; "));
    }

    #[test]
    fn nested_conditionals()
    {
        let toks = lex("
            #define FOO 1
            #if FOO
            a
            #if BAR
            b
            #endif
            c
            #endif
            #ifndef FOO
            d
            #elif FOO == 1
            e
            #else
            f
            #endif
        ");
        assert_eq!(
            toks,
            vec![
                Token::Identifier("a".into()),
                Token::Identifier("c".into()),
                Token::Identifier("e".into())
            ]
        );
    }

    #[test]
    fn disabled_parent()
    {
        let toks = lex("
            #if BAR
            #ifndef BAZ
            x
            #else
            y
            #endif
            #include \"never.bslinc\"
            #endif
            z
        ");
        assert_eq!(toks, vec![Token::Identifier("z".into())]);
    }

    #[test]
    fn includes()
    {
        let mut includes = MemoryIncludes::new();
        includes
            .insert("a.bslinc", "#include \"b.bslinc\"\nmixin A {}\n")
            .insert("b.bslinc", "mixin B {}");
        let mut lexer = Lexer::new(&includes);
        lexer.process("#include \"a.bslinc\"\n#include <b.bslinc>\nshader S {}").unwrap();
        assert_eq!(lexer.state().include_depth(), 0);
        assert_eq!(lexer.state().include_balance(), (3, 3));
        assert_eq!(lexer.state().includes(), &["a.bslinc".to_string(), "b.bslinc".to_string()]);
        let tokens = lexer.into_tokens();
        let names: Vec<String> = tokens
            .iter()
            .filter_map(|v| v.token.clone().identifier())
            .collect();
        assert_eq!(names, vec!["B", "A", "B", "S"]);
        assert_eq!(tokens[1].file.as_deref(), Some("b.bslinc"));
        assert_eq!(tokens[tokens.len() - 3].file, None);
    }

    #[test]
    fn include_not_found()
    {
        let mut lexer = Lexer::new(&NoIncludes);
        let err = lexer.process("\n  #include \"missing.bslinc\"").unwrap_err();
        assert_eq!(err.etype, Type::IncludeNotFound("missing.bslinc".into()));
        assert_eq!((err.line, err.col), (2, 3));
    }

    #[test]
    fn conditional_errors()
    {
        let mut lexer = Lexer::new(&NoIncludes);
        let err = lexer.process("#ifdef FOO\nshader A {}\n").unwrap_err();
        assert_eq!(err.etype, Type::UnterminatedConditional);
        let mut lexer = Lexer::new(&NoIncludes);
        let err = lexer.process("#endif\n").unwrap_err();
        assert_eq!(err.etype, Type::UnmatchedConditional("endif"));
        let mut lexer = Lexer::new(&NoIncludes);
        let err = lexer.process("#pragma once\n").unwrap_err();
        assert_eq!(err.etype, Type::InvalidDirective("pragma once".into()));
    }

    #[test]
    fn lexer_errors()
    {
        let mut lexer = Lexer::new(&NoIncludes);
        let err = lexer.process("shader A { code { float4 x; { }").unwrap_err();
        assert_eq!(err.etype, Type::UnterminatedCodeBlock);
        let mut lexer = Lexer::new(&NoIncludes);
        let err = lexer.process("tags = { \"abc }").unwrap_err();
        assert_eq!(err.etype, Type::UnterminatedString);
        let mut lexer = Lexer::new(&NoIncludes);
        let err = lexer.process("shader $").unwrap_err();
        assert_eq!(err.etype, Type::UnidentifiedToken("$".into()));
        assert_eq!((err.line, err.col), (1, 8));
    }

    proptest! {
        #[test]
        fn never_panics(source in "\\PC*")
        {
            let mut lexer = Lexer::new(&NoIncludes);
            let _ = lexer.process(&source);
        }
    }
}
