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

use std::fmt::{Display, Formatter};

use crate::lexer::token::{Token, Type as TokenType};

#[derive(Debug, Clone, PartialEq)]
pub enum Type
{
    UnexpectedToken
    {
        actual: Token,
        expected: TokenType
    },
    UnknownToken(Token),
    UnidentifiedToken(String),
    UnknownValue
    {
        kind: &'static str,
        value: String
    },
    IncludeNotFound(String),
    IncludeDepth(String),
    InvalidDirective(String),
    UnmatchedConditional(&'static str),
    UnterminatedConditional,
    UnterminatedString,
    UnterminatedComment,
    UnterminatedCodeBlock,
    Eof
}

impl Display for Type
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        match self {
            Type::UnexpectedToken { actual, expected } => {
                write!(f, "unexpected token (expected {}, got {})", expected, actual)
            },
            Type::UnknownToken(token) => write!(f, "unknown token ({})", token),
            Type::UnidentifiedToken(s) => write!(f, "unidentified token '{}'", s),
            Type::UnknownValue { kind, value } => write!(f, "'{}' is not a valid {}", value, kind),
            Type::IncludeNotFound(name) => write!(f, "include '{}' not found", name),
            Type::IncludeDepth(name) => write!(f, "include '{}' exceeds maximum include depth", name),
            Type::InvalidDirective(line) => write!(f, "invalid pre-processor directive '{}'", line),
            Type::UnmatchedConditional(directive) => write!(f, "#{} without matching #if", directive),
            Type::UnterminatedConditional => f.write_str("unterminated conditional block (missing #endif)"),
            Type::UnterminatedString => f.write_str("unterminated string"),
            Type::UnterminatedComment => f.write_str("unterminated comment"),
            Type::UnterminatedCodeBlock => f.write_str("unterminated code block"),
            Type::Eof => f.write_str("unexpected EOF")
        }
    }
}

/// A syntax error; parsing stops at the first one.
#[derive(Debug, Clone, PartialEq)]
pub struct Error
{
    pub file: Option<String>,
    pub line: usize,
    pub col: usize,
    pub etype: Type
}

impl Error
{
    pub fn new(line: usize, col: usize, etype: Type) -> Self
    {
        Self {
            file: None,
            line,
            col,
            etype
        }
    }

    pub fn with_file<T: Into<String>>(mut self, file: Option<T>) -> Self
    {
        self.file = file.map(|v| v.into());
        self
    }
}

impl Display for Error
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        match &self.file {
            Some(file) => write!(f, "{}:{}:{} {}", file, self.line, self.col, self.etype),
            None => write!(f, "{}:{} {}", self.line, self.col, self.etype)
        }
    }
}

impl std::error::Error for Error {}
