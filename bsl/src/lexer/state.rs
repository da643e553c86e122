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

use std::rc::Rc;

use log::trace;

use crate::{
    error::{Error, Type},
    include::{IncludeHandle, IncludeResolver}
};

pub const MAX_INCLUDE_DEPTH: usize = 64;

/// One source buffer on the include stack.
pub struct IncludeFrame
{
    pub name: Option<Rc<str>>,
    pub text: Vec<u8>,
    pub pos: usize,
    pub line: usize,
    pub col: usize
}

impl IncludeFrame
{
    pub fn new(name: Option<Rc<str>>, text: Vec<u8>) -> IncludeFrame
    {
        IncludeFrame {
            name,
            text,
            pos: 0,
            line: 1,
            col: 1
        }
    }

    pub fn peek(&self, offset: usize) -> Option<u8>
    {
        self.text.get(self.pos + offset).copied()
    }

    pub fn is_eof(&self) -> bool
    {
        self.pos >= self.text.len()
    }

    pub fn advance(&mut self)
    {
        if let Some(c) = self.text.get(self.pos) {
            if *c == b'\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
            self.pos += 1;
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DefineEntry
{
    pub name: String,
    pub expr: Option<String>
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConditionalOp
{
    Defined,
    NotDefined,
    Enabled,
    NotEnabled,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge
}

impl ConditionalOp
{
    pub fn from_symbol(op: &str) -> Option<ConditionalOp>
    {
        match op {
            "==" => Some(ConditionalOp::Eq),
            "!=" => Some(ConditionalOp::Ne),
            "<" => Some(ConditionalOp::Lt),
            "<=" => Some(ConditionalOp::Le),
            ">" => Some(ConditionalOp::Gt),
            ">=" => Some(ConditionalOp::Ge),
            _ => None
        }
    }
}

#[derive(Clone, Debug)]
pub struct ConditionalData
{
    name: Option<String>,
    op: ConditionalOp,
    value: i64,
    enabled: bool,
    parent_enabled: bool,
    taken: bool
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CodeBlockKind
{
    Code,
    SubShader
}

#[derive(Clone, Debug)]
pub struct CodeBlock
{
    pub kind: CodeBlockKind,
    pub index: usize,
    pub code: String
}

pub fn parse_number(expr: &str) -> Option<i64>
{
    let expr = expr.trim();
    if let Some(hex) = expr.strip_prefix("0x").or_else(|| expr.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()
    } else {
        expr.parse().ok()
    }
}

/// Mutable state of one parse session: include stack, define table, conditional stack and
/// captured code blocks.
#[derive(Default)]
pub struct ParseState
{
    frames: Vec<IncludeFrame>,
    includes: Vec<String>,
    include_pushes: usize,
    include_pops: usize,
    defines: Vec<DefineEntry>,
    conditionals: Vec<ConditionalData>,
    code_blocks: Vec<CodeBlock>
}

impl ParseState
{
    pub fn new(source: &str) -> ParseState
    {
        ParseState {
            frames: vec![IncludeFrame::new(None, source.as_bytes().to_vec())],
            ..Default::default()
        }
    }

    /// Pushes a root source buffer; it is never popped by `pop_include`.
    pub fn push_root(&mut self, source: &str)
    {
        self.frames.push(IncludeFrame::new(None, source.as_bytes().to_vec()));
    }

    pub fn frame(&self) -> Option<&IncludeFrame>
    {
        self.frames.last()
    }

    pub fn frame_mut(&mut self) -> Option<&mut IncludeFrame>
    {
        self.frames.last_mut()
    }

    pub fn file_name(&self) -> Option<Rc<str>>
    {
        self.frames.last().and_then(|v| v.name.clone())
    }

    pub fn error(&self, line: usize, col: usize, etype: Type) -> Error
    {
        Error::new(line, col, etype).with_file(self.file_name().map(|v| v.to_string()))
    }

    pub fn push_include<R: IncludeResolver>(&mut self, name: &str, resolver: &R, line: usize, col: usize) -> Result<(), Error>
    {
        if self.include_depth() >= MAX_INCLUDE_DEPTH {
            return Err(self.error(line, col, Type::IncludeDepth(name.into())));
        }
        let mut handle = resolver
            .find_include(name)
            .ok_or_else(|| self.error(line, col, Type::IncludeNotFound(name.into())))?;
        handle.block_until_loaded();
        let text = handle
            .get_text()
            .ok_or_else(|| self.error(line, col, Type::IncludeNotFound(name.into())))?
            .as_bytes()
            .to_vec();
        trace!("Entering include '{}'", name);
        if !self.includes.iter().any(|v| v == name) {
            self.includes.push(name.into());
        }
        self.frames.push(IncludeFrame::new(Some(name.into()), text));
        self.include_pushes += 1;
        Ok(())
    }

    /// Unwinds to the parent buffer. Returns false when only the root buffer remains.
    pub fn pop_include(&mut self) -> bool
    {
        if self.frames.len() <= 1 {
            return false;
        }
        if let Some(frame) = self.frames.pop() {
            trace!("Leaving include '{}'", frame.name.as_deref().unwrap_or_default());
        }
        self.include_pops += 1;
        true
    }

    pub fn include_depth(&self) -> usize
    {
        self.frames.len().saturating_sub(1)
    }

    /// Number of successful include pushes and pops so far.
    pub fn include_balance(&self) -> (usize, usize)
    {
        (self.include_pushes, self.include_pops)
    }

    /// Names of every include entered during this session, in first-seen order.
    pub fn includes(&self) -> &[String]
    {
        &self.includes
    }

    pub fn define(&mut self, name: &str, expr: Option<&str>)
    {
        let expr = expr.map(|v| v.trim()).filter(|v| !v.is_empty()).map(String::from);
        if let Some(entry) = self.defines.iter_mut().find(|v| v.name == name) {
            entry.expr = expr;
        } else {
            self.defines.push(DefineEntry {
                name: name.into(),
                expr
            });
        }
    }

    pub fn undefine(&mut self, name: &str)
    {
        self.defines.retain(|v| v.name != name);
    }

    pub fn has_define(&self, name: &str) -> bool
    {
        self.defines.iter().any(|v| v.name == name)
    }

    fn define_value(&self, name: &str) -> Option<i64>
    {
        self.defines
            .iter()
            .find(|v| v.name == name)
            .and_then(|v| v.expr.as_deref())
            .and_then(parse_number)
    }

    pub fn is_define_enabled(&self, name: &str) -> bool
    {
        self.define_value(name).map(|v| v != 0).unwrap_or(false)
    }

    pub fn defines(&self) -> &[DefineEntry]
    {
        &self.defines
    }

    pub fn is_enabled(&self) -> bool
    {
        self.conditionals
            .last()
            .map(|v| v.enabled && v.parent_enabled)
            .unwrap_or(true)
    }

    pub fn has_conditional(&self) -> bool
    {
        !self.conditionals.is_empty()
    }

    /// Opens a conditional block. With a name the block is evaluated immediately as `#ifdef`.
    pub fn push_conditional(&mut self, name: Option<&str>) -> bool
    {
        let parent_enabled = self.is_enabled();
        self.conditionals.push(ConditionalData {
            name: name.map(String::from),
            op: ConditionalOp::Defined,
            value: 0,
            enabled: false,
            parent_enabled,
            taken: false
        });
        if name.is_some() {
            return self.evaluate_conditional();
        }
        self.is_enabled()
    }

    /// Sets the tested name of the current block and resets its operator to a plain truth test.
    pub fn set_conditional(&mut self, name: &str)
    {
        if let Some(cond) = self.conditionals.last_mut() {
            cond.name = Some(name.into());
            cond.op = ConditionalOp::Enabled;
            cond.value = 0;
        }
    }

    pub fn set_conditional_op(&mut self, op: ConditionalOp)
    {
        if let Some(cond) = self.conditionals.last_mut() {
            cond.op = op;
        }
    }

    pub fn set_conditional_value(&mut self, value: i64)
    {
        if let Some(cond) = self.conditionals.last_mut() {
            cond.value = value;
        }
    }

    /// Evaluates the current block; a branch is only entered when no previous branch of the
    /// same block was taken.
    pub fn evaluate_conditional(&mut self) -> bool
    {
        let result = match self.conditionals.last() {
            Some(cond) => {
                let name = cond.name.as_deref().unwrap_or_default();
                let lhs = parse_number(name).or_else(|| self.define_value(name)).unwrap_or(0);
                match cond.op {
                    ConditionalOp::Defined => self.has_define(name),
                    ConditionalOp::NotDefined => !self.has_define(name),
                    ConditionalOp::Enabled => lhs != 0,
                    ConditionalOp::NotEnabled => lhs == 0,
                    ConditionalOp::Eq => lhs == cond.value,
                    ConditionalOp::Ne => lhs != cond.value,
                    ConditionalOp::Lt => lhs < cond.value,
                    ConditionalOp::Le => lhs <= cond.value,
                    ConditionalOp::Gt => lhs > cond.value,
                    ConditionalOp::Ge => lhs >= cond.value
                }
            },
            None => return true
        };
        if let Some(cond) = self.conditionals.last_mut() {
            cond.enabled = !cond.taken && result;
            cond.taken |= result;
        }
        self.is_enabled()
    }

    /// Flips the current block to its `#else` branch.
    pub fn switch_conditional(&mut self) -> bool
    {
        if let Some(cond) = self.conditionals.last_mut() {
            cond.enabled = !cond.taken;
            cond.taken = true;
        }
        self.is_enabled()
    }

    /// Closes the current block and returns whether the new current block is enabled.
    pub fn pop_conditional(&mut self) -> bool
    {
        self.conditionals.pop();
        self.is_enabled()
    }

    /// Opens a new verbatim block of the given kind, prefixed with the active defines, and
    /// returns its per-kind index.
    pub fn begin_code_block(&mut self, kind: CodeBlockKind) -> usize
    {
        let index = self.code_blocks.iter().filter(|v| v.kind == kind).count();
        let mut code = String::new();
        for define in &self.defines {
            match &define.expr {
                Some(expr) => code.push_str(&format!("#define {} {}\n", define.name, expr)),
                None => code.push_str(&format!("#define {}\n", define.name))
            }
        }
        self.code_blocks.push(CodeBlock { kind, index, code });
        index
    }

    pub fn append_code_block(&mut self, kind: CodeBlockKind, text: &str)
    {
        if let Some(block) = self.code_blocks.iter_mut().rev().find(|v| v.kind == kind) {
            block.code.push_str(text);
        }
    }

    pub fn into_code_blocks(self) -> Vec<CodeBlock>
    {
        self.code_blocks
    }
}

#[cfg(test)]
mod test
{
    use proptest::prelude::*;

    use super::*;
    use crate::include::MemoryIncludes;

    #[test]
    fn defines()
    {
        let mut state = ParseState::new("");
        state.define("FOO", Some("1"));
        state.define("BAR", None);
        state.define("ZERO", Some("0"));
        assert!(state.has_define("BAR"));
        assert!(state.is_define_enabled("FOO"));
        assert!(!state.is_define_enabled("BAR"));
        assert!(!state.is_define_enabled("ZERO"));
        state.define("FOO", Some("0x10"));
        assert_eq!(state.defines().len(), 3);
        assert!(state.is_define_enabled("FOO"));
        state.undefine("FOO");
        assert!(!state.has_define("FOO"));
    }

    #[test]
    fn nested_conditionals()
    {
        let mut state = ParseState::new("");
        state.define("FOO", Some("1"));
        state.push_conditional(None);
        state.set_conditional("FOO");
        assert!(state.evaluate_conditional());
        state.push_conditional(None);
        state.set_conditional("BAR");
        assert!(!state.evaluate_conditional());
        assert!(state.pop_conditional());
        assert!(state.is_enabled());
        assert!(state.pop_conditional());
        assert!(!state.has_conditional());
    }

    #[test]
    fn else_and_elif()
    {
        let mut state = ParseState::new("");
        state.define("MODE", Some("2"));
        state.push_conditional(None);
        state.set_conditional("MODE");
        state.set_conditional_op(ConditionalOp::Eq);
        state.set_conditional_value(1);
        assert!(!state.evaluate_conditional());
        state.set_conditional("MODE");
        state.set_conditional_op(ConditionalOp::Eq);
        state.set_conditional_value(2);
        assert!(state.evaluate_conditional());
        state.set_conditional("MODE");
        state.set_conditional_op(ConditionalOp::Ge);
        state.set_conditional_value(0);
        assert!(!state.evaluate_conditional());
        assert!(!state.switch_conditional());
        state.pop_conditional();
        state.push_conditional(Some("MISSING"));
        assert!(!state.is_enabled());
        assert!(state.switch_conditional());
    }

    #[test]
    fn code_block_prefix()
    {
        let mut state = ParseState::new("");
        state.define("A", Some("3"));
        state.define("B", None);
        assert_eq!(state.begin_code_block(CodeBlockKind::Code), 0);
        state.append_code_block(CodeBlockKind::Code, "void main() {}");
        assert_eq!(state.begin_code_block(CodeBlockKind::SubShader), 0);
        assert_eq!(state.begin_code_block(CodeBlockKind::Code), 1);
        let blocks = state.into_code_blocks();
        assert_eq!(blocks[0].code, "#define A 3\n#define B\nvoid main() {}");
        assert_eq!(blocks[2].index, 1);
    }

    #[test]
    fn include_stack()
    {
        let mut includes = MemoryIncludes::new();
        includes.insert("a.bslinc", "mixin A {}");
        let mut state = ParseState::new("");
        state.push_include("a.bslinc", &includes, 1, 1).unwrap();
        assert_eq!(state.include_depth(), 1);
        assert_eq!(state.file_name().as_deref(), Some("a.bslinc"));
        let err = state.push_include("missing", &includes, 3, 4).unwrap_err();
        assert_eq!(err.etype, Type::IncludeNotFound("missing".into()));
        assert_eq!(err.file.as_deref(), Some("a.bslinc"));
        assert!(state.pop_include());
        assert!(!state.pop_include());
        assert_eq!(state.include_balance(), (1, 1));
    }

    proptest! {
        #[test]
        fn disabled_parent_disables_children(parent in any::<bool>(), child in any::<bool>())
        {
            let mut state = ParseState::new("");
            if parent {
                state.define("P", Some("1"));
            }
            if child {
                state.define("C", Some("1"));
            }
            state.push_conditional(None);
            state.set_conditional("P");
            state.evaluate_conditional();
            state.push_conditional(None);
            state.set_conditional("C");
            prop_assert_eq!(state.evaluate_conditional(), parent && child);
            prop_assert_eq!(state.switch_conditional(), parent && !child);
            prop_assert_eq!(state.pop_conditional(), parent);
        }
    }
}
