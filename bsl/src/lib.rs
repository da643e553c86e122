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

//! Front-end of the BSL shader description language: lexer, pre-processor, parser and the
//! arena-backed syntax tree consumed by the shader compiler.

pub mod arena;
pub mod error;
pub mod include;
pub mod lexer;
pub mod parser;
pub mod values;

use std::collections::BTreeMap;

use log::debug;

pub use crate::error::Error;
use crate::{
    arena::{Arena, Node, NodeId},
    include::IncludeResolver,
    lexer::{
        state::{CodeBlock, CodeBlockKind},
        Lexer
    },
    parser::Parser
};

/// Result of one parse session.
#[derive(Debug)]
pub struct Ast
{
    pub arena: Arena,
    pub root: NodeId,
    pub code_blocks: Vec<CodeBlock>,
    /// Every include entered while lexing, de-duplicated.
    pub includes: Vec<String>
}

impl Ast
{
    pub fn root(&self) -> &Node
    {
        self.arena.get(self.root)
    }

    pub fn get(&self, id: NodeId) -> &Node
    {
        self.arena.get(id)
    }

    /// Returns the captured text of a `code` or `subshader` block.
    pub fn code(&self, kind: CodeBlockKind, index: usize) -> Option<&str>
    {
        self.code_blocks
            .iter()
            .find(|v| v.kind == kind && v.index == index)
            .map(|v| &*v.code)
    }
}

/// Parses a BSL source with the given pre-processor defines.
pub fn parse<R: IncludeResolver>(source: &str, defines: &BTreeMap<String, String>, resolver: &R) -> Result<Ast, Error>
{
    let mut lexer = Lexer::new(resolver);
    for (name, value) in defines {
        lexer.define(name, Some(value.as_str()));
    }
    lexer.process(source)?;
    let (tokens, state) = lexer.into_parts();
    debug!("Lexed {} token(s) with {} include(s)", tokens.len(), state.includes().len());
    let includes = state.includes().to_vec();
    let (arena, root) = Parser::new(tokens).parse()?;
    Ok(Ast {
        arena,
        root,
        code_blocks: state.into_code_blocks(),
        includes
    })
}

#[cfg(test)]
mod test
{
    use super::*;
    use crate::{arena::OptionType, include::MemoryIncludes};

    const SOURCE: &str = "
        #include \"common.bslinc\"
        shader Test {
            mixin Common;
            #if DEBUG
            raster { fill = wire; };
            #endif
            code { float4 fsmain() : SV_Target { return COLOR; } };
        };
        subshader Lighting { void light() {} }
    ";

    fn includes() -> MemoryIncludes
    {
        let mut includes = MemoryIncludes::new();
        includes.insert("common.bslinc", "mixin Common { depth { write = false; }; };");
        includes
    }

    #[test]
    fn parse_with_defines()
    {
        let mut defines = BTreeMap::new();
        defines.insert("COLOR".to_string(), "1".to_string());
        let ast = parse(SOURCE, &defines, &includes()).unwrap();
        assert_eq!(ast.includes, vec!["common.bslinc".to_string()]);
        let shader = ast.get(ast.root().find(OptionType::Shader).unwrap().node().unwrap());
        assert!(shader.find(OptionType::Raster).is_none());
        let code = ast.get(shader.find(OptionType::Code).unwrap().node().unwrap());
        let index = code.find(OptionType::Index).unwrap().int().unwrap() as usize;
        let text = ast.code(CodeBlockKind::Code, index).unwrap();
        assert!(text.starts_with("#define COLOR 1\n"));
        assert!(text.contains("return COLOR;"));
        assert!(ast.code(CodeBlockKind::SubShader, 0).unwrap().contains("void light()"));
        assert!(ast.code(CodeBlockKind::SubShader, 1).is_none());
    }

    #[test]
    fn variation_define_enables_block()
    {
        let mut defines = BTreeMap::new();
        defines.insert("DEBUG".to_string(), "1".to_string());
        let ast = parse(SOURCE, &defines, &includes()).unwrap();
        let shader = ast.get(ast.root().find(OptionType::Shader).unwrap().node().unwrap());
        assert!(shader.find(OptionType::Raster).is_some());
    }

    #[test]
    fn deterministic()
    {
        let defines = BTreeMap::new();
        let a = parse(SOURCE, &defines, &includes()).unwrap();
        let b = parse(SOURCE, &defines, &includes()).unwrap();
        assert_eq!(a.arena.len(), b.arena.len());
        for (x, y) in a.arena.nodes().zip(b.arena.nodes()) {
            assert_eq!(x.ntype, y.ntype);
            assert_eq!(x.options(), y.options());
        }
    }

    #[test]
    fn missing_include()
    {
        let err = parse(SOURCE, &BTreeMap::new(), &crate::include::NoIncludes).unwrap_err();
        assert_eq!(err.to_string(), "2:9 include 'common.bslinc' not found");
    }
}
