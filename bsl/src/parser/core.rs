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

use crate::{
    arena::{Arena, NodeId, NodeOption, NodeType, OptionType, Value},
    error::{Error, Type},
    lexer::{
        token::{Token, Type as TokenType},
        TokenEntry
    },
    values::{parse_color_mask, parse_enum, BLEND_OPS, COMPARE_FUNCS, CULL_AND_QUEUE, FILL_MODES, OPERANDS}
};

/// Collects the options of one grammar production until it is committed to the arena.
struct NodeBuilder
{
    ntype: NodeType,
    header: Vec<NodeOption>,
    body: Vec<NodeOption>
}

impl NodeBuilder
{
    fn new(ntype: NodeType) -> NodeBuilder
    {
        NodeBuilder {
            ntype,
            header: Vec::new(),
            body: Vec::new()
        }
    }

    fn header(&mut self, otype: OptionType, value: Value)
    {
        self.header.push(NodeOption::new(otype, value));
    }

    fn push(&mut self, otype: OptionType, value: Value)
    {
        self.body.push(NodeOption::new(otype, value));
    }

    fn finish(self, arena: &mut Arena) -> NodeId
    {
        arena.alloc(self.ntype, self.header, self.body)
    }
}

pub struct Parser
{
    tokens: VecDeque<TokenEntry>,
    cur_line: usize,
    cur_column: usize,
    cur_file: Option<Rc<str>>,
    arena: Arena
}

impl Parser
{
    pub fn new(tokens: VecDeque<TokenEntry>) -> Parser
    {
        Parser {
            tokens,
            cur_line: 0,
            cur_column: 0,
            cur_file: None,
            arena: Arena::new()
        }
    }

    fn error(&self, etype: Type) -> Error
    {
        Error::new(self.cur_line, self.cur_column, etype).with_file(self.cur_file.as_deref())
    }

    fn unexpected(&self, expected: TokenType, actual: Token) -> Error
    {
        self.error(Type::UnexpectedToken { expected, actual })
    }

    fn pop(&mut self) -> Result<Token, Error>
    {
        if let Some(entry) = self.tokens.pop_front() {
            self.cur_column = entry.col;
            self.cur_line = entry.line;
            self.cur_file = entry.file;
            Ok(entry.token)
        } else {
            Err(self.error(Type::Eof))
        }
    }

    fn pop_expect(&mut self, ttype: TokenType) -> Result<Token, Error>
    {
        let token = self.pop()?;
        if token.get_type() != ttype {
            Err(self.unexpected(ttype, token))
        } else {
            Ok(token)
        }
    }

    fn peek(&self) -> Option<&Token>
    {
        self.tokens.front().map(|v| &v.token)
    }

    fn check(&mut self, token: &Token) -> Result<bool, Error>
    {
        if self.peek() == Some(token) {
            self.pop()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn check_block_end(&mut self) -> Result<bool, Error>
    {
        self.check(&Token::BlockEnd)
    }

    fn skip_break(&mut self) -> Result<(), Error>
    {
        while self.check(&Token::Break)? {}
        Ok(())
    }

    fn pop_identifier(&mut self) -> Result<String, Error>
    {
        let token = self.pop_expect(TokenType::Identifier)?;
        Ok(token.identifier().unwrap()) // SAFETY: we have tested for identifier in pop_expect so no panic possible here!
    }

    /// Opens an option block, accepting an optional `=` before the `{`.
    fn block_start(&mut self) -> Result<(), Error>
    {
        self.check(&Token::Eq)?;
        self.pop_expect(TokenType::BlockStart)?;
        Ok(())
    }

    fn parse_bool(&mut self) -> Result<Value, Error>
    {
        self.pop_expect(TokenType::Eq)?;
        let token = self.pop_expect(TokenType::Bool)?;
        Ok(Value::Bool(token.bool().unwrap())) // SAFETY: we have tested for bool in pop_expect so no panic possible here!
    }

    fn parse_int(&mut self) -> Result<Value, Error>
    {
        self.pop_expect(TokenType::Eq)?;
        let token = self.pop_expect(TokenType::Int)?;
        Ok(Value::Int(token.int().unwrap())) // SAFETY: we have tested for int in pop_expect so no panic possible here!
    }

    fn parse_float(&mut self) -> Result<Value, Error>
    {
        self.pop_expect(TokenType::Eq)?;
        let token = self.pop()?;
        match token {
            Token::Float(_) | Token::Int(_) => Ok(Value::Float(token.float().unwrap())), // SAFETY: float() accepts both int and float tokens
            _ => Err(self.unexpected(TokenType::combined([TokenType::Float, TokenType::Int]), token))
        }
    }

    fn lookup<T: Copy>(&self, kind: &'static str, value: String, map: &phf::Map<&'static str, T>) -> Result<T, Error>
    {
        parse_enum(&value, map).ok_or_else(|| self.error(Type::UnknownValue { kind, value }))
    }

    fn parse_enum_value<T: Copy, F: Fn(T) -> Value>(
        &mut self,
        kind: &'static str,
        map: &phf::Map<&'static str, T>,
        f: F
    ) -> Result<Value, Error>
    {
        self.pop_expect(TokenType::Eq)?;
        let ident = self.pop_identifier()?;
        Ok(f(self.lookup(kind, ident, map)?))
    }

    fn parse_operand(&mut self) -> Result<Value, Error>
    {
        self.parse_enum_value("operand", &OPERANDS, Value::Operand)
    }

    fn parse_compare(&mut self) -> Result<Value, Error>
    {
        self.parse_enum_value("compare function", &COMPARE_FUNCS, Value::CompareFunc)
    }

    fn parse_options(&mut self) -> Result<NodeId, Error>
    {
        let mut node = NodeBuilder::new(NodeType::Options);
        self.pop_expect(TokenType::BlockStart)?;
        loop {
            self.skip_break()?;
            if self.check_block_end()? {
                break;
            }
            let token = self.pop()?;
            match token {
                Token::Separable => node.push(OptionType::Separable, self.parse_bool()?),
                Token::Transparent => node.push(OptionType::Transparent, self.parse_bool()?),
                Token::Forward => node.push(OptionType::Forward, self.parse_bool()?),
                Token::Priority => node.push(OptionType::Priority, self.parse_int()?),
                Token::Sort => {
                    let value = self.parse_enum_value("sort mode", &CULL_AND_QUEUE, Value::CullAndQueue)?;
                    node.push(OptionType::Sort, value);
                },
                _ => {
                    return Err(self.unexpected(
                        TokenType::combined([
                            TokenType::Separable,
                            TokenType::Sort,
                            TokenType::Priority,
                            TokenType::Transparent,
                            TokenType::Forward,
                            TokenType::BlockEnd
                        ]),
                        token
                    ))
                },
            }
        }
        Ok(node.finish(&mut self.arena))
    }

    fn parse_raster(&mut self) -> Result<NodeId, Error>
    {
        let mut node = NodeBuilder::new(NodeType::Raster);
        self.block_start()?;
        loop {
            self.skip_break()?;
            if self.check_block_end()? {
                break;
            }
            let token = self.pop()?;
            match token {
                Token::Fill => {
                    let value = self.parse_enum_value("fill mode", &FILL_MODES, Value::FillMode)?;
                    node.push(OptionType::FillMode, value);
                },
                Token::Cull => {
                    let value = self.parse_enum_value("cull mode", &CULL_AND_QUEUE, Value::CullAndQueue)?;
                    node.push(OptionType::CullMode, value);
                },
                Token::DepthBias => node.push(OptionType::DepthBias, self.parse_float()?),
                Token::SDepthBias => node.push(OptionType::SDepthBias, self.parse_float()?),
                Token::DepthClip => node.push(OptionType::DepthClip, self.parse_bool()?),
                Token::Scissor => node.push(OptionType::Scissor, self.parse_bool()?),
                Token::Multisample => node.push(OptionType::Multisample, self.parse_bool()?),
                Token::LineAa => node.push(OptionType::AALine, self.parse_bool()?),
                _ => {
                    return Err(self.unexpected(
                        TokenType::combined([
                            TokenType::Fill,
                            TokenType::Cull,
                            TokenType::DepthBias,
                            TokenType::SDepthBias,
                            TokenType::DepthClip,
                            TokenType::Scissor,
                            TokenType::Multisample,
                            TokenType::LineAa,
                            TokenType::BlockEnd
                        ]),
                        token
                    ))
                },
            }
        }
        Ok(node.finish(&mut self.arena))
    }

    fn parse_depth(&mut self) -> Result<NodeId, Error>
    {
        let mut node = NodeBuilder::new(NodeType::Depth);
        self.block_start()?;
        loop {
            self.skip_break()?;
            if self.check_block_end()? {
                break;
            }
            let token = self.pop()?;
            match token {
                Token::Read => node.push(OptionType::DepthRead, self.parse_bool()?),
                Token::Write => node.push(OptionType::DepthWrite, self.parse_bool()?),
                Token::Compare => node.push(OptionType::CompareFunc, self.parse_compare()?),
                _ => {
                    return Err(self.unexpected(
                        TokenType::combined([TokenType::Read, TokenType::Write, TokenType::Compare, TokenType::BlockEnd]),
                        token
                    ))
                },
            }
        }
        Ok(node.finish(&mut self.arena))
    }

    /// Parses a stencil operation, either as an init list `{ fail, zfail, pass, compare }` or as a
    /// body of assignments.
    fn parse_stencil_op(&mut self) -> Result<NodeId, Error>
    {
        let mut node = NodeBuilder::new(NodeType::StencilOp);
        self.block_start()?;
        if let Some(Token::Identifier(_)) = self.peek() {
            let otypes = [OptionType::Fail, OptionType::ZFail, OptionType::PassOp];
            for (i, otype) in otypes.into_iter().enumerate() {
                if i > 0 {
                    self.pop_expect(TokenType::Comma)?;
                }
                let ident = self.pop_identifier()?;
                node.push(otype, Value::Operand(self.lookup("operand", ident, &OPERANDS)?));
            }
            self.pop_expect(TokenType::Comma)?;
            let ident = self.pop_identifier()?;
            node.push(OptionType::CompareFunc, Value::CompareFunc(self.lookup("compare function", ident, &COMPARE_FUNCS)?));
            self.pop_expect(TokenType::BlockEnd)?;
            return Ok(node.finish(&mut self.arena));
        }
        loop {
            self.skip_break()?;
            if self.check_block_end()? {
                break;
            }
            let token = self.pop()?;
            match token {
                Token::Fail => node.push(OptionType::Fail, self.parse_operand()?),
                Token::ZFail => node.push(OptionType::ZFail, self.parse_operand()?),
                Token::Pass => node.push(OptionType::PassOp, self.parse_operand()?),
                Token::Compare => node.push(OptionType::CompareFunc, self.parse_compare()?),
                _ => {
                    return Err(self.unexpected(
                        TokenType::combined([
                            TokenType::Fail,
                            TokenType::ZFail,
                            TokenType::Pass,
                            TokenType::Compare,
                            TokenType::BlockEnd
                        ]),
                        token
                    ))
                },
            }
        }
        Ok(node.finish(&mut self.arena))
    }

    fn parse_stencil(&mut self) -> Result<NodeId, Error>
    {
        let mut node = NodeBuilder::new(NodeType::Stencil);
        self.block_start()?;
        loop {
            self.skip_break()?;
            if self.check_block_end()? {
                break;
            }
            let token = self.pop()?;
            match token {
                Token::Enabled => node.push(OptionType::StencilEnabled, self.parse_bool()?),
                Token::ReadMask => node.push(OptionType::StencilReadMask, self.parse_int()?),
                Token::WriteMask => node.push(OptionType::StencilWriteMask, self.parse_int()?),
                Token::Reference => node.push(OptionType::StencilRef, self.parse_int()?),
                Token::Front => {
                    let op = self.parse_stencil_op()?;
                    node.push(OptionType::StencilOpFront, Value::Node(op));
                },
                Token::Back => {
                    let op = self.parse_stencil_op()?;
                    node.push(OptionType::StencilOpBack, Value::Node(op));
                },
                _ => {
                    return Err(self.unexpected(
                        TokenType::combined([
                            TokenType::Enabled,
                            TokenType::ReadMask,
                            TokenType::WriteMask,
                            TokenType::Reference,
                            TokenType::Front,
                            TokenType::Back,
                            TokenType::BlockEnd
                        ]),
                        token
                    ))
                },
            }
        }
        Ok(node.finish(&mut self.arena))
    }

    /// Parses a blend equation, either as an init list `{ source, dest, op }` or as a body of
    /// assignments.
    fn parse_blend_def(&mut self) -> Result<NodeId, Error>
    {
        let mut node = NodeBuilder::new(NodeType::BlendDef);
        self.block_start()?;
        if let Some(Token::Identifier(_)) = self.peek() {
            let source = self.pop_identifier()?;
            node.push(OptionType::Source, Value::Operand(self.lookup("operand", source, &OPERANDS)?));
            self.pop_expect(TokenType::Comma)?;
            let dest = self.pop_identifier()?;
            node.push(OptionType::Dest, Value::Operand(self.lookup("operand", dest, &OPERANDS)?));
            self.pop_expect(TokenType::Comma)?;
            let op = self.pop_identifier()?;
            node.push(OptionType::Op, Value::BlendOp(self.lookup("blend operation", op, &BLEND_OPS)?));
            self.pop_expect(TokenType::BlockEnd)?;
            return Ok(node.finish(&mut self.arena));
        }
        loop {
            self.skip_break()?;
            if self.check_block_end()? {
                break;
            }
            let token = self.pop()?;
            match token {
                Token::Source => node.push(OptionType::Source, self.parse_operand()?),
                Token::Dest => node.push(OptionType::Dest, self.parse_operand()?),
                Token::Op => {
                    let value = self.parse_enum_value("blend operation", &BLEND_OPS, Value::BlendOp)?;
                    node.push(OptionType::Op, value);
                },
                _ => {
                    return Err(self.unexpected(
                        TokenType::combined([TokenType::Source, TokenType::Dest, TokenType::Op, TokenType::BlockEnd]),
                        token
                    ))
                },
            }
        }
        Ok(node.finish(&mut self.arena))
    }

    fn parse_write_mask(&mut self) -> Result<Value, Error>
    {
        self.pop_expect(TokenType::Eq)?;
        let token = self.pop()?;
        match token {
            Token::Int(i) => Ok(Value::ColorMask((i & 0xF) as u8)),
            Token::Identifier(value) => parse_color_mask(&value)
                .map(Value::ColorMask)
                .ok_or_else(|| self.error(Type::UnknownValue { kind: "write mask", value })),
            _ => Err(self.unexpected(TokenType::combined([TokenType::Identifier, TokenType::Int]), token))
        }
    }

    fn parse_target(&mut self) -> Result<NodeId, Error>
    {
        let mut node = NodeBuilder::new(NodeType::Target);
        self.block_start()?;
        loop {
            self.skip_break()?;
            if self.check_block_end()? {
                break;
            }
            let token = self.pop()?;
            match token {
                Token::Index => node.push(OptionType::Index, self.parse_int()?),
                Token::Enabled => node.push(OptionType::Enabled, self.parse_bool()?),
                Token::WriteMask => node.push(OptionType::WriteMask, self.parse_write_mask()?),
                Token::Color => {
                    let def = self.parse_blend_def()?;
                    node.push(OptionType::Color, Value::Node(def));
                },
                Token::Alpha => {
                    let def = self.parse_blend_def()?;
                    node.push(OptionType::Alpha, Value::Node(def));
                },
                _ => {
                    return Err(self.unexpected(
                        TokenType::combined([
                            TokenType::Index,
                            TokenType::Enabled,
                            TokenType::WriteMask,
                            TokenType::Color,
                            TokenType::Alpha,
                            TokenType::BlockEnd
                        ]),
                        token
                    ))
                },
            }
        }
        Ok(node.finish(&mut self.arena))
    }

    fn parse_blend(&mut self) -> Result<NodeId, Error>
    {
        let mut node = NodeBuilder::new(NodeType::Blend);
        self.block_start()?;
        loop {
            self.skip_break()?;
            if self.check_block_end()? {
                break;
            }
            let token = self.pop()?;
            match token {
                Token::AlphaToCoverage => node.push(OptionType::AlphaToCoverage, self.parse_bool()?),
                Token::IndependantBlend => node.push(OptionType::IndependantBlend, self.parse_bool()?),
                Token::Target => {
                    let target = self.parse_target()?;
                    node.push(OptionType::Target, Value::Node(target));
                },
                _ => {
                    return Err(self.unexpected(
                        TokenType::combined([
                            TokenType::AlphaToCoverage,
                            TokenType::IndependantBlend,
                            TokenType::Target,
                            TokenType::BlockEnd
                        ]),
                        token
                    ))
                },
            }
        }
        Ok(node.finish(&mut self.arena))
    }

    fn parse_code(&mut self) -> Result<NodeId, Error>
    {
        let token = self.pop_expect(TokenType::RawBlock)?;
        let index = token.raw_block().unwrap(); // SAFETY: we have tested for code block in pop_expect so no panic possible here!
        let mut node = NodeBuilder::new(NodeType::Code);
        node.push(OptionType::Index, Value::Int(index as i32));
        Ok(node.finish(&mut self.arena))
    }

    /// Tries to parse one of the render state or code statements shared by shader and pass
    /// bodies.
    fn try_parse_state(&mut self, token: &Token) -> Result<Option<NodeOption>, Error>
    {
        let (otype, id) = match token {
            Token::Code => (OptionType::Code, self.parse_code()?),
            Token::Raster => (OptionType::Raster, self.parse_raster()?),
            Token::Depth => (OptionType::Depth, self.parse_depth()?),
            Token::Stencil => (OptionType::Stencil, self.parse_stencil()?),
            Token::Blend => (OptionType::Blend, self.parse_blend()?),
            _ => return Ok(None)
        };
        Ok(Some(NodeOption::new(otype, Value::Node(id))))
    }

    fn parse_pass(&mut self) -> Result<NodeId, Error>
    {
        let mut node = NodeBuilder::new(NodeType::Pass);
        self.block_start()?;
        loop {
            self.skip_break()?;
            if self.check_block_end()? {
                break;
            }
            let token = self.pop()?;
            if token == Token::Index {
                node.push(OptionType::Index, self.parse_int()?);
            } else if let Some(opt) = self.try_parse_state(&token)? {
                node.body.push(opt);
            } else {
                return Err(self.unexpected(
                    TokenType::combined([
                        TokenType::Index,
                        TokenType::Code,
                        TokenType::Raster,
                        TokenType::Depth,
                        TokenType::Stencil,
                        TokenType::Blend,
                        TokenType::BlockEnd
                    ]),
                    token
                ));
            }
        }
        Ok(node.finish(&mut self.arena))
    }

    fn parse_tags(&mut self) -> Result<NodeId, Error>
    {
        let mut node = NodeBuilder::new(NodeType::Tags);
        self.block_start()?;
        if !self.check_block_end()? {
            loop {
                let token = self.pop_expect(TokenType::Str)?;
                node.push(OptionType::TagValue, Value::Str(token.string().unwrap())); // SAFETY: we have tested for string in pop_expect so no panic possible here!
                let token = self.pop()?;
                match token {
                    Token::Comma => continue,
                    Token::BlockEnd => break,
                    _ => return Err(self.unexpected(TokenType::combined([TokenType::Comma, TokenType::BlockEnd]), token))
                }
            }
        }
        Ok(node.finish(&mut self.arena))
    }

    fn parse_attributes(&mut self) -> Result<NodeId, Error>
    {
        let mut node = NodeBuilder::new(NodeType::Attributes);
        loop {
            let token = self.pop()?;
            match token {
                Token::Name => {
                    self.pop_expect(TokenType::ParenStart)?;
                    let token = self.pop_expect(TokenType::Str)?;
                    node.push(OptionType::AttrName, Value::Str(token.string().unwrap())); // SAFETY: we have tested for string in pop_expect so no panic possible here!
                    self.pop_expect(TokenType::ParenEnd)?;
                },
                Token::Show => node.push(OptionType::AttrShow, Value::Bool(true)),
                _ => return Err(self.unexpected(TokenType::combined([TokenType::Name, TokenType::Show]), token))
            }
            let token = self.pop()?;
            match token {
                Token::Comma => continue,
                Token::ArrayEnd => break,
                _ => return Err(self.unexpected(TokenType::combined([TokenType::Comma, TokenType::ArrayEnd]), token))
            }
        }
        Ok(node.finish(&mut self.arena))
    }

    fn try_parse_attributes(&mut self) -> Result<Option<NodeOption>, Error>
    {
        if self.check(&Token::ArrayStart)? {
            let id = self.parse_attributes()?;
            return Ok(Some(NodeOption::new(OptionType::Attributes, Value::Node(id))));
        }
        Ok(None)
    }

    fn parse_variation_option(&mut self) -> Result<NodeId, Error>
    {
        let mut node = NodeBuilder::new(NodeType::VariationOption);
        if let Some(attrs) = self.try_parse_attributes()? {
            node.body.push(attrs);
        }
        let token = self.pop()?;
        let value = match token {
            Token::Int(i) => i,
            Token::Bool(b) => b as i32,
            _ => return Err(self.unexpected(TokenType::combined([TokenType::Int, TokenType::Bool]), token))
        };
        node.push(OptionType::VariationValue, Value::Int(value));
        Ok(node.finish(&mut self.arena))
    }

    fn parse_variation(&mut self) -> Result<NodeId, Error>
    {
        let mut node = NodeBuilder::new(NodeType::Variation);
        if let Some(attrs) = self.try_parse_attributes()? {
            node.body.push(attrs);
        }
        self.check(&Token::Variation)?;
        let name = self.pop_identifier()?;
        node.header(OptionType::Identifier, Value::Str(name));
        self.block_start()?;
        if !self.check_block_end()? {
            loop {
                let option = self.parse_variation_option()?;
                node.push(OptionType::VariationOption, Value::Node(option));
                let token = self.pop()?;
                match token {
                    Token::Comma => continue,
                    Token::BlockEnd => break,
                    _ => return Err(self.unexpected(TokenType::combined([TokenType::Comma, TokenType::BlockEnd]), token))
                }
            }
        }
        Ok(node.finish(&mut self.arena))
    }

    fn parse_variations(&mut self) -> Result<NodeId, Error>
    {
        let mut node = NodeBuilder::new(NodeType::Variations);
        self.block_start()?;
        loop {
            self.skip_break()?;
            if self.check_block_end()? {
                break;
            }
            let variation = self.parse_variation()?;
            node.push(OptionType::Variation, Value::Node(variation));
        }
        Ok(node.finish(&mut self.arena))
    }

    fn parse_shader(&mut self, ntype: NodeType) -> Result<NodeId, Error>
    {
        let mut node = NodeBuilder::new(ntype);
        let name = self.pop_identifier()?;
        node.header(OptionType::Identifier, Value::Str(name));
        self.pop_expect(TokenType::BlockStart)?;
        loop {
            self.skip_break()?;
            if self.check_block_end()? {
                break;
            }
            let token = self.pop()?;
            if let Some(opt) = self.try_parse_state(&token)? {
                node.body.push(opt);
                continue;
            }
            match token {
                Token::FeatureSet => {
                    self.pop_expect(TokenType::Eq)?;
                    let ident = self.pop_identifier()?;
                    node.push(OptionType::FeatureSet, Value::Str(ident));
                },
                Token::Mixin => {
                    let ident = self.pop_identifier()?;
                    node.push(OptionType::Include, Value::Str(ident));
                },
                Token::Tags => {
                    let tags = self.parse_tags()?;
                    node.push(OptionType::Tags, Value::Node(tags));
                },
                Token::Variations => {
                    let variations = self.parse_variations()?;
                    node.push(OptionType::Variations, Value::Node(variations));
                },
                Token::Pass => {
                    let pass = self.parse_pass()?;
                    node.push(OptionType::Pass, Value::Node(pass));
                },
                _ => {
                    return Err(self.unexpected(
                        TokenType::combined([
                            TokenType::FeatureSet,
                            TokenType::Mixin,
                            TokenType::Tags,
                            TokenType::Variations,
                            TokenType::Pass,
                            TokenType::Code,
                            TokenType::Raster,
                            TokenType::Depth,
                            TokenType::Stencil,
                            TokenType::Blend,
                            TokenType::BlockEnd
                        ]),
                        token
                    ))
                },
            }
        }
        Ok(node.finish(&mut self.arena))
    }

    fn parse_sub_shader(&mut self) -> Result<NodeId, Error>
    {
        let mut node = NodeBuilder::new(NodeType::SubShader);
        let name = self.pop_identifier()?;
        node.header(OptionType::Identifier, Value::Str(name));
        let token = self.pop_expect(TokenType::RawBlock)?;
        let index = token.raw_block().unwrap(); // SAFETY: we have tested for code block in pop_expect so no panic possible here!
        node.push(OptionType::Index, Value::Int(index as i32));
        Ok(node.finish(&mut self.arena))
    }

    /// Parses the whole token stream and returns the arena together with the root node.
    pub fn parse(mut self) -> Result<(Arena, NodeId), Error>
    {
        let mut root = NodeBuilder::new(NodeType::Root);
        while let Some(entry) = self.tokens.pop_front() {
            self.cur_line = entry.line;
            self.cur_column = entry.col;
            self.cur_file = entry.file;
            let (otype, id) = match entry.token {
                Token::Break => continue,
                Token::Options => (OptionType::Options, self.parse_options()?),
                Token::Shader => (OptionType::Shader, self.parse_shader(NodeType::Shader)?),
                Token::Mixin => (OptionType::Mixin, self.parse_shader(NodeType::Mixin)?),
                Token::SubShader => (OptionType::SubShader, self.parse_sub_shader()?),
                token => return Err(self.error(Type::UnknownToken(token)))
            };
            root.push(otype, Value::Node(id));
        }
        let id = root.finish(&mut self.arena);
        Ok((self.arena, id))
    }
}

#[cfg(test)]
mod test
{
    use super::*;
    use crate::{
        include::NoIncludes,
        lexer::Lexer,
        values::{BlendOp, CompareFunc, CullAndQueue, Operand}
    };

    fn parse(source: &str) -> Result<(Arena, NodeId), Error>
    {
        let mut lexer = Lexer::new(&NoIncludes);
        lexer.process(source)?;
        Parser::new(lexer.into_tokens()).parse()
    }

    #[test]
    fn basic_parser()
    {
        let (arena, root) = parse("
            options { sort = backtofront; priority = 10; transparent = true; };
            mixin Common { depth { compare = lte; }; };
            shader Test
            {
                mixin Common;
                featureset = HighEnd;
                tags = { \"forward\", \"opaque\" };
                pass { code { void vsmain() {} } };
            };
        ")
        .unwrap();
        let roots: Vec<(OptionType, NodeType)> = arena
            .get(root)
            .options_in_declaration_order()
            .map(|v| (v.otype, arena.get(v.value.node().unwrap()).ntype))
            .collect();
        assert_eq!(
            roots,
            vec![
                (OptionType::Options, NodeType::Options),
                (OptionType::Mixin, NodeType::Mixin),
                (OptionType::Shader, NodeType::Shader)
            ]
        );
        let options = arena.get(arena.get(root).options()[2].value.node().unwrap());
        assert_eq!(options.find(OptionType::Sort), Some(&Value::CullAndQueue(CullAndQueue::BackToFront)));
        assert_eq!(options.find(OptionType::Priority), Some(&Value::Int(10)));
        let shader = arena.get(arena.get(root).options()[0].value.node().unwrap());
        assert_eq!(shader.identifier(), Some("Test"));
        assert_eq!(shader.find(OptionType::Include), Some(&Value::Str("Common".into())));
        assert_eq!(shader.find(OptionType::FeatureSet), Some(&Value::Str("HighEnd".into())));
        let tags = arena.get(shader.find(OptionType::Tags).unwrap().node().unwrap());
        let tags: Vec<&str> = tags.options_in_declaration_order().filter_map(|v| v.value.str()).collect();
        assert_eq!(tags, vec!["forward", "opaque"]);
    }

    #[test]
    fn blend_target()
    {
        let (arena, root) = parse("
            shader Test {
                pass {
                    blend { target { index=0 enabled=true color{source=ONE dest=ZERO op=ADD} alpha = { srcA, srcIA, rev_subtract } writemask = RG } }
                }
            }
        ")
        .unwrap();
        let shader = arena.get(arena.get(root).find(OptionType::Shader).unwrap().node().unwrap());
        let pass = arena.get(shader.find(OptionType::Pass).unwrap().node().unwrap());
        let blend = arena.get(pass.find(OptionType::Blend).unwrap().node().unwrap());
        let target = arena.get(blend.find(OptionType::Target).unwrap().node().unwrap());
        assert_eq!(target.find(OptionType::Index), Some(&Value::Int(0)));
        assert_eq!(target.find(OptionType::Enabled), Some(&Value::Bool(true)));
        assert_eq!(target.find(OptionType::WriteMask), Some(&Value::ColorMask(0x3)));
        let color = arena.get(target.find(OptionType::Color).unwrap().node().unwrap());
        assert_eq!(color.find(OptionType::Source), Some(&Value::Operand(Operand::One)));
        assert_eq!(color.find(OptionType::Dest), Some(&Value::Operand(Operand::Zero)));
        assert_eq!(color.find(OptionType::Op), Some(&Value::BlendOp(BlendOp::Add)));
        let alpha = arena.get(target.find(OptionType::Alpha).unwrap().node().unwrap());
        assert_eq!(alpha.find(OptionType::Source), Some(&Value::Operand(Operand::SrcA)));
        assert_eq!(alpha.find(OptionType::Op), Some(&Value::BlendOp(BlendOp::RSub)));
    }

    #[test]
    fn stencil_ops()
    {
        let (arena, root) = parse("
            shader Test {
                stencil {
                    enabled = true; reference = 1;
                    front = { keep, keep, replace, always };
                    back { fail = inc; pass = decwrap; compare = neq; };
                };
            };
        ")
        .unwrap();
        let shader = arena.get(arena.get(root).find(OptionType::Shader).unwrap().node().unwrap());
        let stencil = arena.get(shader.find(OptionType::Stencil).unwrap().node().unwrap());
        assert_eq!(stencil.find(OptionType::StencilRef), Some(&Value::Int(1)));
        let front = arena.get(stencil.find(OptionType::StencilOpFront).unwrap().node().unwrap());
        assert_eq!(front.find(OptionType::PassOp), Some(&Value::Operand(Operand::Replace)));
        assert_eq!(front.find(OptionType::CompareFunc), Some(&Value::CompareFunc(CompareFunc::Always)));
        let back = arena.get(stencil.find(OptionType::StencilOpBack).unwrap().node().unwrap());
        assert_eq!(back.find(OptionType::Fail), Some(&Value::Operand(Operand::Inc)));
        assert_eq!(back.find(OptionType::ZFail), None);
        assert_eq!(back.find(OptionType::CompareFunc), Some(&Value::CompareFunc(CompareFunc::Neq)));
    }

    #[test]
    fn variations()
    {
        let (arena, root) = parse("
            shader Test {
                variations {
                    [name(\"Foo\"), show]
                    variation FOO { };
                    MODE = { [name(\"A\")] 0, 1, 2 };
                };
            };
        ")
        .unwrap();
        let shader = arena.get(arena.get(root).find(OptionType::Shader).unwrap().node().unwrap());
        let variations = arena.get(shader.find(OptionType::Variations).unwrap().node().unwrap());
        let list: Vec<&crate::arena::Node> = variations
            .options_in_declaration_order()
            .map(|v| arena.get(v.value.node().unwrap()))
            .collect();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].identifier(), Some("FOO"));
        assert!(list[0].find(OptionType::VariationOption).is_none());
        let attrs = arena.get(list[0].find(OptionType::Attributes).unwrap().node().unwrap());
        assert_eq!(attrs.find(OptionType::AttrName), Some(&Value::Str("Foo".into())));
        assert_eq!(attrs.find(OptionType::AttrShow), Some(&Value::Bool(true)));
        assert_eq!(list[1].identifier(), Some("MODE"));
        let values: Vec<i32> = list[1]
            .options_in_declaration_order()
            .filter_map(|v| v.value.node())
            .map(|v| arena.get(v).find(OptionType::VariationValue).unwrap().int().unwrap())
            .collect();
        assert_eq!(values, vec![0, 1, 2]);
    }

    #[test]
    fn parser_errors()
    {
        let err = parse("shader Test { depth { compare = sometimes; }; };").unwrap_err();
        assert_eq!(
            err.etype,
            Type::UnknownValue {
                kind: "compare function",
                value: "sometimes".into()
            }
        );
        assert_eq!((err.line, err.col), (1, 33));
        let err = parse("shader Test { raster { fill = 1; } }").unwrap_err();
        assert_eq!(
            err.etype,
            Type::UnexpectedToken {
                expected: TokenType::Identifier,
                actual: Token::Int(1)
            }
        );
        assert_eq!(parse("shader Test {").unwrap_err().etype, Type::Eof);
        let err = parse("pass {}").unwrap_err();
        assert_eq!(err.etype, Type::UnknownToken(Token::Pass));
        assert_eq!(err.to_string(), "1:1 unknown token (pass)");
    }
}
