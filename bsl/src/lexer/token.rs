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

use phf::phf_map;

pub const CHR_BREAK: u8 = b';';
pub const CHR_EQ: u8 = b'=';
pub const CHR_COMMA: u8 = b',';
pub const CHR_BLOCK_START: u8 = b'{';
pub const CHR_BLOCK_END: u8 = b'}';
pub const CHR_ARRAY_START: u8 = b'[';
pub const CHR_ARRAY_END: u8 = b']';
pub const CHR_PAREN_START: u8 = b'(';
pub const CHR_PAREN_END: u8 = b')';
pub const CHR_STRING: u8 = b'"';
pub const CHR_DIRECTIVE: u8 = b'#';
pub const CHR_NL: u8 = b'\n';

pub const STR_TRUE: &str = "true";
pub const STR_FALSE: &str = "false";

static KEYWORDS: phf::Map<&'static str, Token> = phf_map! {
    "options" => Token::Options,
    "shader" => Token::Shader,
    "subshader" => Token::SubShader,
    "mixin" => Token::Mixin,
    "separable" => Token::Separable,
    "sort" => Token::Sort,
    "priority" => Token::Priority,
    "transparent" => Token::Transparent,
    "forward" => Token::Forward,
    "featureset" => Token::FeatureSet,
    "pass" => Token::Pass,
    "tags" => Token::Tags,
    "variations" => Token::Variations,
    "variation" => Token::Variation,
    "code" => Token::Code,
    "blend" => Token::Blend,
    "raster" => Token::Raster,
    "depth" => Token::Depth,
    "stencil" => Token::Stencil,
    "fill" => Token::Fill,
    "cull" => Token::Cull,
    "depthbias" => Token::DepthBias,
    "sdepthbias" => Token::SDepthBias,
    "depthclip" => Token::DepthClip,
    "scissor" => Token::Scissor,
    "multisample" => Token::Multisample,
    "lineaa" => Token::LineAa,
    "read" => Token::Read,
    "write" => Token::Write,
    "compare" => Token::Compare,
    "reference" => Token::Reference,
    "enabled" => Token::Enabled,
    "readmask" => Token::ReadMask,
    "writemask" => Token::WriteMask,
    "front" => Token::Front,
    "back" => Token::Back,
    "fail" => Token::Fail,
    "zfail" => Token::ZFail,
    "alphatocoverage" => Token::AlphaToCoverage,
    "independantblend" => Token::IndependantBlend,
    "target" => Token::Target,
    "index" => Token::Index,
    "color" => Token::Color,
    "alpha" => Token::Alpha,
    "source" => Token::Source,
    "dest" => Token::Dest,
    "op" => Token::Op,
    "name" => Token::Name,
    "show" => Token::Show
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Type
{
    Options,
    Shader,
    SubShader,
    Mixin,
    Separable,
    Sort,
    Priority,
    Transparent,
    Forward,
    FeatureSet,
    Pass,
    Tags,
    Variations,
    Variation,
    Code,
    Blend,
    Raster,
    Depth,
    Stencil,
    Fill,
    Cull,
    DepthBias,
    SDepthBias,
    DepthClip,
    Scissor,
    Multisample,
    LineAa,
    Read,
    Write,
    Compare,
    Reference,
    Enabled,
    ReadMask,
    WriteMask,
    Front,
    Back,
    Fail,
    ZFail,
    AlphaToCoverage,
    IndependantBlend,
    Target,
    Index,
    Color,
    Alpha,
    Source,
    Dest,
    Op,
    Name,
    Show,
    Eq,
    Comma,
    Break,
    BlockStart,
    BlockEnd,
    ArrayStart,
    ArrayEnd,
    ParenStart,
    ParenEnd,
    Bool,
    Int,
    Float,
    Str,
    Identifier,
    RawBlock,
    Combined(Vec<Type>)
}

impl Type
{
    pub fn name(&self) -> &'static str
    {
        match self {
            Type::Options => "options",
            Type::Shader => "shader",
            Type::SubShader => "subshader",
            Type::Mixin => "mixin",
            Type::Separable => "separable",
            Type::Sort => "sort",
            Type::Priority => "priority",
            Type::Transparent => "transparent",
            Type::Forward => "forward",
            Type::FeatureSet => "featureset",
            Type::Pass => "pass",
            Type::Tags => "tags",
            Type::Variations => "variations",
            Type::Variation => "variation",
            Type::Code => "code",
            Type::Blend => "blend",
            Type::Raster => "raster",
            Type::Depth => "depth",
            Type::Stencil => "stencil",
            Type::Fill => "fill",
            Type::Cull => "cull",
            Type::DepthBias => "depthbias",
            Type::SDepthBias => "sdepthbias",
            Type::DepthClip => "depthclip",
            Type::Scissor => "scissor",
            Type::Multisample => "multisample",
            Type::LineAa => "lineaa",
            Type::Read => "read",
            Type::Write => "write",
            Type::Compare => "compare",
            Type::Reference => "reference",
            Type::Enabled => "enabled",
            Type::ReadMask => "readmask",
            Type::WriteMask => "writemask",
            Type::Front => "front",
            Type::Back => "back",
            Type::Fail => "fail",
            Type::ZFail => "zfail",
            Type::AlphaToCoverage => "alphatocoverage",
            Type::IndependantBlend => "independantblend",
            Type::Target => "target",
            Type::Index => "index",
            Type::Color => "color",
            Type::Alpha => "alpha",
            Type::Source => "source",
            Type::Dest => "dest",
            Type::Op => "op",
            Type::Name => "name",
            Type::Show => "show",
            Type::Eq => "'='",
            Type::Comma => "','",
            Type::Break => "';'",
            Type::BlockStart => "'{'",
            Type::BlockEnd => "'}'",
            Type::ArrayStart => "'['",
            Type::ArrayEnd => "']'",
            Type::ParenStart => "'('",
            Type::ParenEnd => "')'",
            Type::Bool => "bool",
            Type::Int => "int",
            Type::Float => "float",
            Type::Str => "string",
            Type::Identifier => "identifier",
            Type::RawBlock => "code block",
            Type::Combined(_) => "combined"
        }
    }

    pub fn combined<T: AsRef<[Type]>>(t: T) -> Self
    {
        Self::Combined(t.as_ref().into())
    }
}

impl Display for Type
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        if let Type::Combined(v) = self {
            for (i, t) in v.iter().enumerate() {
                f.write_str(t.name())?;
                if i != v.len() - 1 {
                    f.write_str(" or ")?;
                }
            }
            Ok(())
        } else {
            f.write_str(self.name())
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Token
{
    Options,
    Shader,
    SubShader,
    Mixin,
    Separable,
    Sort,
    Priority,
    Transparent,
    Forward,
    FeatureSet,
    Pass,
    Tags,
    Variations,
    Variation,
    Code,
    Blend,
    Raster,
    Depth,
    Stencil,
    Fill,
    Cull,
    DepthBias,
    SDepthBias,
    DepthClip,
    Scissor,
    Multisample,
    LineAa,
    Read,
    Write,
    Compare,
    Reference,
    Enabled,
    ReadMask,
    WriteMask,
    Front,
    Back,
    Fail,
    ZFail,
    AlphaToCoverage,
    IndependantBlend,
    Target,
    Index,
    Color,
    Alpha,
    Source,
    Dest,
    Op,
    Name,
    Show,
    Eq,
    Comma,
    Break,
    BlockStart,
    BlockEnd,
    ArrayStart,
    ArrayEnd,
    ParenStart,
    ParenEnd,
    Bool(bool),
    Int(i32),
    Float(f32),
    Str(String),
    Identifier(String),
    /// Index of a verbatim block captured by the lexer after `code` or `subshader <name>`.
    RawBlock(usize)
}

impl Token
{
    pub fn keyword(word: &str) -> Option<Token>
    {
        KEYWORDS.get(word).cloned()
    }

    pub fn punct(chr: u8) -> Option<Token>
    {
        match chr {
            CHR_BREAK => Some(Token::Break),
            CHR_EQ => Some(Token::Eq),
            CHR_COMMA => Some(Token::Comma),
            CHR_BLOCK_START => Some(Token::BlockStart),
            CHR_BLOCK_END => Some(Token::BlockEnd),
            CHR_ARRAY_START => Some(Token::ArrayStart),
            CHR_ARRAY_END => Some(Token::ArrayEnd),
            CHR_PAREN_START => Some(Token::ParenStart),
            CHR_PAREN_END => Some(Token::ParenEnd),
            _ => None
        }
    }

    pub fn get_type(&self) -> Type
    {
        match self {
            Token::Options => Type::Options,
            Token::Shader => Type::Shader,
            Token::SubShader => Type::SubShader,
            Token::Mixin => Type::Mixin,
            Token::Separable => Type::Separable,
            Token::Sort => Type::Sort,
            Token::Priority => Type::Priority,
            Token::Transparent => Type::Transparent,
            Token::Forward => Type::Forward,
            Token::FeatureSet => Type::FeatureSet,
            Token::Pass => Type::Pass,
            Token::Tags => Type::Tags,
            Token::Variations => Type::Variations,
            Token::Variation => Type::Variation,
            Token::Code => Type::Code,
            Token::Blend => Type::Blend,
            Token::Raster => Type::Raster,
            Token::Depth => Type::Depth,
            Token::Stencil => Type::Stencil,
            Token::Fill => Type::Fill,
            Token::Cull => Type::Cull,
            Token::DepthBias => Type::DepthBias,
            Token::SDepthBias => Type::SDepthBias,
            Token::DepthClip => Type::DepthClip,
            Token::Scissor => Type::Scissor,
            Token::Multisample => Type::Multisample,
            Token::LineAa => Type::LineAa,
            Token::Read => Type::Read,
            Token::Write => Type::Write,
            Token::Compare => Type::Compare,
            Token::Reference => Type::Reference,
            Token::Enabled => Type::Enabled,
            Token::ReadMask => Type::ReadMask,
            Token::WriteMask => Type::WriteMask,
            Token::Front => Type::Front,
            Token::Back => Type::Back,
            Token::Fail => Type::Fail,
            Token::ZFail => Type::ZFail,
            Token::AlphaToCoverage => Type::AlphaToCoverage,
            Token::IndependantBlend => Type::IndependantBlend,
            Token::Target => Type::Target,
            Token::Index => Type::Index,
            Token::Color => Type::Color,
            Token::Alpha => Type::Alpha,
            Token::Source => Type::Source,
            Token::Dest => Type::Dest,
            Token::Op => Type::Op,
            Token::Name => Type::Name,
            Token::Show => Type::Show,
            Token::Eq => Type::Eq,
            Token::Comma => Type::Comma,
            Token::Break => Type::Break,
            Token::BlockStart => Type::BlockStart,
            Token::BlockEnd => Type::BlockEnd,
            Token::ArrayStart => Type::ArrayStart,
            Token::ArrayEnd => Type::ArrayEnd,
            Token::ParenStart => Type::ParenStart,
            Token::ParenEnd => Type::ParenEnd,
            Token::Bool(_) => Type::Bool,
            Token::Int(_) => Type::Int,
            Token::Float(_) => Type::Float,
            Token::Str(_) => Type::Str,
            Token::Identifier(_) => Type::Identifier,
            Token::RawBlock(_) => Type::RawBlock
        }
    }

    pub fn identifier(self) -> Option<String>
    {
        if let Token::Identifier(s) = self {
            Some(s)
        } else {
            None
        }
    }

    pub fn string(self) -> Option<String>
    {
        if let Token::Str(s) = self {
            Some(s)
        } else {
            None
        }
    }

    pub fn bool(self) -> Option<bool>
    {
        if let Token::Bool(b) = self {
            Some(b)
        } else {
            None
        }
    }

    pub fn int(self) -> Option<i32>
    {
        if let Token::Int(i) = self {
            Some(i)
        } else {
            None
        }
    }

    pub fn float(self) -> Option<f32>
    {
        match self {
            Token::Float(f) => Some(f),
            Token::Int(i) => Some(i as f32),
            _ => None
        }
    }

    pub fn raw_block(self) -> Option<usize>
    {
        if let Token::RawBlock(i) = self {
            Some(i)
        } else {
            None
        }
    }
}

impl Display for Token
{
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error>
    {
        match self {
            Token::Bool(b) => write!(formatter, "bool({})", b),
            Token::Int(i) => write!(formatter, "int({})", i),
            Token::Float(f) => write!(formatter, "float({})", f),
            Token::Str(s) => write!(formatter, "string(\"{}\")", s),
            Token::Identifier(s) => write!(formatter, "identifier({})", s),
            Token::RawBlock(i) => write!(formatter, "code block #{}", i),
            _ => formatter.write_str(self.get_type().name())
        }
    }
}

#[cfg(test)]
mod test
{
    use super::*;

    #[test]
    fn keywords()
    {
        assert_eq!(Token::keyword("shader"), Some(Token::Shader));
        assert_eq!(Token::keyword("independantblend"), Some(Token::IndependantBlend));
        assert_eq!(Token::keyword("Shader"), None);
    }

    #[test]
    fn combined_display()
    {
        let t = Type::combined([Type::Int, Type::Bool, Type::BlockEnd]);
        assert_eq!(t.to_string(), "int or bool or '}'");
        assert_eq!(Token::Identifier("FOO".into()).to_string(), "identifier(FOO)");
    }
}
