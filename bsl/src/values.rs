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

//! Enumerated values accepted on the right hand side of BSL assignments.
//!
//! Values are plain identifiers in the token stream; the parser resolves them here depending on the
//! option being assigned. Lookup is case-insensitive.

use phf::phf_map;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FillMode
{
    Wire,
    Solid
}

/// Shared by raster culling and queue sorting, as both reuse the same spelling.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CullAndQueue
{
    None,
    Cw,
    Ccw,
    FrontToBack,
    BackToFront
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CompareFunc
{
    Never,
    Always,
    Lt,
    Lte,
    Eq,
    Neq,
    Gte,
    Gt
}

/// Operand of a blend factor or a stencil operation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operand
{
    One,
    Zero,
    DstRgb,
    SrcRgb,
    DstIRgb,
    SrcIRgb,
    DstA,
    SrcA,
    DstIA,
    SrcIA,
    Keep,
    Replace,
    Inc,
    Dec,
    IncWrap,
    DecWrap,
    Inverse
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BlendOp
{
    Add,
    Sub,
    RSub,
    Min,
    Max
}

pub const COLOR_MASK_R: u8 = 0x1;
pub const COLOR_MASK_G: u8 = 0x2;
pub const COLOR_MASK_B: u8 = 0x4;
pub const COLOR_MASK_A: u8 = 0x8;

pub static FILL_MODES: phf::Map<&'static str, FillMode> = phf_map! {
    "wire" => FillMode::Wire,
    "solid" => FillMode::Solid
};

pub static CULL_AND_QUEUE: phf::Map<&'static str, CullAndQueue> = phf_map! {
    "none" => CullAndQueue::None,
    "cw" => CullAndQueue::Cw,
    "ccw" => CullAndQueue::Ccw,
    "fronttoback" => CullAndQueue::FrontToBack,
    "backtofront" => CullAndQueue::BackToFront
};

pub static COMPARE_FUNCS: phf::Map<&'static str, CompareFunc> = phf_map! {
    "never" => CompareFunc::Never,
    "always" => CompareFunc::Always,
    "lt" => CompareFunc::Lt,
    "lte" => CompareFunc::Lte,
    "eq" => CompareFunc::Eq,
    "neq" => CompareFunc::Neq,
    "gte" => CompareFunc::Gte,
    "gt" => CompareFunc::Gt
};

pub static OPERANDS: phf::Map<&'static str, Operand> = phf_map! {
    "one" => Operand::One,
    "zero" => Operand::Zero,
    "dstrgb" => Operand::DstRgb,
    "srcrgb" => Operand::SrcRgb,
    "dstirgb" => Operand::DstIRgb,
    "srcirgb" => Operand::SrcIRgb,
    "dsta" => Operand::DstA,
    "srca" => Operand::SrcA,
    "dstia" => Operand::DstIA,
    "srcia" => Operand::SrcIA,
    "dst_color" => Operand::DstRgb,
    "src_color" => Operand::SrcRgb,
    "inv_dst_color" => Operand::DstIRgb,
    "inv_src_color" => Operand::SrcIRgb,
    "dst_alpha" => Operand::DstA,
    "src_alpha" => Operand::SrcA,
    "inv_dst_alpha" => Operand::DstIA,
    "inv_src_alpha" => Operand::SrcIA,
    "keep" => Operand::Keep,
    "replace" => Operand::Replace,
    "inc" => Operand::Inc,
    "dec" => Operand::Dec,
    "incwrap" => Operand::IncWrap,
    "decwrap" => Operand::DecWrap,
    "inverse" => Operand::Inverse
};

pub static BLEND_OPS: phf::Map<&'static str, BlendOp> = phf_map! {
    "add" => BlendOp::Add,
    "sub" => BlendOp::Sub,
    "subtract" => BlendOp::Sub,
    "rsub" => BlendOp::RSub,
    "rev_subtract" => BlendOp::RSub,
    "min" => BlendOp::Min,
    "max" => BlendOp::Max
};

pub fn parse_enum<T: Copy>(value: &str, map: &phf::Map<&'static str, T>) -> Option<T>
{
    map.get(value.to_ascii_lowercase().as_str()).copied()
}

/// Parses a render target write mask such as `RGBA`, `RG` or `empty`.
pub fn parse_color_mask(value: &str) -> Option<u8>
{
    if value.eq_ignore_ascii_case("empty") {
        return Some(0);
    }
    let mut mask = 0;
    for c in value.chars() {
        mask |= match c.to_ascii_lowercase() {
            'r' => COLOR_MASK_R,
            'g' => COLOR_MASK_G,
            'b' => COLOR_MASK_B,
            'a' => COLOR_MASK_A,
            _ => return None
        };
    }
    Some(mask)
}

#[cfg(test)]
mod test
{
    use super::*;

    #[test]
    fn case_insensitive()
    {
        assert_eq!(parse_enum("ONE", &OPERANDS), Some(Operand::One));
        assert_eq!(parse_enum("srcA", &OPERANDS), Some(Operand::SrcA));
        assert_eq!(parse_enum("BackToFront", &CULL_AND_QUEUE), Some(CullAndQueue::BackToFront));
        assert_eq!(parse_enum("plop", &BLEND_OPS), None);
    }

    #[test]
    fn color_masks()
    {
        assert_eq!(parse_color_mask("RGBA"), Some(0xF));
        assert_eq!(parse_color_mask("rg"), Some(COLOR_MASK_R | COLOR_MASK_G));
        assert_eq!(parse_color_mask("Empty"), Some(0));
        assert_eq!(parse_color_mask("RGBX"), None);
    }
}
