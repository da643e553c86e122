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

//! Render state descriptors attached to every pass, and the mapping from parsed BSL values.

use bp3d_bsl::values::{BlendOp, CompareFunc, CullAndQueue, FillMode, Operand};
use serde::{Deserialize, Serialize};

pub const MAX_RENDER_TARGETS: usize = 8;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlendFactor
{
    One,
    Zero,
    DestColor,
    SourceColor,
    InvDestColor,
    InvSourceColor,
    DestAlpha,
    SourceAlpha,
    InvDestAlpha,
    InvSourceAlpha
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlendOperation
{
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StencilOperation
{
    Keep,
    Zero,
    Replace,
    Increment,
    Decrement,
    IncrementWrap,
    DecrementWrap,
    Inverse
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareFunction
{
    AlwaysFail,
    AlwaysPass,
    Less,
    LessEqual,
    Equal,
    NotEqual,
    GreaterEqual,
    Greater
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolygonMode
{
    Wireframe,
    Solid
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CullingMode
{
    None,
    Clockwise,
    CounterClockwise
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueSortType
{
    None,
    FrontToBack,
    BackToFront
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderTargetBlendStateDesc
{
    pub blend_enable: bool,
    pub src_blend: BlendFactor,
    pub dst_blend: BlendFactor,
    pub blend_op: BlendOperation,
    pub src_blend_alpha: BlendFactor,
    pub dst_blend_alpha: BlendFactor,
    pub blend_op_alpha: BlendOperation,
    pub render_target_write_mask: u8
}

impl Default for RenderTargetBlendStateDesc
{
    fn default() -> Self
    {
        RenderTargetBlendStateDesc {
            blend_enable: false,
            src_blend: BlendFactor::One,
            dst_blend: BlendFactor::Zero,
            blend_op: BlendOperation::Add,
            src_blend_alpha: BlendFactor::One,
            dst_blend_alpha: BlendFactor::Zero,
            blend_op_alpha: BlendOperation::Add,
            render_target_write_mask: 0xF
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BlendStateDesc
{
    pub alpha_to_coverage_enable: bool,
    pub independant_blend_enable: bool,
    pub render_targets: [RenderTargetBlendStateDesc; MAX_RENDER_TARGETS]
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RasterizerStateDesc
{
    pub polygon_mode: PolygonMode,
    pub cull_mode: CullingMode,
    pub depth_bias: f32,
    pub slope_scaled_depth_bias: f32,
    pub depth_clip_enable: bool,
    pub scissor_enable: bool,
    pub multisample_enable: bool,
    pub antialiased_line_enable: bool
}

impl Default for RasterizerStateDesc
{
    fn default() -> Self
    {
        RasterizerStateDesc {
            polygon_mode: PolygonMode::Solid,
            cull_mode: CullingMode::CounterClockwise,
            depth_bias: 0.0,
            slope_scaled_depth_bias: 0.0,
            depth_clip_enable: true,
            scissor_enable: false,
            multisample_enable: true,
            antialiased_line_enable: false
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StencilFaceDesc
{
    pub fail_op: StencilOperation,
    pub zfail_op: StencilOperation,
    pub pass_op: StencilOperation,
    pub compare_func: CompareFunction
}

impl Default for StencilFaceDesc
{
    fn default() -> Self
    {
        StencilFaceDesc {
            fail_op: StencilOperation::Keep,
            zfail_op: StencilOperation::Keep,
            pass_op: StencilOperation::Keep,
            compare_func: CompareFunction::AlwaysPass
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthStencilStateDesc
{
    pub depth_read_enable: bool,
    pub depth_write_enable: bool,
    pub depth_comparison_func: CompareFunction,
    pub stencil_enable: bool,
    pub stencil_read_mask: u8,
    pub stencil_write_mask: u8,
    pub front: StencilFaceDesc,
    pub back: StencilFaceDesc
}

impl Default for DepthStencilStateDesc
{
    fn default() -> Self
    {
        DepthStencilStateDesc {
            depth_read_enable: true,
            depth_write_enable: true,
            depth_comparison_func: CompareFunction::Less,
            stencil_enable: false,
            stencil_read_mask: 0xFF,
            stencil_write_mask: 0xFF,
            front: StencilFaceDesc::default(),
            back: StencilFaceDesc::default()
        }
    }
}

pub fn blend_factor(op: Operand) -> BlendFactor
{
    match op {
        Operand::One => BlendFactor::One,
        Operand::Zero => BlendFactor::Zero,
        Operand::DstRgb => BlendFactor::DestColor,
        Operand::SrcRgb => BlendFactor::SourceColor,
        Operand::DstIRgb => BlendFactor::InvDestColor,
        Operand::SrcIRgb => BlendFactor::InvSourceColor,
        Operand::DstA => BlendFactor::DestAlpha,
        Operand::SrcA => BlendFactor::SourceAlpha,
        Operand::DstIA => BlendFactor::InvDestAlpha,
        Operand::SrcIA => BlendFactor::InvSourceAlpha,
        _ => BlendFactor::One
    }
}

pub fn blend_operation(op: BlendOp) -> BlendOperation
{
    match op {
        BlendOp::Add => BlendOperation::Add,
        BlendOp::Sub => BlendOperation::Subtract,
        BlendOp::RSub => BlendOperation::ReverseSubtract,
        BlendOp::Min => BlendOperation::Min,
        BlendOp::Max => BlendOperation::Max
    }
}

pub fn stencil_operation(op: Operand) -> StencilOperation
{
    match op {
        Operand::Keep => StencilOperation::Keep,
        Operand::Zero => StencilOperation::Zero,
        Operand::Replace => StencilOperation::Replace,
        Operand::Inc => StencilOperation::Increment,
        Operand::Dec => StencilOperation::Decrement,
        Operand::IncWrap => StencilOperation::IncrementWrap,
        Operand::DecWrap => StencilOperation::DecrementWrap,
        Operand::Inverse => StencilOperation::Inverse,
        _ => StencilOperation::Keep
    }
}

pub fn compare_function(func: CompareFunc) -> CompareFunction
{
    match func {
        CompareFunc::Never => CompareFunction::AlwaysFail,
        CompareFunc::Always => CompareFunction::AlwaysPass,
        CompareFunc::Lt => CompareFunction::Less,
        CompareFunc::Lte => CompareFunction::LessEqual,
        CompareFunc::Eq => CompareFunction::Equal,
        CompareFunc::Neq => CompareFunction::NotEqual,
        CompareFunc::Gte => CompareFunction::GreaterEqual,
        CompareFunc::Gt => CompareFunction::Greater
    }
}

pub fn polygon_mode(mode: FillMode) -> PolygonMode
{
    match mode {
        FillMode::Wire => PolygonMode::Wireframe,
        FillMode::Solid => PolygonMode::Solid
    }
}

pub fn culling_mode(value: CullAndQueue) -> CullingMode
{
    match value {
        CullAndQueue::None => CullingMode::None,
        CullAndQueue::Cw => CullingMode::Clockwise,
        _ => CullingMode::CounterClockwise
    }
}

pub fn queue_sort_type(value: CullAndQueue) -> QueueSortType
{
    match value {
        CullAndQueue::FrontToBack => QueueSortType::FrontToBack,
        CullAndQueue::BackToFront => QueueSortType::BackToFront,
        _ => QueueSortType::None
    }
}

#[cfg(test)]
mod test
{
    use super::*;

    #[test]
    fn defaults()
    {
        let blend = BlendStateDesc::default();
        assert!(!blend.alpha_to_coverage_enable);
        assert!(blend.render_targets.iter().all(|v| *v == RenderTargetBlendStateDesc::default()));
        assert_eq!(blend.render_targets[7].render_target_write_mask, 0xF);
        let depth = DepthStencilStateDesc::default();
        assert_eq!(depth.depth_comparison_func, CompareFunction::Less);
        assert_eq!(depth.back.compare_func, CompareFunction::AlwaysPass);
        assert_eq!(RasterizerStateDesc::default().cull_mode, CullingMode::CounterClockwise);
    }

    #[test]
    fn operand_fallbacks()
    {
        assert_eq!(blend_factor(Operand::Keep), BlendFactor::One);
        assert_eq!(blend_factor(Operand::SrcIA), BlendFactor::InvSourceAlpha);
        assert_eq!(stencil_operation(Operand::SrcA), StencilOperation::Keep);
        assert_eq!(stencil_operation(Operand::Zero), StencilOperation::Zero);
        assert_eq!(culling_mode(CullAndQueue::FrontToBack), CullingMode::CounterClockwise);
        assert_eq!(queue_sort_type(CullAndQueue::Cw), QueueSortType::None);
    }
}
