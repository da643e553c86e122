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

//! Second compilation pass: render states and code of every pass of one shader.

use bp3d_bsl::{
    arena::{Node, NodeId, NodeType, OptionType, Value},
    lexer::state::CodeBlockKind,
    Ast
};

use crate::states::{
    blend_factor,
    blend_operation,
    compare_function,
    culling_mode,
    polygon_mode,
    stencil_operation,
    BlendStateDesc,
    DepthStencilStateDesc,
    RasterizerStateDesc,
    RenderTargetBlendStateDesc,
    StencilFaceDesc,
    MAX_RENDER_TARGETS
};

#[derive(Clone, Debug, PartialEq)]
pub struct PassData
{
    pub seq_idx: u32,
    pub blend: BlendStateDesc,
    pub rasterizer: RasterizerStateDesc,
    pub depth_stencil: DepthStencilStateDesc,
    pub blend_is_default: bool,
    pub rasterizer_is_default: bool,
    pub depth_stencil_is_default: bool,
    pub stencil_ref: u32,
    pub code: String
}

impl PassData
{
    pub fn new(seq_idx: u32) -> PassData
    {
        PassData {
            seq_idx,
            blend: BlendStateDesc::default(),
            rasterizer: RasterizerStateDesc::default(),
            depth_stencil: DepthStencilStateDesc::default(),
            blend_is_default: true,
            rasterizer_is_default: true,
            depth_stencil_is_default: true,
            stencil_ref: 0,
            code: String::new()
        }
    }
}

/// Accumulated state of a shader and all the mixins it inherits.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShaderData
{
    pub feature_set: Option<String>,
    pub passes: Vec<PassData>,
    /// Every `pass` node merged so far with the index of the pass it applies to, in merge order.
    explicit: Vec<(u32, NodeId)>
}

impl ShaderData
{
    /// Returns the pass with the given sequential index, creating it if needed; the flag is true
    /// when the pass was just created.
    fn pass_mut(&mut self, seq_idx: u32) -> (&mut PassData, bool)
    {
        match self.passes.iter().position(|v| v.seq_idx == seq_idx) {
            Some(i) => (&mut self.passes[i], false),
            None => {
                self.passes.push(PassData::new(seq_idx));
                let last = self.passes.len() - 1;
                (&mut self.passes[last], true)
            }
        }
    }
}

fn child<'a>(ast: &'a Ast, value: &Value, ntype: NodeType) -> Option<&'a Node>
{
    value.node().map(|id| ast.get(id)).filter(|v| v.ntype == ntype)
}

fn parse_blend_def(node: &Node, color: bool, desc: &mut RenderTargetBlendStateDesc)
{
    for option in node.options_in_declaration_order() {
        match (option.otype, &option.value) {
            (OptionType::Source, Value::Operand(v)) if color => desc.src_blend = blend_factor(*v),
            (OptionType::Source, Value::Operand(v)) => desc.src_blend_alpha = blend_factor(*v),
            (OptionType::Dest, Value::Operand(v)) if color => desc.dst_blend = blend_factor(*v),
            (OptionType::Dest, Value::Operand(v)) => desc.dst_blend_alpha = blend_factor(*v),
            (OptionType::Op, Value::BlendOp(v)) if color => desc.blend_op = blend_operation(*v),
            (OptionType::Op, Value::BlendOp(v)) => desc.blend_op_alpha = blend_operation(*v),
            _ => ()
        }
    }
}

fn parse_render_target(ast: &Ast, node: &Node, desc: &mut BlendStateDesc, index: &mut usize)
{
    if let Some(i) = node.find(OptionType::Index).and_then(|v| v.int()) {
        *index = i.max(0) as usize;
    }
    if *index >= MAX_RENDER_TARGETS {
        return;
    }
    let target = &mut desc.render_targets[*index];
    for option in node.options_in_declaration_order() {
        match option.otype {
            OptionType::Enabled => target.blend_enable = option.value.bool().unwrap_or(false),
            OptionType::WriteMask => target.render_target_write_mask = option.value.int().unwrap_or(0xF) as u8,
            OptionType::Color | OptionType::Alpha => {
                if let Some(def) = child(ast, &option.value, NodeType::BlendDef) {
                    parse_blend_def(def, option.otype == OptionType::Color, target);
                }
            },
            _ => ()
        }
    }
    *index += 1;
}

/// Applies a `blend` block; returns true if the block changed anything.
pub fn parse_blend(ast: &Ast, node: &Node, pass: &mut PassData) -> bool
{
    let mut is_default = true;
    let mut index = 0;
    for option in node.options_in_declaration_order() {
        match option.otype {
            OptionType::AlphaToCoverage => {
                pass.blend.alpha_to_coverage_enable = option.value.bool().unwrap_or(false);
                is_default = false;
            },
            OptionType::IndependantBlend => {
                pass.blend.independant_blend_enable = option.value.bool().unwrap_or(false);
                is_default = false;
            },
            OptionType::Target => {
                if let Some(target) = child(ast, &option.value, NodeType::Target) {
                    parse_render_target(ast, target, &mut pass.blend, &mut index);
                }
                is_default = false;
            },
            _ => ()
        }
    }
    !is_default
}

pub fn parse_rasterizer(node: &Node, pass: &mut PassData) -> bool
{
    let desc = &mut pass.rasterizer;
    let mut is_default = true;
    for option in node.options_in_declaration_order() {
        let value = &option.value;
        match (option.otype, value) {
            (OptionType::FillMode, Value::FillMode(v)) => desc.polygon_mode = polygon_mode(*v),
            (OptionType::CullMode, Value::CullAndQueue(v)) => desc.cull_mode = culling_mode(*v),
            (OptionType::DepthBias, v) => desc.depth_bias = v.float().unwrap_or(0.0),
            (OptionType::SDepthBias, v) => desc.slope_scaled_depth_bias = v.float().unwrap_or(0.0),
            (OptionType::DepthClip, v) => desc.depth_clip_enable = v.bool().unwrap_or(false),
            (OptionType::Scissor, v) => desc.scissor_enable = v.bool().unwrap_or(false),
            (OptionType::Multisample, v) => desc.multisample_enable = v.bool().unwrap_or(false),
            (OptionType::AALine, v) => desc.antialiased_line_enable = v.bool().unwrap_or(false),
            _ => continue
        }
        is_default = false;
    }
    !is_default
}

pub fn parse_depth(node: &Node, pass: &mut PassData) -> bool
{
    let desc = &mut pass.depth_stencil;
    let mut is_default = true;
    for option in node.options_in_declaration_order() {
        match (option.otype, &option.value) {
            (OptionType::DepthRead, v) => desc.depth_read_enable = v.bool().unwrap_or(false),
            (OptionType::DepthWrite, v) => desc.depth_write_enable = v.bool().unwrap_or(false),
            (OptionType::CompareFunc, Value::CompareFunc(v)) => desc.depth_comparison_func = compare_function(*v),
            _ => continue
        }
        is_default = false;
    }
    !is_default
}

fn parse_stencil_op(node: &Node, desc: &mut StencilFaceDesc)
{
    for option in node.options_in_declaration_order() {
        match (option.otype, &option.value) {
            (OptionType::Fail, Value::Operand(v)) => desc.fail_op = stencil_operation(*v),
            (OptionType::ZFail, Value::Operand(v)) => desc.zfail_op = stencil_operation(*v),
            (OptionType::PassOp, Value::Operand(v)) => desc.pass_op = stencil_operation(*v),
            (OptionType::CompareFunc, Value::CompareFunc(v)) => desc.compare_func = compare_function(*v),
            _ => ()
        }
    }
}

/// Applies a `stencil` block. The reference value alone does not make the state non-default.
pub fn parse_stencil(ast: &Ast, node: &Node, pass: &mut PassData) -> bool
{
    let mut is_default = true;
    for option in node.options_in_declaration_order() {
        let desc = &mut pass.depth_stencil;
        match option.otype {
            OptionType::StencilEnabled => desc.stencil_enable = option.value.bool().unwrap_or(false),
            OptionType::StencilReadMask => desc.stencil_read_mask = option.value.int().unwrap_or(0xFF) as u8,
            OptionType::StencilWriteMask => desc.stencil_write_mask = option.value.int().unwrap_or(0xFF) as u8,
            OptionType::StencilOpFront => {
                if let Some(op) = child(ast, &option.value, NodeType::StencilOp) {
                    parse_stencil_op(op, &mut desc.front);
                }
            },
            OptionType::StencilOpBack => {
                if let Some(op) = child(ast, &option.value, NodeType::StencilOp) {
                    parse_stencil_op(op, &mut desc.back);
                }
            },
            OptionType::StencilRef => {
                pass.stencil_ref = option.value.int().unwrap_or(0) as u32;
                continue;
            },
            _ => continue
        }
        is_default = false;
    }
    !is_default
}

fn parse_code(ast: &Ast, node: &Node, code: &mut String)
{
    let index = node.find(OptionType::Index).and_then(|v| v.int());
    if let Some(text) = index.and_then(|v| ast.code(CodeBlockKind::Code, v as usize)) {
        code.push_str(text);
    }
}

/// Applies one of the render state blocks; returns false for anything else.
fn apply_state(ast: &Ast, otype: OptionType, value: &Value, pass: &mut PassData) -> bool
{
    match otype {
        OptionType::Blend => {
            if let Some(node) = child(ast, value, NodeType::Blend) {
                pass.blend_is_default &= !parse_blend(ast, node, pass);
            }
        },
        OptionType::Raster => {
            if let Some(node) = child(ast, value, NodeType::Raster) {
                pass.rasterizer_is_default &= !parse_rasterizer(node, pass);
            }
        },
        OptionType::Depth => {
            if let Some(node) = child(ast, value, NodeType::Depth) {
                pass.depth_stencil_is_default &= !parse_depth(node, pass);
            }
        },
        OptionType::Stencil => {
            if let Some(node) = child(ast, value, NodeType::Stencil) {
                pass.depth_stencil_is_default &= !parse_stencil(ast, node, pass);
            }
        },
        _ => return false
    }
    true
}

fn apply_pass_states(ast: &Ast, node: &Node, pass: &mut PassData)
{
    for option in node.options_in_declaration_order() {
        apply_state(ast, option.otype, &option.value, pass);
    }
}

pub fn parse_pass(ast: &Ast, node: &Node, pass: &mut PassData)
{
    for option in node.options_in_declaration_order() {
        if !apply_state(ast, option.otype, &option.value, pass) && option.otype == OptionType::Code {
            if let Some(code) = child(ast, &option.value, NodeType::Code) {
                parse_code(ast, code, &mut pass.code);
            }
        }
    }
}

/// Merges a shader or mixin body into `data`. Shader level code is added to every existing pass
/// and prepended to every pass created after it. Shader level states apply to all
/// passes, then every pass node merged so far, including those of earlier mixins, re-applies its
/// own states so that they take precedence.
pub fn parse_shader(ast: &Ast, node: &Node, data: &mut ShaderData)
{
    if data.passes.is_empty() {
        data.passes.push(PassData::new(0));
    }
    let mut common_code = String::new();
    let mut next_pass_idx = 0;
    for option in node.options_in_declaration_order() {
        match option.otype {
            OptionType::Pass => {
                let id = match option.value.node() {
                    Some(v) => v,
                    None => continue
                };
                let pass_node = ast.get(id);
                let pass_idx = pass_node
                    .find(OptionType::Index)
                    .and_then(|v| v.int())
                    .map(|v| v.max(0) as u32)
                    .unwrap_or(next_pass_idx);
                next_pass_idx = next_pass_idx.max(pass_idx) + 1;
                let (pass, created) = data.pass_mut(pass_idx);
                // Existing passes already received the common code seen so far.
                if created {
                    pass.code.insert_str(0, &common_code);
                }
                parse_pass(ast, pass_node, pass);
                data.explicit.push((pass_idx, id));
            },
            OptionType::Code => {
                if let Some(code) = child(ast, &option.value, NodeType::Code) {
                    let mut text = String::new();
                    parse_code(ast, code, &mut text);
                    for pass in &mut data.passes {
                        pass.code.push_str(&text);
                    }
                    common_code.push_str(&text);
                }
            },
            OptionType::FeatureSet => data.feature_set = option.value.str().map(String::from),
            _ => ()
        }
    }
    for option in node.options_in_declaration_order() {
        for pass in &mut data.passes {
            apply_state(ast, option.otype, &option.value, pass);
        }
    }
    for i in 0..data.explicit.len() {
        let (seq_idx, id) = data.explicit[i];
        apply_pass_states(ast, ast.get(id), data.pass_mut(seq_idx).0);
    }
}

#[cfg(test)]
mod test
{
    use std::collections::BTreeMap;

    use bp3d_bsl::include::NoIncludes;

    use super::*;
    use crate::states::{BlendFactor, BlendOperation, CompareFunction, CullingMode, PolygonMode, StencilOperation};

    fn compile(source: &str) -> ShaderData
    {
        let ast = bp3d_bsl::parse(source, &BTreeMap::new(), &NoIncludes).unwrap();
        let id = ast.root().find(OptionType::Shader).unwrap().node().unwrap();
        let mut data = ShaderData::default();
        parse_shader(&ast, ast.get(id), &mut data);
        data
    }

    #[test]
    fn single_pass_blend()
    {
        let data = compile("
            shader Test {
                pass {
                    blend { target { index = 0; enabled = true; color = { source = one; dest = zero; op = add; }; }; };
                };
            };
        ");
        assert_eq!(data.passes.len(), 1);
        let pass = &data.passes[0];
        assert!(!pass.blend_is_default);
        assert!(pass.rasterizer_is_default);
        let target = &pass.blend.render_targets[0];
        assert!(target.blend_enable);
        assert_eq!(target.src_blend, BlendFactor::One);
        assert_eq!(target.dst_blend, BlendFactor::Zero);
        assert_eq!(target.blend_op, BlendOperation::Add);
        assert!(!pass.blend.render_targets[1].blend_enable);
    }

    #[test]
    fn running_target_index()
    {
        let data = compile("
            shader Test {
                blend {
                    target { enabled = true; };
                    target { index = 9; enabled = true; };
                    target { writemask = RG; };
                    target { index = 3; alpha = { srcA, srcIA, rsub }; };
                };
            };
        ");
        let blend = &data.passes[0].blend;
        assert!(blend.render_targets[0].blend_enable);
        assert!(!blend.render_targets[1].blend_enable);
        // The running index stays past the last target after an out of range one.
        assert!(blend.render_targets.iter().all(|v| v.render_target_write_mask == 0xF));
        assert_eq!(blend.render_targets[3].src_blend_alpha, BlendFactor::SourceAlpha);
        assert_eq!(blend.render_targets[3].blend_op_alpha, BlendOperation::ReverseSubtract);
    }

    #[test]
    fn common_code_and_states()
    {
        let data = compile("
            shader Test {
                code { A };
                raster { cull = cw; fill = wire; };
                pass { code { B }; };
                pass { raster { cull = none; }; code { C }; };
                code { D };
            };
        ");
        assert_eq!(data.passes.len(), 2);
        assert_eq!(data.passes[0].code.matches('A').count(), 1);
        assert_eq!(data.passes[1].code.matches('A').count(), 1);
        assert!(data.passes[0].code.contains('B'));
        assert!(data.passes[0].code.contains('D'));
        assert!(!data.passes[0].code.contains('C'));
        let c = &data.passes[1].code;
        assert!(c.find('A').unwrap() < c.find('C').unwrap());
        assert!(c.find('C').unwrap() < c.find('D').unwrap());
        assert_eq!(data.passes[0].rasterizer.cull_mode, CullingMode::Clockwise);
        assert_eq!(data.passes[1].rasterizer.cull_mode, CullingMode::None);
        assert_eq!(data.passes[1].rasterizer.polygon_mode, PolygonMode::Wireframe);
        assert!(!data.passes[1].rasterizer_is_default);
    }

    #[test]
    fn stencil_reference_keeps_default()
    {
        let data = compile("shader Test { stencil { reference = 4; }; };");
        assert!(data.passes[0].depth_stencil_is_default);
        assert_eq!(data.passes[0].stencil_ref, 4);
        let data = compile("
            shader Test {
                depth { compare = gte; };
                stencil { enabled = true; front = { keep, zero, replace, always }; back = { fail = inc; }; };
            };
        ");
        let desc = &data.passes[0].depth_stencil;
        assert!(!data.passes[0].depth_stencil_is_default);
        assert_eq!(desc.depth_comparison_func, CompareFunction::GreaterEqual);
        assert!(desc.stencil_enable);
        assert_eq!(desc.front.zfail_op, StencilOperation::Zero);
        assert_eq!(desc.front.pass_op, StencilOperation::Replace);
        assert_eq!(desc.back.fail_op, StencilOperation::Increment);
        assert_eq!(desc.back.compare_func, CompareFunction::AlwaysPass);
    }

    #[test]
    fn mixin_pass_state_beats_shader_state()
    {
        let ast = bp3d_bsl::parse("
            mixin M { pass { raster { cull = none; }; code { A }; }; };
            shader T { mixin M; raster { cull = cw; fill = wire; }; };
        ", &BTreeMap::new(), &NoIncludes).unwrap();
        let mut data = ShaderData::default();
        for option in ast.root().options_in_declaration_order() {
            if let Some(id) = option.value.node() {
                parse_shader(&ast, ast.get(id), &mut data);
            }
        }
        assert_eq!(data.passes.len(), 1);
        let pass = &data.passes[0];
        assert!(pass.code.contains('A'));
        assert_eq!(pass.rasterizer.cull_mode, CullingMode::None);
        assert_eq!(pass.rasterizer.polygon_mode, PolygonMode::Wireframe);
    }

    #[test]
    fn explicit_pass_index()
    {
        let data = compile("shader Test { pass { index = 2; code { X }; }; pass { code { Y }; }; };");
        let seqs: Vec<u32> = data.passes.iter().map(|v| v.seq_idx).collect();
        assert_eq!(seqs, vec![0, 2, 3]);
        assert!(data.passes[2].code.contains('Y'));
    }
}
