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

//! Compiled shader asset.

use serde::{Deserialize, Serialize};

use crate::params::ShaderParams;
use crate::states::{BlendStateDesc, DepthStencilStateDesc, QueueSortType, RasterizerStateDesc};
use crate::targets::{Language, Stage};
use crate::variation::ShaderVariation;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShaderOptions
{
    pub separable_passes: bool,
    pub sort: QueueSortType,
    pub priority: i32,
    pub transparent: bool,
    pub forward: bool
}

impl Default for ShaderOptions
{
    fn default() -> Self
    {
        ShaderOptions {
            separable_passes: false,
            sort: QueueSortType::None,
            priority: 0,
            transparent: false,
            forward: false
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuProgramDesc
{
    pub stage: Stage,
    pub language: Language,
    pub entry_point: String,
    pub source: String
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pass
{
    pub blend: BlendStateDesc,
    pub rasterizer: RasterizerStateDesc,
    pub depth_stencil: DepthStencilStateDesc,
    pub blend_is_default: bool,
    pub rasterizer_is_default: bool,
    pub depth_stencil_is_default: bool,
    pub stencil_ref: u32,
    pub programs: Vec<GpuProgramDesc>
}

impl Pass
{
    pub fn program(&self, stage: Stage) -> Option<&GpuProgramDesc>
    {
        self.programs.iter().find(|v| v.stage == stage)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Technique
{
    pub language: Language,
    pub tags: Vec<String>,
    pub variation: ShaderVariation,
    pub passes: Vec<Pass>
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariationParamValue
{
    pub name: String,
    pub value: i32
}

/// Describes a variation parameter to tools and material editors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariationParamInfo
{
    pub identifier: String,
    pub name: String,
    pub is_internal: bool,
    pub values: Vec<VariationParamValue>
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubShader
{
    pub name: String,
    pub shader: Shader
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Shader
{
    pub name: String,
    pub options: ShaderOptions,
    pub techniques: Vec<Technique>,
    pub params: ShaderParams,
    pub variation_params: Vec<VariationParamInfo>,
    pub sub_shaders: Vec<SubShader>,
    /// Include files pulled in while parsing, in first seen order.
    pub includes: Vec<String>
}

impl Shader
{
    pub fn techniques_for(&self, language: Language) -> impl Iterator<Item = &Technique>
    {
        self.techniques.iter().filter(move |v| v.language == language)
    }
}
