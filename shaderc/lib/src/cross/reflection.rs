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

//! Reflection report of a cross-compiled program.

use std::collections::BTreeMap;

use crate::states::CompareFunction;

pub const UNIFORM_INTERNAL: u32 = 0x1;
pub const UNIFORM_COLOR: u32 = 0x2;
pub const UNIFORM_HIDE_IN_INSPECTOR: u32 = 0x4;
pub const UNIFORM_HDR: u32 = 0x8;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BufferType
{
    Buffer,
    StructuredBuffer,
    ByteAddressBuffer,
    RWBuffer,
    RWStructuredBuffer,
    RWByteAddressBuffer,
    AppendStructuredBuffer,
    ConsumeStructuredBuffer,
    RWTexture1D,
    RWTexture1DArray,
    RWTexture2D,
    RWTexture2DArray,
    RWTexture3D,
    Texture1D,
    Texture1DArray,
    Texture2D,
    Texture2DArray,
    Texture3D,
    TextureCube,
    TextureCubeArray,
    Texture2DMS,
    Texture2DMSArray,
    Other
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DataType
{
    Bool,
    Float,
    Float2,
    Float3,
    Float4,
    Int,
    Int2,
    Int3,
    Int4,
    UInt,
    UInt2,
    UInt3,
    UInt4,
    Float2x2,
    Float2x3,
    Float2x4,
    Float3x2,
    Float3x3,
    Float3x4,
    Float4x2,
    Float4x3,
    Float4x4,
    Other
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UniformKind
{
    UniformBuffer,
    Buffer(BufferType),
    Sampler,
    Variable(DataType),
    /// Index into `Reflection::structs`.
    Struct(usize)
}

#[derive(Clone, Debug, PartialEq)]
pub struct Uniform
{
    pub ident: String,
    pub kind: UniformKind,
    pub flags: u32,
    pub readable_name: String,
    pub array_size: u32,
    /// Index into `Reflection::default_values`.
    pub default_value: Option<usize>,
    /// Index into `Reflection::constant_buffers` of the block declaring this variable.
    pub uniform_block: Option<usize>,
    pub sprite_uv_ref: String
}

impl Uniform
{
    pub fn new<T: Into<String>>(ident: T, kind: UniformKind) -> Uniform
    {
        Uniform {
            ident: ident.into(),
            kind,
            flags: 0,
            readable_name: String::new(),
            array_size: 1,
            default_value: None,
            uniform_block: None,
            sprite_uv_ref: String::new()
        }
    }

    pub fn has_flag(&self, flag: u32) -> bool
    {
        self.flags & flag != 0
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum DefaultValue
{
    Bool(bool),
    Int(i32),
    Real(f32),
    Matrix([f32; 16])
}

impl DefaultValue
{
    pub fn integer(&self) -> i32
    {
        match self {
            DefaultValue::Bool(b) => *b as i32,
            DefaultValue::Int(i) => *i,
            DefaultValue::Real(f) => *f as i32,
            DefaultValue::Matrix(m) => m[0] as i32
        }
    }

    /// Little endian bytes of the value.
    pub fn to_bytes(&self) -> Vec<u8>
    {
        match self {
            DefaultValue::Bool(b) => (*b as u32).to_le_bytes().to_vec(),
            DefaultValue::Int(i) => i.to_le_bytes().to_vec(),
            DefaultValue::Real(f) => f.to_le_bytes().to_vec(),
            DefaultValue::Matrix(m) => m.iter().flat_map(|v| v.to_le_bytes()).collect()
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TextureAddressMode
{
    Wrap,
    Mirror,
    Clamp,
    Border,
    MirrorOnce
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Filter
{
    MinMagMipPoint,
    MinMagPointMipLinear,
    MinPointMagLinearMipPoint,
    MinPointMagMipLinear,
    MinLinearMagMipPoint,
    MinLinearMagPointMipLinear,
    MinMagLinearMipPoint,
    MinMagMipLinear,
    Anisotropic
}

#[derive(Clone, Debug, PartialEq)]
pub struct SamplerState
{
    pub address_u: TextureAddressMode,
    pub address_v: TextureAddressMode,
    pub address_w: TextureAddressMode,
    pub border_color: [f32; 4],
    pub comparison_func: CompareFunction,
    pub max_anisotropy: u32,
    pub min_lod: f32,
    pub max_lod: f32,
    pub mip_lod_bias: f32,
    pub filter: Filter,
    pub alias: String,
    pub is_non_default: bool
}

impl Default for SamplerState
{
    fn default() -> Self
    {
        SamplerState {
            address_u: TextureAddressMode::Wrap,
            address_v: TextureAddressMode::Wrap,
            address_w: TextureAddressMode::Wrap,
            border_color: [0.0; 4],
            comparison_func: CompareFunction::AlwaysPass,
            max_anisotropy: 1,
            min_lod: f32::MIN,
            max_lod: f32::MAX,
            mip_lod_bias: 0.0,
            filter: Filter::MinMagMipLinear,
            alias: String::new(),
            is_non_default: false
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding
{
    pub ident: String,
    pub location: u32
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MemberKind
{
    Variable(DataType),
    Struct(usize)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructMember
{
    pub ident: String,
    pub kind: MemberKind,
    pub array_size: u32
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Struct
{
    pub ident: String,
    pub members: Vec<StructMember>
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Reflection
{
    pub uniforms: Vec<Uniform>,
    pub constant_buffers: Vec<Binding>,
    pub textures: Vec<Binding>,
    pub storage_buffers: Vec<Binding>,
    pub functions: Vec<String>,
    pub default_values: Vec<DefaultValue>,
    pub sampler_states: BTreeMap<String, SamplerState>,
    pub structs: Vec<Struct>
}

impl Reflection
{
    pub fn has_function(&self, name: &str) -> bool
    {
        self.functions.iter().any(|v| v == name)
    }

    /// Highest binding location + 1 across constant buffers, textures and storage buffers.
    pub fn next_binding(&self, cursor: u32) -> u32
    {
        self.constant_buffers
            .iter()
            .chain(self.textures.iter())
            .chain(self.storage_buffers.iter())
            .fold(cursor, |acc, v| acc.max(v.location + 1))
    }
}
