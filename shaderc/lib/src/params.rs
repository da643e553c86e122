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

//! Parameter table of a compiled shader.

use std::collections::BTreeMap;
use std::fmt::Debug;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::states::CompareFunction;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataParamType
{
    Float1,
    Float2,
    Float3,
    Float4,
    Int1,
    Int2,
    Int3,
    Int4,
    Bool,
    Matrix2x2,
    Matrix2x3,
    Matrix2x4,
    Matrix3x3,
    Matrix3x4,
    Matrix4x2,
    Matrix4x3,
    Matrix4x4,
    Color,
    Struct,
    Unknown
}

impl DataParamType
{
    /// Size in bytes of one element, structs excluded.
    pub fn size(&self) -> u32
    {
        let (cols, rows) = match self {
            DataParamType::Float1 | DataParamType::Int1 | DataParamType::Bool => (1, 1),
            DataParamType::Float2 | DataParamType::Int2 => (2, 1),
            DataParamType::Float3 | DataParamType::Int3 => (3, 1),
            DataParamType::Float4 | DataParamType::Int4 | DataParamType::Color => (4, 1),
            DataParamType::Matrix2x2 => (2, 2),
            DataParamType::Matrix2x3 => (3, 2),
            DataParamType::Matrix2x4 => (4, 2),
            DataParamType::Matrix3x3 => (3, 3),
            DataParamType::Matrix3x4 => (4, 3),
            DataParamType::Matrix4x2 => (2, 4),
            DataParamType::Matrix4x3 => (3, 4),
            DataParamType::Matrix4x4 => (4, 4),
            DataParamType::Struct | DataParamType::Unknown => (0, 0)
        };
        cols * rows * 4
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectParamType
{
    Texture1D,
    Texture1DArray,
    Texture2D,
    Texture2DArray,
    Texture3D,
    TextureCube,
    TextureCubeArray,
    Texture2DMS,
    Texture2DMSArray,
    RWTexture1D,
    RWTexture1DArray,
    RWTexture2D,
    RWTexture2DArray,
    RWTexture3D,
    Sampler2D,
    RWTypedBuffer,
    StructuredBuffer,
    ByteBuffer,
    RWStructuredBuffer,
    RWByteBuffer,
    RWAppendBuffer,
    RWConsumeBuffer,
    Unknown
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuiltinTexture
{
    White,
    Black,
    Normal
}

impl BuiltinTexture
{
    pub fn from_index(index: i32) -> Option<BuiltinTexture>
    {
        match index {
            1 => Some(BuiltinTexture::White),
            2 => Some(BuiltinTexture::Black),
            3 => Some(BuiltinTexture::Normal),
            _ => None
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextureAddressingMode
{
    Wrap,
    Mirror,
    Clamp,
    Border
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOptions
{
    Point,
    Linear,
    Anisotropic
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SamplerStateDesc
{
    pub address_u: TextureAddressingMode,
    pub address_v: TextureAddressingMode,
    pub address_w: TextureAddressingMode,
    pub border_color: [f32; 4],
    pub comparison_func: CompareFunction,
    pub max_aniso: u32,
    pub mip_min: f32,
    pub mip_max: f32,
    pub mipmap_bias: f32,
    pub min_filter: FilterOptions,
    pub mag_filter: FilterOptions,
    pub mip_filter: FilterOptions
}

impl Default for SamplerStateDesc
{
    fn default() -> Self
    {
        SamplerStateDesc {
            address_u: TextureAddressingMode::Wrap,
            address_v: TextureAddressingMode::Wrap,
            address_w: TextureAddressingMode::Wrap,
            border_color: [1.0; 4],
            comparison_func: CompareFunction::AlwaysPass,
            max_aniso: 0,
            mip_min: f32::MIN,
            mip_max: f32::MAX,
            mipmap_bias: 0.0,
            min_filter: FilterOptions::Linear,
            mag_filter: FilterOptions::Linear,
            mip_filter: FilterOptions::Linear
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ParamAttribute
{
    Name(String),
    HideInInspector,
    Hdr,
    SpriteUV(String)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataParam
{
    pub gpu_name: String,
    pub ptype: DataParamType,
    pub array_size: u32,
    /// Element size in bytes, only set for struct parameters.
    pub element_size: u32,
    pub default_value: Option<Vec<u8>>
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextureParam
{
    pub gpu_name: String,
    pub ptype: ObjectParamType,
    pub default_texture: Option<BuiltinTexture>
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SamplerParam
{
    pub gpu_name: String,
    pub default_state: Option<SamplerStateDesc>
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BufferParam
{
    pub gpu_name: String,
    pub ptype: ObjectParamType
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BufferUsage
{
    Static,
    Dynamic
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamBlock
{
    pub shared: bool,
    pub usage: BufferUsage
}

/// Every parameter declared by all programs of a shader, keyed by parameter name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShaderParams
{
    pub data: BTreeMap<String, DataParam>,
    pub textures: BTreeMap<String, TextureParam>,
    pub samplers: BTreeMap<String, SamplerParam>,
    pub buffers: BTreeMap<String, BufferParam>,
    pub blocks: BTreeMap<String, ParamBlock>,
    pub attributes: BTreeMap<String, Vec<ParamAttribute>>
}

fn check<T: Debug + PartialEq>(name: &str, what: &'static str, first: &T, second: &T, strict: bool) -> Result<(), Error>
{
    if first == second {
        return Ok(());
    }
    if strict {
        return Err(Error::ParameterMismatch {
            name: name.into(),
            what,
            first: format!("{:?}", first),
            second: format!("{:?}", second)
        });
    }
    warn!("Parameter '{}' redeclared with a different {} ({:?} -> {:?}), keeping the first declaration", name, what, first, second);
    Ok(())
}

impl ShaderParams
{
    pub fn new() -> ShaderParams
    {
        ShaderParams::default()
    }

    pub fn is_empty(&self) -> bool
    {
        self.data.is_empty() && self.textures.is_empty() && self.samplers.is_empty()
            && self.buffers.is_empty() && self.blocks.is_empty()
    }

    pub fn set_param_block(&mut self, name: &str, shared: bool, usage: BufferUsage)
    {
        self.blocks.entry(name.into()).or_insert(ParamBlock { shared, usage });
    }

    /// Registers a data parameter; returns true if the parameter was not already known.
    pub fn add_data(&mut self, name: &str, param: DataParam, strict: bool) -> Result<bool, Error>
    {
        if let Some(existing) = self.data.get(name) {
            check(name, "type", &existing.ptype, &param.ptype, strict)?;
            check(name, "array size", &existing.array_size, &param.array_size, strict)?;
            return Ok(false);
        }
        debug!("Registered data parameter '{}' ({:?})", name, param.ptype);
        self.data.insert(name.into(), param);
        Ok(true)
    }

    pub fn add_texture(&mut self, name: &str, param: TextureParam, strict: bool) -> Result<bool, Error>
    {
        if let Some(existing) = self.textures.get(name) {
            check(name, "texture type", &existing.ptype, &param.ptype, strict)?;
            return Ok(false);
        }
        debug!("Registered texture parameter '{}' ({:?})", name, param.ptype);
        self.textures.insert(name.into(), param);
        Ok(true)
    }

    pub fn add_sampler(&mut self, name: &str, param: SamplerParam) -> bool
    {
        if self.samplers.contains_key(name) {
            return false;
        }
        debug!("Registered sampler parameter '{}'", name);
        self.samplers.insert(name.into(), param);
        true
    }

    pub fn add_buffer(&mut self, name: &str, param: BufferParam, strict: bool) -> Result<bool, Error>
    {
        if let Some(existing) = self.buffers.get(name) {
            check(name, "buffer type", &existing.ptype, &param.ptype, strict)?;
            return Ok(false);
        }
        debug!("Registered buffer parameter '{}' ({:?})", name, param.ptype);
        self.buffers.insert(name.into(), param);
        Ok(true)
    }

    pub fn set_attribute(&mut self, name: &str, attribute: ParamAttribute)
    {
        let list = self.attributes.entry(name.into()).or_default();
        if !list.contains(&attribute) {
            list.push(attribute);
        }
    }
}

#[cfg(test)]
mod test
{
    use super::*;

    fn float4() -> DataParam
    {
        DataParam {
            gpu_name: "tint".into(),
            ptype: DataParamType::Float4,
            array_size: 1,
            element_size: 0,
            default_value: None
        }
    }

    #[test]
    fn first_registration_wins()
    {
        let mut params = ShaderParams::new();
        assert!(params.add_data("tint", float4(), false).unwrap());
        let mut other = float4();
        other.ptype = DataParamType::Float3;
        assert!(!params.add_data("tint", other.clone(), false).unwrap());
        assert_eq!(params.data["tint"].ptype, DataParamType::Float4);
        match params.add_data("tint", other, true).unwrap_err() {
            Error::ParameterMismatch { name, what, .. } => {
                assert_eq!(name, "tint");
                assert_eq!(what, "type");
            },
            e => panic!("unexpected error {}", e)
        }
    }

    #[test]
    fn sizes()
    {
        assert_eq!(DataParamType::Float4.size(), 16);
        assert_eq!(DataParamType::Matrix3x4.size(), 48);
        assert_eq!(DataParamType::Matrix4x4.size(), 64);
        assert_eq!(DataParamType::Bool.size(), 4);
        assert_eq!(BuiltinTexture::from_index(3), Some(BuiltinTexture::Normal));
        assert_eq!(BuiltinTexture::from_index(0), None);
    }
}
