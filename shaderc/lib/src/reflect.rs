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

//! Maps the reflection report of a program onto the parameter table of the shader.

use crate::cross::reflection::{
    BufferType,
    DataType,
    Filter,
    MemberKind,
    Reflection,
    SamplerState,
    Struct,
    TextureAddressMode,
    Uniform,
    UniformKind,
    UNIFORM_COLOR,
    UNIFORM_HDR,
    UNIFORM_HIDE_IN_INSPECTOR,
    UNIFORM_INTERNAL
};
use crate::error::Error;
use crate::params::{
    BufferParam,
    BufferUsage,
    BuiltinTexture,
    DataParam,
    DataParamType,
    FilterOptions,
    ObjectParamType,
    ParamAttribute,
    SamplerParam,
    SamplerStateDesc,
    ShaderParams,
    TextureAddressingMode,
    TextureParam
};

fn texture_type(btype: BufferType) -> ObjectParamType
{
    match btype {
        BufferType::RWTexture1D => ObjectParamType::RWTexture1D,
        BufferType::RWTexture1DArray => ObjectParamType::RWTexture1DArray,
        BufferType::RWTexture2D => ObjectParamType::RWTexture2D,
        BufferType::RWTexture2DArray => ObjectParamType::RWTexture2DArray,
        BufferType::RWTexture3D => ObjectParamType::RWTexture3D,
        BufferType::Texture1D => ObjectParamType::Texture1D,
        BufferType::Texture1DArray => ObjectParamType::Texture1DArray,
        BufferType::Texture2D => ObjectParamType::Texture2D,
        BufferType::Texture2DArray => ObjectParamType::Texture2DArray,
        BufferType::Texture3D => ObjectParamType::Texture3D,
        BufferType::TextureCube => ObjectParamType::TextureCube,
        BufferType::TextureCubeArray => ObjectParamType::TextureCubeArray,
        BufferType::Texture2DMS => ObjectParamType::Texture2DMS,
        BufferType::Texture2DMSArray => ObjectParamType::Texture2DMSArray,
        _ => ObjectParamType::Unknown
    }
}

fn buffer_type(btype: BufferType) -> ObjectParamType
{
    match btype {
        BufferType::Buffer | BufferType::RWBuffer => ObjectParamType::RWTypedBuffer,
        BufferType::StructuredBuffer => ObjectParamType::StructuredBuffer,
        BufferType::ByteAddressBuffer => ObjectParamType::ByteBuffer,
        BufferType::RWStructuredBuffer => ObjectParamType::RWStructuredBuffer,
        BufferType::RWByteAddressBuffer => ObjectParamType::RWByteBuffer,
        BufferType::AppendStructuredBuffer => ObjectParamType::RWAppendBuffer,
        BufferType::ConsumeStructuredBuffer => ObjectParamType::RWConsumeBuffer,
        _ => ObjectParamType::Unknown
    }
}

fn data_type(dtype: DataType) -> DataParamType
{
    match dtype {
        DataType::Bool => DataParamType::Bool,
        DataType::Float => DataParamType::Float1,
        DataType::Float2 => DataParamType::Float2,
        DataType::Float3 => DataParamType::Float3,
        DataType::Float4 => DataParamType::Float4,
        DataType::Int | DataType::UInt => DataParamType::Int1,
        DataType::Int2 | DataType::UInt2 => DataParamType::Int2,
        DataType::Int3 | DataType::UInt3 => DataParamType::Int3,
        DataType::Int4 | DataType::UInt4 => DataParamType::Int4,
        DataType::Float2x2 => DataParamType::Matrix2x2,
        DataType::Float2x3 => DataParamType::Matrix2x3,
        DataType::Float2x4 => DataParamType::Matrix2x4,
        // No 3x2 matrix parameter exists.
        DataType::Float3x2 => DataParamType::Matrix3x4,
        DataType::Float3x3 => DataParamType::Matrix3x3,
        DataType::Float3x4 => DataParamType::Matrix3x4,
        DataType::Float4x2 => DataParamType::Matrix4x2,
        DataType::Float4x3 => DataParamType::Matrix4x3,
        DataType::Float4x4 => DataParamType::Matrix4x4,
        DataType::Other => DataParamType::Unknown
    }
}

/// Size of a struct as the sum of its members; padding is ignored.
fn struct_size(index: usize, structs: &[Struct], depth: usize) -> u32
{
    // Self referencing structs cannot exist in HLSL, the bound only protects against bad reports.
    if depth > structs.len() {
        return 0;
    }
    let info = match structs.get(index) {
        Some(v) => v,
        None => return 0
    };
    info.members
        .iter()
        .map(|member| match member.kind {
            MemberKind::Variable(dtype) => data_type(dtype).size() * member.array_size,
            MemberKind::Struct(i) => struct_size(i, structs, depth + 1)
        })
        .sum()
}

fn address_mode(mode: TextureAddressMode) -> TextureAddressingMode
{
    match mode {
        TextureAddressMode::Border => TextureAddressingMode::Border,
        TextureAddressMode::Clamp => TextureAddressingMode::Clamp,
        TextureAddressMode::Mirror | TextureAddressMode::MirrorOnce => TextureAddressingMode::Mirror,
        TextureAddressMode::Wrap => TextureAddressingMode::Wrap
    }
}

fn filters(filter: Filter) -> (FilterOptions, FilterOptions, FilterOptions)
{
    use FilterOptions::{Anisotropic, Linear, Point};
    match filter {
        Filter::MinMagMipPoint => (Point, Point, Point),
        Filter::MinMagPointMipLinear => (Point, Point, Linear),
        Filter::MinPointMagLinearMipPoint => (Point, Linear, Point),
        Filter::MinPointMagMipLinear => (Point, Linear, Linear),
        Filter::MinLinearMagMipPoint => (Linear, Point, Point),
        Filter::MinLinearMagPointMipLinear => (Linear, Point, Linear),
        Filter::MinMagLinearMipPoint => (Linear, Linear, Point),
        Filter::MinMagMipLinear => (Linear, Linear, Linear),
        Filter::Anisotropic => (Anisotropic, Anisotropic, Anisotropic)
    }
}

pub fn sampler_state(state: &SamplerState) -> SamplerStateDesc
{
    let (min_filter, mag_filter, mip_filter) = filters(state.filter);
    SamplerStateDesc {
        address_u: address_mode(state.address_u),
        address_v: address_mode(state.address_v),
        address_w: address_mode(state.address_w),
        border_color: state.border_color,
        comparison_func: state.comparison_func,
        max_aniso: state.max_anisotropy,
        mip_min: state.min_lod,
        mip_max: state.max_lod,
        mipmap_bias: state.mip_lod_bias,
        min_filter,
        mag_filter,
        mip_filter
    }
}

fn set_common_attributes(uniform: &Uniform, params: &mut ShaderParams)
{
    if !uniform.readable_name.is_empty() {
        params.set_attribute(&uniform.ident, ParamAttribute::Name(uniform.readable_name.clone()));
    }
    if uniform.has_flag(UNIFORM_HIDE_IN_INSPECTOR) {
        params.set_attribute(&uniform.ident, ParamAttribute::HideInInspector);
    }
    if uniform.has_flag(UNIFORM_HDR) {
        params.set_attribute(&uniform.ident, ParamAttribute::Hdr);
    }
}

fn is_block_internal(reflection: &Reflection, uniform: &Uniform) -> bool
{
    let block = match uniform.uniform_block.and_then(|v| reflection.constant_buffers.get(v)) {
        Some(v) => v,
        None => return false
    };
    reflection
        .uniforms
        .iter()
        .find(|v| v.kind == UniformKind::UniformBuffer && v.ident == block.ident)
        .map(|v| v.has_flag(UNIFORM_INTERNAL))
        .unwrap_or(false)
}

fn parse_variable(reflection: &Reflection, uniform: &Uniform, dtype: DataType, params: &mut ShaderParams, strict: bool) -> Result<(), Error>
{
    if is_block_internal(reflection, uniform) {
        return Ok(());
    }
    let mut ptype = data_type(dtype);
    if uniform.has_flag(UNIFORM_COLOR) && (ptype == DataParamType::Float3 || ptype == DataParamType::Float4) {
        ptype = DataParamType::Color;
    }
    let default_value = uniform
        .default_value
        .and_then(|v| reflection.default_values.get(v))
        .map(|v| {
            let mut bytes = v.to_bytes();
            if ptype.size() > 0 {
                bytes.truncate(ptype.size() as usize);
            }
            bytes
        });
    let param = DataParam {
        gpu_name: uniform.ident.clone(),
        ptype,
        array_size: uniform.array_size,
        element_size: 0,
        default_value
    };
    if !params.add_data(&uniform.ident, param, strict)? {
        return Ok(());
    }
    if !uniform.sprite_uv_ref.is_empty() && ptype == DataParamType::Float4 {
        params.set_attribute(&uniform.ident, ParamAttribute::SpriteUV(uniform.sprite_uv_ref.clone()));
    }
    set_common_attributes(uniform, params);
    Ok(())
}

fn parse_sampler(reflection: &Reflection, uniform: &Uniform, params: &mut ShaderParams)
{
    let state = match reflection.sampler_states.get(&uniform.ident) {
        Some(v) => v,
        None => {
            params.add_sampler(&uniform.ident, SamplerParam {
                gpu_name: uniform.ident.clone(),
                default_state: None
            });
            return;
        }
    };
    if params.samplers.contains_key(&uniform.ident) {
        return;
    }
    let default_state = if state.is_non_default {
        Some(sampler_state(state))
    } else {
        None
    };
    let param = SamplerParam {
        gpu_name: uniform.ident.clone(),
        default_state
    };
    if !state.alias.is_empty() {
        params.add_sampler(&state.alias, param.clone());
    }
    params.add_sampler(&uniform.ident, param);
}

/// Registers every non-internal parameter of a reflection report. Parameters already known from
/// an earlier pass or variation are kept as they are.
pub fn parse_parameters(reflection: &Reflection, params: &mut ShaderParams, strict: bool) -> Result<(), Error>
{
    for uniform in &reflection.uniforms {
        if uniform.has_flag(UNIFORM_INTERNAL) {
            continue;
        }
        match uniform.kind {
            UniformKind::UniformBuffer => params.set_param_block(&uniform.ident, false, BufferUsage::Static),
            UniformKind::Buffer(btype) => {
                let ptype = texture_type(btype);
                let added = if ptype != ObjectParamType::Unknown {
                    let default_texture = uniform
                        .default_value
                        .and_then(|v| reflection.default_values.get(v))
                        .and_then(|v| BuiltinTexture::from_index(v.integer()));
                    params.add_texture(&uniform.ident, TextureParam {
                        gpu_name: uniform.ident.clone(),
                        ptype,
                        default_texture
                    }, strict)?
                } else {
                    params.add_buffer(&uniform.ident, BufferParam {
                        gpu_name: uniform.ident.clone(),
                        ptype: buffer_type(btype)
                    }, strict)?
                };
                if added {
                    set_common_attributes(uniform, params);
                }
            },
            UniformKind::Sampler => parse_sampler(reflection, uniform, params),
            UniformKind::Variable(dtype) => parse_variable(reflection, uniform, dtype, params, strict)?,
            UniformKind::Struct(index) => {
                params.add_data(&uniform.ident, DataParam {
                    gpu_name: uniform.ident.clone(),
                    ptype: DataParamType::Struct,
                    array_size: uniform.array_size,
                    element_size: struct_size(index, &reflection.structs, 0),
                    default_value: None
                }, strict)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod test
{
    use super::*;
    use crate::cross::reflection::{Binding, DefaultValue, StructMember};

    fn reflection() -> Reflection
    {
        let mut refl = Reflection::default();
        let mut block = Uniform::new("Params", UniformKind::UniformBuffer);
        block.flags = 0;
        let mut internal = Uniform::new("Internal", UniformKind::UniformBuffer);
        internal.flags = UNIFORM_INTERNAL;
        refl.constant_buffers.push(Binding { ident: "Params".into(), location: 0 });
        refl.constant_buffers.push(Binding { ident: "Internal".into(), location: 1 });
        let mut tint = Uniform::new("gTint", UniformKind::Variable(DataType::Float4));
        tint.flags = UNIFORM_COLOR | UNIFORM_HDR;
        tint.readable_name = "Tint".into();
        tint.uniform_block = Some(0);
        tint.default_value = Some(0);
        let mut hidden = Uniform::new("gMatrix", UniformKind::Variable(DataType::Float4x4));
        hidden.uniform_block = Some(1);
        let mut albedo = Uniform::new("gAlbedo", UniformKind::Buffer(BufferType::Texture2D));
        albedo.default_value = Some(1);
        let lights = Uniform::new("gLights", UniformKind::Buffer(BufferType::StructuredBuffer));
        let sampler = Uniform::new("gSampler", UniformKind::Sampler);
        let mut light = Uniform::new("gLight", UniformKind::Struct(0));
        light.array_size = 2;
        refl.structs.push(Struct {
            ident: "Light".into(),
            members: vec![
                StructMember { ident: "pos".into(), kind: MemberKind::Variable(DataType::Float3), array_size: 1 },
                StructMember { ident: "params".into(), kind: MemberKind::Variable(DataType::Float2), array_size: 2 }
            ]
        });
        refl.default_values.push(DefaultValue::Matrix([1.0; 16]));
        refl.default_values.push(DefaultValue::Int(2));
        let mut state = SamplerState::default();
        state.is_non_default = true;
        state.alias = "gAlbedoSamp".into();
        state.filter = Filter::Anisotropic;
        state.address_u = TextureAddressMode::MirrorOnce;
        refl.sampler_states.insert("gSampler".into(), state);
        refl.uniforms = vec![block, internal, tint, hidden, albedo, lights, sampler, light];
        refl
    }

    #[test]
    fn register()
    {
        let mut params = ShaderParams::new();
        parse_parameters(&reflection(), &mut params, true).unwrap();
        assert!(params.blocks.contains_key("Params"));
        assert!(!params.blocks.contains_key("Internal"));
        assert!(!params.data.contains_key("gMatrix"));
        let tint = &params.data["gTint"];
        assert_eq!(tint.ptype, DataParamType::Color);
        assert_eq!(tint.default_value.as_ref().unwrap().len(), 16);
        assert_eq!(params.attributes["gTint"], vec![ParamAttribute::Name("Tint".into()), ParamAttribute::Hdr]);
        assert_eq!(params.textures["gAlbedo"].default_texture, Some(BuiltinTexture::Black));
        assert_eq!(params.buffers["gLights"].ptype, ObjectParamType::StructuredBuffer);
        let sampler = params.samplers["gSampler"].default_state.unwrap();
        assert_eq!(sampler.min_filter, FilterOptions::Anisotropic);
        assert_eq!(sampler.address_u, TextureAddressingMode::Mirror);
        assert_eq!(params.samplers["gAlbedoSamp"].gpu_name, "gSampler");
        let light = &params.data["gLight"];
        assert_eq!(light.element_size, 12 + 16);
        assert_eq!(light.array_size, 2);
    }

    #[test]
    fn idempotent()
    {
        let mut params = ShaderParams::new();
        parse_parameters(&reflection(), &mut params, true).unwrap();
        let first = params.clone();
        parse_parameters(&reflection(), &mut params, true).unwrap();
        assert_eq!(first, params);
    }

    #[test]
    fn conflicting_texture()
    {
        let mut params = ShaderParams::new();
        parse_parameters(&reflection(), &mut params, false).unwrap();
        let mut other = Reflection::default();
        other.uniforms.push(Uniform::new("gAlbedo", UniformKind::Buffer(BufferType::Texture3D)));
        parse_parameters(&other, &mut params, false).unwrap();
        assert_eq!(params.textures["gAlbedo"].ptype, ObjectParamType::Texture2D);
        assert!(matches!(parse_parameters(&other, &mut params, true), Err(Error::ParameterMismatch { .. })));
    }
}
