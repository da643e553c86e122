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

//! A reflection-only implementation of the cross compiler contract.
//!
//! The reflector reads the declarations of an HLSL program (constant buffers, loose uniforms,
//! textures, samplers, storage buffers and structs together with their BSL attributes) without
//! translating anything. It is enough to drive parameter registration and stage detection; any
//! request for an actual translation is reported as an error.

use phf::phf_map;
use regex::{Captures, Regex};

use crate::cross::compile_log::{CompileLog, Report};
use crate::cross::reflection::{
    Binding,
    BufferType,
    DataType,
    DefaultValue,
    Filter,
    MemberKind,
    Reflection,
    SamplerState,
    Struct,
    StructMember,
    TextureAddressMode,
    Uniform,
    UniformKind,
    UNIFORM_COLOR,
    UNIFORM_HDR,
    UNIFORM_HIDE_IN_INSPECTOR,
    UNIFORM_INTERNAL
};
use crate::cross::{CrossCompileRequest, CrossCompileResult, CrossCompiler};
use crate::states::CompareFunction;
use crate::targets::TargetLanguage;

static DATA_TYPES: phf::Map<&'static str, DataType> = phf_map! {
    "bool" => DataType::Bool,
    "float" => DataType::Float,
    "float1" => DataType::Float,
    "half" => DataType::Float,
    "float2" => DataType::Float2,
    "half2" => DataType::Float2,
    "float3" => DataType::Float3,
    "half3" => DataType::Float3,
    "float4" => DataType::Float4,
    "half4" => DataType::Float4,
    "int" => DataType::Int,
    "int1" => DataType::Int,
    "int2" => DataType::Int2,
    "int3" => DataType::Int3,
    "int4" => DataType::Int4,
    "uint" => DataType::UInt,
    "uint1" => DataType::UInt,
    "uint2" => DataType::UInt2,
    "uint3" => DataType::UInt3,
    "uint4" => DataType::UInt4,
    "float2x2" => DataType::Float2x2,
    "float2x3" => DataType::Float2x3,
    "float2x4" => DataType::Float2x4,
    "float3x2" => DataType::Float3x2,
    "float3x3" => DataType::Float3x3,
    "float3x4" => DataType::Float3x4,
    "float4x2" => DataType::Float4x2,
    "float4x3" => DataType::Float4x3,
    "float4x4" => DataType::Float4x4,
    "matrix" => DataType::Float4x4
};

static BUFFER_TYPES: phf::Map<&'static str, BufferType> = phf_map! {
    "Buffer" => BufferType::Buffer,
    "StructuredBuffer" => BufferType::StructuredBuffer,
    "ByteAddressBuffer" => BufferType::ByteAddressBuffer,
    "RWBuffer" => BufferType::RWBuffer,
    "RWStructuredBuffer" => BufferType::RWStructuredBuffer,
    "RWByteAddressBuffer" => BufferType::RWByteAddressBuffer,
    "AppendStructuredBuffer" => BufferType::AppendStructuredBuffer,
    "ConsumeStructuredBuffer" => BufferType::ConsumeStructuredBuffer,
    "RWTexture1D" => BufferType::RWTexture1D,
    "RWTexture1DArray" => BufferType::RWTexture1DArray,
    "RWTexture2D" => BufferType::RWTexture2D,
    "RWTexture2DArray" => BufferType::RWTexture2DArray,
    "RWTexture3D" => BufferType::RWTexture3D,
    "Texture1D" => BufferType::Texture1D,
    "Texture1DArray" => BufferType::Texture1DArray,
    "Texture2D" => BufferType::Texture2D,
    "Texture2DArray" => BufferType::Texture2DArray,
    "Texture3D" => BufferType::Texture3D,
    "TextureCube" => BufferType::TextureCube,
    "TextureCubeArray" => BufferType::TextureCubeArray,
    "Texture2DMS" => BufferType::Texture2DMS,
    "Texture2DMSArray" => BufferType::Texture2DMSArray
};

static FILTERS: phf::Map<&'static str, Filter> = phf_map! {
    "MIN_MAG_MIP_POINT" => Filter::MinMagMipPoint,
    "MIN_MAG_POINT_MIP_LINEAR" => Filter::MinMagPointMipLinear,
    "MIN_POINT_MAG_LINEAR_MIP_POINT" => Filter::MinPointMagLinearMipPoint,
    "MIN_POINT_MAG_MIP_LINEAR" => Filter::MinPointMagMipLinear,
    "MIN_LINEAR_MAG_MIP_POINT" => Filter::MinLinearMagMipPoint,
    "MIN_LINEAR_MAG_POINT_MIP_LINEAR" => Filter::MinLinearMagPointMipLinear,
    "MIN_MAG_LINEAR_MIP_POINT" => Filter::MinMagLinearMipPoint,
    "MIN_MAG_MIP_LINEAR" => Filter::MinMagMipLinear,
    "ANISOTROPIC" => Filter::Anisotropic
};

static ADDRESS_MODES: phf::Map<&'static str, TextureAddressMode> = phf_map! {
    "WRAP" => TextureAddressMode::Wrap,
    "MIRROR" => TextureAddressMode::Mirror,
    "CLAMP" => TextureAddressMode::Clamp,
    "BORDER" => TextureAddressMode::Border,
    "MIRROR_ONCE" => TextureAddressMode::MirrorOnce
};

static COMPARE_FUNCTIONS: phf::Map<&'static str, CompareFunction> = phf_map! {
    "NEVER" => CompareFunction::AlwaysFail,
    "LESS" => CompareFunction::Less,
    "EQUAL" => CompareFunction::Equal,
    "LESS_EQUAL" => CompareFunction::LessEqual,
    "GREATER" => CompareFunction::Greater,
    "NOT_EQUAL" => CompareFunction::NotEqual,
    "GREATER_EQUAL" => CompareFunction::GreaterEqual,
    "ALWAYS" => CompareFunction::AlwaysPass
};

#[derive(Default)]
struct Attributes
{
    flags: u32,
    name: String,
    sprite_uv: String,
    alias: String
}

#[derive(Default)]
struct Bindings
{
    constant_buffers: u32,
    textures: u32,
    storage_buffers: u32
}

fn allocate(counter: &mut u32, explicit: Option<u32>) -> u32
{
    match explicit {
        Some(v) => {
            *counter = (*counter).max(v + 1);
            v
        },
        None => {
            *counter += 1;
            *counter - 1
        }
    }
}

/// Replaces the content of every top level scope with blanks; offsets are preserved.
fn blank_scopes(code: &str) -> Option<String>
{
    let mut depth = 0usize;
    let mut bytes = code.as_bytes().to_vec();
    for b in bytes.iter_mut() {
        match *b {
            b'{' => {
                depth += 1;
                if depth > 1 {
                    *b = b' ';
                }
            },
            b'}' => {
                if depth == 0 {
                    return None;
                }
                depth -= 1;
                if depth > 0 {
                    *b = b' ';
                }
            },
            b'\n' => (),
            _ if depth > 0 => *b = b' ',
            _ => ()
        }
    }
    if depth != 0 {
        return None;
    }
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

pub struct HlslReflector
{
    comments: Regex,
    directives: Regex,
    functions: Regex,
    declarations: Regex,
    attributes: Regex,
    identifiers: Regex,
    numbers: Regex,
    assignments: Regex
}

impl HlslReflector
{
    /// Returns true if techniques of the given language can be built with no other cross
    /// compiler. Only HLSL qualifies; every other language needs a translator.
    pub fn supports(language: TargetLanguage) -> bool
    {
        language == TargetLanguage::Hlsl
    }

    pub fn new() -> HlslReflector
    {
        HlslReflector {
            comments: Regex::new(r"(?s)//[^\n]*|/\*.*?\*/").unwrap(),
            directives: Regex::new(r"(?m)^[ \t]*#.*$").unwrap(),
            functions: Regex::new(r"\b[A-Za-z_]\w*(?:\s*<[^>]*>)?\s+([A-Za-z_]\w*)\s*\([^;{]*\)\s*(?::\s*\w+\s*)?\{").unwrap(),
            declarations: Regex::new(concat!(
                r"(?P<attrs>(?:\[[^\[\]]*\]\s*)*)",
                r"(?P<qual>(?:(?:static|const|uniform|extern|volatile|groupshared|row_major|column_major)\s+)*)",
                r"(?P<ty>[A-Za-z_]\w*)(?:\s*<[^>]*>)?\s+(?P<name>[A-Za-z_]\w*)\s*",
                r"(?:\[\s*(?P<array>\d+)\s*\]\s*)?",
                r"(?::\s*register\s*\(\s*[a-z](?P<slot>\d+)\s*\)\s*)?",
                r"(?:=\s*(?P<init>[^;{}]+?)\s*)?",
                r"(?:(?P<block>\{[^{}]*\})\s*;?|;)"
            ))
            .unwrap(),
            attributes: Regex::new(r#"\[\s*([A-Za-z_]\w*)\s*(?:\(\s*"?([^")]*?)"?\s*\))?\s*\]"#).unwrap(),
            identifiers: Regex::new(r"\b[A-Za-z_]\w*").unwrap(),
            numbers: Regex::new(r"[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?").unwrap(),
            assignments: Regex::new(r"([A-Za-z_]\w*)\s*=\s*([^;]+);").unwrap()
        }
    }

    fn parse_attributes(&self, text: &str) -> Attributes
    {
        let mut attrs = Attributes::default();
        for cap in self.attributes.captures_iter(text) {
            let arg = cap.get(2).map(|v| v.as_str().trim().to_string()).unwrap_or_default();
            match &*cap[1].to_lowercase() {
                "internal" => attrs.flags |= UNIFORM_INTERNAL,
                "color" => attrs.flags |= UNIFORM_COLOR,
                "hideininspector" => attrs.flags |= UNIFORM_HIDE_IN_INSPECTOR,
                "hdr" => attrs.flags |= UNIFORM_HDR,
                "name" => attrs.name = arg,
                "spriteuv" => attrs.sprite_uv = arg,
                "alias" => attrs.alias = arg,
                _ => ()
            }
        }
        attrs
    }

    fn parse_numbers(&self, text: &str) -> Vec<f32>
    {
        let text = self.identifiers.replace_all(text, " ");
        self.numbers
            .find_iter(&text)
            .filter_map(|v| v.as_str().parse().ok())
            .collect()
    }

    fn parse_default(&self, dtype: DataType, init: &str) -> Option<DefaultValue>
    {
        if dtype == DataType::Bool {
            return match init.trim() {
                "true" => Some(DefaultValue::Bool(true)),
                "false" => Some(DefaultValue::Bool(false)),
                _ => None
            };
        }
        let numbers = self.parse_numbers(init);
        if numbers.is_empty() {
            return None;
        }
        match dtype {
            DataType::Float => Some(DefaultValue::Real(numbers[0])),
            DataType::Int | DataType::UInt => Some(DefaultValue::Int(numbers[0] as i32)),
            _ => {
                let mut matrix = [0.0; 16];
                for (dst, src) in matrix.iter_mut().zip(numbers.iter()) {
                    *dst = *src;
                }
                Some(DefaultValue::Matrix(matrix))
            }
        }
    }

    fn parse_sampler_state(&self, block: &str, state: &mut SamplerState)
    {
        for cap in self.assignments.captures_iter(block) {
            let value = cap[2].trim().to_uppercase();
            let recognized = match &*cap[1].to_lowercase() {
                "filter" => FILTERS.get(&*value).map(|v| state.filter = *v),
                "addressu" => ADDRESS_MODES.get(&*value).map(|v| state.address_u = *v),
                "addressv" => ADDRESS_MODES.get(&*value).map(|v| state.address_v = *v),
                "addressw" => ADDRESS_MODES.get(&*value).map(|v| state.address_w = *v),
                "comparisonfunc" => COMPARE_FUNCTIONS.get(&*value).map(|v| state.comparison_func = *v),
                "maxanisotropy" => value.parse().ok().map(|v| state.max_anisotropy = v),
                "minlod" => self.parse_numbers(&value).first().map(|v| state.min_lod = *v),
                "maxlod" => self.parse_numbers(&value).first().map(|v| state.max_lod = *v),
                "miplodbias" => self.parse_numbers(&value).first().map(|v| state.mip_lod_bias = *v),
                "bordercolor" => {
                    let numbers = self.parse_numbers(&value);
                    for (dst, src) in state.border_color.iter_mut().zip(numbers.iter()) {
                        *dst = *src;
                    }
                    Some(())
                },
                _ => None
            };
            if recognized.is_some() {
                state.is_non_default = true;
            }
        }
    }

    fn parse_members(&self, body: &str, structs: &[Struct]) -> Vec<StructMember>
    {
        self.declarations
            .captures_iter(body)
            .filter_map(|cap| {
                let kind = match DATA_TYPES.get(&cap["ty"]) {
                    Some(v) => MemberKind::Variable(*v),
                    None => MemberKind::Struct(structs.iter().position(|v| v.ident == cap["ty"])?)
                };
                Some(StructMember {
                    ident: cap["name"].into(),
                    kind,
                    array_size: array_size(&cap)
                })
            })
            .collect()
    }

    fn parse_constant_buffer(&self, cap: &Captures, block: &str, index: usize, refl: &mut Reflection)
    {
        for member in self.declarations.captures_iter(block) {
            let attrs = self.parse_attributes(member.name("attrs").map(|v| v.as_str()).unwrap_or(""));
            let kind = match DATA_TYPES.get(&member["ty"]) {
                Some(v) => UniformKind::Variable(*v),
                None => match refl.structs.iter().position(|v| v.ident == member["ty"]) {
                    Some(v) => UniformKind::Struct(v),
                    None => continue
                }
            };
            let mut uniform = self.uniform(&member, kind, attrs);
            uniform.uniform_block = Some(index);
            if let (UniformKind::Variable(dtype), Some(init)) = (kind, member.name("init")) {
                uniform.default_value = self.parse_default(dtype, init.as_str()).map(|v| {
                    refl.default_values.push(v);
                    refl.default_values.len() - 1
                });
            }
            refl.uniforms.push(uniform);
        }
        log::trace!("Reflected constant buffer '{}'", &cap["name"]);
    }

    fn uniform(&self, cap: &Captures, kind: UniformKind, attrs: Attributes) -> Uniform
    {
        let mut uniform = Uniform::new(&cap["name"], kind);
        uniform.flags = attrs.flags;
        uniform.readable_name = attrs.name;
        uniform.sprite_uv_ref = attrs.sprite_uv;
        uniform.array_size = array_size(cap);
        uniform
    }

    /// Reflects the declarations of an HLSL program.
    pub fn reflect(&self, code: &str, binding_start: u32) -> Result<Reflection, String>
    {
        let stripped = self.comments.replace_all(code, " ");
        let stripped = self.directives.replace_all(&stripped, "");
        let top = blank_scopes(&stripped).ok_or_else(|| String::from("unbalanced braces"))?;
        let mut refl = Reflection::default();
        for cap in self.functions.captures_iter(&top) {
            if !refl.has_function(&cap[1]) {
                refl.functions.push(cap[1].into());
            }
        }
        let mut bindings = Bindings {
            constant_buffers: binding_start,
            textures: binding_start,
            storage_buffers: binding_start
        };
        for cap in self.declarations.captures_iter(&top) {
            let qual = cap.name("qual").map(|v| v.as_str()).unwrap_or("");
            if qual.contains("static") || qual.contains("groupshared") {
                continue;
            }
            let attrs = self.parse_attributes(cap.name("attrs").map(|v| v.as_str()).unwrap_or(""));
            let slot = cap.name("slot").and_then(|v| v.as_str().parse().ok());
            // Block contents are blanked in the top level text, read them back from the stripped code.
            let block = cap.name("block").map(|v| &stripped[v.start() + 1..v.end() - 1]);
            let ty = &cap["ty"];
            match ty {
                "struct" => {
                    let members = self.parse_members(block.unwrap_or(""), &refl.structs);
                    refl.structs.push(Struct {
                        ident: cap["name"].into(),
                        members
                    });
                },
                "cbuffer" | "tbuffer" => {
                    let index = refl.constant_buffers.len();
                    refl.constant_buffers.push(Binding {
                        ident: cap["name"].into(),
                        location: allocate(&mut bindings.constant_buffers, slot)
                    });
                    refl.uniforms.push(self.uniform(&cap, UniformKind::UniformBuffer, attrs));
                    self.parse_constant_buffer(&cap, block.unwrap_or(""), index, &mut refl);
                },
                "SamplerState" | "SamplerComparisonState" | "sampler" => {
                    let mut state = SamplerState::default();
                    if let Some(block) = block {
                        self.parse_sampler_state(block, &mut state);
                    }
                    if state.is_non_default || !attrs.alias.is_empty() {
                        state.alias = attrs.alias.clone();
                        refl.sampler_states.insert(cap["name"].into(), state);
                    }
                    refl.uniforms.push(self.uniform(&cap, UniformKind::Sampler, attrs));
                },
                _ => {
                    if let Some(btype) = BUFFER_TYPES.get(ty) {
                        let binding = Binding {
                            ident: cap["name"].into(),
                            location: 0
                        };
                        let is_texture = ty.contains("Texture");
                        if is_texture {
                            refl.textures.push(Binding {
                                location: allocate(&mut bindings.textures, slot),
                                ..binding
                            });
                        } else {
                            refl.storage_buffers.push(Binding {
                                location: allocate(&mut bindings.storage_buffers, slot),
                                ..binding
                            });
                        }
                        let mut uniform = self.uniform(&cap, UniformKind::Buffer(*btype), attrs);
                        let builtin = cap.name("init").and_then(|v| match v.as_str().trim() {
                            "white" => Some(1),
                            "black" => Some(2),
                            "normal" => Some(3),
                            _ => None
                        });
                        if let (true, Some(index)) = (is_texture, builtin) {
                            refl.default_values.push(DefaultValue::Int(index));
                            uniform.default_value = Some(refl.default_values.len() - 1);
                        }
                        refl.uniforms.push(uniform);
                    } else if let Some(dtype) = DATA_TYPES.get(ty) {
                        let mut uniform = self.uniform(&cap, UniformKind::Variable(*dtype), attrs);
                        if let Some(init) = cap.name("init") {
                            uniform.default_value = self.parse_default(*dtype, init.as_str()).map(|v| {
                                refl.default_values.push(v);
                                refl.default_values.len() - 1
                            });
                        }
                        refl.uniforms.push(uniform);
                    } else if let Some(index) = refl.structs.iter().position(|v| v.ident == ty) {
                        let uniform = self.uniform(&cap, UniformKind::Struct(index), attrs);
                        refl.uniforms.push(uniform);
                    }
                }
            }
        }
        Ok(refl)
    }
}

fn array_size(cap: &Captures) -> u32
{
    cap.name("array").and_then(|v| v.as_str().parse().ok()).unwrap_or(1)
}

impl Default for HlslReflector
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl CrossCompiler for HlslReflector
{
    fn compile(&self, request: &CrossCompileRequest) -> Result<CrossCompileResult, CompileLog>
    {
        let mut log = CompileLog::new();
        if !request.reflect_only {
            log.push(Report::error(format!("error : translation to {:?} is not available", request.target)));
            return Err(log);
        }
        let reflection = match self.reflect(&request.source, request.binding_start) {
            Ok(v) => v,
            Err(e) => {
                log.push(Report::error(format!("error : {}", e)));
                return Err(log);
            }
        };
        if !reflection.has_function(request.entry_point) {
            log.push(Report::error(format!("error : entry point '{}' not found", request.entry_point)));
            log.reflection = Some(reflection);
            return Err(log);
        }
        Ok(CrossCompileResult {
            source: String::new(),
            reflection,
            log
        })
    }
}

#[cfg(test)]
mod test
{
    use super::*;
    use crate::cross::CrossCompileTarget;
    use crate::targets::Stage;

    const PROGRAM: &str = r#"
        #define OPENGL 1
        struct Light
        {
            float3 position;
            float radius[2];
        };

        [internal]
        cbuffer PerCamera : register(b2)
        {
            float4x4 gViewProj;
        }

        cbuffer Params
        {
            [color] [name("Tint color")] float4 gTint = float4(1.0, 0.5, 0.25, 1.0);
            float gRoughness = 0.5f; // comment
            Light gLight;
        };

        Texture2D gAlbedo = white;
        [alias(gAlbedoSamp)]
        SamplerState gSampler
        {
            Filter = MIN_MAG_MIP_POINT;
            AddressU = Clamp;
        };
        RWStructuredBuffer<Light> gLights;
        static const float PI = 3.14;
        bool gEnabled = true;

        float4 helper(float4 v) { return v; }

        float4 vsmain(float3 pos : POSITION) : SV_Position
        {
            float4 x = gTint;
            return helper(x);
        }

        float4 fsmain() : SV_Target { if (gEnabled) { return gTint; } return 0; }
    "#;

    fn find<'a>(refl: &'a Reflection, name: &str) -> &'a Uniform
    {
        refl.uniforms.iter().find(|v| v.ident == name).unwrap()
    }

    #[test]
    fn functions()
    {
        let refl = HlslReflector::new().reflect(PROGRAM, 0).unwrap();
        assert_eq!(refl.functions, vec!["helper".to_string(), "vsmain".into(), "fsmain".into()]);
    }

    #[test]
    fn declarations()
    {
        let refl = HlslReflector::new().reflect(PROGRAM, 0).unwrap();
        assert_eq!(refl.structs.len(), 1);
        assert_eq!(refl.structs[0].members[1].array_size, 2);
        assert!(find(&refl, "PerCamera").has_flag(UNIFORM_INTERNAL));
        assert_eq!(find(&refl, "gViewProj").uniform_block, Some(0));
        let tint = find(&refl, "gTint");
        assert!(tint.has_flag(UNIFORM_COLOR));
        assert_eq!(tint.readable_name, "Tint color");
        assert_eq!(tint.uniform_block, Some(1));
        let value = refl.default_values[tint.default_value.unwrap()];
        assert!(matches!(value, DefaultValue::Matrix(m) if m[1] == 0.5 && m[3] == 1.0));
        assert_eq!(refl.default_values[find(&refl, "gRoughness").default_value.unwrap()], DefaultValue::Real(0.5));
        assert_eq!(find(&refl, "gLight").kind, UniformKind::Struct(0));
        assert_eq!(refl.default_values[find(&refl, "gAlbedo").default_value.unwrap()].integer(), 1);
        assert_eq!(find(&refl, "gLights").kind, UniformKind::Buffer(BufferType::RWStructuredBuffer));
        assert_eq!(find(&refl, "gEnabled").kind, UniformKind::Variable(DataType::Bool));
        assert!(refl.uniforms.iter().all(|v| v.ident != "PI" && v.ident != "x"));
        let state = &refl.sampler_states["gSampler"];
        assert!(state.is_non_default);
        assert_eq!(state.alias, "gAlbedoSamp");
        assert_eq!(state.filter, Filter::MinMagMipPoint);
        assert_eq!(state.address_u, TextureAddressMode::Clamp);
    }

    #[test]
    fn bindings()
    {
        let refl = HlslReflector::new().reflect(PROGRAM, 0).unwrap();
        assert_eq!(refl.constant_buffers[0].location, 2);
        assert_eq!(refl.constant_buffers[1].location, 3);
        assert_eq!(refl.textures[0].location, 0);
        assert_eq!(refl.next_binding(0), 4);
    }

    #[test]
    fn unbalanced()
    {
        assert!(HlslReflector::new().reflect("void vsmain() {", 0).is_err());
    }

    #[test]
    fn translation_unavailable()
    {
        let request = CrossCompileRequest {
            source: PROGRAM.into(),
            stage: Stage::Vertex,
            entry_point: "vsmain",
            target: CrossCompileTarget::Glsl45,
            auto_binding: false,
            binding_start: 0,
            separate_samplers: false,
            reflect_only: false
        };
        assert!(HlslReflector::new().compile(&request).is_err());
        let request = CrossCompileRequest {
            reflect_only: true,
            entry_point: "csmain",
            ..request
        };
        let log = HlslReflector::new().compile(&request).unwrap_err();
        assert!(log.reflection.is_some());
    }

    #[test]
    fn supported_languages()
    {
        assert!(HlslReflector::supports(TargetLanguage::Hlsl));
        assert!(!HlslReflector::supports(TargetLanguage::Glsl));
        assert!(!HlslReflector::supports(TargetLanguage::Vksl));
        assert!(!HlslReflector::supports(TargetLanguage::Msl));
    }
}
