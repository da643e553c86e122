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

//! First compilation pass: collects shader, mixin and sub-shader declarations so that mixins may
//! be referenced before they are declared.

use bp3d_bsl::{
    arena::{Node, NodeId, NodeType, OptionType, Value},
    Ast
};
use log::debug;

use crate::error::Error;
use crate::shader::{ShaderOptions, VariationParamInfo, VariationParamValue};
use crate::states::queue_sort_type;
use crate::variation::{VariationData, VariationOption};

pub const LANGUAGE_ANY: &str = "Any";

#[derive(Clone, Debug, PartialEq)]
pub struct ShaderMetaData
{
    pub name: String,
    /// Names of the mixins this shader includes, in declaration order.
    pub includes: Vec<String>,
    pub is_mixin: bool,
    pub language: String,
    pub tags: Vec<String>,
    pub variations: Vec<VariationData>
}

#[derive(Clone, Debug)]
pub struct ShaderEntry
{
    pub node: NodeId,
    pub meta: ShaderMetaData
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubShaderData
{
    pub name: String,
    pub code_index: usize
}

#[derive(Clone, Debug, Default)]
pub struct MetaData
{
    pub options: ShaderOptions,
    pub shaders: Vec<ShaderEntry>,
    pub sub_shaders: Vec<SubShaderData>
}

fn parse_options(node: &Node, options: &mut ShaderOptions)
{
    for option in node.options_in_declaration_order() {
        match (option.otype, &option.value) {
            (OptionType::Separable, v) => options.separable_passes = v.bool().unwrap_or(false),
            (OptionType::Sort, Value::CullAndQueue(v)) => options.sort = queue_sort_type(*v),
            (OptionType::Priority, v) => options.priority = v.int().unwrap_or(0),
            (OptionType::Transparent, v) => options.transparent = v.bool().unwrap_or(false),
            (OptionType::Forward, v) => options.forward = v.bool().unwrap_or(false),
            _ => ()
        }
    }
}

/// Returns the value of every `name` attribute and whether a `show` attribute is present.
pub fn parse_attributes(ast: &Ast, node: &Node) -> (Option<String>, bool)
{
    let mut name = None;
    let mut show = false;
    for option in node.options_in_declaration_order() {
        if option.otype != OptionType::Attributes {
            continue;
        }
        if let Some(id) = option.value.node() {
            for attr in ast.get(id).options_in_declaration_order() {
                match attr.otype {
                    OptionType::AttrName => name = attr.value.str().map(String::from),
                    OptionType::AttrShow => show = true,
                    _ => ()
                }
            }
        }
    }
    (name, show)
}

fn parse_variation(ast: &Ast, node: &Node) -> Option<VariationData>
{
    let identifier = node.identifier().filter(|v| !v.is_empty())?;
    let mut data = VariationData::new(identifier);
    let (name, show) = parse_attributes(ast, node);
    if let Some(name) = name {
        data.name = name;
    }
    data.internal = !show;
    for option in node.options_in_declaration_order() {
        if option.otype != OptionType::VariationOption {
            continue;
        }
        if let Some(id) = option.value.node() {
            let opt = ast.get(id);
            data.values.push(VariationOption {
                name: parse_attributes(ast, opt).0.unwrap_or_default(),
                value: opt.find(OptionType::VariationValue).and_then(|v| v.int()).unwrap_or(0)
            });
        }
    }
    Some(data)
}

fn parse_shader_meta_data(ast: &Ast, node: &Node) -> ShaderMetaData
{
    let mut meta = ShaderMetaData {
        name: node.identifier().unwrap_or_default().into(),
        includes: Vec::new(),
        is_mixin: node.ntype == NodeType::Mixin,
        language: "hlsl".into(),
        tags: Vec::new(),
        variations: Vec::new()
    };
    for option in node.options_in_declaration_order() {
        match option.otype {
            OptionType::Include => {
                if let Some(name) = option.value.str() {
                    meta.includes.push(name.into());
                }
            },
            OptionType::Tags => {
                if let Some(id) = option.value.node() {
                    meta.tags.extend(
                        ast.get(id)
                            .options_in_declaration_order()
                            .filter(|v| v.otype == OptionType::TagValue)
                            .filter_map(|v| v.value.str().map(String::from))
                    );
                }
            },
            OptionType::Variations => {
                if let Some(id) = option.value.node() {
                    for variation in ast.get(id).options_in_declaration_order() {
                        if let Some(data) = variation.value.node().and_then(|v| parse_variation(ast, ast.get(v))) {
                            meta.variations.push(data);
                        }
                    }
                }
            },
            _ => ()
        }
    }
    meta
}

/// Scans the root of a syntax tree for global options, shaders, mixins and sub-shaders.
pub fn parse_metadata(ast: &Ast) -> MetaData
{
    let mut data = MetaData::default();
    for option in ast.root().options_in_declaration_order() {
        let id = match option.value.node() {
            Some(v) => v,
            None => continue
        };
        let node = ast.get(id);
        match option.otype {
            OptionType::Options => parse_options(node, &mut data.options),
            OptionType::Shader | OptionType::Mixin => {
                let meta = parse_shader_meta_data(ast, node);
                debug!("Found {} '{}'", if meta.is_mixin { "mixin" } else { "shader" }, meta.name);
                data.shaders.push(ShaderEntry { node: id, meta });
            },
            OptionType::SubShader => data.sub_shaders.push(SubShaderData {
                name: node.identifier().unwrap_or_default().into(),
                code_index: node.find(OptionType::Index).and_then(|v| v.int()).unwrap_or(0) as usize
            }),
            _ => ()
        }
    }
    data
}

/// Returns the index of the last declared mixin with the given name usable from `language`.
pub fn find_mixin(shaders: &[ShaderEntry], name: &str, language: &str) -> Option<usize>
{
    shaders
        .iter()
        .enumerate()
        .filter(|(_, v)| v.meta.is_mixin && v.meta.name == name)
        .filter(|(_, v)| v.meta.language == language || v.meta.language == LANGUAGE_ANY)
        .map(|(i, _)| i)
        .last()
}

fn inherit_variations(
    shaders: &[ShaderEntry],
    meta: &ShaderMetaData,
    visited: &mut [bool],
    out: &mut Vec<VariationData>
) -> Result<(), Error>
{
    for include in &meta.includes {
        let index = find_mixin(shaders, include, &meta.language).ok_or_else(|| Error::MixinNotFound(include.clone()))?;
        if visited[index] {
            continue;
        }
        visited[index] = true;
        let mixin = &shaders[index].meta;
        inherit_variations(shaders, mixin, visited, out)?;
        out.extend(mixin.variations.iter().cloned());
    }
    Ok(())
}

/// Appends the variations of every directly or transitively included mixin to each non-mixin
/// shader. A mixin reachable through several paths is merged once.
pub fn populate_variations(shaders: &mut [ShaderEntry]) -> Result<(), Error>
{
    for i in 0..shaders.len() {
        if shaders[i].meta.is_mixin {
            continue;
        }
        let mut visited = vec![false; shaders.len()];
        let mut inherited = Vec::new();
        inherit_variations(shaders, &shaders[i].meta, &mut visited, &mut inherited)?;
        shaders[i].meta.variations.extend(inherited);
    }
    Ok(())
}

pub fn variation_params(meta: &ShaderMetaData) -> impl Iterator<Item = VariationParamInfo> + '_
{
    meta.variations.iter().map(|v| VariationParamInfo {
        identifier: v.identifier.clone(),
        name: v.name.clone(),
        is_internal: v.internal,
        values: v
            .values
            .iter()
            .map(|v| VariationParamValue {
                name: v.name.clone(),
                value: v.value
            })
            .collect()
    })
}

#[cfg(test)]
mod test
{
    use std::collections::BTreeMap;

    use bp3d_bsl::include::NoIncludes;

    use super::*;
    use crate::states::QueueSortType;

    fn metadata(source: &str) -> MetaData
    {
        let ast = bp3d_bsl::parse(source, &BTreeMap::new(), &NoIncludes).unwrap();
        parse_metadata(&ast)
    }

    #[test]
    fn options_and_structure()
    {
        let data = metadata("
            options { separable = true; sort = backtofront; priority = 3; forward = false; };
            shader Test { mixin A; tags = { \"forward\", \"deferred\" }; };
            mixin A { };
            subshader Ext { void f() {} }
        ");
        assert!(data.options.separable_passes);
        assert_eq!(data.options.sort, QueueSortType::BackToFront);
        assert_eq!(data.options.priority, 3);
        assert!(!data.options.forward);
        assert_eq!(data.shaders.len(), 2);
        assert_eq!(data.shaders[0].meta.name, "Test");
        assert_eq!(data.shaders[0].meta.includes, vec!["A".to_string()]);
        assert_eq!(data.shaders[0].meta.tags, vec!["forward".to_string(), "deferred".to_string()]);
        assert!(data.shaders[1].meta.is_mixin);
        assert_eq!(data.sub_shaders, vec![SubShaderData { name: "Ext".into(), code_index: 0 }]);
    }

    #[test]
    fn variation_attributes()
    {
        let data = metadata("
            shader Test {
                variations {
                    [name(\"Quality\"), show]
                    QUALITY = { [name(\"Low\")] 0, [name(\"High\")] 1 };
                    HIDDEN { };
                };
            };
        ");
        let variations = &data.shaders[0].meta.variations;
        assert_eq!(variations.len(), 2);
        assert_eq!(variations[0].identifier, "QUALITY");
        assert_eq!(variations[0].name, "Quality");
        assert!(!variations[0].internal);
        assert_eq!(variations[0].values[1], VariationOption { name: "High".into(), value: 1 });
        assert!(variations[1].internal);
        assert!(variations[1].values.is_empty());
    }

    #[test]
    fn inherited_variations()
    {
        let mut data = metadata("
            shader Test { mixin B; mixin C; variations { OWN { }; }; };
            mixin A { variations { FROM_A { }; }; };
            mixin B { mixin A; variations { FROM_B { }; }; };
            mixin C { mixin A; variations { FROM_C { }; }; };
        ");
        populate_variations(&mut data.shaders).unwrap();
        let names: Vec<&str> = data.shaders[0].meta.variations.iter().map(|v| &*v.identifier).collect();
        assert_eq!(names, vec!["OWN", "FROM_A", "FROM_B", "FROM_C"]);
    }

    #[test]
    fn last_mixin_wins()
    {
        let mut data = metadata("
            mixin Common { variations { FIRST { }; }; };
            mixin Common { variations { SECOND { }; }; };
            shader Test { mixin Common; };
        ");
        populate_variations(&mut data.shaders).unwrap();
        assert_eq!(find_mixin(&data.shaders, "Common", "hlsl"), Some(1));
        assert_eq!(data.shaders[2].meta.variations[0].identifier, "SECOND");
        assert_eq!(data.shaders[2].meta.variations.len(), 1);
    }

    #[test]
    fn missing_mixin()
    {
        let mut data = metadata("shader Test { mixin Nope; };");
        let err = populate_variations(&mut data.shaders).unwrap_err();
        assert_eq!(err.to_string(), "Mixin \"Nope\" cannot be found.");
    }
}
