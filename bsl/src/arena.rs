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

//! Index based storage for every AST node of one parse session.

use crate::values::{BlendOp, CompareFunc, CullAndQueue, FillMode, Operand};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId
{
    pub fn index(&self) -> usize
    {
        self.0
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeType
{
    Root,
    Options,
    Shader,
    Mixin,
    SubShader,
    Pass,
    Blend,
    Raster,
    Depth,
    Stencil,
    Target,
    StencilOp,
    BlendDef,
    Tags,
    Code,
    Variations,
    Variation,
    VariationOption,
    Attributes
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OptionType
{
    // Root
    Options,
    Shader,
    Mixin,
    SubShader,

    // Global options
    Separable,
    Sort,
    Priority,
    Transparent,
    Forward,

    // Shader body
    Identifier,
    Include,
    FeatureSet,
    Tags,
    TagValue,
    Variations,
    Variation,
    VariationOption,
    VariationValue,
    Attributes,
    AttrName,
    AttrShow,
    Pass,
    Code,
    Index,

    // Render states
    Blend,
    Raster,
    Depth,
    Stencil,

    // Raster
    FillMode,
    CullMode,
    DepthBias,
    SDepthBias,
    DepthClip,
    Scissor,
    Multisample,
    AALine,

    // Depth
    DepthRead,
    DepthWrite,
    CompareFunc,

    // Stencil
    StencilEnabled,
    StencilReadMask,
    StencilWriteMask,
    StencilOpFront,
    StencilOpBack,
    StencilRef,
    Fail,
    ZFail,
    PassOp,

    // Blend
    AlphaToCoverage,
    IndependantBlend,
    Target,
    Enabled,
    Color,
    Alpha,
    Source,
    Dest,
    Op,
    WriteMask
}

/// Payload of a node option; the variant itself carries the data type.
#[derive(Clone, Debug, PartialEq)]
pub enum Value
{
    Int(i32),
    Float(f32),
    Bool(bool),
    Str(String),
    Node(NodeId),
    FillMode(FillMode),
    CullAndQueue(CullAndQueue),
    CompareFunc(CompareFunc),
    Operand(Operand),
    BlendOp(BlendOp),
    ColorMask(u8)
}

impl Value
{
    pub fn int(&self) -> Option<i32>
    {
        match self {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(*b as i32),
            Value::ColorMask(m) => Some(*m as i32),
            _ => None
        }
    }

    pub fn float(&self) -> Option<f32>
    {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f32),
            _ => None
        }
    }

    pub fn bool(&self) -> Option<bool>
    {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(i) => Some(*i > 0),
            _ => None
        }
    }

    pub fn str(&self) -> Option<&str>
    {
        if let Value::Str(s) = self {
            Some(s)
        } else {
            None
        }
    }

    pub fn node(&self) -> Option<NodeId>
    {
        if let Value::Node(id) = self {
            Some(*id)
        } else {
            None
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeOption
{
    pub otype: OptionType,
    pub value: Value
}

impl NodeOption
{
    pub fn new(otype: OptionType, value: Value) -> Self
    {
        Self { otype, value }
    }
}

#[derive(Clone, Debug)]
pub struct Node
{
    pub ntype: NodeType,
    options: Vec<NodeOption>
}

impl Node
{
    /// Options in storage order, which is the reverse of the order they were written in source
    /// (header options such as the identifier come first).
    pub fn options(&self) -> &[NodeOption]
    {
        &self.options
    }

    pub fn options_in_declaration_order(&self) -> impl DoubleEndedIterator<Item = &NodeOption>
    {
        self.options.iter().rev()
    }

    /// Returns the value of the first option of the given type in storage order.
    pub fn find(&self, otype: OptionType) -> Option<&Value>
    {
        self.options.iter().find(|v| v.otype == otype).map(|v| &v.value)
    }

    pub fn identifier(&self) -> Option<&str>
    {
        self.find(OptionType::Identifier).and_then(|v| v.str())
    }
}

#[derive(Clone, Debug, Default)]
pub struct Arena
{
    nodes: Vec<Node>
}

impl Arena
{
    pub fn new() -> Arena
    {
        Arena { nodes: Vec::new() }
    }

    /// Allocates a node from its header options followed by its body options in declaration
    /// order. The body is stored reversed after the header.
    pub fn alloc(&mut self, ntype: NodeType, header: Vec<NodeOption>, mut body: Vec<NodeOption>) -> NodeId
    {
        let mut options = header;
        body.reverse();
        options.append(&mut body);
        self.nodes.push(Node { ntype, options });
        NodeId(self.nodes.len() - 1)
    }

    /// Appends an option to an existing node; it becomes the first option in declaration order.
    pub fn add_option(&mut self, id: NodeId, option: NodeOption)
    {
        self.nodes[id.0].options.push(option);
    }

    pub fn get(&self, id: NodeId) -> &Node
    {
        &self.nodes[id.0]
    }

    /// Iterates every node in allocation order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node>
    {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize
    {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.nodes.is_empty()
    }

    /// Iterates the child nodes referenced by the given node in storage order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = (OptionType, &Node)>
    {
        self.get(id)
            .options()
            .iter()
            .filter_map(move |v| v.value.node().map(|child| (v.otype, self.get(child))))
    }
}

#[cfg(test)]
mod test
{
    use super::*;

    #[test]
    fn reverse_storage()
    {
        let mut arena = Arena::new();
        let id = arena.alloc(
            NodeType::Pass,
            vec![NodeOption::new(OptionType::Identifier, Value::Str("P".into()))],
            vec![
                NodeOption::new(OptionType::Index, Value::Int(0)),
                NodeOption::new(OptionType::Index, Value::Int(1)),
                NodeOption::new(OptionType::Index, Value::Int(2))
            ]
        );
        let node = arena.get(id);
        let stored: Vec<i32> = node.options().iter().filter_map(|v| v.value.int()).collect();
        assert_eq!(stored, vec![2, 1, 0]);
        let declared: Vec<i32> = node
            .options_in_declaration_order()
            .filter_map(|v| v.value.int())
            .collect();
        assert_eq!(declared, vec![0, 1, 2]);
        assert_eq!(node.identifier(), Some("P"));
        assert_eq!(node.options_in_declaration_order().last().map(|v| v.otype), Some(OptionType::Identifier));
    }

    #[test]
    fn children()
    {
        let mut arena = Arena::new();
        let code = arena.alloc(NodeType::Code, Vec::new(), vec![NodeOption::new(OptionType::Index, Value::Int(0))]);
        let pass = arena.alloc(NodeType::Pass, Vec::new(), vec![NodeOption::new(OptionType::Code, Value::Node(code))]);
        let children: Vec<NodeType> = arena.children(pass).map(|(_, n)| n.ntype).collect();
        assert_eq!(children, vec![NodeType::Code]);
        assert_eq!(arena.len(), 2);
    }
}
