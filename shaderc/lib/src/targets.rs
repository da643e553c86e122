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

//! Target shading languages and GPU program stages.

use std::fmt::{Display, Formatter};

use phf::phf_map;
use serde::{Deserialize, Serialize};

/// A target language as requested by the user.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TargetLanguage
{
    Hlsl,
    Glsl,
    Vksl,
    Msl
}

static TARGET_LANGUAGES: phf::Map<&'static str, TargetLanguage> = phf_map! {
    "hlsl" => TargetLanguage::Hlsl,
    "glsl" => TargetLanguage::Glsl,
    "vksl" => TargetLanguage::Vksl,
    "msl" => TargetLanguage::Msl
};

impl TargetLanguage
{
    /// Returns a target language from its command line name, None if no such language exists.
    pub fn get(name: &str) -> Option<TargetLanguage>
    {
        TARGET_LANGUAGES.get(name.to_lowercase().as_str()).copied()
    }

    /// List available target languages.
    pub fn list() -> impl Iterator<Item = &'static str>
    {
        TARGET_LANGUAGES.keys().copied()
    }
}

/// The language a technique was built for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Language
{
    Hlsl,
    Glsl,
    Glsl41,
    Vksl,
    Mvksl
}

impl Language
{
    pub fn name(&self) -> &'static str
    {
        match self {
            Language::Hlsl => "hlsl",
            Language::Glsl => "glsl",
            Language::Glsl41 => "glsl4_1",
            Language::Vksl => "vksl",
            Language::Mvksl => "mvksl"
        }
    }
}

impl Display for Language
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        f.write_str(self.name())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage
{
    Vertex,
    Fragment,
    Geometry,
    Hull,
    Domain,
    Compute
}

impl Stage
{
    /// Entry point of this stage in HLSL sources.
    pub fn entry_point(&self) -> &'static str
    {
        match self {
            Stage::Vertex => "vsmain",
            Stage::Fragment => "fsmain",
            Stage::Geometry => "gsmain",
            Stage::Hull => "hsmain",
            Stage::Domain => "dsmain",
            Stage::Compute => "csmain"
        }
    }

    pub fn from_entry_point(name: &str) -> Option<Stage>
    {
        match name {
            "vsmain" => Some(Stage::Vertex),
            "fsmain" => Some(Stage::Fragment),
            "gsmain" => Some(Stage::Geometry),
            "hsmain" => Some(Stage::Hull),
            "dsmain" => Some(Stage::Domain),
            "csmain" => Some(Stage::Compute),
            _ => None
        }
    }

    pub fn name(&self) -> &'static str
    {
        match self {
            Stage::Vertex => "Vertex",
            Stage::Fragment => "Fragment",
            Stage::Geometry => "Geometry",
            Stage::Hull => "Hull",
            Stage::Domain => "Domain",
            Stage::Compute => "Compute"
        }
    }
}

impl Display for Stage
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod test
{
    use super::*;

    #[test]
    fn target_lookup()
    {
        assert_eq!(TargetLanguage::get("HLSL"), Some(TargetLanguage::Hlsl));
        assert_eq!(TargetLanguage::get("msl"), Some(TargetLanguage::Msl));
        assert_eq!(TargetLanguage::get("spirv"), None);
        assert_eq!(TargetLanguage::list().count(), 4);
    }

    #[test]
    fn entry_points()
    {
        for stage in [Stage::Vertex, Stage::Fragment, Stage::Geometry, Stage::Hull, Stage::Domain, Stage::Compute] {
            assert_eq!(Stage::from_entry_point(stage.entry_point()), Some(stage));
        }
        assert_eq!(Stage::from_entry_point("main"), None);
    }
}
