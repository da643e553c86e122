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

//! Strips BSL specific annotations from HLSL so that it can be handed to the HLSL backend.

use std::borrow::Cow;

use regex::Regex;

pub struct HlslCleaner
{
    attributes: Regex,
    editor_attributes: Regex,
    texture_defaults: Regex,
    warp_sync: Regex,
    warp: Regex
}

impl HlslCleaner
{
    pub fn new() -> HlslCleaner
    {
        HlslCleaner {
            attributes: Regex::new(
                r"\[\s*layout\s*\(.*\)\s*\]|\[\s*internal\s*\]|\[\s*color\s*\]|\[\s*alias\s*\(.*\)\s*\]|\[\s*spriteuv\s*\(.*\)\s*\]"
            )
            .unwrap(),
            editor_attributes: Regex::new(r#"\[\s*hideInInspector\s*\]|\[\s*name\s*\(".*"\)\s*\]|\[\s*hdr\s*\]"#).unwrap(),
            texture_defaults: Regex::new(r"Texture2D\s*(\S*)\s*=.*;").unwrap(),
            warp_sync: Regex::new(r"Warp(Group|Device|All)MemoryBarrierWithWarpSync").unwrap(),
            warp: Regex::new(r"Warp(Group|Device|All)MemoryBarrier").unwrap()
        }
    }

    pub fn clean(&self, code: &str) -> String
    {
        let code = self.attributes.replace_all(code, "");
        let code = self.editor_attributes.replace_all(&code, "");
        let code = self.texture_defaults.replace_all(&code, "Texture2D $1;");
        let code = self.warp_sync.replace_all(&code, "${1}MemoryBarrierWithGroupSync");
        let code: Cow<str> = self.warp.replace_all(&code, "${1}MemoryBarrier");
        code.into_owned()
    }
}

impl Default for HlslCleaner
{
    fn default() -> Self
    {
        Self::new()
    }
}

#[cfg(test)]
mod test
{
    use super::*;

    #[test]
    fn strip_attributes()
    {
        let cleaner = HlslCleaner::new();
        let code = "[internal]\ncbuffer Params { [color] float4 tint; [name(\"Roughness\")] [hdr] float r; };\n\
                    [alias(gAlbedoSamp)]\nSamplerState gSamp;\n[layout(rgba8)]\nRWTexture2D<float4> gOut;";
        let res = cleaner.clean(code);
        assert_eq!(
            res,
            "\ncbuffer Params {  float4 tint;   float r; };\n\nSamplerState gSamp;\n\nRWTexture2D<float4> gOut;"
        );
    }

    #[test]
    fn texture_defaults()
    {
        let cleaner = HlslCleaner::new();
        assert_eq!(cleaner.clean("Texture2D gAlbedo = white;"), "Texture2D gAlbedo;");
        assert_eq!(cleaner.clean("[hideInInspector] Texture2D gNormal = normal;"), " Texture2D gNormal;");
    }

    #[test]
    fn warp_barriers()
    {
        let cleaner = HlslCleaner::new();
        assert_eq!(cleaner.clean("WarpGroupMemoryBarrierWithWarpSync();"), "GroupMemoryBarrierWithGroupSync();");
        assert_eq!(cleaner.clean("WarpAllMemoryBarrier();"), "AllMemoryBarrier();");
        assert_eq!(cleaner.clean("DeviceMemoryBarrier();"), "DeviceMemoryBarrier();");
    }
}
