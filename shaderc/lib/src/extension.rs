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

//! Sub-shader extension points.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt::Display;

/// A shader which completes an extension point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionShader
{
    pub name: String,
    pub source: String,
    pub defines: BTreeMap<String, String>
}

/// Source of the shaders implementing each named extension point.
pub trait ExtensionPoints: Sync
{
    type Error: Display;

    fn find(&self, name: &str) -> Result<Vec<ExtensionShader>, Self::Error>;
}

impl<'a, T: ExtensionPoints + ?Sized> ExtensionPoints for &'a T
{
    type Error = T::Error;

    fn find(&self, name: &str) -> Result<Vec<ExtensionShader>, Self::Error>
    {
        (**self).find(name)
    }
}

/// No extension point is ever implemented; every sub-shader is dropped.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoExtensions;

impl ExtensionPoints for NoExtensions
{
    type Error = Infallible;

    fn find(&self, _: &str) -> Result<Vec<ExtensionShader>, Infallible>
    {
        Ok(Vec::new())
    }
}

/// In-memory extension point registry.
#[derive(Clone, Debug, Default)]
pub struct MemoryExtensions
{
    points: BTreeMap<String, Vec<ExtensionShader>>
}

impl MemoryExtensions
{
    pub fn new() -> MemoryExtensions
    {
        MemoryExtensions::default()
    }

    pub fn insert<T: Into<String>>(&mut self, point: T, shader: ExtensionShader) -> &mut Self
    {
        self.points.entry(point.into()).or_default().push(shader);
        self
    }
}

impl ExtensionPoints for MemoryExtensions
{
    type Error = Infallible;

    fn find(&self, name: &str) -> Result<Vec<ExtensionShader>, Infallible>
    {
        Ok(self.points.get(name).cloned().unwrap_or_default())
    }
}
