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

//! Lookup of `#include` targets by name.

use std::collections::HashMap;

/// Handle to an include whose content may still be loading.
pub trait IncludeHandle
{
    /// Blocks the calling thread until the content is available. The default implementation
    /// assumes the content is already loaded.
    fn block_until_loaded(&mut self) {}

    /// Returns the include content or None if it failed to load.
    fn get_text(&self) -> Option<&str>;
}

pub trait IncludeResolver
{
    type Handle: IncludeHandle;

    fn find_include(&self, name: &str) -> Option<Self::Handle>;
}

impl<'a, T: IncludeResolver + ?Sized> IncludeResolver for &'a T
{
    type Handle = T::Handle;

    fn find_include(&self, name: &str) -> Option<Self::Handle>
    {
        (**self).find_include(name)
    }
}

impl IncludeHandle for String
{
    fn get_text(&self) -> Option<&str>
    {
        Some(self)
    }
}

/// A resolver which never finds anything.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoIncludes;

impl IncludeResolver for NoIncludes
{
    type Handle = String;

    fn find_include(&self, _: &str) -> Option<String>
    {
        None
    }
}

/// In-memory name to text registry.
#[derive(Clone, Debug, Default)]
pub struct MemoryIncludes
{
    files: HashMap<String, String>
}

impl MemoryIncludes
{
    pub fn new() -> MemoryIncludes
    {
        MemoryIncludes {
            files: HashMap::new()
        }
    }

    pub fn insert<N: Into<String>, T: Into<String>>(&mut self, name: N, text: T) -> &mut Self
    {
        self.files.insert(name.into(), text.into());
        self
    }
}

impl IncludeResolver for MemoryIncludes
{
    type Handle = String;

    fn find_include(&self, name: &str) -> Option<String>
    {
        self.files.get(name).cloned()
    }
}
