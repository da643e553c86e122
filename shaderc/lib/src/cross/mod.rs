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

//! Contract of the external cross compiler and the driver built on top of it.

mod builtin;
pub mod compile_log;
mod driver;
pub mod reflection;

pub use builtin::HlslReflector;
pub use driver::*;

use crate::targets::Stage;
use self::compile_log::CompileLog;
use self::reflection::Reflection;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CrossCompileTarget
{
    Glsl41,
    Glsl45,
    Vksl45,
    Mvksl
}

impl CrossCompileTarget
{
    /// Define line prepended to the HLSL source before it is handed to the compiler.
    pub fn prefix(&self) -> &'static str
    {
        match self {
            CrossCompileTarget::Glsl41 | CrossCompileTarget::Glsl45 => "#define OPENGL 1\n",
            CrossCompileTarget::Vksl45 => "#define VULKAN 1\n",
            CrossCompileTarget::Mvksl => "#define METAL 1\n"
        }
    }

    pub fn is_vulkan(&self) -> bool
    {
        matches!(self, CrossCompileTarget::Vksl45 | CrossCompileTarget::Mvksl)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CrossCompileRequest
{
    pub source: String,
    pub stage: Stage,
    pub entry_point: &'static str,
    pub target: CrossCompileTarget,
    pub auto_binding: bool,
    pub binding_start: u32,
    pub separate_samplers: bool,
    /// Set when only the reflection report is wanted.
    pub reflect_only: bool
}

#[derive(Clone, Debug, PartialEq)]
pub struct CrossCompileResult
{
    pub source: String,
    pub reflection: Reflection,
    pub log: CompileLog
}

/// Translates HLSL into another shading language and reports what the program binds.
pub trait CrossCompiler: Sync
{
    fn compile(&self, request: &CrossCompileRequest) -> Result<CrossCompileResult, CompileLog>;
}

impl<'a, T: CrossCompiler + ?Sized> CrossCompiler for &'a T
{
    fn compile(&self, request: &CrossCompileRequest) -> Result<CrossCompileResult, CompileLog>
    {
        (**self).compile(request)
    }
}
