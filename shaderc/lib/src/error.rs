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

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error
{
    #[error("syntax error: {0}")]
    Syntax(bp3d_bsl::Error),
    #[error("Mixin \"{0}\" cannot be found.")]
    MixinNotFound(String),
    #[error("Shader cross compilation failed. Log: \n\n{0}")]
    CrossCompile(String),
    #[error("Failed compiling GPU program(s): {0}")]
    GpuProgram(String),
    #[error("parameter '{name}' redeclared with a different {what} ({first} -> {second})")]
    ParameterMismatch
    {
        name: String,
        what: &'static str,
        first: String,
        second: String
    },
    #[error("failed to resolve extension point '{name}': {msg}")]
    Extension
    {
        name: String,
        msg: String
    },
    #[error("a compiler worker thread has panicked")]
    WorkerPanic
}

impl From<bp3d_bsl::Error> for Error
{
    fn from(e: bp3d_bsl::Error) -> Self
    {
        Error::Syntax(e)
    }
}
