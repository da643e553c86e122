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

//! Backend verification of the generated GPU programs.

use std::fmt::Write;

use log::{debug, info};

use crate::error::Error;
use crate::shader::{GpuProgramDesc, Technique};

/// A graphics backend able to compile a GPU program and report its status.
pub trait GpuProgramVerifier: Sync
{
    /// Compiles the program, blocking until the backend is done.
    fn verify(&self, program: &GpuProgramDesc) -> Result<(), String>;
}

impl<'a, T: GpuProgramVerifier + ?Sized> GpuProgramVerifier for &'a T
{
    fn verify(&self, program: &GpuProgramDesc) -> Result<(), String>
    {
        (**self).verify(program)
    }
}

/// Checks every program of every technique; all failures are reported together.
pub fn verify_techniques<V: GpuProgramVerifier>(verifier: &V, techniques: &[Technique]) -> Result<(), Error>
{
    info!("Verifying GPU programs of {} technique(s)", techniques.len());
    let mut errors = String::new();
    for technique in techniques {
        for program in technique.passes.iter().flat_map(|v| v.programs.iter()) {
            debug!("Verifying {} program ({})", program.stage, program.language);
            if let Err(msg) = verifier.verify(program) {
                // SAFETY: writing to a String cannot fail.
                writeln!(errors, "{} program: {}", program.stage, msg).unwrap();
            }
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::GpuProgram(errors))
    }
}

#[cfg(test)]
mod test
{
    use super::*;
    use crate::shader::Pass;
    use crate::targets::{Language, Stage};
    use crate::variation::ShaderVariation;

    struct RejectCompute;

    impl GpuProgramVerifier for RejectCompute
    {
        fn verify(&self, program: &GpuProgramDesc) -> Result<(), String>
        {
            match program.stage {
                Stage::Compute => Err(format!("'{}' is not supported", program.entry_point)),
                _ => Ok(())
            }
        }
    }

    fn technique(stages: &[Stage]) -> Technique
    {
        let pass = Pass {
            blend: Default::default(),
            rasterizer: Default::default(),
            depth_stencil: Default::default(),
            blend_is_default: true,
            rasterizer_is_default: true,
            depth_stencil_is_default: true,
            stencil_ref: 0,
            programs: stages
                .iter()
                .map(|stage| GpuProgramDesc {
                    stage: *stage,
                    language: Language::Hlsl,
                    entry_point: stage.entry_point().into(),
                    source: String::new()
                })
                .collect()
        };
        Technique {
            language: Language::Hlsl,
            tags: Vec::new(),
            variation: ShaderVariation::new(),
            passes: vec![pass]
        }
    }

    #[test]
    fn aggregate()
    {
        let techniques = vec![technique(&[Stage::Vertex, Stage::Compute]), technique(&[Stage::Compute])];
        let err = verify_techniques(&RejectCompute, &techniques).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed compiling GPU program(s): Compute program: 'csmain' is not supported\nCompute program: 'csmain' is not supported\n"
        );
        assert!(verify_techniques(&RejectCompute, &[technique(&[Stage::Vertex])]).is_ok());
    }
}
