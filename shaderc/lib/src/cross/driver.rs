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

use log::{debug, error, info};

use crate::cross::{CrossCompileRequest, CrossCompileResult, CrossCompileTarget, CrossCompiler};
use crate::cross::reflection::Reflection;
use crate::error::Error;
use crate::targets::Stage;

const ALL_STAGES: [Stage; 6] = [
    Stage::Vertex,
    Stage::Fragment,
    Stage::Geometry,
    Stage::Hull,
    Stage::Domain,
    Stage::Compute
];

/// Cross compiles one stage of an HLSL program.
///
/// The binding cursor is moved past the highest location used by the program so that stages
/// compiled in sequence never share a binding. With `optional` set, a failure is tolerated when
/// the program simply does not declare the entry point of the stage.
pub fn cross_compile<C: CrossCompiler>(compiler: &C, hlsl: &str, stage: Stage, target: CrossCompileTarget,
                                       optional: bool, reflect_only: bool, cursor: &mut u32) -> Result<CrossCompileResult, Error>
{
    let mut source = String::with_capacity(hlsl.len() + 32);
    source.push_str(target.prefix());
    source.push_str(hlsl);
    let request = CrossCompileRequest {
        source,
        stage,
        entry_point: stage.entry_point(),
        target,
        auto_binding: target.is_vulkan(),
        binding_start: *cursor,
        separate_samplers: target.is_vulkan(),
        reflect_only
    };
    debug!("Cross compiling {} stage to {:?} (binding start: {})", stage, target, *cursor);
    match compiler.compile(&request) {
        Ok(result) => {
            if !result.log.is_empty() {
                info!("Cross compiler output for {} stage:\n{}", stage, result.log);
            }
            *cursor = result.reflection.next_binding(*cursor);
            Ok(result)
        },
        Err(mut log) => {
            if optional {
                let missing = log
                    .reflection
                    .as_ref()
                    .map(|v| !v.has_function(stage.entry_point()))
                    .unwrap_or(false);
                if missing {
                    debug!("Program has no {} entry point, skipping", stage.entry_point());
                    let reflection = log.reflection.take().unwrap_or_default();
                    return Ok(CrossCompileResult {
                        source: String::new(),
                        reflection,
                        log
                    });
                }
            }
            error!("Shader cross compilation failed. Log: \n\n{}", log);
            Err(Error::CrossCompile(log.to_string()))
        }
    }
}

/// Reflects an HLSL program and detects the stages it declares an entry point for.
pub fn reflect<C: CrossCompiler>(compiler: &C, hlsl: &str) -> Result<(Vec<Stage>, Reflection), Error>
{
    let mut cursor = 0;
    let result = cross_compile(compiler, hlsl, Stage::Vertex, CrossCompileTarget::Glsl45, true, true, &mut cursor)?;
    let mut stages: Vec<Stage> = result
        .reflection
        .functions
        .iter()
        .filter_map(|v| Stage::from_entry_point(v))
        .collect();
    stages.sort();
    stages.dedup();
    if stages.is_empty() && !result.log.is_empty() {
        error!("Shader cross compilation failed. Log: \n\n{}", result.log);
        return Err(Error::CrossCompile(result.log.to_string()));
    }
    debug!("Detected stages: {:?}", stages);
    Ok((stages, result.reflection))
}

/// Translates every given stage, in pipeline order, sharing one binding cursor.
pub fn compile_stages<C: CrossCompiler>(compiler: &C, hlsl: &str, stages: &[Stage], target: CrossCompileTarget) -> Result<Vec<(Stage, String)>, Error>
{
    let mut cursor = 0;
    let mut sources = Vec::with_capacity(stages.len());
    for stage in ALL_STAGES.iter().filter(|v| stages.contains(v)) {
        let result = cross_compile(compiler, hlsl, *stage, target, false, false, &mut cursor)?;
        sources.push((*stage, result.source));
    }
    Ok(sources)
}

#[cfg(test)]
mod test
{
    use std::sync::Mutex;

    use super::*;
    use crate::cross::compile_log::{CompileLog, Report};
    use crate::cross::reflection::Binding;

    struct Recorder
    {
        requests: Mutex<Vec<(Stage, u32, String)>>,
        functions: Vec<String>,
        fail: bool
    }

    impl Recorder
    {
        fn new(functions: &[&str], fail: bool) -> Recorder
        {
            Recorder {
                requests: Mutex::new(Vec::new()),
                functions: functions.iter().map(|v| v.to_string()).collect(),
                fail
            }
        }
    }

    impl CrossCompiler for Recorder
    {
        fn compile(&self, request: &CrossCompileRequest) -> Result<CrossCompileResult, CompileLog>
        {
            self.requests.lock().unwrap().push((request.stage, request.binding_start, request.source.clone()));
            let mut reflection = Reflection::default();
            reflection.functions = self.functions.clone();
            reflection.textures.push(Binding { ident: "tex".into(), location: request.binding_start + 1 });
            if self.fail || !reflection.has_function(request.entry_point) {
                let mut log = CompileLog::new();
                log.push(Report::error("entry point not found"));
                log.reflection = Some(reflection);
                return Err(log);
            }
            Ok(CrossCompileResult {
                source: format!("// {}", request.stage),
                reflection,
                log: CompileLog::new()
            })
        }
    }

    #[test]
    fn detect_stages()
    {
        let compiler = Recorder::new(&["fsmain", "helper", "vsmain"], false);
        let (stages, _) = reflect(&compiler, "void vsmain() {}").unwrap();
        assert_eq!(stages, vec![Stage::Vertex, Stage::Fragment]);
        let requests = compiler.requests.lock().unwrap();
        assert!(requests[0].2.starts_with("#define OPENGL 1\n"));
    }

    #[test]
    fn optional_entry()
    {
        let compiler = Recorder::new(&["csmain"], false);
        let (stages, _) = reflect(&compiler, "void csmain() {}").unwrap();
        assert_eq!(stages, vec![Stage::Compute]);
    }

    #[test]
    fn no_stage_is_an_error()
    {
        let compiler = Recorder::new(&[], true);
        let err = reflect(&compiler, "").unwrap_err();
        assert!(err.to_string().contains("entry point not found"));
    }

    #[test]
    fn binding_cursor()
    {
        let compiler = Recorder::new(&["vsmain", "fsmain"], false);
        let sources = compile_stages(&compiler, "", &[Stage::Fragment, Stage::Vertex], CrossCompileTarget::Vksl45).unwrap();
        assert_eq!(sources, vec![(Stage::Vertex, "// Vertex".to_string()), (Stage::Fragment, "// Fragment".to_string())]);
        let requests = compiler.requests.lock().unwrap();
        assert_eq!(requests[0].1, 0);
        assert_eq!(requests[1].1, 2);
    }

    #[test]
    fn failure_is_fatal()
    {
        let compiler = Recorder::new(&["vsmain"], true);
        let err = compile_stages(&compiler, "", &[Stage::Vertex], CrossCompileTarget::Glsl41).unwrap_err();
        assert!(matches!(err, Error::CrossCompile(_)));
    }
}
