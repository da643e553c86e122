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

use std::collections::BTreeMap;

use bp3d_bsl::{include::IncludeResolver, lexer::state::CodeBlockKind, Ast};
use bp3d_threads::{ScopedThreadManager, ThreadPool};
use log::{debug, info, warn};

use crate::config::Config;
use crate::cross::reflection::Reflection;
use crate::cross::{compile_stages, reflect, CrossCompileTarget, CrossCompiler};
use crate::error::Error;
use crate::extension::ExtensionPoints;
use crate::hlsl::HlslCleaner;
use crate::metadata::{find_mixin, parse_metadata, populate_variations, variation_params, ShaderEntry, ShaderMetaData};
use crate::params::ShaderParams;
use crate::pass::{parse_shader, PassData, ShaderData};
use crate::reflect::parse_parameters;
use crate::shader::{GpuProgramDesc, Pass, Shader, SubShader, Technique};
use crate::targets::{Language, TargetLanguage};
use crate::variation::{expand, ShaderVariation};
use crate::verify::{verify_techniques, GpuProgramVerifier};

/// Techniques and reflection reports produced by the parse of one variation.
struct VariationOutput
{
    techniques: Vec<Technique>,
    reflections: Vec<Reflection>,
    includes: Vec<String>
}

fn push_unique(list: &mut Vec<String>, items: impl IntoIterator<Item = String>)
{
    for item in items {
        if !list.contains(&item) {
            list.push(item);
        }
    }
}

fn parse_inherited(
    ast: &Ast,
    shaders: &[ShaderEntry],
    meta: &ShaderMetaData,
    visited: &mut [bool],
    data: &mut ShaderData
) -> Result<(), Error>
{
    for include in &meta.includes {
        let index = find_mixin(shaders, include, &meta.language).ok_or_else(|| Error::MixinNotFound(include.clone()))?;
        if visited[index] {
            continue;
        }
        visited[index] = true;
        let mixin = &shaders[index];
        parse_inherited(ast, shaders, &mixin.meta, visited, data)?;
        debug!("Merging mixin '{}' into shader '{}'", mixin.meta.name, meta.name);
        parse_shader(ast, ast.get(mixin.node), data);
    }
    Ok(())
}

fn make_pass(data: &PassData, programs: Vec<GpuProgramDesc>) -> Pass
{
    Pass {
        blend: data.blend,
        rasterizer: data.rasterizer,
        depth_stencil: data.depth_stencil,
        blend_is_default: data.blend_is_default,
        rasterizer_is_default: data.rasterizer_is_default,
        depth_stencil_is_default: data.depth_stencil_is_default,
        stencil_ref: data.stencil_ref,
        programs
    }
}

/// The BSL shader compiler.
///
/// The compiler owns its collaborators: an include resolver for `#include` directives, a cross
/// compiler used for reflection and non-HLSL languages, and the registry of shaders completing
/// sub-shader extension points. A GPU program verifier may be attached with `with_verifier`.
pub struct Compiler<'a, R, C, E>
{
    config: &'a Config,
    resolver: R,
    cross: C,
    extensions: E,
    verifier: Option<&'a dyn GpuProgramVerifier>,
    cleaner: HlslCleaner
}

impl<'a, R: IncludeResolver + Sync, C: CrossCompiler, E: ExtensionPoints> Compiler<'a, R, C, E>
{
    pub fn new(config: &'a Config, resolver: R, cross: C, extensions: E) -> Compiler<'a, R, C, E>
    {
        Compiler {
            config,
            resolver,
            cross,
            extensions,
            verifier: None,
            cleaner: HlslCleaner::new()
        }
    }

    pub fn with_verifier(mut self, verifier: &'a dyn GpuProgramVerifier) -> Self
    {
        self.verifier = Some(verifier);
        self
    }

    /// Compiles a BSL source into a shader asset named `name`.
    pub fn compile(&self, name: &str, source: &str) -> Result<Shader, Error>
    {
        self.compile_with_defines(name, source, &self.config.defines)
    }

    fn compile_with_defines(&self, name: &str, source: &str, defines: &BTreeMap<String, String>) -> Result<Shader, Error>
    {
        info!("Parsing shader '{}'...", name);
        let ast = bp3d_bsl::parse(source, defines, &self.resolver)?;
        info!("Resolving shader metadata...");
        let mut meta = parse_metadata(&ast);
        populate_variations(&mut meta.shaders)?;
        let shaders: Vec<&ShaderEntry> = meta.shaders.iter().filter(|v| !v.meta.is_mixin).collect();
        let variation_params = shaders.iter().flat_map(|v| variation_params(&v.meta)).collect();
        info!("Expanding variations...");
        let mut jobs = Vec::new();
        for entry in &shaders {
            let variations = expand(&entry.meta.variations);
            debug!("Shader '{}' has {} variation(s)", entry.meta.name, variations.len());
            jobs.extend(variations.into_iter().map(|v| (entry.meta.name.clone(), v)));
        }
        info!("Compiling {} variation(s)...", jobs.len());
        let outputs = self.run_variations(source, defines, &jobs)?;
        info!("Assembling shader '{}'...", name);
        let mut shader = Shader {
            name: name.into(),
            options: meta.options.clone(),
            techniques: Vec::new(),
            params: ShaderParams::new(),
            variation_params,
            sub_shaders: Vec::new(),
            includes: Vec::new()
        };
        for output in outputs {
            for reflection in &output.reflections {
                parse_parameters(reflection, &mut shader.params, self.config.strict_params)?;
            }
            shader.techniques.extend(output.techniques);
            push_unique(&mut shader.includes, output.includes);
        }
        if let (true, Some(verifier)) = (self.config.verify, self.verifier) {
            verify_techniques(&verifier, &shader.techniques)?;
        }
        for sub in &meta.sub_shaders {
            let raw = match ast.code(CodeBlockKind::SubShader, sub.code_index) {
                Some(v) => v,
                None => {
                    warn!("Sub-shader '{}' has no code block, skipping", sub.name);
                    continue;
                }
            };
            let points = self.extensions.find(&sub.name).map_err(|e| Error::Extension {
                name: sub.name.clone(),
                msg: e.to_string()
            })?;
            for point in points {
                info!("Compiling sub-shader '{}' for extension point '{}'...", point.name, sub.name);
                let source = format!("{}\n{}", point.source, raw);
                let compiled = self.compile_with_defines(&point.name, &source, &point.defines)?;
                shader.sub_shaders.push(SubShader {
                    shader: Shader {
                        name: point.name.clone(),
                        options: Default::default(),
                        techniques: compiled.techniques,
                        params: ShaderParams::new(),
                        variation_params: Vec::new(),
                        sub_shaders: Vec::new(),
                        includes: Vec::new()
                    },
                    name: point.name
                });
            }
        }
        Ok(shader)
    }

    fn run_variations(&self, source: &str, defines: &BTreeMap<String, String>, jobs: &[(String, ShaderVariation)]) -> Result<Vec<VariationOutput>, Error>
    {
        let n_threads = self.config.n_threads;
        if n_threads <= 1 || jobs.len() <= 1 {
            return jobs
                .iter()
                .map(|(name, variation)| self.compile_variation(name, source, defines, variation))
                .collect();
        }
        let results: Result<Vec<(usize, VariationOutput)>, Error> = crossbeam::scope(|scope| {
            let manager = ScopedThreadManager::new(scope);
            let mut pool: ThreadPool<ScopedThreadManager, Result<(usize, VariationOutput), Error>> = ThreadPool::new(n_threads);
            info!("Initialized thread pool with {} max thread(s)", n_threads);
            for (index, (name, variation)) in jobs.iter().enumerate() {
                pool.send(&manager, move |_| {
                    self.compile_variation(name, source, defines, variation).map(|v| (index, v))
                });
                debug!("Dispatch variation {} of shader '{}'", index, name);
            }
            pool.reduce().map(|v| v.unwrap_or_else(|_| Err(Error::WorkerPanic))).collect()
        })
        .unwrap_or_else(|_| Err(Error::WorkerPanic));
        let mut results = results?;
        // Workers finish in any order; registration must follow variation order.
        results.sort_by_key(|(index, _)| *index);
        Ok(results.into_iter().map(|(_, v)| v).collect())
    }

    fn compile_variation(&self, name: &str, source: &str, defines: &BTreeMap<String, String>, variation: &ShaderVariation) -> Result<VariationOutput, Error>
    {
        let ast = bp3d_bsl::parse(source, &variation.defines(defines), &self.resolver)?;
        let meta = parse_metadata(&ast);
        let mut output = VariationOutput {
            techniques: Vec::new(),
            reflections: Vec::new(),
            includes: ast.includes.clone()
        };
        for entry in meta.shaders.iter().filter(|v| !v.meta.is_mixin && v.meta.name == name) {
            let mut data = ShaderData::default();
            let mut visited = vec![false; meta.shaders.len()];
            parse_inherited(&ast, &meta.shaders, &entry.meta, &mut visited, &mut data)?;
            parse_shader(&ast, ast.get(entry.node), &mut data);
            self.build_techniques(&entry.meta, &data, variation, &mut output)?;
        }
        Ok(output)
    }

    fn build_techniques(&self, meta: &ShaderMetaData, data: &ShaderData, variation: &ShaderVariation, output: &mut VariationOutput) -> Result<(), Error>
    {
        let glsl = match data.feature_set.as_deref() {
            Some("HighEnd") => (Language::Glsl, CrossCompileTarget::Glsl45),
            _ => (Language::Glsl41, CrossCompileTarget::Glsl41)
        };
        let mut targets: Vec<(Language, Option<CrossCompileTarget>)> = Vec::new();
        for language in &self.config.languages {
            match language {
                TargetLanguage::Hlsl => targets.push((Language::Hlsl, None)),
                TargetLanguage::Glsl => targets.push((glsl.0, Some(glsl.1))),
                TargetLanguage::Vksl => targets.push((Language::Vksl, Some(CrossCompileTarget::Vksl45))),
                TargetLanguage::Msl => targets.push((Language::Mvksl, Some(CrossCompileTarget::Mvksl)))
            }
        }
        let mut techniques: Vec<Technique> = targets
            .iter()
            .map(|(language, _)| Technique {
                language: *language,
                tags: meta.tags.clone(),
                variation: variation.clone(),
                passes: Vec::new()
            })
            .collect();
        let mut passes: Vec<&PassData> = data.passes.iter().collect();
        passes.sort_by_key(|v| v.seq_idx);
        for pass in passes {
            let stages = if pass.code.trim().is_empty() {
                debug!("Pass {} of shader '{}' has no code", pass.seq_idx, meta.name);
                Vec::new()
            } else {
                let (stages, reflection) = reflect(&self.cross, &pass.code)?;
                output.reflections.push(reflection);
                stages
            };
            for (technique, (language, target)) in techniques.iter_mut().zip(targets.iter()) {
                let programs = match target {
                    None => {
                        let code = self.cleaner.clean(&pass.code);
                        stages
                            .iter()
                            .map(|stage| GpuProgramDesc {
                                stage: *stage,
                                language: *language,
                                entry_point: stage.entry_point().into(),
                                source: code.clone()
                            })
                            .collect()
                    },
                    Some(target) => compile_stages(&self.cross, &pass.code, &stages, *target)?
                        .into_iter()
                        .map(|(stage, source)| GpuProgramDesc {
                            stage,
                            language: *language,
                            entry_point: "main".into(),
                            source
                        })
                        .collect()
                };
                technique.passes.push(make_pass(pass, programs));
            }
        }
        output.techniques.extend(techniques.into_iter().filter(|v| !v.passes.is_empty()));
        Ok(())
    }
}

#[cfg(test)]
mod test
{
    use std::collections::BTreeSet;

    use bp3d_bsl::include::{MemoryIncludes, NoIncludes};

    use super::*;
    use crate::cross::compile_log::CompileLog;
    use crate::cross::{CrossCompileRequest, CrossCompileResult, HlslReflector};
    use crate::extension::{ExtensionShader, MemoryExtensions, NoExtensions};
    use crate::states::{BlendFactor, BlendOperation, CullingMode};
    use crate::targets::Stage;

    const PROGRAM: &str = "float4 vsmain() : SV_Position { return 0; } float4 fsmain() : SV_Target { return 1; }";

    /// Reflects through the regex reflector and pretends to translate everything else.
    struct Scripted;

    impl CrossCompiler for Scripted
    {
        fn compile(&self, request: &CrossCompileRequest) -> Result<CrossCompileResult, CompileLog>
        {
            if request.reflect_only {
                return HlslReflector::new().compile(request);
            }
            Ok(CrossCompileResult {
                source: format!("// {:?} {}", request.target, request.stage),
                reflection: Reflection::default(),
                log: CompileLog::new()
            })
        }
    }

    struct RejectFragment;

    impl GpuProgramVerifier for RejectFragment
    {
        fn verify(&self, program: &GpuProgramDesc) -> Result<(), String>
        {
            match program.stage {
                Stage::Fragment => Err("missing output semantic".into()),
                _ => Ok(())
            }
        }
    }

    fn shader(config: &Config, source: &str) -> Result<Shader, Error>
    {
        Compiler::new(config, NoIncludes, Scripted, NoExtensions).compile("Test", source)
    }

    #[test]
    fn single_pass_with_variation()
    {
        let source = format!("
            shader Test {{
                variations {{ FOO {{ }}; }};
                pass {{
                    blend {{ target {{ index = 0; enabled = true; color = {{ source = one; dest = zero; op = add; }}; }}; }};
                    code {{ {} }};
                }};
            }};
        ", PROGRAM);
        let shader = shader(&Config::default(), &source).unwrap();
        assert_eq!(shader.name, "Test");
        assert_eq!(shader.techniques.len(), 2);
        assert_eq!(shader.techniques[0].variation.get("FOO"), None);
        assert_eq!(shader.techniques[1].variation.get("FOO"), Some(1));
        for technique in &shader.techniques {
            assert_eq!(technique.language, Language::Hlsl);
            assert_eq!(technique.passes.len(), 1);
            let pass = &technique.passes[0];
            assert!(!pass.blend_is_default);
            let target = &pass.blend.render_targets[0];
            assert!(target.blend_enable);
            assert_eq!(target.src_blend, BlendFactor::One);
            assert_eq!(target.dst_blend, BlendFactor::Zero);
            assert_eq!(target.blend_op, BlendOperation::Add);
            let stages: Vec<Stage> = pass.programs.iter().map(|v| v.stage).collect();
            assert_eq!(stages, vec![Stage::Vertex, Stage::Fragment]);
            assert_eq!(pass.program(Stage::Fragment).unwrap().entry_point, "fsmain");
        }
        assert_eq!(shader.variation_params.len(), 1);
        assert_eq!(shader.variation_params[0].identifier, "FOO");
    }

    #[test]
    fn variation_cross_product()
    {
        let source = format!("shader Test {{ variations {{ A {{ }}; B = {{ 0, 1, 2 }}; }}; code {{ {} }}; }};", PROGRAM);
        let shader = shader(&Config::default(), &source).unwrap();
        assert_eq!(shader.techniques.len(), 6);
        let variations: BTreeSet<(Option<i32>, Option<i32>)> = shader
            .techniques
            .iter()
            .map(|v| (v.variation.get("A"), v.variation.get("B")))
            .collect();
        assert_eq!(variations.len(), 6);
    }

    #[test]
    fn parallel_matches_sequential()
    {
        let source = format!("shader Test {{ variations {{ A {{ }}; B = {{ 0, 1, 2 }}; }}; code {{ {} }}; }};", PROGRAM);
        let sequential = shader(&Config::default(), &source).unwrap();
        let config = Config {
            n_threads: 4,
            ..Default::default()
        };
        let parallel = shader(&config, &source).unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn deterministic()
    {
        let source = format!("shader Test {{ variations {{ A {{ }}; }}; code {{ {} }}; }};", PROGRAM);
        let a = shader(&Config::default(), &source).unwrap();
        let b = shader(&Config::default(), &source).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn mixin_override()
    {
        let source = format!("
            mixin Common {{ raster {{ cull = cw; }}; }};
            mixin Common {{ raster {{ cull = none; }}; }};
            shader Test {{ mixin Common; code {{ {} }}; }};
        ", PROGRAM);
        let shader = shader(&Config::default(), &source).unwrap();
        assert_eq!(shader.techniques.len(), 1);
        assert_eq!(shader.techniques[0].passes[0].rasterizer.cull_mode, CullingMode::None);
    }

    #[test]
    fn missing_mixin()
    {
        let err = shader(&Config::default(), "shader Test { mixin Nope; };").unwrap_err();
        assert_eq!(err.to_string(), "Mixin \"Nope\" cannot be found.");
    }

    #[test]
    fn parameter_registered_once()
    {
        let source = format!("
            shader Test {{
                variations {{ A {{ }}; }};
                code {{
                    Texture2D tex = white;
                    [color] float4 tint;
                    {}
                }};
            }};
        ", PROGRAM);
        let shader = shader(&Config::default(), &source).unwrap();
        assert_eq!(shader.techniques.len(), 2);
        assert_eq!(shader.params.textures.len(), 1);
        assert!(shader.params.textures.contains_key("tex"));
        assert!(shader.params.data.contains_key("tint"));
        let code = &shader.techniques[0].passes[0].programs[0].source;
        assert!(code.contains("Texture2D tex;"));
        assert!(!code.contains("[color]"));
    }

    #[test]
    fn cross_compiled_languages()
    {
        let mut config = Config::default();
        config.languages.insert(TargetLanguage::Glsl);
        config.languages.insert(TargetLanguage::Vksl);
        let source = format!("shader Test {{ code {{ {} }}; }};", PROGRAM);
        let compiled = shader(&config, &source).unwrap();
        let languages: Vec<Language> = compiled.techniques.iter().map(|v| v.language).collect();
        assert_eq!(languages, vec![Language::Hlsl, Language::Glsl41, Language::Vksl]);
        let program = &compiled.techniques[2].passes[0].programs[1];
        assert_eq!(program.entry_point, "main");
        assert_eq!(program.source, "// Vksl45 Fragment");
        let source = format!("shader Test {{ featureset = HighEnd; code {{ {} }}; }};", PROGRAM);
        let high_end = shader(&config, &source).unwrap();
        assert_eq!(high_end.techniques[1].language, Language::Glsl);
        assert_eq!(high_end.techniques[1].passes[0].programs[0].source, "// Glsl45 Vertex");
    }

    #[test]
    fn translation_failure_aborts()
    {
        let mut config = Config::default();
        config.languages.insert(TargetLanguage::Msl);
        let source = format!("shader Test {{ code {{ {} }}; }};", PROGRAM);
        let err = Compiler::new(&config, NoIncludes, HlslReflector::new(), NoExtensions)
            .compile("Test", &source)
            .unwrap_err();
        assert!(matches!(err, Error::CrossCompile(_)));
    }

    #[test]
    fn gpu_program_verification()
    {
        let config = Config {
            verify: true,
            ..Default::default()
        };
        let source = format!("shader Test {{ code {{ {} }}; }};", PROGRAM);
        let err = Compiler::new(&config, NoIncludes, Scripted, NoExtensions)
            .with_verifier(&RejectFragment)
            .compile("Test", &source)
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed compiling GPU program(s): Fragment program: missing output semantic\n");
    }

    #[test]
    fn includes_and_sub_shaders()
    {
        let mut includes = MemoryIncludes::new();
        includes.insert("common.bslinc", format!("mixin Common {{ code {{ {} }}; }};", PROGRAM));
        let mut extensions = MemoryExtensions::new();
        extensions.insert("Lighting", ExtensionShader {
            name: "DeferredLighting".into(),
            source: format!("mixin Base {{ code {{ {} }}; }};", PROGRAM),
            defines: BTreeMap::new()
        });
        let source = "
            #include \"common.bslinc\"
            shader Test { mixin Common; };
            subshader Lighting { shader Light { mixin Base; }; }
        ";
        let config = Config::default();
        let shader = Compiler::new(&config, includes, Scripted, extensions).compile("Test", source).unwrap();
        assert_eq!(shader.includes, vec!["common.bslinc".to_string()]);
        assert_eq!(shader.techniques.len(), 1);
        assert_eq!(shader.sub_shaders.len(), 1);
        let sub = &shader.sub_shaders[0];
        assert_eq!(sub.name, "DeferredLighting");
        assert_eq!(sub.shader.techniques.len(), 1);
        assert!(sub.shader.params.is_empty());
    }
}
