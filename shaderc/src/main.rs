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

mod includes;
mod options;

use std::{fs::File, io::BufWriter, path::Path};

use bp3d_shaderc::{cross::HlslReflector, extension::NoExtensions, targets::TargetLanguage, Compiler, Config, Languages};
use clap::{Arg, ArgMatches, Command};
use cli_common::{alloc_verbosity_level, get_out_path, init_bp3d_logger};
use log::{debug, error, info};

use crate::{includes::IncludeDirs, options::Args};

const PROG_NAME: &str = env!("CARGO_PKG_NAME");
const PROG_VERSION: &str = env!("CARGO_PKG_VERSION");

fn compile_shader(args: &Args, path: &Path) -> Result<(), options::Error>
{
    let name = path
        .file_stem()
        .map(|v| v.to_string_lossy().into_owned())
        .unwrap_or_default();
    info!("Compiling shader {:?}...", path);
    let source = std::fs::read_to_string(path)?;
    let resolver = IncludeDirs::new(path.parent().into_iter().chain(args.includes.iter().copied()));
    let compiler = Compiler::new(&args.config, resolver, HlslReflector::new(), NoExtensions);
    let shader = compiler.compile(&name, &source)?;
    let output = get_out_path(args.output, path);
    info!("Writing {} technique(s) to {:?}", shader.techniques.len(), output);
    let file = BufWriter::new(File::create(&output)?);
    bincode::serialize_into(file, &shader)?;
    Ok(())
}

fn compile(args: Args) -> Result<(), options::Error>
{
    if args.shaders.is_empty() {
        return Err(options::Error::new("no shader to compile"));
    }
    if let (Some(output), true) = (args.output, args.shaders.len() > 1) {
        std::fs::create_dir_all(output)?;
    }
    for path in &args.shaders {
        compile_shader(&args, path)?;
    }
    Ok(())
}

fn parse_languages(matches: &ArgMatches) -> Result<Languages, options::Error>
{
    let mut languages = Languages::new();
    for name in matches.values_of("lang").unwrap_or_default() {
        languages.insert(options::parse_language(name)?);
    }
    if languages.is_empty() {
        languages.insert(TargetLanguage::Hlsl);
    }
    Ok(languages)
}

fn run() -> i32
{
    let matches = Command::new(PROG_NAME)
        .author("BlockProject 3D")
        .about("BlockProject 3D SDK - BSL Shader Compiler")
        .version(PROG_VERSION)
        .args([
            Arg::new("verbose").short('v').long("verbose").multiple_occurrences(true)
                .help("Enable verbose output"),
            Arg::new("print_languages").long("languages")
                .help("Print the target languages the built-in compiler can produce"),
            Arg::new("output").short('o').long("output").takes_value(true)
                .allow_invalid_utf8(true).help("Output file name, or output directory when compiling several shaders"),
            Arg::new("include").short('I').long("include").takes_value(true).multiple_occurrences(true)
                .allow_invalid_utf8(true).help("Add a directory to the include search path"),
            Arg::new("define").short('D').long("define").takes_value(true).multiple_occurrences(true)
                .help("Define a pre-processor symbol (NAME or NAME=VALUE)"),
            Arg::new("lang").short('l').long("lang").takes_value(true).multiple_occurrences(true)
                .help("Specify one or more target languages (default: hlsl); see --languages"),
            Arg::new("threads").short('n').long("threads").takes_value(true)
                .help("Specify the maximum number of threads to use when compiling variations"),
            Arg::new("strict_params").long("strict-params")
                .help("Fail when a parameter is redeclared with a different type across variations"),
            Arg::new("shader").multiple_values(true).allow_invalid_utf8(true)
                .required_unless_present("print_languages")
                .help("List of BSL shader files to compile")
        ]).get_matches();
    alloc_verbosity_level(matches.occurrences_of("verbose"));
    info!("Initializing BlockProject 3D Shader Compiler...");
    if matches.is_present("print_languages") {
        let names: Vec<&str> = TargetLanguage::list()
            .filter(|v| TargetLanguage::get(v).map(HlslReflector::supports).unwrap_or(false))
            .collect();
        println!("Available target languages: {}", names.join(", "));
        return 0;
    }
    let languages = match parse_languages(&matches) {
        Ok(v) => v,
        Err(e) => {
            error!("{}", e.into_inner());
            return 3;
        }
    };
    let n_threads = match options::parse_threads(matches.value_of("threads")) {
        Ok(v) => v,
        Err(e) => {
            error!("{}", e.into_inner());
            return 3;
        }
    };
    let config = Config {
        languages,
        defines: matches
            .values_of("define")
            .unwrap_or_default()
            .map(options::parse_define)
            .collect(),
        n_threads,
        strict_params: matches.is_present("strict_params"),
        verify: false
    };
    debug!("Languages: {:?}, defines: {:?}", config.languages, config.defines);
    let args = Args {
        shaders: matches.values_of_os("shader").unwrap_or_default().map(Path::new).collect(),
        includes: matches.values_of_os("include").unwrap_or_default().map(Path::new).collect(),
        output: matches.value_of_os("output"),
        config
    };
    if let Err(e) = compile(args) {
        error!("{}", e.into_inner());
        1
    } else {
        0
    }
}

fn main()
{
    init_bp3d_logger(run);
}
