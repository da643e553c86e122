// Copyright (c) 2022, BlockProject 3D
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

use std::borrow::Cow;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use log::LevelFilter;

/// Extension of compiled shader files.
pub const OUTPUT_EXTENSION: &str = "bslc";

pub fn alloc_verbosity_level(verbosity: u64) {
    match verbosity {
        0 => log::set_max_level(LevelFilter::Error),
        1 => log::set_max_level(LevelFilter::Warn),
        2 => log::set_max_level(LevelFilter::Info),
        3 => log::set_max_level(LevelFilter::Debug),
        _ => log::set_max_level(LevelFilter::Trace),
    };
}

pub fn init_bp3d_logger<F: FnOnce() -> i32>(f: F) {
    //Initialize bp3d-logger
    let res = bp3d_logger::Logger::new().add_stdout().add_file("bp3d-sdk").run(f);
    std::process::exit(res);
}

fn with_extension(path: &Path) -> PathBuf
{
    let mut path = path.to_owned();
    path.set_extension(OUTPUT_EXTENSION);
    path
}

fn transform_output<'a>(path: &'a Path, input: &Path) -> Cow<'a, Path>
{
    if path.is_dir() {
        let name = input.file_stem().map(Path::new).unwrap_or(Path::new("a.out"));
        return with_extension(&path.join(name)).into();
    }
    if path.extension().unwrap_or_default() != OUTPUT_EXTENSION {
        with_extension(path).into()
    } else {
        path.into()
    }
}

/// Computes the output file of a compiled input: `<input stem>.bslc` in the working directory
/// unless an output file or directory is given.
pub fn get_out_path<'a>(arg: Option<&'a OsStr>, input: &Path) -> Cow<'a, Path> {
    match arg {
        Some(v) => transform_output(Path::new(v), input),
        None => with_extension(Path::new(input.file_name().unwrap_or_default())).into()
    }
}

#[cfg(test)]
mod test
{
    use super::*;

    #[test]
    fn output_paths()
    {
        let input = Path::new("shaders/lit.bsl");
        assert_eq!(get_out_path(None, input), Path::new("lit.bslc"));
        assert_eq!(get_out_path(Some(OsStr::new("out/lit")), input), Path::new("out/lit.bslc"));
        assert_eq!(get_out_path(Some(OsStr::new("lit.bslc")), input), Path::new("lit.bslc"));
        let dir = Path::new(env!("CARGO_MANIFEST_DIR"));
        assert_eq!(get_out_path(Some(dir.as_os_str()), input), dir.join("lit.bslc"));
    }
}
