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

use std::path::{Path, PathBuf};

use bp3d_bsl::include::IncludeResolver;
use log::{debug, trace};

/// Looks up include files in a list of directories, first match wins.
pub struct IncludeDirs
{
    dirs: Vec<PathBuf>
}

impl IncludeDirs
{
    pub fn new<'a>(dirs: impl IntoIterator<Item = &'a Path>) -> IncludeDirs
    {
        IncludeDirs {
            dirs: dirs.into_iter().map(Path::to_path_buf).collect()
        }
    }
}

impl IncludeResolver for IncludeDirs
{
    type Handle = String;

    fn find_include(&self, name: &str) -> Option<String>
    {
        for dir in &self.dirs {
            let path = dir.join(name);
            trace!("Trying include path {:?}", path);
            if let Ok(text) = std::fs::read_to_string(&path) {
                debug!("Resolved include '{}' to {:?}", name, path);
                return Some(text);
            }
        }
        None
    }
}

#[cfg(test)]
mod test
{
    use super::*;

    #[test]
    fn lookup_order()
    {
        let root = Path::new(env!("CARGO_MANIFEST_DIR"));
        let src = root.join("src");
        let dirs = IncludeDirs::new([src.as_path(), root]);
        assert!(dirs.find_include("Cargo.toml").unwrap().contains("[package]"));
        assert!(dirs.find_include("includes.rs").unwrap().contains("IncludeDirs"));
        assert!(dirs.find_include("missing.bslinc").is_none());
    }
}
