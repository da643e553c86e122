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

use std::{borrow::Cow, fmt::Display, path::Path};

use bp3d_shaderc::{cross::HlslReflector, targets::TargetLanguage, Config};

pub struct Args<'a>
{
    pub shaders: Vec<&'a Path>,
    pub includes: Vec<&'a Path>,
    pub output: Option<&'a std::ffi::OsStr>,
    pub config: Config
}

#[derive(Debug, Clone)]
pub struct Error
{
    msg: Cow<'static, str>
}

impl Error
{
    pub fn new(msg: &'static str) -> Self
    {
        Self { msg: msg.into() }
    }

    pub fn into_inner(self) -> Cow<'static, str>
    {
        self.msg
    }
}

impl<T: Display> From<T> for Error
{
    fn from(v: T) -> Self
    {
        Self {
            msg: format!("{}", v).into()
        }
    }
}

/// Splits a `NAME[=VALUE]` command line define; a bare name is defined to 1.
pub fn parse_define(define: &str) -> (String, String)
{
    match define.split_once('=') {
        Some((name, value)) => (name.trim().into(), value.trim().into()),
        None => (define.trim().into(), "1".into())
    }
}

/// Resolves a `-l` argument to a language the built-in compiler can produce.
pub fn parse_language(name: &str) -> Result<TargetLanguage, Error>
{
    match TargetLanguage::get(name) {
        Some(v) if HlslReflector::supports(v) => Ok(v),
        Some(_) => Err(format!("target language '{}' needs an external cross compiler", name).into()),
        None => Err(format!("unknown target language '{}'", name).into())
    }
}

/// Parses the `-n` argument; the default is a single thread.
pub fn parse_threads(value: Option<&str>) -> Result<usize, Error>
{
    match value {
        None => Ok(1),
        Some(v) => match v.parse() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(format!("invalid number of threads '{}'", v).into())
        }
    }
}

#[cfg(test)]
mod test
{
    use super::*;

    #[test]
    fn defines()
    {
        assert_eq!(parse_define("FOO"), ("FOO".into(), "1".into()));
        assert_eq!(parse_define("QUALITY=2"), ("QUALITY".into(), "2".into()));
        assert_eq!(parse_define("EXPR=A=B"), ("EXPR".into(), "A=B".into()));
    }

    #[test]
    fn languages()
    {
        assert_eq!(parse_language("HLSL").unwrap(), TargetLanguage::Hlsl);
        let err = parse_language("glsl").unwrap_err();
        assert_eq!(err.into_inner(), "target language 'glsl' needs an external cross compiler");
        let err = parse_language("spirv").unwrap_err();
        assert_eq!(err.into_inner(), "unknown target language 'spirv'");
    }

    #[test]
    fn threads()
    {
        assert_eq!(parse_threads(None).unwrap(), 1);
        assert_eq!(parse_threads(Some("4")).unwrap(), 4);
        assert_eq!(parse_threads(Some("abc")).unwrap_err().into_inner(), "invalid number of threads 'abc'");
        assert!(parse_threads(Some("0")).is_err());
        assert!(parse_threads(Some("-2")).is_err());
    }

    #[test]
    fn error_message()
    {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file").into();
        assert_eq!(err.into_inner(), "no such file");
        assert_eq!(Error::new("unknown language").into_inner(), "unknown language");
    }
}
