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

//! Diagnostics reported by a cross compiler.

use std::fmt::{Display, Formatter, Write};

use crate::cross::reflection::Reflection;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReportKind
{
    Info,
    Warning,
    Error
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceLine
{
    pub line: String,
    pub marker: String
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report
{
    pub kind: ReportKind,
    pub context: String,
    pub message: String,
    pub line: Option<SourceLine>,
    pub hints: Vec<String>
}

impl Report
{
    pub fn new<T: Into<String>>(kind: ReportKind, message: T) -> Report
    {
        Report {
            kind,
            context: String::new(),
            message: message.into(),
            line: None,
            hints: Vec::new()
        }
    }

    pub fn error<T: Into<String>>(message: T) -> Report
    {
        Report::new(ReportKind::Error, message)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompileLog
{
    pub reports: Vec<Report>,
    /// Partial reflection of a failed compile, when the compiler got that far.
    pub reflection: Option<Reflection>
}

// Continuation lines are aligned with the text following the "error (X:Y) : " prefix.
fn write_multi_line(f: &mut Formatter<'_>, text: &str) -> std::fmt::Result
{
    let indent = text.find(" : ").map(|v| v + 3).unwrap_or(0);
    for (i, line) in text.split_terminator('\n').enumerate() {
        if i > 0 {
            for _ in 0..indent {
                f.write_char(' ')?;
            }
        }
        writeln!(f, "{}", line)?;
    }
    Ok(())
}

fn write_report(f: &mut Formatter<'_>, report: &Report) -> std::fmt::Result
{
    if !report.context.is_empty() {
        write_multi_line(f, &report.context)?;
    }
    write_multi_line(f, &report.message)?;
    if let Some(line) = &report.line {
        writeln!(f, "{}", line.line)?;
        writeln!(f, "{}", line.marker)?;
    }
    for hint in &report.hints {
        writeln!(f, "{}", hint)?;
    }
    Ok(())
}

impl CompileLog
{
    pub fn new() -> CompileLog
    {
        CompileLog::default()
    }

    pub fn push(&mut self, report: Report)
    {
        self.reports.push(report);
    }

    pub fn count(&self, kind: ReportKind) -> usize
    {
        self.reports.iter().filter(|v| v.kind == kind).count()
    }

    pub fn is_empty(&self) -> bool
    {
        self.reports.is_empty()
    }

    fn write_section(&self, f: &mut Formatter<'_>, kind: ReportKind, headline: Option<(&str, &str)>) -> std::fmt::Result
    {
        let count = self.count(kind);
        if count == 0 {
            return Ok(());
        }
        if let Some((single, plural)) = headline {
            let s = format!("{} {}", count, if count == 1 { single } else { plural });
            writeln!(f, "{}", s)?;
            writeln!(f, "{}", "-".repeat(s.len()))?;
        }
        for report in self.reports.iter().filter(|v| v.kind == kind) {
            write_report(f, report)?;
        }
        Ok(())
    }
}

impl Display for CompileLog
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        self.write_section(f, ReportKind::Info, None)?;
        self.write_section(f, ReportKind::Warning, Some(("WARNING", "WARNINGS")))?;
        self.write_section(f, ReportKind::Error, Some(("ERROR", "ERRORS")))
    }
}

#[cfg(test)]
mod test
{
    use super::*;

    #[test]
    fn layout()
    {
        let mut log = CompileLog::new();
        let mut error = Report::error("error (3:5) : undeclared identifier 'x'\nin expression");
        error.context = "In function 'fsmain':".into();
        error.line = Some(SourceLine {
            line: "    return x;".into(),
            marker: "           ^".into()
        });
        error.hints.push("did you mean 'y'?".into());
        log.push(error);
        log.push(Report::new(ReportKind::Warning, "warning : implicit truncation"));
        log.push(Report::new(ReportKind::Info, "compiling fsmain"));
        log.push(Report::new(ReportKind::Warning, "warning : unused variable"));
        let expected = "compiling fsmain\n\
                        2 WARNINGS\n\
                        ----------\n\
                        warning : implicit truncation\n\
                        warning : unused variable\n\
                        1 ERROR\n\
                        -------\n\
                        In function 'fsmain':\n\
                        error (3:5) : undeclared identifier 'x'\n\
                        \x20             in expression\n\
                        \x20   return x;\n\
                        \x20          ^\n\
                        did you mean 'y'?\n";
        assert_eq!(log.to_string(), expected);
    }

    #[test]
    fn empty()
    {
        assert_eq!(CompileLog::new().to_string(), "");
    }
}
