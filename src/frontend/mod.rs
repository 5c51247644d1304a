// Front-end:
//  - syntax analysis
//  - semantics analysis

pub mod semantics;
pub mod syntax;

use peg::{error::ParseError, str::LineCol};

use semantics::Diagnostics;
use syntax::{parser, Program, SourceMap};

pub fn parse(src_code: &'_ str) -> Result<Program<'_>, ParseError<LineCol>> {
	parser::program(src_code)
}

pub fn semantic_analysis<'a>(tu: &'a Program<'a>, source: &'a SourceMap) -> Diagnostics {
	semantics::analyze(tu, source)
}
