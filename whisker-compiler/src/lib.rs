//! Compiles mustache-in-HTML templates to JavaScript source text.
//!
//! The pipeline is `parse` (HTML + stache tags → tree), `optimize` (collapse
//! static subtrees to pre-rendered HTML), `specialize` (stache tags → runtime
//! calls), and emission. `compile` runs the whole thing.

pub mod codegen;
pub mod optimize;
pub mod parser;
pub mod tag;
pub mod tokens;

pub use codegen::{code_gen, node_to_code, specialize};
pub use optimize::optimize;
pub use parser::{parse, parse_with_source};
pub use tag::{parse_stache_tag, ScannedTag};

pub use whisker_html::{
    Arg, ArgValue, Attrs, CharRef, Node, ParseError, Path, StacheTag, Tag,
};

#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Bind `__content`/`__elseContent` in the emitted wrapper.
    pub is_template: bool,
    /// Name reported in error messages.
    pub source_name: Option<String>,
}

impl CompileOptions {
    pub fn template() -> CompileOptions {
        CompileOptions {
            is_template: true,
            source_name: None,
        }
    }
}

/// Full pipeline: template source in, JavaScript expression out.
pub fn compile(input: &str, options: &CompileOptions) -> Result<String, ParseError> {
    let tree = parse_with_source(input, options.source_name.as_deref())?;
    Ok(code_gen(&tree, options))
}
