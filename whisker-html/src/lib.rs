pub mod charref;
pub mod error;
pub mod parse;
pub mod scanner;
pub mod stache;
pub mod tohtml;
pub mod tree;

pub use charref::parse_char_ref;
pub use error::ParseError;
pub use parse::{parse_fragment, FragmentOptions, SpecialHook, StopHook, TagPosition, TextMode};
pub use scanner::Scanner;
pub use stache::{join_path, Arg, ArgValue, Path, StacheTag};
pub use tohtml::{escape_attr, escape_text, is_void_element, to_html};
pub use tree::{h, Attrs, CharRef, Node, Tag, DYNAMIC_KEY, SPECIALS_KEY};
