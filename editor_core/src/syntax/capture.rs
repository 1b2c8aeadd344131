//! Capture taxonomy.
//!
//! A closed set of semantic token categories. Grammar highlight queries tag
//! nodes with dotted names (`function.builtin`); those names are mapped onto
//! this enum once, when the query is compiled. Each capture may fall back to a
//! more general one so a theme only has to style the broad categories.

use std::fmt;
use std::str::FromStr;

macro_rules! capture_names {
    ($($(#[$doc:meta])* $variant:ident => $raw:literal,)+) => {
        /// A semantic classification for a highlighted token.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum CaptureName {
            $($(#[$doc])* $variant,)+
        }

        impl CaptureName {
            /// Every capture name, in declaration order.
            pub const ALL: &'static [CaptureName] = &[$(CaptureName::$variant,)+];

            /// The dotted identifier used in highlight queries.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(CaptureName::$variant => $raw,)+
                }
            }

            /// Parses an exact dotted identifier. Returns `None` if unknown.
            pub fn classify(raw: &str) -> Option<CaptureName> {
                match raw {
                    $($raw => Some(CaptureName::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

capture_names! {
    /// Include directives or imports.
    Include => "include",
    Constructor => "constructor",
    Keyword => "keyword",
    Boolean => "boolean",
    /// Loop keywords.
    Repeat => "repeat",
    Conditional => "conditional",
    /// `?` / `:`
    ConditionalTernary => "keyword.conditional.ternary",
    Tag => "tag",
    Comment => "comment",
    Variable => "variable",
    Property => "property",
    Function => "function",
    FunctionName => "function.name",
    FunctionBuiltin => "function.builtin",
    FunctionCall => "function.call",
    FunctionMacro => "function.macro",
    FunctionMethod => "function.method",
    FunctionMethodCall => "function.method.call",
    Method => "method",
    Number => "number",
    Float => "float",
    String => "string",
    /// Docstrings.
    StringDocumentation => "string.documentation",
    StringRegexp => "string.regexp",
    StringEscape => "string.escape",
    /// Dates and other special strings.
    StringSpecial => "string.special",
    StringSpecialSymbol => "string.special.symbol",
    StringSpecialUrl => "string.special.url",
    StringSpecialPath => "string.special.path",
    Type => "type",
    Parameter => "parameter",
    TypeAlternate => "type.alternate",
    /// `this`, `self`
    VariableBuiltin => "variable.builtin",
    VariableParameter => "variable.parameter",
    /// `_`, `it`
    VariableParameterBuiltin => "variable.parameter.builtin",
    VariableMember => "variable.member",
    KeywordReturn => "keyword.return",
    KeywordFunction => "keyword.function",
    Identifier => "identifier",
    Operator => "operator",
    Constant => "constant",
    ConstantBuiltin => "constant.builtin",
    ConstantMacro => "constant.macro",
    Attribute => "attribute",
    AttributeBuiltin => "attribute.builtin",
    Embedded => "embedded",
    /// Parser errors.
    Error => "error",
    /// Explicitly unhighlighted.
    None => "none",
    Preproc => "preproc",
    Define => "define",
    Debug => "debug",
    Exception => "exception",
    Label => "label",
    Field => "field",
    StorageClass => "storage.class",
    Symbol => "symbol",
    Namespace => "namespace",
    ModuleBuiltin => "module.builtin",
    Conceal => "conceal",
    Spell => "spell",
    Nospell => "nospell",
    Fold => "fold",
    Punctuation => "punctuation",
    PunctuationDelimiter => "punctuation.delimiter",
    PunctuationBracket => "punctuation.bracket",
    /// `{}` in string interpolation.
    PunctuationSpecial => "punctuation.special",
    Escape => "escape",
    Regex => "regex",
    Annotation => "annotation",
    Documentation => "documentation",
    Emphasis => "emphasis",
    Strong => "strong",
    Link => "link",
    LinkLabel => "markup.link.label",
    LinkUrl => "markup.link.url",
    Heading => "heading",
    Heading1 => "markup.heading.1",
    Heading2 => "markup.heading.2",
    Heading3 => "markup.heading.3",
    Heading4 => "markup.heading.4",
    Heading5 => "markup.heading.5",
    Heading6 => "markup.heading.6",
    Italic => "italic",
    Bold => "bold",
    Underline => "underline",
    Strikethrough => "strikethrough",
    Title => "title",
    Literal => "literal",
    LiteralBlock => "markup.raw.block",
    Uri => "uri",
    Math => "math",
    Meta => "meta",
    Inherit => "inherit",
    Background => "background",
    Text => "text",
    Reference => "reference",
    Environment => "environment",
    EnvironmentName => "environment.name",
    Note => "note",
    Todo => "todo",
    Character => "character",
    CharacterSpecial => "character.special",
    EscapeCharacter => "escape.character",
    Delimiter => "delimiter",
    Angle => "angle",
    Bracket => "bracket",
    Cdata => "cdata",
    Doctype => "doctype",
    Entity => "entity",
    ClassName => "class.name",
    TagName => "tag.name",
    TagAttribute => "tag.attribute",
    TagDelimiter => "tag.delimiter",
    TemplateTag => "template.tag",
    BuiltinType => "builtin.type",
    PrimitiveType => "primitive.type",
    /// HTML5 tags.
    TagBuiltin => "tag.builtin",
    TypeDefinition => "type.definition",
    /// `go`, `async`, `await`
    KeywordCoroutine => "keyword.coroutine",
    /// `and`, `or`
    KeywordOperator => "keyword.operator",
    KeywordImport => "keyword.import",
    /// `struct`, `enum`
    KeywordType => "keyword.type",
    /// `const`, `static`, `public`
    KeywordModifier => "keyword.modifier",
    KeywordRepeat => "keyword.repeat",
    MarkupQuote => "markup.quote",
    MarkupList => "markup.list",
    MarkupListChecked => "markup.list.checked",
    MarkupListUnchecked => "markup.list.unchecked",
    CommentLine => "comment.line",
    CommentBlock => "comment.block",
    /// `ERROR`, `FIXME`
    CommentError => "comment.error",
    /// `WARNING`, `HACK`
    CommentWarning => "comment.warning",
    /// `NOTE`, `INFO`
    CommentNote => "comment.note",
}

/// Fallbacks that dotted prefixes don't express. Checked before the prefix
/// rule, so an entry here overrides it.
static FALLBACKS: &[(CaptureName, CaptureName)] = &[
    (CaptureName::Include, CaptureName::KeywordImport),
    (CaptureName::Constructor, CaptureName::Type),
    (CaptureName::Boolean, CaptureName::ConstantBuiltin),
    (CaptureName::Repeat, CaptureName::KeywordRepeat),
    (CaptureName::Conditional, CaptureName::Keyword),
    (CaptureName::ConditionalTernary, CaptureName::Operator),
    (CaptureName::Method, CaptureName::FunctionMethod),
    (CaptureName::Float, CaptureName::Number),
    (CaptureName::Parameter, CaptureName::VariableParameter),
    (CaptureName::Field, CaptureName::VariableMember),
    (CaptureName::VariableMember, CaptureName::Property),
    (CaptureName::Define, CaptureName::Preproc),
    (CaptureName::Debug, CaptureName::Keyword),
    (CaptureName::Exception, CaptureName::Keyword),
    (CaptureName::StorageClass, CaptureName::KeywordModifier),
    (CaptureName::Symbol, CaptureName::StringSpecialSymbol),
    (CaptureName::ModuleBuiltin, CaptureName::Namespace),
    (CaptureName::Delimiter, CaptureName::PunctuationDelimiter),
    (CaptureName::Angle, CaptureName::PunctuationBracket),
    (CaptureName::Bracket, CaptureName::PunctuationBracket),
    (CaptureName::StringEscape, CaptureName::Escape),
    (CaptureName::EscapeCharacter, CaptureName::Escape),
    (CaptureName::Regex, CaptureName::StringRegexp),
    (CaptureName::Annotation, CaptureName::Attribute),
    (CaptureName::Documentation, CaptureName::Comment),
    (CaptureName::StringDocumentation, CaptureName::Documentation),
    (CaptureName::Strong, CaptureName::Bold),
    (CaptureName::Emphasis, CaptureName::Italic),
    (CaptureName::LinkLabel, CaptureName::Link),
    (CaptureName::LinkUrl, CaptureName::Uri),
    (CaptureName::StringSpecialUrl, CaptureName::Uri),
    (CaptureName::Heading1, CaptureName::Heading),
    (CaptureName::Heading2, CaptureName::Heading),
    (CaptureName::Heading3, CaptureName::Heading),
    (CaptureName::Heading4, CaptureName::Heading),
    (CaptureName::Heading5, CaptureName::Heading),
    (CaptureName::Heading6, CaptureName::Heading),
    (CaptureName::Heading, CaptureName::Title),
    (CaptureName::LiteralBlock, CaptureName::Literal),
    (CaptureName::MarkupQuote, CaptureName::Comment),
    (CaptureName::MarkupList, CaptureName::PunctuationSpecial),
    (CaptureName::Character, CaptureName::String),
    (CaptureName::Cdata, CaptureName::String),
    (CaptureName::Entity, CaptureName::Constant),
    (CaptureName::Doctype, CaptureName::Tag),
    (CaptureName::ClassName, CaptureName::Type),
    (CaptureName::TemplateTag, CaptureName::Tag),
    (CaptureName::BuiltinType, CaptureName::Type),
    (CaptureName::PrimitiveType, CaptureName::BuiltinType),
    (CaptureName::TypeDefinition, CaptureName::Type),
    (CaptureName::Todo, CaptureName::CommentNote),
    (CaptureName::Note, CaptureName::CommentNote),
];

impl CaptureName {
    /// Maps a grammar capture name onto the taxonomy, dropping trailing
    /// segments until a known name matches (`comment.documentation.rust`
    /// resolves to `comment`).
    pub fn resolve(raw: &str) -> Option<CaptureName> {
        let mut name = raw;
        loop {
            if let Some(capture) = CaptureName::classify(name) {
                return Some(capture);
            }
            let dot = name.rfind('.')?;
            name = &name[..dot];
        }
    }

    /// Returns the next more general capture, or `self` when there is none.
    pub fn fallback(self) -> CaptureName {
        if let Some(&(_, general)) = FALLBACKS.iter().find(|(specific, _)| *specific == self) {
            return general;
        }

        let mut name = self.as_str();
        while let Some(dot) = name.rfind('.') {
            name = &name[..dot];
            if let Some(parent) = CaptureName::classify(name) {
                return parent;
            }
        }
        self
    }

    /// Iterates from `self` through each fallback until the chain stops.
    pub fn fallback_chain(self) -> impl Iterator<Item = CaptureName> {
        let mut next = Some(self);
        std::iter::from_fn(move || {
            let current = next?;
            let general = current.fallback();
            next = (general != current).then_some(general);
            Some(current)
        })
    }
}

impl fmt::Display for CaptureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown capture name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCapture(pub String);

impl fmt::Display for UnknownCapture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown capture name: {}", self.0)
    }
}

impl std::error::Error for UnknownCapture {}

impl FromStr for CaptureName {
    type Err = UnknownCapture;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CaptureName::classify(s).ok_or_else(|| UnknownCapture(s.to_string()))
    }
}
