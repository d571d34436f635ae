// Token definitions for the DML lexer

use crate::source::ZeroSpan;
use serde::{Deserialize, Serialize};

/// A token with its kind, literal text, span and the trivia that preceded it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Literal text: the source slice for most tokens, the unescaped value
    /// for string/character literals, the verbatim body for C-blocks
    pub text: String,
    pub span: ZeroSpan,
    /// Whitespace and comments skipped immediately before this token
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub leading_trivia: Vec<String>,
    /// Trivia claimed by this token after it; currently unused, kept for
    /// symmetry with the data model
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub trailing_trivia: Vec<String>,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: ZeroSpan) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
            leading_trivia: Vec::new(),
            trailing_trivia: Vec::new(),
        }
    }
}

/// Token kinds produced by the lexer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    // Literals
    Identifier,
    IntLiteral,
    FloatLiteral,
    StringLiteral,
    CharLiteral,

    // Keywords - file structure
    Dml,
    Device,
    Import,
    Provisional,
    Bitorder,

    // Keywords - object declarations
    Bank,
    Register,
    Field,
    Method,
    Param,
    Attribute,
    Template,
    Connect,
    Interface,
    Port,
    Implement,
    Event,
    Group,
    Subdevice,
    Loggroup,

    // Keywords - data declarations
    Session,
    Saved,
    Data,
    Constant,
    Typedef,
    Struct,
    Union,
    Enum,
    Extern,
    Local,
    Hook,
    Export,
    Library,
    Layout,
    Bitfields,
    Header,
    Footer,

    // Keywords - method modifiers
    Inline,
    Shared,
    Independent,
    Startup,
    Memoized,
    Throws,
    Default,

    // Keywords - templates and expressions
    Is,
    Each,
    In,
    After,
    Call,
    Cast,
    Defined,
    ErrorKw,
    Select,
    Sizeof,
    Sizeoftype,
    Typeof,
    Undefined,
    Vect,
    Where,
    Sequence,
    Stringify,
    New,
    Delete,
    This,
    True,
    False,
    Null,

    // Keywords - control flow
    If,
    Else,
    While,
    Do,
    For,
    Foreach,
    Switch,
    Case,
    Break,
    Continue,
    Return,
    Goto,
    Try,
    Catch,
    Throw,
    Log,
    Assert,

    // Keywords - type qualifiers
    Const,
    Static,
    Auto,
    Volatile,
    Size,

    // Assignment operators
    Assign,        // =
    PlusAssign,    // +=
    MinusAssign,   // -=
    StarAssign,    // *=
    SlashAssign,   // /=
    PercentAssign, // %=
    AmpAssign,     // &=
    PipeAssign,    // |=
    CaretAssign,   // ^=
    ShlAssign,     // <<=
    ShrAssign,     // >>=

    // Comparison operators
    EqEq,   // ==
    BangEq, // !=
    Lt,     // <
    LtEq,   // <=
    Gt,     // >
    GtEq,   // >=

    // Logical and bitwise operators
    AmpAmp,   // &&
    PipePipe, // ||
    Bang,     // !
    Amp,      // &
    Pipe,     // |
    Caret,    // ^
    Tilde,    // ~
    Shl,      // <<
    Shr,      // >>

    // Arithmetic operators
    Plus,       // +
    Minus,      // -
    Star,       // *
    Slash,      // /
    Percent,    // %
    PlusPlus,   // ++
    MinusMinus, // --

    // Member and misc operators
    Arrow,      // ->
    Dot,        // .
    Question,   // ?
    Colon,      // :
    ColonColon, // ::
    Ellipsis,   // ...

    // Punctuation
    Semicolon, // ;
    Comma,     // ,
    LParen,    // (
    RParen,    // )
    LBrace,    // {
    RBrace,    // }
    LBracket,  // [
    RBracket,  // ]
    Hash,      // #
    Dollar,    // $
    At,        // @

    // Hash directives
    HashIf,      // #if
    HashElse,    // #else
    HashForeach, // #foreach
    HashSelect,  // #select
    HashCond,    // #?
    HashColon,   // #:

    /// An opaque `%{ ... %}` region of embedded C, preserved verbatim
    CBlock,

    Eof,
    /// A character the lexer does not recognize; the parser reports the
    /// syntax error at this site
    Invalid,
}

impl TokenKind {
    /// Resolve an identifier to a keyword, if it is one
    pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
        use TokenKind::*;
        Some(match s {
            "dml" => Dml,
            "device" => Device,
            "import" => Import,
            "provisional" => Provisional,
            "bitorder" => Bitorder,
            "bank" => Bank,
            "register" => Register,
            "field" => Field,
            "method" => Method,
            // DML 1.4 spells it `param`; the long form is tolerated
            "param" | "parameter" => Param,
            "attribute" => Attribute,
            "template" => Template,
            "connect" => Connect,
            "interface" => Interface,
            "port" => Port,
            "implement" => Implement,
            "event" => Event,
            "group" => Group,
            "subdevice" => Subdevice,
            "loggroup" => Loggroup,
            "session" => Session,
            "saved" => Saved,
            "data" => Data,
            "constant" => Constant,
            "typedef" => Typedef,
            "struct" => Struct,
            "union" => Union,
            "enum" => Enum,
            "extern" => Extern,
            "local" => Local,
            "hook" => Hook,
            "export" => Export,
            "library" => Library,
            "layout" => Layout,
            "bitfields" => Bitfields,
            "header" => Header,
            "footer" => Footer,
            "inline" => Inline,
            "shared" => Shared,
            "independent" => Independent,
            "startup" => Startup,
            "memoized" => Memoized,
            "throws" => Throws,
            "default" => Default,
            "is" => Is,
            "each" => Each,
            "in" => In,
            "after" => After,
            "call" => Call,
            "cast" => Cast,
            "defined" => Defined,
            "error" => ErrorKw,
            "select" => Select,
            "sizeof" => Sizeof,
            "sizeoftype" => Sizeoftype,
            "typeof" => Typeof,
            "undefined" => Undefined,
            "vect" => Vect,
            "where" => Where,
            "sequence" => Sequence,
            "stringify" => Stringify,
            "new" => New,
            "delete" => Delete,
            "this" => This,
            "true" => True,
            "false" => False,
            "null" => Null,
            "if" => If,
            "else" => Else,
            "while" => While,
            "do" => Do,
            "for" => For,
            "foreach" => Foreach,
            "switch" => Switch,
            "case" => Case,
            "break" => Break,
            "continue" => Continue,
            "return" => Return,
            "goto" => Goto,
            "try" => Try,
            "catch" => Catch,
            "throw" => Throw,
            "log" => Log,
            "assert" => Assert,
            "const" => Const,
            "static" => Static,
            "auto" => Auto,
            "volatile" => Volatile,
            "size" => Size,
            _ => return None,
        })
    }

    /// Check if this token can open a top-level declaration
    pub fn is_top_level_start(&self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Dml | Device
                | Import
                | Template
                | Bank
                | Register
                | Field
                | Method
                | Param
                | Attribute
                | Connect
                | Interface
                | Port
                | Implement
                | Event
                | Group
                | Subdevice
                | Loggroup
                | Session
                | Saved
                | Data
                | Constant
                | Typedef
                | Extern
                | Inline
                | Shared
                | Independent
                | Startup
                | Memoized
                | Is
                | Hook
                | Export
                | Header
                | Footer
                | Bitorder
                | Provisional
                | HashIf
                | HashForeach
                | HashSelect
        )
    }

    /// Synchronization points for parser error recovery: the next
    /// declaration-opening keyword from the core set
    pub fn is_sync_point(&self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Dml | Device | Template | Bank | Register | Field | Method | Param | Import | Eof
        )
    }

    /// Check whether this kind can stand in a name position. Some DML
    /// names collide with soft keywords (`size`, `data`).
    pub fn is_name_like(&self) -> bool {
        matches!(self, TokenKind::Identifier | TokenKind::Size | TokenKind::Data)
    }

    /// Display name used in error messages
    pub fn display_name(&self) -> &'static str {
        use TokenKind::*;
        match self {
            Identifier => "identifier",
            IntLiteral => "integer literal",
            FloatLiteral => "float literal",
            StringLiteral => "string literal",
            CharLiteral => "character literal",
            Dml => "'dml'",
            Device => "'device'",
            Import => "'import'",
            Provisional => "'provisional'",
            Bitorder => "'bitorder'",
            Bank => "'bank'",
            Register => "'register'",
            Field => "'field'",
            Method => "'method'",
            Param => "'param'",
            Attribute => "'attribute'",
            Template => "'template'",
            Connect => "'connect'",
            Interface => "'interface'",
            Port => "'port'",
            Implement => "'implement'",
            Event => "'event'",
            Group => "'group'",
            Subdevice => "'subdevice'",
            Loggroup => "'loggroup'",
            Session => "'session'",
            Saved => "'saved'",
            Data => "'data'",
            Constant => "'constant'",
            Typedef => "'typedef'",
            Struct => "'struct'",
            Union => "'union'",
            Enum => "'enum'",
            Extern => "'extern'",
            Local => "'local'",
            Hook => "'hook'",
            Export => "'export'",
            Library => "'library'",
            Layout => "'layout'",
            Bitfields => "'bitfields'",
            Header => "'header'",
            Footer => "'footer'",
            Inline => "'inline'",
            Shared => "'shared'",
            Independent => "'independent'",
            Startup => "'startup'",
            Memoized => "'memoized'",
            Throws => "'throws'",
            Default => "'default'",
            Is => "'is'",
            Each => "'each'",
            In => "'in'",
            After => "'after'",
            Call => "'call'",
            Cast => "'cast'",
            Defined => "'defined'",
            ErrorKw => "'error'",
            Select => "'select'",
            Sizeof => "'sizeof'",
            Sizeoftype => "'sizeoftype'",
            Typeof => "'typeof'",
            Undefined => "'undefined'",
            Vect => "'vect'",
            Where => "'where'",
            Sequence => "'sequence'",
            Stringify => "'stringify'",
            New => "'new'",
            Delete => "'delete'",
            This => "'this'",
            True => "'true'",
            False => "'false'",
            Null => "'null'",
            If => "'if'",
            Else => "'else'",
            While => "'while'",
            Do => "'do'",
            For => "'for'",
            Foreach => "'foreach'",
            Switch => "'switch'",
            Case => "'case'",
            Break => "'break'",
            Continue => "'continue'",
            Return => "'return'",
            Goto => "'goto'",
            Try => "'try'",
            Catch => "'catch'",
            Throw => "'throw'",
            Log => "'log'",
            Assert => "'assert'",
            Const => "'const'",
            Static => "'static'",
            Auto => "'auto'",
            Volatile => "'volatile'",
            Size => "'size'",
            Assign => "'='",
            PlusAssign => "'+='",
            MinusAssign => "'-='",
            StarAssign => "'*='",
            SlashAssign => "'/='",
            PercentAssign => "'%='",
            AmpAssign => "'&='",
            PipeAssign => "'|='",
            CaretAssign => "'^='",
            ShlAssign => "'<<='",
            ShrAssign => "'>>='",
            EqEq => "'=='",
            BangEq => "'!='",
            Lt => "'<'",
            LtEq => "'<='",
            Gt => "'>'",
            GtEq => "'>='",
            AmpAmp => "'&&'",
            PipePipe => "'||'",
            Bang => "'!'",
            Amp => "'&'",
            Pipe => "'|'",
            Caret => "'^'",
            Tilde => "'~'",
            Shl => "'<<'",
            Shr => "'>>'",
            Plus => "'+'",
            Minus => "'-'",
            Star => "'*'",
            Slash => "'/'",
            Percent => "'%'",
            PlusPlus => "'++'",
            MinusMinus => "'--'",
            Arrow => "'->'",
            Dot => "'.'",
            Question => "'?'",
            Colon => "':'",
            ColonColon => "'::'",
            Ellipsis => "'...'",
            Semicolon => "';'",
            Comma => "','",
            LParen => "'('",
            RParen => "')'",
            LBrace => "'{'",
            RBrace => "'}'",
            LBracket => "'['",
            RBracket => "']'",
            Hash => "'#'",
            Dollar => "'$'",
            At => "'@'",
            HashIf => "'#if'",
            HashElse => "'#else'",
            HashForeach => "'#foreach'",
            HashSelect => "'#select'",
            HashCond => "'#?'",
            HashColon => "'#:'",
            CBlock => "C block",
            Eof => "end of file",
            Invalid => "invalid character",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(TokenKind::keyword_from_str("device"), Some(TokenKind::Device));
        assert_eq!(TokenKind::keyword_from_str("param"), Some(TokenKind::Param));
        assert_eq!(TokenKind::keyword_from_str("parameter"), Some(TokenKind::Param));
        assert_eq!(TokenKind::keyword_from_str("memoized"), Some(TokenKind::Memoized));
        assert_eq!(TokenKind::keyword_from_str("foo"), None);
    }

    #[test]
    fn test_sync_points() {
        assert!(TokenKind::Device.is_sync_point());
        assert!(TokenKind::Template.is_sync_point());
        assert!(TokenKind::Eof.is_sync_point());
        assert!(!TokenKind::Plus.is_sync_point());
        assert!(!TokenKind::Connect.is_sync_point());
    }

    #[test]
    fn test_top_level_start() {
        assert!(TokenKind::Dml.is_top_level_start());
        assert!(TokenKind::Subdevice.is_top_level_start());
        assert!(TokenKind::Inline.is_top_level_start());
        assert!(!TokenKind::Return.is_top_level_start());
    }
}
