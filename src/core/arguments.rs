//! # Arguments
//!
//! Argument types describe how one token (or token sequence) becomes a typed value.
//! They are pure: parsing the same input always gives the same result, and failures are
//! reported as [`SyntaxError`]s carrying a cursor position.
//!
//! An [`Argument`] is the declaration of one argument inside a command: a name, a type,
//! and optionally a default value, a suggestion provider and its own permission.

use crate::core::errors::{SyntaxError, SyntaxErrorKind};
use crate::core::node::Requirement;
use crate::core::permission::CommandPermission;
use crate::core::reader::StringReader;
use crate::models::Consumption;
use serde_json::json;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// A parsed argument value. Handlers get it back typed through `CommandArguments`.
pub type ArgumentValue = Box<dyn Any + Send + Sync>;

/// Produces the value of an omitted optional argument at dispatch time.
pub type DefaultProvider<S> = Arc<dyn Fn(&S) -> ArgumentValue + Send + Sync>;

/// Produces completion candidates from the sender and the partial token.
pub type SuggestionProvider<S> = Arc<dyn Fn(&S, &str) -> Vec<String> + Send + Sync>;

// --- ARGUMENT TYPE CONTRACT ---

/// How to parse one argument.
pub trait ArgumentType: fmt::Debug + Send + Sync + 'static {
    /// The value produced by a successful parse.
    type Value: Send + Sync + 'static;

    /// A stable identifier used by the serialization hook, e.g. `integer`.
    fn parser_id(&self) -> &'static str;

    /// Consumes exactly this argument's input and leaves the cursor on the next byte.
    fn parse(&self, reader: &mut StringReader<'_>) -> Result<Self::Value, SyntaxError>;

    /// How much input the type may consume.
    fn consumption(&self) -> Consumption {
        Consumption::SingleToken
    }

    /// Parser settings exposed to clients (bounds, literal sets...).
    fn properties(&self) -> Option<serde_json::Value> {
        None
    }

    /// Built-in completion candidates. Filtering by prefix is done by the dispatcher.
    fn suggestions(&self) -> Vec<String> {
        Vec::new()
    }
}

/// The object-safe view of an [`ArgumentType`], as stored in the command tree.
pub trait DynArgumentType: fmt::Debug + Send + Sync {
    /// See [`ArgumentType::parser_id`].
    fn id(&self) -> &'static str;
    /// Parses and boxes the value.
    fn parse_erased(&self, reader: &mut StringReader<'_>) -> Result<ArgumentValue, SyntaxError>;
    /// The `TypeId` of the parsed value.
    fn value_type(&self) -> TypeId;
    /// See [`ArgumentType::consumption`].
    fn consumption_rule(&self) -> Consumption;
    /// See [`ArgumentType::properties`].
    fn describe_properties(&self) -> Option<serde_json::Value>;
    /// See [`ArgumentType::suggestions`].
    fn suggest(&self) -> Vec<String>;
}

impl<A: ArgumentType> DynArgumentType for A {
    fn id(&self) -> &'static str {
        self.parser_id()
    }

    fn parse_erased(&self, reader: &mut StringReader<'_>) -> Result<ArgumentValue, SyntaxError> {
        self.parse(reader).map(|v| Box::new(v) as ArgumentValue)
    }

    fn value_type(&self) -> TypeId {
        TypeId::of::<A::Value>()
    }

    fn consumption_rule(&self) -> Consumption {
        self.consumption()
    }

    fn describe_properties(&self) -> Option<serde_json::Value> {
        self.properties()
    }

    fn suggest(&self) -> Vec<String> {
        self.suggestions()
    }
}

// --- BUILT-IN TYPES ---

/// `true` or `false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanArgument;

impl ArgumentType for BooleanArgument {
    type Value = bool;

    fn parser_id(&self) -> &'static str {
        "bool"
    }

    fn parse(&self, reader: &mut StringReader<'_>) -> Result<bool, SyntaxError> {
        reader.read_boolean()
    }

    fn suggestions(&self) -> Vec<String> {
        vec!["true".to_string(), "false".to_string()]
    }
}

/// A 32-bit integer, optionally bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegerArgument {
    min: i32,
    max: i32,
}

impl Default for IntegerArgument {
    fn default() -> Self {
        Self {
            min: i32::MIN,
            max: i32::MAX,
        }
    }
}

impl IntegerArgument {
    /// An unbounded integer.
    pub fn new() -> Self {
        Self::default()
    }

    /// An integer in `min..=max`.
    pub fn with_bounds(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    /// An integer no smaller than `min`.
    pub fn at_least(min: i32) -> Self {
        Self { min, ..Self::default() }
    }
}

impl ArgumentType for IntegerArgument {
    type Value = i32;

    fn parser_id(&self) -> &'static str {
        "integer"
    }

    fn parse(&self, reader: &mut StringReader<'_>) -> Result<i32, SyntaxError> {
        let start = reader.cursor();
        let found = reader.read_int()?;
        if found < self.min {
            reader.set_cursor(start);
            return Err(reader.error(SyntaxErrorKind::IntegerTooLow { min: self.min, found }));
        }
        if found > self.max {
            reader.set_cursor(start);
            return Err(reader.error(SyntaxErrorKind::IntegerTooHigh { max: self.max, found }));
        }
        Ok(found)
    }

    fn properties(&self) -> Option<serde_json::Value> {
        let mut props = serde_json::Map::new();
        if self.min != i32::MIN {
            props.insert("min".to_string(), json!(self.min));
        }
        if self.max != i32::MAX {
            props.insert("max".to_string(), json!(self.max));
        }
        (!props.is_empty()).then_some(serde_json::Value::Object(props))
    }
}

/// A 64-bit float, optionally bounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoubleArgument {
    min: f64,
    max: f64,
}

impl Default for DoubleArgument {
    fn default() -> Self {
        Self {
            min: f64::MIN,
            max: f64::MAX,
        }
    }
}

impl DoubleArgument {
    /// An unbounded double.
    pub fn new() -> Self {
        Self::default()
    }

    /// A double in `min..=max`.
    pub fn with_bounds(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// A double no smaller than `min`.
    pub fn at_least(min: f64) -> Self {
        Self { min, ..Self::default() }
    }
}

impl ArgumentType for DoubleArgument {
    type Value = f64;

    fn parser_id(&self) -> &'static str {
        "double"
    }

    fn parse(&self, reader: &mut StringReader<'_>) -> Result<f64, SyntaxError> {
        let start = reader.cursor();
        let found = reader.read_double()?;
        if found < self.min {
            reader.set_cursor(start);
            return Err(reader.error(SyntaxErrorKind::DoubleTooLow { min: self.min, found }));
        }
        if found > self.max {
            reader.set_cursor(start);
            return Err(reader.error(SyntaxErrorKind::DoubleTooHigh { max: self.max, found }));
        }
        Ok(found)
    }

    fn properties(&self) -> Option<serde_json::Value> {
        let mut props = serde_json::Map::new();
        if self.min != f64::MIN {
            props.insert("min".to_string(), json!(self.min));
        }
        if self.max != f64::MAX {
            props.insert("max".to_string(), json!(self.max));
        }
        (!props.is_empty()).then_some(serde_json::Value::Object(props))
    }
}

/// A single unquoted word.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringArgument;

impl ArgumentType for StringArgument {
    type Value = String;

    fn parser_id(&self) -> &'static str {
        "string"
    }

    fn parse(&self, reader: &mut StringReader<'_>) -> Result<String, SyntaxError> {
        match reader.read_unquoted_string() {
            "" => Err(reader.error(SyntaxErrorKind::ExpectedString)),
            word => Ok(word.to_string()),
        }
    }

    fn properties(&self) -> Option<serde_json::Value> {
        Some(json!({ "type": "word" }))
    }
}

/// A single word, or a quoted string that may contain spaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextArgument;

impl ArgumentType for TextArgument {
    type Value = String;

    fn parser_id(&self) -> &'static str {
        "string"
    }

    fn parse(&self, reader: &mut StringReader<'_>) -> Result<String, SyntaxError> {
        if reader.at_token_end() {
            return Err(reader.error(SyntaxErrorKind::ExpectedString));
        }
        reader.read_string()
    }

    fn consumption(&self) -> Consumption {
        Consumption::Quotable
    }

    fn properties(&self) -> Option<serde_json::Value> {
        Some(json!({ "type": "phrase" }))
    }
}

/// The rest of the line, spaces included.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyStringArgument;

impl ArgumentType for GreedyStringArgument {
    type Value = String;

    fn parser_id(&self) -> &'static str {
        "string"
    }

    fn parse(&self, reader: &mut StringReader<'_>) -> Result<String, SyntaxError> {
        match reader.read_remaining() {
            "" => Err(reader.error(SyntaxErrorKind::ExpectedString)),
            rest => Ok(rest.to_string()),
        }
    }

    fn consumption(&self) -> Consumption {
        Consumption::Greedy
    }

    fn properties(&self) -> Option<serde_json::Value> {
        Some(json!({ "type": "greedy" }))
    }
}

/// Matches any of a fixed set of words (case-sensitive) and always resolves to the
/// canonical one, the first in the set. Used for subcommand names with aliases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiLiteralArgument {
    literals: Vec<String>,
}

impl MultiLiteralArgument {
    /// A set made of `canonical` followed by its synonyms.
    pub fn new<I, T>(canonical: impl Into<String>, aliases: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut literals = vec![canonical.into()];
        for alias in aliases {
            let alias = alias.into();
            if !literals.contains(&alias) {
                literals.push(alias);
            }
        }
        Self { literals }
    }

    /// The word every match resolves to.
    pub fn canonical(&self) -> &str {
        self.literals.first().map(String::as_str).unwrap_or_default()
    }

    /// All accepted words, canonical first.
    pub fn literals(&self) -> &[String] {
        &self.literals
    }
}

impl ArgumentType for MultiLiteralArgument {
    type Value = String;

    fn parser_id(&self) -> &'static str {
        "multi_literal"
    }

    fn parse(&self, reader: &mut StringReader<'_>) -> Result<String, SyntaxError> {
        let start = reader.cursor();
        let word = reader.read_word();
        if self.literals.iter().any(|l| l == word) {
            Ok(self.canonical().to_string())
        } else {
            reader.set_cursor(start);
            Err(reader.error(SyntaxErrorKind::ExpectedLiteral(self.literals.join("|"))))
        }
    }

    fn properties(&self) -> Option<serde_json::Value> {
        Some(json!({ "literals": self.literals }))
    }

    fn suggestions(&self) -> Vec<String> {
        self.literals.clone()
    }
}

/// Maps a fixed set of keywords to values, e.g. game modes.
#[derive(Debug, Clone)]
pub struct ChoiceArgument<T> {
    choices: Vec<(String, T)>,
}

impl<T> ChoiceArgument<T> {
    /// Builds the keyword table. Earlier keywords win on duplicates.
    pub fn new<I, K>(choices: I) -> Self
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<String>,
    {
        Self {
            choices: choices.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    fn keywords(&self) -> Vec<String> {
        self.choices.iter().map(|(k, _)| k.clone()).collect()
    }
}

impl<T> ArgumentType for ChoiceArgument<T>
where
    T: Clone + fmt::Debug + Send + Sync + 'static,
{
    type Value = T;

    fn parser_id(&self) -> &'static str {
        "choice"
    }

    fn parse(&self, reader: &mut StringReader<'_>) -> Result<T, SyntaxError> {
        let start = reader.cursor();
        let word = reader.read_unquoted_string();
        match self.choices.iter().find(|(k, _)| k == word) {
            Some((_, value)) => Ok(value.clone()),
            None => {
                let found = word.to_string();
                reader.set_cursor(start);
                Err(reader.error(SyntaxErrorKind::InvalidChoice {
                    found,
                    expected: self.keywords().join(", "),
                }))
            }
        }
    }

    fn properties(&self) -> Option<serde_json::Value> {
        Some(json!({ "choices": self.keywords() }))
    }

    fn suggestions(&self) -> Vec<String> {
        self.keywords()
    }
}

// --- ARGUMENT DECLARATIONS ---

/// What an argument matches.
#[derive(Debug, Clone)]
pub(crate) enum ArgumentSpec {
    /// A fixed word, equal to the argument name.
    Literal,
    /// A typed value.
    Typed(Arc<dyn DynArgumentType>),
}

/// A default value provider together with the type it produces.
pub(crate) struct DefaultValue<S: ?Sized> {
    pub(crate) provider: DefaultProvider<S>,
    pub(crate) value_type: TypeId,
}

impl<S: ?Sized> Clone for DefaultValue<S> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            value_type: self.value_type,
        }
    }
}

/// One declared argument of a command.
pub struct Argument<S: ?Sized> {
    pub(crate) name: String,
    pub(crate) spec: ArgumentSpec,
    pub(crate) optional: bool,
    pub(crate) default: Option<DefaultValue<S>>,
    pub(crate) listed: bool,
    pub(crate) permission: CommandPermission,
    pub(crate) requirements: Vec<Requirement<S>>,
    pub(crate) suggestions: Option<SuggestionProvider<S>>,
}

impl<S: ?Sized> Clone for Argument<S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            spec: self.spec.clone(),
            optional: self.optional,
            default: self.default.clone(),
            listed: self.listed,
            permission: self.permission.clone(),
            requirements: self.requirements.clone(),
            suggestions: self.suggestions.clone(),
        }
    }
}

impl<S: ?Sized> fmt::Debug for Argument<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Argument")
            .field("name", &self.name)
            .field("parser", &self.parser_id())
            .field("optional", &self.optional)
            .field("has_default", &self.default.is_some())
            .field("listed", &self.listed)
            .field("permission", &self.permission)
            .finish()
    }
}

impl<S: ?Sized> Argument<S> {
    /// A typed argument bound to the handler under `name`.
    pub fn new<A: ArgumentType>(name: impl Into<String>, argument_type: A) -> Self {
        Self::from_spec(name.into(), ArgumentSpec::Typed(Arc::new(argument_type)))
    }

    /// A fixed keyword inside the argument list. Not bound to the handler.
    pub fn literal(word: impl Into<String>) -> Self {
        let mut argument = Self::from_spec(word.into(), ArgumentSpec::Literal);
        argument.listed = false;
        argument
    }

    /// A word out of `canonical` and its `aliases`, bound as `canonical`.
    pub fn multi_literal<I, T>(canonical: impl Into<String>, aliases: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let multi = MultiLiteralArgument::new(canonical, aliases);
        Self::new(multi.canonical().to_string(), multi)
    }

    fn from_spec(name: String, spec: ArgumentSpec) -> Self {
        Self {
            name,
            spec,
            optional: false,
            default: None,
            listed: true,
            permission: CommandPermission::None,
            requirements: Vec::new(),
            suggestions: None,
        }
    }

    /// Marks the argument as optional. Omitted optional arguments without a default
    /// are simply absent from the handler's arguments.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Makes the argument optional with a default computed for each dispatch.
    pub fn with_default<T, F>(mut self, provider: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&S) -> T + Send + Sync + 'static,
    {
        self.optional = true;
        self.default = Some(DefaultValue {
            provider: Arc::new(move |sender: &S| Box::new(provider(sender)) as ArgumentValue),
            value_type: TypeId::of::<T>(),
        });
        self
    }

    /// Controls whether the parsed value is handed to the handler.
    pub fn listed(mut self, listed: bool) -> Self {
        self.listed = listed;
        self
    }

    /// Requires a permission to use this argument and everything after it.
    pub fn with_permission(mut self, permission: impl Into<CommandPermission>) -> Self {
        self.permission = permission.into();
        self
    }

    /// Adds a requirement for this argument and everything after it.
    pub fn with_requirement<F>(mut self, requirement: F) -> Self
    where
        F: Fn(&S) -> bool + Send + Sync + 'static,
    {
        self.requirements.push(Arc::new(requirement));
        self
    }

    /// Replaces the type's built-in suggestions.
    pub fn with_suggestions<F>(mut self, provider: F) -> Self
    where
        F: Fn(&S, &str) -> Vec<String> + Send + Sync + 'static,
    {
        self.suggestions = Some(Arc::new(provider));
        self
    }

    /// The argument name (the keyword itself for literals).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the argument may be omitted.
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Whether the parsed value is handed to the handler.
    pub fn is_listed(&self) -> bool {
        self.listed
    }

    /// Whether this is a fixed keyword.
    pub fn is_literal(&self) -> bool {
        matches!(self.spec, ArgumentSpec::Literal)
    }

    /// The parser id, `literal` for keywords.
    pub fn parser_id(&self) -> &'static str {
        match &self.spec {
            ArgumentSpec::Literal => "literal",
            ArgumentSpec::Typed(ty) => ty.id(),
        }
    }

    /// `<name:parser>`, `[name:parser]` or the bare keyword.
    pub fn signature(&self) -> String {
        match (&self.spec, self.optional) {
            (ArgumentSpec::Literal, _) => self.name.clone(),
            (ArgumentSpec::Typed(ty), false) => format!("<{}:{}>", self.name, ty.id()),
            (ArgumentSpec::Typed(ty), true) => format!("[{}:{}]", self.name, ty.id()),
        }
    }
}
